// Template description and block measurement
//
// The caller describes a form as an ordered list of blocks. Each block is
// validated and measured up front, so a template that can never be laid out
// is rejected before anything is drawn.

use serde::{Deserialize, Serialize};

use crate::assets::FontHandle;
use crate::error::{LayoutError, Result};
use crate::geometry::{Align, Rect};
use crate::page::{FieldKind, FontWeight, Page};
use crate::primitives::{
    aligned_text, centered_baseline, check_row_widths, checkbox_cell, free_text_area,
    input_cell, labeled_cell, table_row, wrap_text, CellSpec, FIELD_INSET, TEXT_AREA_INSET,
};

// ============================================================================
// Constants
// ============================================================================

const TITLE_FONT_SIZE: f32 = 16.0;
const TITLE_HEIGHT: f32 = 30.0;

const PARAGRAPH_FONT_SIZE: f32 = 10.0;
const PARAGRAPH_LINE_SPACING: f32 = 1.4;

const TABLE_ROW_HEIGHT: f32 = 20.0;

/// Shaded label bar on top of a section
const SECTION_LABEL_HEIGHT: f32 = 18.0;

const SIGNATURE_HEIGHT: f32 = 60.0;
const SIGNATURE_COLUMN_GAP: f32 = 20.0;
/// Space under the signature line for its caption
const SIGNATURE_CAPTION_SPACE: f32 = 14.0;
const SIGNATURE_FIELD_HEIGHT: f32 = 20.0;
const SIGNATURE_FONT_SIZE: f32 = 8.0;

/// Slack allowed when comparing a table against the content width
const WIDTH_TOLERANCE: f32 = 0.01;

// ============================================================================
// Template Description
// ============================================================================

/// A complete form description, typically loaded from JSON.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Template {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub margin: Option<f32>,
    pub blocks: Vec<TemplateBlock>,
}

impl Template {
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

/// One block as the caller describes it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TemplateBlock {
    #[serde(flatten)]
    pub content: BlockContent,
    /// Declared height. Most kinds derive one when absent.
    #[serde(default)]
    pub height: Option<f32>,
    /// Extra fields positioned relative to the block's top-left corner
    #[serde(default)]
    pub fields: Vec<FieldSpec>,
}

impl TemplateBlock {
    pub fn new(content: BlockContent) -> Self {
        Self {
            content,
            height: None,
            fields: Vec::new(),
        }
    }

    pub fn with_height(mut self, height: f32) -> Self {
        self.height = Some(height);
        self
    }

    pub fn with_field(mut self, field: FieldSpec) -> Self {
        self.fields.push(field);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum BlockContent {
    Title {
        label: String,
        #[serde(default)]
        size: Option<f32>,
        #[serde(default)]
        align: Option<Align>,
    },
    InfoTable {
        columns: Vec<f32>,
        #[serde(default)]
        width: Option<f32>,
        #[serde(default)]
        row_height: Option<f32>,
        rows: Vec<RowSpec>,
    },
    Section {
        label: String,
        field: String,
    },
    Paragraph {
        text: String,
        #[serde(default)]
        size: Option<f32>,
        #[serde(default)]
        align: Align,
    },
    Spacer,
    Signature {
        lines: Vec<SignatureLine>,
    },
}

impl BlockContent {
    pub fn kind_name(&self) -> &'static str {
        match self {
            BlockContent::Title { .. } => "title",
            BlockContent::InfoTable { .. } => "info_table",
            BlockContent::Section { .. } => "section",
            BlockContent::Paragraph { .. } => "paragraph",
            BlockContent::Spacer => "spacer",
            BlockContent::Signature { .. } => "signature",
        }
    }
}

/// A table row; `columns` overrides the table's column widths.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RowSpec {
    #[serde(default)]
    pub columns: Option<Vec<f32>>,
    pub cells: Vec<CellSpec>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignatureLine {
    pub label: String,
    #[serde(default)]
    pub field: Option<String>,
}

/// Field placed relative to its block; `y` is measured down from the block top.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldSpec {
    pub name: String,
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    #[serde(default)]
    pub kind: FieldKind,
}

// ============================================================================
// Measured Blocks
// ============================================================================

#[derive(Debug, Clone)]
enum BlockKind {
    Title {
        label: String,
        size: f32,
        align: Align,
    },
    InfoTable {
        width: f32,
        row_height: f32,
        rows: Vec<(Vec<f32>, Vec<CellSpec>)>,
    },
    Section {
        label: String,
        field: String,
    },
    Paragraph {
        lines: Vec<String>,
        size: f32,
        line_height: f32,
        align: Align,
    },
    Spacer,
    Signature {
        lines: Vec<SignatureLine>,
    },
}

/// A validated block with its final height, ready to draw.
#[derive(Debug, Clone)]
pub struct Block {
    index: usize,
    kind: BlockKind,
    height: f32,
    fields: Vec<FieldSpec>,
}

impl Block {
    /// Validates `spec` against the content width and measures it.
    pub fn measure(
        index: usize,
        spec: &TemplateBlock,
        content_width: f32,
        font: &FontHandle,
    ) -> Result<Block> {
        let kind_name = spec.content.kind_name();
        let invalid =
            |reason: String| LayoutError::invalid_block(index, format!("{}: {}", kind_name, reason));

        if let Some(height) = spec.height {
            if !height.is_finite() || height < 0.0 {
                return Err(invalid(format!("height {} is not a valid size", height)));
            }
        }

        let (kind, height) = match &spec.content {
            BlockContent::Title { label, size, align } => {
                let size = size.unwrap_or(TITLE_FONT_SIZE);
                let height = spec.height.unwrap_or(TITLE_HEIGHT);
                let kind = BlockKind::Title {
                    label: label.clone(),
                    size,
                    align: align.unwrap_or(Align::Center),
                };
                (kind, height)
            }
            BlockContent::InfoTable {
                columns,
                width,
                row_height,
                rows,
            } => {
                if rows.is_empty() {
                    return Err(invalid("has no rows".into()));
                }
                let width = width.unwrap_or(content_width);
                if width > content_width + WIDTH_TOLERANCE {
                    return Err(invalid(format!(
                        "table width {} exceeds content width {}",
                        width, content_width
                    )));
                }

                let height = spec
                    .height
                    .unwrap_or(rows.len() as f32 * row_height.unwrap_or(TABLE_ROW_HEIGHT));
                let row_height = height / rows.len() as f32;
                if row_height <= 2.0 * FIELD_INSET {
                    return Err(invalid(format!("row height {} is too small", row_height)));
                }

                let mut measured_rows = Vec::with_capacity(rows.len());
                for row in rows {
                    let widths = row.columns.as_ref().unwrap_or(columns);
                    check_row_widths(widths, width)?;
                    if row.cells.len() != widths.len() {
                        return Err(LayoutError::CellCountMismatch {
                            cells: row.cells.len(),
                            columns: widths.len(),
                        });
                    }
                    if row
                        .cells
                        .iter()
                        .filter_map(CellSpec::field_name)
                        .any(|name| name.trim().is_empty())
                    {
                        return Err(invalid("table cell has an empty field name".into()));
                    }
                    measured_rows.push((widths.clone(), row.cells.clone()));
                }

                let kind = BlockKind::InfoTable {
                    width,
                    row_height,
                    rows: measured_rows,
                };
                (kind, height)
            }
            BlockContent::Section { label, field } => {
                let height = spec
                    .height
                    .ok_or_else(|| invalid("needs a declared height".into()))?;
                if height <= SECTION_LABEL_HEIGHT + 2.0 * TEXT_AREA_INSET {
                    return Err(invalid(format!(
                        "height {} leaves no room for its text area",
                        height
                    )));
                }
                let kind = BlockKind::Section {
                    label: label.clone(),
                    field: field.clone(),
                };
                (kind, height)
            }
            BlockContent::Paragraph { text, size, align } => {
                let size = size.unwrap_or(PARAGRAPH_FONT_SIZE);
                let line_height = size * PARAGRAPH_LINE_SPACING;
                let lines = wrap_text(font, text, size, content_width);
                let natural = lines.len() as f32 * line_height;
                let height = spec.height.unwrap_or(natural);
                if height < natural {
                    return Err(invalid(format!(
                        "needs {} units but declares {}",
                        natural, height
                    )));
                }
                let kind = BlockKind::Paragraph {
                    lines,
                    size,
                    line_height,
                    align: *align,
                };
                (kind, height)
            }
            BlockContent::Spacer => {
                let height = spec
                    .height
                    .ok_or_else(|| invalid("needs a declared height".into()))?;
                (BlockKind::Spacer, height)
            }
            BlockContent::Signature { lines } => {
                if lines.is_empty() {
                    return Err(invalid("has no lines".into()));
                }
                let gaps = SIGNATURE_COLUMN_GAP * (lines.len() - 1) as f32;
                if content_width - gaps <= 0.0 {
                    return Err(invalid(format!("{} signature lines do not fit", lines.len())));
                }
                let height = spec.height.unwrap_or(SIGNATURE_HEIGHT);
                if height < SIGNATURE_CAPTION_SPACE + SIGNATURE_FIELD_HEIGHT + 2.0 {
                    return Err(invalid(format!("height {} is too small", height)));
                }
                let kind = BlockKind::Signature {
                    lines: lines.clone(),
                };
                (kind, height)
            }
        };

        let bounds = Rect::new(0.0, 0.0, content_width, height);
        for field in &spec.fields {
            let rect = Rect::new(field.x, field.y, field.width, field.height);
            if field.width <= 2.0 * FIELD_INSET || field.height <= 2.0 * FIELD_INSET {
                return Err(invalid(format!("field '{}' is too small", field.name)));
            }
            if !bounds.contains(&rect) {
                return Err(invalid(format!(
                    "field '{}' lies outside its {}x{} block",
                    field.name, content_width, height
                )));
            }
        }

        Ok(Block {
            index,
            kind,
            height,
            fields: spec.fields.clone(),
        })
    }

    pub fn index(&self) -> usize {
        self.index
    }

    /// Height the block needs below the cursor.
    pub fn height(&self) -> f32 {
        self.height
    }

    /// Draws the block with its top-left corner at the page's left margin
    /// and cursor. The cursor is left where it was.
    pub fn draw(&self, page: &mut Page) -> Result<()> {
        let geometry = *page.geometry();
        let left = geometry.margin();
        let width = geometry.content_width();
        let top = page.cursor().y();

        match &self.kind {
            BlockKind::Title { label, size, align } => {
                let rect = Rect::from_top(left, top, width, self.height);
                let baseline = centered_baseline(&rect, *size);
                aligned_text(page, left, width, baseline, label, *size, *align, FontWeight::Bold);
            }
            BlockKind::InfoTable {
                width: table_width,
                row_height,
                rows,
            } => {
                for (i, (widths, cells)) in rows.iter().enumerate() {
                    let row_top = top - i as f32 * row_height;
                    table_row(page, left, row_top, *table_width, *row_height, widths, cells)?;
                }
            }
            BlockKind::Section { label, field } => {
                let bar = Rect::from_top(left, top, width, SECTION_LABEL_HEIGHT);
                labeled_cell(page, bar, label, true, Align::Left);
                let area = Rect::from_top(
                    left,
                    top - SECTION_LABEL_HEIGHT,
                    width,
                    self.height - SECTION_LABEL_HEIGHT,
                );
                free_text_area(page, area, field)?;
            }
            BlockKind::Paragraph {
                lines,
                size,
                line_height,
                align,
            } => {
                for (i, line) in lines.iter().enumerate() {
                    let baseline = top - size - i as f32 * line_height;
                    aligned_text(page, left, width, baseline, line, *size, *align, FontWeight::Regular);
                }
            }
            BlockKind::Spacer => {}
            BlockKind::Signature { lines } => {
                let count = lines.len() as f32;
                let column_width = (width - SIGNATURE_COLUMN_GAP * (count - 1.0)) / count;
                let line_y = top - self.height + SIGNATURE_CAPTION_SPACE;

                for (i, line) in lines.iter().enumerate() {
                    let x = left + i as f32 * (column_width + SIGNATURE_COLUMN_GAP);
                    page.draw_line(x, line_y, x + column_width, line_y);
                    page.draw_text(
                        x + column_width / 2.0,
                        line_y - SIGNATURE_FONT_SIZE - 2.0,
                        &line.label,
                        SIGNATURE_FONT_SIZE,
                        Align::Center,
                    );
                    if let Some(name) = &line.field {
                        let rect = Rect::new(x, line_y + 1.0, column_width, SIGNATURE_FIELD_HEIGHT);
                        page.add_field(name, rect, FieldKind::Text);
                    }
                }
            }
        }

        for field in &self.fields {
            let rect = Rect::from_top(left + field.x, top - field.y, field.width, field.height);
            match field.kind {
                FieldKind::Checkbox => checkbox_cell(page, rect, &field.name)?,
                kind => input_cell(page, rect, &field.name, kind)?,
            }
        }

        Ok(())
    }
}
