// Layout primitives
//
// Stateless helpers that draw one bordered building block onto a page. None
// of them move the cursor or open pages.

use serde::{Deserialize, Serialize};

use crate::assets::{measure_text, FontHandle};
use crate::error::{LayoutError, Result};
use crate::geometry::{Align, Rect};
use crate::page::{FieldKind, FontWeight, Page};

// ============================================================================
// Constants
// ============================================================================

/// Text size used inside cells
pub const DEFAULT_TEXT_SIZE: f32 = 9.0;

/// Gap between a cell border and the field it houses
pub const FIELD_INSET: f32 = 2.0;

/// Gap between a free-text box border and its multiline field
pub const TEXT_AREA_INSET: f32 = 3.0;

/// Side of a checkbox field
pub const CHECKBOX_SIZE: f32 = 10.0;

/// Horizontal padding for left/right aligned cell labels
const CELL_PADDING: f32 = 4.0;

/// Baseline drop below the vertical center, as a fraction of the text size
const BASELINE_SHIFT: f32 = 0.35;

/// Largest difference between column widths and row width still treated as equal
const WIDTH_TOLERANCE: f32 = 0.01;

// ============================================================================
// Cells
// ============================================================================

/// One cell of a table row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CellSpec {
    /// Plain label
    Label(String),
    /// Shaded, bold label
    Header(String),
    /// Single-line input field with the given name
    Input(String),
    /// Checkbox field with the given name
    Checkbox(String),
}

impl CellSpec {
    pub fn field_name(&self) -> Option<&str> {
        match self {
            CellSpec::Input(name) | CellSpec::Checkbox(name) => Some(name),
            CellSpec::Label(_) | CellSpec::Header(_) => None,
        }
    }
}

/// Baseline that vertically centers text of `size` in `rect`.
pub fn centered_baseline(rect: &Rect, size: f32) -> f32 {
    rect.center_y() - size * BASELINE_SHIFT
}

/// Draws `text` aligned within the horizontal span `[left, left + width]`.
#[allow(clippy::too_many_arguments)]
pub fn aligned_text(
    page: &mut Page,
    left: f32,
    width: f32,
    baseline: f32,
    text: &str,
    size: f32,
    align: Align,
    weight: FontWeight,
) {
    let x = match align {
        Align::Left => left,
        Align::Center => left + width / 2.0,
        Align::Right => left + width,
    };
    page.draw_text_weighted(x, baseline, text, size, align, weight);
}

/// Bordered cell with a label. Header cells are shaded and set in bold.
pub fn labeled_cell(page: &mut Page, rect: Rect, label: &str, is_header: bool, align: Align) {
    page.draw_rect(rect, is_header);

    let x = match align {
        Align::Left => rect.x + CELL_PADDING,
        Align::Center => rect.center_x(),
        Align::Right => rect.right() - CELL_PADDING,
    };
    let weight = if is_header {
        FontWeight::Bold
    } else {
        FontWeight::Regular
    };
    page.draw_text_weighted(
        x,
        centered_baseline(&rect, DEFAULT_TEXT_SIZE),
        label,
        DEFAULT_TEXT_SIZE,
        align,
        weight,
    );
}

/// Bordered cell housing an interactive field inset from the border.
pub fn input_cell(page: &mut Page, rect: Rect, field_name: &str, kind: FieldKind) -> Result<()> {
    let field_rect = inset_or_reject(&rect, FIELD_INSET, field_name)?;
    page.draw_rect(rect, false);
    page.add_field(field_name, field_rect, kind);
    Ok(())
}

/// Bordered cell with a checkbox centered in it.
pub fn checkbox_cell(page: &mut Page, rect: Rect, field_name: &str) -> Result<()> {
    let inner = inset_or_reject(&rect, FIELD_INSET, field_name)?;
    let side = CHECKBOX_SIZE.min(inner.width).min(inner.height);
    let field_rect = Rect::new(
        rect.center_x() - side / 2.0,
        rect.center_y() - side / 2.0,
        side,
        side,
    );
    page.draw_rect(rect, false);
    page.draw_rect(field_rect, false);
    page.add_field(field_name, field_rect, FieldKind::Checkbox);
    Ok(())
}

/// Bordered box with one multiline field sized `(w - 6, h - 6)`.
pub fn free_text_area(page: &mut Page, rect: Rect, field_name: &str) -> Result<()> {
    let field_rect = inset_or_reject(&rect, TEXT_AREA_INSET, field_name)?;
    page.draw_rect(rect, false);
    page.add_field(field_name, field_rect, FieldKind::Multiline);
    Ok(())
}

/// Checks that `column_widths` exactly fill `width`.
pub fn check_row_widths(column_widths: &[f32], width: f32) -> Result<()> {
    let sum: f32 = column_widths.iter().sum();
    if (sum - width).abs() > WIDTH_TOLERANCE {
        return Err(LayoutError::TableWidthMismatch { sum, width });
    }
    Ok(())
}

/// Draws one table row left to right with its top edge at `top`.
///
/// The column widths must sum to `width` and there must be one cell per
/// column; nothing is drawn otherwise.
pub fn table_row(
    page: &mut Page,
    x: f32,
    top: f32,
    width: f32,
    height: f32,
    column_widths: &[f32],
    cells: &[CellSpec],
) -> Result<()> {
    check_row_widths(column_widths, width)?;
    if cells.len() != column_widths.len() {
        return Err(LayoutError::CellCountMismatch {
            cells: cells.len(),
            columns: column_widths.len(),
        });
    }

    let mut cell_x = x;
    for (cell, &cell_width) in cells.iter().zip(column_widths) {
        let rect = Rect::from_top(cell_x, top, cell_width, height);
        match cell {
            CellSpec::Label(label) => labeled_cell(page, rect, label, false, Align::Left),
            CellSpec::Header(label) => labeled_cell(page, rect, label, true, Align::Left),
            CellSpec::Input(name) => input_cell(page, rect, name, FieldKind::Text)?,
            CellSpec::Checkbox(name) => checkbox_cell(page, rect, name)?,
        }
        cell_x += cell_width;
    }
    Ok(())
}

fn inset_or_reject(rect: &Rect, inset: f32, field_name: &str) -> Result<Rect> {
    let inner = rect.inset(inset);
    if inner.width <= 0.0 || inner.height <= 0.0 {
        return Err(LayoutError::InvalidGeometry(format!(
            "field '{}' needs more than {}x{} to clear its border",
            field_name,
            2.0 * inset,
            2.0 * inset
        )));
    }
    Ok(inner)
}

// ============================================================================
// Text Wrapping
// ============================================================================

/// Greedy word wrap. Words wider than `max_width` get a line of their own.
pub fn wrap_text(font: &FontHandle, text: &str, size: f32, max_width: f32) -> Vec<String> {
    let mut lines = Vec::new();

    for paragraph in text.split('\n') {
        let mut line = String::new();
        for word in paragraph.split_whitespace() {
            if line.is_empty() {
                line.push_str(word);
                continue;
            }
            let candidate = format!("{} {}", line, word);
            if measure_text(font, &candidate, size) <= max_width {
                line = candidate;
            } else {
                lines.push(std::mem::take(&mut line));
                line.push_str(word);
            }
        }
        lines.push(line);
    }

    lines
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::PageGeometry;
    use crate::page::DrawOp;

    fn page() -> Page {
        Page::new(0, PageGeometry::default(), FontHandle::Builtin)
    }

    #[test]
    fn input_field_clears_its_border() {
        let mut page = page();
        let rect = Rect::new(40.0, 700.0, 120.0, 20.0);
        input_cell(&mut page, rect, "employee_name", FieldKind::Text).unwrap();

        let field = &page.fields()[0];
        assert_eq!(field.name, "employee_name");
        assert!(field.rect.x - rect.x >= FIELD_INSET);
        assert!(field.rect.y - rect.y >= FIELD_INSET);
        assert!(rect.right() - field.rect.right() >= FIELD_INSET);
        assert!(rect.top() - field.rect.top() >= FIELD_INSET);
    }

    #[test]
    fn free_text_area_is_centered_inset() {
        let mut page = page();
        let rect = Rect::new(40.0, 500.0, 200.0, 100.0);
        free_text_area(&mut page, rect, "reason").unwrap();

        let field = &page.fields()[0];
        assert_eq!(field.kind, FieldKind::Multiline);
        assert_eq!(field.rect, Rect::new(43.0, 503.0, 194.0, 94.0));
        assert_eq!(field.rect.center_x(), rect.center_x());
        assert_eq!(field.rect.center_y(), rect.center_y());
    }

    #[test]
    fn table_row_rejects_mismatched_widths() {
        let mut page = page();
        let cells = vec![CellSpec::Header("Name".into()), CellSpec::Input("name".into())];
        let err = table_row(&mut page, 40.0, 700.0, 300.0, 20.0, &[100.0, 150.0], &cells)
            .unwrap_err();
        assert!(matches!(err, LayoutError::TableWidthMismatch { .. }));
        assert!(page.ops().is_empty());
        assert!(page.fields().is_empty());
    }

    #[test]
    fn table_row_rejects_wrong_cell_count() {
        let mut page = page();
        let cells = vec![CellSpec::Header("Name".into())];
        let err = table_row(&mut page, 40.0, 700.0, 300.0, 20.0, &[100.0, 200.0], &cells)
            .unwrap_err();
        assert!(matches!(err, LayoutError::CellCountMismatch { cells: 1, columns: 2 }));
    }

    #[test]
    fn table_row_lays_cells_left_to_right() {
        let mut page = page();
        let cells = vec![
            CellSpec::Header("Name".into()),
            CellSpec::Input("name".into()),
            CellSpec::Checkbox("full_time".into()),
        ];
        table_row(&mut page, 40.0, 700.0, 300.0, 20.0, &[100.0, 150.0, 50.0], &cells).unwrap();

        let names: Vec<&str> = page.fields().iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["name", "full_time"]);
        assert_eq!(page.fields()[0].rect.x, 140.0 + FIELD_INSET);
        assert_eq!(page.fields()[1].kind, FieldKind::Checkbox);
        assert_eq!(page.fields()[1].rect.center_x(), 315.0);

        let header_shaded = page
            .ops()
            .iter()
            .any(|op| matches!(op, DrawOp::Rect { filled: true, rect } if rect.x == 40.0));
        assert!(header_shaded);
    }

    #[test]
    fn too_small_input_is_rejected() {
        let mut page = page();
        let err = input_cell(&mut page, Rect::new(0.0, 0.0, 3.0, 30.0), "x", FieldKind::Text)
            .unwrap_err();
        assert!(err.is_construction_error());
    }

    #[test]
    fn centered_label_is_centered_in_cell() {
        let mut page = page();
        let rect = Rect::new(100.0, 100.0, 200.0, 20.0);
        labeled_cell(&mut page, rect, "ABCD", false, Align::Center);
        let text_x = page
            .ops()
            .iter()
            .find_map(|op| match op {
                DrawOp::Text { x, .. } => Some(*x),
                _ => None,
            })
            .unwrap();
        // 4 chars * 0.5em * 9pt = 18pt
        assert_eq!(text_x, 200.0 - 9.0);
    }

    #[test]
    fn aligned_text_spans() {
        let mut page = page();
        // "ABCD" at 10pt = 20pt wide
        for align in [Align::Left, Align::Center, Align::Right] {
            aligned_text(&mut page, 40.0, 100.0, 500.0, "ABCD", 10.0, align, FontWeight::Regular);
        }
        let xs: Vec<f32> = page
            .ops()
            .iter()
            .filter_map(|op| match op {
                DrawOp::Text { x, .. } => Some(*x),
                _ => None,
            })
            .collect();
        assert_eq!(xs, vec![40.0, 80.0, 120.0]);
    }

    #[test]
    fn wraps_on_word_boundaries() {
        let font = FontHandle::Builtin;
        // 10pt builtin: 5pt per char, 50pt fits 10 chars
        let lines = wrap_text(&font, "aaaa bbbb cccc dddd", 10.0, 50.0);
        assert_eq!(lines, vec!["aaaa bbbb", "cccc dddd"]);
    }

    #[test]
    fn wrap_keeps_explicit_line_breaks() {
        let font = FontHandle::Builtin;
        let lines = wrap_text(&font, "one\n\ntwo", 10.0, 500.0);
        assert_eq!(lines, vec!["one", "", "two"]);
    }
}
