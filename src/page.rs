// Page canvas and cursor
//
// A page records drawing operations instead of writing PDF content directly,
// so layout stays independent of the PDF backend and every draw call can be
// inspected after the fact.

use serde::{Deserialize, Serialize};

use crate::assets::{measure_text, FontHandle, ImageHandle};
use crate::geometry::{Align, PageGeometry, Rect};

/// Default stroke width for borders and rules, in points
pub const DEFAULT_LINE_THICKNESS: f32 = 0.5;

// ============================================================================
// Cursor
// ============================================================================

/// Vertical drawing position on a page. Moves downward (toward smaller y)
/// and never leaves the content area.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Cursor {
    y: f32,
    floor: f32,
}

impl Cursor {
    fn new(geometry: &PageGeometry) -> Self {
        Self {
            y: geometry.content_top(),
            floor: geometry.margin(),
        }
    }

    pub fn y(&self) -> f32 {
        self.y
    }

    /// Space left between the cursor and the bottom margin.
    pub fn remaining(&self) -> f32 {
        self.y - self.floor
    }

    /// Moves the cursor down by `dy`, stopping at the bottom margin.
    pub fn advance(&mut self, dy: f32) {
        self.y = (self.y - dy).max(self.floor);
    }
}

// ============================================================================
// Fields
// ============================================================================

/// Kind of interactive form field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldKind {
    #[default]
    Text,
    Multiline,
    Checkbox,
}

/// A named interactive region placed on a specific page.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldDescriptor {
    pub name: String,
    pub page_index: usize,
    pub rect: Rect,
    pub kind: FieldKind,
}

// ============================================================================
// Draw Operations
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FontWeight {
    Regular,
    Bold,
}

/// One recorded canvas operation, in page coordinates.
#[derive(Debug, Clone)]
pub enum DrawOp {
    /// `x` is the left edge of the text after alignment, `y` the baseline.
    Text {
        x: f32,
        y: f32,
        text: String,
        size: f32,
        weight: FontWeight,
    },
    Line {
        x1: f32,
        y1: f32,
        x2: f32,
        y2: f32,
        thickness: f32,
    },
    /// Filled rectangles are shaded and outlined, unfilled ones outlined.
    Rect { rect: Rect, filled: bool },
    Image { image: ImageHandle, rect: Rect },
}

// ============================================================================
// Page
// ============================================================================

#[derive(Debug, Clone)]
pub struct Page {
    index: usize,
    geometry: PageGeometry,
    font: FontHandle,
    cursor: Cursor,
    ops: Vec<DrawOp>,
    fields: Vec<FieldDescriptor>,
}

impl Page {
    pub fn new(index: usize, geometry: PageGeometry, font: FontHandle) -> Self {
        Self {
            index,
            cursor: Cursor::new(&geometry),
            geometry,
            font,
            ops: Vec::new(),
            fields: Vec::new(),
        }
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn geometry(&self) -> &PageGeometry {
        &self.geometry
    }

    pub fn font(&self) -> &FontHandle {
        &self.font
    }

    pub fn cursor(&self) -> &Cursor {
        &self.cursor
    }

    pub fn cursor_mut(&mut self) -> &mut Cursor {
        &mut self.cursor
    }

    pub fn ops(&self) -> &[DrawOp] {
        &self.ops
    }

    pub fn fields(&self) -> &[FieldDescriptor] {
        &self.fields
    }

    pub fn measure(&self, text: &str, size: f32) -> f32 {
        measure_text(&self.font, text, size)
    }

    /// Draws `text` with its baseline at `y`. `x` is the left edge, the
    /// center or the right edge depending on `align`.
    pub fn draw_text(&mut self, x: f32, y: f32, text: &str, size: f32, align: Align) {
        self.draw_text_weighted(x, y, text, size, align, FontWeight::Regular);
    }

    pub fn draw_text_weighted(
        &mut self,
        x: f32,
        y: f32,
        text: &str,
        size: f32,
        align: Align,
        weight: FontWeight,
    ) {
        let x = match align {
            Align::Left => x,
            Align::Center => x - self.measure(text, size) / 2.0,
            Align::Right => x - self.measure(text, size),
        };
        self.ops.push(DrawOp::Text {
            x,
            y,
            text: text.to_string(),
            size,
            weight,
        });
    }

    pub fn draw_line(&mut self, x1: f32, y1: f32, x2: f32, y2: f32) {
        self.draw_line_weighted(x1, y1, x2, y2, DEFAULT_LINE_THICKNESS);
    }

    pub fn draw_line_weighted(&mut self, x1: f32, y1: f32, x2: f32, y2: f32, thickness: f32) {
        self.ops.push(DrawOp::Line {
            x1,
            y1,
            x2,
            y2,
            thickness,
        });
    }

    pub fn draw_rect(&mut self, rect: Rect, filled: bool) {
        self.ops.push(DrawOp::Rect { rect, filled });
    }

    pub fn draw_image(&mut self, image: &ImageHandle, x: f32, y: f32, width: f32, height: f32) {
        self.ops.push(DrawOp::Image {
            image: image.clone(),
            rect: Rect::new(x, y, width, height),
        });
    }

    /// Registers an interactive field on this page. Name clashes across the
    /// document are detected when the document is finalized.
    pub fn add_field(&mut self, name: &str, rect: Rect, kind: FieldKind) {
        self.fields.push(FieldDescriptor {
            name: name.to_string(),
            page_index: self.index,
            rect,
            kind,
        });
    }
}
