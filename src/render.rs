// PDF serialization
//
// Replays the recorded page operations through printpdf, then hands the
// saved bytes to the form writer to attach the interactive fields.

use log::warn;
use printpdf::path::{PaintMode, WindingOrder};
use printpdf::{
    BuiltinFont, Color, ColorBits, ColorSpace, Image, ImageTransform, ImageXObject,
    IndirectFontRef, Line, Mm, PdfDocument, PdfDocumentReference, PdfLayerReference, Point,
    Polygon, Px, Rgb,
};
use std::io::Cursor;

use crate::assets::FontHandle;
use crate::builder::Document;
use crate::error::{LayoutError, Result};
use crate::forms;
use crate::geometry::Rect;
use crate::page::{DrawOp, FontWeight, Page};

const PT_TO_MM: f32 = 0.352_777_78;

/// Gray level of shaded (header) cells
const SHADE_GRAY: f32 = 0.9;

fn mm(pt: f32) -> Mm {
    Mm(pt * PT_TO_MM)
}

struct Fonts {
    regular: IndirectFontRef,
    bold: IndirectFontRef,
}

pub(crate) fn render_pdf(document: &Document) -> Result<Vec<u8>> {
    let geometry = document.geometry();
    let (doc, page1, layer1) = PdfDocument::new(
        document.title(),
        mm(geometry.width()),
        mm(geometry.height()),
        "Layer 1",
    );

    let fonts = load_fonts(&doc, document.font())?;

    for (i, page) in document.pages().iter().enumerate() {
        let layer = if i == 0 {
            doc.get_page(page1).get_layer(layer1)
        } else {
            let (new_page, new_layer) =
                doc.add_page(mm(geometry.width()), mm(geometry.height()), "Layer 1");
            doc.get_page(new_page).get_layer(new_layer)
        };
        draw_page(&layer, &fonts, page);
    }

    let bytes = doc
        .save_to_bytes()
        .map_err(|e| LayoutError::Pdf(e.to_string()))?;

    forms::attach_fields(bytes, document.pages())
}

fn load_fonts(doc: &PdfDocumentReference, font: &FontHandle) -> Result<Fonts> {
    if let FontHandle::Embedded(embedded) = font {
        match doc.add_external_font(Cursor::new(embedded.data())) {
            Ok(embedded) => {
                return Ok(Fonts {
                    regular: embedded.clone(),
                    bold: embedded,
                })
            }
            Err(e) => warn!("Could not embed font, using builtin Helvetica: {}", e),
        }
    }

    let regular = doc
        .add_builtin_font(BuiltinFont::Helvetica)
        .map_err(|e| LayoutError::Pdf(e.to_string()))?;
    let bold = doc
        .add_builtin_font(BuiltinFont::HelveticaBold)
        .map_err(|e| LayoutError::Pdf(e.to_string()))?;
    Ok(Fonts { regular, bold })
}

fn draw_page(layer: &PdfLayerReference, fonts: &Fonts, page: &Page) {
    let black = Color::Rgb(Rgb::new(0.0, 0.0, 0.0, None));

    for op in page.ops() {
        match op {
            DrawOp::Text {
                x,
                y,
                text,
                size,
                weight,
            } => {
                let font = match weight {
                    FontWeight::Regular => &fonts.regular,
                    FontWeight::Bold => &fonts.bold,
                };
                layer.set_fill_color(black.clone());
                layer.use_text(text.as_str(), *size, mm(*x), mm(*y), font);
            }
            DrawOp::Line {
                x1,
                y1,
                x2,
                y2,
                thickness,
            } => {
                layer.set_outline_color(black.clone());
                layer.set_outline_thickness(*thickness);
                draw_line(layer, *x1, *y1, *x2, *y2);
            }
            DrawOp::Rect { rect, filled } => {
                layer.set_outline_color(black.clone());
                layer.set_outline_thickness(crate::page::DEFAULT_LINE_THICKNESS);
                if *filled {
                    layer.set_fill_color(Color::Rgb(Rgb::new(
                        SHADE_GRAY, SHADE_GRAY, SHADE_GRAY, None,
                    )));
                }
                draw_rect(layer, rect, *filled);
            }
            DrawOp::Image { image, rect } => {
                let (width_px, height_px) = image.natural_size();
                if width_px == 0 || height_px == 0 {
                    continue;
                }
                let xobject = Image::from(ImageXObject {
                    width: Px(width_px as usize),
                    height: Px(height_px as usize),
                    color_space: ColorSpace::Rgb,
                    bits_per_component: ColorBits::Bit8,
                    interpolate: true,
                    image_data: image.pixels().to_vec(),
                    image_filter: None,
                    clipping_bbox: None,
                    smask: None,
                });

                // At 72 DPI one pixel is one point; scale from there.
                xobject.add_to_layer(
                    layer.clone(),
                    ImageTransform {
                        translate_x: Some(mm(rect.x)),
                        translate_y: Some(mm(rect.y)),
                        scale_x: Some(rect.width / width_px as f32),
                        scale_y: Some(rect.height / height_px as f32),
                        dpi: Some(72.0),
                        ..Default::default()
                    },
                );
            }
        }
    }
}

// ============================================================================
// Drawing Utilities
// ============================================================================

fn draw_line(layer: &PdfLayerReference, x1: f32, y1: f32, x2: f32, y2: f32) {
    let points = vec![
        (Point::new(mm(x1), mm(y1)), false),
        (Point::new(mm(x2), mm(y2)), false),
    ];
    let line = Line {
        points,
        is_closed: false,
    };
    layer.add_line(line);
}

fn draw_rect(layer: &PdfLayerReference, rect: &Rect, fill: bool) {
    let points = vec![
        (Point::new(mm(rect.x), mm(rect.y)), false),
        (Point::new(mm(rect.right()), mm(rect.y)), false),
        (Point::new(mm(rect.right()), mm(rect.top())), false),
        (Point::new(mm(rect.x), mm(rect.top())), false),
    ];

    if fill {
        let polygon = Polygon {
            rings: vec![points],
            mode: PaintMode::FillStroke,
            winding_order: WindingOrder::NonZero,
        };
        layer.add_polygon(polygon);
    } else {
        let line = Line {
            points,
            is_closed: true,
        };
        layer.add_line(line);
    }
}
