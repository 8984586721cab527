// AcroForm writer
//
// printpdf has no notion of form fields, so the saved document is reopened
// with lopdf and every recorded field becomes a widget annotation on its
// page, collected under the catalog's AcroForm.

use log::debug;
use lopdf::{dictionary, Dictionary, Document as LopdfDocument, Object, ObjectId};

use crate::error::Result;
use crate::page::{FieldDescriptor, FieldKind, Page};

/// Field flag for multiline text fields
const FF_MULTILINE: i64 = 1 << 12;

/// Annotation flag: print the widget
const ANNOT_PRINT: i64 = 1 << 2;

const TEXT_APPEARANCE: &str = "/Helv 9 Tf 0 g";

pub(crate) fn attach_fields(pdf_bytes: Vec<u8>, pages: &[Page]) -> Result<Vec<u8>> {
    if pages.iter().all(|page| page.fields().is_empty()) {
        return Ok(pdf_bytes);
    }

    let mut doc = LopdfDocument::load_mem(&pdf_bytes)?;
    let page_ids: Vec<ObjectId> = doc.get_pages().into_values().collect();

    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
        "Encoding" => "WinAnsiEncoding",
    });

    let mut field_refs = Vec::new();
    for (page, page_id) in pages.iter().zip(&page_ids) {
        let mut annots = Vec::new();
        for field in page.fields() {
            let widget_id = doc.add_object(widget(field, *page_id));
            annots.push(Object::Reference(widget_id));
            field_refs.push(Object::Reference(widget_id));
        }
        if annots.is_empty() {
            continue;
        }

        if let Ok(Object::Dictionary(page_dict)) = doc.get_object_mut(*page_id) {
            let mut existing = match page_dict.get(b"Annots") {
                Ok(Object::Array(items)) => items.clone(),
                _ => Vec::new(),
            };
            existing.extend(annots);
            page_dict.set("Annots", Object::Array(existing));
        }
    }

    debug!("Attaching {} form fields", field_refs.len());
    let acro_form_id = doc.add_object(dictionary! {
        "Fields" => field_refs,
        "NeedAppearances" => true,
        "DA" => Object::string_literal(TEXT_APPEARANCE),
        "DR" => dictionary! {
            "Font" => dictionary! { "Helv" => font_id },
        },
    });

    let root_id = doc.trailer.get(b"Root")?.as_reference()?;
    if let Ok(Object::Dictionary(root)) = doc.get_object_mut(root_id) {
        root.set("AcroForm", acro_form_id);
    }

    let mut out = Vec::new();
    doc.save_to(&mut out)?;
    Ok(out)
}

fn widget(field: &FieldDescriptor, page_id: ObjectId) -> Dictionary {
    let rect = &field.rect;
    let mut dict = dictionary! {
        "Type" => "Annot",
        "Subtype" => "Widget",
        "T" => Object::string_literal(field.name.as_str()),
        "Rect" => vec![
            Object::from(rect.x),
            Object::from(rect.y),
            Object::from(rect.right()),
            Object::from(rect.top()),
        ],
        "P" => page_id,
        "F" => ANNOT_PRINT,
        "MK" => dictionary! {
            "BG" => vec![Object::Integer(1), Object::Integer(1), Object::Integer(1)],
        },
    };

    match field.kind {
        FieldKind::Text => {
            dict.set("FT", "Tx");
            dict.set("DA", Object::string_literal(TEXT_APPEARANCE));
        }
        FieldKind::Multiline => {
            dict.set("FT", "Tx");
            dict.set("Ff", FF_MULTILINE);
            dict.set("DA", Object::string_literal(TEXT_APPEARANCE));
        }
        FieldKind::Checkbox => {
            dict.set("FT", "Btn");
            dict.set("V", "Off");
            dict.set("AS", "Off");
        }
    }

    dict
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Rect;

    #[test]
    fn widget_kinds() {
        let field = FieldDescriptor {
            name: "reason".into(),
            page_index: 0,
            rect: Rect::new(10.0, 20.0, 100.0, 50.0),
            kind: FieldKind::Multiline,
        };
        let dict = widget(&field, (7, 0));
        assert_eq!(dict.get(b"FT").unwrap().as_name().unwrap(), b"Tx");
        assert_eq!(dict.get(b"Ff").unwrap().as_i64().unwrap(), FF_MULTILINE);
        assert_eq!(dict.get(b"Rect").unwrap().as_array().unwrap().len(), 4);

        let checkbox = FieldDescriptor {
            kind: FieldKind::Checkbox,
            ..field
        };
        let dict = widget(&checkbox, (7, 0));
        assert_eq!(dict.get(b"FT").unwrap().as_name().unwrap(), b"Btn");
        assert!(dict.get(b"Ff").is_err());
    }
}
