use form_pdf::pagination::FIT_TOLERANCE;
use form_pdf::primitives::{CellSpec, TEXT_AREA_INSET};
use form_pdf::template::RowSpec;
use form_pdf::{
    AssetConfig, AssetManager, AssetSource, BlockContent, DocumentBuilder, DrawOp, FontHandle,
    HeaderFooterComposer, Identity, LayoutError, PageGeometry, PaginationController, Template,
    TemplateBlock,
};
use image::{DynamicImage, ImageFormat, RgbImage};
use lopdf::Document as LopdfDocument;
use std::io::Cursor;
use std::sync::Arc;

fn identity() -> Identity {
    Identity::new("Acme Holdings")
}

fn builder(geometry: PageGeometry, assets: Arc<AssetManager>) -> DocumentBuilder {
    DocumentBuilder::new(geometry, identity(), assets)
}

fn default_builder() -> DocumentBuilder {
    builder(PageGeometry::default(), Arc::new(AssetManager::builtin()))
}

fn spacer(height: f32) -> TemplateBlock {
    TemplateBlock::new(BlockContent::Spacer).with_height(height)
}

fn section(label: &str, field: &str, height: f32) -> TemplateBlock {
    TemplateBlock::new(BlockContent::Section {
        label: label.into(),
        field: field.into(),
    })
    .with_height(height)
}

fn leave_request() -> Template {
    let json = std::fs::read_to_string("tests/fixtures/leave_request.json")
        .expect("Failed to read fixture");
    Template::from_json(&json).expect("Fixture should parse")
}

fn png_bytes(width: u32, height: u32) -> Vec<u8> {
    let mut bytes = Vec::new();
    DynamicImage::ImageRgb8(RgbImage::new(width, height))
        .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
        .unwrap();
    bytes
}

fn image_count(document: &form_pdf::Document) -> usize {
    document
        .pages()
        .iter()
        .flat_map(|page| page.ops())
        .filter(|op| matches!(op, DrawOp::Image { .. }))
        .count()
}

#[test]
fn block_taller_than_any_page_is_rejected() {
    let err = default_builder().layout(&[spacer(900.0)]).unwrap_err();
    assert!(err.is_construction_error());
    match err {
        LayoutError::BlockTooTall {
            block,
            required,
            usable,
        } => {
            assert_eq!(block, 0);
            assert_eq!(required, 900.0);
            assert!(usable < 900.0);
        }
        other => panic!("unexpected error: {}", other),
    }
}

#[test]
fn second_block_moves_to_a_fresh_page_with_header() {
    // 860 high, 40 margin, 30 header: 750 usable per page
    let geometry = PageGeometry::new(595.28, 860.0, 40.0).unwrap();
    let mut builder = builder(geometry, Arc::new(AssetManager::builtin()));
    let document = builder
        .layout(&[section("First", "first", 400.0), section("Second", "second", 400.0)])
        .unwrap();

    assert_eq!(document.page_count(), 2);
    for page in document.pages() {
        let headers = page
            .ops()
            .iter()
            .filter(|op| matches!(op, DrawOp::Text { text, .. } if text == "Acme Holdings"))
            .count();
        assert_eq!(headers, 1);
        assert_eq!(page.fields().len(), 1);
    }
    assert_eq!(document.pages()[1].fields()[0].name, "second");
}

#[test]
fn block_that_exactly_fits_stays_on_the_page() {
    let geometry = PageGeometry::new(595.28, 860.0, 40.0).unwrap();
    let mut builder = builder(geometry, Arc::new(AssetManager::builtin()));
    let document = builder.layout(&[spacer(750.0)]).unwrap();
    assert_eq!(document.page_count(), 1);
}

#[test]
fn full_height_block_fits_on_a4_at_any_margin() {
    let identity = Identity {
        address: Some("12 Harbour Road, Portsmouth".into()),
        ..identity()
    };
    let assets = Arc::new(AssetManager::builtin());
    let header = HeaderFooterComposer::new().header_height(&identity, &assets);

    for step in 0..=100 {
        let margin = 40.0 + step as f32 * 0.1;
        let geometry = PageGeometry::a4(margin).unwrap();
        let usable = PaginationController::new(geometry, header).usable_height();

        let mut builder = DocumentBuilder::new(geometry, identity.clone(), Arc::clone(&assets));
        let document = builder
            .layout(&[section("Notes", "notes", usable)])
            .unwrap_or_else(|e| panic!("margin {}: {}", margin, e));
        assert_eq!(document.page_count(), 1, "margin {} split the block", margin);

        // The text area's border sits TEXT_AREA_INSET below its field
        let bottom = document.pages()[0].fields()[0].rect.y - TEXT_AREA_INSET;
        assert!(
            bottom + FIT_TOLERANCE >= margin,
            "margin {}: block bottom {} below the margin",
            margin,
            bottom
        );
    }
}

#[test]
fn embedded_font_output_parses() {
    let config = AssetConfig {
        font: Some(AssetSource::parse("tests/fixtures/RobotoMedium.ttf")),
        logo: None,
    };
    let assets = Arc::new(AssetManager::load(&config));
    assert!(!assets.font().is_builtin());

    let bytes = builder(PageGeometry::default(), assets)
        .with_title("Leave Request")
        .build(&leave_request().blocks)
        .unwrap();

    let doc = LopdfDocument::load_mem(&bytes).unwrap();
    assert_eq!(doc.get_pages().len(), 1);
    let root_id = doc.trailer.get(b"Root").unwrap().as_reference().unwrap();
    let catalog = doc.get_dictionary(root_id).unwrap();
    assert!(catalog.get(b"AcroForm").is_ok());
}

#[test]
fn undecodable_logo_gives_text_only_header() {
    let config = AssetConfig {
        font: None,
        logo: Some(AssetSource::Bytes {
            data: b"definitely not an image".to_vec(),
            mime: Some("image/png".into()),
        }),
    };
    let assets = Arc::new(AssetManager::load(&config));
    assert!(assets.logo().is_none());

    let document = builder(PageGeometry::default(), assets)
        .layout(&leave_request().blocks)
        .unwrap();
    assert_eq!(image_count(&document), 0);
    assert!(document.to_pdf_bytes().is_ok());
}

#[test]
fn decoded_logo_appears_on_every_page() {
    let config = AssetConfig {
        font: None,
        logo: Some(AssetSource::Bytes {
            data: png_bytes(120, 40),
            mime: None,
        }),
    };
    let assets = Arc::new(AssetManager::load(&config));
    assert!(assets.logo().is_some());

    let document = builder(PageGeometry::default(), assets)
        .layout(&[spacer(500.0), spacer(500.0)])
        .unwrap();
    assert_eq!(document.page_count(), 2);
    assert_eq!(image_count(&document), 2);
}

#[test]
fn unreadable_font_falls_back_to_builtin() {
    let config = AssetConfig {
        font: Some(AssetSource::Bytes {
            data: vec![0, 1, 2, 3],
            mime: None,
        }),
        logo: None,
    };
    let assets = AssetManager::load(&config);
    assert!(assets.font().is_builtin());
}

#[test]
fn centered_title_is_centered_on_the_page() {
    let label = "LEAVE REQUEST";
    let title = TemplateBlock::new(BlockContent::Title {
        label: label.into(),
        size: None,
        align: None,
    });
    let document = default_builder().layout(&[title]).unwrap();

    let (x, size) = document.pages()[0]
        .ops()
        .iter()
        .find_map(|op| match op {
            DrawOp::Text { x, text, size, .. } if text == label => Some((*x, *size)),
            _ => None,
        })
        .expect("title text should be drawn");

    let width = FontHandle::Builtin.measure(label, size);
    let expected = (document.geometry().width() - width) / 2.0;
    assert!((x - expected).abs() < 0.01, "x = {}, expected {}", x, expected);
}

#[test]
fn table_rows_span_the_content_width() {
    let document = default_builder().layout(&leave_request().blocks).unwrap();
    let geometry = document.geometry();
    let left = geometry.margin();
    let right = left + geometry.content_width();

    let fields = document.pages()[0].fields();
    let department = fields.iter().find(|f| f.name == "department").unwrap();
    assert!((department.rect.right() - (right - 2.0)).abs() < 0.01);
    let leave_type = fields.iter().find(|f| f.name == "leave_type").unwrap();
    assert!((leave_type.rect.right() - (right - 2.0)).abs() < 0.01);
}

#[test]
fn mismatched_table_widths_are_rejected() {
    let table = TemplateBlock::new(BlockContent::InfoTable {
        columns: vec![100.0, 100.0],
        width: None,
        row_height: None,
        rows: vec![RowSpec {
            columns: None,
            cells: vec![CellSpec::Header("Name".into()), CellSpec::Input("name".into())],
        }],
    });
    let err = default_builder().layout(&[table]).unwrap_err();
    assert!(matches!(err, LayoutError::TableWidthMismatch { .. }));
}

#[test]
fn repeated_builds_are_identical() {
    let template = leave_request();
    let first = default_builder().layout(&template.blocks).unwrap();
    let second = default_builder().layout(&template.blocks).unwrap();

    assert_eq!(first.page_count(), second.page_count());
    assert_eq!(first.field_names(), second.field_names());
    for (a, b) in first.pages().iter().zip(second.pages()) {
        assert_eq!(a.fields(), b.fields());
    }
}

#[test]
fn concurrent_builds_share_assets() {
    let assets = Arc::new(AssetManager::builtin());
    let template = leave_request();
    let blocks = &template.blocks;

    let results: Vec<(usize, Vec<String>)> = std::thread::scope(|scope| {
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let assets = Arc::clone(&assets);
                scope.spawn(move || {
                    let document = builder(PageGeometry::default(), assets)
                        .layout(blocks)
                        .unwrap();
                    let names = document
                        .field_names()
                        .into_iter()
                        .map(String::from)
                        .collect();
                    (document.page_count(), names)
                })
            })
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    for result in &results[1..] {
        assert_eq!(result, &results[0]);
    }
}

#[test]
fn pdf_output_carries_every_field() {
    let mut builder = default_builder().with_title("Leave Request");
    let bytes = builder.build(&leave_request().blocks).unwrap();
    assert!(bytes.starts_with(b"%PDF"));

    let doc = LopdfDocument::load_mem(&bytes).unwrap();
    assert_eq!(doc.get_pages().len(), 1);

    let root_id = doc.trailer.get(b"Root").unwrap().as_reference().unwrap();
    let catalog = doc.get_dictionary(root_id).unwrap();
    let acro_form_id = catalog.get(b"AcroForm").unwrap().as_reference().unwrap();
    let acro_form = doc.get_dictionary(acro_form_id).unwrap();
    let fields = acro_form.get(b"Fields").unwrap().as_array().unwrap();
    assert_eq!(fields.len(), 8);
}

#[test]
fn multi_page_pdf_keeps_field_pages() {
    let mut builder = default_builder();
    let bytes = builder
        .build(&[
            section("Notes", "notes", 300.0),
            section("Actions", "actions", 300.0),
            section("Follow-up", "follow_up", 300.0),
        ])
        .unwrap();

    let doc = LopdfDocument::load_mem(&bytes).unwrap();
    let pages = doc.get_pages();
    assert_eq!(pages.len(), 2);

    let annotated = pages
        .values()
        .filter(|id| {
            doc.get_dictionary(**id)
                .map(|page| page.has(b"Annots"))
                .unwrap_or(false)
        })
        .count();
    assert_eq!(annotated, 2);
}

#[test]
fn form_without_fields_has_no_acro_form() {
    let bytes = default_builder().build(&[spacer(100.0)]).unwrap();
    let doc = LopdfDocument::load_mem(&bytes).unwrap();
    let root_id = doc.trailer.get(b"Root").unwrap().as_reference().unwrap();
    let catalog = doc.get_dictionary(root_id).unwrap();
    assert!(catalog.get(b"AcroForm").is_err());
}

#[test]
fn meeting_notes_checkbox_clears_label_bars() {
    let json = std::fs::read_to_string("tests/fixtures/meeting_notes.json").unwrap();
    let template = Template::from_json(&json).unwrap();
    let geometry = PageGeometry::a4(50.0).unwrap();
    let document = builder(geometry, Arc::new(AssetManager::builtin()))
        .layout(&template.blocks)
        .unwrap();

    let page = &document.pages()[0];
    let checkbox = page
        .fields()
        .iter()
        .find(|f| f.name == "decisions_final")
        .unwrap();

    for op in page.ops() {
        if let DrawOp::Rect { rect, filled: true } = op {
            let overlaps = checkbox.rect.x < rect.right()
                && rect.x < checkbox.rect.right()
                && checkbox.rect.y < rect.top()
                && rect.y < checkbox.rect.top();
            assert!(!overlaps, "checkbox overlaps shaded bar at y = {}", rect.y);
        }
    }
}
