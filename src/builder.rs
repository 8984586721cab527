// Document assembly

use log::info;
use std::collections::HashSet;
use std::sync::Arc;

use crate::assets::{AssetManager, FontHandle};
use crate::error::{LayoutError, Result};
use crate::geometry::PageGeometry;
use crate::header_footer::{HeaderFooterComposer, Identity};
use crate::page::Page;
use crate::pagination::PaginationController;
use crate::render;
use crate::template::{Block, TemplateBlock};

/// Vertical gap left after every block
pub const BLOCK_GAP: f32 = 8.0;

const DEFAULT_TITLE: &str = "Form";

// ============================================================================
// Documents
// ============================================================================

/// Pages of a document that is still being drawn: the closed pages plus the
/// one currently receiving content.
#[derive(Debug)]
pub struct DraftDocument {
    geometry: PageGeometry,
    font: FontHandle,
    closed: Vec<Page>,
    current: Page,
}

impl DraftDocument {
    pub fn new(geometry: PageGeometry, font: FontHandle) -> Self {
        Self {
            current: Page::new(0, geometry, font.clone()),
            geometry,
            font,
            closed: Vec::new(),
        }
    }

    pub fn page_count(&self) -> usize {
        self.closed.len() + 1
    }

    pub fn current_page(&self) -> &Page {
        &self.current
    }

    pub fn current_page_mut(&mut self) -> &mut Page {
        &mut self.current
    }

    /// Closes the current page and starts a blank one.
    pub(crate) fn next_page(&mut self) -> &mut Page {
        let next = Page::new(self.page_count(), self.geometry, self.font.clone());
        let closed = std::mem::replace(&mut self.current, next);
        self.closed.push(closed);
        &mut self.current
    }

    fn into_pages(self) -> Vec<Page> {
        let mut pages = self.closed;
        pages.push(self.current);
        pages
    }
}

/// A finished document: pages in creation order, each with its drawing
/// operations and fields. Cannot be modified once built.
#[derive(Debug, Clone)]
pub struct Document {
    title: String,
    geometry: PageGeometry,
    font: FontHandle,
    pages: Vec<Page>,
}

impl Document {
    /// Seals the pages, rejecting documents whose field names collide.
    fn finalize(title: String, draft: DraftDocument) -> Result<Self> {
        let geometry = draft.geometry;
        let font = draft.font.clone();
        let pages = draft.into_pages();

        let mut seen = HashSet::new();
        for field in pages.iter().flat_map(|page| page.fields()) {
            if !seen.insert(field.name.as_str()) {
                return Err(LayoutError::DuplicateField(field.name.clone()));
            }
        }

        Ok(Self {
            title,
            geometry,
            font,
            pages,
        })
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn geometry(&self) -> &PageGeometry {
        &self.geometry
    }

    pub fn font(&self) -> &FontHandle {
        &self.font
    }

    pub fn pages(&self) -> &[Page] {
        &self.pages
    }

    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    /// Field names in page order, then drawing order.
    pub fn field_names(&self) -> Vec<&str> {
        self.pages
            .iter()
            .flat_map(|page| page.fields())
            .map(|field| field.name.as_str())
            .collect()
    }

    /// Serializes the document to PDF bytes.
    pub fn to_pdf_bytes(&self) -> Result<Vec<u8>> {
        render::render_pdf(self)
    }
}

// ============================================================================
// Builder
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuildState {
    Init,
    Drawing,
    Finalized,
}

/// Lays out one document from template blocks. Single use: the builder is
/// finalized after its first `layout`/`build` call, successful or not.
#[derive(Debug)]
pub struct DocumentBuilder {
    geometry: PageGeometry,
    identity: Identity,
    assets: Arc<AssetManager>,
    composer: HeaderFooterComposer,
    title: String,
    state: BuildState,
}

impl DocumentBuilder {
    pub fn new(geometry: PageGeometry, identity: Identity, assets: Arc<AssetManager>) -> Self {
        Self {
            geometry,
            identity,
            assets,
            composer: HeaderFooterComposer::new(),
            title: DEFAULT_TITLE.to_string(),
            state: BuildState::Init,
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    pub fn state(&self) -> BuildState {
        self.state
    }

    /// Lays out `blocks` and serializes the result.
    pub fn build(&mut self, blocks: &[TemplateBlock]) -> Result<Vec<u8>> {
        let document = self.layout(blocks)?;
        document.to_pdf_bytes()
    }

    /// Lays out `blocks` into pages without serializing them.
    pub fn layout(&mut self, blocks: &[TemplateBlock]) -> Result<Document> {
        if self.state != BuildState::Init {
            return Err(LayoutError::AlreadyBuilt);
        }
        self.state = BuildState::Drawing;
        let result = self.run(blocks);
        self.state = BuildState::Finalized;
        result
    }

    fn run(&self, blocks: &[TemplateBlock]) -> Result<Document> {
        let font = self.assets.font().clone();
        let header_height = self.composer.header_height(&self.identity, &self.assets);
        let controller = PaginationController::new(self.geometry, header_height);

        // Everything is measured before the first draw call
        let measured = blocks
            .iter()
            .enumerate()
            .map(|(index, spec)| {
                let block = Block::measure(index, spec, self.geometry.content_width(), &font)?;
                controller.check_fits(index, block.height())?;
                Ok(block)
            })
            .collect::<Result<Vec<Block>>>()?;

        let mut draft = DraftDocument::new(self.geometry, font);
        self.open_page(draft.current_page_mut());

        for block in &measured {
            let page = controller.ensure_space(&mut draft, block.index(), block.height(), |page| {
                self.open_page(page)
            })?;
            block.draw(page)?;
            page.cursor_mut().advance(block.height() + BLOCK_GAP);
        }

        let page_count = draft.page_count();
        let mut document = Document::finalize(self.title.clone(), draft)?;
        for (i, page) in document.pages.iter_mut().enumerate() {
            self.composer
                .draw_footer(page, &self.identity, i + 1, page_count);
        }

        info!(
            "Laid out '{}': {} blocks on {} pages, {} fields",
            document.title,
            measured.len(),
            document.page_count(),
            document.field_names().len()
        );
        Ok(document)
    }

    /// Draws the running header on a fresh page and moves its cursor below it.
    fn open_page(&self, page: &mut Page) {
        let consumed = self.composer.draw_header(page, &self.identity, &self.assets);
        page.cursor_mut().advance(consumed);
    }
}
