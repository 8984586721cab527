// Page breaking
//
// This is the only place new pages are opened once a document is being
// drawn.

use log::debug;

use crate::builder::DraftDocument;
use crate::error::{LayoutError, Result};
use crate::geometry::PageGeometry;
use crate::page::Page;

/// Slack when comparing a block against the space left, absorbing f32
/// rounding in margin and header arithmetic.
pub const FIT_TOLERANCE: f32 = 0.01;

fn fits(available: f32, required: f32) -> bool {
    required <= available + FIT_TOLERANCE
}

/// Decides whether a block fits below the cursor or needs a fresh page.
#[derive(Debug, Clone, Copy)]
pub struct PaginationController {
    geometry: PageGeometry,
    header_height: f32,
}

impl PaginationController {
    pub fn new(geometry: PageGeometry, header_height: f32) -> Self {
        Self {
            geometry,
            header_height,
        }
    }

    /// Content height of a page once the running header is drawn.
    pub fn usable_height(&self) -> f32 {
        self.geometry.content_height() - self.header_height
    }

    /// Rejects blocks no page could ever hold.
    pub fn check_fits(&self, block: usize, required: f32) -> Result<()> {
        if !fits(self.usable_height(), required) {
            return Err(LayoutError::BlockTooTall {
                block,
                required,
                usable: self.usable_height(),
            });
        }
        Ok(())
    }

    /// Returns a page with at least `required` units between its cursor and
    /// the bottom margin. When the current page is too full it is closed and
    /// a fresh page is opened and handed to `open_page` (header drawing,
    /// cursor adjustment) first. An exact fit stays on the current page.
    pub fn ensure_space<'d, F>(
        &self,
        doc: &'d mut DraftDocument,
        block: usize,
        required: f32,
        open_page: F,
    ) -> Result<&'d mut Page>
    where
        F: FnOnce(&mut Page),
    {
        self.check_fits(block, required)?;

        if fits(doc.current_page().cursor().remaining(), required) {
            return Ok(doc.current_page_mut());
        }

        debug!(
            "Block {} needs {} units, opening page {}",
            block,
            required,
            doc.page_count() + 1
        );
        let page = doc.next_page();
        open_page(&mut *page);

        // A fresh page whose header ate more than `header_height` accounted for
        let remaining = page.cursor().remaining();
        if !fits(remaining, required) {
            return Err(LayoutError::BlockTooTall {
                block,
                required,
                usable: remaining,
            });
        }
        Ok(page)
    }
}
