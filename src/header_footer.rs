// Running header and pinned footer

use serde::{Deserialize, Serialize};

use crate::assets::AssetManager;
use crate::geometry::Align;
use crate::page::{FontWeight, Page};

// ============================================================================
// Constants
// ============================================================================

/// Logo bounding box in the header
const LOGO_MAX_WIDTH: f32 = 60.0;
const LOGO_MAX_HEIGHT: f32 = 40.0;

/// Space between the logo and the identity text
const LOGO_GAP: f32 = 10.0;

/// Font sizes in points
const NAME_FONT_SIZE: f32 = 14.0;
const CONTACT_FONT_SIZE: f32 = 9.0;
const FOOTER_FONT_SIZE: f32 = 8.0;

/// Gap between the name and contact lines
const LINE_GAP: f32 = 4.0;

/// Space above and below the header separator
const SEPARATOR_GAP: f32 = 6.0;
const HEADER_BOTTOM_GAP: f32 = 10.0;

/// Footer positions, measured down from the bottom margin
const FOOTER_RULE_DROP: f32 = 8.0;
const FOOTER_TEXT_DROP: f32 = 20.0;

// ============================================================================
// Identity
// ============================================================================

/// Branding and contact details repeated on every page.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Identity {
    pub name: String,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
}

impl Identity {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Address, phone and email joined on one line, skipping blanks.
    pub fn contact_line(&self) -> String {
        [&self.address, &self.phone, &self.email]
            .into_iter()
            .flatten()
            .map(|part| part.trim())
            .filter(|part| !part.is_empty())
            .collect::<Vec<_>>()
            .join(" | ")
    }
}

// ============================================================================
// Composer
// ============================================================================

/// Draws the header at the top of the content area and the footer below the
/// bottom margin.
#[derive(Debug, Clone, Copy, Default)]
pub struct HeaderFooterComposer;

struct HeaderLayout {
    logo_size: Option<(f32, f32)>,
    block_height: f32,
    has_contact: bool,
}

impl HeaderFooterComposer {
    pub fn new() -> Self {
        Self
    }

    fn layout(&self, identity: &Identity, assets: &AssetManager) -> HeaderLayout {
        let logo_size = assets
            .logo()
            .map(|logo| logo.scale_to_fit(LOGO_MAX_WIDTH, LOGO_MAX_HEIGHT));
        let has_contact = !identity.contact_line().is_empty();

        let mut text_height = NAME_FONT_SIZE;
        if has_contact {
            text_height += LINE_GAP + CONTACT_FONT_SIZE;
        }
        let logo_height = logo_size.map(|(_, h)| h).unwrap_or(0.0);

        HeaderLayout {
            logo_size,
            block_height: text_height.max(logo_height),
            has_contact,
        }
    }

    /// Height `draw_header` will consume, computed without drawing.
    pub fn header_height(&self, identity: &Identity, assets: &AssetManager) -> f32 {
        self.layout(identity, assets).block_height + SEPARATOR_GAP + HEADER_BOTTOM_GAP
    }

    /// Draws logo, identity block and separator at the page's content top.
    /// Returns the consumed height; the caller moves the cursor.
    pub fn draw_header(&self, page: &mut Page, identity: &Identity, assets: &AssetManager) -> f32 {
        let layout = self.layout(identity, assets);
        let geometry = *page.geometry();
        let top = geometry.content_top();
        let left = geometry.margin();

        let mut text_x = left;
        if let (Some(logo), Some((width, height))) = (assets.logo(), layout.logo_size) {
            page.draw_image(logo, left, top - height, width, height);
            text_x = left + width + LOGO_GAP;
        }

        let name_baseline = top - NAME_FONT_SIZE;
        page.draw_text_weighted(
            text_x,
            name_baseline,
            &identity.name,
            NAME_FONT_SIZE,
            Align::Left,
            FontWeight::Bold,
        );

        if layout.has_contact {
            page.draw_text(
                text_x,
                name_baseline - LINE_GAP - CONTACT_FONT_SIZE,
                &identity.contact_line(),
                CONTACT_FONT_SIZE,
                Align::Left,
            );
        }

        let separator_y = top - layout.block_height - SEPARATOR_GAP;
        page.draw_line(left, separator_y, left + geometry.content_width(), separator_y);

        self.header_height(identity, assets)
    }

    /// Draws the footer at a fixed position below the content area. Never
    /// touches the cursor.
    pub fn draw_footer(
        &self,
        page: &mut Page,
        identity: &Identity,
        page_number: usize,
        page_count: usize,
    ) {
        let geometry = *page.geometry();
        let left = geometry.margin();
        let right = left + geometry.content_width();
        let rule_y = geometry.margin() - FOOTER_RULE_DROP;
        let text_y = geometry.margin() - FOOTER_TEXT_DROP;

        page.draw_line(left, rule_y, right, rule_y);

        let contact = identity.contact_line();
        if !contact.is_empty() {
            page.draw_text(
                geometry.width() / 2.0,
                text_y,
                &contact,
                FOOTER_FONT_SIZE,
                Align::Center,
            );
        }

        page.draw_text(
            right,
            text_y,
            &format!("Page {} of {}", page_number, page_count),
            FOOTER_FONT_SIZE,
            Align::Right,
        );
    }
}
