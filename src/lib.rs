// form-pdf: Lay out fillable business forms as PDF documents
//
// A form is an ordered list of blocks (titles, info tables, free-text
// sections, paragraphs, signatures). Blocks are measured up front, placed
// top to bottom with a running header and footer, and moved to a new page
// whenever the remaining space cannot hold them.

pub mod assets;
pub mod builder;
pub mod error;
pub mod geometry;
pub mod header_footer;
pub mod page;
pub mod pagination;
pub mod primitives;
pub mod template;

mod forms;
mod render;

pub use assets::{AssetConfig, AssetManager, AssetSource, EmbeddedFont, FontHandle, ImageHandle};
pub use builder::{BuildState, Document, DocumentBuilder, DraftDocument};
pub use error::{LayoutError, Result};
pub use geometry::{Align, PageGeometry, Rect};
pub use header_footer::{HeaderFooterComposer, Identity};
pub use page::{Cursor, DrawOp, FieldDescriptor, FieldKind, FontWeight, Page};
pub use pagination::PaginationController;
pub use template::{BlockContent, Template, TemplateBlock};
