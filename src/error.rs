use thiserror::Error;

/// Errors raised while laying out or serializing a form.
///
/// Asset problems (unreadable font, undecodable logo) are not represented
/// here: they degrade the output instead of failing it.
#[derive(Error, Debug)]
pub enum LayoutError {
    #[error("Duplicate field name: {0}")]
    DuplicateField(String),
    #[error("Table column widths sum to {sum}, expected row width {width}")]
    TableWidthMismatch { sum: f32, width: f32 },
    #[error("Table row has {cells} cells for {columns} columns")]
    CellCountMismatch { cells: usize, columns: usize },
    #[error("Block {block} needs {required} units but a page only has {usable} usable")]
    BlockTooTall {
        block: usize,
        required: f32,
        usable: f32,
    },
    #[error("Invalid block {block}: {reason}")]
    InvalidBlock { block: usize, reason: String },
    #[error("Invalid page geometry: {0}")]
    InvalidGeometry(String),
    #[error("Document builder has already been used")]
    AlreadyBuilt,
    #[error("Failed to create PDF: {0}")]
    Pdf(String),
    #[error("Failed to attach form fields: {0}")]
    Lopdf(#[from] lopdf::Error),
    #[error("Invalid template: {0}")]
    Template(#[from] serde_json::Error),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl LayoutError {
    pub(crate) fn invalid_block(block: usize, reason: impl Into<String>) -> Self {
        LayoutError::InvalidBlock {
            block,
            reason: reason.into(),
        }
    }

    /// Construction errors are raised before any bytes are emitted and are
    /// caused by the template rather than the environment.
    pub fn is_construction_error(&self) -> bool {
        matches!(
            self,
            LayoutError::DuplicateField(_)
                | LayoutError::TableWidthMismatch { .. }
                | LayoutError::CellCountMismatch { .. }
                | LayoutError::BlockTooTall { .. }
                | LayoutError::InvalidBlock { .. }
                | LayoutError::InvalidGeometry(_)
                | LayoutError::AlreadyBuilt
        )
    }
}

pub type Result<T> = std::result::Result<T, LayoutError>;
