// form-pdf: Generate fillable PDF forms from JSON templates

use chrono::Local;
use clap::Parser;
use form_pdf::geometry::DEFAULT_MARGIN_PT;
use form_pdf::{
    AssetConfig, AssetManager, AssetSource, DocumentBuilder, Identity, LayoutError, PageGeometry,
    Template,
};
use log::debug;
use std::fs;
use thiserror::Error;

// ============================================================================
// Error Handling
// ============================================================================

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Failed to read template file: {0}")]
    TemplateError(String),
    #[error(transparent)]
    LayoutError(#[from] LayoutError),
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

// ============================================================================
// Data Structures
// ============================================================================

/// CLI Arguments
#[derive(Parser, Debug)]
#[command(author, version, about = "Generate fillable PDF forms from JSON templates")]
struct Args {
    /// Form template (JSON file)
    #[arg(short, long)]
    template: String,

    /// Company name shown in the page header
    #[arg(short, long)]
    name: String,

    /// Company address
    #[arg(short, long)]
    address: Option<String>,

    /// Contact phone number
    #[arg(short, long)]
    phone: Option<String>,

    /// Contact email
    #[arg(short, long)]
    email: Option<String>,

    /// Logo image (file path or URL) for the header top-left
    #[arg(long)]
    logo: Option<String>,

    /// TrueType font (file path or URL), defaults to builtin Helvetica
    #[arg(long)]
    font: Option<String>,

    /// Page margin in points (overrides the template's margin)
    #[arg(short, long)]
    margin: Option<f32>,

    /// Output filename (defaults to form-{date}-{title}.pdf)
    #[arg(short, long)]
    output: Option<String>,
}

// ============================================================================
// Main Entry Point
// ============================================================================

fn main() {
    env_logger::init();

    if let Err(e) = run() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn run() -> Result<(), AppError> {
    let args = Args::parse();

    let template = load_template(&args.template)?;

    let margin = args.margin.or(template.margin).unwrap_or(DEFAULT_MARGIN_PT);
    let geometry = PageGeometry::a4(margin)?;

    let identity = Identity {
        name: args.name,
        address: args.address,
        phone: args.phone,
        email: args.email,
    };

    let config = AssetConfig {
        font: args.font.as_deref().map(AssetSource::parse),
        logo: args.logo.as_deref().map(AssetSource::parse),
    };
    let assets = AssetManager::shared(&config);

    let title = template
        .title
        .clone()
        .unwrap_or_else(|| "Form".to_string());

    let output_file = args.output.unwrap_or_else(|| default_output_name(&title));

    let mut builder = DocumentBuilder::new(geometry, identity, assets).with_title(title.as_str());
    let document = builder.layout(&template.blocks)?;
    let bytes = document.to_pdf_bytes()?;

    fs::write(&output_file, &bytes)?;
    debug!("Wrote {} bytes to {}", bytes.len(), output_file);

    println!("✓ Generated: {}", output_file);
    println!("  Form: {}", title);
    println!("  Pages: {}", document.page_count());
    println!("  Fields: {}", document.field_names().len());

    Ok(())
}

// ============================================================================
// Helper Functions
// ============================================================================

fn load_template(path: &str) -> Result<Template, AppError> {
    let content = fs::read_to_string(path)
        .map_err(|e| AppError::TemplateError(format!("{}: {}", path, e)))?;
    Ok(Template::from_json(&content)?)
}

fn default_output_name(title: &str) -> String {
    let slug = title
        .to_lowercase()
        .replace(' ', "-")
        .chars()
        .filter(|c| c.is_alphanumeric() || *c == '-')
        .collect::<String>();
    format!("form-{}-{}.pdf", Local::now().date_naive().format("%Y-%m-%d"), slug)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn output_name_is_slugged() {
        let name = default_output_name("Leave Request (HR)");
        assert!(name.starts_with("form-"));
        assert!(name.ends_with("-leave-request-hr.pdf"));
    }
}
