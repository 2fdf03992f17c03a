//! Conversion of rendered SVG documents into files on disk.

use std::path::Path;

use resvg::usvg;
use tiny_skia::{Pixmap, Transform};

use crate::error::{DesignerError, Result};

/// Output formats selected by file extension
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Svg,
    Png,
    Pdf,
}

impl OutputFormat {
    pub fn from_path(path: &Path) -> Result<Self> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .ok_or_else(|| DesignerError::Export("Output file has no extension".to_string()))?
            .to_ascii_lowercase();

        match ext.as_str() {
            "svg" => Ok(OutputFormat::Svg),
            "png" => Ok(OutputFormat::Png),
            "pdf" => Ok(OutputFormat::Pdf),
            _ => Err(DesignerError::Export(format!(
                "Unsupported output format: .{} (use .svg, .png or .pdf)",
                ext
            ))),
        }
    }
}

/// Encode `svg` in the format implied by `output` and write it there.
pub fn write_output(svg: &str, output: &Path, png_scale: f32) -> Result<()> {
    let bytes = match OutputFormat::from_path(output)? {
        OutputFormat::Svg => svg.as_bytes().to_vec(),
        OutputFormat::Png => svg_to_png(svg, png_scale)?,
        OutputFormat::Pdf => svg_to_pdf(svg)?,
    };

    std::fs::write(output, bytes).map_err(|source| DesignerError::Io {
        path: output.to_path_buf(),
        source,
    })?;
    Ok(())
}

pub fn svg_to_png(svg: &str, scale: f32) -> Result<Vec<u8>> {
    if !scale.is_finite() || scale <= 0.0 {
        return Err(DesignerError::Export(format!("Invalid PNG scale: {}", scale)));
    }

    let mut opts = usvg::Options::default();
    {
        let fontdb = opts.fontdb_mut();
        fontdb.load_system_fonts();
        let sans = pick_sans_family(fontdb.faces().flat_map(|f| f.families.iter()));
        if let Some(family) = sans {
            fontdb.set_sans_serif_family(family);
        }
    }

    let tree = usvg::Tree::from_str(svg, &opts)
        .map_err(|e| DesignerError::Export(format!("Failed to parse SVG: {}", e)))?;

    let width = (tree.size().width() * scale).ceil() as u32;
    let height = (tree.size().height() * scale).ceil() as u32;
    let mut pixmap = Pixmap::new(width, height)
        .ok_or_else(|| DesignerError::Export("Failed to create pixmap".to_string()))?;

    resvg::render(&tree, Transform::from_scale(scale, scale), &mut pixmap.as_mut());

    pixmap
        .encode_png()
        .map_err(|e| DesignerError::Export(format!("Failed to encode PNG: {}", e)))
}

pub fn svg_to_pdf(svg: &str) -> Result<Vec<u8>> {
    use svg2pdf::usvg::fontdb;

    let mut fontdb = fontdb::Database::new();
    fontdb.load_system_fonts();
    let sans = pick_sans_family(fontdb.faces().flat_map(|f| f.families.iter()));
    if let Some(family) = sans {
        fontdb.set_sans_serif_family(family);
    }

    let mut opts = svg2pdf::usvg::Options::default();
    opts.fontdb = std::sync::Arc::new(fontdb);
    let tree = svg2pdf::usvg::Tree::from_str(svg, &opts)
        .map_err(|e| DesignerError::Export(format!("Failed to parse SVG: {}", e)))?;

    // Labels become paths so the PDF does not depend on font embedding.
    let mut options = svg2pdf::ConversionOptions::default();
    options.embed_text = false;

    svg2pdf::to_pdf(&tree, options, svg2pdf::PageOptions::default())
        .map_err(|e| DesignerError::Export(format!("Failed to convert SVG to PDF: {}", e)))
}

/// First family whose name mentions "sans", else the first family found.
fn pick_sans_family<'a, L: 'a>(
    families: impl Iterator<Item = &'a (String, L)>,
) -> Option<String> {
    let mut first: Option<String> = None;
    for (family, _) in families {
        if family.to_ascii_lowercase().contains("sans") {
            return Some(family.clone());
        }
        if first.is_none() {
            first = Some(family.clone());
        }
    }
    first
}
