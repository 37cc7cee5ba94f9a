//! Element → paginated PDF.

use std::path::PathBuf;

use image::imageops;
use tracing::{debug, error};

use crate::element::{CaptureOptions, Document, Element};
use crate::error::ExportError;
use crate::layout::{paginate, Layout, PageGeometry};
use crate::writer::{PageSink, PdfSink, Rect};

pub const DEFAULT_FILENAME: &str = "resumen-ejecutivo.pdf";
pub const DEFAULT_MARGIN_MM: f64 = 10.0;
/// Supersampling applied when capturing, for legible text.
pub const CAPTURE_SCALE: f32 = 2.0;

#[derive(Debug, Clone, PartialEq)]
pub struct ExportOptions {
    pub filename: String,
    pub margin_mm: f64,
    /// Directory the file is saved into.
    pub output_dir: PathBuf,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            filename: DEFAULT_FILENAME.to_string(),
            margin_mm: DEFAULT_MARGIN_MM,
            output_dir: PathBuf::from("."),
        }
    }
}

/// Capture `element`, paginate it onto A4 portrait pages and save the PDF.
///
/// A missing element is logged and yields `Ok(None)`. A capture that would
/// be tainted by cross-origin content fails before anything is written.
pub fn export_element(
    element: Option<&dyn Element>,
    options: &ExportOptions,
) -> Result<Option<PathBuf>, ExportError> {
    let Some(element) = element else {
        error!("export_element: element is missing, nothing exported");
        return Ok(None);
    };
    let geometry = PageGeometry::a4(options.margin_mm)?;
    let mut sink = PdfSink::new(&options.filename, geometry);
    let layout = render(element, &geometry, &mut sink)?;

    let path = options.output_dir.join(&options.filename);
    sink.save(&path)?;
    debug!(path = %path.display(), pages = layout.page_count(), "pdf exported");
    Ok(Some(path))
}

/// Resolve `selector` in `document` and export the match.
pub fn export_by_selector(
    document: &dyn Document,
    selector: &str,
    options: &ExportOptions,
) -> Result<Option<PathBuf>, ExportError> {
    match document.query_selector(selector) {
        Some(element) => export_element(Some(element), options),
        None => {
            error!(selector, "export_by_selector: no element matches");
            Ok(None)
        }
    }
}

/// Capture `element` and draw it into `sink`, one raster slice per page.
pub fn render<S: PageSink>(
    element: &dyn Element,
    geometry: &PageGeometry,
    sink: &mut S,
) -> Result<Layout, ExportError> {
    let (window_width, window_height) = element.scroll_size();
    let canvas = element.rasterize(&CaptureOptions {
        scale: CAPTURE_SCALE,
        allow_taint: false,
        window_width,
        window_height,
    })?;
    if canvas.width() == 0 || canvas.height() == 0 {
        return Err(ExportError::EmptyCanvas);
    }

    let layout = paginate(canvas.width(), canvas.height(), geometry);
    for placement in &layout.pages {
        if placement.page > 0 {
            sink.add_page()?;
        }
        let (top, rows) = layout.slice_rows(placement);
        if rows == 0 {
            continue;
        }
        let slice = imageops::crop_imm(&canvas, 0, top, canvas.width(), rows).to_image();
        sink.draw_image(
            &slice,
            Rect {
                x_mm: geometry.margin_mm(),
                y_mm: geometry.margin_mm(),
                width_mm: layout.image_width_mm,
                height_mm: layout.rows_to_mm(rows),
            },
        )?;
    }
    Ok(layout)
}
