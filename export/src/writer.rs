//! Output documents.
//!
//! A [`PageSink`] starts with one blank page; `add_page` appends another
//! and makes it current. Placement coordinates are measured from the
//! page's top-left corner. The PDF implementation converts them to the
//! bottom-left origin printpdf uses.

use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

use image::RgbImage;
use printpdf::image_crate::{DynamicImage, RgbImage as PdfRgbImage};
use printpdf::{Image, ImageTransform, Mm, PdfDocument, PdfDocumentReference, PdfLayerReference};

use crate::error::ExportError;
use crate::layout::PageGeometry;

const LAYER: &str = "content";
const MM_PER_INCH: f32 = 25.4;

/// Rectangle on the current page, in millimetres from the top-left corner.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    pub x_mm: f64,
    pub y_mm: f64,
    pub width_mm: f64,
    pub height_mm: f64,
}

pub trait PageSink {
    fn add_page(&mut self) -> Result<(), ExportError>;

    /// Draw `image` stretched to fill `at` on the current page.
    fn draw_image(&mut self, image: &RgbImage, at: Rect) -> Result<(), ExportError>;

    fn save(self, path: &Path) -> Result<(), ExportError>
    where
        Self: Sized;
}

pub struct PdfSink {
    doc: PdfDocumentReference,
    layer: PdfLayerReference,
    geometry: PageGeometry,
}

impl PdfSink {
    pub fn new(title: &str, geometry: PageGeometry) -> Self {
        let (doc, page, layer) = PdfDocument::new(
            title,
            Mm(geometry.width_mm() as f32),
            Mm(geometry.height_mm() as f32),
            LAYER,
        );
        let layer = doc.get_page(page).get_layer(layer);
        Self {
            doc,
            layer,
            geometry,
        }
    }
}

impl PageSink for PdfSink {
    fn add_page(&mut self) -> Result<(), ExportError> {
        let (page, layer) = self.doc.add_page(
            Mm(self.geometry.width_mm() as f32),
            Mm(self.geometry.height_mm() as f32),
            LAYER,
        );
        self.layer = self.doc.get_page(page).get_layer(layer);
        Ok(())
    }

    fn draw_image(&mut self, image: &RgbImage, at: Rect) -> Result<(), ExportError> {
        if image.width() == 0 || image.height() == 0 {
            return Ok(());
        }
        // printpdf links against its own copy of `image`; hand the pixels
        // across as raw bytes.
        let raw = PdfRgbImage::from_raw(image.width(), image.height(), image.as_raw().clone())
            .ok_or_else(|| ExportError::Pdf("raster buffer does not match its dimensions".to_string()))?;
        let pdf_image = Image::from_dynamic_image(&DynamicImage::ImageRgb8(raw));

        // Width in mm fixes the DPI; height follows from the same DPI.
        let dpi = image.width() as f32 * MM_PER_INCH / at.width_mm as f32;
        let bottom = self.geometry.height_mm() - at.y_mm - at.height_mm;
        pdf_image.add_to_layer(
            self.layer.clone(),
            ImageTransform {
                translate_x: Some(Mm(at.x_mm as f32)),
                translate_y: Some(Mm(bottom as f32)),
                dpi: Some(dpi),
                ..Default::default()
            },
        );
        Ok(())
    }

    fn save(self, path: &Path) -> Result<(), ExportError> {
        let file = File::create(path)?;
        self.doc
            .save(&mut BufWriter::new(file))
            .map_err(|e| ExportError::Pdf(e.to_string()))
    }
}

/// Records pages and placements instead of writing anything.
#[derive(Debug, Clone, PartialEq)]
pub struct PageLog {
    /// Placements per page; index 0 is the first page.
    pub pages: Vec<Vec<(u32, u32, Rect)>>,
}

impl PageLog {
    pub fn new() -> Self {
        Self {
            pages: vec![Vec::new()],
        }
    }
}

impl Default for PageLog {
    fn default() -> Self {
        Self::new()
    }
}

impl PageSink for PageLog {
    fn add_page(&mut self) -> Result<(), ExportError> {
        self.pages.push(Vec::new());
        Ok(())
    }

    fn draw_image(&mut self, image: &RgbImage, at: Rect) -> Result<(), ExportError> {
        if let Some(page) = self.pages.last_mut() {
            page.push((image.width(), image.height(), at));
        }
        Ok(())
    }

    fn save(self, _path: &Path) -> Result<(), ExportError> {
        Ok(())
    }
}
