//! Renderable elements and the documents they are looked up in.
//!
//! # Design
//! An [`Element`] is anything that can rasterize itself at a given scale.
//! The exporter never inspects an element beyond its scroll size and the
//! raster it returns. [`ImageElement`] is the concrete element used by the
//! crate: an already-rendered view, kept at 1× together with the origins of
//! any foreign images drawn into it.

use std::path::Path;

use image::imageops::{self, FilterType};
use image::{Rgb, RgbImage, RgbaImage};

use crate::error::CaptureError;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CaptureOptions {
    /// Supersampling factor applied to the viewport.
    pub scale: f32,
    /// When false, capturing tainted content fails instead of producing a
    /// canvas that cannot be read back.
    pub allow_taint: bool,
    pub window_width: u32,
    pub window_height: u32,
}

pub trait Element {
    /// Full scrollable size in CSS pixels.
    fn scroll_size(&self) -> (u32, u32);

    fn rasterize(&self, options: &CaptureOptions) -> Result<RgbImage, CaptureError>;
}

/// Something elements can be looked up in by selector.
pub trait Document {
    fn query_selector(&self, selector: &str) -> Option<&dyn Element>;
}

#[derive(Debug, Clone)]
pub struct ImageElement {
    view: RgbaImage,
    foreign_sources: Vec<String>,
}

impl ImageElement {
    pub fn new(view: RgbaImage) -> Self {
        Self {
            view,
            foreign_sources: Vec::new(),
        }
    }

    pub fn open(path: impl AsRef<Path>) -> Result<Self, CaptureError> {
        Ok(Self::new(image::open(path)?.to_rgba8()))
    }

    /// Record a cross-origin image drawn into this view.
    pub fn with_foreign_source(mut self, url: impl Into<String>) -> Self {
        self.foreign_sources.push(url.into());
        self
    }

    pub fn is_tainted(&self) -> bool {
        !self.foreign_sources.is_empty()
    }
}

impl Element for ImageElement {
    fn scroll_size(&self) -> (u32, u32) {
        self.view.dimensions()
    }

    fn rasterize(&self, options: &CaptureOptions) -> Result<RgbImage, CaptureError> {
        if let Some(url) = self.foreign_sources.first().filter(|_| !options.allow_taint) {
            return Err(CaptureError::Tainted {
                source_url: url.clone(),
            });
        }
        let width = (options.window_width as f32 * options.scale).round() as u32;
        let height = (options.window_height as f32 * options.scale).round() as u32;
        if width == 0 || height == 0 {
            return Ok(RgbImage::new(0, 0));
        }
        let scaled = imageops::resize(&self.view, width, height, FilterType::Triangle);
        Ok(flatten_on_white(&scaled))
    }
}

/// Composite transparent pixels over a white page.
fn flatten_on_white(image: &RgbaImage) -> RgbImage {
    RgbImage::from_fn(image.width(), image.height(), |x, y| {
        let [r, g, b, a] = image.get_pixel(x, y).0;
        let alpha = u16::from(a);
        let blend = |c: u8| ((u16::from(c) * alpha + 255 * (255 - alpha)) / 255) as u8;
        Rgb([blend(r), blend(g), blend(b)])
    })
}

/// Elements registered under the selectors that find them. Selectors are
/// matched verbatim; the first registration wins.
#[derive(Default)]
pub struct ElementTree {
    entries: Vec<(String, Box<dyn Element>)>,
}

impl ElementTree {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, selector: impl Into<String>, element: impl Element + 'static) {
        self.entries.push((selector.into(), Box::new(element)));
    }
}

impl Document for ElementTree {
    fn query_selector(&self, selector: &str) -> Option<&dyn Element> {
        self.entries
            .iter()
            .find(|(s, _)| s == selector)
            .map(|(_, e)| e.as_ref())
    }
}
