//! Paginated PDF export of rendered views.
//!
//! # Overview
//! An [`Element`] is captured at 2× into a raster, scaled to the printable
//! width of an A4 portrait page and split across as many pages as its
//! height needs. Each page receives its own slice of the raster inside the
//! page margins.
//!
//! # Design
//! - [`layout`] is pure arithmetic over page geometry and raster size.
//! - [`writer::PageSink`] abstracts the output document; [`writer::PdfSink`]
//!   writes through printpdf, [`writer::PageLog`] just records.
//! - Missing elements and unmatched selectors are logged no-ops, not errors.

pub mod element;
pub mod error;
pub mod export;
pub mod layout;
pub mod writer;

pub use element::{CaptureOptions, Document, Element, ElementTree, ImageElement};
pub use error::{CaptureError, ExportError};
pub use export::{export_by_selector, export_element, render, ExportOptions};
pub use layout::{paginate, Layout, PageGeometry, Placement};
pub use writer::{PageLog, PageSink, PdfSink, Rect};
