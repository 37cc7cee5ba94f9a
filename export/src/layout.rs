//! Page geometry and pagination arithmetic.
//!
//! # Design
//! The raster is scaled to the usable page width and treated as one tall
//! strip. Page 1 shows the strip from its top; every further page shows the
//! next usable-height window of it. The `remaining` counter starts at
//! `image_height - usable_height` and drops by one usable height per added
//! page; pagination stops as soon as it is `<= 0`.
//!
//! Offsets are expressed the way a clip-on-draw primitive would place the
//! whole strip (negative once past page 1). Since the PDF writer does not
//! clip, [`Layout::slice_rows`] turns each placement into the pixel rows to
//! cut out of the raster instead.

use crate::error::ExportError;

pub const A4_WIDTH_MM: f64 = 210.0;
pub const A4_HEIGHT_MM: f64 = 297.0;

/// Page size and margin in millimetres. The margin leaves a positive
/// usable area on both axes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageGeometry {
    width_mm: f64,
    height_mm: f64,
    margin_mm: f64,
}

impl PageGeometry {
    pub fn new(width_mm: f64, height_mm: f64, margin_mm: f64) -> Result<Self, ExportError> {
        let valid = margin_mm.is_finite()
            && margin_mm >= 0.0
            && width_mm - 2.0 * margin_mm > 0.0
            && height_mm - 2.0 * margin_mm > 0.0;
        if !valid {
            return Err(ExportError::InvalidMargin(margin_mm));
        }
        Ok(Self {
            width_mm,
            height_mm,
            margin_mm,
        })
    }

    /// A4 portrait.
    pub fn a4(margin_mm: f64) -> Result<Self, ExportError> {
        Self::new(A4_WIDTH_MM, A4_HEIGHT_MM, margin_mm)
    }

    pub fn width_mm(&self) -> f64 {
        self.width_mm
    }

    pub fn height_mm(&self) -> f64 {
        self.height_mm
    }

    pub fn margin_mm(&self) -> f64 {
        self.margin_mm
    }

    pub fn usable_width_mm(&self) -> f64 {
        self.width_mm - 2.0 * self.margin_mm
    }

    pub fn usable_height_mm(&self) -> f64 {
        self.height_mm - 2.0 * self.margin_mm
    }
}

/// Where the strip sits on one page.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Placement {
    /// Zero-based page index.
    pub page: usize,
    /// Vertical offset of the strip's top edge from the page's top edge.
    pub offset_mm: f64,
    /// Strip coordinate shown at the top of the page's margin box.
    pub slice_top_mm: f64,
    /// The remaining-height counter after this page was accounted for.
    pub remaining_mm: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Layout {
    pub geometry: PageGeometry,
    pub canvas_width: u32,
    pub canvas_height: u32,
    pub image_width_mm: f64,
    pub image_height_mm: f64,
    pub pages: Vec<Placement>,
}

/// Lay a `canvas_width` × `canvas_height` raster out over as many pages as
/// it needs. Always yields at least one page.
pub fn paginate(canvas_width: u32, canvas_height: u32, geometry: &PageGeometry) -> Layout {
    let margin = geometry.margin_mm();
    let usable = geometry.usable_height_mm();
    let image_width_mm = geometry.usable_width_mm();
    let image_height_mm = f64::from(canvas_height) * image_width_mm / f64::from(canvas_width);

    let mut remaining = image_height_mm - usable;
    let mut pages = vec![Placement {
        page: 0,
        offset_mm: margin,
        slice_top_mm: 0.0,
        remaining_mm: remaining,
    }];
    while remaining > 0.0 {
        let page = pages.len();
        let consumed = page as f64 * usable;
        remaining -= usable;
        pages.push(Placement {
            page,
            offset_mm: margin - consumed,
            slice_top_mm: consumed,
            remaining_mm: remaining,
        });
    }

    Layout {
        geometry: *geometry,
        canvas_width,
        canvas_height,
        image_width_mm,
        image_height_mm,
        pages,
    }
}

impl Layout {
    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    fn pixels_per_mm(&self) -> f64 {
        f64::from(self.canvas_height) / self.image_height_mm
    }

    /// First raster row and row count visible on `placement`'s page.
    pub fn slice_rows(&self, placement: &Placement) -> (u32, u32) {
        let ppm = self.pixels_per_mm();
        let bottom_mm = placement.slice_top_mm + self.geometry.usable_height_mm();
        let to_row = |mm: f64| ((mm * ppm).round().max(0.0) as u32).min(self.canvas_height);
        let top = to_row(placement.slice_top_mm);
        let bottom = to_row(bottom_mm);
        (top, bottom.saturating_sub(top))
    }

    /// Height in millimetres that `rows` raster rows occupy on the page.
    pub fn rows_to_mm(&self, rows: u32) -> f64 {
        f64::from(rows) / self.pixels_per_mm()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn a4() -> PageGeometry {
        PageGeometry::a4(10.0).unwrap()
    }

    #[test]
    fn a4_usable_area() {
        let g = a4();
        assert_eq!(g.usable_width_mm(), 190.0);
        assert_eq!(g.usable_height_mm(), 277.0);
    }

    #[test]
    fn two_and_a_half_pages_make_three() {
        // 1385 * 190 / 380 = 692.5 = 2.5 * 277
        let layout = paginate(380, 1385, &a4());
        assert_eq!(layout.image_height_mm, 692.5);
        assert_eq!(layout.page_count(), 3);

        let last = layout.pages.last().unwrap();
        assert!(last.remaining_mm <= 0.0);
        assert!(layout.pages[1].remaining_mm > 0.0);
    }

    #[test]
    fn offsets_walk_down_the_strip() {
        let layout = paginate(380, 1385, &a4());
        let offsets: Vec<f64> = layout.pages.iter().map(|p| p.offset_mm).collect();
        assert_eq!(offsets, vec![10.0, 10.0 - 277.0, 10.0 - 554.0]);
        let tops: Vec<f64> = layout.pages.iter().map(|p| p.slice_top_mm).collect();
        assert_eq!(tops, vec![0.0, 277.0, 554.0]);
    }

    #[test]
    fn short_content_fits_one_page() {
        let layout = paginate(1000, 200, &a4());
        assert_eq!(layout.page_count(), 1);
        assert_eq!(layout.pages[0].offset_mm, 10.0);
    }

    #[test]
    fn exact_multiple_does_not_add_blank_page() {
        // 1108 * 190 / 380 = 554 = 2 * 277
        let layout = paginate(380, 1108, &a4());
        assert_eq!(layout.page_count(), 2);
        assert_eq!(layout.pages[1].remaining_mm, 0.0);
    }

    #[test]
    fn slices_cover_the_raster_without_overlap() {
        let layout = paginate(380, 1385, &a4());
        let mut next = 0;
        for placement in &layout.pages {
            let (top, rows) = layout.slice_rows(placement);
            assert_eq!(top, next);
            next = top + rows;
        }
        assert_eq!(next, 1385);
        let (_, last_rows) = layout.slice_rows(&layout.pages[2]);
        assert!((layout.rows_to_mm(last_rows) - 138.5).abs() < 1.0);
    }

    #[test]
    fn margin_must_leave_room() {
        assert!(PageGeometry::a4(105.0).is_err());
        assert!(PageGeometry::a4(-1.0).is_err());
        assert!(PageGeometry::a4(f64::NAN).is_err());
        assert!(PageGeometry::a4(0.0).is_ok());
    }
}
