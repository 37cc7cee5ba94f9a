use thiserror::Error;

/// Why an element could not be captured.
#[derive(Debug, Error)]
pub enum CaptureError {
    /// The element draws cross-origin image data and tainting is not
    /// allowed; capturing it would yield an unreadable canvas.
    #[error("capture tainted by cross-origin image {source_url}")]
    Tainted { source_url: String },

    #[error("could not load element image: {0}")]
    Image(#[from] image::ImageError),
}

#[derive(Debug, Error)]
pub enum ExportError {
    #[error(transparent)]
    Capture(#[from] CaptureError),

    #[error("captured canvas is empty")]
    EmptyCanvas,

    #[error("margin of {0} mm leaves no printable area")]
    InvalidMargin(f64),

    #[error("pdf generation failed: {0}")]
    Pdf(String),

    #[error("could not write export: {0}")]
    Io(#[from] std::io::Error),
}
