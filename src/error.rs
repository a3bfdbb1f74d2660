//! Crate-level error type and `Result` alias for stable, structured error handling.
//! Separates precondition failures (missing bands, grid or CRS mismatch), configuration
//! errors (invalid thresholds, band-name collisions) and resource exhaustion during
//! polygonization, and converts underlying I/O, GDAL and GeoJSON errors.
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("GDAL error: {0}")]
    Gdal(#[from] crate::io::GdalError),

    #[error("GeoJSON error: {0}")]
    GeoJson(#[from] geojson::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Missing band `{band}` required for role {role}")]
    MissingBand { role: String, band: String },

    #[error("Band `{band}` has shape {actual:?}, expected {expected:?}")]
    ShapeMismatch {
        band: String,
        expected: (usize, usize),
        actual: (usize, usize),
    },

    #[error("CRS mismatch: {left} vs {right}")]
    CrsMismatch { left: String, right: String },

    #[error("Band `{name}` already exists in image")]
    BandNameCollision { name: String },

    #[error("Invalid argument: {arg}={value}")]
    InvalidArgument { arg: &'static str, value: String },

    #[error("Polygonization needs {pixels} pixels, limit is {max_pixels}")]
    ResourceExhausted { pixels: u64, max_pixels: u64 },

    #[error("Image index {index} out of range ({available} candidates)")]
    NoSuchCandidate { index: usize, available: usize },

    #[error("Processing error: {0}")]
    Processing(String),
}

impl Error {
    /// True for errors raised before any pixel is touched.
    pub fn is_precondition(&self) -> bool {
        matches!(
            self,
            Error::MissingBand { .. } | Error::ShapeMismatch { .. } | Error::CrsMismatch { .. }
        )
    }

    /// True for parameter and naming errors.
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            Error::BandNameCollision { .. } | Error::InvalidArgument { .. }
        )
    }
}
