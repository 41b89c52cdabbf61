use std::path::PathBuf;
use thiserror::Error;

/// Errors from the visa decoder
#[derive(Debug, Error, PartialEq, Eq)]
pub enum VisaError {
    #[error("no requirement data for passport {0}")]
    UnknownOrigin(String),
}

/// Errors from reading and joining the input documents
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {}: {source}", path.display())]
    Json {
        path: PathBuf,
        #[source]
        source: simd_json::Error,
    },

    #[error("invalid topology: {0}")]
    Topology(String),

    #[error("invalid GeoJSON: {0}")]
    GeoJson(#[from] geojson::Error),
}
