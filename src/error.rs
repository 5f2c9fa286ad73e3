use std::path::PathBuf;
use thiserror::Error;

/// Fatal pipeline errors. Everything that can go wrong below the level of
/// "the source file is unusable" is recovered in place with sentinel values
/// (empty string, 0, null date) and never reaches this enum.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("could not read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("input file is empty")]
    Empty,

    #[error("no candidate encoding decoded the input")]
    Encoding,

    #[error("malformed delimited input: {0}")]
    Csv(#[from] csv::Error),

    #[error("missing required column: {0}")]
    MissingColumn(&'static str),

    #[error("could not load geographic reference: {0}")]
    GeoReference(String),
}
