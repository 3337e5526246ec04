use thiserror::Error;

#[derive(Debug, Error)]
pub enum StatError {
    #[error("invalid year window: end {end} precedes start {start}")]
    InvalidWindow { start: i32, end: i32 },
    #[error("coverage threshold {0} is outside [0, 1]")]
    InvalidThreshold(f64),
    #[error("country {country:?} maps to two regions: {first:?} and {second:?}")]
    RegionConflict {
        country: String,
        first: String,
        second: String,
    },
    #[error("no region mapping for country {0:?}")]
    UnknownRegion(String),
    #[error("missing required column(s): {0}")]
    MissingColumn(String),
    #[error("observation table has no rows")]
    EmptyTable,
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("{0}")]
    Message(String),
}

pub type Result<T> = std::result::Result<T, StatError>;
