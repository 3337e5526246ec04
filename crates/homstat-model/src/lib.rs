pub mod config;
pub mod error;
pub mod schema;
pub mod window;

pub use config::{AnalysisConfig, RegionRules, SegmentKey};
pub use error::{Result, StatError};
pub use window::YearWindow;
