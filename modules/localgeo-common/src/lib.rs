pub mod config;
pub mod error;
pub mod geo;
pub mod geotag;
pub mod time;

pub use config::{Config, MAX_TONIGHT_WINDOW_HOURS};
pub use error::{LocalGeoError, Result};
pub use geo::*;
pub use geotag::{GeoTag, GEOTAG_PRECISION};
pub use time::{parse_start_time, start_time_or_epoch, AmbiguousParseError};
