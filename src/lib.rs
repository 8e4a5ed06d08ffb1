pub mod airports;
pub mod codes;
pub mod config;
pub mod error;
pub mod geojson;
pub mod kayak;
pub mod resolver;
pub mod summary;
pub mod timestamp;

pub use airports::{AirportIndex, AirportIndexBuilder, AirportRecord, AirportSource};
pub use error::{ProcessingError, SkipReason, SkipReport};
pub use resolver::{EventSummary, Resolution, Resolver, Segment};
pub use summary::{Summary, TripGroup};
