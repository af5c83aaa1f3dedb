//! Domain types for the medallion pipeline.

pub mod bar;
pub mod series;

pub use bar::PriceBar;
pub use series::{canonical_order, DateRange, DateRangeError};
