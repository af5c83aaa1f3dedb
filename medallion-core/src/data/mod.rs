//! Bar tables: schema, Parquet frames, cleaning and market data sources.

pub mod canonicalize;
pub mod frame;
pub mod schema;
pub mod source;

pub use canonicalize::{parse_timestamp, Canonicalizer};
pub use frame::{
    bars_to_frame, frame_timestamps, frame_to_bars, join_series, optional_f64_column, read_parquet,
    write_parquet, FrameError,
};
pub use schema::BarSchema;
pub use source::{generate_synthetic_bars, CsvSource, MarketDataSource, SourceError, SyntheticSource};
