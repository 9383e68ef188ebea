//! Bar retrieval, caching and the input boundary

pub mod cache;
pub mod circuit_breaker;
pub mod csv_import;
pub mod fetch;
pub mod ingest;
pub mod provider;
pub mod synthetic;
pub mod yahoo;

pub use cache::{BarCache, CacheKey, CacheMeta, CachedBars};
pub use circuit_breaker::CircuitBreaker;
pub use csv_import::CsvProvider;
pub use fetch::{fetch_with_fallback, load_bars, FetchRequest, LoadedBars};
pub use provider::{dataset_hash, DataError, DataProvider, DataSource, FetchResult, RawBar};
pub use synthetic::SyntheticProvider;
pub use yahoo::YahooProvider;
