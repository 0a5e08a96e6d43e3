pub mod charset;
pub mod client;
pub mod errors;
pub mod retry;
pub mod types;

pub use client::{HttpFetcher, PageFetcher, build_client};
pub use errors::FetchError;
pub use types::{FetchResult, PageResponse};
