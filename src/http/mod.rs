//! HTTP layer: client construction, page fetching, throttling, image download

mod fetcher;
mod limiter;

pub use fetcher::{build_http_client, Fetcher, ImageDownload};
pub use limiter::RateLimiter;
