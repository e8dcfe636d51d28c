//! Remote-source fetch layer.
//!
//! Everything this crate knows about HTTP lives here: the bounded-timeout
//! [`HttpFetcher`], the directory-index [`listing`] parser, the explicit
//! [`FetchError`] transport taxonomy, and the per-host [`RateLimiter`].
//! No request is retried at this layer; retry policy belongs to the calling
//! scheduler.

mod client;
pub mod constants;
mod error;
pub mod listing;
mod rate_limiter;

pub use client::HttpFetcher;
pub use constants::LISTING_PAUSE;
pub use error::FetchError;
pub use rate_limiter::{RateLimiter, extract_host};
