//! [`WebSearcher`](crate::WebSearcher) implementations.

pub mod linkup;
pub mod rate_limited;

pub use linkup::LinkupSearcher;
pub use rate_limited::RateLimitedSearcher;
