//! External collaborators: the booking API client and the on-disk
//! rate-table cache.

pub mod api;
pub mod cache;

pub use api::{BookingApiClient, BookingApiError, CacheStatus, CachedPayload};
pub use cache::{
    load_rate_table_cache, save_rate_table_cache, RateTableCache, RATE_TABLE_CACHE_TTL,
};
