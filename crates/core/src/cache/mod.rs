pub mod interface_cache;

pub use interface_cache::{CacheEntry, CacheKey, InterfaceCache};
