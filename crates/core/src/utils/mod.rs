pub mod fs;
pub mod serde_helpers;

pub use fs::atomic_write;
