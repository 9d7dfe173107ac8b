pub mod formatter;

pub use formatter::{format_cache_entry, format_interface, format_parse_error, origin_icon};
