pub mod error_tracking;
pub mod string_utils;

// Re-export commonly used functions
pub use error_tracking::{generate_request_id, get_or_generate_trace_id};
pub use string_utils::{format_bitcoin_address, format_bitcoin_balance, format_public_key};
