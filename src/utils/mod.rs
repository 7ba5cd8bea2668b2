//! Shared utilities: bitrate parsing, delay formatting, validation.

pub mod bitrate;
pub mod duration;
pub mod validation;

pub use bitrate::{parse_bitrate, BitrateError, RateUnit, RateValue};
pub use duration::{format_delay, parse_delay};
pub use validation::{ensure_output_dir, validate_log_file, validate_positive_count};
