//! Input validation utilities.
//!
//! This module provides validation functions for structural topology
//! parameters and for the log files consumed by the analyzer.

use std::fs;
use std::path::Path;

/// Validate a structural count (producers, aggregators, ...)
///
/// Counts must be strictly positive. Integral-ness is guaranteed by the type.
///
/// # Arguments
/// * `name` - Field name reported on failure
/// * `value` - The count to validate
///
/// # Returns
/// * `Ok(())` if validation succeeds
/// * `Err(String)` with an error message naming the field if validation fails
///
/// # Examples
/// ```
/// use aggsim::utils::validation::validate_positive_count;
///
/// assert!(validate_positive_count("numProducer", 4).is_ok());
/// assert!(validate_positive_count("numProducer", 0).is_err());
/// ```
pub fn validate_positive_count(name: &str, value: u32) -> Result<(), String> {
    if value == 0 {
        return Err(format!("{} must be a positive integer, got {}", name, value));
    }
    Ok(())
}

/// Validate that a log file exists and can be read
///
/// # Arguments
/// * `path` - Path to the log file
///
/// # Returns
/// * `Ok(())` if the path names a readable regular file
/// * `Err(String)` describing why it cannot be used
pub fn validate_log_file(path: &Path) -> Result<(), String> {
    let metadata = fs::metadata(path)
        .map_err(|e| format!("Log file {} doesn't exist or is unreadable: {}", path.display(), e))?;

    if !metadata.is_file() {
        return Err(format!("Log path {} is not a regular file", path.display()));
    }

    fs::File::open(path)
        .map_err(|e| format!("Log file {} cannot be opened: {}", path.display(), e))?;

    Ok(())
}

/// Check whether a results directory exists, creating it if it does not
///
/// Returns `true` when the directory had to be created.
pub fn ensure_output_dir(path: &Path) -> std::io::Result<bool> {
    if path.as_os_str().is_empty() || path.is_dir() {
        log::debug!("Directory already exists at: {}", path.display());
        return Ok(false);
    }
    fs::create_dir_all(path)?;
    log::info!("Directory created at: {}", path.display());
    Ok(true)
}
