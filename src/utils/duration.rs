//! Link delay utilities.
//!
//! This module parses delay strings given on the command line (e.g., "2ms")
//! and renders delays the way the simulator's topology reader expects them.

use std::time::Duration;

use humantime_serde::re::humantime::parse_duration;

/// Parse a delay string (e.g., "2ms", "500us", "1s") to a `Duration`
///
/// Uses the same humantime grammar as the `link.delay` configuration field,
/// so a delay given on the command line and one read from YAML always agree.
/// A unit is required.
///
/// # Examples
/// ```
/// use std::time::Duration;
/// use aggsim::utils::duration::parse_delay;
///
/// assert_eq!(parse_delay("2ms"), Ok(Duration::from_millis(2)));
/// assert_eq!(parse_delay("500us"), Ok(Duration::from_micros(500)));
/// assert!(parse_delay("2").is_err());
/// ```
pub fn parse_delay(delay: &str) -> Result<Duration, String> {
    parse_duration(delay.trim()).map_err(|e| format!("Invalid delay '{}': {}", delay, e))
}

/// Render a delay as "<n>ms", falling back to "<n>us" below millisecond precision
pub fn format_delay(delay: Duration) -> String {
    let micros = delay.as_micros();
    if micros % 1000 == 0 {
        format!("{}ms", micros / 1000)
    } else {
        format!("{}us", micros)
    }
}
