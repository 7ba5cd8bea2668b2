//! Bitrate parsing utilities.
//!
//! This module parses human-written link rates (e.g., "100Mbps") into
//! integer bits/second values.

use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

/// Match: "<digits><unit>" with no whitespace and no decimal point
static BITRATE_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(\d+)(bps|Kbps|Mbps|Gbps)$").expect("Invalid bitrate regex")
});

/// Errors that can occur while parsing a bitrate string
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BitrateError {
    #[error("Input bitrate '{0}' is not valid (expected e.g. \"100Mbps\")")]
    InvalidRateFormat(String),
}

/// Unit a rate was written in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RateUnit {
    Bps,
    Kbps,
    Mbps,
    Gbps,
}

impl RateUnit {
    /// Fixed multiplier to bits/second
    pub fn multiplier(self) -> u64 {
        match self {
            RateUnit::Bps => 1,
            RateUnit::Kbps => 1_000,
            RateUnit::Mbps => 1_000_000,
            RateUnit::Gbps => 1_000_000_000,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            RateUnit::Bps => "bps",
            RateUnit::Kbps => "Kbps",
            RateUnit::Mbps => "Mbps",
            RateUnit::Gbps => "Gbps",
        }
    }

    fn from_token(token: &str) -> Option<Self> {
        match token {
            "bps" => Some(RateUnit::Bps),
            "Kbps" => Some(RateUnit::Kbps),
            "Mbps" => Some(RateUnit::Mbps),
            "Gbps" => Some(RateUnit::Gbps),
            _ => None,
        }
    }
}

impl fmt::Display for RateUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A link rate in bits/second, remembering how it was written.
///
/// `Display` renders the parsed form, so a parsed rate can be written back
/// into a topology file unchanged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct RateValue {
    magnitude: u64,
    unit: RateUnit,
    bits_per_second: u64,
}

impl RateValue {
    /// Build a rate from a magnitude and unit, failing on overflow
    pub fn new(magnitude: u64, unit: RateUnit) -> Option<Self> {
        let bits_per_second = magnitude.checked_mul(unit.multiplier())?;
        Some(Self {
            magnitude,
            unit,
            bits_per_second,
        })
    }

    pub fn bits_per_second(&self) -> u64 {
        self.bits_per_second
    }

    pub fn magnitude(&self) -> u64 {
        self.magnitude
    }

    pub fn unit(&self) -> RateUnit {
        self.unit
    }
}

impl fmt::Display for RateValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.magnitude, self.unit)
    }
}

impl FromStr for RateValue {
    type Err = BitrateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_bitrate(s)
    }
}

impl TryFrom<String> for RateValue {
    type Error = BitrateError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        parse_bitrate(&value)
    }
}

impl From<RateValue> for String {
    fn from(value: RateValue) -> Self {
        value.to_string()
    }
}

/// Parse a bitrate string (e.g., "100Mbps", "1Gbps") to bits/second
///
/// The unit token is case-sensitive and must immediately follow the digits:
/// - bps: x1
/// - Kbps: x1_000
/// - Mbps: x1_000_000
/// - Gbps: x1_000_000_000
///
/// # Examples
/// ```
/// use aggsim::utils::bitrate::parse_bitrate;
///
/// assert_eq!(parse_bitrate("100Mbps").unwrap().bits_per_second(), 100_000_000);
/// assert_eq!(parse_bitrate("1Gbps").unwrap().bits_per_second(), 1_000_000_000);
/// assert!(parse_bitrate("7Xbps").is_err());
/// ```
pub fn parse_bitrate(input: &str) -> Result<RateValue, BitrateError> {
    let invalid = || BitrateError::InvalidRateFormat(input.to_string());

    let caps = BITRATE_PATTERN.captures(input).ok_or_else(invalid)?;
    let magnitude: u64 = caps
        .get(1)
        .and_then(|m| m.as_str().parse().ok())
        .ok_or_else(invalid)?;
    let unit = caps
        .get(2)
        .and_then(|m| RateUnit::from_token(m.as_str()))
        .ok_or_else(invalid)?;

    RateValue::new(magnitude, unit).ok_or_else(invalid)
}
