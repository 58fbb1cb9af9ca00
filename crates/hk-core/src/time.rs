//! Timestamp helpers.
//!
//! Timestamps are kept as `DateTime<FixedOffset>` and only formatted at the
//! edges: RFC 3339 on disk and over JSON, [`DISPLAY_FORMAT`] on dashboards.
//! The offset recorded with each stamp is resolved for that instant, so local
//! and named zones follow daylight-saving changes in a long-running process.

use std::fmt;

use chrono::{DateTime, FixedOffset, Local, Offset, Utc};
use chrono_tz::Tz;

/// Human-facing timestamp layout used by dashboards and text output.
pub const DISPLAY_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Zone new timestamps are expressed in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StampZone {
    /// The host's local zone, looked up per stamp.
    #[default]
    Local,
    /// A constant offset such as `+01:00`.
    Fixed(FixedOffset),
    /// An IANA zone such as `Europe/Berlin`.
    Named(Tz),
}

impl StampZone {
    /// Parse `local`, `Z`/`UTC`, an offset like `+01:00`, or an IANA zone name.
    pub fn parse(value: &str) -> Result<Self, String> {
        let value = value.trim();
        if value.eq_ignore_ascii_case("local") {
            return Ok(Self::Local);
        }
        if value.eq_ignore_ascii_case("z") || value.eq_ignore_ascii_case("utc") {
            return Ok(Self::Fixed(Utc.fix()));
        }
        if value.starts_with(['+', '-']) {
            return value
                .parse::<FixedOffset>()
                .map(Self::Fixed)
                .map_err(|e| format!("invalid UTC offset '{value}': {e} (expected e.g. +01:00)"));
        }
        value.parse::<Tz>().map(Self::Named).map_err(|e| {
            format!("unknown time zone '{value}': {e} (expected e.g. Europe/Berlin or +01:00)")
        })
    }

    /// `instant` expressed in this zone.
    pub fn stamp(&self, instant: DateTime<Utc>) -> DateTime<FixedOffset> {
        match self {
            Self::Local => instant.with_timezone(&Local).fixed_offset(),
            Self::Fixed(offset) => instant.with_timezone(offset),
            Self::Named(tz) => instant.with_timezone(tz).fixed_offset(),
        }
    }

    pub fn now(&self) -> DateTime<FixedOffset> {
        self.stamp(Utc::now())
    }
}

impl fmt::Display for StampZone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Local => f.write_str("local"),
            Self::Fixed(offset) => write!(f, "{offset}"),
            Self::Named(tz) => f.write_str(tz.name()),
        }
    }
}

pub fn display(ts: &DateTime<FixedOffset>) -> String {
    ts.format(DISPLAY_FORMAT).to_string()
}
