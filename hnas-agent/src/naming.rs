//! Snapshot and share names.
//!
//! Share names end in `_YYYYMMDD_HHMMSS` so the retention sweep can recover
//! their creation time from the name alone.

use chrono::{DateTime, Duration, Local, NaiveDateTime, TimeZone, Timelike};

/// `strftime` layout of run and share timestamps.
pub const TIMESTAMP_FORMAT: &str = "%Y%m%d_%H%M%S";

/// Snapshot name prefix used when no search tag is configured.
pub const DEFAULT_SNAPSHOT_PREFIX: &str = "veeam";

pub fn format_timestamp<Tz: TimeZone>(at: &DateTime<Tz>) -> String
where
    Tz::Offset: std::fmt::Display,
{
    at.format(TIMESTAMP_FORMAT).to_string()
}

/// Whether a filesystem reference is a 32 character hex object ID rather
/// than a label.
pub fn is_filesystem_id(reference: &str) -> bool {
    reference.len() == 32 && reference.chars().all(|c| c.is_ascii_hexdigit())
}

/// `{tag}_{label}_{run_timestamp}`, with `veeam` standing in for a missing tag.
pub fn snapshot_name(search_tag: Option<&str>, label: &str, run_timestamp: &str) -> String {
    format!(
        "{}_{}_{}",
        search_tag.unwrap_or(DEFAULT_SNAPSHOT_PREFIX),
        label,
        run_timestamp
    )
}

/// `{prefix}_{YYYYMMDD}_{HHMMSS}` for a share created at `at`.
pub fn share_name(prefix: &str, at: &DateTime<Local>) -> String {
    format!("{}_{}", prefix, format_timestamp(at))
}

/// Issues share names for one run. Names only resolve to the second, so a
/// repeat within the same second moves on to the next free second.
#[derive(Debug)]
pub struct ShareNamer {
    prefix: String,
    last: Option<DateTime<Local>>,
}

impl ShareNamer {
    pub fn new(prefix: impl Into<String>) -> Self {
        ShareNamer {
            prefix: prefix.into(),
            last: None,
        }
    }

    pub fn next(&mut self, now: DateTime<Local>) -> String {
        let mut at = now.with_nanosecond(0).unwrap_or(now);
        if let Some(last) = self.last {
            if at <= last {
                at = last + Duration::seconds(1);
            }
        }
        self.last = Some(at);
        share_name(&self.prefix, &at)
    }
}

/// Creation time encoded in the trailing `_YYYYMMDD_HHMMSS` of a share name.
pub fn parse_share_timestamp(name: &str) -> Option<NaiveDateTime> {
    let mut parts = name.rsplitn(3, '_');
    let time = parts.next()?;
    let date = parts.next()?;
    // Something must precede the timestamp.
    parts.next()?;

    if date.len() != 8 || time.len() != 6 {
        return None;
    }
    NaiveDateTime::parse_from_str(&format!("{}_{}", date, time), TIMESTAMP_FORMAT).ok()
}
