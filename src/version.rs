//! # Version Derivation
//!
//! Decides the version of a freshly merged script by comparing it with the
//! artifact from the last commit.
//!
//! ## Rules
//!
//! 1.  **Prefix configured** (manifest `version`, normalised to end with
//!     `.`): when the new script is unchanged, a previous version exists and
//!     it already starts with the prefix, that version is reused. Otherwise the
//!     result is the prefix followed by a fresh timestamp.
//! 2.  **No prefix, unchanged**: the previous version is reused.
//! 3.  **No prefix, changed or no previous version**: a bare fresh timestamp.
//!
//! "Unchanged" means [`Document::equals_ignoring_version`].
//!
//! ## Timestamps
//!
//! A fresh suffix is `YYYYMMDD.HHMMSS` in local time followed by the tenth
//! of a second. When a previous version exists the suffix is re-sampled until
//! the result differs from it, at most [`MAX_ATTEMPTS`] times with
//! [`RETRY_DELAY`] between samples, so two builds inside the same tenth of a
//! second still get distinct versions.

use crate::error::{Error, Result};
use crate::manifest::BuildInfo;
use crate::script::Document;
use chrono::{Local, NaiveDateTime, Timelike};
use std::time::Duration;

/// Upper bound on timestamp samples taken for one version.
pub const MAX_ATTEMPTS: usize = 20;
/// Pause between two samples.
pub const RETRY_DELAY: Duration = Duration::from_millis(20);

/// Source of the current time.
pub trait Clock {
    fn now(&self) -> NaiveDateTime;
}

/// Wall clock in the local time zone.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> NaiveDateTime {
        Local::now().naive_local()
    }
}

/// Render `t` as `YYYYMMDD.HHMMSS` plus one digit of tenths of a second.
pub fn time_version(t: NaiveDateTime) -> String {
    let tenths = (t.nanosecond() % 1_000_000_000) / 100_000_000;
    format!("{}{}", t.format("%Y%m%d.%H%M%S"), tenths)
}

/// Ensure a non-empty prefix ends with `.`.
pub fn normalize_prefix(prefix: &str) -> String {
    if prefix.ends_with('.') {
        prefix.to_string()
    } else {
        format!("{}.", prefix)
    }
}

/// Produce `prefix + timestamp`, distinct from `previous` when given.
fn fresh_version(prefix: &str, previous: Option<&str>, clock: &dyn Clock) -> Result<String> {
    for attempt in 0..MAX_ATTEMPTS {
        let candidate = format!("{}{}", prefix, time_version(clock.now()));
        if previous != Some(candidate.as_str()) {
            return Ok(candidate);
        }
        log::debug!(
            "Version {} equals previous version (attempt {}), sampling again",
            candidate,
            attempt + 1
        );
        std::thread::sleep(RETRY_DELAY);
    }
    Err(Error::Version {
        message: format!(
            "could not produce a version different from {} after {} attempts",
            previous.unwrap_or_default(),
            MAX_ATTEMPTS
        ),
    })
}

/// Derive the version for `merged`.
///
/// `previous` is the artifact from the last commit, if there is one. The
/// version entry of `merged` is not consulted.
pub fn derive_version(
    previous: Option<&Document>,
    merged: &Document,
    info: &BuildInfo,
    clock: &dyn Clock,
) -> Result<String> {
    let unchanged = previous.is_some_and(|p| merged.equals_ignoring_version(p));
    let previous_version = previous
        .and_then(Document::version)
        .filter(|v| !v.is_empty());

    let prefix = info.version_prefix();
    if !prefix.is_empty() {
        let prefix = normalize_prefix(prefix);
        if let Some(v) = previous_version {
            if unchanged && v.starts_with(&prefix) {
                return Ok(v.to_string());
            }
        }
        return fresh_version(&prefix, previous_version, clock);
    }

    if let Some(v) = previous_version {
        if unchanged {
            return Ok(v.to_string());
        }
    }
    fresh_version("", previous_version, clock)
}
