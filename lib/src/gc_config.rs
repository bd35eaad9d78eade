// trailer-core - gc.* housekeeping configuration and auto-trigger thresholds
// Copyright (C) 2016, 2017 Matthias Beyer <mail@beyermatthias.de>
// Copyright (C) 2016, 2017 Julian Ganz <neither@nut.email>
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.
//

//! Housekeeping configuration values exposed for the sibling orchestrator
//!
//! This crate does not run a repack or a prune; it only parses the `gc.*`
//! and `repack.usedeltabaseoffset` keys into one typed struct so a sibling
//! driver binary has a single place to read them from, without
//! re-implementing the config-source grammar.
//!

use chrono::{Duration, UTC};

/// Typed view of the `gc.*`/`repack.usedeltabaseoffset` configuration keys
#[derive(Debug, Clone, PartialEq)]
pub struct GcConfig {
    pub auto_threshold: i64,
    pub auto_pack_limit: i64,
    pub auto_detach: bool,
    pub prune_expire: String,
    pub prune_repos_expire: String,
    pub aggressive_window: i64,
    pub aggressive_depth: i64,
    pub aggressive_commit_limits: String,
    pub less_aggressive_window: i64,
    pub less_aggressive_depth: i64,
    pub use_delta_base_offset: bool,
}

impl Default for GcConfig {
    fn default() -> Self {
        GcConfig {
            auto_threshold: 6700,
            auto_pack_limit: 50,
            auto_detach: true,
            prune_expire: "2.weeks.ago".to_owned(),
            prune_repos_expire: "2.weeks.ago".to_owned(),
            aggressive_window: 250,
            aggressive_depth: 250,
            aggressive_commit_limits: "--before=1.year.ago".to_owned(),
            less_aggressive_window: 250,
            less_aggressive_depth: 50,
            use_delta_base_offset: true,
        }
    }
}

impl GcConfig {
    /// Apply every `gc.*`/`repack.usedeltabaseoffset` pair in `pairs`
    ///
    /// Unrecognized keys are ignored. `gc.pruneexpire`/`gc.prunereposexpire`
    /// values other than `"now"` that resolve to a point in the future are
    /// rejected with a warning and leave the prior value in place.
    pub fn load<I, K, V>(&mut self, pairs: I)
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        for (key, value) in pairs {
            let key = key.as_ref();
            let value = value.as_ref();
            match key.to_ascii_lowercase().as_str() {
                "gc.auto" => assign_int(&mut self.auto_threshold, key, value),
                "gc.autopacklimit" => assign_int(&mut self.auto_pack_limit, key, value),
                "gc.autodetach" => assign_bool(&mut self.auto_detach, key, value),
                "gc.pruneexpire" => assign_expiry(&mut self.prune_expire, key, value),
                "gc.prunereposexpire" => assign_expiry(&mut self.prune_repos_expire, key, value),
                "gc.aggressivewindow" => assign_int(&mut self.aggressive_window, key, value),
                "gc.aggressivedepth" => assign_int(&mut self.aggressive_depth, key, value),
                "gc.aggressivecommitlimits" => self.aggressive_commit_limits = value.to_owned(),
                "gc.lessaggressivewindow" => assign_int(&mut self.less_aggressive_window, key, value),
                "gc.lessaggressivedepth" => assign_int(&mut self.less_aggressive_depth, key, value),
                "repack.usedeltabaseoffset" => assign_bool(&mut self.use_delta_base_offset, key, value),
                _ => {}
            }
        }
    }
}

fn assign_int(slot: &mut i64, key: &str, value: &str) {
    match value.parse() {
        Ok(n) => *slot = n,
        Err(_) => log::warn!("{}: '{}' is not an integer, ignoring", key, value),
    }
}

fn assign_bool(slot: &mut bool, key: &str, value: &str) {
    match value.to_ascii_lowercase().as_str() {
        "true" | "yes" | "on" | "1" => *slot = true,
        "false" | "no" | "off" | "0" => *slot = false,
        _ => log::warn!("{}: '{}' is not a boolean, ignoring", key, value),
    }
}

fn assign_expiry(slot: &mut String, key: &str, value: &str) {
    if value != "now" {
        if let Some(when) = approx_date(value) {
            if when >= UTC::now() {
                log::warn!("invalid {}: '{}' resolves to the future", key, value);
                return;
            }
        }
    }
    *slot = value.to_owned();
}

/// A small subset of `approxidate`: `now`, `N.unit.ago`, and RFC3339 timestamps
///
/// Returns `None` for anything else, which is treated permissively (the
/// value is accepted without a future-date check) rather than rejected,
/// since this crate does not otherwise need to interpret these values.
fn approx_date(value: &str) -> Option<chrono::DateTime<UTC>> {
    if value == "now" {
        return Some(UTC::now());
    }
    if let Ok(parsed) = value.parse::<chrono::DateTime<UTC>>() {
        return Some(parsed);
    }

    let mut parts = value.splitn(3, '.');
    let (count, unit, ago) = match (parts.next(), parts.next(), parts.next()) {
        (Some(count), Some(unit), Some("ago")) => (count, unit, true),
        _ => (value, "", false),
    };
    if !ago {
        return None;
    }
    let count: i64 = count.parse().ok()?;
    let duration = match unit {
        "second" | "seconds" => Duration::seconds(count),
        "minute" | "minutes" => Duration::minutes(count),
        "hour" | "hours" => Duration::hours(count),
        "day" | "days" => Duration::days(count),
        "week" | "weeks" => Duration::weeks(count),
        "month" | "months" => Duration::days(count * 30),
        "year" | "years" => Duration::days(count * 365),
        _ => return None,
    };
    Some(UTC::now() - duration)
}
