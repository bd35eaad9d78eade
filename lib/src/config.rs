// trailer-core - trailer.<short>.<suffix> configuration registry
// Copyright (C) 2016, 2017 Matthias Beyer <mail@beyermatthias.de>
// Copyright (C) 2016, 2017 Julian Ganz <neither@nut.email>
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.
//

//! The trailer configuration registry
//!
//! Gathers `trailer.<short>.<suffix>` assignments from a configuration
//! source into one `ConfigEntry` per `<short>`, in the order each short-name
//! was first seen. A misconfigured line never aborts loading: it is logged
//! and the offending assignment is dropped, leaving whatever default or
//! earlier value was already in place.
//!

use crate::policy::{IfExists, IfMissing, Where};

/// One `trailer.<short>.*` definition gathered from the configuration source
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigEntry {
    pub name: String,
    pub key: Option<String>,
    pub command: Option<String>,
    pub where_: Where,
    pub if_exists: IfExists,
    pub if_missing: IfMissing,
}

impl ConfigEntry {
    fn new(name: impl Into<String>) -> Self {
        ConfigEntry { name: name.into(), ..Self::default() }
    }

    /// True iff `command` is set and contains the literal `$ARG` placeholder
    pub fn command_uses_arg(&self) -> bool {
        self.command.as_deref().map_or(false, |c| c.contains("$ARG"))
    }
}

/// The set of configured trailer entries, in first-seen order
#[derive(Debug, Clone, Default)]
pub struct ConfigRegistry {
    entries: Vec<ConfigEntry>,
}

impl ConfigRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load `(key, value)` pairs of the shape `trailer.<short>.<suffix>`
    ///
    /// Anything not matching that shape, or naming an unrecognized suffix, is
    /// ignored silently per the registry's own contract (the config-source
    /// parser already warns about lines it cannot parse structurally at
    /// all; this method warns about ones it understands structurally but
    /// rejects semantically: unknown policy values, and duplicate
    /// `key`/`command` assignments for the same short name).
    pub fn load<I, K, V>(&mut self, pairs: I)
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        for (key, value) in pairs {
            let key = key.as_ref();
            let value = value.as_ref();

            let mut parts = key.splitn(3, '.');
            let (section, short, suffix) = match (parts.next(), parts.next(), parts.next()) {
                (Some(section), Some(short), Some(suffix)) => (section, short, suffix),
                _ => continue,
            };
            if !section.eq_ignore_ascii_case("trailer") {
                continue;
            }

            let idx = self.index_of_or_insert(short);
            self.apply_suffix(idx, short, suffix, value);
        }
    }

    fn index_of_or_insert(&mut self, short: &str) -> usize {
        if let Some(idx) = self.entries.iter().position(|e| e.name == short) {
            return idx;
        }
        self.entries.push(ConfigEntry::new(short));
        self.entries.len() - 1
    }

    fn apply_suffix(&mut self, idx: usize, short: &str, suffix: &str, value: &str) {
        let entry = &mut self.entries[idx];
        match suffix.to_ascii_lowercase().as_str() {
            "key" => {
                if entry.key.is_some() {
                    log::warn!("trailer.{}.key set more than once, last value wins", short);
                }
                entry.key = Some(value.to_owned());
            }
            "command" => {
                if entry.command.is_some() {
                    log::warn!("trailer.{}.command set more than once, last value wins", short);
                }
                entry.command = Some(value.to_owned());
            }
            "where" => match value.parse() {
                Ok(where_) => entry.where_ = where_,
                Err(_) => log::warn!("trailer.{}.where: unknown value '{}', ignoring", short, value),
            },
            "ifexists" => match value.parse() {
                Ok(if_exists) => entry.if_exists = if_exists,
                Err(_) => log::warn!("trailer.{}.ifexists: unknown value '{}', ignoring", short, value),
            },
            "ifmissing" => match value.parse() {
                Ok(if_missing) => entry.if_missing = if_missing,
                Err(_) => log::warn!("trailer.{}.ifmissing: unknown value '{}', ignoring", short, value),
            },
            _ => {}
        }
    }

    pub fn find_by_name(&self, name: &str) -> Option<&ConfigEntry> {
        self.entries.iter().find(|e| e.name.eq_ignore_ascii_case(name))
    }

    /// Find the first entry whose `key` or `name` shares `tok`'s alnum prefix
    ///
    /// `key` is tried before `name` for a given entry; entries are tried in
    /// insertion order.
    pub fn find_by_key_or_name_prefix(&self, tok: &str) -> Option<&ConfigEntry> {
        let tok_len = crate::merge::alnum_len(tok);
        self.entries.iter().find(|e| {
            e.key.as_deref().map_or(false, |k| prefix_matches(tok, tok_len, k))
                || prefix_matches(tok, tok_len, &e.name)
        })
    }

    /// Entries with a command that never substitutes `$ARG`
    ///
    /// These are run once per invocation regardless of command-line input
    /// and contribute a synthetic argument-item (driver step 7).
    pub fn iter_commands_without_arg(&self) -> impl Iterator<Item = &ConfigEntry> {
        self.entries.iter().filter(|e| e.command.is_some() && !e.command_uses_arg())
    }

    pub fn iter(&self) -> impl Iterator<Item = &ConfigEntry> {
        self.entries.iter()
    }
}

fn prefix_matches(tok: &str, tok_alnum_len: usize, other: &str) -> bool {
    let other_len = crate::merge::alnum_len(other);
    let len = tok_alnum_len.min(other_len);
    let tok_bytes = tok.as_bytes();
    let other_bytes = other.as_bytes();
    if tok_bytes.len() < len || other_bytes.len() < len {
        return false;
    }
    tok_bytes[..len].eq_ignore_ascii_case(&other_bytes[..len])
}
