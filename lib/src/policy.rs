// trailer-core - per-trailer placement and duplicate-handling policy
// Copyright (C) 2016, 2017 Matthias Beyer <mail@beyermatthias.de>
// Copyright (C) 2016, 2017 Julian Ganz <neither@nut.email>
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.
//

//! Trailer placement and merge policies
//!
//! A `Policy` fixes, for a given trailer token, where a new value is inserted
//! relative to a matching existing trailer and what happens when one already
//! exists or is altogether missing.
//!

use std::fmt;

/// On which side of a matching input trailer an argument trailer is inserted
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Where {
    After,
    Before,
}

impl Default for Where {
    fn default() -> Self {
        Where::After
    }
}

/// What to do when at least one input trailer shares the token
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IfExists {
    AddIfDifferent,
    AddIfDifferentNeighbor,
    Add,
    Overwrite,
    DoNothing,
}

impl Default for IfExists {
    fn default() -> Self {
        IfExists::AddIfDifferentNeighbor
    }
}

/// What to do when no input trailer shares the token
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IfMissing {
    Add,
    DoNothing,
}

impl Default for IfMissing {
    fn default() -> Self {
        IfMissing::Add
    }
}

/// The three independent knobs governing a trailer's merge behaviour
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Policy {
    pub where_: Where,
    pub if_exists: IfExists,
    pub if_missing: IfMissing,
}

/// Error returned when a textual policy value does not name a known variant
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownPolicyValue(pub String);

impl fmt::Display for UnknownPolicyValue {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "unknown policy value '{}'", self.0)
    }
}

impl std::str::FromStr for Where {
    type Err = UnknownPolicyValue;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "after" => Ok(Where::After),
            "before" => Ok(Where::Before),
            _ => Err(UnknownPolicyValue(s.to_owned())),
        }
    }
}

impl std::str::FromStr for IfExists {
    type Err = UnknownPolicyValue;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "addifdifferent" => Ok(IfExists::AddIfDifferent),
            "addifdifferentneighbor" => Ok(IfExists::AddIfDifferentNeighbor),
            "add" => Ok(IfExists::Add),
            "overwrite" => Ok(IfExists::Overwrite),
            "donothing" => Ok(IfExists::DoNothing),
            _ => Err(UnknownPolicyValue(s.to_owned())),
        }
    }
}

impl std::str::FromStr for IfMissing {
    type Err = UnknownPolicyValue;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "add" => Ok(IfMissing::Add),
            "donothing" => Ok(IfMissing::DoNothing),
            _ => Err(UnknownPolicyValue(s.to_owned())),
        }
    }
}
