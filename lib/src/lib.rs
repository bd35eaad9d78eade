#![recursion_limit = "1024"]
// trailer-core - trailer parsing, merging and housekeeping-lock primitives
// Copyright (C) 2016, 2017 Matthias Beyer <mail@beyermatthias.de>
// Copyright (C) 2016, 2017 Julian Ganz <neither@nut.email>
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.
//

//! Trailer processing primitives
//!
//! This library locates the trailing "Key: Value" block of a free-form
//! message, merges argument trailers into it under per-token policies
//! gathered from a small configuration registry, and exposes the
//! cross-host advisory lock protocol used by the sibling housekeeping
//! driver. It does not itself touch a repository's object database.
//!

#[macro_use] extern crate error_chain;
#[macro_use] extern crate lazy_static;

pub mod command;
pub mod config;
pub mod configsrc;
pub mod error;
pub mod gc_config;
pub mod gc_lock;
pub mod lex;
pub mod list;
pub mod locate;
pub mod merge;
pub mod policy;
