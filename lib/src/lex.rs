// trailer-core - token/value lexer for a single trailer line
// Copyright (C) 2016, 2017 Matthias Beyer <mail@beyermatthias.de>
// Copyright (C) 2016, 2017 Julian Ganz <neither@nut.email>
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.
//

//! Trailer lexing
//!
//! A single `token(=|:)value` string, whether it came from stdin or from a
//! command-line argument, is split here into its two halves. Unlike upstream
//! git's trailer parser, this function never fails: text with no delimiter at
//! all becomes a trailer with an empty value, so that anything reaching this
//! function turns into an item (see the "unparsable trailer" error class).
//!

/// Split a trailer-shaped string into its token and value
///
/// The first occurrence of `=` or `:`, whichever comes first, delimits token
/// from value. Both halves are trimmed of leading/trailing ASCII whitespace.
/// If neither delimiter is present, the whole (trimmed) string becomes the
/// token and the value is empty.
pub fn parse(s: &str) -> (String, String) {
    match s.find(|c| c == '=' || c == ':') {
        Some(idx) => {
            let token = s[..idx].trim().to_owned();
            let value = s[idx + 1..].trim().to_owned();
            (token, value)
        }
        None => (s.trim().to_owned(), String::new()),
    }
}
