// trailer-core - minimal git-config-flavored configuration source parser
// Copyright (C) 2016, 2017 Matthias Beyer <mail@beyermatthias.de>
// Copyright (C) 2016, 2017 Julian Ganz <neither@nut.email>
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.
//

//! A minimal `git-config`-flavored text parser
//!
//! Recognizes just enough of the format to express
//! `trailer.<short>.<suffix> = value` and `gc.<key> = value` assignments:
//! `[section "subsection"]` headers and `key = value` lines, `#`/`;`
//! comments, blank lines. Anything the grammar does not recognize is a
//! non-fatal diagnostic, not a parse failure — a single bad line in a
//! config source should not cost the rest of it.
//!

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref SECTION_RE: Regex =
        Regex::new(r#"^\[([A-Za-z0-9_-]+)(?:\s+"([^"]*)")?\]$"#).unwrap();
}

/// Parse `text` into `(key, value)` pairs
///
/// Each pair's key is `section.subsection.key` when inside a subsection-ed
/// header, or `section.key` otherwise (lowercased on the section name only,
/// matching `git-config`'s own case-folding of section and key names; the
/// value is returned verbatim).
pub fn parse(text: &str) -> Vec<(String, String)> {
    let mut pairs = Vec::new();
    let mut section: Option<(String, Option<String>)> = None;

    for (lineno, raw) in text.lines().enumerate() {
        let line = strip_comment(raw).trim();
        if line.is_empty() {
            continue;
        }

        if line.starts_with('[') {
            match SECTION_RE.captures(line) {
                Some(caps) => {
                    let name = caps.get(1).unwrap().as_str().to_ascii_lowercase();
                    let sub = caps.get(2).map(|m| m.as_str().to_owned());
                    section = Some((name, sub));
                }
                None => {
                    log::warn!("config source line {}: malformed section header, skipping", lineno + 1);
                }
            }
            continue;
        }

        match line.find('=') {
            Some(idx) => {
                let key = line[..idx].trim();
                let value = line[idx + 1..].trim();
                if key.is_empty() {
                    log::warn!("config source line {}: empty key, skipping", lineno + 1);
                    continue;
                }
                match &section {
                    Some((name, Some(sub))) => {
                        pairs.push((format!("{}.{}.{}", name, sub, key.to_ascii_lowercase()), value.to_owned()));
                    }
                    Some((name, None)) => {
                        pairs.push((format!("{}.{}", name, key.to_ascii_lowercase()), value.to_owned()));
                    }
                    None => {
                        log::warn!("config source line {}: assignment outside any section, skipping", lineno + 1);
                    }
                }
            }
            None => {
                log::warn!("config source line {}: no '=' found, skipping", lineno + 1);
            }
        }
    }

    pairs
}

fn strip_comment(line: &str) -> &str {
    for (idx, c) in line.char_indices() {
        if c == '#' || c == ';' {
            return &line[..idx];
        }
    }
    line
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_subsectioned_entry() {
        let pairs = parse("[trailer \"see\"]\n\tkey = See-also\n\twhere = before\n");
        assert_eq!(
            pairs,
            vec![
                ("trailer.see.key".to_owned(), "See-also".to_owned()),
                ("trailer.see.where".to_owned(), "before".to_owned()),
            ]
        );
    }

    #[test]
    fn parses_plain_section() {
        let pairs = parse("[gc]\n\tauto = 6700\n");
        assert_eq!(pairs, vec![("gc.auto".to_owned(), "6700".to_owned())]);
    }

    #[test]
    fn comments_and_blank_lines_are_ignored() {
        let pairs = parse("# a comment\n\n[trailer \"sign\"]\n; another comment\nkey = Signed-off-by\n");
        assert_eq!(pairs, vec![("trailer.sign.key".to_owned(), "Signed-off-by".to_owned())]);
    }

    #[test]
    fn malformed_line_is_skipped_rest_still_loads() {
        let pairs = parse("[trailer \"sign\"]\nthis has no equals\nkey = Signed-off-by\n");
        assert_eq!(pairs, vec![("trailer.sign.key".to_owned(), "Signed-off-by".to_owned())]);
    }

    #[test]
    fn assignment_outside_section_is_skipped() {
        let pairs = parse("key = value\n[gc]\nauto = 1\n");
        assert_eq!(pairs, vec![("gc.auto".to_owned(), "1".to_owned())]);
    }

    #[test]
    fn malformed_section_header_is_skipped() {
        let pairs = parse("[trailer see\nkey = x\n[gc]\nauto = 1\n");
        assert_eq!(pairs, vec![("gc.auto".to_owned(), "1".to_owned())]);
    }
}
