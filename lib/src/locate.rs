// trailer-core - backward scan locating a message's trailing trailer block
// Copyright (C) 2016, 2017 Matthias Beyer <mail@beyermatthias.de>
// Copyright (C) 2016, 2017 Julian Ganz <neither@nut.email>
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.
//

//! Trailer-block location
//!
//! Finds the index at which the trailing block of "Key: Value" lines of a
//! message begins, scanning from the end of the message upward.
//!

/// Locate the start of the trailer block within `lines`
///
/// Returns an index `start` such that `lines[start..]` is the contiguous
/// trailer block and `lines[..start]` is passed through byte-for-byte. A run
/// of blank lines immediately above the block is consumed (it belongs to
/// neither side) but does not itself become part of the pass-through prefix
/// unless the scan runs off the top of the message.
pub fn locate<S: AsRef<str>>(lines: &[S]) -> usize {
    let n = lines.len();
    let mut empty = true;

    for idx in (0..n).rev() {
        let line = lines[idx].as_ref();
        if line.trim().is_empty() {
            if empty {
                continue;
            }
            return idx + 1;
        }
        if line.contains(':') {
            empty = false;
            continue;
        }
        return n;
    }

    if empty {
        n
    } else {
        0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_separated_block() {
        let lines = ["foo", "", "A: 1", "B: 2"];
        assert_eq!(locate(&lines), 2);
    }

    #[test]
    fn whole_message_is_trailers() {
        let lines = ["A: 1", "B: 2"];
        assert_eq!(locate(&lines), 0);
    }

    #[test]
    fn no_trailer_block() {
        let lines = ["foo", "", "bar baz"];
        assert_eq!(locate(&lines), 3);
    }

    #[test]
    fn empty_message() {
        let lines: [&str; 0] = [];
        assert_eq!(locate(&lines), 0);
    }

    #[test]
    fn trailing_blank_run_is_consumed() {
        let lines = ["foo", "", "A: 1", "", ""];
        assert_eq!(locate(&lines), 2);
    }

    #[test]
    fn only_blank_lines() {
        let lines = ["", "", ""];
        assert_eq!(locate(&lines), 3);
    }

    #[test]
    fn non_colon_line_immediately_aborts() {
        let lines = ["A: 1", "plain text", "B: 2"];
        assert_eq!(locate(&lines), 3);
    }
}
