// trailer-core - three-pass trailer merge engine
// Copyright (C) 2016, 2017 Matthias Beyer <mail@beyermatthias.de>
// Copyright (C) 2016, 2017 Julian Ganz <neither@nut.email>
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.
//

//! Merging argument trailers into an input trailer sequence
//!
//! This mirrors upstream git's three-pass `process_trailers_lists`: argument
//! trailers placed `After` a matching token are resolved first, scanning the
//! input tail to head; then `Before` trailers, scanning head to tail; any
//! argument left over at that point names a token absent from the input and
//! is dispatched by its `if_missing` policy instead.
//!

use crate::list::{Item, NodeId, TrailerList};
use crate::policy::{IfExists, IfMissing, Where};

/// Length of `s` up to (and including) its last ASCII alphanumeric character
///
/// Trailing punctuation such as the `:` in "Fixes:" is not part of the token
/// for matching purposes.
pub(crate) fn alnum_len(s: &str) -> usize {
    s.trim_end_matches(|c: char| !c.is_ascii_alphanumeric()).len()
}

fn same_token(a: &str, b: &str, alnum_len: usize) -> bool {
    let a = a.as_bytes();
    let b = b.as_bytes();
    if a.len() < alnum_len || b.len() < alnum_len {
        return false;
    }
    a[..alnum_len].eq_ignore_ascii_case(&b[..alnum_len])
}

fn same_value(a: &str, b: &str) -> bool {
    a.eq_ignore_ascii_case(b)
}

/// Merge `args` into `input` in place, consuming `args`
///
/// After this call `args` is empty: every item has either been folded into
/// `input` or discarded per its `if_exists`/`if_missing` policy.
pub fn merge(input: &mut TrailerList, mut args: TrailerList) {
    if args.is_empty() {
        return;
    }

    let mut cur = input.tail();
    while let Some(in_id) = cur {
        process_input_token(input, &mut args, in_id, Where::After);
        cur = input.prev(in_id);
        if args.is_empty() {
            break;
        }
    }
    input.refresh_tail();

    if !args.is_empty() {
        let mut cur = input.head();
        while let Some(in_id) = cur {
            process_input_token(input, &mut args, in_id, Where::Before);
            cur = input.next(in_id);
            if args.is_empty() {
                break;
            }
        }
        input.refresh_head();
    }

    while let Some(item) = args.pop_front() {
        apply_if_missing(input, item);
    }
}

/// Resolve every argument matching `in_tok`'s token and placed on `where_`'s side
fn process_input_token(
    input: &mut TrailerList,
    args: &mut TrailerList,
    in_tok0: NodeId,
    where_: Where,
) {
    let after = where_ == Where::After;
    let token = input.get(in_tok0).token.clone();
    let tok_alnum_len = alnum_len(&token);

    let mut in_tok = in_tok0;
    let mut cur = args.head();
    while let Some(arg_id) = cur {
        let next = args.next(arg_id);
        let arg = args.get(arg_id);

        if !same_token(&token, &arg.token, tok_alnum_len) || arg.policy.where_ != where_ {
            cur = next;
            continue;
        }

        args.unlink(arg_id);
        let item = args.get(arg_id).clone();

        if let Some(added) = apply_if_exists(input, in_tok, item, tok_alnum_len, after) {
            let adjacent = if after { input.next(in_tok) } else { input.prev(in_tok) };
            if adjacent == Some(added) {
                in_tok = added;
            }
        }
        cur = next;
    }
}

fn add_arg_to_input_list(input: &mut TrailerList, in_tok: NodeId, arg: Item) -> NodeId {
    if arg.policy.where_ == Where::After {
        input.insert_after(in_tok, arg)
    } else {
        input.insert_before(in_tok, arg)
    }
}

fn check_if_different(
    input: &TrailerList,
    in_tok: NodeId,
    arg: &Item,
    alnum_len: usize,
    check_all: bool,
    after: bool,
) -> bool {
    let mut cur = Some(in_tok);
    let mut visited_neighbor = false;
    loop {
        let id = match cur {
            Some(id) => id,
            None => return true,
        };
        let item = input.get(id);
        if same_token(&item.token, &arg.token, alnum_len) && same_value(&item.value, &arg.value) {
            return false;
        }
        if !check_all && visited_neighbor {
            return true;
        }
        visited_neighbor = true;
        cur = if after { input.prev(id) } else { input.next(id) };
    }
}

/// Apply `arg`'s `if_exists` policy against the matching `in_tok`
///
/// Returns the id of a newly-spliced node, if one was added.
fn apply_if_exists(
    input: &mut TrailerList,
    in_tok: NodeId,
    arg: Item,
    tok_alnum_len: usize,
    after: bool,
) -> Option<NodeId> {
    match arg.policy.if_exists {
        IfExists::DoNothing => None,
        IfExists::Overwrite => {
            input.get_mut(in_tok).value = arg.value;
            None
        }
        IfExists::Add => Some(add_arg_to_input_list(input, in_tok, arg)),
        IfExists::AddIfDifferent => {
            if check_if_different(input, in_tok, &arg, tok_alnum_len, true, after) {
                Some(add_arg_to_input_list(input, in_tok, arg))
            } else {
                None
            }
        }
        IfExists::AddIfDifferentNeighbor => {
            if check_if_different(input, in_tok, &arg, tok_alnum_len, false, after) {
                Some(add_arg_to_input_list(input, in_tok, arg))
            } else {
                None
            }
        }
    }
}

fn apply_if_missing(input: &mut TrailerList, arg: Item) {
    match arg.policy.if_missing {
        IfMissing::DoNothing => {}
        IfMissing::Add => match arg.policy.where_ {
            Where::After => {
                input.push_back(arg);
            }
            Where::Before => {
                input.readopt_front(arg);
            }
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::policy::Policy;

    fn tokens(list: &TrailerList) -> Vec<(String, String)> {
        list.iter().map(|(_, item)| (item.token.clone(), item.value.clone())).collect()
    }

    fn arg(token: &str, value: &str, policy: Policy) -> Item {
        Item::new(token, value).with_policy(policy)
    }

    #[test]
    fn add_if_different_neighbor_skips_adjacent_duplicate() {
        let mut input: TrailerList = [Item::new("Acked-by", "A U Thor")].into_iter().collect();
        let mut args = TrailerList::new();
        args.push_back(arg("Acked-by", "A U Thor", Policy::default()));

        merge(&mut input, args);
        assert_eq!(tokens(&input), vec![("Acked-by".into(), "A U Thor".into())]);
    }

    #[test]
    fn add_if_different_neighbor_appends_distinct_value() {
        let mut input: TrailerList = [Item::new("Acked-by", "A U Thor")].into_iter().collect();
        let mut args = TrailerList::new();
        args.push_back(arg("Acked-by", "Other Person", Policy::default()));

        merge(&mut input, args);
        assert_eq!(
            tokens(&input),
            vec![("Acked-by".into(), "A U Thor".into()), ("Acked-by".into(), "Other Person".into())]
        );
    }

    #[test]
    fn overwrite_replaces_existing_value() {
        let mut input: TrailerList = [Item::new("Fixes", "old")].into_iter().collect();
        let mut args = TrailerList::new();
        let policy = Policy { if_exists: IfExists::Overwrite, ..Policy::default() };
        args.push_back(arg("Fixes", "new", policy));

        merge(&mut input, args);
        assert_eq!(tokens(&input), vec![("Fixes".into(), "new".into())]);
    }

    #[test]
    fn do_nothing_on_exists_discards_argument() {
        let mut input: TrailerList = [Item::new("Fixes", "old")].into_iter().collect();
        let mut args = TrailerList::new();
        let policy = Policy { if_exists: IfExists::DoNothing, ..Policy::default() };
        args.push_back(arg("Fixes", "new", policy));

        merge(&mut input, args);
        assert_eq!(tokens(&input), vec![("Fixes".into(), "old".into())]);
    }

    #[test]
    fn before_policy_inserts_ahead_of_match() {
        let mut input: TrailerList = [Item::new("Reviewed-by", "A"), Item::new("Tested-by", "B")]
            .into_iter()
            .collect();
        let mut args = TrailerList::new();
        let policy = Policy { where_: Where::Before, if_exists: IfExists::Add, ..Policy::default() };
        args.push_back(arg("Tested-by", "C", policy));

        merge(&mut input, args);
        assert_eq!(
            tokens(&input),
            vec![
                ("Reviewed-by".into(), "A".into()),
                ("Tested-by".into(), "C".into()),
                ("Tested-by".into(), "B".into())
            ]
        );
    }

    #[test]
    fn missing_after_appends_to_tail() {
        let mut input: TrailerList = [Item::new("Signed-off-by", "A")].into_iter().collect();
        let mut args = TrailerList::new();
        args.push_back(arg("Cc", "someone", Policy::default()));

        merge(&mut input, args);
        assert_eq!(
            tokens(&input),
            vec![("Signed-off-by".into(), "A".into()), ("Cc".into(), "someone".into())]
        );
    }

    #[test]
    fn missing_before_prepends_to_head() {
        let mut input: TrailerList = [Item::new("Signed-off-by", "A")].into_iter().collect();
        let mut args = TrailerList::new();
        let policy = Policy { where_: Where::Before, ..Policy::default() };
        args.push_back(arg("Cc", "someone", policy));

        merge(&mut input, args);
        assert_eq!(
            tokens(&input),
            vec![("Cc".into(), "someone".into()), ("Signed-off-by".into(), "A".into())]
        );
    }

    #[test]
    fn missing_do_nothing_is_discarded() {
        let mut input = TrailerList::new();
        let mut args = TrailerList::new();
        let policy = Policy { if_missing: IfMissing::DoNothing, ..Policy::default() };
        args.push_back(arg("Cc", "someone", policy));

        merge(&mut input, args);
        assert!(input.is_empty());
    }

    #[test]
    fn merge_into_empty_input_seeds_first_and_last() {
        let mut input = TrailerList::new();
        let mut args = TrailerList::new();
        args.push_back(arg("Cc", "first", Policy::default()));

        merge(&mut input, args);
        assert_eq!(tokens(&input), vec![("Cc".into(), "first".into())]);
        assert!(input.well_formed());
    }

    #[test]
    fn token_matching_stops_at_trailing_punctuation() {
        let mut input: TrailerList = [Item::new("Fixes:", "old")].into_iter().collect();
        let mut args = TrailerList::new();
        let policy = Policy { if_exists: IfExists::Overwrite, ..Policy::default() };
        args.push_back(arg("Fixes", "new", policy));

        merge(&mut input, args);
        assert_eq!(tokens(&input), vec![("Fixes:".into(), "new".into())]);
    }

    #[test]
    fn neighbor_policy_suppresses_when_only_the_neighbor_matches() {
        // The tail ("2") is where the After-placed arg lands and does not
        // match the arg's value itself, but its immediate prev neighbor
        // ("1") does: the neighbor policy must still suppress here, not just
        // when the anchor itself matches.
        let mut input: TrailerList =
            [Item::new("Acked-by", "1"), Item::new("Acked-by", "2")].into_iter().collect();
        let mut args = TrailerList::new();
        args.push_back(arg("Acked-by", "1", Policy::default()));

        merge(&mut input, args);
        assert_eq!(
            tokens(&input),
            vec![("Acked-by".into(), "1".into()), ("Acked-by".into(), "2".into())]
        );
    }

    #[test]
    fn neighbor_policy_does_not_reach_past_a_differently_tokened_neighbor() {
        // Spec S3: a same-token duplicate that sits two hops away, separated
        // by a different token, is not the "immediate neighbor" and must not
        // suppress the add under AddIfDifferentNeighbor.
        let mut input: TrailerList =
            [Item::new("X", "5"), Item::new("Y", "2"), Item::new("X", "9")].into_iter().collect();
        let mut args = TrailerList::new();
        args.push_back(arg("X", "5", Policy::default()));

        merge(&mut input, args);
        assert_eq!(
            tokens(&input),
            vec![
                ("X".into(), "5".into()),
                ("Y".into(), "2".into()),
                ("X".into(), "9".into()),
                ("X".into(), "5".into()),
            ]
        );
    }

    #[test]
    fn neighbor_policy_suppresses_when_the_immediate_neighbor_matches() {
        let mut input: TrailerList =
            [Item::new("Acked-by", "1"), Item::new("Acked-by", "2")].into_iter().collect();
        let mut args = TrailerList::new();
        args.push_back(arg("Acked-by", "2", Policy::default()));

        merge(&mut input, args);
        assert_eq!(
            tokens(&input),
            vec![("Acked-by".into(), "1".into()), ("Acked-by".into(), "2".into())]
        );
    }
}
