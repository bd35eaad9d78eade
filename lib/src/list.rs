// trailer-core - arena-indexed doubly-linked trailer item list
// Copyright (C) 2016, 2017 Matthias Beyer <mail@beyermatthias.de>
// Copyright (C) 2016, 2017 Julian Ganz <neither@nut.email>
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.
//

//! Doubly-linked trailer sequences
//!
//! Upstream git links `trailer_item`s with raw `previous`/`next` pointers and
//! frees them by hand. We get the same splice-friendly shape in safe Rust by
//! addressing nodes through a small arena: a `NodeId` is an index into a
//! `Vec`, so inserting, unlinking and re-linking a node never needs a
//! borrowed reference to a neighbor, only its id.
//!
//! The arena never actually frees a slot once allocated (nodes only ever
//! move between lists, they are not dropped mid-run), which keeps `NodeId`s
//! stable for the lifetime of a `TrailerList`.
//!

use std::fmt;
use std::iter::FromIterator;

use crate::policy::Policy;

/// Opaque handle to a node stored in a `TrailerList`'s arena
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(usize);

/// A single trailer, with its place in the ordered sequence
#[derive(Debug, Clone)]
pub struct Item {
    pub token: String,
    pub value: String,
    pub policy: Policy,
    /// Name of the configured entry this item was created from, if any
    pub conf_name: Option<String>,
    prev: Option<NodeId>,
    next: Option<NodeId>,
}

impl Item {
    pub fn new(token: impl Into<String>, value: impl Into<String>) -> Self {
        Item {
            token: token.into(),
            value: value.into(),
            policy: Policy::default(),
            conf_name: None,
            prev: None,
            next: None,
        }
    }

    pub fn with_policy(mut self, policy: Policy) -> Self {
        self.policy = policy;
        self
    }
}

impl fmt::Display for Item {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let last = self.token.chars().last();
        match last {
            Some(c) if c.is_alphanumeric() => write!(f, "{}: {}", self.token, self.value),
            Some(c) if c.is_whitespace() || c == '#' => write!(f, "{}{}", self.token, self.value),
            _ => write!(f, "{} {}", self.token, self.value),
        }
    }
}

/// An ordered, doubly-linked sequence of trailer items
///
/// `first.prev = None`, `last.next = None`, and for every node `x`,
/// `x.prev = Some(y) <=> y.next = Some(x)`. The list owns every node reached
/// through these links; nodes unlinked via `pop_front`/`unlink` are returned
/// to the caller as plain `Item`s and may be pushed into another list.
#[derive(Debug, Default)]
pub struct TrailerList {
    arena: Vec<Item>,
    head: Option<NodeId>,
    tail: Option<NodeId>,
}

impl TrailerList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.head.is_none()
    }

    pub fn head(&self) -> Option<NodeId> {
        self.head
    }

    pub fn tail(&self) -> Option<NodeId> {
        self.tail
    }

    pub fn get(&self, id: NodeId) -> &Item {
        &self.arena[id.0]
    }

    pub fn get_mut(&mut self, id: NodeId) -> &mut Item {
        &mut self.arena[id.0]
    }

    pub fn prev(&self, id: NodeId) -> Option<NodeId> {
        self.arena[id.0].prev
    }

    pub fn next(&self, id: NodeId) -> Option<NodeId> {
        self.arena[id.0].next
    }

    fn alloc(&mut self, mut item: Item) -> NodeId {
        item.prev = None;
        item.next = None;
        let id = NodeId(self.arena.len());
        self.arena.push(item);
        id
    }

    /// Append `item` at the tail of the list, returning its new id
    pub fn push_back(&mut self, item: Item) -> NodeId {
        let id = self.alloc(item);
        match self.tail {
            Some(tail) => {
                self.arena[tail.0].next = Some(id);
                self.arena[id.0].prev = Some(tail);
            }
            None => self.head = Some(id),
        }
        self.tail = Some(id);
        id
    }

    /// Splice a freshly-allocated `item` in right after `anchor`
    pub fn insert_after(&mut self, anchor: NodeId, item: Item) -> NodeId {
        let id = self.alloc(item);
        let anchor_next = self.arena[anchor.0].next;

        self.arena[id.0].prev = Some(anchor);
        self.arena[id.0].next = anchor_next;
        self.arena[anchor.0].next = Some(id);

        match anchor_next {
            Some(next) => self.arena[next.0].prev = Some(id),
            None => self.tail = Some(id),
        }
        id
    }

    /// Splice a freshly-allocated `item` in right before `anchor`
    pub fn insert_before(&mut self, anchor: NodeId, item: Item) -> NodeId {
        let id = self.alloc(item);
        let anchor_prev = self.arena[anchor.0].prev;

        self.arena[id.0].next = Some(anchor);
        self.arena[id.0].prev = anchor_prev;
        self.arena[anchor.0].prev = Some(id);

        match anchor_prev {
            Some(prev) => self.arena[prev.0].next = Some(id),
            None => self.head = Some(id),
        }
        id
    }

    /// Unlink `id` from the list without freeing its slot in the arena
    ///
    /// The node's own `prev`/`next` links are left dangling; only the
    /// remaining list's head/tail/neighbor pointers are repaired. Tolerates
    /// being called with `id` already at the head or tail.
    pub fn unlink(&mut self, id: NodeId) {
        let prev = self.arena[id.0].prev;
        let next = self.arena[id.0].next;

        match prev {
            Some(prev) => self.arena[prev.0].next = next,
            None => self.head = next,
        }
        match next {
            Some(next) => self.arena[next.0].prev = prev,
            None => self.tail = prev,
        }
    }

    /// Remove and return the item at the head of the list
    pub fn pop_front(&mut self) -> Option<Item> {
        let id = self.head?;
        self.unlink(id);
        Some(self.arena[id.0].clone())
    }

    /// Move `id` out of this list and push it onto `other`'s tail
    ///
    /// Used when an argument-item survives the merge and must be re-homed
    /// into the input list without re-parsing it.
    pub fn move_to(&mut self, id: NodeId, other: &mut TrailerList) -> NodeId {
        self.unlink(id);
        other.push_back(self.arena[id.0].clone())
    }

    /// Push `item` back onto the list after pulling it out via `pop_front`/`unlink`
    pub fn readopt_after(&mut self, anchor: NodeId, item: Item) -> NodeId {
        self.insert_after(anchor, item)
    }

    pub fn readopt_before(&mut self, anchor: NodeId, item: Item) -> NodeId {
        self.insert_before(anchor, item)
    }

    pub fn readopt_back(&mut self, item: Item) -> NodeId {
        self.push_back(item)
    }

    pub fn readopt_front(&mut self, item: Item) -> NodeId {
        let id = self.alloc(item);
        match self.head {
            Some(head) => {
                self.arena[head.0].prev = Some(id);
                self.arena[id.0].next = Some(head);
            }
            None => self.tail = Some(id),
        }
        self.head = Some(id);
        id
    }

    /// Iterate items head-to-tail
    pub fn iter(&self) -> Iter {
        Iter { list: self, cur: self.head }
    }

    /// Refresh `self.tail` by walking forward from its current value
    ///
    /// The merge engine's Pass A may grow the list beyond the tail recorded
    /// before the pass began; call this once the pass is done.
    pub fn refresh_tail(&mut self) {
        if let Some(mut t) = self.tail {
            while let Some(next) = self.arena[t.0].next {
                t = next;
            }
            self.tail = Some(t);
        }
    }

    /// Refresh `self.head` by walking backward from its current value
    pub fn refresh_head(&mut self) {
        if let Some(mut h) = self.head {
            while let Some(prev) = self.arena[h.0].prev {
                h = prev;
            }
            self.head = Some(h);
        }
    }

    /// Check the doubly-linked invariant: used by tests and debug assertions
    pub fn well_formed(&self) -> bool {
        if let Some(head) = self.head {
            if self.arena[head.0].prev.is_some() {
                return false;
            }
        }
        if let Some(tail) = self.tail {
            if self.arena[tail.0].next.is_some() {
                return false;
            }
        }
        let mut seen = std::collections::HashSet::new();
        let mut cur = self.head;
        while let Some(id) = cur {
            if !seen.insert(id) {
                return false; // cycle
            }
            let next = self.arena[id.0].next;
            if let Some(next) = next {
                if self.arena[next.0].prev != Some(id) {
                    return false;
                }
            }
            cur = next;
        }
        true
    }
}

pub struct Iter<'l> {
    list: &'l TrailerList,
    cur: Option<NodeId>,
}

impl<'l> Iterator for Iter<'l> {
    type Item = (NodeId, &'l Item);

    fn next(&mut self) -> Option<Self::Item> {
        let id = self.cur?;
        self.cur = self.list.next(id);
        Some((id, self.list.get(id)))
    }
}

impl FromIterator<Item> for TrailerList {
    fn from_iter<I: IntoIterator<Item = Item>>(iter: I) -> Self {
        let mut list = TrailerList::new();
        for item in iter {
            list.push_back(item);
        }
        list
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn collect(list: &TrailerList) -> Vec<String> {
        list.iter().map(|(_, item)| item.token.clone()).collect()
    }

    #[test]
    fn push_back_preserves_order() {
        let mut list = TrailerList::new();
        list.push_back(Item::new("A", "1"));
        list.push_back(Item::new("B", "2"));
        list.push_back(Item::new("C", "3"));
        assert_eq!(collect(&list), vec!["A", "B", "C"]);
        assert!(list.well_formed());
    }

    #[test]
    fn insert_after_middle() {
        let mut list = TrailerList::new();
        let a = list.push_back(Item::new("A", "1"));
        list.push_back(Item::new("C", "3"));
        list.insert_after(a, Item::new("B", "2"));
        assert_eq!(collect(&list), vec!["A", "B", "C"]);
        assert!(list.well_formed());
    }

    #[test]
    fn insert_before_head() {
        let mut list = TrailerList::new();
        let a = list.push_back(Item::new("A", "1"));
        list.insert_before(a, Item::new("Z", "0"));
        assert_eq!(collect(&list), vec!["Z", "A"]);
        assert_eq!(list.head().map(|id| list.get(id).token.clone()), Some("Z".to_owned()));
        assert!(list.well_formed());
    }

    #[test]
    fn insert_after_tail_updates_tail() {
        let mut list = TrailerList::new();
        let a = list.push_back(Item::new("A", "1"));
        list.insert_after(a, Item::new("B", "2"));
        assert_eq!(list.tail().map(|id| list.get(id).token.clone()), Some("B".to_owned()));
        assert!(list.well_formed());
    }

    #[test]
    fn unlink_head() {
        let mut list = TrailerList::new();
        let a = list.push_back(Item::new("A", "1"));
        list.push_back(Item::new("B", "2"));
        list.unlink(a);
        assert_eq!(collect(&list), vec!["B"]);
        assert!(list.well_formed());
    }

    #[test]
    fn unlink_only_item_empties_list() {
        let mut list = TrailerList::new();
        let a = list.push_back(Item::new("A", "1"));
        list.unlink(a);
        assert!(list.is_empty());
        assert!(list.well_formed());
    }

    #[test]
    fn pop_front_drains_in_order() {
        let mut list = TrailerList::new();
        list.push_back(Item::new("A", "1"));
        list.push_back(Item::new("B", "2"));
        assert_eq!(list.pop_front().unwrap().token, "A");
        assert_eq!(list.pop_front().unwrap().token, "B");
        assert!(list.pop_front().is_none());
    }

    #[test]
    fn display_formats_by_trailing_char() {
        assert_eq!(Item::new("Signed-off-by", "A").to_string(), "Signed-off-by: A");
        assert_eq!(Item::new("See-also#", "A").to_string(), "See-also#A");
    }
}
