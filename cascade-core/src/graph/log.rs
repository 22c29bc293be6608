//! Edge Lists
//!
//! Every edge of the dependency graph is stored twice: once in the producer's
//! reader log and once in the reader's source list. Each copy records the slot
//! the other copy occupies, so either end can be removed in O(1) with a
//! swap-remove followed by a back-pointer fix-up.
//!
//! # Layout
//!
//! A list keeps its first edge in a dedicated slot and spills the rest into an
//! overflow list. Most nodes have exactly one reader or one source, which then
//! costs no allocation. A vacated first slot is refilled before the overflow
//! list grows, and readers are always visited first-slot first, so this layout
//! also fixes the order in which stale readers are queued.

use smallvec::SmallVec;

use super::NodeKey;

/// Position of an edge inside an [`EdgeList`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Slot {
    First,
    Overflow(usize),
}

/// One stored end of an edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Edge {
    /// The node at the other end.
    pub node: NodeKey,
    /// Where this edge sits in the other node's list.
    pub slot: Slot,
}

#[derive(Debug, Default)]
pub struct EdgeList {
    first: Option<Edge>,
    overflow: SmallVec<[Edge; 2]>,
}

impl EdgeList {
    pub fn is_empty(&self) -> bool {
        self.first.is_none() && self.overflow.is_empty()
    }

    pub fn len(&self) -> usize {
        usize::from(self.first.is_some()) + self.overflow.len()
    }

    /// The slot the next [`push`](Self::push) will fill.
    pub fn next_slot(&self) -> Slot {
        if self.first.is_none() {
            Slot::First
        } else {
            Slot::Overflow(self.overflow.len())
        }
    }

    pub fn push(&mut self, edge: Edge) -> Slot {
        let slot = self.next_slot();
        match slot {
            Slot::First => self.first = Some(edge),
            Slot::Overflow(_) => self.overflow.push(edge),
        }
        slot
    }

    /// Remove the edge at `slot`.
    ///
    /// When an overflow edge is swap-removed, the edge that moved into the hole
    /// is returned along with its new slot so the caller can repair the
    /// back-pointer held at its other end.
    pub fn remove(&mut self, slot: Slot) -> Option<(Edge, Slot)> {
        match slot {
            Slot::First => {
                self.first = None;
                None
            }
            Slot::Overflow(index) if index < self.overflow.len() => {
                let last = self.overflow.pop()?;
                if index < self.overflow.len() {
                    self.overflow[index] = last;
                    Some((last, slot))
                } else {
                    None
                }
            }
            Slot::Overflow(_) => None,
        }
    }

    /// Point the edge at `at` to a new slot in the other node's list.
    pub fn relink(&mut self, at: Slot, slot: Slot) {
        let edge = match at {
            Slot::First => self.first.as_mut(),
            Slot::Overflow(index) => self.overflow.get_mut(index),
        };
        if let Some(edge) = edge {
            edge.slot = slot;
        }
    }

    /// Pop edges in teardown order: the first slot, then the overflow list
    /// from its end.
    pub fn pop(&mut self) -> Option<Edge> {
        self.first.take().or_else(|| self.overflow.pop())
    }

    pub fn iter(&self) -> impl Iterator<Item = &Edge> + '_ {
        self.first.iter().chain(self.overflow.iter())
    }

    pub fn clear(&mut self) {
        self.first = None;
        self.overflow.clear();
    }
}
