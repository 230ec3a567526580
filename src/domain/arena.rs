use std::collections::HashMap;

use generational_arena::{Arena, Index};
use tracing::instrument;

use crate::domain::interval::Interval;

/// Node of the tower: one completed domain and what each branch made of it.
#[derive(Debug, Clone)]
pub struct TowerNode {
    /// The domain itself (canonical bounds)
    pub domain: Interval,
    /// Image of the domain under each branch, `None` when the branch misses it
    pub images: Vec<Option<Interval>>,
    /// Refinement pass (0-based) in which the domain was completed
    pub pass: usize,
}

/// Arena holding completed tower domains in discovery order.
///
/// Uses a generational arena for node storage and a hash index keyed by the
/// canonical domain, so membership checks during construction are O(1).
#[derive(Debug, Default)]
pub struct TowerArena {
    /// Arena storage for all tower nodes
    arena: Arena<TowerNode>,
    /// Node indices in discovery order
    order: Vec<Index>,
    /// Domain -> position in `order`
    positions: HashMap<Interval, usize>,
}

impl TowerArena {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a completed domain. A domain already present is left untouched
    /// and its existing position is returned.
    #[instrument(level = "trace", skip(self, images))]
    pub fn insert(&mut self, domain: Interval, images: Vec<Option<Interval>>, pass: usize) -> usize {
        if let Some(&pos) = self.positions.get(&domain) {
            return pos;
        }
        let idx = self.arena.insert(TowerNode {
            domain,
            images,
            pass,
        });
        let pos = self.order.len();
        self.order.push(idx);
        self.positions.insert(domain, pos);
        pos
    }

    pub fn contains(&self, domain: &Interval) -> bool {
        self.positions.contains_key(domain)
    }

    /// Discovery position of `domain`, if completed.
    pub fn position(&self, domain: &Interval) -> Option<usize> {
        self.positions.get(domain).copied()
    }

    pub fn get(&self, pos: usize) -> Option<&TowerNode> {
        self.order.get(pos).and_then(|&idx| self.arena.get(idx))
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Nodes in discovery order.
    pub fn iter(&self) -> TowerIterator<'_> {
        TowerIterator {
            arena: self,
            pos: 0,
        }
    }
}

pub struct TowerIterator<'a> {
    arena: &'a TowerArena,
    pos: usize,
}

impl<'a> Iterator for TowerIterator<'a> {
    type Item = (usize, &'a TowerNode);

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.arena.get(self.pos)?;
        let item = (self.pos, node);
        self.pos += 1;
        Some(item)
    }
}
