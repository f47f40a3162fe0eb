//! Connected-component set over pixel coordinates.
//!
//! A union-find keyed by coordinate value. Built once per comparison run and
//! never shrinks.

use std::collections::HashMap;

use super::value_object::Coordinate;

#[derive(Debug, Default)]
pub struct PixelSet {
    /// Coordinate -> slot, slots are assigned in insertion order
    index: HashMap<Coordinate, usize>,
    pixels: Vec<Coordinate>,
    parent: Vec<usize>,
    rank: Vec<u8>,
}

impl PixelSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `pixel` as a singleton set. No-op when already present.
    pub fn add(&mut self, pixel: Coordinate) {
        self.slot(pixel);
    }

    /// Merge the sets containing `a` and `b`, registering either if needed.
    pub fn union(&mut self, a: Coordinate, b: Coordinate) {
        let slot_a = self.slot(a);
        let slot_b = self.slot(b);
        let root_a = self.find(slot_a);
        let root_b = self.find(slot_b);
        if root_a == root_b {
            return;
        }
        match self.rank[root_a].cmp(&self.rank[root_b]) {
            std::cmp::Ordering::Less => self.parent[root_a] = root_b,
            std::cmp::Ordering::Greater => self.parent[root_b] = root_a,
            std::cmp::Ordering::Equal => {
                self.parent[root_b] = root_a;
                self.rank[root_a] += 1;
            }
        }
    }

    pub fn contains(&self, pixel: &Coordinate) -> bool {
        self.index.contains_key(pixel)
    }

    pub fn len(&self) -> usize {
        self.pixels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pixels.is_empty()
    }

    /// All distinct sets.
    ///
    /// Groups are ordered by the insertion of their first member, and pixels
    /// inside a group keep insertion order.
    pub fn groups(&mut self) -> Vec<Vec<Coordinate>> {
        let mut group_of_root: HashMap<usize, usize> = HashMap::new();
        let mut groups: Vec<Vec<Coordinate>> = Vec::new();
        for slot in 0..self.pixels.len() {
            let root = self.find(slot);
            let group = *group_of_root.entry(root).or_insert_with(|| {
                groups.push(Vec::new());
                groups.len() - 1
            });
            groups[group].push(self.pixels[slot]);
        }
        groups
    }

    fn slot(&mut self, pixel: Coordinate) -> usize {
        if let Some(slot) = self.index.get(&pixel) {
            return *slot;
        }
        let slot = self.pixels.len();
        self.index.insert(pixel, slot);
        self.pixels.push(pixel);
        self.parent.push(slot);
        self.rank.push(0);
        slot
    }

    fn find(&mut self, slot: usize) -> usize {
        let mut root = slot;
        while self.parent[root] != root {
            root = self.parent[root];
        }
        // path compression
        let mut current = slot;
        while self.parent[current] != root {
            let next = self.parent[current];
            self.parent[current] = root;
            current = next;
        }
        root
    }
}
