//! Spatial index of drawable bounds.
//!
//! The scene is flat, so the "octree" is a loose quadtree: every entry lives
//! in the deepest cell that fully contains its box. Entries that do not fit
//! the world bounds stay in the root cell and are still found by queries.

use std::collections::HashMap;

use cgmath::Vector2;

use crate::data_structures::scene_graph::{Component, NodeId};

const CELL_CAPACITY: usize = 8;
const DEFAULT_MAX_DEPTH: u32 = 8;
const DEFAULT_WORLD_HALF_SIZE: f32 = 1000.0;

/// Axis aligned box in world units.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Aabb {
    pub min: Vector2<f32>,
    pub max: Vector2<f32>,
}

impl Aabb {
    pub fn new(min: Vector2<f32>, max: Vector2<f32>) -> Self {
        Self { min, max }
    }

    pub fn from_center(center: Vector2<f32>, half_extents: Vector2<f32>) -> Self {
        Self {
            min: center - half_extents,
            max: center + half_extents,
        }
    }

    pub fn center(&self) -> Vector2<f32> {
        (self.min + self.max) * 0.5
    }

    pub fn intersects(&self, other: &Aabb) -> bool {
        self.min.x <= other.max.x
            && self.max.x >= other.min.x
            && self.min.y <= other.max.y
            && self.max.y >= other.min.y
    }

    pub fn contains(&self, other: &Aabb) -> bool {
        self.min.x <= other.min.x
            && self.min.y <= other.min.y
            && self.max.x >= other.max.x
            && self.max.y >= other.max.y
    }

    /// Corners in counter-clockwise order starting at `min`.
    pub fn corners(&self) -> [Vector2<f32>; 4] {
        [
            self.min,
            Vector2::new(self.max.x, self.min.y),
            self.max,
            Vector2::new(self.min.x, self.max.y),
        ]
    }

    fn quadrants(&self) -> [Aabb; 4] {
        let c = self.center();
        [
            Aabb::new(self.min, c),
            Aabb::new(Vector2::new(c.x, self.min.y), Vector2::new(self.max.x, c.y)),
            Aabb::new(Vector2::new(self.min.x, c.y), Vector2::new(c.x, self.max.y)),
            Aabb::new(c, self.max),
        ]
    }
}

struct Cell {
    bounds: Aabb,
    depth: u32,
    items: Vec<(NodeId, Aabb)>,
    children: Option<Box<[Cell; 4]>>,
}

impl Cell {
    fn new(bounds: Aabb, depth: u32) -> Self {
        Self {
            bounds,
            depth,
            items: Vec::new(),
            children: None,
        }
    }

    fn insert(&mut self, node: NodeId, aabb: Aabb, max_depth: u32) {
        if let Some(children) = self.children.as_mut() {
            if let Some(child) = children.iter_mut().find(|c| c.bounds.contains(&aabb)) {
                child.insert(node, aabb, max_depth);
                return;
            }
        }
        self.items.push((node, aabb));
        if self.children.is_none() && self.items.len() > CELL_CAPACITY && self.depth < max_depth
        {
            self.split(max_depth);
        }
    }

    fn split(&mut self, max_depth: u32) {
        let [a, b, c, d] = self.bounds.quadrants();
        let depth = self.depth + 1;
        self.children = Some(Box::new([
            Cell::new(a, depth),
            Cell::new(b, depth),
            Cell::new(c, depth),
            Cell::new(d, depth),
        ]));
        let items = std::mem::take(&mut self.items);
        for (node, aabb) in items {
            self.insert(node, aabb, max_depth);
        }
    }

    fn remove(&mut self, node: NodeId, aabb: &Aabb) -> bool {
        if let Some(pos) = self.items.iter().position(|(n, _)| *n == node) {
            self.items.swap_remove(pos);
            return true;
        }
        match self.children.as_mut() {
            Some(children) => children
                .iter_mut()
                .filter(|c| c.bounds.contains(aabb))
                .any(|c| c.remove(node, aabb)),
            None => false,
        }
    }

    fn query(&self, area: &Aabb, out: &mut Vec<NodeId>) {
        out.extend(
            self.items
                .iter()
                .filter(|(_, aabb)| aabb.intersects(area))
                .map(|(node, _)| *node),
        );
        if let Some(children) = self.children.as_ref() {
            children
                .iter()
                .filter(|c| c.bounds.intersects(area))
                .for_each(|c| c.query(area, out));
        }
    }
}

pub struct Octree {
    root: Cell,
    max_depth: u32,
    entries: HashMap<NodeId, Aabb>,
}

impl Default for Octree {
    fn default() -> Self {
        let half = Vector2::new(DEFAULT_WORLD_HALF_SIZE, DEFAULT_WORLD_HALF_SIZE);
        Self::new(Aabb::from_center(Vector2::new(0.0, 0.0), half), DEFAULT_MAX_DEPTH)
    }
}

impl Component for Octree {}

impl Octree {
    pub fn new(world: Aabb, max_depth: u32) -> Self {
        Self {
            root: Cell::new(world, 0),
            max_depth,
            entries: HashMap::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Insert `node`, or move it if it is already indexed.
    pub fn update(&mut self, node: NodeId, aabb: Aabb) {
        if let Some(previous) = self.entries.get(&node) {
            if *previous == aabb {
                return;
            }
            let previous = *previous;
            self.root.remove(node, &previous);
        }
        self.root.insert(node, aabb, self.max_depth);
        self.entries.insert(node, aabb);
    }

    pub fn remove(&mut self, node: NodeId) -> bool {
        match self.entries.remove(&node) {
            Some(aabb) => self.root.remove(node, &aabb),
            None => false,
        }
    }

    pub fn bounds_of(&self, node: NodeId) -> Option<Aabb> {
        self.entries.get(&node).copied()
    }

    /// All nodes whose box overlaps `area`.
    pub fn query(&self, area: &Aabb) -> Vec<NodeId> {
        let mut out = Vec::new();
        self.root.query(area, &mut out);
        out
    }

    pub fn clear(&mut self) {
        self.root = Cell::new(self.root.bounds, 0);
        self.entries.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data_structures::scene_graph::Scene;

    fn unit_box_at(x: f32, y: f32) -> Aabb {
        Aabb::from_center(Vector2::new(x, y), Vector2::new(0.5, 0.5))
    }

    #[test]
    fn query_finds_overlapping_entries_only() {
        let mut scene = Scene::new();
        let near = scene.create_child("near");
        let far = scene.create_child("far");
        let mut octree = Octree::default();
        octree.update(near, unit_box_at(0.0, 0.0));
        octree.update(far, unit_box_at(50.0, 50.0));

        let found = octree.query(&unit_box_at(0.4, 0.0));
        assert_eq!(found, vec![near]);
    }

    #[test]
    fn update_moves_an_entry() {
        let mut scene = Scene::new();
        let node = scene.create_child("mover");
        let mut octree = Octree::default();
        octree.update(node, unit_box_at(0.0, 0.0));
        octree.update(node, unit_box_at(20.0, 0.0));

        assert_eq!(octree.len(), 1);
        assert!(octree.query(&unit_box_at(0.0, 0.0)).is_empty());
        assert_eq!(octree.query(&unit_box_at(20.0, 0.0)), vec![node]);
    }

    #[test]
    fn many_entries_split_cells_and_stay_findable() {
        let mut scene = Scene::new();
        let mut octree = Octree::default();
        let nodes: Vec<_> = (0..40)
            .map(|i| {
                let node = scene.create_child(&format!("n{}", i));
                octree.update(node, unit_box_at(i as f32 * 3.0 - 60.0, 10.0));
                node
            })
            .collect();

        let all = octree.query(&Aabb::new(Vector2::new(-100.0, 0.0), Vector2::new(100.0, 20.0)));
        assert_eq!(all.len(), nodes.len());
        assert!(octree.remove(nodes[7]));
        assert!(!octree.remove(nodes[7]));
        assert_eq!(octree.len(), 39);
    }

    #[test]
    fn entries_outside_the_world_are_kept() {
        let mut scene = Scene::new();
        let node = scene.create_child("lost");
        let mut octree = Octree::new(Aabb::from_center(Vector2::new(0.0, 0.0), Vector2::new(10.0, 10.0)), 4);
        octree.update(node, unit_box_at(100.0, 100.0));

        assert_eq!(octree.query(&unit_box_at(100.0, 100.0)), vec![node]);
        octree.clear();
        assert!(octree.is_empty());
    }
}
