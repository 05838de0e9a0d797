//! Region quadtree over points
//!
//! Each node covers a rectangle and is either a leaf holding items, or an internal
//! node with exactly four children covering its quadrants. Leaves split when they grow
//! past `max_elements` (unless already at `max_depth`); nodes never merge back, so the
//! tree only grows until it is cleared.

use crate::{Bounds, QuadTreeConfig};
use geo::Point;

/// Anything that can be indexed by a [`PointQuadTree`]
pub trait QuadTreeItem {
    fn point(&self) -> Point<f64>;
}

/// Root container for the point quadtree
#[derive(Debug, Clone)]
pub struct PointQuadTree<I> {
    root: QuadtreeNode<I>,
    config: QuadTreeConfig,
    len: usize,
}

/// A single node of the point quadtree
#[derive(Debug, Clone)]
struct QuadtreeNode<I> {
    bounds: Bounds,
    /// Depth level in the tree (0 = root)
    depth: u32,
    /// Items stored at this node, always empty once subdivided
    items: Vec<I>,
    /// Child nodes (top-left, top-right, bottom-left, bottom-right) if subdivided
    children: Option<Box<[QuadtreeNode<I>; 4]>>,
}

impl<I: QuadTreeItem + PartialEq> PointQuadTree<I> {
    pub fn new(bounds: Bounds) -> Self {
        Self::with_config(bounds, QuadTreeConfig::default())
    }

    pub fn with_config(bounds: Bounds, config: QuadTreeConfig) -> Self {
        Self {
            root: QuadtreeNode::new(bounds, 0),
            config,
            len: 0,
        }
    }

    /// Insert an item
    ///
    /// Items whose point lies outside the tree bounds are dropped and `false` is
    /// returned; this is not treated as an error.
    pub fn add(&mut self, item: I) -> bool {
        let point = item.point();
        if !self.root.bounds.contains_point(point) {
            return false;
        }

        self.root.insert(point.x(), point.y(), item, &self.config);
        self.len += 1;
        true
    }

    /// Remove the first item equal to `item`, returning whether one was found
    pub fn remove(&mut self, item: &I) -> bool {
        let point = item.point();
        if !self.root.bounds.contains_point(point) {
            return false;
        }

        let removed = self.root.remove(point.x(), point.y(), item);
        if removed {
            self.len -= 1;
        }
        removed
    }

    /// Collect every item whose point lies inside `search_bounds`
    ///
    /// Leaves entirely covered by the query contribute all their items without per-item
    /// checks.
    pub fn search(&self, search_bounds: &Bounds) -> Vec<&I> {
        let mut results = Vec::new();
        self.root.search(search_bounds, &mut results);
        results
    }

    /// Reset to an empty tree with the same bounds
    pub fn clear(&mut self) {
        self.root = QuadtreeNode::new(self.root.bounds, 0);
        self.len = 0;
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    #[inline]
    pub fn bounds(&self) -> &Bounds {
        &self.root.bounds
    }

    #[inline]
    pub fn config(&self) -> &QuadTreeConfig {
        &self.config
    }

    /// Depth of the deepest node
    pub fn depth(&self) -> u32 {
        self.root.max_depth()
    }
}

impl<I: QuadTreeItem + PartialEq> QuadtreeNode<I> {
    fn new(bounds: Bounds, depth: u32) -> Self {
        Self {
            bounds,
            depth,
            items: Vec::new(),
            children: None,
        }
    }

    fn insert(&mut self, x: f64, y: f64, item: I, config: &QuadTreeConfig) {
        if let Some(children) = self.children.as_mut() {
            let index = self.bounds.quadrant_index(x, y);
            children[index].insert(x, y, item, config);
            return;
        }

        self.items.push(item);
        if self.items.len() > config.max_elements && self.depth < config.max_depth {
            self.subdivide(config);
        }
    }

    /// Subdivide this leaf into 4 children and push its items down
    fn subdivide(&mut self, config: &QuadTreeConfig) {
        let child_depth = self.depth + 1;
        let [top_left, top_right, bottom_left, bottom_right] = self.bounds.quadrants();
        self.children = Some(Box::new([
            QuadtreeNode::new(top_left, child_depth),
            QuadtreeNode::new(top_right, child_depth),
            QuadtreeNode::new(bottom_left, child_depth),
            QuadtreeNode::new(bottom_right, child_depth),
        ]));

        for item in std::mem::take(&mut self.items) {
            let point = item.point();
            self.insert(point.x(), point.y(), item, config);
        }
    }

    fn remove(&mut self, x: f64, y: f64, item: &I) -> bool {
        if let Some(children) = self.children.as_mut() {
            let index = self.bounds.quadrant_index(x, y);
            return children[index].remove(x, y, item);
        }

        match self.items.iter().position(|existing| existing == item) {
            Some(index) => {
                self.items.remove(index);
                true
            }
            None => false,
        }
    }

    fn search<'a>(&'a self, search_bounds: &Bounds, results: &mut Vec<&'a I>) {
        if !self.bounds.intersects(search_bounds) {
            return;
        }

        if let Some(children) = self.children.as_ref() {
            for child in children.iter() {
                child.search(search_bounds, results);
            }
        } else if search_bounds.contains_bounds(&self.bounds) {
            results.extend(self.items.iter());
        } else {
            results.extend(
                self.items
                    .iter()
                    .filter(|item| search_bounds.contains_point(item.point())),
            );
        }
    }

    fn max_depth(&self) -> u32 {
        match self.children.as_ref() {
            Some(children) => children
                .iter()
                .map(QuadtreeNode::max_depth)
                .max()
                .unwrap_or(self.depth),
            None => self.depth,
        }
    }
}
