//! Point-region quadtree for nearest-neighbor search
//!
//! The tree covers the bounding box of the indexed positions and stores point indices
//! in its leaves. Nodes split into four quadrants until a leaf holds few enough points
//! or the maximum depth is reached. Queries visit nodes closest-first and prune every node
//! whose bounding box lies farther away than the current k-th candidate.

use crate::Position;
use crate::index::{KNearest, distance_2};
use geo::{Coord, Rect};

/// Maximum depth of the quadtree to prevent infinite recursion on duplicate points
const MAX_DEPTH: u32 = 20;

/// Maximum number of points stored in a leaf before it is subdivided
const MAX_POINTS_PER_LEAF: usize = 8;

/// Root container for the quadtree spatial index
#[derive(Debug, Clone)]
pub(crate) struct Quadtree {
    root: QuadtreeNode,
}

/// A single node in the quadtree
#[derive(Debug, Clone)]
struct QuadtreeNode {
    /// Bounding box in path coordinates (meters)
    bounding_box: Rect<f64>,
    /// Depth level in the tree (0 = root)
    level: u32,
    /// Indices of the points stored at this node (leaves only)
    point_indices: Vec<usize>,
    /// Child nodes (NW, NE, SW, SE) if subdivided
    children: Option<Box<[QuadtreeNode; 4]>>,
}

impl Quadtree {
    /// Build a quadtree over `positions`
    pub(crate) fn new(positions: &[Position]) -> Self {
        let mut min_x = f64::INFINITY;
        let mut min_y = f64::INFINITY;
        let mut max_x = f64::NEG_INFINITY;
        let mut max_y = f64::NEG_INFINITY;
        for p in positions {
            min_x = min_x.min(p.x());
            min_y = min_y.min(p.y());
            max_x = max_x.max(p.x());
            max_y = max_y.max(p.y());
        }

        let bounding_box = Rect::new(Coord { x: min_x, y: min_y }, Coord { x: max_x, y: max_y });
        let mut root = QuadtreeNode::new(bounding_box, 0);
        root.point_indices = (0..positions.len()).collect();
        root.split(positions);

        Self { root }
    }

    /// Feed every point that can still improve `best` into it
    pub(crate) fn search(&self, positions: &[Position], query: Position, best: &mut KNearest) {
        self.root.search(positions, query, best);
    }

    /// Depth of the deepest leaf
    #[cfg(test)]
    fn depth(&self) -> u32 {
        self.root.depth()
    }
}

impl QuadtreeNode {
    fn new(bounding_box: Rect<f64>, level: u32) -> Self {
        Self {
            bounding_box,
            level,
            point_indices: Vec::new(),
            children: None,
        }
    }

    /// Recursively distribute this node's points into quadrants
    fn split(&mut self, positions: &[Position]) {
        if self.point_indices.len() <= MAX_POINTS_PER_LEAF || self.level >= MAX_DEPTH {
            return;
        }

        let min = self.bounding_box.min();
        let max = self.bounding_box.max();
        let mid_x = (min.x + max.x) / 2.0;
        let mid_y = (min.y + max.y) / 2.0;
        let child_level = self.level + 1;

        // Create 4 children: NW, NE, SW, SE
        let mut children = Box::new([
            QuadtreeNode::new(
                Rect::new(Coord { x: min.x, y: mid_y }, Coord { x: mid_x, y: max.y }),
                child_level,
            ),
            QuadtreeNode::new(
                Rect::new(Coord { x: mid_x, y: mid_y }, Coord { x: max.x, y: max.y }),
                child_level,
            ),
            QuadtreeNode::new(
                Rect::new(Coord { x: min.x, y: min.y }, Coord { x: mid_x, y: mid_y }),
                child_level,
            ),
            QuadtreeNode::new(
                Rect::new(Coord { x: mid_x, y: min.y }, Coord { x: max.x, y: mid_y }),
                child_level,
            ),
        ]);

        for index in self.point_indices.drain(..) {
            let point = positions[index];
            let is_east = point.x() >= mid_x;
            let is_north = point.y() >= mid_y;
            let quadrant = match (is_east, is_north) {
                (false, true) => 0,  // NW
                (true, true) => 1,   // NE
                (false, false) => 2, // SW
                (true, false) => 3,  // SE
            };
            children[quadrant].point_indices.push(index);
        }

        for child in children.iter_mut() {
            child.split(positions);
        }
        self.children = Some(children);
    }

    /// Squared distance from `query` to the closest point of this node's bounding box
    fn min_distance_2(&self, query: Position) -> f64 {
        let min = self.bounding_box.min();
        let max = self.bounding_box.max();
        let dx = (min.x - query.x()).max(0.0).max(query.x() - max.x);
        let dy = (min.y - query.y()).max(0.0).max(query.y() - max.y);
        dx * dx + dy * dy
    }

    fn search(&self, positions: &[Position], query: Position, best: &mut KNearest) {
        // Strict comparison keeps equal-distance ties reachable for index tie-breaking
        if self.min_distance_2(query) > best.worst_distance_2() {
            return;
        }

        match &self.children {
            None => {
                for &index in &self.point_indices {
                    best.offer(distance_2(positions[index], query), index);
                }
            }
            Some(children) => {
                let mut order: [(f64, usize); 4] =
                    std::array::from_fn(|i| (children[i].min_distance_2(query), i));
                order.sort_by(|a, b| a.0.total_cmp(&b.0));
                for (_, i) in order {
                    children[i].search(positions, query, best);
                }
            }
        }
    }

    #[cfg(test)]
    fn depth(&self) -> u32 {
        match &self.children {
            None => self.level,
            Some(children) => children.iter().map(|c| c.depth()).max().unwrap_or(self.level),
        }
    }

    #[cfg(test)]
    fn count_points(&self) -> usize {
        self.point_indices.len()
            + self
                .children
                .as_ref()
                .map(|c| c.iter().map(|n| n.count_points()).sum())
                .unwrap_or(0)
    }
}
