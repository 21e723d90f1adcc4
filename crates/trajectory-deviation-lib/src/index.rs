//! Nearest-point spatial index over a path
//!
//! The index owns a copy of the reference positions and answers "k nearest" queries with
//! k = 1 or 2. Three interchangeable backends are available; all of them return exactly the
//! same neighbors, ties between equally distant points resolving to the lower path index.

use crate::quadtree::Quadtree;
use crate::{EngineError, Path, Position, Result};
use rstar::RTree;
use rstar::primitives::GeomWithData;
use smallvec::SmallVec;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Spatial partitioning strategy used by a [`NearestPointIndex`]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum IndexAlgorithm {
    /// Bulk-loaded R*-tree, O(log N) queries
    #[default]
    #[cfg_attr(feature = "serde", serde(rename = "rtree"))]
    RTree,
    /// Point-region quadtree over the path's bounding box, O(log N) queries
    Quadtree,
    /// Linear scan over every point; correctness reference for small paths
    Exhaustive,
}

impl std::fmt::Display for IndexAlgorithm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            IndexAlgorithm::RTree => "rtree",
            IndexAlgorithm::Quadtree => "quadtree",
            IndexAlgorithm::Exhaustive => "exhaustive",
        };
        f.write_str(name)
    }
}

impl std::str::FromStr for IndexAlgorithm {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "rtree" | "r-tree" => Ok(IndexAlgorithm::RTree),
            "quadtree" => Ok(IndexAlgorithm::Quadtree),
            "exhaustive" | "brute-force" => Ok(IndexAlgorithm::Exhaustive),
            other => Err(EngineError::InvalidConfig(format!(
                "unknown index algorithm '{other}' (expected rtree, quadtree or exhaustive)"
            ))),
        }
    }
}

/// A reference point returned by a query
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Neighbor {
    /// Index of the point in the source path
    pub index: usize,
    /// Euclidean distance from the query point in meters
    pub distance: f64,
}

/// The two nearest reference points of a query (`nearest.distance <= second.distance`)
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct NearestPair {
    pub nearest: Neighbor,
    pub second: Neighbor,
}

type IndexedPoint = GeomWithData<[f64; 2], usize>;

#[derive(Clone, Debug)]
enum Backend {
    RTree(RTree<IndexedPoint>),
    Quadtree(Quadtree),
    Exhaustive,
}

/// Read-only spatial index over the positions of a path
///
/// Built once per reference path; rebuild it if the path changes. The index is immutable
/// after construction and can be shared across threads for parallel queries.
#[derive(Clone, Debug)]
pub struct NearestPointIndex {
    positions: Vec<Position>,
    algorithm: IndexAlgorithm,
    backend: Backend,
}

#[cfg_attr(feature = "profiling", profiling::all_functions)]
impl NearestPointIndex {
    /// Build an index over the positions of `path`
    pub fn build(path: &Path, algorithm: IndexAlgorithm) -> Result<Self> {
        Self::from_positions(path.positions(), algorithm)
    }

    /// Build an index over raw positions
    ///
    /// Fails with [`EngineError::InsufficientPoints`] for fewer than two positions, since a
    /// two-nearest query needs two distinct points to return.
    pub fn from_positions(positions: Vec<Position>, algorithm: IndexAlgorithm) -> Result<Self> {
        #[cfg(feature = "profiling")]
        profiling::scope!("index::build");

        if positions.len() < Path::MIN_POINTS {
            return Err(EngineError::InsufficientPoints {
                operation: "nearest-point index",
                required: Path::MIN_POINTS,
                actual: positions.len(),
            });
        }

        let backend = match algorithm {
            IndexAlgorithm::RTree => {
                let indexed: Vec<IndexedPoint> = positions
                    .iter()
                    .enumerate()
                    .map(|(i, p)| GeomWithData::new([p.x(), p.y()], i))
                    .collect();
                Backend::RTree(RTree::bulk_load(indexed))
            }
            IndexAlgorithm::Quadtree => Backend::Quadtree(Quadtree::new(&positions)),
            IndexAlgorithm::Exhaustive => Backend::Exhaustive,
        };

        tracing::debug!(
            "Built {} nearest-point index over {} points",
            algorithm,
            positions.len()
        );

        Ok(Self {
            positions,
            algorithm,
            backend,
        })
    }

    /// The two nearest indexed points to `point`
    pub fn query_nearest2(&self, point: Position) -> NearestPair {
        let best = self.k_nearest(point, 2);
        // Construction guarantees at least two points, so both slots are filled
        let (d_a, idx_a) = best[0];
        let (d_b, idx_b) = best[1];
        NearestPair {
            nearest: Neighbor {
                index: idx_a,
                distance: d_a.sqrt(),
            },
            second: Neighbor {
                index: idx_b,
                distance: d_b.sqrt(),
            },
        }
    }

    /// The single nearest indexed point to `point`
    pub fn query_nearest(&self, point: Position) -> Neighbor {
        let best = self.k_nearest(point, 1);
        let (d, index) = best[0];
        Neighbor {
            index,
            distance: d.sqrt(),
        }
    }

    /// Number of indexed points
    #[inline]
    pub fn len(&self) -> usize {
        self.positions.len()
    }

    /// Always false for a constructed index
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    /// Backend used for queries
    #[inline]
    pub fn algorithm(&self) -> IndexAlgorithm {
        self.algorithm
    }

    /// Position of an indexed point
    #[inline]
    pub fn position(&self, index: usize) -> Option<Position> {
        self.positions.get(index).copied()
    }

    /// Up to `k` nearest points as `(squared distance, index)`, sorted
    fn k_nearest(&self, point: Position, k: usize) -> SmallVec<[(f64, usize); 4]> {
        debug_assert!(k <= self.positions.len());
        let mut best = KNearest::new(k);
        match &self.backend {
            Backend::RTree(tree) => {
                let query = [point.x(), point.y()];
                // The iterator is sorted by distance; keep pulling equal-distance ties
                for (item, d2) in tree.nearest_neighbor_iter_with_distance_2(&query) {
                    if d2 > best.worst_distance_2() {
                        break;
                    }
                    best.offer(d2, item.data);
                }
            }
            Backend::Quadtree(tree) => tree.search(&self.positions, point, &mut best),
            Backend::Exhaustive => {
                for (i, p) in self.positions.iter().enumerate() {
                    best.offer(distance_2(*p, point), i);
                }
            }
        }
        best.into_sorted()
    }
}

/// Squared Euclidean distance, summed in the same order as the R-tree backend
#[inline(always)]
pub(crate) fn distance_2(a: Position, b: Position) -> f64 {
    let dx = a.x() - b.x();
    let dy = a.y() - b.y();
    dx * dx + dy * dy
}

/// Bounded candidate set ordered by `(squared distance, index)`
#[derive(Debug)]
pub(crate) struct KNearest {
    k: usize,
    best: SmallVec<[(f64, usize); 4]>,
}

impl KNearest {
    pub(crate) fn new(k: usize) -> Self {
        Self {
            k,
            best: SmallVec::new(),
        }
    }

    /// Squared distance a candidate must not exceed to be considered
    #[inline]
    pub(crate) fn worst_distance_2(&self) -> f64 {
        if self.best.len() < self.k {
            f64::INFINITY
        } else {
            self.best.last().map(|&(d, _)| d).unwrap_or(f64::INFINITY)
        }
    }

    #[inline]
    pub(crate) fn offer(&mut self, d2: f64, index: usize) {
        let pos = self
            .best
            .partition_point(|&(bd, bi)| bd < d2 || (bd == d2 && bi < index));
        if pos >= self.k || self.best.get(pos).is_some_and(|&(_, bi)| bi == index) {
            return;
        }
        self.best.insert(pos, (d2, index));
        self.best.truncate(self.k);
    }

    pub(crate) fn into_sorted(self) -> SmallVec<[(f64, usize); 4]> {
        self.best
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::Point;

    #[test]
    fn test_algorithm_names_round_trip() {
        for algorithm in [
            IndexAlgorithm::RTree,
            IndexAlgorithm::Quadtree,
            IndexAlgorithm::Exhaustive,
        ] {
            assert_eq!(algorithm.to_string().parse::<IndexAlgorithm>().unwrap(), algorithm);
        }
        assert_eq!("R-Tree".parse::<IndexAlgorithm>().unwrap(), IndexAlgorithm::RTree);
        assert!("kdtree".parse::<IndexAlgorithm>().is_err());
    }

    const ALGORITHMS: [IndexAlgorithm; 3] = [
        IndexAlgorithm::RTree,
        IndexAlgorithm::Quadtree,
        IndexAlgorithm::Exhaustive,
    ];

    fn line_positions(n: usize) -> Vec<Position> {
        (0..n).map(|i| Point::new(i as f64, 0.0)).collect()
    }

    #[test]
    fn test_insufficient_points() {
        for algorithm in ALGORITHMS {
            let result = NearestPointIndex::from_positions(vec![Point::new(0.0, 0.0)], algorithm);
            assert!(matches!(
                result,
                Err(EngineError::InsufficientPoints { actual: 1, .. })
            ));
        }
    }

    #[test]
    fn test_query_nearest2_on_line() {
        for algorithm in ALGORITHMS {
            let index = NearestPointIndex::from_positions(line_positions(10), algorithm).unwrap();
            let pair = index.query_nearest2(Point::new(4.2, 1.0));

            assert_eq!(pair.nearest.index, 4, "{algorithm}");
            assert_eq!(pair.second.index, 5, "{algorithm}");
            assert!((pair.nearest.distance - (0.04f64 + 1.0).sqrt()).abs() < 1e-12);
            assert!(pair.nearest.distance <= pair.second.distance);
        }
    }

    #[test]
    fn test_ties_resolve_to_lower_index() {
        // Query exactly between points 3 and 4: both at distance 0.5
        for algorithm in ALGORITHMS {
            let index = NearestPointIndex::from_positions(line_positions(10), algorithm).unwrap();
            let pair = index.query_nearest2(Point::new(3.5, 0.0));
            assert_eq!(pair.nearest.index, 3, "{algorithm}");
            assert_eq!(pair.second.index, 4, "{algorithm}");

            let single = index.query_nearest(Point::new(3.5, 0.0));
            assert_eq!(single.index, 3, "{algorithm}");
        }
    }

    #[test]
    fn test_duplicate_points_are_distinct_neighbors() {
        let positions = vec![
            Point::new(0.0, 0.0),
            Point::new(5.0, 5.0),
            Point::new(5.0, 5.0),
            Point::new(10.0, 0.0),
        ];
        for algorithm in ALGORITHMS {
            let index = NearestPointIndex::from_positions(positions.clone(), algorithm).unwrap();
            let pair = index.query_nearest2(Point::new(5.0, 6.0));
            assert_eq!(pair.nearest.index, 1, "{algorithm}");
            assert_eq!(pair.second.index, 2, "{algorithm}");
            assert_eq!(pair.nearest.distance, pair.second.distance);
        }
    }

    #[test]
    fn test_backends_agree_on_spiral() {
        let positions: Vec<Position> = (0..2000)
            .map(|i| {
                let t = i as f64 * 0.05;
                Point::new(t * t.cos() * 3.0, t * t.sin() * 3.0)
            })
            .collect();
        let indices: Vec<NearestPointIndex> = ALGORITHMS
            .iter()
            .map(|&a| NearestPointIndex::from_positions(positions.clone(), a).unwrap())
            .collect();

        for qi in 0..300 {
            let q = Point::new(
                ((qi * 37) % 600) as f64 - 300.0,
                ((qi * 53) % 600) as f64 - 300.0,
            );
            let expected = indices[2].query_nearest2(q);
            for index in &indices[..2] {
                assert_eq!(index.query_nearest2(q), expected, "{}", index.algorithm());
                assert_eq!(index.query_nearest(q), expected.nearest);
            }
        }
    }

    #[test]
    fn test_build_from_path() {
        let path = Path::from_samples((0..5).map(|i| (i as f64, 0.0, 0.0))).unwrap();
        let index = NearestPointIndex::build(&path, IndexAlgorithm::default()).unwrap();
        assert_eq!(index.len(), 5);
        assert!(!index.is_empty());
        assert_eq!(index.algorithm(), IndexAlgorithm::RTree);
        assert_eq!(index.position(2), Some(Point::new(2.0, 0.0)));
        assert_eq!(index.position(5), None);
    }

    #[test]
    fn test_k_nearest_keeps_order() {
        let mut best = KNearest::new(2);
        best.offer(4.0, 7);
        best.offer(1.0, 9);
        best.offer(1.0, 3);
        best.offer(0.5, 12);
        let sorted = best.into_sorted();
        assert_eq!(sorted.as_slice(), &[(0.5, 12), (1.0, 3)]);
    }
}
