//! Closed contours and stitching of edge soups into contours.

use std::collections::{HashMap, HashSet};
use std::sync::OnceLock;

use rayon::prelude::*;
use strata_math::{Point3, Tolerance};
use tracing::{debug, info};

use crate::slice::{Edge, LayerEdges};

/// A closed loop of points at one layer height.
///
/// The segment from the last point back to the first is implied and not
/// stored. The signed area is computed on first use and cached.
#[derive(Debug, Clone, Default)]
pub struct Contour {
    points: Vec<Point3>,
    signed_area: OnceLock<f64>,
}

impl Contour {
    /// Create a contour from its points in loop order.
    pub fn new(points: Vec<Point3>) -> Self {
        Self {
            points,
            signed_area: OnceLock::new(),
        }
    }

    /// Points in loop order.
    pub fn points(&self) -> &[Point3] {
        &self.points
    }

    /// Take the points out of the contour.
    pub fn into_points(self) -> Vec<Point3> {
        self.points
    }

    /// Number of points.
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Check if the contour has no points.
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Height of the contour, taken from its first point.
    pub fn z(&self) -> Option<f64> {
        self.points.first().map(|p| p.z)
    }

    /// Signed area in the XY plane (shoelace formula).
    /// Positive for counter-clockwise, negative for clockwise.
    pub fn signed_area(&self) -> f64 {
        *self.signed_area.get_or_init(|| {
            let n = self.points.len();
            if n < 3 {
                return 0.0;
            }
            let mut twice_area = 0.0;
            for i in 0..n {
                let p = &self.points[(i + n - 1) % n];
                let q = &self.points[i];
                twice_area += p.x * q.y - q.x * p.y;
            }
            twice_area / 2.0
        })
    }

    /// Is the contour counter-clockwise?
    ///
    /// Zero-area (degenerate) contours are not.
    pub fn is_ccw(&self) -> bool {
        let area = self.signed_area();
        area > 0.0 && !Tolerance::DEFAULT.is_zero_area(area)
    }

    /// The same loop in the opposite direction.
    pub fn reversed(mut self) -> Self {
        self.points.reverse();
        Self::new(self.points)
    }

    /// Ensure counter-clockwise winding, reversing if needed.
    pub fn make_ccw(self) -> Self {
        if self.is_ccw() {
            self
        } else {
            self.reversed()
        }
    }

    /// Loop length including the implied closing segment.
    pub fn perimeter(&self) -> f64 {
        self.edges().map(|e| e.length()).sum()
    }

    /// Segments between consecutive points, including the closing one.
    pub fn edges(&self) -> impl Iterator<Item = Edge> + '_ {
        let n = self.points.len();
        let count = if n < 2 { 0 } else { n };
        (0..count).map(move |i| Edge::new(self.points[i], self.points[(i + 1) % n]))
    }
}

impl PartialEq for Contour {
    fn eq(&self, other: &Self) -> bool {
        self.points == other.points
    }
}

impl From<Vec<Point3>> for Contour {
    fn from(points: Vec<Point3>) -> Self {
        Self::new(points)
    }
}

/// Contours of one slicing plane.
#[derive(Debug, Clone)]
pub struct SliceLayer {
    /// Z height of this layer (mm).
    pub z: f64,
    /// Layer index (0 = bottom plane).
    pub index: usize,
    /// Closed contours, in the order they were found.
    pub contours: Vec<Contour>,
    /// Edges that could not be part of any closed contour.
    pub discarded_edges: usize,
}

impl SliceLayer {
    /// Create a new empty layer.
    pub fn new(z: f64, index: usize) -> Self {
        Self {
            z,
            index,
            contours: Vec::new(),
            discarded_edges: 0,
        }
    }
}

impl AsRef<[Contour]> for SliceLayer {
    fn as_ref(&self) -> &[Contour] {
        &self.contours
    }
}

/// Result of stitching one edge soup.
#[derive(Debug, Clone, Default)]
pub struct Stitched {
    /// Closed contours.
    pub contours: Vec<Contour>,
    /// Edges dropped as zero-length, duplicate, dangling or part of an open chain.
    pub discarded_edges: usize,
}

/// Endpoint key: XY snapped to the tolerance grid.
type NodeKey = (i64, i64);

/// Undirected edge graph over tolerance-matched endpoints.
struct EdgeGraph {
    positions: Vec<Point3>,
    links: Vec<(usize, usize)>,
    adjacency: Vec<Vec<usize>>,
    dropped: usize,
}

impl EdgeGraph {
    fn build(edges: &[Edge]) -> Self {
        let tol = Tolerance::DEFAULT;
        let mut index: HashMap<NodeKey, usize> = HashMap::with_capacity(edges.len());
        let mut positions: Vec<Point3> = Vec::with_capacity(edges.len());
        let mut node = |p: &Point3| -> usize {
            *index.entry((tol.grid(p.x), tol.grid(p.y))).or_insert_with(|| {
                positions.push(*p);
                positions.len() - 1
            })
        };

        let mut seen: HashSet<(usize, usize)> = HashSet::with_capacity(edges.len());
        let mut links = Vec::with_capacity(edges.len());
        let mut dropped = 0;

        for edge in edges {
            let a = node(&edge.start);
            let b = node(&edge.end);
            if a == b || !seen.insert((a.min(b), a.max(b))) {
                dropped += 1;
                continue;
            }
            links.push((a, b));
        }

        let mut adjacency = vec![Vec::new(); positions.len()];
        for (li, &(a, b)) in links.iter().enumerate() {
            adjacency[a].push(li);
            adjacency[b].push(li);
        }

        Self {
            positions,
            links,
            adjacency,
            dropped,
        }
    }

    fn other_end(&self, link: usize, from: usize) -> usize {
        let (a, b) = self.links[link];
        if a == from {
            b
        } else {
            a
        }
    }

    /// Mark links that hang off degree-1 endpoints, repeatedly, so walks
    /// never wander into a dead end. Returns the number of links removed.
    fn prune_dangling(&self, used: &mut [bool]) -> usize {
        let mut degree: Vec<usize> = self.adjacency.iter().map(Vec::len).collect();
        let mut stack: Vec<usize> = (0..degree.len()).filter(|&n| degree[n] == 1).collect();
        let mut removed = 0;

        while let Some(n) = stack.pop() {
            let Some(link) = self.adjacency[n].iter().copied().find(|&l| !used[l]) else {
                continue;
            };
            used[link] = true;
            removed += 1;
            degree[n] -= 1;
            let other = self.other_end(link, n);
            degree[other] -= 1;
            if degree[other] == 1 {
                stack.push(other);
            }
        }

        removed
    }
}

/// Stitch an edge soup into closed contours.
///
/// Endpoints are matched on the tolerance grid and edges are followed
/// regardless of their stored direction. Chains that do not close are
/// discarded; they come from floating-point near misses and degenerate
/// triangles. Every returned contour is counter-clockwise.
pub fn build_contours(edges: &[Edge]) -> Stitched {
    let graph = EdgeGraph::build(edges);
    let mut used = vec![false; graph.links.len()];
    let mut discarded = graph.dropped + graph.prune_dangling(&mut used);
    let mut contours = Vec::new();

    for first in 0..graph.links.len() {
        if used[first] {
            continue;
        }
        used[first] = true;

        let (start, mut current) = graph.links[first];
        let mut nodes = vec![start];
        let mut walked = 1;

        let closed = loop {
            if current == start {
                break true;
            }
            nodes.push(current);
            let next = graph.adjacency[current].iter().copied().find(|&l| !used[l]);
            match next {
                Some(link) => {
                    used[link] = true;
                    walked += 1;
                    current = graph.other_end(link, current);
                }
                None => break false,
            }
        };

        if closed && nodes.len() >= 3 {
            let contour = Contour::new(nodes.iter().map(|&n| graph.positions[n]).collect());
            contours.push(contour.make_ccw());
        } else {
            debug!(edges = walked, closed, "Discarding open chain");
            discarded += walked;
        }
    }

    Stitched {
        contours,
        discarded_edges: discarded,
    }
}

/// Stitch every layer's edge soup into contours.
///
/// Only crossing edges are stitched; edges of in-plane triangles count as
/// discarded.
pub fn create_contours(layers: &[LayerEdges]) -> Vec<SliceLayer> {
    let result: Vec<SliceLayer> = layers
        .par_iter()
        .map(|layer| {
            let stitched = build_contours(&layer.edges);
            SliceLayer {
                z: layer.z,
                index: layer.index,
                contours: stitched.contours,
                discarded_edges: stitched.discarded_edges + layer.coplanar.len(),
            }
        })
        .collect();

    info!(
        layers = result.len(),
        contours = result.iter().map(|l| l.contours.len()).sum::<usize>(),
        discarded_edges = result.iter().map(|l| l.discarded_edges).sum::<usize>(),
        "Stitched contours"
    );

    result
}
