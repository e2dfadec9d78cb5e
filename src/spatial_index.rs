//! An octree that accelerates ray/scene intersection.
//!
//! The tree is built once, top-down, from the full triangle set (spec
//! design notes §9: built absolutely, not incrementally) and is immutable
//! afterward. Triangles are referenced by index into the owning
//! [`crate::scene::Scene`]'s triangle arena rather than by pointer, so
//! `lastHit` comparisons and self-intersection skipping are plain integer
//! comparisons (spec design notes §9: "Tagged-variant octree").

use crate::constants::{MAX_ITEMS, MAX_LEVELS, TRIANGLE_TOLERANCE};
use crate::triangle::Triangle;
use crate::vec3::{Aabb, Point3, Vec3};

pub type TriangleRef = usize;

enum Node {
    Leaf {
        bound: Aabb,
        items: Vec<TriangleRef>,
    },
    Branch {
        bound: Aabb,
        children: [Option<Box<Node>>; 8],
    },
}

impl Node {
    fn bound(&self) -> Aabb {
        match self {
            Node::Leaf { bound, .. } => *bound,
            Node::Branch { bound, .. } => *bound,
        }
    }
}

pub struct SpatialIndex {
    root: Node,
}

/// Index of the subcell containing `point` within a node spanning `bound`:
/// bit 0 = x-high, bit 1 = y-high, bit 2 = z-high.
fn subcell_of(bound: &Aabb, point: Point3) -> usize {
    let mid = bound.mid();
    let mut cell = 0usize;
    for axis in 0..3 {
        if point[axis] >= mid[axis] {
            cell |= 1 << axis;
        }
    }
    cell
}

/// The bound of subcell `index` within a parent spanning `bound`.
fn subcell_bound(bound: &Aabb, mid: Point3, index: usize) -> Aabb {
    let mut lo = Point3::zero();
    let mut hi = Point3::zero();
    for axis in 0..3 {
        let (a_lo, a_hi) = if (index >> axis) & 1 == 1 {
            (mid[axis], bound.hi[axis])
        } else {
            (bound.lo[axis], mid[axis])
        };
        lo = set_axis(lo, axis, a_lo);
        hi = set_axis(hi, axis, a_hi);
    }
    Aabb::new(lo, hi)
}

fn set_axis(mut v: Vec3, axis: usize, value: f64) -> Vec3 {
    match axis {
        0 => v.x = value,
        1 => v.y = value,
        2 => v.z = value,
        _ => unreachable!(),
    }
    v
}

/// Half-open overlap test (inclusive on the cell's low face, exclusive on
/// its high face) so a triangle straddling a subcell boundary is assigned
/// to exactly one subcell at build time. The leaf-time tolerance test is
/// what guarantees it is still *found* even if assigned to the "wrong"
/// neighbor relative to a particular ray.
fn overlaps_cell(item_bound: &Aabb, cell: &Aabb) -> bool {
    (0..3).all(|axis| item_bound.lo[axis] < cell.hi[axis] && item_bound.hi[axis] >= cell.lo[axis])
}

fn build_node(
    bound: Aabb,
    items: Vec<TriangleRef>,
    level: u32,
    triangle_bounds: &[Aabb],
) -> Node {
    if items.len() <= MAX_ITEMS || level >= MAX_LEVELS - 1 {
        return Node::Leaf { bound, items };
    }

    let mid = bound.mid();
    let mut children: [Option<Box<Node>>; 8] = Default::default();
    let mut q1 = 0u32;
    let mut forced_terminal = false;

    for i in 0..8 {
        let cell_bound = subcell_bound(&bound, mid, i);
        let cell_items: Vec<TriangleRef> = items
            .iter()
            .copied()
            .filter(|&idx| overlaps_cell(&triangle_bounds[idx], &cell_bound))
            .collect();

        if cell_items.is_empty() {
            continue;
        }

        let inherited_entire_parent = cell_items.len() == items.len();
        if inherited_entire_parent {
            q1 += 1;
            if q1 > 1 {
                forced_terminal = true;
            }
        }

        let side = cell_bound.hi.x - cell_bound.lo.x;
        let degenerate_subcell = side < 4.0 * TRIANGLE_TOLERANCE;

        let child_level = if forced_terminal || degenerate_subcell {
            MAX_LEVELS
        } else {
            level + 1
        };

        children[i] = Some(Box::new(build_node(
            cell_bound,
            cell_items,
            child_level,
            triangle_bounds,
        )));
    }

    Node::Branch { bound, children }
}

impl SpatialIndex {
    /// Builds the index over `triangles`, with `eye` (the camera position)
    /// included in the root's bound so that primary rays originate inside
    /// the tree (spec §4.4: "Build the spatial index with the eye position
    /// included in its root bound").
    pub fn build(eye: Point3, triangles: &[Triangle]) -> Self {
        let triangle_bounds: Vec<Aabb> = triangles.iter().map(|t| t.bound()).collect();

        let mut bound = Aabb::new(eye, eye);
        for b in &triangle_bounds {
            bound = bound.enclose(*b);
        }

        // Make the root cubical: extend the upper corner along each axis
        // to match the largest extent.
        let extent = bound.hi - bound.lo;
        let max_extent = extent.largest_axis_value();
        bound.hi = bound.lo + Vec3::new(max_extent, max_extent, max_extent);

        let items: Vec<TriangleRef> = (0..triangles.len()).collect();
        let root = build_node(bound, items, 0, &triangle_bounds);
        SpatialIndex { root }
    }

    /// Returns the nearest hit along the ray `(origin, direction)`,
    /// skipping `last_hit` (used to avoid immediate self-re-intersection
    /// at the previous bounce's surface).
    pub fn intersect(
        &self,
        origin: Point3,
        direction: Vec3,
        last_hit: Option<TriangleRef>,
        triangles: &[Triangle],
    ) -> Option<(TriangleRef, Point3)> {
        traverse(&self.root, origin, direction, last_hit, origin, triangles)
    }
}

fn traverse(
    node: &Node,
    origin: Point3,
    direction: Vec3,
    last_hit: Option<TriangleRef>,
    start: Point3,
    triangles: &[Triangle],
) -> Option<(TriangleRef, Point3)> {
    match node {
        Node::Leaf { bound, items } => {
            let expanded = bound.expanded(TRIANGLE_TOLERANCE);
            let mut nearest: Option<(TriangleRef, Point3, f64)> = None;
            for &idx in items {
                if Some(idx) == last_hit {
                    continue;
                }
                let Some(t) = triangles[idx].intersect(origin, direction) else {
                    continue;
                };
                let position = origin + direction * t;
                if !expanded.contains(position) {
                    continue;
                }
                if nearest.map_or(true, |(_, _, best_t)| t < best_t) {
                    nearest = Some((idx, position, t));
                }
            }
            nearest.map(|(idx, pos, _)| (idx, pos))
        }
        Node::Branch { bound, children } => {
            let mid = bound.mid();
            let mut subcell = subcell_of(bound, start);
            let mut cell_position = start;

            loop {
                if let Some(child) = &children[subcell] {
                    if let Some(hit) =
                        traverse(child, origin, direction, last_hit, cell_position, triangles)
                    {
                        return Some(hit);
                    }
                }

                let mut best_axis: Option<usize> = None;
                let mut best_dist = f64::INFINITY;
                for axis in 0..3 {
                    if direction[axis] == 0.0 {
                        continue;
                    }
                    let high_bit = (subcell >> axis) & 1 == 1;
                    let moving_toward_mid =
                        (direction[axis] > 0.0) == !high_bit;
                    let face = if moving_toward_mid {
                        mid[axis]
                    } else if high_bit {
                        bound.hi[axis]
                    } else {
                        bound.lo[axis]
                    };
                    let dist = (face - origin[axis]) / direction[axis];
                    if dist < best_dist {
                        best_dist = dist;
                        best_axis = Some(axis);
                    }
                }

                let Some(axis) = best_axis else {
                    return None;
                };

                let high_bit = (subcell >> axis) & 1 == 1;
                let sbit = if high_bit { -1.0 } else { 1.0 };
                if sbit * direction[axis] < 0.0 {
                    return None;
                }

                cell_position = origin + direction * best_dist;
                subcell ^= 1 << axis;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vec3::Color;

    fn tri(v0: Point3, v1: Point3, v2: Point3) -> Triangle {
        Triangle::new(v0, v1, v2, Color::new(0.5, 0.5, 0.5), Color::zero())
    }

    #[test]
    fn single_triangle_is_found() {
        let triangles = vec![tri(
            Point3::new(-1.0, -1.0, 0.0),
            Point3::new(1.0, -1.0, 0.0),
            Point3::new(0.0, 1.0, 0.0),
        )];
        let index = SpatialIndex::build(Point3::new(0.0, 0.0, -5.0), &triangles);
        let hit = index.intersect(
            Point3::new(0.0, 0.0, -5.0),
            Vec3::new(0.0, 0.0, 1.0),
            None,
            &triangles,
        );
        assert!(hit.is_some());
        assert_eq!(hit.unwrap().0, 0);
    }

    #[test]
    fn miss_returns_none() {
        let triangles = vec![tri(
            Point3::new(-1.0, -1.0, 0.0),
            Point3::new(1.0, -1.0, 0.0),
            Point3::new(0.0, 1.0, 0.0),
        )];
        let index = SpatialIndex::build(Point3::new(0.0, 0.0, -5.0), &triangles);
        let hit = index.intersect(
            Point3::new(10.0, 10.0, -5.0),
            Vec3::new(0.0, 0.0, 1.0),
            None,
            &triangles,
        );
        assert!(hit.is_none());
    }

    #[test]
    fn last_hit_is_skipped() {
        // Two coincident-ish triangles along the ray path; skip the first.
        let triangles = vec![
            tri(
                Point3::new(-1.0, -1.0, 0.0),
                Point3::new(1.0, -1.0, 0.0),
                Point3::new(0.0, 1.0, 0.0),
            ),
            tri(
                Point3::new(-1.0, -1.0, 2.0),
                Point3::new(1.0, -1.0, 2.0),
                Point3::new(0.0, 1.0, 2.0),
            ),
        ];
        let index = SpatialIndex::build(Point3::new(0.0, 0.0, -5.0), &triangles);
        let hit = index.intersect(
            Point3::new(0.0, 0.0, -5.0),
            Vec3::new(0.0, 0.0, 1.0),
            Some(0),
            &triangles,
        );
        assert_eq!(hit.unwrap().0, 1);
    }

    #[test]
    fn many_triangles_force_subdivision_and_stay_intersectable() {
        let mut triangles = Vec::new();
        for i in 0..200 {
            let x = (i as f64) * 0.01;
            triangles.push(tri(
                Point3::new(x - 0.5, -0.5, 0.0),
                Point3::new(x + 0.5, -0.5, 0.0),
                Point3::new(x, 0.5, 0.0),
            ));
        }
        let index = SpatialIndex::build(Point3::new(0.0, 0.0, -5.0), &triangles);
        // Ray through the last triangle's centroid.
        let last = triangles.len() - 1;
        let cx = (last as f64) * 0.01;
        let hit = index.intersect(
            Point3::new(cx, 0.0, -5.0),
            Vec3::new(0.0, 0.0, 1.0),
            None,
            &triangles,
        );
        assert!(hit.is_some());
    }

    #[test]
    fn shared_vertex_on_subcell_boundary_both_intersectable() {
        // Two triangles sharing an edge exactly at x=0, spanning a cubical
        // root that will place x=0 on a subcell boundary.
        let triangles = vec![
            tri(
                Point3::new(-1.0, -1.0, 0.0),
                Point3::new(0.0, -1.0, 0.0),
                Point3::new(0.0, 1.0, 0.0),
            ),
            tri(
                Point3::new(0.0, -1.0, 0.0),
                Point3::new(1.0, -1.0, 0.0),
                Point3::new(0.0, 1.0, 0.0),
            ),
        ];
        let index = SpatialIndex::build(Point3::new(0.0, 0.0, -5.0), &triangles);

        let left = index.intersect(
            Point3::new(-0.5, -0.5, -5.0),
            Vec3::new(0.0, 0.0, 1.0),
            None,
            &triangles,
        );
        let right = index.intersect(
            Point3::new(0.5, -0.5, -5.0),
            Vec3::new(0.0, 0.0, 1.0),
            None,
            &triangles,
        );
        assert_eq!(left.unwrap().0, 0);
        assert_eq!(right.unwrap().0, 1);
    }
}
