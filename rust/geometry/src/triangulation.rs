// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Hole-aware polygon triangulation
//!
//! A 3D surface is projected onto its dominant plane, triangulated in 2D
//! (earcutr by default), and the resulting indices are resolved against the
//! unprojected 3D points. The 2D point list and the 3D point list are built
//! in the same ring order, so index `i` names the same vertex in both.

use nalgebra::{Point2, Point3};
use smallvec::SmallVec;

use crate::error::{Error, Result};
use crate::projection::{dominant_axis, project, ring_points};

/// Tolerance for "point lies on a ring edge" in canonical units
const EDGE_EPSILON: f64 = 1e-9;

/// 2D polygon-with-holes triangulation backend.
///
/// `points` is a flat `[x0, y0, x1, y1, ...]` list holding the exterior ring
/// followed by every hole ring; `hole_starts` holds the point index at which
/// each hole begins. Returns indices into `points`, three per triangle.
pub trait PolygonTriangulator {
    fn triangulate_with_holes(&self, points: &[f64], hole_starts: &[usize]) -> Result<Vec<usize>>;
}

/// Ear clipping via earcutr
#[derive(Debug, Clone, Copy, Default)]
pub struct EarcutTriangulator;

impl PolygonTriangulator for EarcutTriangulator {
    fn triangulate_with_holes(&self, points: &[f64], hole_starts: &[usize]) -> Result<Vec<usize>> {
        earcutr::earcut(points, hole_starts, 2)
            .map_err(|e| Error::TriangulationFailure(format!("{:?}", e)))
    }
}

/// Twice the signed area of triangle `abc`, positive for a left turn at `b`
#[inline]
fn turn(a: &Point2<f64>, b: &Point2<f64>, c: &Point2<f64>) -> f64 {
    (b - a).perp(&(c - a))
}

/// Convex when every non-degenerate corner turns the same way
fn is_convex(points: &[Point2<f64>]) -> bool {
    let n = points.len();
    if n < 3 {
        return false;
    }

    // Collinear corners (|turn| ~ 0) don't decide anything
    let mut turns = (0..n)
        .map(|i| turn(&points[i], &points[(i + 1) % n], &points[(i + 2) % n]))
        .filter(|t| t.abs() > 1e-10);

    match turns.next() {
        Some(first) => turns.all(|t| t.signum() == first.signum()),
        None => true,
    }
}

/// Fan of triangles around the first point
#[inline]
fn fan_triangulate(n: usize) -> Vec<usize> {
    (1..n - 1).flat_map(|i| [0, i, i + 1]).collect()
}

fn flatten_2d(points: &[Point2<f64>], out: &mut Vec<f64>) {
    for p in points {
        out.push(p.x);
        out.push(p.y);
    }
}

/// Triangulate a simple polygon (no holes).
///
/// Triangles and small convex rings skip the backend.
pub fn triangulate_polygon<T: PolygonTriangulator + ?Sized>(
    points: &[Point2<f64>],
    backend: &T,
) -> Result<Vec<usize>> {
    let n = points.len();

    if n < 3 {
        return Err(Error::InsufficientPolygonVertices(n));
    }

    if n == 3 {
        return Ok(vec![0, 1, 2]);
    }

    if n <= 8 && is_convex(points) {
        return Ok(fan_triangulate(n));
    }

    let mut vertices = Vec::with_capacity(n * 2);
    flatten_2d(points, &mut vertices);
    backend.triangulate_with_holes(&vertices, &[])
}

/// Triangulate a polygon with holes.
///
/// Returns triangle indices into the combined point list (outer, then every
/// hole in order).
pub fn triangulate_polygon_with_holes<T: PolygonTriangulator + ?Sized>(
    outer: &[Point2<f64>],
    holes: &[Vec<Point2<f64>>],
    backend: &T,
) -> Result<Vec<usize>> {
    if outer.len() < 3 {
        return Err(Error::InsufficientPolygonVertices(outer.len()));
    }

    if holes.is_empty() {
        return triangulate_polygon(outer, backend);
    }

    let total_points = outer.len() + holes.iter().map(|h| h.len()).sum::<usize>();
    let mut vertices = Vec::with_capacity(total_points * 2);
    flatten_2d(outer, &mut vertices);

    let mut hole_starts: SmallVec<[usize; 4]> = SmallVec::with_capacity(holes.len());
    for hole in holes {
        hole_starts.push(vertices.len() / 2);
        flatten_2d(hole, &mut vertices);
    }

    backend.triangulate_with_holes(&vertices, &hole_starts)
}

/// Signed area of a 2D ring (positive when counter-clockwise)
pub fn signed_area(points: &[Point2<f64>]) -> f64 {
    let n = points.len();
    let mut twice_area = 0.0;
    for i in 0..n {
        let a = &points[i];
        let b = &points[(i + 1) % n];
        twice_area += a.x * b.y - b.x * a.y;
    }
    twice_area / 2.0
}

fn on_segment(p: &Point2<f64>, a: &Point2<f64>, b: &Point2<f64>) -> bool {
    let ab = b - a;
    let ap = p - a;
    let cross = ab.x * ap.y - ab.y * ap.x;
    if cross.abs() > EDGE_EPSILON * ab.norm().max(1.0) {
        return false;
    }
    let dot = ab.dot(&ap);
    dot >= -EDGE_EPSILON && dot <= ab.norm_squared() + EDGE_EPSILON
}

/// Point-in-ring test (even-odd); points on an edge count as inside
fn ring_contains(ring: &[Point2<f64>], p: &Point2<f64>) -> bool {
    let n = ring.len();
    let mut inside = false;
    for i in 0..n {
        let a = &ring[i];
        let b = &ring[(i + 1) % n];
        if on_segment(p, a, b) {
            return true;
        }
        if (a.y > p.y) != (b.y > p.y) {
            let x = a.x + (p.y - a.y) / (b.y - a.y) * (b.x - a.x);
            if p.x < x {
                inside = !inside;
            }
        }
    }
    inside
}

fn edges(ring: &[Point2<f64>]) -> impl Iterator<Item = (&Point2<f64>, &Point2<f64>)> + '_ {
    let n = ring.len();
    (0..n).map(move |i| (&ring[i], &ring[(i + 1) % n]))
}

/// Segments `ab` and `cd` cross at a single point interior to both
fn segments_cross(a: &Point2<f64>, b: &Point2<f64>, c: &Point2<f64>, d: &Point2<f64>) -> bool {
    let straddles = |t1: f64, t2: f64| {
        (t1 > EDGE_EPSILON && t2 < -EDGE_EPSILON) || (t1 < -EDGE_EPSILON && t2 > EDGE_EPSILON)
    };
    straddles(turn(c, d, a), turn(c, d, b)) && straddles(turn(a, b, c), turn(a, b, d))
}

/// Every hole vertex inside the exterior and no hole edge crossing it.
///
/// Vertex tests alone miss holes that cut across a concave corner.
fn hole_inside(outer: &[Point2<f64>], hole: &[Point2<f64>]) -> bool {
    hole.iter().all(|p| ring_contains(outer, p))
        && !edges(hole).any(|(a, b)| edges(outer).any(|(c, d)| segments_cross(a, b, c, d)))
}

/// Triangles over a surface's own 3D vertices
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IndexedTriangles {
    /// Exterior points, then every hole's points, in ring order
    pub vertices: Vec<Point3<f64>>,
    /// Three indices into `vertices` per triangle
    pub indices: Vec<usize>,
}

impl IndexedTriangles {
    #[inline]
    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// Flat `[x, y, z, ...]` list, one vertex per index
    pub fn to_flat(&self) -> Vec<f64> {
        let mut out = Vec::with_capacity(self.indices.len() * 3);
        for &i in &self.indices {
            let p = &self.vertices[i];
            out.extend_from_slice(&[p.x, p.y, p.z]);
        }
        out
    }
}

/// Triangulates planar 3D surfaces, with holes, through a 2D backend
#[derive(Debug, Clone, Default)]
pub struct SurfaceTriangulator<T = EarcutTriangulator> {
    backend: T,
}

impl<T: PolygonTriangulator> SurfaceTriangulator<T> {
    pub fn new(backend: T) -> Self {
        Self { backend }
    }

    /// Triangulate and return a flat vertex list, one triangle every three
    /// vertices
    pub fn triangulate(&self, exterior: &[f64], interior: &[Vec<f64>]) -> Result<Vec<f64>> {
        Ok(self.triangulate_indexed(exterior, interior)?.to_flat())
    }

    /// Triangulate, keeping the index form
    pub fn triangulate_indexed(
        &self,
        exterior: &[f64],
        interior: &[Vec<f64>],
    ) -> Result<IndexedTriangles> {
        let outer_3d = ring_points(exterior)?;
        if outer_3d.len() < 3 {
            return Err(Error::InsufficientPolygonVertices(outer_3d.len()));
        }

        let mut holes_3d = Vec::with_capacity(interior.len());
        for ring in interior {
            let points = ring_points(ring)?;
            if points.is_empty() {
                continue;
            }
            if points.len() < 3 {
                return Err(Error::InsufficientPolygonVertices(points.len()));
            }
            holes_3d.push(points);
        }

        // Holes share the exterior's plane, so one axis serves every ring
        let axis = dominant_axis(&outer_3d)?;
        let outer_2d = project(&outer_3d, axis);
        let holes_2d: Vec<Vec<Point2<f64>>> =
            holes_3d.iter().map(|h| project(h, axis)).collect();

        for (n, hole) in holes_2d.iter().enumerate() {
            if !hole_inside(&outer_2d, hole) {
                return Err(Error::TriangulationFailure(format!(
                    "hole {} is not inside the exterior ring",
                    n
                )));
            }
        }

        let indices = triangulate_polygon_with_holes(&outer_2d, &holes_2d, &self.backend)?;

        let mut vertices = outer_3d;
        for hole in holes_3d {
            vertices.extend(hole);
        }

        if indices.is_empty() {
            return Err(Error::TriangulationFailure(
                "backend produced no triangles".to_string(),
            ));
        }
        if indices.len() % 3 != 0 {
            return Err(Error::TriangulationFailure(format!(
                "index count {} is not a multiple of 3",
                indices.len()
            )));
        }
        if let Some(&bad) = indices.iter().find(|&&i| i >= vertices.len()) {
            return Err(Error::TriangulationFailure(format!(
                "index {} out of range for {} vertices",
                bad,
                vertices.len()
            )));
        }

        Ok(IndexedTriangles { vertices, indices })
    }
}

/// Triangulate a surface with the default earcut backend
pub fn triangulate_surface(exterior: &[f64], interior: &[Vec<f64>]) -> Result<Vec<f64>> {
    SurfaceTriangulator::new(EarcutTriangulator).triangulate(exterior, interior)
}
