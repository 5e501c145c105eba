// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Dominant-plane selection and projection
//!
//! A planar 3D ring is flattened by dropping the coordinate its normal is
//! most aligned with. That keeps the projected area as large as possible, so
//! the 2D triangulation sees a non-degenerate polygon.

use nalgebra::{Point2, Point3, Vector3};

use crate::error::{Error, Result};

/// Normals shorter than this are treated as zero
const NORMAL_EPSILON: f64 = 1e-12;

/// Coordinate axis a polygon normal is most aligned with
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Axis {
    X,
    Y,
    Z,
}

impl Axis {
    /// Axis with the largest absolute component of `normal`.
    ///
    /// Ties resolve Z first, then X, then Y. A zero normal yields Z.
    pub fn of_normal(normal: &Vector3<f64>) -> Self {
        let nx = normal.x.abs();
        let ny = normal.y.abs();
        let nz = normal.z.abs();
        let max = nx.max(ny).max(nz);

        if nz == max {
            Axis::Z
        } else if nx == max {
            Axis::X
        } else {
            Axis::Y
        }
    }
}

/// Split a flat coordinate sequence into points.
///
/// A trailing point equal to the first one is dropped, so closed and open
/// rings produce the same point list.
pub fn ring_points(coords: &[f64]) -> Result<Vec<Point3<f64>>> {
    if coords.len() % 3 != 0 {
        return Err(Error::MalformedCoordinates(coords.len()));
    }

    let mut points: Vec<Point3<f64>> = coords
        .chunks_exact(3)
        .map(|c| Point3::new(c[0], c[1], c[2]))
        .collect();

    if points.len() > 1 && points.first() == points.last() {
        points.pop();
    }
    Ok(points)
}

/// Normal from the first three points, with a Newell fallback when they are
/// collinear
pub fn polygon_normal(ring: &[Point3<f64>]) -> Result<Vector3<f64>> {
    if ring.len() < 3 {
        return Err(Error::InsufficientPolygonVertices(ring.len()));
    }

    let v1 = ring[1] - ring[0];
    let v2 = ring[2] - ring[0];
    let normal = v1.cross(&v2);
    if normal.norm_squared() > NORMAL_EPSILON {
        return Ok(normal);
    }

    Ok(newell_normal(ring))
}

/// Newell's method over the whole ring (unnormalized)
fn newell_normal(ring: &[Point3<f64>]) -> Vector3<f64> {
    let n = ring.len();
    let mut normal = Vector3::<f64>::zeros();

    for i in 0..n {
        let current = &ring[i];
        let next = &ring[(i + 1) % n];

        normal.x += (current.y - next.y) * (current.z + next.z);
        normal.y += (current.z - next.z) * (current.x + next.x);
        normal.z += (current.x - next.x) * (current.y + next.y);
    }
    normal
}

/// Dominant normal axis of a ring
#[inline]
pub fn dominant_axis(ring: &[Point3<f64>]) -> Result<Axis> {
    polygon_normal(ring).map(|n| Axis::of_normal(&n))
}

/// Drop `axis` from every point: Z keeps (x, y), X keeps (y, z), Y keeps (x, z)
pub fn project(ring: &[Point3<f64>], axis: Axis) -> Vec<Point2<f64>> {
    ring.iter()
        .map(|p| match axis {
            Axis::Z => Point2::new(p.x, p.y),
            Axis::X => Point2::new(p.y, p.z),
            Axis::Y => Point2::new(p.x, p.z),
        })
        .collect()
}
