// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! IGML-Lite Geometry Processing
//!
//! Turns an indoor model into flat triangle and line coordinate lists:
//! coordinates are normalized into a canonical space, every surface is
//! projected onto its dominant plane and triangulated with earcutr, and the
//! results are collected into per-entity geometry directories.

pub mod directory;
pub mod error;
pub mod normalize;
pub mod projection;
pub mod triangulation;

// Re-export nalgebra types for convenience
pub use nalgebra::{Point2, Point3, Vector3};

pub use directory::{
    BoundaryGeometry, BuildReport, EntityFailure, EntityKind, GeometryDirectory,
    GeometryDirectoryBuilder,
};
pub use error::{Error, Result};
pub use normalize::{NormalizationTransform, CANONICAL_SPAN};
pub use projection::{dominant_axis, project, Axis};
pub use triangulation::{
    triangulate_surface, EarcutTriangulator, IndexedTriangles, PolygonTriangulator,
    SurfaceTriangulator,
};
