// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use thiserror::Error;

/// Result type for geometry operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur during geometry processing
#[derive(Error, Debug)]
pub enum Error {
    /// The bounding box has zero span on every axis, so no scale exists.
    #[error("Degenerate bounding box: zero extent on every axis")]
    DegenerateBoundingBox,

    #[error("Polygon ring needs at least 3 points, got {0}")]
    InsufficientPolygonVertices(usize),

    #[error("Coordinate sequence length {0} is not a multiple of 3")]
    MalformedCoordinates(usize),

    #[error("Triangulation failed: {0}")]
    TriangulationFailure(String),

    /// Reported, never raised: the later entity replaced the earlier one.
    #[error("Duplicate entity id {0}, previous geometry replaced")]
    DuplicateEntityId(String),

    #[error("Model error: {0}")]
    Model(#[from] igml_lite_core::Error),
}
