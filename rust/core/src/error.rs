// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Error types for model loading.

use thiserror::Error;

use crate::model::GeometryType;

/// Result type for model operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while loading or inspecting an indoor model
#[derive(Error, Debug)]
pub enum Error {
    #[error("Invalid model JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A cell boundary carries an empty `geometry` list.
    #[error("Cell boundary {id} has no geometry")]
    MissingGeometry { id: String },

    /// The geometry record does not match the declared `geometryType`.
    #[error("Cell boundary {id} is declared {expected} but its geometry does not match")]
    GeometryTypeMismatch { id: String, expected: GeometryType },
}
