// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! # IGML-Lite Core
//!
//! Data model for indoor building models (IndoorGML-style): a bounding box,
//! cells with their boundary surfaces, and cell boundaries.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use igml_lite_core::IndoorModel;
//!
//! let model = IndoorModel::from_json(&std::fs::read_to_string("building.json")?)?;
//! for cell in &model.cells {
//!     println!("{}: {} surfaces", cell.id, cell.geometry.len());
//! }
//! ```
//!
//! Geometry processing lives in `igml-lite-geometry`; this crate only
//! describes and loads the records.

pub mod error;
pub mod model;

pub use error::{Error, Result};
pub use model::{
    BoundaryRecord, BoundaryShape, BoundingBox, Cell, CellBoundary, GeometryType, IndoorModel,
    Surface,
};
