// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Indoor model records
//!
//! Plain data mirroring the JSON produced by the IndoorGML reader: a global
//! bounding box, cells made of planar surfaces and cell boundaries that are
//! either a single surface (3D) or a line string (2D). Coordinates are kept
//! as flat `[x0, y0, z0, x1, y1, z1, ...]` sequences.

use std::fmt;
use std::io::Read;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

use crate::error::{Error, Result};

/// Spatial extent of the whole model.
///
/// Deserialized from six scalars `[minX, minY, minZ, maxX, maxY, maxZ]`.
/// Each axis is reordered on load so `min_* <= max_*` holds even when the
/// source lists the corners the other way round.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "[f64; 6]", into = "[f64; 6]")]
pub struct BoundingBox {
    pub min_x: f64,
    pub min_y: f64,
    pub min_z: f64,
    pub max_x: f64,
    pub max_y: f64,
    pub max_z: f64,
}

impl BoundingBox {
    /// Create a bounding box from two opposite corners
    pub fn new(from: [f64; 3], to: [f64; 3]) -> Self {
        Self {
            min_x: from[0].min(to[0]),
            min_y: from[1].min(to[1]),
            min_z: from[2].min(to[2]),
            max_x: from[0].max(to[0]),
            max_y: from[1].max(to[1]),
            max_z: from[2].max(to[2]),
        }
    }

    /// Absolute span along each axis
    #[inline]
    pub fn extent(&self) -> [f64; 3] {
        [
            (self.max_x - self.min_x).abs(),
            (self.max_y - self.min_y).abs(),
            (self.max_z - self.min_z).abs(),
        ]
    }

    /// The eight corner points
    pub fn corners(&self) -> [[f64; 3]; 8] {
        let (x0, y0, z0) = (self.min_x, self.min_y, self.min_z);
        let (x1, y1, z1) = (self.max_x, self.max_y, self.max_z);
        [
            [x0, y0, z0],
            [x1, y0, z0],
            [x1, y1, z0],
            [x0, y1, z0],
            [x0, y0, z1],
            [x1, y0, z1],
            [x1, y1, z1],
            [x0, y1, z1],
        ]
    }
}

impl From<[f64; 6]> for BoundingBox {
    fn from(v: [f64; 6]) -> Self {
        Self::new([v[0], v[1], v[2]], [v[3], v[4], v[5]])
    }
}

impl From<BoundingBox> for [f64; 6] {
    fn from(b: BoundingBox) -> Self {
        [b.min_x, b.min_y, b.min_z, b.max_x, b.max_y, b.max_z]
    }
}

/// One planar face: an exterior ring plus zero or more hole rings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Surface {
    pub exterior: Vec<f64>,
    #[serde(default, deserialize_with = "deserialize_interior")]
    pub interior: Vec<Vec<f64>>,
}

impl Surface {
    pub fn new(exterior: Vec<f64>, interior: Vec<Vec<f64>>) -> Self {
        Self { exterior, interior }
    }

    /// Surface without holes
    pub fn from_exterior(exterior: Vec<f64>) -> Self {
        Self {
            exterior,
            interior: Vec::new(),
        }
    }
}

/// Older exports wrote `interior` as one flat ring instead of a ring list.
#[derive(Deserialize)]
#[serde(untagged)]
enum InteriorRepr {
    Rings(Vec<Vec<f64>>),
    Flat(Vec<f64>),
}

fn deserialize_interior<'de, D>(deserializer: D) -> std::result::Result<Vec<Vec<f64>>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match InteriorRepr::deserialize(deserializer)? {
        InteriorRepr::Rings(rings) => rings,
        InteriorRepr::Flat(ring) if ring.is_empty() => Vec::new(),
        InteriorRepr::Flat(ring) => vec![ring],
    })
}

/// A room or space unit bounded by a shell of surfaces.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cell {
    pub id: String,
    #[serde(default)]
    pub geometry: Vec<Surface>,
    /// Every other field of the source record (name, description, ...)
    #[serde(flatten)]
    pub properties: Map<String, Value>,
}

impl Cell {
    pub fn new(id: impl Into<String>, geometry: Vec<Surface>) -> Self {
        Self {
            id: id.into(),
            geometry,
            properties: Map::new(),
        }
    }
}

/// Dimensionality tag of a cell boundary
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GeometryType {
    #[serde(rename = "3D")]
    Surface3D,
    #[serde(rename = "2D")]
    Line2D,
}

impl fmt::Display for GeometryType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GeometryType::Surface3D => f.write_str("3D"),
            GeometryType::Line2D => f.write_str("2D"),
        }
    }
}

/// Raw geometry record of a cell boundary
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum BoundaryRecord {
    Surface(Surface),
    LineString { points: Vec<f64> },
}

/// Resolved view of a boundary's geometry
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BoundaryShape<'a> {
    Surface(&'a Surface),
    Line(&'a [f64]),
}

/// A shared or exterior boundary between cells.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CellBoundary {
    pub id: String,
    pub geometry_type: GeometryType,
    #[serde(default)]
    pub geometry: Vec<BoundaryRecord>,
}

impl CellBoundary {
    /// 3D boundary with a single surface
    pub fn surface(id: impl Into<String>, surface: Surface) -> Self {
        Self {
            id: id.into(),
            geometry_type: GeometryType::Surface3D,
            geometry: vec![BoundaryRecord::Surface(surface)],
        }
    }

    /// 2D boundary with a line string
    pub fn line(id: impl Into<String>, points: Vec<f64>) -> Self {
        Self {
            id: id.into(),
            geometry_type: GeometryType::Line2D,
            geometry: vec![BoundaryRecord::LineString { points }],
        }
    }

    /// Resolve the first geometry record against the declared type.
    ///
    /// Only the first record is used; boundaries never carry more than one.
    pub fn shape(&self) -> Result<BoundaryShape<'_>> {
        let record = self.geometry.first().ok_or_else(|| Error::MissingGeometry {
            id: self.id.clone(),
        })?;

        match (self.geometry_type, record) {
            (GeometryType::Surface3D, BoundaryRecord::Surface(surface)) => {
                Ok(BoundaryShape::Surface(surface))
            }
            (GeometryType::Line2D, BoundaryRecord::LineString { points }) => {
                Ok(BoundaryShape::Line(points))
            }
            (expected, _) => Err(Error::GeometryTypeMismatch {
                id: self.id.clone(),
                expected,
            }),
        }
    }
}

/// A fully loaded indoor model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IndoorModel {
    #[serde(alias = "minmax")]
    pub bounding_box: BoundingBox,
    #[serde(default)]
    pub cells: Vec<Cell>,
    #[serde(default)]
    pub cell_boundaries: Vec<CellBoundary>,
    /// Network layers, carried through untouched
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub multi_layered_graph: Option<Value>,
}

impl IndoorModel {
    pub fn new(bounding_box: BoundingBox) -> Self {
        Self {
            bounding_box,
            cells: Vec::new(),
            cell_boundaries: Vec::new(),
            multi_layered_graph: None,
        }
    }

    /// Parse a model from its JSON text
    pub fn from_json(content: &str) -> Result<Self> {
        Ok(serde_json::from_str(content)?)
    }

    /// Parse a model from a reader (file, socket, ...)
    pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
        Ok(serde_json::from_reader(reader)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MODEL_JSON: &str = r#"{
        "minmax": [0, 0, 0, 10, 10, 3],
        "cells": [
            {
                "id": "C1",
                "name": "Lobby",
                "geometry": [
                    { "exterior": [0,0,0, 10,0,0, 10,10,0, 0,10,0], "interior": [] }
                ]
            }
        ],
        "cellBoundaries": [
            {
                "id": "B1",
                "geometryType": "3D",
                "geometry": [ { "exterior": [0,0,0, 10,0,0, 10,0,3, 0,0,3] } ]
            },
            {
                "id": "B2",
                "geometryType": "2D",
                "geometry": [ { "points": [0,0,0, 10,0,0] } ]
            }
        ]
    }"#;

    #[test]
    fn test_parse_model() {
        let model = IndoorModel::from_json(MODEL_JSON).unwrap();

        assert_eq!(model.bounding_box.max_z, 3.0);
        assert_eq!(model.cells.len(), 1);
        assert_eq!(model.cells[0].geometry[0].exterior.len(), 12);
        assert!(model.cells[0].geometry[0].interior.is_empty());
        assert_eq!(model.cells[0].properties["name"], Value::from("Lobby"));
        assert_eq!(model.cell_boundaries.len(), 2);
        assert!(model.multi_layered_graph.is_none());
    }

    #[test]
    fn test_boundary_shapes() {
        let model = IndoorModel::from_json(MODEL_JSON).unwrap();

        match model.cell_boundaries[0].shape().unwrap() {
            BoundaryShape::Surface(surface) => assert_eq!(surface.exterior.len(), 12),
            other => panic!("expected surface, got {:?}", other),
        }
        match model.cell_boundaries[1].shape().unwrap() {
            BoundaryShape::Line(points) => assert_eq!(points, &[0.0, 0.0, 0.0, 10.0, 0.0, 0.0]),
            other => panic!("expected line, got {:?}", other),
        }
    }

    #[test]
    fn test_boundary_shape_mismatch() {
        let boundary = CellBoundary {
            id: "B9".into(),
            geometry_type: GeometryType::Surface3D,
            geometry: vec![BoundaryRecord::LineString {
                points: vec![0.0; 6],
            }],
        };
        assert!(matches!(
            boundary.shape(),
            Err(Error::GeometryTypeMismatch { .. })
        ));

        let empty = CellBoundary {
            id: "B10".into(),
            geometry_type: GeometryType::Line2D,
            geometry: Vec::new(),
        };
        assert!(matches!(empty.shape(), Err(Error::MissingGeometry { .. })));
    }

    #[test]
    fn test_flat_interior_ring() {
        let json = r#"{ "exterior": [0,0,0, 4,0,0, 4,4,0, 0,4,0],
                        "interior": [1,1,0, 2,1,0, 2,2,0] }"#;
        let surface: Surface = serde_json::from_str(json).unwrap();
        assert_eq!(surface.interior.len(), 1);
        assert_eq!(surface.interior[0].len(), 9);

        let nested = r#"{ "exterior": [], "interior": [[1,1,0], [2,2,0]] }"#;
        let surface: Surface = serde_json::from_str(nested).unwrap();
        assert_eq!(surface.interior.len(), 2);
    }

    #[test]
    fn test_bounding_box_reorders_corners() {
        let bbox = BoundingBox::from([10.0, 0.0, 5.0, 0.0, 8.0, -1.0]);
        assert_eq!(bbox.min_x, 0.0);
        assert_eq!(bbox.max_x, 10.0);
        assert_eq!(bbox.min_z, -1.0);
        assert_eq!(bbox.extent(), [10.0, 8.0, 6.0]);
    }

    #[test]
    fn test_multi_layered_graph_is_kept() {
        let json = r#"{ "boundingBox": [0,0,0,1,1,1], "multiLayeredGraph": { "layers": [] } }"#;
        let model = IndoorModel::from_json(json).unwrap();
        assert!(model.cells.is_empty());
        assert!(model.multi_layered_graph.is_some());
    }
}
