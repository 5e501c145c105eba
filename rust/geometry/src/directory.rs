// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Geometry directory assembly
//!
//! Runs normalization and triangulation over every cell and cell boundary of
//! a model and collects the results into id-keyed lookup tables. A build is a
//! pure function of the model: nothing is carried over between calls.

use std::fmt;

use igml_lite_core::{BoundaryShape, Cell, CellBoundary, IndoorModel};
use rayon::prelude::*;
use rustc_hash::{FxHashMap, FxHashSet};

use crate::error::{Error, Result};
use crate::normalize::NormalizationTransform;
use crate::triangulation::{EarcutTriangulator, PolygonTriangulator, SurfaceTriangulator};

/// Which id space an entity belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityKind {
    Cell,
    CellBoundary,
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntityKind::Cell => f.write_str("cell"),
            EntityKind::CellBoundary => f.write_str("cell boundary"),
        }
    }
}

/// Processed geometry of a cell boundary
#[derive(Debug, Clone, PartialEq)]
pub enum BoundaryGeometry {
    /// Triangle list, one triangle every three vertices
    Triangles(Vec<f64>),
    /// Normalized line-string points
    Line(Vec<f64>),
}

impl BoundaryGeometry {
    /// Flat `[x, y, z, ...]` coordinates
    pub fn coordinates(&self) -> &[f64] {
        match self {
            BoundaryGeometry::Triangles(c) | BoundaryGeometry::Line(c) => c,
        }
    }

    #[inline]
    pub fn is_line(&self) -> bool {
        matches!(self, BoundaryGeometry::Line(_))
    }
}

/// Entity id to processed geometry
#[derive(Debug, Clone)]
pub struct GeometryDirectory<G> {
    entries: FxHashMap<String, G>,
}

impl<G> Default for GeometryDirectory<G> {
    fn default() -> Self {
        Self {
            entries: FxHashMap::default(),
        }
    }
}

impl<G> GeometryDirectory<G> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert, replacing any previous entry
    fn insert(&mut self, id: String, geometry: G) {
        self.entries.insert(id, geometry);
    }

    #[inline]
    pub fn get(&self, id: &str) -> Option<&G> {
        self.entries.get(id)
    }

    #[inline]
    pub fn contains(&self, id: &str) -> bool {
        self.entries.contains_key(id)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &G)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }
}

/// An entity whose processing did not go cleanly
#[derive(Debug)]
pub struct EntityFailure {
    pub kind: EntityKind,
    pub id: String,
    pub error: Error,
}

/// Everything a build produces
#[derive(Debug)]
pub struct BuildReport {
    /// Transform shared by every entity of the model
    pub transform: NormalizationTransform,
    /// Cell id to triangle vertex list
    pub cells: GeometryDirectory<Vec<f64>>,
    /// Boundary id to triangles (3D) or line points (2D)
    pub cell_boundaries: GeometryDirectory<BoundaryGeometry>,
    /// Cell id to the cell record as loaded
    pub cell_metadata: FxHashMap<String, Cell>,
    /// Entities left out of the directories
    pub failures: Vec<EntityFailure>,
    /// Ids seen more than once; the last occurrence won
    pub duplicates: Vec<EntityFailure>,
}

impl BuildReport {
    /// True when every entity made it into its directory
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }

    /// Total triangles across cells and 3D boundaries
    pub fn triangle_count(&self) -> usize {
        let cells: usize = self.cells.iter().map(|(_, c)| c.len() / 9).sum();
        let boundaries: usize = self
            .cell_boundaries
            .iter()
            .filter(|(_, g)| !g.is_line())
            .map(|(_, g)| g.coordinates().len() / 9)
            .sum();
        cells + boundaries
    }
}

/// Builds cell and cell-boundary geometry directories from a model
#[derive(Debug, Clone, Default)]
pub struct GeometryDirectoryBuilder<T = EarcutTriangulator> {
    triangulator: SurfaceTriangulator<T>,
    parallel: bool,
}

impl GeometryDirectoryBuilder {
    pub fn new() -> Self {
        Self::default()
    }
}

impl<T: PolygonTriangulator + Sync> GeometryDirectoryBuilder<T> {
    /// Use a different 2D triangulation backend
    pub fn with_triangulator(backend: T) -> Self {
        Self {
            triangulator: SurfaceTriangulator::new(backend),
            parallel: false,
        }
    }

    /// Process entities on the rayon pool. Output is identical to a
    /// sequential build.
    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Normalize and triangulate the whole model.
    ///
    /// Only a degenerate bounding box fails the build; per-entity errors are
    /// collected in [`BuildReport::failures`].
    pub fn build(&self, model: &IndoorModel) -> Result<BuildReport> {
        let transform = NormalizationTransform::from_bounding_box(&model.bounding_box)?;

        tracing::debug!(
            scale = transform.scale,
            translate_x = transform.translate.x,
            translate_y = transform.translate.y,
            translate_z = transform.translate.z,
            "Computed normalization transform"
        );

        let cell_results = self.run(&model.cells, |cell| self.build_cell(cell, &transform));
        let boundary_results = self.run(&model.cell_boundaries, |boundary| {
            self.build_boundary(boundary, &transform)
        });

        let mut report = BuildReport {
            transform,
            cells: GeometryDirectory::new(),
            cell_boundaries: GeometryDirectory::new(),
            cell_metadata: FxHashMap::default(),
            failures: Vec::new(),
            duplicates: Vec::new(),
        };

        // Merge in input order so last-write-wins holds for parallel builds too
        for (cell, result) in model.cells.iter().zip(cell_results) {
            if report
                .cell_metadata
                .insert(cell.id.clone(), cell.clone())
                .is_some()
            {
                report.note_duplicate(EntityKind::Cell, &cell.id);
            }
            settle(
                &mut report.cells,
                &mut report.failures,
                EntityKind::Cell,
                &cell.id,
                result,
            );
        }

        let mut seen_boundaries: FxHashSet<&str> = FxHashSet::default();
        for (boundary, result) in model.cell_boundaries.iter().zip(boundary_results) {
            if !seen_boundaries.insert(boundary.id.as_str()) {
                report.note_duplicate(EntityKind::CellBoundary, &boundary.id);
            }
            settle(
                &mut report.cell_boundaries,
                &mut report.failures,
                EntityKind::CellBoundary,
                &boundary.id,
                result,
            );
        }

        tracing::info!(
            cells = report.cells.len(),
            cell_boundaries = report.cell_boundaries.len(),
            triangles = report.triangle_count(),
            failures = report.failures.len(),
            duplicates = report.duplicates.len(),
            "Geometry directories built"
        );

        Ok(report)
    }

    /// Triangles for every surface of a cell, concatenated
    pub fn build_cell(&self, cell: &Cell, transform: &NormalizationTransform) -> Result<Vec<f64>> {
        let mut geometry = Vec::new();
        for surface in &cell.geometry {
            let normalized = transform.apply_surface(surface)?;
            let triangles = self
                .triangulator
                .triangulate(&normalized.exterior, &normalized.interior)?;
            geometry.extend(triangles);
        }

        tracing::debug!(
            id = %cell.id,
            surfaces = cell.geometry.len(),
            triangles = geometry.len() / 9,
            "Built cell geometry"
        );
        Ok(geometry)
    }

    /// Triangles for a 3D boundary, normalized points for a 2D one
    pub fn build_boundary(
        &self,
        boundary: &CellBoundary,
        transform: &NormalizationTransform,
    ) -> Result<BoundaryGeometry> {
        let geometry = match boundary.shape()? {
            BoundaryShape::Surface(surface) => {
                // Boundaries are triangulated from the exterior ring alone
                let exterior = transform.apply(&surface.exterior)?;
                BoundaryGeometry::Triangles(self.triangulator.triangulate(&exterior, &[])?)
            }
            BoundaryShape::Line(points) => BoundaryGeometry::Line(transform.apply(points)?),
        };

        tracing::debug!(
            id = %boundary.id,
            geometry_type = %boundary.geometry_type,
            scalars = geometry.coordinates().len(),
            "Built cell boundary geometry"
        );
        Ok(geometry)
    }

    fn run<I, O, F>(&self, items: &[I], f: F) -> Vec<O>
    where
        I: Sync,
        O: Send,
        F: Fn(&I) -> O + Sync + Send,
    {
        if self.parallel {
            items.par_iter().map(f).collect()
        } else {
            items.iter().map(f).collect()
        }
    }
}

/// Record the outcome of the latest occurrence of an id.
///
/// Whatever an earlier occurrence left behind, geometry or failure, is
/// replaced, so an id ends up either in `directory` or in `failures`.
fn settle<G>(
    directory: &mut GeometryDirectory<G>,
    failures: &mut Vec<EntityFailure>,
    kind: EntityKind,
    id: &str,
    result: Result<G>,
) {
    failures.retain(|f| !(f.kind == kind && f.id == id));

    match result {
        Ok(geometry) => directory.insert(id.to_string(), geometry),
        Err(error) => {
            directory.entries.remove(id);
            tracing::warn!(%kind, id, error = %error, "Skipping entity");
            failures.push(EntityFailure {
                kind,
                id: id.to_string(),
                error,
            });
        }
    }
}

impl BuildReport {
    fn note_duplicate(&mut self, kind: EntityKind, id: &str) {
        tracing::warn!(%kind, id, "Duplicate entity id, keeping the last one");
        self.duplicates.push(EntityFailure {
            kind,
            id: id.to_string(),
            error: Error::DuplicateEntityId(id.to_string()),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use igml_lite_core::{BoundingBox, Surface};

    fn floor(x0: f64, y0: f64, size: f64) -> Surface {
        Surface::from_exterior(vec![
            x0, y0, 0.0,
            x0 + size, y0, 0.0,
            x0 + size, y0 + size, 0.0,
            x0, y0 + size, 0.0,
        ])
    }

    fn model() -> IndoorModel {
        let mut model = IndoorModel::new(BoundingBox::from([0.0, 0.0, 0.0, 10.0, 10.0, 10.0]));
        model.cells.push(Cell::new("C1", vec![floor(0.0, 0.0, 10.0)]));
        model.cells.push(Cell::new("C2", vec![floor(0.0, 0.0, 5.0), floor(5.0, 5.0, 5.0)]));
        model.cell_boundaries.push(CellBoundary::surface(
            "B1",
            Surface::from_exterior(vec![
                0.0, 0.0, 0.0, 10.0, 0.0, 0.0, 10.0, 0.0, 10.0, 0.0, 0.0, 10.0,
            ]),
        ));
        model
            .cell_boundaries
            .push(CellBoundary::line("B2", vec![0.0, 0.0, 0.0, 10.0, 10.0, 10.0]));
        model
    }

    #[test]
    fn test_build_directories() {
        let report = GeometryDirectoryBuilder::new().build(&model()).unwrap();

        assert!(report.is_complete());
        assert_eq!(report.cells.len(), 2);
        assert_eq!(report.cells.get("C1").unwrap().len(), 2 * 9);
        assert_eq!(report.cells.get("C2").unwrap().len(), 4 * 9);
        assert_eq!(report.cell_metadata["C2"].geometry.len(), 2);

        match report.cell_boundaries.get("B1").unwrap() {
            BoundaryGeometry::Triangles(t) => assert_eq!(t.len(), 18),
            other => panic!("expected triangles, got {:?}", other),
        }
        assert_eq!(
            report.cell_boundaries.get("B2").unwrap(),
            &BoundaryGeometry::Line(vec![-10.0, -10.0, 0.0, 10.0, 10.0, 20.0])
        );
        assert_eq!(report.triangle_count(), 2 + 4 + 2);
    }

    #[test]
    fn test_source_model_is_not_modified() {
        let model = model();
        let before = model.clone();
        let builder = GeometryDirectoryBuilder::new();

        let first = builder.build(&model).unwrap();
        let second = builder.build(&model).unwrap();

        assert_eq!(model, before);
        // Rebuilding never normalizes already-normalized coordinates
        assert_eq!(first.cells.get("C1"), second.cells.get("C1"));
    }

    #[test]
    fn test_failures_are_per_entity() {
        let mut model = model();
        model
            .cells
            .push(Cell::new("Bad", vec![Surface::from_exterior(vec![0.0, 0.0, 0.0, 1.0, 1.0, 1.0])]));

        let report = GeometryDirectoryBuilder::new().build(&model).unwrap();

        assert!(!report.is_complete());
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].id, "Bad");
        assert_eq!(report.failures[0].kind, EntityKind::Cell);
        assert!(matches!(
            report.failures[0].error,
            Error::InsufficientPolygonVertices(2)
        ));
        assert!(!report.cells.contains("Bad"));
        assert!(report.cell_metadata.contains_key("Bad"));
        assert_eq!(report.cells.len(), 2);
    }

    #[test]
    fn test_degenerate_bounding_box_aborts() {
        let mut model = model();
        model.bounding_box = BoundingBox::from([1.0, 1.0, 1.0, 1.0, 1.0, 1.0]);

        let result = GeometryDirectoryBuilder::new().build(&model);
        assert!(matches!(result, Err(Error::DegenerateBoundingBox)));
    }

    #[test]
    fn test_duplicate_ids_last_write_wins() {
        let mut model = model();
        model.cells.push(Cell::new("C1", vec![floor(0.0, 0.0, 5.0), floor(5.0, 5.0, 5.0)]));
        model
            .cell_boundaries
            .push(CellBoundary::line("B2", vec![10.0, 10.0, 10.0, 0.0, 0.0, 0.0]));

        let report = GeometryDirectoryBuilder::new().build(&model).unwrap();

        assert!(report.is_complete());
        assert_eq!(report.duplicates.len(), 2);
        assert!(report
            .duplicates
            .iter()
            .all(|d| matches!(d.error, Error::DuplicateEntityId(_))));
        assert_eq!(report.cells.get("C1").unwrap().len(), 4 * 9);
        assert_eq!(
            report.cell_boundaries.get("B2").unwrap().coordinates()[0],
            10.0
        );
    }

    fn broken_ring() -> Surface {
        Surface::from_exterior(vec![0.0, 0.0, 0.0, 1.0, 1.0, 1.0])
    }

    #[test]
    fn test_duplicate_boundary_flagged_whatever_the_outcome() {
        let mut model = model();
        model
            .cell_boundaries
            .push(CellBoundary::surface("B", broken_ring()));
        model
            .cell_boundaries
            .push(CellBoundary::surface("B", floor(0.0, 0.0, 4.0)));
        model
            .cell_boundaries
            .push(CellBoundary::surface("X", broken_ring()));
        model
            .cell_boundaries
            .push(CellBoundary::surface("X", broken_ring()));

        let report = GeometryDirectoryBuilder::new().build(&model).unwrap();

        let duplicate_ids: Vec<&str> = report.duplicates.iter().map(|d| d.id.as_str()).collect();
        assert_eq!(duplicate_ids, vec!["B", "X"]);
        assert!(report
            .duplicates
            .iter()
            .all(|d| d.kind == EntityKind::CellBoundary));

        assert!(report.cell_boundaries.contains("B"));
        assert!(!report.cell_boundaries.contains("X"));
        // Both failed occurrences of X collapse into one entry
        let failed: Vec<&str> = report.failures.iter().map(|f| f.id.as_str()).collect();
        assert_eq!(failed, vec!["X"]);
    }

    #[test]
    fn test_later_success_clears_earlier_failure() {
        let mut model = model();
        model.cells.push(Cell::new("C", vec![broken_ring()]));
        model.cells.push(Cell::new("C", vec![floor(0.0, 0.0, 4.0)]));

        let report = GeometryDirectoryBuilder::new().build(&model).unwrap();

        assert!(report.is_complete(), "failures: {:?}", report.failures);
        assert!(report.cells.contains("C"));
        assert_eq!(report.duplicates.len(), 1);
        assert_eq!(report.duplicates[0].id, "C");
    }

    #[test]
    fn test_later_failure_replaces_earlier_success() {
        let mut model = model();
        model.cells.push(Cell::new("C", vec![floor(0.0, 0.0, 4.0)]));
        model.cells.push(Cell::new("C", vec![broken_ring()]));

        let report = GeometryDirectoryBuilder::new().build(&model).unwrap();

        assert!(!report.cells.contains("C"));
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].id, "C");
        assert_eq!(report.duplicates.len(), 1);
    }

    #[test]
    fn test_mismatched_boundary_is_reported() {
        let mut model = model();
        let mut bad = CellBoundary::line("B3", vec![0.0; 6]);
        bad.geometry_type = igml_lite_core::GeometryType::Surface3D;
        model.cell_boundaries.push(bad);

        let report = GeometryDirectoryBuilder::new().build(&model).unwrap();

        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].kind, EntityKind::CellBoundary);
        assert!(matches!(report.failures[0].error, Error::Model(_)));
        assert_eq!(report.cell_boundaries.len(), 2);
    }

    #[test]
    fn test_parallel_matches_sequential() {
        let mut model = model();
        for i in 0..64 {
            let offset = (i % 8) as f64;
            model
                .cells
                .push(Cell::new(format!("P{}", i), vec![floor(offset, offset, 2.0)]));
        }

        let sequential = GeometryDirectoryBuilder::new().build(&model).unwrap();
        let parallel = GeometryDirectoryBuilder::new()
            .with_parallel(true)
            .build(&model)
            .unwrap();

        assert_eq!(sequential.cells.len(), parallel.cells.len());
        for (id, geometry) in sequential.cells.iter() {
            assert_eq!(parallel.cells.get(id), Some(geometry));
        }
    }
}
