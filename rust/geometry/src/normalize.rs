// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Coordinate normalization
//!
//! Maps raw model coordinates into the canonical modeling space: the model is
//! centered on X/Y, its lowest point sits at `z = 0`, and its largest
//! dimension spans [`CANONICAL_SPAN`] units.

use igml_lite_core::{BoundingBox, Surface};
use nalgebra::{Point3, Vector3};

use crate::error::{Error, Result};

/// Length of the largest model dimension after normalization
pub const CANONICAL_SPAN: f64 = 20.0;

/// Uniform scale plus translation, derived once per model
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NormalizationTransform {
    /// Applied after the translation
    pub scale: f64,
    /// Added to every point before scaling
    pub translate: Vector3<f64>,
}

impl NormalizationTransform {
    /// Compute the transform for a model's bounding box
    pub fn from_bounding_box(bbox: &BoundingBox) -> Result<Self> {
        let [ex, ey, ez] = bbox.extent();
        let max_extent = ex.max(ey).max(ez);

        if !max_extent.is_finite() || max_extent <= 0.0 {
            return Err(Error::DegenerateBoundingBox);
        }

        let scale = CANONICAL_SPAN / max_extent;
        if !scale.is_finite() {
            return Err(Error::DegenerateBoundingBox);
        }

        let translate = Vector3::new(
            -(bbox.min_x + bbox.max_x) / 2.0,
            -(bbox.min_y + bbox.max_y) / 2.0,
            -bbox.min_z,
        );

        Ok(Self { scale, translate })
    }

    /// Transform a single point
    #[inline]
    pub fn apply_point(&self, point: Point3<f64>) -> Point3<f64> {
        Point3::from((point.coords + self.translate) * self.scale)
    }

    /// Transform a flat coordinate sequence in place
    pub fn apply_in_place(&self, coords: &mut [f64]) -> Result<()> {
        if coords.len() % 3 != 0 {
            return Err(Error::MalformedCoordinates(coords.len()));
        }

        for chunk in coords.chunks_exact_mut(3) {
            let p = self.apply_point(Point3::new(chunk[0], chunk[1], chunk[2]));
            chunk[0] = p.x;
            chunk[1] = p.y;
            chunk[2] = p.z;
        }
        Ok(())
    }

    /// Transformed copy of a flat coordinate sequence
    pub fn apply(&self, coords: &[f64]) -> Result<Vec<f64>> {
        let mut out = coords.to_vec();
        self.apply_in_place(&mut out)?;
        Ok(out)
    }

    /// Transformed copy of a surface, exterior and every hole ring.
    ///
    /// The source surface is left untouched, so a ring can never be
    /// normalized twice through the builder.
    pub fn apply_surface(&self, surface: &Surface) -> Result<Surface> {
        let exterior = self.apply(&surface.exterior)?;
        let interior = surface
            .interior
            .iter()
            .map(|ring| self.apply(ring))
            .collect::<Result<Vec<_>>>()?;
        Ok(Surface::new(exterior, interior))
    }
}
