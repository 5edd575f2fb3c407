//! Mesh geometry and topology.
//!
//! Elements are axis-aligned tensor-product cells: segments in 1-D,
//! quadrilaterals in 2-D and hexahedra in 3-D. Corner vertices are stored in
//! lexicographic order (x fastest), so corner `c` sits on the max side of
//! axis `k` exactly when bit `k` of `c` is set.

mod mesh;
mod topology;

pub use mesh::{Attribute, Mesh};
pub use topology::{FaceLink, Topology};

/// A point in space. Coordinates beyond the mesh dimension are zero.
pub type Point = [f64; 3];

/// Axis-aligned bounding box of a mesh.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    /// Spatial dimension
    pub dim: usize,
    /// Minimum corner
    pub min: Point,
    /// Maximum corner
    pub max: Point,
}

impl BoundingBox {
    /// Midpoint along an axis.
    #[inline]
    pub fn center(&self, axis: usize) -> f64 {
        0.5 * (self.min[axis] + self.max[axis])
    }

    /// Extent along an axis.
    #[inline]
    pub fn extent(&self, axis: usize) -> f64 {
        self.max[axis] - self.min[axis]
    }

    /// Whether `point` lies inside the box (inclusive, with a relative tolerance).
    pub fn contains(&self, point: &[f64]) -> bool {
        (0..self.dim).all(|k| {
            let tol = 1e-10 * self.extent(k).max(1.0);
            point[k] >= self.min[k] - tol && point[k] <= self.max[k] + tol
        })
    }
}
