//! Materials and the mesh/material model.

use crate::geometry::{BoundingBox, Mesh, Point, Topology};
use crate::{Error, Result};
use log::debug;
use std::collections::BTreeMap;

pub use crate::geometry::Attribute;

/// Linear, isotropic, lossless medium in normalized units.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Material {
    permittivity: f64,
    permeability: f64,
}

impl Material {
    /// Create a material. Positivity is checked when the material enters a [`Model`].
    pub const fn new(permittivity: f64, permeability: f64) -> Self {
        Self {
            permittivity,
            permeability,
        }
    }

    /// Free space (`eps = mu = 1`).
    pub const fn vacuum() -> Self {
        Self::new(1.0, 1.0)
    }

    /// Relative permittivity.
    #[inline]
    pub fn permittivity(&self) -> f64 {
        self.permittivity
    }

    /// Relative permeability.
    #[inline]
    pub fn permeability(&self) -> f64 {
        self.permeability
    }

    /// Intrinsic impedance `sqrt(mu / eps)`.
    #[inline]
    pub fn impedance(&self) -> f64 {
        (self.permeability / self.permittivity).sqrt()
    }

    /// Intrinsic admittance `sqrt(eps / mu)`.
    #[inline]
    pub fn admittance(&self) -> f64 {
        (self.permittivity / self.permeability).sqrt()
    }

    /// Wave speed `1 / sqrt(eps * mu)`.
    #[inline]
    pub fn wave_speed(&self) -> f64 {
        1.0 / (self.permittivity * self.permeability).sqrt()
    }

    fn is_valid(&self) -> bool {
        self.permittivity.is_finite()
            && self.permeability.is_finite()
            && self.permittivity > 0.0
            && self.permeability > 0.0
    }
}

impl Default for Material {
    fn default() -> Self {
        Self::vacuum()
    }
}

/// A mesh together with the material of every element.
#[derive(Debug, Clone)]
pub struct Model {
    mesh: Mesh,
    element_materials: Vec<Material>,
    bounding_box: BoundingBox,
    topology: Topology,
}

impl Model {
    /// Build a model, checking that every element attribute maps to a valid material.
    pub fn new<I>(mesh: Mesh, attribute_to_material: I) -> Result<Self>
    where
        I: IntoIterator<Item = (Attribute, Material)>,
    {
        let mut materials = BTreeMap::new();
        for (attribute, material) in attribute_to_material {
            if attribute == 0 {
                return Err(Error::Config("attribute ids must be positive".into()));
            }
            if !material.is_valid() {
                return Err(Error::Config(format!(
                    "material for attribute {attribute} must have positive permittivity and permeability \
                     (got eps = {}, mu = {})",
                    material.permittivity, material.permeability
                )));
            }
            if materials.insert(attribute, material).is_some() {
                return Err(Error::Config(format!(
                    "attribute {attribute} is mapped to more than one material"
                )));
            }
        }

        let element_materials = mesh
            .attributes()
            .enumerate()
            .map(|(e, attribute)| {
                materials.get(&attribute).copied().ok_or_else(|| {
                    Error::Config(format!(
                        "element {e} has attribute {attribute} with no material assigned"
                    ))
                })
            })
            .collect::<Result<Vec<_>>>()?;

        let topology = Topology::build(&mesh)?;
        let bounding_box = mesh.bounding_box();

        debug!(
            "model: {}-D mesh, {} elements, {} materials, {} interior / {} boundary faces",
            mesh.dim(),
            mesh.num_elements(),
            materials.len(),
            topology.num_interior_faces(),
            topology.num_boundary_faces()
        );

        Ok(Self {
            mesh,
            element_materials,
            bounding_box,
            topology,
        })
    }

    /// The underlying mesh.
    #[inline]
    pub fn mesh(&self) -> &Mesh {
        &self.mesh
    }

    /// Face connectivity.
    #[inline]
    pub fn topology(&self) -> &Topology {
        &self.topology
    }

    /// Spatial dimension.
    #[inline]
    pub fn dim(&self) -> usize {
        self.mesh.dim()
    }

    /// Number of elements.
    #[inline]
    pub fn num_elements(&self) -> usize {
        self.mesh.num_elements()
    }

    /// Material governing an element.
    #[inline]
    pub fn material_of(&self, element: usize) -> &Material {
        &self.element_materials[element]
    }

    /// Bounding box of the mesh, computed once at construction.
    #[inline]
    pub fn bounding_box(&self) -> BoundingBox {
        self.bounding_box
    }

    /// Reference (first corner) vertex of an element.
    #[inline]
    pub fn vertex_of(&self, element: usize) -> Point {
        self.mesh.vertex(self.mesh.element_vertices(element)[0])
    }

    /// Whether the elements use more than one material.
    pub fn is_heterogeneous(&self) -> bool {
        let mut distinct = self.element_materials.iter();
        match distinct.next() {
            Some(first) => distinct.any(|m| m != first),
            None => false,
        }
    }

    /// Element containing `point` and its reference coordinates.
    pub fn locate(&self, point: &[f64]) -> Option<(usize, Point)> {
        if point.len() < self.dim() || !self.bounding_box.contains(point) {
            return None;
        }
        self.mesh.locate(point)
    }
}
