use super::{BoundingBox, Mesh};
use crate::{Error, Result};
use std::collections::hash_map::Entry;
use std::collections::HashMap;

/// What lies across one local face of an element.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FaceLink {
    /// Shared with another element (through its opposite local face)
    Interior {
        /// Neighbouring element
        element: usize,
    },
    /// On the domain boundary
    Boundary,
}

/// Element-to-element connectivity through faces.
///
/// Local face `f` of an element lies on axis `f / 2`, on the min side when
/// `f` is even and on the max side when odd. Because all elements share the
/// global axis orientation, the neighbour across face `f` always touches it
/// through its own face `f ^ 1`.
#[derive(Debug, Clone)]
pub struct Topology {
    faces_per_element: usize,
    links: Vec<FaceLink>,
    num_interior_faces: usize,
    num_boundary_faces: usize,
}

impl Topology {
    /// Match element faces by their corner vertex ids.
    pub fn build(mesh: &Mesh) -> Result<Self> {
        let dim = mesh.dim();
        let faces_per_element = 2 * dim;
        let corners = 1usize << dim;
        let num_elements = mesh.num_elements();

        let mut links = vec![FaceLink::Boundary; num_elements * faces_per_element];
        // Face key -> (element, local face, matched)
        let mut faces: HashMap<Vec<usize>, (usize, usize, bool)> = HashMap::new();
        let mut num_interior_faces = 0;

        for e in 0..num_elements {
            let ids = mesh.element_vertices(e);
            for f in 0..faces_per_element {
                let (axis, side) = (f / 2, f % 2);
                let mut key: Vec<usize> = (0..corners)
                    .filter(|&c| (c >> axis) & 1 == side)
                    .map(|c| ids[c])
                    .collect();
                key.sort_unstable();

                match faces.entry(key) {
                    Entry::Vacant(slot) => {
                        slot.insert((e, f, false));
                    }
                    Entry::Occupied(mut slot) => {
                        let (other, other_face, matched) = *slot.get();
                        if matched {
                            return Err(Error::Mesh(format!(
                                "face {other_face} of element {other} is shared by more than two elements"
                            )));
                        }
                        if other_face != f ^ 1 {
                            return Err(Error::Mesh(format!(
                                "elements {other} and {e} meet through misaligned faces {other_face} and {f}"
                            )));
                        }
                        links[other * faces_per_element + other_face] = FaceLink::Interior { element: e };
                        links[e * faces_per_element + f] = FaceLink::Interior { element: other };
                        slot.get_mut().2 = true;
                        num_interior_faces += 1;
                    }
                }
            }
        }
        let num_boundary_faces = faces.values().filter(|slot| !slot.2).count();

        let bbox = mesh.bounding_box();
        for e in 0..num_elements {
            for f in 0..faces_per_element {
                if links[e * faces_per_element + f] == FaceLink::Boundary {
                    check_unshared_face(mesh, &bbox, e, f)?;
                }
            }
        }

        Ok(Self {
            faces_per_element,
            links,
            num_interior_faces,
            num_boundary_faces,
        })
    }

    /// Neighbour across local face `face` of `element`.
    #[inline]
    pub fn link(&self, element: usize, face: usize) -> FaceLink {
        self.links[element * self.faces_per_element + face]
    }

    /// Local faces per element (`2 * dim`).
    #[inline]
    pub fn faces_per_element(&self) -> usize {
        self.faces_per_element
    }

    /// Number of faces shared by two elements.
    #[inline]
    pub fn num_interior_faces(&self) -> usize {
        self.num_interior_faces
    }

    /// Number of faces on the domain boundary.
    #[inline]
    pub fn num_boundary_faces(&self) -> usize {
        self.num_boundary_faces
    }
}

/// An unmatched face must be a true boundary: either on the bounding-box hull
/// or not touched by any other element. Otherwise the mesh is non-conforming.
fn check_unshared_face(mesh: &Mesh, bbox: &BoundingBox, e: usize, f: usize) -> Result<()> {
    let (axis, upper) = (f / 2, f % 2 == 1);
    let (min, max) = mesh.element_bounds(e);
    let tol = |k: usize| 1e-10 * bbox.extent(k).max(1.0);

    let coord = if upper { max[axis] } else { min[axis] };
    let hull = if upper { bbox.max[axis] } else { bbox.min[axis] };
    if (coord - hull).abs() <= tol(axis) {
        return Ok(());
    }

    let touching = (0..mesh.num_elements()).filter(|&g| g != e).find(|&g| {
        let (gmin, gmax) = mesh.element_bounds(g);
        let opposite = if upper { gmin[axis] } else { gmax[axis] };
        (opposite - coord).abs() <= tol(axis)
            && (0..mesh.dim())
                .filter(|&k| k != axis)
                .all(|k| max[k].min(gmax[k]) - min[k].max(gmin[k]) > tol(k))
    });
    match touching {
        Some(g) => Err(Error::Mesh(format!(
            "face {f} of element {e} touches element {g} without sharing its vertices (non-conforming mesh)"
        ))),
        None => Ok(()),
    }
}
