//! Field storage for the DG coefficient vector.
//!
//! All six field components live in a single arena laid out element by
//! element: each element owns one contiguous block of
//! `NUM_COMPONENTS * nodes_per_element` coefficients, ordered
//! `[Ex, Ey, Ez, Hx, Hy, Hz]`, each component holding `nodes_per_element`
//! nodal values. Per-element work therefore touches exactly one block, which
//! is what lets the evolution operator split elements across threads.

use crate::{Error, Result};
use nalgebra::DVector;

/// Number of stored field components (E and H, three directions each).
pub const NUM_COMPONENTS: usize = 6;

/// Electric or magnetic field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum FieldType {
    /// Electric field
    E,
    /// Magnetic field
    H,
}

/// Cartesian direction of a field component.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Direction {
    /// x component
    X,
    /// y component
    Y,
    /// z component
    Z,
}

impl Direction {
    /// All directions in axis order.
    pub const ALL: [Direction; 3] = [Direction::X, Direction::Y, Direction::Z];

    /// Axis index (0, 1, 2 for x, y, z).
    #[inline]
    pub fn axis(self) -> usize {
        match self {
            Direction::X => 0,
            Direction::Y => 1,
            Direction::Z => 2,
        }
    }

    /// Unit vector along this direction.
    pub fn unit(self) -> [f64; 3] {
        let mut v = [0.0; 3];
        v[self.axis()] = 1.0;
        v
    }

    /// Whether this component evolves on a mesh of dimension `dim`.
    ///
    /// In 1-D the longitudinal (x) components have no curl and stay frozen,
    /// so only the transverse y/z components are active. Every component is
    /// active in 2-D and 3-D.
    pub fn is_active(self, dim: usize) -> bool {
        dim > 1 || self != Direction::X
    }
}

/// Offset of a component inside an element block.
#[inline]
pub fn component_index(field: FieldType, direction: Direction) -> usize {
    let base = match field {
        FieldType::E => 0,
        FieldType::H => 3,
    };
    base + direction.axis()
}

/// Nodal coefficients of the full E/H state.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldState {
    num_elements: usize,
    nodes_per_element: usize,
    data: Vec<f64>,
}

impl FieldState {
    /// Create a zero state.
    pub fn zeros(num_elements: usize, nodes_per_element: usize) -> Self {
        Self {
            num_elements,
            nodes_per_element,
            data: vec![0.0; num_elements * nodes_per_element * NUM_COMPONENTS],
        }
    }

    /// Number of elements.
    #[inline]
    pub fn num_elements(&self) -> usize {
        self.num_elements
    }

    /// Number of nodes per element.
    #[inline]
    pub fn nodes_per_element(&self) -> usize {
        self.nodes_per_element
    }

    /// Length of one element block.
    #[inline]
    pub fn block_len(&self) -> usize {
        self.nodes_per_element * NUM_COMPONENTS
    }

    /// The coefficients of one element, all components.
    #[inline]
    pub fn element_block(&self, element: usize) -> &[f64] {
        let len = self.block_len();
        &self.data[element * len..(element + 1) * len]
    }

    /// Nodal values of one component on one element.
    #[inline]
    pub fn element_component(&self, element: usize, field: FieldType, direction: Direction) -> &[f64] {
        let npe = self.nodes_per_element;
        let start = element * self.block_len() + component_index(field, direction) * npe;
        &self.data[start..start + npe]
    }

    /// Mutable nodal values of one component on one element.
    #[inline]
    pub fn element_component_mut(
        &mut self,
        element: usize,
        field: FieldType,
        direction: Direction,
    ) -> &mut [f64] {
        let npe = self.nodes_per_element;
        let start = element * self.block_len() + component_index(field, direction) * npe;
        &mut self.data[start..start + npe]
    }

    /// Gather one component over the whole mesh, element by element.
    pub fn component(&self, field: FieldType, direction: Direction) -> DVector<f64> {
        let npe = self.nodes_per_element;
        let mut out = DVector::zeros(self.num_elements * npe);
        for e in 0..self.num_elements {
            out.as_mut_slice()[e * npe..(e + 1) * npe]
                .copy_from_slice(self.element_component(e, field, direction));
        }
        out
    }

    /// Like [`component`](Self::component), rejecting directions that do not
    /// evolve on a mesh of dimension `dim`.
    pub fn active_component(
        &self,
        field: FieldType,
        direction: Direction,
        dim: usize,
    ) -> Result<DVector<f64>> {
        if !direction.is_active(dim) {
            return Err(Error::Config(format!(
                "{field:?}{direction:?} is not an active component in {dim}-D"
            )));
        }
        Ok(self.component(field, direction))
    }

    /// Raw arena.
    #[inline]
    pub fn as_slice(&self) -> &[f64] {
        &self.data
    }

    /// Mutable raw arena.
    #[inline]
    pub fn as_mut_slice(&mut self) -> &mut [f64] {
        &mut self.data
    }

    /// Overwrite with another state of the same layout.
    #[inline]
    pub fn copy_from(&mut self, other: &FieldState) {
        self.data.copy_from_slice(&other.data);
    }

    /// `self += alpha * other`
    #[inline]
    pub fn axpy(&mut self, alpha: f64, other: &FieldState) {
        for (a, b) in self.data.iter_mut().zip(&other.data) {
            *a += alpha * b;
        }
    }

    /// `self = base + alpha * other`
    #[inline]
    pub fn assign_sum(&mut self, base: &FieldState, alpha: f64, other: &FieldState) {
        for ((a, b), c) in self.data.iter_mut().zip(&base.data).zip(&other.data) {
            *a = b + alpha * c;
        }
    }

    /// `self *= alpha`
    #[inline]
    pub fn scale(&mut self, alpha: f64) {
        self.data.iter_mut().for_each(|v| *v *= alpha);
    }

    /// Reset every coefficient to zero.
    pub fn clear(&mut self) {
        self.data.fill(0.0);
    }

    /// Largest absolute coefficient.
    pub fn max_abs(&self) -> f64 {
        self.data.iter().fold(0.0f64, |m, v| m.max(v.abs()))
    }
}
