//! Semi-discrete DG right-hand side for Maxwell's equations.
//!
//! Strong form on each element `k`, with the collocated LGL mass matrix:
//!
//! ```text
//! dE/dt = 1/eps * [  curl H + LIFT(n x (H* - H^-)) ]
//! dH/dt = 1/mu  * [ -curl E - LIFT(n x (E* - E^-)) ]
//! ```
//!
//! Each element only reads its neighbours' traces and only writes its own
//! block of the rate vector, so elements can be evaluated in any order.

use super::basis::ReferenceElement;
use super::flux::{BoundaryCondition, FluxFn, FluxType, GhostFn, Trace, Vec3};
use super::options::Options;
use super::source::Source;
use crate::arrays::{component_index, Direction, FieldState, FieldType};
use crate::geometry::{FaceLink, Point};
use crate::model::{Material, Model};
use crate::{Error, Result};
use log::{debug, warn};
use rayon::prelude::*;

/// How the operator walks the elements.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Execution {
    /// One thread, element order.
    #[default]
    Serial,
    /// Elements split across the rayon thread pool.
    Parallel,
}

/// `(curl component, differentiated component, sign)` for each derivative axis,
/// so that `(curl F)_i += sign * dF_j/dx_axis`.
const CURL_TERMS: [[(usize, usize, f64); 2]; 3] = [
    [(1, 2, -1.0), (2, 1, 1.0)],
    [(0, 2, 1.0), (2, 0, -1.0)],
    [(0, 1, -1.0), (1, 0, 1.0)],
];

const E: usize = 0;
const H: usize = 3;

/// Affine map and material coefficients of one element.
#[derive(Debug, Clone, Copy)]
struct ElementData {
    origin: Point,
    half_width: Point,
    inv_half_width: Point,
    jacobian: f64,
    material: Material,
    inv_eps: f64,
    inv_mu: f64,
}

/// Spatial DG operator `dU/dt = L(U, t)`.
#[derive(Debug, Clone)]
pub struct EvolutionOperator<'a> {
    model: &'a Model,
    reference: ReferenceElement,
    elements: Vec<ElementData>,
    flux: FluxFn,
    ghost: GhostFn,
    flux_type: FluxType,
    boundary_condition: BoundaryCondition,
    execution: Execution,
    boundary_sources: Vec<Source>,
}

impl<'a> EvolutionOperator<'a> {
    /// Build the operator for `model`.
    ///
    /// `boundary_sources` are imposed through the ghost state of boundary
    /// faces and therefore require absorbing boundaries.
    pub fn new(model: &'a Model, options: &Options, boundary_sources: Vec<Source>) -> Result<Self> {
        let dim = model.dim();
        let reference = ReferenceElement::new(dim, options.order)?;

        if options.flux_type == FluxType::Centered
            && options.boundary_condition == BoundaryCondition::Sma
        {
            return Err(Error::Config(
                "absorbing boundaries require the upwind flux".into(),
            ));
        }
        if !boundary_sources.is_empty() && options.boundary_condition != BoundaryCondition::Sma {
            return Err(Error::Config(
                "boundary-injected sources require absorbing (SMA) boundaries".into(),
            ));
        }
        if let Some(source) = boundary_sources
            .iter()
            .find(|s| s.direction() == Direction::X)
        {
            return Err(Error::Config(format!(
                "boundary-injected {:?} source must be transverse to the propagation axis x",
                source.field_type()
            )));
        }
        if options.flux_type == FluxType::Centered && model.is_heterogeneous() {
            warn!("centered flux across material interfaces ignores the impedance contrast");
        }

        let mesh = model.mesh();
        let elements: Vec<ElementData> = (0..model.num_elements())
            .map(|e| {
                let (min, max) = mesh.element_bounds(e);
                let mut half_width = [0.0; 3];
                let mut inv_half_width = [0.0; 3];
                let mut jacobian = 1.0;
                for k in 0..dim {
                    half_width[k] = 0.5 * (max[k] - min[k]);
                    inv_half_width[k] = 1.0 / half_width[k];
                    jacobian *= half_width[k];
                }
                let material = *model.material_of(e);
                ElementData {
                    origin: min,
                    half_width,
                    inv_half_width,
                    jacobian,
                    material,
                    inv_eps: 1.0 / material.permittivity(),
                    inv_mu: 1.0 / material.permeability(),
                }
            })
            .collect();

        debug!(
            "evolution operator: order {}, {} nodes/element, {:?} flux, {:?} boundaries, {} boundary sources",
            reference.order(),
            reference.nodes_per_element(),
            options.flux_type,
            options.boundary_condition,
            boundary_sources.len()
        );

        Ok(Self {
            model,
            reference,
            elements,
            flux: options.flux_type.resolve(),
            ghost: options.boundary_condition.resolve(),
            flux_type: options.flux_type,
            boundary_condition: options.boundary_condition,
            execution: options.execution,
            boundary_sources,
        })
    }

    /// The model the operator was built on.
    #[inline]
    pub fn model(&self) -> &'a Model {
        self.model
    }

    /// Reference element shared by all elements.
    #[inline]
    pub fn reference(&self) -> &ReferenceElement {
        &self.reference
    }

    /// Selected flux.
    pub fn flux_type(&self) -> FluxType {
        self.flux_type
    }

    /// Selected boundary condition.
    pub fn boundary_condition(&self) -> BoundaryCondition {
        self.boundary_condition
    }

    /// Total number of nodal coefficients per component.
    pub fn num_nodes(&self) -> usize {
        self.elements.len() * self.reference.nodes_per_element()
    }

    /// Zero state matching this discretization.
    pub fn zero_state(&self) -> FieldState {
        FieldState::zeros(self.elements.len(), self.reference.nodes_per_element())
    }

    /// Physical coordinates of local node `node` of `element`.
    pub fn node_position(&self, element: usize, node: usize) -> Point {
        let data = &self.elements[element];
        let r = self.reference.node_reference(node);
        let mut x = [0.0; 3];
        for k in 0..self.reference.dim() {
            x[k] = data.origin[k] + (r[k] + 1.0) * data.half_width[k];
        }
        x
    }

    /// Add `f(x)` at every node to one component of `state`.
    pub fn add_projection<F>(&self, state: &mut FieldState, field: FieldType, direction: Direction, f: F)
    where
        F: Fn(&Point) -> f64,
    {
        for e in 0..self.elements.len() {
            let positions: Vec<Point> = (0..self.reference.nodes_per_element())
                .map(|n| self.node_position(e, n))
                .collect();
            let values = state.element_component_mut(e, field, direction);
            for (value, x) in values.iter_mut().zip(&positions) {
                *value += f(x);
            }
        }
    }

    /// Evaluate one component of `state` at reference coordinates inside `element`.
    pub fn interpolate(
        &self,
        state: &FieldState,
        element: usize,
        reference: &Point,
        field: FieldType,
        direction: Direction,
    ) -> f64 {
        let weights = self.reference.interpolation_weights(reference);
        weights
            .iter()
            .zip(state.element_component(element, field, direction))
            .map(|(w, v)| w * v)
            .sum()
    }

    /// Discrete electric and magnetic energy, `1/2 sum w J eps |E|^2` and `1/2 sum w J mu |H|^2`.
    pub fn energy(&self, state: &FieldState) -> (f64, f64) {
        let npe = self.reference.nodes_per_element();
        let mut electric = 0.0;
        let mut magnetic = 0.0;
        for (e, data) in self.elements.iter().enumerate() {
            let block = state.element_block(e);
            let (mut e_sum, mut h_sum) = (0.0, 0.0);
            for n in 0..npe {
                let w = self.reference.quadrature_weight(n);
                for c in 0..3 {
                    e_sum += w * block[(E + c) * npe + n].powi(2);
                    h_sum += w * block[(H + c) * npe + n].powi(2);
                }
            }
            electric += 0.5 * data.jacobian * data.material.permittivity() * e_sum;
            magnetic += 0.5 * data.jacobian * data.material.permeability() * h_sum;
        }
        (electric, magnetic)
    }

    /// Crude Courant number `c dt (p + 1)^2 / h_min` over all elements.
    pub fn courant_number(&self, dt: f64) -> f64 {
        let p1 = (self.reference.order() + 1) as f64;
        self.elements
            .iter()
            .map(|data| {
                let h_min = (0..self.reference.dim())
                    .map(|k| 2.0 * data.half_width[k])
                    .fold(f64::INFINITY, f64::min);
                data.material.wave_speed() * dt * p1 * p1 / h_min
            })
            .fold(0.0, f64::max)
    }

    /// Write `L(state, time)` into `rate`.
    pub fn apply(&self, time: f64, state: &FieldState, rate: &mut FieldState) {
        let block_len = state.block_len();
        match self.execution {
            Execution::Serial => rate
                .as_mut_slice()
                .chunks_mut(block_len)
                .enumerate()
                .for_each(|(e, out)| self.element_rate(e, time, state, out)),
            Execution::Parallel => rate
                .as_mut_slice()
                .par_chunks_mut(block_len)
                .enumerate()
                .for_each(|(e, out)| self.element_rate(e, time, state, out)),
        }
    }

    fn element_rate(&self, e: usize, time: f64, state: &FieldState, out: &mut [f64]) {
        let reference = &self.reference;
        let npe = reference.nodes_per_element();
        let dim = reference.dim();
        let data = &self.elements[e];
        let block = state.element_block(e);

        out.fill(0.0);

        // Volume terms
        for axis in 0..dim {
            let scale = data.inv_half_width[axis];
            for &(i, j, sign) in &CURL_TERMS[axis] {
                let h_j = &block[(H + j) * npe..(H + j + 1) * npe];
                let e_j = &block[(E + j) * npe..(E + j + 1) * npe];
                for n in 0..npe {
                    let dh = reference.derivative_at(h_j, n, axis) * scale;
                    let de = reference.derivative_at(e_j, n, axis) * scale;
                    out[(E + i) * npe + n] += data.inv_eps * sign * dh;
                    out[(H + i) * npe + n] -= data.inv_mu * sign * de;
                }
            }
        }

        // Surface terms
        let topology = self.model.topology();
        for face in 0..2 * dim {
            let axis = face / 2;
            let mut normal = [0.0; 3];
            normal[axis] = if face % 2 == 1 { 1.0 } else { -1.0 };
            let lift = reference.lift() * data.inv_half_width[axis];
            let local = reference.face_nodes(face);

            let link = topology.link(e, face);
            for (idx, &n) in local.iter().enumerate() {
                let interior = trace_at(block, npe, n, data.material.impedance());
                let exterior = match link {
                    FaceLink::Interior { element } => {
                        let m = reference.face_nodes(face ^ 1)[idx];
                        let neighbour = &self.elements[element];
                        trace_at(
                            state.element_block(element),
                            npe,
                            m,
                            neighbour.material.impedance(),
                        )
                    }
                    FaceLink::Boundary => {
                        let incident = self.incident(e, n, time, &data.material);
                        (self.ghost)(&interior, &incident)
                    }
                };

                let jump = (self.flux)(&normal, &interior, &exterior);
                for c in 0..3 {
                    out[(E + c) * npe + n] += data.inv_eps * lift * jump.h[c];
                    out[(H + c) * npe + n] -= data.inv_mu * lift * jump.e[c];
                }
            }
        }
    }

    fn incident(&self, element: usize, node: usize, time: f64, material: &Material) -> Trace {
        let mut trace = Trace {
            e: [0.0; 3],
            h: [0.0; 3],
            impedance: material.impedance(),
        };
        if self.boundary_sources.is_empty() {
            return trace;
        }
        let x = self.node_position(element, node);
        for source in &self.boundary_sources {
            let (e, h) = source.incident(&x, time, material);
            add_assign(&mut trace.e, &e);
            add_assign(&mut trace.h, &h);
        }
        trace
    }
}

#[inline]
fn trace_at(block: &[f64], npe: usize, node: usize, impedance: f64) -> Trace {
    let value = |field: FieldType, direction: Direction| {
        block[component_index(field, direction) * npe + node]
    };
    Trace {
        e: Direction::ALL.map(|d| value(FieldType::E, d)),
        h: Direction::ALL.map(|d| value(FieldType::H, d)),
        impedance,
    }
}

#[inline]
fn add_assign(a: &mut Vec3, b: &Vec3) {
    for k in 0..3 {
        a[k] += b[k];
    }
}
