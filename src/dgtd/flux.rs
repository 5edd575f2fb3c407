//! Numerical fluxes and boundary ghost states.
//!
//! Both are closed sets, resolved once into plain function pointers when the
//! evolution operator is built so the face loop carries no branching on them.

/// Cartesian 3-vector.
pub type Vec3 = [f64; 3];

/// Numerical flux across element faces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum FluxType {
    /// Average of both traces; non-dissipative.
    Centered,
    /// Impedance-weighted characteristic upwinding.
    #[default]
    Upwind,
}

/// Treatment of faces on the domain boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum BoundaryCondition {
    /// Perfect electric conductor, `n x E = 0`.
    #[default]
    Pec,
    /// Perfect magnetic conductor, `n x H = 0`.
    Pmc,
    /// Silver-Muller absorbing boundary.
    Sma,
}

/// Field trace on one side of a face node.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Trace {
    /// Electric field
    pub e: Vec3,
    /// Magnetic field
    pub h: Vec3,
    /// Intrinsic impedance of the medium on this side
    pub impedance: f64,
}

/// Flux corrections `n x (H* - H^-)` and `n x (E* - E^-)` at a face node.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FluxJump {
    /// Correction entering the E equation
    pub h: Vec3,
    /// Correction entering the H equation
    pub e: Vec3,
}

/// `(normal, interior, exterior) -> jump`
pub type FluxFn = fn(&Vec3, &Trace, &Trace) -> FluxJump;

/// `(interior, incident) -> exterior`
pub type GhostFn = fn(&Trace, &Trace) -> Trace;

impl FluxType {
    /// The flux routine for this type.
    pub fn resolve(self) -> FluxFn {
        match self {
            FluxType::Centered => centered_flux,
            FluxType::Upwind => upwind_flux,
        }
    }
}

impl BoundaryCondition {
    /// The ghost-state routine for this condition.
    pub fn resolve(self) -> GhostFn {
        match self {
            BoundaryCondition::Pec => pec_ghost,
            BoundaryCondition::Pmc => pmc_ghost,
            BoundaryCondition::Sma => sma_ghost,
        }
    }
}

#[inline]
pub(crate) fn cross(a: &Vec3, b: &Vec3) -> Vec3 {
    [
        a[1] * b[2] - a[2] * b[1],
        a[2] * b[0] - a[0] * b[2],
        a[0] * b[1] - a[1] * b[0],
    ]
}

#[inline]
fn sub(a: &Vec3, b: &Vec3) -> Vec3 {
    [a[0] - b[0], a[1] - b[1], a[2] - b[2]]
}

#[inline]
fn neg(a: &Vec3) -> Vec3 {
    [-a[0], -a[1], -a[2]]
}

fn centered_flux(normal: &Vec3, interior: &Trace, exterior: &Trace) -> FluxJump {
    let jump_h = cross(normal, &sub(&exterior.h, &interior.h));
    let jump_e = cross(normal, &sub(&exterior.e, &interior.e));
    FluxJump {
        h: jump_h.map(|v| 0.5 * v),
        e: jump_e.map(|v| 0.5 * v),
    }
}

fn upwind_flux(normal: &Vec3, interior: &Trace, exterior: &Trace) -> FluxJump {
    let (z_in, z_out) = (interior.impedance, exterior.impedance);
    let (y_in, y_out) = (1.0 / z_in, 1.0 / z_out);

    let de = sub(&exterior.e, &interior.e);
    let dh = sub(&exterior.h, &interior.h);
    let n_de = cross(normal, &de);
    let n_dh = cross(normal, &dh);
    let nn_de = cross(normal, &n_de);
    let nn_dh = cross(normal, &n_dh);

    let mut jump = FluxJump {
        h: [0.0; 3],
        e: [0.0; 3],
    };
    for k in 0..3 {
        jump.h[k] = (z_out * n_dh[k] - nn_de[k]) / (z_in + z_out);
        jump.e[k] = (y_out * n_de[k] + nn_dh[k]) / (y_in + y_out);
    }
    jump
}

fn pec_ghost(interior: &Trace, _incident: &Trace) -> Trace {
    Trace {
        e: neg(&interior.e),
        ..*interior
    }
}

fn pmc_ghost(interior: &Trace, _incident: &Trace) -> Trace {
    Trace {
        h: neg(&interior.h),
        ..*interior
    }
}

fn sma_ghost(interior: &Trace, incident: &Trace) -> Trace {
    Trace {
        impedance: interior.impedance,
        ..*incident
    }
}
