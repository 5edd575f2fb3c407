//! Nodal Legendre-Gauss-Lobatto basis on tensor-product reference elements.
//!
//! Nodes double as quadrature points, so the element mass matrix is diagonal
//! and lifting a face term onto a face node is a division by the end-point
//! weight.

use crate::geometry::Point;
use crate::{Error, Result};
use nalgebra::DMatrix;

/// Highest supported polynomial order.
pub const MAX_ORDER: usize = 12;

/// One-dimensional LGL rule on `[-1, 1]` with its Lagrange basis.
#[derive(Debug, Clone)]
pub struct LobattoRule {
    nodes: Vec<f64>,
    weights: Vec<f64>,
    barycentric: Vec<f64>,
    derivative: DMatrix<f64>,
}

impl LobattoRule {
    /// Rule with `order + 1` nodes.
    pub fn new(order: usize) -> Result<Self> {
        if !(1..=MAX_ORDER).contains(&order) {
            return Err(Error::Config(format!(
                "polynomial order must be between 1 and {MAX_ORDER} (got {order})"
            )));
        }
        let n = order;
        let np = n + 1;

        let mut nodes = Vec::with_capacity(np);
        let mut weights = Vec::with_capacity(np);
        for i in 0..np {
            // Newton on x P_n - P_{n-1}, seeded with Chebyshev-Gauss-Lobatto points.
            let mut x = -(std::f64::consts::PI * i as f64 / n as f64).cos();
            let mut p_n = 0.0;
            for _ in 0..100 {
                let (p, q) = legendre_pair(n, x);
                p_n = p;
                let next = x - (x * p - q) / (np as f64 * p);
                let delta = (next - x).abs();
                x = next;
                if delta < 1e-15 {
                    break;
                }
            }
            let (p, _) = legendre_pair(n, x);
            if p.is_finite() {
                p_n = p;
            }
            nodes.push(x);
            weights.push(2.0 / (n as f64 * np as f64 * p_n * p_n));
        }
        nodes[0] = -1.0;
        nodes[n] = 1.0;

        let barycentric: Vec<f64> = (0..np)
            .map(|j| {
                1.0 / (0..np)
                    .filter(|&k| k != j)
                    .map(|k| nodes[j] - nodes[k])
                    .product::<f64>()
            })
            .collect();

        let mut derivative = DMatrix::zeros(np, np);
        for i in 0..np {
            let mut diagonal = 0.0;
            for j in 0..np {
                if i != j {
                    let d = (barycentric[j] / barycentric[i]) / (nodes[i] - nodes[j]);
                    derivative[(i, j)] = d;
                    diagonal -= d;
                }
            }
            derivative[(i, i)] = diagonal;
        }

        Ok(Self {
            nodes,
            weights,
            barycentric,
            derivative,
        })
    }

    /// Polynomial order.
    #[inline]
    pub fn order(&self) -> usize {
        self.nodes.len() - 1
    }

    /// Node coordinates, ascending.
    #[inline]
    pub fn nodes(&self) -> &[f64] {
        &self.nodes
    }

    /// Quadrature weights.
    #[inline]
    pub fn weights(&self) -> &[f64] {
        &self.weights
    }

    /// Differentiation matrix, `D[(i, j)] = l_j'(x_i)`.
    #[inline]
    pub fn derivative(&self) -> &DMatrix<f64> {
        &self.derivative
    }

    /// Values of every Lagrange basis function at `r`.
    pub fn lagrange(&self, r: f64) -> Vec<f64> {
        if let Some(j) = self.nodes.iter().position(|&x| (r - x).abs() < 1e-14) {
            let mut values = vec![0.0; self.nodes.len()];
            values[j] = 1.0;
            return values;
        }
        let mut values: Vec<f64> = self
            .nodes
            .iter()
            .zip(&self.barycentric)
            .map(|(&x, &w)| w / (r - x))
            .collect();
        let sum: f64 = values.iter().sum();
        values.iter_mut().for_each(|v| *v /= sum);
        values
    }
}

/// `(P_n(x), P_{n-1}(x))` by the three-term recurrence.
fn legendre_pair(n: usize, x: f64) -> (f64, f64) {
    let mut previous = 1.0;
    let mut current = x;
    for k in 2..=n {
        let k = k as f64;
        let next = ((2.0 * k - 1.0) * x * current - (k - 1.0) * previous) / k;
        previous = current;
        current = next;
    }
    (current, previous)
}

/// Tensor-product reference element `[-1, 1]^dim`.
///
/// Local node `n` has per-axis indices `i_k = (n / (order + 1)^k) % (order + 1)`.
#[derive(Debug, Clone)]
pub struct ReferenceElement {
    dim: usize,
    rule: LobattoRule,
    nodes_per_element: usize,
    node_indices: Vec<[usize; 3]>,
    face_nodes: Vec<Vec<usize>>,
    quadrature: Vec<f64>,
}

impl ReferenceElement {
    /// Reference element of the given dimension and polynomial order.
    pub fn new(dim: usize, order: usize) -> Result<Self> {
        if !(1..=3).contains(&dim) {
            return Err(Error::Config(format!("unsupported dimension {dim}")));
        }
        let rule = LobattoRule::new(order)?;
        let np = order + 1;
        let nodes_per_element = np.pow(dim as u32);

        let node_indices: Vec<[usize; 3]> = (0..nodes_per_element)
            .map(|n| {
                let mut idx = [0; 3];
                for (k, slot) in idx.iter_mut().enumerate().take(dim) {
                    *slot = (n / np.pow(k as u32)) % np;
                }
                idx
            })
            .collect();

        // Ascending local numbering keeps opposite faces of neighbours aligned.
        let face_nodes = (0..2 * dim)
            .map(|f| {
                let (axis, side) = (f / 2, f % 2);
                let target = if side == 0 { 0 } else { order };
                (0..nodes_per_element)
                    .filter(|&n| node_indices[n][axis] == target)
                    .collect()
            })
            .collect();

        let quadrature = node_indices
            .iter()
            .map(|idx| (0..dim).map(|k| rule.weights()[idx[k]]).product())
            .collect();

        Ok(Self {
            dim,
            rule,
            nodes_per_element,
            node_indices,
            face_nodes,
            quadrature,
        })
    }

    /// Spatial dimension.
    #[inline]
    pub fn dim(&self) -> usize {
        self.dim
    }

    /// Polynomial order.
    #[inline]
    pub fn order(&self) -> usize {
        self.rule.order()
    }

    /// Nodes per element, `(order + 1)^dim`.
    #[inline]
    pub fn nodes_per_element(&self) -> usize {
        self.nodes_per_element
    }

    /// Distance between consecutive nodes along `axis` in local numbering.
    #[inline]
    pub fn stride(&self, axis: usize) -> usize {
        (self.order() + 1).pow(axis as u32)
    }

    /// Local nodes on face `f` (axis `f / 2`, max side when `f` is odd).
    #[inline]
    pub fn face_nodes(&self, f: usize) -> &[usize] {
        &self.face_nodes[f]
    }

    /// Tensor quadrature weight of a node on the reference element.
    #[inline]
    pub fn quadrature_weight(&self, n: usize) -> f64 {
        self.quadrature[n]
    }

    /// Inverse of the end-point weight, the face lifting factor.
    #[inline]
    pub fn lift(&self) -> f64 {
        1.0 / self.rule.weights()[0]
    }

    /// Reference coordinates of a node.
    pub fn node_reference(&self, n: usize) -> Point {
        let mut r = [0.0; 3];
        for k in 0..self.dim {
            r[k] = self.rule.nodes()[self.node_indices[n][k]];
        }
        r
    }

    /// Derivative along `axis` of nodal values `u`, at node `n`, on the reference element.
    #[inline]
    pub fn derivative_at(&self, u: &[f64], n: usize, axis: usize) -> f64 {
        let i = self.node_indices[n][axis];
        let stride = self.stride(axis);
        let base = n - i * stride;
        let d = self.rule.derivative();
        (0..=self.order()).map(|j| d[(i, j)] * u[base + j * stride]).sum()
    }

    /// Basis weights reproducing the nodal interpolant at `reference`.
    pub fn interpolation_weights(&self, reference: &Point) -> Vec<f64> {
        let per_axis: Vec<Vec<f64>> = (0..self.dim)
            .map(|k| self.rule.lagrange(reference[k]))
            .collect();
        self.node_indices
            .iter()
            .map(|idx| (0..self.dim).map(|k| per_axis[k][idx[k]]).product())
            .collect()
    }
}
