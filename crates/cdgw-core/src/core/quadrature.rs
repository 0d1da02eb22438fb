//! Quadrature on the positive imaginary frequency axis.
//!
//! Gauss-Legendre nodes on `[-1, 1]` are mapped onto `[0, ∞)` with
//! `u = c (1 + x) / (1 - x)`, where `c` sets the frequency scale at which half of the nodes
//! lie below and half above. The Jacobian `2c / (1 - x)^2` is folded into the weights, so
//! `Σ_k w_k f(u_k)` approximates `∫_0^∞ f(u) du` directly.

use thiserror::Error;

const NEWTON_TOLERANCE: f64 = 1e-14;
const NEWTON_MAX_ITERATIONS: usize = 100;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum QuadratureError {
    #[error("Invalid quadrature order: {0} (at least one node is required)")]
    InvalidOrder(usize),
    #[error("Invalid quadrature scale: {0} (must be finite and positive)")]
    InvalidScale(f64),
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct QuadratureNode {
    /// Position `u` on the imaginary axis; the frequency is `i u`.
    pub frequency: f64,
    pub weight: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ImaginaryAxisQuadrature {
    nodes: Vec<QuadratureNode>,
    scale: f64,
}

impl ImaginaryAxisQuadrature {
    pub fn new(order: usize, scale: f64) -> Result<Self, QuadratureError> {
        if order < 1 {
            return Err(QuadratureError::InvalidOrder(order));
        }
        if !scale.is_finite() || scale <= 0.0 {
            return Err(QuadratureError::InvalidScale(scale));
        }

        let (abscissas, weights) = gauss_legendre(order);
        let nodes = abscissas
            .iter()
            .zip(weights.iter())
            .map(|(&x, &w)| {
                let one_minus_x = 1.0 - x;
                QuadratureNode {
                    frequency: scale * (1.0 + x) / one_minus_x,
                    weight: w * 2.0 * scale / (one_minus_x * one_minus_x),
                }
            })
            .collect();

        Ok(Self { nodes, scale })
    }

    pub fn order(&self) -> usize {
        self.nodes.len()
    }

    pub fn scale(&self) -> f64 {
        self.scale
    }

    pub fn nodes(&self) -> &[QuadratureNode] {
        &self.nodes
    }

    pub fn iter(&self) -> impl Iterator<Item = &QuadratureNode> {
        self.nodes.iter()
    }

    pub fn integrate<F>(&self, mut f: F) -> f64
    where
        F: FnMut(f64) -> f64,
    {
        self.nodes.iter().map(|n| n.weight * f(n.frequency)).sum()
    }
}

/// Gauss-Legendre abscissas (ascending) and weights on `[-1, 1]`.
pub fn gauss_legendre(n: usize) -> (Vec<f64>, Vec<f64>) {
    let half = n.div_ceil(2);
    let nn = n as f64;
    let mut x = vec![0.0_f64; n];
    let mut w = vec![0.0_f64; n];

    for i in 0..half {
        let mut z = (std::f64::consts::PI * (i as f64 + 0.75) / (nn + 0.5)).cos();
        let mut derivative = 1.0;
        for _ in 0..NEWTON_MAX_ITERATIONS {
            let (p_n, p_n_minus_1) = legendre_pair(n, z);
            derivative = nn * (z * p_n - p_n_minus_1) / (z * z - 1.0);
            let previous = z;
            z = previous - p_n / derivative;
            if (z - previous).abs() < NEWTON_TOLERANCE {
                break;
            }
        }
        let weight = 2.0 / ((1.0 - z * z) * derivative * derivative);
        x[i] = -z;
        x[n - 1 - i] = z;
        w[i] = weight;
        w[n - 1 - i] = weight;
    }
    (x, w)
}

/// Returns `(P_n(z), P_{n-1}(z))` from the three-term recurrence.
fn legendre_pair(n: usize, z: f64) -> (f64, f64) {
    let mut p1 = 1.0;
    let mut p2 = 0.0;
    for j in 1..=n {
        let p3 = p2;
        p2 = p1;
        let jf = j as f64;
        p1 = ((2.0 * jf - 1.0) * z * p2 - (jf - 1.0) * p3) / jf;
    }
    (p1, p2)
}
