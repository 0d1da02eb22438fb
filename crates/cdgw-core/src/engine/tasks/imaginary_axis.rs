//! Integral of `G(ω + iu) W(iu)` along the imaginary axis.
//!
//! For each orbital `m` with `d = ω - ε_m`, the folded integrand is `W_pm(iu) d / (d² + u²)`.
//! The static value `W_pm(0)` is subtracted under the integral and integrated analytically,
//! `∫_0^∞ d / (d² + u²) du = (π/2) sgn(d)`, so the quadrature only sees
//! `(W_pm(iu) - W_pm(0)) d / (d² + u²)`, which stays smooth when `d` is of order `η`.
//! A frequency on a pole has `d = 0` and `sgn(0) = 0`, so that orbital drops out of the term.
//! The term returned per cell is `(1/π) Σ_m [...]`; the self-energy subtracts it from the
//! residue term.

use crate::core::screening::ScreenedInteraction;
use crate::engine::context::{SigmaContext, pole_offset, sign};
use crate::engine::error::GwError;
use crate::engine::progress::Progress;
use num_complex::Complex64;
use std::f64::consts::{FRAC_PI_2, PI};
use tracing::{debug, instrument};

#[cfg(feature = "parallel")]
use rayon::prelude::*;

#[inline]
fn lorentzian(d: f64, u: f64) -> f64 {
    d / (d * d + u * u)
}

/// `W_pm(0)` for every state block and orbital.
pub fn static_limit<W: ScreenedInteraction>(
    ctx: &SigmaContext<'_, W>,
) -> Result<Vec<Vec<f64>>, GwError> {
    let sample = ctx.screening.evaluate(Complex64::new(0.0, 0.0))?;
    Ok(ctx
        .blocks
        .iter()
        .map(|block| {
            sample
                .contract_block(&block.pairs)
                .iter()
                .map(|w| w.re)
                .collect()
        })
        .collect())
}

/// Holds every contracted `W_pm(iu_k)` before filling cells.
#[instrument(skip_all, name = "imaginary_axis_high_memory")]
pub fn run_high_memory<W: ScreenedInteraction>(
    ctx: &SigmaContext<'_, W>,
    w_static: &[Vec<f64>],
) -> Result<Vec<Vec<f64>>, GwError> {
    let nodes = ctx.quadrature.nodes();
    ctx.reporter.report(Progress::TaskStart {
        total_steps: nodes.len() as u64,
    });

    #[cfg(not(feature = "parallel"))]
    let node_iter = nodes.iter();

    #[cfg(feature = "parallel")]
    let node_iter = nodes.par_iter();

    let samples = node_iter
        .map(|node| {
            let sample = ctx.screening.evaluate(Complex64::new(0.0, node.frequency));
            ctx.reporter.report(Progress::TaskIncrement);
            sample
        })
        .collect::<Result<Vec<_>, _>>()?;
    ctx.reporter.report(Progress::TaskFinish);
    debug!(
        samples = samples.len(),
        bytes = samples.iter().map(|s| s.size_in_bytes()).sum::<usize>(),
        "Screened interaction sampled at all quadrature nodes."
    );

    // contracted[s][k][m] = Re W_pm(iu_k)
    let contracted: Vec<Vec<Vec<f64>>> = ctx
        .blocks
        .iter()
        .map(|block| {
            samples
                .iter()
                .map(|sample| {
                    sample
                        .contract_block(&block.pairs)
                        .iter()
                        .map(|w| w.re)
                        .collect()
                })
                .collect()
        })
        .collect();

    let cells: Vec<(usize, usize)> = ctx
        .frequencies
        .iter()
        .enumerate()
        .flat_map(|(s, freqs)| (0..freqs.len()).map(move |j| (s, j)))
        .collect();

    #[cfg(not(feature = "parallel"))]
    let cell_iter = cells.iter();

    #[cfg(feature = "parallel")]
    let cell_iter = cells.par_iter();

    let values: Vec<f64> = cell_iter
        .map(|&(s, j)| {
            let omega = ctx.frequencies[s][j];
            let mut total = 0.0;
            for (m, &pole) in ctx.poles.energies().iter().enumerate() {
                let d = pole_offset(omega, pole);
                let w0 = w_static[s][m];
                let dynamic: f64 = nodes
                    .iter()
                    .zip(&contracted[s])
                    .map(|(node, wk)| {
                        node.weight * (wk[m] - w0) * lorentzian(d, node.frequency)
                    })
                    .sum();
                total += w0 * FRAC_PI_2 * sign(d) + dynamic;
            }
            total / PI
        })
        .collect();

    Ok(split_rows(ctx, values))
}

/// Streams quadrature nodes, folding each contracted sample into the cell accumulators.
#[instrument(skip_all, name = "imaginary_axis_low_memory")]
pub fn run_low_memory<W: ScreenedInteraction>(
    ctx: &SigmaContext<'_, W>,
    w_static: &[Vec<f64>],
) -> Result<Vec<Vec<f64>>, GwError> {
    let nodes = ctx.quadrature.nodes();
    ctx.reporter.report(Progress::TaskStart {
        total_steps: nodes.len() as u64,
    });

    let mut accumulators: Vec<Vec<f64>> = ctx
        .frequencies
        .iter()
        .zip(w_static)
        .map(|(freqs, w0)| {
            freqs
                .iter()
                .map(|&omega| {
                    ctx.poles
                        .energies()
                        .iter()
                        .zip(w0)
                        .map(|(&pole, &w0m)| w0m * FRAC_PI_2 * sign(pole_offset(omega, pole)))
                        .sum()
                })
                .collect()
        })
        .collect();

    for node in nodes {
        let sample = ctx
            .screening
            .evaluate(Complex64::new(0.0, node.frequency))?;

        #[cfg(not(feature = "parallel"))]
        let rows = accumulators.iter_mut();

        #[cfg(feature = "parallel")]
        let rows = accumulators.par_iter_mut();

        rows.enumerate().for_each(|(s, row)| {
            let wk = sample.contract_block(&ctx.blocks[s].pairs);
            for (acc, &omega) in row.iter_mut().zip(&ctx.frequencies[s]) {
                for (m, &pole) in ctx.poles.energies().iter().enumerate() {
                    let d = pole_offset(omega, pole);
                    *acc += node.weight
                        * (wk[m].re - w_static[s][m])
                        * lorentzian(d, node.frequency);
                }
            }
        });
        ctx.reporter.report(Progress::TaskIncrement);
    }
    ctx.reporter.report(Progress::TaskFinish);

    for row in accumulators.iter_mut() {
        for value in row.iter_mut() {
            *value /= PI;
        }
    }
    Ok(accumulators)
}

fn split_rows<W: ScreenedInteraction>(
    ctx: &SigmaContext<'_, W>,
    values: Vec<f64>,
) -> Vec<Vec<f64>> {
    let mut offset = 0;
    ctx.frequencies
        .iter()
        .map(|freqs| {
            let row = values[offset..offset + freqs.len()].to_vec();
            offset += freqs.len();
            row
        })
        .collect()
}
