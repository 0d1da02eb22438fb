use crate::core::models::ids::OrbitalIndex;
use crate::core::models::orbitals::OrbitalSet;
use crate::core::screening::ScreenedInteraction;
use crate::engine::context::{SigmaContext, pole_offset, sign};
use crate::engine::error::GwError;
use crate::engine::progress::Progress;
use num_complex::Complex64;
use tracing::instrument;

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// Poles of G enclosed by the deformed contour at real frequency `omega`, with the weight
/// of their contribution.
///
/// Above the Fermi level these are the virtual levels in `(μ, ω)` counted with `+1`;
/// below it the occupied levels in `(ω, μ)` counted with `-1`. A pole lying on `omega`
/// itself sits on the contour and carries half that weight.
pub(crate) fn enclosed_poles(
    poles: &OrbitalSet,
    fermi_level: f64,
    omega: f64,
) -> Vec<(OrbitalIndex, f64)> {
    let weight = |d: f64, full: f64| match sign(d) * full.signum() {
        s if s > 0.0 => Some(full),
        s if s == 0.0 => Some(0.5 * full),
        _ => None,
    };
    if omega > fermi_level {
        poles
            .virtuals()
            .filter(|&m| poles.energy(m) > fermi_level)
            .filter_map(|m| weight(pole_offset(omega, poles.energy(m)), 1.0).map(|w| (m, w)))
            .collect()
    } else {
        poles
            .occupied()
            .filter(|&m| poles.energy(m) < fermi_level)
            .filter_map(|m| weight(pole_offset(omega, poles.energy(m)), -1.0).map(|w| (m, w)))
            .collect()
    }
}

/// Residue contribution `Σ_m sign_m W_pm(|ε_m - ω| + iη)` for every cell.
///
/// Returns one vector per state block, aligned with the evaluation frequencies.
#[instrument(skip_all, name = "residue_task")]
pub fn run<W: ScreenedInteraction>(
    ctx: &SigmaContext<'_, W>,
) -> Result<Vec<Vec<Complex64>>, GwError> {
    ctx.reporter.report(Progress::TaskStart {
        total_steps: ctx.cell_count() as u64,
    });

    let cells: Vec<(usize, usize)> = ctx
        .frequencies
        .iter()
        .enumerate()
        .flat_map(|(s, freqs)| (0..freqs.len()).map(move |j| (s, j)))
        .collect();

    #[cfg(not(feature = "parallel"))]
    let iterator = cells.iter();

    #[cfg(feature = "parallel")]
    let iterator = cells.par_iter();

    let values: Vec<Complex64> = iterator
        .map(|&(s, j)| {
            let value = residue_cell(ctx, s, ctx.frequencies[s][j]);
            ctx.reporter.report(Progress::TaskIncrement);
            value
        })
        .collect::<Result<_, _>>()?;

    ctx.reporter.report(Progress::TaskFinish);

    let mut offset = 0;
    Ok(ctx
        .frequencies
        .iter()
        .map(|freqs| {
            let row = values[offset..offset + freqs.len()].to_vec();
            offset += freqs.len();
            row
        })
        .collect())
}

fn residue_cell<W: ScreenedInteraction>(
    ctx: &SigmaContext<'_, W>,
    block_index: usize,
    omega: f64,
) -> Result<Complex64, GwError> {
    let block = &ctx.blocks[block_index];
    let mut total = Complex64::new(0.0, 0.0);
    for (m, weight) in enclosed_poles(ctx.poles, ctx.fermi_level, omega) {
        let z = Complex64::new(pole_offset(omega, ctx.poles.energy(m)).abs(), ctx.eta);
        let sample = ctx.screening.evaluate(z)?;
        total += sample.contract_column(&block.pairs, m.get()) * weight;
    }
    Ok(total)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::models::ri::RiTensor;
    use crate::core::quadrature::ImaginaryAxisQuadrature;
    use crate::core::screening::rpa::RpaScreening;
    use crate::engine::context::StateBlock;
    use crate::engine::progress::ProgressReporter;

    const B: f64 = 0.3;
    const ETA: f64 = 1e-3;

    fn two_level() -> (OrbitalSet, RiTensor) {
        let orbitals = OrbitalSet::new(vec![-0.5, 0.4], 1).unwrap();
        let ri = RiTensor::from_fn(1, 2, |_, p, q| if p == q { 0.5 } else { B }).unwrap();
        (orbitals, ri)
    }

    // W_pm(z) for the single-transition model at complex z.
    fn closed_form(pair: f64, z: Complex64) -> Complex64 {
        let omega: f64 = 0.9;
        let screened = (omega * omega + 4.0 * B * B * omega).sqrt();
        pair * pair * 4.0 * B * B * omega / (z * z - screened * screened)
    }

    fn evaluate(state: usize, omegas: Vec<f64>) -> Vec<Complex64> {
        let (orbitals, ri) = two_level();
        let screening = RpaScreening::new(&orbitals, &ri, ETA);
        let quadrature = ImaginaryAxisQuadrature::new(8, 0.5).unwrap();
        let blocks = vec![StateBlock::new(&ri, OrbitalIndex(state))];
        let frequencies = vec![omegas];
        let reporter = ProgressReporter::new();
        let ctx = SigmaContext {
            screening: &screening,
            poles: &orbitals,
            fermi_level: orbitals.fermi_level(),
            eta: ETA,
            quadrature: &quadrature,
            blocks: &blocks,
            frequencies: &frequencies,
            reporter: &reporter,
        };
        run(&ctx).unwrap().remove(0)
    }

    #[test]
    fn window_selects_virtual_poles_above_fermi_level() {
        let orbitals = OrbitalSet::new(vec![-1.0, -0.5, 0.4, 0.8], 2).unwrap();
        let mu = orbitals.fermi_level();
        assert!(enclosed_poles(&orbitals, mu, 0.3).is_empty());
        assert_eq!(enclosed_poles(&orbitals, mu, 0.5), vec![(OrbitalIndex(2), 1.0)]);
        assert_eq!(enclosed_poles(&orbitals, mu, 1.0).len(), 2);
    }

    #[test]
    fn window_selects_occupied_poles_below_fermi_level() {
        let orbitals = OrbitalSet::new(vec![-1.0, -0.5, 0.4, 0.8], 2).unwrap();
        let mu = orbitals.fermi_level();
        assert!(enclosed_poles(&orbitals, mu, -0.4).is_empty());
        assert_eq!(
            enclosed_poles(&orbitals, mu, -0.6),
            vec![(OrbitalIndex(1), -1.0)]
        );
        assert_eq!(enclosed_poles(&orbitals, mu, -1.5).len(), 2);
    }

    #[test]
    fn pole_on_the_frequency_carries_half_weight() {
        let orbitals = OrbitalSet::new(vec![-1.0, -0.5, 0.4, 0.8], 2).unwrap();
        let mu = orbitals.fermi_level();
        assert_eq!(
            enclosed_poles(&orbitals, mu, 0.8),
            vec![(OrbitalIndex(2), 1.0), (OrbitalIndex(3), 0.5)]
        );
        assert_eq!(
            enclosed_poles(&orbitals, mu, -1.0),
            vec![(OrbitalIndex(0), -0.5), (OrbitalIndex(1), -1.0)]
        );
        assert_eq!(enclosed_poles(&orbitals, mu, 0.4), vec![(OrbitalIndex(2), 0.5)]);
    }

    #[test]
    fn residue_on_own_level_is_half_the_static_limit() {
        let values = evaluate(1, vec![0.4]);
        let expected = 0.5 * closed_form(0.5, Complex64::new(0.0, ETA));
        assert!((values[0] - expected).norm() < 1e-12);
    }

    #[test]
    fn residue_above_virtual_level_matches_closed_form() {
        let omega = 0.7;
        let values = evaluate(0, vec![omega]);
        let z = Complex64::new(omega - 0.4, ETA);
        let expected = closed_form(B, z);
        assert!((values[0] - expected).norm() < 1e-12);
    }

    #[test]
    fn residue_below_occupied_level_matches_closed_form_with_negative_sign() {
        let omega = -0.8;
        let values = evaluate(1, vec![omega]);
        let z = Complex64::new(-0.5 - omega, ETA);
        let expected = -closed_form(B, z);
        assert!((values[0] - expected).norm() < 1e-12);
    }

    #[test]
    fn residue_vanishes_inside_the_gap() {
        let values = evaluate(0, vec![-0.3, -0.05, 0.0, 0.2, 0.39]);
        assert!(values.iter().all(|v| v.norm() == 0.0));
    }
}
