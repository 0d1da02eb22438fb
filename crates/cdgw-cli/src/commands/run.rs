use crate::cli::RunArgs;
use crate::config::builder::build_app_config;
use crate::error::Result;
use crate::utils::progress::CliProgressHandler;
use crate::utils::table::format_summary;
use cdgw::{
    core::io::meanfield,
    engine::progress::ProgressReporter,
    workflows::{self, report},
};
use tracing::{info, warn};

pub fn run(args: RunArgs) -> Result<()> {
    info!("Building configuration from file, --set values and CLI arguments...");
    let app_config = build_app_config(&args)?;
    let config = &app_config.core_config;

    info!("Loading mean-field input from {:?}", &app_config.input_path);
    let meanfield = meanfield::load(&app_config.input_path)?;

    let progress_handler = CliProgressHandler::new();
    let reporter = ProgressReporter::with_callback(progress_handler.get_callback());

    if config.is_one_shot() {
        println!("Starting one-shot G0W0 calculation...");
    } else {
        println!(
            "Starting evGW calculation (up to {} iterations)...",
            config.evgw.max_iterations
        );
    }
    info!("Invoking the core GW workflow...");

    let result = workflows::evgw::run(&meanfield, config, &reporter)?;

    info!(
        records = result.records.len(),
        iterations = result.status.iterations(),
        "Workflow finished."
    );
    if !result.status.is_converged() {
        warn!("evGW did not reach the requested tolerance; reporting the last iterate.");
    }

    println!();
    print!("{}", format_summary(&result, meanfield.orbitals().nocc()));

    if let Some(path) = &app_config.output_path {
        report::write_quasiparticle_file(path, &result.records)?;
        println!("✓ Quasiparticle table written to: {}", path.display());
    }
    if let Some(path) = &app_config.history_path {
        if result.history.is_empty() {
            warn!("No iteration history to write.");
        }
        report::write_history_file(path, &result.history)?;
        println!("✓ Iteration history written to: {}", path.display());
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::GwArgs;
    use crate::error::CliError;
    use std::fs;
    use std::path::Path;
    use tempfile::tempdir;

    const TWO_LEVEL_INPUT: &str = r#"
        energy-unit = "hartree"
        nocc = 1
        orbital-energies = [-0.5, 0.4]
        sigma-x-minus-vxc = [-0.1, 0.05]

        [ri]
        naux = 1
        values = [0.6, 0.1, 0.1, 0.5]
    "#;

    fn args_for(input: &Path) -> GwArgs {
        GwArgs {
            input: input.to_path_buf(),
            gl_npoint: Some(48),
            ..Default::default()
        }
    }

    #[test]
    fn one_shot_run_writes_requested_reports() {
        let dir = tempdir().unwrap();
        let input = dir.path().join("meanfield.toml");
        fs::write(&input, TWO_LEVEL_INPUT).unwrap();
        let output = dir.path().join("qp.csv");
        let history = dir.path().join("history.csv");

        run(RunArgs {
            gw: args_for(&input),
            output: Some(output.clone()),
            history: Some(history.clone()),
        })
        .expect("run succeeds");

        let table = fs::read_to_string(&output).unwrap();
        let mut lines = table.lines();
        assert!(lines.next().unwrap().starts_with("state,occupation"));
        assert_eq!(lines.count(), 2);

        let history = fs::read_to_string(&history).unwrap();
        assert_eq!(history.lines().count(), 1 + 2);
    }

    #[test]
    fn evgw_run_records_every_iteration() {
        let dir = tempdir().unwrap();
        let input = dir.path().join("meanfield.toml");
        fs::write(&input, TWO_LEVEL_INPUT).unwrap();
        let history = dir.path().join("history.csv");

        let mut gw = args_for(&input);
        gw.evgw_iter = Some(3);
        gw.evgw_tolerance = Some(1e-12);
        run(RunArgs {
            gw,
            output: None,
            history: Some(history.clone()),
        })
        .expect("run succeeds even when not converged");

        let history = fs::read_to_string(&history).unwrap();
        assert_eq!(history.lines().count(), 1 + 3 * 2);
    }

    #[test]
    fn missing_input_is_reported() {
        let dir = tempdir().unwrap();
        let result = run(RunArgs {
            gw: args_for(&dir.path().join("absent.toml")),
            output: None,
            history: None,
        });
        assert!(matches!(result, Err(CliError::Input(_))));
    }

    #[test]
    fn spectral_screening_without_data_is_a_core_error() {
        let dir = tempdir().unwrap();
        let input = dir.path().join("meanfield.toml");
        fs::write(&input, TWO_LEVEL_INPUT).unwrap();

        let mut gw = args_for(&input);
        gw.spectral_w = true;
        let result = run(RunArgs {
            gw,
            output: None,
            history: None,
        });
        assert!(matches!(result, Err(CliError::Core(_))));
    }
}
