use super::defaults::DefaultsConfig;
use super::file::{FileConfig, GridPolicy, StartPolicy};
use super::models::AppConfig;
use crate::cli::{GwArgs, RunArgs};
use crate::error::{CliError, Result};
use cdgw::core::units::EnergyUnit;
use cdgw::engine::config::{GridResolutionCheck, GwConfig, GwConfigBuilder};
use std::str::FromStr;

pub fn build_app_config(args: &RunArgs) -> Result<AppConfig> {
    Ok(AppConfig {
        input_path: args.gw.input.clone(),
        output_path: args.output.clone(),
        history_path: args.history.clone(),
        core_config: build_config(&args.gw)?,
    })
}

/// Merges command-line flags, `--set` values, the config file and the defaults, in that
/// order of precedence, into a validated core configuration.
pub fn build_config(args: &GwArgs) -> Result<GwConfig> {
    let defaults = DefaultsConfig::default();

    let file_config = if let Some(config_path) = &args.config {
        FileConfig::from_file(config_path)?
    } else {
        FileConfig::default()
    };
    let mut file_config = apply_set_values(file_config, &args.set_values)?;

    let unit = match args
        .energy_unit
        .as_deref()
        .or(file_config.energy_unit.as_deref())
    {
        Some(name) => EnergyUnit::from_str(name).map_err(|e| CliError::Config(e.to_string()))?,
        None => defaults.energy_unit,
    };
    let energy = |value: Option<f64>, default_hartree: f64| -> f64 {
        value.map_or(default_hartree, |v| unit.to_hartree(v))
    };

    let targets = file_config.targets.take().unwrap_or_default();
    let grid = file_config.sigma_grid.take().unwrap_or_default();
    let quadrature = file_config.quadrature.take().unwrap_or_default();
    let screening = file_config.screening.take().unwrap_or_default();
    let memory = file_config.memory.take().unwrap_or_default();
    let evgw = file_config.evgw.take().unwrap_or_default();
    let grid_check = file_config.grid_check.take().unwrap_or_default();

    let analytic_w = if args.spectral_w {
        false
    } else {
        screening.analytic_w.unwrap_or(defaults.analytic_w)
    };
    let update_screening = if args.fixed_screening {
        false
    } else {
        screening
            .update_screening
            .unwrap_or(defaults.update_screening)
    };
    let low_mem = args.low_mem || memory.low_mem.unwrap_or(defaults.low_mem);

    let fraction = grid_check.fraction.unwrap_or(defaults.grid_fraction);
    let grid_check = match grid_check.policy.unwrap_or(defaults.grid_policy) {
        GridPolicy::Off => GridResolutionCheck::Off,
        GridPolicy::Warn => GridResolutionCheck::Warn { fraction },
        GridPolicy::Fatal => GridResolutionCheck::Fatal { fraction },
    };

    GwConfigBuilder::new()
        .no_qp(args.no_qp.or(targets.no_qp).unwrap_or(defaults.no_qp))
        .nv_qp(args.nv_qp.or(targets.nv_qp).unwrap_or(defaults.nv_qp))
        .nomega_sigma(
            args.nomega_sigma
                .or(grid.nomega)
                .unwrap_or(defaults.nomega_sigma),
        )
        .step_sigma(energy(args.step_sigma.or(grid.step), defaults.step_sigma))
        .gl_npoint(
            args.gl_npoint
                .or(quadrature.gl_npoint)
                .unwrap_or(defaults.gl_npoint),
        )
        .quadrature_scale(energy(quadrature.scale, defaults.quadrature_scale))
        .analytic_w(analytic_w)
        .eta(energy(args.eta.or(screening.eta), defaults.eta))
        .update_screening(update_screening)
        .low_mem(low_mem)
        .max_memory_mb(
            args.max_memory_mb
                .or(memory.max_memory_mb)
                .unwrap_or(defaults.max_memory_mb),
        )
        .evgw_iter(
            args.evgw_iter
                .or(evgw.iterations)
                .unwrap_or(defaults.evgw_iter),
        )
        .evgw_tolerance(energy(
            args.evgw_tolerance.or(evgw.tolerance),
            defaults.evgw_tolerance,
        ))
        .evgw_start(evgw.start.unwrap_or(defaults.evgw_start).into())
        .grid_check(grid_check)
        .build()
        .map_err(|e| CliError::Config(e.to_string()))
}

fn parse_value<T: FromStr>(key: &str, value: &str, kind: &str) -> Result<T> {
    value
        .parse()
        .map_err(|_| CliError::Config(format!("Invalid {} value for {}: {}", kind, key, value)))
}

fn apply_set_values(mut config: FileConfig, set_values: &[String]) -> Result<FileConfig> {
    for kv_pair in set_values {
        let Some((key, value)) = kv_pair.split_once('=') else {
            return Err(CliError::Config(format!(
                "Invalid --set format: '{}'. Expected KEY=VALUE.",
                kv_pair
            )));
        };

        match key {
            "energy-unit" => config.energy_unit = Some(value.to_string()),
            "targets.no-qp" => {
                config.targets.get_or_insert_with(Default::default).no_qp =
                    Some(parse_value(key, value, "integer")?);
            }
            "targets.nv-qp" => {
                config.targets.get_or_insert_with(Default::default).nv_qp =
                    Some(parse_value(key, value, "integer")?);
            }
            "sigma-grid.nomega" => {
                config.sigma_grid.get_or_insert_with(Default::default).nomega =
                    Some(parse_value(key, value, "integer")?);
            }
            "sigma-grid.step" => {
                config.sigma_grid.get_or_insert_with(Default::default).step =
                    Some(parse_value(key, value, "float")?);
            }
            "quadrature.gl-npoint" => {
                config
                    .quadrature
                    .get_or_insert_with(Default::default)
                    .gl_npoint = Some(parse_value(key, value, "integer")?);
            }
            "quadrature.scale" => {
                config.quadrature.get_or_insert_with(Default::default).scale =
                    Some(parse_value(key, value, "float")?);
            }
            "screening.analytic-w" => {
                config
                    .screening
                    .get_or_insert_with(Default::default)
                    .analytic_w = Some(parse_value(key, value, "boolean")?);
            }
            "screening.eta" => {
                config.screening.get_or_insert_with(Default::default).eta =
                    Some(parse_value(key, value, "float")?);
            }
            "screening.update-screening" => {
                config
                    .screening
                    .get_or_insert_with(Default::default)
                    .update_screening = Some(parse_value(key, value, "boolean")?);
            }
            "memory.max-memory-mb" => {
                config
                    .memory
                    .get_or_insert_with(Default::default)
                    .max_memory_mb = Some(parse_value(key, value, "float")?);
            }
            "memory.low-mem" => {
                config.memory.get_or_insert_with(Default::default).low_mem =
                    Some(parse_value(key, value, "boolean")?);
            }
            "evgw.iterations" => {
                config.evgw.get_or_insert_with(Default::default).iterations =
                    Some(parse_value(key, value, "integer")?);
            }
            "evgw.tolerance" => {
                config.evgw.get_or_insert_with(Default::default).tolerance =
                    Some(parse_value(key, value, "float")?);
            }
            "evgw.start" => {
                config.evgw.get_or_insert_with(Default::default).start =
                    Some(value.parse::<StartPolicy>()?);
            }
            "grid-check.policy" => {
                config.grid_check.get_or_insert_with(Default::default).policy =
                    Some(value.parse::<GridPolicy>()?);
            }
            "grid-check.fraction" => {
                config
                    .grid_check
                    .get_or_insert_with(Default::default)
                    .fraction = Some(parse_value(key, value, "float")?);
            }
            _ => {
                return Err(CliError::Config(format!(
                    "Unsupported configuration key for --set: '{}'",
                    key
                )));
            }
        }
    }
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use cdgw::core::units::HARTREE_TO_EV;
    use cdgw::engine::config::EvgwStart;
    use std::fs;
    use std::path::PathBuf;
    use tempfile::tempdir;

    fn base_args() -> GwArgs {
        GwArgs {
            input: PathBuf::from("meanfield.toml"),
            ..Default::default()
        }
    }

    #[test]
    fn defaults_fill_every_parameter() {
        let cfg = build_config(&base_args()).expect("build ok");
        let defaults = DefaultsConfig::default();

        assert_eq!(cfg.targets.no_qp, defaults.no_qp);
        assert_eq!(cfg.targets.nv_qp, defaults.nv_qp);
        assert_eq!(cfg.sigma_grid.count(), defaults.nomega_sigma);
        assert_eq!(cfg.sigma_grid.step(), defaults.step_sigma);
        assert_eq!(cfg.quadrature.order, defaults.gl_npoint);
        assert_eq!(cfg.screening.eta, defaults.eta);
        assert!(cfg.screening.analytic);
        assert!(cfg.screening.update_with_qp_energies);
        assert!(!cfg.memory.force_low_memory);
        assert!(cfg.is_one_shot());
        assert_eq!(cfg.evgw.start, EvgwStart::MeanField);
        assert_eq!(
            cfg.grid_check,
            GridResolutionCheck::Warn {
                fraction: defaults.grid_fraction
            }
        );
    }

    #[test]
    fn file_values_are_converted_from_their_unit() {
        let dir = tempdir().unwrap();
        let cfg_path = dir.path().join("config.toml");
        fs::write(
            &cfg_path,
            r#"
            energy-unit = "ev"

            [targets]
            no-qp = 2
            nv-qp = 0

            [sigma-grid]
            nomega = 41
            step = 0.2721138624598

            [screening]
            eta = 0.02721138624598

            [evgw]
            iterations = 8
            start = "linearized-one-shot"

            [grid-check]
            policy = "off"
            "#,
        )
        .unwrap();

        let mut args = base_args();
        args.config = Some(cfg_path);
        let cfg = build_config(&args).expect("build ok");

        assert_eq!(cfg.targets.no_qp, 2);
        assert_eq!(cfg.targets.nv_qp, 0);
        assert_eq!(cfg.sigma_grid.count(), 41);
        assert!((cfg.sigma_grid.step() - 0.2721138624598 / HARTREE_TO_EV).abs() < 1e-15);
        assert!((cfg.screening.eta - 1e-3).abs() < 1e-12);
        assert_eq!(cfg.evgw.max_iterations, 8);
        assert_eq!(cfg.evgw.start, EvgwStart::LinearizedOneShot);
        assert_eq!(cfg.grid_check, GridResolutionCheck::Off);
    }

    #[test]
    fn cli_overrides_set_values_which_override_the_file() {
        let dir = tempdir().unwrap();
        let cfg_path = dir.path().join("config.toml");
        fs::write(
            &cfg_path,
            r#"
            [sigma-grid]
            nomega = 41

            [quadrature]
            gl-npoint = 32

            [memory]
            max-memory-mb = 100.0
            "#,
        )
        .unwrap();

        let mut args = base_args();
        args.config = Some(cfg_path);
        args.set_values = vec![
            "sigma-grid.nomega=61".to_string(),
            "quadrature.gl-npoint=48".to_string(),
        ];
        args.gl_npoint = Some(64);
        args.low_mem = true;
        args.spectral_w = true;
        args.fixed_screening = true;

        let cfg = build_config(&args).expect("build ok");
        assert_eq!(cfg.sigma_grid.count(), 61);
        assert_eq!(cfg.quadrature.order, 64);
        assert_eq!(cfg.memory.max_memory_mb, 100.0);
        assert!(cfg.memory.force_low_memory);
        assert!(!cfg.screening.analytic);
        assert!(!cfg.screening.update_with_qp_energies);
    }

    #[test]
    fn set_values_cover_nested_sections() {
        let mut args = base_args();
        args.set_values = vec![
            "evgw.iterations=12".to_string(),
            "evgw.tolerance=1e-6".to_string(),
            "grid-check.policy=fatal".to_string(),
            "grid-check.fraction=0.25".to_string(),
            "targets.nv-qp=3".to_string(),
        ];
        let cfg = build_config(&args).expect("build ok");
        assert_eq!(cfg.evgw.max_iterations, 12);
        assert!((cfg.evgw.tolerance - 1e-6).abs() < 1e-18);
        assert_eq!(cfg.grid_check, GridResolutionCheck::Fatal { fraction: 0.25 });
        assert_eq!(cfg.targets.nv_qp, 3);
    }

    #[test]
    fn malformed_set_values_are_rejected() {
        for bad in ["evgw.iterations", "evgw.iterations=many", "nonsense.key=1"] {
            let mut args = base_args();
            args.set_values = vec![bad.to_string()];
            assert!(matches!(build_config(&args), Err(CliError::Config(_))), "{}", bad);
        }
    }

    #[test]
    fn core_validation_errors_surface_as_config_errors() {
        let mut args = base_args();
        args.nomega_sigma = Some(40);
        assert!(matches!(build_config(&args), Err(CliError::Config(_))));

        let mut args = base_args();
        args.energy_unit = Some("furlongs".to_string());
        assert!(matches!(build_config(&args), Err(CliError::Config(_))));
    }

    #[test]
    fn run_args_carry_output_paths() {
        let args = RunArgs {
            gw: base_args(),
            output: Some(PathBuf::from("qp.csv")),
            history: None,
        };
        let app = build_app_config(&args).expect("build ok");
        assert_eq!(app.input_path, PathBuf::from("meanfield.toml"));
        assert_eq!(app.output_path, Some(PathBuf::from("qp.csv")));
        assert!(app.history_path.is_none());
    }
}
