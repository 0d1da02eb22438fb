use crate::cli::EstimateArgs;
use crate::config::builder::build_config;
use crate::error::Result;
use cdgw::{core::io::meanfield, workflows::estimate::MemoryPlan};
use tracing::info;

pub fn run(args: EstimateArgs) -> Result<()> {
    let config = build_config(&args.gw)?;

    info!("Loading mean-field input from {:?}", &args.gw.input);
    let meanfield = meanfield::load(&args.gw.input)?;

    let plan = cdgw::workflows::estimate::run(&meanfield, &config)?;
    print!("{}", format_plan(&plan));
    Ok(())
}

fn format_plan(plan: &MemoryPlan) -> String {
    let strategy = match plan.strategy {
        Some(strategy) => strategy.to_string(),
        None => "none fits the memory ceiling".to_string(),
    };
    format!(
        "Quasiparticle states:   {}\n\
         High-memory estimate:   {:.1} MB\n\
         Low-memory estimate:    {:.1} MB\n\
         Memory ceiling:         {:.1} MB\n\
         Selected strategy:      {}\n",
        plan.states,
        plan.estimate.high_memory_mb(),
        plan.estimate.low_memory_mb(),
        plan.budget_mb,
        strategy
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::GwArgs;
    use cdgw::engine::memory::{ContractionStrategy, MemoryEstimate};
    use std::fs;
    use tempfile::tempdir;

    fn plan(strategy: Option<ContractionStrategy>) -> MemoryPlan {
        MemoryPlan {
            states: 2,
            estimate: MemoryEstimate {
                high_memory_bytes: 3 * 1024 * 1024,
                low_memory_bytes: 1024 * 1024,
            },
            budget_mb: 2.0,
            strategy,
        }
    }

    #[test]
    fn plan_lists_both_estimates_and_the_choice() {
        let text = format_plan(&plan(Some(ContractionStrategy::LowMemory)));
        assert!(text.contains("High-memory estimate:   3.0 MB"));
        assert!(text.contains("Low-memory estimate:    1.0 MB"));
        assert!(text.contains("Selected strategy:      low-memory"));
    }

    #[test]
    fn plan_without_strategy_says_so() {
        let text = format_plan(&plan(None));
        assert!(text.contains("none fits"));
    }

    #[test]
    fn estimate_command_runs_without_evaluating() {
        let dir = tempdir().unwrap();
        let input = dir.path().join("meanfield.toml");
        fs::write(
            &input,
            r#"
            nocc = 1
            orbital-energies = [-0.5, 0.4]
            sigma-x-minus-vxc = [-0.1, 0.05]

            [ri]
            naux = 1
            values = [0.6, 0.1, 0.1, 0.5]
            "#,
        )
        .unwrap();

        let args = EstimateArgs {
            gw: GwArgs {
                input,
                max_memory_mb: Some(1e-9),
                ..Default::default()
            },
        };
        assert!(run(args).is_ok());
    }
}
