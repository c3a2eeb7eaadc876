use clap::{Parser, ValueEnum};
use eyre::{Result, WrapErr};
use pid_sim_lib::{init_tracing, ScenarioConfig, SimulationLoop};
use tracing::info;

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Preset {
    /// Reference 3.0, limits +/-2, no anti-windup
    ReferenceStep,
    /// Reference 3.0, limits +/-3, Kaw=5, -1.0 pulse on [5 s, 10 s)
    DisturbanceRejection,
}

#[derive(Parser)]
#[command(name = "pid_simulator")]
#[command(about = "Simulate a saturated PID loop with back-calculation anti-windup")]
struct Cli {
    /// Scenario TOML file (overrides --preset)
    #[arg(short, long)]
    config: Option<String>,

    /// Built-in scenario to run when no config file is given
    #[arg(short, long, value_enum, default_value = "reference-step")]
    preset: Preset,

    /// CSV output path (overrides the scenario's log path)
    #[arg(short, long)]
    output: Option<String>,

    /// Write the run summary as JSON to this path
    #[arg(short, long)]
    summary: Option<String>,
}

fn main() -> Result<()> {
    init_tracing()?;
    let cli = Cli::parse();

    let config = load_scenario(&cli)?;

    let log_path = cli.output.clone().unwrap_or_else(|| config.log.path.clone());

    let mut sim = SimulationLoop::new(&config)?;
    let summary = sim.run_to_file(&log_path)?;

    if let Some(path) = &cli.summary {
        summary
            .save_to_file(path)
            .wrap_err("Failed to save run summary")?;
        info!("Summary written to {}", path);
    }

    info!("Simulation finished. Results saved.");
    Ok(())
}

fn load_scenario(cli: &Cli) -> Result<ScenarioConfig> {
    match &cli.config {
        Some(path) => {
            info!("Loading scenario file: {}", path);
            ScenarioConfig::load_from_file(path)
        }
        None => {
            info!("Using built-in preset: {:?}", cli.preset);
            Ok(match cli.preset {
                Preset::ReferenceStep => ScenarioConfig::reference_step(),
                Preset::DisturbanceRejection => ScenarioConfig::disturbance_rejection(),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_defaults_to_reference_step() {
        let cli = Cli::parse_from(["pid_simulator"]);
        assert!(cli.config.is_none());
        assert!(matches!(cli.preset, Preset::ReferenceStep));

        let config = load_scenario(&cli).unwrap();
        assert_eq!(config, ScenarioConfig::reference_step());
    }

    #[test]
    fn test_cli_preset_and_overrides() {
        let cli = Cli::parse_from([
            "pid_simulator",
            "--preset",
            "disturbance-rejection",
            "--output",
            "run.csv",
            "--summary",
            "run.json",
        ]);
        assert_eq!(cli.output.as_deref(), Some("run.csv"));
        assert_eq!(cli.summary.as_deref(), Some("run.json"));

        let config = load_scenario(&cli).unwrap();
        assert_eq!(config.name, "disturbance_rejection");
    }

    #[test]
    fn test_missing_config_file_is_an_error() {
        let cli = Cli::parse_from(["pid_simulator", "--config", "does/not/exist.toml"]);
        assert!(load_scenario(&cli).is_err());
    }

    #[test]
    fn test_shipped_scenarios_match_presets() {
        let dir = concat!(env!("CARGO_MANIFEST_DIR"), "/../config");

        let basic = ScenarioConfig::load_from_file(format!("{}/reference_step.toml", dir)).unwrap();
        assert_eq!(basic, ScenarioConfig::reference_step());

        let dist =
            ScenarioConfig::load_from_file(format!("{}/disturbance_rejection.toml", dir)).unwrap();
        assert_eq!(dist, ScenarioConfig::disturbance_rejection());
    }
}
