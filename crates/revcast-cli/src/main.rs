//! `revcast`: forecast a revenue workbook, run the agent crew or serve the
//! upload gateway.

mod config;

use crate::config::{RevcastConfig, API_KEY_VAR};
use clap::{Parser, Subcommand};
use revcast_core::ForecastError;
use revcast_gateway::{AppState, GatewayServer};
use revcast_orchestrator::{Crew, CrewOutput};
use revcast_pipeline::{read_workbook, ForecastPipeline, ForecastReport, HttpForecaster};
use revcast_skills::{ForecastSkill, SkillRegistry};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "revcast", about = "Revcast: revenue forecasting with an agent crew")]
struct Cli {
    /// Path to config file
    #[arg(short, long, default_value = "revcast.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Forecast a workbook by calling the forecaster directly
    Forecast {
        /// Excel workbook (.xlsx or .xls) with date and revenue columns
        #[arg(short, long)]
        file: PathBuf,
        /// Print the report as JSON instead of a table
        #[arg(long)]
        json: bool,
    },
    /// Run the logistics and forecasting crew over a workbook
    Crew {
        /// Excel workbook (.xlsx or .xls) with date and revenue columns
        #[arg(short, long)]
        file: PathBuf,
        /// Print task outputs and the report as JSON
        #[arg(long)]
        json: bool,
    },
    /// Start the upload gateway
    Serve {
        /// Host to bind to (overrides config)
        #[arg(long)]
        host: Option<String>,
        /// Port to listen on (overrides config)
        #[arg(short, long)]
        port: Option<u16>,
    },
    /// Manage skills
    Skill {
        #[command(subcommand)]
        action: SkillAction,
    },
}

#[derive(Subcommand)]
enum SkillAction {
    /// List registered skills
    List,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .json()
        .init();

    if let Err(e) = dotenvy::dotenv() {
        if !e.not_found() {
            warn!(error = %e, "Ignoring unreadable .env file");
        }
    }

    let cli = Cli::parse();
    let config = RevcastConfig::load(&cli.config, std::env::var(API_KEY_VAR).ok()).await?;

    let forecaster = Arc::new(HttpForecaster::new(config.forecaster.clone())?);
    let pipeline = ForecastPipeline::new(&config.forecast);

    match cli.command {
        Commands::Forecast { file, json } => {
            let table = read_workbook(&file).map_err(report_failure)?;
            let report = pipeline
                .run_table(forecaster.as_ref(), &table)
                .await
                .map_err(report_failure)?;
            print_report(&report, json)?;
        }
        Commands::Crew { file, json } => {
            if !config.has_api_key() {
                anyhow::bail!("No model api key: set {API_KEY_VAR} or [model].api_key");
            }
            // Agents only get to see files that validate.
            pipeline.load_observations(&file).map_err(report_failure)?;

            let crew = Crew::new(&config.model, Arc::new(skill_registry(&config, forecaster)));
            let file_path = std::fs::canonicalize(&file).unwrap_or(file);
            let output = crew.kickoff(&crew_inputs(&file_path)).await?;
            print_crew(&pipeline, output, json)?;
        }
        Commands::Serve { host, port } => {
            let mut server = config.server.clone();
            if let Some(host) = host {
                server.host = host;
            }
            if let Some(port) = port {
                server.port = port;
            }

            let crew = if config.has_api_key() {
                let skills = Arc::new(skill_registry(&config, forecaster.clone()));
                Some(Arc::new(Crew::new(&config.model, skills)))
            } else {
                warn!("No model api key configured; crew mode disabled");
                None
            };

            info!(addr = %server.bind_addr(), crew = crew.is_some(), "Starting Revcast gateway");
            let state = AppState {
                pipeline,
                forecaster,
                crew,
            };
            GatewayServer::serve(&server, state).await?;
        }
        Commands::Skill { action } => match action {
            SkillAction::List => {
                let registry = skill_registry(&config, forecaster);
                let skills = registry.list_descriptors();
                println!("Registered skills:");
                for skill in &skills {
                    println!("  {}: {}", skill.name, skill.description);
                }
                println!("\nTotal: {} skill(s)", skills.len());
            }
        },
    }

    Ok(())
}

fn skill_registry(config: &RevcastConfig, forecaster: Arc<HttpForecaster>) -> SkillRegistry {
    let mut registry = SkillRegistry::new();
    registry.register(Arc::new(ForecastSkill::new(
        config.forecast.clone(),
        forecaster,
    )));
    registry
}

fn crew_inputs(file_path: &Path) -> HashMap<String, String> {
    HashMap::from([("file_path".to_string(), file_path.display().to_string())])
}

fn report_failure(err: ForecastError) -> anyhow::Error {
    anyhow::anyhow!(err.user_message())
}

fn print_report(report: &ForecastReport, json: bool) -> anyhow::Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(report)?);
    } else {
        println!("{}", report.render_text());
    }
    Ok(())
}

fn print_crew(pipeline: &ForecastPipeline, output: CrewOutput, json: bool) -> anyhow::Result<()> {
    let tasks = output.tasks_output.clone();
    let report = output
        .into_forecast()
        .and_then(|raw| pipeline.process(&raw))
        .map_err(report_failure)?;

    if json {
        let body = serde_json::json!({ "tasks": tasks, "report": report });
        println!("{}", serde_json::to_string_pretty(&body)?);
        return Ok(());
    }

    for task in tasks.iter().filter(|t| t.name != "forecast") {
        println!("== {} ({}) ==\n{}\n", task.name, task.agent.title(), task.raw.trim());
    }
    print_report(&report, false)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_forecast_command() {
        let cli = Cli::try_parse_from(["revcast", "forecast", "--file", "q1.xlsx", "--json"]).unwrap();
        assert_eq!(cli.config, PathBuf::from("revcast.toml"));
        match cli.command {
            Commands::Forecast { file, json } => {
                assert_eq!(file, PathBuf::from("q1.xlsx"));
                assert!(json);
            }
            _ => panic!("expected forecast"),
        }
    }

    #[test]
    fn test_serve_overrides() {
        let cli = Cli::try_parse_from(["revcast", "-c", "alt.toml", "serve", "--port", "9000"]).unwrap();
        assert_eq!(cli.config, PathBuf::from("alt.toml"));
        assert!(matches!(
            cli.command,
            Commands::Serve {
                host: None,
                port: Some(9000)
            }
        ));
    }

    #[test]
    fn test_crew_requires_file() {
        assert!(Cli::try_parse_from(["revcast", "crew"]).is_err());
    }

    #[test]
    fn test_registry_lists_forecast_skill() {
        let config = RevcastConfig::default();
        let forecaster = Arc::new(HttpForecaster::new(config.forecaster.clone()).unwrap());
        let names: Vec<_> = skill_registry(&config, forecaster)
            .list_descriptors()
            .into_iter()
            .map(|d| d.name.clone())
            .collect();
        assert_eq!(names, vec!["revenue_forecast"]);
    }

    #[test]
    fn test_crew_inputs() {
        let inputs = crew_inputs(Path::new("/data/history.xlsx"));
        assert_eq!(inputs["file_path"], "/data/history.xlsx");
    }
}
