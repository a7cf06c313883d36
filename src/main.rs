use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use smartviz::api::{DashboardApi, HttpApiClient};
use smartviz::chart::{export::write_png, format_value, ChartSpec};
use smartviz::config::Config;
use smartviz::report::Reporter;
use smartviz::types::DatasetId;
use smartviz::utils::{init_logger, LogTarget};
use smartviz::{Dashboard, Workflow};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

/// Explore server-suggested analyses of your datasets as charts
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to a config file (defaults to ./smartviz.toml when present)
    #[arg(long, value_name = "PATH", global = true)]
    config: Option<PathBuf>,
    /// Backend base URL (overrides config and environment)
    #[arg(long = "api-url", value_name = "URL", global = true)]
    api_url: Option<String>,
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Interactive dashboard (default)
    Tui,
    /// List datasets known to the backend
    Datasets,
    /// Show the columns and suggested analyses of a dataset
    Suggestions { dataset: String },
    /// Run one suggested analysis and print the chart data
    Analyze {
        dataset: String,
        suggestion: String,
        /// Also write the chart as PNG
        #[arg(long, value_name = "FILE")]
        export: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = Config::load(cli.config.as_deref())?.with_api_url(cli.api_url);
    let command = cli.command.unwrap_or(Command::Tui);

    // The TUI owns the terminal, so its logs go to a file
    let target = match command {
        Command::Tui => LogTarget::File,
        _ => LogTarget::Stderr,
    };
    let _guard = init_logger(&config.logging, target)?;

    let client = HttpApiClient::new(&config.api.base_url)?;
    info!(api = %client.base_url(), "Configuration loaded");
    let api: Arc<dyn DashboardApi> = Arc::new(client);

    match command {
        Command::Tui => smartviz::tui::run(config, api).await,
        Command::Datasets => list_datasets(api).await,
        Command::Suggestions { dataset } => show_suggestions(api, dataset).await,
        Command::Analyze {
            dataset,
            suggestion,
            export,
        } => analyze(api, dataset, suggestion, export).await,
    }
}

fn dashboard(api: Arc<dyn DashboardApi>) -> Dashboard {
    Dashboard::new(api, Workflow::new(Reporter::default()))
}

/// Turn swallowed backend failures into a process error
fn check_failures(dash: &Dashboard) -> anyhow::Result<()> {
    let messages: Vec<&str> = dash
        .workflow()
        .reporter()
        .notices()
        .map(|n| n.message.as_str())
        .collect();
    if messages.is_empty() {
        return Ok(());
    }
    bail!("{}", messages.join("; "))
}

async fn list_datasets(api: Arc<dyn DashboardApi>) -> anyhow::Result<()> {
    let mut dash = dashboard(api);
    let datasets = dash.load_datasets().await.to_vec();
    check_failures(&dash)?;

    if datasets.is_empty() {
        println!("No datasets available");
        return Ok(());
    }
    println!("{:<32} LABEL", "ID");
    for dataset in &datasets {
        println!("{:<32} {}", dataset.as_str(), dataset.display_label());
    }
    Ok(())
}

async fn show_suggestions(api: Arc<dyn DashboardApi>, dataset: String) -> anyhow::Result<()> {
    let mut dash = dashboard(api);
    let catalog = dash
        .select_dataset(DatasetId::new(dataset))
        .await
        .cloned()
        .unwrap_or_default();
    check_failures(&dash)?;

    println!("Columns: {}", catalog.columns.join(", "));
    if catalog.suggestions.is_empty() {
        println!("No suggestions for this dataset");
        return Ok(());
    }
    println!("{:<24} {:<14} TEXT", "ID", "TYPE");
    for suggestion in &catalog.suggestions {
        println!("{:<24} {:<14} {}", suggestion.id, suggestion.kind, suggestion.text);
    }
    Ok(())
}

async fn analyze(
    api: Arc<dyn DashboardApi>,
    dataset: String,
    suggestion_id: String,
    export: Option<PathBuf>,
) -> anyhow::Result<()> {
    let mut dash = dashboard(api);
    dash.select_dataset(DatasetId::new(dataset)).await;
    check_failures(&dash)?;

    let suggestion = dash.suggestion(&suggestion_id)?;
    let chart = dash.select_suggestion(&suggestion).await?.cloned();
    check_failures(&dash)?;
    let Some(chart) = chart else {
        bail!("Analysis for '{}' produced no chart", suggestion_id);
    };

    print_chart(&chart);

    if let Some(path) = export {
        write_png(&chart, &path)
            .with_context(|| format!("Failed to export chart to {}", path.display()))?;
        println!("Saved {}", path.display());
    }
    Ok(())
}

fn print_chart(chart: &ChartSpec) {
    println!("{} ({} chart)", chart.title, chart.kind);
    let width = chart
        .labels
        .iter()
        .map(|l| l.chars().count())
        .max()
        .unwrap_or(0)
        .max(5);
    for (label, value, color) in chart.categories() {
        println!("  {:<width$}  {:>12}  {}", label, format_value(value), color, width = width);
    }
}
