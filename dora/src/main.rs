use clap::{Parser, Subcommand};
use dora_client::{
    AnalyticsMetric, DoraError, DoraMetrics, FilterCriteria, PeopleChart, ServiceMetric,
};
use metrics_exporter_statsd::StatsdBuilder;
use registry::ServiceCategory;
use serde::Serialize;
use serde_json::Value;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

mod config;

const DEFAULT_LOG_FILTER: &str = "dora=info,dora_client=info,registry=info";
const METRICS_PREFIX: &str = "dora";

#[derive(Parser)]
#[command(name = "dora", about = "Read DORA metrics from the dashboard services")]
struct Cli {
    /// Path to the YAML config file
    #[arg(long, short)]
    config: PathBuf,

    #[command(subcommand)]
    command: CliCommand,
}

#[derive(Subcommand)]
enum CliCommand {
    /// List the services registered for a category
    Services { category: ServiceCategory },
    /// Request a metric from every service of its category
    Aggregate {
        metric: ServiceMetric,
        /// Dashboard filters as a JSON object
        #[arg(long, value_parser = parse_criteria)]
        criteria: Option<FilterCriteria>,
    },
    /// Deployment status charts from every deployment service
    DeploymentAggregates {
        /// Send the filters as the overview page does
        #[arg(long)]
        overview: bool,
        #[arg(long, value_parser = parse_criteria)]
        criteria: Option<FilterCriteria>,
    },
    /// Change lead time bars
    LeadTimeChart {
        #[arg(long, value_parser = parse_criteria)]
        criteria: Option<FilterCriteria>,
    },
    /// Read a single analytics metric
    Fetch {
        metric: AnalyticsMetric,
        #[arg(long, value_parser = parse_criteria)]
        criteria: Option<FilterCriteria>,
    },
    /// Chart scoped to a list of developers or reviewers
    PeopleChart {
        chart: PeopleChart,
        /// Developers or reviewers as a JSON array
        #[arg(long, value_parser = parse_people)]
        people: Value,
        #[arg(long, value_parser = parse_criteria)]
        criteria: Option<FilterCriteria>,
    },
}

#[derive(thiserror::Error, Debug)]
enum CliError {
    #[error(transparent)]
    Config(#[from] config::ConfigError),
    #[error(transparent)]
    Dora(#[from] DoraError),
    #[error("could not set up metrics: {0}")]
    Metrics(String),
    #[error("could not serialize output: {0}")]
    Output(#[from] serde_json::Error),
}

fn parse_criteria(s: &str) -> Result<FilterCriteria, serde_json::Error> {
    serde_json::from_str(s)
}

fn parse_people(s: &str) -> Result<Value, String> {
    match serde_json::from_str(s) {
        Ok(people @ Value::Array(_)) => Ok(people),
        Ok(_) => Err("expected a JSON array".to_string()),
        Err(e) => Err(e.to_string()),
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match config::Config::from_file(&cli.config) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{e}");
            return ExitCode::FAILURE;
        }
    };

    let _sentry = config.common.logging.as_ref().map(|logging| {
        sentry::init((
            logging.sentry_dsn.as_str(),
            sentry::ClientOptions {
                release: sentry::release_name!(),
                ..Default::default()
            },
        ))
    });
    init_logging();

    match run(cli.command, config).await {
        Ok(output) => {
            println!("{output}");
            ExitCode::SUCCESS
        }
        Err(e) => {
            tracing::error!(error = %e, "Command failed");
            ExitCode::FAILURE
        }
    }
}

fn init_logging() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr).with_target(true))
        .with(sentry::integrations::tracing::layer())
        .init();
}

fn init_metrics(metrics: &config::MetricsConfig) -> Result<(), CliError> {
    let recorder = StatsdBuilder::from(metrics.statsd_host.as_str(), metrics.statsd_port)
        .build(Some(METRICS_PREFIX))
        .map_err(|e| CliError::Metrics(e.to_string()))?;
    metrics::set_global_recorder(recorder).map_err(|e| CliError::Metrics(e.to_string()))?;

    shared::metrics_defs::describe_all(dora_client::metrics_defs::ALL_METRICS);
    shared::metrics_defs::describe_all(registry::metrics_defs::ALL_METRICS);

    Ok(())
}

async fn run(command: CliCommand, config: config::Config) -> Result<String, CliError> {
    if let Some(metrics) = &config.common.metrics {
        init_metrics(metrics)?;
    }

    let client = DoraMetrics::from_config(&config.client)?;
    tracing::debug!(timezone = client.timezone(), "Client ready");

    match command {
        CliCommand::Services { category } => render(&client.services(category).await?),
        CliCommand::Aggregate { metric, criteria } => {
            let criteria = criteria.unwrap_or_default();
            render(&client.service_metric(metric, &criteria).await?)
        }
        CliCommand::DeploymentAggregates { overview, criteria } => {
            let criteria = criteria.unwrap_or_default();
            render(&client.deployment_aggregates(&criteria, overview).await?)
        }
        CliCommand::LeadTimeChart { criteria } => {
            let criteria = criteria.unwrap_or_default();
            render(&client.change_lead_time_chart(&criteria).await?)
        }
        CliCommand::Fetch { metric, criteria } => {
            let criteria = criteria.unwrap_or_default();
            render(&client.fetch(metric, &criteria).await?)
        }
        CliCommand::PeopleChart {
            chart,
            people,
            criteria,
        } => {
            let criteria = criteria.unwrap_or_default();
            let people = match people {
                Value::Array(people) => people,
                other => vec![other],
            };
            render(&client.people_chart(chart, &criteria, &people).await?)
        }
    }
}

fn render<T: Serialize>(output: &T) -> Result<String, CliError> {
    Ok(serde_json::to_string_pretty(output)?)
}
