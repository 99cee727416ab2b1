//! CDM dataset inspector.
//!
//! Opens a dataset through the registry and prints JSON describing its
//! structure, the coordinate mapping of a variable, its GeoJSON rendering,
//! reverse coordinate lookups or its calendar-aligned time windows.

mod commands;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

use cdm_field::{ExportConfig, OriginSpec, Reduction, WindowLength};
use cdm_model::DatasetRegistry;

#[derive(Parser, Debug)]
#[command(name = "cdm-inspect")]
#[command(about = "Inspect CDM datasets and their fields")]
struct Cli {
    /// Dataset URI (a .json, .yaml or .yml descriptor)
    #[arg(env = "CDM_DATASET")]
    uri: String,

    /// Group path within the dataset
    #[arg(long, default_value = "/")]
    group: String,

    /// Log level
    #[arg(long, default_value = "warn", env = "RUST_LOG")]
    log_level: String,

    /// Emit logs as JSON
    #[arg(long, env = "CDM_LOG_JSON")]
    log_json: bool,

    /// Pretty-print the output document
    #[arg(long)]
    pretty: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Groups, dimensions and collated fields
    Summary,

    /// Coordinates mapping and feature type of a variable
    Mapping {
        variable: String,
    },

    /// Render a variable as a GeoJSON feature collection
    Features(FeaturesArgs),

    /// Find axis indices nearest to coordinate values
    Locate {
        variable: String,

        /// Targets as role=value, e.g. latitude=-33.9 or time=2012-01-02T12:00:00
        #[arg(long = "target", required = true)]
        targets: Vec<String>,
    },

    /// Calendar-aligned time windows, optionally reduced
    Slices(SlicesArgs),
}

#[derive(Args, Debug)]
struct FeaturesArgs {
    variable: String,

    /// Property names for successive values of each cell
    #[arg(long, value_delimiter = ',')]
    property_names: Option<Vec<String>>,

    /// Property name for the sampled value
    #[arg(long, env = "CDM_VALUE_PROPERTY")]
    value_property: Option<String>,

    /// Property name for the feature id
    #[arg(long, env = "CDM_ID_PROPERTY")]
    id_property: Option<String>,
}

#[derive(Args, Debug)]
struct SlicesArgs {
    variable: String,

    /// Window origin constraints, e.g. "year=2012,hour=12" (repeatable)
    #[arg(long = "origin")]
    origins: Vec<OriginSpec>,

    /// Window length, e.g. "1 day" or "3 months"
    #[arg(long, default_value = "1 month")]
    length: WindowLength,

    /// Reduce each window: sum, mean, min, max or count
    #[arg(long)]
    reduce: Option<Reduction>,

    /// Leave values below this out of the reduction
    #[arg(long, allow_negative_numbers = true)]
    mask_below: Option<f64>,

    /// Leave values above this out of the reduction
    #[arg(long, allow_negative_numbers = true)]
    mask_above: Option<f64>,
}

fn init_tracing(cli: &Cli) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cli.log_level));
    let builder = fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr);
    if cli.log_json {
        builder.json().init();
    } else {
        builder.init();
    }
}

fn main() -> Result<()> {
    // Load environment from .env file if present
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    init_tracing(&cli);

    let registry = DatasetRegistry::with_defaults();
    let dataset = registry
        .open(&cli.uri)
        .with_context(|| format!("failed to open {}", cli.uri))?;
    info!(dataset = %dataset.name, uri = %cli.uri, "Opened dataset");

    let output = match &cli.command {
        Command::Summary => commands::summary(&dataset),
        Command::Mapping { variable } => {
            let group = commands::find_group(&dataset, &cli.group)?;
            commands::mapping(group, variable)?
        }
        Command::Features(args) => {
            let group = commands::find_group(&dataset, &cli.group)?;
            let mut config = ExportConfig::from_env();
            if let Some(value_property) = &args.value_property {
                config.value_property = value_property.clone();
            }
            if let Some(id_property) = &args.id_property {
                config.id_property = id_property.clone();
            }
            commands::features(group, &args.variable, config, args.property_names.clone())?
        }
        Command::Locate { variable, targets } => {
            let group = commands::find_group(&dataset, &cli.group)?;
            let targets = targets
                .iter()
                .map(|t| commands::parse_target(t))
                .collect::<Result<Vec<_>>>()?;
            commands::locate(group, variable, &targets)?
        }
        Command::Slices(args) => {
            let group = commands::find_group(&dataset, &cli.group)?;
            commands::slices(
                group,
                &args.variable,
                &args.origins,
                &args.length,
                args.reduce,
                args.mask_below,
                args.mask_above,
            )?
        }
    };

    let text = if cli.pretty {
        serde_json::to_string_pretty(&output)?
    } else {
        serde_json::to_string(&output)?
    };
    println!("{}", text);
    Ok(())
}
