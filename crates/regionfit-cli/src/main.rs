//! regionfit CLI - sample, measure and score constraint models.

mod commands;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use regionfit::{console, Distribution, EngineConfig, SamplerPolicy, Session, VolumeStrategy};

#[derive(Parser)]
#[command(name = "regionfit")]
#[command(version)]
#[command(about = "Sample, measure and score linear/integer constraint models")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Path to a TOML or YAML engine configuration
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Random seed, overriding the configuration
    #[arg(long, global = true)]
    seed: Option<u64>,

    /// Print results as JSON
    #[arg(long, global = true)]
    json: bool,

    /// More log output (-v debug, -vv trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,
}

/// Options shared by commands that load a model.
#[derive(clap::Args)]
struct ModelArgs {
    /// LP artifact (`.lp`) or modeling-language source to compile
    model: PathBuf,

    /// Declared variables, comma-separated; every variable when omitted
    #[arg(short, long, value_delimiter = ',')]
    declared: Option<Vec<String>>,
}

#[derive(Subcommand)]
enum Commands {
    /// Draw distinct feasible points from a model
    Sample {
        #[command(flatten)]
        model: ModelArgs,

        /// Number of points to request
        #[arg(short = 'n', long, default_value = "100")]
        count: usize,

        /// Sampler to use
        #[arg(short, long, value_enum, default_value = "auto")]
        sampler: SamplerArg,

        /// Hit-and-run line-search budget, overriding the configuration
        #[arg(long)]
        budget: Option<usize>,

        /// Treat continuous variables as integer while pooling
        #[arg(long)]
        relax_to_integer: bool,

        /// Write the points as CSV to this file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Draw uniform rows from the model's bounding box, labelled by feasibility
    Generate {
        #[command(flatten)]
        model: ModelArgs,

        /// Number of rows to produce
        #[arg(short = 'n', long, default_value = "100")]
        count: usize,

        /// Keep infeasible draws too, instead of positives only
        #[arg(long)]
        all: bool,

        /// Append a 1/0 class column
        #[arg(long)]
        labelled: bool,

        /// Uniform draws available, overriding the configuration
        #[arg(long)]
        budget: Option<usize>,

        /// Write the rows as CSV to this file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Estimate the feasible share of the model's bounding box
    Volume {
        #[command(flatten)]
        model: ModelArgs,

        /// Heuristic run before the precise fallback
        #[arg(long, value_enum)]
        strategy: Option<StrategyArg>,
    },

    /// Check which rows of a CSV table a model accepts
    Check {
        #[command(flatten)]
        model: ModelArgs,

        /// CSV table with a header; an optional `class` column labels rows
        data: PathBuf,
    },

    /// Score candidate phenotypes against a ground-truth model
    Score {
        /// Ground-truth source holding the `### END OF TEMPLATE ###` marker
        #[arg(long)]
        ground_truth: PathBuf,

        /// Training reference CSV
        #[arg(long)]
        training: PathBuf,

        /// Test reference CSV
        #[arg(long)]
        test: PathBuf,

        /// Reference set to score against
        #[arg(long, value_enum, default_value = "training")]
        distribution: DistributionArg,

        /// Phenotype files; the ground truth itself is scored when omitted
        phenotypes: Vec<PathBuf>,
    },

    /// Print the default engine configuration
    ExampleConfig {
        /// Emit YAML instead of TOML
        #[arg(long)]
        yaml: bool,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum SamplerArg {
    Auto,
    BranchAndCut,
    HitAndRun,
}

impl From<SamplerArg> for SamplerPolicy {
    fn from(arg: SamplerArg) -> Self {
        match arg {
            SamplerArg::Auto => SamplerPolicy::Auto,
            SamplerArg::BranchAndCut => SamplerPolicy::BranchAndCut,
            SamplerArg::HitAndRun => SamplerPolicy::HitAndRun,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum StrategyArg {
    BoxMonteCarlo,
    Hypercube,
}

impl From<StrategyArg> for VolumeStrategy {
    fn from(arg: StrategyArg) -> Self {
        match arg {
            StrategyArg::BoxMonteCarlo => VolumeStrategy::BoxMonteCarlo,
            StrategyArg::Hypercube => VolumeStrategy::Hypercube,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum DistributionArg {
    Training,
    Test,
}

impl From<DistributionArg> for Distribution {
    fn from(arg: DistributionArg) -> Self {
        match arg {
            DistributionArg::Training => Distribution::Training,
            DistributionArg::Test => Distribution::Test,
        }
    }
}

fn setup_logging(verbose: u8) {
    let directives = match verbose {
        0 => console::DEFAULT_DIRECTIVES,
        1 => "regionfit=debug",
        _ => "regionfit=trace",
    };
    console::init_with_default(directives);
}

fn load_config(cli: &Cli) -> Result<EngineConfig> {
    let mut config = match &cli.config {
        Some(path) => EngineConfig::load(path)
            .with_context(|| format!("Failed to load config from {:?}", path))?,
        None => EngineConfig::default(),
    };
    if let Some(seed) = cli.seed {
        config = config.with_random_seed(seed);
    }
    Ok(config)
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    if let Commands::ExampleConfig { yaml } = cli.command {
        return commands::example_config(yaml);
    }

    setup_logging(cli.verbose);
    let mut config = load_config(&cli)?;

    match cli.command {
        Commands::Sample {
            model,
            count,
            sampler,
            budget,
            relax_to_integer,
            output,
        } => {
            if let Some(budget) = budget {
                config = config.with_hit_and_run_budget(budget);
            }
            config.branch_and_cut.relax_to_integer |= relax_to_integer;
            config.fitness.sampler = sampler.into();
            let session = Session::new(config)?;
            commands::sample(&session, &model, count, output.as_deref(), cli.json)
        }
        Commands::Generate {
            model,
            count,
            all,
            labelled,
            budget,
            output,
        } => {
            if let Some(budget) = budget {
                config.generator.draw_budget = budget;
            }
            let session = Session::new(config)?;
            commands::generate(
                &session,
                &model,
                count,
                !all,
                labelled,
                output.as_deref(),
                cli.json,
            )
        }
        Commands::Volume { model, strategy } => {
            if let Some(strategy) = strategy {
                config.volume.strategy = strategy.into();
            }
            let session = Session::new(config)?;
            commands::volume(&session, &model, cli.json)
        }
        Commands::Check { model, data } => {
            let session = Session::new(config)?;
            commands::check(&session, &model, &data, cli.json)
        }
        Commands::Score {
            ground_truth,
            training,
            test,
            distribution,
            phenotypes,
        } => {
            let session = Session::new(config)?;
            let scorer = session
                .scorer(&ground_truth, &training, &test)
                .with_context(|| format!("Failed to set up scoring for {:?}", ground_truth))?;
            commands::score(&scorer, &phenotypes, distribution.into(), cli.json)
        }
        Commands::ExampleConfig { .. } => Ok(()),
    }
}
