//! ktgen - KTensor test matrix generator
//!
//! Expands the declarative test definitions of each category into one C++
//! program per static/dynamic extent variant, plus the CMake files that
//! build and run them.

mod config;

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use env_logger::Env;
use ktgen_codegen::{
    check_files, plan_from_root, write_files, CategoryPlan, FileStatus, StepKind,
};
use ktgen_spec::Category;
use log::{debug, info};

use crate::config::{parse_run_arguments, ConfigLoader, KtgenConfig, LogLevel};

#[derive(Parser)]
#[command(
    name = "ktgen",
    version,
    about = "Generate the KTensor correctness and compile-time-check test matrix",
    long_about = r#"
ktgen reads <root>/<category>/test_definitions.yaml for each test category and
writes one C++ program per static/dynamic extent combination, together with the
CMakeLists.txt files that register their build and run tests.

Examples:
  ktgen                                  # Generate every category under .
  ktgen --root tests generate            # Generate under ./tests
  ktgen --category correctness check     # Verify generated correctness tests
  ktgen plan --json                      # Print the variant matrix as JSON
  ktgen --seed 7 generate                # Random default extents, seed 7
"#,
    after_help = r#"
Environment Variables:
  KTGEN_CONFIG=<path>          Path to configuration file
  KTGEN_ROOT=<dir>             Tests root directory
  KTGEN_DEFAULT_EXTENT=5       Static extent for indices without one
  KTGEN_SEED=<n>               Draw unspecified extents from [3,7) with seed n
  KTGEN_RUN_ARGS=3,4,5         Arguments passed to every correctness program
  KTGEN_DEBUG=1                Enable debug logging
  KTGEN_LOG_LEVEL=debug        Set log level (error, warn, info, debug, trace)
"#
)]
#[command(propagate_version = true)]
struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    debug: bool,

    /// Set log level
    #[arg(long, value_enum, global = true)]
    log_level: Option<LogLevel>,

    /// Configuration file path
    #[arg(long, env = "KTGEN_CONFIG", global = true)]
    config: Option<PathBuf>,

    /// Tests root holding one directory per category
    #[arg(long, global = true)]
    root: Option<PathBuf>,

    /// Restrict generation to one category
    #[arg(long, value_enum, global = true)]
    category: Option<CategorySelection>,

    /// Static extent for indices that do not declare one
    #[arg(long, global = true)]
    default_extent: Option<u32>,

    /// Draw unspecified static extents from [3,7) using this seed
    #[arg(long, global = true)]
    seed: Option<u64>,

    /// Run arguments for correctness programs, e.g. "3,4,5"
    #[arg(long, global = true)]
    run_args: Option<String>,

    /// Command to execute (defaults to generate)
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Write generated programs and CMake files
    Generate,

    /// Compare generated files with the files on disk without writing
    Check,

    /// Show the variant, target and test matrix
    Plan {
        /// Print as JSON
        #[arg(long)]
        json: bool,
    },

    /// Configuration management
    Config {
        #[command(subcommand)]
        action: ConfigCommand,
    },
}

#[derive(Subcommand)]
enum ConfigCommand {
    /// Print the effective configuration as YAML
    Show,

    /// Write the effective configuration to a file
    Generate {
        /// Output file; the extension selects YAML, JSON or TOML
        #[arg(short, long, default_value = ".ktgen.yaml")]
        output: PathBuf,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum CategorySelection {
    Correctness,
    CompileTimeChecks,
    All,
}

impl CategorySelection {
    fn categories(self) -> Vec<Category> {
        match self {
            CategorySelection::Correctness => vec![Category::Correctness],
            CategorySelection::CompileTimeChecks => vec![Category::CompileTimeChecks],
            CategorySelection::All => Category::ALL.to_vec(),
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = ConfigLoader::load(cli.config.as_deref())?;
    apply_cli_overrides(&cli, &mut config)?;

    let log_level = if cli.debug || config.logging.debug {
        log::LevelFilter::Debug
    } else {
        config.logging.level.into()
    };

    env_logger::Builder::from_env(Env::default().default_filter_or("info"))
        .filter_level(log_level)
        .init();

    debug!("ktgen v{} starting", env!("CARGO_PKG_VERSION"));

    match cli.command.unwrap_or(Commands::Generate) {
        Commands::Generate => execute_generate(&config),
        Commands::Check => execute_check(&config),
        Commands::Plan { json } => execute_plan(&config, json),
        Commands::Config { action } => execute_config(&config, action),
    }
}

fn apply_cli_overrides(cli: &Cli, config: &mut KtgenConfig) -> Result<()> {
    if let Some(root) = &cli.root {
        config.generation.root = root.clone();
    }
    if let Some(selection) = cli.category {
        config.generation.categories = selection.categories();
    }
    if let Some(extent) = cli.default_extent {
        config.extents.default_static = extent;
    }
    if let Some(seed) = cli.seed {
        config.extents.seed = Some(seed);
    }
    if let Some(args) = &cli.run_args {
        config.build.run_arguments = parse_run_arguments(args)?;
    }
    if let Some(level) = cli.log_level {
        config.logging.level = level;
    }
    if config.extents.default_static == 0 {
        bail!("default static extent must be positive");
    }
    Ok(())
}

/// Plan every configured category. Nothing is written until all of them
/// have been read and expanded successfully.
fn plan_all(config: &KtgenConfig) -> Result<Vec<CategoryPlan>> {
    let root = &config.generation.root;
    let settings = config.generation_settings();

    config
        .generation
        .categories
        .iter()
        .map(|&category| {
            let mut defaults = config.default_extent(category);
            plan_from_root(root, category, &mut defaults, &settings).with_context(|| {
                format!(
                    "Failed to expand {category} tests under {}",
                    root.display()
                )
            })
        })
        .collect()
}

fn execute_generate(config: &KtgenConfig) -> Result<()> {
    let root = &config.generation.root;
    let plans = plan_all(config)?;

    for plan in &plans {
        let summary = write_files(root, &plan.files)
            .with_context(|| format!("Failed to write {} tests", plan.category))?;
        info!(
            "{}: {} specifications, {} files written, {} unchanged",
            plan.category,
            plan.specs.len(),
            summary.written,
            summary.unchanged
        );
        println!(
            "{}: {} written, {} unchanged",
            plan.category, summary.written, summary.unchanged
        );
    }
    Ok(())
}

fn execute_check(config: &KtgenConfig) -> Result<()> {
    let root = &config.generation.root;
    let plans = plan_all(config)?;

    let mut total = 0;
    let mut outdated = 0;
    for plan in &plans {
        let checks = check_files(root, &plan.files)
            .with_context(|| format!("Failed to check {} tests", plan.category))?;
        total += checks.len();
        for check in checks {
            match check.status {
                FileStatus::UpToDate => {}
                FileStatus::Missing => {
                    outdated += 1;
                    println!("missing: {}", check.path.display());
                }
                FileStatus::Stale { diff } => {
                    outdated += 1;
                    println!("stale: {}", check.path.display());
                    print!("{diff}");
                }
            }
        }
    }

    if outdated > 0 {
        bail!("{outdated} of {total} generated files are out of date; run `ktgen generate`");
    }
    println!("All {total} generated files are up to date");
    Ok(())
}

fn execute_plan(config: &KtgenConfig, json: bool) -> Result<()> {
    let plans = plan_all(config)?;

    if json {
        let text = serde_json::to_string_pretty(&plans).context("Failed to serialize plan")?;
        println!("{text}");
        return Ok(());
    }

    for plan in &plans {
        println!("{}", plan.category);
        for spec in &plan.specs {
            println!("  {} ({})", spec.identifier, spec.name);
            for matrix in &spec.variants {
                let targets: Vec<&str> = matrix.targets.iter().map(|t| t.name.as_str()).collect();
                println!("    [{}] {}", matrix.tag, targets.join(", "));
                for step in &matrix.steps {
                    let action = match step.kind {
                        StepKind::Build => "build",
                        StepKind::Run => "run",
                    };
                    let expectation = if step.will_fail { " (must fail)" } else { "" };
                    println!("      {action} {}{expectation}", step.name);
                }
            }
        }
    }
    Ok(())
}

fn execute_config(config: &KtgenConfig, action: ConfigCommand) -> Result<()> {
    match action {
        ConfigCommand::Show => {
            let yaml = serde_yaml::to_string(config).context("Failed to serialize config")?;
            print!("{yaml}");
        }
        ConfigCommand::Generate { output } => {
            ConfigLoader::save_to_file(config, &output)?;
            println!("Configuration written to {}", output.display());
        }
    }
    Ok(())
}
