//! `featurecfg` — resolve build feature flags from the command line.
//!
//! ```bash
//! # Resolve against the built-in rule table
//! featurecfg resolve ELECTROSTATICS FFTW
//!
//! # Custom rules, JSON output, keep a verifiable report
//! featurecfg resolve --rules rules.json --json --report out/cpu.json LB_GPU
//!
//! # Every profile of a build config
//! featurecfg profiles --config build.toml
//!
//! # What changed between two reports
//! featurecfg diff old.json new.json
//! ```
//!
//! Logging goes to stderr and honours `RUST_LOG` (default `info`).

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use serde_json::json;

use feature_resolver::graph::{implication_cycles, implied_by};
use feature_resolver::hashing::rules_fingerprint;
use feature_resolver::reference::reference_table;
use feature_resolver::{project, FlagKind, Resolver, RuleTable};
use feature_runtime::batch::resolve_all;
use feature_runtime::config::BuildConfig;
use feature_runtime::drift::compare;
use feature_runtime::report::{load_report, save_report, verify_report, ResolutionReport};
use feature_runtime::rule_file::import_rules_from_file;

#[derive(Parser, Debug)]
#[command(name = "featurecfg")]
#[command(about = "Resolve build feature flags against implication and derived rules")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Resolve a set of requested flags
    Resolve {
        /// Rule file (JSON); the built-in table when omitted
        #[arg(long)]
        rules: Option<PathBuf>,

        /// Print the outcome as JSON
        #[arg(long)]
        json: bool,

        /// Fail when any diagnostic is emitted
        #[arg(long)]
        deny_warnings: bool,

        /// Write a verifiable report to this path
        #[arg(long)]
        report: Option<PathBuf>,

        /// Requested flags
        flags: Vec<String>,
    },

    /// Resolve every profile in a build config
    Profiles {
        #[arg(short, long)]
        config: PathBuf,

        #[arg(long)]
        json: bool,
    },

    /// Compare two saved reports
    Diff { baseline: PathBuf, current: PathBuf },

    /// Validate a rule table and print its fingerprint
    CheckRules {
        #[arg(long)]
        rules: Option<PathBuf>,
    },

    /// Show what a flag is and what it pulls in
    Explain {
        #[arg(long)]
        rules: Option<PathBuf>,

        flag: String,
    },
}

fn main() -> Result<ExitCode> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.command {
        Command::Resolve {
            rules,
            json,
            deny_warnings,
            report,
            flags,
        } => run_resolve(rules.as_deref(), json, deny_warnings, report.as_deref(), &flags),
        Command::Profiles { config, json } => run_profiles(&config, json),
        Command::Diff { baseline, current } => run_diff(&baseline, &current),
        Command::CheckRules { rules } => run_check_rules(rules.as_deref()),
        Command::Explain { rules, flag } => run_explain(rules.as_deref(), &flag),
    }
}

fn load_table(rules: Option<&Path>) -> Result<RuleTable> {
    match rules {
        Some(path) => import_rules_from_file(path)
            .with_context(|| format!("Failed to load rules from {}", path.display())),
        None => Ok(reference_table()),
    }
}

fn run_resolve(
    rules: Option<&Path>,
    json: bool,
    deny_warnings: bool,
    report_path: Option<&Path>,
    flags: &[String],
) -> Result<ExitCode> {
    let table = load_table(rules)?;
    let resolution = Resolver::new(&table)
        .resolve(flags)
        .context("Resolution failed")?;
    let report = ResolutionReport::new(&table, flags, &resolution);

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        for name in project(&resolution.features).iter() {
            println!("{}", name);
        }
    }

    if let Some(path) = report_path {
        save_report(path, &report)
            .with_context(|| format!("Failed to write report {}", path.display()))?;
        tracing::info!("Report: {}", path.display());
    }

    if deny_warnings && resolution.has_warnings() {
        tracing::error!(
            warnings = resolution.diagnostics.len(),
            "warnings denied"
        );
        return Ok(ExitCode::FAILURE);
    }
    Ok(ExitCode::SUCCESS)
}

fn run_profiles(config_path: &Path, json: bool) -> Result<ExitCode> {
    let config = BuildConfig::load(config_path)
        .with_context(|| format!("Failed to load config {}", config_path.display()))?;
    let table = config.load_rules().with_context(|| match &config.rules {
        Some(path) => format!("Failed to load rules from {}", path.display()),
        None => "Failed to load the built-in rules".to_string(),
    })?;
    let outcomes = resolve_all(&table, &config);

    let mut failed = false;
    let mut documents = Vec::new();
    for outcome in &outcomes {
        failed |= outcome.failed();
        match &outcome.result {
            Ok(resolution) => {
                let report = ResolutionReport::new(&table, outcome.requested.as_slice(), resolution);
                if json {
                    documents.push(json!({ "profile": outcome.profile, "report": report }));
                } else {
                    println!("[{}] {}", outcome.profile, report.features.join(" "));
                    for d in &report.diagnostics {
                        println!("[{}] warning: {}", outcome.profile, d);
                    }
                }
            }
            Err(err) => {
                if json {
                    documents.push(json!({ "profile": outcome.profile, "error": err.to_string() }));
                } else {
                    println!("[{}] error: {}", outcome.profile, err);
                }
            }
        }
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&documents)?);
    }
    Ok(if failed { ExitCode::FAILURE } else { ExitCode::SUCCESS })
}

fn run_diff(baseline: &Path, current: &Path) -> Result<ExitCode> {
    let a = load_report(baseline)
        .with_context(|| format!("Failed to read report {}", baseline.display()))?;
    let b = load_report(current)
        .with_context(|| format!("Failed to read report {}", current.display()))?;
    for (path, report) in [(baseline, &a), (current, &b)] {
        if !verify_report(report) {
            bail!("Report {} failed verification", path.display());
        }
    }

    let drift = compare(&a, &b);
    println!("{}", serde_json::to_string_pretty(&drift)?);
    Ok(ExitCode::SUCCESS)
}

fn run_check_rules(rules: Option<&Path>) -> Result<ExitCode> {
    let table = load_table(rules)?;
    let cycles = implication_cycles(&table);

    println!("flags:        {}", table.len());
    println!("implications: {}", table.implication_rules().len());
    println!("derived:      {}", table.derived_rules().len());
    println!("fingerprint:  {}", rules_fingerprint(&table));
    for cycle in &cycles {
        println!("cycle:        {}", cycle.join(" -> "));
    }
    Ok(ExitCode::SUCCESS)
}

fn run_explain(rules: Option<&Path>, flag: &str) -> Result<ExitCode> {
    let table = load_table(rules)?;
    let Some(kind) = table.kind(flag) else {
        bail!("Unknown flag: {}", flag);
    };

    println!("{} ({})", flag, kind.as_str());
    if kind == FlagKind::Derived {
        if let Some(rule) = table.derived_rule(flag) {
            println!("  active when: {}", rule.expression);
        }
    }
    let direct = table.implications(flag);
    if !direct.is_empty() {
        println!("  implies:     {}", direct.join(", "));
    }
    let all = implied_by(&table, flag);
    if all.len() > direct.len() {
        println!("  pulls in:    {}", all.join(", "));
    }
    Ok(ExitCode::SUCCESS)
}
