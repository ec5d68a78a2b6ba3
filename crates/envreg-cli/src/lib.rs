//! envreg command surface
//!
//! Thin glue over [`envreg_core::Registry`]: argument parsing, configuration
//! resolution and one status line per invocation.

#![allow(missing_docs)]

use anyhow::Context;
use clap::{value_parser, Arg, ArgAction, ArgMatches, Command};
use envreg_core::prelude::*;
use envreg_core::registry::validate_file_with;
use std::path::PathBuf;

/// Result of one command: the status line and whether it succeeded
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Report {
    pub message: String,
    pub success: bool,
}

impl Report {
    fn ok(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            success: true,
        }
    }

    fn failed(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            success: false,
        }
    }

    /// Process exit status for this report
    #[must_use]
    pub fn exit_code(&self) -> u8 {
        u8::from(!self.success)
    }
}

pub fn command() -> Command {
    Command::new("envreg")
        .version(envreg_core::VERSION)
        .about("Manage per-application environment records")
        .subcommand_required(true)
        .arg_required_else_help(true)
        .arg(
            Arg::new("config")
                .long("config")
                .global(true)
                .env("ENVREG_CONFIG")
                .value_parser(value_parser!(PathBuf))
                .help("TOML configuration file"),
        )
        .arg(
            Arg::new("root")
                .long("root")
                .global(true)
                .env("ENVREG_ROOT")
                .value_parser(value_parser!(PathBuf))
                .help("Directory holding the records (overrides config)"),
        )
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .global(true)
                .action(ArgAction::Count)
                .help("Increase log verbosity (-v info, -vv debug, -vvv trace)"),
        )
        .subcommand(
            Command::new("create")
                .about("Register a new application, refusing duplicates")
                .arg(Arg::new("app").required(true).help("Application name"))
                .arg(required_text("business-unit", "Owning business unit"))
                .arg(required_text(
                    "infrastructure-support",
                    "Infrastructure support contact",
                ))
                .arg(required_text("owner", "Application owner"))
                .arg(required_text("slack-channel", "Team slack channel"))
                .arg(required_text(
                    "sso-group",
                    "SSO group granted access to the initial environment",
                ))
                .arg(
                    Arg::new("critical-national-infrastructure")
                        .long("critical-national-infrastructure")
                        .action(ArgAction::SetTrue)
                        .help("Mark the application as critical national infrastructure"),
                )
                .arg(
                    Arg::new("go-live-date")
                        .long("go-live-date")
                        .default_value("")
                        .help("Planned go-live date"),
                )
                .arg(
                    Arg::new("codeowner")
                        .long("codeowner")
                        .action(ArgAction::Append)
                        .help("Code owner; may be repeated"),
                ),
        )
        .subcommand(
            Command::new("amend-access")
                .about("Append access grants to an environment (idempotent)")
                .arg(Arg::new("app").required(true).help("Application name"))
                .arg(
                    Arg::new("environment")
                        .required(true)
                        .help("Environment name, created if absent"),
                )
                .arg(
                    Arg::new("grant")
                        .long("grant")
                        .required(true)
                        .action(ArgAction::Append)
                        .value_parser(value_parser!(AccessGrant))
                        .help("Grant as <sso_group>:<level>; may be repeated"),
                ),
        )
        .subcommand(
            Command::new("validate")
                .about("Validate record files against the record schema")
                .arg(
                    Arg::new("paths")
                        .required(true)
                        .num_args(1..)
                        .value_parser(value_parser!(PathBuf))
                        .help("Record files to validate"),
                ),
        )
        .subcommand(
            Command::new("exists")
                .about("Check whether an application is registered (exit 1 if not)")
                .arg(Arg::new("app").required(true).help("Application name")),
        )
}

fn required_text(name: &'static str, help: &'static str) -> Arg {
    Arg::new(name).long(name).required(true).help(help)
}

/// Log filter for a `-v` count
#[must_use]
pub fn log_level(verbosity: u8) -> &'static str {
    match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    }
}

/// Config file (if any), then `--root`
///
/// # Errors
/// Fails if the config file cannot be loaded.
pub fn resolve_config(matches: &ArgMatches) -> anyhow::Result<RegistryConfig> {
    let mut config = match matches.get_one::<PathBuf>("config") {
        Some(path) => RegistryConfig::load(path)?,
        None => RegistryConfig::new(),
    };
    if let Some(root) = matches.get_one::<PathBuf>("root") {
        config = config.with_root(root);
    }
    tracing::debug!(root = %config.root.display(), "configuration resolved");
    Ok(config)
}

/// Execute a parsed command line
///
/// # Errors
/// Any registry failure, with the record and field path in the message.
pub fn run(matches: &ArgMatches) -> anyhow::Result<Report> {
    let config = resolve_config(matches)?;

    match matches.subcommand() {
        Some(("create", args)) => create(config, args),
        Some(("amend-access", args)) => amend_access(config, args),
        Some(("validate", args)) => Ok(validate(&config, args)),
        Some(("exists", args)) => exists(config, args),
        _ => anyhow::bail!("no command given"),
    }
}

fn text(args: &ArgMatches, name: &str) -> String {
    args.get_one::<String>(name).cloned().unwrap_or_default()
}

fn create(config: RegistryConfig, args: &ArgMatches) -> anyhow::Result<Report> {
    let codeowners = args
        .get_many::<String>("codeowner")
        .map(|owners| owners.cloned().collect::<Vec<_>>());
    let app = NewApplication {
        name: text(args, "app"),
        business_unit: text(args, "business-unit"),
        infrastructure_support: text(args, "infrastructure-support"),
        owner: text(args, "owner"),
        slack_channel: text(args, "slack-channel"),
        critical_national_infrastructure: args.get_flag("critical-national-infrastructure"),
        sso_group: text(args, "sso-group"),
        go_live_date: text(args, "go-live-date"),
        codeowners,
    };

    let name = app.name.clone();
    let store = config.directory_store();
    let path = store.path_for(&name);
    let mut registry = Registry::new(store, config);
    registry
        .create_application(app)
        .with_context(|| format!("cannot create application '{name}'"))?;

    Ok(Report::ok(format!("Created {}", path.display())))
}

fn amend_access(config: RegistryConfig, args: &ArgMatches) -> anyhow::Result<Report> {
    let app = text(args, "app");
    let environment = text(args, "environment");
    let grants: Vec<AccessGrant> = args
        .get_many::<AccessGrant>("grant")
        .map(|grants| grants.cloned().collect())
        .unwrap_or_default();

    let store = config.directory_store();
    let path = store.path_for(&app);
    let mut registry = Registry::new(store, config);
    let outcome = registry
        .amend_access(&app, &environment, &grants)
        .with_context(|| format!("cannot update access for '{app}'"))?;

    let message = if outcome.is_noop() {
        format!("Access for '{environment}' in {} already up to date", path.display())
    } else if outcome.environment_created {
        format!(
            "Created environment '{environment}' with {} grant(s) in {}",
            outcome.added,
            path.display()
        )
    } else {
        format!(
            "Updated access for '{environment}' in {}: {} added, {} already present",
            path.display(),
            outcome.added,
            outcome.skipped
        )
    };
    Ok(Report::ok(message))
}

fn validate(config: &RegistryConfig, args: &ArgMatches) -> Report {
    let validator = config.validator();
    let paths: Vec<&PathBuf> = args.get_many::<PathBuf>("paths").into_iter().flatten().collect();

    let failures: Vec<String> = paths
        .iter()
        .filter_map(|path| validate_file_with(&validator, path).err())
        .map(|e| e.to_string())
        .collect();

    if failures.is_empty() {
        Report::ok(format!(
            "Environment JSON validation passed ({} file(s))",
            paths.len()
        ))
    } else {
        for failure in &failures {
            tracing::warn!("{failure}");
        }
        Report::failed(format!(
            "Environment JSON validation failed ({} of {} file(s)): {}",
            failures.len(),
            paths.len(),
            failures.join("; ")
        ))
    }
}

fn exists(config: RegistryConfig, args: &ArgMatches) -> anyhow::Result<Report> {
    let app = text(args, "app");
    let registry = Registry::new(config.directory_store(), config);
    if registry.application_exists(&app)? {
        Ok(Report::ok(format!("Application '{app}' already exists")))
    } else {
        Ok(Report::failed(format!("Application '{app}' is not registered")))
    }
}
