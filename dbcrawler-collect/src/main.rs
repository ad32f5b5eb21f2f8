//! Database metadata crawler.
//!
//! This binary resolves a connection from a URL template and properties,
//! crawls the database metadata once and writes the resulting catalog as
//! JSON. All crawl behavior lives in `dbcrawler-core`.
//!
//! # Security Guarantees
//! - Read-only connections by default
//! - Prompted passwords are used for one connection attempt and zeroized
//! - Connection URLs are redacted in every log line

mod output;

use clap::{Args, Parser, Subcommand};
use dbcrawler_core::error::DbCrawlerError;
use dbcrawler_core::logging::init_logging;
use dbcrawler_core::{
    ConnectionConfig, ConnectionSpec, CrawlOptions, Crawler, Credentials, DriverRegistry,
    MetadataSourceRegistry, PropertyBag, PropertyLayer, Result, Vendor, resolve,
};
use std::path::PathBuf;
use tracing::{debug, error, info, warn};

#[derive(Parser)]
#[command(name = "dbcrawler-collect")]
#[command(about = "Database metadata crawler")]
#[command(version)]
#[command(long_about = "
dbcrawler - database metadata crawl and merge

Connects read-only to a database, retrieves schemas, tables, columns, keys,
indexes, constraints, triggers, views, routines and sequences, and writes
one consistent catalog as JSON.

CONNECTION URLS:
  Templates may contain ${var} placeholders. They resolve from --property
  values, the [connection] section of --config, then environment variables.

SUPPORTED DATABASES:
- PostgreSQL (postgres:// or postgresql://)
- SQLite (sqlite:// or .db/.sqlite/.sqlite3 files)

EXAMPLES:
  dbcrawler-collect crawl postgres://crawler@localhost/app --ask-password
  dbcrawler-collect crawl sqlite:///data/app.db --tables 'BOOKS|AUTHORS'
  dbcrawler-collect crawl --config crawl.toml --output catalog.json
")]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalArgs,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Crawl database metadata and write the catalog
    Crawl(CrawlArgs),
    /// Test database connection
    Test(ConnectArgs),
    /// List compiled drivers and metadata categories
    List,
}

#[derive(Args)]
pub struct ConnectArgs {
    /// Connection URL template
    #[arg(env = "DATABASE_URL", help = "Database connection URL (credentials are redacted in logs)")]
    pub database_url: Option<String>,

    /// TOML file with [connection] and [crawl] sections
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Database user
    #[arg(short, long)]
    pub user: Option<String>,

    /// Prompt for the password instead of reading it from the URL or config
    #[arg(long)]
    pub ask_password: bool,

    /// Connection property as key=value (repeatable)
    #[arg(short = 'P', long = "property", value_parser = parse_property)]
    pub properties: Vec<(String, String)>,
}

#[derive(Args)]
pub struct CrawlArgs {
    #[command(flatten)]
    pub connect: ConnectArgs,

    /// Output file path
    #[arg(short, long, default_value = "catalog.json")]
    pub output: PathBuf,

    /// Schemas to include (regular expression)
    #[arg(long)]
    pub schemas: Option<String>,

    /// Schemas to exclude (regular expression)
    #[arg(long)]
    pub exclude_schemas: Option<String>,

    /// Tables to include (regular expression, bare or schema-qualified)
    #[arg(long)]
    pub tables: Option<String>,

    /// Tables to exclude (regular expression)
    #[arg(long)]
    pub exclude_tables: Option<String>,

    /// Columns to include (regular expression)
    #[arg(long)]
    pub columns: Option<String>,

    /// Columns to exclude (regular expression)
    #[arg(long)]
    pub exclude_columns: Option<String>,

    /// Routines to include (regular expression)
    #[arg(long)]
    pub routines: Option<String>,

    /// Routines to exclude (regular expression)
    #[arg(long)]
    pub exclude_routines: Option<String>,

    /// Keep only tables with a column matching `schema.table.column`
    #[arg(long)]
    pub grep_columns: Option<String>,

    /// Keep only routines with a parameter matching `schema.routine.parameter`
    #[arg(long)]
    pub grep_routine_columns: Option<String>,

    /// Invert the grep patterns
    #[arg(long)]
    pub invert_match: bool,

    /// Keep tables without matching columns when grepping
    #[arg(long)]
    pub include_tables_without_matching_columns: bool,

    /// Comma-separated table types to keep (default TABLE,VIEW)
    #[arg(long)]
    pub table_types: Option<String>,

    /// Sort columns by name instead of ordinal position
    #[arg(long)]
    pub sort_columns: bool,

    /// Sort routine parameters by name
    #[arg(long)]
    pub sort_routine_columns: bool,

    /// Skip stored routines
    #[arg(long)]
    pub no_routines: bool,

    /// Upper bound on concurrent metadata statements (1-50)
    #[arg(long)]
    pub max_concurrent_queries: Option<usize>,

    /// Directory of <CATEGORY>.sql resource overrides
    #[arg(long)]
    pub resource_dir: Option<PathBuf>,

    /// Abandon the crawl after this many seconds
    #[arg(long)]
    pub timeout_secs: Option<u64>,
}

impl CrawlArgs {
    /// Flags given on the command line as `crawl.*` property pairs.
    ///
    /// Switches are only emitted when set, so a config file value stays in
    /// effect unless the flag is passed.
    fn crawl_properties(&self) -> Vec<(&'static str, String)> {
        let mut properties = Vec::new();
        let patterns = [
            ("schemas", &self.schemas),
            ("exclude_schemas", &self.exclude_schemas),
            ("tables", &self.tables),
            ("exclude_tables", &self.exclude_tables),
            ("columns", &self.columns),
            ("exclude_columns", &self.exclude_columns),
            ("routines", &self.routines),
            ("exclude_routines", &self.exclude_routines),
            ("grep_columns", &self.grep_columns),
            ("grep_routine_columns", &self.grep_routine_columns),
            ("table_types", &self.table_types),
        ];
        for (key, value) in patterns {
            if let Some(value) = value {
                properties.push((key, value.clone()));
            }
        }

        let switches = [
            ("invert_match", self.invert_match),
            (
                "include_tables_without_matching_columns",
                self.include_tables_without_matching_columns,
            ),
            ("sort_columns", self.sort_columns),
            ("sort_routine_columns", self.sort_routine_columns),
        ];
        for (key, set) in switches {
            if set {
                properties.push((key, "true".to_string()));
            }
        }
        if self.no_routines {
            properties.push(("show_stored_procedures", "false".to_string()));
        }

        if let Some(max) = self.max_concurrent_queries {
            properties.push(("max_concurrent_queries", max.to_string()));
        }
        if let Some(dir) = &self.resource_dir {
            properties.push(("resource_dir", dir.display().to_string()));
        }
        if let Some(secs) = self.timeout_secs {
            properties.push(("timeout_secs", secs.to_string()));
        }
        properties
    }
}

fn parse_property(value: &str) -> std::result::Result<(String, String), String> {
    match value.split_once('=') {
        Some((key, value)) if !key.trim().is_empty() => {
            Ok((key.trim().to_string(), value.to_string()))
        }
        _ => Err(format!("expected key=value, got '{}'", value)),
    }
}

#[derive(Args)]
pub struct GlobalArgs {
    /// Increase verbosity
    #[arg(
        short,
        long,
        global = true,
        action = clap::ArgAction::Count,
        help = "Increase verbosity (-v, -vv, -vvv)"
    )]
    pub verbose: u8,

    /// Suppress output
    #[arg(short, long, global = true, help = "Suppress all output except errors")]
    pub quiet: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(cli.global.verbose, cli.global.quiet)?;

    let result = match &cli.command {
        Command::Crawl(args) => crawl(args).await,
        Command::Test(args) => test_connection(args).await,
        Command::List => {
            list_supported();
            Ok(())
        }
    };

    if let Err(e) = &result {
        error!("{}", e);
    }
    result
}

/// Layers the config file under the command-line connection values, on
/// top of the built-in and vendor defaults.
fn load_properties(connect: &ConnectArgs) -> Result<PropertyBag> {
    let mut bag = PropertyBag::with_defaults()?;
    if let Some(path) = &connect.config {
        bag.load_toml_file(PropertyLayer::User, path)?;
        info!("Loaded configuration from {}", path.display());
    }
    if let Some(url) = &connect.database_url {
        bag.set(PropertyLayer::User, "connection.url", url.clone());
    }
    for (key, value) in &connect.properties {
        bag.set(PropertyLayer::User, format!("connection.{}", key), value.clone());
    }
    if let Some(url) = bag.section("connection").get("url") {
        let vendor = Vendor::from_url(url);
        debug!("Using {} property defaults", vendor);
        bag.load_vendor_defaults(vendor)?;
    }
    Ok(bag)
}

fn credentials(connect: &ConnectArgs) -> Result<Credentials> {
    let password = if connect.ask_password {
        let password = rpassword::prompt_password("Password: ").map_err(|e| DbCrawlerError::Io {
            context: "Failed to read password".to_string(),
            source: e,
        })?;
        Some(password)
    } else {
        None
    };
    Ok(Credentials::single_use(
        connect.user.clone().unwrap_or_default(),
        password,
    ))
}

async fn open(connect: &ConnectArgs, bag: &PropertyBag) -> Result<dbcrawler_core::ResolvedConnection> {
    let spec = ConnectionSpec::from_properties(&bag.section("connection"))?;
    let mut credentials = credentials(connect)?;
    resolve(
        &spec,
        &mut credentials,
        &DriverRegistry::with_default_drivers(),
        &ConnectionConfig::default(),
    )
    .await
}

/// Runs one crawl and writes the catalog.
async fn crawl(args: &CrawlArgs) -> Result<()> {
    let mut bag = load_properties(&args.connect)?;
    for (key, value) in args.crawl_properties() {
        bag.set(PropertyLayer::User, format!("crawl.{}", key), value);
    }

    // Options are validated before any connection attempt
    let options = CrawlOptions::from_properties(&bag.section("crawl"))?;
    let crawler = Crawler::new(options)?;
    let resolved = open(&args.connect, &bag).await?;

    let control = crawler.control().clone();
    let interrupt = tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupted; cancelling crawl");
            control.cancel();
        }
    });

    let result = crawler.crawl(&resolved).await;
    interrupt.abort();
    resolved.connection.close().await;
    let outcome = result?;

    output::save_catalog(&outcome.catalog, &args.output).await?;

    let catalog = &outcome.catalog;
    info!("Catalog saved to {}", args.output.display());
    println!("Crawl completed ({})", outcome.state);
    println!("Output: {}", args.output.display());
    println!("Schemas: {}", catalog.schemas().len());
    println!("Tables: {}", catalog.tables().count());
    println!("Routines: {}", catalog.routines().count());
    println!("Foreign keys: {}", catalog.foreign_keys().len());
    if outcome.is_degraded() {
        println!("Warnings: {}", outcome.warnings.len());
        for warning in &outcome.warnings {
            println!("  {}", warning);
        }
    }

    Ok(())
}

/// Tests database connection without crawling
async fn test_connection(connect: &ConnectArgs) -> Result<()> {
    info!("Testing database connection...");

    let bag = load_properties(connect)?;
    let resolved = open(connect, &bag).await?;
    let info = resolved.database_info.clone();
    resolved.connection.close().await;

    println!(
        "Connection to {} {} successful ({} {})",
        info.product_name, info.product_version, info.driver_name, info.driver_version
    );
    Ok(())
}

/// Lists compiled drivers and the metadata categories they serve
fn list_supported() {
    println!("Drivers:");
    for name in DriverRegistry::with_default_drivers().names() {
        println!("  {}", name);
    }
    println!();

    #[cfg(feature = "postgresql")]
    {
        println!("PostgreSQL:");
        println!("  Connection: postgres://user@host:port/database");
        println!();
    }

    #[cfg(feature = "sqlite")]
    {
        println!("SQLite:");
        println!("  Connection: sqlite:///path/to/database.db");
        println!("  Example:    /path/to/database.sqlite");
        println!();
    }

    println!("Metadata categories:");
    for entry in MetadataSourceRegistry::new().iter() {
        println!("  {:<30} {}", entry.lookup_key, entry.resource_name);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    fn parse(args: &[&str]) -> Cli {
        temp_env::with_var_unset("DATABASE_URL", || Cli::try_parse_from(args).unwrap())
    }

    fn crawl_args(args: &[&str]) -> CrawlArgs {
        match parse(args).command {
            Command::Crawl(args) => args,
            _ => panic!("expected crawl"),
        }
    }

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_crawl_flags() {
        let args = crawl_args(&[
            "dbcrawler-collect",
            "crawl",
            "sqlite:///tmp/app.db",
            "--tables",
            "BOOKS|AUTHORS",
            "--grep-columns",
            r".*\.TITLE",
            "--invert-match",
            "--no-routines",
            "--max-concurrent-queries",
            "8",
            "-o",
            "out.json",
        ]);

        assert_eq!(args.connect.database_url.as_deref(), Some("sqlite:///tmp/app.db"));
        assert_eq!(args.output, PathBuf::from("out.json"));
        let properties = args.crawl_properties();
        assert!(properties.contains(&("tables", "BOOKS|AUTHORS".to_string())));
        assert!(properties.contains(&("invert_match", "true".to_string())));
        assert!(properties.contains(&("show_stored_procedures", "false".to_string())));
        assert!(properties.contains(&("max_concurrent_queries", "8".to_string())));
        assert!(!properties.iter().any(|(k, _)| *k == "sort_columns"));
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = parse(&["dbcrawler-collect", "list", "-vv"]);
        assert_eq!(cli.global.verbose, 2);
        assert!(matches!(cli.command, Command::List));
    }

    #[test]
    fn test_property_flag() {
        let args = crawl_args(&[
            "dbcrawler-collect",
            "crawl",
            "-P",
            "sslmode=require",
            "-P",
            "application_name=a=b",
        ]);
        assert_eq!(
            args.connect.properties,
            vec![
                ("sslmode".to_string(), "require".to_string()),
                ("application_name".to_string(), "a=b".to_string()),
            ]
        );

        assert!(parse_property("novalue").is_err());
        assert!(parse_property("=x").is_err());
    }

    #[test]
    fn test_command_line_overrides_config_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("crawl.toml");
        std::fs::write(
            &path,
            "[connection]\nurl = \"sqlite://${dir}/app.db\"\ndir = \"/data\"\n\n[crawl]\ntables = \"A\"\nsort_columns = true\n",
        )
        .unwrap();
        let path = path.display().to_string();

        let args = crawl_args(&["dbcrawler-collect", "crawl", "-c", &path, "--tables", "B"]);
        let mut bag = load_properties(&args.connect).unwrap();
        for (key, value) in args.crawl_properties() {
            bag.set(PropertyLayer::User, format!("crawl.{}", key), value);
        }

        let crawl = bag.section("crawl");
        assert_eq!(crawl.get("tables").map(String::as_str), Some("B"));
        assert_eq!(crawl.get("sort_columns").map(String::as_str), Some("true"));
        let options = CrawlOptions::from_properties(&crawl).unwrap();
        assert!(options.sort_columns);
        assert_eq!(options.table_types, vec!["TABLE".to_string(), "VIEW".to_string()]);
        // SQLite vendor defaults sit between the built-ins and the user layers
        assert_eq!(bag.provenance("crawl.max_concurrent_queries"), Some(PropertyLayer::Vendor));
        assert_eq!(options.max_concurrent_queries, 1);

        let spec = ConnectionSpec::from_properties(&bag.section("connection")).unwrap();
        assert_eq!(
            spec.resolve_url_with(&Default::default()).unwrap(),
            "sqlite:///data/app.db"
        );
    }

    #[test]
    fn test_credentials_are_single_use() {
        let connect = match parse(&["dbcrawler-collect", "test", "-u", "crawler"]).command {
            Command::Test(connect) => connect,
            _ => panic!("expected test"),
        };
        let credentials = credentials(&connect).unwrap();
        assert_eq!(credentials.username(), "crawler");
        assert!(credentials.is_single_use());
        assert!(!credentials.has_password());
    }
}
