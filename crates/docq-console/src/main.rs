use std::path::PathBuf;
use std::process;

use clap::Parser;
use docq_core::store::LocalStore;
use tracing::debug;

mod backup;
mod commands;
mod config;
mod display;
mod error;
mod executor;
mod input;

use commands::Command;
use config::{Config, Overrides};
use error::ConsoleError;
use executor::Context;
use input::{Input, StdInput};

/// docq: query and edit a hierarchical document store from the command line.
#[derive(Parser, Debug)]
#[command(name = "docq", version)]
struct Cli {
    /// Config file (default: <config dir>/docq/config.toml).
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Store file (default: <local data dir>/docq/store.json).
    #[arg(long, global = true)]
    store: Option<PathBuf>,

    /// Pretty print JSON output (--pretty=false to disable).
    #[arg(
        long,
        global = true,
        num_args = 0..=1,
        require_equals = true,
        default_missing_value = "true"
    )]
    pretty: Option<bool>,

    /// Compact JSON output (disables pretty printing).
    #[arg(long, global = true)]
    raw: bool,

    /// Spaces per indentation level when pretty printing.
    #[arg(long, global = true)]
    spacing: Option<usize>,

    #[command(subcommand)]
    command: Command,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let code = match run(cli, &mut StdInput::default()) {
        Ok(()) => 0,
        Err(e) => {
            display::print_error(&e);
            1
        }
    };
    process::exit(code);
}

/// Load config, open the store, execute one command and print its result.
fn run(cli: Cli, input: &mut impl Input) -> Result<(), ConsoleError> {
    let Cli {
        config,
        store,
        pretty,
        raw,
        spacing,
        command,
    } = cli;

    let mut config = Config::load(config.as_deref())?;
    config.apply(Overrides {
        store,
        pretty,
        raw,
        spacing,
    });

    let store_path = config.store_path()?;
    debug!(store = %store_path.display(), "opening store");
    let store = LocalStore::open(&store_path)?;

    let mut ctx = Context {
        store: &store,
        config: &config,
        input,
    };
    let result = executor::execute(&mut ctx, command)?;
    display::render(&result, config.output_mode())?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::{GetArgs, ListArgs};
    use crate::input::ScriptedInput;

    // ---- Cli parsing tests ----

    #[test]
    fn test_cli_requires_subcommand() {
        assert!(Cli::try_parse_from(["docq"]).is_err());
    }

    #[test]
    fn test_cli_get_with_flags() {
        let cli = Cli::try_parse_from([
            "docq",
            "get",
            "users",
            "name,age",
            "-f",
            r#"{"age":{">":30}}"#,
            "-o",
            "age:desc",
            "-l",
            "10",
            "--offset",
            "5",
            "--flatten",
        ])
        .unwrap();
        assert_eq!(
            cli.command,
            Command::Get(GetArgs {
                path: "users".to_string(),
                fields: Some("name,age".to_string()),
                filter: Some(r#"{"age":{">":30}}"#.to_string()),
                where_filter: None,
                order: Some("age:desc".to_string()),
                limit: 10,
                offset: 5,
                count: false,
                flatten: true,
            })
        );
    }

    #[test]
    fn test_cli_where_alias_and_count() {
        let cli = Cli::try_parse_from(["docq", "g", "users", "-w", "{}", "-c"]).unwrap();
        let Command::Get(args) = cli.command else {
            panic!("expected get");
        };
        assert_eq!(args.where_filter.as_deref(), Some("{}"));
        assert!(args.count);
    }

    #[test]
    fn test_cli_query_order_by() {
        let cli = Cli::try_parse_from([
            "docq",
            "query",
            "users",
            r#"{"id":1234}"#,
            "--order-by",
            "age desc, name asc",
            "--limit",
            "10",
        ])
        .unwrap();
        let Command::Query(args) = cli.command else {
            panic!("expected query");
        };
        assert_eq!(args.filter.as_deref(), Some(r#"{"id":1234}"#));
        assert_eq!(args.order_by.as_deref(), Some("age desc, name asc"));
        assert_eq!(args.limit, 10);
    }

    #[test]
    fn test_cli_list_without_path() {
        let cli = Cli::try_parse_from(["docq", "list"]).unwrap();
        assert_eq!(cli.command, Command::List(ListArgs::default()));
    }

    #[test]
    fn test_cli_delete_yes() {
        let cli = Cli::try_parse_from(["docq", "delete", "users", "-y"]).unwrap();
        assert_eq!(
            cli.command,
            Command::Delete {
                path: "users".to_string(),
                field: None,
                yes: true,
            }
        );
    }

    #[test]
    fn test_cli_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from([
            "docq",
            "count",
            "users",
            "--store",
            "/tmp/s.json",
            "--raw",
            "--spacing",
            "4",
        ])
        .unwrap();
        assert_eq!(cli.store, Some(PathBuf::from("/tmp/s.json")));
        assert!(cli.raw);
        assert_eq!(cli.spacing, Some(4));
        assert!(cli.pretty.is_none());
    }

    #[test]
    fn test_cli_pretty_values() {
        let cli = Cli::try_parse_from(["docq", "--pretty", "count", "users"]).unwrap();
        assert_eq!(cli.pretty, Some(true));
        let cli = Cli::try_parse_from(["docq", "--pretty=false", "count", "users"]).unwrap();
        assert_eq!(cli.pretty, Some(false));
    }

    #[test]
    fn test_cli_unknown_flag() {
        assert!(Cli::try_parse_from(["docq", "count", "users", "--verbose"]).is_err());
    }

    #[test]
    fn test_cli_bad_limit() {
        assert!(Cli::try_parse_from(["docq", "get", "users", "--limit", "ten"]).is_err());
    }

    // ---- run tests ----

    fn cli(dir: &tempfile::TempDir, args: &[&str]) -> Cli {
        let store = dir.path().join("store.json");
        let config = dir.path().join("config.toml");
        if !config.exists() {
            std::fs::write(&config, "").unwrap();
        }
        let mut argv = vec![
            "docq".to_string(),
            "--store".to_string(),
            store.display().to_string(),
            "--config".to_string(),
            config.display().to_string(),
        ];
        argv.extend(args.iter().map(|s| s.to_string()));
        Cli::try_parse_from(argv).unwrap()
    }

    #[test]
    fn test_run_persists_between_invocations() {
        let dir = tempfile::tempdir().unwrap();
        let mut input = ScriptedInput::default();

        run(
            cli(&dir, &["set", "users/alice", r#"{"name":"Alice","age":30}"#]),
            &mut input,
        )
        .unwrap();
        run(cli(&dir, &["get", "users/alice", "name"]), &mut input).unwrap();

        let store = LocalStore::open(dir.path().join("store.json")).unwrap();
        let doc = docq_core::store::Store::get(
            &store,
            &docq_core::path::DocPath::parse("users/alice").unwrap(),
        )
        .unwrap()
        .unwrap();
        assert_eq!(doc.data["age"], 30);
    }

    #[test]
    fn test_run_reports_errors() {
        let dir = tempfile::tempdir().unwrap();
        let mut input = ScriptedInput::default();
        let err = run(cli(&dir, &["get", "users/zed"]), &mut input).unwrap_err();
        assert_eq!(err.to_string(), "not found: users/zed");

        let err = run(cli(&dir, &["query", "users", r#"{"a":{"~":1}}"#]), &mut input).unwrap_err();
        assert!(err.to_string().contains("unknown field operator '~'"));
    }

    #[test]
    fn test_run_missing_config_file() {
        let dir = tempfile::tempdir().unwrap();
        let cli = Cli::try_parse_from([
            "docq".to_string(),
            "--config".to_string(),
            dir.path().join("missing.toml").display().to_string(),
            "list".to_string(),
        ])
        .unwrap();
        let err = run(cli, &mut ScriptedInput::default()).unwrap_err();
        assert!(matches!(err, ConsoleError::ConfigRead { .. }));
    }

    #[test]
    fn test_run_backup_from_config() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("config.toml"),
            "[backup]\ncollection = \"audit\"\ncommands = [\"set\"]\n",
        )
        .unwrap();
        let mut input = ScriptedInput::default();
        run(cli(&dir, &["set", "users/alice", r#"{"a":1}"#]), &mut input).unwrap();

        let store = LocalStore::open(dir.path().join("store.json")).unwrap();
        let names = docq_core::store::Store::collections(&store, None).unwrap();
        assert_eq!(names, vec!["audit", "users"]);
    }
}
