//! Purpose: `basalt` CLI entry point and shared command helpers.
//! Exports: None (binary crate).
//! Role: Parse arguments, resolve project config, dispatch, and render output and errors.
//! Invariants: Successful output goes to stdout; diagnostics go to stderr.
//! Invariants: Errors are JSON on non-TTY stderr and human text on a TTY.
//! Invariants: Process exit codes come from `to_exit_code`.
#![allow(clippy::result_large_err)]

use std::error::Error as StdError;
use std::io::{self, IsTerminal, Read};
use std::path::{Path, PathBuf};

use basalt::api::{
    ClientConfig, ENV_API_KEY, ENV_URL, Error, ErrorKind, Map, QuerySpec, RestClient, Value,
    to_exit_code,
};
use basalt::core::encode::{encode, encode_pretty};
use clap::error::ErrorKind as ClapErrorKind;
use clap::{Args, CommandFactory, Parser, Subcommand, ValueHint};
use clap_complete::aot::Shell;
use tracing_subscriber::EnvFilter;

mod command_dispatch;

#[derive(Copy, Clone, Debug)]
struct RunOutcome {
    exit_code: i32,
}

impl RunOutcome {
    fn ok() -> Self {
        Self { exit_code: 0 }
    }

    fn with_code(exit_code: i32) -> Self {
        Self { exit_code }
    }
}

fn main() {
    init_tracing();
    let exit_code = match run() {
        Ok(outcome) => outcome.exit_code,
        Err(err) => {
            emit_error(&err);
            to_exit_code(err.kind())
        }
    };
    std::process::exit(exit_code);
}

fn run() -> Result<RunOutcome, Error> {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => match err.kind() {
            ClapErrorKind::DisplayHelp
            | ClapErrorKind::DisplayVersion
            | ClapErrorKind::DisplayHelpOnMissingArgumentOrSubcommand => {
                err.print().map_err(|io_err| {
                    Error::new(ErrorKind::Io)
                        .with_message("failed to write help")
                        .with_source(io_err)
                })?;
                let exit_code = if matches!(
                    err.kind(),
                    ClapErrorKind::DisplayHelpOnMissingArgumentOrSubcommand
                ) {
                    2
                } else {
                    0
                };
                return Ok(RunOutcome::with_code(exit_code));
            }
            _ => {
                return Err(Error::new(ErrorKind::Usage)
                    .with_message(clap_error_summary(&err))
                    .with_hint("Try `basalt --help`."));
            }
        },
    };

    command_dispatch::dispatch_command(cli.command, &cli.project)
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_writer(io::stderr)
        .try_init();
}

#[derive(Parser)]
#[command(
    name = "basalt",
    version,
    about = "JSON codec and PostgREST query tooling for backend-as-a-service projects",
    long_about = None,
    after_help = r#"EXAMPLES
  $ echo '{"id":1,"tags":["a"]}' | basalt decode --pretty
  $ basalt extract access_token token.json
  $ basalt query --select id,name --filter 'status=eq.active' --order created_at --desc --limit 10
  $ BASALT_URL=https://demo.example.co BASALT_API_KEY=... basalt select items --filter id=eq.5

CONFIGURATION
  BASALT_URL, BASALT_API_KEY, BASALT_ACCESS_TOKEN, BASALT_SCHEMA, BASALT_TIMEOUT_MS
  or --config <file> with {"url": "...", "api_key": "..."}"#,
    arg_required_else_help = true
)]
struct Cli {
    #[command(flatten)]
    project: ProjectArgs,

    #[command(subcommand)]
    command: Command,
}

#[derive(Args, Debug, Default)]
struct ProjectArgs {
    #[arg(long, global = true, help = "Project URL (overrides BASALT_URL)", value_hint = ValueHint::Url)]
    url: Option<String>,
    #[arg(long = "api-key", global = true, help = "Project API key (overrides BASALT_API_KEY)")]
    api_key: Option<String>,
    #[arg(
        long,
        global = true,
        help = "JSON config file with url, api_key and optional settings",
        value_hint = ValueHint::FilePath
    )]
    config: Option<PathBuf>,
    #[arg(
        long = "tls-ca",
        global = true,
        help = "PEM file with extra CA certificates for the project endpoint",
        value_hint = ValueHint::FilePath
    )]
    tls_ca: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Command {
    #[command(about = "Decode JSON from FILE or stdin and print it in canonical form")]
    Decode {
        #[arg(help = "Input file (default: stdin)", value_hint = ValueHint::FilePath)]
        file: Option<PathBuf>,
        #[arg(long, help = "Indent the output")]
        pretty: bool,
    },
    #[command(about = "Print the first value stored under a property name (legacy accessor)")]
    Extract {
        #[arg(help = "Property name")]
        name: String,
        #[arg(help = "Input file (default: stdin)", value_hint = ValueHint::FilePath)]
        file: Option<PathBuf>,
    },
    #[command(about = "Print each top-level object of the first array, one per line")]
    Elements {
        #[arg(help = "Input file (default: stdin)", value_hint = ValueHint::FilePath)]
        file: Option<PathBuf>,
    },
    #[command(about = "Build PostgREST query parameters, or a full table URL with --table")]
    Query {
        #[arg(long, help = "Table name; prints the request URL for the configured project")]
        table: Option<String>,
        #[command(flatten)]
        query: QueryArgs,
    },
    #[command(about = "Read rows from a table")]
    Select {
        #[arg(help = "Table name")]
        table: String,
        #[command(flatten)]
        query: QueryArgs,
    },
    #[command(about = "Insert one object or an array of objects into a table")]
    Insert {
        #[arg(help = "Table name")]
        table: String,
        #[arg(help = "Row JSON (object or array of objects); `-` reads stdin")]
        json: String,
        #[arg(long, help = "Ask the backend to return the inserted rows")]
        representation: bool,
    },
    #[command(about = "Generate shell completion scripts")]
    Completion {
        #[arg(help = "Shell to generate completions for")]
        shell: Shell,
    },
    #[command(about = "Print version information")]
    Version,
}

#[derive(Args, Debug, Default)]
struct QueryArgs {
    #[arg(long, value_delimiter = ',', help = "Columns to return (comma-separated)")]
    select: Vec<String>,
    #[arg(long = "filter", help = "Filter as column=expression, e.g. id=eq.5 (repeatable)")]
    filters: Vec<String>,
    #[arg(long, help = "Column to order by")]
    order: Option<String>,
    #[arg(long, conflicts_with = "desc", help = "Order ascending")]
    asc: bool,
    #[arg(long, help = "Order descending")]
    desc: bool,
    #[arg(long, help = "Maximum number of rows")]
    limit: Option<u64>,
    #[arg(long, help = "Rows to skip")]
    offset: Option<u64>,
    #[arg(long, help = "Ask the backend to echo affected rows")]
    representation: bool,
}

impl QueryArgs {
    fn to_spec(&self) -> Result<QuerySpec, Error> {
        let mut spec = QuerySpec::new().select(self.select.iter().map(|column| column.trim()));
        for raw in &self.filters {
            let (column, expression) = parse_filter(raw)?;
            spec = spec.filter(column, expression);
        }
        if let Some(column) = &self.order {
            spec = spec.order_by(column.as_str());
            if self.asc || self.desc {
                spec = spec.ascending(self.asc);
            }
        } else if self.asc || self.desc {
            return Err(Error::new(ErrorKind::Usage)
                .with_message("--asc/--desc require --order")
                .with_hint("Pass the column to sort on, e.g. `--order created_at --desc`."));
        }
        if let Some(limit) = self.limit {
            spec = spec.limit(limit);
        }
        if let Some(offset) = self.offset {
            spec = spec.offset(offset);
        }
        Ok(spec.return_representation(self.representation))
    }
}

fn parse_filter(raw: &str) -> Result<(&str, &str), Error> {
    match raw.split_once('=') {
        Some((column, expression)) if !column.trim().is_empty() && !expression.is_empty() => {
            Ok((column.trim(), expression))
        }
        _ => Err(Error::new(ErrorKind::Usage)
            .with_message(format!("invalid filter `{raw}`"))
            .with_hint("Use column=expression, e.g. `--filter id=eq.5`.")),
    }
}

fn resolve_config(project: &ProjectArgs) -> Result<ClientConfig, Error> {
    if let Some(path) = &project.config {
        if project.url.is_some() || project.api_key.is_some() {
            return Err(Error::new(ErrorKind::Usage)
                .with_message("--config cannot be combined with --url or --api-key")
                .with_hint("Put the url and api_key in the config file, or drop --config."));
        }
        return ClientConfig::from_file(path);
    }
    ClientConfig::from_lookup(|key| match key {
        ENV_URL if project.url.is_some() => project.url.clone(),
        ENV_API_KEY if project.api_key.is_some() => project.api_key.clone(),
        _ => std::env::var(key).ok(),
    })
}

fn connect(project: &ProjectArgs) -> Result<RestClient, Error> {
    let client = RestClient::new(resolve_config(project)?)?;
    match &project.tls_ca {
        Some(path) => client.with_tls_ca_file(path),
        None => Ok(client),
    }
}

fn read_input(file: Option<&Path>) -> Result<String, Error> {
    match file {
        Some(path) => std::fs::read_to_string(path).map_err(|err| {
            let kind = if err.kind() == io::ErrorKind::NotFound {
                ErrorKind::NotFound
            } else {
                ErrorKind::Io
            };
            Error::new(kind)
                .with_message(format!("failed to read {}", path.display()))
                .with_source(err)
        }),
        None => {
            let mut text = String::new();
            io::stdin().read_to_string(&mut text).map_err(|err| {
                Error::new(ErrorKind::Io)
                    .with_message("failed to read stdin")
                    .with_source(err)
            })?;
            Ok(text)
        }
    }
}

/// Compact JSON off a TTY, indented on one.
fn emit_value(value: &Value) -> Result<(), Error> {
    let text = if io::stdout().is_terminal() {
        encode_pretty(value)?
    } else {
        encode(value)?
    };
    println!("{text}");
    Ok(())
}

fn emit_version_output() -> Result<(), Error> {
    if io::stdout().is_terminal() {
        println!("basalt {}", env!("CARGO_PKG_VERSION"));
        return Ok(());
    }
    let value = Value::from(
        Map::new()
            .with("name", "basalt")
            .with("version", env!("CARGO_PKG_VERSION")),
    );
    println!("{}", encode(&value)?);
    Ok(())
}

fn emit_error(err: &Error) {
    if io::stderr().is_terminal() {
        eprintln!("{}", error_text(err));
        return;
    }
    let json = encode(&error_json(err)).unwrap_or_else(|_| {
        "{\"error\":{\"kind\":\"Internal\",\"message\":\"json encode failed\"}}".to_string()
    });
    eprintln!("{json}");
}

fn error_message(err: &Error) -> String {
    if let Some(message) = err.message() {
        return message.to_string();
    }
    match err.kind() {
        ErrorKind::Internal => "internal error",
        ErrorKind::Usage => "usage error",
        ErrorKind::NotFound => "not found",
        ErrorKind::Conflict => "conflict",
        ErrorKind::Permission => "permission denied",
        ErrorKind::Decode => "invalid json",
        ErrorKind::Encode => "value cannot be encoded",
        ErrorKind::Remote => "remote error",
        ErrorKind::Io => "i/o error",
    }
    .to_string()
}

fn error_causes(err: &Error) -> Vec<String> {
    let mut causes = Vec::new();
    let mut cur = err.source();
    while let Some(source) = cur {
        causes.push(source.to_string());
        cur = source.source();
    }
    causes
}

fn error_json(err: &Error) -> Value {
    let mut inner = Map::new();
    inner.insert("kind", format!("{:?}", err.kind()));
    inner.insert("message", error_message(err));
    if let Some(hint) = err.hint() {
        inner.insert("hint", hint);
    }
    if let Some(status) = err.status() {
        inner.insert("status", u64::from(status));
    }
    if let Some(code) = err.code() {
        inner.insert("code", code);
    }
    if let Some(offset) = err.offset() {
        inner.insert("offset", offset as u64);
    }
    let causes = error_causes(err);
    if !causes.is_empty() {
        let causes: Vec<Value> = causes.into_iter().map(Value::from).collect();
        inner.insert("causes", causes);
    }
    Value::from(Map::new().with("error", inner))
}

fn error_text(err: &Error) -> String {
    let mut lines = vec![format!("error: {}", error_message(err))];
    if let Some(hint) = err.hint() {
        lines.push(format!("hint: {hint}"));
    }
    if let Some(status) = err.status() {
        match err.code() {
            Some(code) => lines.push(format!("status: {status} (code {code})")),
            None => lines.push(format!("status: {status}")),
        }
    }
    if let Some(offset) = err.offset() {
        lines.push(format!("offset: {offset}"));
    }
    for cause in error_causes(err) {
        lines.push(format!("caused by: {cause}"));
    }
    lines.join("\n")
}

fn clap_error_summary(err: &clap::Error) -> String {
    for line in err.to_string().lines() {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        if let Some(rest) = trimmed.strip_prefix("error:") {
            return rest.trim().to_string();
        }
        return trimmed.to_string();
    }
    "invalid arguments".to_string()
}
