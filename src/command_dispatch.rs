//! Purpose: Hold top-level CLI command dispatch for `basalt`.
//! Exports: `dispatch_command`.
//! Role: Keep `main.rs` focused on parse/bootstrap and delegate command execution.
//! Invariants: Local commands (decode, extract, elements, query without --table) never touch the network.
//! Invariants: Helpers in `main.rs` own config resolution and output rendering.

use super::*;
use basalt::core::decode::decode;
use basalt::core::legacy::{extract_array_elements, extract_property};

pub(super) fn dispatch_command(
    command: Command,
    project: &ProjectArgs,
) -> Result<RunOutcome, Error> {
    match command {
        Command::Completion { shell } => {
            let mut cmd = Cli::command();
            clap_complete::aot::generate(shell, &mut cmd, "basalt", &mut io::stdout());
            Ok(RunOutcome::ok())
        }
        Command::Version => {
            emit_version_output()?;
            Ok(RunOutcome::ok())
        }
        Command::Decode { file, pretty } => {
            let text = read_input(file.as_deref())?;
            let value = decode(&text)?;
            let rendered = if pretty {
                encode_pretty(&value)?
            } else {
                encode(&value)?
            };
            println!("{rendered}");
            Ok(RunOutcome::ok())
        }
        Command::Extract { name, file } => {
            let text = read_input(file.as_deref())?;
            match extract_property(&text, &name) {
                Some(value) => {
                    println!("{value}");
                    Ok(RunOutcome::ok())
                }
                None => Err(Error::new(ErrorKind::NotFound)
                    .with_message(format!("property `{name}` not found"))),
            }
        }
        Command::Elements { file } => {
            let text = read_input(file.as_deref())?;
            for element in extract_array_elements(&text) {
                println!("{element}");
            }
            Ok(RunOutcome::ok())
        }
        Command::Query { table, query } => {
            let spec = query.to_spec()?;
            match table {
                Some(table) => {
                    let client = connect(project)?;
                    println!("{}", client.table_url(&table, &spec)?);
                }
                None => {
                    let pairs = spec
                        .build()
                        .iter()
                        .map(|(name, value)| {
                            Value::Array(vec![Value::from(name), Value::from(value)])
                        })
                        .collect();
                    println!("{}", encode(&Value::Array(pairs))?);
                }
            }
            Ok(RunOutcome::ok())
        }
        Command::Select { table, query } => {
            let spec = query.to_spec()?;
            let client = connect(project)?;
            let rows = client.select(&table, &spec)?;
            tracing::debug!(table = table.as_str(), rows = rows.len(), "select finished");
            emit_value(&Value::Array(rows))?;
            Ok(RunOutcome::ok())
        }
        Command::Insert {
            table,
            json,
            representation,
        } => {
            let text = if json == "-" {
                read_input(None)?
            } else {
                json
            };
            let rows = rows_from_input(&text)?;
            let client = connect(project)?;
            let inserted = client.insert(&table, &rows, representation)?;
            emit_value(&Value::Array(inserted))?;
            Ok(RunOutcome::ok())
        }
    }
}

fn rows_from_input(text: &str) -> Result<Vec<Map>, Error> {
    let not_rows = || {
        Error::new(ErrorKind::Usage)
            .with_message("insert expects a JSON object or an array of objects")
    };
    match decode(text)? {
        Value::Object(row) => Ok(vec![row]),
        Value::Array(items) => items
            .into_iter()
            .map(|item| match item {
                Value::Object(row) => Ok(row),
                _ => Err(not_rows()),
            })
            .collect(),
        _ => Err(not_rows()),
    }
}
