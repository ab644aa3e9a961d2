//! # CLI - ChunkStore Interactive Shell
//!
//! A REPL-style command-line interface over a file-backed table store with
//! the chunking codec in front of it. Reads commands from stdin, executes
//! them, and prints results to stdout. Logs go to stderr, so piping commands
//! through stdin gives a clean response stream for scripted testing.
//!
//! ## Commands
//!
//! ```text
//! PUT pk rk field <json>      Set one field to a JSON value
//! LOAD pk rk field <path>     Set one field to the JSON text of a file
//! SET pk rk name <value>      Set a scalar (JSON literal, else a string)
//! GET pk rk [field]           Print the decoded record or one field
//! ENTITY pk rk                Print the stored property layout
//! DEL pk rk                   Delete a record
//! STATS                       Print store configuration and entity count
//! EXIT / QUIT                 Shut down
//! ```
//!
//! Field writes merge into the existing record: it is read, the field is
//! set, and the whole record is written back.
//!
//! ## Configuration
//!
//! ```text
//! CHUNKSTORE_DATA_DIR   entity directory  (default: "data/entities")
//! RUST_LOG              log filter        (default: "warn")
//! ```
//!
//! plus the `CHUNKSTORE_*` thresholds read by `config`.
//!
//! ## Example
//!
//! ```text
//! $ cargo run -p cli
//! ChunkStore started (data_dir=data/entities, property_limit=50000, part_size=40000, max_chunks=200, compress_at=100000)
//! > LOAD tenant-1 2024-05-01 metrics report.json
//! OK metrics=183204B compressed->120388B in 4 parts
//! > GET tenant-1 2024-05-01 status
//! (nil)
//! > EXIT
//! bye
//! ```

use anyhow::Result;
use config::{CodecConfig, StoreLimits};
use engine::{AssessmentStore, ChunkedStore, DecodedRecord, Document, FieldIssue, Record, WriteReport};
use serde_json::Value;
use std::io::{self, BufRead, Write};
use store::FileTableStore;

type Store = ChunkedStore<FileTableStore>;

/// Reads a configuration value from the environment, falling back to `default`.
fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

/// What the REPL does after a command.
#[derive(Debug, PartialEq)]
enum Step {
    Print(String),
    Exit,
}

/// Splits off the first whitespace-delimited word; the rest keeps its
/// original spacing.
fn next_word(s: &str) -> Option<(&str, &str)> {
    let s = s.trim_start();
    if s.is_empty() {
        return None;
    }
    let end = s.find(char::is_whitespace).unwrap_or(s.len());
    Some((&s[..end], &s[end..]))
}

/// `pk rk <rest>`
fn keys(args: &str) -> Option<(&str, &str, &str)> {
    let (pk, rest) = next_word(args)?;
    let (rk, rest) = next_word(rest)?;
    Some((pk, rk, rest))
}

/// `pk rk name <payload>`, payload required.
fn field_args(args: &str) -> Option<(&str, &str, &str, &str)> {
    let (pk, rk, rest) = keys(args)?;
    let (name, payload) = next_word(rest)?;
    let payload = payload.trim();
    if payload.is_empty() {
        None
    } else {
        Some((pk, rk, name, payload))
    }
}

fn into_record(decoded: DecodedRecord) -> Record {
    let mut record = Record::new(decoded.partition_key, decoded.row_key);
    for (name, value) in decoded.fields {
        record.set(name, value);
    }
    record
}

/// Reads, sets one field, writes back. Creates the record if it is new.
fn write_field(store: &mut Store, pk: &str, rk: &str, name: &str, doc: Document) -> Result<WriteReport> {
    let (mut record, exists) = match store.read(pk, rk) {
        Ok(existing) => (into_record(existing), true),
        Err(e) if e.is_not_found() => (Record::new(pk, rk), false),
        Err(e) => return Err(e.into()),
    };
    record.set(name, doc);

    let report = if exists {
        store.replace(&record)?
    } else {
        store.create(&record)?
    };
    Ok(report)
}

fn describe(report: &WriteReport) -> String {
    let mut out = vec!["OK".to_string()];
    for f in &report.fields {
        let mut s = format!("{}={}B", f.name, f.serialized_bytes);
        if f.compressed {
            s.push_str(&format!(" compressed->{}B", f.stored_bytes));
        }
        if f.chunked {
            s.push_str(&format!(" in {} parts", f.parts));
        }
        if f.degraded {
            s.push_str(&format!(" degraded->{}B", f.stored_bytes));
        }
        out.push(s);
    }
    if report.round_trips > 1 {
        out.push(format!("(retried, {} round trips)", report.round_trips));
    }
    out.join(" ")
}

fn describe_issue(issue: &FieldIssue) -> String {
    match issue {
        FieldIssue::MissingChunks {
            field,
            expected,
            missing_count,
            missing,
        } => format!(
            "WARN {}: {} of {} chunk parts missing, first {:?}",
            field, missing_count, expected, missing
        ),
        FieldIssue::ParseFailed { field, error } => {
            format!("WARN {}: stored text is not valid JSON ({})", field, error)
        }
    }
}

fn get(store: &Store, pk: &str, rk: &str, field: Option<&str>) -> Result<String> {
    let decoded = match store.read(pk, rk) {
        Ok(d) => d,
        Err(e) if e.is_not_found() => return Ok("(nil)".to_string()),
        Err(e) => return Err(e.into()),
    };

    let mut lines: Vec<String> = decoded.issues.iter().map(describe_issue).collect();
    match field {
        Some(name) => match decoded.get(name) {
            Some(v) => lines.push(v.to_string()),
            None => lines.push("(nil)".to_string()),
        },
        None => lines.push(serde_json::to_string(&decoded.fields)?),
    }
    Ok(lines.join("\n"))
}

fn entity(store: &Store, pk: &str, rk: &str) -> Result<String> {
    let entity = match store.read_entity(pk, rk) {
        Ok(e) => e,
        Err(e) if e.is_not_found() => return Ok("(nil)".to_string()),
        Err(e) => return Err(e.into()),
    };
    let mut lines: Vec<String> = entity
        .iter()
        .map(|(name, value)| format!("{} ({} bytes)", name, value.size_bytes()))
        .collect();
    lines.push(format!(
        "({} properties, {} bytes)",
        entity.property_count(),
        entity.approx_size()
    ));
    Ok(lines.join("\n"))
}

fn stats(store: &Store) -> String {
    let count = match store.gateway().entity_count() {
        Ok(n) => n.to_string(),
        Err(e) => format!("unknown ({})", e),
    };
    format!("{:?}\nentities: {}", store, count)
}

fn execute(store: &mut Store, line: &str) -> Step {
    let Some((cmd, args)) = next_word(line) else {
        return Step::Print(String::new());
    };

    let out = match cmd.to_uppercase().as_str() {
        "PUT" => match field_args(args) {
            Some((pk, rk, name, json)) => match serde_json::from_str::<Value>(json) {
                Ok(v) => match write_field(store, pk, rk, name, Document::Json(v)) {
                    Ok(report) => describe(&report),
                    Err(e) => format!("ERR write failed: {}", e),
                },
                Err(e) => format!("ERR invalid JSON: {}", e),
            },
            None => "ERR usage: PUT pk rk field <json>".to_string(),
        },
        "LOAD" => match field_args(args) {
            Some((pk, rk, name, path)) => match std::fs::read_to_string(path) {
                Ok(text) => match write_field(store, pk, rk, name, Document::Text(text)) {
                    Ok(report) => describe(&report),
                    Err(e) => format!("ERR write failed: {}", e),
                },
                Err(e) => format!("ERR cannot read {}: {}", path, e),
            },
            None => "ERR usage: LOAD pk rk field <path>".to_string(),
        },
        "SET" => match field_args(args) {
            Some((pk, rk, name, raw)) => {
                let value = serde_json::from_str::<Value>(raw).unwrap_or_else(|_| Value::String(raw.to_string()));
                match write_field(store, pk, rk, name, Document::Json(value)) {
                    Ok(report) => describe(&report),
                    Err(e) => format!("ERR write failed: {}", e),
                }
            }
            None => "ERR usage: SET pk rk name <value>".to_string(),
        },
        "GET" => match keys(args) {
            Some((pk, rk, rest)) => {
                let field = next_word(rest).map(|(f, _)| f);
                get(store, pk, rk, field).unwrap_or_else(|e| format!("ERR read failed: {}", e))
            }
            None => "ERR usage: GET pk rk [field]".to_string(),
        },
        "ENTITY" => match keys(args) {
            Some((pk, rk, _)) => entity(store, pk, rk).unwrap_or_else(|e| format!("ERR read failed: {}", e)),
            None => "ERR usage: ENTITY pk rk".to_string(),
        },
        "DEL" => match keys(args) {
            Some((pk, rk, _)) => match store.delete(pk, rk) {
                Ok(()) => "OK".to_string(),
                Err(e) if e.is_not_found() => "(nil)".to_string(),
                Err(e) => format!("ERR del failed: {}", e),
            },
            None => "ERR usage: DEL pk rk".to_string(),
        },
        "STATS" => stats(store),
        "EXIT" | "QUIT" => return Step::Exit,
        other => format!("unknown command: {}", other),
    };
    Step::Print(out)
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn"))
        .target(env_logger::Target::Stderr)
        .init();

    let data_dir = env_or("CHUNKSTORE_DATA_DIR", "data/entities");
    let config = CodecConfig::from_env();
    let limits = StoreLimits::from_env();
    limits.validate()?;

    let gateway = FileTableStore::open(&data_dir, limits)?;
    let mut store = ChunkedStore::assessments(gateway, config)?;
    log::info!("store opened at {} with {:?}", data_dir, limits);

    println!(
        "ChunkStore started (data_dir={}, property_limit={}, part_size={}, max_chunks={}, compress_at={})",
        data_dir,
        config.max_property_bytes,
        config.max_part_bytes,
        config.max_chunk_count,
        config.compression_threshold
    );
    println!("Commands: PUT pk rk field json | LOAD pk rk field path | SET pk rk name value");
    println!("          GET pk rk [field] | ENTITY pk rk | DEL pk rk | STATS | EXIT");
    print!("> ");
    io::stdout().flush().ok();

    let stdin = io::stdin();

    for line in stdin.lock().lines() {
        let line = line?;
        match execute(&mut store, &line) {
            Step::Print(out) => {
                if !out.is_empty() {
                    println!("{}", out);
                }
            }
            Step::Exit => {
                println!("bye");
                break;
            }
        }

        print!("> ");
        io::stdout().flush().ok();
    }

    Ok(())
}
