#[cfg(feature = "with-serde")]
use std::path::Path;

#[cfg(feature = "with-serde")]
use anyhow::Context;
use anyhow::{Result, bail};

use crate::args::Cli;
use mailvalid_lib::{EmailError, ValidatedEmail};

/// One input line and what validation made of it.
#[cfg_attr(feature = "with-serde", derive(serde::Serialize))]
pub struct OutputRow {
    pub input: String,
    pub valid: bool,
    #[cfg_attr(feature = "with-serde", serde(skip_serializing_if = "Option::is_none"))]
    pub error: Option<String>,
    #[cfg_attr(feature = "with-serde", serde(flatten))]
    pub email: Option<ValidatedEmail>,
}

impl OutputRow {
    pub fn new(input: &str, result: Result<ValidatedEmail, EmailError>) -> Self {
        match result {
            Ok(email) => Self {
                input: input.to_string(),
                valid: true,
                error: None,
                email: Some(email),
            },
            Err(err) => Self {
                input: input.to_string(),
                valid: false,
                error: Some(err.to_string()),
                email: None,
            },
        }
    }
}

/// How rows were collected, which changes the human format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Source {
    Argument,
    Stdin,
}

pub fn write_reports(rows: &[OutputRow], cli: &Cli, source: Source) -> Result<()> {
    match cli.format.as_str() {
        "human" => {
            for line in human_lines(rows, source) {
                println!("{line}");
            }
            Ok(())
        }
        "json" => write_json(rows, cli),
        "ndjson" => write_ndjson(rows, cli),
        "csv" => write_csv(rows, cli),
        other => bail!("unknown --format '{other}', use: human|json|ndjson|csv"),
    }
}

pub fn any_invalid(rows: &[OutputRow]) -> bool {
    rows.iter().any(|row| !row.valid)
}

/// A full report for a single argument; for stdin only the failures, as
/// `address<TAB>error`.
fn human_lines(rows: &[OutputRow], source: Source) -> Vec<String> {
    let mut lines = Vec::new();
    for row in rows {
        match (&row.email, &row.error, source) {
            (Some(email), _, Source::Argument) => lines.extend(report(email)),
            (Some(_), _, Source::Stdin) => {}
            (None, Some(error), Source::Argument) => {
                lines.push(format!("[INVALID] {} :: {error}", row.input));
            }
            (None, error, Source::Stdin) => {
                lines.push(format!("{}\t{}", row.input, error.as_deref().unwrap_or("")));
            }
            (None, None, Source::Argument) => lines.push(format!("[INVALID] {}", row.input)),
        }
    }
    lines
}

fn report(email: &ValidatedEmail) -> Vec<String> {
    let mut lines = vec![format!("[OK]    {}", email.normalized)];
    let mut field = |name: &str, value: &str| lines.push(format!("        {name}: {value}"));

    if let Some(name) = &email.display_name {
        field("display_name", name);
    }
    field("local_part", &email.local_part);
    field("domain", &email.domain);
    if let Some(ascii) = &email.ascii_domain {
        if ascii != &email.domain {
            field("ascii_domain", ascii);
        }
    }
    if let Some(address) = &email.domain_address {
        field("domain_address", &address.to_string());
    }
    match &email.ascii_email {
        Some(ascii) => field("ascii_email", ascii),
        None => field("ascii_email", "(none, requires SMTPUTF8)"),
    }
    field("smtputf8", if email.smtputf8 { "true" } else { "false" });
    if let Some(mx) = &email.mx {
        let hosts: Vec<String> = mx
            .iter()
            .map(|record| format!("{} {}", record.preference, record.exchange))
            .collect();
        field("mx", &hosts.join(", "));
    }
    if let Some(fallback) = &email.mx_fallback_type {
        field("mx_fallback_type", &fallback.to_string());
    }
    if let Some(spf) = &email.spf {
        field("spf", spf);
    }
    if let Some(unknown) = &email.unknown_deliverability {
        field("deliverability", &format!("unknown ({unknown})"));
    }
    lines
}

/// One document holding every row.
#[cfg(feature = "with-serde")]
fn write_json(rows: &[OutputRow], cli: &Cli) -> Result<()> {
    let mut document = serde_json::to_vec_pretty(rows)?;
    document.push(b'\n');
    emit(cli.out.as_deref(), &document)
}

#[cfg(not(feature = "with-serde"))]
fn write_json(_: &[OutputRow], _: &Cli) -> Result<()> {
    bail!("format=json requires the 'with-serde' feature")
}

/// One JSON object per line, in input order.
#[cfg(feature = "with-serde")]
fn write_ndjson(rows: &[OutputRow], cli: &Cli) -> Result<()> {
    let mut lines = Vec::new();
    for row in rows {
        serde_json::to_writer(&mut lines, row)?;
        lines.push(b'\n');
    }
    emit(cli.out.as_deref(), &lines)
}

#[cfg(not(feature = "with-serde"))]
fn write_ndjson(_: &[OutputRow], _: &Cli) -> Result<()> {
    bail!("format=ndjson requires the 'with-serde' feature")
}

#[cfg(feature = "with-csv")]
const CSV_HEADER: [&str; 9] = [
    "input",
    "valid",
    "normalized",
    "ascii_email",
    "local_part",
    "domain",
    "smtputf8",
    "mx",
    "error",
];

#[cfg(feature = "with-csv")]
fn write_csv(rows: &[OutputRow], cli: &Cli) -> Result<()> {
    let mut wtr = csv::Writer::from_writer(Vec::new());
    wtr.write_record(CSV_HEADER)?;
    for row in rows {
        wtr.write_record(csv_record(row))?;
    }
    let table = wtr.into_inner().context("flush CSV rows")?;
    emit(cli.out.as_deref(), &table)
}

#[cfg(not(feature = "with-csv"))]
fn write_csv(_: &[OutputRow], _: &Cli) -> Result<()> {
    bail!("format=csv requires the 'with-csv' feature")
}

#[cfg(feature = "with-csv")]
fn csv_record(row: &OutputRow) -> Vec<String> {
    let error = row.error.clone().unwrap_or_default();
    let Some(email) = &row.email else {
        let mut record = vec![row.input.clone(), "false".to_string()];
        record.extend(std::iter::repeat_n(String::new(), 6));
        record.push(error);
        return record;
    };

    let mx = email
        .mx
        .as_ref()
        .map(|records| {
            records
                .iter()
                .map(|record| format!("{} {}", record.preference, record.exchange))
                .collect::<Vec<_>>()
                .join("|")
        })
        .unwrap_or_default();

    vec![
        row.input.clone(),
        "true".to_string(),
        email.normalized.clone(),
        email.ascii_email.clone().unwrap_or_default(),
        email.local_part.clone(),
        email.domain.clone(),
        email.smtputf8.to_string(),
        mx,
        error,
    ]
}

/// Rendered report bytes go to `--out` when given, otherwise to stdout.
#[cfg(feature = "with-serde")]
fn emit(out: Option<&str>, bytes: &[u8]) -> Result<()> {
    use std::io::Write;

    match out {
        Some(path) => replace_file(Path::new(path), bytes),
        None => {
            let mut stdout = std::io::stdout().lock();
            stdout.write_all(bytes)?;
            stdout.flush()?;
            Ok(())
        }
    }
}

/// Write to a fresh temporary file next to `path`, then rename it over
/// `path`. Readers see the old report or the new one, never a partial file.
#[cfg(feature = "with-serde")]
fn replace_file(path: &Path, bytes: &[u8]) -> Result<()> {
    use std::io::Write;

    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let mut staged = tempfile::NamedTempFile::new_in(dir)
        .with_context(|| format!("create temporary file in {}", dir.display()))?;
    staged.write_all(bytes)?;
    staged.as_file().sync_all()?;
    staged
        .persist(path)
        .with_context(|| format!("replace {}", path.display()))?;
    Ok(())
}
