mod args;
mod output;

use std::io::{self, BufRead};

use anyhow::{Context, Result};
use mailvalid_lib::validate_email;

use crate::args::Cli;
use crate::output::{OutputRow, Source, any_invalid, write_reports};

fn main() -> Result<()> {
    let cli = Cli::parse();
    #[cfg(feature = "with-tracing")]
    init_tracing();

    let options = cli.options();
    let mut rows: Vec<OutputRow> = Vec::new();

    let source = if let Some(email) = cli.email.as_deref() {
        rows.push(OutputRow::new(email, validate_email(email, &options)));
        Source::Argument
    } else {
        let options = with_shared_resolver(options)?;
        for line in io::stdin().lock().lines() {
            let line = line.context("read stdin")?;
            let email = line.trim_end_matches('\r');
            if email.is_empty() {
                continue;
            }
            rows.push(OutputRow::new(email, validate_email(email, &options)));
        }
        Source::Stdin
    };

    write_reports(&rows, &cli, source)?;

    // exit codes: 0 all valid, 2 some invalid, 1 fatal
    if any_invalid(&rows) {
        std::process::exit(2);
    }
    Ok(())
}

/// Build one caching resolver up front so every line shares its cache.
#[cfg(feature = "with-dns")]
fn with_shared_resolver(
    options: mailvalid_lib::ValidationOptions,
) -> Result<mailvalid_lib::ValidationOptions> {
    if !options.check_deliverability || options.test_environment || options.dns_resolver.is_some() {
        return Ok(options);
    }
    let resolver = mailvalid_lib::DnsResolver::caching(options.timeout)
        .context("configure DNS resolver")?;
    Ok(options.with_resolver(resolver))
}

#[cfg(not(feature = "with-dns"))]
fn with_shared_resolver(
    options: mailvalid_lib::ValidationOptions,
) -> Result<mailvalid_lib::ValidationOptions> {
    Ok(options)
}

#[cfg(feature = "with-tracing")]
fn init_tracing() {
    use tracing_subscriber::EnvFilter;

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();
}
