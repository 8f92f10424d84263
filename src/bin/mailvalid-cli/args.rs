use std::time::Duration;

use clap::Parser;
use mailvalid_lib::ValidationOptions;

#[derive(Parser, Debug)]
#[command(name = "mailvalid-cli", version, about = "Validate email addresses")]
pub struct Cli {
    /// address to validate; reads one address per line from stdin when omitted
    pub email: Option<String>,

    /// format: human|json|ndjson|csv
    #[arg(long, default_value = "human")]
    pub format: String,

    /// write report to file (JSON/NDJSON/CSV according to --format)
    #[arg(long)]
    pub out: Option<String>,

    /// refuse internationalized local parts
    #[arg(long)]
    pub no_smtputf8: bool,

    #[arg(long)]
    pub allow_empty_local: bool,

    /// accept "quoted strings" before the @-sign
    #[arg(long)]
    pub allow_quoted_local: bool,

    /// accept [IPv4] and [IPv6:...] after the @-sign
    #[arg(long)]
    pub allow_domain_literal: bool,

    /// accept `Display Name <address>`
    #[arg(long)]
    pub allow_display_name: bool,

    /// syntax only, no DNS queries
    #[arg(long)]
    pub no_deliverability: bool,

    /// accept the `test` domain and skip DNS queries
    #[arg(long)]
    pub test_environment: bool,

    /// accept domains without a period or a letter TLD
    #[arg(long)]
    pub not_globally_deliverable: bool,

    /// reject `::` standing for a single zero group in IPv6 literals
    #[arg(long = "strict-ipv6")]
    pub strict_ipv6: bool,

    /// allowed top-level domain (repeatable)
    #[arg(long = "tld")]
    pub tlds: Vec<String>,

    /// DNS timeout in seconds
    #[arg(long, default_value_t = 15)]
    pub timeout: u64,
}

impl Cli {
    pub fn parse() -> Self {
        <Self as Parser>::parse()
    }

    pub fn options(&self) -> ValidationOptions {
        let mut options = ValidationOptions::default()
            .with_smtputf8(!self.no_smtputf8)
            .with_empty_local(self.allow_empty_local)
            .with_quoted_local(self.allow_quoted_local)
            .with_domain_literal(self.allow_domain_literal)
            .with_display_name(self.allow_display_name)
            .with_test_environment(self.test_environment)
            .with_globally_deliverable(!self.not_globally_deliverable)
            .with_strict_ipv6_compression(self.strict_ipv6)
            .with_timeout(Duration::from_secs(self.timeout));
        if self.no_deliverability {
            options = options.with_deliverability(false);
        }
        if !self.tlds.is_empty() {
            options = options.with_allowed_top_level_domains(self.tlds.iter().cloned());
        }
        options
    }
}
