use std::fmt;
use std::net::IpAddr;
use std::time::Duration;

use crate::deliverability::{DnsResolver, MxFallbackType, MxRecord, UnknownDeliverability};

/// How the part before the @-sign appeared in the input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum AddressPart {
    DottedAtom(String),
    /// Content between the quotes, with backslash escapes already removed.
    QuotedString(String),
}

impl AddressPart {
    pub(crate) fn is_quoted(&self) -> bool {
        matches!(self, Self::QuotedString(_))
    }

    pub(crate) fn content(&self) -> &str {
        match self {
            Self::DottedAtom(s) | Self::QuotedString(s) => s,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct LocalPartInfo {
    pub local_part: String,
    pub ascii_local_part: Option<String>,
    pub smtputf8: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct DomainInfo {
    pub ascii_domain: String,
    pub domain: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct LiteralInfo {
    pub domain_address: IpAddr,
    pub domain: String,
}

/// Knobs for [`validate_email`](crate::validate_email). Build one with
/// [`Default`] and the `with_*` helpers, then reuse it across calls.
#[derive(Debug, Clone)]
pub struct ValidationOptions {
    pub allow_smtputf8: bool,
    pub allow_empty_local: bool,
    pub allow_quoted_local: bool,
    pub allow_domain_literal: bool,
    pub allow_display_name: bool,
    pub check_deliverability: bool,
    /// Accept the `test` special-use domain and skip DNS checks.
    pub test_environment: bool,
    pub globally_deliverable: bool,
    /// Reject `::` standing for a single zero group in IPv6 literals.
    pub strict_ipv6_compression: bool,
    /// Case-insensitive allow-list for the last label of the domain.
    pub allowed_top_level_domains: Option<Vec<String>>,
    pub timeout: Duration,
    /// Resolver used by the deliverability check. A caching system resolver
    /// is built per call when absent.
    pub dns_resolver: Option<DnsResolver>,
}

impl Default for ValidationOptions {
    fn default() -> Self {
        Self {
            allow_smtputf8: true,
            allow_empty_local: false,
            allow_quoted_local: false,
            allow_domain_literal: false,
            allow_display_name: false,
            check_deliverability: cfg!(feature = "with-dns"),
            test_environment: false,
            globally_deliverable: true,
            strict_ipv6_compression: false,
            allowed_top_level_domains: None,
            timeout: Duration::from_secs(15),
            dns_resolver: None,
        }
    }
}

impl ValidationOptions {
    pub fn with_smtputf8(mut self, allow: bool) -> Self {
        self.allow_smtputf8 = allow;
        self
    }

    pub fn with_empty_local(mut self, allow: bool) -> Self {
        self.allow_empty_local = allow;
        self
    }

    pub fn with_quoted_local(mut self, allow: bool) -> Self {
        self.allow_quoted_local = allow;
        self
    }

    pub fn with_domain_literal(mut self, allow: bool) -> Self {
        self.allow_domain_literal = allow;
        self
    }

    pub fn with_display_name(mut self, allow: bool) -> Self {
        self.allow_display_name = allow;
        self
    }

    pub fn with_deliverability(mut self, check: bool) -> Self {
        self.check_deliverability = check;
        self
    }

    pub fn with_test_environment(mut self, enabled: bool) -> Self {
        self.test_environment = enabled;
        self
    }

    pub fn with_globally_deliverable(mut self, required: bool) -> Self {
        self.globally_deliverable = required;
        self
    }

    pub fn with_strict_ipv6_compression(mut self, strict: bool) -> Self {
        self.strict_ipv6_compression = strict;
        self
    }

    pub fn with_allowed_top_level_domains<I, S>(mut self, tlds: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.allowed_top_level_domains = Some(tlds.into_iter().map(Into::into).collect());
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_resolver(mut self, resolver: DnsResolver) -> Self {
        self.dns_resolver = Some(resolver);
        self
    }
}

/// A syntactically valid (and, when checked, deliverable) address in its
/// normalized forms.
#[cfg_attr(feature = "with-serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone)]
pub struct ValidatedEmail {
    /// Input exactly as given.
    pub original: String,
    pub display_name: Option<String>,
    pub local_part: String,
    /// Absent when the local part needs SMTPUTF8.
    pub ascii_local_part: Option<String>,
    /// Unicode domain, or the bracketed literal.
    pub domain: String,
    /// Absent for domain literals.
    pub ascii_domain: Option<String>,
    pub domain_address: Option<IpAddr>,
    pub normalized: String,
    pub ascii_email: Option<String>,
    pub smtputf8: bool,
    #[cfg_attr(feature = "with-serde", serde(default, skip_serializing_if = "Option::is_none"))]
    pub mx: Option<Vec<MxRecord>>,
    #[cfg_attr(feature = "with-serde", serde(default, skip_serializing_if = "Option::is_none"))]
    pub mx_fallback_type: Option<MxFallbackType>,
    #[cfg_attr(feature = "with-serde", serde(default, skip_serializing_if = "Option::is_none"))]
    pub spf: Option<String>,
    #[cfg_attr(feature = "with-serde", serde(default, skip_serializing_if = "Option::is_none"))]
    pub unknown_deliverability: Option<UnknownDeliverability>,
}

impl ValidatedEmail {
    /// Whether the address came with a bracketed IP address after the @-sign.
    pub fn is_domain_literal(&self) -> bool {
        self.domain_address.is_some()
    }
}

impl fmt::Display for ValidatedEmail {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.normalized)
    }
}

fn sorted_mx(mx: &Option<Vec<MxRecord>>) -> Option<Vec<MxRecord>> {
    mx.as_ref().map(|records| {
        let mut records = records.clone();
        records.sort();
        records
    })
}

impl PartialEq for ValidatedEmail {
    fn eq(&self, other: &Self) -> bool {
        self.original == other.original
            && self.display_name == other.display_name
            && self.local_part == other.local_part
            && self.ascii_local_part == other.ascii_local_part
            && self.domain == other.domain
            && self.ascii_domain == other.ascii_domain
            && self.domain_address == other.domain_address
            && self.normalized == other.normalized
            && self.ascii_email == other.ascii_email
            && self.smtputf8 == other.smtputf8
            && sorted_mx(&self.mx) == sorted_mx(&other.mx)
            && self.mx_fallback_type == other.mx_fallback_type
            && self.spf == other.spf
            && self.unknown_deliverability == other.unknown_deliverability
    }
}

impl Eq for ValidatedEmail {}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> ValidatedEmail {
        ValidatedEmail {
            original: "me@example.org".into(),
            display_name: None,
            local_part: "me".into(),
            ascii_local_part: Some("me".into()),
            domain: "example.org".into(),
            ascii_domain: Some("example.org".into()),
            domain_address: None,
            normalized: "me@example.org".into(),
            ascii_email: Some("me@example.org".into()),
            smtputf8: false,
            mx: Some(vec![
                MxRecord::new(10, "a.example.org"),
                MxRecord::new(20, "b.example.org"),
            ]),
            mx_fallback_type: None,
            spf: None,
            unknown_deliverability: None,
        }
    }

    #[test]
    fn equality_ignores_mx_order() {
        let a = sample();
        let mut b = sample();
        if let Some(mx) = b.mx.as_mut() {
            mx.reverse();
        }
        assert_eq!(a, b);

        b.spf = Some("v=spf1 -all".into());
        assert_ne!(a, b);
    }

    #[test]
    fn displays_normalized_form() {
        assert_eq!(sample().to_string(), "me@example.org");
    }

    #[test]
    fn option_builders() {
        let opts = ValidationOptions::default()
            .with_quoted_local(true)
            .with_allowed_top_level_domains(["com", "org"])
            .with_timeout(Duration::from_secs(3));
        assert!(opts.allow_quoted_local);
        assert!(!opts.allow_domain_literal);
        assert_eq!(
            opts.allowed_top_level_domains.as_deref(),
            Some(&["com".to_string(), "org".to_string()][..])
        );
        assert_eq!(opts.timeout, Duration::from_secs(3));
    }
}
