//! Email address syntax validation and normalization.
//!
//! [`validate_email`] splits the input, validates the local part and the
//! domain (name or bracketed literal), assembles the normalized and ASCII
//! forms, checks the overall length and optionally the DNS deliverability.

mod chars;
mod domain;
mod error;
mod idna_codec;
mod length;
mod literal;
mod local;
mod safety;
mod split;
mod types;

pub use chars::{DNS_LABEL_LENGTH_LIMIT, DOMAIN_MAX_LENGTH, EMAIL_MAX_LENGTH, LOCAL_PART_MAX_LENGTH};
pub use error::{
    CharList, DomainLengthExcess, DotAtomViolation, EmailError, IdnaError, LiteralIssue,
    Separator, SyntaxError, TotalLengthExcess,
};
pub use safety::{check_unsafe_chars, is_unsafe, safe_character_display};
pub use types::{ValidatedEmail, ValidationOptions};

use std::net::IpAddr;
use std::time::Duration;

use crate::deliverability::{
    Deliverability, DnsResolver, UndeliverableError, check_deliverability,
};
use chars::CASE_INSENSITIVE_MAILBOX_NAMES;
use domain::{DomainPolicy, validate_domain_name};
use length::check_total_length;
use literal::validate_domain_literal;
use local::validate_local_part;
use split::split_email;
use types::LocalPartInfo;

/// Validate `email` and return its normalized forms.
///
/// Syntax problems come back as [`EmailError::Syntax`] and never touch the
/// network. When `options.check_deliverability` is set (and this is not a
/// test environment or a domain literal) the domain is then checked in DNS,
/// and failures come back as [`EmailError::Undeliverable`].
pub fn validate_email(email: &str, options: &ValidationOptions) -> Result<ValidatedEmail, EmailError> {
    let result = validate(email, options);
    #[cfg(feature = "with-tracing")]
    if let Err(err) = &result {
        tracing::debug!(email, error = %err, "address rejected");
    }
    result
}

fn validate(email: &str, options: &ValidationOptions) -> Result<ValidatedEmail, EmailError> {
    let split = split_email(email)?;
    trace_event!(
        addr_spec = split.addr_spec,
        display_name = ?split.display_name,
        quoted = split.local.is_quoted(),
        "address split"
    );
    if split.angle_brackets && !options.allow_display_name {
        return Err(SyntaxError::DisplayNameNotAllowed.into());
    }

    let quoted = split.local.is_quoted();
    let mut local = validate_local_part(
        split.local.content(),
        options.allow_smtputf8,
        options.allow_empty_local,
        quoted,
    )?;
    if quoted && !options.allow_quoted_local {
        return Err(SyntaxError::QuotedLocalPartNotAllowed.into());
    }
    fold_reserved_mailbox(&mut local);

    let (domain, ascii_domain, domain_address) = resolve_domain(split.domain, options)?;

    let normalized = format!("{}@{domain}", local.local_part);
    let wire_domain = ascii_domain.as_deref().unwrap_or(&domain);
    let ascii_email = local
        .ascii_local_part
        .as_ref()
        .map(|ascii_local| format!("{ascii_local}@{wire_domain}"));
    let ascii_form = format!(
        "{}@{wire_domain}",
        local.ascii_local_part.as_deref().unwrap_or(&local.local_part)
    );
    check_total_length(split.addr_spec, &normalized, &ascii_form)?;

    let mut validated = ValidatedEmail {
        original: email.to_string(),
        display_name: split.display_name,
        local_part: local.local_part,
        ascii_local_part: local.ascii_local_part,
        domain,
        ascii_domain,
        domain_address,
        normalized,
        ascii_email,
        smtputf8: local.smtputf8,
        mx: None,
        mx_fallback_type: None,
        spf: None,
        unknown_deliverability: None,
    };

    if options.check_deliverability && !options.test_environment {
        if let Some(ascii_domain) = validated.ascii_domain.as_deref() {
            let outcome = match &options.dns_resolver {
                Some(resolver) => check_deliverability(resolver, ascii_domain, &validated.domain)?,
                None => {
                    let resolver = default_resolver(options.timeout)?;
                    check_deliverability(&resolver, ascii_domain, &validated.domain)?
                }
            };
            match outcome {
                Deliverability::Confirmed(info) => {
                    validated.mx = Some(info.mx);
                    validated.mx_fallback_type = info.mx_fallback_type;
                    validated.spf = info.spf;
                }
                Deliverability::Unknown(reason) => {
                    validated.unknown_deliverability = Some(reason);
                }
            }
        }
    }

    Ok(validated)
}

/// Like [`validate_email`] for raw bytes, which must be ASCII. Non-ASCII
/// mail addresses have to arrive as decoded text.
pub fn validate_email_bytes(
    email: &[u8],
    options: &ValidationOptions,
) -> Result<ValidatedEmail, EmailError> {
    if !email.is_ascii() {
        return Err(SyntaxError::NotAscii.into());
    }
    let text = std::str::from_utf8(email).map_err(|_| SyntaxError::NotAscii)?;
    validate_email(text, options)
}

/// RFC 2142 mailbox names are case-insensitive; store them lowercased.
fn fold_reserved_mailbox(local: &mut LocalPartInfo) {
    let Some(ascii) = local.ascii_local_part.as_deref() else {
        return;
    };
    let lower = ascii.to_ascii_lowercase();
    if CASE_INSENSITIVE_MAILBOX_NAMES.contains(lower.as_str()) {
        local.local_part = lower.clone();
        local.ascii_local_part = Some(lower);
    }
}

/// Returns the display domain, the ASCII domain (absent for literals) and
/// the literal's address.
fn resolve_domain(
    domain_part: &str,
    options: &ValidationOptions,
) -> Result<(String, Option<String>, Option<IpAddr>), SyntaxError> {
    if domain_part.is_empty() {
        return Err(SyntaxError::DomainEmpty);
    }

    if let Some(content) = domain_part
        .strip_prefix('[')
        .and_then(|rest| rest.strip_suffix(']'))
    {
        trace_event!(literal = content, "validating domain literal");
        let literal = validate_domain_literal(content, options.strict_ipv6_compression)?;
        if !options.allow_domain_literal {
            return Err(SyntaxError::DomainLiteralNotAllowed);
        }
        return Ok((literal.domain, None, Some(literal.domain_address)));
    }

    trace_event!(domain = domain_part, "validating domain name");
    let info = validate_domain_name(
        domain_part,
        DomainPolicy {
            test_environment: options.test_environment,
            globally_deliverable: options.globally_deliverable,
            allowed_top_level_domains: options.allowed_top_level_domains.as_deref(),
        },
    )?;
    Ok((info.domain, Some(info.ascii_domain), None))
}

#[cfg(feature = "with-dns")]
fn default_resolver(timeout: Duration) -> Result<DnsResolver, UndeliverableError> {
    DnsResolver::caching(timeout).map_err(UndeliverableError::unhandled)
}

#[cfg(not(feature = "with-dns"))]
fn default_resolver(_timeout: Duration) -> Result<DnsResolver, UndeliverableError> {
    Err(UndeliverableError::unhandled(
        crate::deliverability::DnsLookupError::other("no DNS resolver is configured"),
    ))
}

#[cfg(test)]
mod tests;
