use super::chars::{
    DNS_LABEL_LENGTH_LIMIT, DOMAIN_MAX_LENGTH, Side, check_dot_atom, ends_with_letter,
    is_dot_atom_hostname, is_hostname_char, is_reserved_ldh_label, is_special_use_domain,
};
use super::error::{CharList, DomainLengthExcess, SyntaxError};
use super::idna_codec;
use super::safety::check_unsafe_chars;
use super::types::DomainInfo;

/// Policy knobs the domain-name checks depend on.
#[derive(Debug, Clone, Copy)]
pub(crate) struct DomainPolicy<'a> {
    pub test_environment: bool,
    pub globally_deliverable: bool,
    /// Compared case-insensitively against the last label of the ASCII
    /// domain, so internationalized TLDs are given in A-label form.
    pub allowed_top_level_domains: Option<&'a [String]>,
}

/// Validate a domain name (not a bracketed literal) and return its ASCII and
/// canonical Unicode forms.
pub(crate) fn validate_domain_name(
    domain: &str,
    policy: DomainPolicy<'_>,
) -> Result<DomainInfo, SyntaxError> {
    if domain.is_empty() {
        return Err(SyntaxError::DomainEmpty);
    }

    check_hostname_chars(domain, false)?;
    check_unsafe_chars(domain, false)?;

    let remapped = idna_codec::remap(domain).map_err(|chars| SyntaxError::InvalidDomainCharacters {
        chars: CharList::by_display(chars),
    })?;
    check_hostname_chars(&remapped, true)?;

    check_dot_atom(&remapped, Side::Domain)?;
    if remapped.split('.').any(is_reserved_ldh_label) {
        return Err(SyntaxError::ReservedLdhLabel);
    }

    let ascii_domain = if is_dot_atom_hostname(&remapped) {
        remapped
    } else {
        let encoded = idna_codec::encode(&remapped)
            .map_err(|source| SyntaxError::DomainEncoding { source })?;
        if !is_dot_atom_hostname(&encoded) {
            return Err(SyntaxError::InvalidDomainAfterIdna);
        }
        encoded
    };

    if ascii_domain.len() > DOMAIN_MAX_LENGTH {
        let diff = ascii_domain.len() - DOMAIN_MAX_LENGTH;
        let excess = if ascii_domain == domain {
            DomainLengthExcess::Characters(diff)
        } else {
            DomainLengthExcess::IdnaBytes(diff)
        };
        return Err(SyntaxError::DomainTooLong { excess });
    }

    if let Some(label) = ascii_domain
        .split('.')
        .find(|label| label.len() > DNS_LABEL_LENGTH_LIMIT)
    {
        return Err(SyntaxError::DomainLabelTooLong {
            excess: label.len() - DNS_LABEL_LENGTH_LIMIT,
        });
    }

    if policy.globally_deliverable {
        if !ascii_domain.contains('.') && !(ascii_domain == "test" && policy.test_environment) {
            return Err(SyntaxError::DomainNoPeriod);
        }
        if !ends_with_letter(&ascii_domain) {
            return Err(SyntaxError::DomainInvalidTld);
        }
    }

    if let Some(allowed) = policy.allowed_top_level_domains {
        let tld = ascii_domain.rsplit('.').next().unwrap_or(ascii_domain.as_str());
        if !allowed.iter().any(|t| t.trim_start_matches('.').eq_ignore_ascii_case(tld)) {
            return Err(SyntaxError::DomainTldNotAllowed);
        }
    }

    if is_special_use_domain(&ascii_domain, policy.test_environment) {
        return Err(SyntaxError::SpecialUseDomain);
    }

    let unicode_domain = idna_codec::decode(&ascii_domain)
        .map_err(|source| SyntaxError::DomainDecoding { source })?;
    check_hostname_chars(&unicode_domain, false)?;
    check_unsafe_chars(&unicode_domain, false)?;
    idna_codec::encode(&unicode_domain)
        .map_err(|source| SyntaxError::DomainReencoding { source })?;

    trace_event!(ascii = %ascii_domain, unicode = %unicode_domain, "domain name accepted");
    Ok(DomainInfo {
        ascii_domain,
        domain: unicode_domain,
    })
}

fn check_hostname_chars(domain: &str, after_normalization: bool) -> Result<(), SyntaxError> {
    let bad: Vec<char> = domain.chars().filter(|&c| !is_hostname_char(c)).collect();
    if bad.is_empty() {
        return Ok(());
    }
    let chars = CharList::by_display(bad);
    Err(if after_normalization {
        SyntaxError::InvalidDomainCharactersAfterNormalization { chars }
    } else {
        SyntaxError::InvalidDomainCharacters { chars }
    })
}
