//! Thin adapter over the `idna` crate: UTS-46 mapping, A-label encoding and
//! decoding, each failing with an [`IdnaError`] that reads well inside a
//! domain-context message.

use idna::uts46::{AsciiDenyList, DnsLength, Hyphens, Uts46};

use super::chars::DNS_LABEL_LENGTH_LIMIT;
use super::error::IdnaError;

const UTS46: Uts46 = Uts46::new();

fn is_full_stop(c: char) -> bool {
    matches!(c, '.' | '\u{3002}' | '\u{FF0E}' | '\u{FF61}')
}

/// UTS-46 mapping without transitional processing or STD3 rules: casefold,
/// NFC, and every full-stop variant mapped to `.`.
///
/// Returns the characters that the mapping disallows, or that would expand
/// into something containing a label separator (such as U+2488).
pub(crate) fn remap(domain: &str) -> Result<String, Vec<char>> {
    let rejected: Vec<char> = domain
        .chars()
        .filter(|c| !c.is_ascii())
        .filter(|&c| {
            let mapped: String = UTS46.map_normalize(std::iter::once(c)).collect();
            mapped.contains('\u{FFFD}') || (mapped.contains('.') && !is_full_stop(c))
        })
        .collect();
    if !rejected.is_empty() {
        return Err(rejected);
    }
    Ok(UTS46.map_normalize(domain.chars()).collect())
}

/// Convert an already-mapped domain to its ASCII-compatible form.
pub(crate) fn encode(domain: &str) -> Result<String, IdnaError> {
    let ascii = UTS46
        .to_ascii(
            domain.as_bytes(),
            AsciiDenyList::EMPTY,
            Hyphens::Allow,
            DnsLength::Ignore,
        )
        .map_err(|_| IdnaError::Rejected)?;
    for label in ascii.split('.') {
        if label.len() > DNS_LABEL_LENGTH_LIMIT {
            return Err(IdnaError::LabelTooLong);
        }
    }
    Ok(ascii.into_owned())
}

/// Convert an ASCII domain back to Unicode. Only A-labels can fail here, since
/// the input already satisfies the hostname grammar.
pub(crate) fn decode(ascii_domain: &str) -> Result<String, IdnaError> {
    let (unicode, outcome) =
        UTS46.to_unicode(ascii_domain.as_bytes(), AsciiDenyList::EMPTY, Hyphens::Allow);
    outcome.map_err(|_| IdnaError::InvalidALabel)?;
    Ok(unicode.into_owned())
}
