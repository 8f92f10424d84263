//! Bracketed address literals after the @-sign (RFC 5321 4.1.3).

use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};

use super::chars::is_domain_literal_char;
use super::error::{CharList, LiteralIssue, SyntaxError};
use super::types::LiteralInfo;

const IPV6_TAG: &str = "IPv6:";
const HEXTET_COUNT: usize = 8;

/// Validate the text between `[` and `]`.
pub(crate) fn validate_domain_literal(
    content: &str,
    strict_ipv6_compression: bool,
) -> Result<LiteralInfo, SyntaxError> {
    if !content.is_empty() && content.bytes().all(|b| b.is_ascii_digit() || b == b'.') {
        let addr = parse_ipv4(content).map_err(|issue| SyntaxError::InvalidIpv4Literal { issue })?;
        return Ok(LiteralInfo {
            domain_address: IpAddr::V4(addr),
            domain: format!("[{addr}]"),
        });
    }

    if let Some(text) = content.strip_prefix(IPV6_TAG) {
        let addr = parse_ipv6(text, strict_ipv6_compression)
            .map_err(|issue| SyntaxError::InvalidIpv6Literal { issue })?;
        return Ok(LiteralInfo {
            domain_address: IpAddr::V6(addr),
            domain: format!("[{IPV6_TAG}{addr}]"),
        });
    }

    if !content.contains(':') {
        return Err(SyntaxError::UntaggedDomainLiteral);
    }
    let bad: Vec<char> = content
        .chars()
        .filter(|&c| !is_domain_literal_char(c))
        .collect();
    if !bad.is_empty() {
        return Err(SyntaxError::InvalidLiteralCharacters {
            chars: CharList::by_display(bad),
        });
    }
    // IPv6 is the only registered address-literal tag.
    Err(SyntaxError::UnsupportedLiteralTag)
}

/// Dotted quad with exactly four decimal octets and no leading zeros.
fn parse_ipv4(address: &str) -> Result<Ipv4Addr, LiteralIssue> {
    if address.is_empty() {
        return Err(LiteralIssue::EmptyAddress);
    }
    let parts: Vec<&str> = address.split('.').collect();
    if parts.len() != 4 {
        return Err(LiteralIssue::OctetCount {
            address: address.to_string(),
        });
    }

    let mut octets = [0u8; 4];
    for (slot, part) in octets.iter_mut().zip(&parts) {
        *slot = parse_octet(part, address)?;
    }
    Ok(Ipv4Addr::from(octets))
}

fn parse_octet(octet: &str, address: &str) -> Result<u8, LiteralIssue> {
    let address = address.to_string();
    if octet.is_empty() {
        return Err(LiteralIssue::EmptyOctet { address });
    }
    let octet_owned = octet.to_string();
    if !octet.bytes().all(|b| b.is_ascii_digit()) {
        return Err(LiteralIssue::NonDecimalOctet {
            octet: octet_owned,
            address,
        });
    }
    if octet.len() > 3 {
        return Err(LiteralIssue::OctetTooLong {
            octet: octet_owned,
            address,
        });
    }
    if octet != "0" && octet.starts_with('0') {
        return Err(LiteralIssue::LeadingZero {
            octet: octet_owned,
            address,
        });
    }
    octet
        .parse::<u8>()
        .map_err(|_| LiteralIssue::OctetOutOfRange {
            octet: octet_owned,
            address,
        })
}

/// Colon-separated hextets with at most one `::` and an optional dotted-quad
/// tail.
fn parse_ipv6(address: &str, strict_compression: bool) -> Result<Ipv6Addr, LiteralIssue> {
    if address.is_empty() {
        return Err(LiteralIssue::EmptyAddress);
    }
    let owned = || address.to_string();

    let mut parts: Vec<String> = address.split(':').map(str::to_string).collect();
    if parts.len() < 3 {
        return Err(LiteralIssue::TooFewParts { address: owned() });
    }

    if let Some(tail) = parts.last().filter(|last| last.contains('.')).cloned() {
        parts.pop();
        let v4 = parse_ipv4(&tail).map_err(|issue| LiteralIssue::EmbeddedIpv4 {
            issue: Box::new(issue),
            address: owned(),
        })?;
        let [a, b, c, d] = v4.octets();
        parts.push(format!("{:x}", u16::from_be_bytes([a, b])));
        parts.push(format!("{:x}", u16::from_be_bytes([c, d])));
    }

    if parts.len() > HEXTET_COUNT + 1 {
        return Err(LiteralIssue::TooManyColons { address: owned() });
    }

    // a "::" away from the ends shows up as an empty inner part
    let mut skip_index = None;
    for (idx, part) in parts.iter().enumerate().take(parts.len() - 1).skip(1) {
        if part.is_empty() {
            if skip_index.is_some() {
                return Err(LiteralIssue::MultipleCompressions { address: owned() });
            }
            skip_index = Some(idx);
        }
    }

    let first_empty = parts.first().is_some_and(String::is_empty);
    let last_empty = parts.last().is_some_and(String::is_empty);
    let (hi, lo) = match skip_index {
        Some(skip) => {
            let mut hi = skip;
            let mut lo = parts.len() - skip - 1;
            if first_empty {
                hi -= 1;
                if hi != 0 {
                    return Err(LiteralIssue::LeadingColon { address: owned() });
                }
            }
            if last_empty {
                lo -= 1;
                if lo != 0 {
                    return Err(LiteralIssue::TrailingColon { address: owned() });
                }
            }
            if hi + lo >= HEXTET_COUNT {
                return Err(LiteralIssue::TooManyPartsWithCompression { address: owned() });
            }
            (hi, lo)
        }
        None => {
            if parts.len() != HEXTET_COUNT {
                return Err(LiteralIssue::WrongPartCountWithoutCompression { address: owned() });
            }
            if first_empty {
                return Err(LiteralIssue::LeadingColon { address: owned() });
            }
            if last_empty {
                return Err(LiteralIssue::TrailingColon { address: owned() });
            }
            (HEXTET_COUNT, 0)
        }
    };

    if strict_compression && skip_index.is_some() && HEXTET_COUNT - (hi + lo) == 1 {
        return Err(LiteralIssue::SingleGroupCompression { address: owned() });
    }

    let mut groups = [0u16; HEXTET_COUNT];
    for (slot, part) in groups[..hi].iter_mut().zip(&parts[..hi]) {
        *slot = parse_hextet(part, address)?;
    }
    let tail = &parts[parts.len() - lo..];
    for (slot, part) in groups[HEXTET_COUNT - lo..].iter_mut().zip(tail) {
        *slot = parse_hextet(part, address)?;
    }
    Ok(Ipv6Addr::from(groups))
}

fn parse_hextet(group: &str, address: &str) -> Result<u16, LiteralIssue> {
    let non_hex = || LiteralIssue::NonHexGroup {
        group: group.to_string(),
        address: address.to_string(),
    };
    if !group.bytes().all(|b| b.is_ascii_hexdigit()) {
        return Err(non_hex());
    }
    if group.len() > 4 {
        return Err(LiteralIssue::GroupTooLong {
            group: group.to_string(),
            address: address.to_string(),
        });
    }
    u16::from_str_radix(group, 16).map_err(|_| non_hex())
}
