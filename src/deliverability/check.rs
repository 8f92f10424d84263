use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};

use super::resolver::normalize_exchange;
use super::{
    Deliverability, DeliverabilityInfo, DnsLookupError, LookupDns, MxFallbackType, MxRecord,
    UndeliverableError, UnknownDeliverability,
};

const SPF_PREFIX: &str = "v=spf1 ";
const SPF_REJECT_ALL: &str = "v=spf1 -all";

enum Halt {
    Lookup(DnsLookupError),
    Undeliverable(UndeliverableError),
}

impl From<DnsLookupError> for Halt {
    fn from(err: DnsLookupError) -> Self {
        Self::Lookup(err)
    }
}

/// Check that `ascii_domain` can receive mail: MX records, otherwise a
/// globally routable A or AAAA record with no SPF reject-all policy.
///
/// `domain` is the display form used in error messages. Timeouts and
/// unreachable nameservers give [`Deliverability::Unknown`] rather than an
/// error.
pub fn check_deliverability<R>(
    resolver: &R,
    ascii_domain: &str,
    domain: &str,
) -> Result<Deliverability, UndeliverableError>
where
    R: LookupDns + ?Sized,
{
    match lookup_records(resolver, ascii_domain, domain) {
        Ok(info) => {
            trace_event!(domain = ascii_domain, records = info.mx.len(), "domain accepts mail");
            Ok(Deliverability::Confirmed(info))
        }
        Err(Halt::Undeliverable(err)) => Err(err),
        Err(Halt::Lookup(err)) => {
            trace_event!(domain = ascii_domain, error = %err, "DNS lookup failed");
            match err {
                DnsLookupError::NxDomain => Err(UndeliverableError::NoDomain {
                    domain: domain.to_string(),
                }),
                DnsLookupError::Timeout => {
                    Ok(Deliverability::Unknown(UnknownDeliverability::Timeout))
                }
                DnsLookupError::NoNameservers => {
                    Ok(Deliverability::Unknown(UnknownDeliverability::NoNameservers))
                }
                other => Err(UndeliverableError::unhandled(other)),
            }
        }
    }
}

fn lookup_records<R>(resolver: &R, ascii_domain: &str, domain: &str) -> Result<DeliverabilityInfo, Halt>
where
    R: LookupDns + ?Sized,
{
    let records = answers(resolver.lookup_mx(ascii_domain))?;
    if !records.is_empty() {
        let mut mx: Vec<MxRecord> = records
            .into_iter()
            .map(|record| MxRecord::new(record.preference, normalize_exchange(&record.exchange)))
            .collect();
        mx.sort();
        mx.dedup();
        // a null MX has the root as exchange, which is empty once the dot is gone
        mx.retain(|record| !record.exchange.is_empty());
        if mx.is_empty() {
            return Err(Halt::Undeliverable(UndeliverableError::NullMx {
                domain: domain.to_string(),
            }));
        }
        return Ok(DeliverabilityInfo {
            mx,
            mx_fallback_type: None,
            spf: None,
        });
    }

    let fallback = if answers(resolver.lookup_a(ascii_domain))?
        .into_iter()
        .any(|ip| is_globally_routable(IpAddr::V4(ip)))
    {
        MxFallbackType::A
    } else if answers(resolver.lookup_aaaa(ascii_domain))?
        .into_iter()
        .any(|ip| is_globally_routable(IpAddr::V6(ip)))
    {
        MxFallbackType::Aaaa
    } else {
        return Err(Halt::Undeliverable(UndeliverableError::NoMx {
            domain: domain.to_string(),
        }));
    };

    let mut spf = None;
    for record in txt_answers(resolver.lookup_txt(ascii_domain))? {
        if record.starts_with(SPF_PREFIX) {
            if record == SPF_REJECT_ALL {
                return Err(Halt::Undeliverable(UndeliverableError::RejectsAllMail {
                    domain: domain.to_string(),
                }));
            }
            spf = Some(record);
        }
    }

    Ok(DeliverabilityInfo {
        mx: vec![MxRecord::new(0, ascii_domain)],
        mx_fallback_type: Some(fallback),
        spf,
    })
}

fn answers<T>(result: Result<Vec<T>, DnsLookupError>) -> Result<Vec<T>, DnsLookupError> {
    match result {
        Err(DnsLookupError::NoAnswer) => Ok(Vec::new()),
        other => other,
    }
}

/// The fallback host is already confirmed, so a missing zone or unreachable
/// nameservers only mean there is no SPF policy to read.
fn txt_answers(result: Result<Vec<String>, DnsLookupError>) -> Result<Vec<String>, DnsLookupError> {
    match result {
        Err(DnsLookupError::NoAnswer | DnsLookupError::NxDomain | DnsLookupError::NoNameservers) => {
            Ok(Vec::new())
        }
        other => other,
    }
}

/// Whether mail could be delivered to `ip` over the public internet. Special
/// purpose ranges from the IANA registries (private, loopback, link-local,
/// documentation, and so on) do not count.
pub(crate) fn is_globally_routable(ip: IpAddr) -> bool {
    match ip {
        IpAddr::V4(v4) => is_global_v4(v4),
        IpAddr::V6(v6) => is_global_v6(v6),
    }
}

fn is_global_v4(ip: Ipv4Addr) -> bool {
    let [a, b, c, d] = ip.octets();
    !(a == 0
        || ip.is_private()
        || ip.is_loopback()
        || ip.is_link_local()
        || ip.is_multicast()
        || ip.is_broadcast()
        || ip.is_documentation()
        // shared address space, 100.64.0.0/10
        || (a == 100 && (b & 0xC0) == 64)
        // IETF protocol assignments, 192.0.0.0/24, minus the two anycast relays
        || (a == 192 && b == 0 && c == 0 && !matches!(d, 9 | 10))
        // benchmarking, 198.18.0.0/15
        || (a == 198 && (b & 0xFE) == 18)
        // reserved, 240.0.0.0/4
        || a >= 240)
}

fn is_global_v6(ip: Ipv6Addr) -> bool {
    if let Some(v4) = ip.to_ipv4_mapped() {
        return is_global_v4(v4);
    }
    let segments = ip.segments();
    !(ip.is_unspecified()
        || ip.is_loopback()
        || ip.is_multicast()
        // NAT64 local-use, 64:ff9b:1::/48
        || (segments[0] == 0x64 && segments[1] == 0xff9b && segments[2] == 1)
        // discard-only, 100::/64
        || (segments[0] == 0x100 && segments[1..4] == [0, 0, 0])
        // IETF protocol assignments, 2001::/23, with its global exceptions
        || (segments[0] == 0x2001 && segments[1] < 0x200 && !is_global_ietf_v6(segments))
        // documentation, 2001:db8::/32
        || (segments[0] == 0x2001 && segments[1] == 0xdb8)
        // 6to4, 2002::/16
        || segments[0] == 0x2002
        // unique local, fc00::/7
        || (segments[0] & 0xfe00) == 0xfc00
        // link-local, fe80::/10
        || (segments[0] & 0xffc0) == 0xfe80)
}

fn is_global_ietf_v6(segments: [u16; 8]) -> bool {
    let anycast = segments[1] == 1 && segments[2..7] == [0; 5] && matches!(segments[7], 1 | 2);
    // AMT, 2001:3::/32
    let amt = segments[1] == 3;
    // AS112-v6, 2001:4:112::/48
    let as112 = segments[1] == 4 && segments[2] == 0x112;
    // ORCHIDv2, 2001:20::/28 and DRIP, 2001:30::/28
    let orchid = (0x20..=0x3f).contains(&segments[1]);
    anycast || amt || as112 || orchid
}
