use std::fmt;
use std::net::{Ipv4Addr, Ipv6Addr};
use std::sync::Arc;
#[cfg(feature = "with-dns")]
use std::time::Duration;

#[cfg(feature = "with-dns")]
use trust_dns_resolver::{Resolver, lookup::TxtLookup, system_conf};

use super::{DnsLookupError, MxRecord};

#[cfg(feature = "with-dns")]
const CACHE_SIZE: usize = 1024;

/// The four queries the deliverability check issues. An empty answer may be
/// reported either as `Ok(vec![])` or as [`DnsLookupError::NoAnswer`].
pub trait LookupDns {
    fn lookup_mx(&self, domain: &str) -> Result<Vec<MxRecord>, DnsLookupError>;
    fn lookup_a(&self, domain: &str) -> Result<Vec<Ipv4Addr>, DnsLookupError>;
    fn lookup_aaaa(&self, domain: &str) -> Result<Vec<Ipv6Addr>, DnsLookupError>;
    fn lookup_txt(&self, domain: &str) -> Result<Vec<String>, DnsLookupError>;
}

/// Shareable resolver handle. Cloning shares the underlying resolver and its
/// cache.
#[derive(Clone)]
pub struct DnsResolver {
    inner: Arc<dyn LookupDns + Send + Sync>,
}

impl DnsResolver {
    pub fn new<R>(resolver: R) -> Self
    where
        R: LookupDns + Send + Sync + 'static,
    {
        Self {
            inner: Arc::new(resolver),
        }
    }

    /// System resolver configuration with the given per-query timeout and
    /// an in-memory answer cache.
    #[cfg(feature = "with-dns")]
    pub fn caching(timeout: Duration) -> Result<Self, DnsLookupError> {
        let (config, mut opts) = system_conf::read_system_conf().map_err(DnsLookupError::other)?;
        opts.timeout = timeout;
        opts.cache_size = CACHE_SIZE;
        let resolver = Resolver::new(config, opts).map_err(DnsLookupError::other)?;
        trace_event!(?timeout, "built caching system resolver");
        Ok(Self::new(resolver))
    }
}

impl fmt::Debug for DnsResolver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DnsResolver").finish_non_exhaustive()
    }
}

impl LookupDns for DnsResolver {
    fn lookup_mx(&self, domain: &str) -> Result<Vec<MxRecord>, DnsLookupError> {
        self.inner.lookup_mx(domain)
    }

    fn lookup_a(&self, domain: &str) -> Result<Vec<Ipv4Addr>, DnsLookupError> {
        self.inner.lookup_a(domain)
    }

    fn lookup_aaaa(&self, domain: &str) -> Result<Vec<Ipv6Addr>, DnsLookupError> {
        self.inner.lookup_aaaa(domain)
    }

    fn lookup_txt(&self, domain: &str) -> Result<Vec<String>, DnsLookupError> {
        self.inner.lookup_txt(domain)
    }
}

/// Query names are made absolute so search domains never apply.
#[cfg(feature = "with-dns")]
fn fqdn(domain: &str) -> String {
    format!("{}.", domain.trim_end_matches('.'))
}

#[cfg(feature = "with-dns")]
impl LookupDns for Resolver {
    fn lookup_mx(&self, domain: &str) -> Result<Vec<MxRecord>, DnsLookupError> {
        let lookup = Resolver::mx_lookup(self, fqdn(domain).as_str())?;
        Ok(lookup
            .iter()
            .map(|mx| MxRecord::new(mx.preference(), mx.exchange().to_utf8()))
            .collect())
    }

    fn lookup_a(&self, domain: &str) -> Result<Vec<Ipv4Addr>, DnsLookupError> {
        let lookup = Resolver::ipv4_lookup(self, fqdn(domain).as_str())?;
        Ok(lookup.iter().map(|a| a.0).collect())
    }

    fn lookup_aaaa(&self, domain: &str) -> Result<Vec<Ipv6Addr>, DnsLookupError> {
        let lookup = Resolver::ipv6_lookup(self, fqdn(domain).as_str())?;
        Ok(lookup.iter().map(|aaaa| aaaa.0).collect())
    }

    fn lookup_txt(&self, domain: &str) -> Result<Vec<String>, DnsLookupError> {
        let lookup = Resolver::txt_lookup(self, fqdn(domain).as_str())?;
        Ok(collect_txt_records(&lookup))
    }
}

/// Each TXT record is the concatenation of its character-strings.
#[cfg(feature = "with-dns")]
fn collect_txt_records(lookup: &TxtLookup) -> Vec<String> {
    lookup
        .iter()
        .map(|txt| {
            txt.txt_data()
                .iter()
                .map(|piece| String::from_utf8_lossy(piece))
                .collect::<String>()
        })
        .collect()
}

pub(crate) fn normalize_exchange(exchange: &str) -> String {
    exchange.trim_end_matches('.').to_ascii_lowercase()
}
