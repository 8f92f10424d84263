use std::error::Error as StdError;

use thiserror::Error;

/// Outcome of a single DNS query that produced no records, classified the
/// way the deliverability check needs it.
#[derive(Debug, Error)]
pub enum DnsLookupError {
    #[error("the DNS response has no records of the requested type")]
    NoAnswer,
    #[error("the domain name does not exist")]
    NxDomain,
    #[error("no nameserver could answer the query")]
    NoNameservers,
    #[error("the DNS query timed out")]
    Timeout,
    #[error("{source}")]
    Other {
        source: Box<dyn StdError + Send + Sync>,
    },
}

impl DnsLookupError {
    pub fn other(source: impl Into<Box<dyn StdError + Send + Sync>>) -> Self {
        Self::Other {
            source: source.into(),
        }
    }
}

#[cfg(feature = "with-dns")]
impl From<trust_dns_resolver::error::ResolveError> for DnsLookupError {
    fn from(err: trust_dns_resolver::error::ResolveError) -> Self {
        use trust_dns_resolver::error::ResolveErrorKind;
        use trust_dns_resolver::proto::op::ResponseCode;

        let classified = match err.kind() {
            ResolveErrorKind::NoRecordsFound { response_code, .. }
                if *response_code == ResponseCode::NXDomain =>
            {
                Some(Self::NxDomain)
            }
            ResolveErrorKind::NoRecordsFound { .. } => Some(Self::NoAnswer),
            ResolveErrorKind::Timeout => Some(Self::Timeout),
            ResolveErrorKind::NoConnections => Some(Self::NoNameservers),
            _ => None,
        };
        classified.unwrap_or_else(|| Self::other(err))
    }
}

/// The address is well formed but DNS shows its domain cannot receive mail.
#[derive(Debug, Error)]
pub enum UndeliverableError {
    #[error("The domain name {domain} does not exist.")]
    NoDomain { domain: String },
    /// RFC 7505 null MX.
    #[error("The domain name {domain} does not accept email.")]
    NullMx { domain: String },
    /// No MX record and no globally routable A/AAAA fallback.
    #[error("The domain name {domain} does not accept email.")]
    NoMx { domain: String },
    /// No MX record and an SPF policy of `v=spf1 -all`.
    #[error("The domain name {domain} does not send email.")]
    RejectsAllMail { domain: String },
    #[error(
        "There was an error while checking if the domain name in the email address is deliverable ({source})."
    )]
    Unhandled { source: DnsLookupError },
}

impl UndeliverableError {
    pub(crate) fn unhandled(source: DnsLookupError) -> Self {
        Self::Unhandled { source }
    }
}
