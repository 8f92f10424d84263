//! DNS deliverability check for the domain of a validated address.
//!
//! [`check_deliverability`] runs against anything implementing [`LookupDns`].
//! With the `with-dns` feature, [`DnsResolver::caching`] wraps the system
//! resolver.

mod check;
mod error;
mod resolver;
mod types;

pub use check::check_deliverability;
pub use error::{DnsLookupError, UndeliverableError};
pub use resolver::{DnsResolver, LookupDns};
pub use types::{
    Deliverability, DeliverabilityInfo, MxFallbackType, MxRecord, UnknownDeliverability,
};
