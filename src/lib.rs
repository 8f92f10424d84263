#![forbid(unsafe_code)]
//! mailvalid_lib: email address syntax validation (RFC 5321/5322, RFC 6531/6532)
//! with an optional DNS deliverability check.
//!
//! The entry point is [`validate_email`]; everything it accepts or rejects is
//! driven by an explicit [`ValidationOptions`] value.

macro_rules! trace_event {
    ($($arg:tt)*) => {
        #[cfg(feature = "with-tracing")]
        tracing::debug!($($arg)*);
    };
}

pub mod deliverability;
pub mod validator;

pub use deliverability::{
    Deliverability, DeliverabilityInfo, DnsLookupError, DnsResolver, LookupDns, MxFallbackType,
    MxRecord, UndeliverableError, UnknownDeliverability, check_deliverability,
};
pub use validator::{
    CharList, DNS_LABEL_LENGTH_LIMIT, DOMAIN_MAX_LENGTH, DomainLengthExcess, DotAtomViolation,
    EMAIL_MAX_LENGTH, EmailError, IdnaError, LOCAL_PART_MAX_LENGTH, LiteralIssue, Separator,
    SyntaxError, TotalLengthExcess, ValidatedEmail, ValidationOptions, check_unsafe_chars,
    is_unsafe, safe_character_display, validate_email, validate_email_bytes,
};
