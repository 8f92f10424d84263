use std::fmt;

#[cfg_attr(feature = "with-serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct MxRecord {
    pub preference: u16,
    pub exchange: String,
}

impl MxRecord {
    pub fn new(preference: u16, exchange: impl Into<String>) -> Self {
        Self {
            preference,
            exchange: exchange.into(),
        }
    }
}

/// Record type that stood in for a missing MX record (RFC 5321 5.1).
#[cfg_attr(feature = "with-serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MxFallbackType {
    #[cfg_attr(feature = "with-serde", serde(rename = "A"))]
    A,
    #[cfg_attr(feature = "with-serde", serde(rename = "AAAA"))]
    Aaaa,
}

impl fmt::Display for MxFallbackType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::A => "A",
            Self::Aaaa => "AAAA",
        })
    }
}

/// DNS could not give an answer either way. The address is still accepted.
#[cfg_attr(feature = "with-serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "with-serde", serde(rename_all = "snake_case"))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnknownDeliverability {
    Timeout,
    NoNameservers,
}

impl fmt::Display for UnknownDeliverability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Timeout => "timeout",
            Self::NoNameservers => "no_nameservers",
        })
    }
}

#[cfg_attr(feature = "with-serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeliverabilityInfo {
    /// Sorted by ascending preference, trailing dots stripped.
    pub mx: Vec<MxRecord>,
    pub mx_fallback_type: Option<MxFallbackType>,
    /// SPF policy seen while falling back to A/AAAA records.
    pub spf: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Deliverability {
    Confirmed(DeliverabilityInfo),
    Unknown(UnknownDeliverability),
}
