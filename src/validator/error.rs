use std::borrow::Borrow;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use thiserror::Error;

use super::safety::safe_character_display;
use crate::deliverability::UndeliverableError;

/// Offending characters attached to a syntax error, rendered with
/// [`safe_character_display`] and joined by commas.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CharList(Vec<char>);

impl CharList {
    /// Deduplicated, ordered by display text.
    pub(crate) fn by_display<I: IntoIterator<Item = char>>(chars: I) -> Self {
        let unique: BTreeMap<String, char> = chars
            .into_iter()
            .map(|c| (safe_character_display(c), c))
            .collect();
        Self(unique.into_values().collect())
    }

    /// Deduplicated, ordered by code point.
    pub(crate) fn by_code_point<I: IntoIterator<Item = char>>(chars: I) -> Self {
        let unique: BTreeSet<char> = chars.into_iter().collect();
        Self(unique.into_iter().collect())
    }

    /// Kept as given, duplicates included.
    pub(crate) fn in_order<I: IntoIterator<Item = char>>(chars: I) -> Self {
        Self(chars.into_iter().collect())
    }

    pub fn chars(&self) -> &[char] {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for CharList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (idx, c) in self.0.iter().enumerate() {
            if idx > 0 {
                f.write_str(", ")?;
            }
            f.write_str(&safe_character_display(*c))?;
        }
        Ok(())
    }
}

fn plural(n: impl Borrow<usize>) -> &'static str {
    if *n.borrow() == 1 { "" } else { "s" }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Separator {
    Period,
    Hyphen,
}

impl fmt::Display for Separator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Period => "period",
            Self::Hyphen => "hyphen",
        })
    }
}

/// Positional dot-atom rule broken by the local part or the domain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DotAtomViolation {
    LocalStartsWith(Separator),
    LocalEndsWith(Separator),
    DomainStartsWith(Separator),
    DomainEndsWith(Separator),
    ConsecutivePeriods,
    PeriodNextToHyphen,
}

impl fmt::Display for DotAtomViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::LocalStartsWith(sep) => write!(f, "An email address cannot start with a {sep}."),
            Self::LocalEndsWith(sep) => write!(
                f,
                "An email address cannot have a {sep} immediately before the @-sign."
            ),
            Self::DomainStartsWith(sep) => write!(
                f,
                "An email address cannot have a {sep} immediately after the @-sign."
            ),
            Self::DomainEndsWith(sep) => write!(f, "An email address cannot end with a {sep}."),
            Self::ConsecutivePeriods => {
                f.write_str("An email address cannot have two periods in a row.")
            }
            Self::PeriodNextToHyphen => {
                f.write_str("An email address cannot have a period and a hyphen next to each other.")
            }
        }
    }
}

/// How far past the 254-octet budget an address went, and in which form.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TotalLengthExcess {
    Characters(usize),
    CharacterRange { min: usize, max: usize },
    BytesAfterNormalization(usize),
    BytesAfterIdna(usize),
}

impl fmt::Display for TotalLengthExcess {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Self::Characters(n) => write!(f, "({n} character{} too many)", plural(n)),
            Self::CharacterRange { min, max } => {
                write!(f, "({min}-{max} character{} too many)", plural(max))
            }
            Self::BytesAfterNormalization(n) => {
                write!(f, "after normalization ({n} byte{} too many)", plural(n))
            }
            Self::BytesAfterIdna(n) => write!(
                f,
                "when the part after the @-sign is converted to IDNA ASCII ({n} byte{} too many)",
                plural(n)
            ),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DomainLengthExcess {
    Characters(usize),
    IdnaBytes(usize),
}

impl fmt::Display for DomainLengthExcess {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Self::Characters(n) => write!(f, "({n} character{} too many)", plural(n)),
            Self::IdnaBytes(n) => {
                write!(f, "({n} byte{} too many after IDNA encoding)", plural(n))
            }
        }
    }
}

/// Failure reported by the IDNA codec adapter.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IdnaError {
    #[error("Label too long")]
    LabelTooLong,
    #[error("Invalid A-label")]
    InvalidALabel,
    #[error("Codepoint not allowed by IDNA")]
    Rejected,
}

/// Why a bracketed address literal did not parse. The wording follows the
/// usual address-parser diagnostics and always names the offending text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LiteralIssue {
    EmptyAddress,
    OctetCount { address: String },
    EmptyOctet { address: String },
    NonDecimalOctet { octet: String, address: String },
    OctetTooLong { octet: String, address: String },
    OctetOutOfRange { octet: String, address: String },
    LeadingZero { octet: String, address: String },
    TooFewParts { address: String },
    TooManyColons { address: String },
    MultipleCompressions { address: String },
    LeadingColon { address: String },
    TrailingColon { address: String },
    TooManyPartsWithCompression { address: String },
    WrongPartCountWithoutCompression { address: String },
    GroupTooLong { group: String, address: String },
    NonHexGroup { group: String, address: String },
    SingleGroupCompression { address: String },
    EmbeddedIpv4 { issue: Box<LiteralIssue>, address: String },
}

impl fmt::Display for LiteralIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyAddress => f.write_str("Address cannot be empty"),
            Self::OctetCount { address } => write!(f, "Expected 4 octets in '{address}'"),
            Self::EmptyOctet { address } => write!(f, "Empty octet not permitted in '{address}'"),
            Self::NonDecimalOctet { octet, address } => write!(
                f,
                "Only decimal digits permitted in '{octet}' in '{address}'"
            ),
            Self::OctetTooLong { octet, address } => write!(
                f,
                "At most 3 characters permitted in '{octet}' in '{address}'"
            ),
            Self::OctetOutOfRange { octet, address } => write!(
                f,
                "Octet {octet} (> 255) not permitted in '{address}'"
            ),
            Self::LeadingZero { octet, address } => write!(
                f,
                "Leading zeros are not permitted in '{octet}' in '{address}'"
            ),
            Self::TooFewParts { address } => write!(f, "At least 3 parts expected in '{address}'"),
            Self::TooManyColons { address } => {
                write!(f, "At most 8 colons permitted in '{address}'")
            }
            Self::MultipleCompressions { address } => {
                write!(f, "At most one '::' permitted in '{address}'")
            }
            Self::LeadingColon { address } => write!(
                f,
                "Leading ':' only permitted as part of '::' in '{address}'"
            ),
            Self::TrailingColon { address } => write!(
                f,
                "Trailing ':' only permitted as part of '::' in '{address}'"
            ),
            Self::TooManyPartsWithCompression { address } => write!(
                f,
                "Expected at most 7 other parts with '::' in '{address}'"
            ),
            Self::WrongPartCountWithoutCompression { address } => write!(
                f,
                "Exactly 8 parts expected without '::' in '{address}'"
            ),
            Self::GroupTooLong { group, address } => write!(
                f,
                "At most 4 characters permitted in '{group}' in '{address}'"
            ),
            Self::NonHexGroup { group, address } => write!(
                f,
                "Only hex digits permitted in '{group}' in '{address}'"
            ),
            Self::SingleGroupCompression { address } => write!(
                f,
                "'::' cannot stand for a single zero group in '{address}'"
            ),
            Self::EmbeddedIpv4 { issue, address } => write!(f, "{issue} in '{address}'"),
        }
    }
}

/// The address's form is invalid. Deterministic and never network-dependent.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SyntaxError {
    #[error("The email address is not valid ASCII.")]
    NotAscii,
    #[error("An email address must have an @-sign.")]
    NoAtSign,
    #[error(
        "The email address has the \"full-width\" at-sign (@) character instead of a regular at-sign."
    )]
    FullWidthAtSign,
    #[error(
        "The email address has the \"small commercial at\" character instead of a regular at-sign."
    )]
    SmallCommercialAtSign,
    #[error("An email address cannot have more than one @-sign unless the part before it is quoted.")]
    MultipleAtSigns,
    #[error("The email address is too long {excess}.")]
    TooLong { excess: TotalLengthExcess },
    #[error("The email address contains unsafe characters: {chars}.")]
    UnsafeCharacters { chars: CharList },
    #[error("{0}")]
    DotAtom(DotAtomViolation),
    #[error("After Unicode normalization: {0}")]
    AfterNormalization(Box<SyntaxError>),

    // display name
    #[error("A display name and angle brackets around the email address are not permitted here.")]
    DisplayNameNotAllowed,
    #[error("The display name contains invalid characters when not quoted: {chars}.")]
    DisplayNameInvalidCharacters { chars: CharList },
    #[error(
        "An open angle bracket at the start of the email address has to be followed by a close angle bracket at the end."
    )]
    MissingCloseAngleBracket,
    #[error("There can't be anything after the email address.")]
    TextAfterAngleBracket,
    #[error("Extra character(s) found after close quote: {chars}.")]
    TextAfterQuotedString { chars: CharList },

    // local part
    #[error("There must be something before the @-sign.")]
    LocalPartEmpty,
    #[error("The email address is too long before the @-sign ({excess} character{} too many).", plural(.excess))]
    LocalPartTooLong { excess: usize },
    #[error("Internationalized characters before the @-sign are not supported: {chars}.")]
    InternationalizedLocalPart { chars: CharList },
    #[error("The email address contains invalid characters in quotes before the @-sign: {chars}.")]
    InvalidQuotedCharacters { chars: CharList },
    #[error("The email address contains invalid characters before the @-sign: {chars}.")]
    InvalidLocalCharacters { chars: CharList },
    #[error("The email address contains invalid characters before the @-sign.")]
    InvalidLocalPart,
    #[error("Quoting the part before the @-sign is not allowed here.")]
    QuotedLocalPartNotAllowed,

    // domain name
    #[error("There must be something after the @-sign.")]
    DomainEmpty,
    #[error("The part after the @-sign contains invalid characters: {chars}.")]
    InvalidDomainCharacters { chars: CharList },
    #[error("The part after the @-sign contains invalid characters after Unicode normalization: {chars}.")]
    InvalidDomainCharactersAfterNormalization { chars: CharList },
    #[error(
        "An email address cannot have two letters followed by two dashes immediately after the @-sign or after a period, except Punycode."
    )]
    ReservedLdhLabel,
    #[error("The part after the @-sign is invalid ({source}).")]
    DomainEncoding { source: IdnaError },
    #[error("The email address contains invalid characters after the @-sign after IDNA encoding.")]
    InvalidDomainAfterIdna,
    #[error("The email address is too long after the @-sign {excess}.")]
    DomainTooLong { excess: DomainLengthExcess },
    #[error("After the @-sign, periods cannot be separated by so many characters ({excess} character{} too many).", plural(.excess))]
    DomainLabelTooLong { excess: usize },
    #[error("The part after the @-sign is not valid. It should have a period.")]
    DomainNoPeriod,
    #[error("The part after the @-sign is not valid. It is not within a valid top-level domain.")]
    DomainInvalidTld,
    #[error("The part after the @-sign is not valid. It is not within an allowed top-level domain.")]
    DomainTldNotAllowed,
    #[error("The part after the @-sign is a special-use or reserved name that cannot be used with email.")]
    SpecialUseDomain,
    #[error("The part after the @-sign is not valid IDNA ({source}).")]
    DomainDecoding { source: IdnaError },
    #[error(
        "The part after the @-sign became invalid after normalizing to international characters ({source})."
    )]
    DomainReencoding { source: IdnaError },

    // domain literal
    #[error("A bracketed IP address after the @-sign is not allowed here.")]
    DomainLiteralNotAllowed,
    #[error(
        "The address in brackets after the @-sign is not valid: It is not an IPv4 address ({issue}) or is missing an address literal tag."
    )]
    InvalidIpv4Literal { issue: LiteralIssue },
    #[error("The IPv6 address in brackets after the @-sign is not valid ({issue}).")]
    InvalidIpv6Literal { issue: LiteralIssue },
    #[error("The part after the @-sign in brackets is not an IPv4 address and has no address literal tag.")]
    UntaggedDomainLiteral,
    #[error("The part after the @-sign contains invalid characters in brackets: {chars}.")]
    InvalidLiteralCharacters { chars: CharList },
    #[error("The part after the @-sign contains an invalid address literal tag in brackets.")]
    UnsupportedLiteralTag,
}

impl SyntaxError {
    pub(crate) fn dot_atom(violation: DotAtomViolation) -> Self {
        Self::DotAtom(violation)
    }

    pub(crate) fn after_normalization(inner: SyntaxError) -> Self {
        Self::AfterNormalization(Box::new(inner))
    }
}

/// Either family of validation failure.
#[derive(Debug, Error)]
pub enum EmailError {
    #[error(transparent)]
    Syntax(#[from] SyntaxError),
    #[error(transparent)]
    Undeliverable(#[from] UndeliverableError),
}

impl EmailError {
    pub fn is_syntax(&self) -> bool {
        matches!(self, Self::Syntax(_))
    }

    pub fn is_undeliverable(&self) -> bool {
        matches!(self, Self::Undeliverable(_))
    }

    pub fn as_syntax(&self) -> Option<&SyntaxError> {
        match self {
            Self::Syntax(err) => Some(err),
            Self::Undeliverable(_) => None,
        }
    }
}
