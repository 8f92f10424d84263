//! Character classes, grammar predicates and limits from RFC 5321, RFC 5322,
//! RFC 6531 and RFC 1035.

use phf::phf_set;

use super::error::{DotAtomViolation, Separator, SyntaxError};

/// RFC 3696 errata 1690: 254 octets for a whole address.
pub const EMAIL_MAX_LENGTH: usize = 254;
/// RFC 5321 4.5.3.1.1
pub const LOCAL_PART_MAX_LENGTH: usize = 64;
/// RFC 1035 2.3.1
pub const DNS_LABEL_LENGTH_LIMIT: usize = 63;
/// RFC 1035 2.3.4, RFC 5321 4.5.3.1.2
pub const DOMAIN_MAX_LENGTH: usize = 255;

/// RFC 2142 mailbox names that are matched case-insensitively.
pub(crate) const CASE_INSENSITIVE_MAILBOX_NAMES: phf::Set<&'static str> = phf_set! {
    "info", "marketing", "sales", "support",
    "abuse", "noc", "security",
    "postmaster", "hostmaster", "usenet", "news", "webmaster", "www", "uucp", "ftp",
};

/// Special-use and reserved names that can never hold a globally deliverable
/// mailbox. Subdomains are rejected as well.
pub(crate) const SPECIAL_USE_DOMAIN_NAMES: phf::Set<&'static str> = phf_set! {
    "arpa",
    "invalid",
    "local",
    "localhost",
    "onion",
    "test",
};

/// RFC 5322 3.2.3 atext.
pub(crate) fn is_atext(c: char) -> bool {
    c.is_ascii_alphanumeric()
        || matches!(
            c,
            '!' | '#'
                | '$'
                | '%'
                | '&'
                | '\''
                | '*'
                | '+'
                | '-'
                | '/'
                | '='
                | '?'
                | '^'
                | '_'
                | '`'
                | '{'
                | '|'
                | '}'
                | '~'
        )
}

/// atext extended with U+0080..=U+10FFFF (RFC 6531 3.3).
pub(crate) fn is_atext_intl(c: char) -> bool {
    is_atext(c) || c >= '\u{80}'
}

/// One or more runs of `class` separated by single dots.
pub(crate) fn is_dot_atom(s: &str, class: fn(char) -> bool) -> bool {
    !s.is_empty()
        && s
            .split('.')
            .all(|run| !run.is_empty() && run.chars().all(class))
}

/// Characters accepted in a domain name before IDNA processing.
pub(crate) fn is_hostname_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '-' || c == '.' || c >= '\u{80}'
}

/// RFC 952 / RFC 1123 2.1 label: alphanumerics with internal hyphens only.
pub(crate) fn is_hostname_label(label: &str) -> bool {
    let bytes = label.as_bytes();
    match (bytes.first(), bytes.last()) {
        (Some(first), Some(last)) => {
            first.is_ascii_alphanumeric()
                && last.is_ascii_alphanumeric()
                && bytes.iter().all(|b| b.is_ascii_alphanumeric() || *b == b'-')
        }
        _ => false,
    }
}

pub(crate) fn is_dot_atom_hostname(domain: &str) -> bool {
    !domain.is_empty() && domain.split('.').all(is_hostname_label)
}

/// RFC 5321 4.1.2 qtext plus quoted-pair, widened to UTF-8 by RFC 6531 3.3.
pub(crate) fn is_qtext_intl(c: char) -> bool {
    ('\u{20}'..='\u{7e}').contains(&c) || c >= '\u{80}'
}

/// RFC 5321 4.1.3 dcontent.
pub(crate) fn is_domain_literal_char(c: char) -> bool {
    matches!(c, '\u{21}'..='\u{5a}' | '\u{5e}'..='\u{7e}')
}

/// Every current TLD ends with a letter.
pub(crate) fn ends_with_letter(domain: &str) -> bool {
    domain
        .chars()
        .next_back()
        .is_some_and(|c| c.is_ascii_alphabetic())
}

/// RFC 5890 R-LDH label: two characters then `--`, other than the `xn--`
/// A-label prefix.
pub(crate) fn is_reserved_ldh_label(label: &str) -> bool {
    let mut chars = label.chars();
    let (Some(a), Some(b), Some(c), Some(d)) = (chars.next(), chars.next(), chars.next(), chars.next())
    else {
        return false;
    };
    c == '-' && d == '-' && !(a.eq_ignore_ascii_case(&'x') && b.eq_ignore_ascii_case(&'n'))
}

/// The domain itself or any parent of it is a special-use name.
pub(crate) fn is_special_use_domain(ascii_domain: &str, test_environment: bool) -> bool {
    let mut candidate = ascii_domain;
    loop {
        if SPECIAL_USE_DOMAIN_NAMES.contains(candidate) && !(test_environment && candidate == "test") {
            return true;
        }
        match candidate.split_once('.') {
            Some((_, parent)) => candidate = parent,
            None => return false,
        }
    }
}

/// Which side of the @-sign a dot-atom check is applied to. Hyphen rules
/// only exist for hostnames.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Side {
    Local,
    Domain,
}

/// RFC 5322 3.2.3 boundary rules, plus RFC 952 hyphen rules for domains.
pub(crate) fn check_dot_atom(text: &str, side: Side) -> Result<(), SyntaxError> {
    let violation = |starts: bool, sep: Separator| match (side, starts) {
        (Side::Local, true) => DotAtomViolation::LocalStartsWith(sep),
        (Side::Local, false) => DotAtomViolation::LocalEndsWith(sep),
        (Side::Domain, true) => DotAtomViolation::DomainStartsWith(sep),
        (Side::Domain, false) => DotAtomViolation::DomainEndsWith(sep),
    };

    if text.ends_with('.') {
        return Err(SyntaxError::dot_atom(violation(false, Separator::Period)));
    }
    if text.starts_with('.') {
        return Err(SyntaxError::dot_atom(violation(true, Separator::Period)));
    }
    if text.contains("..") {
        return Err(SyntaxError::dot_atom(DotAtomViolation::ConsecutivePeriods));
    }

    if side == Side::Domain {
        if text.ends_with('-') {
            return Err(SyntaxError::dot_atom(violation(false, Separator::Hyphen)));
        }
        if text.starts_with('-') {
            return Err(SyntaxError::dot_atom(violation(true, Separator::Hyphen)));
        }
        if text.contains(".-") || text.contains("-.") {
            return Err(SyntaxError::dot_atom(DotAtomViolation::PeriodNextToHyphen));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dot_atom_runs() {
        assert!(is_dot_atom("a.b", is_atext));
        assert!(!is_dot_atom(".abc", is_atext));
        assert!(!is_dot_atom("abc.", is_atext));
        assert!(!is_dot_atom("a..b", is_atext));
        assert!(!is_dot_atom("λ", is_atext));
        assert!(is_dot_atom("λ.ツ", is_atext_intl));
        assert!(!is_dot_atom("a b", is_atext_intl));
    }

    #[test]
    fn hostname_labels() {
        assert!(is_dot_atom_hostname("xn--5nqv22n.xn--lhr59c"));
        assert!(is_dot_atom_hostname("a-1.example"));
        assert!(!is_dot_atom_hostname("-a.example"));
        assert!(!is_dot_atom_hostname("a_b.example"));
        assert!(!is_dot_atom_hostname("郵件.商務"));
    }

    #[test]
    fn reserved_ldh_labels() {
        assert!(is_reserved_ldh_label("ab--cd"));
        assert!(is_reserved_ldh_label("AB--"));
        assert!(!is_reserved_ldh_label("xn--5nqv22n"));
        assert!(!is_reserved_ldh_label("XN--abc"));
        assert!(!is_reserved_ldh_label("a-b-c"));
        assert!(!is_reserved_ldh_label("ab-"));
    }

    #[test]
    fn special_use_suffixes() {
        assert!(is_special_use_domain("localhost", false));
        assert!(is_special_use_domain("mail.onion", false));
        assert!(is_special_use_domain("test.test.test", false));
        assert!(!is_special_use_domain("test.test.test", true));
        assert!(!is_special_use_domain("contest.com", false));
        assert!(!is_special_use_domain("example.com", false));
    }

    #[test]
    fn case_insensitive_names() {
        assert!(CASE_INSENSITIVE_MAILBOX_NAMES.contains("postmaster"));
        assert!(!CASE_INSENSITIVE_MAILBOX_NAMES.contains("Postmaster"));
    }

    #[test]
    fn dot_atom_positions() {
        assert_eq!(
            check_dot_atom(".user", Side::Local),
            Err(SyntaxError::dot_atom(DotAtomViolation::LocalStartsWith(
                Separator::Period
            )))
        );
        assert_eq!(
            check_dot_atom("user.", Side::Local),
            Err(SyntaxError::dot_atom(DotAtomViolation::LocalEndsWith(
                Separator::Period
            )))
        );
        assert_eq!(
            check_dot_atom("-user", Side::Local),
            Ok(())
        );
        assert_eq!(
            check_dot_atom("example-.com", Side::Domain),
            Err(SyntaxError::dot_atom(DotAtomViolation::PeriodNextToHyphen))
        );
        assert_eq!(
            check_dot_atom("-example.com", Side::Domain),
            Err(SyntaxError::dot_atom(DotAtomViolation::DomainStartsWith(
                Separator::Hyphen
            )))
        );
    }
}
