//! Splitting raw input into display name, local part and domain part.
//!
//! Quoted local parts may contain `@`, and a `Name <addr>` wrapper puts the
//! address inside angle brackets, so a plain `split_once('@')` is not enough.

use unicode_normalization::UnicodeNormalization;

use super::chars::is_atext_intl;
use super::error::{CharList, SyntaxError};
use super::safety::check_unsafe_chars;
use super::types::AddressPart;

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct SplitAddress<'a> {
    /// NFC-normalized, unquoted display name. `None` when empty.
    pub display_name: Option<String>,
    /// The address was wrapped in `<...>`, with or without a name.
    pub angle_brackets: bool,
    /// The address without its display name and brackets.
    pub addr_spec: &'a str,
    pub local: AddressPart,
    pub domain: &'a str,
}

pub(crate) fn split_email(email: &str) -> Result<SplitAddress<'_>, SyntaxError> {
    let (left, right) = split_at_unquoted_special(email, &['@', '<'])?;

    let (display_name, angle_brackets, addr_spec, local, domain) =
        if let Some(bracketed) = right.strip_prefix('<') {
            let display_name = parse_display_name(left.trim_end())?;

            if !right.contains('>') {
                return Err(SyntaxError::MissingCloseAngleBracket);
            }
            if !right.trim_end_matches(' ').ends_with('>') {
                return Err(SyntaxError::TextAfterAngleBracket);
            }
            let addr_spec = bracketed.trim_end_matches(' ').trim_end_matches('>');
            let (local, domain) = split_at_unquoted_special(addr_spec, &['@'])?;
            (display_name, true, addr_spec, local, domain)
        } else {
            (None, false, email, left, right)
        };

    let domain = domain.strip_prefix('@').unwrap_or(domain);
    if domain.contains('@') {
        return Err(SyntaxError::MultipleAtSigns);
    }

    let local = match unquote(local)? {
        (content, true) => AddressPart::QuotedString(content),
        (content, false) => AddressPart::DottedAtom(content),
    };

    Ok(SplitAddress {
        display_name,
        angle_brackets,
        addr_spec,
        local,
        domain,
    })
}

/// Split before the first character of `specials` found outside quotes.
///
/// A special, quote or backslash followed by something that NFC would
/// combine with it (`<` + U+0338 becomes U+226E) is treated as ordinary text.
fn split_at_unquoted_special<'a>(
    text: &'a str,
    specials: &[char],
) -> Result<(&'a str, &'a str), SyntaxError> {
    let mut inside_quote = false;
    let mut escaped = false;

    for (idx, c) in text.char_indices() {
        let significant = c == '"' || c == '\\' || specials.contains(&c);
        if significant && text[idx..].nfc().next() != Some(c) {
            continue;
        }

        if inside_quote {
            if c == '\\' && !escaped {
                escaped = true;
            } else if c == '"' && !escaped {
                inside_quote = false;
                escaped = false;
            } else {
                escaped = false;
            }
        } else if c == '"' {
            inside_quote = true;
        } else if specials.contains(&c) {
            return Ok((&text[..idx], &text[idx..]));
        }
    }

    if text.contains('\u{FF20}') {
        Err(SyntaxError::FullWidthAtSign)
    } else if text.contains('\u{FE6B}') {
        Err(SyntaxError::SmallCommercialAtSign)
    } else {
        Err(SyntaxError::NoAtSign)
    }
}

/// Strip surrounding quotes and backslash escapes. Any character may be
/// escaped. Returns whether the text was quoted at all.
fn unquote(text: &str) -> Result<(String, bool), SyntaxError> {
    let Some(body) = text.strip_prefix('"') else {
        return Ok((text.to_string(), false));
    };

    let mut value = String::with_capacity(body.len());
    let mut escaped = false;
    for (idx, c) in body.char_indices() {
        if escaped {
            value.push(c);
            escaped = false;
        } else if c == '\\' {
            escaped = true;
        } else if c == '"' {
            let rest = &body[idx + c.len_utf8()..];
            if !rest.is_empty() {
                return Err(SyntaxError::TextAfterQuotedString {
                    chars: CharList::in_order(rest.chars()),
                });
            }
            break;
        } else {
            value.push(c);
        }
    }
    Ok((value, true))
}

fn parse_display_name(raw: &str) -> Result<Option<String>, SyntaxError> {
    let (name, quoted) = unquote(raw)?;

    if !quoted {
        let bad: Vec<char> = name
            .chars()
            .filter(|&c| !is_atext_intl(c) && c != ' ')
            .collect();
        if !bad.is_empty() {
            return Err(SyntaxError::DisplayNameInvalidCharacters {
                chars: CharList::by_display(bad),
            });
        }
    }
    check_unsafe_chars(&name, true)?;

    if name.is_empty() {
        Ok(None)
    } else {
        Ok(Some(name.nfc().collect()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_address() {
        let split = split_email("me@example.com").unwrap();
        assert_eq!(split.display_name, None);
        assert!(!split.angle_brackets);
        assert_eq!(split.addr_spec, "me@example.com");
        assert_eq!(split.local, AddressPart::DottedAtom("me".into()));
        assert_eq!(split.domain, "example.com");
    }

    #[test]
    fn quoted_local_part_may_hold_at_signs() {
        let split = split_email(r#""me@\"x\""@example.com"#).unwrap();
        assert_eq!(split.local, AddressPart::QuotedString(r#"me@"x""#.into()));
        assert_eq!(split.domain, "example.com");
    }

    #[test]
    fn display_name_forms() {
        let split = split_email("My Name <me@example.com>").unwrap();
        assert_eq!(split.display_name.as_deref(), Some("My Name"));
        assert_eq!(split.addr_spec, "me@example.com");
        assert_eq!(split.domain, "example.com");

        let split = split_email(r#""Last, First" <me@example.com>  "#).unwrap();
        assert_eq!(split.display_name.as_deref(), Some("Last, First"));

        let split = split_email("<me@example.com>").unwrap();
        assert_eq!(split.display_name, None);
        assert!(split.angle_brackets);
    }

    #[test]
    fn display_name_errors() {
        assert_eq!(
            split_email("My.Name <me@example.com>"),
            Err(SyntaxError::DisplayNameInvalidCharacters {
                chars: CharList::by_display(['.'])
            })
        );
        assert_eq!(
            split_email("Name <me@example.com"),
            Err(SyntaxError::MissingCloseAngleBracket)
        );
        assert_eq!(
            split_email("Name <me@example.com> x"),
            Err(SyntaxError::TextAfterAngleBracket)
        );
    }

    #[test]
    fn combining_overlay_is_not_a_bracket() {
        // '<' + U+0338 normalizes to U+226E and must stay in the local part.
        let split = split_email("a<\u{0338}b@example.com").unwrap();
        assert_eq!(split.local, AddressPart::DottedAtom("a<\u{0338}b".into()));
        assert!(!split.angle_brackets);
    }

    #[test]
    fn at_sign_diagnostics() {
        assert_eq!(split_email("me.example.com"), Err(SyntaxError::NoAtSign));
        assert_eq!(
            split_email("me\u{FF20}example.com"),
            Err(SyntaxError::FullWidthAtSign)
        );
        assert_eq!(
            split_email("me\u{FE6B}example.com"),
            Err(SyntaxError::SmallCommercialAtSign)
        );
        assert_eq!(split_email("a@b@example.com"), Err(SyntaxError::MultipleAtSigns));
    }

    #[test]
    fn text_after_closing_quote() {
        let err = split_email(r#""a"bc@example.com"#).unwrap_err();
        insta::assert_snapshot!(err.to_string(), @"Extra character(s) found after close quote: 'b', 'c'.");
    }
}
