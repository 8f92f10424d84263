use unicode_general_category::{GeneralCategory, get_general_category};

use super::error::{CharList, SyntaxError};

enum CategoryClass {
    Visible,
    Mark,
    SpaceSeparator,
    Other,
}

fn classify(c: char) -> CategoryClass {
    use GeneralCategory::*;
    match get_general_category(c) {
        UppercaseLetter | LowercaseLetter | TitlecaseLetter | ModifierLetter | OtherLetter
        | DecimalNumber | LetterNumber | OtherNumber | ConnectorPunctuation | DashPunctuation
        | OpenPunctuation | ClosePunctuation | InitialPunctuation | FinalPunctuation
        | OtherPunctuation | MathSymbol | CurrencySymbol | ModifierSymbol | OtherSymbol => {
            CategoryClass::Visible
        }
        NonspacingMark | SpacingMark | EnclosingMark => CategoryClass::Mark,
        SpaceSeparator => CategoryClass::SpaceSeparator,
        // line/paragraph separators, control, format, private use, unassigned
        _ => CategoryClass::Other,
    }
}

/// Whether `c` would make an address unsafe to display or concatenate.
///
/// Letters, numbers, punctuation and symbols are always safe. Combining marks
/// are unsafe only in `leading` position, where they would combine with text
/// placed before the address. Space separators are accepted only when
/// `allow_space` is set (quoted strings and display names). Everything else,
/// including categories added by future Unicode versions, is unsafe.
pub fn is_unsafe(c: char, leading: bool, allow_space: bool) -> bool {
    match classify(c) {
        CategoryClass::Visible => false,
        CategoryClass::Mark => leading,
        CategoryClass::SpaceSeparator => !allow_space,
        CategoryClass::Other => true,
    }
}

/// Printable form of `c` for error messages: quoted when it is a letter,
/// number, punctuation or symbol, otherwise its Unicode name or `U+XXXX`.
pub fn safe_character_display(c: char) -> String {
    if c == '\\' {
        return "\"\\\"".to_string();
    }
    if matches!(classify(c), CategoryClass::Visible) {
        return if c == '\'' {
            "\"'\"".to_string()
        } else {
            format!("'{c}'")
        };
    }
    match unicode_names2::name(c) {
        Some(name) => name.to_string(),
        None => {
            let cp = u32::from(c);
            if cp <= 0xFFFF {
                format!("U+{cp:04X}")
            } else {
                format!("U+{cp:08X}")
            }
        }
    }
}

/// Reject `s` when it holds any unsafe character, naming each one.
pub fn check_unsafe_chars(s: &str, allow_space: bool) -> Result<(), SyntaxError> {
    let bad: Vec<char> = s
        .chars()
        .enumerate()
        .filter(|(idx, c)| is_unsafe(*c, *idx == 0, allow_space))
        .map(|(_, c)| c)
        .collect();
    if bad.is_empty() {
        Ok(())
    } else {
        Err(SyntaxError::UnsafeCharacters {
            chars: CharList::by_code_point(bad),
        })
    }
}
