use unicode_normalization::UnicodeNormalization;

use super::chars::{
    LOCAL_PART_MAX_LENGTH, Side, check_dot_atom, is_atext, is_atext_intl, is_dot_atom,
    is_qtext_intl,
};
use super::error::{CharList, SyntaxError};
use super::safety::check_unsafe_chars;
use super::types::LocalPartInfo;

/// Validate the part before the @-sign. `local` is the unescaped content
/// when `quoted` is set.
pub(crate) fn validate_local_part(
    local: &str,
    allow_smtputf8: bool,
    allow_empty_local: bool,
    quoted: bool,
) -> Result<LocalPartInfo, SyntaxError> {
    if local.is_empty() {
        if !allow_empty_local {
            return Err(SyntaxError::LocalPartEmpty);
        }
        let local_part = if quoted { "\"\"" } else { "" };
        return Ok(ascii_info(local_part.to_string()));
    }

    let len = local.chars().count();
    if len > LOCAL_PART_MAX_LENGTH {
        return Err(SyntaxError::LocalPartTooLong {
            excess: len - LOCAL_PART_MAX_LENGTH,
        });
    }

    if is_dot_atom(local, is_atext) {
        return Ok(ascii_info(local.to_string()));
    }

    if is_dot_atom(local, is_atext_intl) {
        if !allow_smtputf8 {
            return Err(SyntaxError::InternationalizedLocalPart {
                chars: CharList::by_display(local.chars().filter(|&c| !is_atext(c) && c != '.')),
            });
        }
        check_unsafe_chars(local, false)?;
        if let Some(info) = revalidate_nfc(local, allow_smtputf8, quoted)? {
            return Ok(info);
        }
        return Ok(LocalPartInfo {
            local_part: local.to_string(),
            ascii_local_part: None,
            smtputf8: true,
        });
    }

    if quoted {
        return validate_quoted(local, allow_smtputf8);
    }

    let bad: Vec<char> = local
        .chars()
        .filter(|&c| !is_atext_intl(c) && c != '.')
        .collect();
    if !bad.is_empty() {
        return Err(SyntaxError::InvalidLocalCharacters {
            chars: CharList::by_display(bad),
        });
    }
    check_dot_atom(local, Side::Local)?;
    Err(SyntaxError::InvalidLocalPart)
}

fn validate_quoted(local: &str, allow_smtputf8: bool) -> Result<LocalPartInfo, SyntaxError> {
    let bad: Vec<char> = local.chars().filter(|&c| !is_qtext_intl(c)).collect();
    if !bad.is_empty() {
        return Err(SyntaxError::InvalidQuotedCharacters {
            chars: CharList::by_display(bad),
        });
    }

    let smtputf8 = !local.is_ascii();
    if smtputf8 && !allow_smtputf8 {
        return Err(SyntaxError::InternationalizedLocalPart {
            chars: CharList::by_display(local.chars().filter(|c| !c.is_ascii())),
        });
    }

    check_unsafe_chars(local, true)?;
    if let Some(info) = revalidate_nfc(local, allow_smtputf8, true)? {
        return Ok(info);
    }

    let requoted = format!("\"{}\"", local.replace('\\', "\\\\").replace('"', "\\\""));
    Ok(LocalPartInfo {
        ascii_local_part: (!smtputf8).then(|| requoted.clone()),
        local_part: requoted,
        smtputf8,
    })
}

/// The normalized form is what callers will use, so it has to pass on its
/// own. `None` when `local` is already NFC.
fn revalidate_nfc(
    local: &str,
    allow_smtputf8: bool,
    quoted: bool,
) -> Result<Option<LocalPartInfo>, SyntaxError> {
    let normalized: String = local.nfc().collect();
    if normalized == local {
        return Ok(None);
    }
    trace_event!(before = local, after = %normalized, "local part changed under NFC");
    validate_local_part(&normalized, allow_smtputf8, false, quoted)
        .map(Some)
        .map_err(SyntaxError::after_normalization)
}

fn ascii_info(local_part: String) -> LocalPartInfo {
    LocalPartInfo {
        ascii_local_part: Some(local_part.clone()),
        local_part,
        smtputf8: false,
    }
}
