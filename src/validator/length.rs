use super::chars::EMAIL_MAX_LENGTH;
use super::error::{SyntaxError, TotalLengthExcess};

/// The 254-octet limit applies to every form a caller might send: the address
/// as given, the normalized form, and the form with an IDNA ASCII domain.
pub(crate) fn check_total_length(
    addr_spec: &str,
    normalized: &str,
    ascii_form: &str,
) -> Result<(), SyntaxError> {
    if addr_spec.len() > EMAIL_MAX_LENGTH {
        return Err(SyntaxError::TooLong {
            excess: input_excess(addr_spec),
        });
    }
    if normalized.len() > EMAIL_MAX_LENGTH {
        return Err(SyntaxError::TooLong {
            excess: TotalLengthExcess::BytesAfterNormalization(normalized.len() - EMAIL_MAX_LENGTH),
        });
    }
    if ascii_form.len() > EMAIL_MAX_LENGTH {
        return Err(SyntaxError::TooLong {
            excess: TotalLengthExcess::BytesAfterIdna(ascii_form.len() - EMAIL_MAX_LENGTH),
        });
    }
    Ok(())
}

/// Octets over the limit, expressed as characters. With multi-byte
/// characters only a range can be given.
fn input_excess(email: &str) -> TotalLengthExcess {
    let diff = email.len() - EMAIL_MAX_LENGTH;
    if email.is_ascii() {
        return TotalLengthExcess::Characters(diff);
    }
    let widest = email.chars().map(char::len_utf8).max().unwrap_or(1);
    let min = (diff / widest).max(1);
    if min == diff {
        TotalLengthExcess::Characters(diff)
    } else {
        TotalLengthExcess::CharacterRange { min, max: diff }
    }
}
