//! Finger position resolution and record selection helpers for callers.

use crate::error::{EftError, EftResult};
use crate::labels;
use crate::type4::Type4Record;

/// Resolve a user-supplied finger selector to a position code.
///
/// Accepts `None` (no filtering), a decimal string `1..=14`, or an alias
/// such as `right_thumb` / `Right-Thumb` / `RIGHT THUMB`. Anything else is
/// a validation failure.
pub fn resolve_finger(input: Option<&str>) -> EftResult<Option<u8>> {
    let input = match input {
        None => return Ok(None),
        Some(value) if value.is_empty() => return Ok(None),
        Some(value) => value,
    };

    if input.bytes().all(|b| b.is_ascii_digit()) {
        let position: u32 = input
            .parse()
            .map_err(|_| EftError::Validation(format!("Unknown finger position '{}'", input)))?;
        if (1..=14).contains(&position) {
            return Ok(Some(position as u8));
        }
        return Err(EftError::Validation(format!(
            "Finger position {} out of range (1-14)",
            position
        )));
    }

    let normalized: String = input
        .to_lowercase()
        .chars()
        .map(|c| if c == '-' || c == ' ' { '_' } else { c })
        .collect();

    for (code, _, slug) in labels::FINGER_POSITIONS {
        if slug.replace('-', "_") == normalized {
            return Ok(Some(code));
        }
    }

    Err(EftError::Validation(format!(
        "Unknown finger position '{}'",
        input
    )))
}

/// Filter Type-4 records by a finger selector. An empty selector keeps
/// everything; a resolved selector with no matching record fails.
pub fn filter_records<'a, 'b>(
    records: &'b [Type4Record<'a>],
    selector: Option<&str>,
) -> EftResult<Vec<&'b Type4Record<'a>>> {
    let position = match resolve_finger(selector)? {
        None => return Ok(records.iter().collect()),
        Some(position) => position,
    };

    let matches: Vec<_> = records
        .iter()
        .filter(|r| r.finger_position == position)
        .collect();
    if matches.is_empty() {
        return Err(EftError::Validation(format!(
            "No record matches finger position {}",
            position
        )));
    }
    Ok(matches)
}

/// Build an export filename: `<pos padded to 2>-<slug>.<format>`, with
/// `finger-<pos>` standing in for unknown positions. Format defaults to
/// `tiff`.
pub fn export_filename(position: u8, format: Option<&str>) -> String {
    let format = format.unwrap_or("tiff");
    match labels::finger_slug(position) {
        Some(slug) => format!("{:02}-{}.{}", position, slug, format),
        None => format!("{:02}-finger-{}.{}", position, position, format),
    }
}
