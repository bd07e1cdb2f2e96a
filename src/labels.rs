//! Code-to-label lookup tables for ANSI/NIST-ITL record fields.
//!
//! Unknown codes never fail lookups; the record-level accessors fall back
//! to an `"Unknown (N)"` label so unusual files still render.

/// Finger position codes 1..=14 with display name and filename slug.
pub const FINGER_POSITIONS: [(u8, &str, &str); 14] = [
    (1, "Right Thumb", "right-thumb"),
    (2, "Right Index", "right-index"),
    (3, "Right Middle", "right-middle"),
    (4, "Right Ring", "right-ring"),
    (5, "Right Little", "right-little"),
    (6, "Left Thumb", "left-thumb"),
    (7, "Left Index", "left-index"),
    (8, "Left Middle", "left-middle"),
    (9, "Left Ring", "left-ring"),
    (10, "Left Little", "left-little"),
    (11, "Plain Right Thumb", "plain-right-thumb"),
    (12, "Plain Left Thumb", "plain-left-thumb"),
    (13, "Plain Right Four Fingers", "plain-right-four"),
    (14, "Plain Left Four Fingers", "plain-left-four"),
];

pub fn finger_name(position: u8) -> Option<&'static str> {
    FINGER_POSITIONS
        .iter()
        .find(|(code, _, _)| *code == position)
        .map(|(_, name, _)| *name)
}

pub fn finger_slug(position: u8) -> Option<&'static str> {
    FINGER_POSITIONS
        .iter()
        .find(|(code, _, _)| *code == position)
        .map(|(_, _, slug)| *slug)
}

/// Type-4 impression type codes.
pub fn impression_name(code: u8) -> Option<&'static str> {
    match code {
        0 => Some("Live-scan plain"),
        1 => Some("Live-scan rolled"),
        2 => Some("Nonlive-scan plain"),
        3 => Some("Nonlive-scan rolled"),
        4 => Some("Latent impression"),
        5 => Some("Latent tracing"),
        6 => Some("Latent photo"),
        7 => Some("Latent lift"),
        8 => Some("Live-scan vertical swipe"),
        _ => None,
    }
}

/// Type-4 grayscale compression algorithm codes.
pub fn compression_name(code: u8) -> Option<&'static str> {
    match code {
        0 => Some("Uncompressed"),
        1 => Some("WSQ"),
        2 => Some("JPEGB"),
        3 => Some("JPEGL"),
        4 => Some("JPEG 2000"),
        5 => Some("PNG"),
        _ => None,
    }
}

pub fn sex_label(code: &str) -> Option<&'static str> {
    match code {
        "M" => Some("Male"),
        "F" => Some("Female"),
        "U" => Some("Unknown"),
        _ => None,
    }
}

pub fn race_label(code: &str) -> Option<&'static str> {
    match code {
        "A" => Some("Asian or Pacific Islander"),
        "B" => Some("Black"),
        "I" => Some("American Indian or Alaskan Native"),
        "W" => Some("White"),
        "U" => Some("Unknown"),
        _ => None,
    }
}

pub fn eye_color_label(code: &str) -> Option<&'static str> {
    match code {
        "BLK" => Some("Black"),
        "BLU" => Some("Blue"),
        "BRO" => Some("Brown"),
        "GRN" => Some("Green"),
        "GRY" => Some("Gray"),
        "HAZ" => Some("Hazel"),
        "MAR" => Some("Maroon"),
        "MUL" => Some("Multicolored"),
        "PNK" => Some("Pink"),
        "XXX" => Some("Unknown"),
        _ => None,
    }
}

pub fn hair_color_label(code: &str) -> Option<&'static str> {
    match code {
        "BAL" => Some("Bald"),
        "BLK" => Some("Black"),
        "BLN" => Some("Blond"),
        "BRO" => Some("Brown"),
        "GRY" => Some("Gray"),
        "RED" => Some("Red"),
        "SDY" => Some("Sandy"),
        "WHI" => Some("White"),
        "XXX" => Some("Unknown"),
        _ => None,
    }
}
