//! Shaping of raw Type-2 tag values into structured demographics.
//!
//! Every field is optional: Type-2 content is operator-defined and sparse
//! in practice. The raw tag map is always retained alongside the shaped
//! fields.

use crate::eft::TagMap;

/// Tags recognized by the shaper (FBI EFTS numbering).
const TAG_NAME: &str = "2.018";
const TAG_DOB: &str = "2.022";
const TAG_SEX: &str = "2.024";
const TAG_RACE: &str = "2.025";
const TAG_HEIGHT: &str = "2.027";
const TAG_WEIGHT: &str = "2.029";
const TAG_EYE_COLOR: &str = "2.031";
const TAG_HAIR_COLOR: &str = "2.032";
const TAG_PURPOSE: &str = "2.037";
const TAG_DATE_CAPTURED: &str = "2.038";
const TAG_ADDRESS: &str = "2.041";
const TAG_SCANNER: &str = "2.067";

const UNIT_SEPARATOR: char = '\u{1f}';

const MONTH_NAMES: [&str; 12] = [
    "January",
    "February",
    "March",
    "April",
    "May",
    "June",
    "July",
    "August",
    "September",
    "October",
    "November",
    "December",
];

/// Name parsed from the `"LAST,FIRST MIDDLE"` convention.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersonName {
    pub last: String,
    pub first: String,
    pub middle: String,
}

impl PersonName {
    /// Parse a raw name value. The first comma splits last name from the
    /// rest; the rest splits on whitespace runs into first and middle.
    pub fn parse(raw: &str) -> Self {
        let (last, rest) = match raw.split_once(',') {
            Some((last, rest)) => (last, rest),
            None => (raw, ""),
        };

        let mut tokens = rest.split_whitespace();
        let first = tokens.next().unwrap_or("");
        let middle = tokens.collect::<Vec<_>>().join(" ");

        PersonName {
            last: title_case(last),
            first: title_case(first),
            middle: title_case(&middle),
        }
    }

    /// `"First Middle Last"` with empty components omitted.
    pub fn full_name(&self) -> String {
        [&self.first, &self.middle, &self.last]
            .iter()
            .filter(|part| !part.is_empty())
            .map(|part| part.as_str())
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Calendar date without range validation; month/day are stored as read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PartialDate {
    pub year: i32,
    pub month: u32,
    pub day: u32,
}

impl PartialDate {
    /// Parse a `YYYYMMDD` value. Returns `None` for anything that is not
    /// eight digits; month and day are not bounds-checked.
    pub fn parse(raw: &str) -> Option<Self> {
        if raw.len() != 8 || !raw.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        Some(PartialDate {
            year: raw[0..4].parse().ok()?,
            month: raw[4..6].parse().ok()?,
            day: raw[6..8].parse().ok()?,
        })
    }
}

/// Capture device tuple from tag 2.067.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScannerInfo {
    pub make: String,
    pub model: String,
    pub serial: String,
}

impl ScannerInfo {
    fn parse(raw: &str) -> Self {
        let mut parts = raw.split(UNIT_SEPARATOR);
        ScannerInfo {
            make: parts.next().unwrap_or("").to_string(),
            model: parts.next().unwrap_or("").to_string(),
            serial: parts.next().unwrap_or("").to_string(),
        }
    }
}

/// Structured view of a Type-2 record.
#[derive(Debug, Clone)]
pub struct Demographics {
    pub raw: TagMap,
    pub name: Option<PersonName>,
    pub dob: Option<PartialDate>,
    pub date_captured: Option<PartialDate>,
    pub sex: Option<String>,
    pub race: Option<String>,
    pub eye_color: Option<String>,
    pub hair_color: Option<String>,
    pub purpose: Option<String>,
    pub address: Option<String>,
    pub height: Option<String>,
    pub weight: Option<u32>,
    pub scanner: Option<ScannerInfo>,
}

impl Demographics {
    pub fn from_tags(raw: TagMap) -> Self {
        let get = |tag: &str| raw.get(tag).map(|v| v.to_string());

        Demographics {
            name: raw.get(TAG_NAME).map(PersonName::parse),
            dob: raw.get(TAG_DOB).and_then(PartialDate::parse),
            date_captured: raw.get(TAG_DATE_CAPTURED).and_then(PartialDate::parse),
            sex: get(TAG_SEX),
            race: get(TAG_RACE),
            eye_color: get(TAG_EYE_COLOR),
            hair_color: get(TAG_HAIR_COLOR),
            purpose: get(TAG_PURPOSE),
            address: get(TAG_ADDRESS),
            height: get(TAG_HEIGHT),
            weight: raw.get(TAG_WEIGHT).and_then(|v| v.parse().ok()),
            scanner: raw.get(TAG_SCANNER).map(ScannerInfo::parse),
            raw,
        }
    }

    pub fn full_name(&self) -> Option<String> {
        self.name.as_ref().map(PersonName::full_name)
    }
}

/// Lowercase the input, then uppercase each character that follows a word
/// boundary. Used for name components only.
pub fn title_case(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut at_boundary = true;
    for ch in value.chars() {
        if ch.is_alphanumeric() {
            if at_boundary {
                out.extend(ch.to_uppercase());
            } else {
                out.extend(ch.to_lowercase());
            }
            at_boundary = false;
        } else {
            out.push(ch);
            at_boundary = true;
        }
    }
    out
}

/// Render a height code: three or four digits `FII`/`FIII` become
/// `F'II"`; anything else passes through unchanged.
pub fn format_height(value: &str) -> String {
    let digits = value.len() == 3 || value.len() == 4;
    if digits && value.bytes().all(|b| b.is_ascii_digit()) {
        format!("{}'{}\"", &value[0..1], &value[1..])
    } else {
        value.to_string()
    }
}

/// Render a date as `"<Month> <day>, <year>"`. A missing date renders as
/// `"Unknown"`; an out-of-range month renders as `"Unknown"` in the month
/// slot only.
pub fn format_date(date: Option<&PartialDate>) -> String {
    match date {
        None => "Unknown".to_string(),
        Some(date) => {
            let month = if date.month >= 1 && date.month <= 12 {
                MONTH_NAMES[(date.month - 1) as usize]
            } else {
                "Unknown"
            };
            format!("{} {}, {}", month, date.day, date.year)
        }
    }
}
