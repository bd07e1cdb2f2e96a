//! ANSI/NIST-ITL transaction container parsing.
//!
//! An EFT file opens with a delimited-ASCII Type-1 record whose `1.03`
//! (CNT) field lists every following record as a `(type, idc)` pair. The
//! Type-2 record uses the same delimited encoding; Type-4 records are
//! fixed-width binary frames read by [`crate::type4`].

use log::debug;

use crate::demographics::Demographics;
use crate::error::{EftError, EftResult};
use crate::type4::Type4Record;

/// ASCII control delimiters used by delimited records.
pub const FS: u8 = 0x1c;
pub const GS: u8 = 0x1d;
pub const RS: u8 = 0x1e;
pub const US: u8 = 0x1f;

/// Read a big-endian u16 at `offset`, failing on a short buffer.
pub(crate) fn read_u16_be(bytes: &[u8], offset: usize) -> EftResult<u16> {
    match bytes.get(offset..offset + 2) {
        Some(b) => Ok(u16::from_be_bytes([b[0], b[1]])),
        None => Err(EftError::parse_at("unexpected end of data", offset)),
    }
}

/// Read a big-endian u32 at `offset`, failing on a short buffer.
pub(crate) fn read_u32_be(bytes: &[u8], offset: usize) -> EftResult<u32> {
    match bytes.get(offset..offset + 4) {
        Some(b) => Ok(u32::from_be_bytes([b[0], b[1], b[2], b[3]])),
        None => Err(EftError::parse_at("unexpected end of data", offset)),
    }
}

/// Tag-to-value map preserving the order tags appear in the record.
#[derive(Debug, Clone, Default)]
pub struct TagMap {
    entries: Vec<(String, String)>,
}

impl TagMap {
    pub fn new() -> Self {
        TagMap { entries: Vec::new() }
    }

    pub fn insert(&mut self, tag: &str, value: &str) {
        self.entries.push((tag.to_string(), value.to_string()));
    }

    pub fn get(&self, tag: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(t, _)| t == tag)
            .map(|(_, v)| v.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(t, v)| (t.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// One `(record type, IDC)` pair from the CNT manifest.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CntEntry {
    pub record_type: u32,
    pub idc: u32,
}

/// Parse result for one delimited-ASCII record.
struct AsciiRecord {
    tags: TagMap,
    /// Bytes consumed, including the FS terminator.
    span: usize,
}

/// Split one GS-delimited, FS-terminated record into a tag map.
///
/// Segments without a `':'` are skipped. The record's declared length
/// (`T.01`) wins over the observed span; without it the span up to and
/// including the FS byte is used.
fn read_ascii_record(bytes: &[u8], offset: usize, record_type: u32) -> EftResult<AsciiRecord> {
    if offset >= bytes.len() {
        return Err(EftError::parse_record("unexpected end of data", offset, record_type));
    }
    let fs_pos = bytes[offset..]
        .iter()
        .position(|&b| b == FS)
        .map(|p| offset + p)
        .ok_or_else(|| EftError::parse_record("No FS terminator", offset, record_type))?;

    let mut tags = TagMap::new();
    for segment in bytes[offset..fs_pos].split(|&b| b == GS) {
        let colon = match segment.iter().position(|&b| b == b':') {
            Some(pos) => pos,
            None => continue,
        };
        let tag = String::from_utf8_lossy(&segment[..colon]);
        let value = String::from_utf8_lossy(&segment[colon + 1..]);
        tags.insert(&tag, &value);
    }

    let length_tag = format!("{}.01", record_type);
    let span = tags
        .get(&length_tag)
        .and_then(|v| v.trim().parse::<usize>().ok())
        .unwrap_or(fs_pos - offset + 1);

    debug!(
        "type-{} ASCII record at {}: {} tags, span {}",
        record_type,
        offset,
        tags.len(),
        span
    );
    Ok(AsciiRecord { tags, span })
}

/// Decode the `1.03` field into the ordered record listing. The first
/// subfield describes the Type-1 record itself and is discarded.
fn parse_cnt(value: &str, offset: usize) -> EftResult<Vec<CntEntry>> {
    let mut entries = Vec::new();
    for subfield in value.split(RS as char).skip(1) {
        let mut fields = subfield.split(US as char);
        let record_type = fields.next().and_then(|f| f.trim().parse::<u32>().ok());
        let idc = fields.next().and_then(|f| f.trim().parse::<u32>().ok());
        match (record_type, idc) {
            (Some(record_type), Some(idc)) => entries.push(CntEntry { record_type, idc }),
            _ => return Err(EftError::parse_at("Malformed CNT", offset)),
        }
    }
    Ok(entries)
}

/// Fully parsed EFT transaction.
#[derive(Debug)]
pub struct EftFile<'a> {
    pub type1: TagMap,
    pub type2: Demographics,
    pub type4_records: Vec<Type4Record<'a>>,
    pub file_size: usize,
}

/// Parse an EFT byte buffer into its records.
///
/// Pure function of the input: image payloads borrow from `bytes` until
/// the caller decodes them.
pub fn parse(bytes: &[u8]) -> EftResult<EftFile<'_>> {
    let type1 = read_ascii_record(bytes, 0, 1)?;

    let cnt_value = type1
        .tags
        .get("1.03")
        .ok_or_else(|| EftError::parse_at("Missing CNT field (1.03)", 0))?;
    let cnt = parse_cnt(cnt_value, 0)?;
    debug!("CNT lists {} records after Type-1", cnt.len());

    let mut offset = type1.span;
    let type2 = read_ascii_record(bytes, offset, 2)?;
    offset += type2.span;

    let mut type4_records = Vec::new();
    for entry in &cnt {
        match entry.record_type {
            2 => {}
            4 => {
                let record = Type4Record::read(bytes, offset, entry.idc)?;
                offset += record.length as usize;
                type4_records.push(record);
            }
            other => {
                return Err(EftError::parse_record(
                    format!("Unsupported record type {}", other),
                    offset,
                    other,
                ));
            }
        }
    }

    Ok(EftFile {
        type1: type1.tags,
        type2: Demographics::from_tags(type2.tags),
        type4_records,
        file_size: bytes.len(),
    })
}

#[cfg(test)]
pub(crate) mod test_fixtures {
    use super::*;

    /// Assemble a delimited-ASCII record with a correct `T.01` length.
    pub fn ascii_record(record_type: u32, tags: &[(&str, &str)]) -> Vec<u8> {
        // The length field counts its own digits; iterate until stable.
        let mut declared = 1;
        loop {
            let record = render(record_type, declared, tags);
            if record.len() == declared {
                return record;
            }
            declared = record.len();
        }
    }

    fn render(record_type: u32, declared: usize, tags: &[(&str, &str)]) -> Vec<u8> {
        let mut out = Vec::new();
        out.extend_from_slice(format!("{}.01:{}", record_type, declared).as_bytes());
        for (tag, value) in tags {
            out.push(GS);
            out.extend_from_slice(format!("{}:{}", tag, value).as_bytes());
        }
        out.push(FS);
        out
    }

    pub fn type4_record(idc: u8, finger: u8, payload: &[u8]) -> Vec<u8> {
        let length = 18 + payload.len() as u32;
        let mut out = Vec::new();
        out.extend_from_slice(&length.to_be_bytes());
        out.push(idc); // IDC
        out.push(1); // impression type: live-scan rolled
        out.push(finger);
        out.extend_from_slice(&[0, 0, 0, 0, 0]); // reserved FGP bytes
        out.push(0); // ISR: 500 PPI default
        out.extend_from_slice(&545u16.to_be_bytes()); // HLL
        out.extend_from_slice(&622u16.to_be_bytes()); // VLL
        out.push(1); // compression: WSQ
        out.extend_from_slice(payload);
        out
    }

    /// A small two-image transaction used across parser tests.
    pub fn sample_transaction() -> Vec<u8> {
        let cnt = format!("1{US}3{RS}2{US}0{RS}4{US}1{RS}4{US}2", US = US as char, RS = RS as char);
        let type1 = ascii_record(1, &[("1.02", "0300"), ("1.03", &cnt), ("1.04", "CAR")]);
        let type2 = ascii_record(
            2,
            &[
                ("2.018", "SCOTT,MICHAEL"),
                ("2.022", "19620315"),
                ("2.024", "M"),
                ("2.027", "511"),
                ("2.067", "TESTSCAN\u{1f}MODEL1\u{1f}SN001"),
            ],
        );

        let mut bytes = Vec::new();
        bytes.extend_from_slice(&type1);
        bytes.extend_from_slice(&type2);
        bytes.extend_from_slice(&type4_record(1, 6, &[0xAA; 40]));
        bytes.extend_from_slice(&type4_record(2, 2, &[0xBB; 24]));
        bytes
    }
}

#[cfg(test)]
mod tests {
    use super::test_fixtures::*;
    use super::*;

    #[test]
    fn test_parse_sample_transaction() {
        let bytes = sample_transaction();
        let eft = parse(&bytes).unwrap();

        assert_eq!(eft.file_size, bytes.len());
        assert_eq!(eft.type4_records.len(), 2);
        assert_eq!(eft.type1.get("1.04"), Some("CAR"));
        assert_eq!(eft.type2.full_name().as_deref(), Some("Michael Scott"));
        assert_eq!(eft.type2.scanner.as_ref().unwrap().make, "TESTSCAN");

        let first = &eft.type4_records[0];
        assert_eq!(first.idc, 1);
        assert_eq!(first.finger_position, 6);
        assert_eq!(first.width, 545);
        assert_eq!(first.height, 622);
        assert_eq!(first.ppi(), 500);
        assert_eq!(first.image_data.len(), 40);
    }

    #[test]
    fn test_record_lengths_tile_the_file() {
        let bytes = sample_transaction();
        let eft = parse(&bytes).unwrap();

        for record in &eft.type4_records {
            assert!(record.offset + record.length as usize <= eft.file_size);
        }
        let type4_total: usize = eft.type4_records.iter().map(|r| r.length as usize).sum();
        let last = eft.type4_records.last().unwrap();
        assert_eq!(last.offset + last.length as usize, eft.file_size);
        assert!(type4_total < eft.file_size);
    }

    #[test]
    fn test_parse_is_pure() {
        let bytes = sample_transaction();
        let first = parse(&bytes).unwrap();
        let second = parse(&bytes).unwrap();
        assert_eq!(first.type4_records.len(), second.type4_records.len());
        assert_eq!(first.type4_records[0].image_data, second.type4_records[0].image_data);
        assert_eq!(first.type2.full_name(), second.type2.full_name());
    }

    #[test]
    fn test_empty_and_tiny_inputs_fail() {
        assert_eq!(parse(&[]).unwrap_err().kind(), "ParseError");
        assert_eq!(parse(&[0x41]).unwrap_err().kind(), "ParseError");
    }

    #[test]
    fn test_missing_fs_terminator() {
        let err = parse(b"1.01:30 random ascii with no terminator").unwrap_err();
        assert!(err.to_string().contains("No FS terminator"));
    }

    #[test]
    fn test_missing_cnt_fails() {
        let type1 = ascii_record(1, &[("1.02", "0300")]);
        let err = parse(&type1).unwrap_err();
        assert!(err.to_string().contains("1.03"));
    }

    #[test]
    fn test_malformed_cnt_fails() {
        let cnt = format!("1{US}1{RS}2{US}x", US = US as char, RS = RS as char);
        let type1 = ascii_record(1, &[("1.03", &cnt)]);
        let err = parse(&type1).unwrap_err();
        assert!(err.to_string().contains("Malformed CNT"));
    }

    #[test]
    fn test_unsupported_record_type() {
        let cnt = format!("1{US}2{RS}2{US}0{RS}7{US}1", US = US as char, RS = RS as char);
        let mut bytes = ascii_record(1, &[("1.03", &cnt)]);
        bytes.extend_from_slice(&ascii_record(2, &[("2.024", "M")]));
        let err = parse(&bytes).unwrap_err();
        assert!(err.to_string().contains("Unsupported record type 7"));
        assert!(err.to_string().contains("record type 7"));
    }

    #[test]
    fn test_cnt_entry_count_matches_type4_records() {
        let bytes = sample_transaction();
        let eft = parse(&bytes).unwrap();
        let cnt = parse_cnt(eft.type1.get("1.03").unwrap(), 0).unwrap();
        let declared = cnt.iter().filter(|e| e.record_type == 4).count();
        assert_eq!(declared, eft.type4_records.len());
    }

    #[test]
    fn test_declared_length_fallback_without_t01() {
        // No T.01 tag: the span up to and including FS is used.
        let cnt = format!("1{US}1{RS}2{US}0", US = US as char, RS = RS as char);
        let mut bytes = Vec::new();
        bytes.extend_from_slice(format!("1.03:{}", cnt).as_bytes());
        bytes.push(FS);
        bytes.extend_from_slice(&ascii_record(2, &[("2.024", "F")]));

        let eft = parse(&bytes).unwrap();
        assert_eq!(eft.type2.sex.as_deref(), Some("F"));
    }

    #[test]
    fn test_segments_without_colon_are_skipped() {
        let cnt = format!("1{US}1{RS}2{US}0", US = US as char, RS = RS as char);
        let type1 = ascii_record(1, &[("1.03", &cnt)]);
        // Splice a colon-free segment into the Type-1 record.
        let mut bytes = Vec::new();
        let fs = type1.iter().position(|&b| b == FS).unwrap();
        bytes.extend_from_slice(&type1[..fs]);
        bytes.push(GS);
        bytes.extend_from_slice(b"junk without separator");
        bytes.push(FS);
        bytes.extend_from_slice(&ascii_record(2, &[]));

        // The T.01 length is now stale, but the declared length is trusted
        // only for advancing; the splice grew the record past it, so parse
        // from the tag map still succeeds.
        let record = read_ascii_record(&bytes, 0, 1).unwrap();
        assert!(record.tags.get("1.03").is_some());
        assert_eq!(record.tags.len(), 2);
    }
}
