//! Type-4 high-resolution grayscale fingerprint records.
//!
//! An 18-byte fixed header followed by an opaque image payload. Only the
//! first byte of the six-byte FGP field is significant to this reader.

use crate::eft::{read_u16_be, read_u32_be};
use crate::error::{EftError, EftResult};
use crate::labels;

/// Header size in bytes, included in the record's declared length.
pub const TYPE4_HEADER_LEN: usize = 18;

#[derive(Debug, Clone)]
pub struct Type4Record<'a> {
    /// Byte offset of the record within the transaction.
    pub offset: usize,
    /// Total record size, header included.
    pub length: u32,
    pub idc: u8,
    pub impression_type: u8,
    /// First byte of the FGP field; the remaining five are reserved.
    pub finger_position: u8,
    /// Image scanning resolution code; zero means 500 PPI.
    pub isr: u8,
    pub width: u16,
    pub height: u16,
    pub compression: u8,
    /// Compressed payload, borrowed from the transaction buffer.
    pub image_data: &'a [u8],
}

impl<'a> Type4Record<'a> {
    /// Read one record at `offset`, checking its IDC against the CNT
    /// manifest entry.
    pub fn read(bytes: &'a [u8], offset: usize, expected_idc: u32) -> EftResult<Self> {
        if offset + TYPE4_HEADER_LEN > bytes.len() {
            return Err(EftError::parse_record(
                "Type-4 header truncated",
                offset,
                4,
            ));
        }

        let length = read_u32_be(bytes, offset)?;
        if (length as usize) < TYPE4_HEADER_LEN {
            return Err(EftError::parse_record(
                format!("Type-4 length {} smaller than header", length),
                offset,
                4,
            ));
        }
        if offset + length as usize > bytes.len() {
            return Err(EftError::parse_record(
                format!("Type-4 length {} exceeds buffer", length),
                offset,
                4,
            ));
        }

        let idc = bytes[offset + 4];
        if u32::from(idc) != expected_idc {
            return Err(EftError::parse_record(
                format!("IDC mismatch: CNT declares {}, record has {}", expected_idc, idc),
                offset,
                4,
            ));
        }

        Ok(Type4Record {
            offset,
            length,
            idc,
            impression_type: bytes[offset + 5],
            finger_position: bytes[offset + 6],
            isr: bytes[offset + 12],
            width: read_u16_be(bytes, offset + 13)?,
            height: read_u16_be(bytes, offset + 15)?,
            compression: bytes[offset + 17],
            image_data: &bytes[offset + TYPE4_HEADER_LEN..offset + length as usize],
        })
    }

    /// Scanning resolution in pixels per inch. The zero code means the
    /// 500 PPI default; any other value is reported verbatim.
    pub fn ppi(&self) -> u32 {
        if self.isr == 0 {
            500
        } else {
            u32::from(self.isr)
        }
    }

    pub fn impression_name(&self) -> String {
        labels::impression_name(self.impression_type)
            .map(str::to_string)
            .unwrap_or_else(|| format!("Unknown ({})", self.impression_type))
    }

    pub fn finger_name(&self) -> String {
        labels::finger_name(self.finger_position)
            .map(str::to_string)
            .unwrap_or_else(|| format!("Unknown ({})", self.finger_position))
    }

    pub fn compression_name(&self) -> String {
        labels::compression_name(self.compression)
            .map(str::to_string)
            .unwrap_or_else(|| format!("Unknown ({})", self.compression))
    }
}
