//! Top-level WSQ decoding: frame header parsing, table management, the
//! entropy-coded block loop, and final pixel conversion.

use log::debug;

use crate::bitstream::{self, MarkerContext, WsqReader};
use crate::entropy::{self, Codebook, HuffmanTable, MAX_HUFFMAN_TABLES};
use crate::error::{EftError, EftResult};
use crate::quantization::{self, read_scaled_u16, QuantTable};
use crate::subbands::{build_quant_tree, build_wavelet_tree};
use crate::wavelet::{self, TransformTable};

/// Decoded grayscale raster: row-major, one byte per pixel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedImage {
    pub width: usize,
    pub height: usize,
    pub pixels: Vec<u8>,
}

/// SOF frame header fields.
#[derive(Debug, Clone)]
pub struct FrameHeader {
    pub black: u8,
    pub white: u8,
    pub width: usize,
    pub height: usize,
    pub m_shift: f32,
    pub r_scale: f32,
    pub encoder: u8,
    pub software: u16,
}

impl FrameHeader {
    /// Parse the SOF segment body (after its marker).
    pub fn parse(reader: &mut WsqReader<'_>) -> EftResult<Self> {
        let _table_len = reader.read_u16()?;
        let black = reader.read_byte()?;
        let white = reader.read_byte()?;
        let height = usize::from(reader.read_u16()?);
        let width = usize::from(reader.read_u16()?);
        let m_shift = read_scaled_u16(reader)?;
        let r_scale = read_scaled_u16(reader)?;
        let encoder = reader.read_byte()?;
        let software = reader.read_u16()?;

        if width == 0 || height == 0 {
            return Err(EftError::decode_at("Frame with zero dimension", reader.position()));
        }
        Ok(FrameHeader {
            black,
            white,
            width,
            height,
            m_shift,
            r_scale,
            encoder,
            software,
        })
    }
}

/// Tables accumulated while walking the codestream.
#[derive(Default)]
struct TableSet {
    transform: Option<TransformTable>,
    quant: Option<QuantTable>,
    huffman: [Option<HuffmanTable>; MAX_HUFFMAN_TABLES],
}

impl TableSet {
    fn process(&mut self, marker: u16, reader: &mut WsqReader<'_>) -> EftResult<()> {
        match marker {
            bitstream::DTT => {
                self.transform = Some(TransformTable::parse(reader)?);
            }
            bitstream::DQT => {
                self.quant = Some(QuantTable::parse(reader)?);
            }
            bitstream::DHT => {
                for (id, table) in entropy::parse_dht(reader)? {
                    let slot = usize::from(id);
                    if slot >= MAX_HUFFMAN_TABLES {
                        return Err(EftError::decode(format!(
                            "Huffman table id {} out of range",
                            id
                        )));
                    }
                    if self.huffman[slot].is_some() {
                        return Err(EftError::decode(format!(
                            "Huffman table {} already defined",
                            id
                        )));
                    }
                    self.huffman[slot] = Some(table);
                }
            }
            bitstream::COM => {
                let length = usize::from(reader.read_u16()?);
                debug!("skipping {} byte comment", length.saturating_sub(2));
                reader.skip(length.saturating_sub(2))?;
            }
            _ => {
                return Err(EftError::decode_at(
                    "Premature end of image before frame data",
                    reader.position(),
                ));
            }
        }
        Ok(())
    }
}

/// Decode one WSQ codestream into a grayscale raster.
///
/// Deterministic: identical input bytes produce identical pixels. All
/// working state lives in this call.
pub fn decode(data: &[u8]) -> EftResult<DecodedImage> {
    let mut reader = WsqReader::new(data);
    reader.read_marker(MarkerContext::Soi)?;

    let mut tables = TableSet::default();
    let frame = loop {
        let marker = reader.read_marker(MarkerContext::TablesOrSof)?;
        if marker == bitstream::SOF {
            break FrameHeader::parse(&mut reader)?;
        }
        tables.process(marker, &mut reader)?;
    };
    debug!(
        "frame {}x{}, m_shift {}, r_scale {}",
        frame.width, frame.height, frame.m_shift, frame.r_scale
    );

    let wtree = build_wavelet_tree(frame.width, frame.height);
    let qtree = build_quant_tree(&wtree);

    let coeffs = decode_blocks(&mut reader, &mut tables, frame.width * frame.height)?;

    let quant = tables
        .quant
        .as_ref()
        .ok_or_else(|| EftError::decode("Quantization table not defined"))?;
    let mut plane = quantization::unquantize(&coeffs, quant, &qtree, frame.width, frame.height)?;

    let transform = tables
        .transform
        .as_ref()
        .ok_or_else(|| EftError::decode("Transform filter coefficients not defined"))?;
    wavelet::reconstruct(&mut plane, frame.width, frame.height, &wtree, transform)?;

    Ok(DecodedImage {
        width: frame.width,
        height: frame.height,
        pixels: to_pixels(&plane, frame.m_shift, frame.r_scale),
    })
}

/// Run the entropy-coded block loop until EOI, producing exactly
/// `expected` quantized coefficients in subband order.
fn decode_blocks(
    reader: &mut WsqReader<'_>,
    tables: &mut TableSet,
    expected: usize,
) -> EftResult<Vec<i32>> {
    let mut coeffs: Vec<i32> = Vec::with_capacity(expected);
    let mut codebook: Option<Codebook> = None;
    let mut marker = reader.read_marker(MarkerContext::TablesOrSob)?;

    while marker != bitstream::EOI {
        if marker != 0 {
            // Process interleaved tables until the block header arrives,
            // then rebuild the decode tables it names.
            while marker != bitstream::SOB {
                tables.process(marker, reader)?;
                marker = reader.read_marker(MarkerContext::TablesOrSob)?;
                if marker == bitstream::EOI {
                    return Err(EftError::decode_at(
                        "Premature EOI before block data",
                        reader.position(),
                    ));
                }
            }
            let _block_len = reader.read_u16()?;
            let table_id = usize::from(reader.read_byte()?);
            let table = tables
                .huffman
                .get(table_id)
                .and_then(Option::as_ref)
                .ok_or_else(|| {
                    EftError::decode(format!("Huffman table {} undefined", table_id))
                })?;
            codebook = Some(Codebook::build(table)?);
            reader.restart_bits();
            marker = 0;
        }

        let book = codebook
            .as_ref()
            .ok_or_else(|| EftError::decode("Block data before any Huffman table"))?;
        let symbol = match book.decode_symbol(reader)? {
            Some(symbol) => symbol,
            None => {
                marker = bitstream::check_marker(reader.take_marker(), MarkerContext::TablesOrSob)?;
                continue;
            }
        };
        apply_symbol(symbol, reader, &mut coeffs, expected)?;
    }

    if coeffs.len() != expected {
        return Err(EftError::decode(format!(
            "Decoded {} coefficients, frame needs {}",
            coeffs.len(),
            expected
        )));
    }
    Ok(coeffs)
}

/// Expand one Huffman symbol into coefficients: zero runs (1..=100 and
/// the counted forms 105/106), literal escapes (101..=104), or a direct
/// literal biased by 180 (107..=254).
fn apply_symbol(
    symbol: u8,
    reader: &mut WsqReader<'_>,
    coeffs: &mut Vec<i32>,
    expected: usize,
) -> EftResult<()> {
    let push = |coeffs: &mut Vec<i32>, value: i32| -> EftResult<()> {
        if coeffs.len() >= expected {
            return Err(EftError::decode(format!(
                "Coefficient data overruns the {} sample frame",
                expected
            )));
        }
        coeffs.push(value);
        Ok(())
    };

    match symbol {
        1..=100 => {
            for _ in 0..symbol {
                push(coeffs, 0)?;
            }
        }
        101 => {
            let value = reader.read_bits(8)? as i32;
            push(coeffs, value)?;
        }
        102 => {
            let value = reader.read_bits(8)? as i32;
            push(coeffs, -value)?;
        }
        103 => {
            let value = reader.read_bits(16)? as i32;
            push(coeffs, value)?;
        }
        104 => {
            let value = reader.read_bits(16)? as i32;
            push(coeffs, -value)?;
        }
        105 => {
            let run = reader.read_bits(8)?;
            for _ in 0..run {
                push(coeffs, 0)?;
            }
        }
        106 => {
            let run = reader.read_bits(16)?;
            for _ in 0..run {
                push(coeffs, 0)?;
            }
        }
        107..=254 => {
            push(coeffs, i32::from(symbol) - 180)?;
        }
        _ => {
            return Err(EftError::decode_at(
                format!("Invalid code {} in entropy data", symbol),
                reader.position(),
            ));
        }
    }
    Ok(())
}

/// Affine float-to-byte conversion with rounding and clamping.
fn to_pixels(plane: &[f32], m_shift: f32, r_scale: f32) -> Vec<u8> {
    plane
        .iter()
        .map(|&value| {
            let pixel = value * r_scale + m_shift + 0.5;
            if pixel < 0.0 {
                0
            } else if pixel > 255.0 {
                255
            } else {
                pixel as u8
            }
        })
        .collect()
}
