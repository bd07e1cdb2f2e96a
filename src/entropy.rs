//! Huffman table parsing and canonical symbol decoding for the WSQ
//! entropy-coded segment.
//!
//! A DHT segment may define several sub-tables; each gives the count of
//! codes per bit length (1..=16) followed by the symbol values in code
//! order. Decoding uses the canonical min/max/valptr tables, so no code
//! tree is ever allocated.

use log::debug;

use crate::bitstream::WsqReader;
use crate::error::{EftError, EftResult};

/// Number of Huffman table slots a codestream may define.
pub const MAX_HUFFMAN_TABLES: usize = 8;

const MAX_HUFFBITS: usize = 16;
const MAX_HUFFCOUNTS: usize = 256;

/// Raw table as transmitted: code counts per bit length plus values.
#[derive(Debug, Clone)]
pub struct HuffmanTable {
    pub bits: [u8; MAX_HUFFBITS],
    pub values: Vec<u8>,
}

/// Parse one DHT segment, yielding `(table_id, table)` pairs until its
/// declared length is exhausted.
pub fn parse_dht(reader: &mut WsqReader<'_>) -> EftResult<Vec<(u8, HuffmanTable)>> {
    let block_len = i64::from(reader.read_u16()?);
    let mut remaining = block_len - 2;
    if remaining <= 0 {
        return Err(EftError::decode_at(
            "No huffman table bytes remaining",
            reader.position(),
        ));
    }

    let mut tables = Vec::new();
    while remaining > 0 {
        let table_id = reader.read_byte()?;
        let mut bits = [0u8; MAX_HUFFBITS];
        let mut total = 0usize;
        for slot in bits.iter_mut() {
            *slot = reader.read_byte()?;
            total += usize::from(*slot);
        }
        if total > MAX_HUFFCOUNTS {
            return Err(EftError::decode_at(
                format!("Huffman table defines {} codes (max {})", total, MAX_HUFFCOUNTS),
                reader.position(),
            ));
        }

        let mut values = Vec::with_capacity(total);
        for _ in 0..total {
            values.push(reader.read_byte()?);
        }

        remaining -= 1 + MAX_HUFFBITS as i64 + total as i64;
        if remaining < 0 {
            return Err(EftError::decode_at(
                "Huffman table overruns its declared segment length",
                reader.position(),
            ));
        }
        debug!("DHT sub-table {}: {} codes", table_id, total);
        tables.push((table_id, HuffmanTable { bits, values }));
    }
    Ok(tables)
}

/// Canonical decode tables built per block from a [`HuffmanTable`].
///
/// `mincode`/`maxcode`/`valptr` are indexed by code length; lengths with
/// no codes carry `maxcode == -1` so lookups skip them.
#[derive(Debug, Clone)]
pub struct Codebook {
    mincode: [i32; MAX_HUFFBITS + 1],
    maxcode: [i32; MAX_HUFFBITS + 1],
    valptr: [i32; MAX_HUFFBITS + 1],
    values: Vec<u8>,
}

impl Codebook {
    pub fn build(table: &HuffmanTable) -> EftResult<Codebook> {
        // Expand counts into one code length per symbol, in value order.
        let mut sizes = Vec::new();
        for (index, &count) in table.bits.iter().enumerate() {
            let length = index as i32 + 1;
            for _ in 0..count {
                sizes.push(length);
            }
        }
        if sizes.len() != table.values.len() {
            return Err(EftError::decode(
                "Huffman table code counts disagree with value count",
            ));
        }

        // Assign canonical codes: increment within a length, left-shift on
        // each length change.
        let mut codes = vec![0i32; sizes.len()];
        let mut code = 0i32;
        let mut current = sizes.first().copied().unwrap_or(0);
        for (slot, &size) in codes.iter_mut().zip(sizes.iter()) {
            while size != current {
                code <<= 1;
                current += 1;
            }
            if code >= 1 << size {
                return Err(EftError::decode("Invalid Huffman code table"));
            }
            *slot = code;
            code += 1;
        }

        let mut mincode = [0i32; MAX_HUFFBITS + 1];
        let mut maxcode = [0i32; MAX_HUFFBITS + 1];
        let mut valptr = [0i32; MAX_HUFFBITS + 1];
        let mut index = 0usize;
        for length in 1..=MAX_HUFFBITS {
            if table.bits[length - 1] == 0 {
                maxcode[length] = -1;
                continue;
            }
            valptr[length] = index as i32;
            mincode[length] = codes[index];
            index += usize::from(table.bits[length - 1]) - 1;
            maxcode[length] = codes[index];
            index += 1;
        }

        Ok(Codebook {
            mincode,
            maxcode,
            valptr,
            values: table.values.clone(),
        })
    }

    /// Decode one symbol bit by bit. Returns `None` when a marker
    /// interrupts the symbol (the reader keeps it pending).
    pub fn decode_symbol(&self, reader: &mut WsqReader<'_>) -> EftResult<Option<u8>> {
        let mut code = match reader.read_bit()? {
            Some(bit) => i32::from(bit),
            None => return Ok(None),
        };

        for length in 1..=MAX_HUFFBITS {
            if self.maxcode[length] >= 0 && code <= self.maxcode[length] {
                let index = self.valptr[length] + code - self.mincode[length];
                let value = self
                    .values
                    .get(index as usize)
                    .copied()
                    .ok_or_else(|| EftError::decode("Huffman code indexes past table values"))?;
                return Ok(Some(value));
            }
            match reader.read_bit()? {
                Some(bit) => code = (code << 1) | i32::from(bit),
                None => return Ok(None),
            }
        }
        Err(EftError::decode_at(
            "Bad Huffman code in entropy data",
            reader.position(),
        ))
    }
}
