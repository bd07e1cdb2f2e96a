//! Quantization table parsing and subband reconstruction.
//!
//! The DQT segment carries a shared bin-center plus per-subband bin width
//! (`q_bin`) and dead-zone width (`z_bin`). Unquantization walks the coded
//! subbands in order, expanding the dead-zone and offsetting positive and
//! negative bins toward their centers.

use log::debug;

use crate::bitstream::WsqReader;
use crate::error::{EftError, EftResult};
use crate::subbands::{QuantNode, ACTIVE_SUBBANDS, QUANT_TREE_LEN};

/// Read a scaled value: an exponent byte followed by a 16-bit magnitude,
/// divided down one decimal digit at a time.
pub(crate) fn read_scaled_u16(reader: &mut WsqReader<'_>) -> EftResult<f32> {
    let mut scale = reader.read_byte()?;
    let mut value = f32::from(reader.read_u16()?);
    while scale > 0 {
        value /= 10.0;
        scale -= 1;
    }
    Ok(value)
}

/// Parsed DQT contents.
#[derive(Debug, Clone)]
pub struct QuantTable {
    pub bin_center: f32,
    pub q_bin: [f32; QUANT_TREE_LEN],
    pub z_bin: [f32; QUANT_TREE_LEN],
}

impl QuantTable {
    /// Parse a DQT segment body (after its marker).
    pub fn parse(reader: &mut WsqReader<'_>) -> EftResult<Self> {
        let _table_len = reader.read_u16()?;
        let bin_center = read_scaled_u16(reader)?;

        let mut q_bin = [0f32; QUANT_TREE_LEN];
        let mut z_bin = [0f32; QUANT_TREE_LEN];
        for band in 0..QUANT_TREE_LEN {
            q_bin[band] = read_scaled_u16(reader)?;
            z_bin[band] = read_scaled_u16(reader)?;
        }
        debug!("DQT: bin center {}", bin_center);
        Ok(QuantTable { bin_center, q_bin, z_bin })
    }
}

/// Expand quantized coefficients into the float plane at the quantization
/// tree positions. Coefficients are stored band-sequentially in `coeffs`;
/// bands with a zero bin width were never coded and are skipped.
pub fn unquantize(
    coeffs: &[i32],
    table: &QuantTable,
    qtree: &[QuantNode; QUANT_TREE_LEN],
    width: usize,
    height: usize,
) -> EftResult<Vec<f32>> {
    let mut plane = vec![0f32; width * height];
    let center = table.bin_center;
    let mut next = 0usize;

    for band in 0..ACTIVE_SUBBANDS {
        if table.q_bin[band] == 0.0 {
            continue;
        }
        let node = &qtree[band];
        for row in node.y..node.y + node.leny {
            for col in node.x..node.x + node.lenx {
                let value = *coeffs.get(next).ok_or_else(|| {
                    EftError::decode(format!(
                        "Coefficient data ends inside subband {}",
                        band
                    ))
                })?;
                next += 1;
                plane[row * width + col] = if value == 0 {
                    0.0
                } else if value > 0 {
                    table.q_bin[band] * (value as f32 - center) + table.z_bin[band] / 2.0
                } else {
                    table.q_bin[band] * (value as f32 + center) - table.z_bin[band] / 2.0
                };
            }
        }
    }
    Ok(plane)
}
