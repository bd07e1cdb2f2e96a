//! Transform table parsing and inverse wavelet synthesis.
//!
//! The DTT segment transmits each filter as its center-outward half;
//! mirror expansion restores the full tap array, alternating signs away
//! from the center. Synthesis then joins the wavelet tree nodes from the
//! deepest region upward, upsampling and convolving the lo and hi halves
//! of each span with mirror-symmetric edge extension.

use log::trace;

use crate::bitstream::WsqReader;
use crate::error::{EftError, EftResult};
use crate::subbands::{WaveletNode, WAVELET_TREE_LEN};

/// Synthesis filter pair expanded from the DTT segment.
#[derive(Debug, Clone)]
pub struct TransformTable {
    /// Applied to lo-pass subband samples; transmitted second.
    pub lo: Vec<f32>,
    /// Applied to hi-pass subband samples; transmitted first.
    pub hi: Vec<f32>,
}

impl TransformTable {
    /// Parse a DTT segment body (after its marker).
    pub fn parse(reader: &mut WsqReader<'_>) -> EftResult<Self> {
        let _table_len = reader.read_u16()?;
        let hi_size = usize::from(reader.read_byte()?);
        let lo_size = usize::from(reader.read_byte()?);
        if hi_size == 0 || lo_size == 0 {
            return Err(EftError::decode_at(
                "Transform table with empty filter",
                reader.position(),
            ));
        }

        let hi = read_filter(reader, hi_size, true)?;
        let lo = read_filter(reader, lo_size, false)?;
        trace!("DTT: hi {} taps, lo {} taps", hi.len(), lo.len());
        Ok(TransformTable { lo, hi })
    }
}

/// Read `ceil(size/2)` compact coefficients and mirror-expand them.
///
/// Compact value `i` lands `i` taps past the center with sign `(-1)^i`.
/// Odd-length filters reflect the same value across the center; for
/// even-length filters the reflected half is negated on the hi filter and
/// copied on the lo filter.
fn read_filter(
    reader: &mut WsqReader<'_>,
    size: usize,
    negate_even_mirror: bool,
) -> EftResult<Vec<f32>> {
    let mut filter = vec![0f32; size];
    let half = (size + 1) / 2;
    let center = half - 1;

    for idx in 0..half {
        let sign = reader.read_byte()?;
        let mut scale = reader.read_byte()?;
        let mut value = reader.read_u32()? as f32;
        while scale > 0 {
            value /= 10.0;
            scale -= 1;
        }
        if sign != 0 {
            value = -value;
        }
        if idx % 2 == 1 {
            value = -value;
        }

        if size % 2 == 1 {
            filter[center + idx] = value;
            if idx > 0 {
                filter[center - idx] = value;
            }
        } else {
            filter[center + 1 + idx] = value;
            filter[center - idx] = if negate_even_mirror { -value } else { value };
        }
    }
    Ok(filter)
}

/// Which mirror applies at a subband boundary: whole-sample reflects
/// about the edge sample, half-sample repeats it once.
#[derive(Clone, Copy)]
struct Mirror {
    left_half_sample: bool,
    right_half_sample: bool,
    /// Asymmetric (even-length) filters flip the sign on every reflection.
    flip_sign: bool,
}

/// Reflect a subband index into `[0, len)`, accumulating the reflection
/// sign for asymmetric filters.
fn reflect(mut k: isize, len: usize, mirror: Mirror) -> (usize, f32) {
    let len = len as isize;
    let mut sign = 1.0f32;
    while k < 0 || k >= len {
        if k < 0 {
            k = if mirror.left_half_sample { -k - 1 } else { -k };
        } else {
            k = if mirror.right_half_sample {
                2 * len - 1 - k
            } else {
                2 * (len - 1) - k
            };
        }
        if mirror.flip_sign {
            sign = -sign;
        }
    }
    (k as usize, sign)
}

/// Reconstruct the frame in place by joining wavelet nodes from the
/// deepest region upward. Each node takes a column pass into the scratch
/// plane and a row pass back.
pub fn reconstruct(
    plane: &mut [f32],
    width: usize,
    height: usize,
    wtree: &[WaveletNode; WAVELET_TREE_LEN],
    filters: &TransformTable,
) -> EftResult<()> {
    debug_assert_eq!(plane.len(), width * height);
    let mut scratch = vec![0f32; width * height];

    for index in (0..WAVELET_TREE_LEN).rev() {
        let node = wtree[index];
        if node.lenx == 0 || node.leny == 0 {
            continue;
        }
        trace!(
            "joining node {}: {}x{} at ({},{})",
            index,
            node.lenx,
            node.leny,
            node.x,
            node.y
        );
        let base = node.y * width + node.x;
        // Columns: strips step across x, filtering runs down y.
        join_strips(
            &mut scratch,
            0,
            plane,
            base,
            node.lenx,
            node.leny,
            1,
            width,
            filters,
            node.invcl,
        );
        // Rows: strips step down y, filtering runs across x.
        join_strips(
            plane,
            base,
            &scratch,
            0,
            node.leny,
            node.lenx,
            width,
            1,
            filters,
            node.invrw,
        );
    }
    Ok(())
}

/// Join the lo and hi halves of every strip in a region.
///
/// `len` samples along the filtered axis split into a lo span of
/// `ceil(len/2)` and a hi span of `floor(len/2)`; `inv` stores the hi span
/// first. Lo samples reconstruct the even output phase, hi samples the
/// odd phase.
#[allow(clippy::too_many_arguments)]
fn join_strips(
    out: &mut [f32],
    out_base: usize,
    input: &[f32],
    in_base: usize,
    strips: usize,
    len: usize,
    pitch: usize,
    stride: usize,
    filters: &TransformTable,
    inv: bool,
) {
    let lo = &filters.lo;
    let hi = &filters.hi;
    let odd_filters = lo.len() % 2 == 1;
    // Even-length pairs run asymmetric: hi taps negated, reflections
    // flip the hi sign.
    let hi_gain = if odd_filters { 1.0f32 } else { -1.0 };
    let data_odd = len % 2 == 1;

    let lo_len = (len + 1) / 2;
    let hi_len = len / 2;
    let (lo_off, hi_off) = if inv { (hi_len, 0) } else { (0, lo_len) };

    // Mirror family induced by whole-sample extension of the original
    // signal: the even-phase (lo) span reflects about its edge sample on
    // the left; the odd-phase (hi) span repeats its first sample.
    let lo_mirror = Mirror {
        left_half_sample: !odd_filters,
        right_half_sample: !data_odd,
        flip_sign: false,
    };
    let hi_mirror = Mirror {
        left_half_sample: odd_filters,
        right_half_sample: data_odd,
        flip_sign: !odd_filters,
    };

    let lo_center = (lo.len() - 1) / 2 + if odd_filters { 0 } else { 1 };
    let hi_center = (hi.len() - 1) / 2 + if odd_filters { 0 } else { 1 };

    for strip in 0..strips {
        let in_start = in_base + strip * pitch;
        let out_start = out_base + strip * pitch;

        if len < 2 {
            if len == 1 {
                out[out_start] = input[in_start];
            }
            continue;
        }

        for n in 0..len {
            let mut acc = 0.0f32;

            // Lo contributions: taps with fi = lo_center + n - 2k.
            let anchor = lo_center as isize + n as isize;
            let mut fi = (anchor.rem_euclid(2)) as usize;
            while fi < lo.len() {
                let k = (anchor - fi as isize) / 2;
                let (idx, sign) = reflect(k, lo_len, lo_mirror);
                acc += lo[fi] * sign * input[in_start + (lo_off + idx) * stride];
                fi += 2;
            }

            // Hi contributions: taps with fi = hi_center + n - 1 - 2k.
            if hi_len > 0 {
                let anchor = hi_center as isize + n as isize - 1;
                let mut fi = (anchor.rem_euclid(2)) as usize;
                while fi < hi.len() {
                    let k = (anchor - fi as isize) / 2;
                    let (idx, sign) = reflect(k, hi_len, hi_mirror);
                    acc += hi[fi] * hi_gain * sign * input[in_start + (hi_off + idx) * stride];
                    fi += 2;
                }
            }

            out[out_start + n * stride] = acc;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::subbands::{build_quant_tree, build_wavelet_tree};

    /// The 9/7 filter pair every production WSQ stream carries, as it
    /// appears after mirror expansion.
    fn cdf97() -> TransformTable {
        TransformTable {
            hi: vec![
                0.064538882628938,
                -0.040689417609559,
                -0.418092273222212,
                0.788485616405665,
                -0.418092273222212,
                -0.040689417609559,
                0.064538882628938,
            ],
            lo: vec![
                0.037828455506995,
                -0.023849465019380,
                -0.110624404418423,
                0.377402855612654,
                0.852698679009402,
                0.377402855612654,
                -0.110624404418423,
                -0.023849465019380,
                0.037828455506995,
            ],
        }
    }

    fn encode_compact(sign: u8, scale: u8, magnitude: u32) -> Vec<u8> {
        let mut out = vec![sign, scale];
        out.extend_from_slice(&magnitude.to_be_bytes());
        out
    }

    #[test]
    fn test_dtt_parse_mirrors_odd_filters() {
        // hi: 3 taps from compacts [4.0, 3.0]; lo: 5 taps from
        // [2.0, 1.0, 0.5].
        let mut body = Vec::new();
        body.extend_from_slice(&0u16.to_be_bytes());
        body.push(3); // hi size
        body.push(5); // lo size
        body.extend_from_slice(&encode_compact(0, 0, 4));
        body.extend_from_slice(&encode_compact(0, 0, 3));
        body.extend_from_slice(&encode_compact(0, 0, 2));
        body.extend_from_slice(&encode_compact(0, 0, 1));
        body.extend_from_slice(&encode_compact(0, 1, 5));

        let mut reader = WsqReader::new(&body);
        let table = TransformTable::parse(&mut reader).unwrap();
        // Alternating sign away from the center, values reflected.
        assert_eq!(table.hi, vec![-3.0, 4.0, -3.0]);
        assert_eq!(table.lo, vec![0.5, -1.0, 2.0, -1.0, 0.5]);
    }

    #[test]
    fn test_dtt_parse_even_mirror_signs() {
        // hi: 4 taps from [2.0, 1.0]; lo: 2 taps from [3.0].
        let mut body = Vec::new();
        body.extend_from_slice(&0u16.to_be_bytes());
        body.push(4);
        body.push(2);
        body.extend_from_slice(&encode_compact(0, 0, 2));
        body.extend_from_slice(&encode_compact(1, 0, 1));
        body.extend_from_slice(&encode_compact(0, 0, 3));

        let mut reader = WsqReader::new(&body);
        let table = TransformTable::parse(&mut reader).unwrap();
        // Hi mirror negates, lo mirror copies. The second compact value
        // carries both the transmitted sign and the alternation.
        assert_eq!(table.hi, vec![-1.0, -2.0, 2.0, 1.0]);
        assert_eq!(table.lo, vec![3.0, 3.0]);
    }

    #[test]
    fn test_reflect_whole_and_half_sample() {
        let ws = Mirror { left_half_sample: false, right_half_sample: false, flip_sign: false };
        assert_eq!(reflect(-2, 5, ws), (2, 1.0));
        assert_eq!(reflect(5, 5, ws), (3, 1.0));

        let hs = Mirror { left_half_sample: true, right_half_sample: true, flip_sign: false };
        assert_eq!(reflect(-1, 5, hs), (0, 1.0));
        assert_eq!(reflect(5, 5, hs), (4, 1.0));

        let asym = Mirror { left_half_sample: true, right_half_sample: true, flip_sign: true };
        assert_eq!(reflect(-1, 5, asym), (0, -1.0));
        assert_eq!(reflect(2, 5, asym), (2, 1.0));
    }

    /// Driving the DC band with `32 * c` and every other subband with
    /// zero must reconstruct a flat plane of value `c`: each of the five
    /// joins on the DC path halves the constant.
    #[test]
    fn test_constant_plane_reconstruction() {
        for (width, height) in [(64, 64), (61, 73)] {
            let wtree = build_wavelet_tree(width, height);
            let qtree = build_quant_tree(&wtree);
            let filters = cdf97();

            let mut plane = vec![0f32; width * height];
            let dc = &qtree[0];
            for y in dc.y..dc.y + dc.leny {
                for x in dc.x..dc.x + dc.lenx {
                    plane[y * width + x] = 32.0 * 3.5;
                }
            }

            reconstruct(&mut plane, width, height, &wtree, &filters).unwrap();
            for (pixel, &value) in plane.iter().enumerate() {
                assert!(
                    (value - 3.5).abs() < 2e-3,
                    "{}x{} pixel {} = {}",
                    width,
                    height,
                    pixel,
                    value
                );
            }
        }
    }

    /// The lo filter's even- and odd-phase tap sums both equal 1/sqrt(2),
    /// which is what makes the constant test above halve per join.
    #[test]
    fn test_cdf97_phase_gains() {
        let filters = cdf97();
        let even: f32 = filters.lo.iter().step_by(2).sum();
        let odd: f32 = filters.lo.iter().skip(1).step_by(2).sum();
        assert!((even - std::f32::consts::FRAC_1_SQRT_2).abs() < 1e-5);
        assert!((odd - std::f32::consts::FRAC_1_SQRT_2).abs() < 1e-5);
        // The hi filter integrates to zero over full period.
        let total: f32 = filters.hi.iter().sum();
        assert!(total.abs() < 1e-5);
    }
}
