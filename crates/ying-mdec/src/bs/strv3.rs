//! STRv3 变体.
//!
//! 头部与 escape 层同 STRv2 (version 字段为 3); DC 层不同:
//! DC 按分量差分编码, MPEG-1 风格的 DC-size Huffman 表
//! (亮度/色度两张表), 差分值乘 4 还原 —— v3 的 DC 粒度是 4.
//! 预测器有三个: Cr, Cb, 四个亮度块共享一个 Y 预测器.

use ying_core::{BitReader, BitWriter, YingError, YingResult};

use super::FrameHeader;
use super::strv2;
use crate::code::{COEFF_MAX, COEFF_MIN};

/// DC-size Huffman 表项: (码长, 码字, size)
type DcEntry = (u8, u16, u32);

/// 亮度 DC-size 表
const DC_SIZE_LUMA: &[DcEntry] = &[
    (2, 0b00, 1),
    (2, 0b01, 2),
    (3, 0b100, 0),
    (3, 0b101, 3),
    (3, 0b110, 4),
    (4, 0b1110, 5),
    (5, 0b11110, 6),
    (6, 0b111110, 7),
    (7, 0b1111110, 8),
];

/// 色度 DC-size 表
const DC_SIZE_CHROMA: &[DcEntry] = &[
    (2, 0b00, 0),
    (2, 0b01, 1),
    (2, 0b10, 2),
    (3, 0b110, 3),
    (4, 0b1110, 4),
    (5, 0b11110, 5),
    (6, 0b111110, 6),
    (7, 0b1111110, 7),
    (8, 0b11111110, 8),
];

pub(super) fn claims(data: &[u8]) -> bool {
    strv2::claims_version(data, &[3])
}

pub(super) fn read_header(data: &[u8]) -> YingResult<FrameHeader> {
    strv2::read_header(data)
}

pub(super) fn write_header(code_count: usize, qscale: u8) -> Vec<u8> {
    strv2::write_header(code_count, qscale, 3)
}

/// 宏块内块下标 -> 预测器下标 (0=Cr, 1=Cb, 2..=5 共享 Y)
fn predictor_index(block_index: usize) -> usize {
    block_index.min(2)
}

/// 读取差分 DC 并更新预测器
pub(super) fn read_dc(
    reader: &mut BitReader<'_>,
    block_index: usize,
    dc_pred: &mut [i16; 3],
) -> YingResult<i16> {
    let table = if block_index < 2 {
        DC_SIZE_CHROMA
    } else {
        DC_SIZE_LUMA
    };

    let mut size = None;
    for &(bits, code, s) in table {
        if reader.peek_bits(u32::from(bits))? == u32::from(code) {
            reader.skip_bits(u32::from(bits))?;
            size = Some(s);
            break;
        }
    }
    let size = size.ok_or_else(|| {
        YingError::MalformedBitstream(format!(
            "比特偏移 {} 处不是合法的 DC-size 码",
            reader.bits_read(),
        ))
    })?;

    let diff = if size == 0 {
        0
    } else {
        let bits = reader.read_bits(size)?;
        // 最高位为 0 表示负差分
        if (bits >> (size - 1)) & 1 != 0 {
            bits as i32
        } else {
            bits as i32 - ((1 << size) - 1)
        }
    };

    let pred = predictor_index(block_index);
    let dc = i32::from(dc_pred[pred]) + diff * 4;
    if dc < i32::from(COEFF_MIN) || dc > i32::from(COEFF_MAX) {
        return Err(YingError::MalformedBitstream(format!(
            "差分 DC 还原值 {} 超出 10 位范围",
            dc,
        )));
    }
    dc_pred[pred] = dc as i16;
    Ok(dc as i16)
}

/// 写出差分 DC 并更新预测器
///
/// DC 被圆整到最近的 4 的倍数 (v3 的固有粒度), 预测器跟踪圆整后的值,
/// 误差不随块数累积.
pub(super) fn write_dc(
    writer: &mut BitWriter,
    block_index: usize,
    dc: i16,
    dc_pred: &mut [i16; 3],
) {
    let rounded = (i32::from(dc) + 2).div_euclid(4).clamp(-128, 127) * 4;
    let pred = predictor_index(block_index);
    let diff = (rounded - i32::from(dc_pred[pred])) / 4;
    dc_pred[pred] = rounded as i16;

    let table = if block_index < 2 {
        DC_SIZE_CHROMA
    } else {
        DC_SIZE_LUMA
    };
    let size = 32 - (diff.unsigned_abs()).leading_zeros();
    let &(bits, code, _) = table
        .iter()
        .find(|&&(_, _, s)| s == size)
        .expect("|diff| <= 255, size 必然在表内");
    writer.write_bits(u32::from(code), u32::from(bits));
    if size > 0 {
        let raw = if diff < 0 {
            (diff + ((1 << size) - 1)) as u32
        } else {
            diff as u32
        };
        writer.write_bits(raw, size);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn roundtrip(block_index: usize, dc_values: &[i16]) {
        let mut bw = BitWriter::new();
        let mut enc_pred = [0i16; 3];
        for &dc in dc_values {
            write_dc(&mut bw, block_index, dc, &mut enc_pred);
        }
        let data = bw.finish();
        let mut br = BitReader::new(&data);
        let mut dec_pred = [0i16; 3];
        for &dc in dc_values {
            let rounded = ((i32::from(dc) + 2).div_euclid(4).clamp(-128, 127) * 4) as i16;
            assert_eq!(
                read_dc(&mut br, block_index, &mut dec_pred).unwrap(),
                rounded,
            );
        }
    }

    #[test]
    fn test_dc_roundtrip_luma() {
        roundtrip(2, &[0, 4, -4, 508, -512, 100, 96]);
    }

    #[test]
    fn test_dc_roundtrip_chroma() {
        roundtrip(0, &[-512, 508, 0, 12, -100]);
    }

    #[test]
    fn test_dc_rounding_to_multiple_of_4() {
        // 非 4 倍数的 DC 会被圆整
        roundtrip(3, &[5, -7, 511, 2]);
    }

    #[test]
    fn test_luma_blocks_share_predictor() {
        let mut bw = BitWriter::new();
        let mut enc_pred = [0i16; 3];
        write_dc(&mut bw, 2, 100, &mut enc_pred);
        write_dc(&mut bw, 3, 100, &mut enc_pred);
        let data = bw.finish();
        let mut br = BitReader::new(&data);
        let mut dec_pred = [0i16; 3];
        assert_eq!(read_dc(&mut br, 2, &mut dec_pred).unwrap(), 100);
        // 第二个亮度块差分为 0
        assert_eq!(read_dc(&mut br, 3, &mut dec_pred).unwrap(), 100);
    }

    #[test]
    fn test_dc_size_tables_prefix_free() {
        for table in [DC_SIZE_LUMA, DC_SIZE_CHROMA] {
            for (i, &(b1, c1, _)) in table.iter().enumerate() {
                for &(b2, c2, _) in table.iter().skip(i + 1) {
                    let (s, l) = if b1 <= b2 {
                        ((b1, c1), (b2, c2))
                    } else {
                        ((b2, c2), (b1, c1))
                    };
                    assert_ne!(l.1 >> (l.0 - s.0), s.1);
                }
            }
        }
    }
}
