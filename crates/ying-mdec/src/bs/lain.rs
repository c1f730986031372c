//! Lain 引擎变体.
//!
//! 头部布局 (4 个小端 16 位字):
//! `[亮度尺度 (低字节) | 色度尺度 (高字节)][码数][魔数 0x3800][version 0]`
//!
//! 与 STRv2 的分化点:
//! - 量化尺度按分量分离 (亮度/色度各一个, 仍为整帧粒度)
//! - escape 码采用最小位宽的 MPEG-1 形式: 6 位游程 + 8 位补码值,
//!   保留字节 0x00/0x80 扩展为 16 位形式表达幅度 128..=255
//!
//! DC 层与 STRv2 相同 (绝对 10 位补码).

use byteorder::{ByteOrder, LittleEndian};
use ying_core::{BitReader, BitWriter, YingError, YingResult};

use super::{FrameHeader, HEADER_BYTES, HEADER_MAGIC};
use crate::code::MdecCode;

/// 头部判据: version 0, 魔数在偏移 4, 两个尺度字节都在 1..=63
pub(super) fn claims(data: &[u8]) -> bool {
    if data.len() < HEADER_BYTES {
        return false;
    }
    let magic = LittleEndian::read_u16(&data[4..6]);
    let version = LittleEndian::read_u16(&data[6..8]);
    magic == HEADER_MAGIC
        && version == 0
        && (1..=63).contains(&data[0])
        && (1..=63).contains(&data[1])
}

pub(super) fn read_header(data: &[u8]) -> YingResult<FrameHeader> {
    if data.len() < HEADER_BYTES {
        return Err(YingError::MalformedBitstream(
            "缓冲区不足一个帧头部".into(),
        ));
    }
    let qscale_luma = data[0];
    let qscale_chroma = data[1];
    let code_count_field = LittleEndian::read_u16(&data[2..4]);
    let magic = LittleEndian::read_u16(&data[4..6]);
    let version = LittleEndian::read_u16(&data[6..8]);
    if magic != HEADER_MAGIC || version != 0 {
        return Err(YingError::MalformedBitstream(format!(
            "Lain 头部字段非法: 魔数 {:#06X}, version {}",
            magic, version,
        )));
    }
    for (name, q) in [("亮度", qscale_luma), ("色度", qscale_chroma)] {
        if !(1..=63).contains(&q) {
            return Err(YingError::MalformedBitstream(format!(
                "{}量化尺度 {} 不在 1..=63",
                name, q,
            )));
        }
    }
    Ok(FrameHeader {
        code_count_field,
        qscale_luma,
        qscale_chroma,
        version,
    })
}

pub(super) fn write_header(code_count: usize, qscale_luma: u8, qscale_chroma: u8) -> Vec<u8> {
    let mut out = Vec::with_capacity(HEADER_BYTES);
    out.push(qscale_luma);
    out.push(qscale_chroma);
    out.extend_from_slice(&(code_count as u16).to_le_bytes());
    out.extend_from_slice(&HEADER_MAGIC.to_le_bytes());
    out.extend_from_slice(&0u16.to_le_bytes());
    out
}

/// 读取 escape 码的后续位 (8 位或扩展 16 位形式)
pub(super) fn read_escape(reader: &mut BitReader<'_>) -> YingResult<MdecCode> {
    let run = reader.read_bits(6)? as u8;
    let first = reader.read_bits(8)?;
    let ac: i32 = match first {
        // 0x00: 正扩展, 幅度 128..=255
        0x00 => {
            let ext = reader.read_bits(8)? as i32;
            if ext < 128 {
                return Err(YingError::MalformedBitstream(format!(
                    "escape 正扩展字节 {} 幅度不足 128",
                    ext,
                )));
            }
            ext
        }
        // 0x80: 负扩展, 幅度 128..=255
        0x80 => {
            let ext = reader.read_bits(8)? as i32 - 256;
            if ext > -128 {
                return Err(YingError::MalformedBitstream(format!(
                    "escape 负扩展字节还原值 {} 幅度不足 128",
                    ext,
                )));
            }
            ext
        }
        _ => i32::from(first as u8 as i8),
    };
    // 16 位形式在语法上放得下超过 10 位包络的值, 这里是硬性检查点
    if !(-512..=511).contains(&ac) {
        return Err(YingError::CoefficientOutOfRange(format!(
            "escape 值 {} 超出 10 位包络",
            ac,
        )));
    }
    Ok(MdecCode::Run { run, ac: ac as i16 })
}

/// 写出 escape 码的后续位, 选择最小位宽
///
/// 幅度超过 255 的值不可表达, 返回 `CoefficientOutOfRange`
/// (编码端的 "too much energy", 由预算循环换更粗的量化档重试).
pub(super) fn write_escape_value(writer: &mut BitWriter, run: u8, ac: i16) -> YingResult<()> {
    writer.write_bits(u32::from(run), 6);
    match ac {
        -127..=127 => {
            writer.write_bits(ac as u32 & 0xFF, 8);
        }
        128..=255 => {
            writer.write_bits(0x00, 8);
            writer.write_bits(ac as u32, 8);
        }
        -255..=-128 => {
            writer.write_bits(0x80, 8);
            writer.write_bits((ac + 256) as u32, 8);
        }
        _ => {
            return Err(YingError::CoefficientOutOfRange(format!(
                "AC 值 {} 超出 Lain escape 的 8/16 位表达范围",
                ac,
            )));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_header_roundtrip() {
        let bytes = write_header(100, 5, 9);
        assert!(claims(&bytes));
        let h = read_header(&bytes).unwrap();
        assert_eq!(h.code_count_field, 100);
        assert_eq!(h.qscale_luma, 5);
        assert_eq!(h.qscale_chroma, 9);
        assert_eq!(h.version, 0);
    }

    #[test]
    fn test_claims_mutually_exclusive_with_strv2() {
        // Lain 头部的偏移 4 是魔数, 不可能落在 STRv2 的尺度范围;
        // STRv2 头部的 version 非 0
        let lain = write_header(10, 5, 5);
        assert!(!super::super::strv2::claims(&lain));
        let v2 = super::super::strv2::write_header(10, 5, 2);
        assert!(!claims(&v2));
    }

    #[test]
    fn test_escape_8bit_roundtrip() {
        for ac in [-127i16, -1, 1, 127] {
            let mut bw = BitWriter::new();
            write_escape_value(&mut bw, 3, ac).unwrap();
            let data = bw.finish();
            let mut br = BitReader::new(&data);
            assert_eq!(read_escape(&mut br).unwrap(), MdecCode::Run { run: 3, ac });
        }
    }

    #[test]
    fn test_escape_16bit_roundtrip() {
        for ac in [128i16, 255, -128, -255] {
            let mut bw = BitWriter::new();
            write_escape_value(&mut bw, 0, ac).unwrap();
            let data = bw.finish();
            let mut br = BitReader::new(&data);
            assert_eq!(read_escape(&mut br).unwrap(), MdecCode::Run { run: 0, ac });
        }
    }

    #[test]
    fn test_escape_too_much_energy() {
        let mut bw = BitWriter::new();
        assert!(write_escape_value(&mut bw, 0, 256).is_err());
        assert!(write_escape_value(&mut bw, 0, -300).is_err());
    }
}
