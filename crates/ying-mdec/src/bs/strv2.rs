//! STRv2 变体 (STR version 2, 兼容 version 1 头部).
//!
//! 头部布局 (4 个小端 16 位字):
//! `[码数/2 向上取整][魔数 0x3800][量化尺度 1..=63][version 1|2]`
//!
//! 块首是绝对 10 位补码 DC; AC 层用共享的 MPEG-1 变长码表,
//! escape 为 6 位游程 + 10 位补码值. 量化尺度整帧全局.
//!
//! STRv3 复用本模块的头部与 escape 逻辑, 只替换 DC 层.

use byteorder::{ByteOrder, LittleEndian};
use ying_core::{BitReader, BitWriter, YingError, YingResult};

use super::{FrameHeader, HEADER_BYTES, HEADER_MAGIC};
use crate::code::MdecCode;

/// 头部判据: 魔数在偏移 2, version 为 1 或 2, 尺度字段在合法范围
pub(super) fn claims(data: &[u8]) -> bool {
    claims_version(data, &[1, 2])
}

pub(super) fn claims_version(data: &[u8], versions: &[u16]) -> bool {
    if data.len() < HEADER_BYTES {
        return false;
    }
    let magic = LittleEndian::read_u16(&data[2..4]);
    let qscale = LittleEndian::read_u16(&data[4..6]);
    let version = LittleEndian::read_u16(&data[6..8]);
    magic == HEADER_MAGIC && (1..=63).contains(&qscale) && versions.contains(&version)
}

/// 解析 v2/v3 头部
pub(super) fn read_header(data: &[u8]) -> YingResult<FrameHeader> {
    if data.len() < HEADER_BYTES {
        return Err(YingError::MalformedBitstream(
            "缓冲区不足一个帧头部".into(),
        ));
    }
    let code_count_field = LittleEndian::read_u16(&data[0..2]);
    let magic = LittleEndian::read_u16(&data[2..4]);
    let qscale = LittleEndian::read_u16(&data[4..6]);
    let version = LittleEndian::read_u16(&data[6..8]);
    if magic != HEADER_MAGIC {
        return Err(YingError::MalformedBitstream(format!(
            "头部魔数 {:#06X} != {:#06X}",
            magic, HEADER_MAGIC,
        )));
    }
    if !(1..=63).contains(&qscale) {
        return Err(YingError::MalformedBitstream(format!(
            "头部量化尺度 {} 不在 1..=63",
            qscale,
        )));
    }
    Ok(FrameHeader {
        code_count_field,
        qscale_luma: qscale as u8,
        qscale_chroma: qscale as u8,
        version,
    })
}

/// 生成 v2/v3 头部字节
pub(super) fn write_header(code_count: usize, qscale: u8, version: u16) -> Vec<u8> {
    let half = code_count.div_ceil(2) as u16;
    let mut out = Vec::with_capacity(HEADER_BYTES);
    out.extend_from_slice(&half.to_le_bytes());
    out.extend_from_slice(&HEADER_MAGIC.to_le_bytes());
    out.extend_from_slice(&u16::from(qscale).to_le_bytes());
    out.extend_from_slice(&version.to_le_bytes());
    out
}

/// 读取块首 DC (绝对 10 位补码)
pub(super) fn read_dc(reader: &mut BitReader<'_>) -> YingResult<i16> {
    Ok(reader.read_bits_signed(10)? as i16)
}

/// 写出块首 DC
pub(super) fn write_dc(writer: &mut BitWriter, dc: i16) {
    writer.write_bits(dc as u32 & 0x3FF, 10);
}

/// 读取 escape 码的后续位: 6 位游程 + 10 位补码值
///
/// 10 位读出的值天然落在合法包络内, 无需再做幅度检查.
pub(super) fn read_escape(reader: &mut BitReader<'_>) -> YingResult<MdecCode> {
    let run = reader.read_bits(6)? as u8;
    let ac = reader.read_bits_signed(10)? as i16;
    Ok(MdecCode::Run { run, ac })
}

/// 写出 escape 码的后续位
pub(super) fn write_escape_value(writer: &mut BitWriter, run: u8, ac: i16) {
    writer.write_bits(u32::from(run), 6);
    writer.write_bits(ac as u32 & 0x3FF, 10);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_header_roundtrip() {
        let bytes = write_header(25, 7, 2);
        assert!(claims(&bytes));
        let h = read_header(&bytes).unwrap();
        assert_eq!(h.code_count_field, 13);
        assert_eq!(h.qscale_luma, 7);
        assert_eq!(h.qscale_chroma, 7);
        assert_eq!(h.version, 2);
    }

    #[test]
    fn test_claims_rejects_bad_magic() {
        let mut bytes = write_header(10, 7, 2);
        // 魔数 0x3800 的高字节在偏移 3 (低字节本来就是 0)
        bytes[3] = 0;
        assert!(!claims(&bytes));
    }

    #[test]
    fn test_claims_rejects_zero_qscale() {
        let bytes = write_header(10, 0, 2);
        assert!(!claims(&bytes));
    }

    #[test]
    fn test_dc_roundtrip() {
        for dc in [-512i16, -1, 0, 1, 511] {
            let mut bw = BitWriter::new();
            write_dc(&mut bw, dc);
            let data = bw.finish();
            let mut br = BitReader::new(&data);
            assert_eq!(read_dc(&mut br).unwrap(), dc);
        }
    }

    #[test]
    fn test_escape_roundtrip() {
        let mut bw = BitWriter::new();
        write_escape_value(&mut bw, 40, -300);
        let data = bw.finish();
        let mut br = BitReader::new(&data);
        assert_eq!(
            read_escape(&mut br).unwrap(),
            MdecCode::Run { run: 40, ac: -300 }
        );
    }
}
