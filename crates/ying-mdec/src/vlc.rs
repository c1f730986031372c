//! AC 系数变长码表与查找.
//!
//! 三个位流变体共用同一张 MPEG-1 风格的 (run, level) 变长码表,
//! 只在 escape 码的后续位宽上分化 (由各变体模块自行处理).
//!
//! 表项不含符号位; 符号位紧随码字之后 (0 = 正, 1 = 负).

use ying_core::{BitReader, BitWriter, YingError, YingResult};

/// EOB 码字 (2 位 `10`)
pub const EOB_CODE: u16 = 0b10;
/// EOB 码长
pub const EOB_BITS: u32 = 2;
/// Escape 码字 (6 位 `000001`)
pub const ESCAPE_CODE: u16 = 0b000001;
/// Escape 码长
pub const ESCAPE_BITS: u32 = 6;

/// AC 变长码表项
/// 格式: (码长, 码字, run, |level|)
type AcEntry = (u8, u16, u8, u16);

/// MPEG-1 AC (run, level) 变长码表, 按码长升序
///
/// 码字不含符号位, 共 111 项; EOB 与 escape 单列.
#[rustfmt::skip]
pub const AC_CODES: &[AcEntry] = &[
    (2, 0b11, 0, 1),
    (3, 0b011, 1, 1),
    (4, 0b0100, 0, 2),
    (4, 0b0101, 2, 1),
    (5, 0b00101, 0, 3),
    (5, 0b00110, 4, 1),
    (5, 0b00111, 3, 1),
    (6, 0b000100, 7, 1),
    (6, 0b000101, 6, 1),
    (6, 0b000110, 1, 2),
    (6, 0b000111, 5, 1),
    (7, 0b0000100, 2, 2),
    (7, 0b0000101, 9, 1),
    (7, 0b0000110, 0, 4),
    (7, 0b0000111, 8, 1),
    (8, 0x20, 13, 1),
    (8, 0x21, 0, 6),
    (8, 0x22, 12, 1),
    (8, 0x23, 11, 1),
    (8, 0x24, 3, 2),
    (8, 0x25, 1, 3),
    (8, 0x26, 0, 5),
    (8, 0x27, 10, 1),
    (10, 0x08, 16, 1),
    (10, 0x09, 5, 2),
    (10, 0x0A, 0, 7),
    (10, 0x0B, 2, 3),
    (10, 0x0C, 1, 4),
    (10, 0x0D, 15, 1),
    (10, 0x0E, 14, 1),
    (10, 0x0F, 4, 2),
    (12, 0x10, 0, 11),
    (12, 0x11, 8, 2),
    (12, 0x12, 4, 3),
    (12, 0x13, 0, 10),
    (12, 0x14, 2, 4),
    (12, 0x15, 7, 2),
    (12, 0x16, 21, 1),
    (12, 0x17, 20, 1),
    (12, 0x18, 0, 9),
    (12, 0x19, 19, 1),
    (12, 0x1A, 18, 1),
    (12, 0x1B, 1, 5),
    (12, 0x1C, 3, 3),
    (12, 0x1D, 0, 8),
    (12, 0x1E, 6, 2),
    (12, 0x1F, 17, 1),
    (13, 0x10, 10, 2),
    (13, 0x11, 9, 2),
    (13, 0x12, 5, 3),
    (13, 0x13, 3, 4),
    (13, 0x14, 2, 5),
    (13, 0x15, 1, 7),
    (13, 0x16, 1, 6),
    (13, 0x17, 0, 15),
    (13, 0x18, 0, 14),
    (13, 0x19, 0, 13),
    (13, 0x1A, 0, 12),
    (13, 0x1B, 26, 1),
    (13, 0x1C, 25, 1),
    (13, 0x1D, 24, 1),
    (13, 0x1E, 23, 1),
    (13, 0x1F, 22, 1),
    (14, 0x10, 0, 31),
    (14, 0x11, 0, 30),
    (14, 0x12, 0, 29),
    (14, 0x13, 0, 28),
    (14, 0x14, 0, 27),
    (14, 0x15, 0, 26),
    (14, 0x16, 0, 25),
    (14, 0x17, 0, 24),
    (14, 0x18, 0, 23),
    (14, 0x19, 0, 22),
    (14, 0x1A, 0, 21),
    (14, 0x1B, 0, 20),
    (14, 0x1C, 0, 19),
    (14, 0x1D, 0, 18),
    (14, 0x1E, 0, 17),
    (14, 0x1F, 0, 16),
    (15, 0x10, 0, 40),
    (15, 0x11, 0, 39),
    (15, 0x12, 0, 38),
    (15, 0x13, 0, 37),
    (15, 0x14, 0, 36),
    (15, 0x15, 0, 35),
    (15, 0x16, 0, 34),
    (15, 0x17, 0, 33),
    (15, 0x18, 0, 32),
    (15, 0x19, 1, 14),
    (15, 0x1A, 1, 13),
    (15, 0x1B, 1, 12),
    (15, 0x1C, 1, 11),
    (15, 0x1D, 1, 10),
    (15, 0x1E, 1, 9),
    (15, 0x1F, 1, 8),
    (16, 0x10, 1, 18),
    (16, 0x11, 1, 17),
    (16, 0x12, 1, 16),
    (16, 0x13, 1, 15),
    (16, 0x14, 6, 3),
    (16, 0x15, 16, 2),
    (16, 0x16, 15, 2),
    (16, 0x17, 14, 2),
    (16, 0x18, 13, 2),
    (16, 0x19, 12, 2),
    (16, 0x1A, 11, 2),
    (16, 0x1B, 31, 1),
    (16, 0x1C, 30, 1),
    (16, 0x1D, 29, 1),
    (16, 0x1E, 28, 1),
    (16, 0x1F, 27, 1),
];

/// AC 层解码出的一个符号
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AcSymbol {
    /// 块结束
    Eob,
    /// Escape 码, 后续位由变体解释
    Escape,
    /// 表内码字
    Code {
        /// 零游程
        run: u8,
        /// 带符号 AC 值
        ac: i16,
    },
}

/// 解码一个 AC 符号 (EOB / escape / 表内码字 + 符号位)
pub fn decode_ac(reader: &mut BitReader<'_>) -> YingResult<AcSymbol> {
    if reader.peek_bits(EOB_BITS)? == u32::from(EOB_CODE) {
        reader.skip_bits(EOB_BITS)?;
        return Ok(AcSymbol::Eob);
    }
    if reader.peek_bits(ESCAPE_BITS)? == u32::from(ESCAPE_CODE) {
        reader.skip_bits(ESCAPE_BITS)?;
        return Ok(AcSymbol::Escape);
    }

    // 表按码长升序且前缀无歧义, 顺序匹配即可
    for &(bits, code, run, level) in AC_CODES {
        if reader.peek_bits(u32::from(bits))? == u32::from(code) {
            reader.skip_bits(u32::from(bits))?;
            let sign = reader.read_bit()?;
            let ac = if sign != 0 {
                -(level as i16)
            } else {
                level as i16
            };
            return Ok(AcSymbol::Code { run, ac });
        }
    }

    Err(YingError::MalformedBitstream(format!(
        "比特偏移 {} 处不是合法的 AC 变长码",
        reader.bits_read(),
    )))
}

/// 编码端反向查表: (run, |level|) 命中则写出码字与符号位并返回 true
///
/// 未命中时由调用方写 escape 码.
pub fn write_ac(writer: &mut BitWriter, run: u8, ac: i16) -> bool {
    let level = ac.unsigned_abs();
    for &(bits, code, r, l) in AC_CODES {
        if r == run && l == level {
            writer.write_bits(u32::from(code), u32::from(bits));
            writer.write_bits(u32::from(ac < 0), 1);
            return true;
        }
    }
    false
}

/// 写出 EOB 码
pub fn write_eob(writer: &mut BitWriter) {
    writer.write_bits(u32::from(EOB_CODE), EOB_BITS);
}

/// 写出 escape 前导码 (后续位由变体写入)
pub fn write_escape(writer: &mut BitWriter) {
    writer.write_bits(u32::from(ESCAPE_CODE), ESCAPE_BITS);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_prefix_free() {
        // 任何码字都不能是另一个码字的前缀 (含 EOB 与 escape)
        let mut all: Vec<(u8, u16)> = AC_CODES.iter().map(|&(b, c, _, _)| (b, c)).collect();
        all.push((EOB_BITS as u8, EOB_CODE));
        all.push((ESCAPE_BITS as u8, ESCAPE_CODE));
        for (i, &(b1, c1)) in all.iter().enumerate() {
            for &(b2, c2) in all.iter().skip(i + 1) {
                let (short, long) = if b1 <= b2 {
                    ((b1, c1), (b2, c2))
                } else {
                    ((b2, c2), (b1, c1))
                };
                let prefix = long.1 >> (long.0 - short.0);
                assert!(
                    prefix != short.1,
                    "码字冲突: ({}, {:#b}) 是 ({}, {:#b}) 的前缀",
                    short.0, short.1, long.0, long.1,
                );
            }
        }
    }

    #[test]
    fn test_decode_simple_codes() {
        let mut bw = BitWriter::new();
        // (0,1) 正: 11 0; (1,1) 负: 011 1; EOB: 10
        bw.write_bits(0b110, 3);
        bw.write_bits(0b0111, 4);
        bw.write_bits(0b10, 2);
        let data = bw.finish();

        let mut br = BitReader::new(&data);
        assert_eq!(decode_ac(&mut br).unwrap(), AcSymbol::Code { run: 0, ac: 1 });
        assert_eq!(decode_ac(&mut br).unwrap(), AcSymbol::Code { run: 1, ac: -1 });
        assert_eq!(decode_ac(&mut br).unwrap(), AcSymbol::Eob);
    }

    #[test]
    fn test_roundtrip_all_entries() {
        for &(_, _, run, level) in AC_CODES {
            for sign in [1i16, -1] {
                let ac = sign * level as i16;
                let mut bw = BitWriter::new();
                assert!(write_ac(&mut bw, run, ac));
                write_eob(&mut bw);
                let data = bw.finish();
                let mut br = BitReader::new(&data);
                assert_eq!(decode_ac(&mut br).unwrap(), AcSymbol::Code { run, ac });
                assert_eq!(decode_ac(&mut br).unwrap(), AcSymbol::Eob);
            }
        }
    }

    #[test]
    fn test_six_bit_codewords() {
        // 6 位码字位于 0b0001xx 区间, 不与 7 位的 0b0000xxx 区间重叠
        let expected = [
            (0b000100, 7u8, 1u16),
            (0b000101, 6, 1),
            (0b000110, 1, 2),
            (0b000111, 5, 1),
        ];
        for (code, run, level) in expected {
            assert!(
                AC_CODES.contains(&(6, code, run, level)),
                "6 位码字 {:#08b} 应映射到 ({}, {})",
                code, run, level,
            );
        }
    }

    #[test]
    fn test_escape_detected() {
        let mut bw = BitWriter::new();
        write_escape(&mut bw);
        bw.write_bits(0, 10);
        let data = bw.finish();
        let mut br = BitReader::new(&data);
        assert_eq!(decode_ac(&mut br).unwrap(), AcSymbol::Escape);
    }

    #[test]
    fn test_lookup_miss_falls_to_escape() {
        let mut bw = BitWriter::new();
        // (run=2, level=40) 不在表内
        assert!(!write_ac(&mut bw, 2, 40));
    }
}
