//! 16 位 MDEC 码原语.
//!
//! MDEC 码是硬件消费的系数流单元, 每个码占一个 16 位半字:
//! 高 6 位 + 低 10 位 (二进制补码). 三种形态:
//! - 块首码: (量化尺度, DC 值)
//! - 游程码: (零游程, AC 值)
//! - 块结束哨兵: 保留半字 `0xFE00`, 不与任何合法游程码冲突

use ying_core::{YingError, YingResult};

/// 块结束哨兵的保留位模式
pub const EOB_WORD: u16 = 0xFE00;

/// DC/AC 值的合法下界 (10 位补码)
pub const COEFF_MIN: i16 = -512;
/// DC/AC 值的合法上界 (10 位补码)
pub const COEFF_MAX: i16 = 511;

/// 一个 16 位 MDEC 码
///
/// 一个块的系数流形如: 一个 `FirstOfBlock`, 零或多个 `Run`,
/// 恰好一个 `EndOfBlock`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MdecCode {
    /// 块首码: 量化尺度 (6 位) + DC 值 (10 位补码)
    FirstOfBlock {
        /// 量化尺度, 0..=63 (0 保留给平坦 DC 块)
        qscale: u8,
        /// DC 系数
        dc: i16,
    },
    /// 游程码: 零游程 (6 位) + AC 值 (10 位补码)
    Run {
        /// 本码之前的连续零系数个数
        run: u8,
        /// AC 系数
        ac: i16,
    },
    /// 块结束哨兵
    EndOfBlock,
}

impl MdecCode {
    /// 按硬件布局打包为 16 位半字
    pub fn to_word(self) -> u16 {
        match self {
            MdecCode::FirstOfBlock { qscale, dc } => {
                ((qscale as u16) << 10) | (dc as u16 & 0x3FF)
            }
            MdecCode::Run { run, ac } => ((run as u16) << 10) | (ac as u16 & 0x3FF),
            MdecCode::EndOfBlock => EOB_WORD,
        }
    }

    /// 从半字解析块首码
    pub fn first_from_word(word: u16) -> Self {
        MdecCode::FirstOfBlock {
            qscale: (word >> 10) as u8,
            dc: sign_extend_10(word),
        }
    }

    /// 从半字解析游程码或块结束哨兵
    pub fn run_from_word(word: u16) -> Self {
        if word == EOB_WORD {
            MdecCode::EndOfBlock
        } else {
            MdecCode::Run {
                run: (word >> 10) as u8,
                ac: sign_extend_10(word),
            }
        }
    }

    /// 校验字段范围: 6 位游程/尺度, 10 位补码值
    pub fn validate(&self) -> YingResult<()> {
        match *self {
            MdecCode::FirstOfBlock { qscale, dc } => {
                if qscale > 63 {
                    return Err(YingError::InvalidArgument(format!(
                        "量化尺度 {} 超过 6 位范围",
                        qscale,
                    )));
                }
                check_coeff(dc)
            }
            MdecCode::Run { run, ac } => {
                if run > 63 {
                    return Err(YingError::InvalidArgument(format!(
                        "零游程 {} 超过 6 位范围",
                        run,
                    )));
                }
                check_coeff(ac)?;
                // (run=63, ac=-512) 的位模式即 EOB 哨兵 0xFE00,
                // 不允许以游程码形态出现
                if run == 63 && ac == -512 {
                    return Err(YingError::InvalidArgument(
                        "游程码 (63, -512) 与 EOB 哨兵冲突".into(),
                    ));
                }
                Ok(())
            }
            MdecCode::EndOfBlock => Ok(()),
        }
    }
}

/// 半字低 10 位的符号扩展
pub fn sign_extend_10(word: u16) -> i16 {
    ((word as i16) << 6) >> 6
}

fn check_coeff(v: i16) -> YingResult<()> {
    if !(COEFF_MIN..=COEFF_MAX).contains(&v) {
        return Err(YingError::CoefficientOutOfRange(format!(
            "系数 {} 超出 10 位补码范围 [{}, {}]",
            v, COEFF_MIN, COEFF_MAX,
        )));
    }
    Ok(())
}
