//! 块装配: 反量化 + zig-zag 反扫描, 以及编码端的量化.
//!
//! 反量化公式与 MDEC 硬件一致:
//! - DC: `dc * matrix[0]`
//! - AC: `(ac * matrix[zz] * qscale + 4) / 8` (向零截断)
//! - 尺度 0 是平坦 DC 快速路径: 矩阵被忽略, 值 x2, 按自然序放置
//!
//! 反量化结果超出硬件可表示的 -1024..=1023 范围即
//! "too much energy", 按参考行为报 `CoefficientOutOfRange`,
//! 不做静默截断 (截断会掩盖损坏的源数据).

use ying_core::{YingError, YingResult};

use crate::code::MdecCode;
use crate::tables::{QuantMatrix, ZIGZAG};

/// 反量化结果的合法下界 (硬件 11 位有符号)
pub const DEQUANT_MIN: i32 = -0x400;
/// 反量化结果的合法上界
pub const DEQUANT_MAX: i32 = 0x3FF;

/// 将一个块的 MDEC 码序列装配为自然序系数矩阵
///
/// 码序列必须形如 FirstOfBlock, Run*, EndOfBlock.
pub fn dequantize_block(codes: &[MdecCode], matrix: &QuantMatrix) -> YingResult<[i32; 64]> {
    let mut out = [0i32; 64];

    let mut iter = codes.iter();
    let (qscale, dc) = match iter.next() {
        Some(&MdecCode::FirstOfBlock { qscale, dc }) => (i32::from(qscale), i32::from(dc)),
        other => {
            return Err(YingError::MalformedBitstream(format!(
                "块首不是 FirstOfBlock: {:?}",
                other,
            )));
        }
    };

    let mut zz = 0usize;
    if qscale == 0 {
        out[0] = dc * 2;
    } else {
        out[0] = check_energy(dc * matrix.step(0), 0)?;
    }

    let mut ended = false;
    for &code in iter {
        if ended {
            return Err(YingError::MalformedBitstream(
                "EOB 之后仍有码".into(),
            ));
        }
        match code {
            MdecCode::Run { run, ac } => {
                zz += run as usize + 1;
                if zz > 63 {
                    return Err(YingError::MalformedBitstream(format!(
                        "游程越过块边界: 位置 {} > 63",
                        zz,
                    )));
                }
                if qscale == 0 {
                    // 平坦 DC 块: 矩阵被忽略, 自然序放置
                    out[zz] = i32::from(ac) * 2;
                } else {
                    let v = (i32::from(ac) * matrix.step(zz) * qscale + 4) / 8;
                    out[ZIGZAG[zz]] = check_energy(v, zz)?;
                }
            }
            MdecCode::EndOfBlock => ended = true,
            MdecCode::FirstOfBlock { .. } => {
                return Err(YingError::MalformedBitstream(
                    "块中途出现第二个 FirstOfBlock".into(),
                ));
            }
        }
    }
    if !ended {
        return Err(YingError::MalformedBitstream("块缺少 EOB".into()));
    }

    Ok(out)
}

fn check_energy(v: i32, zz: usize) -> YingResult<i32> {
    if !(DEQUANT_MIN..=DEQUANT_MAX).contains(&v) {
        return Err(YingError::CoefficientOutOfRange(format!(
            "zig-zag 位置 {} 的反量化值 {} 超出 [{}, {}]",
            zz, v, DEQUANT_MIN, DEQUANT_MAX,
        )));
    }
    Ok(v)
}

/// 四舍五入除法 (远离零)
fn round_div(n: f64, d: f64) -> i32 {
    (n / d).round() as i32
}

/// 将自然序频域系数量化为一个块的 MDEC 码序列
///
/// 量化后的值超出 10 位包络时返回 `CoefficientOutOfRange`;
/// 调用方 (预算循环) 以更粗的尺度重试.
pub fn quantize_block(
    coeffs: &[f64; 64],
    matrix: &QuantMatrix,
    qscale: u8,
) -> YingResult<Vec<MdecCode>> {
    if qscale == 0 || qscale > 63 {
        return Err(YingError::InvalidArgument(format!(
            "编码端量化尺度 {} 不在 1..=63",
            qscale,
        )));
    }

    let mut out = Vec::with_capacity(16);
    let dc = round_div(coeffs[0], matrix.step(0) as f64);
    check_quantized(dc, 0)?;
    out.push(MdecCode::FirstOfBlock {
        qscale,
        dc: dc as i16,
    });

    let mut run = 0u8;
    for zz in 1..64 {
        let c = coeffs[ZIGZAG[zz]];
        let q = round_div(c * 8.0, (matrix.step(zz) * i32::from(qscale)) as f64);
        if q == 0 {
            run += 1;
        } else {
            check_quantized(q, zz)?;
            out.push(MdecCode::Run { run, ac: q as i16 });
            run = 0;
        }
    }
    out.push(MdecCode::EndOfBlock);
    Ok(out)
}

fn check_quantized(q: i32, zz: usize) -> YingResult<()> {
    if !(-512..=511).contains(&q) {
        return Err(YingError::CoefficientOutOfRange(format!(
            "zig-zag 位置 {} 的量化值 {} 超出 10 位包络",
            zz, q,
        )));
    }
    Ok(())
}
