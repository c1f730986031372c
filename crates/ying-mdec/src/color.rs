//! PSX 色彩空间转换.
//!
//! PSX 硬件的 YCbCr->RGB 系数与 Rec.601 并不相同
//! (1.402 / -0.3437 / -0.7143 / 1.772), 精确回放必须用硬件系数.
//! 提供两条路径: 整数定点 (复现硬件舍入) 与 f64 参考.
//! 另提供 PSX YCbCr -> Rec.601 YCbCr 的 3x3 直接换基 (导出用, 不经过 RGB).

use ying_core::{RgbFrame, YCbCr420Frame, YingResult};

/// 定点系数: 硬件浮点系数 * 65536, 四舍五入
const R_CR: i64 = 91881; // 1.402
const G_CB: i64 = -22525; // -0.3437
const G_CR: i64 = -46812; // -0.7143
const B_CB: i64 = 116131; // 1.772

/// PSX 浮点系数 (参考路径与换基矩阵共用)
const F_R_CR: f64 = 1.402;
const F_G_CB: f64 = -0.3437;
const F_G_CR: f64 = -0.7143;
const F_B_CB: f64 = 1.772;

/// 定点乘积按半数远离零舍入回整数域
#[inline]
fn round_fixed(product: i64) -> i32 {
    if product >= 0 {
        ((product + 32768) >> 16) as i32
    } else {
        -(((-product + 32768) >> 16) as i32)
    }
}

#[inline]
fn clamp_signed(v: i32) -> i32 {
    v.clamp(-128, 127)
}

/// 单像素整数转换: 有符号 (y, cb, cr) -> RGB888
///
/// 输入为 IDCT 输出的有符号样本域 (约 -128..127), 色度为共享样本.
pub fn psx_ycbcr_to_rgb(y: i32, cb: i32, cr: i32) -> [u8; 3] {
    let r = clamp_signed(y + round_fixed(R_CR * cr as i64)) + 128;
    let g = clamp_signed(y + round_fixed(G_CB * cb as i64 + G_CR * cr as i64)) + 128;
    let b = clamp_signed(y + round_fixed(B_CB * cb as i64)) + 128;
    [r as u8, g as u8, b as u8]
}

/// 单像素浮点参考转换
pub fn psx_ycbcr_to_rgb_f64(y: f64, cb: f64, cr: f64) -> [u8; 3] {
    let r = (y + F_R_CR * cr).round() as i32;
    let g = (y + F_G_CB * cb + F_G_CR * cr).round() as i32;
    let b = (y + F_B_CB * cb).round() as i32;
    [
        (clamp_signed(r) + 128) as u8,
        (clamp_signed(g) + 128) as u8,
        (clamp_signed(b) + 128) as u8,
    ]
}

/// 四亮度一色度的批量入口 (4:2:0 基本单元)
///
/// 与逐像素入口逐位一致, 只是省去重复的色度项计算.
pub fn psx_quad_to_rgb(y4: [i32; 4], cb: i32, cr: i32) -> [[u8; 3]; 4] {
    let r_term = round_fixed(R_CR * cr as i64);
    let g_term = round_fixed(G_CB * cb as i64 + G_CR * cr as i64);
    let b_term = round_fixed(B_CB * cb as i64);
    std::array::from_fn(|i| {
        let y = y4[i];
        [
            (clamp_signed(y + r_term) + 128) as u8,
            (clamp_signed(y + g_term) + 128) as u8,
            (clamp_signed(y + b_term) + 128) as u8,
        ]
    })
}

/// Rec.601 亮度权重 (换基与编码端共用)
const REC601_KR: f64 = 0.299;
const REC601_KG: f64 = 0.587;
const REC601_KB: f64 = 0.114;

/// PSX YCbCr -> Rec.601 YCbCr 直接换基 (不经过 RGB 往返)
///
/// 把 PSX 基展开到 RGB 再按 Rec.601 权重收回, 合成一个固定 3x3 矩阵.
pub fn psx_to_rec601(y: f64, cb: f64, cr: f64) -> (f64, f64, f64) {
    // 行 1: Y601 = kr*R + kg*G + kb*B, 其中 R/G/B 按 PSX 基展开
    let y601 = y
        + cb * (REC601_KG * F_G_CB + REC601_KB * F_B_CB)
        + cr * (REC601_KR * F_R_CR + REC601_KG * F_G_CR);
    // 行 2/3: Cb601 = (B - Y601)/1.772, Cr601 = (R - Y601)/1.402
    let b = y + F_B_CB * cb;
    let r = y + F_R_CR * cr;
    let cb601 = (b - y601) / 1.772;
    let cr601 = (r - y601) / 1.402;
    (y601, cb601, cr601)
}

/// RGB888 -> PSX 有符号 YCbCr (单像素, 编码端)
///
/// 亮度权重由 PSX 色度基反解得出 (约 0.2991/0.5870/0.1139),
/// 使浮点路径的解码端成为精确逆变换.
pub fn rgb_to_psx_ycbcr(r: u8, g: u8, b: u8) -> (f64, f64, f64) {
    let r = r as f64 - 128.0;
    let g = g as f64 - 128.0;
    let b = b as f64 - 128.0;
    let wb = -F_G_CB / F_B_CB;
    let wr = -F_G_CR / F_R_CR;
    let y = (wr * r + g + wb * b) / (1.0 + wr + wb);
    let cb = (b - y) / F_B_CB;
    let cr = (r - y) / F_R_CR;
    (y, cb, cr)
}

/// RGB888 帧 -> PSX 平面 4:2:0 (编码端入口)
///
/// 色度对每个 2x2 亮度区域取平均. 编码尺寸超出显示尺寸的部分
/// 复制边缘像素填充, 避免对齐带引入高频能量.
pub fn rgb_frame_to_ycbcr(frame: &RgbFrame) -> YingResult<YCbCr420Frame> {
    let mut out = YCbCr420Frame::new(frame.width, frame.height)?;
    let cw = out.coded_width();
    let ch = out.coded_height();

    let sample = |px: usize, py: usize| -> (f64, f64, f64) {
        let sx = (px as u32).min(frame.width - 1);
        let sy = (py as u32).min(frame.height - 1);
        let [r, g, b] = frame.pixel(sx, sy);
        rgb_to_psx_ycbcr(r, g, b)
    };

    for py in 0..ch {
        for px in 0..cw {
            let (y, _, _) = sample(px, py);
            out.y[py * cw + px] = y.round() as i16;
        }
    }
    for cy in 0..ch / 2 {
        for cx in 0..cw / 2 {
            let mut sum_cb = 0.0;
            let mut sum_cr = 0.0;
            for (dx, dy) in [(0, 0), (1, 0), (0, 1), (1, 1)] {
                let (_, cb, cr) = sample(cx * 2 + dx, cy * 2 + dy);
                sum_cb += cb;
                sum_cr += cr;
            }
            out.cb[cy * (cw / 2) + cx] = (sum_cb / 4.0).round() as i16;
            out.cr[cy * (cw / 2) + cx] = (sum_cr / 4.0).round() as i16;
        }
    }
    Ok(out)
}
