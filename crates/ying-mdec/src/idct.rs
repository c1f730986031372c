//! 8x8 DCT 引擎.
//!
//! 同一接口后面放两套可互换的数值实现, 由调用方选择:
//! - `SimpleIdct`: 整数定点 IDCT, W 常量按 2^14 缩放, 行移 11 列移 20,
//!   逐位复现参考硬件的截断行为 (回放保真用)
//! - `FloatIdct`: f64 正交 DCT-III 参考实现 (质量对比/验证用)
//!
//! 两者输出刻意不同, 不得合并. 编码端的正向变换 `fdct_8x8`
//! 是标准正交 DCT-II, 与浮点逆变换在量化损耗之外互逆.

use std::sync::OnceLock;

/// W 常量: cos(i*π/16) * √2 * 2^14
const W1: i64 = 22725;
const W2: i64 = 21407;
const W3: i64 = 19266;
const W4: i64 = 16383;
const W5: i64 = 12873;
const W6: i64 = 8867;
const W7: i64 = 4520;

const ROW_SHIFT: u32 = 11;
const COL_SHIFT: u32 = 20;
const DC_SHIFT: u32 = 3;

/// 8x8 逆 DCT 引擎接口
pub trait Dct8x8 {
    /// 原地变换: 自然序频域系数 -> 空间样本
    fn idct(&self, block: &mut [i32; 64]);
}

/// 整数定点 IDCT (硬件精确)
#[derive(Debug, Clone, Copy, Default)]
pub struct SimpleIdct;

/// f64 参考 IDCT
#[derive(Debug, Clone, Copy, Default)]
pub struct FloatIdct;

impl Dct8x8 for SimpleIdct {
    fn idct(&self, block: &mut [i32; 64]) {
        for row in 0..8 {
            idct_row(block, row);
        }
        for col in 0..8 {
            idct_col(block, col);
        }
    }
}

/// 8 点一维 IDCT 行变换
fn idct_row(block: &mut [i32; 64], row: usize) {
    let off = row * 8;
    let x: [i64; 8] = std::array::from_fn(|i| block[off + i] as i64);

    // 快速检查: AC 全零的行只展开 DC, 跳过完整蝶形 (结果不变)
    if x[1..].iter().all(|&v| v == 0) {
        let val = (x[0] << DC_SHIFT) as i32;
        block[off..off + 8].fill(val);
        return;
    }

    let round = 1i64 << (ROW_SHIFT - 1);

    // 偶数部分
    let base = W4 * x[0] + round;
    let mut a = [
        base + W2 * x[2],
        base + W6 * x[2],
        base - W6 * x[2],
        base - W2 * x[2],
    ];
    if x[4] != 0 || x[6] != 0 {
        a[0] += W4 * x[4] + W6 * x[6];
        a[1] += -W4 * x[4] - W2 * x[6];
        a[2] += -W4 * x[4] + W2 * x[6];
        a[3] += W4 * x[4] - W6 * x[6];
    }

    // 奇数部分
    let mut b = [
        W1 * x[1] + W3 * x[3],
        W3 * x[1] - W7 * x[3],
        W5 * x[1] - W1 * x[3],
        W7 * x[1] - W5 * x[3],
    ];
    if x[5] != 0 || x[7] != 0 {
        b[0] += W5 * x[5] + W7 * x[7];
        b[1] += -W1 * x[5] - W5 * x[7];
        b[2] += W7 * x[5] + W3 * x[7];
        b[3] += W3 * x[5] - W1 * x[7];
    }

    for i in 0..4 {
        block[off + i] = ((a[i] + b[i]) >> ROW_SHIFT) as i32;
        block[off + 7 - i] = ((a[i] - b[i]) >> ROW_SHIFT) as i32;
    }
}

/// 8 点一维 IDCT 列变换
fn idct_col(block: &mut [i32; 64], col: usize) {
    let x: [i64; 8] = std::array::from_fn(|i| block[col + i * 8] as i64);

    // 快速检查: AC 全零的列只展开 DC
    if x[1..].iter().all(|&v| v == 0) {
        let val = ((x[0] * W4 + (1i64 << (COL_SHIFT - 1))) >> COL_SHIFT) as i32;
        for i in 0..8 {
            block[col + i * 8] = val;
        }
        return;
    }

    let round = 1i64 << (COL_SHIFT - 1);

    let base = W4 * x[0] + round;
    let mut a = [
        base + W2 * x[2],
        base + W6 * x[2],
        base - W6 * x[2],
        base - W2 * x[2],
    ];
    // 高频行全零时跳过其项 (性能路径, 数值上无差异)
    if x[4] != 0 {
        a[0] += W4 * x[4];
        a[1] -= W4 * x[4];
        a[2] -= W4 * x[4];
        a[3] += W4 * x[4];
    }
    if x[6] != 0 {
        a[0] += W6 * x[6];
        a[1] -= W2 * x[6];
        a[2] += W2 * x[6];
        a[3] -= W6 * x[6];
    }

    let mut b = [W1 * x[1], W3 * x[1], W5 * x[1], W7 * x[1]];
    b[0] += W3 * x[3];
    b[1] -= W7 * x[3];
    b[2] -= W1 * x[3];
    b[3] -= W5 * x[3];
    if x[5] != 0 {
        b[0] += W5 * x[5];
        b[1] -= W1 * x[5];
        b[2] += W7 * x[5];
        b[3] += W3 * x[5];
    }
    if x[7] != 0 {
        b[0] += W7 * x[7];
        b[1] -= W5 * x[7];
        b[2] += W3 * x[7];
        b[3] -= W1 * x[7];
    }

    for i in 0..4 {
        block[col + i * 8] = ((a[i] + b[i]) >> COL_SHIFT) as i32;
        block[col + (7 - i) * 8] = ((a[i] - b[i]) >> COL_SHIFT) as i32;
    }
}

/// 余弦基 C[u][x] = cos((2x+1)uπ/16)
fn cos_table() -> &'static [[f64; 8]; 8] {
    static TABLE: OnceLock<[[f64; 8]; 8]> = OnceLock::new();
    TABLE.get_or_init(|| {
        std::array::from_fn(|u| {
            std::array::from_fn(|x| {
                ((2 * x + 1) as f64 * u as f64 * std::f64::consts::PI / 16.0).cos()
            })
        })
    })
}

#[inline]
fn norm(u: usize) -> f64 {
    if u == 0 {
        std::f64::consts::FRAC_1_SQRT_2
    } else {
        1.0
    }
}

impl Dct8x8 for FloatIdct {
    fn idct(&self, block: &mut [i32; 64]) {
        let c = cos_table();
        let input: [f64; 64] = std::array::from_fn(|i| block[i] as f64);
        for y in 0..8 {
            for x in 0..8 {
                let mut sum = 0.0;
                for v in 0..8 {
                    for u in 0..8 {
                        sum += norm(u) * norm(v) * input[v * 8 + u] * c[u][x] * c[v][y];
                    }
                }
                block[y * 8 + x] = (0.25 * sum).round() as i32;
            }
        }
    }
}

/// 正向 8x8 DCT (DCT-II, 标准 MPEG 归一化)
///
/// 输入空间样本 (有符号域), 输出实值频域系数, 由量化端取整.
pub fn fdct_8x8(spatial: &[i32; 64]) -> [f64; 64] {
    let c = cos_table();
    let mut out = [0.0f64; 64];
    for v in 0..8 {
        for u in 0..8 {
            let mut sum = 0.0;
            for y in 0..8 {
                for x in 0..8 {
                    sum += spatial[y * 8 + x] as f64 * c[u][x] * c[v][y];
                }
            }
            out[v * 8 + u] = 0.25 * norm(u) * norm(v) * sum;
        }
    }
    out
}
