//! 量化矩阵与 zig-zag 扫描表.

/// zig-zag 扫描表: `ZIGZAG[扫描位置] = 自然 (行主) 序下标`
///
/// 低频系数排在编码流前部.
#[rustfmt::skip]
pub const ZIGZAG: [usize; 64] = [
     0,  1,  8, 16,  9,  2,  3, 10,
    17, 24, 32, 25, 18, 11,  4,  5,
    12, 19, 26, 33, 40, 48, 41, 34,
    27, 20, 13,  6,  7, 14, 21, 28,
    35, 42, 49, 56, 57, 50, 43, 36,
    29, 22, 15, 23, 30, 37, 44, 51,
    58, 59, 52, 45, 38, 31, 39, 46,
    53, 60, 61, 54, 47, 55, 62, 63,
];

/// PSX 硬件默认量化矩阵 (按 zig-zag 位置索引)
///
/// BIOS 上传给 MDEC 的标准表, 亮度与色度共用.
#[rustfmt::skip]
pub const PSX_DEFAULT_QUANT_MATRIX: [u8; 64] = [
     2, 16, 19, 22, 26, 27, 29, 34,
    16, 16, 22, 24, 27, 29, 34, 37,
    19, 22, 26, 27, 29, 34, 34, 38,
    22, 22, 26, 27, 29, 34, 37, 40,
    22, 26, 27, 29, 32, 35, 40, 48,
    26, 27, 29, 32, 35, 40, 48, 58,
    26, 27, 29, 34, 38, 46, 56, 69,
    27, 29, 35, 38, 46, 56, 69, 83,
];

/// 量化矩阵: 64 个步长, 按 zig-zag 位置索引
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuantMatrix(pub [u8; 64]);

impl QuantMatrix {
    /// PSX 硬件默认矩阵
    pub const fn psx_default() -> Self {
        Self(PSX_DEFAULT_QUANT_MATRIX)
    }

    /// 指定 zig-zag 位置的步长
    #[inline]
    pub fn step(&self, zz: usize) -> i32 {
        self.0[zz] as i32
    }
}

impl Default for QuantMatrix {
    fn default() -> Self {
        Self::psx_default()
    }
}
