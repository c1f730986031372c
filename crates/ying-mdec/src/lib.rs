//! # ying-mdec
//!
//! PS1 MDEC 视频编解码器.
//!
//! 实现 PlayStation 1 "MDEC" 宏块视频流的解码与重编码:
//! - 位流变体编解码 (STRv2, STRv3, Lain), 打包位 <-> MDEC 码序列
//! - 反量化 + zig-zag 反扫描 (块装配)
//! - 整数 / 浮点两套 8x8 IDCT (硬件精确 vs 参考实现)
//! - PSX 硬件色彩空间转换 (非标准 Rec.601 系数)
//! - 反向链路: 像素 -> DCT -> 量化 -> 变长编码, 带硬性字节预算
//!
//! ## 模块结构
//!
//! - `code`: 16 位 MDEC 码原语 (`MdecCode`)
//! - `tables`: 量化矩阵与 zig-zag 扫描表
//! - `vlc`: MPEG-1 风格 AC 变长码表与查找
//! - `bs`: 位流变体 (头部布局, DC 编码, escape 码宽度)
//! - `block`: 块装配 (反量化/量化 + zig-zag)
//! - `idct`: IDCT 引擎 (整数定点 + 浮点参考) 与正向 DCT
//! - `color`: PSX YCbCr <-> RGB, PSX -> Rec.601
//! - `decoder`: 帧解码编排 (宏块栅格序遍历)
//! - `encoder`: 帧编码编排 (字节预算, 部分宏块替换)
//!
//! ## 使用示例
//!
//! ```rust,no_run
//! use ying_mdec::{DemuxedFrame, FrameDecoder};
//!
//! let frame = DemuxedFrame {
//!     width: 320,
//!     height: 240,
//!     frame_number: 0,
//!     data: vec![],
//! };
//! let rgb = FrameDecoder::new().decode(&frame);
//! ```

pub mod block;
pub mod bs;
pub mod code;
pub mod color;
pub mod decoder;
pub mod encoder;
pub mod idct;
pub mod tables;
pub mod vlc;


// 重导出常用类型
pub use bs::{BitstreamVariant, FrameHeader};
pub use code::MdecCode;
pub use decoder::{
    macroblocks_from_words, DecodedFrame, DemuxedFrame, FrameDecoder, IdctKind, MacroblockCodes,
};
pub use encoder::{EncodedFrame, FrameEncoder};
pub use tables::QuantMatrix;

use ying_core::{RgbFrame, YCbCr420Frame, YingResult};

/// 解码一帧 (默认配置: 变体自动探测, 硬件量化矩阵, 整数 IDCT)
pub fn decode(
    data: &[u8],
    width: u32,
    height: u32,
    variant: Option<BitstreamVariant>,
) -> YingResult<RgbFrame> {
    let mut dec = FrameDecoder::new();
    if let Some(v) = variant {
        dec = dec.with_variant(v);
    }
    dec.decode(&DemuxedFrame {
        width,
        height,
        frame_number: 0,
        data: data.to_vec(),
    })
}

/// 编码一帧 (默认配置: STRv2, 硬件量化矩阵)
pub fn encode(
    pixels: &YCbCr420Frame,
    quant_scale: Option<u8>,
    max_bytes: usize,
) -> YingResult<EncodedFrame> {
    FrameEncoder::new().encode(pixels, quant_scale, max_bytes)
}
