//! # Ying (影)
//!
//! 纯 Rust 实现的 PS1 MDEC 视频编解码核心.
//!
//! Ying 面向 PS1 视频流的精确回放与重编码:
//! - **解码**: 位流变体 (STRv2 / STRv3 / Lain) -> MDEC 码 -> 反量化
//!   -> IDCT -> PSX 色彩转换 -> RGB 像素
//! - **编码**: 像素 -> 正向 DCT -> 量化 -> 变长打包, 受硬性字节预算约束
//! - **部分替换**: 只重编码指定宏块, 其余宏块逐位直通
//!
//! 盘层 I/O (扇区结构, ECC, ISO 9660) 不属于本核心; 输入输出都是
//! 已解复用的字节缓冲区与像素缓冲区.
//!
//! # 快速开始
//!
//! ```rust,no_run
//! use ying::mdec::{DemuxedFrame, FrameDecoder};
//!
//! let frame = DemuxedFrame {
//!     width: 320,
//!     height: 240,
//!     frame_number: 0,
//!     data: std::fs::read("frame.bin").unwrap(),
//! };
//! let rgb = FrameDecoder::new().decode(&frame).unwrap();
//! println!("解码 {}x{} 像素", rgb.width, rgb.height);
//! ```
//!
//! # Crate 结构
//!
//! | Crate | 功能 |
//! |-------|------|
//! | `ying-core` | 位读写器, 错误类型, 像素容器 |
//! | `ying-mdec` | MDEC 编解码器 (变体, 块装配, IDCT, 色彩, 编排) |

/// 核心类型与位流工具
pub use ying_core as core;

/// MDEC 编解码器
pub use ying_mdec as mdec;

/// 获取 Ying 版本号
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
