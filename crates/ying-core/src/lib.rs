//! # ying-core
//!
//! Ying MDEC 编解码核心类型与工具库.
//!
//! 提供所有 ying crate 共用的基础设施:
//! - 统一错误类型 (`YingError` / `YingResult`)
//! - 面向 PS1 位流的 16 位字序比特读写器 (`BitReader` / `BitWriter`)
//! - 像素容器 (`RgbFrame` / `YCbCr420Frame`)

pub mod bitreader;
pub mod bitwriter;
pub mod error;
pub mod image;

// 重导出常用类型
pub use bitreader::BitReader;
pub use bitwriter::BitWriter;
pub use error::{YingError, YingResult};
pub use image::{RgbFrame, YCbCr420Frame};
