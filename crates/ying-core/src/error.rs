//! 统一错误类型定义.
//!
//! 所有 ying crate 共用的错误类型, 支持跨模块传播.
//! 编解码核心只返回错误, 从不在内部吞掉或重试: 位流损坏不是瞬态故障.

use thiserror::Error;

/// Ying 框架统一错误类型
#[derive(Debug, Error)]
pub enum YingError {
    /// 无效参数
    #[error("无效参数: {0}")]
    InvalidArgument(String),

    /// 已到达位流末尾
    #[error("已到达位流末尾")]
    Eof,

    /// 位流结构损坏 (头部字段非法, 块未以 EOB 结束, 游程越界等)
    #[error("位流结构损坏: {0}")]
    MalformedBitstream(String),

    /// 自动探测未能唯一确定位流变体
    #[error("无法识别位流变体: {0}")]
    UnsupportedVariant(String),

    /// 系数超出硬件可表示范围 ("too much energy", 不做静默截断)
    #[error("系数超出合法范围: {0}")]
    CoefficientOutOfRange(String),

    /// 编码端在最粗量化档位下仍超出字节预算
    #[error("帧无法压缩到 {max_bytes} 字节以内")]
    FrameTooLargeToCompress {
        /// 调用方给定的字节预算
        max_bytes: usize,
    },

    /// 给定的宽高与位流/宏块几何不一致
    #[error("尺寸不匹配: {0}")]
    DimensionMismatch(String),

    /// 内部错误 (不应发生)
    #[error("内部错误: {0}")]
    Internal(String),
}

/// Ying 框架统一 Result 类型
pub type YingResult<T> = Result<T, YingError>;
