//! 帧编码编排.
//!
//! 反向链路: 像素 -> 正向 DCT -> 量化 -> 变长打包, 受调用方给定的
//! 硬性字节预算约束 (盘层的扇区空间是固定分配的).
//!
//! 预算策略: 从起始量化尺度开始, 只在必要时逐级加粗; 最粗一档仍放不下
//! 则以 `FrameTooLargeToCompress` 失败, 绝不静默截断或超出预算返回.
//!
//! 部分宏块替换走单独入口: 未替换的宏块直通原始码流 (逐位保留),
//! 替换的宏块以原帧的量化尺度编码, 必要时丢弃最高频 AC 码收缩体积.

use log::{debug, trace};
use ying_core::{YCbCr420Frame, YingError, YingResult};

use crate::bs::{pack_frame, BitstreamVariant};
use crate::block::quantize_block;
use crate::code::MdecCode;
use crate::decoder::DecodedFrame;
use crate::idct::fdct_8x8;
use crate::tables::QuantMatrix;

/// 编码结果
#[derive(Debug, Clone)]
pub struct EncodedFrame {
    /// 头部 + 打包位流 (整数个 16 位字)
    pub data: Vec<u8>,
    /// 实际占用字节数, 已取整到字粒度; 不变式: <= 调用方预算
    pub used_bytes: usize,
    /// 打包的 MDEC 码总数 (含 EOB)
    pub mdec_code_count: usize,
}

/// 帧编码器
#[derive(Debug, Clone)]
pub struct FrameEncoder {
    variant: BitstreamVariant,
    matrix: QuantMatrix,
}

impl Default for FrameEncoder {
    fn default() -> Self {
        Self::new()
    }
}

/// 一个宏块 6 个块的频域系数 (Cr, Cb, Y1..Y4)
type MacroblockFreq = [[f64; 64]; 6];

impl FrameEncoder {
    /// 默认配置: STRv2, 硬件量化矩阵
    pub fn new() -> Self {
        Self {
            variant: BitstreamVariant::StrV2,
            matrix: QuantMatrix::psx_default(),
        }
    }

    /// 指定输出位流变体
    pub fn with_variant(mut self, variant: BitstreamVariant) -> Self {
        self.variant = variant;
        self
    }

    /// 使用自定义量化矩阵
    pub fn with_quant_matrix(mut self, matrix: QuantMatrix) -> Self {
        self.matrix = matrix;
        self
    }

    /// 编码整帧, 输出不超过 `max_bytes` 字节
    ///
    /// `quant_scale` 为起始尺度 (被替换帧的尺度或调用方默认值);
    /// 放不下时逐级加粗, 63 仍放不下则 `FrameTooLargeToCompress`.
    pub fn encode(
        &self,
        pixels: &YCbCr420Frame,
        quant_scale: Option<u8>,
        max_bytes: usize,
    ) -> YingResult<EncodedFrame> {
        let freq = transform_frame(pixels);
        let start = quant_scale.unwrap_or(1).clamp(1, 63);

        for qscale in start..=63 {
            let codes = match self.quantize_frame(&freq, qscale) {
                Ok(codes) => codes,
                // 该尺度下量化值溢出 10 位包络, 加粗重试
                Err(YingError::CoefficientOutOfRange(msg)) => {
                    trace!("尺度 {} 量化溢出 ({}), 加粗", qscale, msg);
                    continue;
                }
                Err(e) => return Err(e),
            };
            let packed = match pack_frame(self.variant, &codes) {
                Ok(p) => p,
                // Lain 的 escape 只能表达 ±255 幅度, 同样加粗重试
                Err(YingError::CoefficientOutOfRange(msg)) => {
                    trace!("尺度 {} 打包溢出 ({}), 加粗", qscale, msg);
                    continue;
                }
                Err(e) => return Err(e),
            };
            if packed.data.len() <= max_bytes {
                debug!(
                    "编码完成: 尺度 {}, {} 字节 (预算 {}), {} 码",
                    qscale,
                    packed.data.len(),
                    max_bytes,
                    packed.code_count,
                );
                return Ok(EncodedFrame {
                    used_bytes: packed.data.len(),
                    mdec_code_count: packed.code_count,
                    data: packed.data,
                });
            }
            trace!(
                "尺度 {} 产出 {} 字节, 超出预算 {}",
                qscale,
                packed.data.len(),
                max_bytes,
            );
        }

        Err(YingError::FrameTooLargeToCompress { max_bytes })
    }

    /// 部分宏块替换
    ///
    /// `replace` 列出要重编码的宏块下标 (栅格序), 其余宏块的码流
    /// 逐码保留. 量化尺度固定为原帧头部的尺度 (帧头只有一份尺度字段);
    /// 预算不够时丢弃替换宏块的最高频 AC 码, 直到放得下或只剩 DC.
    pub fn encode_partial(
        &self,
        original: &DecodedFrame,
        pixels: &YCbCr420Frame,
        replace: &[usize],
        max_bytes: usize,
    ) -> YingResult<EncodedFrame> {
        if original.width != pixels.width || original.height != pixels.height {
            return Err(YingError::DimensionMismatch(format!(
                "原帧 {}x{} 与新像素 {}x{} 不一致",
                original.width, original.height, pixels.width, pixels.height,
            )));
        }
        let mb_count = original.macroblocks.len();
        let mut replaced = vec![false; mb_count];
        for &mb in replace {
            if mb >= mb_count {
                return Err(YingError::InvalidArgument(format!(
                    "宏块下标 {} 超出帧的 {} 个宏块",
                    mb, mb_count,
                )));
            }
            replaced[mb] = true;
        }

        let freq = transform_frame(pixels);
        // 帧头尺度固定: 直通宏块的码流才能保持原样
        let mut fresh: Vec<Option<[Vec<MdecCode>; 6]>> = vec![None; mb_count];
        for mb in (0..mb_count).filter(|&mb| replaced[mb]) {
            let mut blocks: [Vec<MdecCode>; 6] = std::array::from_fn(|_| Vec::new());
            for (i, coeffs) in freq[mb].iter().enumerate() {
                blocks[i] =
                    match quantize_block(coeffs, &self.matrix, original.header.qscale_for_block(i))
                    {
                        Ok(codes) => codes,
                        // 钉死的尺度装不下新内容, 按既定失败模式上报
                        Err(YingError::CoefficientOutOfRange(_)) => {
                            return Err(YingError::FrameTooLargeToCompress { max_bytes });
                        }
                        Err(e) => return Err(e),
                    };
            }
            fresh[mb] = Some(blocks);
        }

        // AC 保留数从最大逐级递减, 直到预算放得下
        let max_ac = fresh
            .iter()
            .flatten()
            .flat_map(|blocks| blocks.iter())
            .map(|codes| codes.len().saturating_sub(2))
            .max()
            .unwrap_or(0);

        for keep in (0..=max_ac).rev() {
            let mut codes = Vec::new();
            for mb in 0..mb_count {
                match &fresh[mb] {
                    Some(blocks) => {
                        for block in blocks {
                            push_truncated(&mut codes, block, keep);
                        }
                    }
                    None => {
                        for block in &original.macroblocks[mb].blocks {
                            codes.extend_from_slice(block);
                        }
                    }
                }
            }

            let packed = match pack_frame(original.variant, &codes) {
                Ok(p) => p,
                // 尺度被钉死无法加粗, 只能继续截断把越界的码丢掉
                Err(YingError::CoefficientOutOfRange(msg)) => {
                    trace!("保留 {} AC 时打包溢出 ({}), 继续截断", keep, msg);
                    continue;
                }
                Err(e) => return Err(e),
            };
            if packed.data.len() <= max_bytes {
                debug!(
                    "部分替换完成: {} 宏块重编码, 保留 {} AC, {} 字节 (预算 {})",
                    replace.len(),
                    keep,
                    packed.data.len(),
                    max_bytes,
                );
                return Ok(EncodedFrame {
                    used_bytes: packed.data.len(),
                    mdec_code_count: packed.code_count,
                    data: packed.data,
                });
            }
        }

        Err(YingError::FrameTooLargeToCompress { max_bytes })
    }

    fn quantize_frame(&self, freq: &[MacroblockFreq], qscale: u8) -> YingResult<Vec<MdecCode>> {
        let mut codes = Vec::new();
        for mb in freq {
            for coeffs in mb {
                codes.extend(quantize_block(coeffs, &self.matrix, qscale)?);
            }
        }
        Ok(codes)
    }
}

/// 保留块的前 `keep` 个 AC 码, 丢弃其余 (DC 与 EOB 始终保留)
fn push_truncated(out: &mut Vec<MdecCode>, block: &[MdecCode], keep: usize) {
    let ac_count = block.len().saturating_sub(2);
    let kept = ac_count.min(keep);
    out.extend_from_slice(&block[..1 + kept]);
    out.push(MdecCode::EndOfBlock);
}

/// 像素帧 -> 每宏块 6 个块的频域系数
fn transform_frame(pixels: &YCbCr420Frame) -> Vec<MacroblockFreq> {
    let cw = pixels.coded_width();
    let mb_cols = pixels.mb_cols();
    let mb_count = mb_cols * pixels.mb_rows();

    let mut out = Vec::with_capacity(mb_count);
    for mb in 0..mb_count {
        let mx = mb % mb_cols;
        let my = mb / mb_cols;
        let mut blocks: MacroblockFreq = [[0.0; 64]; 6];
        blocks[0] = transform_block(&pixels.cr, cw / 2, mx * 8, my * 8);
        blocks[1] = transform_block(&pixels.cb, cw / 2, mx * 8, my * 8);
        for quadrant in 0..4 {
            blocks[2 + quadrant] = transform_block(
                &pixels.y,
                cw,
                mx * 16 + (quadrant % 2) * 8,
                my * 16 + (quadrant / 2) * 8,
            );
        }
        out.push(blocks);
    }
    out
}

/// 从平面取 8x8 空间块并做正向 DCT
fn transform_block(plane: &[i16], plane_w: usize, x0: usize, y0: usize) -> [f64; 64] {
    let spatial: [i32; 64] =
        std::array::from_fn(|i| i32::from(plane[(y0 + i / 8) * plane_w + x0 + i % 8]));
    fdct_8x8(&spatial)
}
