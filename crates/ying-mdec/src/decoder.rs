//! 帧解码编排.
//!
//! 以栅格序遍历帧的全部宏块, 对每个宏块依次驱动
//! 位流解码 -> 反量化 -> IDCT -> 色彩转换, 最后按显示尺寸裁剪.
//! 宏块之间无预测依赖, 解码顺序只约束输出落位.

use log::{debug, trace};
use ying_core::{RgbFrame, YingError, YingResult};

use crate::bs::{BitstreamVariant, CodeDecoder, FrameHeader};
use crate::block::dequantize_block;
use crate::code::MdecCode;
use crate::color::psx_quad_to_rgb;
use crate::idct::{Dct8x8, FloatIdct, SimpleIdct};
use crate::tables::QuantMatrix;

/// 上游 (盘层) 交付的压缩帧
#[derive(Debug, Clone)]
pub struct DemuxedFrame {
    /// 显示宽度 (像素)
    pub width: u32,
    /// 显示高度 (像素)
    pub height: u32,
    /// 帧序号 (仅用于日志)
    pub frame_number: u32,
    /// 压缩字节 (头部 + 位流)
    pub data: Vec<u8>,
}

/// IDCT 引擎选择
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum IdctKind {
    /// 整数定点, 硬件输出逐位相同
    #[default]
    Simple,
    /// f64 参考实现
    Float,
}

/// 单个宏块的 6 个块码序列 (Cr, Cb, Y1..Y4)
#[derive(Debug, Clone)]
pub struct MacroblockCodes {
    pub blocks: [Vec<MdecCode>; 6],
}

/// 完整解码出的一帧 MDEC 码 (尚未反量化)
///
/// 部分宏块替换时作为原始码流的直通来源.
#[derive(Debug, Clone)]
pub struct DecodedFrame {
    pub variant: BitstreamVariant,
    pub header: FrameHeader,
    pub width: u32,
    pub height: u32,
    pub macroblocks: Vec<MacroblockCodes>,
}

impl DecodedFrame {
    /// 宏块列数 (按编码尺寸)
    pub fn mb_cols(&self) -> usize {
        (self.width as usize).div_ceil(16)
    }

    /// 宏块行数 (按编码尺寸)
    pub fn mb_rows(&self) -> usize {
        (self.height as usize).div_ceil(16)
    }

    /// 全帧 MDEC 码总数 (含 EOB)
    pub fn code_count(&self) -> usize {
        self.macroblocks
            .iter()
            .flat_map(|mb| mb.blocks.iter())
            .map(Vec::len)
            .sum()
    }

    /// 按硬件消费顺序导出整帧的 16 位半字流 (MDEC DMA 布局)
    pub fn to_mdec_words(&self) -> Vec<u16> {
        let mut words = Vec::with_capacity(self.code_count());
        for mb in &self.macroblocks {
            for block in &mb.blocks {
                words.extend(block.iter().map(|c| c.to_word()));
            }
        }
        words
    }
}

/// 从硬件半字流重建码层, 与 [`DecodedFrame::to_mdec_words`] 互逆
///
/// 每块以一个块首半字开始, 到 EOB 哨兵结束; 每 6 块构成一个宏块.
/// 半字流在块或宏块中途结束是 `MalformedBitstream`.
pub fn macroblocks_from_words(words: &[u16]) -> YingResult<Vec<MacroblockCodes>> {
    let mut macroblocks = Vec::new();
    let mut blocks: [Vec<MdecCode>; 6] = std::array::from_fn(|_| Vec::new());
    let mut block_index = 0usize;
    let mut pos = 0usize;

    while pos < words.len() {
        let mut codes = vec![MdecCode::first_from_word(words[pos])];
        pos += 1;
        loop {
            let Some(&word) = words.get(pos) else {
                return Err(YingError::MalformedBitstream(
                    "半字流在块中途结束, 缺少 EOB".into(),
                ));
            };
            pos += 1;
            let code = MdecCode::run_from_word(word);
            codes.push(code);
            if code == MdecCode::EndOfBlock {
                break;
            }
        }
        blocks[block_index] = codes;
        block_index += 1;
        if block_index == 6 {
            let full = std::mem::replace(&mut blocks, std::array::from_fn(|_| Vec::new()));
            macroblocks.push(MacroblockCodes { blocks: full });
            block_index = 0;
        }
    }

    if block_index != 0 {
        return Err(YingError::MalformedBitstream(format!(
            "半字流在宏块中途结束 (第 {} 块后)",
            block_index,
        )));
    }
    Ok(macroblocks)
}

/// 帧解码器
///
/// 变体/量化矩阵/IDCT 引擎是显式参数, 没有进程级注册表.
#[derive(Debug, Clone)]
pub struct FrameDecoder {
    variant: Option<BitstreamVariant>,
    matrix: QuantMatrix,
    idct: IdctKind,
}

impl Default for FrameDecoder {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameDecoder {
    /// 默认配置: 变体自动探测, 硬件量化矩阵, 整数 IDCT
    pub fn new() -> Self {
        Self {
            variant: None,
            matrix: QuantMatrix::psx_default(),
            idct: IdctKind::Simple,
        }
    }

    /// 固定位流变体 (跳过自动探测)
    pub fn with_variant(mut self, variant: BitstreamVariant) -> Self {
        self.variant = Some(variant);
        self
    }

    /// 使用自定义量化矩阵
    pub fn with_quant_matrix(mut self, matrix: QuantMatrix) -> Self {
        self.matrix = matrix;
        self
    }

    /// 选择 IDCT 引擎
    pub fn with_idct(mut self, idct: IdctKind) -> Self {
        self.idct = idct;
        self
    }

    /// 解码一帧为 RGB 像素
    pub fn decode(&self, frame: &DemuxedFrame) -> YingResult<RgbFrame> {
        let decoded = self.decode_codes(frame)?;
        self.render(&decoded)
    }

    /// 只解码到 MDEC 码层 (不做反量化/IDCT)
    pub fn decode_codes(&self, frame: &DemuxedFrame) -> YingResult<DecodedFrame> {
        if frame.width == 0 || frame.height == 0 {
            return Err(YingError::DimensionMismatch(format!(
                "帧尺寸 {}x{} 非法",
                frame.width, frame.height,
            )));
        }

        let mb_cols = (frame.width as usize).div_ceil(16);
        let mb_rows = (frame.height as usize).div_ceil(16);
        let mb_count = mb_cols * mb_rows;

        let mut dec = CodeDecoder::new(&frame.data, self.variant)?;
        debug!(
            "帧 {}: {}x{} ({} 宏块), 变体 {:?}, 量化尺度 {}/{}",
            frame.frame_number,
            frame.width,
            frame.height,
            mb_count,
            dec.variant(),
            dec.header().qscale_luma,
            dec.header().qscale_chroma,
        );

        let mut macroblocks = Vec::with_capacity(mb_count);
        let mut consumed = 0usize;
        for mb in 0..mb_count {
            let mut blocks: [Vec<MdecCode>; 6] = std::array::from_fn(|_| Vec::new());
            for block in blocks.iter_mut() {
                dec.next_block(block)?;
                consumed += block.len();
            }
            trace!("宏块 {} 解码完成, 比特偏移 {}", mb, dec.bits_read());
            macroblocks.push(MacroblockCodes { blocks });
        }

        // 头部计数字段是位流自带的几何约束, 与调用方给的尺寸相互印证
        if !dec.header().code_count_matches(dec.variant(), consumed) {
            return Err(YingError::DimensionMismatch(format!(
                "头部码数字段 {} 与按 {}x{} 消费的 {} 码不符",
                dec.header().code_count_field,
                frame.width,
                frame.height,
                consumed,
            )));
        }

        Ok(DecodedFrame {
            variant: dec.variant(),
            header: *dec.header(),
            width: frame.width,
            height: frame.height,
            macroblocks,
        })
    }

    /// 把已解码的码流渲染为 RGB 像素
    pub fn render(&self, decoded: &DecodedFrame) -> YingResult<RgbFrame> {
        let mb_cols = decoded.mb_cols();
        let mut out = RgbFrame::new(decoded.width, decoded.height);

        for (mb, codes) in decoded.macroblocks.iter().enumerate() {
            let mb_x = (mb % mb_cols) as u32 * 16;
            let mb_y = (mb / mb_cols) as u32 * 16;

            let mut samples = [[0i32; 64]; 6];
            for (i, block) in codes.blocks.iter().enumerate() {
                let mut coeffs = dequantize_block(block, &self.matrix)?;
                self.run_idct(&mut coeffs);
                samples[i] = coeffs;
            }

            self.paint_macroblock(&mut out, mb_x, mb_y, &samples);
        }

        Ok(out)
    }

    fn run_idct(&self, block: &mut [i32; 64]) {
        match self.idct {
            IdctKind::Simple => SimpleIdct.idct(block),
            IdctKind::Float => FloatIdct.idct(block),
        }
    }

    /// 四亮度共享一色度样本地写出 16x16 区域, 超出显示尺寸的部分裁掉
    fn paint_macroblock(
        &self,
        out: &mut RgbFrame,
        mb_x: u32,
        mb_y: u32,
        samples: &[[i32; 64]; 6],
    ) {
        let cr = &samples[0];
        let cb = &samples[1];
        for cy in 0..8u32 {
            for cx in 0..8u32 {
                let chroma_idx = (cy * 8 + cx) as usize;
                let lx = cx * 2;
                let ly = cy * 2;
                let y4 = [
                    luma_sample(samples, lx, ly),
                    luma_sample(samples, lx + 1, ly),
                    luma_sample(samples, lx, ly + 1),
                    luma_sample(samples, lx + 1, ly + 1),
                ];
                let quad = psx_quad_to_rgb(y4, cb[chroma_idx], cr[chroma_idx]);
                let offsets = [(0, 0), (1, 0), (0, 1), (1, 1)];
                for (i, (dx, dy)) in offsets.into_iter().enumerate() {
                    let px = mb_x + lx + dx;
                    let py = mb_y + ly + dy;
                    if px < out.width && py < out.height {
                        out.set_pixel(px, py, quad[i]);
                    }
                }
            }
        }
    }
}

/// 16x16 亮度区域内取样: 块 2..6 按象限 Y1(左上) Y2(右上) Y3(左下) Y4(右下)
#[inline]
fn luma_sample(samples: &[[i32; 64]; 6], lx: u32, ly: u32) -> i32 {
    let quadrant = (ly / 8) * 2 + lx / 8;
    samples[2 + quadrant as usize][((ly % 8) * 8 + lx % 8) as usize]
}
