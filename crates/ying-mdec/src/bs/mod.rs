//! 位流变体编解码.
//!
//! 同一套 MDEC 码模型存在多个紧密相关但互不兼容的打包格式,
//! 按来源游戏/引擎区分. 各变体在三个轴上分化:
//! - 头部布局 (字段位置与含义)
//! - escape 码的后续位宽
//! - 量化尺度的编码方式 (整帧全局 vs 亮度/色度分离)
//!
//! 变体是封闭枚举 + 按 match 分派的策略函数, 而非类层次:
//! 探测逻辑因此是穷举且可测试的. 探测不允许猜测 —— 没有或多于
//! 一个变体认领缓冲区都是 `UnsupportedVariant`.
//!
//! 所有变体共享的帧结构: 8 字节头部, 之后是小端 16 位字的位流,
//! 字内 MSB first. 每块的解码状态机为
//! `ExpectFirst -> ExpectRunOrEnd -> (循环) -> Ended`.

pub mod lain;
pub mod strv2;
pub mod strv3;

use log::{debug, trace};
use ying_core::{BitReader, BitWriter, YingError, YingResult};

use crate::code::MdecCode;
use crate::vlc::{self, AcSymbol};

/// 帧头部长度 (字节)
pub const HEADER_BYTES: usize = 8;
/// 帧头部魔数
pub const HEADER_MAGIC: u16 = 0x3800;

/// 位流变体标识
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BitstreamVariant {
    /// STR version 2 (也接受 version 1 头部): 全局量化尺度, 绝对 10 位 DC
    StrV2,
    /// STR version 3: DC 差分 Huffman 编码, 粒度为 4
    StrV3,
    /// Lain 引擎变体: 亮度/色度分离的量化尺度, MPEG-1 8/16 位 escape
    Lain,
}

impl BitstreamVariant {
    /// 从头部探测变体
    ///
    /// 每个变体的头部判据互斥 (魔数位置 + version 值 + 尺度字段范围),
    /// 歧义与无匹配都是错误而非静默猜测.
    pub fn detect(data: &[u8]) -> YingResult<Self> {
        if data.len() < HEADER_BYTES {
            return Err(YingError::UnsupportedVariant(format!(
                "缓冲区只有 {} 字节, 不足一个帧头部",
                data.len(),
            )));
        }

        let mut matches = Vec::new();
        if strv2::claims(data) {
            matches.push(BitstreamVariant::StrV2);
        }
        if strv3::claims(data) {
            matches.push(BitstreamVariant::StrV3);
        }
        if lain::claims(data) {
            matches.push(BitstreamVariant::Lain);
        }

        match matches.as_slice() {
            [v] => {
                debug!("探测到位流变体: {:?}", v);
                Ok(*v)
            }
            [] => Err(YingError::UnsupportedVariant(
                "没有变体认领该头部".into(),
            )),
            _ => Err(YingError::UnsupportedVariant(format!(
                "头部被多个变体认领: {:?}",
                matches,
            ))),
        }
    }
}

/// 解析后的帧头部
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameHeader {
    /// MDEC 码数量字段 (v2/v3 为码数的一半向上取整, Lain 为码数本身)
    pub code_count_field: u16,
    /// 亮度量化尺度 (v2/v3 为全帧统一尺度)
    pub qscale_luma: u8,
    /// 色度量化尺度 (v2/v3 与亮度相同)
    pub qscale_chroma: u8,
    /// 头部 version 字段
    pub version: u16,
}

impl FrameHeader {
    /// 头部计数字段与实际消费的码数是否一致
    ///
    /// v2/v3 的字段存码数的一半向上取整, Lain 直接存码数.
    pub fn code_count_matches(&self, variant: BitstreamVariant, codes: usize) -> bool {
        let field = usize::from(self.code_count_field);
        match variant {
            BitstreamVariant::Lain => codes == field,
            BitstreamVariant::StrV2 | BitstreamVariant::StrV3 => codes.div_ceil(2) == field,
        }
    }

    /// 宏块内指定块的量化尺度 (块序 Cr, Cb, Y1..Y4)
    pub fn qscale_for_block(&self, block_index: usize) -> u8 {
        if block_index < 2 {
            self.qscale_chroma
        } else {
            self.qscale_luma
        }
    }
}

/// 每块解码状态 (见模块文档的状态机)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BlockState {
    ExpectFirst,
    ExpectRunOrEnd,
}

/// 位流 -> MDEC 码序列的惰性解码器
///
/// 每次 `next_block` 产出一个块的完整码序列
/// (FirstOfBlock, Run*, EndOfBlock). 调用方负责按宏块数 x 6 计数.
pub struct CodeDecoder<'a> {
    variant: BitstreamVariant,
    header: FrameHeader,
    reader: BitReader<'a>,
    /// 宏块内的块下标 0..6 (0=Cr, 1=Cb, 2..=5=Y)
    block_index: usize,
    /// STRv3 的 DC 预测器 [Cr, Cb, Y]
    dc_pred: [i16; 3],
}

impl<'a> CodeDecoder<'a> {
    /// 创建解码器; `variant` 为 None 时自动探测
    pub fn new(data: &'a [u8], variant: Option<BitstreamVariant>) -> YingResult<Self> {
        let variant = match variant {
            Some(v) => v,
            None => BitstreamVariant::detect(data)?,
        };
        let header = match variant {
            BitstreamVariant::StrV2 => strv2::read_header(data)?,
            BitstreamVariant::StrV3 => strv3::read_header(data)?,
            BitstreamVariant::Lain => lain::read_header(data)?,
        };
        let mut reader = BitReader::new(data);
        reader
            .skip_bits((HEADER_BYTES * 8) as u32)
            .map_err(|_| YingError::MalformedBitstream("头部之后没有位流数据".into()))?;
        Ok(Self {
            variant,
            header,
            reader,
            block_index: 0,
            dc_pred: [0; 3],
        })
    }

    /// 帧头部
    pub fn header(&self) -> &FrameHeader {
        &self.header
    }

    /// 位流变体
    pub fn variant(&self) -> BitstreamVariant {
        self.variant
    }

    /// 已消费的绝对比特偏移 (含头部)
    pub fn bits_read(&self) -> usize {
        self.reader.bits_read()
    }

    /// 解码下一个块的码序列, 追加到 `out`
    ///
    /// 块首码是位置性的 (ExpectFirst 状态只在块头出现),
    /// 其余码走 ExpectRunOrEnd 循环直到 EOB.
    pub fn next_block(&mut self, out: &mut Vec<MdecCode>) -> YingResult<()> {
        let first = self
            .read_first_of_block()
            .map_err(map_eof_to_malformed)?;
        out.push(first);

        loop {
            match vlc::decode_ac(&mut self.reader).map_err(map_eof_to_malformed)? {
                AcSymbol::Eob => {
                    out.push(MdecCode::EndOfBlock);
                    break;
                }
                AcSymbol::Escape => {
                    let code = self.read_escape().map_err(map_eof_to_malformed)?;
                    out.push(code);
                }
                AcSymbol::Code { run, ac } => {
                    out.push(MdecCode::Run { run, ac });
                }
            }
        }

        trace!(
            "块 {} 解码完成, 比特偏移 {}",
            self.block_index,
            self.reader.bits_read(),
        );
        self.block_index = (self.block_index + 1) % 6;
        Ok(())
    }

    fn read_first_of_block(&mut self) -> YingResult<MdecCode> {
        let qscale = self.header.qscale_for_block(self.block_index);
        let dc = match self.variant {
            BitstreamVariant::StrV2 | BitstreamVariant::Lain => {
                strv2::read_dc(&mut self.reader)?
            }
            BitstreamVariant::StrV3 => {
                strv3::read_dc(&mut self.reader, self.block_index, &mut self.dc_pred)?
            }
        };
        Ok(MdecCode::FirstOfBlock { qscale, dc })
    }

    fn read_escape(&mut self) -> YingResult<MdecCode> {
        match self.variant {
            BitstreamVariant::StrV2 | BitstreamVariant::StrV3 => {
                strv2::read_escape(&mut self.reader)
            }
            BitstreamVariant::Lain => lain::read_escape(&mut self.reader),
        }
    }
}

fn map_eof_to_malformed(e: YingError) -> YingError {
    match e {
        YingError::Eof => {
            YingError::MalformedBitstream("块尚未结束, 位流已耗尽".into())
        }
        other => other,
    }
}

/// 打包结果
#[derive(Debug, Clone)]
pub struct PackedFrame {
    /// 头部 + 位流 (始终为整数个 16 位字)
    pub data: Vec<u8>,
    /// 消费的完整 16 位字数量
    pub words: usize,
    /// 位流写入结束时的精确比特位置 (含头部, 未计入末尾补齐)
    pub bit_position: usize,
    /// 打包的 MDEC 码总数 (含 EOB)
    pub code_count: usize,
}

/// 将一帧完整的 MDEC 码序列打包为指定变体的位流
///
/// 对每个 (run, value) 对选择最短的 escape 编码.
/// 码序列必须满足块状态机, 违例是 `MalformedBitstream`.
pub fn pack_frame(variant: BitstreamVariant, codes: &[MdecCode]) -> YingResult<PackedFrame> {
    let mut writer = BitWriter::with_capacity(codes.len());
    let mut state = BlockState::ExpectFirst;
    let mut block_index = 0usize;
    let mut dc_pred = [0i16; 3];
    let mut qscale_luma = None;
    let mut qscale_chroma = None;

    for &code in codes {
        code.validate()?;
        match (state, code) {
            (BlockState::ExpectFirst, MdecCode::FirstOfBlock { qscale, dc }) => {
                let slot = if block_index < 2 {
                    &mut qscale_chroma
                } else {
                    &mut qscale_luma
                };
                match *slot {
                    None => *slot = Some(qscale),
                    Some(q) if q == qscale => {}
                    Some(q) => {
                        return Err(YingError::MalformedBitstream(format!(
                            "变体 {:?} 要求帧内量化尺度一致, 但出现 {} 与 {}",
                            variant, q, qscale,
                        )));
                    }
                }
                match variant {
                    BitstreamVariant::StrV2 | BitstreamVariant::Lain => {
                        strv2::write_dc(&mut writer, dc);
                    }
                    BitstreamVariant::StrV3 => {
                        strv3::write_dc(&mut writer, block_index, dc, &mut dc_pred);
                    }
                }
                state = BlockState::ExpectRunOrEnd;
            }
            (BlockState::ExpectRunOrEnd, MdecCode::Run { run, ac }) => {
                if !vlc::write_ac(&mut writer, run, ac) {
                    vlc::write_escape(&mut writer);
                    match variant {
                        BitstreamVariant::StrV2 | BitstreamVariant::StrV3 => {
                            strv2::write_escape_value(&mut writer, run, ac);
                        }
                        BitstreamVariant::Lain => {
                            lain::write_escape_value(&mut writer, run, ac)?;
                        }
                    }
                }
                state = BlockState::ExpectRunOrEnd;
            }
            (BlockState::ExpectRunOrEnd, MdecCode::EndOfBlock) => {
                vlc::write_eob(&mut writer);
                block_index = (block_index + 1) % 6;
                state = BlockState::ExpectFirst;
            }
            (s, c) => {
                return Err(YingError::MalformedBitstream(format!(
                    "码序列违反块状态机: 状态 {:?} 遇到 {:?}",
                    s, c,
                )));
            }
        }
    }

    if state != BlockState::ExpectFirst {
        return Err(YingError::MalformedBitstream(
            "码序列在块中途结束, 缺少 EOB".into(),
        ));
    }

    // v2/v3 头部只有一个尺度字段, 亮度与色度必须一致
    if !matches!(variant, BitstreamVariant::Lain) {
        if let (Some(l), Some(c)) = (qscale_luma, qscale_chroma) {
            if l != c {
                return Err(YingError::MalformedBitstream(format!(
                    "变体 {:?} 不支持亮度/色度分离的量化尺度 ({} vs {})",
                    variant, l, c,
                )));
            }
        }
    }

    let code_count = codes.len();
    let payload_bits = writer.bit_position();
    let payload = writer.finish();

    let qscale_luma = qscale_luma.unwrap_or(1);
    let qscale_chroma = qscale_chroma.unwrap_or(qscale_luma);
    let mut data = match variant {
        BitstreamVariant::StrV2 => strv2::write_header(code_count, qscale_luma, 2),
        BitstreamVariant::StrV3 => strv3::write_header(code_count, qscale_luma),
        BitstreamVariant::Lain => lain::write_header(code_count, qscale_luma, qscale_chroma),
    };
    data.extend_from_slice(&payload);

    Ok(PackedFrame {
        words: data.len() / 2,
        bit_position: HEADER_BYTES * 8 + payload_bits,
        code_count,
        data,
    })
}
