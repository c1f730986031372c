//! 比特流读取器.
//!
//! 面向 PS1 MDEC 位流的读取器: 数据按小端 16 位字存储, 字内按大端位序
//! (MSB first) 消费. 这与按字节流动的通用读取器不同, 是 PS1 视频位流的
//! 固定帧结构.
//!
//! 位置以绝对比特偏移跟踪, 支持精确的 seek/resume (替换帧时只需重读
//! 某个字节区间, 而非整帧).

use byteorder::{ByteOrder, LittleEndian};

use crate::{YingError, YingResult};

/// 比特流读取器
///
/// 从字节缓冲区中按位读取数据: 每 2 字节组成一个小端 16 位字,
/// 字内从最高位开始读取.
///
/// # 示例
/// ```
/// use ying_core::bitreader::BitReader;
///
/// // 小端字 0xB151 的位序列为 1011_0001_0101_0001
/// let data = [0x51, 0xB1];
/// let mut br = BitReader::new(&data);
/// assert_eq!(br.read_bits(4).unwrap(), 0b1011);
/// assert_eq!(br.read_bits(12).unwrap(), 0b0001_0101_0001);
/// ```
pub struct BitReader<'a> {
    /// 源数据 (按小端 16 位字解释, 末尾不足一个字的字节被忽略)
    data: &'a [u8],
    /// 当前绝对比特偏移
    bit_pos: usize,
    /// 总比特数 (完整字 x 16)
    bit_len: usize,
}

impl<'a> BitReader<'a> {
    /// 创建新的比特流读取器
    pub fn new(data: &'a [u8]) -> Self {
        Self {
            data,
            bit_pos: 0,
            bit_len: (data.len() / 2) * 16,
        }
    }

    /// 获取已读取的总位数 (绝对比特偏移)
    pub fn bits_read(&self) -> usize {
        self.bit_pos
    }

    /// 获取剩余可读位数
    pub fn bits_left(&self) -> usize {
        self.bit_len - self.bit_pos
    }

    /// 是否已到达末尾
    pub fn is_eof(&self) -> bool {
        self.bits_left() == 0
    }

    /// 定位到指定的绝对比特偏移
    pub fn seek_to_bit(&mut self, bit: usize) -> YingResult<()> {
        if bit > self.bit_len {
            return Err(YingError::Eof);
        }
        self.bit_pos = bit;
        Ok(())
    }

    /// 读取 1 个位
    pub fn read_bit(&mut self) -> YingResult<u32> {
        if self.bit_pos >= self.bit_len {
            return Err(YingError::Eof);
        }
        let word = self.current_word();
        let bit = (word >> (15 - (self.bit_pos % 16))) & 1;
        self.bit_pos += 1;
        Ok(u32::from(bit))
    }

    /// 读取 N 个位 (最多 32 位)
    ///
    /// 返回值的低 N 位有效.
    pub fn read_bits(&mut self, n: u32) -> YingResult<u32> {
        if n == 0 {
            return Ok(0);
        }
        if n > 32 {
            return Err(YingError::InvalidArgument(format!(
                "read_bits: n={} 超过 32 位",
                n,
            )));
        }
        if (n as usize) > self.bits_left() {
            return Err(YingError::Eof);
        }

        let mut result: u32 = 0;
        let mut remaining = n;

        while remaining > 0 {
            let bit_in_word = (self.bit_pos % 16) as u32;
            let available = 16 - bit_in_word;
            let to_read = remaining.min(available);

            // 从当前 16 位字中提取位
            let word = self.current_word();
            let shift = available - to_read;
            let mask = (1u32 << to_read) - 1;
            let bits = (u32::from(word) >> shift) & mask;

            result = (result << to_read) | bits;
            self.bit_pos += to_read as usize;
            remaining -= to_read;
        }

        Ok(result)
    }

    /// 读取有符号整数 (二进制补码)
    pub fn read_bits_signed(&mut self, n: u32) -> YingResult<i32> {
        let val = self.read_bits(n)?;
        if n == 0 {
            return Ok(0);
        }
        if n >= 32 {
            return Ok(val as i32);
        }
        // 符号扩展: 若最高有效位为 1, 则填充高位
        if (val >> (n - 1)) & 1 != 0 {
            Ok(val as i32 | !((1i32 << n) - 1))
        } else {
            Ok(val as i32)
        }
    }

    /// 窥视 N 个位 (不移动位置)
    ///
    /// 超出末尾时返回 0 填充的结果, 便于变长码表的顺序匹配;
    /// 剩余位数不足 1 位时仍返回 `Eof`.
    pub fn peek_bits(&mut self, n: u32) -> YingResult<u32> {
        let saved = self.bit_pos;
        let left = self.bits_left();
        if left == 0 {
            return Err(YingError::Eof);
        }
        let readable = (n as usize).min(left) as u32;
        let result = self.read_bits(readable)?;
        self.bit_pos = saved;
        Ok(result << (n - readable))
    }

    /// 跳过 N 个位
    pub fn skip_bits(&mut self, n: u32) -> YingResult<()> {
        if (n as usize) > self.bits_left() {
            return Err(YingError::Eof);
        }
        self.bit_pos += n as usize;
        Ok(())
    }

    /// 对齐到下一个 16 位字边界
    ///
    /// 如果当前已在字边界, 则不做任何事.
    pub fn align_to_word(&mut self) {
        let rem = self.bit_pos % 16;
        if rem > 0 {
            self.bit_pos += 16 - rem;
        }
    }

    /// 获取底层数据的引用
    pub fn data(&self) -> &'a [u8] {
        self.data
    }

    fn current_word(&self) -> u16 {
        let word_idx = self.bit_pos / 16;
        LittleEndian::read_u16(&self.data[word_idx * 2..word_idx * 2 + 2])
    }
}
