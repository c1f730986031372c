//! 比特流写入器.
//!
//! 与 `BitReader` 对应: 位按大端位序填入 16 位字, 每凑满一个字
//! 以小端字节序落入输出缓冲区. 写入位置以绝对比特偏移报告,
//! 调用方据此向上取整到字粒度, 写入固定大小的盘区.

/// 比特流写入器
///
/// # 示例
/// ```
/// use ying_core::bitwriter::BitWriter;
///
/// let mut bw = BitWriter::new();
/// bw.write_bits(0b1011, 4);
/// bw.write_bits(0b0001_0101_0001, 12);
/// let data = bw.finish();
/// assert_eq!(data, vec![0x51, 0xB1]);
/// ```
pub struct BitWriter {
    /// 输出缓冲区 (只包含完整的字)
    data: Vec<u8>,
    /// 当前字 (正在填充)
    current_word: u16,
    /// 当前字中已填充的位数 (0-15)
    bit_count: u32,
}

impl BitWriter {
    /// 创建新的比特流写入器
    pub fn new() -> Self {
        Self {
            data: Vec::new(),
            current_word: 0,
            bit_count: 0,
        }
    }

    /// 以指定字节容量创建比特流写入器
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            data: Vec::with_capacity(capacity),
            current_word: 0,
            bit_count: 0,
        }
    }

    /// 获取已写入的总位数 (绝对比特偏移)
    pub fn bit_position(&self) -> usize {
        self.data.len() * 8 + self.bit_count as usize
    }

    /// 写入 N 个位 (最多 32 位), 取 `value` 的低 N 位
    pub fn write_bits(&mut self, value: u32, n: u32) {
        debug_assert!(n <= 32);
        for i in (0..n).rev() {
            let bit = (value >> i) & 1;
            self.current_word = (self.current_word << 1) | bit as u16;
            self.bit_count += 1;
            if self.bit_count == 16 {
                self.flush_word();
            }
        }
    }

    /// 直接写入一个完整的 16 位字
    ///
    /// 要求当前已在字边界 (见 `align_to_word`).
    pub fn write_word(&mut self, word: u16) {
        debug_assert_eq!(self.bit_count, 0, "write_word 需要字对齐");
        self.data.extend_from_slice(&word.to_le_bytes());
    }

    /// 用 0 位填充到下一个 16 位字边界
    pub fn align_to_word(&mut self) {
        if self.bit_count > 0 {
            let pad = 16 - self.bit_count;
            self.write_bits(0, pad);
        }
    }

    /// 结束写入, 填充到字边界并返回缓冲区
    pub fn finish(mut self) -> Vec<u8> {
        self.align_to_word();
        self.data
    }

    fn flush_word(&mut self) {
        self.data.extend_from_slice(&self.current_word.to_le_bytes());
        self.current_word = 0;
        self.bit_count = 0;
    }
}

impl Default for BitWriter {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::BitReader;

    #[test]
    fn test_write_bits_basic() {
        let mut bw = BitWriter::new();
        bw.write_bits(0b1011, 4);
        bw.write_bits(0b0001, 4);
        bw.write_bits(0b0101_0001, 8);
        assert_eq!(bw.finish(), vec![0x51, 0xB1]);
    }

    #[test]
    fn test_partial_word_padded() {
        let mut bw = BitWriter::new();
        bw.write_bits(0b101, 3);
        // 1010_0000_0000_0000 = 0xA000, 小端存储
        assert_eq!(bw.finish(), vec![0x00, 0xA0]);
    }

    #[test]
    fn test_bit_position() {
        let mut bw = BitWriter::new();
        assert_eq!(bw.bit_position(), 0);
        bw.write_bits(0, 7);
        assert_eq!(bw.bit_position(), 7);
        bw.write_bits(0, 11);
        assert_eq!(bw.bit_position(), 18);
    }

    #[test]
    fn test_write_word_aligned() {
        let mut bw = BitWriter::new();
        bw.write_word(0x3800);
        bw.write_bits(1, 1);
        bw.align_to_word();
        assert_eq!(bw.bit_position(), 32);
    }

    #[test]
    fn test_roundtrip_with_reader() {
        let mut bw = BitWriter::new();
        bw.write_bits(0x2A, 6);
        bw.write_bits(0x155, 10);
        bw.write_bits(0x3, 2);
        let data = bw.finish();

        let mut br = BitReader::new(&data);
        assert_eq!(br.read_bits(6).unwrap(), 0x2A);
        assert_eq!(br.read_bits(10).unwrap(), 0x155);
        assert_eq!(br.read_bits(2).unwrap(), 0x3);
    }
}
