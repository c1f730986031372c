//! 像素容器.
//!
//! 本编解码核心只拥有两种固定格式:
//! - `RgbFrame`: 解码输出, RGB888 行主序
//! - `YCbCr420Frame`: 编码输入, PSX 色彩空间的平面 4:2:0

use crate::{YingError, YingResult};

/// RGB888 像素帧 (行主序, 每像素 3 字节)
#[derive(Debug, Clone)]
pub struct RgbFrame {
    /// 宽度 (像素)
    pub width: u32,
    /// 高度 (像素)
    pub height: u32,
    /// 像素数据, 长度 = width * height * 3
    pub data: Vec<u8>,
}

impl RgbFrame {
    /// 创建全黑帧
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            data: vec![0; width as usize * height as usize * 3],
        }
    }

    /// 读取一个像素的 RGB 值
    pub fn pixel(&self, x: u32, y: u32) -> [u8; 3] {
        let i = (y as usize * self.width as usize + x as usize) * 3;
        [self.data[i], self.data[i + 1], self.data[i + 2]]
    }

    /// 写入一个像素的 RGB 值
    pub fn set_pixel(&mut self, x: u32, y: u32, rgb: [u8; 3]) {
        let i = (y as usize * self.width as usize + x as usize) * 3;
        self.data[i..i + 3].copy_from_slice(&rgb);
    }
}

/// PSX 色彩空间的平面 4:2:0 帧
///
/// 样本为有符号值 (-128..=127), 与 MDEC 硬件的内部表示一致.
/// 色度平面分辨率为亮度的一半, 一个 Cb/Cr 样本覆盖 2x2 亮度区域.
/// 平面尺寸按宏块对齐 (宽高向上取整到 16 的倍数).
#[derive(Debug, Clone)]
pub struct YCbCr420Frame {
    /// 显示宽度 (像素)
    pub width: u32,
    /// 显示高度 (像素)
    pub height: u32,
    /// 亮度平面, coded_width * coded_height
    pub y: Vec<i16>,
    /// 蓝色度平面, (coded_width/2) * (coded_height/2)
    pub cb: Vec<i16>,
    /// 红色度平面, (coded_width/2) * (coded_height/2)
    pub cr: Vec<i16>,
}

impl YCbCr420Frame {
    /// 创建全零 (中性灰) 帧
    pub fn new(width: u32, height: u32) -> YingResult<Self> {
        if width == 0 || height == 0 {
            return Err(YingError::InvalidArgument(format!(
                "帧尺寸不能为零: {}x{}",
                width, height,
            )));
        }
        let cw = Self::coded_dim(width);
        let ch = Self::coded_dim(height);
        Ok(Self {
            width,
            height,
            y: vec![0; cw * ch],
            cb: vec![0; (cw / 2) * (ch / 2)],
            cr: vec![0; (cw / 2) * (ch / 2)],
        })
    }

    /// 宏块对齐后的宽度
    pub fn coded_width(&self) -> usize {
        Self::coded_dim(self.width)
    }

    /// 宏块对齐后的高度
    pub fn coded_height(&self) -> usize {
        Self::coded_dim(self.height)
    }

    /// 横向宏块数
    pub fn mb_cols(&self) -> usize {
        self.coded_width() / 16
    }

    /// 纵向宏块数
    pub fn mb_rows(&self) -> usize {
        self.coded_height() / 16
    }

    fn coded_dim(d: u32) -> usize {
        (d as usize).div_ceil(16) * 16
    }
}
