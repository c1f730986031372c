//! MDEC 重编码/部分替换集成测试
//!
//! 验证反向链路与盘层约定:
//! - 字节预算不变式 (输出字节数按字取整且不超预算)
//! - 部分宏块替换: 未替换宏块逐像素不变
//! - 预算耗尽时的 FrameTooLargeToCompress

use ying::core::{YCbCr420Frame, YingError};
use ying::mdec::{DemuxedFrame, FrameDecoder, FrameEncoder};

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn source_pixels(width: u32, height: u32) -> YCbCr420Frame {
    let mut f = YCbCr420Frame::new(width, height).unwrap();
    let cw = f.coded_width();
    for (i, v) in f.y.iter_mut().enumerate() {
        let (x, y) = (i % cw, i / cw);
        *v = ((x as i32 * 7 + y as i32 * 3) % 220 - 110) as i16;
    }
    f
}

#[test]
fn test_reencode_budget_invariant() {
    init_logging();
    let pixels = source_pixels(48, 32);
    for max_bytes in [32usize, 200, 1000, 1 << 16] {
        match FrameEncoder::new().encode(&pixels, None, max_bytes) {
            Ok(enc) => {
                assert!(enc.used_bytes <= max_bytes, "预算 {} 被超出", max_bytes);
                assert_eq!(enc.used_bytes % 2, 0, "字节数必须按字取整");
                assert_eq!(enc.used_bytes, enc.data.len());
            }
            Err(YingError::FrameTooLargeToCompress { max_bytes: m }) => {
                assert_eq!(m, max_bytes);
            }
            Err(e) => panic!("意外错误: {e}"),
        }
    }
}

#[test]
fn test_reencode_coarsens_until_fit() {
    init_logging();
    let pixels = source_pixels(48, 32);
    let fine = FrameEncoder::new().encode(&pixels, Some(1), 1 << 16).unwrap();
    // 预算压到精细编码的一半, 编码器应加粗而不是失败
    let budget = fine.used_bytes / 2;
    let coarse = FrameEncoder::new().encode(&pixels, Some(1), budget).unwrap();
    assert!(coarse.used_bytes <= budget);
    println!(
        "✓ 精细 {} 字节 -> 预算 {} -> 实际 {} 字节",
        fine.used_bytes, budget, coarse.used_bytes,
    );
}

#[test]
fn test_replace_pipeline_passthrough() {
    init_logging();
    let pixels = source_pixels(64, 32);
    let enc = FrameEncoder::new().encode(&pixels, None, 1 << 20).unwrap();
    let demuxed = DemuxedFrame {
        width: 64,
        height: 32,
        frame_number: 0,
        data: enc.data,
    };
    let decoder = FrameDecoder::new();
    let original = decoder.decode_codes(&demuxed).unwrap();
    let before = decoder.render(&original).unwrap();

    // 8 个宏块, 只替换右下角的 2 个
    let mut patch = YCbCr420Frame::new(64, 32).unwrap();
    patch.y.fill(80);
    let enc2 = FrameEncoder::new()
        .encode_partial(&original, &patch, &[6, 7], 1 << 20)
        .unwrap();
    let after = decoder
        .decode(&DemuxedFrame {
            width: 64,
            height: 32,
            frame_number: 1,
            data: enc2.data,
        })
        .unwrap();

    // 未替换区域逐像素不变
    for y in 0..32u32 {
        for x in 0..64u32 {
            let mb = (y / 16) * 4 + x / 16;
            if mb < 6 {
                assert_eq!(
                    after.pixel(x, y),
                    before.pixel(x, y),
                    "未替换宏块 {} 的像素 ({x},{y}) 发生变化",
                    mb,
                );
            }
        }
    }
    // 被替换区域变为新内容
    let px = after.pixel(40, 24);
    assert!((i32::from(px[1]) - (80 + 128)).abs() <= 8);
}

#[test]
fn test_replace_pipeline_budget_exhaustion() {
    init_logging();
    let pixels = source_pixels(32, 16);
    // 1 字节连头部都放不下
    assert!(matches!(
        FrameEncoder::new().encode(&pixels, None, 1),
        Err(YingError::FrameTooLargeToCompress { max_bytes: 1 }),
    ));
}
