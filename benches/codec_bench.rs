//! Ying MDEC 编解码性能基准测试.
//!
//! 覆盖解码/编码全链路与两套 IDCT 引擎.

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use ying::core::YCbCr420Frame;
use ying::mdec::{DemuxedFrame, FrameDecoder, FrameEncoder, IdctKind};

/// 创建一个带梯度内容的测试帧
fn make_pixels(width: u32, height: u32) -> YCbCr420Frame {
    let mut f = YCbCr420Frame::new(width, height).unwrap();
    let cw = f.coded_width();
    for (i, v) in f.y.iter_mut().enumerate() {
        let (x, y) = (i % cw, i / cw);
        *v = ((x as i32 * 5 + y as i32 * 2) % 200 - 100) as i16;
    }
    for (i, v) in f.cb.iter_mut().enumerate() {
        *v = ((i % 50) as i32 - 25) as i16;
    }
    f
}

/// 编码一帧作为解码基准的输入
fn make_encoded(width: u32, height: u32) -> Vec<u8> {
    FrameEncoder::new()
        .encode(&make_pixels(width, height), None, 1 << 22)
        .unwrap()
        .data
}

fn bench_decode_simple_idct(c: &mut Criterion) {
    let frame = DemuxedFrame {
        width: 320,
        height: 240,
        frame_number: 0,
        data: make_encoded(320, 240),
    };
    c.bench_function("decode_320x240_simple_idct", |b| {
        let decoder = FrameDecoder::new().with_idct(IdctKind::Simple);
        b.iter(|| decoder.decode(black_box(&frame)).unwrap());
    });
}

fn bench_decode_float_idct(c: &mut Criterion) {
    let frame = DemuxedFrame {
        width: 320,
        height: 240,
        frame_number: 0,
        data: make_encoded(320, 240),
    };
    c.bench_function("decode_320x240_float_idct", |b| {
        let decoder = FrameDecoder::new().with_idct(IdctKind::Float);
        b.iter(|| decoder.decode(black_box(&frame)).unwrap());
    });
}

fn bench_decode_codes_only(c: &mut Criterion) {
    let frame = DemuxedFrame {
        width: 320,
        height: 240,
        frame_number: 0,
        data: make_encoded(320, 240),
    };
    c.bench_function("decode_codes_320x240", |b| {
        let decoder = FrameDecoder::new();
        b.iter(|| decoder.decode_codes(black_box(&frame)).unwrap());
    });
}

fn bench_encode(c: &mut Criterion) {
    let pixels = make_pixels(320, 240);
    c.bench_function("encode_320x240", |b| {
        let encoder = FrameEncoder::new();
        b.iter(|| encoder.encode(black_box(&pixels), None, 1 << 22).unwrap());
    });
}

criterion_group!(
    benches,
    bench_decode_simple_idct,
    bench_decode_float_idct,
    bench_decode_codes_only,
    bench_encode,
);
criterion_main!(benches);
