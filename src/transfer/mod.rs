//! # 分块传输模块（transfer）
//!
//! ## 设计思路
//!
//! 把合成好的缓冲按"整行"切块上传到远端 pixmap，每块不超过服务器公布的最大请求长度。
//!
//! 请求上限采用两级策略：
//! 1. 先用协议理论上限计算每块行数，能一次传完就只发一个请求
//! 2. 否则改用较小的实用上限重新计算，再按该行数切块（吞吐更好）
//!
//! ## 实现思路
//!
//! - `plan`：纯计算，给出 `(row_offset, row_count)` 序列
//! - `sink`：显示服务器侧的写入接口 `PixmapSink`
//! - `execute_transfer`：按行序依次调用 `put_rows`，任何一块失败即中止整次传输
//!
//! 每块数据直接是缓冲的行切片，字节布局与缓冲完全一致，不做额外拷贝。

mod plan;
mod sink;

pub use plan::{Chunk, TransferPlan, max_rows_per_request, plan_transfer, split_rows};
pub use sink::PixmapSink;
#[cfg(test)]
pub(crate) use sink::RecordingSink;

use crate::compositor::CompositeBuffer;

/// 传输阶段错误，全部按致命错误处理。
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum TransferError {
    /// 服务器的最大请求长度连请求头都放不下。
    #[error("无法向 X 服务器上传图像：最大请求长度 {max_request_bytes} 字节不足以容纳 {header_bytes} 字节请求头")]
    RequestTooSmall {
        max_request_bytes: u64,
        header_bytes: u32,
    },

    /// 单行数据已超过单个请求可用的负载。
    #[error("无法向 X 服务器上传图像：单行 {row_bytes} 字节超过单请求负载上限 {max_payload_bytes} 字节")]
    RowTooLarge {
        row_bytes: u64,
        max_payload_bytes: u64,
    },

    #[error("不支持的 pixmap 深度：{0}（仅支持 24 / 32）")]
    UnsupportedDepth(u8),

    #[error("目标坐标超出 16 位范围：y = {0}")]
    CoordinateOverflow(i64),

    #[error("缓冲长度与传输计划不符：需要 {expected} 字节，实际 {actual} 字节")]
    BufferMismatch { expected: usize, actual: usize },

    #[error("上传失败：{0}")]
    Put(String),
}

/// 传输目标在 pixmap 中的左上角。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransferOrigin {
    pub x: i16,
    pub y: i16,
}

/// 按计划依次上传每一块。
///
/// 块按行号递增顺序发出；前一块失败时不会再发后续块。
///
/// # 参数
/// * `plan` - 由 [`plan_transfer`] 生成的计划
/// * `buffer` - 合成完成的缓冲
/// * `sink` - 目标 pixmap
/// * `origin` - 缓冲左上角在 pixmap 中的位置
pub fn execute_transfer<S: PixmapSink + ?Sized>(
    plan: &TransferPlan,
    buffer: &CompositeBuffer,
    sink: &mut S,
    origin: TransferOrigin,
) -> Result<(), TransferError> {
    let depth = sink.depth();
    if depth != 24 && depth != 32 {
        return Err(TransferError::UnsupportedDepth(depth));
    }

    let row_len = plan.row_len();
    let expected = row_len * buffer.height() as usize;
    if buffer.data().len() != expected || buffer.stride() != row_len {
        return Err(TransferError::BufferMismatch {
            expected,
            actual: buffer.data().len(),
        });
    }

    for chunk in plan.chunks() {
        let dest_y = origin.y as i64 + chunk.row_offset as i64;
        let dest_y =
            i16::try_from(dest_y).map_err(|_| TransferError::CoordinateOverflow(dest_y))?;
        let rows = u16::try_from(chunk.row_count)
            .map_err(|_| TransferError::CoordinateOverflow(chunk.row_count as i64))?;

        let start = chunk.row_offset as usize * row_len;
        let end = start + chunk.row_count as usize * row_len;

        log::debug!(
            "put image ({}x{}+0+{}) to ({}x{}+{}+{})",
            buffer.width(),
            rows,
            chunk.row_offset,
            buffer.width(),
            rows,
            origin.x,
            dest_y
        );
        sink.put_rows(origin.x, dest_y, buffer.width(), rows, &buffer.data()[start..end])?;
    }

    Ok(())
}

/// 规划并执行一次完整上传。
pub fn upload<S: PixmapSink + ?Sized>(
    buffer: &CompositeBuffer,
    sink: &mut S,
    origin: TransferOrigin,
    config: &crate::config::WallpaperConfig,
) -> Result<TransferPlan, TransferError> {
    let plan = plan_transfer(
        buffer.height() as u32,
        buffer.stride(),
        sink.max_request_units(),
        config,
    )?;
    execute_transfer(&plan, buffer, sink, origin)?;
    Ok(plan)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::WallpaperConfig;

    fn striped_buffer(width: u16, height: u16) -> CompositeBuffer {
        let mut buffer = CompositeBuffer::allocate(width, height, 0).unwrap();
        for y in 0..height as u32 {
            let row: Vec<u8> = (0..width as u32)
                .flat_map(|_| (0xff00_0000 | y).to_le_bytes())
                .collect();
            buffer.span_mut(0, y, width as u32).copy_from_slice(&row);
        }
        buffer
    }

    #[test]
    fn test_single_chunk_when_buffer_fits() {
        let buffer = striped_buffer(16, 10);
        let mut sink = RecordingSink::new(32, 32, 24, 4_194_303);
        let plan = upload(&buffer, &mut sink, TransferOrigin { x: 5, y: 7 }, &WallpaperConfig::default())
            .unwrap();

        assert_eq!(plan.chunks(), &[Chunk { row_offset: 0, row_count: 10 }]);
        assert_eq!(sink.puts.len(), 1);
        assert_eq!((sink.puts[0].x, sink.puts[0].y, sink.puts[0].rows), (5, 7, 10));
        assert_eq!((sink.puts[0].width, sink.puts[0].bytes), (16, 16 * 10 * 4));
        assert_eq!(sink.pixel(5, 7), Some(0xff00_0000));
        assert_eq!(sink.pixel(20, 16), Some(0xff00_0009));
    }

    #[test]
    fn test_chunks_land_at_increasing_offsets() {
        let buffer = striped_buffer(4, 10);
        // 每请求 (16 * 4 - 24) / 16 = 2 行
        let mut sink = RecordingSink::new(4, 10, 24, 16);
        let plan = upload(&buffer, &mut sink, TransferOrigin { x: 0, y: 0 }, &WallpaperConfig::default())
            .unwrap();

        assert_eq!(plan.rows_per_request(), 2);
        let offsets: Vec<i16> = sink.puts.iter().map(|p| p.y).collect();
        assert_eq!(offsets, [0, 2, 4, 6, 8]);
        assert!(sink.puts.iter().all(|p| p.width == 4 && p.bytes == 4 * 2 * 4));
        for y in 0..10 {
            assert_eq!(sink.pixel(3, y), Some(0xff00_0000 | y as u32), "第 {} 行内容应与缓冲一致", y);
        }
    }

    #[test]
    fn test_every_valid_pad_uploads_odd_width() {
        for pad in [1, 2, 4] {
            let config = WallpaperConfig {
                scanline_pad_bytes: pad,
                ..WallpaperConfig::default()
            };
            config.validate().unwrap();
            let buffer = striped_buffer(7, 5);
            let mut sink = RecordingSink::new(7, 5, 24, 4_194_303);
            upload(&buffer, &mut sink, TransferOrigin { x: 0, y: 0 }, &config).unwrap();
            assert_eq!(sink.pixel(6, 4), Some(0xff00_0004), "对齐 {} 时末像素应正确上传", pad);
        }
    }

    #[test]
    fn test_unsupported_depth_is_rejected() {
        let buffer = striped_buffer(4, 4);
        let mut sink = RecordingSink::new(4, 4, 16, 4096);
        let err = upload(&buffer, &mut sink, TransferOrigin { x: 0, y: 0 }, &WallpaperConfig::default())
            .unwrap_err();
        assert_eq!(err, TransferError::UnsupportedDepth(16));
        assert!(sink.puts.is_empty());
    }

    #[test]
    fn test_destination_beyond_i16_is_rejected() {
        let buffer = striped_buffer(1, 4);
        let mut sink = RecordingSink::new(1, 4, 24, 7);
        let plan = plan_transfer(4, 4, 7, &WallpaperConfig::default()).unwrap();
        let err = execute_transfer(&plan, &buffer, &mut sink, TransferOrigin { x: 0, y: i16::MAX })
            .unwrap_err();
        assert!(matches!(err, TransferError::CoordinateOverflow(_)));
    }

    #[test]
    fn test_put_failure_stops_transfer() {
        let buffer = striped_buffer(4, 10);
        let mut sink = RecordingSink::new(4, 10, 24, 16);
        sink.fail_after = Some(2);
        let err = upload(&buffer, &mut sink, TransferOrigin { x: 0, y: 0 }, &WallpaperConfig::default())
            .unwrap_err();
        assert!(matches!(err, TransferError::Put(_)));
        assert_eq!(sink.puts.len(), 2, "失败后不应继续发送后续块");
    }
}
