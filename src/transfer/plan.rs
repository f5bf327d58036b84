//! 传输计划
//!
//! # 设计思路
//!
//! - 单位换算：服务器上限以 4 字节为单位，先取 `min(服务器上限, 本级上限)` 再换算为字节
//! - 负载 = 上限字节数 - 请求头；单行长度按扫描行对齐向上取整
//! - 每块行数向下取整；小于 1 说明一行都放不下，直接报错而不是截断
//!
//! 计划只描述"从第几行开始、传几行"，不持有任何像素数据。

use super::TransferError;
use crate::config::{WIRE_UNIT_BYTES, WallpaperConfig};

/// 一次请求覆盖的行区间。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Chunk {
    pub row_offset: u32,
    pub row_count: u32,
}

/// 一块缓冲的完整传输计划。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferPlan {
    chunks: Vec<Chunk>,
    rows_per_request: u32,
    row_len: usize,
}

impl TransferPlan {
    pub fn chunks(&self) -> &[Chunk] {
        &self.chunks
    }

    /// 计划采用的每请求最大行数。
    pub fn rows_per_request(&self) -> u32 {
        self.rows_per_request
    }

    /// 对齐后的单行字节数。
    pub fn row_len(&self) -> usize {
        self.row_len
    }

    /// 所有块的行数之和。
    pub fn total_rows(&self) -> u64 {
        self.chunks.iter().map(|c| c.row_count as u64).sum()
    }
}

/// 计算单个请求最多能容纳多少行。
///
/// # 参数
/// * `server_max_units` - 服务器公布的最大请求长度（4 字节单位）
/// * `ceiling_units` - 本级策略上限（4 字节单位）
/// * `header_bytes` - 请求头长度
/// * `row_len` - 对齐后的单行字节数
pub fn max_rows_per_request(
    server_max_units: u32,
    ceiling_units: u32,
    header_bytes: u32,
    row_len: usize,
) -> Result<u32, TransferError> {
    let max_len = server_max_units.min(ceiling_units) as u64 * WIRE_UNIT_BYTES as u64;
    if max_len <= header_bytes as u64 {
        return Err(TransferError::RequestTooSmall {
            max_request_bytes: max_len,
            header_bytes,
        });
    }

    let max_payload = max_len - header_bytes as u64;
    let max_rows = max_payload / row_len.max(1) as u64;
    if max_rows < 1 {
        return Err(TransferError::RowTooLarge {
            row_bytes: row_len as u64,
            max_payload_bytes: max_payload,
        });
    }

    log::debug!(
        "put image request parameters: maximum request length allowed for server (32 bits): {}, \
         maximum length for row data: {}, length of rows in image: {}, maximum height to send: {}",
        server_max_units,
        max_payload,
        row_len,
        max_rows
    );

    Ok(max_rows.min(u32::MAX as u64) as u32)
}

/// 把 `row_count` 行切成每块最多 `max_rows` 行的连续区间，末块截断。
///
/// `max_rows` 为 0 时按 1 处理。
pub fn split_rows(row_count: u32, max_rows: u32) -> Vec<Chunk> {
    let step = max_rows.max(1);
    let mut chunks = Vec::with_capacity(row_count.div_ceil(step) as usize);
    let mut offset = 0u32;
    while offset < row_count {
        let rows = step.min(row_count - offset);
        chunks.push(Chunk {
            row_offset: offset,
            row_count: rows,
        });
        offset += rows;
    }
    chunks
}

/// 生成传输计划（两级上限策略）。
///
/// # 参数
/// * `row_count` - 缓冲总行数
/// * `row_stride` - 缓冲每行字节数
/// * `server_max_units` - 服务器最大请求长度（4 字节单位）
/// * `config` - 提供两级上限、请求头长度与扫描行对齐
///
/// # 返回
/// - 整个缓冲能一次传完：单块计划
/// - 否则：按实用上限切分的多块计划
pub fn plan_transfer(
    row_count: u32,
    row_stride: usize,
    server_max_units: u32,
    config: &WallpaperConfig,
) -> Result<TransferPlan, TransferError> {
    let pad = config.scanline_pad_bytes.max(1) as usize;
    let row_len = row_stride.next_multiple_of(pad);

    let mut rows_per_request = max_rows_per_request(
        server_max_units,
        config.protocol_ceiling_units,
        config.request_header_bytes,
        row_len,
    )?;

    if rows_per_request >= row_count {
        return Ok(TransferPlan {
            chunks: split_rows(row_count, row_count),
            rows_per_request,
            row_len,
        });
    }

    log::debug!("image exceeds request size limitations");
    rows_per_request = max_rows_per_request(
        server_max_units,
        config.practical_ceiling_units,
        config.request_header_bytes,
        row_len,
    )?;

    Ok(TransferPlan {
        chunks: split_rows(row_count, rows_per_request),
        rows_per_request,
        row_len,
    })
}
