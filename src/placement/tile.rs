//! 平铺计划
//!
//! 从目标原点开始按源图原尺寸铺网格，末行/末列裁剪到剩余范围，
//! 不越界、不留缝。
//!
//! 网格是可分离的：只保存列区间与行区间，两者的笛卡尔积即全部平铺格，
//! 内存占用为 O(列数 + 行数)，与目标面积无关。

use super::{PlacementError, ensure_non_empty};

/// 单轴上的一段区间（已裁剪）。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TileSpan {
    pub start: u32,
    pub len: u32,
}

/// 单个平铺格（相对目标原点，已裁剪）。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TileRect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl TileRect {
    pub fn area(&self) -> u64 {
        self.width as u64 * self.height as u64
    }
}

/// 平铺计划：列区间 × 行区间。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TileSchedule {
    columns: Vec<TileSpan>,
    rows: Vec<TileSpan>,
}

impl TileSchedule {
    pub fn columns(&self) -> &[TileSpan] {
        &self.columns
    }

    pub fn rows(&self) -> &[TileSpan] {
        &self.rows
    }

    /// 平铺格总数。
    pub fn tile_count(&self) -> u64 {
        self.columns.len() as u64 * self.rows.len() as u64
    }

    /// 按行优先顺序逐个产出平铺格，不做分配。
    pub fn tiles(&self) -> impl Iterator<Item = TileRect> + '_ {
        self.rows.iter().flat_map(move |row| {
            self.columns.iter().map(move |column| TileRect {
                x: column.start,
                y: row.start,
                width: column.len,
                height: row.len,
            })
        })
    }
}

/// 把 `target_len` 按 `step` 切成连续区间，末段裁剪。
fn axis_spans(step: u32, target_len: u32) -> Vec<TileSpan> {
    (0..target_len)
        .step_by(step as usize)
        .map(|start| TileSpan {
            start,
            len: step.min(target_len - start),
        })
        .collect()
}

/// 生成覆盖整个目标的平铺计划。
///
/// # 参数
/// * `source_width` / `source_height` - 源图尺寸（每格的最大尺寸）
/// * `target_width` / `target_height` - 目标尺寸
pub fn compute_tile_schedule(
    source_width: u32,
    source_height: u32,
    target_width: u32,
    target_height: u32,
) -> Result<TileSchedule, PlacementError> {
    ensure_non_empty(source_width, source_height, target_width, target_height)?;

    Ok(TileSchedule {
        columns: axis_spans(source_width, target_width),
        rows: axis_spans(source_height, target_height),
    })
}
