//! # 摆放几何模块（placement）
//!
//! ## 设计思路
//!
//! 纯数学层：输入源图尺寸、目标矩形尺寸与摆放模式，输出唯一的变换或平铺计划。
//! 不做任何 I/O，也不持有可变状态，便于单元测试与性质测试。
//!
//! - `transform`：非平铺模式（Center / Maximize / Zoom / Stretch）的仿射变换
//! - `tile`：平铺模式的网格计划（含边缘裁剪）
//!
//! ## 实现思路
//!
//! 摆放模式是封闭枚举，每个输出只在 [`plan_placement`] 中分派一次；
//! 各模式的规则都是无共享状态的纯函数。

mod tile;
mod transform;

pub use tile::{TileRect, TileSchedule, TileSpan, compute_tile_schedule};
pub use transform::{DestinationExtent, ResampleFilter, Transform, compute_transform};

use std::fmt;

/// 摆放模式。
///
/// 每个（图片, 输出）组合恰好对应一个模式。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PlacementMode {
    /// 原尺寸平铺，末行/末列裁剪。
    Tile,
    /// 原尺寸居中，溢出部分裁剪。
    Center,
    /// 等比缩放，整图可见，空白处保留填充色。
    Maximize,
    /// 等比缩放，铺满目标，溢出方向裁剪。
    Zoom,
    /// 两轴独立缩放，铺满目标，不保持宽高比。
    Stretch,
}

impl PlacementMode {
    /// 命令行选项名（不含 `--` 前缀）。
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Tile => "tile",
            Self::Center => "center",
            Self::Maximize => "maximize",
            Self::Zoom => "zoom",
            Self::Stretch => "stretch",
        }
    }

    /// 全部模式，顺序与命令行帮助一致。
    pub const ALL: [PlacementMode; 5] = [
        Self::Center,
        Self::Maximize,
        Self::Stretch,
        Self::Tile,
        Self::Zoom,
    ];
}

impl fmt::Display for PlacementMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 几何计算错误。
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum PlacementError {
    /// 源图或目标任一维度为 0。
    #[error("无效尺寸：源图 {source_width}x{source_height}，目标 {target_width}x{target_height}")]
    EmptyGeometry {
        source_width: u32,
        source_height: u32,
        target_width: u32,
        target_height: u32,
    },

    /// 模式不适用于当前操作（例如对 Tile 求仿射变换）。
    #[error("模式 {0} 不支持该操作")]
    UnsupportedMode(PlacementMode),
}

/// 单个输出的摆放结果。
#[derive(Debug, Clone, PartialEq)]
pub enum Placement {
    /// 平铺计划（相对目标原点）。
    Tiled(TileSchedule),
    /// 仿射变换。
    Transformed(Transform),
}

/// 按模式分派，生成一次摆放所需的全部几何信息。
///
/// # 参数
/// * `source_width` / `source_height` - 源图像素尺寸
/// * `target_width` / `target_height` - 目标输出尺寸
/// * `mode` - 摆放模式
///
/// # 返回
/// - `Placement::Tiled`：`mode == Tile`
/// - `Placement::Transformed`：其余模式
pub fn plan_placement(
    source_width: u32,
    source_height: u32,
    target_width: u32,
    target_height: u32,
    mode: PlacementMode,
) -> Result<Placement, PlacementError> {
    match mode {
        PlacementMode::Tile => compute_tile_schedule(
            source_width,
            source_height,
            target_width,
            target_height,
        )
        .map(Placement::Tiled),
        PlacementMode::Center
        | PlacementMode::Maximize
        | PlacementMode::Zoom
        | PlacementMode::Stretch => compute_transform(
            source_width,
            source_height,
            target_width,
            target_height,
            mode,
        )
        .map(Placement::Transformed),
    }
}

pub(crate) fn ensure_non_empty(
    source_width: u32,
    source_height: u32,
    target_width: u32,
    target_height: u32,
) -> Result<(), PlacementError> {
    if source_width == 0 || source_height == 0 || target_width == 0 || target_height == 0 {
        return Err(PlacementError::EmptyGeometry {
            source_width,
            source_height,
            target_width,
            target_height,
        });
    }
    Ok(())
}
