//! 非平铺模式的仿射变换计算
//!
//! # 设计思路
//!
//! 变换把"目标坐标"映射回"源坐标"：`source = scale * (dest + translate)`。
//! 缩放比定义为"每个目标像素需要多少源像素"，因此：
//!
//! - `max(w_scale, h_scale)`：缩放后图像在两轴上都不超过目标，整图可见
//! - `min(w_scale, h_scale)`：缩放后图像在两轴上都不小于目标，铺满并裁剪
//!
//! # 实现思路
//!
//! 1. 求两轴比值 `w_scale` / `h_scale`
//! 2. 按模式收敛为最终缩放与滤镜
//! 3. 统一用 `(source / scale - target) / 2` 计算平移，使结果居中

use super::{PlacementError, PlacementMode, ensure_non_empty};

/// 重采样滤镜。
///
/// 仅影响画质与速度，不影响几何正确性；每个模式的选择是确定的。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResampleFilter {
    /// 最近邻，速度优先（缩放比为 1 时没有失真）。
    Nearest,
    /// 双三次类卷积，画质优先。
    Bicubic,
}

/// 目标坐标 → 源坐标的仿射变换。
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    pub scale_x: f64,
    pub scale_y: f64,
    pub translate_x: f64,
    pub translate_y: f64,
    pub filter: ResampleFilter,
}

/// 变换后的源图在目标坐标系中占据的区域（浮点，可超出目标范围）。
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DestinationExtent {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Transform {
    /// 把目标坐标映射到源坐标。
    pub fn map_to_source(&self, dest_x: f64, dest_y: f64) -> (f64, f64) {
        (
            self.scale_x * (dest_x + self.translate_x),
            self.scale_y * (dest_y + self.translate_y),
        )
    }

    /// 计算整张源图变换后在目标坐标系中的外接矩形。
    pub fn destination_extent(&self, source_width: u32, source_height: u32) -> DestinationExtent {
        DestinationExtent {
            x: -self.translate_x,
            y: -self.translate_y,
            width: source_width as f64 / self.scale_x,
            height: source_height as f64 / self.scale_y,
        }
    }
}

/// 计算非平铺模式的变换。
///
/// # 参数
/// * `source_width` / `source_height` - 源图尺寸
/// * `target_width` / `target_height` - 目标输出尺寸
/// * `mode` - 摆放模式（不能是 `Tile`）
///
/// # 返回
/// - `Ok(Transform)`：缩放、平移与滤镜
/// - `Err(UnsupportedMode)`：传入 `Tile`
/// - `Err(EmptyGeometry)`：任一尺寸为 0
pub fn compute_transform(
    source_width: u32,
    source_height: u32,
    target_width: u32,
    target_height: u32,
    mode: PlacementMode,
) -> Result<Transform, PlacementError> {
    ensure_non_empty(source_width, source_height, target_width, target_height)?;

    let source_w = source_width as f64;
    let source_h = source_height as f64;
    let target_w = target_width as f64;
    let target_h = target_height as f64;

    let w_scale = source_w / target_w;
    let h_scale = source_h / target_h;

    let (scale_x, scale_y, filter) = match mode {
        PlacementMode::Center => (1.0, 1.0, ResampleFilter::Nearest),
        PlacementMode::Maximize => {
            let scale = w_scale.max(h_scale);
            (scale, scale, ResampleFilter::Bicubic)
        }
        PlacementMode::Zoom => {
            let scale = w_scale.min(h_scale);
            (scale, scale, ResampleFilter::Bicubic)
        }
        PlacementMode::Stretch => (w_scale, h_scale, ResampleFilter::Bicubic),
        PlacementMode::Tile => return Err(PlacementError::UnsupportedMode(mode)),
    };

    let translate_x = (source_w / scale_x - target_w) / 2.0;
    let translate_y = (source_h / scale_y - target_h) / 2.0;

    log::debug!(
        "transform {}x{} -> {}x{} ({}): scale=({:.6}, {:.6}) translate=({:.3}, {:.3}) filter={:?}",
        source_width,
        source_height,
        target_width,
        target_height,
        mode,
        scale_x,
        scale_y,
        translate_x,
        translate_y,
        filter
    );

    Ok(Transform {
        scale_x,
        scale_y,
        translate_x,
        translate_y,
        filter,
    })
}
