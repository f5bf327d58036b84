//! # 合成模块（compositor）
//!
//! ## 设计思路
//!
//! 每个（源图, 输出, 模式）组合生成一块独立的离屏缓冲：
//! - 缓冲尺寸等于输出尺寸，先整体写入填充色
//! - 平铺：按平铺计划逐格拷贝源图行，源直接覆盖目标（不做 alpha 混合）
//! - 居中：缩放为 1，直接按整数偏移拷贝并双向裁剪
//! - 其余：按仿射变换重采样，仅写入可见区域，其余保留填充色（即留边）
//!
//! ## 实现思路
//!
//! 缓冲以值返回，所有权转移给调用方；合成器不保留任何引用。
//! 尺寸溢出与分配失败属于资源错误，由上层按致命错误处理。

mod buffer;
mod resample;

pub use buffer::CompositeBuffer;

use crate::config::WallpaperConfig;
use crate::outputs::OutputRect;
use crate::placement::{Placement, PlacementError, PlacementMode, TileSchedule, plan_placement};
use crate::source::{BYTES_PER_PIXEL, SourceImage};

/// 合成阶段错误。
#[derive(Debug, thiserror::Error)]
pub enum ComposeError {
    /// 输出矩形为空。
    #[error("输出 {name} 尺寸无效：{width}x{height}")]
    EmptyOutput { name: String, width: u16, height: u16 },

    #[error(transparent)]
    Placement(#[from] PlacementError),

    #[error("缓冲尺寸溢出：{width}x{height}")]
    SizeOverflow { width: u16, height: u16 },

    #[error("无法分配 {bytes} 字节的合成缓冲：{reason}")]
    Allocation { bytes: usize, reason: String },

    #[error("重采样失败：{0}")]
    Resample(String),
}

impl ComposeError {
    /// 校验类错误（只跳过当前输出）返回 `false`，资源类错误返回 `true`。
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::SizeOverflow { .. } | Self::Allocation { .. } | Self::Resample(_)
        )
    }
}

/// 把源图按模式合成到与输出等大的新缓冲中。
///
/// # 参数
/// * `source` - 源图（只读共享）
/// * `output` - 目标输出矩形
/// * `mode` - 摆放模式
/// * `config` - 提供填充色
///
/// # 返回
/// 合成完成的缓冲，所有权转移给调用方
pub fn composite(
    source: &SourceImage,
    output: &OutputRect,
    mode: PlacementMode,
    config: &WallpaperConfig,
) -> Result<CompositeBuffer, ComposeError> {
    if output.is_empty() {
        return Err(ComposeError::EmptyOutput {
            name: output.label().to_string(),
            width: output.width,
            height: output.height,
        });
    }

    let placement = plan_placement(
        source.width(),
        source.height(),
        output.width as u32,
        output.height as u32,
        mode,
    )?;

    let mut buffer = CompositeBuffer::allocate(output.width, output.height, config.fill_color)?;

    match placement {
        Placement::Tiled(schedule) => {
            log::debug!(
                "tiling for {} ({}x{} tiles of {}x{})",
                output.label(),
                schedule.columns().len(),
                schedule.rows().len(),
                source.width(),
                source.height()
            );
            copy_tiles(&mut buffer, source, &schedule);
        }
        Placement::Transformed(transform) => {
            log::debug!(
                "composing for {} (area {}x{}+0+0) (mode {})",
                output.label(),
                output.width,
                output.height,
                mode
            );
            if mode == PlacementMode::Center {
                copy_centered(&mut buffer, source);
            } else {
                resample::resample_into(&mut buffer, source, &transform)?;
            }
        }
    }

    Ok(buffer)
}

/// 按行区间 × 列区间把源图左上角的对应区域拷到每个平铺格。
fn copy_tiles(buffer: &mut CompositeBuffer, source: &SourceImage, schedule: &TileSchedule) {
    for row_span in schedule.rows() {
        for row in 0..row_span.len {
            let src_row = source.row(row);
            for column in schedule.columns() {
                let src = &src_row[..column.len as usize * BYTES_PER_PIXEL];
                buffer
                    .span_mut(column.start, row_span.start + row, column.len)
                    .copy_from_slice(src);
            }
        }
    }
}

/// 缩放为 1 的居中拷贝。
///
/// 目标像素 `p` 取源像素 `p + floor((source - target) / 2)`，
/// 与最近邻采样在半像素平移下的结果一致。
fn copy_centered(buffer: &mut CompositeBuffer, source: &SourceImage) {
    let Some((dest_x, src_x, width)) = centered_span(source.width(), buffer.width() as u32) else {
        return;
    };
    let Some((dest_y, src_y, height)) = centered_span(source.height(), buffer.height() as u32)
    else {
        return;
    };

    let start = src_x as usize * BYTES_PER_PIXEL;
    let len = width as usize * BYTES_PER_PIXEL;
    for row in 0..height {
        let src = &source.row(src_y + row)[start..start + len];
        buffer.span_mut(dest_x, dest_y + row, width).copy_from_slice(src);
    }
}

/// 单轴居中区间：返回 `(目标起点, 源起点, 长度)`。
fn centered_span(source_len: u32, target_len: u32) -> Option<(u32, u32, u32)> {
    let offset = (source_len as i64 - target_len as i64).div_euclid(2);
    let dest_start = (-offset).max(0);
    let dest_end = (source_len as i64 - offset).min(target_len as i64);
    if dest_end <= dest_start {
        return None;
    }
    let src_start = dest_start + offset;
    Some((dest_start as u32, src_start as u32, (dest_end - dest_start) as u32))
}

#[cfg(test)]
mod tests {
    use super::*;

    const FILL: u32 = 0xff00_0000;
    const MARK: u32 = 0xff80_0000;

    /// 每个像素编码自身坐标：`0xff80_0000 | x << 8 | y`。
    fn coordinate_image(width: u32, height: u32) -> SourceImage {
        let mut data = Vec::new();
        for y in 0..height {
            for x in 0..width {
                let argb = MARK | (x << 8) | y;
                data.extend_from_slice(&argb.to_le_bytes());
            }
        }
        SourceImage::from_argb(width, height, data).unwrap()
    }

    fn output(width: u16, height: u16) -> OutputRect {
        OutputRect::named("TEST-1", 0, 0, width, height)
    }

    #[test]
    fn test_tile_repeats_source_with_clipping() {
        let source = coordinate_image(3, 2);
        let buffer = composite(&source, &output(7, 5), PlacementMode::Tile, &WallpaperConfig::default())
            .unwrap();

        for y in 0..5 {
            for x in 0..7 {
                let expected = MARK | ((x % 3) << 8) | (y % 2);
                assert_eq!(buffer.pixel(x, y), Some(expected), "像素 ({}, {})", x, y);
            }
        }
    }

    #[test]
    fn test_center_smaller_source_keeps_fill_border() {
        let source = coordinate_image(2, 2);
        let buffer = composite(&source, &output(6, 4), PlacementMode::Center, &WallpaperConfig::default())
            .unwrap();

        // offset = floor((2 - 6) / 2) = -2 => 源图落在 x 2..4，y 1..3
        assert_eq!(buffer.pixel(2, 1), Some(MARK));
        assert_eq!(buffer.pixel(3, 2), Some(MARK | 0x0101));
        assert_eq!(buffer.pixel(0, 0), Some(FILL));
        assert_eq!(buffer.pixel(5, 3), Some(FILL));
        assert_eq!(buffer.pixel(1, 1), Some(FILL));
    }

    #[test]
    fn test_center_larger_source_is_cropped() {
        let source = coordinate_image(10, 6);
        let buffer = composite(&source, &output(4, 2), PlacementMode::Center, &WallpaperConfig::default())
            .unwrap();

        // offset = (10 - 4) / 2 = 3, (6 - 2) / 2 = 2
        assert_eq!(buffer.pixel(0, 0), Some(MARK | (3 << 8) | 2));
        assert_eq!(buffer.pixel(3, 1), Some(MARK | (6 << 8) | 3));
    }

    #[test]
    fn test_center_odd_difference_rounds_down() {
        assert_eq!(centered_span(3, 6), Some((2, 0, 3)));
        assert_eq!(centered_span(6, 3), Some((0, 1, 3)));
        assert_eq!(centered_span(5, 5), Some((0, 0, 5)));
    }

    #[test]
    fn test_maximize_letterboxes_with_fill() {
        let source = SourceImage::solid(10, 10, 0xffff_ffff).unwrap();
        let buffer = composite(&source, &output(40, 20), PlacementMode::Maximize, &WallpaperConfig::default())
            .unwrap();

        // 20x20 的图像水平居中：x 10..30
        assert_eq!(buffer.pixel(0, 10), Some(FILL));
        assert_eq!(buffer.pixel(9, 10), Some(FILL));
        assert_eq!(buffer.pixel(10, 10), Some(0xffff_ffff));
        assert_eq!(buffer.pixel(29, 0), Some(0xffff_ffff));
        assert_eq!(buffer.pixel(30, 19), Some(FILL));
    }

    #[test]
    fn test_zoom_and_stretch_cover_every_pixel() {
        let source = SourceImage::solid(10, 10, 0xffff_ffff).unwrap();
        for mode in [PlacementMode::Zoom, PlacementMode::Stretch] {
            let buffer = composite(&source, &output(40, 20), mode, &WallpaperConfig::default()).unwrap();
            for y in 0..20 {
                for x in 0..40 {
                    assert_eq!(buffer.pixel(x, y), Some(0xffff_ffff), "{} 在 ({}, {}) 未覆盖", mode, x, y);
                }
            }
        }
    }

    #[test]
    fn test_custom_fill_color() {
        let config = WallpaperConfig {
            fill_color: 0xff11_2233,
            ..WallpaperConfig::default()
        };
        let source = SourceImage::solid(1, 1, 0xffff_ffff).unwrap();
        let buffer = composite(&source, &output(3, 3), PlacementMode::Center, &config).unwrap();
        assert_eq!(buffer.pixel(0, 0), Some(0xff11_2233));
        assert_eq!(buffer.pixel(1, 1), Some(0xffff_ffff));
    }

    #[test]
    fn test_empty_output_is_validation_error() {
        let source = SourceImage::solid(1, 1, 0).unwrap();
        let err = composite(&source, &output(0, 10), PlacementMode::Tile, &WallpaperConfig::default())
            .unwrap_err();
        assert!(matches!(err, ComposeError::EmptyOutput { .. }));
        assert!(!err.is_fatal());
    }
}
