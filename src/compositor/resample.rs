//! 缩放采样（Maximize / Zoom / Stretch）
//!
//! # 实现思路
//!
//! 1. 由变换求出源图在目标中的外接矩形，与目标求交并取整，得到"可见区域"
//! 2. 把可见区域反算回源坐标，作为裁剪框（浮点，保留亚像素精度）
//! 3. 以借用方式交给 `fast_image_resize`，把裁剪框重采样到可见区域大小
//! 4. 逐行拷入合成缓冲；可见区域之外保持填充色

use fast_image_resize as fr;

use super::{CompositeBuffer, ComposeError};
use crate::placement::{ResampleFilter, Transform};
use crate::source::{BYTES_PER_PIXEL, SourceImage};

/// 目标中的整像素矩形及其对应的源裁剪框。
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct SampleRegion {
    pub(crate) dest_x: u32,
    pub(crate) dest_y: u32,
    pub(crate) dest_width: u32,
    pub(crate) dest_height: u32,
    pub(crate) crop_left: f64,
    pub(crate) crop_top: f64,
    pub(crate) crop_width: f64,
    pub(crate) crop_height: f64,
}

/// 计算可见区域；源图完全落在目标外时返回 `None`。
pub(crate) fn sample_region(
    transform: &Transform,
    source_width: u32,
    source_height: u32,
    target_width: u32,
    target_height: u32,
) -> Option<SampleRegion> {
    let extent = transform.destination_extent(source_width, source_height);

    let (dest_x, dest_width, crop_left, crop_width) = axis_region(
        extent.x,
        extent.width,
        target_width,
        transform.scale_x,
        transform.translate_x,
        source_width,
    )?;
    let (dest_y, dest_height, crop_top, crop_height) = axis_region(
        extent.y,
        extent.height,
        target_height,
        transform.scale_y,
        transform.translate_y,
        source_height,
    )?;

    Some(SampleRegion {
        dest_x,
        dest_y,
        dest_width,
        dest_height,
        crop_left,
        crop_top,
        crop_width,
        crop_height,
    })
}

fn axis_region(
    extent_start: f64,
    extent_len: f64,
    target_len: u32,
    scale: f64,
    translate: f64,
    source_len: u32,
) -> Option<(u32, u32, f64, f64)> {
    let start = extent_start.round().max(0.0);
    let end = (extent_start + extent_len).round().min(target_len as f64);
    if end <= start {
        return None;
    }

    let source_len = source_len as f64;
    let crop_start = (scale * (start + translate)).clamp(0.0, source_len);
    let crop_len = (scale * (end - start)).min(source_len - crop_start);
    if crop_len <= 0.0 {
        return None;
    }

    Some((start as u32, (end - start) as u32, crop_start, crop_len))
}

fn resize_alg(filter: ResampleFilter) -> fr::ResizeAlg {
    match filter {
        ResampleFilter::Nearest => fr::ResizeAlg::Nearest,
        ResampleFilter::Bicubic => fr::ResizeAlg::Convolution(fr::FilterType::CatmullRom),
    }
}

/// 按变换把源图采样进缓冲。
pub(crate) fn resample_into(
    buffer: &mut CompositeBuffer,
    source: &SourceImage,
    transform: &Transform,
) -> Result<(), ComposeError> {
    let Some(region) = sample_region(
        transform,
        source.width(),
        source.height(),
        buffer.width() as u32,
        buffer.height() as u32,
    ) else {
        log::debug!("transformed image lies outside the target, nothing to sample");
        return Ok(());
    };

    // 直接借用源图像素，多个输出共享同一份数据
    let src_image = fr::images::ImageRef::new(
        source.width(),
        source.height(),
        source.data(),
        fr::PixelType::U8x4,
    )
    .map_err(|e| ComposeError::Resample(format!("构建源图像缓冲失败：{}", e)))?;

    let mut dst_image =
        fr::images::Image::new(region.dest_width, region.dest_height, fr::PixelType::U8x4);

    let options = fr::ResizeOptions::new()
        .resize_alg(resize_alg(transform.filter))
        .crop(
            region.crop_left,
            region.crop_top,
            region.crop_width,
            region.crop_height,
        );

    let mut resizer = fr::Resizer::new();
    resizer
        .resize(&src_image, &mut dst_image, Some(&options))
        .map_err(|e| ComposeError::Resample(format!("fast_image_resize 执行失败：{}", e)))?;

    let sampled = dst_image.into_vec();
    let row_len = region.dest_width as usize * BYTES_PER_PIXEL;
    for (row, pixels) in sampled.chunks_exact(row_len).enumerate() {
        buffer
            .span_mut(region.dest_x, region.dest_y + row as u32, region.dest_width)
            .copy_from_slice(pixels);
    }

    Ok(())
}
