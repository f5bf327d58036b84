//! # 源图模块（source）
//!
//! ## 设计思路
//!
//! 把"文件 → 像素"的解码留给 `image` crate，本模块只负责：
//! - 统一为 32 位 ARGB（小端字序，即每像素 `B, G, R, A` 四字节）
//! - 校验 16 位尺寸上限（X 协议坐标与尺寸均为 16 位）
//! - 同一路径只解码一次，多个选项/输出/屏幕共享同一份只读数据
//!
//! ## 实现思路
//!
//! - `SourceImage`：不可变像素缓冲，构造时完成校验
//! - `loader`：文件解码与格式转换
//! - `ImageCache`：按路径缓存 `Rc<SourceImage>`，失败结果同样缓存，避免重复报错

mod error;
mod loader;

pub use error::ImageError;
pub use loader::{ImageCache, load_image};

/// 每像素字节数（ARGB32）。
pub const BYTES_PER_PIXEL: usize = 4;

/// 已解码的源图。
///
/// 像素按行优先排列，无行填充：`stride == width * 4`。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceImage {
    width: u32,
    height: u32,
    data: Vec<u8>,
}

impl SourceImage {
    /// 由 ARGB32（小端字序）像素构造。
    ///
    /// # 返回
    /// - `Err(IllegalDimensions)`：宽或高为 0 或超过 65535
    /// - `Err(BufferSize)`：缓冲长度与尺寸不符
    pub fn from_argb(width: u32, height: u32, data: Vec<u8>) -> Result<Self, ImageError> {
        if width == 0 || height == 0 || width > u16::MAX as u32 || height > u16::MAX as u32 {
            return Err(ImageError::IllegalDimensions { width, height });
        }

        let expected = (width as usize)
            .checked_mul(height as usize)
            .and_then(|pixels| pixels.checked_mul(BYTES_PER_PIXEL))
            .ok_or(ImageError::IllegalDimensions { width, height })?;

        if data.len() != expected {
            return Err(ImageError::BufferSize {
                width,
                height,
                len: data.len(),
            });
        }

        Ok(Self { width, height, data })
    }

    /// 由 RGBA8 像素（`image` crate 的输出格式）构造，原地转换为 ARGB32。
    pub fn from_rgba(width: u32, height: u32, mut rgba: Vec<u8>) -> Result<Self, ImageError> {
        for pixel in rgba.chunks_exact_mut(BYTES_PER_PIXEL) {
            pixel.swap(0, 2);
        }
        Self::from_argb(width, height, rgba)
    }

    /// 用单一颜色构造（`0xAARRGGBB`）。
    pub fn solid(width: u32, height: u32, argb: u32) -> Result<Self, ImageError> {
        let pixels = (width as usize).saturating_mul(height as usize);
        let data = argb.to_le_bytes().repeat(pixels);
        Self::from_argb(width, height, data)
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// 每行字节数。
    pub fn stride(&self) -> usize {
        self.width as usize * BYTES_PER_PIXEL
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// 第 `y` 行的字节切片。
    pub fn row(&self, y: u32) -> &[u8] {
        let stride = self.stride();
        let start = y as usize * stride;
        &self.data[start..start + stride]
    }

    /// 读取单个像素（`0xAARRGGBB`），越界返回 `None`。
    pub fn pixel(&self, x: u32, y: u32) -> Option<u32> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let offset = y as usize * self.stride() + x as usize * BYTES_PER_PIXEL;
        let bytes: [u8; 4] = self.data[offset..offset + BYTES_PER_PIXEL].try_into().ok()?;
        Some(u32::from_le_bytes(bytes))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rgba_is_converted_to_argb() {
        let image = SourceImage::from_rgba(1, 1, vec![0x11, 0x22, 0x33, 0xff]).unwrap();
        assert_eq!(image.pixel(0, 0), Some(0xff11_2233));
        assert_eq!(image.data(), &[0x33, 0x22, 0x11, 0xff]);
    }

    #[test]
    fn test_dimension_limit_is_inclusive() {
        assert!(SourceImage::solid(65535, 1, 0).is_ok());
        let err = SourceImage::solid(65536, 1, 0).unwrap_err();
        assert!(matches!(err, ImageError::IllegalDimensions { width: 65536, height: 1 }));
    }

    #[test]
    fn test_zero_dimension_rejected() {
        let err = SourceImage::from_argb(0, 10, Vec::new()).unwrap_err();
        assert!(matches!(err, ImageError::IllegalDimensions { .. }));
    }

    #[test]
    fn test_buffer_length_mismatch_rejected() {
        let err = SourceImage::from_argb(2, 2, vec![0; 15]).unwrap_err();
        assert!(matches!(err, ImageError::BufferSize { len: 15, .. }));
    }

    #[test]
    fn test_row_and_pixel_access() {
        let mut data = Vec::new();
        for argb in [1u32, 2, 3, 4, 5, 6] {
            data.extend_from_slice(&argb.to_le_bytes());
        }
        let image = SourceImage::from_argb(3, 2, data).unwrap();
        assert_eq!(image.stride(), 12);
        assert_eq!(image.row(1), &[4, 0, 0, 0, 5, 0, 0, 0, 6, 0, 0, 0]);
        assert_eq!(image.pixel(2, 1), Some(6));
        assert_eq!(image.pixel(3, 0), None);
    }
}
