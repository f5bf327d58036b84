//! 合成缓冲
//!
//! 尺寸与目标输出一致的 ARGB32 缓冲，构造时即写入填充色。
//! 所有尺寸运算都做溢出检查，分配失败以错误返回而不是中止。

use super::ComposeError;
use crate::source::BYTES_PER_PIXEL;

/// 单个输出的离屏像素缓冲。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompositeBuffer {
    width: u16,
    height: u16,
    stride: usize,
    data: Vec<u8>,
}

impl CompositeBuffer {
    /// 分配并以 `fill_color`（`0xAARRGGBB`）填充。
    pub fn allocate(width: u16, height: u16, fill_color: u32) -> Result<Self, ComposeError> {
        let stride = (width as usize)
            .checked_mul(BYTES_PER_PIXEL)
            .ok_or(ComposeError::SizeOverflow { width, height })?;
        let len = stride
            .checked_mul(height as usize)
            .ok_or(ComposeError::SizeOverflow { width, height })?;

        let mut data = Vec::new();
        data.try_reserve_exact(len)
            .map_err(|e| ComposeError::Allocation {
                bytes: len,
                reason: e.to_string(),
            })?;

        let fill = fill_color.to_le_bytes();
        for _ in 0..(len / BYTES_PER_PIXEL) {
            data.extend_from_slice(&fill);
        }

        Ok(Self {
            width,
            height,
            stride,
            data,
        })
    }

    pub fn width(&self) -> u16 {
        self.width
    }

    pub fn height(&self) -> u16 {
        self.height
    }

    pub fn stride(&self) -> usize {
        self.stride
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// 第 `y` 行中从 `x` 开始、`pixels` 个像素的可写切片。
    pub(crate) fn span_mut(&mut self, x: u32, y: u32, pixels: u32) -> &mut [u8] {
        let start = y as usize * self.stride + x as usize * BYTES_PER_PIXEL;
        let end = start + pixels as usize * BYTES_PER_PIXEL;
        &mut self.data[start..end]
    }

    /// 读取单个像素（`0xAARRGGBB`），越界返回 `None`。
    pub fn pixel(&self, x: u32, y: u32) -> Option<u32> {
        if x >= self.width as u32 || y >= self.height as u32 {
            return None;
        }
        let offset = y as usize * self.stride + x as usize * BYTES_PER_PIXEL;
        let bytes: [u8; 4] = self.data[offset..offset + BYTES_PER_PIXEL].try_into().ok()?;
        Some(u32::from_le_bytes(bytes))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_allocate_fills_every_pixel() {
        let buffer = CompositeBuffer::allocate(3, 2, 0xff12_3456).unwrap();
        assert_eq!(buffer.stride(), 12);
        assert_eq!(buffer.data().len(), 24);
        for y in 0..2 {
            for x in 0..3 {
                assert_eq!(buffer.pixel(x, y), Some(0xff12_3456));
            }
        }
    }

    #[test]
    fn test_span_mut_addresses_row_segment() {
        let mut buffer = CompositeBuffer::allocate(4, 2, 0).unwrap();
        buffer.span_mut(1, 1, 2).copy_from_slice(&[1, 0, 0, 0, 2, 0, 0, 0]);
        assert_eq!(buffer.pixel(0, 1), Some(0));
        assert_eq!(buffer.pixel(1, 1), Some(1));
        assert_eq!(buffer.pixel(2, 1), Some(2));
        assert_eq!(buffer.pixel(3, 1), Some(0));
    }
}
