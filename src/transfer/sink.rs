//! 显示服务器写入接口
//!
//! 传输层只依赖这个 trait，真实实现是 `display::RootPixmap`（Xlib），
//! 测试中使用内存实现 `RecordingSink`。

use super::TransferError;

/// 可接收整行像素写入的远端 pixmap。
pub trait PixmapSink {
    /// 服务器允许的最大请求长度（4 字节单位）。
    fn max_request_units(&self) -> u32;

    /// 目标 pixmap 的位深。
    fn depth(&self) -> u8;

    /// 把 `rows` 行、每行 `width` 像素的 ARGB32 数据写到 `(x, y)`。
    ///
    /// 失败即视为连接不可用，调用方不会重试。
    fn put_rows(
        &mut self,
        x: i16,
        y: i16,
        width: u16,
        rows: u16,
        data: &[u8],
    ) -> Result<(), TransferError>;
}

/// 单次写入记录。
#[cfg(test)]
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct PutRecord {
    pub(crate) x: i16,
    pub(crate) y: i16,
    pub(crate) width: u16,
    pub(crate) rows: u16,
    pub(crate) bytes: usize,
}

/// 内存中的 pixmap，记录每次写入并保存像素（越界部分裁剪）。
#[cfg(test)]
pub(crate) struct RecordingSink {
    pub(crate) width: u16,
    pub(crate) height: u16,
    pub(crate) depth: u8,
    pub(crate) max_request_units: u32,
    pub(crate) pixels: Vec<u32>,
    pub(crate) puts: Vec<PutRecord>,
    /// 成功写入这么多次之后开始返回错误。
    pub(crate) fail_after: Option<usize>,
}

#[cfg(test)]
impl RecordingSink {
    pub(crate) fn new(width: u16, height: u16, depth: u8, max_request_units: u32) -> Self {
        Self {
            width,
            height,
            depth,
            max_request_units,
            pixels: vec![0; width as usize * height as usize],
            puts: Vec::new(),
            fail_after: None,
        }
    }

    pub(crate) fn pixel(&self, x: u32, y: u32) -> Option<u32> {
        if x >= self.width as u32 || y >= self.height as u32 {
            return None;
        }
        self.pixels.get(y as usize * self.width as usize + x as usize).copied()
    }
}

#[cfg(test)]
impl PixmapSink for RecordingSink {
    fn max_request_units(&self) -> u32 {
        self.max_request_units
    }

    fn depth(&self) -> u8 {
        self.depth
    }

    fn put_rows(
        &mut self,
        x: i16,
        y: i16,
        width: u16,
        rows: u16,
        data: &[u8],
    ) -> Result<(), TransferError> {
        if self.fail_after.is_some_and(|limit| self.puts.len() >= limit) {
            return Err(TransferError::Put("connection closed".to_string()));
        }

        let wire_len = crate::config::PUT_IMAGE_HEADER_BYTES as u64 + data.len() as u64;
        assert!(
            wire_len <= self.max_request_units as u64 * 4,
            "请求长度 {} 超过服务器上限",
            wire_len
        );
        assert_eq!(data.len(), width as usize * rows as usize * 4);

        for row in 0..rows as i64 {
            for col in 0..width as i64 {
                let (px, py) = (x as i64 + col, y as i64 + row);
                if px < 0 || py < 0 || px >= self.width as i64 || py >= self.height as i64 {
                    continue;
                }
                let offset = ((row * width as i64 + col) * 4) as usize;
                let bytes = [data[offset], data[offset + 1], data[offset + 2], data[offset + 3]];
                self.pixels[py as usize * self.width as usize + px as usize] =
                    u32::from_le_bytes(bytes);
            }
        }

        self.puts.push(PutRecord {
            x,
            y,
            width,
            rows,
            bytes: data.len(),
        });
        Ok(())
    }
}
