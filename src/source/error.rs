//! # 源图错误模型
//!
//! 源图相关错误全部属于"校验错误"：只影响引用该图片的选项，
//! 不会中止整个进程。

use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum ImageError {
    #[error("无法读取 {path}：{reason}")]
    FileSystem { path: PathBuf, reason: String },

    #[error("无法解析 {path}：{reason}")]
    Decode { path: PathBuf, reason: String },

    #[error("图片尺寸非法：{width}x{height}（每边须在 1~65535 之间）")]
    IllegalDimensions { width: u32, height: u32 },

    #[error("像素缓冲长度异常：{width}x{height} 图片收到 {len} 字节")]
    BufferSize { width: u32, height: u32, len: usize },

    /// 同一路径此前已解码失败（缓存的失败结果）。
    #[error("{path} 此前加载失败，跳过")]
    PreviouslyFailed { path: PathBuf },
}
