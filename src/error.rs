//! 统一错误类型模块
//!
//! # 设计思路
//!
//! 各子系统各自定义 `thiserror` 枚举，`AppError` 通过 `#[from]` 汇总，
//! 编排层只需 `?` 即可向上传播。
//!
//! # 实现思路
//!
//! - `is_fatal()` 区分两类错误：
//!   - 校验类（图片尺寸、解码失败、空输出等）：记录后跳过当前图片 / 输出
//!   - 资源类、传输类、显示类：立即中止本次运行
//! - 致命错误发生时不会发布未完成的背景。

use crate::compositor::ComposeError;
use crate::config::ConfigError;
use crate::display::DisplayError;
use crate::source::ImageError;
use crate::transfer::TransferError;

/// 应用级统一错误类型
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// 图片加载 / 校验失败
    #[error("{0}")]
    Image(#[from] ImageError),

    /// 合成失败
    #[error("{0}")]
    Compose(#[from] ComposeError),

    /// 分块上传失败
    #[error("{0}")]
    Transfer(#[from] TransferError),

    /// X 连接 / 资源创建失败
    #[error("{0}")]
    Display(#[from] DisplayError),

    /// 配置不合法
    #[error("配置错误: {0}")]
    Config(#[from] ConfigError),

    /// 所有图片均无法加载
    #[error("没有可用的图片")]
    NoUsableImage,
}

impl AppError {
    /// 是否需要中止整次运行。
    pub fn is_fatal(&self) -> bool {
        match self {
            Self::Image(_) => false,
            Self::Compose(err) => err.is_fatal(),
            Self::Transfer(_) | Self::Display(_) | Self::Config(_) | Self::NoUsableImage => true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::placement::{PlacementError, PlacementMode};

    #[test]
    fn test_validation_errors_are_not_fatal() {
        let err: AppError = ImageError::IllegalDimensions {
            width: 70_000,
            height: 10,
        }
        .into();
        assert!(!err.is_fatal());

        let err: AppError =
            ComposeError::from(PlacementError::UnsupportedMode(PlacementMode::Tile)).into();
        assert!(!err.is_fatal());
    }

    #[test]
    fn test_resource_and_transfer_errors_are_fatal() {
        let err: AppError = ComposeError::SizeOverflow {
            width: u16::MAX,
            height: u16::MAX,
        }
        .into();
        assert!(err.is_fatal());

        let err: AppError = TransferError::UnsupportedDepth(8).into();
        assert!(err.is_fatal());
        assert!(err.to_string().contains("8"));

        assert!(AppError::NoUsableImage.is_fatal());
        let err: AppError = crate::config::ConfigError::ZeroCeiling.into();
        assert!(err.is_fatal());
    }
}
