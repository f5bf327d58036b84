//! # 配置模块
//!
//! ## 设计思路
//!
//! 将所有"可调策略"集中到 `WallpaperConfig`，`Default` 提供生产可用的值。
//! 合成与传输两阶段都只读取配置快照，不在运行中修改。
//!
//! ## 两级请求上限
//!
//! - `protocol_ceiling_units`：协议理论上限，用于判断"能否一次传完"
//! - `practical_ceiling_units`：需要分块时改用的较小上限，吞吐更好
//!
//! 只有在确实需要分块时才启用第二级。

/// X11 请求长度单位（字节）。
pub const WIRE_UNIT_BYTES: u32 = 4;

/// PutImage 请求的固定头部长度（字节）。
pub const PUT_IMAGE_HEADER_BYTES: u32 = 24;

/// 壁纸绘制配置。
#[derive(Debug, Clone)]
pub struct WallpaperConfig {
    /// 合成缓冲与 pixmap 的初始填充色（`0xAARRGGBB`）。
    pub fill_color: u32,
    /// 第一级：协议理论请求上限（4 字节单位）。
    pub protocol_ceiling_units: u32,
    /// 第二级：分块时使用的实用请求上限（4 字节单位）。
    pub practical_ceiling_units: u32,
    /// 每个请求的固定头部（字节）。
    pub request_header_bytes: u32,
    /// 扫描行对齐（字节）。
    pub scanline_pad_bytes: u32,
}

impl Default for WallpaperConfig {
    fn default() -> Self {
        Self {
            fill_color: 0xff00_0000,
            protocol_ceiling_units: u32::MAX / WIRE_UNIT_BYTES,
            practical_ceiling_units: 65_536,
            request_header_bytes: PUT_IMAGE_HEADER_BYTES,
            scanline_pad_bytes: 4,
        }
    }
}

/// 配置不合法。
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("扫描行对齐必须整除每像素 4 字节（1、2 或 4），当前：{0}")]
    ScanlinePad(u32),

    #[error("实用请求上限（{practical}）不能大于协议上限（{protocol}）")]
    CeilingOrder { practical: u32, protocol: u32 },

    #[error("请求上限不能为 0")]
    ZeroCeiling,
}

impl WallpaperConfig {
    /// 校验参数组合。
    pub fn validate(&self) -> Result<(), ConfigError> {
        // 合成缓冲不带行填充，对齐必须整除 `width * 4`
        if !self.scanline_pad_bytes.is_power_of_two()
            || self.scanline_pad_bytes > crate::source::BYTES_PER_PIXEL as u32
        {
            return Err(ConfigError::ScanlinePad(self.scanline_pad_bytes));
        }
        if self.protocol_ceiling_units == 0 || self.practical_ceiling_units == 0 {
            return Err(ConfigError::ZeroCeiling);
        }
        if self.practical_ceiling_units > self.protocol_ceiling_units {
            return Err(ConfigError::CeilingOrder {
                practical: self.practical_ceiling_units,
                protocol: self.protocol_ceiling_units,
            });
        }
        Ok(())
    }
}
