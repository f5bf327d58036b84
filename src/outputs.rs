//! 输出（显示器）选择模块
//!
//! # 设计思路
//!
//! 拓扑发现由显示层完成，这里只定义数据模型与"按选择器挑输出"的纯函数，
//! 与 X 连接完全解耦，便于单元测试。
//!
//! # 选择规则
//!
//! - 未指定选择器：整个屏幕（一个无名的合成输出）
//! - `"all"`：每个已发现的输出分别绘制；未启用多显示器时退化为整个屏幕
//! - 其他名字：大小写敏感的精确匹配，未命中返回空

/// 表示"所有输出"的选择器字面值。
pub const ALL_OUTPUTS: &str = "all";

/// 目标摆放区域。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputRect {
    pub x: i16,
    pub y: i16,
    pub width: u16,
    pub height: u16,
    /// 输出名；`None` 表示整个屏幕。
    pub name: Option<String>,
}

impl OutputRect {
    /// 整个屏幕对应的合成输出。
    pub fn whole_screen(width: u16, height: u16) -> Self {
        Self {
            x: 0,
            y: 0,
            width,
            height,
            name: None,
        }
    }

    pub fn named(name: impl Into<String>, x: i16, y: i16, width: u16, height: u16) -> Self {
        Self {
            x,
            y,
            width,
            height,
            name: Some(name.into()),
        }
    }

    /// 用于日志的名字。
    pub fn label(&self) -> &str {
        self.name.as_deref().unwrap_or("screen")
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }
}

/// 单个屏幕的输出集合。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputSet {
    /// 整个屏幕（或原生平铺时与图片等大的区域）。
    pub screen: OutputRect,
    /// 已发现的具名输出，保持发现顺序。
    pub outputs: Vec<OutputRect>,
}

impl OutputSet {
    /// 只有整个屏幕、没有具名输出（未启用多显示器）。
    pub fn screen_only(screen: OutputRect) -> Self {
        Self {
            screen,
            outputs: Vec::new(),
        }
    }

    /// 按选择器挑选目标输出。
    ///
    /// # 返回
    /// 命中的输出列表；具名选择器未命中时为空。
    pub fn select(&self, selector: Option<&str>) -> Vec<&OutputRect> {
        match selector {
            None => vec![&self.screen],
            Some(ALL_OUTPUTS) if self.outputs.is_empty() => vec![&self.screen],
            Some(ALL_OUTPUTS) => self.outputs.iter().collect(),
            Some(name) => self
                .outputs
                .iter()
                .filter(|output| output.name.as_deref() == Some(name))
                .take(1)
                .collect(),
        }
    }
}
