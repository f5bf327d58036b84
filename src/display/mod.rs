//! # 显示层（display）
//!
//! ## 设计思路
//!
//! 所有 Xlib 调用集中在这里，其余模块只看到 `OutputSet` 与 `PixmapSink`。
//!
//! - `XDisplay`：连接上下文，显式传递；`Drop` 保证关闭连接
//! - `randr`：通过 RandR 1.5 监视器列表发现输出
//! - `pixmap`：根窗口 pixmap，实现 `PixmapSink` 并负责发布背景
//!
//! ## 错误处理
//!
//! Xlib 的协议错误是异步上报的，默认错误处理器会直接退出进程，
//! 因此这里只需处理同步可见的失败（连接、资源创建返回空值）。

mod pixmap;
mod randr;

pub use pixmap::{RootPixmap, pixmaps_to_kill};
pub use randr::{discover_outputs, monitor_rect, randr_available};

use std::ffi::CString;
use std::ptr;

use x11::xlib;

/// 显示层错误，全部按致命错误处理。
#[derive(Debug, thiserror::Error)]
pub enum DisplayError {
    #[error("无法打开 X 显示：{0}")]
    Open(String),

    #[error("屏幕 {0} 不存在")]
    NoSuchScreen(i32),

    #[error("屏幕 {index} 尺寸超出 16 位范围：{width}x{height}")]
    ScreenSize { index: i32, width: i32, height: i32 },

    #[error("无法创建 {width}x{height} 的 pixmap")]
    PixmapCreate { width: u16, height: u16 },

    #[error("无法创建图形上下文")]
    GcCreate,

    #[error("无法创建原子 {0}")]
    Atom(String),
}

/// 单个 X 屏幕的根窗口信息。
#[derive(Debug, Clone, Copy)]
pub struct ScreenInfo {
    pub index: i32,
    pub root: xlib::Window,
    pub width: u16,
    pub height: u16,
    pub depth: u8,
    pub(crate) visual: *mut xlib::Visual,
}

/// X 连接上下文。
pub struct XDisplay {
    raw: *mut xlib::Display,
}

impl XDisplay {
    /// 连接 X 服务器；`name` 为空时使用 `$DISPLAY`。
    pub fn open(name: Option<&str>) -> Result<Self, DisplayError> {
        let name = name
            .map(|n| CString::new(n).map_err(|e| DisplayError::Open(e.to_string())))
            .transpose()?;

        let raw = unsafe { xlib::XOpenDisplay(name.as_ref().map_or(ptr::null(), |n| n.as_ptr())) };
        if raw.is_null() {
            let shown = name
                .as_ref()
                .map(|n| n.to_string_lossy().into_owned())
                .or_else(|| std::env::var("DISPLAY").ok())
                .unwrap_or_default();
            return Err(DisplayError::Open(shown));
        }

        Ok(Self { raw })
    }

    pub(crate) fn raw(&self) -> *mut xlib::Display {
        self.raw
    }

    pub fn screen_count(&self) -> i32 {
        unsafe { xlib::XScreenCount(self.raw) }
    }

    /// 读取屏幕根窗口的尺寸、深度与视觉类型。
    pub fn screen(&self, index: i32) -> Result<ScreenInfo, DisplayError> {
        if index < 0 || index >= self.screen_count() {
            return Err(DisplayError::NoSuchScreen(index));
        }

        unsafe {
            let width = xlib::XDisplayWidth(self.raw, index);
            let height = xlib::XDisplayHeight(self.raw, index);
            let (Ok(w), Ok(h)) = (u16::try_from(width), u16::try_from(height)) else {
                return Err(DisplayError::ScreenSize {
                    index,
                    width,
                    height,
                });
            };

            Ok(ScreenInfo {
                index,
                root: xlib::XRootWindow(self.raw, index),
                width: w,
                height: h,
                depth: xlib::XDefaultDepth(self.raw, index) as u8,
                visual: xlib::XDefaultVisual(self.raw, index),
            })
        }
    }

    /// 服务器允许的最大请求长度（4 字节单位），优先使用 BIG-REQUESTS 扩展值。
    pub fn max_request_units(&self) -> u32 {
        let units = unsafe {
            match xlib::XExtendedMaxRequestSize(self.raw) {
                0 => xlib::XMaxRequestSize(self.raw),
                extended => extended,
            }
        };
        u32::try_from(units).unwrap_or(u32::MAX)
    }

    /// 按名字获取（必要时创建）原子。
    pub(crate) fn intern_atom(&self, name: &str) -> Result<xlib::Atom, DisplayError> {
        let cname = CString::new(name).map_err(|_| DisplayError::Atom(name.to_string()))?;
        let atom = unsafe { xlib::XInternAtom(self.raw, cname.as_ptr(), xlib::False) };
        if atom == 0 {
            return Err(DisplayError::Atom(name.to_string()));
        }
        Ok(atom)
    }

    /// 收尾：保留已发布的 pixmap 并等待服务器处理完所有请求。
    pub fn finish(&self) {
        unsafe {
            xlib::XSetCloseDownMode(self.raw, xlib::RetainPermanent);
            xlib::XSync(self.raw, xlib::False);
        }
    }
}

impl Drop for XDisplay {
    fn drop(&mut self) {
        unsafe {
            xlib::XCloseDisplay(self.raw);
        }
    }
}
