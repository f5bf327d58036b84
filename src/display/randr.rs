//! RandR 输出发现
//!
//! 使用 RandR 1.5 的监视器列表（`XRRGetMonitors`），每个监视器对应一个具名输出，
//! 坐标为根窗口坐标。扩展缺失或版本过低时返回空列表，调用方退化为整个屏幕。

use std::ffi::CStr;
use std::os::raw::c_int;

use x11::{xlib, xrandr};

use super::{ScreenInfo, XDisplay};
use crate::outputs::OutputRect;

/// 服务器是否提供可用的 RandR（>= 1.5）。
pub fn randr_available(display: &XDisplay) -> bool {
    let (mut event_base, mut error_base) = (0, 0);
    let (mut major, mut minor) = (0, 0);
    unsafe {
        if xrandr::XRRQueryExtension(display.raw(), &mut event_base, &mut error_base) == 0 {
            log::warn!("X 服务器不支持 RandR，按整个屏幕绘制");
            return false;
        }
        if xrandr::XRRQueryVersion(display.raw(), &mut major, &mut minor) == 0 {
            log::warn!("无法查询 RandR 版本，按整个屏幕绘制");
            return false;
        }
    }

    if (major, minor) < (1, 5) {
        log::warn!("RandR {}.{} 不支持监视器列表（需要 1.5），按整个屏幕绘制", major, minor);
        return false;
    }
    log::debug!("RandR {}.{} available", major, minor);
    true
}

/// 把监视器几何转换为输出矩形；超出 16 位协议坐标的监视器被忽略。
pub fn monitor_rect(
    name: String,
    x: c_int,
    y: c_int,
    width: c_int,
    height: c_int,
) -> Option<OutputRect> {
    match (
        i16::try_from(x),
        i16::try_from(y),
        u16::try_from(width),
        u16::try_from(height),
    ) {
        (Ok(x), Ok(y), Ok(w), Ok(h)) => Some(OutputRect::named(name, x, y, w, h)),
        _ => {
            log::warn!("忽略输出 {}：几何 {}x{}+{}+{} 超出协议范围", name, width, height, x, y);
            None
        }
    }
}

/// 列出屏幕上的活动监视器，保持服务器返回的顺序。
pub fn discover_outputs(display: &XDisplay, screen: &ScreenInfo) -> Vec<OutputRect> {
    let mut count: c_int = 0;
    let monitors = unsafe { xrandr::XRRGetMonitors(display.raw(), screen.root, xlib::True, &mut count) };
    if monitors.is_null() {
        log::warn!("屏幕 {} 未返回监视器列表", screen.index);
        return Vec::new();
    }

    let infos = unsafe { std::slice::from_raw_parts(monitors, count.max(0) as usize) };
    let mut outputs = Vec::with_capacity(infos.len());
    for info in infos {
        let name = atom_name(display, info.name);
        log::debug!(
            "output {}: {}x{}+{}+{}",
            name,
            info.width,
            info.height,
            info.x,
            info.y
        );
        if let Some(rect) = monitor_rect(name, info.x, info.y, info.width, info.height) {
            outputs.push(rect);
        }
    }

    unsafe {
        xrandr::XRRFreeMonitors(monitors);
    }
    outputs
}

fn atom_name(display: &XDisplay, atom: xlib::Atom) -> String {
    unsafe {
        let raw = xlib::XGetAtomName(display.raw(), atom);
        if raw.is_null() {
            return format!("atom-{}", atom);
        }
        let name = CStr::from_ptr(raw).to_string_lossy().into_owned();
        xlib::XFree(raw.cast());
        name
    }
}
