//! 根窗口 pixmap
//!
//! # 生命周期
//!
//! 1. `create`：按屏幕深度创建 pixmap 与 GC，整体填充背景色
//! 2. 作为 `PixmapSink` 接收分块上传
//! 3. `publish`：更新背景原子、设为根窗口背景并重绘
//!
//! `Drop` 总是释放 GC；pixmap 只有在未发布时才释放，
//! 发布后的 pixmap 由 `RetainPermanent` 保留给服务器。

use std::os::raw::{c_int, c_uchar, c_uint, c_ulong};
use std::ptr;

use x11::xlib;

use super::{DisplayError, ScreenInfo, XDisplay};
use crate::transfer::{PixmapSink, TransferError};

/// 保存背景 pixmap ID 的根窗口属性。
const BACKGROUND_ATOMS: [&str; 2] = ["_XROOTPMAP_ID", "ESETROOT_PMAP_ID"];

/// 根据两个背景原子里的旧 pixmap 计算需要回收的客户端，同一个只回收一次。
pub fn pixmaps_to_kill(existing: &[Option<xlib::Pixmap>]) -> Vec<xlib::Pixmap> {
    let mut killed = Vec::new();
    for pixmap in existing.iter().flatten() {
        if *pixmap != 0 && !killed.contains(pixmap) {
            killed.push(*pixmap);
        }
    }
    killed
}

/// 某个屏幕上正在绘制的背景 pixmap。
pub struct RootPixmap<'a> {
    display: &'a XDisplay,
    screen: ScreenInfo,
    pixmap: xlib::Pixmap,
    gc: xlib::GC,
    width: u16,
    height: u16,
    published: bool,
}

impl<'a> RootPixmap<'a> {
    /// 创建 `width x height` 的 pixmap 并填充为 `fill_color`。
    pub fn create(
        display: &'a XDisplay,
        screen: &ScreenInfo,
        width: u16,
        height: u16,
        fill_color: u32,
    ) -> Result<Self, DisplayError> {
        let dpy = display.raw();
        let pixmap = unsafe {
            xlib::XCreatePixmap(
                dpy,
                screen.root,
                width as c_uint,
                height as c_uint,
                screen.depth as c_uint,
            )
        };
        if pixmap == 0 {
            return Err(DisplayError::PixmapCreate { width, height });
        }

        let gc = unsafe { xlib::XCreateGC(dpy, pixmap, 0, ptr::null_mut()) };
        if gc.is_null() {
            unsafe {
                xlib::XFreePixmap(dpy, pixmap);
            }
            return Err(DisplayError::GcCreate);
        }

        unsafe {
            xlib::XSetForeground(dpy, gc, fill_color as c_ulong);
            xlib::XFillRectangle(dpy, pixmap, gc, 0, 0, width as c_uint, height as c_uint);
        }

        log::debug!(
            "created pixmap {}x{} (depth {}) on screen {}",
            width,
            height,
            screen.depth,
            screen.index
        );

        Ok(Self {
            display,
            screen: *screen,
            pixmap,
            gc,
            width,
            height,
            published: false,
        })
    }

    pub fn width(&self) -> u16 {
        self.width
    }

    pub fn height(&self) -> u16 {
        self.height
    }

    /// 把 pixmap 发布为根窗口背景。
    ///
    /// 先回收旧背景 pixmap 的持有者，再写入两个背景原子，
    /// 最后设置窗口背景并清屏触发重绘。
    pub fn publish(mut self) -> Result<(), DisplayError> {
        let dpy = self.display.raw();
        let root = self.screen.root;

        let mut atoms = Vec::with_capacity(BACKGROUND_ATOMS.len());
        for name in BACKGROUND_ATOMS {
            atoms.push(self.display.intern_atom(name)?);
        }

        let existing: Vec<Option<xlib::Pixmap>> =
            atoms.iter().map(|&atom| self.read_pixmap_property(atom)).collect();
        for old in pixmaps_to_kill(&existing) {
            log::debug!("killing client holding previous background pixmap {:#x}", old);
            unsafe {
                xlib::XKillClient(dpy, old);
            }
        }

        unsafe {
            for &atom in &atoms {
                xlib::XChangeProperty(
                    dpy,
                    root,
                    atom,
                    xlib::XA_PIXMAP,
                    32,
                    xlib::PropModeReplace,
                    &self.pixmap as *const xlib::Pixmap as *const c_uchar,
                    1,
                );
            }
            xlib::XSetWindowBackgroundPixmap(dpy, root, self.pixmap);
            xlib::XClearWindow(dpy, root);
        }

        self.published = true;
        log::info!("🖼 屏幕 {} 背景已更新", self.screen.index);
        Ok(())
    }

    /// 读取根窗口上某个原子中保存的 pixmap ID。
    fn read_pixmap_property(&self, atom: xlib::Atom) -> Option<xlib::Pixmap> {
        let mut actual_type: xlib::Atom = 0;
        let mut actual_format: c_int = 0;
        let mut nitems: c_ulong = 0;
        let mut bytes_after: c_ulong = 0;
        let mut prop: *mut c_uchar = ptr::null_mut();

        unsafe {
            let status = xlib::XGetWindowProperty(
                self.display.raw(),
                self.screen.root,
                atom,
                0,
                1,
                xlib::False,
                xlib::AnyPropertyType as xlib::Atom,
                &mut actual_type,
                &mut actual_format,
                &mut nitems,
                &mut bytes_after,
                &mut prop,
            );
            if status != xlib::Success as c_int || prop.is_null() {
                return None;
            }

            // format 32 的属性在客户端侧是 long 数组
            let pixmap = (actual_type == xlib::XA_PIXMAP && actual_format == 32 && nitems == 1)
                .then(|| *(prop as *const c_ulong));
            xlib::XFree(prop.cast());
            pixmap
        }
    }
}

impl PixmapSink for RootPixmap<'_> {
    fn max_request_units(&self) -> u32 {
        self.display.max_request_units()
    }

    fn depth(&self) -> u8 {
        self.screen.depth
    }

    fn put_rows(
        &mut self,
        x: i16,
        y: i16,
        width: u16,
        rows: u16,
        data: &[u8],
    ) -> Result<(), TransferError> {
        let expected = width as usize * rows as usize * 4;
        if data.len() != expected {
            return Err(TransferError::BufferMismatch {
                expected,
                actual: data.len(),
            });
        }

        let dpy = self.display.raw();
        unsafe {
            let image = xlib::XCreateImage(
                dpy,
                self.screen.visual,
                self.screen.depth as c_uint,
                xlib::ZPixmap,
                0,
                data.as_ptr() as *mut _,
                width as c_uint,
                rows as c_uint,
                32,
                width as c_int * 4,
            );
            if image.is_null() {
                return Err(TransferError::Put(format!(
                    "XCreateImage 失败（{}x{}）",
                    width, rows
                )));
            }
            (*image).byte_order = xlib::LSBFirst;

            xlib::XPutImage(
                dpy,
                self.pixmap,
                self.gc,
                image,
                0,
                0,
                x as c_int,
                y as c_int,
                width as c_uint,
                rows as c_uint,
            );

            // 数据归调用方所有，只释放 XImage 结构本身
            (*image).data = ptr::null_mut();
            xlib::XFree(image.cast());
        }

        Ok(())
    }
}

impl Drop for RootPixmap<'_> {
    fn drop(&mut self) {
        let dpy = self.display.raw();
        unsafe {
            xlib::XFreeGC(dpy, self.gc);
            if !self.published {
                xlib::XFreePixmap(dpy, self.pixmap);
            }
        }
    }
}
