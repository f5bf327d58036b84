//! # 屏幕编排（orchestrator）
//!
//! ## 设计思路
//!
//! 编排层只负责"顺序"：
//! 1. 预加载所有图片（每个路径一次），全部失败才中止
//! 2. 逐个屏幕：确定布局 → 创建 pixmap → 逐选项、逐输出地合成并上传 → 发布
//! 3. 所有屏幕处理完后设置保留模式并同步
//!
//! ## 错误策略
//!
//! - 校验类错误：记录日志、计入跳过数，继续处理下一个输出
//! - 致命错误：立即返回；当前屏幕的 pixmap 随 `Drop` 释放，不会被发布
//! - 已发布的屏幕保持不变（仍会设置保留模式，避免断开连接时被回收）

use crate::cli::{Invocation, WallpaperOption};
use crate::compositor::composite;
use crate::config::WallpaperConfig;
use crate::display::{RootPixmap, XDisplay, discover_outputs, randr_available};
use crate::error::AppError;
use crate::outputs::{OutputRect, OutputSet};
use crate::placement::PlacementMode;
use crate::source::{ImageCache, SourceImage};
use crate::transfer::{self, PixmapSink, TransferOrigin};

/// 单个屏幕的绘制结果。
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScreenReport {
    pub outputs_painted: usize,
    pub outputs_skipped: usize,
}

/// 整次运行的结果。
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunReport {
    pub outputs_painted: usize,
    pub outputs_skipped: usize,
    pub screens_published: usize,
}

impl RunReport {
    fn absorb(&mut self, screen: ScreenReport) {
        self.outputs_painted += screen.outputs_painted;
        self.outputs_skipped += screen.outputs_skipped;
    }

    /// 没有任何跳过，且至少绘制了一个输出。
    pub fn is_clean(&self) -> bool {
        self.outputs_skipped == 0 && self.outputs_painted > 0
    }
}

/// 确定一个屏幕的绘制布局。
///
/// 原生平铺时 pixmap 与图片等大，只有一个合成输出，由服务器负责重复铺满；
/// 否则 pixmap 与屏幕等大，附带已发现的具名输出。
pub fn plan_screen_layout(
    screen_width: u16,
    screen_height: u16,
    native_tile: Option<&SourceImage>,
    outputs: Vec<OutputRect>,
) -> OutputSet {
    match native_tile {
        Some(image) => {
            // 尺寸在加载时已校验为 16 位以内
            let width = u16::try_from(image.width()).unwrap_or(u16::MAX);
            let height = u16::try_from(image.height()).unwrap_or(u16::MAX);
            OutputSet::screen_only(OutputRect::whole_screen(width, height))
        }
        None => OutputSet {
            screen: OutputRect::whole_screen(screen_width, screen_height),
            outputs,
        },
    }
}

/// 合成并上传单个输出。
pub fn paint_output<S: PixmapSink + ?Sized>(
    sink: &mut S,
    source: &SourceImage,
    output: &OutputRect,
    mode: PlacementMode,
    config: &WallpaperConfig,
) -> Result<(), AppError> {
    let buffer = composite(source, output, mode, config)?;
    let origin = TransferOrigin {
        x: output.x,
        y: output.y,
    };
    let plan = transfer::upload(&buffer, sink, origin, config)?;
    log::debug!(
        "painted {} with {} ({} requests, {} rows each)",
        output.label(),
        mode,
        plan.chunks().len(),
        plan.rows_per_request()
    );
    Ok(())
}

/// 把一个屏幕上的所有选项依次绘制到 `sink`。
///
/// 后面的选项覆盖前面的选项，与命令行顺序一致。
pub fn paint_screen<S: PixmapSink + ?Sized>(
    sink: &mut S,
    layout: &OutputSet,
    options: &[&WallpaperOption],
    cache: &mut ImageCache,
    config: &WallpaperConfig,
) -> Result<ScreenReport, AppError> {
    let mut report = ScreenReport::default();

    for option in options {
        let source = match cache.get_or_load(&option.path) {
            Ok(source) => source,
            Err(err) => {
                log::warn!("跳过 --{} {}：{}", option.mode, option.path.display(), err);
                report.outputs_skipped += 1;
                continue;
            }
        };

        let targets = layout.select(option.output.as_deref());
        if targets.is_empty() {
            log::warn!(
                "未找到输出 {}，跳过 {}",
                option.output.as_deref().unwrap_or_default(),
                option.path.display()
            );
            report.outputs_skipped += 1;
            continue;
        }

        for output in targets {
            match paint_output(sink, &source, output, option.mode, config) {
                Ok(()) => report.outputs_painted += 1,
                Err(err) if !err.is_fatal() => {
                    log::error!("跳过输出 {}：{}", output.label(), err);
                    report.outputs_skipped += 1;
                }
                Err(err) => return Err(err),
            }
        }
    }

    Ok(report)
}

/// 预加载调用中的所有图片；一个都加载不了时返回错误。
pub fn preload_images(invocation: &Invocation, cache: &mut ImageCache) -> Result<(), AppError> {
    for option in &invocation.options {
        if let Err(err) = cache.get_or_load(&option.path) {
            if !matches!(err, crate::source::ImageError::PreviouslyFailed { .. }) {
                log::error!("❌ {}", err);
            }
        }
    }

    if cache.loaded_count() == 0 {
        return Err(AppError::NoUsableImage);
    }
    Ok(())
}

/// 执行一次完整的壁纸设置。
pub fn run(invocation: &Invocation, config: &WallpaperConfig) -> Result<RunReport, AppError> {
    config.validate()?;

    let mut cache = ImageCache::new();
    preload_images(invocation, &mut cache)?;

    let display = XDisplay::open(None)?;
    let mut report = RunReport::default();
    let result = paint_all_screens(&display, invocation, config, &mut cache, &mut report);

    if report.screens_published > 0 {
        display.finish();
    }
    result.map(|()| report)
}

fn paint_all_screens(
    display: &XDisplay,
    invocation: &Invocation,
    config: &WallpaperConfig,
    cache: &mut ImageCache,
    report: &mut RunReport,
) -> Result<(), AppError> {
    let screen_count = display.screen_count();
    for option in &invocation.options {
        if let Some(screen) = option.screen.filter(|&s| s as i64 >= screen_count as i64) {
            log::warn!("屏幕 {} 不存在（共 {} 个），{} 不会被使用", screen, screen_count, option.path.display());
        }
    }

    let use_randr = !invocation.no_randr && randr_available(display);

    let native_tile = match invocation.native_tile() {
        Some(option) => cache.get_or_load(&option.path).ok(),
        None => None,
    };

    for index in 0..screen_count {
        let options = invocation.options_for_screen(index as u32);
        if options.is_empty() {
            log::debug!("no options for screen {}", index);
            continue;
        }

        let screen = display.screen(index)?;
        let outputs = if use_randr && native_tile.is_none() {
            discover_outputs(display, &screen)
        } else {
            Vec::new()
        };
        let layout = plan_screen_layout(screen.width, screen.height, native_tile.as_deref(), outputs);

        let mut pixmap = RootPixmap::create(
            display,
            &screen,
            layout.screen.width,
            layout.screen.height,
            config.fill_color,
        )?;
        log::debug!(
            "screen {}: pixmap {}x{}, {} outputs",
            index,
            pixmap.width(),
            pixmap.height(),
            layout.outputs.len()
        );

        let screen_report = paint_screen(&mut pixmap, &layout, &options, cache, config)?;
        report.absorb(screen_report);

        pixmap.publish()?;
        report.screens_published += 1;
    }

    Ok(())
}
