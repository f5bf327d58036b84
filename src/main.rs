//! # xbackdrop — 程序入口
//!
//! 本文件只负责参数解析、日志初始化与退出码。
//! 业务逻辑见 `lib.rs` 架构文档。

use std::process::ExitCode;

use xbackdrop::cli::{self, CliError};
use xbackdrop::config::WallpaperConfig;
use xbackdrop::orchestrator;

fn main() -> ExitCode {
    let invocation = match cli::parse_args(std::env::args_os()) {
        Ok(invocation) => invocation,
        // --help / --version 也走这里，由 clap 决定输出与退出码
        Err(CliError::Clap(err)) => err.exit(),
        Err(err) => {
            eprintln!("xbackdrop: {err}");
            return ExitCode::from(2);
        }
    };

    let mut logger =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"));
    if invocation.debug {
        logger.filter_level(log::LevelFilter::Debug);
    }
    logger.init();

    match orchestrator::run(&invocation, &WallpaperConfig::default()) {
        Ok(report) if report.is_clean() => {
            log::info!(
                "✅ 完成：{} 个屏幕，{} 个输出",
                report.screens_published,
                report.outputs_painted
            );
            ExitCode::SUCCESS
        }
        Ok(report) => {
            log::warn!(
                "部分完成：{} 个输出已绘制，{} 个被跳过",
                report.outputs_painted,
                report.outputs_skipped
            );
            ExitCode::FAILURE
        }
        Err(err) => {
            log::error!("❌ {err}");
            ExitCode::FAILURE
        }
    }
}
