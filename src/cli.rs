//! 命令行解析
//!
//! # 设计思路
//!
//! `--screen` 与 `--output` 是"位置相关"的：它们作用于其后出现的所有模式选项，
//! 直到再次被覆盖。clap 默认按参数 id 聚合取值，这里借助 `indices_of`
//! 取回每个值在命令行中的位置，再按位置重放，得到有序的选项列表。

use std::ffi::OsString;
use std::path::PathBuf;

use clap::{Arg, ArgAction, ArgMatches, Command, value_parser};

use crate::placement::PlacementMode;

/// 命令行错误。
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    /// clap 自身的解析错误（也包括 `--help` / `--version`）。
    #[error(transparent)]
    Clap(#[from] clap::Error),

    #[error("至少需要一个 --center / --maximize / --stretch / --tile / --zoom 选项")]
    NoOptions,
}

/// 一条摆放请求。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WallpaperOption {
    pub path: PathBuf,
    pub mode: PlacementMode,
    /// 输出选择器：`None` 为整个屏幕，`"all"` 为每个输出，其余为输出名。
    pub output: Option<String>,
    /// 屏幕选择器：`None` 为所有屏幕。
    pub screen: Option<u32>,
}

/// 一次完整调用。
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Invocation {
    pub options: Vec<WallpaperOption>,
    pub no_randr: bool,
    pub debug: bool,
}

impl Invocation {
    /// 适用于第 `screen` 个屏幕的选项，保持命令行顺序。
    pub fn options_for_screen(&self, screen: u32) -> Vec<&WallpaperOption> {
        self.options
            .iter()
            .filter(|option| option.screen.is_none_or(|s| s == screen))
            .collect()
    }

    /// 唯一一个未指定输出的平铺选项：交给服务器原生平铺。
    pub fn native_tile(&self) -> Option<&WallpaperOption> {
        match self.options.as_slice() {
            [only] if only.mode == PlacementMode::Tile && only.output.is_none() => Some(only),
            _ => None,
        }
    }
}

/// 构建命令定义。
pub fn build_command() -> Command {
    let mut command = clap::command!()
        .about("Paint an image onto the X11 root window background")
        .arg(
            Arg::new("screen")
                .long("screen")
                .value_name("n")
                .value_parser(value_parser!(u32))
                .action(ArgAction::Append)
                .help("Apply following options to screen <n> only"),
        )
        .arg(
            Arg::new("output")
                .long("output")
                .value_name("name")
                .action(ArgAction::Append)
                .help("Apply following options to the named RandR output, or \"all\""),
        )
        .arg(
            Arg::new("no-randr")
                .long("no-randr")
                .action(ArgAction::SetTrue)
                .help("Ignore RandR outputs and treat each screen as one area"),
        )
        .arg(
            Arg::new("debug")
                .long("debug")
                .action(ArgAction::SetTrue)
                .help("Print debug information"),
        );

    for mode in PlacementMode::ALL {
        command = command.arg(
            Arg::new(mode.as_str())
                .long(mode.as_str())
                .value_name("file")
                .value_parser(value_parser!(PathBuf))
                .action(ArgAction::Append)
                .help(mode_help(mode)),
        );
    }

    command
}

fn mode_help(mode: PlacementMode) -> &'static str {
    match mode {
        PlacementMode::Center => "Center the image without scaling",
        PlacementMode::Maximize => "Scale the image to fit, keeping aspect ratio",
        PlacementMode::Stretch => "Scale the image to fill, ignoring aspect ratio",
        PlacementMode::Tile => "Repeat the image across the area",
        PlacementMode::Zoom => "Scale the image to cover, cropping the overflow",
    }
}

/// 命令行中的一个位置事件。
enum Event {
    Screen(u32),
    Output(String),
    Image(PlacementMode, PathBuf),
}

fn collect_events<T: Clone + Send + Sync + 'static>(
    matches: &ArgMatches,
    id: &str,
    events: &mut Vec<(usize, Event)>,
    make: impl Fn(T) -> Event,
) {
    let (Some(indices), Some(values)) = (matches.indices_of(id), matches.get_many::<T>(id)) else {
        return;
    };
    for (index, value) in indices.zip(values) {
        events.push((index, make(value.clone())));
    }
}

/// 从已解析的参数重建有序调用。
pub fn invocation_from_matches(matches: &ArgMatches) -> Result<Invocation, CliError> {
    let mut events = Vec::new();
    collect_events::<u32>(matches, "screen", &mut events, Event::Screen);
    collect_events::<String>(matches, "output", &mut events, Event::Output);
    for mode in PlacementMode::ALL {
        collect_events::<PathBuf>(matches, mode.as_str(), &mut events, |path| {
            Event::Image(mode, path)
        });
    }
    events.sort_by_key(|(index, _)| *index);

    let mut screen = None;
    let mut output = None;
    let mut options = Vec::new();
    for (_, event) in events {
        match event {
            Event::Screen(n) => screen = Some(n),
            Event::Output(name) => output = Some(name),
            Event::Image(mode, path) => options.push(WallpaperOption {
                path,
                mode,
                output: output.clone(),
                screen,
            }),
        }
    }

    if options.is_empty() {
        return Err(CliError::NoOptions);
    }

    Ok(Invocation {
        options,
        no_randr: matches.get_flag("no-randr"),
        debug: matches.get_flag("debug"),
    })
}

/// 解析命令行参数（第一个元素为程序名）。
pub fn parse_args<I, T>(args: I) -> Result<Invocation, CliError>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    let matches = build_command().try_get_matches_from(args)?;
    invocation_from_matches(&matches)
}
