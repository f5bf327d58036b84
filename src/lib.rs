//! # xbackdrop — 库入口
//!
//! ## 架构总览
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │  cli ──── Invocation（有序的 --screen/--output/模式选项）  │
//! └───────┬──────────────────────────────────────────────────┘
//!         ↓
//! ┌───────┴──────────────────────────────────────────────────┐
//! │  orchestrator                                            │
//! │    source ──── 解码·校验·按路径缓存（Rc 共享）            │
//! │    display ─── XDisplay (RAII) / RandR / RootPixmap      │
//! │    outputs ─── OutputSet + 选择器                         │
//! │       ↓ 每个（选项, 输出）                                │
//! │    compositor ── placement（变换 / 平铺计划）             │
//! │       ↓ CompositeBuffer（按值移交）                       │
//! │    transfer ──── 两级请求上限分块 → PixmapSink            │
//! │       ↓                                                  │
//! │    RootPixmap::publish（背景原子 + 根窗口背景）           │
//! └──────────────────────────────────────────────────────────┘
//! ```
//!
//! ## 模块职责
//!
//! | 模块 | 职责 |
//! |------|------|
//! | [`error`] | 统一错误类型 `AppError` 与致命 / 可跳过分类 |
//! | [`config`] | 填充色、请求上限等可调参数 |
//! | [`placement`] | 五种摆放模式的仿射变换与平铺计划（纯计算） |
//! | [`source`] | 图片加载、尺寸校验、ARGB32 源图与缓存 |
//! | [`outputs`] | 输出矩形与选择规则 |
//! | [`compositor`] | 按模式合成与输出等大的离屏缓冲 |
//! | [`transfer`] | 按服务器请求上限分块上传 |
//! | [`display`] | Xlib 连接、RandR 发现、根窗口 pixmap |
//! | [`orchestrator`] | 屏幕 / 选项 / 输出的遍历与错误策略 |
//! | [`cli`] | 命令行解析 |

pub mod error;
pub mod cli;
pub mod compositor;
pub mod config;
pub mod display;
pub mod orchestrator;
pub mod outputs;
pub mod placement;
pub mod source;
pub mod transfer;
