//! Windows 平台实现（服务控制管理器、系统环境、版本资源、注册表、权限检测）。
//!
//! 目标：
//! - 为 `svcscope-core` 中的平台 trait 提供基于 Win32 API 的实现
//! - 将全部 `unsafe` 调用集中在本 crate，核心逻辑保持纯 Rust、可在任意平台测试
//! - 统一错误处理风格（对外以 `anyhow::Result` 形式返回）
//!
//! 权限要求：
//! - 枚举与读取服务配置只需要普通用户权限；少数受保护服务需要管理员才能打开
//!
//! 作者：服务巡检工具项目组
//! 创建时间：2026-10-18
//! 修改时间：2026-10-18

#[cfg(windows)]
pub mod elevation;
#[cfg(windows)]
pub mod environment;
#[cfg(windows)]
pub mod native;
#[cfg(windows)]
pub mod registry;
#[cfg(windows)]
pub mod scm;
#[cfg(windows)]
pub mod service;
#[cfg(windows)]
pub mod version;

pub mod scan;

pub use scan::{diagnose, scan_local_computer, show_service, Diagnosis};
