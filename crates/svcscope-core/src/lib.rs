//! 服务巡检核心库（与平台无关）。
//!
//! 功能：
//! - 定义服务清单记录（[`record::ServiceRecord`]）与一次巡检的快照（[`record::Inventory`]）
//! - 提供“先探测大小、再取数”的缓冲区协商协议与按边界检查的字节读取
//! - 提供多字符串（REG_MULTI_SZ 形态）解码、启动命令行规范化、版本资源解析与代码页回退
//! - 提供服务枚举驱动与单个服务详情解析（通过 [`platform`] 中的 trait 访问操作系统）
//!
//! 约定：
//! - 本 crate 不直接调用任何 Win32 API；Windows 实现位于 `svcscope-windows`
//! - 单个服务的失败只降级为默认值或跳过，只有“无法枚举”才作为致命错误返回
//!
//! 作者：服务巡检工具项目组
//! 创建时间：2026-10-18
//! 修改时间：2026-10-18

pub mod buffer;
pub mod cursor;
pub mod decode;
pub mod enumerate;
pub mod error;
pub mod multistring;
pub mod options;
pub mod path;
pub mod platform;
pub mod record;
pub mod resolver;
pub mod scanner;
pub mod version;

pub use error::{NativeError, ScanError};
pub use options::{CancelToken, ScanOptions};
pub use record::{Inventory, ServiceRecord, SkippedService, VersionInfo};
pub use scanner::Scanner;
