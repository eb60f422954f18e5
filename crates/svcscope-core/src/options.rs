//! 巡检选项与取消令牌。
//!
//! 作者：服务巡检工具项目组
//! 创建时间：2026-10-18
//! 修改时间：2026-10-18

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use serde::{Deserialize, Serialize};

/// 巡检选项（可由 JSON 配置文件提供，缺省字段使用默认值）。
///
/// 字段说明：
/// - `workers`：解析服务详情的工作线程数；0 表示按 CPU 数量，1 表示顺序执行
/// - `resolve_version_info`：是否读取可执行文件的版本资源
/// - `resolve_service_dll`：是否读取服务的 `Parameters\ServiceDll`
/// - `resolve_process_names`：是否解析运行中服务的宿主进程名
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanOptions {
    pub workers: usize,
    pub resolve_version_info: bool,
    pub resolve_service_dll: bool,
    pub resolve_process_names: bool,
}

impl Default for ScanOptions {
    fn default() -> Self {
        Self {
            workers: 0,
            resolve_version_info: true,
            resolve_service_dll: true,
            resolve_process_names: true,
        }
    }
}

/// 协作式取消令牌。
///
/// 说明：
/// - 克隆出的令牌共享同一标志；任一处调用 [`CancelToken::cancel`] 后所有副本都可见
/// - 巡检在处理每个服务之前检查一次，不会打断正在进行的原生调用
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    /// 创建未取消的令牌。
    pub fn new() -> Self {
        Self::default()
    }

    /// 请求取消。
    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    /// 是否已请求取消。
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}
