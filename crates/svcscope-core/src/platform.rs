//! 操作系统能力抽象。
//!
//! 核心库只通过本模块中的 trait 访问系统：
//! - [`ServiceManager`]：服务控制管理器（分页枚举、打开服务、读取 ServiceDll）
//! - [`ServiceHandle`]：已打开的单个服务（基础配置 + 各类辅助配置）
//! - [`SystemEnvironment`]：系统目录、环境变量展开、进程名
//! - [`VersionResourceLoader`]：读取可执行文件的版本资源块
//!
//! 本模块中的原始结构体只承载数值代码与字符串，不做任何可读化解码；
//! 解码在 [`crate::resolver`] 中统一完成。
//!
//! 作者：服务巡检工具项目组
//! 创建时间：2026-10-18
//! 修改时间：2026-10-18

use crate::buffer::NativeBuffer;
use crate::error::{NativeError, ScanError};

/// 服务运行状态（对应 SERVICE_STATUS_PROCESS）。
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ServiceStatus {
    pub service_type: u32,
    pub current_state: u32,
    pub controls_accepted: u32,
    pub win32_exit_code: u32,
    pub service_specific_exit_code: u32,
    pub checkpoint: u32,
    pub wait_hint: u32,
    pub process_id: u32,
    pub service_flags: u32,
}

/// 枚举得到的单个条目（仅名称、显示名与运行状态）。
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ServiceEntry {
    pub name: String,
    pub display_name: String,
    pub status: ServiceStatus,
}

/// 服务基础配置（对应 QUERY_SERVICE_CONFIG）。
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ServiceConfig {
    pub service_type: u32,
    pub start_type: u32,
    pub error_control: u32,
    pub binary_path: String,
    pub load_order_group: String,
    pub tag_id: u32,
    pub dependencies: Vec<String>,
    pub start_name: String,
    pub display_name: String,
}

/// 单个失败恢复动作。
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FailureActionConfig {
    pub kind: u32,
    pub delay_ms: u32,
}

/// 失败恢复策略。
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FailureActionsConfig {
    pub reset_period_secs: u32,
    pub reboot_message: String,
    pub command: String,
    pub actions: Vec<FailureActionConfig>,
}

/// 单个启动/停止触发器。
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TriggerConfig {
    pub trigger_type: u32,
    pub action: u32,
    /// 触发器子类型 GUID 的文本形式（不存在时为空）。
    pub subtype: String,
}

/// 分页枚举的续传游标（由系统维护的不透明值）。
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ResumeCursor(pub u32);

/// 单页枚举结果。
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageOutcome {
    /// 本页已装下剩余全部条目。
    Complete(Vec<ServiceEntry>),
    /// 仍有数据未返回；`entries` 为本页装下的条目，`bytes_needed` 为剩余数据所需字节数。
    MoreData {
        entries: Vec<ServiceEntry>,
        bytes_needed: usize,
    },
    /// 其他错误（致命）。
    Failed(NativeError),
}

/// 服务控制管理器。
///
/// 线程安全：
/// - 实现必须允许多个线程同时调用 [`ServiceManager::open_service`]（并发打开服务）
pub trait ServiceManager: Sync {
    /// 已打开服务的句柄类型；离开作用域即关闭。
    type Handle: ServiceHandle;

    /// 以给定缓冲区取一页枚举结果，并推进续传游标。
    fn enumerate_page(&self, cursor: &mut ResumeCursor, buffer: &mut NativeBuffer) -> PageOutcome;

    /// 以只读配置权限打开服务。
    fn open_service(&self, name: &str) -> Result<Self::Handle, NativeError>;

    /// 读取服务的 `Parameters\ServiceDll` 原始值（不存在时为 `None`）。
    fn service_dll(&self, _name: &str) -> Option<String> {
        None
    }
}

/// 已打开的单个服务。
///
/// 说明：
/// - 每个查询各自完成一次缓冲区协商
/// - 辅助配置查询失败（例如该服务不支持对应信息类）由调用方降级为默认值
pub trait ServiceHandle {
    /// 基础配置。
    fn query_config(&self) -> Result<ServiceConfig, ScanError>;
    /// 当前运行状态。
    fn query_status(&self) -> Result<ServiceStatus, ScanError>;
    /// 描述文本。
    fn query_description(&self) -> Result<String, ScanError>;
    /// 是否延迟自动启动。
    fn query_delayed_auto_start(&self) -> Result<bool, ScanError>;
    /// 所需特权列表。
    fn query_required_privileges(&self) -> Result<Vec<String>, ScanError>;
    /// 服务 SID 类型（身份隔离模式）。
    fn query_sid_type(&self) -> Result<u32, ScanError>;
    /// 受保护服务级别。
    fn query_launch_protected(&self) -> Result<u32, ScanError>;
    /// 预关机超时（毫秒）。
    fn query_preshutdown_timeout(&self) -> Result<u32, ScanError>;
    /// 失败恢复策略。
    fn query_failure_actions(&self) -> Result<FailureActionsConfig, ScanError>;
    /// 触发器列表。
    fn query_triggers(&self) -> Result<Vec<TriggerConfig>, ScanError>;
}

/// 系统环境。
pub trait SystemEnvironment: Sync {
    /// 系统目录（例如 `C:\Windows\System32`）。
    fn system_directory(&self) -> &str;
    /// Windows 目录（例如 `C:\Windows`）。
    fn system_root(&self) -> &str;
    /// 展开字符串中的 `%VAR%` 环境变量。
    fn expand_environment(&self, input: &str) -> Result<String, ScanError>;
    /// 进程映像名（未知时为 `None`）。
    fn process_image_name(&self, _pid: u32) -> Option<String> {
        None
    }
}

/// 版本资源读取。
pub trait VersionResourceLoader: Sync {
    /// 读取文件的完整版本资源块；文件没有版本资源时返回空缓冲区。
    fn load_version_block(&self, path: &str) -> Result<NativeBuffer, ScanError>;
}
