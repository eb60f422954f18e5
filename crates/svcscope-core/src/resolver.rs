//! 单个服务的详情解析。
//!
//! 流程：
//! 1) 以只读配置权限打开服务；失败则跳过该服务（不影响整次巡检）
//! 2) 读取基础配置（类型、启动类型、错误策略、运行账户、命令行、依赖等）
//! 3) 逐项读取辅助配置，任一项失败都降级为空/零值
//! 4) 规范化命令行并读取可执行文件版本资源
//! 5) 把所有数值代码解码为可读名称，组装 [`ServiceRecord`]
//!
//! 作者：服务巡检工具项目组
//! 创建时间：2026-10-18
//! 修改时间：2026-10-18

use tracing::debug;

use crate::decode;
use crate::error::ScanError;
use crate::options::ScanOptions;
use crate::path::normalize_image_path;
use crate::platform::{
    FailureActionsConfig, ServiceConfig, ServiceEntry, ServiceHandle, ServiceManager, SystemEnvironment,
    TriggerConfig, VersionResourceLoader,
};
use crate::record::{
    FailureActionRecord, FailureActionsRecord, ServiceRecord, SkippedService, TriggerRecord, VersionInfo,
    NO_DESCRIPTION,
};
use crate::version::extract_version_info;

/// 单个服务的解析结果：要么得到一条记录，要么被跳过。
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    Record(Box<ServiceRecord>),
    Skipped(SkippedService),
}

impl Resolution {
    /// 取出记录（被跳过时为 `None`）。
    pub fn into_record(self) -> Option<ServiceRecord> {
        match self {
            Self::Record(record) => Some(*record),
            Self::Skipped(_) => None,
        }
    }
}

/// 从已打开服务读取到的全部原始配置。
#[derive(Debug, Default)]
struct RawDetails {
    config: ServiceConfig,
    description: String,
    delayed_auto_start: bool,
    required_privileges: Vec<String>,
    sid_type: u32,
    launch_protected: u32,
    preshutdown_timeout_ms: u32,
    failure_actions: FailureActionsConfig,
    triggers: Vec<TriggerConfig>,
}

/// 解析单个服务。
///
/// 参数：
/// - `manager`：服务控制管理器（仅用于打开服务与读取 ServiceDll）
/// - `environment`：系统环境（路径规范化、进程名）
/// - `loader`：版本资源读取
/// - `options`：巡检选项
/// - `entry`：枚举得到的条目
///
/// 返回值：
/// - [`Resolution::Record`]：解析成功
/// - [`Resolution::Skipped`]：服务无法打开或基础配置不可读
///
/// 异常处理：
/// - 不返回错误、不 panic；所有失败都吸收为默认值或跳过
pub fn resolve_service<M, E, L>(
    manager: &M,
    environment: &E,
    loader: &L,
    options: &ScanOptions,
    entry: &ServiceEntry,
) -> Resolution
where
    M: ServiceManager + ?Sized,
    E: SystemEnvironment + ?Sized,
    L: VersionResourceLoader + ?Sized,
{
    let raw = match read_details(manager, entry) {
        Ok(raw) => raw,
        Err(reason) => {
            debug!(service = %entry.name, reason = %reason, "跳过服务");
            return Resolution::Skipped(SkippedService {
                name: entry.name.clone(),
                reason,
            });
        }
    };

    let normalized_path = normalize_image_path(&raw.config.binary_path, environment);
    let version = if options.resolve_version_info && !normalized_path.is_empty() {
        read_version_info(loader, &entry.name, &normalized_path)
    } else {
        VersionInfo::default()
    };

    let service_dll = if options.resolve_service_dll {
        manager
            .service_dll(&entry.name)
            .map(|raw_dll| normalize_image_path(&raw_dll, environment))
            .filter(|dll| !dll.is_empty())
    } else {
        None
    };

    let status = &entry.status;
    let process_name = if options.resolve_process_names && status.process_id != 0 {
        environment.process_image_name(status.process_id)
    } else {
        None
    };

    let display_name = [entry.display_name.as_str(), raw.config.display_name.as_str()]
        .into_iter()
        .find(|s| !s.is_empty())
        .unwrap_or(entry.name.as_str())
        .to_string();
    let description = if raw.description.is_empty() {
        NO_DESCRIPTION.to_string()
    } else {
        raw.description
    };

    let config = raw.config;
    let record = ServiceRecord {
        name: entry.name.clone(),
        display_name,
        description,

        state: decode::service_state(status.current_state),
        state_code: status.current_state,
        process_id: status.process_id,
        process_name,
        win32_exit_code: status.win32_exit_code,
        service_specific_exit_code: status.service_specific_exit_code,
        controls_accepted: decode::controls_accepted(status.controls_accepted),
        controls_accepted_code: status.controls_accepted,
        service_flags: decode::service_flags(status.service_flags),
        service_flags_code: status.service_flags,

        service_type: decode::service_type(config.service_type),
        service_type_code: config.service_type,
        start_type: decode::start_type(config.start_type, raw.delayed_auto_start),
        start_type_code: config.start_type,
        delayed_auto_start: raw.delayed_auto_start,
        error_control: decode::error_control(config.error_control),
        error_control_code: config.error_control,
        start_name: config.start_name,
        load_order_group: config.load_order_group,
        tag_id: config.tag_id,
        dependencies: config.dependencies,
        sid_type: decode::sid_type(raw.sid_type),
        sid_type_code: raw.sid_type,
        launch_protected: decode::launch_protected(raw.launch_protected),
        launch_protected_code: raw.launch_protected,
        required_privileges: raw.required_privileges,
        preshutdown_timeout_ms: raw.preshutdown_timeout_ms,
        failure_actions: failure_actions_record(raw.failure_actions),
        triggers: raw.triggers.into_iter().map(trigger_record).collect(),

        image_path: config.binary_path,
        normalized_path,
        service_dll,

        version,
    };
    Resolution::Record(Box::new(record))
}

/// 打开服务并读取全部原始配置；句柄在函数返回前关闭。
///
/// 返回值：
/// - `Err(reason)`：服务无法打开或基础配置不可读（调用方据此跳过）
fn read_details<M: ServiceManager + ?Sized>(manager: &M, entry: &ServiceEntry) -> Result<RawDetails, String> {
    let handle = manager
        .open_service(&entry.name)
        .map_err(|e| format!("打开服务失败: {e}"))?;
    let config = handle
        .query_config()
        .map_err(|e| format!("读取基础配置失败: {e}"))?;

    let name = entry.name.as_str();
    Ok(RawDetails {
        config,
        description: soft(name, "描述", handle.query_description()),
        delayed_auto_start: soft(name, "延迟自动启动", handle.query_delayed_auto_start()),
        required_privileges: soft(name, "所需特权", handle.query_required_privileges()),
        sid_type: soft(name, "服务 SID 类型", handle.query_sid_type()),
        launch_protected: soft(name, "受保护级别", handle.query_launch_protected()),
        preshutdown_timeout_ms: soft(name, "预关机超时", handle.query_preshutdown_timeout()),
        failure_actions: soft(name, "失败恢复策略", handle.query_failure_actions()),
        triggers: soft(name, "触发器", handle.query_triggers()),
    })
}

/// 辅助配置不可用时降级为默认值。
fn soft<T: Default>(service: &str, what: &str, result: Result<T, ScanError>) -> T {
    result.unwrap_or_else(|e| {
        debug!(service, what, error = %e, "辅助配置不可用，使用默认值");
        T::default()
    })
}

fn read_version_info<L: VersionResourceLoader + ?Sized>(loader: &L, service: &str, path: &str) -> VersionInfo {
    match loader.load_version_block(path) {
        Ok(block) => extract_version_info(block.as_bytes()),
        Err(e) => {
            debug!(service, path, error = %e, "读取版本资源失败");
            VersionInfo::default()
        }
    }
}

fn failure_actions_record(config: FailureActionsConfig) -> FailureActionsRecord {
    FailureActionsRecord {
        reset_period_secs: config.reset_period_secs,
        reboot_message: config.reboot_message,
        command: config.command,
        actions: config
            .actions
            .into_iter()
            .map(|a| FailureActionRecord {
                action: decode::failure_action(a.kind),
                action_code: a.kind,
                delay_ms: a.delay_ms,
            })
            .collect(),
    }
}

fn trigger_record(config: TriggerConfig) -> TriggerRecord {
    TriggerRecord {
        action: decode::trigger_action(config.action),
        action_code: config.action,
        trigger_type: decode::trigger_type(config.trigger_type),
        trigger_type_code: config.trigger_type,
        subtype: config.subtype,
    }
}
