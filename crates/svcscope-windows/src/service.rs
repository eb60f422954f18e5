//! 已打开服务的配置与状态查询。
//!
//! 说明：
//! - 每个查询都通过 [`negotiate`] 完成“探测大小 → 取数”两步
//! - 结构体内的字符串与数组指针都指向同一缓冲区，解码时按偏移做边界检查
//!
//! 作者：服务巡检工具项目组
//! 创建时间：2026-10-18
//! 修改时间：2026-10-18

use svcscope_core::buffer::{negotiate, NativeBuffer, QueryOutcome};
use svcscope_core::platform::{
    FailureActionConfig, FailureActionsConfig, ServiceConfig, ServiceHandle, ServiceStatus, TriggerConfig,
};
use svcscope_core::{NativeError, ScanError};
use windows::Win32::System::Services::{
    QueryServiceConfig2W, QueryServiceConfigW, QueryServiceStatusEx, QUERY_SERVICE_CONFIGW, SC_STATUS_PROCESS_INFO,
    SERVICE_CONFIG,
};

use crate::native::{
    native_error, RawFailureActions, RawGuid, RawQueryServiceConfig, RawScAction, RawServiceStatusProcess, RawTrigger,
    RawTriggerInfo, ERROR_INSUFFICIENT_BUFFER,
};
use crate::scm::{status_from_raw, ScHandle};

const SERVICE_CONFIG_DESCRIPTION: u32 = 1;
const SERVICE_CONFIG_FAILURE_ACTIONS: u32 = 2;
const SERVICE_CONFIG_DELAYED_AUTO_START_INFO: u32 = 3;
const SERVICE_CONFIG_SERVICE_SID_INFO: u32 = 5;
const SERVICE_CONFIG_REQUIRED_PRIVILEGES_INFO: u32 = 6;
const SERVICE_CONFIG_PRESHUTDOWN_INFO: u32 = 7;
const SERVICE_CONFIG_TRIGGER_INFO: u32 = 8;
const SERVICE_CONFIG_LAUNCH_PROTECTED: u32 = 12;

/// 已打开的服务（只读配置 + 状态权限），离开作用域即关闭句柄。
pub struct WinService {
    name: String,
    handle: ScHandle,
}

impl WinService {
    pub(crate) fn new(name: &str, handle: ScHandle) -> Self {
        Self {
            name: name.to_string(),
            handle,
        }
    }

    /// 查询一个 `QueryServiceConfig2W` 信息类，返回填充好的缓冲区。
    fn query_config2(&self, level: u32) -> Result<NativeBuffer, ScanError> {
        let operation = format!("QueryServiceConfig2W({}, {level})", self.name);
        negotiate(&operation, |buffer| {
            let mut needed = 0u32;
            let slice = if buffer.is_empty() { None } else { Some(buffer.as_mut_bytes()) };
            let result = unsafe { QueryServiceConfig2W(self.handle.0, SERVICE_CONFIG(level), slice, &mut needed) };
            outcome(result, needed)
        })
    }

    /// 读取信息类缓冲区开头的单个 u32（SID 类型、受保护级别、预关机超时、延迟启动标志）。
    fn query_u32(&self, level: u32) -> Result<u32, ScanError> {
        let buffer = self.query_config2(level)?;
        Ok(unsafe { buffer.read_at::<u32>(0) }.unwrap_or_default())
    }

    /// 读取信息类缓冲区开头的单个字符串指针（描述）。
    fn query_pointer_string(&self, level: u32) -> Result<String, ScanError> {
        let buffer = self.query_config2(level)?;
        let ptr = unsafe { buffer.read_at::<*const u16>(0) }.unwrap_or(std::ptr::null());
        Ok(buffer.wide_str_at(ptr).unwrap_or_default())
    }
}

fn outcome(result: windows::core::Result<()>, needed: u32) -> QueryOutcome {
    match result {
        Ok(()) => QueryOutcome::Complete,
        Err(e) => {
            let error = native_error(&e);
            if error.code == ERROR_INSUFFICIENT_BUFFER {
                QueryOutcome::Insufficient(needed as usize)
            } else {
                QueryOutcome::Failed(error)
            }
        }
    }
}

fn malformed(what: &str) -> ScanError {
    ScanError::Malformed(format!("{what} 超出缓冲区范围"))
}

impl ServiceHandle for WinService {
    fn query_config(&self) -> Result<ServiceConfig, ScanError> {
        let operation = format!("QueryServiceConfigW({})", self.name);
        let buffer = negotiate(&operation, |buffer| {
            let mut needed = 0u32;
            let len = buffer.len() as u32;
            let ptr = if buffer.is_empty() {
                None
            } else {
                Some(buffer.as_mut_ptr().cast::<QUERY_SERVICE_CONFIGW>())
            };
            let result = unsafe { QueryServiceConfigW(self.handle.0, ptr, len, &mut needed) };
            outcome(result, needed)
        })?;
        let raw = unsafe { buffer.read_at::<RawQueryServiceConfig>(0) }.ok_or_else(|| malformed("QUERY_SERVICE_CONFIGW"))?;
        Ok(ServiceConfig {
            service_type: raw.dwServiceType,
            start_type: raw.dwStartType,
            error_control: raw.dwErrorControl,
            binary_path: buffer.wide_str_at(raw.lpBinaryPathName).unwrap_or_default(),
            load_order_group: buffer.wide_str_at(raw.lpLoadOrderGroup).unwrap_or_default(),
            tag_id: raw.dwTagId,
            dependencies: buffer.multi_sz_at(raw.lpDependencies),
            start_name: buffer.wide_str_at(raw.lpServiceStartName).unwrap_or_default(),
            display_name: buffer.wide_str_at(raw.lpDisplayName).unwrap_or_default(),
        })
    }

    fn query_status(&self) -> Result<ServiceStatus, ScanError> {
        let operation = format!("QueryServiceStatusEx({})", self.name);
        let buffer = negotiate(&operation, |buffer| {
            let mut needed = 0u32;
            let slice = if buffer.is_empty() { None } else { Some(buffer.as_mut_bytes()) };
            let result = unsafe { QueryServiceStatusEx(self.handle.0, SC_STATUS_PROCESS_INFO, slice, &mut needed) };
            outcome(result, needed)
        })?;
        let raw = unsafe { buffer.read_at::<RawServiceStatusProcess>(0) }
            .ok_or_else(|| ScanError::native(operation, NativeError::new(ERROR_INSUFFICIENT_BUFFER, "状态缓冲区过小")))?;
        Ok(status_from_raw(&raw))
    }

    fn query_description(&self) -> Result<String, ScanError> {
        self.query_pointer_string(SERVICE_CONFIG_DESCRIPTION)
    }

    fn query_delayed_auto_start(&self) -> Result<bool, ScanError> {
        Ok(self.query_u32(SERVICE_CONFIG_DELAYED_AUTO_START_INFO)? != 0)
    }

    fn query_required_privileges(&self) -> Result<Vec<String>, ScanError> {
        let buffer = self.query_config2(SERVICE_CONFIG_REQUIRED_PRIVILEGES_INFO)?;
        let ptr = unsafe { buffer.read_at::<*const u16>(0) }.unwrap_or(std::ptr::null());
        Ok(buffer.multi_sz_at(ptr))
    }

    fn query_sid_type(&self) -> Result<u32, ScanError> {
        self.query_u32(SERVICE_CONFIG_SERVICE_SID_INFO)
    }

    fn query_launch_protected(&self) -> Result<u32, ScanError> {
        self.query_u32(SERVICE_CONFIG_LAUNCH_PROTECTED)
    }

    fn query_preshutdown_timeout(&self) -> Result<u32, ScanError> {
        self.query_u32(SERVICE_CONFIG_PRESHUTDOWN_INFO)
    }

    fn query_failure_actions(&self) -> Result<FailureActionsConfig, ScanError> {
        let buffer = self.query_config2(SERVICE_CONFIG_FAILURE_ACTIONS)?;
        let Some(raw) = (unsafe { buffer.read_at::<RawFailureActions>(0) }) else {
            return Ok(FailureActionsConfig::default());
        };
        let actions = unsafe { buffer.read_array_at::<RawScAction>(raw.lpsaActions, raw.cActions as usize) }
            .ok_or_else(|| malformed("SC_ACTION"))?;
        Ok(FailureActionsConfig {
            reset_period_secs: raw.dwResetPeriod,
            reboot_message: buffer.wide_str_at(raw.lpRebootMsg).unwrap_or_default(),
            command: buffer.wide_str_at(raw.lpCommand).unwrap_or_default(),
            actions: actions
                .into_iter()
                .map(|a| FailureActionConfig {
                    kind: a.Type,
                    delay_ms: a.Delay,
                })
                .collect(),
        })
    }

    fn query_triggers(&self) -> Result<Vec<TriggerConfig>, ScanError> {
        let buffer = self.query_config2(SERVICE_CONFIG_TRIGGER_INFO)?;
        let Some(info) = (unsafe { buffer.read_at::<RawTriggerInfo>(0) }) else {
            return Ok(Vec::new());
        };
        let triggers = unsafe { buffer.read_array_at::<RawTrigger>(info.pTriggers, info.cTriggers as usize) }
            .ok_or_else(|| malformed("SERVICE_TRIGGER"))?;
        Ok(triggers
            .into_iter()
            .map(|t| TriggerConfig {
                trigger_type: t.dwTriggerType,
                action: t.dwAction,
                subtype: buffer
                    .offset_of(t.pTriggerSubtype)
                    .and_then(|offset| unsafe { buffer.read_at::<RawGuid>(offset) })
                    .map(|guid| guid.to_hyphenated())
                    .unwrap_or_default(),
            })
            .collect())
    }
}
