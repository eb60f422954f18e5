//! 服务控制管理器连接与分页枚举。
//!
//! 作者：服务巡检工具项目组
//! 创建时间：2026-10-18
//! 修改时间：2026-10-18

use svcscope_core::buffer::NativeBuffer;
use svcscope_core::platform::{PageOutcome, ResumeCursor, ServiceEntry, ServiceManager, ServiceStatus};
use svcscope_core::{NativeError, ScanError};
use tracing::debug;
use windows::core::PCWSTR;
use windows::Win32::System::Services::{
    CloseServiceHandle, EnumServicesStatusExW, OpenSCManagerW, OpenServiceW, SC_ENUM_PROCESS_INFO, SC_HANDLE,
    SC_MANAGER_CONNECT, SC_MANAGER_ENUMERATE_SERVICE, SERVICE_QUERY_CONFIG, SERVICE_QUERY_STATUS, SERVICE_STATE_ALL,
    SERVICE_TYPE_ALL,
};

use crate::native::{
    native_error, to_wide, RawEnumServiceStatusProcess, RawServiceStatusProcess, ERROR_INVALID_DATA,
    ERROR_MORE_DATA,
};
use crate::registry::read_service_dll;
use crate::service::WinService;

/// 拥有所有权的 SC_HANDLE，离开作用域时关闭。
pub(crate) struct ScHandle(pub(crate) SC_HANDLE);

impl Drop for ScHandle {
    fn drop(&mut self) {
        unsafe {
            let _ = CloseServiceHandle(self.0);
        }
    }
}

// SAFETY: SCM 句柄可以跨线程使用，系统对同一句柄上的并发调用做了同步。
unsafe impl Send for ScHandle {}
unsafe impl Sync for ScHandle {}

/// 打开服务控制管理器的操作名称（写入错误信息）。
pub const OPEN_MANAGER_OPERATION: &str = "OpenSCManagerW";

/// 本机服务控制管理器连接（只读）。
pub struct WinServiceManager {
    handle: ScHandle,
}

impl WinServiceManager {
    /// 以“连接 + 枚举”权限打开本机服务控制管理器。
    ///
    /// 异常处理：
    /// - 打开失败返回 [`ScanError::Native`]（例如权限不足、RPC 服务不可用），保留原生错误码
    pub fn connect() -> Result<Self, ScanError> {
        let handle = unsafe { OpenSCManagerW(PCWSTR::null(), PCWSTR::null(), SC_MANAGER_CONNECT | SC_MANAGER_ENUMERATE_SERVICE) }
            .map_err(|e| open_manager_error(&e))?;
        Ok(Self { handle: ScHandle(handle) })
    }
}

/// 将 `OpenSCManagerW` 的失败转换为带原生错误码的致命错误。
pub fn open_manager_error(error: &windows::core::Error) -> ScanError {
    ScanError::native(OPEN_MANAGER_OPERATION, native_error(error))
}

impl ServiceManager for WinServiceManager {
    type Handle = WinService;

    fn enumerate_page(&self, cursor: &mut ResumeCursor, buffer: &mut NativeBuffer) -> PageOutcome {
        let mut bytes_needed = 0u32;
        let mut returned = 0u32;
        let slice = if buffer.is_empty() { None } else { Some(buffer.as_mut_bytes()) };
        let result = unsafe {
            EnumServicesStatusExW(
                self.handle.0,
                SC_ENUM_PROCESS_INFO,
                SERVICE_TYPE_ALL,
                SERVICE_STATE_ALL,
                slice,
                &mut bytes_needed,
                &mut returned,
                Some(&mut cursor.0 as *mut u32),
                PCWSTR::null(),
            )
        };

        let more_data = match result {
            Ok(()) => false,
            Err(e) => {
                let error = native_error(&e);
                if error.code != ERROR_MORE_DATA {
                    return PageOutcome::Failed(error);
                }
                true
            }
        };

        let entries = match decode_entries(buffer, returned as usize) {
            Ok(entries) => entries,
            Err(error) => return PageOutcome::Failed(error),
        };
        if more_data {
            PageOutcome::MoreData {
                entries,
                bytes_needed: bytes_needed as usize,
            }
        } else {
            PageOutcome::Complete(entries)
        }
    }

    fn open_service(&self, name: &str) -> Result<WinService, NativeError> {
        let wide = to_wide(name);
        let handle = unsafe { OpenServiceW(self.handle.0, PCWSTR(wide.as_ptr()), SERVICE_QUERY_CONFIG | SERVICE_QUERY_STATUS) }
            .map_err(|e| native_error(&e))?;
        Ok(WinService::new(name, ScHandle(handle)))
    }

    fn service_dll(&self, name: &str) -> Option<String> {
        read_service_dll(name)
    }
}

/// 从枚举缓冲区解出条目数组；任一指针越界都视为数据损坏（`ERROR_INVALID_DATA`）。
pub fn decode_entries(buffer: &NativeBuffer, count: usize) -> Result<Vec<ServiceEntry>, NativeError> {
    if count == 0 {
        return Ok(Vec::new());
    }
    let raw = unsafe { buffer.read_array_at::<RawEnumServiceStatusProcess>(buffer.as_ptr().cast(), count) }
        .ok_or_else(|| NativeError::new(ERROR_INVALID_DATA, "枚举结果超出缓冲区范围"))?;
    let entries = raw
        .iter()
        .map(|item| ServiceEntry {
            name: buffer.wide_str_at(item.lpServiceName).unwrap_or_default(),
            display_name: buffer.wide_str_at(item.lpDisplayName).unwrap_or_default(),
            status: status_from_raw(&item.ServiceStatusProcess),
        })
        .collect::<Vec<_>>();
    debug!(count = entries.len(), "本页解出服务条目");
    Ok(entries)
}

pub(crate) fn status_from_raw(raw: &RawServiceStatusProcess) -> ServiceStatus {
    ServiceStatus {
        service_type: raw.dwServiceType,
        current_state: raw.dwCurrentState,
        controls_accepted: raw.dwControlsAccepted,
        win32_exit_code: raw.dwWin32ExitCode,
        service_specific_exit_code: raw.dwServiceSpecificExitCode,
        checkpoint: raw.dwCheckPoint,
        wait_hint: raw.dwWaitHint,
        process_id: raw.dwProcessId,
        service_flags: raw.dwServiceFlags,
    }
}
