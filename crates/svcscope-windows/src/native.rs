//! Win32 原始结构体布局与错误码转换。
//!
//! 说明：
//! - 结构体按 SDK 头文件中的 C 布局声明，字段全部为整数或裸指针（任意位模式合法），
//!   以便通过 [`NativeBuffer::read_at`](svcscope_core::buffer::NativeBuffer::read_at) 安全地复制出来
//! - 指针字段只用于换算在缓冲区中的偏移，从不直接解引用
//!
//! 作者：服务巡检工具项目组
//! 创建时间：2026-10-18
//! 修改时间：2026-10-18

#![allow(non_snake_case)]

use svcscope_core::NativeError;

pub const ERROR_INVALID_DATA: u32 = 13;
pub const ERROR_INSUFFICIENT_BUFFER: u32 = 122;
pub const ERROR_MORE_DATA: u32 = 234;

/// `SERVICE_STATUS_PROCESS`
#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct RawServiceStatusProcess {
    pub dwServiceType: u32,
    pub dwCurrentState: u32,
    pub dwControlsAccepted: u32,
    pub dwWin32ExitCode: u32,
    pub dwServiceSpecificExitCode: u32,
    pub dwCheckPoint: u32,
    pub dwWaitHint: u32,
    pub dwProcessId: u32,
    pub dwServiceFlags: u32,
}

/// `ENUM_SERVICE_STATUS_PROCESSW`
#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct RawEnumServiceStatusProcess {
    pub lpServiceName: *const u16,
    pub lpDisplayName: *const u16,
    pub ServiceStatusProcess: RawServiceStatusProcess,
}

/// `QUERY_SERVICE_CONFIGW`
#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct RawQueryServiceConfig {
    pub dwServiceType: u32,
    pub dwStartType: u32,
    pub dwErrorControl: u32,
    pub lpBinaryPathName: *const u16,
    pub lpLoadOrderGroup: *const u16,
    pub dwTagId: u32,
    pub lpDependencies: *const u16,
    pub lpServiceStartName: *const u16,
    pub lpDisplayName: *const u16,
}

/// `SERVICE_FAILURE_ACTIONSW`
#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct RawFailureActions {
    pub dwResetPeriod: u32,
    pub lpRebootMsg: *const u16,
    pub lpCommand: *const u16,
    pub cActions: u32,
    pub lpsaActions: *const RawScAction,
}

/// `SC_ACTION`
#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct RawScAction {
    pub Type: u32,
    pub Delay: u32,
}

/// `SERVICE_TRIGGER_INFO`
#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct RawTriggerInfo {
    pub cTriggers: u32,
    pub pTriggers: *const RawTrigger,
    pub pReserved: *const u8,
}

/// `SERVICE_TRIGGER`
#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct RawTrigger {
    pub dwTriggerType: u32,
    pub dwAction: u32,
    pub pTriggerSubtype: *const RawGuid,
    pub cDataItems: u32,
    pub pDataItems: *const u8,
}

/// `GUID`
#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct RawGuid {
    pub data1: u32,
    pub data2: u16,
    pub data3: u16,
    pub data4: [u8; 8],
}

impl RawGuid {
    /// 以注册表常见的小写连字符形式输出。
    pub fn to_hyphenated(&self) -> String {
        let d = &self.data4;
        format!(
            "{:08x}-{:04x}-{:04x}-{:02x}{:02x}-{:02x}{:02x}{:02x}{:02x}{:02x}{:02x}",
            self.data1, self.data2, self.data3, d[0], d[1], d[2], d[3], d[4], d[5], d[6], d[7]
        )
    }
}

/// 将 `windows` crate 的错误转换为 Win32 错误码 + 消息。
///
/// 说明：
/// - Win32 API 失败时 `windows` crate 以 `HRESULT_FROM_WIN32` 包装 `GetLastError`，此处还原原始错误码
pub fn native_error(error: &windows::core::Error) -> NativeError {
    let hr = error.code().0 as u32;
    let code = if hr & 0xFFFF_0000 == 0x8007_0000 { hr & 0xFFFF } else { hr };
    NativeError::new(code, error.message().to_string())
}

/// 读取调用线程的最后错误。
pub fn last_error() -> NativeError {
    native_error(&windows::core::Error::from_win32())
}

/// 转换为以 0 结尾的 UTF-16 字符串。
pub fn to_wide(s: &str) -> Vec<u16> {
    s.encode_utf16().chain(std::iter::once(0)).collect()
}
