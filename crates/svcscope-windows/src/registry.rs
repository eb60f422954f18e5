//! 服务注册表项读取（`Parameters\ServiceDll`）。
//!
//! 说明：
//! - 共享宿主进程（svchost）中的服务，真正的实现位于 `ServiceDll` 指向的 DLL，
//!   服务控制管理器的配置接口不返回该值，只能从注册表读取
//!
//! 作者：服务巡检工具项目组
//! 创建时间：2026-10-18
//! 修改时间：2026-10-18

use anyhow::{Context, Result};
use tracing::trace;
use winreg::enums::HKEY_LOCAL_MACHINE;
use winreg::RegKey;

const SERVICES_KEY: &str = "SYSTEM\\CurrentControlSet\\Services";

/// 读取服务的 `ServiceDll` 原始值（可能包含 `%SystemRoot%` 等环境变量）。
///
/// 参数：
/// - `service_name`：服务名
///
/// 返回值：
/// - `Ok(None)`：服务没有 `Parameters` 子键或没有 `ServiceDll` 值
///
/// 异常处理：
/// - 值存在但类型不是字符串时返回错误
pub fn service_dll_value(service_name: &str) -> Result<Option<String>> {
    let hklm = RegKey::predef(HKEY_LOCAL_MACHINE);
    let path = format!("{SERVICES_KEY}\\{service_name}\\Parameters");
    let Ok(key) = hklm.open_subkey(&path) else {
        return Ok(None);
    };
    match key.get_value::<String, _>("ServiceDll") {
        Ok(value) => Ok(Some(value)),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e).with_context(|| format!("读取 ServiceDll 失败: HKLM\\{path}")),
    }
}

/// [`service_dll_value`] 的宽松版本：任何错误都视为“没有 ServiceDll”。
pub(crate) fn read_service_dll(service_name: &str) -> Option<String> {
    service_dll_value(service_name).unwrap_or_else(|e| {
        trace!(service = service_name, error = %e, "ServiceDll 不可读");
        None
    })
}
