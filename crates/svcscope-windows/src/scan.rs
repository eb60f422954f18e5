//! 面向命令行的巡检入口（连接本机服务控制管理器并组装各平台实现）。
//!
//! 非 Windows 平台上这些入口直接返回错误，便于在开发机上构建与测试其余功能。
//!
//! 作者：服务巡检工具项目组
//! 创建时间：2026-10-18
//! 修改时间：2026-10-18

use anyhow::Result;
use svcscope_core::{CancelToken, Inventory, ScanOptions, ServiceRecord};

/// 运行环境自检结果。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnosis {
    /// 当前进程是否为管理员。
    pub is_admin: bool,
    /// 能否以枚举权限连接服务控制管理器。
    pub scm_reachable: bool,
    /// 连接失败时的错误描述。
    pub scm_error: Option<String>,
    /// 系统目录（读取失败时为 `None`）。
    pub system_directory: Option<String>,
}

/// 巡检本机全部服务。
///
/// 参数：
/// - `options`：巡检选项
/// - `cancel`：取消令牌
///
/// 返回值：
/// - 本次巡检的快照
///
/// 异常处理：
/// - 无法连接服务控制管理器、枚举失败或被取消：返回错误
/// - 非 Windows 平台：返回错误
pub fn scan_local_computer(options: &ScanOptions, cancel: &CancelToken) -> Result<Inventory> {
    #[cfg(windows)]
    {
        imp::scan_local_computer(options, cancel)
    }
    #[cfg(not(windows))]
    {
        let _ = (options, cancel);
        anyhow::bail!("服务巡检仅支持 Windows")
    }
}

/// 读取单个服务的完整记录。
///
/// 异常处理：
/// - 服务不存在或无法打开：返回错误
/// - 非 Windows 平台：返回错误
pub fn show_service(name: &str, options: &ScanOptions) -> Result<ServiceRecord> {
    #[cfg(windows)]
    {
        imp::show_service(name, options)
    }
    #[cfg(not(windows))]
    {
        let _ = (name, options);
        anyhow::bail!("服务巡检仅支持 Windows")
    }
}

/// 检查运行环境（管理员权限、服务控制管理器可达性）。
///
/// 异常处理：
/// - 非 Windows 平台：返回错误
pub fn diagnose() -> Result<Diagnosis> {
    #[cfg(windows)]
    {
        imp::diagnose()
    }
    #[cfg(not(windows))]
    {
        anyhow::bail!("服务巡检仅支持 Windows")
    }
}

#[cfg(windows)]
mod imp {
    use anyhow::{anyhow, bail, Context, Result};
    use svcscope_core::platform::{ServiceEntry, ServiceHandle, ServiceManager, SystemEnvironment};
    use svcscope_core::resolver::Resolution;
    use svcscope_core::{CancelToken, Inventory, ScanOptions, Scanner, ServiceRecord};
    use tracing::{info, warn};

    use super::Diagnosis;
    use crate::elevation::is_running_as_admin;
    use crate::environment::WinEnvironment;
    use crate::scm::WinServiceManager;
    use crate::version::FileVersionLoader;

    pub fn scan_local_computer(options: &ScanOptions, cancel: &CancelToken) -> Result<Inventory> {
        let manager = WinServiceManager::connect()?;
        let environment = WinEnvironment::new(options.resolve_process_names)?;
        let loader = FileVersionLoader;
        let inventory = Scanner::new(&manager, &environment, &loader, options.clone())
            .collect(cancel)
            .context("巡检本机服务失败")?;
        info!(pass_id = %inventory.pass_id, records = inventory.records.len(), "本机巡检完成");
        Ok(inventory)
    }

    pub fn show_service(name: &str, options: &ScanOptions) -> Result<ServiceRecord> {
        let manager = WinServiceManager::connect()?;
        let status = {
            let handle = manager
                .open_service(name)
                .map_err(|e| anyhow!("打开服务失败: {name}: {e}"))?;
            handle.query_status().with_context(|| format!("读取服务状态失败: {name}"))?
        };
        let entry = ServiceEntry {
            name: name.to_string(),
            display_name: String::new(),
            status,
        };
        let environment = WinEnvironment::new(options.resolve_process_names)?;
        let loader = FileVersionLoader;
        match Scanner::new(&manager, &environment, &loader, options.clone()).resolve(&entry) {
            Resolution::Record(record) => Ok(*record),
            Resolution::Skipped(skip) => bail!("无法读取服务 {}: {}", skip.name, skip.reason),
        }
    }

    pub fn diagnose() -> Result<Diagnosis> {
        let is_admin = is_running_as_admin()?;
        let (scm_reachable, scm_error) = match WinServiceManager::connect() {
            Ok(_) => (true, None),
            Err(e) => {
                warn!(error = %e, "无法连接服务控制管理器");
                (false, Some(format!("{e:#}")))
            }
        };
        let system_directory = WinEnvironment::new(false)
            .map(|env| env.system_directory().to_string())
            .ok();
        Ok(Diagnosis {
            is_admin,
            scm_reachable,
            scm_error,
            system_directory,
        })
    }
}
