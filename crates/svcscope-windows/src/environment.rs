//! 系统环境：系统目录、环境变量展开、进程名快照。
//!
//! 作者：服务巡检工具项目组
//! 创建时间：2026-10-18
//! 修改时间：2026-10-18

use std::collections::HashMap;

use anyhow::{Context, Result};
use once_cell::sync::OnceCell;
use svcscope_core::buffer::{negotiate, NativeBuffer, QueryOutcome};
use svcscope_core::platform::SystemEnvironment;
use svcscope_core::ScanError;
use sysinfo::{ProcessRefreshKind, RefreshKind, System};
use tracing::debug;
use windows::core::PCWSTR;
use windows::Win32::System::Environment::ExpandEnvironmentStringsW;
use windows::Win32::System::SystemInformation::{GetSystemDirectoryW, GetWindowsDirectoryW};

use crate::native::{last_error, to_wide};

/// 进程生命周期内不变的系统目录。
#[derive(Debug, Clone)]
struct SystemDirectories {
    system: String,
    windows: String,
}

static SYSTEM_DIRECTORIES: OnceCell<SystemDirectories> = OnceCell::new();

fn system_directories() -> Result<&'static SystemDirectories> {
    SYSTEM_DIRECTORIES.get_or_try_init(|| {
        let system = read_directory("GetSystemDirectoryW", |buf| unsafe { GetSystemDirectoryW(buf) })
            .context("读取系统目录失败")?;
        let windows = read_directory("GetWindowsDirectoryW", |buf| unsafe { GetWindowsDirectoryW(buf) })
            .context("读取 Windows 目录失败")?;
        debug!(system = %system, windows = %windows, "已缓存系统目录");
        Ok(SystemDirectories { system, windows })
    })
}

/// 以“返回所需字符数”约定的 API 读取目录路径。
fn read_directory<F>(operation: &str, mut call: F) -> Result<String, ScanError>
where
    F: FnMut(Option<&mut [u16]>) -> u32,
{
    let buffer = negotiate(operation, |buffer| {
        let capacity = buffer.len() / 2;
        let slice = if buffer.is_empty() { None } else { Some(buffer.as_mut_wide()) };
        wide_outcome(call(slice), capacity)
    })?;
    Ok(wide_string(&buffer))
}

/// 成功时返回值为不含结尾 0 的字符数；缓冲区不足时为含结尾 0 的所需字符数。
fn wide_outcome(chars: u32, capacity: usize) -> QueryOutcome {
    let chars = chars as usize;
    if chars == 0 {
        QueryOutcome::Failed(last_error())
    } else if chars >= capacity {
        QueryOutcome::Insufficient((chars + 1) * 2)
    } else {
        QueryOutcome::Complete
    }
}

fn wide_string(buffer: &NativeBuffer) -> String {
    let wide = buffer.as_wide();
    let end = wide.iter().position(|&c| c == 0).unwrap_or(wide.len());
    String::from_utf16_lossy(&wide[..end])
}

/// 本机系统环境。
#[derive(Debug)]
pub struct WinEnvironment {
    directories: &'static SystemDirectories,
    processes: HashMap<u32, String>,
}

impl WinEnvironment {
    /// 创建系统环境。
    ///
    /// 参数：
    /// - `snapshot_processes`：是否拍摄一次进程快照（用于解析运行中服务的宿主进程名）
    ///
    /// 异常处理：
    /// - 无法读取系统目录时返回错误
    pub fn new(snapshot_processes: bool) -> Result<Self> {
        let directories = system_directories()?;
        let processes = if snapshot_processes { process_snapshot() } else { HashMap::new() };
        Ok(Self { directories, processes })
    }
}

fn process_snapshot() -> HashMap<u32, String> {
    let mut system = System::new_with_specifics(RefreshKind::new().with_processes(ProcessRefreshKind::new()));
    system.refresh_processes();
    let snapshot: HashMap<u32, String> = system
        .processes()
        .iter()
        .map(|(pid, process)| (pid.as_u32(), process.name().to_string()))
        .collect();
    debug!(count = snapshot.len(), "已拍摄进程快照");
    snapshot
}

impl SystemEnvironment for WinEnvironment {
    fn system_directory(&self) -> &str {
        &self.directories.system
    }

    fn system_root(&self) -> &str {
        &self.directories.windows
    }

    fn expand_environment(&self, input: &str) -> Result<String, ScanError> {
        let source = to_wide(input);
        let buffer = negotiate("ExpandEnvironmentStringsW", |buffer| {
            let capacity = buffer.len() / 2;
            let slice = if buffer.is_empty() { None } else { Some(buffer.as_mut_wide()) };
            let chars = unsafe { ExpandEnvironmentStringsW(PCWSTR(source.as_ptr()), slice) } as usize;
            if chars == 0 {
                QueryOutcome::Failed(last_error())
            } else if chars > capacity {
                QueryOutcome::Insufficient(chars * 2)
            } else {
                QueryOutcome::Complete
            }
        })?;
        Ok(wide_string(&buffer))
    }

    fn process_image_name(&self, pid: u32) -> Option<String> {
        self.processes.get(&pid).cloned()
    }
}
