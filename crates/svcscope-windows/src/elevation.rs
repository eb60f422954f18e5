//! 权限检测。
//!
//! 作者：服务巡检工具项目组
//! 创建时间：2026-10-18
//! 修改时间：2026-10-18

use anyhow::Result;
use windows::Win32::UI::Shell::IsUserAnAdmin;

/// 判断当前进程是否以管理员权限运行。
///
/// 返回值：
/// - `Ok(true)`：当前为管理员（可以打开全部受保护服务）
/// - `Ok(false)`：当前非管理员（部分服务会被跳过）
///
/// 异常处理：
/// - 该 Win32 API 不返回错误码；保留 `Result` 以统一上层调用风格
pub fn is_running_as_admin() -> Result<bool> {
    unsafe { Ok(IsUserAnAdmin().as_bool()) }
}
