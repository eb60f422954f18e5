//! 服务启动命令行规范化。
//!
//! 将注册表中保存的原始命令行（可能带引号、参数、`\??\` 前缀、`\SystemRoot\` 占位符或
//! `%VAR%` 环境变量）转换为可直接检查是否存在的文件系统路径。
//!
//! 处理顺序（不可调换）：
//! 1) 去掉首尾空白；带引号时取到配对的右引号为止
//! 2) 否则查找第一个 `.exe ` / `.sys ` / `.dll `（不区分大小写），截断其后的参数
//! 3) 去掉 `\??\` 设备命名空间前缀
//! 4) 展开 `\SystemRoot\` 前缀
//! 5) 以 `System32\` 开头且没有盘符时，补全系统目录
//! 6) 展开剩余的环境变量
//!
//! 作者：服务巡检工具项目组
//! 创建时间：2026-10-18
//! 修改时间：2026-10-18

use tracing::debug;

use crate::platform::SystemEnvironment;

const EXECUTABLE_EXTENSIONS: [&str; 3] = [".exe ", ".sys ", ".dll "];
const DEVICE_PREFIXES: [&str; 2] = ["\\??\\", "\\\\?\\"];
const SYSTEM_ROOT_PREFIXES: [&str; 2] = ["\\SystemRoot\\", "SystemRoot\\"];
const SYSTEM32_PREFIX: &str = "System32\\";

/// 规范化服务启动命令行。
///
/// 参数：
/// - `raw`：注册表中保存的原始命令行
/// - `env`：系统环境（系统目录、环境变量展开）
///
/// 返回值：
/// - 规范化后的路径；输入为空白时返回空字符串
///
/// 异常处理：
/// - 环境变量展开失败时保留未展开的路径（尽力而为），不返回错误
pub fn normalize_image_path<E: SystemEnvironment + ?Sized>(raw: &str, env: &E) -> String {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return String::new();
    }

    let mut path = strip_arguments(trimmed).to_string();

    if let Some(rest) = strip_prefix_ignore_case(&path, &DEVICE_PREFIXES) {
        path = rest.to_string();
    }

    if let Some(rest) = strip_prefix_ignore_case(&path, &SYSTEM_ROOT_PREFIXES) {
        path = join_windows_path(env.system_root(), rest);
    }

    if !has_drive_root(&path) {
        if let Some(rest) = strip_prefix_ignore_case(&path, &[SYSTEM32_PREFIX]) {
            path = join_windows_path(env.system_directory(), rest);
        }
    }

    if path.contains('%') {
        match env.expand_environment(&path) {
            Ok(expanded) => path = expanded,
            Err(e) => debug!(path = %path, error = %e, "环境变量展开失败，保留原值"),
        }
    }

    path.trim().to_string()
}

/// 去掉命令行中的参数部分。
fn strip_arguments(command_line: &str) -> &str {
    if let Some(quoted) = command_line.strip_prefix('"') {
        return match quoted.find('"') {
            Some(end) => &quoted[..end],
            None => quoted,
        };
    }

    let lower = command_line.to_ascii_lowercase();
    let cut = EXECUTABLE_EXTENSIONS
        .iter()
        .filter_map(|ext| lower.find(ext).map(|idx| idx + ext.len() - 1))
        .min();
    match cut {
        Some(end) => &command_line[..end],
        None => command_line,
    }
}

fn strip_prefix_ignore_case<'a>(s: &'a str, prefixes: &[&str]) -> Option<&'a str> {
    prefixes.iter().find_map(|prefix| {
        let head = s.get(..prefix.len())?;
        if head.eq_ignore_ascii_case(prefix) {
            Some(&s[prefix.len()..])
        } else {
            None
        }
    })
}

/// 是否以 `X:` 盘符或 `\\` UNC 前缀开头。
fn has_drive_root(path: &str) -> bool {
    let bytes = path.as_bytes();
    (bytes.len() >= 2 && bytes[0].is_ascii_alphabetic() && bytes[1] == b':') || path.starts_with("\\\\")
}

fn join_windows_path(dir: &str, rest: &str) -> String {
    format!("{}\\{}", dir.trim_end_matches('\\'), rest.trim_start_matches('\\'))
}
