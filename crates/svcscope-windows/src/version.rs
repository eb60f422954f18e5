//! 可执行文件版本资源读取。
//!
//! 作者：服务巡检工具项目组
//! 创建时间：2026-10-18
//! 修改时间：2026-10-18

use svcscope_core::buffer::{negotiate, NativeBuffer, QueryOutcome};
use svcscope_core::platform::VersionResourceLoader;
use svcscope_core::ScanError;
use windows::core::PCWSTR;
use windows::Win32::Storage::FileSystem::{GetFileVersionInfoSizeW, GetFileVersionInfoW};

use crate::native::{last_error, native_error, to_wide};

/// 资源类型或资源名不存在（文件没有版本资源）。
const ERROR_RESOURCE_TYPE_NOT_FOUND: u32 = 1813;
const ERROR_RESOURCE_DATA_NOT_FOUND: u32 = 1812;

/// 通过 `GetFileVersionInfoW` 读取完整版本资源块。
#[derive(Debug, Default, Clone, Copy)]
pub struct FileVersionLoader;

impl VersionResourceLoader for FileVersionLoader {
    fn load_version_block(&self, path: &str) -> Result<NativeBuffer, ScanError> {
        let wide = to_wide(path);
        let operation = format!("GetFileVersionInfoW({path})");
        negotiate(&operation, |buffer| {
            if buffer.is_empty() {
                let size = unsafe { GetFileVersionInfoSizeW(PCWSTR(wide.as_ptr()), None) } as usize;
                if size == 0 {
                    let error = last_error();
                    return match error.code {
                        0 | ERROR_RESOURCE_TYPE_NOT_FOUND | ERROR_RESOURCE_DATA_NOT_FOUND => QueryOutcome::Insufficient(0),
                        _ => QueryOutcome::Failed(error),
                    };
                }
                return QueryOutcome::Insufficient(size);
            }
            let len = buffer.len() as u32;
            match unsafe { GetFileVersionInfoW(PCWSTR(wide.as_ptr()), 0, len, buffer.as_mut_ptr().cast()) } {
                Ok(()) => QueryOutcome::Complete,
                Err(e) => QueryOutcome::Failed(native_error(&e)),
            }
        })
    }
}
