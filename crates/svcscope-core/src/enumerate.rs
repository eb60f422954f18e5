//! 服务枚举驱动（分页 + 缓冲区协商）。
//!
//! 作者：服务巡检工具项目组
//! 创建时间：2026-10-18
//! 修改时间：2026-10-18

use std::collections::HashSet;

use tracing::{debug, warn};

use crate::buffer::NativeBuffer;
use crate::error::ScanError;
use crate::platform::{PageOutcome, ResumeCursor, ServiceEntry, ServiceManager};

/// 枚举操作名称（写入错误信息）。
pub const ENUMERATE_OPERATION: &str = "枚举服务";

/// 列出服务控制管理器中的全部服务（所有类型、所有状态）。
///
/// 参数：
/// - `manager`：已连接的服务控制管理器
///
/// 返回值：
/// - 枚举顺序的服务条目；名称为空的条目被丢弃，同名（不区分大小写）条目只保留第一条
///
/// 异常处理：
/// - 任一页返回“需要更大缓冲区”以外的错误：整次枚举失败，不返回部分结果
/// - 某页一个条目都没装下且报告的大小没有增长：返回 [`ScanError::BufferDidNotGrow`]
pub fn enumerate_services<M: ServiceManager + ?Sized>(manager: &M) -> Result<Vec<ServiceEntry>, ScanError> {
    let mut cursor = ResumeCursor::default();
    let mut buffer = NativeBuffer::empty();
    let mut entries = Vec::new();
    let mut seen = HashSet::new();
    let mut page = 0usize;

    loop {
        page += 1;
        match manager.enumerate_page(&mut cursor, &mut buffer) {
            PageOutcome::Complete(batch) => {
                debug!(page, count = batch.len(), "枚举完成");
                accept(batch, &mut entries, &mut seen);
                return Ok(entries);
            }
            PageOutcome::MoreData { entries: batch, bytes_needed } => {
                let fetched = batch.len();
                debug!(page, count = fetched, bytes_needed, "仍有更多服务待枚举");
                accept(batch, &mut entries, &mut seen);
                if fetched == 0 && bytes_needed <= buffer.len() {
                    return Err(ScanError::BufferDidNotGrow {
                        operation: ENUMERATE_OPERATION.to_string(),
                        allocated: buffer.len(),
                        reported: bytes_needed,
                    });
                }
                buffer = NativeBuffer::with_len(bytes_needed.max(buffer.len()));
            }
            PageOutcome::Failed(source) => return Err(ScanError::native(ENUMERATE_OPERATION, source)),
        }
    }
}

fn accept(batch: Vec<ServiceEntry>, entries: &mut Vec<ServiceEntry>, seen: &mut HashSet<String>) {
    for entry in batch {
        if entry.name.is_empty() {
            warn!("忽略名称为空的服务条目");
            continue;
        }
        if !seen.insert(entry.name.to_lowercase()) {
            debug!(name = %entry.name, "忽略重复的服务条目");
            continue;
        }
        entries.push(entry);
    }
}
