//! 缓冲区协商协议（先探测大小，再按系统报告的大小取数）。
//!
//! 协议：
//! 1) 以空缓冲区调用一次查询
//! 2) 若系统报告“缓冲区不足”且所需大小大于 0，则按该大小分配并再次调用
//! 3) 若再次调用仍报告不足（两次调用之间数据变多），按新的大小重新分配并重试，不设次数上限
//! 4) 其他任何错误视为硬错误
//!
//! 内存说明：
//! - [`NativeBuffer`] 由调用方独占持有，离开作用域即释放；重试时旧缓冲区在新缓冲区分配后立即释放
//! - 底层存储按 8 字节对齐，可直接交给需要结构体对齐的原生 API 填充
//!
//! 作者：服务巡检工具项目组
//! 创建时间：2026-10-18
//! 修改时间：2026-10-18

use std::mem::size_of;

use tracing::trace;

use crate::cursor::ByteCursor;
use crate::error::{NativeError, ScanError};
use crate::multistring::decode_multi_sz;

/// 单次原生查询的结果。
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryOutcome {
    /// 查询成功，缓冲区已填充。
    Complete,
    /// 缓冲区不足，附带系统报告的所需字节数。
    Insufficient(usize),
    /// 其他错误。
    Failed(NativeError),
}

/// 由调用方独占持有、按 8 字节对齐的原生缓冲区。
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NativeBuffer {
    storage: Vec<u64>,
    len: usize,
}

impl NativeBuffer {
    /// 空缓冲区（不分配内存）。
    pub fn empty() -> Self {
        Self::default()
    }

    /// 分配 `len` 字节、内容清零的缓冲区。
    pub fn with_len(len: usize) -> Self {
        Self {
            storage: vec![0; len.div_ceil(size_of::<u64>())],
            len,
        }
    }

    /// 复制一段字节到新的缓冲区。
    pub fn from_bytes(bytes: &[u8]) -> Self {
        let mut buffer = Self::with_len(bytes.len());
        buffer.as_mut_bytes().copy_from_slice(bytes);
        buffer
    }

    /// 缓冲区字节数。
    pub fn len(&self) -> usize {
        self.len
    }

    /// 是否为空缓冲区。
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// 缓冲区起始地址。
    pub fn as_ptr(&self) -> *const u8 {
        self.storage.as_ptr().cast::<u8>()
    }

    /// 缓冲区起始地址（可写）。
    pub fn as_mut_ptr(&mut self) -> *mut u8 {
        self.storage.as_mut_ptr().cast::<u8>()
    }

    /// 以字节切片访问。
    pub fn as_bytes(&self) -> &[u8] {
        // SAFETY: storage 至少包含 len 个字节，u8 没有对齐要求。
        unsafe { std::slice::from_raw_parts(self.as_ptr(), self.len) }
    }

    /// 以可写字节切片访问。
    pub fn as_mut_bytes(&mut self) -> &mut [u8] {
        let len = self.len;
        // SAFETY: 同 as_bytes，且 &mut self 保证独占。
        unsafe { std::slice::from_raw_parts_mut(self.as_mut_ptr(), len) }
    }

    /// 以 UTF-16 码元切片访问（末尾不足 2 字节的部分被忽略）。
    pub fn as_wide(&self) -> &[u16] {
        // SAFETY: storage 按 8 字节对齐，满足 u16 对齐；长度按整码元向下取整。
        unsafe { std::slice::from_raw_parts(self.as_ptr().cast::<u16>(), self.len / 2) }
    }

    /// 以可写 UTF-16 码元切片访问。
    pub fn as_mut_wide(&mut self) -> &mut [u16] {
        let len = self.len / 2;
        // SAFETY: 同 as_wide，且 &mut self 保证独占。
        unsafe { std::slice::from_raw_parts_mut(self.as_mut_ptr().cast::<u16>(), len) }
    }

    /// 缓冲区起始处的字节游标。
    pub fn cursor(&self) -> ByteCursor<'_> {
        ByteCursor::new(self.as_bytes())
    }

    /// 计算指针相对缓冲区起始的偏移。
    ///
    /// 返回值：
    /// - `None`：空指针或指针不在缓冲区范围内
    pub fn offset_of<T>(&self, ptr: *const T) -> Option<usize> {
        if ptr.is_null() {
            return None;
        }
        let base = self.as_ptr() as usize;
        let addr = ptr as usize;
        if addr < base || addr >= base + self.len {
            return None;
        }
        Some(addr - base)
    }

    /// 读取原生结构体内指针所指的 UTF-16 字符串。
    ///
    /// 返回值：
    /// - 空指针或指针越界时返回 `None`
    pub fn wide_str_at(&self, ptr: *const u16) -> Option<String> {
        let offset = self.offset_of(ptr)?;
        Some(ByteCursor::at(self.as_bytes(), offset).read_wide_sz())
    }

    /// 读取原生结构体内指针所指的多字符串。
    ///
    /// 返回值：
    /// - 空指针或指针越界时返回空列表
    pub fn multi_sz_at(&self, ptr: *const u16) -> Vec<String> {
        match self.offset_of(ptr) {
            Some(offset) => decode_multi_sz(&self.as_bytes()[offset..]),
            None => Vec::new(),
        }
    }

    /// 按偏移读取一个结构体副本（越界返回 `None`）。
    ///
    /// # Safety
    /// `T` 必须是纯数据类型（任意位模式都合法），例如原生 API 的 C 结构体。
    pub unsafe fn read_at<T: Copy>(&self, offset: usize) -> Option<T> {
        let end = offset.checked_add(size_of::<T>())?;
        if end > self.len {
            return None;
        }
        Some(std::ptr::read_unaligned(self.as_ptr().add(offset).cast::<T>()))
    }

    /// 读取原生结构体内指针所指的结构体数组（任一元素越界返回 `None`）。
    ///
    /// # Safety
    /// 同 [`NativeBuffer::read_at`]。
    pub unsafe fn read_array_at<T: Copy>(&self, ptr: *const T, count: usize) -> Option<Vec<T>> {
        if count == 0 {
            return Some(Vec::new());
        }
        let offset = self.offset_of(ptr)?;
        (0..count)
            .map(|i| self.read_at::<T>(offset + i * size_of::<T>()))
            .collect()
    }
}

/// 执行缓冲区协商并返回填充好的缓冲区。
///
/// 参数：
/// - `operation`：操作名称（写入错误信息与日志）
/// - `query`：单次原生查询；以当前缓冲区调用，返回 [`QueryOutcome`]
///
/// 返回值：
/// - 首次探测即成功或报告所需大小为 0：返回空缓冲区（不分配）
/// - 其余情况：返回最后一次成功调用所用的缓冲区
///
/// 异常处理：
/// - 查询返回 [`QueryOutcome::Failed`]：返回 [`ScanError::Native`]
/// - 重试时报告的大小不大于已分配大小：返回 [`ScanError::BufferDidNotGrow`]，
///   以保证重试循环必然结束
pub fn negotiate<F>(operation: &str, mut query: F) -> Result<NativeBuffer, ScanError>
where
    F: FnMut(&mut NativeBuffer) -> QueryOutcome,
{
    let mut buffer = NativeBuffer::empty();
    loop {
        match query(&mut buffer) {
            QueryOutcome::Complete => return Ok(buffer),
            QueryOutcome::Insufficient(0) if buffer.is_empty() => return Ok(buffer),
            QueryOutcome::Insufficient(required) => {
                if required <= buffer.len() {
                    return Err(ScanError::BufferDidNotGrow {
                        operation: operation.to_string(),
                        allocated: buffer.len(),
                        reported: required,
                    });
                }
                trace!(operation, allocated = buffer.len(), required, "缓冲区不足，按报告大小重新分配");
                buffer = NativeBuffer::with_len(required);
            }
            QueryOutcome::Failed(source) => return Err(ScanError::native(operation, source)),
        }
    }
}
