//! 巡检错误类型。
//!
//! 分类：
//! - 致命错误：无法连接服务控制管理器、枚举调用返回“缓冲区不足”以外的错误
//! - 单项错误：由详情解析器吸收为默认值或跳过，不会以 [`ScanError`] 的形式冒泡到整次巡检
//!
//! 作者：服务巡检工具项目组
//! 创建时间：2026-10-18
//! 修改时间：2026-10-18

use thiserror::Error;

/// 操作系统返回的原始错误（错误码 + 可读消息）。
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("错误码 {code}: {message}")]
pub struct NativeError {
    /// 原生错误码（Windows 下为 Win32 错误码）。
    pub code: u32,
    /// 系统提供的错误描述。
    pub message: String,
}

impl NativeError {
    /// 创建原生错误。
    pub fn new(code: u32, message: impl Into<String>) -> Self {
        Self { code, message: message.into() }
    }
}

/// 巡检过程中的错误。
#[derive(Debug, Error)]
pub enum ScanError {
    /// 某个原生操作失败。
    #[error("{operation} 失败（{source}）")]
    Native {
        operation: String,
        #[source]
        source: NativeError,
    },
    /// 重试时系统报告的所需大小没有超过已分配大小，继续重试不会收敛。
    #[error("{operation} 报告的缓冲区需求未增长：已分配 {allocated} 字节，仍报告需要 {reported} 字节")]
    BufferDidNotGrow {
        operation: String,
        allocated: usize,
        reported: usize,
    },
    /// 原生缓冲区内容不符合预期格式。
    #[error("数据格式异常: {0}")]
    Malformed(String),
    /// 工作线程池创建失败。
    #[error("创建工作线程池失败: {0}")]
    WorkerPool(String),
    /// 调用方取消了本次巡检。
    #[error("巡检已取消")]
    Cancelled,
}

impl ScanError {
    /// 构造 [`ScanError::Native`]。
    pub fn native(operation: impl Into<String>, source: NativeError) -> Self {
        Self::Native { operation: operation.into(), source }
    }

    /// 若为原生错误，返回其错误码。
    pub fn native_code(&self) -> Option<u32> {
        match self {
            Self::Native { source, .. } => Some(source.code),
            _ => None,
        }
    }
}
