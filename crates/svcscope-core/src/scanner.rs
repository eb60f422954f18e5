//! 巡检编排：枚举全部服务，并在工作线程池上逐个解析详情。
//!
//! 并发约定：
//! - 服务控制管理器连接在整次巡检中只读共享，供各工作线程并发打开服务
//! - 每个服务的句柄与缓冲区只属于解析它的线程
//! - 取消标志在处理每个服务之前检查一次
//!
//! 作者：服务巡检工具项目组
//! 创建时间：2026-10-18
//! 修改时间：2026-10-18

use rayon::prelude::*;
use tracing::{info, warn};

use crate::enumerate::enumerate_services;
use crate::error::ScanError;
use crate::options::{CancelToken, ScanOptions};
use crate::platform::{ServiceEntry, ServiceManager, SystemEnvironment, VersionResourceLoader};
use crate::record::Inventory;
use crate::resolver::{resolve_service, Resolution};

/// 巡检器（借用平台实现，按选项执行一次或多次巡检）。
pub struct Scanner<'a, M: ?Sized, E: ?Sized, L: ?Sized> {
    manager: &'a M,
    environment: &'a E,
    loader: &'a L,
    options: ScanOptions,
}

impl<'a, M, E, L> Scanner<'a, M, E, L>
where
    M: ServiceManager + ?Sized,
    E: SystemEnvironment + ?Sized,
    L: VersionResourceLoader + ?Sized,
{
    /// 创建巡检器。
    pub fn new(manager: &'a M, environment: &'a E, loader: &'a L, options: ScanOptions) -> Self {
        Self { manager, environment, loader, options }
    }

    /// 当前选项。
    pub fn options(&self) -> &ScanOptions {
        &self.options
    }

    /// 仅枚举服务条目（不解析详情）。
    pub fn enumerate(&self) -> Result<Vec<ServiceEntry>, ScanError> {
        enumerate_services(self.manager)
    }

    /// 解析单个条目。
    pub fn resolve(&self, entry: &ServiceEntry) -> Resolution {
        resolve_service(self.manager, self.environment, self.loader, &self.options, entry)
    }

    /// 执行一次完整巡检。
    ///
    /// 参数：
    /// - `cancel`：取消令牌
    ///
    /// 返回值：
    /// - 本次巡检的快照（记录顺序与枚举顺序一致）
    ///
    /// 异常处理：
    /// - 枚举失败：返回致命错误
    /// - 工作线程池创建失败：返回 [`ScanError::WorkerPool`]
    /// - 巡检过程中被取消：返回 [`ScanError::Cancelled`]
    pub fn collect(&self, cancel: &CancelToken) -> Result<Inventory, ScanError> {
        let entries = self.enumerate()?;
        info!(count = entries.len(), workers = self.options.workers, "开始解析服务详情");

        let resolutions: Vec<Option<Resolution>> = if self.options.workers == 1 {
            entries.iter().map(|entry| self.resolve_unless_cancelled(entry, cancel)).collect()
        } else {
            let pool = rayon::ThreadPoolBuilder::new()
                .num_threads(self.options.workers)
                .build()
                .map_err(|e| ScanError::WorkerPool(e.to_string()))?;
            pool.install(|| {
                entries
                    .par_iter()
                    .map(|entry| self.resolve_unless_cancelled(entry, cancel))
                    .collect()
            })
        };

        if cancel.is_cancelled() {
            return Err(ScanError::Cancelled);
        }

        let mut records = Vec::with_capacity(resolutions.len());
        let mut skipped = Vec::new();
        for resolution in resolutions.into_iter().flatten() {
            match resolution {
                Resolution::Record(record) => records.push(*record),
                Resolution::Skipped(skip) => skipped.push(skip),
            }
        }
        if !skipped.is_empty() {
            warn!(count = skipped.len(), "部分服务无法打开，已跳过");
        }
        info!(records = records.len(), skipped = skipped.len(), "巡检完成");
        Ok(Inventory::new(records, skipped))
    }

    fn resolve_unless_cancelled(&self, entry: &ServiceEntry, cancel: &CancelToken) -> Option<Resolution> {
        if cancel.is_cancelled() {
            return None;
        }
        Some(self.resolve(entry))
    }
}
