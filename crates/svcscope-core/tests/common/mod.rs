#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use svcscope_core::buffer::NativeBuffer;
use svcscope_core::platform::{
    FailureActionsConfig, PageOutcome, ResumeCursor, ServiceConfig, ServiceEntry, ServiceHandle, ServiceManager,
    ServiceStatus, SystemEnvironment, TriggerConfig, VersionResourceLoader,
};
use svcscope_core::{NativeError, ScanError};

/// 每个枚举条目在假缓冲区中占用的字节数。
pub const ENTRY_BYTES: usize = 64;

pub const ERROR_ACCESS_DENIED: u32 = 5;
pub const ERROR_INVALID_LEVEL: u32 = 124;

#[derive(Debug, Clone, Default)]
pub struct FakeService {
    pub entry: ServiceEntry,
    pub config: ServiceConfig,
    pub description: String,
    pub delayed_auto_start: bool,
    pub required_privileges: Vec<String>,
    pub sid_type: u32,
    pub launch_protected: u32,
    pub preshutdown_timeout_ms: u32,
    pub failure_actions: FailureActionsConfig,
    pub triggers: Vec<TriggerConfig>,
    pub service_dll: Option<String>,
    /// 打开服务时返回拒绝访问。
    pub deny_open: bool,
    /// 所有辅助配置都返回“不支持的信息类”。
    pub aux_unsupported: bool,
}

impl FakeService {
    pub fn new(name: &str, binary_path: &str) -> Self {
        Self {
            entry: ServiceEntry {
                name: name.to_string(),
                display_name: format!("{name} Display"),
                status: ServiceStatus {
                    service_type: 0x10,
                    current_state: 4,
                    controls_accepted: 0x5,
                    process_id: 1000,
                    ..Default::default()
                },
            },
            config: ServiceConfig {
                service_type: 0x10,
                start_type: 3,
                error_control: 1,
                binary_path: binary_path.to_string(),
                start_name: "LocalSystem".to_string(),
                ..Default::default()
            },
            description: format!("{name} description"),
            ..Default::default()
        }
    }
}

#[derive(Debug, Default)]
pub struct FakeManager {
    pub services: Vec<FakeService>,
    /// 每页最多返回的条目数（0 表示不限制，仅受缓冲区大小约束）。
    pub page_limit: usize,
    /// 第 n 页（从 1 开始）返回致命错误。
    pub fail_at_page: Option<usize>,
    /// 第 n 页一个条目都不返回，并报告比当前缓冲区多一个条目的大小（模拟枚举期间新注册的服务）。
    pub grow_once_at_page: Option<usize>,
    /// 从第 n 页起一个条目都不返回，报告的大小始终等于当前缓冲区大小。
    pub stall_from_page: Option<usize>,
    pub pages_served: AtomicUsize,
    pub opened: Arc<AtomicUsize>,
    pub closed: Arc<AtomicUsize>,
}

impl FakeManager {
    pub fn new(services: Vec<FakeService>) -> Self {
        Self { services, ..Default::default() }
    }

    pub fn opened(&self) -> usize {
        self.opened.load(Ordering::SeqCst)
    }

    pub fn closed(&self) -> usize {
        self.closed.load(Ordering::SeqCst)
    }
}

impl ServiceManager for FakeManager {
    type Handle = FakeHandle;

    fn enumerate_page(&self, cursor: &mut ResumeCursor, buffer: &mut NativeBuffer) -> PageOutcome {
        let page = self.pages_served.fetch_add(1, Ordering::SeqCst) + 1;
        if self.fail_at_page == Some(page) {
            return PageOutcome::Failed(NativeError::new(ERROR_ACCESS_DENIED, "Access is denied."));
        }
        if self.grow_once_at_page == Some(page) {
            return PageOutcome::MoreData {
                entries: Vec::new(),
                bytes_needed: buffer.len() + ENTRY_BYTES,
            };
        }
        if self.stall_from_page.is_some_and(|from| page >= from) {
            return PageOutcome::MoreData {
                entries: Vec::new(),
                bytes_needed: buffer.len(),
            };
        }
        let remaining = &self.services[cursor.0 as usize..];
        let mut fit = (buffer.len() / ENTRY_BYTES).min(remaining.len());
        if self.page_limit > 0 {
            fit = fit.min(self.page_limit);
        }
        let entries: Vec<ServiceEntry> = remaining[..fit].iter().map(|s| s.entry.clone()).collect();
        cursor.0 += fit as u32;
        if fit == remaining.len() {
            PageOutcome::Complete(entries)
        } else {
            PageOutcome::MoreData {
                entries,
                bytes_needed: (remaining.len() - fit) * ENTRY_BYTES,
            }
        }
    }

    fn open_service(&self, name: &str) -> Result<FakeHandle, NativeError> {
        let service = self
            .services
            .iter()
            .find(|s| s.entry.name.eq_ignore_ascii_case(name))
            .ok_or_else(|| NativeError::new(1060, "The specified service does not exist as an installed service."))?;
        if service.deny_open {
            return Err(NativeError::new(ERROR_ACCESS_DENIED, "Access is denied."));
        }
        self.opened.fetch_add(1, Ordering::SeqCst);
        Ok(FakeHandle {
            service: service.clone(),
            closed: Arc::clone(&self.closed),
        })
    }

    fn service_dll(&self, name: &str) -> Option<String> {
        self.services
            .iter()
            .find(|s| s.entry.name.eq_ignore_ascii_case(name))
            .and_then(|s| s.service_dll.clone())
    }
}

pub struct FakeHandle {
    service: FakeService,
    closed: Arc<AtomicUsize>,
}

impl Drop for FakeHandle {
    fn drop(&mut self) {
        self.closed.fetch_add(1, Ordering::SeqCst);
    }
}

impl FakeHandle {
    fn aux<T>(&self, value: T) -> Result<T, ScanError> {
        if self.service.aux_unsupported {
            return Err(ScanError::native(
                "QueryServiceConfig2W",
                NativeError::new(ERROR_INVALID_LEVEL, "The system call level is not correct."),
            ));
        }
        Ok(value)
    }
}

impl ServiceHandle for FakeHandle {
    fn query_config(&self) -> Result<ServiceConfig, ScanError> {
        Ok(self.service.config.clone())
    }

    fn query_status(&self) -> Result<ServiceStatus, ScanError> {
        Ok(self.service.entry.status.clone())
    }

    fn query_description(&self) -> Result<String, ScanError> {
        self.aux(self.service.description.clone())
    }

    fn query_delayed_auto_start(&self) -> Result<bool, ScanError> {
        self.aux(self.service.delayed_auto_start)
    }

    fn query_required_privileges(&self) -> Result<Vec<String>, ScanError> {
        self.aux(self.service.required_privileges.clone())
    }

    fn query_sid_type(&self) -> Result<u32, ScanError> {
        self.aux(self.service.sid_type)
    }

    fn query_launch_protected(&self) -> Result<u32, ScanError> {
        self.aux(self.service.launch_protected)
    }

    fn query_preshutdown_timeout(&self) -> Result<u32, ScanError> {
        self.aux(self.service.preshutdown_timeout_ms)
    }

    fn query_failure_actions(&self) -> Result<FailureActionsConfig, ScanError> {
        self.aux(self.service.failure_actions.clone())
    }

    fn query_triggers(&self) -> Result<Vec<TriggerConfig>, ScanError> {
        self.aux(self.service.triggers.clone())
    }
}

#[derive(Debug, Default)]
pub struct FakeEnvironment {
    pub process_names: HashMap<u32, String>,
}

impl SystemEnvironment for FakeEnvironment {
    fn system_directory(&self) -> &str {
        "C:\\Windows\\System32"
    }

    fn system_root(&self) -> &str {
        "C:\\Windows"
    }

    fn expand_environment(&self, input: &str) -> Result<String, ScanError> {
        if input.contains("%Broken%") {
            return Err(ScanError::native("ExpandEnvironmentStringsW", NativeError::new(203, "not found")));
        }
        Ok(input
            .replace("%SystemRoot%", "C:\\Windows")
            .replace("%windir%", "C:\\Windows")
            .replace("%ProgramFiles%", "C:\\Program Files"))
    }

    fn process_image_name(&self, pid: u32) -> Option<String> {
        self.process_names.get(&pid).cloned()
    }
}

#[derive(Debug, Default)]
pub struct FakeLoader {
    pub blocks: HashMap<String, Vec<u8>>,
}

impl FakeLoader {
    pub fn with_block(path: &str, block: Vec<u8>) -> Self {
        let mut blocks = HashMap::new();
        blocks.insert(path.to_ascii_lowercase(), block);
        Self { blocks }
    }
}

impl VersionResourceLoader for FakeLoader {
    fn load_version_block(&self, path: &str) -> Result<NativeBuffer, ScanError> {
        Ok(self
            .blocks
            .get(&path.to_ascii_lowercase())
            .map(|b| NativeBuffer::from_bytes(b))
            .unwrap_or_default())
    }
}

// ---- VS_VERSIONINFO 构造 ----

fn pad4(out: &mut Vec<u8>) {
    while out.len() % 4 != 0 {
        out.push(0);
    }
}

pub fn wide_z(s: &str) -> Vec<u8> {
    s.encode_utf16()
        .chain(std::iter::once(0))
        .flat_map(|u| u.to_le_bytes())
        .collect()
}

pub fn node(key: &str, value_type: u16, value: &[u8], value_len_field: u16, children: &[Vec<u8>]) -> Vec<u8> {
    let mut out = vec![0u8; 6];
    out.extend_from_slice(&wide_z(key));
    pad4(&mut out);
    out.extend_from_slice(value);
    for child in children {
        pad4(&mut out);
        out.extend_from_slice(child);
    }
    let len = out.len() as u16;
    out[0..2].copy_from_slice(&len.to_le_bytes());
    out[2..4].copy_from_slice(&value_len_field.to_le_bytes());
    out[4..6].copy_from_slice(&value_type.to_le_bytes());
    out
}

pub fn text(key: &str, value: &str) -> Vec<u8> {
    if value.is_empty() {
        return node(key, 1, &[], 0, &[]);
    }
    let chars = value.encode_utf16().count() as u16 + 1;
    node(key, 1, &wide_z(value), chars, &[])
}

pub fn string_table(codepage: &str, fields: &[(&str, &str)]) -> Vec<u8> {
    let children: Vec<Vec<u8>> = fields.iter().map(|(k, v)| text(k, v)).collect();
    node(codepage, 1, &[], 0, &children)
}

pub fn string_file_info(tables: &[Vec<u8>]) -> Vec<u8> {
    node("StringFileInfo", 1, &[], 0, tables)
}

pub fn var_file_info(translations: &[(u16, u16)]) -> Vec<u8> {
    let value: Vec<u8> = translations
        .iter()
        .flat_map(|(lang, cp)| {
            let mut b = lang.to_le_bytes().to_vec();
            b.extend_from_slice(&cp.to_le_bytes());
            b
        })
        .collect();
    let translation = node("Translation", 0, &value, value.len() as u16, &[]);
    node("VarFileInfo", 1, &[], 0, &[translation])
}

/// 构造完整的版本资源块；`fixed` 为 (文件版本 MS, LS, 产品版本 MS, LS)。
pub fn version_block(fixed: Option<(u32, u32, u32, u32)>, children: &[Vec<u8>]) -> Vec<u8> {
    match fixed {
        Some((fms, fls, pms, pls)) => {
            let mut value = Vec::new();
            for v in [0xFEEF_04BDu32, 0x0001_0000, fms, fls, pms, pls, 0, 0, 0, 0, 0, 0, 0] {
                value.extend_from_slice(&v.to_le_bytes());
            }
            node("VS_VERSION_INFO", 0, &value, value.len() as u16, children)
        }
        None => node("VS_VERSION_INFO", 0, &[], 0, children),
    }
}

/// 常见的完整字段集合。
pub fn full_fields() -> Vec<(&'static str, &'static str)> {
    vec![
        ("CompanyName", "Contoso Ltd."),
        ("FileDescription", "Contoso Update Service"),
        ("FileVersion", "1.2.3.4"),
        ("InternalName", "contosoupd"),
        ("LegalCopyright", "(c) Contoso"),
        ("OriginalFilename", "contosoupd.exe"),
        ("ProductName", "Contoso Updater"),
        ("ProductVersion", "1.2"),
    ]
}
