//! 快照过滤与渲染（JSON / 表格）。
//!
//! 作者：服务巡检工具项目组
//! 创建时间：2026-10-18
//! 修改时间：2026-10-18

use std::fmt::Write as _;

use anyhow::{Context, Result};
use clap::{Args, ValueEnum};
use svcscope_core::{Inventory, ServiceRecord};

/// 驱动程序类服务类型位（内核驱动、文件系统驱动、适配器、识别器）。
const DRIVER_TYPE_BITS: u32 = 0x0F;
/// Win32 服务类型位（独立进程、共享进程）。
const WIN32_TYPE_BITS: u32 = 0x30;

/// 输出格式。
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
}

/// 过滤与输出参数（`scan` 与 `render` 共用）。
#[derive(Debug, Clone, Args)]
pub struct ViewArgs {
    /// 按运行状态过滤（例如 running、stopped；不区分大小写）。
    #[arg(long)]
    pub state: Option<String>,

    /// 按启动类型过滤（子串匹配，例如 auto、disabled）。
    #[arg(long)]
    pub start_type: Option<String>,

    /// 按服务名或显示名过滤（子串匹配）。
    #[arg(long)]
    pub name: Option<String>,

    /// 只保留驱动程序。
    #[arg(long, default_value_t = false, conflicts_with = "win32")]
    pub drivers: bool,

    /// 只保留 Win32 服务。
    #[arg(long, default_value_t = false)]
    pub win32: bool,

    #[arg(long, value_enum, default_value_t = OutputFormat::Json)]
    pub format: OutputFormat,
}

impl ViewArgs {
    /// 记录是否满足全部过滤条件。
    pub fn matches(&self, record: &ServiceRecord) -> bool {
        if let Some(state) = &self.state {
            if !record.state.eq_ignore_ascii_case(state) {
                return false;
            }
        }
        if let Some(start_type) = &self.start_type {
            if !contains_ignore_case(&record.start_type, start_type) {
                return false;
            }
        }
        if let Some(name) = &self.name {
            if !contains_ignore_case(&record.name, name) && !contains_ignore_case(&record.display_name, name) {
                return false;
            }
        }
        if self.drivers && record.service_type_code & DRIVER_TYPE_BITS == 0 {
            return false;
        }
        if self.win32 && record.service_type_code & WIN32_TYPE_BITS == 0 {
            return false;
        }
        true
    }
}

fn contains_ignore_case(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}

/// 按过滤条件渲染快照。
///
/// 返回值：
/// - JSON：与输入结构相同的快照（只包含匹配的记录）
/// - 表格：每个服务一行，末尾附统计
pub fn render_inventory(inventory: &Inventory, view: &ViewArgs) -> Result<String> {
    let filtered = Inventory {
        records: inventory.records.iter().filter(|r| view.matches(r)).cloned().collect(),
        ..inventory.clone()
    };
    match view.format {
        OutputFormat::Json => {
            let mut json = serde_json::to_string_pretty(&filtered).context("序列化快照失败")?;
            json.push('\n');
            Ok(json)
        }
        OutputFormat::Table => Ok(table(&filtered, inventory.records.len())),
    }
}

/// 渲染单条记录。
pub fn render_record(record: &ServiceRecord, format: OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Json => {
            let mut json = serde_json::to_string_pretty(record).context("序列化记录失败")?;
            json.push('\n');
            Ok(json)
        }
        OutputFormat::Table => Ok(details(record)),
    }
}

const COLUMNS: [&str; 5] = ["NAME", "STATE", "START", "PID", "PATH"];

fn row(record: &ServiceRecord) -> [String; 5] {
    [
        record.name.clone(),
        record.state.clone(),
        record.start_type.clone(),
        if record.process_id == 0 { "-".to_string() } else { record.process_id.to_string() },
        record.normalized_path.clone(),
    ]
}

fn table(inventory: &Inventory, total: usize) -> String {
    let rows: Vec<[String; 5]> = inventory.records.iter().map(row).collect();
    let mut widths = COLUMNS.map(|c| c.chars().count());
    for r in &rows {
        for (width, cell) in widths.iter_mut().zip(r.iter()) {
            *width = (*width).max(cell.chars().count());
        }
    }

    let mut out = String::new();
    let mut line = |cells: &[&str]| {
        let last = cells.len() - 1;
        for (i, cell) in cells.iter().enumerate() {
            if i == last {
                let _ = write!(out, "{cell}");
            } else {
                let _ = write!(out, "{cell:<width$}  ", width = widths[i]);
            }
        }
        out.push('\n');
    };
    line(&COLUMNS);
    for r in &rows {
        let cells: Vec<&str> = r.iter().map(String::as_str).collect();
        line(&cells);
    }
    let _ = writeln!(
        out,
        "\n{} of {} services shown, {} skipped (pass {})",
        inventory.records.len(),
        total,
        inventory.skipped.len(),
        inventory.pass_id
    );
    out
}

fn details(record: &ServiceRecord) -> String {
    let mut out = String::new();
    let mut field = |key: &str, value: &str| {
        let _ = writeln!(out, "{key:<22}{value}");
    };
    field("Name", &record.name);
    field("Display name", &record.display_name);
    field("Description", &record.description);
    field("State", &record.state);
    field("Process", &process_label(record));
    field("Service type", &record.service_type);
    field("Start type", &record.start_type);
    field("Error control", &record.error_control);
    field("Account", &record.start_name);
    field("Image path", &record.image_path);
    field("Normalized path", &record.normalized_path);
    field("Service DLL", record.service_dll.as_deref().unwrap_or("-"));
    field("Dependencies", &join_or_dash(&record.dependencies));
    field("Privileges", &join_or_dash(&record.required_privileges));
    field("SID type", &record.sid_type);
    field("Launch protected", &record.launch_protected);
    field("Controls accepted", &record.controls_accepted);
    field("File version", &record.version.file_version);
    field("Company", &record.version.company_name);
    field("Product", &record.version.product_name);
    out
}

fn process_label(record: &ServiceRecord) -> String {
    match (&record.process_name, record.process_id) {
        (_, 0) => "-".to_string(),
        (Some(name), pid) => format!("{name} ({pid})"),
        (None, pid) => pid.to_string(),
    }
}

fn join_or_dash(items: &[String]) -> String {
    if items.is_empty() {
        "-".to_string()
    } else {
        items.join(", ")
    }
}
