//! 服务巡检命令行工具（svcscope）。
//!
//! 职责：
//! - `scan`：巡检本机全部服务，按过滤条件输出 JSON 或表格，可另存完整快照
//! - `show`：读取单个服务的完整记录
//! - `render`：离线渲染已保存的快照（不访问操作系统）
//! - `doctor`：环境自检（管理员权限、服务控制管理器可达性）
//!
//! 输出约定：
//! - 结果写到标准输出；日志写到标准错误，保证 JSON 输出可直接被脚本解析
//!
//! 作者：服务巡检工具项目组
//! 创建时间：2026-10-18
//! 修改时间：2026-10-18

mod render;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use svcscope_core::{CancelToken, Inventory, ScanOptions};
use tracing::{debug, info};

use crate::render::{render_inventory, render_record, OutputFormat, ViewArgs};

/// 命令行参数。
///
/// 说明：
/// - `config` 指向 JSON 格式的巡检选项文件（缺省字段使用默认值）
/// - `workers`、`no_version_info`、`no_service_dll` 覆盖配置文件中的同名选项
#[derive(Debug, Parser)]
#[command(name = "svcscope", version)]
struct Cli {
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// 工作线程数（0 = 按 CPU 数量，1 = 顺序执行）。
    #[arg(long, global = true)]
    workers: Option<usize>,

    /// 不读取可执行文件版本资源。
    #[arg(long, global = true, default_value_t = false)]
    no_version_info: bool,

    /// 不读取 ServiceDll。
    #[arg(long, global = true, default_value_t = false)]
    no_service_dll: bool,

    /// 输出调试日志。
    #[arg(long, short, global = true, default_value_t = false)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

/// 支持的子命令。
#[derive(Debug, Subcommand)]
enum Commands {
    /// 巡检本机全部服务。
    Scan {
        #[command(flatten)]
        view: ViewArgs,
        /// 另存完整快照（JSON，不受过滤条件影响）。
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// 读取单个服务。
    Show {
        name: String,
        #[arg(long, value_enum, default_value_t = OutputFormat::Json)]
        format: OutputFormat,
    },
    /// 渲染已保存的快照。
    Render {
        #[arg(long)]
        input: PathBuf,
        #[command(flatten)]
        view: ViewArgs,
    },
    /// 环境自检。
    Doctor,
}

/// 程序入口：初始化日志、解析参数并分发子命令。
///
/// 异常处理：
/// - 任意子命令失败都返回 `Err`，由运行时输出错误链并以非 0 退出
fn main() -> Result<()> {
    let cli = Cli::parse();
    let level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env().add_directive(level.parse()?))
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    match &cli.command {
        Commands::Scan { view, output } => scan(&cli, view, output.as_deref()),
        Commands::Show { name, format } => show(&cli, name, *format),
        Commands::Render { input, view } => render(input, view),
        Commands::Doctor => doctor(),
    }
}

/// 合并配置文件与命令行选项。
///
/// 异常处理：
/// - 配置文件读取或解析失败返回错误
fn load_options(cli: &Cli) -> Result<ScanOptions> {
    let mut options = match &cli.config {
        Some(path) => {
            let bytes = std::fs::read(path).with_context(|| format!("读取配置失败: {}", path.display()))?;
            serde_json::from_slice(&bytes).context("解析配置 JSON 失败")?
        }
        None => ScanOptions::default(),
    };
    if let Some(workers) = cli.workers {
        options.workers = workers;
    }
    if cli.no_version_info {
        options.resolve_version_info = false;
    }
    if cli.no_service_dll {
        options.resolve_service_dll = false;
    }
    debug!(?options, "巡检选项");
    Ok(options)
}

fn scan(cli: &Cli, view: &ViewArgs, output: Option<&Path>) -> Result<()> {
    let options = load_options(cli)?;
    let inventory = svcscope_windows::scan_local_computer(&options, &CancelToken::new())?;
    if let Some(path) = output {
        write_inventory(path, &inventory)?;
        info!(path = %path.display(), "快照已保存");
    }
    print!("{}", render_inventory(&inventory, view)?);
    Ok(())
}

fn show(cli: &Cli, name: &str, format: OutputFormat) -> Result<()> {
    let options = load_options(cli)?;
    let record = svcscope_windows::show_service(name, &options)?;
    print!("{}", render_record(&record, format)?);
    Ok(())
}

fn render(input: &Path, view: &ViewArgs) -> Result<()> {
    let bytes = std::fs::read(input).with_context(|| format!("读取快照失败: {}", input.display()))?;
    let inventory: Inventory = serde_json::from_slice(&bytes).context("解析快照 JSON 失败")?;
    print!("{}", render_inventory(&inventory, view)?);
    Ok(())
}

/// 环境自检（用于排障）。
///
/// 输出：
/// - 是否管理员运行
/// - 能否连接服务控制管理器（失败时附带原因）
/// - 系统目录
fn doctor() -> Result<()> {
    let diagnosis = svcscope_windows::diagnose()?;
    println!("admin = {}", diagnosis.is_admin);
    println!("scm_reachable = {}", diagnosis.scm_reachable);
    if let Some(error) = &diagnosis.scm_error {
        println!("scm_error = {error}");
    }
    println!(
        "system_directory = {}",
        diagnosis.system_directory.as_deref().unwrap_or("<unavailable>")
    );
    Ok(())
}

fn write_inventory(path: &Path, inventory: &Inventory) -> Result<()> {
    let json = serde_json::to_vec_pretty(inventory).context("序列化快照失败")?;
    std::fs::write(path, json).with_context(|| format!("写入快照失败: {}", path.display()))?;
    Ok(())
}
