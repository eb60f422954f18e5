//! 服务清单记录与巡检快照模型（可序列化为 JSON）。
//!
//! 约定：
//! - 记录在一次巡检中构建一次，之后不再修改；重复巡检产生全新的独立记录
//! - 每个可读化的枚举字段都保留原始数值（`*_code`），供配置编辑类上层按原值回写
//! - `version.has_resource_info == false` 时，所有版本资源字段均为空
//!
//! 作者：服务巡检工具项目组
//! 创建时间：2026-10-18
//! 修改时间：2026-10-18

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

/// 服务没有描述时使用的占位值。
pub const NO_DESCRIPTION: &str = "None";

/// 一次巡检的结果快照。
///
/// 字段说明：
/// - `pass_id`：本次巡检 ID（每次巡检随机生成）
/// - `collected_at`：巡检完成时间（UTC）
/// - `records`：成功解析的服务记录
/// - `skipped`：因无法打开等原因被跳过的服务
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Inventory {
    pub pass_id: Uuid,
    pub collected_at: OffsetDateTime,
    pub records: Vec<ServiceRecord>,
    #[serde(default)]
    pub skipped: Vec<SkippedService>,
}

impl Inventory {
    /// 以当前时间和新的随机 ID 创建快照。
    pub fn new(records: Vec<ServiceRecord>, skipped: Vec<SkippedService>) -> Self {
        Self {
            pass_id: Uuid::new_v4(),
            collected_at: OffsetDateTime::now_utc(),
            records,
            skipped,
        }
    }
}

/// 被跳过的服务及原因。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkippedService {
    pub name: String,
    pub reason: String,
}

/// 单个服务的完整记录。
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceRecord {
    /// 服务名（在服务控制管理器命名空间内唯一）。
    pub name: String,
    /// 显示名。
    pub display_name: String,
    /// 描述；没有描述时为 [`NO_DESCRIPTION`]。
    pub description: String,

    /// 运行状态。
    pub state: String,
    pub state_code: u32,
    /// 宿主进程 ID（未运行时为 0）。
    pub process_id: u32,
    /// 宿主进程映像名。
    #[serde(default)]
    pub process_name: Option<String>,
    pub win32_exit_code: u32,
    pub service_specific_exit_code: u32,
    /// 可接受的控制码。
    pub controls_accepted: String,
    pub controls_accepted_code: u32,
    /// 服务进程标志。
    pub service_flags: String,
    pub service_flags_code: u32,

    /// 服务类型。
    pub service_type: String,
    pub service_type_code: u32,
    /// 启动类型（含 `[Delayed]` 后缀）。
    pub start_type: String,
    pub start_type_code: u32,
    pub delayed_auto_start: bool,
    /// 启动失败时的错误处理策略。
    pub error_control: String,
    pub error_control_code: u32,
    /// 运行账户。
    pub start_name: String,
    pub load_order_group: String,
    pub tag_id: u32,
    /// 依赖的服务/服务组（保持原顺序）。
    pub dependencies: Vec<String>,
    /// 身份隔离模式（服务 SID 类型）。
    pub sid_type: String,
    pub sid_type_code: u32,
    /// 受保护服务级别。
    pub launch_protected: String,
    pub launch_protected_code: u32,
    /// 所需特权。
    pub required_privileges: Vec<String>,
    /// 预关机超时（毫秒）。
    pub preshutdown_timeout_ms: u32,
    /// 失败恢复策略。
    pub failure_actions: FailureActionsRecord,
    /// 触发器。
    pub triggers: Vec<TriggerRecord>,

    /// 原始启动命令行。
    pub image_path: String,
    /// 规范化后的可执行文件路径（命令行为空时为空）。
    pub normalized_path: String,
    /// 规范化后的 ServiceDll 路径。
    #[serde(default)]
    pub service_dll: Option<String>,

    /// 可执行文件版本资源。
    pub version: VersionInfo,
}

/// 失败恢复策略记录。
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailureActionsRecord {
    /// 失败计数清零周期（秒）。
    pub reset_period_secs: u32,
    pub reboot_message: String,
    pub command: String,
    /// 依次执行的恢复动作。
    pub actions: Vec<FailureActionRecord>,
}

/// 单个恢复动作。
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailureActionRecord {
    pub action: String,
    pub action_code: u32,
    pub delay_ms: u32,
}

/// 单个触发器。
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TriggerRecord {
    pub action: String,
    pub action_code: u32,
    pub trigger_type: String,
    pub trigger_type_code: u32,
    pub subtype: String,
}

/// 可执行文件版本资源中的描述字段。
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionInfo {
    /// 是否找到了可用的字符串表。
    pub has_resource_info: bool,
    /// 实际采用的语言/代码页键（例如 `040904B0`）。
    pub codepage: String,
    pub file_version: String,
    pub file_description: String,
    pub company_name: String,
    pub product_name: String,
    pub comments: String,
    pub internal_name: String,
    pub legal_copyright: String,
    pub legal_trademarks: String,
    pub original_filename: String,
    pub private_build: String,
    pub special_build: String,
    pub product_version: String,
    /// VS_FIXEDFILEINFO 中的文件版本（`a.b.c.d`）。
    #[serde(default)]
    pub fixed_file_version: Option<String>,
    /// VS_FIXEDFILEINFO 中的产品版本（`a.b.c.d`）。
    #[serde(default)]
    pub fixed_product_version: Option<String>,
}
