//! 数值代码到可读名称的静态对照表。
//!
//! 所有函数都是全函数：任何输入（包括未来新增、未文档化的代码）都有确定的输出，
//! 未知值以 `Unknown (n)` 等形式保留原始数值，不会被静默丢弃。
//!
//! 作者：服务巡检工具项目组
//! 创建时间：2026-10-18
//! 修改时间：2026-10-18

/// 服务运行状态（SERVICE_STATUS.dwCurrentState）。
static SERVICE_STATES: &[(u32, &str)] = &[
    (1, "Stopped"),
    (2, "Start Pending"),
    (3, "Stop Pending"),
    (4, "Running"),
    (5, "Continue Pending"),
    (6, "Pause Pending"),
    (7, "Paused"),
];

/// 服务 SID 类型（身份隔离模式）。
static SID_TYPES: &[(u32, &str)] = &[(0, "None"), (1, "Unrestricted"), (3, "Restricted")];

/// 受保护服务级别。
static LAUNCH_PROTECTED: &[(u32, &str)] = &[
    (0, "None"),
    (1, "Windows"),
    (2, "Windows Light"),
    (3, "Antimalware Light"),
];

/// 服务可接受的控制码（位集合）。
static ACCEPTED_CONTROLS: &[(u32, &str)] = &[
    (0x0000_0001, "Stop"),
    (0x0000_0002, "Pause Continue"),
    (0x0000_0004, "Shutdown"),
    (0x0000_0008, "Param Change"),
    (0x0000_0010, "Net Bind Change"),
    (0x0000_0020, "Hardware Profile Change"),
    (0x0000_0040, "Power Event"),
    (0x0000_0080, "Session Change"),
    (0x0000_0100, "Pre-Shutdown"),
    (0x0000_0200, "Time Change"),
    (0x0000_0400, "Trigger Event"),
    (0x0000_0800, "User Logoff"),
    (0x0000_2000, "Low Resources"),
    (0x0000_4000, "System Low Resources"),
];

/// 服务类型（位集合）。
static SERVICE_TYPES: &[(u32, &str)] = &[
    (0x0000_0001, "Kernel Driver"),
    (0x0000_0002, "File System Driver"),
    (0x0000_0004, "Adapter"),
    (0x0000_0008, "Recognizer Driver"),
    (0x0000_0010, "Own Process"),
    (0x0000_0020, "Share Process"),
    (0x0000_0100, "Interactive"),
];

/// 启动类型。
static START_TYPES: &[(u32, &str)] = &[
    (0, "Boot Start"),
    (1, "System Start"),
    (2, "Auto Start"),
    (3, "Demand Start"),
    (4, "Disabled"),
];

/// 启动失败时的错误处理策略。
static ERROR_CONTROLS: &[(u32, &str)] = &[(0, "Ignore"), (1, "Normal"), (2, "Severe"), (3, "Critical")];

/// 服务失败后的恢复动作。
static FAILURE_ACTIONS: &[(u32, &str)] = &[
    (0, "None"),
    (1, "Restart"),
    (2, "Reboot"),
    (3, "Run Command"),
];

/// 触发器类型。
static TRIGGER_TYPES: &[(u32, &str)] = &[
    (1, "Device Interface Arrival"),
    (2, "IP Address Availability"),
    (3, "Domain Join"),
    (4, "Firewall Port Event"),
    (5, "Group Policy"),
    (6, "Network Endpoint"),
    (7, "Custom System State Change"),
    (20, "Custom"),
    (30, "Aggregate"),
];

/// 触发器动作。
static TRIGGER_ACTIONS: &[(u32, &str)] = &[(1, "Start Service"), (2, "Stop Service")];

/// 表示启动类型为“自动”的代码。
pub const START_TYPE_AUTO: u32 = 2;

/// 服务进程标志：运行在系统关键进程中。
const SERVICE_RUNS_IN_SYSTEM_PROCESS: u32 = 0x1;

fn lookup(table: &[(u32, &'static str)], code: u32) -> Option<&'static str> {
    table.iter().find(|(c, _)| *c == code).map(|(_, name)| *name)
}

fn lookup_or_unknown(table: &[(u32, &'static str)], code: u32) -> String {
    lookup(table, code)
        .map(str::to_string)
        .unwrap_or_else(|| format!("Unknown ({code})"))
}

fn bit_names(table: &[(u32, &'static str)], bits: u32) -> Vec<&'static str> {
    table
        .iter()
        .filter(|(bit, _)| bits & bit != 0)
        .map(|(_, name)| *name)
        .collect()
}

/// 运行状态名称；未知值为 `Unknown (n)`。
pub fn service_state(code: u32) -> String {
    lookup_or_unknown(SERVICE_STATES, code)
}

/// 身份隔离模式（服务 SID 类型）名称。
pub fn sid_type(code: u32) -> String {
    lookup_or_unknown(SID_TYPES, code)
}

/// 受保护服务级别名称。
pub fn launch_protected(code: u32) -> String {
    lookup_or_unknown(LAUNCH_PROTECTED, code)
}

/// 可接受控制码：已知位按表顺序以 `", "` 连接；没有任何已知位时为 `None`。
pub fn controls_accepted(bits: u32) -> String {
    let names = bit_names(ACCEPTED_CONTROLS, bits);
    if names.is_empty() {
        return "None".to_string();
    }
    names.join(", ")
}

/// 服务类型：已知位以 `" | "` 连接；没有任何已知位时为 `Unknown (0xXX)`。
pub fn service_type(bits: u32) -> String {
    let names = bit_names(SERVICE_TYPES, bits);
    if names.is_empty() {
        return format!("Unknown (0x{bits:02X})");
    }
    names.join(" | ")
}

/// 启动类型名称。
///
/// 参数：
/// - `code`：启动类型代码
/// - `delayed`：是否为延迟自动启动（仅在 `code` 为自动启动时生效）
///
/// 返回值：
/// - 例如 `Auto Start [Delayed]`、`Demand Start`；未知值为 `Unknown`
pub fn start_type(code: u32, delayed: bool) -> String {
    match lookup(START_TYPES, code) {
        Some(name) if code == START_TYPE_AUTO && delayed => format!("{name} [Delayed]"),
        Some(name) => name.to_string(),
        None => "Unknown".to_string(),
    }
}

/// 错误处理策略名称；未知值为 `Unknown`。
pub fn error_control(code: u32) -> String {
    lookup(ERROR_CONTROLS, code).unwrap_or("Unknown").to_string()
}

/// 恢复动作名称；未知值为 `Unknown Action`。
pub fn failure_action(code: u32) -> String {
    lookup(FAILURE_ACTIONS, code).unwrap_or("Unknown Action").to_string()
}

/// 触发器类型名称；未知值为 `Type n`。
pub fn trigger_type(code: u32) -> String {
    lookup(TRIGGER_TYPES, code)
        .map(str::to_string)
        .unwrap_or_else(|| format!("Type {code}"))
}

/// 触发器动作名称；未知值为 `Unknown Action`。
pub fn trigger_action(code: u32) -> String {
    lookup(TRIGGER_ACTIONS, code).unwrap_or("Unknown Action").to_string()
}

/// 服务进程标志名称。
pub fn service_flags(flags: u32) -> String {
    match flags {
        0 => "None".to_string(),
        SERVICE_RUNS_IN_SYSTEM_PROCESS => "Runs In System Process".to_string(),
        other => format!("Unknown ({other})"),
    }
}
