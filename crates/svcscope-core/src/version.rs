//! 版本资源（VS_VERSIONINFO）解析与代码页回退。
//!
//! 资源块是一棵节点树，每个节点布局为：
//! - `wLength`（u16，节点总长度，含子节点）
//! - `wValueLength`（u16，文本值按 WCHAR 计，二进制值按字节计）
//! - `wType`（u16，1 = 文本，0 = 二进制）
//! - `szKey`（以 0 结尾的 UTF-16），随后按 4 字节对齐
//! - 值，随后按 4 字节对齐
//! - 子节点（每个子节点起始都按 4 字节对齐）
//!
//! 字符串表按 `\StringFileInfo\<语言代码页>\<字段名>` 查询，翻译表位于
//! `\VarFileInfo\Translation`。很多文件声明的翻译表与字符串表实际使用的代码页不一致，
//! 因此按“翻译表首项 → 三个常见英文代码页”的顺序逐个尝试。
//!
//! 作者：服务巡检工具项目组
//! 创建时间：2026-10-18
//! 修改时间：2026-10-18

use std::ops::Range;

use tracing::debug;

use crate::cursor::{align_up, ByteCursor};
use crate::error::ScanError;
use crate::record::VersionInfo;

/// 翻译表之后依次尝试的常见代码页。
pub const FALLBACK_CODEPAGES: [&str; 3] = ["040904B0", "040904E4", "04090000"];

/// 用于判断某个代码页是否可用的探测字段。
const PROBE_FIELDS: [&str; 3] = ["FileVersion", "FileDescription", "ProductName"];

const NODE_HEADER_LEN: usize = 6;
const VALUE_TYPE_TEXT: u16 = 1;
const FIXED_FILE_INFO_SIGNATURE: u32 = 0xFEEF_04BD;

/// 解析后的版本资源块。
#[derive(Debug, Clone)]
pub struct VersionBlock<'a> {
    data: &'a [u8],
    root: Node,
}

#[derive(Debug, Clone)]
struct Node {
    key: String,
    value_len: u16,
    value: Range<usize>,
    children: Range<usize>,
}

/// `VS_FIXEDFILEINFO` 中的版本号。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedFileInfo {
    pub file_version: [u16; 4],
    pub product_version: [u16; 4],
}

impl FixedFileInfo {
    fn format(parts: [u16; 4]) -> String {
        format!("{}.{}.{}.{}", parts[0], parts[1], parts[2], parts[3])
    }
}

impl<'a> VersionBlock<'a> {
    /// 解析资源块根节点。
    ///
    /// 异常处理：
    /// - 数据不足一个节点头或根节点长度非法时返回 [`ScanError::Malformed`]
    pub fn parse(data: &'a [u8]) -> Result<Self, ScanError> {
        let root = parse_node(data, 0, data.len())
            .ok_or_else(|| ScanError::Malformed("版本资源根节点无效".to_string()))?;
        Ok(Self { data, root })
    }

    /// 按路径查询文本值（例如 `\StringFileInfo\040904B0\FileVersion`，键名不区分大小写）。
    ///
    /// 值一律按以 0 结尾的 UTF-16 读到节点末尾，不看 `wType`：
    /// 部分资源编译器给字符串节点写入 `wType = 0`，此时 `wValueLength` 仍是 WCHAR 数。
    pub fn query_string(&self, path: &str) -> Option<String> {
        let node = self.find(path)?;
        if node.value_len == 0 {
            return Some(String::new());
        }
        let end = node.children.end.max(node.value.end);
        let bytes = self.data.get(node.value.start..end)?;
        Some(ByteCursor::new(bytes).read_wide_sz().trim().to_string())
    }

    /// 按路径查询二进制值。
    pub fn query_bytes(&self, path: &str) -> Option<&'a [u8]> {
        let node = self.find(path)?;
        self.data.get(node.value.clone())
    }

    /// 翻译表（语言 ID, 代码页）列表，按声明顺序排列。
    pub fn translations(&self) -> Vec<(u16, u16)> {
        let Some(bytes) = self.query_bytes("\\VarFileInfo\\Translation") else {
            return Vec::new();
        };
        let mut cursor = ByteCursor::new(bytes);
        let mut pairs = Vec::new();
        while let (Some(lang), Some(codepage)) = (cursor.read_u16(), cursor.read_u16()) {
            pairs.push((lang, codepage));
        }
        pairs
    }

    /// 根节点中的 `VS_FIXEDFILEINFO`（签名不符时为 `None`）。
    pub fn fixed_info(&self) -> Option<FixedFileInfo> {
        let bytes = self.data.get(self.root.value.clone())?;
        let mut cursor = ByteCursor::new(bytes);
        if cursor.read_u32()? != FIXED_FILE_INFO_SIGNATURE {
            return None;
        }
        let _struct_version = cursor.read_u32()?;
        let file_ms = cursor.read_u32()?;
        let file_ls = cursor.read_u32()?;
        let product_ms = cursor.read_u32()?;
        let product_ls = cursor.read_u32()?;
        Some(FixedFileInfo {
            file_version: split_version(file_ms, file_ls),
            product_version: split_version(product_ms, product_ls),
        })
    }

    fn find(&self, path: &str) -> Option<Node> {
        let mut node = self.root.clone();
        for segment in path.split('\\').filter(|s| !s.is_empty()) {
            node = self
                .children(&node)
                .into_iter()
                .find(|child| child.key.eq_ignore_ascii_case(segment))?;
        }
        Some(node)
    }

    fn children(&self, node: &Node) -> Vec<Node> {
        let mut out = Vec::new();
        let mut pos = node.children.start;
        while pos + NODE_HEADER_LEN <= node.children.end {
            let Some(child) = parse_node(self.data, pos, node.children.end) else {
                break;
            };
            let next = align_up(child.children.end, 4);
            out.push(child);
            if next <= pos {
                break;
            }
            pos = next;
        }
        out
    }
}

/// 解析 `start` 处的节点；节点不得越过 `limit`（越过时截断到 `limit`）。
fn parse_node(data: &[u8], start: usize, limit: usize) -> Option<Node> {
    let limit = limit.min(data.len());
    let mut cursor = ByteCursor::at(&data[..limit], start);
    let length = cursor.read_u16()? as usize;
    let value_len = cursor.read_u16()?;
    let value_type = cursor.read_u16()?;
    if length < NODE_HEADER_LEN {
        return None;
    }
    let end = start.saturating_add(length).min(limit);
    let mut cursor = ByteCursor::at(&data[..end], start + NODE_HEADER_LEN);
    let key = cursor.read_wide_sz();
    cursor.align_to(4);

    let value_start = cursor.position();
    let value_bytes = if value_type == VALUE_TYPE_TEXT {
        value_len as usize * 2
    } else {
        value_len as usize
    };
    let value_end = value_start.saturating_add(value_bytes).min(end);
    let children_start = align_up(value_end, 4).min(end);

    Some(Node {
        key,
        value_len,
        value: value_start..value_end,
        children: children_start..end,
    })
}

fn split_version(ms: u32, ls: u32) -> [u16; 4] {
    [(ms >> 16) as u16, ms as u16, (ls >> 16) as u16, ls as u16]
}

/// 由语言 ID 与代码页生成字符串表键（例如 `040904B0`）。
pub fn codepage_key(lang: u16, codepage: u16) -> String {
    format!("{lang:04X}{codepage:04X}")
}

/// 候选代码页：翻译表首项（若有）在前，其后为 [`FALLBACK_CODEPAGES`]，去重。
pub fn candidate_codepages(block: &VersionBlock<'_>) -> Vec<String> {
    let mut candidates: Vec<String> = block
        .translations()
        .first()
        .map(|&(lang, codepage)| codepage_key(lang, codepage))
        .into_iter()
        .collect();
    for fallback in FALLBACK_CODEPAGES {
        if !candidates.iter().any(|c| c.eq_ignore_ascii_case(fallback)) {
            candidates.push(fallback.to_string());
        }
    }
    candidates
}

/// 从版本资源块中提取描述字段。
///
/// 参数：
/// - `data`：完整的版本资源块（为空表示文件没有版本资源）
///
/// 返回值：
/// - 找到至少一个探测字段非空的代码页：`has_resource_info = true`，各字段按该代码页读取，缺失字段为空
/// - 否则：返回全部为空的 [`VersionInfo`]
///
/// 异常处理：
/// - 不返回错误；资源块损坏时按“没有版本资源”处理
pub fn extract_version_info(data: &[u8]) -> VersionInfo {
    if data.is_empty() {
        return VersionInfo::default();
    }
    let block = match VersionBlock::parse(data) {
        Ok(block) => block,
        Err(e) => {
            debug!(error = %e, "版本资源块无法解析");
            return VersionInfo::default();
        }
    };

    let Some(codepage) = candidate_codepages(&block).into_iter().find(|cp| {
        PROBE_FIELDS
            .iter()
            .any(|field| !string_field(&block, cp, field).is_empty())
    }) else {
        return VersionInfo::default();
    };

    let field = |name: &str| string_field(&block, &codepage, name);
    let fixed = block.fixed_info();
    VersionInfo {
        has_resource_info: true,
        file_version: field("FileVersion"),
        file_description: field("FileDescription"),
        company_name: field("CompanyName"),
        product_name: field("ProductName"),
        comments: field("Comments"),
        internal_name: field("InternalName"),
        legal_copyright: field("LegalCopyright"),
        legal_trademarks: field("LegalTrademarks"),
        original_filename: field("OriginalFilename"),
        private_build: field("PrivateBuild"),
        special_build: field("SpecialBuild"),
        product_version: field("ProductVersion"),
        fixed_file_version: fixed.map(|f| FixedFileInfo::format(f.file_version)),
        fixed_product_version: fixed.map(|f| FixedFileInfo::format(f.product_version)),
        codepage: codepage.clone(),
    }
}

fn string_field(block: &VersionBlock<'_>, codepage: &str, name: &str) -> String {
    block
        .query_string(&format!("\\StringFileInfo\\{codepage}\\{name}"))
        .unwrap_or_default()
}
