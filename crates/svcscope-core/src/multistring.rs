//! 多字符串解码。
//!
//! 格式：若干以 0 结尾的 UTF-16 字符串紧密排列，最后再跟一个额外的 0
//! （例如服务依赖列表、所需特权列表）。
//!
//! 作者：服务巡检工具项目组
//! 创建时间：2026-10-18
//! 修改时间：2026-10-18

use crate::cursor::ByteCursor;

/// 解码字节形式（小端 UTF-16）的多字符串。
///
/// 参数：
/// - `bytes`：多字符串字节（可以不含结尾的双 0）
///
/// 返回值：
/// - 按原顺序排列的字符串列表，不含结束标记；输入为空时返回空列表
///
/// 说明：
/// - 读到空字符串（双 0）或数据末尾即停止，不会越界
pub fn decode_multi_sz(bytes: &[u8]) -> Vec<String> {
    let mut cursor = ByteCursor::new(bytes);
    let mut items = Vec::new();
    while !cursor.is_empty() {
        let item = cursor.read_wide_sz();
        if item.is_empty() {
            break;
        }
        items.push(item);
    }
    items
}
