//! 按边界检查的只读字节游标。
//!
//! 原生缓冲区（服务配置结构、版本资源块）一律通过该游标读取：
//! 越界读取返回 `None`，不会访问缓冲区以外的内存。

/// 小端字节游标。
#[derive(Debug, Clone)]
pub struct ByteCursor<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> ByteCursor<'a> {
    /// 从数据起始处创建游标。
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    /// 从指定位置创建游标；位置超出数据长度时游标停在末尾。
    pub fn at(data: &'a [u8], pos: usize) -> Self {
        Self { data, pos: pos.min(data.len()) }
    }

    /// 当前位置（相对于数据起始）。
    pub fn position(&self) -> usize {
        self.pos
    }

    /// 剩余可读字节数。
    pub fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }

    /// 是否已读到末尾。
    pub fn is_empty(&self) -> bool {
        self.remaining() == 0
    }

    /// 将位置向上对齐到 `align` 的整数倍（超出末尾时停在末尾）。
    pub fn align_to(&mut self, align: usize) {
        let aligned = align_up(self.pos, align);
        self.pos = aligned.min(self.data.len());
    }

    /// 读取 `n` 个字节。
    pub fn read_bytes(&mut self, n: usize) -> Option<&'a [u8]> {
        let end = self.pos.checked_add(n)?;
        let bytes = self.data.get(self.pos..end)?;
        self.pos = end;
        Some(bytes)
    }

    /// 读取小端 `u16`。
    pub fn read_u16(&mut self) -> Option<u16> {
        let b = self.read_bytes(2)?;
        Some(u16::from_le_bytes([b[0], b[1]]))
    }

    /// 读取小端 `u32`。
    pub fn read_u32(&mut self) -> Option<u32> {
        let b = self.read_bytes(4)?;
        Some(u32::from_le_bytes([b[0], b[1], b[2], b[3]]))
    }

    /// 读取一个以 0 结尾的 UTF-16 字符串并越过结尾的 0。
    ///
    /// 数据在找到结尾 0 之前耗尽时，返回已读到的部分（不会越界）。
    pub fn read_wide_sz(&mut self) -> String {
        let mut units = Vec::new();
        while let Some(unit) = self.read_u16() {
            if unit == 0 {
                break;
            }
            units.push(unit);
        }
        String::from_utf16_lossy(&units)
    }
}

/// 将 `value` 向上对齐到 `align` 的整数倍（`align` 为 0 时原样返回）。
pub fn align_up(value: usize, align: usize) -> usize {
    if align == 0 {
        return value;
    }
    value.div_ceil(align).saturating_mul(align)
}
