use derive_more::{Display, From, Into};

/// 数据块编号，相对于数据区的起点。
///
/// 块分配表与位图都以它为下标。
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Display, From, Into)]
#[repr(transparent)]
pub struct DataBlockId(u32);

impl From<DataBlockId> for usize {
    fn from(id: DataBlockId) -> Self {
        id.0 as usize
    }
}

impl DataBlockId {
    pub const fn new(raw: u32) -> Self {
        Self(raw)
    }

    #[inline]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

/// 块分配表的条目
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Link {
    /// 块未分配
    Free,
    /// 块链的最后一块
    EndOfChain,
    /// 块链中的下一块
    Next(DataBlockId),
}

impl Link {
    /// 两个保留值都在合法编号之外
    const FREE: u32 = u32::MAX;
    const END_OF_CHAIN: u32 = u32::MAX - 1;

    /// 解码磁盘上的原始值，`data_blocks`为数据区的块数。
    /// 原始值既不是保留值、也不是合法编号时返回空。
    pub fn decode(raw: u32, data_blocks: usize) -> Option<Self> {
        match raw {
            Self::FREE => Some(Self::Free),
            Self::END_OF_CHAIN => Some(Self::EndOfChain),
            raw if (raw as usize) < data_blocks => Some(Self::Next(DataBlockId(raw))),
            _ => None,
        }
    }

    pub const fn encode(self) -> u32 {
        match self {
            Self::Free => Self::FREE,
            Self::EndOfChain => Self::END_OF_CHAIN,
            Self::Next(id) => id.0,
        }
    }
}
