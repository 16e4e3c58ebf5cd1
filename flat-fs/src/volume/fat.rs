use alloc::vec::Vec;

use block_dev::BlockDevice;

use crate::volume::region::Region;
use crate::{DataBlockId, Error, Link, Result};

/// 块分配表区域
///
/// 每个数据块对应一个小端序`u32`条目，
/// 记录它在所属块链中的后继。
#[derive(Debug)]
pub struct AllocTable {
    region: Region,
    /// 数据区的块数
    len: usize,
}

impl AllocTable {
    #[inline]
    pub fn new(region: Region, len: usize) -> Self {
        debug_assert!(len * 4 <= region.blocks() * crate::BLOCK_SIZE);
        Self { region, len }
    }

    /// 确认每个条目都是保留值或合法编号。
    pub fn validate(&self) -> Result<()> {
        for i in 0..self.len {
            let raw = self.region.read_u32(i * 4);
            if Link::decode(raw, self.len).is_none() {
                log::error!("table entry #{i} holds {raw:#x}");
                return Err(Error::CorruptVolume);
            }
        }
        Ok(())
    }

    pub fn get(&self, id: DataBlockId) -> Result<Link> {
        if id.index() >= self.len {
            return Err(Error::CorruptChain);
        }
        Link::decode(self.region.read_u32(id.index() * 4), self.len).ok_or(Error::CorruptChain)
    }

    pub fn set(&mut self, id: DataBlockId, link: Link) {
        debug_assert!(id.index() < self.len);
        self.region.write_u32(id.index() * 4, link.encode());
    }

    /// 获取下一个块编号。
    /// 若`id`指向未分配块，则报错。
    /// `Ok(None)`表示`id`为链上最后一块。
    pub fn next(&self, id: DataBlockId) -> Result<Option<DataBlockId>> {
        match self.get(id)? {
            Link::Next(next) => Ok(Some(next)),
            Link::EndOfChain => Ok(None),
            Link::Free => {
                log::error!("block {id} is linked but free");
                Err(Error::CorruptChain)
            }
        }
    }

    /// 从链首出发前进`n`步。
    pub fn follow(&self, head: DataBlockId, n: usize) -> Result<DataBlockId> {
        let mut id = head;
        for _ in 0..n {
            id = self.next(id)?.ok_or(Error::CorruptChain)?;
        }
        Ok(id)
    }

    /// 链上最后一块
    pub fn last(&self, head: DataBlockId) -> Result<DataBlockId> {
        let mut last = head;
        for id in self.chain(head) {
            last = id?;
        }
        Ok(last)
    }

    pub fn chain(&self, head: DataBlockId) -> Chain<'_> {
        Chain {
            table: self,
            next: Some(head),
            steps: 0,
        }
    }

    /// 让`id`成为一条新链的唯一一块。
    #[inline]
    pub fn start(&mut self, id: DataBlockId) {
        self.set(id, Link::EndOfChain);
    }

    /// 把`new`接到链尾`tail`之后。
    pub fn extend(&mut self, tail: DataBlockId, new: DataBlockId) {
        self.set(tail, Link::Next(new));
        self.set(new, Link::EndOfChain);
    }

    /// 让`tail`成为链尾，其后的块不再属于本链。
    #[inline]
    pub fn truncate_after(&mut self, tail: DataBlockId) {
        self.set(tail, Link::EndOfChain);
    }

    /// 释放从`from`开始的整条链，返回被释放的块。
    pub fn release(&mut self, from: DataBlockId) -> Result<Vec<DataBlockId>> {
        let freed = self.chain(from).collect::<Result<Vec<_>>>()?;
        for &id in &freed {
            self.set(id, Link::Free);
        }
        Ok(freed)
    }

    #[inline]
    pub fn sync(&mut self, dev: &dyn BlockDevice) -> Result<()> {
        self.region.sync(dev)
    }
}

/// 块链迭代器
///
/// 步数超过数据区块数时判定链上有环。
pub struct Chain<'a> {
    table: &'a AllocTable,
    next: Option<DataBlockId>,
    steps: usize,
}

impl Iterator for Chain<'_> {
    type Item = Result<DataBlockId>;

    fn next(&mut self) -> Option<Self::Item> {
        let id = self.next.take()?;

        self.steps += 1;
        if self.steps > self.table.len {
            log::error!("chain loops back through block {id}");
            return Some(Err(Error::CorruptChain));
        }

        match self.table.next(id) {
            Ok(next) => {
                self.next = next;
                Some(Ok(id))
            }
            Err(e) => Some(Err(e)),
        }
    }
}
