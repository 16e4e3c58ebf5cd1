use alloc::vec::Vec;

use block_dev::BlockDevice;

use crate::volume::dir_entry::DirEntry;
use crate::volume::region::Region;
use crate::{DIR_ENTRIES, Error, Result};

/// 目录表：唯一目录的全部槽位
///
/// 解码后的目录项常驻内存，每次修改立即重新编码回区域，
/// 由[`DirTable::sync`]写回脏块。
#[derive(Debug)]
pub struct DirTable {
    region: Region,
    entries: Vec<DirEntry>,
}

impl DirTable {
    /// 全部槽位为空的目录表
    pub fn new(region: Region) -> Self {
        Self {
            region,
            entries: (0..DIR_ENTRIES).map(|_| DirEntry::default()).collect(),
        }
    }

    pub fn load(region: Region, data_blocks: usize) -> Result<Self> {
        let entries = (0..DIR_ENTRIES)
            .map(|slot| DirEntry::decode(region.get(slot * DirEntry::SIZE, DirEntry::SIZE), data_blocks))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { region, entries })
    }

    pub fn find_by_name(&self, name: &str) -> Option<usize> {
        self.entries
            .iter()
            .position(|entry| entry.is_active() && entry.name == name)
    }

    pub fn find_free_slot(&self) -> Result<usize> {
        self.entries
            .iter()
            .position(|entry| !entry.is_active())
            .ok_or(Error::DirectoryFull)
    }

    /// 把目录项放入第一个空槽，返回槽位。
    pub fn insert(&mut self, entry: DirEntry) -> Result<usize> {
        let slot = self.find_free_slot()?;
        self.store(slot, entry);
        Ok(slot)
    }

    #[inline]
    pub fn get(&self, slot: usize) -> &DirEntry {
        &self.entries[slot]
    }

    /// 修改一个目录项，并重新编码。
    pub fn update<V>(&mut self, slot: usize, f: impl FnOnce(&mut DirEntry) -> V) -> V {
        let ret = f(&mut self.entries[slot]);
        self.encode(slot);
        ret
    }

    /// 清空槽位
    #[inline]
    pub fn clear(&mut self, slot: usize) {
        self.store(slot, DirEntry::default());
    }

    /// 所有活动目录项及其槽位
    pub fn iter(&self) -> impl Iterator<Item = (usize, &DirEntry)> {
        self.entries
            .iter()
            .enumerate()
            .filter(|(_, entry)| entry.is_active())
    }

    pub fn free_slots(&self) -> usize {
        self.entries.iter().filter(|entry| !entry.is_active()).count()
    }

    #[inline]
    pub fn sync(&mut self, dev: &dyn BlockDevice) -> Result<()> {
        self.region.sync(dev)
    }
}

impl DirTable {
    fn store(&mut self, slot: usize, entry: DirEntry) {
        self.entries[slot] = entry;
        self.encode(slot);
    }

    fn encode(&mut self, slot: usize) {
        let buf = self.region.get_mut(slot * DirEntry::SIZE, DirEntry::SIZE);
        self.entries[slot].encode(buf);
    }
}
