//! 打开文件表
//!
//! 句柄只存在于进程内，不落盘。
//! 每个句柄缓存最近访问的一个数据块，顺序读写同一块时省去设备读。

use alloc::boxed::Box;
use alloc::vec::Vec;

use block_dev::BlockDevice;
use derive_more::{Display, From, Into};

use crate::{BLOCK_SIZE, BlockId, DataBlock, DataBlockId, Error, MAX_OPEN_FILES, Result};

/// 交给适配层的文件句柄
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, From, Into)]
pub struct FileHandle(u64);

impl FileHandle {
    #[inline]
    fn index(self) -> usize {
        self.0 as usize
    }
}

#[derive(Debug)]
struct CachedBlock {
    id: DataBlockId,
    data: Box<DataBlock>,
}

#[derive(Debug)]
pub struct OpenFile {
    /// 目录表中的槽位
    pub slot: usize,
    cache: Option<CachedBlock>,
}

impl OpenFile {
    fn new(slot: usize) -> Self {
        Self { slot, cache: None }
    }

    #[inline]
    pub fn cached(&self) -> Option<DataBlockId> {
        self.cache.as_ref().map(|cached| cached.id)
    }

    #[inline]
    pub fn invalidate(&mut self) {
        self.cache = None;
    }

    /// 取得数据块的内容，未命中缓存时从设备读入。
    ///
    /// `block`为`id`在设备上的块号。读取失败时缓存被清空。
    pub fn load(
        &mut self,
        id: DataBlockId,
        block: BlockId,
        dev: &dyn BlockDevice,
    ) -> Result<&mut DataBlock> {
        let cached = match self.cache.take() {
            Some(cached) if cached.id == id => cached,
            stale => {
                // 沿用旧缓冲区
                let mut data = stale.map_or_else(|| Box::new([0; BLOCK_SIZE]), |stale| stale.data);
                log::trace!("cache miss, read block {block}");
                dev.read_block(block.get(), &mut data[..])?;
                CachedBlock { id, data }
            }
        };
        Ok(&mut self.cache.insert(cached).data)
    }

    /// 取得一个将被整块覆盖的缓存，不读设备。
    pub fn overwrite(&mut self, id: DataBlockId) -> &mut DataBlock {
        let data = match self.cache.take() {
            Some(stale) => stale.data,
            None => Box::new([0; BLOCK_SIZE]),
        };
        &mut self.cache.insert(CachedBlock { id, data }).data
    }
}

#[derive(Debug)]
pub struct HandleTable {
    files: Vec<Option<OpenFile>>,
}

impl HandleTable {
    pub fn new() -> Self {
        Self {
            files: (0..MAX_OPEN_FILES).map(|_| None).collect(),
        }
    }

    /// 为目录表槽位分配句柄。
    pub fn open(&mut self, slot: usize) -> Result<FileHandle> {
        let index = self
            .files
            .iter()
            .position(Option::is_none)
            .ok_or(Error::TooManyOpenFiles)?;
        self.files[index] = Some(OpenFile::new(slot));
        Ok(FileHandle(index as u64))
    }

    pub fn release(&mut self, fh: FileHandle) -> Result<OpenFile> {
        self.files
            .get_mut(fh.index())
            .and_then(Option::take)
            .ok_or(Error::NotOpen)
    }

    pub fn get(&self, fh: FileHandle) -> Result<&OpenFile> {
        self.files
            .get(fh.index())
            .and_then(Option::as_ref)
            .ok_or(Error::NotOpen)
    }

    pub fn get_mut(&mut self, fh: FileHandle) -> Result<&mut OpenFile> {
        self.files
            .get_mut(fh.index())
            .and_then(Option::as_mut)
            .ok_or(Error::NotOpen)
    }

    /// 是否仍有句柄指向该槽位
    pub fn is_open(&self, slot: usize) -> bool {
        self.iter().any(|file| file.slot == slot)
    }

    /// 清除所有缓存了`id`的句柄的缓存。
    pub fn invalidate(&mut self, id: DataBlockId) {
        self.iter_mut()
            .filter(|file| file.cached() == Some(id))
            .for_each(OpenFile::invalidate);
    }

    /// 同[`HandleTable::invalidate`]，但保留`keep`的缓存。
    pub fn invalidate_except(&mut self, id: DataBlockId, keep: FileHandle) {
        self.files
            .iter_mut()
            .enumerate()
            .filter(|(index, _)| *index != keep.index())
            .filter_map(|(_, file)| file.as_mut())
            .filter(|file| file.cached() == Some(id))
            .for_each(OpenFile::invalidate);
    }

    pub fn in_use(&self) -> usize {
        self.iter().count()
    }
}

impl HandleTable {
    fn iter(&self) -> impl Iterator<Item = &OpenFile> {
        self.files.iter().flatten()
    }

    fn iter_mut(&mut self) -> impl Iterator<Item = &mut OpenFile> {
        self.files.iter_mut().flatten()
    }
}

#[cfg(test)]
mod tests {
    use block_dev::RamDisk;

    use super::*;

    #[test]
    fn bounded() {
        let mut table = HandleTable::new();
        let handles: Vec<_> = (0..MAX_OPEN_FILES)
            .map(|slot| table.open(slot).unwrap())
            .collect();
        assert_eq!(Err(Error::TooManyOpenFiles), table.open(0));

        let released = table.release(handles[3]).unwrap();
        assert_eq!(3, released.slot);
        assert!(!table.is_open(3));
        assert_eq!(Err(Error::NotOpen), table.release(handles[3]).map(|file| file.slot));
        assert_eq!(Ok(handles[3]), table.open(7));
        assert_eq!(MAX_OPEN_FILES, table.in_use());
    }

    #[test]
    fn cache() {
        let disk = RamDisk::new(BLOCK_SIZE, 4);
        disk.write_block(2, &[7; BLOCK_SIZE]).unwrap();

        let mut table = HandleTable::new();
        let a = table.open(0).unwrap();
        let b = table.open(0).unwrap();
        let id = DataBlockId::new(1);

        for fh in [a, b] {
            let data = table.get_mut(fh).unwrap().load(id, BlockId::new(2), &disk).unwrap();
            assert_eq!([7; BLOCK_SIZE], *data);
        }

        // 命中时不读设备
        disk.write_block(2, &[9; BLOCK_SIZE]).unwrap();
        let data = table.get_mut(a).unwrap().load(id, BlockId::new(2), &disk).unwrap();
        assert_eq!([7; BLOCK_SIZE], *data);

        table.invalidate_except(id, a);
        assert_eq!(Some(id), table.get(a).unwrap().cached());
        assert_eq!(None, table.get(b).unwrap().cached());

        table.invalidate(id);
        assert_eq!(None, table.get(a).unwrap().cached());
    }
}
