//! 元数据区域在内存中的镜像
//!
//! 位图、块分配表与目录表各自占据一段连续的块。
//! 区域整体常驻内存，修改时按块记录脏位，
//! [`Region::sync`]只把脏块写回设备。

use alloc::boxed::Box;
use alloc::vec;
use alloc::vec::Vec;
use core::ops::Range;

use block_dev::BlockDevice;

use crate::{BlockId, Result, BLOCK_SIZE};

#[derive(Debug)]
pub struct Region {
    /// 区域的起始块
    start: BlockId,
    /// 区域的全部字节
    data: Box<[u8]>,
    /// 每个块是否为脏块
    dirty: Vec<bool>,
}

impl Region {
    /// 以`fill`填满的新区域，所有块都待写回。
    pub fn filled(start: BlockId, blocks: usize, fill: u8) -> Self {
        Self {
            start,
            data: vec![fill; blocks * BLOCK_SIZE].into(),
            dirty: vec![true; blocks],
        }
    }

    pub fn load(dev: &dyn BlockDevice, start: BlockId, blocks: usize) -> Result<Self> {
        let mut data = vec![0u8; blocks * BLOCK_SIZE];
        for (i, block) in data.chunks_exact_mut(BLOCK_SIZE).enumerate() {
            dev.read_block((start + i).get(), block)?;
        }
        Ok(Self {
            start,
            data: data.into(),
            dirty: vec![false; blocks],
        })
    }

    #[inline]
    pub fn blocks(&self) -> usize {
        self.dirty.len()
    }

    #[inline]
    pub fn is_dirty(&self) -> bool {
        self.dirty.contains(&true)
    }

    pub fn get(&self, offset: usize, len: usize) -> &[u8] {
        &self.data[offset..offset + len]
    }

    pub fn get_mut(&mut self, offset: usize, len: usize) -> &mut [u8] {
        for flag in &mut self.dirty[Self::covering(offset, len)] {
            *flag = true;
        }
        &mut self.data[offset..offset + len]
    }

    pub fn read_u32(&self, offset: usize) -> u32 {
        let mut raw = [0; 4];
        raw.copy_from_slice(self.get(offset, 4));
        u32::from_le_bytes(raw)
    }

    pub fn write_u32(&mut self, offset: usize, value: u32) {
        self.get_mut(offset, 4).copy_from_slice(&value.to_le_bytes());
    }

    /// 把脏块写回设备。
    ///
    /// 写入失败时，尚未写回的块保持脏状态。
    pub fn sync(&mut self, dev: &dyn BlockDevice) -> Result<()> {
        for (i, block) in self.data.chunks_exact(BLOCK_SIZE).enumerate() {
            if self.dirty[i] {
                log::trace!("sync block {}", self.start + i);
                dev.write_block((self.start + i).get(), block)?;
                self.dirty[i] = false;
            }
        }
        Ok(())
    }
}

impl Region {
    /// 字节范围所覆盖的块索引
    fn covering(offset: usize, len: usize) -> Range<usize> {
        let first = offset / BLOCK_SIZE;
        let last = (offset + len.max(1)).div_ceil(BLOCK_SIZE);
        first..last
    }
}

#[cfg(test)]
mod tests {
    use block_dev::RamDisk;

    use super::*;

    #[test]
    fn covering() {
        assert_eq!(0..1, Region::covering(0, 4));
        assert_eq!(0..2, Region::covering(300, 320));
        assert_eq!(1..2, Region::covering(512, 512));
        assert_eq!(1..3, Region::covering(1000, 100));
    }

    #[test]
    fn sync_writes_dirty_blocks_only() {
        let disk = RamDisk::new(BLOCK_SIZE, 8);
        let mut region = Region::filled(BlockId::new(2), 3, 0xFF);
        region.sync(&disk).unwrap();
        assert!(!region.is_dirty());

        let mut region = Region::load(&disk, BlockId::new(2), 3).unwrap();
        region.write_u32(BLOCK_SIZE + 8, 0x1234_5678);
        assert!(region.is_dirty());
        region.sync(&disk).unwrap();

        let image = disk.snapshot();
        let at = 3 * BLOCK_SIZE + 8;
        assert_eq!([0x78u8, 0x56, 0x34, 0x12], image[at..at + 4]);
        assert!(image[..2 * BLOCK_SIZE].iter().all(|&b| b == 0));
        assert!(image[4 * BLOCK_SIZE..5 * BLOCK_SIZE].iter().all(|&b| b == 0xFF));
    }
}
