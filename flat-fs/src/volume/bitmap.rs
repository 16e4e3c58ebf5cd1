use block_dev::BlockDevice;

use crate::volume::region::Region;
use crate::{DataBlockId, Error, Result};

/// 位图区域，记录数据区的块分配情况
///
/// 第`i`位对应第`i`个数据块，置位表示已分配。
#[derive(Debug)]
pub struct Bitmap {
    region: Region,
    /// 位图所指示的数据块数
    len: usize,
}

impl Bitmap {
    #[inline]
    pub fn new(region: Region, len: usize) -> Self {
        debug_assert!(len <= region.blocks() * crate::BLOCK_SIZE * 8);
        Self { region, len }
    }

    /// 线性扫描第一个空闲块。
    pub fn find_free(&self) -> Result<DataBlockId> {
        let bytes = self.region.get(0, self.len.div_ceil(8));

        // 寻找还有0位的字节
        bytes
            .iter()
            .enumerate()
            .find_map(|(byte_index, &bits)| {
                (bits != u8::MAX).then(|| byte_index * 8 + bits.trailing_ones() as usize)
            })
            .filter(|&index| index < self.len)
            .map(|index| DataBlockId::new(index as u32))
            .ok_or(Error::NoSpace)
    }

    pub fn is_used(&self, id: DataBlockId) -> bool {
        let (byte, bit) = Self::pos(id);
        self.region.get(byte, 1)[0] & bit != 0
    }

    pub fn mark_used(&mut self, id: DataBlockId) {
        debug_assert!(id.index() < self.len);
        let (byte, bit) = Self::pos(id);
        self.region.get_mut(byte, 1)[0] |= bit;
    }

    pub fn mark_free(&mut self, id: DataBlockId) {
        debug_assert!(id.index() < self.len);
        let (byte, bit) = Self::pos(id);
        self.region.get_mut(byte, 1)[0] &= !bit;
    }

    pub fn free_count(&self) -> usize {
        let used: usize = self
            .region
            .get(0, self.len.div_ceil(8))
            .iter()
            .map(|bits| bits.count_ones() as usize)
            .sum();
        self.len - used
    }

    #[inline]
    pub fn sync(&mut self, dev: &dyn BlockDevice) -> Result<()> {
        self.region.sync(dev)
    }
}

impl Bitmap {
    /// 编号所在的字节与位掩码
    #[inline]
    fn pos(id: DataBlockId) -> (usize, u8) {
        (id.index() / 8, 1 << (id.index() % 8))
    }
}
