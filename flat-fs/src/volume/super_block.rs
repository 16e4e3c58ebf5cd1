use block_dev::BlockDevice;

use crate::volume::dir_entry::DirEntry;
use crate::{BlockId, DataBlock, Error, Result};
use crate::{BLOCK_SIZE, DATA_BLOCKS_CAP, DIR_ENTRIES, MAGIC};

/// 位图区占用块数，每个数据块一位
pub const BITMAP_BLOCKS: usize = DATA_BLOCKS_CAP.div_ceil(8).div_ceil(BLOCK_SIZE);
/// 块分配表区占用块数，每个数据块四字节
pub const TABLE_BLOCKS: usize = (DATA_BLOCKS_CAP * 4).div_ceil(BLOCK_SIZE);
/// 目录区占用块数
pub const DIR_BLOCKS: usize = (DIR_ENTRIES * DirEntry::SIZE).div_ceil(BLOCK_SIZE);

/// 超级块：
/// - 提供文件系统合法性校验；
/// - 定位其它连续区域
///
/// 位于#0块，字段皆以小端序`u32`存放。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SuperBlock {
    pub bitmap_start: BlockId,
    pub table_start: BlockId,
    pub dir_start: BlockId,
    pub data_start: BlockId,
    /// 卷占据块数
    pub total_blocks: usize,
    /// 数据区块数，不超过[`DATA_BLOCKS_CAP`]
    pub data_blocks: usize,
}

impl SuperBlock {
    pub const ID: BlockId = BlockId::new(0);

    /// 根据设备块数计算布局。
    ///
    /// 设备连一个数据块都容纳不下时报错。
    pub fn layout(total_blocks: usize) -> Result<Self> {
        let bitmap_start = Self::ID + 1;
        let table_start = bitmap_start + BITMAP_BLOCKS;
        let dir_start = table_start + TABLE_BLOCKS;
        let data_start = dir_start + DIR_BLOCKS;

        if total_blocks <= data_start.get() {
            log::error!("{total_blocks} blocks can't hold the metadata ending at {data_start}");
            return Err(Error::VolumeTooSmall);
        }

        Ok(Self {
            bitmap_start,
            table_start,
            dir_start,
            data_start,
            total_blocks,
            data_blocks: (total_blocks - data_start.get()).min(DATA_BLOCKS_CAP),
        })
    }

    /// 读取#0块，并与编译期的布局核对。
    pub fn load(dev: &dyn BlockDevice) -> Result<Self> {
        let mut block: DataBlock = [0; BLOCK_SIZE];
        dev.read_block(Self::ID.get(), &mut block)?;

        let field = |nth: usize| {
            let mut raw = [0; 4];
            raw.copy_from_slice(&block[nth * 4..nth * 4 + 4]);
            u32::from_le_bytes(raw) as usize
        };

        if field(0) != MAGIC as usize {
            log::error!("bad magic {:#x}", field(0));
            return Err(Error::CorruptVolume);
        }

        let sb = Self {
            bitmap_start: BlockId::new(field(1)),
            table_start: BlockId::new(field(2)),
            dir_start: BlockId::new(field(3)),
            data_start: BlockId::new(field(4)),
            total_blocks: field(5),
            data_blocks: field(6),
        };

        match Self::layout(sb.total_blocks) {
            Ok(expected) if expected == sb => Ok(sb),
            _ => {
                log::error!("superblock disagrees with the compiled-in layout: {sb:?}");
                Err(Error::CorruptVolume)
            }
        }
    }

    pub fn store(&self, dev: &dyn BlockDevice) -> Result<()> {
        let mut block: DataBlock = [0; BLOCK_SIZE];
        let fields = [
            MAGIC,
            self.bitmap_start.get() as u32,
            self.table_start.get() as u32,
            self.dir_start.get() as u32,
            self.data_start.get() as u32,
            self.total_blocks as u32,
            self.data_blocks as u32,
        ];
        for (raw, field) in block.chunks_exact_mut(4).zip(fields) {
            raw.copy_from_slice(&field.to_le_bytes());
        }
        dev.write_block(Self::ID.get(), &block)?;
        Ok(())
    }

    /// 数据块在设备上的绝对块号
    #[inline]
    pub fn data_block(&self, id: crate::DataBlockId) -> BlockId {
        self.data_start + id.index()
    }
}
