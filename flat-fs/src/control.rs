//! # 卷管理层
//!
//! 格式化、挂载与整卷的一致性检查。

use alloc::sync::Arc;
use alloc::vec;
use alloc::vec::Vec;
use core::fmt;

use block_dev::BlockDevice;

use crate::handle::HandleTable;
use crate::volume::bitmap::Bitmap;
use crate::volume::directory::DirTable;
use crate::volume::fat::AllocTable;
use crate::volume::region::Region;
use crate::volume::super_block::{BITMAP_BLOCKS, DIR_BLOCKS, SuperBlock, TABLE_BLOCKS};
use crate::{BLOCK_SIZE, BlockId, Clock, DIR_ENTRIES, DataBlockId, Error, FsStat, MountOptions};
use crate::{NAME_MAX_LEN, Result};

/// 文件系统引擎，独占块设备上的一个卷
///
/// 所有修改都经由`&mut self`，并在返回前写回设备。
pub struct FlatFileSystem {
    pub(crate) device: Arc<dyn BlockDevice>,
    pub(crate) clock: Arc<dyn Clock>,
    pub(crate) options: MountOptions,
    pub(crate) sb: SuperBlock,
    pub(crate) bitmap: Bitmap,
    pub(crate) fat: AllocTable,
    pub(crate) dir: DirTable,
    pub(crate) handles: HandleTable,
}

impl FlatFileSystem {
    /// 在设备的前`total_blocks`块上建立空卷。
    pub fn format(
        device: Arc<dyn BlockDevice>,
        total_blocks: usize,
        options: MountOptions,
        clock: Arc<dyn Clock>,
    ) -> Result<Self> {
        let sb = SuperBlock::layout(total_blocks)?;
        log::info!(
            "format {total_blocks} blocks, data region starts at {} with {} blocks",
            sb.data_start,
            sb.data_blocks
        );

        let bitmap = Bitmap::new(Region::filled(sb.bitmap_start, BITMAP_BLOCKS, 0), sb.data_blocks);
        // 0xFF_FF_FF_FF即空闲
        let fat = AllocTable::new(Region::filled(sb.table_start, TABLE_BLOCKS, 0xFF), sb.data_blocks);
        let dir = DirTable::new(Region::filled(sb.dir_start, DIR_BLOCKS, 0));

        sb.store(device.as_ref())?;
        let mut fs = Self {
            device,
            clock,
            options,
            sb,
            bitmap,
            fat,
            dir,
            handles: HandleTable::new(),
        };
        fs.sync()?;
        Ok(fs)
    }

    /// 挂载已有的卷。
    ///
    /// 上一个进程遗留的打开标记会被清除。
    pub fn mount(
        device: Arc<dyn BlockDevice>,
        options: MountOptions,
        clock: Arc<dyn Clock>,
    ) -> Result<Self> {
        let dev = device.as_ref();
        let sb = SuperBlock::load(dev)?;

        let bitmap = Bitmap::new(Region::load(dev, sb.bitmap_start, BITMAP_BLOCKS)?, sb.data_blocks);
        let fat = AllocTable::new(Region::load(dev, sb.table_start, TABLE_BLOCKS)?, sb.data_blocks);
        fat.validate()?;
        let dir = DirTable::load(Region::load(dev, sb.dir_start, DIR_BLOCKS)?, sb.data_blocks)?;
        log::info!(
            "mount volume of {} blocks, {} files",
            sb.total_blocks,
            DIR_ENTRIES - dir.free_slots()
        );

        let mut fs = Self {
            device,
            clock,
            options,
            sb,
            bitmap,
            fat,
            dir,
            handles: HandleTable::new(),
        };

        let stale: Vec<_> = fs
            .dir
            .iter()
            .filter(|(_, entry)| entry.open)
            .map(|(slot, _)| slot)
            .collect();
        for slot in stale {
            log::warn!("{}: clear stale open flag", fs.dir.get(slot).name);
            fs.dir.update(slot, |entry| entry.open = false);
        }
        fs.dir.sync(fs.device.as_ref())?;

        Ok(fs)
    }

    /// 把位图、块分配表与目录表的脏块写回设备。
    pub fn sync(&mut self) -> Result<()> {
        let dev = self.device.as_ref();
        self.bitmap.sync(dev)?;
        self.fat.sync(dev)?;
        self.dir.sync(dev)
    }

    pub fn stat_fs(&self) -> FsStat {
        FsStat {
            block_size: BLOCK_SIZE as u64,
            blocks: self.sb.data_blocks as u64,
            free_blocks: self.bitmap.free_count() as u64,
            files: DIR_ENTRIES as u64,
            free_files: self.dir.free_slots() as u64,
            name_max: NAME_MAX_LEN as u64,
        }
    }

    #[inline]
    pub fn options(&self) -> &MountOptions {
        &self.options
    }

    /// 检查目录表、块分配表与位图是否互相吻合。
    pub fn check(&self) -> Result<()> {
        // 每个数据块属于哪个槽位
        let mut owners: Vec<Option<usize>> = vec![None; self.sb.data_blocks];

        for (slot, entry) in self.dir.iter() {
            let Some(head) = entry.head else {
                if entry.size != 0 {
                    log::error!("{}: {} bytes without blocks", entry.name, entry.size);
                    return Err(Error::CorruptChain);
                }
                continue;
            };
            if entry.size == 0 {
                log::error!("{}: empty file owns block {head}", entry.name);
                return Err(Error::CorruptChain);
            }

            let mut len = 0;
            for id in self.fat.chain(head) {
                let id = id?;
                if let Some(other) = owners[id.index()].replace(slot) {
                    log::error!("block {id} is shared by slots {other} and {slot}");
                    return Err(Error::CorruptChain);
                }
                if !self.bitmap.is_used(id) {
                    log::error!("{}: block {id} is chained but free", entry.name);
                    return Err(Error::CorruptVolume);
                }
                len += 1;
            }

            if len != entry.blocks() {
                log::error!("{}: {len} blocks for {} bytes", entry.name, entry.size);
                return Err(Error::CorruptChain);
            }
        }

        match owners
            .iter()
            .enumerate()
            .map(|(index, owner)| (DataBlockId::new(index as u32), owner))
            .find(|(id, owner)| owner.is_none() && self.bitmap.is_used(*id))
        {
            Some((id, _)) => {
                log::error!("block {id} is used but unreachable");
                Err(Error::CorruptVolume)
            }
            None => Ok(()),
        }
    }
}

impl fmt::Debug for FlatFileSystem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FlatFileSystem")
            .field("options", &self.options)
            .field("sb", &self.sb)
            .field("open_files", &self.handles.in_use())
            .finish_non_exhaustive()
    }
}

impl FlatFileSystem {
    #[inline]
    pub(crate) fn now(&self) -> i64 {
        self.clock.now()
    }

    /// 数据块在设备上的块号
    #[inline]
    pub(crate) fn data_block(&self, id: DataBlockId) -> BlockId {
        self.sb.data_block(id)
    }
}
