//! # 块链伸缩
//!
//! 文件大小改变时，块链按`ceil(size / BLOCK_SIZE)`增减。

use alloc::vec::Vec;
use core::cmp::Ordering;

use crate::{BLOCK_SIZE, DataBlockId, Error, FlatFileSystem, Result};

impl FlatFileSystem {
    /// 把槽位上文件的大小改为`new_size`，并写回所有元数据。
    ///
    /// 增长时，新增的字节读出为0。
    pub(crate) fn resize(&mut self, slot: usize, new_size: u64) -> Result<()> {
        let entry = self.dir.get(slot);
        let (old_size, old_blocks, head) = (entry.size, entry.blocks(), entry.head);
        let new_blocks =
            usize::try_from(new_size.div_ceil(BLOCK_SIZE as u64)).map_err(|_| Error::NoSpace)?;

        log::debug!(
            "{}: resize {old_size} -> {new_size} bytes ({old_blocks} -> {new_blocks} blocks)",
            entry.name
        );

        // 原末块尚在链上，先清零其尾部，失败时链与大小都未改动
        if let Some(head) = head.filter(|_| new_size > old_size) {
            self.zero_slack(head, old_size)?;
        }

        match new_blocks.cmp(&old_blocks) {
            Ordering::Greater => self.grow(slot, new_blocks - old_blocks)?,
            Ordering::Less => self.shrink(slot, new_blocks)?,
            Ordering::Equal => (),
        }

        let now = self.now();
        self.dir.update(slot, |entry| {
            entry.size = new_size;
            entry.mtime = now;
            entry.ctime = now;
        });
        self.sync()
    }

    /// 释放从`from`开始的整条链，并让缓存了这些块的句柄失效。
    pub(crate) fn free_chain(&mut self, from: DataBlockId) -> Result<()> {
        let freed = self.fat.release(from)?;
        log::debug!("free {} blocks from {from}", freed.len());
        for id in freed {
            self.bitmap.mark_free(id);
            self.handles.invalidate(id);
        }
        Ok(())
    }
}

impl FlatFileSystem {
    /// 在链尾追加`count`个清零的块。
    ///
    /// 空间不足或清零失败时不改变任何状态。
    fn grow(&mut self, slot: usize, count: usize) -> Result<()> {
        if count > self.bitmap.free_count() {
            log::debug!("need {count} blocks, {} free", self.bitmap.free_count());
            return Err(Error::NoSpace);
        }
        let tail = self
            .dir
            .get(slot)
            .head
            .map(|head| self.fat.last(head))
            .transpose()?;

        let mut added: Vec<DataBlockId> = Vec::with_capacity(count);
        let taken = (0..count).try_for_each(|_| -> Result<()> {
            let id = self.bitmap.find_free()?;
            self.bitmap.mark_used(id);
            added.push(id);
            Ok(())
        });
        if let Err(e) = taken.and_then(|()| self.zero_blocks(&added)) {
            log::debug!("grow failed, release {} blocks", added.len());
            for &id in &added {
                self.bitmap.mark_free(id);
            }
            return Err(e);
        }

        // 此后只改内存中的表，不会失败
        let (mut tail, rest) = match tail {
            Some(tail) => (tail, &added[..]),
            None => {
                let head = added[0];
                self.fat.start(head);
                self.dir.update(slot, |entry| entry.head = Some(head));
                (head, &added[1..])
            }
        };
        for &id in rest {
            self.fat.extend(tail, id);
            tail = id;
        }

        Ok(())
    }

    fn zero_blocks(&self, ids: &[DataBlockId]) -> Result<()> {
        let zero = [0u8; BLOCK_SIZE];
        for &id in ids {
            self.device.write_block(self.data_block(id).get(), &zero)?;
        }
        Ok(())
    }

    /// 只保留前`new_blocks`块。
    fn shrink(&mut self, slot: usize, new_blocks: usize) -> Result<()> {
        let head = self.dir.get(slot).head.ok_or(Error::CorruptChain)?;

        if new_blocks == 0 {
            self.free_chain(head)?;
            self.dir.update(slot, |entry| entry.head = None);
            return Ok(());
        }

        let tail = self.fat.follow(head, new_blocks - 1)?;
        if let Some(next) = self.fat.next(tail)? {
            self.free_chain(next)?;
            self.fat.truncate_after(tail);
        }
        Ok(())
    }

    /// 把原末块中`old_size`之后的字节清零。
    fn zero_slack(&mut self, head: DataBlockId, old_size: u64) -> Result<()> {
        let pos = (old_size % BLOCK_SIZE as u64) as usize;
        if pos == 0 {
            return Ok(());
        }

        let id = self.fat.follow(head, (old_size / BLOCK_SIZE as u64) as usize)?;
        let block = self.data_block(id);
        let mut data = [0u8; BLOCK_SIZE];
        self.device.read_block(block.get(), &mut data)?;
        data[pos..].fill(0);
        self.device.write_block(block.get(), &data)?;
        self.handles.invalidate(id);
        Ok(())
    }
}
