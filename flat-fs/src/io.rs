//! # 块链读写
//!
//! 把字节范围的读写拆成逐块的设备读写，首尾块可能只覆盖一部分。

use crate::{BLOCK_SIZE, Error, FileHandle, FlatFileSystem, Result};

impl FlatFileSystem {
    /// 从`offset`处读取至多`buf.len()`字节，返回实际读取的字节数。
    ///
    /// 读到文件末尾时返回的字节数变少，不算错误。
    pub fn read(&mut self, fh: FileHandle, offset: u64, buf: &mut [u8]) -> Result<usize> {
        let slot = self.handles.get(fh)?.slot;
        let entry = self.dir.get(slot);
        let head = entry.head.ok_or(Error::NoData)?;

        if offset >= entry.size || buf.is_empty() {
            return Ok(0);
        }
        let len = (entry.size - offset).min(buf.len() as u64) as usize;

        let mut id = self.fat.follow(head, (offset / BLOCK_SIZE as u64) as usize)?;
        let mut pos = (offset % BLOCK_SIZE as u64) as usize;
        let mut done = 0;
        loop {
            let block = self.sb.data_block(id);
            let data = self
                .handles
                .get_mut(fh)?
                .load(id, block, self.device.as_ref())?;

            let n = (BLOCK_SIZE - pos).min(len - done);
            buf[done..done + n].copy_from_slice(&data[pos..pos + n]);
            done += n;
            pos = 0;

            if done == len {
                break;
            }
            id = self.fat.next(id)?.ok_or(Error::CorruptChain)?;
        }

        if self.options.atime.on_access() {
            self.touch(slot)?;
        }
        Ok(len)
    }

    /// 把`data`写到`offset`处，必要时先扩展文件。
    ///
    /// 每个涉及的块都立即写入设备。
    pub fn write(&mut self, fh: FileHandle, offset: u64, data: &[u8]) -> Result<usize> {
        let slot = self.handles.get(fh)?.slot;
        if data.is_empty() {
            return Ok(0);
        }

        let end = offset
            .checked_add(data.len() as u64)
            .ok_or(Error::NoSpace)?;
        if end > self.dir.get(slot).size {
            self.resize(slot, end)?;
        }
        let head = self.dir.get(slot).head.ok_or(Error::CorruptChain)?;

        let mut id = self.fat.follow(head, (offset / BLOCK_SIZE as u64) as usize)?;
        let mut pos = (offset % BLOCK_SIZE as u64) as usize;
        let mut done = 0;
        loop {
            let n = (BLOCK_SIZE - pos).min(data.len() - done);
            let block = self.sb.data_block(id);

            let file = self.handles.get_mut(fh)?;
            let cached = if n == BLOCK_SIZE {
                file.overwrite(id)
            } else {
                file.load(id, block, self.device.as_ref())?
            };
            cached[pos..pos + n].copy_from_slice(&data[done..done + n]);

            log::trace!("write {n} bytes to block {block}");
            if let Err(e) = self.device.write_block(block.get(), &cached[..]) {
                // 设备上的内容已不确定，所有句柄都不能沿用
                self.handles.invalidate(id);
                return Err(e.into());
            }
            self.handles.invalidate_except(id, fh);

            done += n;
            pos = 0;
            if done == data.len() {
                break;
            }
            id = self.fat.next(id)?.ok_or(Error::CorruptChain)?;
        }

        let now = self.now();
        self.dir.update(slot, |entry| {
            entry.mtime = now;
            entry.ctime = now;
        });
        self.dir.sync(self.device.as_ref())?;
        Ok(data.len())
    }
}
