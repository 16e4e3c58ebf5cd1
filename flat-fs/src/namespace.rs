//! # 命名空间操作
//!
//! 面向适配层的、以路径为参数的文件操作。
//! 只有根目录一层，路径解析见[`crate::path`]。

use alloc::string::String;
use alloc::vec::Vec;

use crate::path::{self, Target};
use crate::volume::dir_entry::DirEntry;
use crate::volume::super_block::DIR_BLOCKS;
use crate::{BLOCK_SIZE, DirEntryType, Error, FileHandle, FlatFileSystem, Permission, Result, Stat};

/// 根目录的inode编号，文件从2开始
const ROOT_INO: u64 = 1;

impl FlatFileSystem {
    /// 创建空文件。
    pub fn create(&mut self, path: &str, mode: u32) -> Result<Stat> {
        let name = match path::resolve(path)? {
            Target::Root => return Err(Error::AlreadyExists),
            Target::File(name) => name,
        };
        if self.dir.find_by_name(name).is_some() {
            return Err(Error::AlreadyExists);
        }

        let now = self.now();
        let slot = self.dir.insert(DirEntry {
            name: String::from(name),
            uid: self.options.uid,
            gid: self.options.gid,
            perm: Permission::from_mode(mode),
            atime: now,
            mtime: now,
            ctime: now,
            ..Default::default()
        })?;
        log::debug!("create {name} at slot {slot}");

        self.dir.sync(self.device.as_ref())?;
        Ok(self.file_stat(slot))
    }

    /// 删除文件并释放其块链。
    pub fn unlink(&mut self, path: &str) -> Result<()> {
        let slot = self.lookup(path)?;
        if self.dir.get(slot).open {
            return Err(Error::Busy);
        }

        self.remove(slot)?;
        self.sync()
    }

    /// 重命名文件，已存在的目标文件会被替换。
    pub fn rename(&mut self, from: &str, to: &str) -> Result<()> {
        let slot = self.lookup(from)?;
        let new_name = path::file_name(to)?;
        if self.dir.get(slot).open {
            return Err(Error::Busy);
        }
        if self.dir.get(slot).name == new_name {
            return Ok(());
        }

        if let Some(replaced) = self.dir.find_by_name(new_name) {
            if self.dir.get(replaced).open {
                return Err(Error::Busy);
            }
            log::debug!("rename replaces {new_name}");
            self.remove(replaced)?;
        }

        let now = self.now();
        self.dir.update(slot, |entry| {
            entry.name = String::from(new_name);
            entry.ctime = now;
        });
        self.sync()
    }

    pub fn chmod(&mut self, path: &str, mode: u32) -> Result<()> {
        let slot = self.lookup(path)?;
        if self.dir.get(slot).open {
            return Err(Error::Busy);
        }

        let now = self.now();
        self.dir.update(slot, |entry| {
            entry.perm = Permission::from_mode(mode);
            entry.ctime = now;
        });
        self.dir.sync(self.device.as_ref())
    }

    /// 修改属主与属组，`None`表示保持不变。
    pub fn chown(&mut self, path: &str, uid: Option<u32>, gid: Option<u32>) -> Result<()> {
        let slot = self.lookup(path)?;
        if self.dir.get(slot).open {
            return Err(Error::Busy);
        }

        let now = self.now();
        self.dir.update(slot, |entry| {
            entry.uid = uid.unwrap_or(entry.uid);
            entry.gid = gid.unwrap_or(entry.gid);
            entry.ctime = now;
        });
        self.dir.sync(self.device.as_ref())
    }

    /// 查询属性，[`AtimePolicy::OnAccess`]时会刷新`atime`。
    ///
    /// [`AtimePolicy::OnAccess`]: crate::AtimePolicy::OnAccess
    pub fn getattr(&mut self, path: &str) -> Result<Stat> {
        let name = match path::resolve(path)? {
            Target::Root => return Ok(self.root_stat()),
            Target::File(name) => name,
        };
        let slot = self.dir.find_by_name(name).ok_or(Error::NotFound)?;

        if self.options.atime.on_access() {
            self.touch(slot)?;
        }
        Ok(self.file_stat(slot))
    }

    /// 列出根目录，包括`.`与`..`。
    pub fn list(&self, path: &str) -> Result<Vec<crate::DirEntry>> {
        if let Target::File(name) = path::resolve(path)? {
            return match self.dir.find_by_name(name) {
                Some(_) => Err(Error::NotADirectory),
                None => Err(Error::NotFound),
            };
        }

        let dots = [".", ".."].map(|name| crate::DirEntry {
            inode: ROOT_INO,
            ty: DirEntryType::Directory,
            name: String::from(name),
        });
        let files = self.dir.iter().map(|(slot, entry)| crate::DirEntry {
            inode: Self::ino(slot),
            ty: DirEntryType::Regular,
            name: entry.name.clone(),
        });
        Ok(dots.into_iter().chain(files).collect())
    }

    /// 打开文件，返回新句柄。
    pub fn open(&mut self, path: &str) -> Result<FileHandle> {
        let slot = self.lookup(path)?;
        let fh = self.handles.open(slot)?;

        let now = self.now();
        let refresh = self.options.atime.on_open();
        self.dir.update(slot, |entry| {
            entry.open = true;
            if refresh {
                entry.atime = now;
            }
        });

        if let Err(e) = self.dir.sync(self.device.as_ref()) {
            // 句柄刚由`open`分配，释放必然成功
            drop(self.handles.release(fh));
            let open = self.handles.is_open(slot);
            self.dir.update(slot, |entry| entry.open = open);
            return Err(e);
        }
        log::debug!("open {} as {fh}", self.dir.get(slot).name);
        Ok(fh)
    }

    /// 释放句柄，最后一个句柄释放时清除打开标记。
    pub fn release(&mut self, fh: FileHandle) -> Result<()> {
        let file = self.handles.release(fh)?;
        if self.handles.is_open(file.slot) {
            return Ok(());
        }

        self.dir.update(file.slot, |entry| entry.open = false);
        self.dir.sync(self.device.as_ref())
    }

    /// 按路径改变文件大小，文件无需打开。
    pub fn truncate(&mut self, path: &str, size: u64) -> Result<()> {
        let slot = self.lookup(path)?;
        self.resize(slot, size)
    }

    /// 经由句柄改变文件大小。
    pub fn ftruncate(&mut self, fh: FileHandle, size: u64) -> Result<()> {
        let slot = self.handles.get(fh)?.slot;
        self.resize(slot, size)
    }

    /// 句柄所指文件的属性
    pub fn fstat(&self, fh: FileHandle) -> Result<Stat> {
        let slot = self.handles.get(fh)?.slot;
        Ok(self.file_stat(slot))
    }
}

impl FlatFileSystem {
    /// 路径对应的槽位，根目录报`IsADirectory`。
    fn lookup(&self, path: &str) -> Result<usize> {
        let name = path::file_name(path)?;
        self.dir.find_by_name(name).ok_or(Error::NotFound)
    }

    /// 释放块链并清空槽位，不写回。
    fn remove(&mut self, slot: usize) -> Result<()> {
        if let Some(head) = self.dir.get(slot).head {
            self.free_chain(head)?;
        }
        log::debug!("remove {} at slot {slot}", self.dir.get(slot).name);
        self.dir.clear(slot);
        Ok(())
    }

    /// 刷新`atime`并写回目录表。
    pub(crate) fn touch(&mut self, slot: usize) -> Result<()> {
        let now = self.now();
        self.dir.update(slot, |entry| entry.atime = now);
        self.dir.sync(self.device.as_ref())
    }

    #[inline]
    fn ino(slot: usize) -> u64 {
        slot as u64 + 2
    }

    fn file_stat(&self, slot: usize) -> Stat {
        let entry = self.dir.get(slot);
        Stat {
            ino: Self::ino(slot),
            kind: DirEntryType::Regular,
            perm: entry.perm,
            nlink: 1,
            uid: entry.uid,
            gid: entry.gid,
            size: entry.size,
            blocks: entry.blocks() as u64,
            block_size: BLOCK_SIZE as u64,
            atime: entry.atime,
            mtime: entry.mtime,
            ctime: entry.ctime,
        }
    }

    fn root_stat(&self) -> Stat {
        let now = self.now();
        Stat {
            ino: ROOT_INO,
            kind: DirEntryType::Directory,
            perm: Permission::from_mode(0o755),
            nlink: 2,
            uid: self.options.uid,
            gid: self.options.gid,
            size: (DIR_BLOCKS * BLOCK_SIZE) as u64,
            blocks: DIR_BLOCKS as u64,
            block_size: BLOCK_SIZE as u64,
            atime: now,
            mtime: now,
            ctime: now,
        }
    }
}
