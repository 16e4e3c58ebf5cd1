use std::cell::RefCell;
use std::fs::{File, OpenOptions};
use std::io::{self, Read, Seek, SeekFrom, Write};
use std::path::Path;

use block_dev::{BlockDevice, DeviceError};
use flat_fs::BLOCK_SIZE;
use send_wrapper::SendWrapper;

/// 以镜像文件为介质的块设备
///
/// 只能在创建它的线程上使用。
#[derive(Debug)]
pub struct BlockFile {
    inner: SendWrapper<RefCell<File>>,
    blocks: usize,
}

impl BlockFile {
    /// 打开已有的镜像，不足一块的尾部被忽略。
    pub fn open(path: &Path) -> io::Result<Self> {
        let fd = OpenOptions::new().read(true).write(true).open(path)?;
        let blocks = fd.metadata()?.len() as usize / BLOCK_SIZE;
        Ok(Self::new(fd, blocks))
    }

    /// 新建`size`字节的镜像，已有的同名文件会被清空。
    pub fn create(path: &Path, size: u64) -> io::Result<Self> {
        let fd = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(true)
            .open(path)?;
        fd.set_len(size)?;
        Ok(Self::new(fd, size as usize / BLOCK_SIZE))
    }

    #[inline]
    pub fn blocks(&self) -> usize {
        self.blocks
    }
}

impl BlockFile {
    fn new(fd: File, blocks: usize) -> Self {
        Self {
            inner: SendWrapper::new(RefCell::new(fd)),
            blocks,
        }
    }

    fn seek(&self, file: &mut File, block_id: usize, len: usize) -> Result<(), DeviceError> {
        if block_id >= self.blocks {
            return Err(DeviceError::OutOfRange { block_id });
        }
        if len != BLOCK_SIZE {
            return Err(DeviceError::ShortTransfer { block_id });
        }
        file.seek(SeekFrom::Start((block_id * BLOCK_SIZE) as u64))
            .map_err(|e| Self::io_error(block_id, &e))?;
        Ok(())
    }

    fn io_error(block_id: usize, e: &io::Error) -> DeviceError {
        log::error!("block {block_id}: {e}");
        match e.kind() {
            io::ErrorKind::UnexpectedEof | io::ErrorKind::WriteZero => {
                DeviceError::ShortTransfer { block_id }
            }
            _ => DeviceError::Io,
        }
    }
}

impl BlockDevice for BlockFile {
    fn read_block(&self, block_id: usize, buf: &mut [u8]) -> Result<(), DeviceError> {
        let mut file = self.inner.borrow_mut();
        self.seek(&mut file, block_id, buf.len())?;
        file.read_exact(buf)
            .map_err(|e| Self::io_error(block_id, &e))
    }

    fn write_block(&self, block_id: usize, buf: &[u8]) -> Result<(), DeviceError> {
        let mut file = self.inner.borrow_mut();
        self.seek(&mut file, block_id, buf.len())?;
        file.write_all(buf)
            .map_err(|e| Self::io_error(block_id, &e))
    }
}
