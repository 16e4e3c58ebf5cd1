use alloc::vec;
use alloc::vec::Vec;

use spin::Mutex;

use crate::{BlockDevice, DeviceError};

/// 内存中的块设备，数据随进程消失。
#[derive(Debug)]
pub struct RamDisk {
    block_size: usize,
    data: Mutex<Vec<u8>>,
}

impl RamDisk {
    pub fn new(block_size: usize, blocks: usize) -> Self {
        Self {
            block_size,
            data: Mutex::new(vec![0; block_size * blocks]),
        }
    }

    #[inline]
    pub fn blocks(&self) -> usize {
        self.data.lock().len() / self.block_size
    }

    /// 拷贝出整个设备的内容
    pub fn snapshot(&self) -> Vec<u8> {
        self.data.lock().clone()
    }

    fn span(&self, block_id: usize, len: usize) -> Result<core::ops::Range<usize>, DeviceError> {
        if block_id >= self.blocks() {
            return Err(DeviceError::OutOfRange { block_id });
        }
        if len != self.block_size {
            return Err(DeviceError::ShortTransfer { block_id });
        }
        let start = block_id * self.block_size;
        Ok(start..start + self.block_size)
    }
}

impl BlockDevice for RamDisk {
    fn read_block(&self, block_id: usize, buf: &mut [u8]) -> Result<(), DeviceError> {
        let span = self.span(block_id, buf.len())?;
        buf.copy_from_slice(&self.data.lock()[span]);
        Ok(())
    }

    fn write_block(&self, block_id: usize, buf: &[u8]) -> Result<(), DeviceError> {
        let span = self.span(block_id, buf.len())?;
        self.data.lock()[span].copy_from_slice(buf);
        Ok(())
    }
}
