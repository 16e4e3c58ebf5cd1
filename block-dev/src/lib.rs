//! # 块设备接口层
//!
//! 块设备是以**块**为单位存储数据的设备，例如磁盘、镜像文件等；
//! [`BlockDevice`] 就是对读写块设备的抽象，
//! 实现了此特质的类型称为**块设备驱动**。
//!
//! 块的大小由文件系统决定，驱动只负责按块编号搬运数据。

#![no_std]

extern crate alloc;

mod ram_disk;

use core::any::Any;
use core::fmt;

pub use self::ram_disk::RamDisk;

/// 块设备驱动特质
///
/// `buf`的长度恒为一个块的大小。
pub trait BlockDevice: Send + Sync + Any {
    fn read_block(&self, block_id: usize, buf: &mut [u8]) -> Result<(), DeviceError>;
    fn write_block(&self, block_id: usize, buf: &[u8]) -> Result<(), DeviceError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceError {
    /// 块编号超出设备容量
    OutOfRange { block_id: usize },
    /// 读写的字节数不足一个块
    ShortTransfer { block_id: usize },
    /// 底层介质报错
    Io,
}

impl fmt::Display for DeviceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::OutOfRange { block_id } => write!(f, "block {block_id} is out of range"),
            Self::ShortTransfer { block_id } => write!(f, "incomplete transfer of block {block_id}"),
            Self::Io => f.write_str("device I/O failure"),
        }
    }
}

impl core::error::Error for DeviceError {}
