//! # flat-fs
//!
//! 单卷、单目录的块链文件系统存储引擎。
//!
//! 卷的布局：
//! 超级块 | 空闲块位图 | 块分配表 | 目录表 | 数据区
//!
//! 每个文件的内容是数据区中的一条块链，块链经由块分配表串联，
//! 目录表记录链首。引擎把字节范围的读写翻译成对块设备的逐块读写。

#![no_std]

extern crate alloc;

/* flat-fs 的整体架构，自上而下 */

// 文件操作层：面向适配层的命名空间操作、读写与伸缩
mod control;
mod io;
mod namespace;
mod resize;

// 打开文件表：每个句柄缓存一个数据块
mod handle;

// 磁盘数据结构层
pub mod volume;

mod block;
mod link;
mod options;
mod path;

pub use self::{
    block::BlockId,
    control::FlatFileSystem,
    handle::FileHandle,
    link::{DataBlockId, Link},
    options::{AtimePolicy, Clock, MountOptions},
};
pub use vfs::{DirEntry, DirEntryType, Error, FsStat, Permission, Stat};

pub const MAGIC: u32 = 0x464c_4653;
pub const BLOCK_SIZE: usize = 512;
/// 文件名的最大字节数
pub const NAME_MAX_LEN: usize = 255;
/// 目录表的槽位数
pub const DIR_ENTRIES: usize = 64;
/// 同时打开的句柄上限
pub const MAX_OPEN_FILES: usize = 64;
/// 块分配表与位图能描述的数据块上限
pub const DATA_BLOCKS_CAP: usize = 65536;

pub type Result<T> = core::result::Result<T, Error>;

type DataBlock = [u8; BLOCK_SIZE];
