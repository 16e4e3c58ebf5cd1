//! 文件系统对外交换的数据类型：错误、属性与目录项。
//!
//! 内核文件系统适配层只通过这些类型与存储引擎打交道。

#![no_std]

extern crate alloc;

mod dirent;
mod error;
mod stat;

pub use self::{
    dirent::{DirEntry, DirEntryType},
    error::{errno, Error},
    stat::{FsStat, Permission, Stat},
};
