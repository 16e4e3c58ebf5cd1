//! 卷的布局
//!
//! 超级块 | 位图区 | 块分配表区 | 目录区 | 数据区
//!
//! 前四个区域的大小只由编译期常量决定，格式化时算出，之后永不改变。

pub mod bitmap;
pub mod dir_entry;
pub mod directory;
pub mod fat;
pub mod region;
pub mod super_block;
