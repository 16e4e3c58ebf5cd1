use enumflags2::{bitflags, BitFlags};

use crate::DirEntryType;

/// 文件属性，对应`getattr`的结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Stat {
    pub ino: u64,
    pub kind: DirEntryType,
    pub perm: BitFlags<Permission>,
    pub nlink: u32,
    pub uid: u32,
    pub gid: u32,
    /// File size
    pub size: u64,
    /// Occupying blocks
    pub blocks: u64,
    /// Optimal I/O block size
    pub block_size: u64,
    pub atime: i64,
    pub mtime: i64,
    pub ctime: i64,
}

impl Stat {
    /// 文件类型与权限位合成的`st_mode`
    #[inline]
    pub fn st_mode(&self) -> u32 {
        self.kind.mode_bits() | self.perm.bits()
    }
}

/// 权限位，即`st_mode`的低12位
#[bitflags]
#[repr(u32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Permission {
    OtherExec = 0o0001,
    OtherWrite = 0o0002,
    OtherRead = 0o0004,
    GroupExec = 0o0010,
    GroupWrite = 0o0020,
    GroupRead = 0o0040,
    OwnerExec = 0o0100,
    OwnerWrite = 0o0200,
    OwnerRead = 0o0400,
    Sticky = 0o1000,
    SetGid = 0o2000,
    SetUid = 0o4000,
}

impl Permission {
    /// 从`mode`中截取权限位，忽略文件类型位
    #[inline]
    pub fn from_mode(mode: u32) -> BitFlags<Self> {
        BitFlags::from_bits_truncate(mode)
    }
}

/// 卷的使用情况，对应`statfs`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FsStat {
    pub block_size: u64,
    /// 数据块总数
    pub blocks: u64,
    pub free_blocks: u64,
    /// 目录表容量
    pub files: u64,
    pub free_files: u64,
    pub name_max: u64,
}
