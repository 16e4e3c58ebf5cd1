use alloc::string::String;

/// 列目录时返回的目录项
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirEntry {
    /// Inode number
    pub inode: u64,
    pub ty: DirEntryType,
    pub name: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[repr(u8)]
pub enum DirEntryType {
    Directory,
    #[default]
    Regular,
}

impl DirEntryType {
    /// `st_mode`中的文件类型位
    pub const fn mode_bits(self) -> u32 {
        match self {
            Self::Directory => 0o040000,
            Self::Regular => 0o100000,
        }
    }
}
