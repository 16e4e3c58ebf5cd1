use block_dev::DeviceError;
use derive_more::Display;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum Error {
    /// 名称没有对应的活动目录项
    #[display(fmt = "no such file")]
    NotFound,
    #[display(fmt = "file already exists")]
    AlreadyExists,
    #[display(fmt = "file name too long")]
    NameTooLong,
    /// 名称为空或含有`\0`
    #[display(fmt = "invalid file name")]
    InvalidName,
    #[display(fmt = "is a directory")]
    IsADirectory,
    #[display(fmt = "not a directory")]
    NotADirectory,
    /// 目录表没有空槽
    #[display(fmt = "directory table is full")]
    DirectoryFull,
    /// 对打开中的文件执行了被禁止的操作
    #[display(fmt = "file is open")]
    Busy,
    #[display(fmt = "too many open files")]
    TooManyOpenFiles,
    /// 句柄无效或已释放
    #[display(fmt = "file is not open")]
    NotOpen,
    /// 读取没有数据块的文件
    #[display(fmt = "file has no data")]
    NoData,
    /// 位图中已无空闲数据块
    #[display(fmt = "no space left on volume")]
    NoSpace,
    #[display(fmt = "volume too small")]
    VolumeTooSmall,
    #[display(fmt = "corrupted block chain")]
    CorruptChain,
    #[display(fmt = "corrupted volume")]
    CorruptVolume,
    #[display(fmt = "{}", _0)]
    Io(DeviceError),
}

impl core::error::Error for Error {}

impl From<DeviceError> for Error {
    fn from(err: DeviceError) -> Self {
        Self::Io(err)
    }
}

/// Linux上的错误码
pub mod errno {
    pub const ENOENT: i32 = 2;
    pub const EIO: i32 = 5;
    pub const EBADF: i32 = 9;
    pub const EACCES: i32 = 13;
    pub const EEXIST: i32 = 17;
    pub const ENOTDIR: i32 = 20;
    pub const EISDIR: i32 = 21;
    pub const EINVAL: i32 = 22;
    pub const EMFILE: i32 = 24;
    pub const ENOSPC: i32 = 28;
    pub const ENAMETOOLONG: i32 = 36;
}

impl Error {
    /// 适配层返回给内核的错误码（正值）。
    pub const fn errno(&self) -> i32 {
        match self {
            Self::NotFound => errno::ENOENT,
            Self::AlreadyExists => errno::EEXIST,
            Self::NameTooLong => errno::ENAMETOOLONG,
            Self::InvalidName => errno::EINVAL,
            Self::IsADirectory => errno::EISDIR,
            Self::NotADirectory => errno::ENOTDIR,
            Self::DirectoryFull => errno::ENOSPC,
            Self::Busy => errno::EACCES,
            Self::TooManyOpenFiles => errno::EMFILE,
            Self::NotOpen => errno::EBADF,
            Self::NoData => errno::EBADF,
            Self::NoSpace => errno::ENOSPC,
            Self::VolumeTooSmall => errno::EINVAL,
            Self::CorruptChain => errno::EIO,
            Self::CorruptVolume => errno::EIO,
            Self::Io(_) => errno::EIO,
        }
    }
}
