//! 目录表中的目录项
//!
//! 每项定长[`DirEntry::SIZE`]字节，名称以`\0`结尾并补齐，
//! 名称首字节为`\0`即为空槽。数值字段皆为小端序。
//!
//! | 偏移 | 长度 | 字段 |
//! |-----:|-----:|------|
//! |    0 |  256 | name |
//! |  256 |    8 | size |
//! |  264 |    4 | uid  |
//! |  268 |    4 | gid  |
//! |  272 |    4 | mode |
//! |  276 |    4 | head |
//! |  280 |    8 | atime |
//! |  288 |    8 | mtime |
//! |  296 |    8 | ctime |
//! |  304 |    1 | open |

use alloc::string::String;

use enumflags2::BitFlags;

use crate::{BLOCK_SIZE, DataBlockId, Error, NAME_MAX_LEN, Permission, Result};

const SIZE_OFFSET: usize = 256;
const UID_OFFSET: usize = 264;
const GID_OFFSET: usize = 268;
const MODE_OFFSET: usize = 272;
const HEAD_OFFSET: usize = 276;
const ATIME_OFFSET: usize = 280;
const MTIME_OFFSET: usize = 288;
const CTIME_OFFSET: usize = 296;
const OPEN_OFFSET: usize = 304;

/// 没有数据块的文件的链首
const NO_HEAD: u32 = u32::MAX;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DirEntry {
    /// 空串表示空槽
    pub name: String,
    /// 文件的字节数
    pub size: u64,
    pub uid: u32,
    pub gid: u32,
    pub perm: BitFlags<Permission>,
    pub atime: i64,
    pub mtime: i64,
    pub ctime: i64,
    /// 块链的第一块
    pub head: Option<DataBlockId>,
    /// 是否有句柄打开着该文件
    pub open: bool,
}

impl DirEntry {
    pub const SIZE: usize = 320;

    #[inline]
    pub fn is_active(&self) -> bool {
        !self.name.is_empty()
    }

    /// 文件内容占据的块数
    #[inline]
    pub fn blocks(&self) -> usize {
        self.size.div_ceil(BLOCK_SIZE as u64) as usize
    }

    pub fn encode(&self, buf: &mut [u8]) {
        debug_assert_eq!(Self::SIZE, buf.len());
        debug_assert!(self.name.len() <= NAME_MAX_LEN);

        buf.fill(0);
        buf[..self.name.len()].copy_from_slice(self.name.as_bytes());
        buf[SIZE_OFFSET..UID_OFFSET].copy_from_slice(&self.size.to_le_bytes());
        buf[UID_OFFSET..GID_OFFSET].copy_from_slice(&self.uid.to_le_bytes());
        buf[GID_OFFSET..MODE_OFFSET].copy_from_slice(&self.gid.to_le_bytes());
        buf[MODE_OFFSET..HEAD_OFFSET].copy_from_slice(&self.perm.bits().to_le_bytes());
        let head = self.head.map_or(NO_HEAD, u32::from);
        buf[HEAD_OFFSET..ATIME_OFFSET].copy_from_slice(&head.to_le_bytes());
        buf[ATIME_OFFSET..MTIME_OFFSET].copy_from_slice(&self.atime.to_le_bytes());
        buf[MTIME_OFFSET..CTIME_OFFSET].copy_from_slice(&self.mtime.to_le_bytes());
        buf[CTIME_OFFSET..OPEN_OFFSET].copy_from_slice(&self.ctime.to_le_bytes());
        buf[OPEN_OFFSET] = self.open as u8;
    }

    /// 解码一个目录项，`data_blocks`为数据区块数。
    ///
    /// 空槽解码为[`DirEntry::default`]。
    pub fn decode(buf: &[u8], data_blocks: usize) -> Result<Self> {
        debug_assert_eq!(Self::SIZE, buf.len());

        if buf[0] == 0 {
            return Ok(Self::default());
        }

        let name_len = buf[..=NAME_MAX_LEN]
            .iter()
            .position(|&b| b == 0)
            .ok_or(Error::CorruptVolume)?;
        let name = core::str::from_utf8(&buf[..name_len]).map_err(|_| {
            log::error!("directory entry name is not UTF-8");
            Error::CorruptVolume
        })?;

        let head = match read_u32(buf, HEAD_OFFSET) {
            NO_HEAD => None,
            raw if (raw as usize) < data_blocks => Some(DataBlockId::new(raw)),
            raw => {
                log::error!("{name}: head block {raw} is outside the data region");
                return Err(Error::CorruptVolume);
            }
        };

        Ok(Self {
            name: name.into(),
            size: read_u64(buf, SIZE_OFFSET),
            uid: read_u32(buf, UID_OFFSET),
            gid: read_u32(buf, GID_OFFSET),
            perm: Permission::from_mode(read_u32(buf, MODE_OFFSET)),
            atime: read_u64(buf, ATIME_OFFSET) as i64,
            mtime: read_u64(buf, MTIME_OFFSET) as i64,
            ctime: read_u64(buf, CTIME_OFFSET) as i64,
            head,
            open: buf[OPEN_OFFSET] != 0,
        })
    }
}

fn read_u32(buf: &[u8], offset: usize) -> u32 {
    let mut raw = [0; 4];
    raw.copy_from_slice(&buf[offset..offset + 4]);
    u32::from_le_bytes(raw)
}

fn read_u64(buf: &[u8], offset: usize) -> u64 {
    let mut raw = [0; 8];
    raw.copy_from_slice(&buf[offset..offset + 8]);
    u64::from_le_bytes(raw)
}
