#![allow(dead_code)]

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicI64, AtomicUsize, Ordering};

use block_dev::{BlockDevice, DeviceError, RamDisk};
use flat_fs::{BLOCK_SIZE, Clock, FlatFileSystem, MountOptions};

/// 1024块的卷有455个数据块
pub const BLOCKS: usize = 1024;
/// 600块的卷只有31个数据块
pub const SMALL_BLOCKS: usize = 600;
/// 目录表的起始块
pub const DIR_START: usize = 529;
/// 数据区的起始块
pub const DATA_START: usize = 569;

/// 手动拨动的时钟
#[derive(Debug, Default)]
pub struct ManualClock(AtomicI64);

impl ManualClock {
    pub fn new(now: i64) -> Arc<Self> {
        Arc::new(Self(AtomicI64::new(now)))
    }

    pub fn set(&self, now: i64) {
        self.0.store(now, Ordering::Relaxed);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> i64 {
        self.0.load(Ordering::Relaxed)
    }
}

pub struct Volume {
    pub disk: Arc<RamDisk>,
    pub clock: Arc<ManualClock>,
    pub fs: FlatFileSystem,
}

impl Volume {
    pub fn format(blocks: usize) -> Self {
        Self::format_with(blocks, MountOptions::default())
    }

    pub fn format_with(blocks: usize, options: MountOptions) -> Self {
        let disk = Arc::new(RamDisk::new(BLOCK_SIZE, blocks));
        let clock = ManualClock::new(1_000);
        let fs = FlatFileSystem::format(disk.clone(), blocks, options, clock.clone()).unwrap();
        Self { disk, clock, fs }
    }

    /// 丢弃内存中的状态，从设备重新挂载。
    pub fn remount(self) -> Self {
        let Self { disk, clock, fs } = self;
        let options = fs.options().clone();
        drop(fs);
        let fs = FlatFileSystem::mount(disk.clone(), options, clock.clone()).unwrap();
        Self { disk, clock, fs }
    }

    /// 创建文件并写入全部内容
    pub fn put(&mut self, path: &str, data: &[u8]) {
        self.fs.create(path, 0o644).unwrap();
        let fh = self.fs.open(path).unwrap();
        assert_eq!(data.len(), self.fs.write(fh, 0, data).unwrap());
        self.fs.release(fh).unwrap();
    }

    /// 读出文件的全部内容
    pub fn get(&mut self, path: &str) -> Vec<u8> {
        let size = self.fs.getattr(path).unwrap().size as usize;
        let mut buf = vec![0; size];
        if size > 0 {
            let fh = self.fs.open(path).unwrap();
            assert_eq!(size, self.fs.read(fh, 0, &mut buf).unwrap());
            self.fs.release(fh).unwrap();
        }
        buf
    }

    pub fn raw_block(&self, block_id: usize) -> Vec<u8> {
        let mut buf = vec![0; BLOCK_SIZE];
        self.disk.read_block(block_id, &mut buf).unwrap();
        buf
    }
}

/// 从某块起写入报错的设备
#[derive(Debug)]
pub struct FaultyDisk {
    disk: RamDisk,
    fail_from: AtomicUsize,
    /// 报错前数据是否已落盘
    torn: AtomicBool,
}

impl FaultyDisk {
    pub fn new(blocks: usize) -> Arc<Self> {
        Arc::new(Self {
            disk: RamDisk::new(BLOCK_SIZE, blocks),
            fail_from: AtomicUsize::new(usize::MAX),
            torn: AtomicBool::new(false),
        })
    }

    /// 块号不小于`block_id`的写入都报错，`torn`时数据仍会写入。
    pub fn fail_from(&self, block_id: usize, torn: bool) {
        self.torn.store(torn, Ordering::Relaxed);
        self.fail_from.store(block_id, Ordering::Relaxed);
    }

    pub fn heal(&self) {
        self.fail_from.store(usize::MAX, Ordering::Relaxed);
    }
}

impl BlockDevice for FaultyDisk {
    fn read_block(&self, block_id: usize, buf: &mut [u8]) -> Result<(), DeviceError> {
        self.disk.read_block(block_id, buf)
    }

    fn write_block(&self, block_id: usize, buf: &[u8]) -> Result<(), DeviceError> {
        if block_id < self.fail_from.load(Ordering::Relaxed) {
            return self.disk.write_block(block_id, buf);
        }
        if self.torn.load(Ordering::Relaxed) {
            self.disk.write_block(block_id, buf)?;
        }
        Err(DeviceError::Io)
    }
}

/// 在`FaultyDisk`上格式化的卷
pub fn faulty_volume(blocks: usize) -> (Arc<FaultyDisk>, FlatFileSystem) {
    let disk = FaultyDisk::new(blocks);
    let fs = FlatFileSystem::format(
        disk.clone(),
        blocks,
        MountOptions::default(),
        ManualClock::new(1_000),
    )
    .unwrap();
    (disk, fs)
}

/// 不以块大小为周期的内容
pub fn pattern(len: usize) -> Vec<u8> {
    (0..len).map(|i| (i % 251) as u8).collect()
}
