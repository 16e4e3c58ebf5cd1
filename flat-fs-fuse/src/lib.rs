//! 宿主机一侧：镜像文件充当块设备，系统时间充当时钟。

mod block_file;
mod clock;

use std::io;
use std::path::Path;
use std::sync::Arc;

use flat_fs::{Clock, FlatFileSystem, MountOptions};

pub use self::{block_file::BlockFile, clock::SystemClock};

/// 挂载已有的镜像。
pub fn mount(path: &Path, options: MountOptions) -> io::Result<FlatFileSystem> {
    let file = BlockFile::open(path)?;
    log::info!("mount {}", path.display());
    FlatFileSystem::mount(Arc::new(file), options, Arc::new(SystemClock)).map_err(io::Error::other)
}

/// 挂载镜像；镜像不存在时以`size`字节新建并格式化。
pub fn open_or_format(path: &Path, size: u64, options: MountOptions) -> io::Result<FlatFileSystem> {
    match mount(path, options.clone()) {
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            let file = BlockFile::create(path, size)?;
            let blocks = file.blocks();
            log::info!("create {} with {blocks} blocks", path.display());
            let clock: Arc<dyn Clock> = Arc::new(SystemClock);
            FlatFileSystem::format(Arc::new(file), blocks, options, clock).map_err(io::Error::other)
        }
        result => result,
    }
}
