mod cli;

use std::fs;
use std::io::{self, Write};
use std::path::Path;

use clap::Parser;
use flat_fs::{DirEntryType, Error, FlatFileSystem, MountOptions};
use flat_fs_fuse::{mount, open_or_format};
use typed_bytesize::ByteSizeIec;

use self::cli::{Cli, Command};

/// 每次写入的字节数
const CHUNK: usize = 64 * 1024;

fn main() -> io::Result<()> {
    env_logger::init();

    let cli = Cli::parse();
    let options = MountOptions {
        uid: cli.uid,
        gid: cli.gid,
        ..Default::default()
    };

    match cli.command {
        Command::Pack { source, size_mib } => {
            let size = ByteSizeIec::mib(size_mib).0;
            let mut fs = open_or_format(&cli.image, size, options)?;
            pack(&mut fs, &source)?;
            fs.sync().map_err(io::Error::other)?;
        }
        Command::Ls => {
            let mut fs = mount(&cli.image, options)?;
            ls(&mut fs)?;
        }
        Command::Cat { name } => {
            let mut fs = mount(&cli.image, options)?;
            cat(&mut fs, &name)?;
        }
        Command::Rm { name } => {
            let mut fs = mount(&cli.image, options)?;
            fs.unlink(&format!("/{name}")).map_err(io::Error::other)?;
        }
    }

    Ok(())
}

fn pack(fs: &mut FlatFileSystem, source: &Path) -> io::Result<()> {
    for entry in fs::read_dir(source)? {
        let entry = entry?;
        if !entry.file_type()?.is_file() {
            continue;
        }
        let Some(name) = entry.file_name().to_str().map(str::to_owned) else {
            log::warn!("skip non UTF-8 name {:?}", entry.file_name());
            continue;
        };

        let data = fs::read(entry.path())?;
        log::info!("pack {name} ({} bytes)", data.len());

        let path = format!("/{name}");
        match fs.create(&path, 0o644) {
            Ok(_) => (),
            Err(Error::AlreadyExists) => fs.truncate(&path, 0).map_err(io::Error::other)?,
            Err(e) => return Err(io::Error::other(e)),
        }

        let fh = fs.open(&path).map_err(io::Error::other)?;
        let mut offset = 0;
        for chunk in data.chunks(CHUNK) {
            if let Err(e) = fs.write(fh, offset, chunk) {
                let _ = fs.release(fh);
                return Err(io::Error::other(e));
            }
            offset += chunk.len() as u64;
        }
        fs.release(fh).map_err(io::Error::other)?;
    }

    Ok(())
}

fn ls(fs: &mut FlatFileSystem) -> io::Result<()> {
    let entries = fs.list("/").map_err(io::Error::other)?;
    let mut stdout = io::stdout().lock();
    for entry in entries {
        if entry.ty == DirEntryType::Directory {
            continue;
        }
        let stat = fs
            .getattr(&format!("/{}", entry.name))
            .map_err(io::Error::other)?;
        writeln!(stdout, "{:o} {:>10} {}", stat.st_mode(), stat.size, entry.name)?;
    }

    let stat = fs.stat_fs();
    writeln!(stdout, "{}/{} blocks free", stat.free_blocks, stat.blocks)
}

fn cat(fs: &mut FlatFileSystem, name: &str) -> io::Result<()> {
    let path = format!("/{name}");
    let size = fs.getattr(&path).map_err(io::Error::other)?.size;
    let fh = fs.open(&path).map_err(io::Error::other)?;

    let mut stdout = io::stdout().lock();
    let mut buf = vec![0; CHUNK];
    let mut offset = 0;
    while offset < size {
        let n = match fs.read(fh, offset, &mut buf) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) => {
                let _ = fs.release(fh);
                return Err(io::Error::other(e));
            }
        };
        stdout.write_all(&buf[..n])?;
        offset += n as u64;
    }

    fs.release(fh).map_err(io::Error::other)
}
