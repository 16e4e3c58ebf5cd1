mod common;

use block_dev::DeviceError;
use common::{BLOCKS, DATA_START, Volume, faulty_volume, pattern};
use flat_fs::{BLOCK_SIZE, Error};

#[test]
fn small_file() {
    let mut vol = Volume::format(BLOCKS);
    vol.fs.create("/a", 0o644).unwrap();
    let fh = vol.fs.open("/a").unwrap();

    assert_eq!(10, vol.fs.write(fh, 0, b"0123456789").unwrap());
    let mut buf = [0u8; 10];
    assert_eq!(10, vol.fs.read(fh, 0, &mut buf).unwrap());
    assert_eq!(b"0123456789", &buf);
    vol.fs.release(fh).unwrap();

    let stat = vol.fs.getattr("/a").unwrap();
    assert_eq!(10, stat.size);
    assert_eq!(1, stat.blocks);
}

#[test]
fn two_blocks() {
    let mut vol = Volume::format(BLOCKS);
    let data = pattern(1000);
    vol.put("/b", &data);

    assert_eq!(2, vol.fs.getattr("/b").unwrap().blocks);
    assert_eq!(data, vol.get("/b"));
    vol.fs.check().unwrap();
}

#[test]
fn write_past_end_of_empty_file() {
    let mut vol = Volume::format(BLOCKS);
    vol.fs.create("/sparse", 0o644).unwrap();
    let fh = vol.fs.open("/sparse").unwrap();

    let data = pattern(100);
    assert_eq!(100, vol.fs.write(fh, 2000, &data).unwrap());
    vol.fs.release(fh).unwrap();

    let stat = vol.fs.getattr("/sparse").unwrap();
    assert_eq!(2100, stat.size);
    assert_eq!(5, stat.blocks);

    let content = vol.get("/sparse");
    assert!(content[..2000].iter().all(|&b| b == 0));
    assert_eq!(data, content[2000..]);
    vol.fs.check().unwrap();
}

#[test]
fn unaligned_ranges() {
    let mut vol = Volume::format(BLOCKS);
    let data = pattern(4 * BLOCK_SIZE + 77);
    vol.put("/f", &data);

    let fh = vol.fs.open("/f").unwrap();
    for (offset, len) in [(0, 1), (511, 2), (300, 1500), (1024, 512), (2000, 125)] {
        let mut buf = vec![0; len];
        assert_eq!(len, vol.fs.read(fh, offset as u64, &mut buf).unwrap());
        assert_eq!(data[offset..offset + len], buf);
    }

    // 覆盖中间一段，不改变大小
    let patch = vec![0xEE; 700];
    vol.fs.write(fh, 400, &patch).unwrap();
    vol.fs.release(fh).unwrap();

    let mut expected = data.clone();
    expected[400..1100].copy_from_slice(&patch);
    assert_eq!(expected, vol.get("/f"));
    assert_eq!(data.len() as u64, vol.fs.getattr("/f").unwrap().size);
}

#[test]
fn short_read_at_end() {
    let mut vol = Volume::format(BLOCKS);
    vol.put("/f", &pattern(600));
    let fh = vol.fs.open("/f").unwrap();

    let mut buf = [0u8; 200];
    assert_eq!(100, vol.fs.read(fh, 500, &mut buf).unwrap());
    assert_eq!(pattern(600)[500..], buf[..100]);
    assert_eq!(0, vol.fs.read(fh, 600, &mut buf).unwrap());
    assert_eq!(0, vol.fs.read(fh, 10_000, &mut buf).unwrap());
}

#[test]
fn read_errors() {
    let mut vol = Volume::format(BLOCKS);
    vol.fs.create("/empty", 0o644).unwrap();
    let fh = vol.fs.open("/empty").unwrap();

    let mut buf = [0u8; 16];
    assert_eq!(Err(Error::NoData), vol.fs.read(fh, 0, &mut buf));
    assert_eq!(Ok(0), vol.fs.write(fh, 0, &[]));

    vol.fs.release(fh).unwrap();
    assert_eq!(Err(Error::NotOpen), vol.fs.read(fh, 0, &mut buf));
    assert_eq!(Err(Error::NotOpen), vol.fs.write(fh, 0, b"x"));
}

#[test]
fn handles_see_each_others_writes() {
    let mut vol = Volume::format(BLOCKS);
    vol.put("/f", &[b'a'; 100]);

    let reader = vol.fs.open("/f").unwrap();
    let writer = vol.fs.open("/f").unwrap();

    let mut buf = [0u8; 4];
    vol.fs.read(reader, 0, &mut buf).unwrap();
    assert_eq!(b"aaaa", &buf);

    vol.fs.write(writer, 1, b"bc").unwrap();
    vol.fs.read(reader, 0, &mut buf).unwrap();
    assert_eq!(b"abca", &buf);
}

#[test]
fn write_through() {
    let mut vol = Volume::format(BLOCKS);
    vol.fs.create("/f", 0o644).unwrap();
    let fh = vol.fs.open("/f").unwrap();
    vol.fs.write(fh, 0, b"persisted").unwrap();

    // 未释放句柄也已落盘；数据区第一块即块链首
    let data_start = vol.disk.blocks() - vol.fs.stat_fs().blocks as usize;
    assert_eq!(b"persisted", &vol.raw_block(data_start)[..9]);
}

#[test]
fn timestamps() {
    let mut vol = Volume::format(BLOCKS);
    vol.fs.create("/f", 0o644).unwrap();
    let fh = vol.fs.open("/f").unwrap();

    vol.clock.set(5_000);
    vol.fs.write(fh, 0, b"x").unwrap();
    let stat = vol.fs.fstat(fh).unwrap();
    assert_eq!(5_000, stat.mtime);
    assert_eq!(1_000, stat.atime);
}

#[test]
fn failed_write_drops_every_cached_copy() {
    let (disk, mut fs) = faulty_volume(BLOCKS);
    fs.create("/f", 0o644).unwrap();
    let writer = fs.open("/f").unwrap();
    fs.write(writer, 0, &[1; 100]).unwrap();

    let reader = fs.open("/f").unwrap();
    let mut buf = [0u8; 100];
    assert_eq!(100, fs.read(reader, 0, &mut buf).unwrap());

    // 数据已写入介质，设备却报错
    disk.fail_from(DATA_START, true);
    assert_eq!(Err(Error::Io(DeviceError::Io)), fs.write(writer, 0, &[2; 100]));
    disk.heal();

    assert_eq!(100, fs.read(reader, 0, &mut buf).unwrap());
    assert!(buf.iter().all(|&b| b == 2));
}
