//! Module implement common utility functions and types.

use std::{
    convert::TryInto,
    ffi, fs,
    ops::{Bound, RangeBounds},
    path,
};

use crate::{Error, Result};

#[macro_export]
macro_rules! check_remaining {
    ($buf:expr, $want:expr, $msg:expr) => {
        if $buf.len() < $want {
            err_at!(
                DecodeFail, msg: "insufficient input {}/{} ({})", $msg, $buf.len(), $want
            )
        } else {
            Ok(())
        }
    };
}

#[macro_export]
macro_rules! read_file {
    ($fd:expr, $seek:expr, $n:expr, $msg:expr) => {{
        use std::io::{Read, Seek};

        match $fd.seek($seek) {
            Ok(_) => {
                let mut buf = vec![0; $n as usize];
                match $fd.read(&mut buf) {
                    Ok(n) if buf.len() == n => Ok(buf),
                    Ok(n) => {
                        let m = buf.len();
                        err_at!(Fatal, msg: concat!($msg, " {}/{} at {:?}"), m, n, $seek)
                    }
                    Err(err) => err_at!(IoError, Err(err)),
                }
            }
            Err(err) => err_at!(IoError, Err(err)),
        }
    }};
}

#[macro_export]
macro_rules! write_file {
    ($fd:expr, $buffer:expr, $file:expr, $msg:expr) => {{
        use std::io::Write;

        match err_at!(IoError, $fd.write($buffer)) {
            Ok(n) if $buffer.len() == n => Ok(n),
            Ok(n) => err_at!(
                Fatal, msg: "partial-wr {}, {:?}, {}/{}", $msg, $file, $buffer.len(), n
            ),
            Err(err) => Err(err),
        }
    }};
}

/// Little-endian, fixed-width encode/decode helpers shared by the block and
/// node layouts (§6). Unlike a self-describing codec, callers are expected to
/// know the exact width they wrote; there is no length prefix.
pub fn u16_to_bytes(val: u16, buf: &mut Vec<u8>) {
    buf.extend_from_slice(&val.to_le_bytes());
}

pub fn u32_to_bytes(val: u32, buf: &mut Vec<u8>) {
    buf.extend_from_slice(&val.to_le_bytes());
}

pub fn u64_to_bytes(val: u64, buf: &mut Vec<u8>) {
    buf.extend_from_slice(&val.to_le_bytes());
}

pub fn i64_to_bytes(val: i64, buf: &mut Vec<u8>) {
    buf.extend_from_slice(&val.to_le_bytes());
}

pub fn bytes_to_u16(buf: &[u8]) -> Result<u16> {
    check_remaining!(buf, 2, "u16")?;
    Ok(u16::from_le_bytes(err_at!(FailConvert, buf[..2].try_into())?))
}

pub fn bytes_to_u32(buf: &[u8]) -> Result<u32> {
    check_remaining!(buf, 4, "u32")?;
    Ok(u32::from_le_bytes(err_at!(FailConvert, buf[..4].try_into())?))
}

pub fn bytes_to_u64(buf: &[u8]) -> Result<u64> {
    check_remaining!(buf, 8, "u64")?;
    Ok(u64::from_le_bytes(err_at!(FailConvert, buf[..8].try_into())?))
}

pub fn bytes_to_i64(buf: &[u8]) -> Result<i64> {
    check_remaining!(buf, 8, "i64")?;
    Ok(i64::from_le_bytes(err_at!(FailConvert, buf[..8].try_into())?))
}

// create a file in append mode for writing.
pub fn create_file_a(file: &ffi::OsStr) -> Result<fs::File> {
    let os_file = {
        let os_file = path::Path::new(file);
        fs::remove_file(os_file).ok(); // NOTE: ignore remove errors.
        os_file
    };

    {
        let parent = match os_file.parent() {
            Some(parent) => Ok(parent),
            None => err_at!(IoError, msg: "no parent for {:?}", file),
        }?;
        err_at!(IoError, fs::create_dir_all(parent))?;
    };

    let mut opts = fs::OpenOptions::new();
    opts.read(true).write(true).create_new(true);
    err_at!(IoError, opts.open(os_file))
}

// open existing file for reading and writing, at its current length.
pub fn open_file_w(file: &ffi::OsStr) -> Result<fs::File> {
    let os_file = path::Path::new(file);
    let mut opts = fs::OpenOptions::new();
    err_at!(IoError, opts.read(true).write(true).open(os_file))
}

// open file for reading.
pub fn open_file_r(file: &ffi::OsStr) -> Result<fs::File> {
    let os_file = path::Path::new(file);
    err_at!(IoError, fs::OpenOptions::new().read(true).open(os_file))
}

pub fn to_start_end<G, K>(within: G) -> (Bound<K>, Bound<K>)
where
    K: Clone,
    G: RangeBounds<K>,
{
    let start = match within.start_bound() {
        Bound::Included(val) => Bound::Included(val.clone()),
        Bound::Excluded(val) => Bound::Excluded(val.clone()),
        Bound::Unbounded => Bound::Unbounded,
    };
    let end = match within.end_bound() {
        Bound::Included(val) => Bound::Included(val.clone()),
        Bound::Excluded(val) => Bound::Excluded(val.clone()),
        Bound::Unbounded => Bound::Unbounded,
    };
    (start, end)
}

pub fn sync_write(file: &mut fs::File, data: &[u8]) -> Result<usize> {
    use std::io::Write;

    let n = err_at!(IoError, file.write(data))?;
    if n != data.len() {
        err_at!(IoError, msg: "partial write to file {} {}", n, data.len())?;
    }
    err_at!(IoError, file.sync_all())?;
    Ok(n)
}

#[cfg(test)]
#[path = "mod_test.rs"]
mod mod_test;
