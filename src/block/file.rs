use fs2::FileExt;

use std::{
    convert::TryInto,
    ffi,
    io::{Read, Seek, SeekFrom, Write},
};

use crate::{
    block::{BlockId, Container},
    util, Error, Result,
};

const MAGIC: [u8; 4] = *b"MVB1";
const NIL_HEAD: u64 = u64::MAX;
// magic(4) + block_size(4) + free_head(8) + bitmap_len(8) + bitmap(N)
const SIDECAR_HEADER: usize = 4 + 4 + 8 + 8;

/// File-backed realization of [`Container`] (§4.1, §6). The data file is an
/// opaque stream of `block_size`-sized blocks; a sidecar file tracks the
/// free-block list head and an allocation bitmap so the data file itself
/// never needs scanning to find free space.
pub struct FileContainer {
    block_size: usize,
    data: std::fs::File,
    sidecar_loc: ffi::OsString,
    sidecar: std::fs::File,
    free_head: u64,
    bitmap: Vec<u8>,
    n_blocks: u64,
    closed: bool,
}

impl FileContainer {
    /// Create a new, empty file-backed container at `data_loc`, with its
    /// sidecar at `sidecar_loc`. Idempotent: calling this again on an
    /// existing pair re-opens rather than re-formats (§9 Open Questions).
    pub fn create(
        data_loc: &ffi::OsStr,
        sidecar_loc: &ffi::OsStr,
        block_size: usize,
    ) -> Result<FileContainer> {
        if std::path::Path::new(data_loc).exists() {
            return FileContainer::open(data_loc, sidecar_loc);
        }

        let data = util::create_file_a(data_loc)?;
        let sidecar = util::create_file_a(sidecar_loc)?;

        let mut fc = FileContainer {
            block_size,
            data,
            sidecar_loc: sidecar_loc.to_os_string(),
            sidecar,
            free_head: NIL_HEAD,
            bitmap: vec![],
            n_blocks: 0,
            closed: false,
        };
        fc.write_sidecar()?;
        Ok(fc)
    }

    /// Re-open an existing file-backed container, restoring free-list and
    /// bitmap state from the sidecar file.
    pub fn open(data_loc: &ffi::OsStr, sidecar_loc: &ffi::OsStr) -> Result<FileContainer> {
        let data = util::open_file_w(data_loc)?;
        let mut sidecar = util::open_file_w(sidecar_loc)?;

        err_at!(IoError, sidecar.seek(SeekFrom::Start(0)))?;
        let mut header = vec![0u8; SIDECAR_HEADER];
        err_at!(IoError, sidecar.read_exact(&mut header))?;

        if header[..4] != MAGIC {
            return err_at!(CorruptMetadata, msg: "bad sidecar magic for {:?}", sidecar_loc);
        }
        let block_size = util::bytes_to_u32(&header[4..8])? as usize;
        let free_head = util::bytes_to_u64(&header[8..16])?;
        let bitmap_len = util::bytes_to_u64(&header[16..24])? as usize;

        let mut bitmap = vec![0u8; bitmap_len];
        err_at!(IoError, sidecar.read_exact(&mut bitmap))?;
        let n_blocks = err_at!(IoError, data.metadata())?.len() / (block_size as u64).max(1);

        Ok(FileContainer {
            block_size,
            data,
            sidecar_loc: sidecar_loc.to_os_string(),
            sidecar,
            free_head,
            bitmap,
            n_blocks,
            closed: false,
        })
    }

    fn write_sidecar(&mut self) -> Result<()> {
        let mut buf = Vec::with_capacity(SIDECAR_HEADER + self.bitmap.len());
        buf.extend_from_slice(&MAGIC);
        util::u32_to_bytes(self.block_size as u32, &mut buf);
        util::u64_to_bytes(self.free_head, &mut buf);
        util::u64_to_bytes(self.bitmap.len() as u64, &mut buf);
        buf.extend_from_slice(&self.bitmap);

        err_at!(IoError, self.sidecar.lock_exclusive(), "lock sidecar {:?}", self.sidecar_loc)?;
        err_at!(IoError, self.sidecar.seek(SeekFrom::Start(0)))?;
        let res = write_file!(self.sidecar, &buf, &self.sidecar_loc, "flush sidecar");
        err_at!(IoError, self.sidecar.sync_all())?;
        err_at!(IoError, self.sidecar.unlock(), "unlock sidecar {:?}", self.sidecar_loc)?;
        res.map(|_| ())
    }

    fn mark(&mut self, id: BlockId, allocated: bool) {
        let idx = id as usize;
        let byte = idx / 8;
        if byte >= self.bitmap.len() {
            self.bitmap.resize(byte + 1, 0);
        }
        let bit = 1u8 << (idx % 8);
        if allocated {
            self.bitmap[byte] |= bit;
        } else {
            self.bitmap[byte] &= !bit;
        }
    }

    fn is_allocated(&self, id: BlockId) -> bool {
        let idx = id as usize;
        let byte = idx / 8;
        byte < self.bitmap.len() && (self.bitmap[byte] & (1u8 << (idx % 8))) != 0
    }

    fn seek_of(&self, id: BlockId) -> SeekFrom {
        SeekFrom::Start(id * self.block_size as u64)
    }
}

impl Container for FileContainer {
    fn block_size(&self) -> usize {
        self.block_size
    }

    fn allocate(&mut self) -> Result<BlockId> {
        let id = if self.free_head != NIL_HEAD {
            let id = self.free_head;
            let bytes = read_file!(self.data, self.seek_of(id), self.block_size, "read freelist")?;
            self.free_head = util::bytes_to_u64(&bytes)?;
            id
        } else {
            let id = self.n_blocks;
            self.n_blocks += 1;
            id
        };
        self.mark(id, true);
        let zeros = vec![0u8; self.block_size];
        err_at!(IoError, self.data.seek(self.seek_of(id)))?;
        write_file!(self.data, &zeros, "data", "allocate zero-fill")?;
        self.write_sidecar()?;
        Ok(id)
    }

    fn get(&mut self, id: BlockId) -> Result<Vec<u8>> {
        if !self.is_allocated(id) {
            return err_at!(NotFound, msg: "block {} not found", id);
        }
        read_file!(self.data, self.seek_of(id), self.block_size, "read block")
    }

    fn update(&mut self, id: BlockId, bytes: &[u8]) -> Result<()> {
        if !self.is_allocated(id) {
            return err_at!(NotFound, msg: "block {} not found", id);
        }
        if bytes.len() != self.block_size {
            return err_at!(
                Fatal, msg: "block size mismatch {} != {}", bytes.len(), self.block_size
            );
        }
        err_at!(IoError, self.data.seek(self.seek_of(id)))?;
        write_file!(self.data, bytes, "data", "update block")?;
        Ok(())
    }

    fn remove(&mut self, id: BlockId) -> Result<()> {
        if !self.is_allocated(id) {
            return err_at!(NotFound, msg: "block {} not found", id);
        }
        let mut next = self.free_head.to_le_bytes().to_vec();
        next.resize(self.block_size, 0);
        err_at!(IoError, self.data.seek(self.seek_of(id)))?;
        write_file!(self.data, &next, "data", "free block")?;

        self.free_head = id;
        self.mark(id, false);
        self.write_sidecar()
    }

    fn flush(&mut self) -> Result<()> {
        err_at!(IoError, self.data.sync_all())?;
        self.write_sidecar()
    }

    fn close(&mut self) -> Result<()> {
        if self.closed {
            return Ok(());
        }
        self.flush()?;
        self.closed = true;
        Ok(())
    }
}

#[cfg(test)]
#[path = "file_test.rs"]
mod file_test;
