//! Stream copy helpers that borrow their scratch buffer from a [`BytePool`].

use crate::config::PoolOptions;
use crate::pool::BytePool;
use std::io::{self, ErrorKind, Read, Write};

pub const DEFAULT_COPY_IO_SIZE: usize = 16 * 1024;

pub struct CopyIoPool {
    pool: BytePool,
}

impl CopyIoPool {
    pub fn new(capacity: usize, buf_size: usize, options: &PoolOptions) -> Self {
        Self {
            pool: BytePool::new(capacity, buf_size, options),
        }
    }

    /// Copy `src` into `dst` until EOF. Returns the number of bytes copied.
    pub fn copy<R, W>(&self, dst: &mut W, src: &mut R) -> io::Result<u64>
    where
        R: Read + ?Sized,
        W: Write + ?Sized,
    {
        let mut r = self.pool.get_ref();
        let buf = match r.get_mut() {
            Some(buf) => buf,
            None => return Ok(0),
        };

        let mut written = 0u64;
        loop {
            let n = match src.read(buf) {
                Ok(0) => return Ok(written),
                Ok(n) => n,
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            };
            dst.write_all(&buf[..n])?;
            written += n as u64;
        }
    }

    /// Read `src` to EOF into a new vector.
    pub fn read_all<R: Read + ?Sized>(&self, src: &mut R) -> io::Result<Vec<u8>> {
        let mut r = self.pool.get_ref();
        let buf = match r.get_mut() {
            Some(buf) => buf,
            None => return Ok(Vec::new()),
        };

        let mut out = Vec::with_capacity(buf.len());
        loop {
            match src.read(buf) {
                Ok(0) => return Ok(out),
                Ok(n) => out.extend_from_slice(&buf[..n]),
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            }
        }
    }

    pub fn buf_size(&self) -> usize {
        self.pool.buf_size()
    }

    pub fn len(&self) -> usize {
        self.pool.len()
    }

    pub fn cap(&self) -> usize {
        self.pool.cap()
    }

    pub fn is_empty(&self) -> bool {
        self.pool.is_empty()
    }
}

/// One-shot copy with a 16 KiB scratch buffer.
pub fn copy<R, W>(dst: &mut W, src: &mut R) -> io::Result<u64>
where
    R: Read + ?Sized,
    W: Write + ?Sized,
{
    CopyIoPool::new(1, DEFAULT_COPY_IO_SIZE, &PoolOptions::default()).copy(dst, src)
}

/// One-shot read-to-end with a 16 KiB scratch buffer.
pub fn read_all<R: Read + ?Sized>(src: &mut R) -> io::Result<Vec<u8>> {
    CopyIoPool::new(1, DEFAULT_COPY_IO_SIZE, &PoolOptions::default()).read_all(src)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    /// Fails with `Interrupted` every other read.
    struct Flaky<R> {
        inner: R,
        interrupt: bool,
    }

    impl<R: Read> Read for Flaky<R> {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            self.interrupt = !self.interrupt;
            if self.interrupt {
                return Err(io::Error::new(ErrorKind::Interrupted, "interrupted"));
            }
            self.inner.read(buf)
        }
    }

    #[test]
    fn test_copy() {
        let pool = CopyIoPool::new(2, 16, &PoolOptions::default());
        let data: Vec<u8> = (0..100u8).collect();

        let mut out = Vec::new();
        let n = pool.copy(&mut out, &mut Cursor::new(&data)).unwrap();
        assert_eq!(n, 100);
        assert_eq!(out, data);
        assert_eq!(pool.len(), 1);
    }

    #[test]
    fn test_read_all_retries_interrupted() {
        let pool = CopyIoPool::new(1, 8, &PoolOptions::default());
        let mut src = Flaky {
            inner: Cursor::new(b"hello interrupted world".to_vec()),
            interrupt: false,
        };
        let out = pool.read_all(&mut src).unwrap();
        assert_eq!(out, b"hello interrupted world");
    }

    #[test]
    fn test_read_error_propagates() {
        struct Broken;
        impl Read for Broken {
            fn read(&mut self, _buf: &mut [u8]) -> io::Result<usize> {
                Err(io::Error::new(ErrorKind::BrokenPipe, "gone"))
            }
        }
        let err = read_all(&mut Broken).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::BrokenPipe);
    }

    #[test]
    fn test_free_functions() {
        let data = vec![7u8; 40_000];
        let mut out = Vec::new();
        assert_eq!(copy(&mut out, &mut data.as_slice()).unwrap(), 40_000);
        assert_eq!(read_all(&mut Cursor::new(&out)).unwrap().len(), 40_000);
    }
}
