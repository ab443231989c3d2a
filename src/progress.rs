//! Byte-count progress reporting for dump readers.
//!
//! [`ProgressReader`] sits between the file and any decompressor, so the
//! reported position is measured in compressed bytes and lines up with the
//! file size used as the progress bar total.

use std::io::Read;

pub struct ProgressReader<R: Read> {
    reader: R,
    callback: Box<dyn FnMut(u64)>,
    bytes_read: u64,
}

impl<R: Read> ProgressReader<R> {
    /// Wrap `reader`; `callback` receives the running byte total after every
    /// read that returned data.
    pub fn new<F>(reader: R, callback: F) -> Self
    where
        F: FnMut(u64) + 'static,
    {
        Self {
            reader,
            callback: Box::new(callback),
            bytes_read: 0,
        }
    }

    pub fn bytes_read(&self) -> u64 {
        self.bytes_read
    }
}

impl<R: Read> Read for ProgressReader<R> {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        let n = self.reader.read(buf)?;
        if n > 0 {
            self.bytes_read += n as u64;
            (self.callback)(self.bytes_read);
        }
        Ok(n)
    }
}
