use crate::domain::ports::ArchiveSink;
use crate::utils::error::{ArchiverError, Result};
use std::collections::HashSet;
use std::io::{self, Cursor, Seek, Write};
use tokio::sync::mpsc;
use zip::write::{SimpleFileOptions, StreamWriter, ZipWriter};
use zip::CompressionMethod;

pub const DEFAULT_COMPRESSION_LEVEL: i64 = 9;

/// Bytes buffered before a chunk is handed to the receiver.
const CHUNK_SIZE: usize = 16 * 1024;

pub type ArchiveChunk = io::Result<Vec<u8>>;

/// `Write` half of a streamed archive. Bytes go out in chunks over an
/// unbounded channel; once the receiver is gone every write fails with
/// `BrokenPipe`, which stops the export at its next append.
pub struct ChunkSender {
    tx: mpsc::UnboundedSender<ArchiveChunk>,
    buffer: Vec<u8>,
}

impl ChunkSender {
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<ArchiveChunk>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let sender = Self {
            tx,
            buffer: Vec::with_capacity(CHUNK_SIZE),
        };
        (sender, rx)
    }

    /// A second handle on the channel, used to report a failure after the
    /// writer itself has been consumed.
    pub fn error_handle(&self) -> mpsc::UnboundedSender<ArchiveChunk> {
        self.tx.clone()
    }

    fn send_buffered(&mut self) -> io::Result<()> {
        if self.buffer.is_empty() {
            return Ok(());
        }
        let chunk = std::mem::replace(&mut self.buffer, Vec::with_capacity(CHUNK_SIZE));
        self.tx
            .send(Ok(chunk))
            .map_err(|_| io::Error::new(io::ErrorKind::BrokenPipe, "archive receiver closed"))
    }
}

impl Write for ChunkSender {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if self.tx.is_closed() {
            return Err(io::Error::new(
                io::ErrorKind::BrokenPipe,
                "archive receiver closed",
            ));
        }
        self.buffer.extend_from_slice(buf);
        if self.buffer.len() >= CHUNK_SIZE {
            self.send_buffered()?;
        }
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        self.send_buffered()
    }
}

fn file_options(compression_level: i64) -> SimpleFileOptions {
    SimpleFileOptions::default()
        .compression_method(CompressionMethod::Deflated)
        .compression_level(Some(compression_level))
}

/// Zip-backed [`ArchiveSink`]; rejects a second entry with the same name.
pub struct ZipArchiveWriter<W: Write + Seek> {
    zip: ZipWriter<W>,
    options: SimpleFileOptions,
    names: HashSet<String>,
}

impl ZipArchiveWriter<Cursor<Vec<u8>>> {
    pub fn in_memory(compression_level: i64) -> Self {
        Self::new(Cursor::new(Vec::new()), compression_level)
    }
}

impl<W: Write> ZipArchiveWriter<StreamWriter<W>> {
    /// Writes entries straight through to `inner`; sizes go into data
    /// descriptors since nothing already written is revisited.
    pub fn streaming(inner: W, compression_level: i64) -> Self {
        Self {
            zip: ZipWriter::new_stream(inner),
            options: file_options(compression_level),
            names: HashSet::new(),
        }
    }
}

impl<W: Write + Seek> ZipArchiveWriter<W> {
    pub fn new(inner: W, compression_level: i64) -> Self {
        Self {
            zip: ZipWriter::new(inner),
            options: file_options(compression_level),
            names: HashSet::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

impl<W: Write + Seek> ArchiveSink for ZipArchiveWriter<W> {
    type Output = W;

    fn append(&mut self, name: &str, contents: &str) -> Result<()> {
        if !self.names.insert(name.to_string()) {
            return Err(ArchiverError::DuplicateEntry {
                name: name.to_string(),
            });
        }

        tracing::debug!("Adding {} ({} bytes) to archive", name, contents.len());
        self.zip.start_file(name, self.options)?;
        self.zip.write_all(contents.as_bytes())?;
        Ok(())
    }

    fn finish(self) -> Result<W> {
        let mut inner = self.zip.finish()?;
        inner.flush()?;
        Ok(inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Read;

    fn entry_names(bytes: Vec<u8>) -> Vec<String> {
        let mut archive = zip::ZipArchive::new(Cursor::new(bytes)).unwrap();
        (0..archive.len())
            .map(|i| archive.by_index(i).unwrap().name().to_string())
            .collect()
    }

    #[test]
    fn test_entries_keep_append_order() {
        let mut writer = ZipArchiveWriter::in_memory(DEFAULT_COMPRESSION_LEVEL);
        writer.append("index.html", "<html>index</html>").unwrap();
        writer.append("ABC-2.html", "<html>2</html>").unwrap();
        writer.append("ABC-1.html", "<html>1</html>").unwrap();
        assert_eq!(writer.len(), 3);

        let bytes = writer.finish().unwrap().into_inner();
        assert_eq!(
            entry_names(bytes),
            vec!["index.html", "ABC-2.html", "ABC-1.html"]
        );
    }

    #[test]
    fn test_duplicate_entry_rejected() {
        let mut writer = ZipArchiveWriter::in_memory(DEFAULT_COMPRESSION_LEVEL);
        writer.append("ABC-1.html", "first").unwrap();

        let err = writer.append("ABC-1.html", "second").unwrap_err();
        assert!(matches!(err, ArchiverError::DuplicateEntry { .. }));

        let bytes = writer.finish().unwrap().into_inner();
        let mut archive = zip::ZipArchive::new(Cursor::new(bytes)).unwrap();
        assert_eq!(archive.len(), 1);

        let mut content = String::new();
        archive
            .by_name("ABC-1.html")
            .unwrap()
            .read_to_string(&mut content)
            .unwrap();
        assert_eq!(content, "first");
    }

    fn drain(rx: &mut mpsc::UnboundedReceiver<ArchiveChunk>) -> Vec<u8> {
        let mut bytes = Vec::new();
        while let Ok(chunk) = rx.try_recv() {
            bytes.extend(chunk.unwrap());
        }
        bytes
    }

    #[test]
    fn test_streamed_archive_is_readable() {
        let (sender, mut rx) = ChunkSender::channel();
        let mut writer = ZipArchiveWriter::streaming(sender, DEFAULT_COMPRESSION_LEVEL);
        writer.append("index.html", "<html>index</html>").unwrap();
        writer.append("ABC-1.html", &"<p>body</p>".repeat(4000)).unwrap();
        drop(writer.finish().unwrap());

        let bytes = drain(&mut rx);
        assert_eq!(entry_names(bytes.clone()), vec!["index.html", "ABC-1.html"]);

        let mut archive = zip::ZipArchive::new(Cursor::new(bytes)).unwrap();
        let mut content = String::new();
        archive
            .by_name("ABC-1.html")
            .unwrap()
            .read_to_string(&mut content)
            .unwrap();
        assert_eq!(content.len(), "<p>body</p>".len() * 4000);
    }

    #[test]
    fn test_large_entry_is_sent_before_finish() {
        let (sender, mut rx) = ChunkSender::channel();
        let mut writer = ZipArchiveWriter::streaming(sender, 1);
        // xorshift 產生的字母壓縮後仍超過一個 chunk
        let mut state = 0x2545_f491u32;
        let noisy: String = (0..40_000)
            .map(|_| {
                state ^= state << 13;
                state ^= state >> 17;
                state ^= state << 5;
                char::from(b'a' + (state % 26) as u8)
            })
            .collect();
        writer.append("ABC-1.html", &noisy).unwrap();
        writer.append("ABC-2.html", "<html>2</html>").unwrap();

        assert!(!drain(&mut rx).is_empty());
        writer.finish().unwrap();
    }

    #[test]
    fn test_closed_receiver_fails_the_archive() {
        let (sender, rx) = ChunkSender::channel();
        drop(rx);

        let mut writer = ZipArchiveWriter::streaming(sender, DEFAULT_COMPRESSION_LEVEL);
        let appended = writer.append("index.html", "<html>index</html>");
        let finished = appended.and_then(|_| writer.finish().map(|_| ()));
        assert!(finished.is_err());
    }

    #[test]
    fn test_error_handle_reaches_receiver() {
        let (sender, mut rx) = ChunkSender::channel();
        sender
            .error_handle()
            .send(Err(io::Error::other("export failed")))
            .unwrap();
        drop(sender);

        let chunk = rx.try_recv().unwrap();
        assert_eq!(chunk.unwrap_err().to_string(), "export failed");
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_empty_archive_is_valid_zip() {
        let writer = ZipArchiveWriter::in_memory(1);
        assert!(writer.is_empty());
        let bytes = writer.finish().unwrap().into_inner();
        assert!(entry_names(bytes).is_empty());
    }
}
