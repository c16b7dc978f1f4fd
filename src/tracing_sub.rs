use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::Path;
use std::sync::{Arc, Mutex};

use tracing::Level;

use crate::log_buffer::{LogWriter, global_log};

pub struct DelegatingWriter {
    inner: DelegatingInner,
}

enum DelegatingInner {
    Buffer(LogWriter),
    File(Arc<Mutex<File>>),
    Stderr(io::Stderr),
}

impl DelegatingWriter {
    fn new(file: Option<&Arc<Mutex<File>>>) -> Self {
        let inner = match (file, global_log()) {
            (Some(file), _) => DelegatingInner::File(Arc::clone(file)),
            (None, Some(handle)) => DelegatingInner::Buffer(handle.writer()),
            (None, None) => DelegatingInner::Stderr(io::stderr()),
        };
        DelegatingWriter { inner }
    }
}

impl Write for DelegatingWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match &mut self.inner {
            DelegatingInner::Buffer(w) => w.write(buf),
            DelegatingInner::File(f) => f
                .lock()
                .map_err(|_| io::Error::other("log file lock poisoned"))?
                .write(buf),
            DelegatingInner::Stderr(s) => s.write(buf),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match &mut self.inner {
            DelegatingInner::Buffer(w) => w.flush(),
            DelegatingInner::File(f) => f
                .lock()
                .map_err(|_| io::Error::other("log file lock poisoned"))?
                .flush(),
            DelegatingInner::Stderr(s) => s.flush(),
        }
    }
}

impl Drop for DelegatingWriter {
    fn drop(&mut self) {
        let _ = self.flush();
    }
}

/// Routes formatted events to a log file when configured, else to the global
/// log buffer when one is installed, else to stderr.
#[derive(Clone, Debug, Default)]
pub struct SubscriberMakeWriter {
    file: Option<Arc<Mutex<File>>>,
}

impl SubscriberMakeWriter {
    pub fn with_file(file: File) -> Self {
        Self {
            file: Some(Arc::new(Mutex::new(file))),
        }
    }
}

impl<'a> tracing_subscriber::fmt::MakeWriter<'a> for SubscriberMakeWriter {
    type Writer = DelegatingWriter;

    fn make_writer(&'a self) -> Self::Writer {
        DelegatingWriter::new(self.file.as_ref())
    }
}

/// Opens `path` for appending, creating it if needed.
pub fn open_log_file(path: &Path) -> io::Result<File> {
    OpenOptions::new().create(true).append(true).open(path)
}

/// Installs the global subscriber. Safe to call more than once; later calls
/// leave the first subscriber in place.
pub fn init_default() {
    init_with_writer(SubscriberMakeWriter::default());
}

pub fn init_with_file(path: &Path) -> io::Result<()> {
    let file = open_log_file(path)?;
    init_with_writer(SubscriberMakeWriter::with_file(file));
    Ok(())
}

fn init_with_writer(writer: SubscriberMakeWriter) {
    let _ = tracing_subscriber::fmt()
        .with_max_level(Level::DEBUG)
        .with_writer(writer)
        .with_target(false)
        .with_thread_names(false)
        .with_ansi(false)
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Read;
    use tracing_subscriber::fmt::MakeWriter;

    #[test]
    fn log_file_is_appended() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("popup.log");
        {
            let mut f = open_log_file(&path).unwrap();
            writeln!(f, "one").unwrap();
        }
        {
            let mut f = open_log_file(&path).unwrap();
            writeln!(f, "two").unwrap();
        }
        let mut text = String::new();
        File::open(&path)
            .unwrap()
            .read_to_string(&mut text)
            .unwrap();
        assert_eq!(text, "one\ntwo\n");
    }

    #[test]
    fn file_writer_takes_precedence() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("events.log");
        let make = SubscriberMakeWriter::with_file(open_log_file(&path).unwrap());
        {
            let mut w = make.make_writer();
            w.write_all(b"popup opened\n").unwrap();
        }
        let text = std::fs::read_to_string(&path).unwrap();
        assert_eq!(text, "popup opened\n");
    }
}
