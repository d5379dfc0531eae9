//! Diagnostic Output
//!
//! Compiler output of failed tasks is copied verbatim to a shared sink.
//! Workers report concurrently, so every report is written under a single
//! lock acquisition: reports may interleave with each other but never
//! inside one another.

use std::io::{self, Write};
use std::sync::Arc;

use parking_lot::Mutex;

/// Serialized writer for failure reports.
pub struct Diagnostics {
    sink: Mutex<Box<dyn Write + Send>>,
}

impl Diagnostics {
    pub fn new(sink: impl Write + Send + 'static) -> Self {
        Self {
            sink: Mutex::new(Box::new(sink)),
        }
    }

    /// Diagnostics that go to the process's standard error.
    #[must_use]
    pub fn stderr() -> Self {
        Self::new(io::stderr())
    }

    /// Diagnostics captured in memory, plus a handle to read them back.
    #[must_use]
    pub fn buffered() -> (Self, SharedBuffer) {
        let buffer = SharedBuffer::default();
        (Self::new(buffer.clone()), buffer)
    }

    /// Writes one complete message.
    pub fn message(&self, text: &str) {
        self.write_all(&[text.as_bytes()]);
    }

    /// Writes the captured compiler output of a failed task as one report:
    /// `headline`, then stdout in full, then stderr in full.
    pub fn compiler_output(&self, headline: &str, stdout: &[u8], stderr: &[u8]) {
        let mut parts: Vec<&[u8]> = vec![headline.as_bytes()];
        for stream in [stdout, stderr] {
            if !stream.is_empty() {
                parts.push(stream);
            }
        }
        self.write_all(&parts);
    }

    fn write_all(&self, parts: &[&[u8]]) {
        let mut sink = self.sink.lock();
        let result = parts
            .iter()
            .try_for_each(|part| {
                sink.write_all(part)?;
                if !part.ends_with(b"\n") {
                    sink.write_all(b"\n")?;
                }
                Ok::<(), io::Error>(())
            })
            .and_then(|()| sink.flush());

        if let Err(err) = result {
            log::warn!("Failed to write diagnostics: {err}");
        }
    }
}

impl Default for Diagnostics {
    fn default() -> Self {
        Self::stderr()
    }
}

/// In-memory sink whose contents can be read while the writer is alive.
#[derive(Clone, Default)]
pub struct SharedBuffer(Arc<Mutex<Vec<u8>>>);

impl SharedBuffer {
    /// Everything written so far, lossily decoded.
    #[must_use]
    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.lock()).into_owned()
    }
}

impl Write for SharedBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
