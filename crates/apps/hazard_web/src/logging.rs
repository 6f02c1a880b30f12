//! `tracing` output routed to the browser console, one call per event at
//! the matching console level.

use std::io;

use tracing::{Level, Metadata};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::MakeWriter;

pub const DEFAULT_FILTER: &str = "info";

#[derive(Debug, Default, Copy, Clone)]
pub struct ConsoleMakeWriter;

/// Buffers one formatted event and hands it to the console on drop.
#[derive(Debug)]
pub struct ConsoleWriter {
    level: Level,
    buf: Vec<u8>,
}

impl ConsoleWriter {
    fn new(level: Level) -> Self {
        Self {
            level,
            buf: Vec::new(),
        }
    }
}

impl io::Write for ConsoleWriter {
    fn write(&mut self, bytes: &[u8]) -> io::Result<usize> {
        self.buf.extend_from_slice(bytes);
        Ok(bytes.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl Drop for ConsoleWriter {
    fn drop(&mut self) {
        if self.buf.is_empty() {
            return;
        }
        let line = String::from_utf8_lossy(&self.buf);
        emit(self.level, line.trim_end());
    }
}

impl<'a> MakeWriter<'a> for ConsoleMakeWriter {
    type Writer = ConsoleWriter;

    fn make_writer(&'a self) -> Self::Writer {
        ConsoleWriter::new(Level::INFO)
    }

    fn make_writer_for(&'a self, meta: &Metadata<'_>) -> Self::Writer {
        ConsoleWriter::new(*meta.level())
    }
}

#[cfg(target_arch = "wasm32")]
fn emit(level: Level, line: &str) {
    let msg = wasm_bindgen::JsValue::from_str(line);
    if level == Level::ERROR {
        web_sys::console::error_1(&msg);
    } else if level == Level::WARN {
        web_sys::console::warn_1(&msg);
    } else if level == Level::INFO {
        web_sys::console::info_1(&msg);
    } else {
        web_sys::console::debug_1(&msg);
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn emit(_level: Level, line: &str) {
    eprintln!("{line}");
}

/// Installs the global subscriber. Returns `false` if one was already set.
/// An unparsable filter falls back to [`DEFAULT_FILTER`].
pub fn init_logging(directives: &str) -> bool {
    let filter = EnvFilter::try_new(directives).unwrap_or_else(|e| {
        emit(Level::WARN, &format!("bad log filter {directives:?}: {e}"));
        EnvFilter::new(DEFAULT_FILTER)
    });
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(ConsoleMakeWriter)
        .with_ansi(false)
        .without_time()
        .try_init()
        .is_ok()
}

#[cfg(test)]
mod tests {
    use super::{ConsoleMakeWriter, init_logging};
    use std::io::Write;
    use tracing_subscriber::fmt::MakeWriter;

    #[test]
    fn writer_buffers_until_dropped() {
        let mut w = ConsoleMakeWriter.make_writer();
        assert_eq!(w.write(b"hello ").unwrap(), 6);
        w.write_all(b"world\n").unwrap();
        assert_eq!(w.buf, b"hello world\n");
    }

    #[test]
    fn installs_once() {
        assert!(init_logging("hazard_web=debug"));
        assert!(!init_logging(super::DEFAULT_FILTER));
        tracing::info!("logging ready");
    }
}
