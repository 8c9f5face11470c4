use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use tempfile::tempdir;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::filter::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::{fmt as tsfmt, registry};
use tree_rename::platform::open_log_file_secure_append;
use tree_rename::sink::REPORT_TARGET;
use tree_rename::{BufferSink, Engine, LogSink, MemoryFs, TeeSink, TracingSink};

/// A simple writer that appends written bytes into an in-memory Vec<u8>.
#[derive(Clone)]
struct BufferWriter(Arc<Mutex<Vec<u8>>>);

impl Write for BufferWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let mut guard = self.0.lock().unwrap();
        guard.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

fn captured(buf: &Arc<Mutex<Vec<u8>>>) -> String {
    let guard = buf.lock().unwrap();
    String::from_utf8_lossy(&guard[..]).to_string()
}

#[test]
fn tracing_sink_forwards_report_lines() {
    let buf = Arc::new(Mutex::new(Vec::new()));
    let make_writer = {
        let buf = buf.clone();
        move || BufferWriter(buf.clone())
    };
    let layer = tsfmt::layer()
        .with_writer(make_writer)
        .with_target(true)
        .with_ansi(false)
        .compact();
    let subscriber = registry().with(EnvFilter::new("info")).with(layer);

    // Scoped dispatcher: no global subscriber for other tests.
    let dispatch = tracing::Dispatch::new(subscriber);
    let fs = MemoryFs::new();
    fs.add_file("/root/lower.txt", "x");
    let mut sink = TeeSink::new(BufferSink::new(), TracingSink);
    tracing::dispatcher::with_default(&dispatch, || {
        Engine::new(&fs)
            .with_cancel_check(|| false)
            .run(std::path::Path::new("/root"), &mut sink)
            .unwrap();
    });

    let contents = captured(&buf);
    assert!(contents.contains(REPORT_TARGET), "contents={contents}");
    assert!(contents.contains("Planned operations: 1"), "contents={contents}");
    assert!(contents.contains("rename run finished"), "contents={contents}");
    assert!(sink.first.contains("Planned operations: 1"));
}

#[test]
fn closure_sink_collects_in_order() {
    let fs = MemoryFs::new();
    fs.add_file("/root/b.txt", "").add_file("/root/a.txt", "");
    let mut lines: Vec<String> = Vec::new();
    let mut sink = |l: &str| lines.push(l.to_string());
    Engine::new(&fs)
        .with_cancel_check(|| false)
        .run(std::path::Path::new("/root"), &mut sink)
        .unwrap();

    let checked: Vec<&String> = lines.iter().filter(|l| l.contains("Checking file")).collect();
    assert_eq!(checked, vec!["    - Checking file: a.txt", "    - Checking file: b.txt"]);
}

#[test]
fn file_logging_writes_to_custom_path_and_verifies_output() {
    let td = tempdir().expect("tempdir");
    let log_path: PathBuf = td.path().join("tree_rename_test.log");

    // The production logger refuses symlinked ancestors (common on macOS temp dirs).
    if tree_rename::path_has_symlink_ancestor(&log_path).unwrap() {
        eprintln!(
            "Skipping file logging test: path has symlink ancestor: {}",
            log_path.display()
        );
        return;
    }

    let file = open_log_file_secure_append(&log_path).expect("open_log_file_secure_append");
    let (writer, guard): (tracing_appender::non_blocking::NonBlocking, WorkerGuard) =
        tracing_appender::non_blocking(file);

    let file_layer = tsfmt::layer()
        .with_writer(move || writer.clone())
        .with_target(false)
        .with_ansi(false)
        .compact();
    let subscriber = registry().with(EnvFilter::new("info")).with(file_layer);
    let dispatch = tracing::Dispatch::new(subscriber);

    tracing::dispatcher::with_default(&dispatch, || {
        TracingSink.emit("file-logging-test: written");
    });

    // Drop the guard to flush the non-blocking worker
    drop(guard);

    let contents = std::fs::read_to_string(&log_path).expect("read log file");
    assert!(
        contents.contains("file-logging-test"),
        "log file did not contain expected text; contents={}",
        contents
    );
}
