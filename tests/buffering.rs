// Copyright 2024 FastLabs Developers
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use std::fs;
use std::path::Path;
use std::path::PathBuf;
use std::time::Duration;
use std::time::Instant;

use logflush::Logger;
use logflush::console::Testing;
use logflush::layout::LineLayout;
use tempfile::TempDir;

const DIVIDER: &str = "------------------------------------------------------------";

fn logger(capacity: i64, synchronous: bool) -> (Logger, Testing) {
    let console = Testing::default();
    let logger = logflush::builder()
        .buffer_capacity(capacity)
        .synchronous(synchronous)
        .layout(LineLayout::default().no_color())
        .console_writer(console.clone())
        .build()
        .unwrap();
    (logger, console)
}

fn sink(dir: &TempDir, name: &str) -> PathBuf {
    dir.path().join(name)
}

/// Lines written after the last session banner.
fn body(path: &Path) -> Vec<String> {
    let content = fs::read_to_string(path).unwrap();
    let start = content.rfind(DIVIDER).map(|i| i + DIVIDER.len() + 1).unwrap_or(0);
    content[start..].lines().map(str::to_string).collect()
}

fn assert_line(line: &str, level: &str, message: &str) {
    let suffix = format!(": {level}] {message}");
    assert!(line.starts_with('['), "unexpected line: {line}");
    assert!(line.ends_with(&suffix), "expected {suffix:?} in {line:?}");
}

#[test]
fn test_overflow_flushes_first_capacity_plus_one_lines() {
    let dir = TempDir::new().expect("failed to create a temporary directory");
    let path = sink(&dir, "overflow.log");
    let (logger, _) = logger(3, true);
    logger.pipe(&path).unwrap();

    for i in 1..=3 {
        logger.info(format!("line {i}")).unwrap();
    }
    assert!(body(&path).is_empty());
    assert_eq!(logger.pending(), 3);

    logger.info("line 4").unwrap();
    let lines = body(&path);
    assert_eq!(lines.len(), 4);
    for (i, line) in lines.iter().enumerate() {
        assert_line(line, "INFO", &format!("line {}", i + 1));
    }
    assert_eq!(logger.pending(), 0);

    logger.info("line 5").unwrap();
    assert_eq!(body(&path).len(), 4);
    assert_eq!(logger.pending(), 1);
}

#[test]
fn test_capacity_two_scenario() {
    let dir = TempDir::new().expect("failed to create a temporary directory");
    let path = sink(&dir, "two.log");
    let (logger, _) = logger(2, true);
    logger.pipe(&path).unwrap();

    logger.info("a").unwrap();
    logger.info("b").unwrap();
    assert!(body(&path).is_empty());

    logger.info("c").unwrap();
    let lines = body(&path);
    assert_eq!(lines.len(), 3);
    assert_line(&lines[0], "INFO", "a");
    assert_line(&lines[1], "INFO", "b");
    assert_line(&lines[2], "INFO", "c");
}

#[test]
fn test_zero_capacity_flushes_every_append() {
    let dir = TempDir::new().expect("failed to create a temporary directory");
    let path = sink(&dir, "zero.log");
    let (logger, _) = logger(0, true);
    assert_eq!(logger.config().buffer_capacity(), 0);
    logger.pipe(&path).unwrap();

    logger.info("one").unwrap();
    assert_eq!(body(&path).len(), 1);
    logger.info("two").unwrap();
    assert_eq!(body(&path).len(), 2);
}

#[test]
fn test_empty_flush_writes_nothing() {
    let dir = TempDir::new().expect("failed to create a temporary directory");
    let path = sink(&dir, "empty.log");
    let (logger, _) = logger(10, true);
    logger.pipe(&path).unwrap();
    let before = fs::read(&path).unwrap();

    logger.write_now().unwrap();
    logger.flush_sync().unwrap();
    assert_eq!(fs::read(&path).unwrap(), before);
}

#[test]
fn test_write_now_round_trip() {
    let dir = TempDir::new().expect("failed to create a temporary directory");
    let path = sink(&dir, "round.log");
    let (logger, _) = logger(100, true);
    logger.pipe(&path).unwrap();
    let before = fs::read_to_string(&path).unwrap();

    let messages = ["alpha", "beta", "gamma", "delta"];
    for message in messages {
        logger.file_info(message).unwrap();
    }
    logger.write_now().unwrap();

    let content = fs::read_to_string(&path).unwrap();
    let appended = &content[before.len()..];
    assert!(appended.ends_with('\n'));
    let lines: Vec<&str> = appended.lines().collect();
    assert_eq!(lines.len(), messages.len());
    for (line, message) in lines.iter().zip(messages) {
        assert_line(line, "INFO", message);
    }

    // a second sync flush adds nothing
    logger.flush_sync().unwrap();
    assert_eq!(fs::read_to_string(&path).unwrap(), content);
}

#[test]
fn test_interleaved_levels_keep_call_order() {
    let dir = TempDir::new().expect("failed to create a temporary directory");
    let path = sink(&dir, "order.log");
    let (logger, console) = logger(100, true);
    logger.pipe(&path).unwrap();

    logger.info("1").unwrap();
    logger.debug("2").unwrap();
    logger.info("3").unwrap();
    logger.warn("4").unwrap();
    logger.error("5").unwrap();
    logger.debug("6").unwrap();
    logger.write_now().unwrap();

    let expected = [
        ("INFO", "1"),
        ("DEBUG", "2"),
        ("INFO", "3"),
        ("WARN", "4"),
        ("ERROR", "5"),
        ("DEBUG", "6"),
    ];
    let lines = body(&path);
    assert_eq!(lines.len(), expected.len());
    for (line, (level, message)) in lines.iter().zip(expected) {
        assert_line(line, level, message);
    }
    assert_eq!(console.lines().len(), expected.len());
}

#[test]
fn test_two_sinks_receive_banners_and_lines() {
    let dir = TempDir::new().expect("failed to create a temporary directory");
    let x = sink(&dir, "x.log");
    let y = sink(&dir, "y.log");
    let (logger, _) = logger(100, true);

    logger.pipe(&x).unwrap();
    logger.pipe(&y).unwrap();
    assert_eq!(logger.sinks(), vec![x.clone(), y.clone()]);

    logger.info("hi").unwrap();
    logger.write_now().unwrap();

    for path in [&x, &y] {
        let content = fs::read_to_string(path).unwrap();
        assert!(content.starts_with(&format!("\n\n{DIVIDER}\n")));
        assert!(content.contains("new session started"));
        assert!(content.contains(&format!("log file: {}", path.display())));
        let lines = body(path);
        assert_eq!(lines.len(), 1);
        assert_line(&lines[0], "INFO", "hi");
    }
}

#[test]
fn test_throw_writes_error_and_stack() {
    let dir = TempDir::new().expect("failed to create a temporary directory");
    let path = sink(&dir, "throw.log");
    let console = Testing::default();
    let logger = logflush::builder()
        .console(false)
        .console_writer(console.clone())
        .build()
        .unwrap();
    logger.pipe(&path).unwrap();

    let err = std::io::Error::other("boom");
    logger.throw(&err).unwrap();
    logger.write_now().unwrap();

    let content = fs::read_to_string(&path).unwrap();
    assert_eq!(content.matches(": ERROR] Error: boom\n").count(), 1);
    assert_eq!(content.matches(": ERRORSTACK] ").count(), 1);
    assert!(content.contains("stack backtrace:"));

    // echoed even though console output is off
    let errors = console.errors();
    assert_eq!(errors.len(), 1);
    assert!(errors[0].contains("boom"));
    assert!(console.lines().is_empty());
}

#[test]
fn test_immediate_writes_bypass_buffer() {
    let dir = TempDir::new().expect("failed to create a temporary directory");
    let path = sink(&dir, "print.log");
    let (logger, console) = logger(100, true);
    logger.pipe(&path).unwrap();

    logger.info("buffered").unwrap();
    logger.print(["hello", "world"]).unwrap();
    logger.printr(["raw", "line"]).unwrap();
    logger.printrf(["file", "only"]).unwrap();
    logger.exit_msg("bye").unwrap();

    let lines = body(&path);
    assert_eq!(lines.len(), 4);
    assert_line(&lines[0], "CONSOLE OUTPUT", "hello world");
    assert_eq!(lines[1], "raw line");
    assert_eq!(lines[2], "file only");
    assert_line(&lines[3], "EXIT", "bye");
    assert_eq!(logger.pending(), 1);

    let echoed = console.lines();
    assert_eq!(echoed.len(), 4);
    assert_line(&echoed[0], "INFO", "buffered");
    assert_line(&echoed[1], "CONSOLE OUTPUT", "hello world");
    assert_eq!(echoed[2], "raw line");
    assert_line(&echoed[3], "EXIT", "bye");
}

#[test]
fn test_context_loggers() {
    let dir = TempDir::new().expect("failed to create a temporary directory");
    let path = sink(&dir, "context.log");
    let (logger, console) = logger(100, true);
    logger.pipe(&path).unwrap();

    logger.in_context("db").info("connected").unwrap();
    logger.in_file_context("cache").info("warm").unwrap();
    logger.write_now().unwrap();

    let lines = body(&path);
    assert_eq!(lines.len(), 2);
    assert_line(&lines[0], "INFO", "[db] connected");
    assert_line(&lines[1], "INFO", "[cache] warm");

    let echoed = console.lines();
    assert_eq!(echoed.len(), 1);
    assert_line(&echoed[0], "INFO", "[db] connected");
}

#[test]
fn test_console_disabled_stays_quiet() {
    let dir = TempDir::new().expect("failed to create a temporary directory");
    let path = sink(&dir, "quiet.log");
    let console = Testing::default();
    let logger = logflush::builder()
        .console(false)
        .console_writer(console.clone())
        .build()
        .unwrap();
    logger.pipe(&path).unwrap();

    logger.info("x").unwrap();
    logger.print(["y"]).unwrap();
    assert!(console.lines().is_empty());
}

#[test]
fn test_failed_sync_flush_keeps_lines() {
    let dir = TempDir::new().expect("failed to create a temporary directory");
    let path = sink(&dir, "fail.log");
    let (logger, _) = logger(100, true);
    logger.pipe(&path).unwrap();

    logger.info("kept 1").unwrap();
    logger.info("kept 2").unwrap();

    // a directory in place of the sink makes every write fail
    fs::remove_file(&path).unwrap();
    fs::create_dir(&path).unwrap();
    let err = logger.write_now().unwrap_err();
    assert!(err.to_string().contains("failed to write to log sink"));
    assert_eq!(logger.pending(), 2);

    fs::remove_dir(&path).unwrap();
    logger.write_now().unwrap();
    let lines = body(&path);
    assert_eq!(lines.len(), 2);
    assert_line(&lines[0], "INFO", "kept 1");
    assert_line(&lines[1], "INFO", "kept 2");
    assert_eq!(logger.pending(), 0);
}

#[test]
fn test_partial_failure_does_not_duplicate() {
    let dir = TempDir::new().expect("failed to create a temporary directory");
    let healthy = sink(&dir, "healthy.log");
    let broken = sink(&dir, "broken.log");
    let (logger, _) = logger(100, true);
    logger.pipe(&healthy).unwrap();
    logger.pipe(&broken).unwrap();

    logger.info("one").unwrap();
    logger.info("two").unwrap();

    fs::remove_file(&broken).unwrap();
    fs::create_dir(&broken).unwrap();
    assert!(logger.write_now().is_err());
    assert_eq!(logger.pending(), 2);
    assert_eq!(body(&healthy).len(), 2);

    logger.info("three").unwrap();
    fs::remove_dir(&broken).unwrap();
    logger.write_now().unwrap();
    assert_eq!(logger.pending(), 0);

    for path in [&healthy, &broken] {
        let lines = body(path);
        assert_eq!(lines.len(), 3, "unexpected content in {}", path.display());
        assert_line(&lines[0], "INFO", "one");
        assert_line(&lines[1], "INFO", "two");
        assert_line(&lines[2], "INFO", "three");
    }
}

#[test]
fn test_asynchronous_mode() {
    let dir = TempDir::new().expect("failed to create a temporary directory");
    let path = sink(&dir, "async.log");
    let (logger, _) = logger(2, false);
    assert_eq!(logger.write_mode(), logflush::sink::WriteMode::NonBlocking);
    logger.pipe(&path).unwrap();

    for i in 0..7 {
        logger.info(i).unwrap();
    }
    logger.write_now().unwrap();
    assert_eq!(logger.pending(), 0);

    // waits for the background writes queued by overflow and write_now
    logger.flush_sync().unwrap();
    let lines = body(&path);
    assert_eq!(lines.len(), 7);
    for (i, line) in lines.iter().enumerate() {
        assert_line(line, "INFO", &i.to_string());
    }
}

#[test]
fn test_asynchronous_failures_are_swallowed() {
    let dir = TempDir::new().expect("failed to create a temporary directory");
    let path = sink(&dir, "async-fail.log");
    let (logger, _) = logger(100, false);
    logger.pipe(&path).unwrap();

    logger.info("lost").unwrap();
    fs::remove_file(&path).unwrap();
    fs::create_dir(&path).unwrap();

    logger.write_now().unwrap();
    assert_eq!(logger.pending(), 0);
    logger.flush_sync().unwrap();
}

#[test]
fn test_timer_flushes_periodically() {
    let dir = TempDir::new().expect("failed to create a temporary directory");
    let path = sink(&dir, "timer.log");
    let logger = logflush::builder()
        .console(false)
        .flush_interval(Duration::from_millis(20))
        .build()
        .unwrap();
    logger.pipe(&path).unwrap();
    logger.info("tick").unwrap();

    let deadline = Instant::now() + Duration::from_secs(10);
    while body(&path).is_empty() {
        assert!(Instant::now() < deadline, "timer never flushed");
        std::thread::sleep(Duration::from_millis(10));
    }
    let lines = body(&path);
    assert_eq!(lines.len(), 1);
    assert_line(&lines[0], "INFO", "tick");
}

#[test]
fn test_drop_flushes_pending_lines() {
    let dir = TempDir::new().expect("failed to create a temporary directory");
    let path = sink(&dir, "drop.log");
    {
        let (logger, _) = logger(100, false);
        logger.pipe(&path).unwrap();
        logger.info("last words").unwrap();
        let clone = logger.clone();
        drop(logger);
        assert_eq!(clone.pending(), 1);
    }
    let lines = body(&path);
    assert_eq!(lines.len(), 1);
    assert_line(&lines[0], "INFO", "last words");
}
