//! The log sink installs a process-wide subscriber, so it gets its own test
//! binary.

use tempfile::TempDir;

use github_mda::logging;

#[test]
fn log_lines_are_timestamped_named_and_leveled() {
    let dir = TempDir::new().unwrap();
    let log_file = dir.path().join("logs/github_mda.log");

    let guard = logging::init(&log_file).unwrap();
    tracing::info!("Writing raw message");
    tracing::debug!("below the default level");
    drop(guard);

    let content = std::fs::read_to_string(&log_file).unwrap();
    let line = content
        .lines()
        .find(|l| l.contains("Writing raw message"))
        .expect("info line written");
    assert!(line.contains("INFO"));
    assert!(line.contains("log_file"));
    assert!(line.starts_with(|c: char| c.is_ascii_digit()));
    assert!(!content.contains("below the default level"));
}
