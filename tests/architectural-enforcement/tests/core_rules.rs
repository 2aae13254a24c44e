//! Rules for the interaction core library
//!
//! Run with:
//! ```bash
//! cargo test -p architectural-enforcement
//! ```

use architectural_enforcement::{core_source_dir, find_violations, report, rust_sources};

#[test]
fn test_core_sources_are_found() {
    let files = rust_sources(&core_source_dir());
    assert!(
        files.iter().any(|f| f.ends_with("registry.rs")),
        "interaction core sources not found under {}",
        core_source_dir().display()
    );
}

#[test]
fn test_no_sleep_in_core() {
    let violations = find_violations(&core_source_dir(), &["thread::sleep", "time::sleep("]);
    assert!(
        violations.is_empty(),
        "Library code must not sleep; timing belongs to the control loop:\n{}",
        report(&violations)
    );
}

#[test]
fn test_no_global_mutable_state_in_core() {
    let violations = find_violations(
        &core_source_dir(),
        &["static mut", "lazy_static!", "OnceLock<", "OnceCell<"],
    );
    assert!(
        violations.is_empty(),
        "The registry is owned by a session, not a global:\n{}",
        report(&violations)
    );
}

#[test]
fn test_no_unwrap_in_core() {
    let violations = find_violations(&core_source_dir(), &[".unwrap()", ".expect("]);
    assert!(
        violations.is_empty(),
        "Propagate errors instead of panicking:\n{}",
        report(&violations)
    );
}

#[test]
fn test_no_stdout_in_core() {
    let violations = find_violations(&core_source_dir(), &["println!", "eprintln!", "dbg!("]);
    assert!(
        violations.is_empty(),
        "Log through tracing:\n{}",
        report(&violations)
    );
}
