//! Builds driven by the real process environment.
//!
//! Kept in its own test binary: the test below modifies the environment of
//! the whole process.

mod helpers;

use std::ffi::OsStr;
use std::os::unix::ffi::OsStrExt;

use helpers::{RecordingExecutor, fake_source_package, utf8_path};
use rspbuilder::config::resolve;
use rspbuilder::env::ProcessEnv;
use rspbuilder::listener::{BuildListener, BuildResult, MemoryListener};
use rspbuilder::step::{BuildStep, PbuilderStep};
use rspbuilder::workspace::LocalWorkspace;
use tempfile::tempdir;

#[test]
fn test_non_utf8_variable_does_not_fail_the_build() {
    // SAFETY: this is the only test in this binary, so nothing else reads
    // or writes the environment concurrently.
    unsafe {
        std::env::set_var("RSPBUILDER_LATIN1", OsStr::from_bytes(b"caf\xe9"));
        std::env::set_var("RSPBUILDER_PLAIN", "ok");
    }

    let dir = tempdir().unwrap();
    let workspace = LocalWorkspace::new(utf8_path(&dir));
    let executor = RecordingExecutor::new().with_side_effect(fake_source_package(&["a_1-1.dsc"]));
    let listener = MemoryListener::new();
    let step = PbuilderStep::new(resolve("", "", ""));

    assert!(step.perform(&ProcessEnv, &workspace, &executor, &listener));
    assert_eq!(listener.result(), Some(BuildResult::Success), "{:?}", listener.lines());
    assert_eq!(
        executor.programs(),
        vec!["apt-get", "dpkg-source", "pbuilder", "pbuilder"]
    );

    for call in executor.calls() {
        let env = &call.spec.env;
        assert!(!env.contains_key("RSPBUILDER_LATIN1"));
        assert_eq!(env.get("RSPBUILDER_PLAIN").map(String::as_str), Some("ok"));
        assert_eq!(env.get("DEBIAN_FRONTEND").map(String::as_str), Some("noninteractive"));
    }
}
