//! Tests for command-line argument handling

use std::process::Command;

/// Test that the application exposes its help text
#[test]
fn test_help_output() {
    let output = Command::new("cargo")
        .args(["run", "--", "--help"])
        .output()
        .expect("Failed to execute command");

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(
        stdout.contains("Best still-frame extraction"),
        "Expected about text in help, got stdout: {stdout}"
    );
    assert!(stdout.contains("--video"));
    assert!(stdout.contains("--strategy"));
}

/// Test that the video argument is required
#[test]
fn test_video_argument_is_required() {
    let output = Command::new("cargo")
        .args(["run", "--"])
        .output()
        .expect("Failed to execute command");

    assert!(!output.status.success(), "Expected failure without --video");

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(
        stderr.contains("--video"),
        "Expected missing-argument error, got stderr: {stderr}"
    );
}
