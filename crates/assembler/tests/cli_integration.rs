//! Integration tests for the accum CLI.

use accum_asm as _;
use accum_core as _;
use rstest as _;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use tracing as _;
use tracing_subscriber as _;

const REFERENCE_SOURCE: &str = "\
; Sum three bytes, negate, store.
        LOAD  ACC, [0x1000]
        ADD   ACC, [0x1001]
        ADD   ACC, [0x1002]
        XOR   ACC, #0xFF
        INC   ACC
        STORE ACC, [0x1003]
        HALT
";

const REFERENCE_BYTES: [u8; 16] = [
    0x08, 0x10, 0x00, 0xB7, 0x10, 0x01, 0xB7, 0x10, 0x02, 0xA6, 0xFF, 0xD4, 0x00, 0x10, 0x03,
    0x19,
];

fn binary_path() -> PathBuf {
    PathBuf::from(env!("CARGO_BIN_EXE_accum"))
}

fn create_temp_file(dir: &Path, name: &str, content: &str) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, content).unwrap();
    path
}

#[test]
fn build_reference_program() {
    let temp_dir = tempfile::tempdir().unwrap();
    let source = create_temp_file(temp_dir.path(), "sum.asm", REFERENCE_SOURCE);
    let output = temp_dir.path().join("sum-out.bin");

    let status = Command::new(binary_path())
        .args([
            "build",
            source.to_str().unwrap(),
            "-o",
            output.to_str().unwrap(),
        ])
        .status()
        .expect("failed to run accum");

    assert!(status.success());
    assert_eq!(fs::read(&output).unwrap(), REFERENCE_BYTES);
}

#[test]
fn build_with_default_output() {
    let temp_dir = tempfile::tempdir().unwrap();
    let source = create_temp_file(temp_dir.path(), "test.asm", "HALT\n");

    let expected_output = temp_dir.path().join("test.bin");

    let output = Command::new(binary_path())
        .args(["build", source.to_str().unwrap()])
        .current_dir(temp_dir.path())
        .output()
        .expect("failed to run accum");

    assert!(output.status.success());
    assert_eq!(fs::read(&expected_output).unwrap(), vec![0x19]);
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("(1 bytes)"));
}

#[test]
fn build_verbose_prints_listing() {
    let temp_dir = tempfile::tempdir().unwrap();
    let source = create_temp_file(temp_dir.path(), "sum.asm", REFERENCE_SOURCE);

    let output = Command::new(binary_path())
        .args(["build", source.to_str().unwrap(), "--verbose"])
        .output()
        .expect("failed to run accum");

    assert!(output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("0009: A6 FF"));
    assert!(stderr.contains("HALT"));
}

#[test]
fn run_reports_watched_memory() {
    let temp_dir = tempfile::tempdir().unwrap();
    let program = format!("{REFERENCE_SOURCE}\n        .org 0x1000\n        .byte 1, 2, 3\n");
    let source = create_temp_file(temp_dir.path(), "sum.asm", &program);

    let output = Command::new(binary_path())
        .args(["run", source.to_str().unwrap(), "--watch", "0x1003"])
        .output()
        .expect("failed to run accum");

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.starts_with(
        "Initial state\nACC: 0x00  IR: 0x00  MAR: 0x0000  PC: 0x00\nmemory[0x1003]: 0x00\n"
    ));
    assert!(stdout.contains("ACC: 0x06"));
    assert!(stdout.contains("halted at PC="));
    assert!(stdout.contains("after 6 steps"));
    assert!(stdout.contains("memory[0x1003]: 0xFA"));
}

#[test]
fn run_raw_binary_with_step_limit() {
    let temp_dir = tempfile::tempdir().unwrap();
    let image = temp_dir.path().join("loop.bin");
    // BRA 0x0000
    fs::write(&image, [0x10, 0x00, 0x00]).unwrap();

    let output = Command::new(binary_path())
        .args(["run", image.to_str().unwrap(), "--max-steps", "5"])
        .output()
        .expect("failed to run accum");

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("step limit reached after 5 steps"));
}

#[test]
fn run_fault_exits_with_failure() {
    let temp_dir = tempfile::tempdir().unwrap();
    let image = temp_dir.path().join("bad.bin");
    // STORE ACC, #0x12
    fs::write(&image, [0x01, 0x12]).unwrap();

    let output = Command::new(binary_path())
        .args(["run", image.to_str().unwrap()])
        .output()
        .expect("failed to run accum");

    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("execute fault at PC=0x0002"));
}

#[test]
fn disasm_output_reassembles_to_same_bytes() {
    let temp_dir = tempfile::tempdir().unwrap();
    let image = temp_dir.path().join("sum.bin");
    fs::write(&image, REFERENCE_BYTES).unwrap();

    let output = Command::new(binary_path())
        .args(["disasm", image.to_str().unwrap()])
        .output()
        .expect("failed to run accum");

    assert!(output.status.success());
    let listing = String::from_utf8_lossy(&output.stdout).to_string();
    assert!(listing.contains("XOR ACC, #0xFF"));

    let listing_path = create_temp_file(temp_dir.path(), "again.asm", &listing);
    let rebuilt = temp_dir.path().join("again-out.bin");
    let status = Command::new(binary_path())
        .args([
            "build",
            listing_path.to_str().unwrap(),
            "-o",
            rebuilt.to_str().unwrap(),
        ])
        .status()
        .expect("failed to run accum");

    assert!(status.success());
    assert_eq!(fs::read(&rebuilt).unwrap(), REFERENCE_BYTES);
}

#[test]
fn missing_command_is_usage_error() {
    let status = Command::new(binary_path())
        .status()
        .expect("failed to run accum");

    assert_eq!(status.code(), Some(2));
}

#[test]
fn assembly_error_reports_line() {
    let temp_dir = tempfile::tempdir().unwrap();
    let source = create_temp_file(temp_dir.path(), "bad.asm", "HALT\nFROB ACC\n");

    let output = Command::new(binary_path())
        .args(["build", source.to_str().unwrap()])
        .output()
        .expect("failed to run accum");

    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("line 2"));
}

#[test]
fn help_flag_prints_usage() {
    let output = Command::new(binary_path())
        .arg("--help")
        .output()
        .expect("failed to run accum");

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Usage: accum"));
}
