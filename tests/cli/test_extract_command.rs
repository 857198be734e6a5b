// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1

//! `image-embed-cli <image-path>` tests
//!
//! Library-level tests use the model-free encoder; process-level tests run
//! the built binary and check that stdout holds exactly one JSON document.

use image_embed_node::{
    cli::{extract_path, parse_args, read_image, ParseExit},
    extractor::{ExtractError, ExtractorConfig},
};
use serde_json::Value;
use std::path::Path;
use std::process::{Command, Output};

use crate::common::{extractor, failing_state, jpeg_bytes, panic_once_extractor, png_bytes};

fn write_file(dir: &tempfile::TempDir, name: &str, bytes: &[u8]) -> std::path::PathBuf {
    let path = dir.path().join(name);
    std::fs::write(&path, bytes).unwrap();
    path
}

fn run_cli(dir: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_image-embed-cli"))
        .args(args)
        .current_dir(dir)
        .env_remove("MODEL_PATH")
        .env_remove("CHECK_EXTENSION")
        .env_remove("USE_GPU")
        .env_remove("RUST_LOG")
        .output()
        .expect("Failed to run image-embed-cli")
}

fn stdout_json(output: &Output) -> Value {
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert_eq!(stdout.lines().count(), 1, "stdout: {}", stdout);
    serde_json::from_str(stdout.trim()).expect("stdout is JSON")
}

#[test]
fn test_extract_file_success() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_file(&dir, "photo.jpg", &jpeg_bytes(300, 200, [50, 100, 150]));

    let output = extract_path(&extractor(ExtractorConfig::default()), &path);
    assert_eq!(output.exit_code, 0);

    let json: Value = serde_json::from_str(&output.body).unwrap();
    assert_eq!(json["features"].as_array().unwrap().len(), 3);
}

#[test]
fn test_extract_file_matches_http_semantics() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_file(&dir, "readme.txt", b"not an image at all");

    let output = extract_path(&extractor(ExtractorConfig::default()), &path);
    assert_eq!(output.exit_code, 1);
    let json: Value = serde_json::from_str(&output.body).unwrap();
    assert!(json["error"].as_str().unwrap().starts_with("Invalid image format"));
}

#[test]
fn test_extension_check_applies_to_paths() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_file(&dir, "image.webp", &png_bytes(8, 8, [1, 1, 1]));
    let extractor = extractor(ExtractorConfig {
        check_extension: true,
        ..Default::default()
    });

    let output = extract_path(&extractor, &path);
    assert_eq!(output.exit_code, 1);
    assert!(output.body.contains("Unsupported file type: 'webp'"));
}

#[test]
fn test_inference_failure_exit_code() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_file(&dir, "photo.png", &png_bytes(8, 8, [1, 1, 1]));

    let state = failing_state();
    let output = extract_path(&state.extractor, &path);
    assert_eq!(output.exit_code, 1);
    assert_eq!(output.body, r#"{"error":"Error processing image"}"#);
}

#[test]
fn test_panic_during_extraction_is_json_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_file(&dir, "photo.png", &png_bytes(8, 8, [1, 1, 1]));
    let extractor = panic_once_extractor();

    let output = extract_path(&extractor, &path);
    assert_eq!(output.exit_code, 1);
    assert_eq!(output.body, r#"{"error":"Error processing image"}"#);

    // The extractor is still usable afterwards
    assert_eq!(extract_path(&extractor, &path).exit_code, 0);
}

#[test]
fn test_directory_is_missing_input() {
    let dir = tempfile::tempdir().unwrap();
    assert_eq!(read_image(dir.path()).unwrap_err(), ExtractError::MissingInput);
}

#[test]
fn test_version_flag_is_not_an_error() {
    assert!(matches!(
        parse_args(["image-embed-cli", "--version"]),
        Err(ParseExit::Display(_))
    ));
}

#[test]
fn test_binary_without_arguments() {
    let dir = tempfile::tempdir().unwrap();
    let output = run_cli(dir.path(), &[]);

    assert_eq!(output.status.code(), Some(1));
    assert_eq!(
        stdout_json(&output),
        serde_json::json!({"error": "Usage: image-embed-cli <image-path>"})
    );
}

#[test]
fn test_binary_with_nonexistent_file() {
    let dir = tempfile::tempdir().unwrap();
    let output = run_cli(dir.path(), &["does-not-exist.jpg"]);

    assert_eq!(output.status.code(), Some(1));
    assert_eq!(stdout_json(&output)["error"], "No image file provided");
}

#[test]
fn test_binary_with_missing_model() {
    let dir = tempfile::tempdir().unwrap();
    write_file(&dir, "photo.jpg", &jpeg_bytes(16, 16, [10, 10, 10]));

    let output = run_cli(
        dir.path(),
        &["--model-path", "/nonexistent/model.onnx", "photo.jpg"],
    );

    assert_eq!(output.status.code(), Some(1));
    let json = stdout_json(&output);
    assert!(json["error"].as_str().unwrap().contains("not found"));
}

#[test]
fn test_binary_help_exits_zero() {
    let dir = tempfile::tempdir().unwrap();
    let output = run_cli(dir.path(), &["--help"]);

    assert!(output.status.success());
    assert!(String::from_utf8_lossy(&output.stdout).contains("image-embed-cli"));
}

#[test]
fn test_binary_accepts_boolish_env_flags() {
    let dir = tempfile::tempdir().unwrap();

    for (key, value) in [
        ("CHECK_EXTENSION", "1"),
        ("CHECK_EXTENSION", "yes"),
        ("USE_GPU", "on"),
        ("USE_GPU", "0"),
    ] {
        let output = Command::new(env!("CARGO_BIN_EXE_image-embed-cli"))
            .arg("does-not-exist.jpg")
            .current_dir(dir.path())
            .env_remove("MODEL_PATH")
            .env_remove("CHECK_EXTENSION")
            .env_remove("USE_GPU")
            .env(key, value)
            .output()
            .expect("Failed to run image-embed-cli");

        assert_eq!(output.status.code(), Some(1), "{}={}", key, value);
        assert_eq!(
            stdout_json(&output)["error"],
            "No image file provided",
            "{}={}",
            key,
            value
        );
    }
}

#[test]
fn test_binary_reports_bad_option_value() {
    let dir = tempfile::tempdir().unwrap();
    let output = run_cli(dir.path(), &["--layout", "hwc", "photo.jpg"]);

    assert_eq!(output.status.code(), Some(1));
    let message = stdout_json(&output)["error"].as_str().unwrap().to_string();
    assert!(message.contains("hwc"), "{}", message);
    assert!(!message.starts_with("Usage"), "{}", message);
}
