//! Cassette replay integration tests, zero network I/O.
//!
//! All tests set `KREA_REPLAY` to a cassette file so the binary never
//! contacts the live API, and `KREA_OUTPUT_DIR` to a scratch directory.

use std::path::{Path, PathBuf};

use assert_cmd::Command;
use predicates::prelude::*;

fn fixtures_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("test_fixtures")
}

/// A fresh output directory for one test.
fn output_dir(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("krea_test_{name}"));
    let _ = std::fs::remove_dir_all(&dir);
    dir
}

fn cmd(cassette: &Path, output: &Path) -> Command {
    let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("krea");
    cmd.env("KREA_REPLAY", cassette.to_str().unwrap())
        .env("KREA_OUTPUT_DIR", output.to_str().unwrap())
        .env("KREA_CONFIG", "/nonexistent/krea/config.toml")
        .env_remove("KREA_API_KEY")
        .env_remove("KREA_REC")
        .env_remove("FTP_HOST")
        .env_remove("FTP_USER")
        .env_remove("FTP_PASS")
        .env_remove("FTP_PUBLIC_URL")
        .env_remove("FTP_PORT")
        .arg("--no-open");
    cmd
}

fn log_lines(output: &Path) -> Vec<serde_json::Value> {
    match std::fs::read_to_string(output.join("generation_log.jsonl")) {
        Ok(content) => content.lines().map(|l| serde_json::from_str(l).unwrap()).collect(),
        Err(_) => Vec::new(),
    }
}

fn saved_images(output: &Path) -> Vec<PathBuf> {
    let Ok(days) = std::fs::read_dir(output.join("images")) else {
        return Vec::new();
    };
    days.flatten()
        .flat_map(|day| std::fs::read_dir(day.path()).unwrap().flatten().map(|f| f.path()))
        .collect()
}

fn write_cassette(name: &str, interactions: &str) -> PathBuf {
    let path = std::env::temp_dir().join(format!("krea_test_{name}.cassette.yaml"));
    let content = format!(
        "name: {name}\nrecorded_at: \"2026-03-14T09:00:00Z\"\ncommit: test\ninteractions:\n{interactions}"
    );
    std::fs::write(&path, content).unwrap();
    path
}

#[test]
fn generate_writes_one_image_and_one_log_entry() {
    let output = output_dir("generate");
    let cassette = fixtures_dir().join("generate_bicycle.cassette.yaml");

    cmd(&cassette, &output)
        .args(["A red bicycle", "-a", "1:1"])
        .assert()
        .success()
        .stderr(predicate::str::contains("Saved:"))
        .stderr(predicate::str::contains("Estimated cost: $0.08"));

    let images = saved_images(&output);
    assert_eq!(images.len(), 1, "exactly one image should be written");
    let today = chrono::Local::now().format("%Y-%m-%d").to_string();
    let image = &images[0];
    assert_eq!(image.parent().unwrap().file_name().unwrap().to_str().unwrap(), today);
    let name = image.file_name().unwrap().to_string_lossy().to_string();
    assert!(name.ends_with("-nano-a-red-bicycle.png"), "unexpected file name {name}");

    let lines = log_lines(&output);
    assert_eq!(lines.len(), 1);
    let entry = &lines[0];
    assert_eq!(entry["operation"], "generate");
    assert_eq!(entry["is_edit"], false);
    assert_eq!(entry["model"], "nano");
    assert_eq!(entry["krea_url"], "https://gen.krea.ai/images/7f3c2a10.png");
    assert!((entry["cost"].as_f64().unwrap() - 0.08).abs() < 1e-9);

    let local = PathBuf::from(entry["local_path"].as_str().unwrap());
    assert!(std::fs::metadata(&local).unwrap().len() > 0, "logged file should be non-empty");

    let _ = std::fs::remove_dir_all(&output);
}

#[test]
fn edit_with_empty_log_fails_without_writing() {
    let output = output_dir("edit_empty_log");
    let cassette = fixtures_dir().join("empty.cassette.yaml");

    cmd(&cassette, &output)
        .args(["make it blue", "-e"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("No previous image found"));

    assert!(saved_images(&output).is_empty());
    assert!(log_lines(&output).is_empty());
}

#[test]
fn upscale_of_local_file_without_ftp_fails_before_any_api_call() {
    let output = output_dir("upscale_no_ftp");
    std::fs::create_dir_all(&output).unwrap();
    let source = output.join("source.png");
    std::fs::write(&source, b"\x89PNG\r\n\x1a\n").unwrap();
    let cassette = fixtures_dir().join("empty.cassette.yaml");

    cmd(&cassette, &output)
        .args(["-u", source.to_str().unwrap()])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Upload failed"))
        .stderr(predicate::str::contains("Cassette exhausted").not());

    assert!(log_lines(&output).is_empty());
    let _ = std::fs::remove_dir_all(&output);
}

#[test]
fn failed_job_leaves_no_log_entry() {
    let output = output_dir("job_failed");
    let cassette = fixtures_dir().join("job_failed.cassette.yaml");

    cmd(&cassette, &output)
        .args(["A red bicycle"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Job 91be04d2-job failed: NSFW content detected"));

    assert!(saved_images(&output).is_empty());
    assert!(log_lines(&output).is_empty());
}

#[test]
fn topaz_upscale_of_url_logs_target_dimensions() {
    let output = output_dir("upscale_topaz");
    let cassette = fixtures_dir().join("upscale_topaz.cassette.yaml");

    cmd(&cassette, &output)
        .args(["-u", "https://cdn.example.com/source.png", "--preset", "photo"])
        .assert()
        .success()
        .stderr(predicate::str::contains("Estimated cost: $0.15"));

    let images = saved_images(&output);
    assert_eq!(images.len(), 1);
    assert!(images[0].to_string_lossy().ends_with("-upscale-2x.png"));

    let lines = log_lines(&output);
    assert_eq!(lines.len(), 1);
    assert_eq!(lines[0]["operation"], "upscale_topaz");
    assert_eq!(lines[0]["engine"], "topaz");
    assert_eq!(lines[0]["upscale_model"], "High Fidelity V2");
    assert_eq!(lines[0]["target_dimensions"], "2048x2048");
    assert_eq!(lines[0]["source_url"], "https://cdn.example.com/source.png");

    let _ = std::fs::remove_dir_all(&output);
}

#[test]
fn bloom_upscale_logs_engine_and_guidance_prompt() {
    let output = output_dir("upscale_bloom");
    let cassette = fixtures_dir().join("upscale_bloom.cassette.yaml");

    cmd(&cassette, &output)
        .args([
            "crisp film grain",
            "-u",
            "https://cdn.example.com/portrait.jpg",
            "--engine",
            "bloom",
            "-x",
            "4",
            "--creativity",
            "5",
        ])
        .assert()
        .success()
        .stderr(predicate::str::contains("Estimated cost: $0.75"));

    let images = saved_images(&output);
    assert_eq!(images.len(), 1);
    let name = images[0].file_name().unwrap().to_string_lossy().to_string();
    assert!(name.ends_with("-bloom-4x.png"), "unexpected file name {name}");

    let lines = log_lines(&output);
    assert_eq!(lines.len(), 1);
    let entry = &lines[0];
    assert_eq!(entry["operation"], "upscale_bloom");
    assert_eq!(entry["engine"], "bloom");
    assert_eq!(entry["prompt"], "crisp film grain");
    assert_eq!(entry["creativity"], 5);
    assert_eq!(entry["scale_factor"], 4);
    assert_eq!(entry["target_dimensions"], "4096x4096");
    assert_eq!(entry["source_url"], "https://cdn.example.com/portrait.jpg");
    assert!((entry["cost"].as_f64().unwrap() - 0.75).abs() < 1e-9);

    let _ = std::fs::remove_dir_all(&output);
}

#[test]
fn several_images_are_indexed_and_logged_separately() {
    let output = output_dir("generate_two");
    let cassette = fixtures_dir().join("generate_two.cassette.yaml");

    cmd(&cassette, &output)
        .args(["A red bicycle", "-n", "2"])
        .assert()
        .success()
        .stderr(predicate::str::contains("Total estimated cost: $0.16 for 2 images"));

    let mut names: Vec<String> = saved_images(&output)
        .iter()
        .map(|p| p.file_name().unwrap().to_string_lossy().to_string())
        .collect();
    names.sort_by_key(|n| n.ends_with("-2.png"));
    assert_eq!(names.len(), 2);
    assert!(names[0].ends_with("-nano-a-red-bicycle-1.png"), "unexpected file name {}", names[0]);
    assert!(names[1].ends_with("-nano-a-red-bicycle-2.png"), "unexpected file name {}", names[1]);

    let lines = log_lines(&output);
    assert_eq!(lines.len(), 2);
    assert_eq!(lines[0]["krea_url"], "https://gen.krea.ai/images/first.png");
    assert_eq!(lines[1]["krea_url"], "https://gen.krea.ai/images/second.png");
    assert_ne!(lines[0]["local_path"], lines[1]["local_path"]);

    let _ = std::fs::remove_dir_all(&output);
}

#[test]
fn edit_of_last_image_inherits_its_aspect_ratio() {
    let output = output_dir("edit_last");
    let generate = fixtures_dir().join("generate_bicycle.cassette.yaml");
    cmd(&generate, &output).args(["A red bicycle", "-a", "16:9"]).assert().success();

    let edit = write_cassette(
        "edit_last",
        r"  - seq: 0
    port: krea_api
    method: submit
    input: {}
    output:
      Ok:
        Immediate:
          urls:
            - https://gen.krea.ai/images/edited.webp
  - seq: 1
    port: krea_api
    method: download
    input: https://gen.krea.ai/images/edited.webp
    output:
      Ok:
        data: UklGRgAAAABXRUJQ
",
    );

    cmd(&edit, &output)
        .args(["make it blue", "-e", "-s", "0.6"])
        .assert()
        .success()
        .stderr(predicate::str::contains("Saved:"));

    let lines = log_lines(&output);
    assert_eq!(lines.len(), 2);
    let entry = &lines[1];
    assert_eq!(entry["is_edit"], true);
    assert_eq!(entry["aspect_ratio"], "16:9");
    assert_eq!(entry["source_image_url"], "https://gen.krea.ai/images/7f3c2a10.png");
    assert!((entry["edit_strength"].as_f64().unwrap() - 0.6).abs() < 1e-9);
    assert!(entry["local_path"].as_str().unwrap().ends_with(".webp"));

    let _ = std::fs::remove_dir_all(&output);
    let _ = std::fs::remove_file(&edit);
}

#[test]
fn transient_poll_failure_is_retried() {
    let output = output_dir("transient_poll");
    let cassette = write_cassette(
        "transient_poll",
        r#"  - seq: 0
    port: krea_api
    method: submit
    input: {}
    output:
      Ok:
        Job:
          job_id: c0ffee-job
  - seq: 1
    port: krea_api
    method: job
    input: c0ffee-job
    output:
      Err: "Transient failure: HTTP 503: upstream busy"
  - seq: 2
    port: krea_api
    method: job
    input: c0ffee-job
    output:
      Ok:
        id: c0ffee-job
        status: succeeded
        result_urls:
          - https://gen.krea.ai/images/c0ffee.png
  - seq: 3
    port: krea_api
    method: download
    input: https://gen.krea.ai/images/c0ffee.png
    output:
      Ok:
        data: iVBORw0KGgo=
"#,
    );

    cmd(&cassette, &output).args(["A red bicycle"]).assert().success();

    assert_eq!(log_lines(&output).len(), 1);
    let _ = std::fs::remove_dir_all(&output);
    let _ = std::fs::remove_file(&cassette);
}

#[test]
fn unexpected_call_reports_exhausted_cassette() {
    let output = output_dir("exhausted");
    let cassette = fixtures_dir().join("empty.cassette.yaml");

    cmd(&cassette, &output)
        .args(["A red bicycle"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Cassette exhausted: unexpected call to krea_api::submit"));
}
