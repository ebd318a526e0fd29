use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::PathBuf;

const NOW: &str = "2030-01-01T00:00:00Z";

fn project_root() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .parent()
        .unwrap()
        .to_path_buf()
}

fn read_cert(name: &str) -> String {
    fs::read_to_string(project_root().join("testdata/certs").join(name)).unwrap()
}

fn bundle(names: &[&str]) -> String {
    names.iter().map(|name| read_cert(name)).collect()
}

fn write_bundle(dir: &tempfile::TempDir, names: &[&str]) -> String {
    let path = dir.path().join("bundle.pem");
    fs::write(&path, bundle(names)).unwrap();
    path.to_string_lossy().to_string()
}

fn pemtools() -> Command {
    let mut cmd = Command::cargo_bin("pemtools").unwrap();
    cmd.env_remove("RUST_LOG");
    cmd
}

#[test]
fn test_tree_text() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_bundle(
        &dir,
        &["leaf_a.pem", "inter_a.pem", "root_a.pem", "orphan.pem", "root_a.pem"],
    );

    pemtools()
        .args(["tree", &path, "--at", NOW])
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "- Pemtools Test Root A (NZ)\n  - Pemtools Test Intermediate A (NZ)\n    - leaf.pemtools.test (NZ)\n",
        ))
        .stdout(predicate::str::contains(
            "X orphan.pemtools.test (DE) - no issuer certificate found",
        ))
        .stdout(predicate::str::contains("Total certificates: 5"))
        .stdout(predicate::str::contains("Duplicates: 1"));
}

#[test]
fn test_tree_from_stdin() {
    pemtools()
        .args(["tree", "-", "--at", NOW])
        .write_stdin(bundle(&["root_a.pem", "inter_a.pem"]))
        .assert()
        .success()
        .stdout(predicate::str::contains("  - Pemtools Test Intermediate A (NZ)"));
}

#[test]
fn test_tree_json() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_bundle(&dir, &["root_a.pem", "inter_a.pem", "garbage.pem"]);

    let output = pemtools()
        .args(["tree", &path, "-o", "json", "--parallel", "--at", NOW])
        .output()
        .unwrap();
    assert!(output.status.success());

    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(json["summary"]["total"], 3);
    assert_eq!(json["summary"]["parse_errors"], 1);
    assert_eq!(json["roots"][0]["name"], "Pemtools Test Root A");
    assert_eq!(
        json["roots"][0]["children"][0]["name"],
        "Pemtools Test Intermediate A"
    );
}

#[test]
fn test_tree_warns_on_garbage() {
    pemtools()
        .args(["tree", "--at", NOW])
        .write_stdin(bundle(&["garbage.pem"]))
        .assert()
        .success()
        .stderr(predicate::str::contains("skipping undecodable certificate"));
}

#[test]
fn test_tree_rejects_bad_time() {
    pemtools()
        .args(["tree", "--at", "yesterday"])
        .write_stdin("")
        .assert()
        .failure()
        .stderr(predicate::str::contains("RFC 3339"));
}

#[test]
fn test_split() {
    let dir = tempfile::tempdir().unwrap();
    let out = tempfile::tempdir().unwrap();
    let expired = tempfile::tempdir().unwrap();
    let path = write_bundle(&dir, &["root_a.pem", "leaf_a.pem", "expired.pem"]);

    pemtools()
        .args([
            "split",
            &path,
            "-o",
            &out.path().to_string_lossy(),
            "--expired-dir",
            &expired.path().to_string_lossy(),
            "--at",
            NOW,
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("Wrote 3 certificates, skipped 0 expired"));

    assert!(out.path().join("Pemtools_Test_Root_A.pem").is_file());
    assert_eq!(
        fs::read_to_string(out.path().join("leaf.pemtools.test.pem")).unwrap(),
        read_cert("leaf_a.pem")
    );
    assert!(expired.path().join("expired.pemtools.test.pem").is_file());
}

#[test]
fn test_split_skips_expired() {
    let out = tempfile::tempdir().unwrap();

    pemtools()
        .args(["split", "-d", &out.path().to_string_lossy(), "--at", NOW])
        .write_stdin(bundle(&["root_a.pem", "expired.pem"]))
        .assert()
        .success()
        .stdout(predicate::str::contains("Wrote 1 certificates, skipped 1 expired"));

    assert_eq!(fs::read_dir(out.path()).unwrap().count(), 1);
}

#[test]
fn test_split_missing_directory() {
    let out = tempfile::tempdir().unwrap();
    let missing = out.path().join("missing");

    pemtools()
        .args(["split", "-d", &missing.to_string_lossy()])
        .write_stdin(bundle(&["root_a.pem"]))
        .assert()
        .failure()
        .stderr(predicate::str::contains("MissingDirectory"));
}

#[test]
fn test_info() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_bundle(&dir, &["root_a.pem", "inter_a.pem", "expired.pem"]);

    pemtools()
        .args(["info", &path, "--at", NOW])
        .assert()
        .success()
        .stdout(predicate::str::contains("CN"))
        .stdout(predicate::str::contains("Pemtools Test Intermediate A"))
        .stdout(predicate::str::contains("certificate has expired"))
        .stdout(predicate::str::contains("Bundle contained 1 expired certs"));
}

#[test]
fn test_missing_input_file() {
    pemtools()
        .args(["tree", "/nonexistent/bundle.pem"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Io"));
}
