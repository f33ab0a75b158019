use assert_cmd::Command;
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};

fn rules_path(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../../rules").join(name)
}

fn cryptofinder() -> Command {
    Command::cargo_bin("cryptofinder").unwrap()
}

fn write_firmware(dir: &Path, name: &str, body: &[u8]) -> PathBuf {
    let p = dir.join(name);
    fs::write(&p, body).unwrap();
    p
}

#[test]
fn scan_prints_json_reports() {
    let dir = tempfile::tempdir().unwrap();
    let fw = write_firmware(dir.path(), "fw.bin", b"\x7fELF..using aes-256 and sha1 for legacy compat\x00");

    let output = cryptofinder()
        .args(["scan", "--format", "json", "--threads", "1", "--input"])
        .arg(&fw)
        .output()
        .expect("failed to execute");
    assert!(output.status.success(), "scanner exited with error");

    let reports: Vec<Value> = serde_json::from_slice(&output.stdout).expect("invalid JSON output");
    assert_eq!(reports.len(), 1);
    assert_eq!(reports[0]["sourceName"], "fw.bin");
    assert_eq!(reports[0]["safetyPercentage"], 65);
    let names: Vec<&str> = reports[0]["detected"]
        .as_array()
        .unwrap()
        .iter()
        .map(|d| d["name"].as_str().unwrap())
        .collect();
    assert_eq!(names, vec!["AES-256", "SHA-1"]);
}

#[test]
fn scan_text_output_one_line_per_file() {
    let dir = tempfile::tempdir().unwrap();
    write_firmware(dir.path(), "a.bin", b"MD5");
    write_firmware(dir.path(), "b.bin", b"nothing to see");

    let output = cryptofinder()
        .args(["scan", "--threads", "2", "--input"])
        .arg(dir.path())
        .output()
        .expect("failed to execute");
    assert!(output.status.success());
    let stdout = String::from_utf8(output.stdout).unwrap();
    let lines: Vec<&str> = stdout.lines().collect();
    assert_eq!(lines, vec!["a.bin\t10%\tDanger\tMD5", "b.bin\t93%\tGood\tAES-256,SHA-256,RSA-2048 [baseline]"]);
}

#[test]
fn history_and_export_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let fw = write_firmware(dir.path(), "cam.bin", b"rsa-1024 blowfish");
    let state = dir.path().join("state");

    cryptofinder()
        .args(["scan", "--threads", "1", "--input"])
        .arg(&fw)
        .arg("--history-dir")
        .arg(&state)
        .assert()
        .success();

    let output = cryptofinder()
        .args(["history", "--format", "json", "--history-dir"])
        .arg(&state)
        .output()
        .unwrap();
    assert!(output.status.success());
    let records: Vec<Value> = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0]["sourceName"], "cam.bin");
    assert_eq!(records[0]["safetyPercentage"], 50);

    let doc = dir.path().join("report.md");
    cryptofinder()
        .args(["export", "--history-dir"])
        .arg(&state)
        .arg("--output")
        .arg(&doc)
        .assert()
        .success();
    let text = fs::read_to_string(&doc).unwrap();
    assert!(text.contains("CryptoFinder Security Report"));
    assert!(text.contains("| RSA-1024 | Weak | High |"));
    assert!(text.contains("| Blowfish | Moderate | Medium |"));
}

#[test]
fn invalid_rule_file_aborts_startup() {
    let dir = tempfile::tempdir().unwrap();
    let rules = dir.path().join("bad.toml");
    fs::write(
        &rules,
        "[[signature]]\nname = \"Bad\"\nregex = \"aes(\"\nstrength = \"Weak\"\nrisk = \"High\"\nscore = 1\n",
    )
    .unwrap();
    let fw = write_firmware(dir.path(), "fw.bin", b"aes");

    let output = cryptofinder()
        .args(["scan", "--input"])
        .arg(&fw)
        .arg("--rules")
        .arg(&rules)
        .output()
        .unwrap();
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("Bad"));
}

#[test]
fn example_rules_extend_the_catalog() {
    let output = cryptofinder()
        .args(["catalog", "--rules"])
        .arg(rules_path("example.toml"))
        .output()
        .unwrap();
    assert!(output.status.success());
    let stdout = String::from_utf8(output.stdout).unwrap();
    assert!(stdout.starts_with("AES-256\tSecure\tLow\t100\t"));
    assert!(stdout.contains("RC4\tBroken\tCritical\t5\ttokens: rc4, arcfour"));
}

#[test]
fn ask_answers_from_knowledge_base() {
    let output = cryptofinder().args(["ask", "what", "about", "md5?"]).output().unwrap();
    assert!(output.status.success());
    assert!(String::from_utf8_lossy(&output.stdout).contains("MD5 is a cryptographic hash function"));
}

#[test]
fn ask_keeps_a_session_in_the_history_dir() {
    let dir = tempfile::tempdir().unwrap();
    for question in [["what", "is", "rsa?"], ["and", "md5", "then?"]] {
        cryptofinder()
            .arg("ask")
            .args(question)
            .arg("--history-dir")
            .arg(dir.path())
            .assert()
            .success();
    }

    let chat: Vec<Value> = serde_json::from_str(&fs::read_to_string(dir.path().join("chat.json")).unwrap()).unwrap();
    let roles: Vec<&str> = chat.iter().map(|m| m["role"].as_str().unwrap()).collect();
    assert_eq!(roles, vec!["assistant", "user", "assistant", "user", "assistant"]);
    assert_eq!(chat[1]["content"], "what is rsa?");
    assert!(chat[4]["content"].as_str().unwrap().starts_with("MD5 is a cryptographic hash function"));
}

#[test]
fn scan_without_inputs_leaves_output_untouched() {
    let dir = tempfile::tempdir().unwrap();
    let empty = dir.path().join("empty");
    fs::create_dir(&empty).unwrap();
    let out = dir.path().join("out.json");
    fs::write(&out, "previous results").unwrap();

    let output = cryptofinder()
        .args(["scan", "--input"])
        .arg(&empty)
        .arg("--output")
        .arg(&out)
        .output()
        .unwrap();
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("no input files found"));
    assert_eq!(fs::read_to_string(&out).unwrap(), "previous results");

    let missing = dir.path().join("never.json");
    cryptofinder()
        .args(["scan", "--input"])
        .arg(&empty)
        .arg("--output")
        .arg(&missing)
        .assert()
        .failure();
    assert!(!missing.exists());
}
