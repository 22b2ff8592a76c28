use std::fs;
use std::path::Path;
use std::process::{Command, Output};

use pretty_assertions::assert_eq;

const TS: usize = 188;

const ENV_VARS: [&str; 6] = [
    "ID3TS_PMT_PID",
    "ID3TS_ID3_PID",
    "ID3TS_ID3_PTS",
    "ID3TS_VIDEO_PID",
    "ID3TS_AUDIO_PID",
    "ID3TS_DESCRIPTION",
];

/// Runs the binary in `dir` with a clean `ID3TS_*` environment plus `env`.
fn run(dir: &Path, args: &[&str], env: &[(&str, &str)]) -> Output {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_id3ts"));
    cmd.current_dir(dir).args(args).env_remove("RUST_LOG");
    for var in ENV_VARS {
        cmd.env_remove(var);
    }
    for (key, value) in env {
        cmd.env(key, value);
    }
    cmd.output().expect("failed to run id3ts")
}

fn get_pid(b: &[u8]) -> u16 {
    (((b[1] & 0x1f) as u16) << 8) | b[2] as u16
}

#[test]
fn test_missing_data_fails_without_output() {
    let dir = tempfile::tempdir().unwrap();
    let out = run(dir.path(), &["-p", "90000"], &[]);

    assert_eq!(out.status.code(), Some(1));
    assert!(out.stdout.is_empty());
    assert!(String::from_utf8_lossy(&out.stderr).contains("no data"));
}

#[test]
fn test_segment_on_stdout() {
    let dir = tempfile::tempdir().unwrap();
    let out = run(dir.path(), &["-v", "0x101", "-p", "90000", "hello"], &[]);

    assert!(out.status.success());
    let b = out.stdout;
    assert_eq!(b.len(), 3 * TS);
    assert!(b.chunks(TS).all(|p| p[0] == 0x47));

    // PMT lists the video stream ahead of the ID3 stream
    let pmt = &b[TS..2 * TS];
    assert_eq!(get_pid(pmt), 0x100);
    assert_eq!(pmt[34], 0x1b);
    assert_eq!(get_pid(&pmt[34..]), 0x101);
    assert_eq!(get_pid(&pmt[39..]), 0x103);
    assert_eq!(get_pid(&b[2 * TS..]), 0x103);
}

#[test]
fn test_pid_collision_fails() {
    let dir = tempfile::tempdir().unwrap();
    let out = run(dir.path(), &["--id3-pid", "0x100", "hello"], &[]);

    assert!(!out.status.success());
    assert!(out.stdout.is_empty());
    assert!(String::from_utf8_lossy(&out.stderr).contains("pmtPid"));
}

#[test]
fn test_output_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("tag.ts");
    let out = run(dir.path(), &["-o", path.to_str().unwrap(), "hello"], &[]);

    assert!(out.status.success());
    assert!(out.stdout.is_empty());
    assert_eq!(fs::read(&path).unwrap().len(), 3 * TS);
}

#[test]
fn test_settings_precedence() {
    let dir = tempfile::tempdir().unwrap();
    let config = dir.path().join("custom.toml");
    fs::write(&config, "id3_pid = 0x180\n").unwrap();
    let config = config.to_str().unwrap();

    let id3_pid = |out: Output| {
        assert!(out.status.success());
        get_pid(&out.stdout[2 * TS..])
    };

    // File over defaults
    assert_eq!(id3_pid(run(dir.path(), &["-c", config, "x"], &[])), 0x180);
    // Environment over file
    let env = [("ID3TS_ID3_PID", "0x181")];
    assert_eq!(id3_pid(run(dir.path(), &["-c", config, "x"], &env)), 0x181);
    // Flags over environment
    let args = ["-c", config, "--id3-pid", "0x182", "x"];
    assert_eq!(id3_pid(run(dir.path(), &args, &env)), 0x182);
}

#[test]
fn test_default_config_file_in_working_directory() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("id3ts.toml"), "pmt_pid = 0x120\n").unwrap();

    let out = run(dir.path(), &["x"], &[]);
    assert!(out.status.success());
    assert_eq!(get_pid(&out.stdout[..]), 0x000);
    assert_eq!(get_pid(&out.stdout[TS..]), 0x120);
    // PAT points at the configured PMT
    assert_eq!(get_pid(&out.stdout[14..]), 0x120);
}

#[test]
fn test_missing_config_file_fails() {
    let dir = tempfile::tempdir().unwrap();
    let out = run(dir.path(), &["-c", "nope.toml", "x"], &[]);

    assert!(!out.status.success());
    assert!(out.stdout.is_empty());
}
