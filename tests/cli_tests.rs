use std::io::Write;
use std::process::{Command, Output, Stdio};

fn evm_bin() -> &'static str {
    env!("CARGO_BIN_EXE_evm")
}
fn deploy_bin() -> &'static str {
    env!("CARGO_BIN_EXE_evm-deploy")
}

fn run_deploy(stdin: &str) -> Output {
    let mut child = Command::new(deploy_bin())
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .expect("spawn evm-deploy");
    child.stdin.take().expect("stdin").write_all(stdin.as_bytes()).expect("write stdin");
    child.wait_with_output().expect("wait evm-deploy")
}

fn run_evm(args: &[&str]) -> Output {
    Command::new(evm_bin()).args(args).output().expect("run evm")
}

fn line_value<'a>(stdout: &'a str, prefix: &str) -> &'a str {
    stdout
        .lines()
        .find_map(|l| l.strip_prefix(prefix))
        .unwrap_or_else(|| panic!("no {prefix} line in stdout={stdout}"))
}

#[test]
fn deploy_wraps_add_program() {
    let out = run_deploy("6001600101\n");
    assert!(out.status.success());
    let stdout = String::from_utf8_lossy(&out.stdout);
    assert_eq!(stdout, "600580600b6000396000f36001600101\n");
}

#[test]
fn deploy_accepts_uppercase_and_padding() {
    let out = run_deploy("   6001600101 \n\n");
    let upper = run_deploy("6001600101".to_uppercase().as_str());
    assert!(out.status.success() && upper.status.success());
    assert_eq!(out.stdout, upper.stdout);
}

#[test]
fn deploy_odd_length_fails() {
    let out = run_deploy("600");
    assert!(!out.status.success());
    let stdout = String::from_utf8_lossy(&out.stdout);
    assert!(stdout.to_lowercase().contains("odd"), "stdout={stdout}");
}

#[test]
fn deploy_non_hex_fails() {
    let out = run_deploy("0x6001");
    assert!(!out.status.success());
    assert!(!out.stdout.is_empty());
}

#[test]
fn deploy_empty_input_fails() {
    let out = run_deploy("");
    assert!(!out.status.success());
    let stdout = String::from_utf8_lossy(&out.stdout);
    assert!(stdout.contains("runtime code is empty"), "stdout={stdout}");
}

#[test]
fn evm_call_simple_return() {
    // PUSH1 0x2a PUSH1 0 MSTORE PUSH1 32 PUSH1 0 RETURN
    let out = run_evm(&["--code", "602a60005260206000f3"]);
    assert!(out.status.success(), "stderr={}", String::from_utf8_lossy(&out.stderr));
    let stdout = String::from_utf8_lossy(&out.stdout);
    assert_eq!(line_value(&stdout, "OUT: "), format!("0x{}2a", "00".repeat(31)));
    assert_eq!(line_value(&stdout, "ROOT: 0x").len(), 64);
}

#[test]
fn evm_call_revert_reports_error() {
    let out = run_evm(&["--code", "60006000fd"]);
    assert!(out.status.success());
    let stdout = String::from_utf8_lossy(&out.stdout);
    assert!(stdout.contains("OUT: 0x error: execution reverted"), "stdout={stdout}");
}

#[test]
fn evm_create_deploys_wrapped_code() {
    let wrapped = run_deploy("6001600101");
    let code = String::from_utf8_lossy(&wrapped.stdout).trim().to_string();

    let out = run_evm(&["--create", "--code", &code, "--dump"]);
    assert!(out.status.success(), "stderr={}", String::from_utf8_lossy(&out.stderr));
    let stdout = String::from_utf8_lossy(&out.stdout);
    assert_eq!(line_value(&stdout, "OUT: "), "0x6001600101");
    assert!(stdout.contains("\"code\": \"0x6001600101\""), "stdout={stdout}");
}

#[test]
fn evm_code_from_file() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("code.hex");
    std::fs::write(&path, "600580600b6000396000f36001600101\n").expect("write code");
    let arg = format!("@{}", path.display());
    let out = run_evm(&["--create", "--code", &arg]);
    assert!(out.status.success());
    let stdout = String::from_utf8_lossy(&out.stdout);
    assert_eq!(line_value(&stdout, "OUT: "), "0x6001600101");
}

#[test]
fn evm_datadir_resumes_latest_root() {
    let dir = tempfile::tempdir().expect("tempdir");
    let datadir = dir.path().to_str().expect("utf8 path");

    // PUSH1 7 PUSH1 0 SSTORE STOP
    let first = run_evm(&["--datadir", datadir, "--code", "600760005500"]);
    assert!(first.status.success(), "stderr={}", String::from_utf8_lossy(&first.stderr));
    let first_stdout = String::from_utf8_lossy(&first.stdout).to_string();
    let first_root = line_value(&first_stdout, "ROOT: ").to_string();

    // PUSH1 0 SLOAD PUSH1 0 MSTORE PUSH1 32 PUSH1 0 RETURN
    let read = ["--datadir", datadir, "--code", "60005460005260206000f3"];
    let second = run_evm(&read);
    assert!(second.status.success(), "stderr={}", String::from_utf8_lossy(&second.stderr));
    let second_stdout = String::from_utf8_lossy(&second.stdout).to_string();
    assert!(line_value(&second_stdout, "OUT: ").ends_with("07"), "stdout={second_stdout}");
    assert_ne!(line_value(&second_stdout, "ROOT: "), first_root);

    // An explicit root wins over the latest one.
    let mut from_first = read.to_vec();
    from_first.extend(["--root", first_root.as_str()]);
    let third = run_evm(&from_first);
    assert!(third.status.success(), "stderr={}", String::from_utf8_lossy(&third.stderr));
    let third_stdout = String::from_utf8_lossy(&third.stdout);
    assert!(line_value(&third_stdout, "OUT: ").ends_with("07"), "stdout={third_stdout}");
}

#[test]
fn evm_unknown_root_fails() {
    let dir = tempfile::tempdir().expect("tempdir");
    let datadir = dir.path().to_str().expect("utf8 path");
    assert!(run_evm(&["--datadir", datadir, "--code", "00"]).status.success());

    let root = format!("0x{}", "11".repeat(32));
    let out = run_evm(&["--datadir", datadir, "--root", &root, "--code", "00"]);
    assert!(!out.status.success());
    let stderr = String::from_utf8_lossy(&out.stderr);
    assert!(stderr.contains("unknown state root"), "stderr={stderr}");
}

#[test]
fn evm_sysstat_prints_gas() {
    let out = run_evm(&["--code", "00", "--sysstat"]);
    assert!(out.status.success());
    let stdout = String::from_utf8_lossy(&out.stdout);
    assert!(stdout.contains("vm took"), "stdout={stdout}");
    assert!(stdout.contains("gas used: 21000"), "stdout={stdout}");
}

#[test]
fn evm_invalid_flag_value_fails() {
    let out = run_evm(&["--from", "0x1234"]);
    assert!(!out.status.success());
    let stderr = String::from_utf8_lossy(&out.stderr);
    assert!(stderr.contains("invalid address"), "stderr={stderr}");
}

#[test]
fn evm_halt_reports_error() {
    // INVALID
    let out = run_evm(&["--code", "fe"]);
    assert!(out.status.success(), "stderr={}", String::from_utf8_lossy(&out.stderr));
    let stdout = String::from_utf8_lossy(&out.stdout);
    assert!(line_value(&stdout, "OUT: ").starts_with("0x error: "), "stdout={stdout}");
}

#[test]
fn evm_root_ignored_for_fresh_datadir() {
    let dir = tempfile::tempdir().expect("tempdir");
    let datadir = dir.path().join("fresh");
    let root = format!("0x{}", "11".repeat(32));
    let out = run_evm(&["--datadir", datadir.to_str().expect("utf8 path"), "--root", &root, "--code", "00"]);
    assert!(out.status.success(), "stderr={}", String::from_utf8_lossy(&out.stderr));
    let stdout = String::from_utf8_lossy(&out.stdout);
    assert_eq!(line_value(&stdout, "OUT: "), "0x");
}

#[test]
fn evm_malformed_delegation_code_fails_cleanly() {
    let out = run_evm(&["--code", "ef0100"]);
    assert!(!out.status.success());
    assert_eq!(out.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&out.stderr);
    assert!(stderr.contains("invalid bytecode"), "stderr={stderr}");
    assert!(!stderr.contains("panicked"), "stderr={stderr}");
}

#[test]
fn evm_debug_traces_each_step() {
    // PUSH1 1 PUSH1 1 ADD STOP
    let out = run_evm(&["--debug", "--code", "600160010100"]);
    assert!(out.status.success(), "stderr={}", String::from_utf8_lossy(&out.stderr));
    let stderr = String::from_utf8_lossy(&out.stderr);
    let steps = stderr.lines().filter(|l| l.starts_with("{\"pc\":")).count();
    assert!(steps >= 3, "stderr={stderr}");
}
