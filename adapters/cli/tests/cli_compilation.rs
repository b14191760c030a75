use std::process::Command;

#[test]
fn cli_compiles_without_warnings() {
    let status = Command::new(env!("CARGO"))
        .current_dir(env!("CARGO_MANIFEST_DIR"))
        .args(["check", "--quiet", "--bin", "ghost-trail"])
        .status()
        .expect("failed to invoke cargo check for the ghost-trail binary");

    assert!(status.success(), "cargo check --bin ghost-trail should succeed");
}

#[test]
fn wallmap_command_prints_both_layers() {
    let output = Command::new(env!("CARGO_BIN_EXE_ghost-trail"))
        .args(["wallmap", "--level", "1"])
        .output()
        .expect("failed to run ghost-trail");

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.starts_with("borders:\n"));
    assert!(stdout.contains("shadows:\n"));
}

#[test]
fn unknown_levels_fail() {
    let output = Command::new(env!("CARGO_BIN_EXE_ghost-trail"))
        .args(["wallmap", "--level", "99"])
        .output()
        .expect("failed to run ghost-trail");

    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("unknown level 99"));
}
