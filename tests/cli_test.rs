use std::process::Command;

fn sumo_demo() -> Command {
    let mut command = Command::new(env!("CARGO_BIN_EXE_sumo_demo"));
    command.env("RUST_LOG", "info");
    command
}

/// A missing configuration is fatal and names the path
#[test]
fn test_missing_config_exits_nonzero() {
    let output = sumo_demo()
        .args(["--config_file=/nonexistent/hello.sumocfg", "--num_steps=5"])
        .output()
        .expect("Failed to execute sumo_demo");

    assert!(
        !output.status.success(),
        "Run with a missing config succeeded. stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(
        stderr.contains("/nonexistent/hello.sumocfg"),
        "Diagnostic does not name the config. stderr: {}",
        stderr
    );
    assert!(
        !stderr.contains(" speed: "),
        "Vehicle telemetry logged before load. stderr: {}",
        stderr
    );
}

/// Step counts are non-negative integers
#[test]
fn test_negative_step_count_rejected() {
    let output = sumo_demo()
        .args(["--num_steps=-1"])
        .output()
        .expect("Failed to execute sumo_demo");

    assert!(!output.status.success());
}

#[test]
fn test_help_lists_flags() {
    let output = sumo_demo()
        .arg("--help")
        .output()
        .expect("Failed to execute sumo_demo");

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("--config_file"));
    assert!(stdout.contains("--num_steps"));
}
