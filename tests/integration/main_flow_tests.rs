use serial_test::serial;
use std::process::Command;

const BINARY: &str = env!("CARGO_BIN_EXE_season-elo-processor");

/// Test that the application exits with error code when database connection fails
#[test]
#[serial]
fn test_application_exits_on_connection_failure() {
    // Run with invalid connection string
    let output = Command::new(BINARY)
        .env(
            "CONNECTION_STRING",
            "host=invalid_host port=5432 user=postgres password=wrong dbname=nonexistent connect_timeout=2"
        )
        .env("RUST_LOG", "error")
        .output()
        .expect("Failed to execute processor");

    // Should exit with error code
    assert!(!output.status.success(), "Process should fail with invalid connection");

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(
        stderr.contains("Failed to connect to database"),
        "Should log connection error. Got: {}",
        stderr
    );
    assert!(
        stderr.contains("Application cannot start without a valid database connection"),
        "Should log clear message about needing database connection"
    );
}

/// Test that the application handles missing CONNECTION_STRING environment variable
#[test]
#[serial]
fn test_application_exits_on_missing_connection_string() {
    // Create a temporary directory without .env file
    let temp_dir = std::env::temp_dir().join("season_elo_processor_test");
    std::fs::create_dir_all(&temp_dir).ok();

    // Run without CONNECTION_STRING and from a directory without .env
    let output = Command::new(BINARY)
        .current_dir(&temp_dir)
        .env_clear() // Clear all environment variables
        .env("RUST_LOG", "error")
        .env("PATH", std::env::var("PATH").unwrap_or_default()) // Keep PATH for system
        .output()
        .expect("Failed to execute processor");

    // Clean up
    std::fs::remove_dir_all(&temp_dir).ok();

    // Should exit with error code
    assert!(
        !output.status.success(),
        "Process should fail without CONNECTION_STRING"
    );

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(
        stderr.contains("CONNECTION_STRING environment variable must be set"),
        "Should report missing CONNECTION_STRING. Got: {}",
        stderr
    );
}

#[test]
#[serial]
fn test_application_rejects_malformed_season_id() {
    let output = Command::new(BINARY)
        .env("CONNECTION_STRING", "host=localhost")
        .env("RUST_LOG", "error")
        .arg("--season=0")
        .output()
        .expect("Failed to execute processor");

    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("--season"));
}
