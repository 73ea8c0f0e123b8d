use serial_test::serial;
use std::process::Command;

use super::test_helpers::TestDatabase;
use crate::common::init_test_env;

/// Runs the processor for one season in a subprocess and kills it after `crash_after_ms`
async fn simulate_crash_during_processing(
    test_db: &TestDatabase,
    season: i32,
    crash_after_ms: u64
) -> std::process::Output {
    let mut child = Command::new(env!("CARGO_BIN_EXE_season-elo-processor"))
        .env("CONNECTION_STRING", &test_db.connection_string)
        .env("RUST_LOG", "warn")
        .args(["--season", &season.to_string()])
        .spawn()
        .expect("Failed to start processor");

    tokio::time::sleep(tokio::time::Duration::from_millis(crash_after_ms)).await;

    // Kill the process to simulate a crash; it may already have exited
    let _ = child.kill();

    child.wait_with_output().expect("Failed to get output")
}

#[tokio::test]
#[serial]
async fn test_crash_leaves_season_consistent() {
    init_test_env();
    let test_db = TestDatabase::new().await.expect("Failed to create test database");
    let seed = test_db.seed_test_data().await.expect("Failed to seed test data");

    for crash_after_ms in [0, 5, 20, 50, 200] {
        simulate_crash_during_processing(&test_db, seed.season.0, crash_after_ms).await;

        let count = test_db.snapshot_count(seed.season).await.unwrap();
        assert!(
            count == 0 || count == 7,
            "Season left with {} snapshots after crash at {}ms",
            count,
            crash_after_ms
        );
    }
}

#[tokio::test]
#[serial]
async fn test_restart_after_crash_completes() {
    init_test_env();
    let test_db = TestDatabase::new().await.expect("Failed to create test database");
    let seed = test_db.seed_test_data().await.expect("Failed to seed test data");

    simulate_crash_during_processing(&test_db, seed.season.0, 10).await;

    let output = Command::new(env!("CARGO_BIN_EXE_season-elo-processor"))
        .env("CONNECTION_STRING", &test_db.connection_string)
        .env("RUST_LOG", "warn")
        .args(["--season", &seed.season.0.to_string()])
        .output()
        .expect("Failed to execute processor");

    assert!(output.status.success());
    assert_eq!(test_db.snapshot_count(seed.season).await.unwrap(), 7);
}
