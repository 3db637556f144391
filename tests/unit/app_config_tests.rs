/*!
 * Tests for app configuration
 */

use anyhow::Result;
use pagetrans::app_config::{Config, LogLevel};
use pagetrans::translation::OverflowPolicy;

use crate::common;

#[test]
fn test_loadOrCreate_withExistingFile_shouldReadValues() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let config_path = common::create_test_file(
        temp_dir.path(),
        "conf.json",
        r#"{
            "source_language": "de",
            "target_language": "fr",
            "use_tm": false,
            "mt": { "endpoint": "http://localhost:9000/etranslation", "username": "user" },
            "tm": { "key": "secret", "concurrent_requests": 2 },
            "overflow_policy": "keep_whole",
            "log_level": "debug"
        }"#,
    )?;

    let config = Config::load_or_create(&config_path)?;

    assert_eq!(config.source_language, "de");
    assert_eq!(config.target_language, "fr");
    assert!(!config.use_tm);
    assert_eq!(config.mt.username, "user");
    assert_eq!(config.mt.timeout_secs, 60);
    assert_eq!(config.tm.key, "secret");
    assert_eq!(config.tm.concurrent_requests, 2);
    assert_eq!(config.overflow_policy, OverflowPolicy::KeepWhole);
    assert_eq!(config.log_level, LogLevel::Debug);
    assert!(config.validate().is_ok());
    Ok(())
}

#[test]
fn test_loadOrCreate_withMalformedFile_shouldFail() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let config_path = common::create_test_file(temp_dir.path(), "conf.json", "{ not json")?;

    assert!(Config::load_or_create(&config_path).is_err());
    Ok(())
}

#[test]
fn test_save_shouldRoundTripThroughFile() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let config_path = temp_dir.path().join("conf.json");
    let mut config = Config::default();
    config.storage.database_path = Some("/var/lib/pagetrans/jobs.db".to_string());
    config.poll_interval_ms = 250;

    config.save(&config_path)?;

    assert_eq!(Config::load_or_create(&config_path)?, config);
    Ok(())
}

#[test]
fn test_validate_withEmptyEndpoint_shouldFail() {
    let mut config = Config::default();
    config.mt.endpoint = "  ".to_string();

    assert!(config.validate().is_err());
}
