//! Integration tests for configuration parsing
//!
//! Tests driver configuration files, including:
//! - Minimal and full configurations
//! - Save/load round trip through a real file
//! - Invalid configuration handling

use driver::config::{DriverConfig, OutputFormat};
use std::fs;
use std::time::Duration;
use tempfile::TempDir;

const FULL_CONFIG: &str = r#"
[driver]
log_level = "debug"

[device]
vendor_id = "0x06D3"
product_id = "0x0f10"
interrupt_endpoint = "0x81"

[transfers]
control_timeout_ms = 250
interrupt_poll_ms = 10
rescan_interval_ms = 2000

[output]
format = "log"
changes_only = false
"#;

fn write_config(dir: &TempDir, content: &str) -> std::path::PathBuf {
    let path = dir.path().join("driver.toml");
    fs::write(&path, content).unwrap();
    path
}

#[test]
fn test_full_config() {
    let dir = TempDir::new().unwrap();
    let path = write_config(&dir, FULL_CONFIG);

    let config = DriverConfig::load(Some(path)).unwrap();
    assert_eq!(config.driver.log_level, "debug");
    assert_eq!(config.device.vendor_id().unwrap(), 0x06d3);
    assert_eq!(config.device.product_id().unwrap(), 0x0f10);
    assert_eq!(config.device.interrupt_endpoint().unwrap(), Some(0x81));
    assert_eq!(config.transfers.control_timeout(), Duration::from_millis(250));
    assert_eq!(config.transfers.interrupt_poll(), Duration::from_millis(10));
    assert_eq!(config.transfers.rescan_interval(), Duration::from_secs(2));
    assert_eq!(config.output.format, OutputFormat::Log);
    assert!(!config.output.changes_only);
}

#[test]
fn test_empty_config_is_default() {
    let dir = TempDir::new().unwrap();
    let path = write_config(&dir, "");

    let config = DriverConfig::load(Some(path)).unwrap();
    assert_eq!(config.driver.log_level, "info");
    assert_eq!(config.device.vendor_id().unwrap(), 0x06d3);
    assert_eq!(config.transfers.control_timeout_ms, 500);
    assert_eq!(config.transfers.interrupt_poll_ms, 20);
    assert_eq!(config.output.format, OutputFormat::Json);
}

#[test]
fn test_save_then_load() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("nested").join("driver.toml");

    let mut config = DriverConfig::default();
    config.driver.log_level = "warn".to_string();
    config.device.interrupt_endpoint = Some("0x82".to_string());
    config.save(&path).unwrap();

    let loaded = DriverConfig::load(Some(path)).unwrap();
    assert_eq!(loaded.driver.log_level, "warn");
    assert_eq!(loaded.device.interrupt_endpoint().unwrap(), Some(0x82));
}

#[test]
fn test_missing_file() {
    let dir = TempDir::new().unwrap();
    assert!(DriverConfig::load(Some(dir.path().join("absent.toml"))).is_err());
}

#[test]
fn test_invalid_values_rejected() {
    let dir = TempDir::new().unwrap();

    for content in [
        "[driver]\nlog_level = \"loud\"\n",
        "[device]\nvendor_id = \"06d3\"\n",
        "[device]\nproduct_id = \"0xfffff\"\n",
        "[device]\ninterrupt_endpoint = \"0x02\"\n",
        "[transfers]\ncontrol_timeout_ms = 0\n",
        "[output]\nformat = \"xml\"\n",
        "not toml at all [",
    ] {
        let path = write_config(&dir, content);
        assert!(
            DriverConfig::load(Some(path)).is_err(),
            "accepted: {}",
            content
        );
    }
}

#[test]
fn test_default_path_location() {
    let path = DriverConfig::default_path();
    assert!(path.ends_with("hori-flightstick/driver.toml"));
}
