//! Driver configuration management

use anyhow::{Context, Result, anyhow};
use protocol::wire::is_in_endpoint;
use protocol::{PRODUCT_ID, VENDOR_ID};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DriverConfig {
    #[serde(default)]
    pub driver: DriverSettings,
    #[serde(default)]
    pub device: DeviceSettings,
    #[serde(default)]
    pub transfers: TransferSettings,
    #[serde(default)]
    pub output: OutputSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DriverSettings {
    /// trace, debug, info, warn or error
    #[serde(default = "DriverSettings::default_log_level")]
    pub log_level: String,
}

impl Default for DriverSettings {
    fn default() -> Self {
        Self {
            log_level: Self::default_log_level(),
        }
    }
}

impl DriverSettings {
    fn default_log_level() -> String {
        "info".to_string()
    }
}

/// Which device to bind to
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeviceSettings {
    /// Vendor ID as a 0x-prefixed hex string
    #[serde(default = "DeviceSettings::default_vendor_id")]
    pub vendor_id: String,
    /// Product ID as a 0x-prefixed hex string
    #[serde(default = "DeviceSettings::default_product_id")]
    pub product_id: String,
    /// Interrupt IN endpoint to read reports from instead of the first one
    /// found in the active configuration
    #[serde(default)]
    pub interrupt_endpoint: Option<String>,
}

impl Default for DeviceSettings {
    fn default() -> Self {
        Self {
            vendor_id: Self::default_vendor_id(),
            product_id: Self::default_product_id(),
            interrupt_endpoint: None,
        }
    }
}

impl DeviceSettings {
    fn default_vendor_id() -> String {
        format!("{:#06x}", VENDOR_ID)
    }

    fn default_product_id() -> String {
        format!("{:#06x}", PRODUCT_ID)
    }

    pub fn vendor_id(&self) -> Result<u16> {
        parse_hex_id(&self.vendor_id, "vendor_id")
    }

    pub fn product_id(&self) -> Result<u16> {
        parse_hex_id(&self.product_id, "product_id")
    }

    pub fn interrupt_endpoint(&self) -> Result<Option<u8>> {
        let Some(endpoint) = &self.interrupt_endpoint else {
            return Ok(None);
        };

        let value = parse_hex_id(endpoint, "interrupt_endpoint")?;
        let address = u8::try_from(value)
            .map_err(|_| anyhow!("Invalid interrupt_endpoint '{}', must fit in one byte", endpoint))?;
        if !is_in_endpoint(address) {
            return Err(anyhow!(
                "Invalid interrupt_endpoint '{}', IN bit (0x80) must be set",
                endpoint
            ));
        }
        Ok(Some(address))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransferSettings {
    /// Timeout for each vendor control request
    #[serde(default = "TransferSettings::default_control_timeout")]
    pub control_timeout_ms: u64,
    /// How long one interrupt read blocks before checking for cancellation
    #[serde(default = "TransferSettings::default_interrupt_poll")]
    pub interrupt_poll_ms: u64,
    /// How often to look for the device while it is absent
    #[serde(default = "TransferSettings::default_rescan_interval")]
    pub rescan_interval_ms: u64,
}

impl Default for TransferSettings {
    fn default() -> Self {
        Self {
            control_timeout_ms: Self::default_control_timeout(),
            interrupt_poll_ms: Self::default_interrupt_poll(),
            rescan_interval_ms: Self::default_rescan_interval(),
        }
    }
}

impl TransferSettings {
    fn default_control_timeout() -> u64 {
        500
    }

    fn default_interrupt_poll() -> u64 {
        20
    }

    fn default_rescan_interval() -> u64 {
        1000
    }

    pub fn control_timeout(&self) -> Duration {
        Duration::from_millis(self.control_timeout_ms)
    }

    pub fn interrupt_poll(&self) -> Duration {
        Duration::from_millis(self.interrupt_poll_ms)
    }

    pub fn rescan_interval(&self) -> Duration {
        Duration::from_millis(self.rescan_interval_ms)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// One JSON object per line on stdout
    #[default]
    Json,
    /// Human-readable lines through the logger
    Log,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputSettings {
    #[serde(default)]
    pub format: OutputFormat,
    /// Only print frames that changed some value
    #[serde(default = "OutputSettings::default_changes_only")]
    pub changes_only: bool,
}

impl Default for OutputSettings {
    fn default() -> Self {
        Self {
            format: OutputFormat::default(),
            changes_only: Self::default_changes_only(),
        }
    }
}

impl OutputSettings {
    fn default_changes_only() -> bool {
        true
    }
}

impl DriverConfig {
    /// Load configuration from the specified path
    pub fn load(path: Option<PathBuf>) -> Result<Self> {
        let config_path = if let Some(p) = path {
            p
        } else {
            let candidates = vec![
                Self::default_path(),
                PathBuf::from("/etc/hori-flightstick/driver.toml"),
            ];

            candidates
                .into_iter()
                .find(|p| p.exists())
                .ok_or_else(|| anyhow!("No configuration file found, using defaults"))?
        };

        let content = fs::read_to_string(&config_path)
            .with_context(|| format!("Failed to read config file: {}", config_path.display()))?;

        let config: DriverConfig = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", config_path.display()))?;

        config.validate()?;

        tracing::info!("Loaded configuration from: {}", config_path.display());
        Ok(config)
    }

    /// Load configuration or return defaults if not found
    pub fn load_or_default() -> Self {
        match Self::load(None) {
            Ok(config) => config,
            Err(e) => {
                tracing::warn!("Failed to load config: {}, using defaults", e);
                Self::default()
            }
        }
    }

    /// Save configuration to the specified path
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self).context("Failed to serialize configuration")?;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        fs::write(path, content)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        tracing::info!("Saved configuration to: {}", path.display());
        Ok(())
    }

    /// Get the default configuration file path
    pub fn default_path() -> PathBuf {
        if let Some(config_dir) = dirs::config_dir() {
            config_dir.join("hori-flightstick").join("driver.toml")
        } else {
            PathBuf::from(".config/hori-flightstick/driver.toml")
        }
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.driver.log_level.as_str()) {
            return Err(anyhow!(
                "Invalid log level '{}', must be one of: {}",
                self.driver.log_level,
                valid_levels.join(", ")
            ));
        }

        self.device.vendor_id()?;
        self.device.product_id()?;
        self.device.interrupt_endpoint()?;

        let transfers = &self.transfers;
        for (name, value) in [
            ("control_timeout_ms", transfers.control_timeout_ms),
            ("interrupt_poll_ms", transfers.interrupt_poll_ms),
            ("rescan_interval_ms", transfers.rescan_interval_ms),
        ] {
            if value == 0 {
                return Err(anyhow!("Invalid {} '0', must be greater than zero", name));
            }
        }

        Ok(())
    }
}

/// Expand a leading `~` in a user-supplied path
pub fn expand_path(path: &str) -> PathBuf {
    PathBuf::from(shellexpand::tilde(path).as_ref())
}

/// Parse a 0x-prefixed hex ID of one to four digits
fn parse_hex_id(id: &str, name: &str) -> Result<u16> {
    let hex_part = id
        .strip_prefix("0x")
        .or_else(|| id.strip_prefix("0X"))
        .ok_or_else(|| anyhow!("Invalid {} '{}', must start with '0x' (e.g., '0x1234')", name, id))?;

    if hex_part.is_empty() || hex_part.len() > 4 {
        return Err(anyhow!(
            "Invalid {} '{}', hex part must be 1-4 digits",
            name,
            id
        ));
    }

    u16::from_str_radix(hex_part, 16)
        .map_err(|_| anyhow!("Invalid {} '{}', not a valid hex number", name, id))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = DriverConfig::default();
        assert_eq!(config.driver.log_level, "info");
        assert_eq!(config.device.vendor_id().unwrap(), 0x06d3);
        assert_eq!(config.device.product_id().unwrap(), 0x0f10);
        assert_eq!(config.device.interrupt_endpoint().unwrap(), None);
        assert_eq!(config.transfers.control_timeout(), Duration::from_millis(500));
        assert_eq!(config.output.format, OutputFormat::Json);
        assert!(config.output.changes_only);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_parse_hex_id() {
        assert_eq!(parse_hex_id("0x06d3", "vid").unwrap(), 0x06d3);
        assert_eq!(parse_hex_id("0XABCD", "vid").unwrap(), 0xABCD);
        assert_eq!(parse_hex_id("0x1", "vid").unwrap(), 1);
        assert!(parse_hex_id("06d3", "vid").is_err());
        assert!(parse_hex_id("0x", "vid").is_err());
        assert!(parse_hex_id("0x12345", "vid").is_err());
        assert!(parse_hex_id("0xGHIJ", "vid").is_err());
    }

    #[test]
    fn test_interrupt_endpoint_override() {
        let mut config = DriverConfig::default();

        config.device.interrupt_endpoint = Some("0x81".to_string());
        assert_eq!(config.device.interrupt_endpoint().unwrap(), Some(0x81));

        config.device.interrupt_endpoint = Some("0x01".to_string());
        assert!(config.validate().is_err());

        config.device.interrupt_endpoint = Some("0x181".to_string());
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_log_level() {
        let mut config = DriverConfig::default();
        config.driver.log_level = "invalid".to_string();
        assert!(config.validate().is_err());

        config.driver.log_level = "trace".to_string();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_zero_intervals_rejected() {
        let mut config = DriverConfig::default();
        config.transfers.interrupt_poll_ms = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config: DriverConfig = toml::from_str("[output]\nformat = \"log\"\n").unwrap();
        assert_eq!(config.output.format, OutputFormat::Log);
        assert!(config.output.changes_only);
        assert_eq!(config.transfers.rescan_interval_ms, 1000);
        assert_eq!(config.driver.log_level, "info");
    }

    #[test]
    fn test_expand_path() {
        assert_eq!(expand_path("/etc/x.toml"), PathBuf::from("/etc/x.toml"));
        if let Some(home) = dirs::home_dir() {
            assert_eq!(expand_path("~/x.toml"), home.join("x.toml"));
        }
    }
}
