//! # Register Configuration
//!
//! Settings for one till: store details, tax, scanner timing, banner
//! durations and dashboard thresholds.
//!
//! ## Configuration Sources
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Configuration Priority                               │
//! │                                                                         │
//! │  1. Environment Variables (highest priority)                           │
//! │     TILL_TAX_RATE_BPS=825                                              │
//! │     TILL_SCAN_INTERVAL_MS=40                                           │
//! │                                                                         │
//! │  2. TOML Config File                                                   │
//! │     ~/.config/till-pos/register.toml (Linux)                           │
//! │     ~/Library/Application Support/com.till.pos/register.toml (macOS)   │
//! │                                                                         │
//! │  3. Default Values (lowest priority)                                   │
//! │     10% tax, 50 ms scan interval, 3 s banners                          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Configuration File Format
//! ```toml
//! # register.toml
//! [store]
//! name = "Corner Market"
//! currency_symbol = "$"
//! currency_decimals = 2
//! tax_rate_bps = 1000
//!
//! [scanner]
//! interval_ms = 50
//! reset_grace_ms = 50
//!
//! [timing]
//! success_banner_ms = 3000
//! scan_error_banner_ms = 3000
//! error_banner_ms = 5000
//! focus_restore_ms = 100
//!
//! [inventory]
//! low_stock_threshold = 20
//! expiry_window_days = 30
//! ```

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use till_core::money::Money;
use till_core::scanner::{ScanTiming, SCAN_INTERVAL_MS, SCAN_RESET_GRACE_MS};
use till_core::stock::SummaryThresholds;
use till_core::{TaxRate, DEFAULT_TAX_RATE, EXPIRY_WARNING_DAYS, LOW_STOCK_THRESHOLD};
use tracing::{debug, info, warn};

use crate::error::{ConfigError, ConfigResult};

// =============================================================================
// Store Settings
// =============================================================================

/// Store identity and money formatting.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoreSettings {
    /// Store name (shown in the header)
    #[serde(default = "default_store_name")]
    pub name: String,

    /// Currency symbol (for display)
    #[serde(default = "default_currency_symbol")]
    pub currency_symbol: String,

    /// Number of decimal places for currency
    #[serde(default = "default_currency_decimals")]
    pub currency_decimals: u8,

    /// Flat sales tax in basis points (1000 = 10%)
    #[serde(default = "default_tax_rate_bps")]
    pub tax_rate_bps: u32,
}

fn default_store_name() -> String {
    "Till POS".to_string()
}

fn default_currency_symbol() -> String {
    "$".to_string()
}

fn default_currency_decimals() -> u8 {
    2
}

fn default_tax_rate_bps() -> u32 {
    DEFAULT_TAX_RATE.bps()
}

impl Default for StoreSettings {
    fn default() -> Self {
        StoreSettings {
            name: default_store_name(),
            currency_symbol: default_currency_symbol(),
            currency_decimals: default_currency_decimals(),
            tax_rate_bps: default_tax_rate_bps(),
        }
    }
}

// =============================================================================
// Scanner Settings
// =============================================================================

/// Keystroke timing for telling a scanner from a person.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScannerSettings {
    /// Max gap between keys of one scan (milliseconds).
    #[serde(default = "default_scan_interval")]
    pub interval_ms: u64,

    /// Extra wait before an unfinished scan is dropped (milliseconds).
    #[serde(default = "default_scan_grace")]
    pub reset_grace_ms: u64,
}

fn default_scan_interval() -> u64 {
    SCAN_INTERVAL_MS
}

fn default_scan_grace() -> u64 {
    SCAN_RESET_GRACE_MS
}

impl Default for ScannerSettings {
    fn default() -> Self {
        ScannerSettings {
            interval_ms: default_scan_interval(),
            reset_grace_ms: default_scan_grace(),
        }
    }
}

// =============================================================================
// Timing Settings
// =============================================================================

/// How long transient UI state lives.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimingSettings {
    /// "Added: ..." and "Sale completed: ..." banners.
    #[serde(default = "default_success_banner")]
    pub success_banner_ms: u64,

    /// "Product with barcode ... not found" banner.
    #[serde(default = "default_scan_error_banner")]
    pub scan_error_banner_ms: u64,

    /// Any other error banner.
    #[serde(default = "default_error_banner")]
    pub error_banner_ms: u64,

    /// Delay before focus returns to the barcode field after a dialog.
    #[serde(default = "default_focus_restore")]
    pub focus_restore_ms: u64,
}

fn default_success_banner() -> u64 {
    3000
}

fn default_scan_error_banner() -> u64 {
    3000
}

fn default_error_banner() -> u64 {
    5000
}

fn default_focus_restore() -> u64 {
    100
}

impl Default for TimingSettings {
    fn default() -> Self {
        TimingSettings {
            success_banner_ms: default_success_banner(),
            scan_error_banner_ms: default_scan_error_banner(),
            error_banner_ms: default_error_banner(),
            focus_restore_ms: default_focus_restore(),
        }
    }
}

// =============================================================================
// Inventory Settings
// =============================================================================

/// Widest expiry warning window accepted, about ten years.
pub const MAX_EXPIRY_WINDOW_DAYS: i64 = 3650;

/// Dashboard thresholds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InventorySettings {
    #[serde(default = "default_low_stock")]
    pub low_stock_threshold: i64,

    #[serde(default = "default_expiry_window")]
    pub expiry_window_days: i64,
}

fn default_low_stock() -> i64 {
    LOW_STOCK_THRESHOLD
}

fn default_expiry_window() -> i64 {
    EXPIRY_WARNING_DAYS
}

impl Default for InventorySettings {
    fn default() -> Self {
        InventorySettings {
            low_stock_threshold: default_low_stock(),
            expiry_window_days: default_expiry_window(),
        }
    }
}

// =============================================================================
// Register Configuration
// =============================================================================

/// Complete register configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RegisterConfig {
    #[serde(default)]
    pub store: StoreSettings,

    #[serde(default)]
    pub scanner: ScannerSettings,

    #[serde(default)]
    pub timing: TimingSettings,

    #[serde(default)]
    pub inventory: InventorySettings,
}

impl RegisterConfig {
    /// Loads configuration from file, environment, and defaults.
    ///
    /// ## Load Order (later overrides earlier)
    /// 1. Default values
    /// 2. Config file (register.toml)
    /// 3. Environment variables
    pub fn load(config_path: Option<PathBuf>) -> ConfigResult<Self> {
        let mut config = Self::default();

        if let Some(path) = config_path.or_else(Self::default_config_path) {
            if path.exists() {
                info!(?path, "Loading register config from file");
                let contents = std::fs::read_to_string(&path)?;
                config = Self::from_toml(&contents)?;
            } else {
                debug!(?path, "Config file not found, using defaults");
            }
        }

        config.apply_overrides(|key| std::env::var(key).ok());
        config.validate()?;

        Ok(config)
    }

    /// Loads config or returns default if load fails.
    pub fn load_or_default(config_path: Option<PathBuf>) -> Self {
        Self::load(config_path).unwrap_or_else(|e| {
            warn!("Failed to load register config: {}. Using defaults.", e);
            Self::default()
        })
    }

    /// Parses a config file body. Missing sections take their defaults.
    pub fn from_toml(contents: &str) -> ConfigResult<Self> {
        Ok(toml::from_str(contents)?)
    }

    /// Saves configuration to file.
    pub fn save(&self, config_path: Option<PathBuf>) -> ConfigResult<()> {
        let path = config_path
            .or_else(Self::default_config_path)
            .ok_or_else(|| ConfigError::SaveFailed("No config path available".into()))?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let contents = toml::to_string_pretty(self)?;
        std::fs::write(&path, contents)?;

        info!(?path, "Register config saved");
        Ok(())
    }

    /// Validates the configuration.
    pub fn validate(&self) -> ConfigResult<()> {
        if self.store.name.trim().is_empty() {
            return Err(ConfigError::Invalid("store.name must not be empty".into()));
        }

        if self.store.currency_decimals > 4 {
            return Err(ConfigError::Invalid(format!(
                "store.currency_decimals must be at most 4, got {}",
                self.store.currency_decimals
            )));
        }

        if self.store.tax_rate_bps > 10_000 {
            return Err(ConfigError::Invalid(format!(
                "store.tax_rate_bps must be between 0 and 10000, got {}",
                self.store.tax_rate_bps
            )));
        }

        if self.scanner.interval_ms == 0 {
            return Err(ConfigError::Invalid(
                "scanner.interval_ms must be greater than 0".into(),
            ));
        }

        let banners = [
            ("timing.success_banner_ms", self.timing.success_banner_ms),
            ("timing.scan_error_banner_ms", self.timing.scan_error_banner_ms),
            ("timing.error_banner_ms", self.timing.error_banner_ms),
        ];
        if let Some((name, _)) = banners.iter().find(|(_, ms)| *ms == 0) {
            return Err(ConfigError::Invalid(format!(
                "{} must be greater than 0",
                name
            )));
        }

        if self.inventory.low_stock_threshold < 0 {
            return Err(ConfigError::Invalid(
                "inventory.low_stock_threshold must not be negative".into(),
            ));
        }

        if !(1..=MAX_EXPIRY_WINDOW_DAYS).contains(&self.inventory.expiry_window_days) {
            return Err(ConfigError::Invalid(format!(
                "inventory.expiry_window_days must be between 1 and {}, got {}",
                MAX_EXPIRY_WINDOW_DAYS, self.inventory.expiry_window_days
            )));
        }

        Ok(())
    }

    /// Applies `TILL_*` overrides from a variable lookup.
    ///
    /// `load` passes the process environment; tests pass a map.
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(name) = lookup("TILL_STORE_NAME") {
            debug!(store_name = %name, "Overriding store name from environment");
            self.store.name = name;
        }

        if let Some(symbol) = lookup("TILL_CURRENCY_SYMBOL") {
            self.store.currency_symbol = symbol;
        }

        override_number(&lookup, "TILL_TAX_RATE_BPS", &mut self.store.tax_rate_bps);
        override_number(&lookup, "TILL_SCAN_INTERVAL_MS", &mut self.scanner.interval_ms);
        override_number(
            &lookup,
            "TILL_SCAN_RESET_GRACE_MS",
            &mut self.scanner.reset_grace_ms,
        );
        override_number(
            &lookup,
            "TILL_FOCUS_RESTORE_MS",
            &mut self.timing.focus_restore_ms,
        );
        override_number(
            &lookup,
            "TILL_LOW_STOCK_THRESHOLD",
            &mut self.inventory.low_stock_threshold,
        );
        override_number(
            &lookup,
            "TILL_EXPIRY_WINDOW_DAYS",
            &mut self.inventory.expiry_window_days,
        );
    }

    /// Returns the default config file path.
    pub fn default_config_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("com", "till", "pos")
            .map(|dirs| dirs.config_dir().join("register.toml"))
    }

    // =========================================================================
    // Convenience Methods
    // =========================================================================

    pub fn tax_rate(&self) -> TaxRate {
        TaxRate::from_bps(self.store.tax_rate_bps)
    }

    pub fn scan_timing(&self) -> ScanTiming {
        ScanTiming {
            interval_ms: self.scanner.interval_ms,
            reset_grace_ms: self.scanner.reset_grace_ms,
        }
    }

    pub fn summary_thresholds(&self) -> SummaryThresholds {
        SummaryThresholds {
            low_stock: self.inventory.low_stock_threshold,
            expiry_window_days: self.inventory.expiry_window_days,
        }
    }

    /// Formats money with the configured symbol and decimals.
    ///
    /// ## Example
    /// ```rust
    /// use till_core::Money;
    /// use till_register::config::RegisterConfig;
    ///
    /// let config = RegisterConfig::default();
    /// assert_eq!(config.format_currency(Money::from_cents(1042)), "$10.42");
    /// ```
    pub fn format_currency(&self, amount: Money) -> String {
        let cents = amount.cents();
        let decimals = self.store.currency_decimals as u32;
        let sign = if cents < 0 { "-" } else { "" };

        // Money is always in hundredths; rescale for other precisions
        let scaled = match decimals {
            2 => cents.unsigned_abs(),
            d if d < 2 => {
                let div = 10_u64.pow(2 - d);
                (cents.unsigned_abs() + div / 2) / div
            }
            d => cents.unsigned_abs() * 10_u64.pow(d - 2),
        };

        if decimals == 0 {
            return format!("{}{}{}", sign, self.store.currency_symbol, scaled);
        }

        let divisor = 10_u64.pow(decimals);
        format!(
            "{}{}{}.{:0width$}",
            sign,
            self.store.currency_symbol,
            scaled / divisor,
            scaled % divisor,
            width = decimals as usize
        )
    }
}

/// Parses a numeric override, ignoring (with a warning) anything unparsable.
fn override_number<F, T>(lookup: &F, key: &str, target: &mut T)
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr + std::fmt::Display,
{
    let Some(raw) = lookup(key) else {
        return;
    };

    match raw.trim().parse::<T>() {
        Ok(value) => {
            debug!(key, %value, "Overriding config value from environment");
            *target = value;
        }
        Err(_) => warn!(key, value = %raw, "Ignoring unparsable environment override"),
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    fn scratch_path() -> PathBuf {
        std::env::temp_dir().join(format!("till-register-{}.toml", uuid::Uuid::new_v4()))
    }

    #[test]
    fn test_default_config() {
        let config = RegisterConfig::default();
        assert_eq!(config.tax_rate().bps(), 1000);
        assert_eq!(config.scan_timing().reset_after_ms(), 100);
        assert_eq!(config.timing.error_banner_ms, 5000);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = RegisterConfig::from_toml(
            r#"
            [store]
            name = "Corner Market"
            tax_rate_bps = 825

            [scanner]
            interval_ms = 30
            "#,
        )
        .unwrap();

        assert_eq!(config.store.name, "Corner Market");
        assert_eq!(config.store.currency_symbol, "$");
        assert_eq!(config.tax_rate().bps(), 825);
        assert_eq!(config.scanner.interval_ms, 30);
        assert_eq!(config.scanner.reset_grace_ms, 50);
        assert_eq!(config.timing, TimingSettings::default());
    }

    #[test]
    fn test_malformed_toml_is_load_error() {
        let err = RegisterConfig::from_toml("[store\nname = 1").unwrap_err();
        assert!(matches!(err, ConfigError::LoadFailed(_)));
    }

    #[test]
    fn test_env_overrides() {
        let mut config = RegisterConfig::default();
        config.apply_overrides(env(&[
            ("TILL_STORE_NAME", "Night Shift"),
            ("TILL_TAX_RATE_BPS", "825"),
            ("TILL_SCAN_INTERVAL_MS", "not-a-number"),
            ("TILL_EXPIRY_WINDOW_DAYS", "14"),
        ]));

        assert_eq!(config.store.name, "Night Shift");
        assert_eq!(config.store.tax_rate_bps, 825);
        assert_eq!(config.scanner.interval_ms, 50);
        assert_eq!(config.inventory.expiry_window_days, 14);
    }

    #[test]
    fn test_config_validation() {
        let mut config = RegisterConfig::default();
        config.store.tax_rate_bps = 10_001;
        assert!(config.validate().is_err());

        let mut config = RegisterConfig::default();
        config.scanner.interval_ms = 0;
        assert!(config.validate().is_err());

        let mut config = RegisterConfig::default();
        config.timing.scan_error_banner_ms = 0;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("scan_error_banner_ms"));

        let mut config = RegisterConfig::default();
        config.store.name = "  ".into();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_expiry_window_is_bounded() {
        let mut config = RegisterConfig::default();
        config.apply_overrides(env(&[("TILL_EXPIRY_WINDOW_DAYS", "100000000000000")]));
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("expiry_window_days"));

        let mut config = RegisterConfig::default();
        config.inventory.expiry_window_days = MAX_EXPIRY_WINDOW_DAYS;
        assert!(config.validate().is_ok());

        config.inventory.expiry_window_days = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_save_and_load_round_trip() {
        let path = scratch_path();
        let mut config = RegisterConfig::default();
        config.store.name = "Saved Store".into();
        config.timing.focus_restore_ms = 250;

        config.save(Some(path.clone())).unwrap();
        let loaded = RegisterConfig::load(Some(path.clone())).unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(loaded.store.name, "Saved Store");
        assert_eq!(loaded.timing.focus_restore_ms, 250);
    }

    #[test]
    fn test_invalid_file_falls_back_to_defaults() {
        let path = scratch_path();
        std::fs::write(&path, "[store]\ntax_rate_bps = 20000\n").unwrap();

        assert!(RegisterConfig::load(Some(path.clone())).is_err());
        let config = RegisterConfig::load_or_default(Some(path.clone()));
        std::fs::remove_file(&path).ok();

        assert_eq!(config.tax_rate().bps(), 1000);
    }

    #[test]
    fn test_format_currency() {
        let mut config = RegisterConfig::default();
        assert_eq!(config.format_currency(Money::from_cents(1234)), "$12.34");
        assert_eq!(config.format_currency(Money::from_cents(-550)), "-$5.50");
        assert_eq!(config.format_currency(Money::zero()), "$0.00");

        config.store.currency_symbol = "¥".into();
        config.store.currency_decimals = 0;
        assert_eq!(config.format_currency(Money::from_cents(1250)), "¥13");

        config.store.currency_symbol = "BD ".into();
        config.store.currency_decimals = 3;
        assert_eq!(config.format_currency(Money::from_cents(1250)), "BD 12.500");
    }
}
