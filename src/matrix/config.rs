use std::path::Path;

use anyhow::Context as _;

use crate::foundation::core::Geometry;
use crate::foundation::error::{MatrixError, MatrixResult};

/// Default address of the RPC matrix server.
pub const DEFAULT_REMOTE_ADDR: &str = "127.0.0.1:1234";

/// Which backend [`crate::create_matrix`] builds.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BackendKind {
    /// Physical panel driven through `rpi-led-matrix` (feature `hardware`).
    Native,
    /// In-memory double buffer, observable from tests and previews.
    #[default]
    Simulated,
    /// Proxy to a [`crate::remote::MatrixServer`] at `remote_addr`.
    Remote,
}

/// Panel scan order.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScanMode {
    /// Rows are refreshed top to bottom.
    #[default]
    Progressive,
    /// Odd and even rows are refreshed alternately.
    Interlaced,
}

impl ScanMode {
    /// Numeric value understood by the panel driver.
    pub fn as_driver_value(self) -> u32 {
        match self {
            ScanMode::Progressive => 0,
            ScanMode::Interlaced => 1,
        }
    }
}

/// Matrix construction options.
///
/// Unknown JSON fields are rejected; missing fields take the defaults of
/// [`MatrixConfig::default`].
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MatrixConfig {
    /// Rows per panel.
    pub rows: usize,
    /// Columns per panel.
    pub cols: usize,
    /// Panels daisy-chained per output.
    pub chain_length: usize,
    /// Parallel chains.
    pub parallel: usize,
    /// PWM bit depth, `1..=11`.
    pub pwm_bits: u8,
    /// Base time unit of the PWM in nanoseconds.
    pub pwm_lsb_nanoseconds: u32,
    /// Brightness percent, `1..=100`.
    pub brightness: u8,
    /// Scan mode.
    pub scan_mode: ScanMode,
    /// Use software timing instead of the hardware pulse generator.
    pub disable_hardware_pulsing: bool,
    /// Print the refresh rate from the driver.
    pub show_refresh_rate: bool,
    /// Invert every color (some panels are wired active-low).
    pub inverse_colors: bool,
    /// GPIO mapping name.
    pub hardware_mapping: String,
    /// Backend selected by [`crate::create_matrix`].
    pub backend: BackendKind,
    /// Server address used when `backend` is [`BackendKind::Remote`].
    pub remote_addr: String,
}

impl Default for MatrixConfig {
    fn default() -> Self {
        Self {
            rows: 32,
            cols: 32,
            chain_length: 1,
            parallel: 1,
            pwm_bits: 11,
            pwm_lsb_nanoseconds: 130,
            brightness: 100,
            scan_mode: ScanMode::Progressive,
            disable_hardware_pulsing: false,
            show_refresh_rate: false,
            inverse_colors: false,
            hardware_mapping: "regular".to_string(),
            backend: BackendKind::Simulated,
            remote_addr: DEFAULT_REMOTE_ADDR.to_string(),
        }
    }
}

impl MatrixConfig {
    /// Parse a configuration from JSON and validate it.
    pub fn from_json_str(s: &str) -> MatrixResult<Self> {
        let cfg: Self = serde_json::from_str(s)
            .map_err(|e| MatrixError::validation(format!("invalid matrix config: {e}")))?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Read and validate a JSON configuration file.
    pub fn from_path(path: impl AsRef<Path>) -> MatrixResult<Self> {
        let path = path.as_ref();
        let s = std::fs::read_to_string(path)
            .with_context(|| format!("read matrix config '{}'", path.display()))?;
        Self::from_json_str(&s)
    }

    /// Overall surface size: `(cols * chain_length, rows * parallel)`.
    pub fn geometry(&self) -> Geometry {
        Geometry::new(self.cols * self.chain_length, self.rows * self.parallel)
    }

    /// Check ranges of every numeric option.
    pub fn validate(&self) -> MatrixResult<()> {
        if self.rows == 0 || self.cols == 0 {
            return Err(MatrixError::validation("rows and cols must be > 0"));
        }
        if self.chain_length == 0 || self.parallel == 0 {
            return Err(MatrixError::validation(
                "chain_length and parallel must be > 0",
            ));
        }
        if !(1..=100).contains(&self.brightness) {
            return Err(MatrixError::validation(format!(
                "brightness must be in 1..=100, got {}",
                self.brightness
            )));
        }
        if !(1..=11).contains(&self.pwm_bits) {
            return Err(MatrixError::validation(format!(
                "pwm_bits must be in 1..=11, got {}",
                self.pwm_bits
            )));
        }
        if self.backend == BackendKind::Remote && self.remote_addr.trim().is_empty() {
            return Err(MatrixError::validation(
                "remote_addr is required for the remote backend",
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/matrix/config.rs"]
mod tests;
