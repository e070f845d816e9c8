//! Engine settings file format and operations.

use std::path::Path;

use serde::{Deserialize, Serialize};
use sonance_core::{DEFAULT_BLOCK_SIZE, DEFAULT_SAMPLE_RATE, Dispatcher, GraphConfig};
use sonance_io::PcmFormat;

use crate::error::ConfigError;

/// Byte format written to the device, as spelled in the settings file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SampleFormat {
    /// Signed 16-bit little-endian.
    #[default]
    I16,
    /// 32-bit float little-endian.
    F32,
}

impl From<SampleFormat> for PcmFormat {
    fn from(format: SampleFormat) -> Self {
        match format {
            SampleFormat::I16 => PcmFormat::I16,
            SampleFormat::F32 => PcmFormat::F32,
        }
    }
}

/// Settings for building a graph, its dispatcher and its player.
///
/// Every key is optional; missing keys take the defaults below.
///
/// # TOML Format
///
/// ```toml
/// sample_rate = 44100.0
/// block_size = 256
/// workers = 0          # 0 = one worker per hardware thread
/// format = "i16"       # or "f32"
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Sample rate in Hz.
    pub sample_rate: f64,
    /// Frames per block. Must be a power of two.
    pub block_size: usize,
    /// Dispatch threads. `1` runs on the calling thread, `0` uses every
    /// hardware thread.
    pub workers: usize,
    /// Device byte format.
    pub format: SampleFormat,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            sample_rate: DEFAULT_SAMPLE_RATE,
            block_size: DEFAULT_BLOCK_SIZE,
            workers: 0,
            format: SampleFormat::I16,
        }
    }
}

impl EngineConfig {
    /// Load settings from a TOML string.
    pub fn from_toml(toml_str: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(toml_str)?)
    }

    /// Load settings from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content =
            std::fs::read_to_string(path).map_err(|e| ConfigError::read_file(path, e))?;
        Self::from_toml(&content)
    }

    /// Convert the settings to a TOML string.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Save the settings to a TOML file, creating parent directories.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
            && !parent.exists()
        {
            std::fs::create_dir_all(parent).map_err(|e| ConfigError::create_dir(parent, e))?;
        }
        let content = self.to_toml()?;
        std::fs::write(path, content).map_err(|e| ConfigError::write_file(path, e))?;
        Ok(())
    }

    /// Checks the sample rate and block size the way `Graph::new` will.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.graph_config().map(|_| ())
    }

    /// The validated graph settings.
    pub fn graph_config(&self) -> Result<GraphConfig, ConfigError> {
        Ok(GraphConfig::new(self.sample_rate, self.block_size)?)
    }

    /// The device byte format.
    pub fn pcm_format(&self) -> PcmFormat {
        self.format.into()
    }

    /// Builds the dispatcher: serial for one worker, a thread pool otherwise.
    pub fn dispatcher(&self) -> Result<Dispatcher, ConfigError> {
        if self.workers == 1 {
            return Ok(Dispatcher::serial());
        }
        Ok(Dispatcher::new(self.workers)?)
    }
}
