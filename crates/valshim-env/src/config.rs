//! Configuration management for Valshim environments
//!
//! Provides geometry presets for different workload sizes
//! and validation before anything reaches the engine.

use valshim_core::EnvFlags;

/// Engine default for any geometry field.
pub const DEFAULT_GEOMETRY: isize = -1;

const MIB: isize = 1024 * 1024;
const GIB: isize = 1024 * MIB;

/// Environment configuration with geometry presets
#[derive(Debug, Clone)]
pub struct Config {
    /// Maximum number of named tables
    pub max_tables: u64,
    /// Maximum number of concurrent read transactions
    pub max_readers: u64,
    /// Lower bound of the data file size (bytes, -1 for default)
    pub size_lower: isize,
    /// Upper bound of the data file size (bytes, -1 for default)
    pub size_upper: isize,
    /// Growth step when the file is extended (bytes, -1 for default)
    pub growth_step: isize,
    /// Shrink the file once this much space is free (bytes, -1 for default)
    pub shrink_threshold: isize,
    /// Database page size (bytes, -1 for default)
    pub page_size: isize,
    /// Unix permission bits for created files
    pub file_mode: u32,
    /// Environment open flags
    pub flags: EnvFlags,
}

impl Config {
    /// Test and tooling scale: grows to 64MB
    pub fn small() -> Self {
        Self {
            max_tables: 16,
            max_readers: 64,
            size_lower: DEFAULT_GEOMETRY,
            size_upper: 64 * MIB,
            growth_step: MIB,
            shrink_threshold: DEFAULT_GEOMETRY,
            page_size: DEFAULT_GEOMETRY,
            file_mode: 0o644,
            flags: EnvFlags::empty(),
        }
    }

    /// Service scale: grows to 16GB
    pub fn standard() -> Self {
        Self {
            max_tables: 64,
            max_readers: 126,
            size_lower: DEFAULT_GEOMETRY,
            size_upper: 16 * GIB,
            growth_step: 64 * MIB,
            shrink_threshold: 256 * MIB,
            page_size: DEFAULT_GEOMETRY,
            file_mode: 0o644,
            flags: EnvFlags::empty(),
        }
    }

    /// Archive scale: grows to 1TB with 16KB pages
    pub fn large() -> Self {
        Self {
            max_tables: 128,
            max_readers: 256,
            size_lower: DEFAULT_GEOMETRY,
            size_upper: 1024 * GIB,
            growth_step: 1024 * MIB,
            shrink_threshold: 4 * GIB,
            page_size: 16 * 1024,
            file_mode: 0o644,
            flags: EnvFlags::empty(),
        }
    }

    /// Validate all configuration parameters
    pub fn validate(&self) -> Result<(), String> {
        if self.max_tables == 0 || self.max_tables > 32765 {
            return Err("max_tables must be in [1, 32765]".into());
        }
        if self.max_readers == 0 {
            return Err("max_readers must be > 0".into());
        }
        for (name, value) in [
            ("size_lower", self.size_lower),
            ("size_upper", self.size_upper),
            ("growth_step", self.growth_step),
            ("shrink_threshold", self.shrink_threshold),
            ("page_size", self.page_size),
        ] {
            if value < DEFAULT_GEOMETRY {
                return Err(format!("{} must be >= 0 or -1 for the default", name));
            }
        }
        if self.size_lower > 0 && self.size_upper > 0 && self.size_lower > self.size_upper {
            return Err("size_lower must not exceed size_upper".into());
        }
        if self.page_size > 0
            && (!(self.page_size as usize).is_power_of_two()
                || self.page_size < 256
                || self.page_size > 65536)
        {
            return Err("page_size must be a power of two in [256, 64KB]".into());
        }
        if self.file_mode > 0o777 {
            return Err("file_mode must be permission bits only".into());
        }
        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self { Self::standard() }
}
