//! Bench configuration loading
//!
//! `build.rs` validates bench.toml and embeds it postcard-encoded. Decoding
//! only fails if the image and the core's config layout disagree; the
//! defaults are used then.

use defmt::*;

use cellbench_core::config::{BenchConfig, ConfigError, TestPlan};

/// Configuration embedded at build time
static CONFIG_BLOB: &[u8] = include_bytes!(concat!(env!("OUT_DIR"), "/bench_config.bin"));

/// Decode and validate the embedded configuration
pub fn load() -> Result<(BenchConfig, TestPlan), ConfigError> {
    let config = match postcard::from_bytes::<BenchConfig>(CONFIG_BLOB) {
        Ok(config) => config,
        Err(_) => {
            warn!("Embedded configuration unreadable, using defaults");
            BenchConfig::default()
        }
    };
    config.validate()?;
    let plan = config.session.to_plan()?;
    Ok((config, plan))
}
