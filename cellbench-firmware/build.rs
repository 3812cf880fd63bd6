//! Build script for cellbench-firmware
//!
//! - Sets up linker search paths and scripts for memory.x
//! - Parses and validates bench.toml, then embeds it as a postcard blob

use std::env;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use cellbench_core::config::{BenchConfig, ConfigError};

/// File name of the encoded configuration inside OUT_DIR
const CONFIG_BLOB: &str = "bench_config.bin";

fn main() {
    let out_dir = PathBuf::from(env::var("OUT_DIR").unwrap());
    setup_linker(&out_dir);
    embed_config(&out_dir);
}

/// Set up linker search paths for memory.x
fn setup_linker(out_dir: &Path) {
    // Copy memory.x to the output directory
    let memory_x = include_bytes!("memory.x");
    let mut f = File::create(out_dir.join("memory.x")).unwrap();
    f.write_all(memory_x).unwrap();

    // Tell rustc where to find memory.x
    println!("cargo:rustc-link-search={}", out_dir.display());

    println!("cargo:rustc-link-arg-bins=--nmagic");
    println!("cargo:rustc-link-arg-bins=-Tlink.x");
    println!("cargo:rustc-link-arg-bins=-Tlink-rp.x");
    println!("cargo:rustc-link-arg-bins=-Tdefmt.x");

    // Re-run if memory.x changes
    println!("cargo:rerun-if-changed=memory.x");
    println!("cargo:rerun-if-changed=build.rs");
}

/// Parse bench.toml, validate it and write the encoded form to OUT_DIR
fn embed_config(out_dir: &Path) {
    println!("cargo:rerun-if-changed=bench.toml");

    let config_path = Path::new("bench.toml");

    if !config_path.exists() {
        panic!(
            "\n\
            ╔══════════════════════════════════════════════════════════════════╗\n\
            ║  ERROR: bench.toml not found!                                    ║\n\
            ║                                                                  ║\n\
            ║  The firmware embeds its configuration from bench.toml in the    ║\n\
            ║  cellbench-firmware directory. Restore it to build.              ║\n\
            ╚══════════════════════════════════════════════════════════════════╝\n"
        );
    }

    let content = match fs::read_to_string(config_path) {
        Ok(content) => content,
        Err(e) => {
            panic!(
                "\n\
                ╔══════════════════════════════════════════════════════════════════╗\n\
                ║  ERROR: Failed to read bench.toml                                ║\n\
                ║                                                                  ║\n\
                ║  Error: {:<56} ║\n\
                ╚══════════════════════════════════════════════════════════════════╝\n",
                e
            );
        }
    };

    let config: BenchConfig = match toml::from_str(&content) {
        Ok(config) => config,
        Err(e) => {
            panic!(
                "\n\
                ╔══════════════════════════════════════════════════════════════════╗\n\
                ║  ERROR: Invalid bench.toml                                       ║\n\
                ╠══════════════════════════════════════════════════════════════════╣\n\
                {}\n\
                ╚══════════════════════════════════════════════════════════════════╝\n",
                e.to_string()
                    .lines()
                    .map(|l| format!("║  {:<64}║", l))
                    .collect::<Vec<_>>()
                    .join("\n")
            );
        }
    };

    if let Err(e) = config.validate() {
        panic!(
            "\n\
            ╔══════════════════════════════════════════════════════════════════╗\n\
            ║  ERROR: Invalid bench configuration                              ║\n\
            ╠══════════════════════════════════════════════════════════════════╣\n\
            ║  • {:<62} ║\n\
            ╚══════════════════════════════════════════════════════════════════╝\n",
            describe(e)
        );
    }

    let blob = postcard::to_stdvec(&config).unwrap();
    fs::write(out_dir.join(CONFIG_BLOB), blob).unwrap();
}

fn describe(error: ConfigError) -> &'static str {
    match error {
        ConfigError::InvalidOption => "session.option must be 1-4",
        ConfigError::InvalidCellCount => "session.cell_count must be 1-4",
        ConfigError::InvalidLevelRange => "control levels must satisfy min <= start <= max",
        ConfigError::InvalidTiming => "tick_hz, window_ticks and wait_secs must be non-zero",
        ConfigError::InvalidGains => "gains must be finite and >= 0, error_limit > 0",
        ConfigError::InvalidResistanceTiming => {
            "timing: 2 <= resistance_step_at < resistance_secs"
        }
        ConfigError::InvalidLimits => "safety limits are inconsistent",
    }
}
