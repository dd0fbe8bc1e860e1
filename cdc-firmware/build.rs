//! Build script for cdc-firmware
//!
//! - Sets up linker search paths for memory.x
//! - Validates machine.toml and embeds it as postcard binary

use std::env;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use cdc_core::config::MachineConfig;

/// Top-level tables accepted in machine.toml
const KNOWN_SECTIONS: &[&str] = &["axis", "servo", "homing", "sensors", "console"];

fn main() {
    setup_linker();
    let config = validate_config();
    embed_config(&config);
}

/// Set up linker search paths for memory.x
fn setup_linker() {
    let out_dir = PathBuf::from(env::var("OUT_DIR").unwrap());

    // Copy memory.x to the output directory
    let memory_x = include_bytes!("memory.x");
    let mut f = File::create(out_dir.join("memory.x")).unwrap();
    f.write_all(memory_x).unwrap();

    // Tell rustc where to find memory.x
    println!("cargo:rustc-link-search={}", out_dir.display());

    println!("cargo:rustc-link-arg-bins=--nmagic");
    println!("cargo:rustc-link-arg-bins=-Tlink.x");
    println!("cargo:rustc-link-arg-bins=-Tlink-rp.x");
    if env::var_os("CARGO_FEATURE_DEFMT").is_some() {
        println!("cargo:rustc-link-arg-bins=-Tdefmt.x");
    }

    println!("cargo:rerun-if-changed=memory.x");
    println!("cargo:rerun-if-changed=build.rs");
}

/// Parse and validate machine.toml at compile time
fn validate_config() -> MachineConfig {
    println!("cargo:rerun-if-changed=machine.toml");

    let config_path = Path::new("machine.toml");

    if !config_path.exists() {
        panic!(
            "\n\
            ╔══════════════════════════════════════════════════════════════════╗\n\
            ║  ERROR: machine.toml not found!                                  ║\n\
            ║                                                                  ║\n\
            ║  The firmware requires a machine.toml configuration file.        ║\n\
            ║  Please create one in the cdc-firmware directory.                ║\n\
            ╚══════════════════════════════════════════════════════════════════╝\n"
        );
    }

    let config_content = match fs::read_to_string(config_path) {
        Ok(content) => content,
        Err(e) => {
            panic!(
                "\n\
                ╔══════════════════════════════════════════════════════════════════╗\n\
                ║  ERROR: Failed to read machine.toml                              ║\n\
                ║                                                                  ║\n\
                ║  Error: {:<56} ║\n\
                ╚══════════════════════════════════════════════════════════════════╝\n",
                e
            );
        }
    };

    let value: toml::Value = match toml::from_str(&config_content) {
        Ok(value) => value,
        Err(e) => {
            panic!(
                "\n\
                ╔══════════════════════════════════════════════════════════════════╗\n\
                ║  ERROR: Invalid TOML syntax in machine.toml                      ║\n\
                ╠══════════════════════════════════════════════════════════════════╣\n\
                {}\n\
                ╚══════════════════════════════════════════════════════════════════╝\n",
                format_error_lines(&e.to_string())
            );
        }
    };

    validate_sections(&value);

    let config: MachineConfig = match value.try_into() {
        Ok(config) => config,
        Err(e) => {
            panic!(
                "\n\
                ╔══════════════════════════════════════════════════════════════════╗\n\
                ║  ERROR: Invalid value in machine.toml                            ║\n\
                ╠══════════════════════════════════════════════════════════════════╣\n\
                {}\n\
                ╚══════════════════════════════════════════════════════════════════╝\n",
                format_error_lines(&e.to_string())
            );
        }
    };

    if let Err(e) = config.validate() {
        panic!(
            "\n\
            ╔══════════════════════════════════════════════════════════════════╗\n\
            ║  ERROR: machine.toml failed validation                           ║\n\
            ║                                                                  ║\n\
            ║  {:<64} ║\n\
            ╚══════════════════════════════════════════════════════════════════╝\n",
            format!("{:?}", e)
        );
    }

    check_homing_reach(&config);

    println!("cargo:warning=machine.toml validated successfully");
    config
}

/// Format error message lines with box drawing
fn format_error_lines(msg: &str) -> String {
    msg.lines()
        .map(|line| {
            let truncated = if line.len() > 64 {
                format!("{}...", &line[..61])
            } else {
                line.to_string()
            };
            format!("║  {:<64} ║", truncated)
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Reject unknown top-level tables (usually a typo)
fn validate_sections(value: &toml::Value) {
    let Some(table) = value.as_table() else {
        return;
    };

    let errors: Vec<String> = table
        .keys()
        .filter(|key| !KNOWN_SECTIONS.contains(&key.as_str()))
        .map(|key| format!("Unknown section [{}]", key))
        .collect();

    if !errors.is_empty() {
        panic!(
            "\n\
            ╔══════════════════════════════════════════════════════════════════╗\n\
            ║  ERROR: Unknown sections in machine.toml                         ║\n\
            ╠══════════════════════════════════════════════════════════════════╣\n\
            {}\n\
            ║  Known: {:<56} ║\n\
            ╚══════════════════════════════════════════════════════════════════╝\n",
            errors
                .iter()
                .map(|e| format!("║  • {:<62} ║", e))
                .collect::<Vec<_>>()
                .join("\n"),
            KNOWN_SECTIONS.join(", ")
        );
    }
}

/// Warn when the homing time budget cannot cover the full travel
fn check_homing_reach(config: &MachineConfig) {
    let travel_steps = config
        .axis
        .mm_to_steps(config.axis.max_height_mm - config.axis.min_height_mm)
        .unsigned_abs();
    let seek_steps = config.homing.max_seek_steps();

    if seek_steps < travel_steps {
        println!(
            "cargo:warning=homing.timeout_ms allows {} seek steps but the axis spans {} steps",
            seek_steps, travel_steps
        );
    }
}

/// Serialize the validated config for the firmware to load at boot
fn embed_config(config: &MachineConfig) {
    let out_dir = PathBuf::from(env::var("OUT_DIR").unwrap());
    let bytes = postcard::to_stdvec(config).unwrap();
    fs::write(out_dir.join("machine.bin"), bytes).unwrap();
}
