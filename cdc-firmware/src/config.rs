//! Embedded machine configuration
//!
//! `build.rs` validates machine.toml and serializes it with postcard;
//! the bytes are compiled into the image and decoded once at boot.

use defmt::*;

use cdc_core::config::MachineConfig;

/// Validated configuration produced by the build script
static MACHINE_BIN: &[u8] = include_bytes!(concat!(env!("OUT_DIR"), "/machine.bin"));

/// Decode the embedded configuration
///
/// Falls back to the built-in defaults if the blob does not decode, which
/// only happens when the build script and firmware disagree on the types.
pub fn load() -> MachineConfig {
    match postcard::from_bytes::<MachineConfig>(MACHINE_BIN) {
        Ok(config) => {
            info!("Loaded machine config ({} bytes)", MACHINE_BIN.len());
            config
        }
        Err(_) => {
            warn!("Embedded machine config did not decode, using defaults");
            MachineConfig::default()
        }
    }
}
