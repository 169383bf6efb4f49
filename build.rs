//! Build script for the motor controller firmware.
//!
//! Adds the cortex-m-rt and defmt linker scripts when linking the firmware
//! binary for a bare-metal target. `memory.x` itself comes from the
//! `memory-x` feature of embassy-stm32. Host builds (library tests) get no
//! extra link arguments.

use std::env;

fn main() {
    if env::var("CARGO_CFG_TARGET_OS").as_deref() == Ok("none") {
        println!("cargo:rustc-link-arg-bins=--nmagic");
        println!("cargo:rustc-link-arg-bins=-Tlink.x");
        println!("cargo:rustc-link-arg-bins=-Tdefmt.x");
    }

    println!("cargo:rerun-if-changed=build.rs");
}
