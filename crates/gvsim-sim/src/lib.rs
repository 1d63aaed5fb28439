//! Top-level simulator facade (§6): configuration loading, component
//! wiring, and the host control API (`open`/`start`/`step_until`/`run`/
//! `join`/`stop`/`close`) that ties every other `gvsim-*` crate into one
//! runnable machine.
//!
//! Everything here is explicitly a convenience layer, not part of the
//! execution core's own contract — a real host embeds `gvsim-exec`
//! directly against its own bus and configuration surface. This crate
//! exists so the workspace has something that actually runs end to end,
//! the way `engine/src/main.cpp` is a thin driver over the teacher's
//! `emu-core` machinery rather than where the emulation logic lives.

mod config;
mod demo_bus;
mod simulator;

pub use config::{ApiMode, ConfigError, Configuration};
pub use demo_bus::DemoBus;
pub use simulator::{
    Simulator, DEADLOCK_EXIT_CODE, DEFAULT_ENTRY_PC, DEMO_MEM_REGION_BASE, DEMO_MEM_REGION_SIZE,
    DEMO_MEM_REGION_VIRTUAL_BASE, DEMO_RAM_SIZE, DEMO_SLOW_DEVICE_BASE, DEMO_SLOW_DEVICE_LATENCY,
    DEMO_SLOW_DEVICE_SIZE,
};
