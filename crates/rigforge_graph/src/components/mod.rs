// SPDX-License-Identifier: MIT OR Apache-2.0
//! Built-in component kinds.
//!
//! Each kind comes as a guide (authoring parameters) and, where the build
//! differs, a rig counterpart that the guide's build data loads into.

pub mod fk_chain;
pub mod generic;
pub mod main_srt;

use crate::registry::ComponentRegistry;

/// Module path of [`generic`]
pub const GENERIC_MODULE: &str = "rigforge.components.generic";
/// Module path of [`main_srt`]
pub const MAIN_SRT_MODULE: &str = "rigforge.components.main_srt";
/// Module path of [`fk_chain`]
pub const FK_CHAIN_MODULE: &str = "rigforge.components.fk_chain";

/// Register the built-in modules (their types load on first use)
pub fn register_standard_modules(registry: &mut ComponentRegistry) {
    registry.register_module(GENERIC_MODULE, generic::register);
    registry.register_module(MAIN_SRT_MODULE, main_srt::register);
    registry.register_module(FK_CHAIN_MODULE, fk_chain::register);
}
