// SPDX-License-Identifier: MIT OR Apache-2.0
//! Component graph model for procedural character rigs.
//!
//! A [`Rig`] holds typed, connectable [`Component`]s. Its wiring and
//! parameters round-trip through a portable document ([`Value`]) that the
//! [`codec`] writes as JSON or RON.
//!
//! ## Pipeline
//!
//! - Guide: the authoring document, produced by [`Rig::get_data`]
//! - Build: the resolved document, produced by [`Rig::get_rig_build_data`]
//!   and consumed by a [`Builder`]
//!
//! Component classes resolve through a [`ComponentRegistry`] whose modules
//! load lazily, and every load takes a [`RigContext`] instead of relying on
//! process-wide state.

pub mod builder;
pub mod codec;
pub mod component;
pub mod components;
pub mod connection;
pub mod document;
pub mod math;
pub mod port;
pub mod profiler;
pub mod registry;
pub mod rig;

pub use builder::{BuildReport, Builder, BuilderError, TraceBuilder};
pub use codec::{CodecError, Format};
pub use component::{Component, ComponentId, ComponentKind};
pub use connection::{Connection, ConnectionRecord};
pub use document::{DocumentError, Map, Value};
pub use math::{Quat, Vec3, Xfo};
pub use port::{DataType, Port, PortAddress, PortDirection, PortError, PortSpec};
pub use profiler::Profiler;
pub use registry::{ComponentRegistry, TypeResolutionError};
pub use rig::{ConnectionPolicy, DefinitionKind, Layer, Rig, RigContext, RigError};
