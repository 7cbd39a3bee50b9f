//! # vrtrack-core
//!
//! Foundation types shared by every vrtrack crate.
//!
//! - **Handles**: [`Handle`] issued by the registry for devices and trackers
//! - **Hardware ids**: [`HardwareId`], the durable per-sensor configuration key
//! - **Domain enums**: [`BodyPart`], [`TrackerStatus`], [`ImuType`], [`Origin`]
//! - **Geometry**: [`Quaternion`] and [`Vector3`]
//! - **Errors**: [`Severity`] taxonomy and [`StartupError`]
//! - **Logging**: `tracing` subscriber setup and log capture for tests

#![deny(unsafe_code)]

pub mod constants;
pub mod errors;
pub mod ids;
pub mod logging;
pub mod types;

pub use errors::{Severity, StartupError};
pub use ids::{Handle, HardwareId};
pub use types::{BodyPart, ImuType, Origin, Quaternion, TrackerRole, TrackerStatus, Vector3};
