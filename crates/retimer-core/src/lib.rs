//! Retimer Core - identifier allocation and device registry for retimers
//!
//! This crate provides the foundational types for the retimer subsystem:
//! - Identifier allocator issuing unique, reusable small integer ids
//! - Registry tracking registered retimer handles over their lifetime
//! - Label attribute rendering from the parent device's configuration
//! - Parent device capability trait for injecting the configuration lookup

pub mod id;
pub mod label;
pub mod parent;
pub mod registry;

pub use id::{IdAllocator, RetimerId};
pub use parent::ParentDevice;
pub use registry::{Registry, RegistryError, Retimer, RetimerInfo, NAME_PREFIX};
