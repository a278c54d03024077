//! Configuration module for the choreography core.
//!
//! Provides [`ChoreoConfig`] (top-level settings), one sub-config per timed
//! subsystem, [`AppPaths`] for cross-platform directories, and TOML
//! persistence via `ChoreoConfig::load` / `ChoreoConfig::save`.
//!
//! The config is injected into the orchestrator at construction; nothing in
//! the crate reads tuning constants from global state.

pub mod paths;
pub mod settings;

pub use paths::AppPaths;
pub use settings::{
    AnticipationConfig, BaselineConfig, ChoreoConfig, ConfigError, CrystallizationConfig,
    HierarchyConfig, IdleConfig, LooseningConfig, RemoteConfig, RoutingConfig, TransitionConfig,
};
