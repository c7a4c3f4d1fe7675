//! Legacy migration and startup sequencing for Hearth.
//!
//! This crate provides:
//! - The record transformer from legacy rows to store documents
//! - The one-time migration orchestrator ([`Migrator`])
//! - The startup sequencer ([`Launcher`]) and its collaborators: debrid
//!   provider clients, the aria2 agent and engine, remote library sync, the
//!   Ludusavi manifest registrar and the main loop

pub mod agent;
pub mod bootstrap;
pub mod detached;
pub mod engine;
pub mod error;
pub mod main_loop;
pub mod manifest;
pub mod metrics;
pub mod migration;
pub mod providers;
pub mod services;
pub mod startup;
pub mod sync;
pub mod transform;

pub use detached::{DetachedTasks, TaskExit};
pub use error::{LaunchError, LaunchResult};
pub use migration::{
    DomainOutcome, DomainReport, MigrationDomain, MigrationReport, MigrationState,
    MigrationStatus, Migrator,
};
pub use providers::{DebridClient, DebridClients, DebridProvider, HttpDebridClient};
pub use services::{DownloadAgent, DownloadEngine, MainLoop, ManifestRegistrar, RemoteSync};
pub use startup::{Collaborators, DownloadPlan, Launcher, ReadyPreferences, plan_downloads};
