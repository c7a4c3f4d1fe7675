//! One-time migration of the legacy database into the document store.
//!
//! The orchestrator is a small state machine (`NotStarted -> InProgress ->
//! Done`). The completion flag is written before any domain runs, so a
//! migration is attempted at most once per installation. The four domains
//! run concurrently and each outcome is recorded on its own; a failed domain
//! never stops the others and is not retried.

use crate::error::LaunchResult;
use crate::metrics::{MIGRATION_DOMAIN_OUTCOMES, MIGRATION_RECORDS, MIGRATION_RUNS};
use crate::transform;
use hearth_core::documents::{Game, GameAchievement};
use hearth_core::keys::{self, sublevels};
use hearth_crypto::SecretCipher;
use hearth_legacy::LegacyStore;
use hearth_legacy::repos::{AchievementRepo, GameRepo, PreferencesRepo, UserAuthRepo};
use hearth_storage::DocumentStore;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use time::OffsetDateTime;
use tokio::sync::Mutex;

/// One of the four migrated data domains.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MigrationDomain {
    Games,
    Preferences,
    Achievements,
    Session,
}

impl MigrationDomain {
    pub const ALL: [MigrationDomain; 4] = [
        Self::Games,
        Self::Preferences,
        Self::Achievements,
        Self::Session,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Games => "games",
            Self::Preferences => "preferences",
            Self::Achievements => "achievements",
            Self::Session => "session",
        }
    }
}

impl fmt::Display for MigrationDomain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

/// How one domain ended.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum DomainOutcome {
    /// Rows read from the legacy table and written.
    Migrated { records: usize },
    /// Nothing to migrate.
    Skipped,
    Failed { error: String },
}

impl DomainOutcome {
    fn label(&self) -> &'static str {
        match self {
            Self::Migrated { .. } => "migrated",
            Self::Skipped => "skipped",
            Self::Failed { .. } => "failed",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DomainReport {
    pub domain: MigrationDomain,
    #[serde(flatten)]
    pub outcome: DomainOutcome,
}

/// Result of [`Migrator::run_migration`].
///
/// Only the orchestrator builds reports; holding one proves the migration
/// has settled for this process.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MigrationReport {
    already_done: bool,
    domains: Vec<DomainReport>,
    #[serde(default, with = "time::serde::rfc3339::option")]
    completed_at: Option<OffsetDateTime>,
}

impl MigrationReport {
    fn already_done() -> Self {
        Self {
            already_done: true,
            domains: Vec::new(),
            completed_at: None,
        }
    }

    /// True when the flag was already set and nothing ran.
    pub fn was_already_done(&self) -> bool {
        self.already_done
    }

    pub fn domains(&self) -> &[DomainReport] {
        &self.domains
    }

    pub fn outcome(&self, domain: MigrationDomain) -> Option<&DomainOutcome> {
        self.domains
            .iter()
            .find(|d| d.domain == domain)
            .map(|d| &d.outcome)
    }

    pub fn failed_domains(&self) -> Vec<MigrationDomain> {
        self.domains
            .iter()
            .filter(|d| matches!(d.outcome, DomainOutcome::Failed { .. }))
            .map(|d| d.domain)
            .collect()
    }

    pub fn completed_at(&self) -> Option<OffsetDateTime> {
        self.completed_at
    }
}

/// In-process migration state.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MigrationState {
    NotStarted,
    InProgress,
    Done,
}

/// Persisted migration state, for diagnostics.
#[derive(Clone, Debug, PartialEq)]
pub struct MigrationStatus {
    pub done: bool,
    pub last_report: Option<MigrationReport>,
}

pub struct Migrator {
    store: DocumentStore,
    cipher: Arc<dyn SecretCipher>,
    source: Option<Arc<dyn LegacyStore>>,
    state: Mutex<MigrationState>,
}

impl Migrator {
    /// `source` is `None` when there is no legacy database to read.
    pub fn new(
        store: DocumentStore,
        cipher: Arc<dyn SecretCipher>,
        source: Option<Arc<dyn LegacyStore>>,
    ) -> Self {
        Self {
            store,
            cipher,
            source,
            state: Mutex::new(MigrationState::NotStarted),
        }
    }

    pub async fn state(&self) -> MigrationState {
        *self.state.lock().await
    }

    /// Migrate every domain unless the completion flag is already set.
    ///
    /// Concurrent callers are serialized; only the first one migrates. Domain
    /// failures are reported, not returned: the only errors are failures to
    /// read or write the completion flag.
    pub async fn run_migration(&self) -> LaunchResult<MigrationReport> {
        let mut state = self.state.lock().await;
        if *state == MigrationState::Done {
            return Ok(MigrationReport::already_done());
        }

        let flag = self
            .store
            .get_json::<bool>(keys::SQLITE_MIGRATION_DONE)
            .await?;
        if flag == Some(true) {
            tracing::debug!("Legacy migration already done");
            *state = MigrationState::Done;
            return Ok(MigrationReport::already_done());
        }

        *state = MigrationState::InProgress;
        if let Err(e) = self
            .store
            .put_json(keys::SQLITE_MIGRATION_DONE, &true)
            .await
        {
            *state = MigrationState::NotStarted;
            return Err(e.into());
        }
        MIGRATION_RUNS.inc();

        let domains = match &self.source {
            Some(source) => {
                tracing::info!("Migrating legacy database");
                let source = source.as_ref();
                let (games, preferences, achievements, session) = tokio::join!(
                    self.migrate_games(source),
                    self.migrate_preferences(source),
                    self.migrate_achievements(source),
                    self.migrate_session(source),
                );
                vec![
                    settle(MigrationDomain::Games, games),
                    settle(MigrationDomain::Preferences, preferences),
                    settle(MigrationDomain::Achievements, achievements),
                    settle(MigrationDomain::Session, session),
                ]
            }
            None => {
                tracing::info!("No legacy database, skipping migration");
                MigrationDomain::ALL
                    .into_iter()
                    .map(|domain| settle(domain, Ok(DomainOutcome::Skipped)))
                    .collect()
            }
        };

        let report = MigrationReport {
            already_done: false,
            domains,
            completed_at: Some(OffsetDateTime::now_utc()),
        };
        if let Err(e) = self
            .store
            .put_json(keys::SQLITE_MIGRATION_REPORT, &report)
            .await
        {
            tracing::warn!(error = %e, "Failed to persist migration report");
        }

        let failed = report.failed_domains();
        if !failed.is_empty() {
            tracing::warn!(?failed, "Legacy migration finished with failed domains");
        }

        *state = MigrationState::Done;
        Ok(report)
    }

    /// Read the completion flag and the last persisted report.
    pub async fn migration_status(&self) -> LaunchResult<MigrationStatus> {
        let done = self
            .store
            .get_json::<bool>(keys::SQLITE_MIGRATION_DONE)
            .await?
            .unwrap_or(false);
        let last_report = self
            .store
            .get_json::<MigrationReport>(keys::SQLITE_MIGRATION_REPORT)
            .await?;
        Ok(MigrationStatus { done, last_report })
    }

    /// Clear the completion flag and the report so the next run migrates
    /// again. Documents written by earlier runs are overwritten, not removed.
    pub async fn reset_migration(&self) -> LaunchResult<()> {
        let mut state = self.state.lock().await;
        self.store.delete(keys::SQLITE_MIGRATION_DONE).await?;
        self.store.delete(keys::SQLITE_MIGRATION_REPORT).await?;
        *state = MigrationState::NotStarted;
        tracing::info!("Legacy migration reset");
        Ok(())
    }

    async fn migrate_games(&self, source: &dyn LegacyStore) -> LaunchResult<DomainOutcome> {
        let rows = source.select_games().await?;
        let entries: Vec<_> = rows.into_iter().map(transform::game_document).collect();
        let records = entries.len();

        self.store
            .sublevel::<Game>(sublevels::GAMES)
            .batch_put(entries)
            .await?;

        tracing::info!(records, "Games migrated successfully");
        Ok(DomainOutcome::Migrated { records })
    }

    async fn migrate_preferences(&self, source: &dyn LegacyStore) -> LaunchResult<DomainOutcome> {
        let Some(row) = source.select_user_preferences().await?.into_iter().next() else {
            tracing::info!("No user preferences to migrate");
            return Ok(DomainOutcome::Skipped);
        };

        let language = row.language.clone().filter(|l| !l.is_empty());
        let preferences = transform::preferences_document(row, self.cipher.as_ref())?;
        self.store
            .put_json(keys::USER_PREFERENCES, &preferences)
            .await?;
        if let Some(language) = language {
            self.store.put_string(keys::LANGUAGE, &language).await?;
        }

        tracing::info!("User preferences migrated successfully");
        Ok(DomainOutcome::Migrated { records: 1 })
    }

    async fn migrate_achievements(&self, source: &dyn LegacyStore) -> LaunchResult<DomainOutcome> {
        let rows = source.select_game_achievements().await?;
        let entries = rows
            .into_iter()
            .map(transform::achievement_document)
            .collect::<LaunchResult<Vec<_>>>()?;
        let records = entries.len();

        self.store
            .sublevel::<GameAchievement>(sublevels::GAME_ACHIEVEMENTS)
            .batch_put(entries)
            .await?;

        tracing::info!(records, "Achievements migrated successfully");
        Ok(DomainOutcome::Migrated { records })
    }

    async fn migrate_session(&self, source: &dyn LegacyStore) -> LaunchResult<DomainOutcome> {
        let Some(row) = source.select_user_auth().await?.into_iter().next() else {
            tracing::info!("No user session to migrate");
            return Ok(DomainOutcome::Skipped);
        };

        let (user, auth) = transform::session_documents(row, self.cipher.as_ref())?;
        self.store.put_json(keys::USER, &user).await?;
        self.store.put_json(keys::AUTH, &auth).await?;

        tracing::info!("User data migrated successfully");
        Ok(DomainOutcome::Migrated { records: 1 })
    }
}

fn settle(domain: MigrationDomain, result: LaunchResult<DomainOutcome>) -> DomainReport {
    let outcome = match result {
        Ok(outcome) => outcome,
        Err(e) => {
            tracing::error!(domain = %domain, error = %e, "Domain migration failed");
            DomainOutcome::Failed {
                error: e.to_string(),
            }
        }
    };

    MIGRATION_DOMAIN_OUTCOMES
        .with_label_values(&[domain.as_str(), outcome.label()])
        .inc();
    if let DomainOutcome::Migrated { records } = &outcome {
        MIGRATION_RECORDS
            .with_label_values(&[domain.as_str()])
            .inc_by(*records as u64);
    }

    DomainReport { domain, outcome }
}
