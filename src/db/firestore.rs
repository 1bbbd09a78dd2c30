// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Firestore client wrapper with typed operations.
//!
//! Provides high-level operations for:
//! - Users (profile and OAuth tokens)
//! - Connections (pairing documents mirrored under both users)
//! - D-Days (shared calendar events and their visibility lists)
//! - Per-user records (period days, cycle settings, check-ins, pins, feedback)
//! - Global boards (ideas, roulette)

use crate::db::{collections, CYCLE_SETTINGS_DOC};
use crate::error::AppError;
use crate::models::{
    Checkin, Connection, ConnectionStatus, CycleSettings, DDay, Feedback, Idea, PeriodDay, Pin,
    RouletteIdea, User,
};
use crate::time_utils::now_rfc3339;
use firestore::FirestoreWritePrecondition;
use futures_util::{stream, StreamExt};
use serde::{de::DeserializeOwned, Deserialize, Serialize};

const MAX_CONCURRENT_DB_OPS: usize = 50;
// Firestore limits batch/transaction writes to 500 operations.
// We use a safe limit of 400 to allow headroom.
const BATCH_SIZE: usize = 400;

/// Direction of a visibility fan-out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VisibilityChange {
    Grant,
    Revoke,
}

/// Outcome of a best-effort fan-out over a user's events.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct FanOutReport {
    pub updated: usize,
    pub failed: usize,
}

/// Map a failed pair commit. Precondition failures mean the pair changed
/// under us: a missing document was rejected, an existing one was not expected.
fn connection_commit_error(err: firestore::errors::FirestoreError, id: &str) -> AppError {
    use firestore::errors::FirestoreError;

    match err {
        FirestoreError::DataNotFoundError(e) => {
            tracing::warn!(connection_id = %id, error = %e, "Connection removed before commit");
            AppError::NotFound("Invitation was withdrawn".to_string())
        }
        FirestoreError::DataConflictError(e) => {
            tracing::warn!(connection_id = %id, error = %e, "Connection already exists");
            AppError::Conflict("Connection changed concurrently".to_string())
        }
        other => AppError::Database(format!("Transaction commit failed: {}", other)),
    }
}

/// Empty projection used by the connectivity probe.
#[derive(Deserialize)]
struct HealthProbe {}

/// Firestore database client.
#[derive(Clone)]
pub struct FirestoreDb {
    client: Option<firestore::FirestoreDb>,
}

impl FirestoreDb {
    /// Create a new Firestore client.
    ///
    /// For local development with emulator, set FIRESTORE_EMULATOR_HOST.
    pub async fn new(project_id: &str) -> Result<Self, AppError> {
        // The emulator accepts any token, so skip loading local credentials.
        if std::env::var("FIRESTORE_EMULATOR_HOST").is_ok() {
            return Self::create_emulator_client(project_id).await;
        }

        let client = firestore::FirestoreDb::new(project_id)
            .await
            .map_err(|e| AppError::Database(format!("Failed to connect to Firestore: {}", e)))?;

        tracing::info!(project = project_id, "Connected to Firestore");

        Ok(Self {
            client: Some(client),
        })
    }

    /// Create a Firestore client for the emulator with unauthenticated access.
    async fn create_emulator_client(project_id: &str) -> Result<Self, AppError> {
        tracing::info!("Using unauthenticated connection for Firestore Emulator");

        let token_source = gcloud_sdk::ExternalJwtFunctionSource::new(|| async {
            Ok(gcloud_sdk::Token {
                token_type: "Bearer".to_string(),
                token: gcloud_sdk::SecretValue::new(
                    "eyJhbGciOiJub25lIn0.eyJ1aWQiOiJ0ZXN0In0."
                        .to_string()
                        .into(),
                ),
                expiry: chrono::Utc::now() + chrono::Duration::hours(1),
            })
        });

        let options = firestore::FirestoreDbOptions::new(project_id.to_string());

        let client = firestore::FirestoreDb::with_options_token_source(
            options,
            gcloud_sdk::GCP_DEFAULT_SCOPES.clone(),
            gcloud_sdk::TokenSourceType::ExternalSource(Box::new(token_source)),
        )
        .await
        .map_err(|e| {
            AppError::Database(format!("Failed to connect to Firestore Emulator: {}", e))
        })?;

        tracing::info!(
            project = project_id,
            "Connected to Firestore (Emulator/Unauthenticated)"
        );

        Ok(Self {
            client: Some(client),
        })
    }

    /// Create a mock Firestore client for testing (offline mode).
    ///
    /// All database operations will return an error if called.
    pub fn new_mock() -> Self {
        Self { client: None }
    }

    /// Helper to get the client or return an error if offline.
    fn get_client(&self) -> Result<&firestore::FirestoreDb, AppError> {
        self.client
            .as_ref()
            .ok_or_else(|| AppError::Database("Database not connected (offline mode)".to_string()))
    }

    /// Path of `users/{uid}`, the parent of every per-user subcollection.
    fn user_path(&self, uid: &str) -> Result<firestore::ParentPathBuilder, AppError> {
        self.get_client()?
            .parent_path(collections::USERS, uid)
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Connectivity probe: a point read that is expected to find nothing.
    pub async fn ping(&self) -> Result<(), AppError> {
        let _: Option<HealthProbe> = self
            .get_client()?
            .fluent()
            .select()
            .by_id_in(collections::HEALTH_CHECK)
            .obj()
            .one("ping")
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    // ─── Generic Document Helpers ────────────────────────────────

    async fn get_doc<T>(&self, collection: &str, id: &str) -> Result<Option<T>, AppError>
    where
        T: DeserializeOwned + Send,
    {
        self.get_client()?
            .fluent()
            .select()
            .by_id_in(collection)
            .obj()
            .one(id)
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    async fn set_doc<T>(&self, collection: &str, id: &str, object: &T) -> Result<(), AppError>
    where
        T: Serialize + DeserializeOwned + Sync + Send,
    {
        let _: () = self
            .get_client()?
            .fluent()
            .update()
            .in_col(collection)
            .document_id(id)
            .object(object)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    async fn delete_doc(&self, collection: &str, id: &str) -> Result<(), AppError> {
        self.get_client()?
            .fluent()
            .delete()
            .from(collection)
            .document_id(id)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    async fn get_child<T>(&self, uid: &str, collection: &str, id: &str) -> Result<Option<T>, AppError>
    where
        T: DeserializeOwned + Send,
    {
        let parent = self.user_path(uid)?;
        self.get_client()?
            .fluent()
            .select()
            .by_id_in(collection)
            .parent(&parent)
            .obj()
            .one(id)
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    async fn list_children<T>(&self, uid: &str, collection: &str) -> Result<Vec<T>, AppError>
    where
        T: DeserializeOwned + Send,
    {
        let parent = self.user_path(uid)?;
        self.get_client()?
            .fluent()
            .select()
            .from(collection)
            .parent(&parent)
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    async fn list_children_ordered<T>(
        &self,
        uid: &str,
        collection: &str,
        field: &str,
        direction: firestore::FirestoreQueryDirection,
    ) -> Result<Vec<T>, AppError>
    where
        T: DeserializeOwned + Send,
    {
        let parent = self.user_path(uid)?;
        self.get_client()?
            .fluent()
            .select()
            .from(collection)
            .parent(&parent)
            .order_by([(field, direction)])
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    async fn set_child<T>(&self, uid: &str, collection: &str, id: &str, object: &T) -> Result<(), AppError>
    where
        T: Serialize + DeserializeOwned + Sync + Send,
    {
        let parent = self.user_path(uid)?;
        let _: () = self
            .get_client()?
            .fluent()
            .update()
            .in_col(collection)
            .document_id(id)
            .parent(&parent)
            .object(object)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    async fn delete_child(&self, uid: &str, collection: &str, id: &str) -> Result<(), AppError> {
        let parent = self.user_path(uid)?;
        self.get_client()?
            .fluent()
            .delete()
            .from(collection)
            .document_id(id)
            .parent(&parent)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    // ─── User Operations ─────────────────────────────────────────

    /// Get a user by their Google account id.
    pub async fn get_user(&self, uid: &str) -> Result<Option<User>, AppError> {
        self.get_doc(collections::USERS, uid).await
    }

    /// Find a user by (lowercased) email.
    pub async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        let users: Vec<User> = self
            .get_client()?
            .fluent()
            .select()
            .from(collections::USERS)
            .filter(|q| q.for_all([q.field("email").eq(email)]))
            .limit(1)
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(users.into_iter().next())
    }

    /// Create or update a user.
    pub async fn upsert_user(&self, user: &User) -> Result<(), AppError> {
        self.set_doc(collections::USERS, &user.uid, user).await
    }

    // ─── Connection Operations ───────────────────────────────────

    pub async fn get_connection(&self, uid: &str, id: &str) -> Result<Option<Connection>, AppError> {
        self.get_child(uid, collections::CONNECTIONS, id).await
    }

    pub async fn list_connections(&self, uid: &str) -> Result<Vec<Connection>, AppError> {
        self.list_children(uid, collections::CONNECTIONS).await
    }

    /// The caller's connection document naming `partner_email`, in any state.
    pub async fn find_connection_with(
        &self,
        uid: &str,
        partner_email: &str,
    ) -> Result<Option<Connection>, AppError> {
        let parent = self.user_path(uid)?;
        let found: Vec<Connection> = self
            .get_client()?
            .fluent()
            .select()
            .from(collections::CONNECTIONS)
            .parent(&parent)
            .filter(|q| q.for_all([q.field("partnerEmail").eq(partner_email)]))
            .limit(1)
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(found.into_iter().next())
    }

    pub async fn connections_with_status(
        &self,
        uid: &str,
        status: ConnectionStatus,
    ) -> Result<Vec<Connection>, AppError> {
        let parent = self.user_path(uid)?;
        self.get_client()?
            .fluent()
            .select()
            .from(collections::CONNECTIONS)
            .parent(&parent)
            .filter(|q| q.for_all([q.field("status").eq(status.as_str())]))
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// The caller's active connection, if paired.
    pub async fn active_connection(&self, uid: &str) -> Result<Option<Connection>, AppError> {
        Ok(self
            .connections_with_status(uid, ConnectionStatus::Active)
            .await?
            .into_iter()
            .next())
    }

    /// Write a new pending pair. Fails if either document already exists.
    pub async fn create_connection_pair(
        &self,
        first: (&str, &Connection),
        second: (&str, &Connection),
    ) -> Result<(), AppError> {
        self.commit_connection_pair(first, second, FirestoreWritePrecondition::Exists(false))
            .await
    }

    /// Overwrite an existing pair, e.g. on accept.
    ///
    /// Both documents must still exist at commit time, so a reject that lands
    /// after the caller's reads makes this fail instead of recreating them.
    pub async fn activate_connection_pair(
        &self,
        first: (&str, &Connection),
        second: (&str, &Connection),
    ) -> Result<(), AppError> {
        self.commit_connection_pair(first, second, FirestoreWritePrecondition::Exists(true))
            .await
    }

    /// Write both mirrored connection documents atomically.
    async fn commit_connection_pair(
        &self,
        first: (&str, &Connection),
        second: (&str, &Connection),
        precondition: FirestoreWritePrecondition,
    ) -> Result<(), AppError> {
        let client = self.get_client()?;
        let mut transaction = client
            .begin_transaction()
            .await
            .map_err(|e| AppError::Database(format!("Failed to begin transaction: {}", e)))?;

        for (uid, connection) in [first, second] {
            let parent = self.user_path(uid)?;
            client
                .fluent()
                .update()
                .in_col(collections::CONNECTIONS)
                .precondition(precondition.clone())
                .document_id(&connection.id)
                .parent(&parent)
                .object(connection)
                .add_to_transaction(&mut transaction)
                .map_err(|e| {
                    AppError::Database(format!(
                        "Failed to add connection to transaction: {}",
                        e
                    ))
                })?;
        }

        transaction
            .commit()
            .await
            .map_err(|e| connection_commit_error(e, &first.1.id))?;

        tracing::debug!(
            connection_id = %first.1.id,
            status = first.1.status.as_str(),
            "Connection pair committed"
        );
        Ok(())
    }

    /// Delete connection `id` under every listed user atomically.
    pub async fn delete_connection_docs(&self, id: &str, uids: &[&str]) -> Result<(), AppError> {
        let client = self.get_client()?;
        let mut transaction = client
            .begin_transaction()
            .await
            .map_err(|e| AppError::Database(format!("Failed to begin transaction: {}", e)))?;

        for uid in uids {
            let parent = self.user_path(uid)?;
            client
                .fluent()
                .delete()
                .from(collections::CONNECTIONS)
                .document_id(id)
                .parent(&parent)
                .add_to_transaction(&mut transaction)
                .map_err(|e| {
                    AppError::Database(format!("Failed to add deletion to transaction: {}", e))
                })?;
        }

        transaction
            .commit()
            .await
            .map_err(|e| AppError::Database(format!("Transaction commit failed: {}", e)))?;
        Ok(())
    }

    // ─── D-Day Operations ────────────────────────────────────────

    pub async fn get_dday(&self, id: &str) -> Result<Option<DDay>, AppError> {
        self.get_doc(collections::DDAYS, id).await
    }

    pub async fn set_dday(&self, dday: &DDay) -> Result<(), AppError> {
        self.set_doc(collections::DDAYS, &dday.id, dday).await
    }

    pub async fn delete_dday(&self, id: &str) -> Result<(), AppError> {
        self.delete_doc(collections::DDAYS, id).await
    }

    pub async fn ddays_created_by(&self, email: &str) -> Result<Vec<DDay>, AppError> {
        self.get_client()?
            .fluent()
            .select()
            .from(collections::DDAYS)
            .filter(|q| q.for_all([q.field("createdBy").eq(email)]))
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Candidate events for a month view, one batch per query.
    ///
    /// Dated events are bounded by `month_end` here; the lower bound and the
    /// annual-month match are applied by `MonthWindow`.
    pub async fn month_candidates(
        &self,
        email: &str,
        month_end: &str,
    ) -> Result<Vec<Vec<DDay>>, AppError> {
        let client = self.get_client()?;

        let created = client
            .fluent()
            .select()
            .from(collections::DDAYS)
            .filter(|q| {
                q.for_all([
                    q.field("createdBy").eq(email),
                    q.field("date").less_than_or_equal(month_end),
                ])
            })
            .obj::<DDay>()
            .query();

        let shared = client
            .fluent()
            .select()
            .from(collections::DDAYS)
            .filter(|q| {
                q.for_all([
                    q.field("connectedUsers").array_contains(email),
                    q.field("date").less_than_or_equal(month_end),
                ])
            })
            .obj::<DDay>()
            .query();

        let created_annual = client
            .fluent()
            .select()
            .from(collections::DDAYS)
            .filter(|q| {
                q.for_all([
                    q.field("createdBy").eq(email),
                    q.field("isAnnual").eq(true),
                ])
            })
            .obj::<DDay>()
            .query();

        let shared_annual = client
            .fluent()
            .select()
            .from(collections::DDAYS)
            .filter(|q| {
                q.for_all([
                    q.field("connectedUsers").array_contains(email),
                    q.field("isAnnual").eq(true),
                ])
            })
            .obj::<DDay>()
            .query();

        let (created, shared, created_annual, shared_annual) =
            tokio::try_join!(created, shared, created_annual, shared_annual)
                .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(vec![created, shared, created_annual, shared_annual])
    }

    /// The caller's anniversary event, if one was created.
    pub async fn find_anniversary(&self, email: &str) -> Result<Option<DDay>, AppError> {
        let found: Vec<DDay> = self
            .get_client()?
            .fluent()
            .select()
            .from(collections::DDAYS)
            .filter(|q| {
                q.for_all([
                    q.field("createdBy").eq(email),
                    q.field("title").eq(DDay::ANNIVERSARY_TITLE),
                    q.field("editable").eq(false),
                ])
            })
            .limit(1)
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(found.into_iter().next())
    }

    /// Grant or revoke `target_email` on every event created by `owner_email`.
    ///
    /// Best-effort: each event is written independently and only the
    /// visibility fields are touched. Failures are logged and counted.
    pub async fn update_event_visibility(
        &self,
        owner_email: &str,
        target_email: &str,
        change: VisibilityChange,
    ) -> Result<FanOutReport, AppError> {
        let events = self.ddays_created_by(owner_email).await?;
        let client = self.get_client()?;
        let now = now_rfc3339();

        let changed: Vec<DDay> = events
            .into_iter()
            .filter_map(|mut event| {
                let modified = match change {
                    VisibilityChange::Grant => event.grant_visibility(target_email),
                    VisibilityChange::Revoke => event.revoke_visibility(target_email),
                };
                modified.then(|| {
                    event.updated_at = now.clone();
                    event
                })
            })
            .collect();

        let results = stream::iter(changed)
            .map(|event| async move {
                let written: Result<(), AppError> = client
                    .fluent()
                    .update()
                    .fields(["connectedUsers", "updatedAt"])
                    .in_col(collections::DDAYS)
                    .document_id(&event.id)
                    .object(&event)
                    .execute()
                    .await
                    .map_err(|e| AppError::Database(e.to_string()));
                (event.id, written)
            })
            .buffer_unordered(MAX_CONCURRENT_DB_OPS)
            .collect::<Vec<_>>()
            .await;

        let mut report = FanOutReport::default();
        for (event_id, written) in results {
            match written {
                Ok(()) => report.updated += 1,
                Err(e) => {
                    tracing::warn!(
                        event_id = %event_id,
                        error = %e,
                        ?change,
                        "Failed to update event visibility"
                    );
                    report.failed += 1;
                }
            }
        }

        Ok(report)
    }

    // ─── Period Operations ───────────────────────────────────────

    pub async fn list_period_days(&self, uid: &str) -> Result<Vec<PeriodDay>, AppError> {
        self.list_children_ordered(
            uid,
            collections::PERIOD_DAYS,
            "date",
            firestore::FirestoreQueryDirection::Ascending,
        )
        .await
    }

    pub async fn get_period_day(&self, uid: &str, date: &str) -> Result<Option<PeriodDay>, AppError> {
        self.get_child(uid, collections::PERIOD_DAYS, date).await
    }

    /// Period days are keyed by date, so a write replaces that day's entry.
    pub async fn set_period_day(&self, uid: &str, day: &PeriodDay) -> Result<(), AppError> {
        self.set_child(uid, collections::PERIOD_DAYS, &day.date, day)
            .await
    }

    pub async fn delete_period_day(&self, uid: &str, date: &str) -> Result<(), AppError> {
        self.delete_child(uid, collections::PERIOD_DAYS, date).await
    }

    pub async fn get_cycle_settings(&self, uid: &str) -> Result<Option<CycleSettings>, AppError> {
        self.get_child(uid, collections::CYCLE_SETTINGS, CYCLE_SETTINGS_DOC)
            .await
    }

    pub async fn set_cycle_settings(
        &self,
        uid: &str,
        settings: &CycleSettings,
    ) -> Result<(), AppError> {
        self.set_child(uid, collections::CYCLE_SETTINGS, CYCLE_SETTINGS_DOC, settings)
            .await
    }

    // ─── Check-in Operations ─────────────────────────────────────

    pub async fn get_checkin(&self, uid: &str, date: &str) -> Result<Option<Checkin>, AppError> {
        self.get_child(uid, collections::CHECKINS, date).await
    }

    pub async fn set_checkin(&self, uid: &str, checkin: &Checkin) -> Result<(), AppError> {
        self.set_child(uid, collections::CHECKINS, &checkin.date, checkin)
            .await
    }

    pub async fn delete_checkin(&self, uid: &str, date: &str) -> Result<(), AppError> {
        self.delete_child(uid, collections::CHECKINS, date).await
    }

    // ─── Pin Operations ──────────────────────────────────────────

    /// Pins, newest first.
    pub async fn list_pins(&self, uid: &str) -> Result<Vec<Pin>, AppError> {
        self.list_children_ordered(
            uid,
            collections::PINS,
            "createdAt",
            firestore::FirestoreQueryDirection::Descending,
        )
        .await
    }

    pub async fn get_pin(&self, uid: &str, id: &str) -> Result<Option<Pin>, AppError> {
        self.get_child(uid, collections::PINS, id).await
    }

    pub async fn set_pin(&self, uid: &str, pin: &Pin) -> Result<(), AppError> {
        self.set_child(uid, collections::PINS, &pin.id, pin).await
    }

    pub async fn delete_pin(&self, uid: &str, id: &str) -> Result<(), AppError> {
        self.delete_child(uid, collections::PINS, id).await
    }

    // ─── Feedback Operations ─────────────────────────────────────

    /// Feedback, oldest first.
    pub async fn list_feedback(&self, uid: &str) -> Result<Vec<Feedback>, AppError> {
        self.list_children_ordered(
            uid,
            collections::FEEDBACK,
            "submittedAt",
            firestore::FirestoreQueryDirection::Ascending,
        )
        .await
    }

    pub async fn set_feedback(&self, uid: &str, feedback: &Feedback) -> Result<(), AppError> {
        self.set_child(uid, collections::FEEDBACK, &feedback.id, feedback)
            .await
    }

    // ─── Idea Board Operations ───────────────────────────────────

    /// All ideas, newest first.
    pub async fn list_ideas(&self) -> Result<Vec<Idea>, AppError> {
        self.get_client()?
            .fluent()
            .select()
            .from(collections::IDEAS)
            .order_by([("createdAt", firestore::FirestoreQueryDirection::Descending)])
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Ideas posted by one user, newest first.
    pub async fn ideas_by_author(&self, uid: &str) -> Result<Vec<Idea>, AppError> {
        let mut ideas: Vec<Idea> = self
            .get_client()?
            .fluent()
            .select()
            .from(collections::IDEAS)
            .filter(|q| q.for_all([q.field("authorUid").eq(uid)]))
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        // Sorted here to avoid a composite index
        ideas.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(ideas)
    }

    pub async fn get_idea(&self, id: &str) -> Result<Option<Idea>, AppError> {
        self.get_doc(collections::IDEAS, id).await
    }

    pub async fn set_idea(&self, idea: &Idea) -> Result<(), AppError> {
        self.set_doc(collections::IDEAS, &idea.id, idea).await
    }

    pub async fn delete_idea(&self, id: &str) -> Result<(), AppError> {
        self.delete_doc(collections::IDEAS, id).await
    }

    pub async fn list_roulette(&self) -> Result<Vec<RouletteIdea>, AppError> {
        self.get_client()?
            .fluent()
            .select()
            .from(collections::ROULETTE)
            .order_by([("createdAt", firestore::FirestoreQueryDirection::Ascending)])
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    pub async fn get_roulette(&self, id: &str) -> Result<Option<RouletteIdea>, AppError> {
        self.get_doc(collections::ROULETTE, id).await
    }

    pub async fn set_roulette(&self, idea: &RouletteIdea) -> Result<(), AppError> {
        self.set_doc(collections::ROULETTE, &idea.id, idea).await
    }

    pub async fn delete_roulette(&self, id: &str) -> Result<(), AppError> {
        self.delete_doc(collections::ROULETTE, id).await
    }

    // ─── Helper Methods ────────────────────────────────────────────

    /// Batch delete documents using transactions, under `users/{uid}` when given.
    async fn batch_delete(
        &self,
        owner_uid: Option<&str>,
        collection: &str,
        ids: &[String],
    ) -> Result<(), AppError> {
        let client = self.get_client()?;
        let parent = owner_uid.map(|uid| self.user_path(uid)).transpose()?;

        for chunk in ids.chunks(BATCH_SIZE) {
            let mut transaction = client
                .begin_transaction()
                .await
                .map_err(|e| AppError::Database(format!("Failed to begin transaction: {}", e)))?;

            for doc_id in chunk {
                let added = match &parent {
                    Some(parent) => client
                        .fluent()
                        .delete()
                        .from(collection)
                        .document_id(doc_id)
                        .parent(parent)
                        .add_to_transaction(&mut transaction)
                        .map(|_| ()),
                    None => client
                        .fluent()
                        .delete()
                        .from(collection)
                        .document_id(doc_id)
                        .add_to_transaction(&mut transaction)
                        .map(|_| ()),
                };
                added.map_err(|e| {
                    AppError::Database(format!(
                        "Failed to add deletion to transaction for {}: {}",
                        collection, e
                    ))
                })?;
            }

            transaction.commit().await.map_err(|e| {
                AppError::Database(format!("Failed to commit batch deletion: {}", e))
            })?;
        }

        Ok(())
    }

    // ─── User Data Deletion ────────────────────────────────────────

    /// Delete every document owned by a user.
    ///
    /// Covers events the user created, ideas they posted, all per-user
    /// subcollections and the profile itself. Mirror documents held by
    /// partners are the caller's responsibility.
    ///
    /// Returns the number of documents deleted.
    pub async fn delete_user_data(&self, uid: &str, email: &str) -> Result<usize, AppError> {
        let mut deleted_count = 0;

        let events: Vec<String> = self
            .ddays_created_by(email)
            .await?
            .into_iter()
            .map(|e| e.id)
            .collect();
        self.batch_delete(None, collections::DDAYS, &events).await?;
        deleted_count += events.len();
        tracing::debug!(uid, count = events.len(), "Deleted events");

        let ideas: Vec<String> = self
            .ideas_by_author(uid)
            .await?
            .into_iter()
            .map(|i| i.id)
            .collect();
        self.batch_delete(None, collections::IDEAS, &ideas).await?;
        deleted_count += ideas.len();

        let connections: Vec<String> = self
            .list_connections(uid)
            .await?
            .into_iter()
            .map(|c| c.id)
            .collect();
        let period_days: Vec<String> = self
            .list_children::<PeriodDay>(uid, collections::PERIOD_DAYS)
            .await?
            .into_iter()
            .map(|d| d.date)
            .collect();
        let checkins: Vec<String> = self
            .list_children::<Checkin>(uid, collections::CHECKINS)
            .await?
            .into_iter()
            .map(|c| c.date)
            .collect();
        let pins: Vec<String> = self
            .list_children::<Pin>(uid, collections::PINS)
            .await?
            .into_iter()
            .map(|p| p.id)
            .collect();
        let feedback: Vec<String> = self
            .list_children::<Feedback>(uid, collections::FEEDBACK)
            .await?
            .into_iter()
            .map(|f| f.id)
            .collect();
        let settings = vec![CYCLE_SETTINGS_DOC.to_string()];

        for (collection, ids) in [
            (collections::CONNECTIONS, &connections),
            (collections::PERIOD_DAYS, &period_days),
            (collections::CHECKINS, &checkins),
            (collections::PINS, &pins),
            (collections::FEEDBACK, &feedback),
            (collections::CYCLE_SETTINGS, &settings),
        ] {
            self.batch_delete(Some(uid), collection, ids).await?;
            deleted_count += ids.len();
            tracing::debug!(uid, collection, count = ids.len(), "Deleted subcollection");
        }

        self.delete_doc(collections::USERS, uid).await?;
        deleted_count += 1;

        tracing::info!(uid, deleted_count, "User data deletion complete");

        Ok(deleted_count)
    }
}
