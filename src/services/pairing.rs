// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Pairing state machine.
//!
//! A connection moves `none -> pending -> active`, or back to `none` on
//! reject. Each pairing is stored twice, once under each user, with a shared
//! id; both copies are always written in one transaction. After a transition
//! the visibility lists on both users' events are fanned out best-effort.

use crate::db::{FanOutReport, FirestoreDb, VisibilityChange};
use crate::error::AppError;
use crate::models::{Connection, ConnectionRole, ConnectionStatus, User};
use crate::time_utils::now_rfc3339;
use serde::Serialize;

/// What accepting a connection document should do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AcceptDecision {
    Activate,
    /// Already active: accept is a no-op.
    AlreadyActive,
}

/// Only the receiving side may accept.
pub fn decide_accept(connection: &Connection) -> Result<AcceptDecision, AppError> {
    if connection.role != ConnectionRole::Receiver {
        return Err(AppError::Forbidden(
            "Only the invited user can accept this connection".to_string(),
        ));
    }

    if connection.is_active() {
        Ok(AcceptDecision::AlreadyActive)
    } else {
        Ok(AcceptDecision::Activate)
    }
}

/// Build the two pending documents for a new invitation.
pub fn pending_pair(
    id: &str,
    inviter: &User,
    invitee: &User,
    now: &str,
) -> (Connection, Connection) {
    let make = |partner_email: &str, role| Connection {
        id: id.to_string(),
        partner_email: partner_email.to_string(),
        partner_uid: None,
        role,
        status: ConnectionStatus::Pending,
        created_at: now.to_string(),
        updated_at: now.to_string(),
    };

    (
        make(&invitee.email, ConnectionRole::Initiator),
        make(&inviter.email, ConnectionRole::Receiver),
    )
}

/// The active form of one side of a connection.
pub fn activated(connection: &Connection, partner_uid: &str, now: &str) -> Connection {
    Connection {
        status: ConnectionStatus::Active,
        partner_uid: Some(partner_uid.to_string()),
        updated_at: now.to_string(),
        ..connection.clone()
    }
}

/// A pending invitation with the counterpart's display name.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PendingInvitation {
    pub id: String,
    pub partner_email: String,
    pub partner_name: Option<String>,
    pub role: ConnectionRole,
    pub created_at: String,
}

/// Result of an accept call.
#[derive(Debug, Clone)]
pub struct AcceptOutcome {
    pub connection: Connection,
    pub already_active: bool,
    pub fan_out: FanOutReport,
}

/// Connection operations on top of Firestore.
#[derive(Clone)]
pub struct PairingService {
    db: FirestoreDb,
}

impl PairingService {
    pub fn new(db: FirestoreDb) -> Self {
        Self { db }
    }

    /// Invite `target_email` (already normalized) to pair with `caller`.
    ///
    /// Returns the caller's new pending document.
    pub async fn invite(&self, caller: &User, target_email: &str) -> Result<Connection, AppError> {
        if target_email == caller.email {
            return Err(AppError::BadRequest("You cannot invite yourself".to_string()));
        }

        let target = self
            .db
            .find_user_by_email(target_email)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("No user with email {}", target_email)))?;

        if let Some(existing) = self.db.find_connection_with(&caller.uid, target_email).await? {
            return Err(AppError::Conflict(format!(
                "Connection {} already",
                existing.status.as_str()
            )));
        }

        if self.db.active_connection(&caller.uid).await?.is_some() {
            return Err(AppError::Conflict("You are already connected".to_string()));
        }
        if self.db.active_connection(&target.uid).await?.is_some() {
            return Err(AppError::Conflict(
                "That user is already connected".to_string(),
            ));
        }

        let id = uuid::Uuid::new_v4().to_string();
        let now = now_rfc3339();
        let (mine, theirs) = pending_pair(&id, caller, &target, &now);

        self.db
            .create_connection_pair((caller.uid.as_str(), &mine), (target.uid.as_str(), &theirs))
            .await?;

        tracing::info!(
            uid = %caller.uid,
            partner_uid = %target.uid,
            connection_id = %id,
            "Connection invitation created"
        );

        Ok(mine)
    }

    /// Pending documents in the caller's subtree, in either role.
    pub async fn pending(&self, caller: &User) -> Result<Vec<PendingInvitation>, AppError> {
        let pending = self
            .db
            .connections_with_status(&caller.uid, ConnectionStatus::Pending)
            .await?;

        let mut invitations = Vec::with_capacity(pending.len());
        for connection in pending {
            let partner_name = self
                .db
                .find_user_by_email(&connection.partner_email)
                .await?
                .map(|u| u.name);
            invitations.push(PendingInvitation {
                id: connection.id,
                partner_email: connection.partner_email,
                partner_name,
                role: connection.role,
                created_at: connection.created_at,
            });
        }
        invitations.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(invitations)
    }

    /// Accept a pending invitation addressed to the caller.
    pub async fn accept(&self, caller: &User, id: &str) -> Result<AcceptOutcome, AppError> {
        let connection = self
            .db
            .get_connection(&caller.uid, id)
            .await?
            .ok_or_else(|| AppError::NotFound("Connection not found".to_string()))?;

        if decide_accept(&connection)? == AcceptDecision::AlreadyActive {
            tracing::debug!(uid = %caller.uid, connection_id = %id, "Connection already active");
            return Ok(AcceptOutcome {
                connection,
                already_active: true,
                fan_out: FanOutReport::default(),
            });
        }

        let inviter = self
            .db
            .find_user_by_email(&connection.partner_email)
            .await?
            .ok_or_else(|| AppError::NotFound("Inviting user no longer exists".to_string()))?;

        let inviter_doc = self
            .db
            .get_connection(&inviter.uid, id)
            .await?
            .ok_or_else(|| AppError::NotFound("Invitation was withdrawn".to_string()))?;

        for uid in [&caller.uid, &inviter.uid] {
            if let Some(active) = self.db.active_connection(uid).await? {
                if active.id != id {
                    return Err(AppError::Conflict(
                        "One of the users is already connected".to_string(),
                    ));
                }
            }
        }

        let now = now_rfc3339();
        let mine = activated(&connection, &inviter.uid, &now);
        let theirs = activated(&inviter_doc, &caller.uid, &now);

        self.db
            .activate_connection_pair((caller.uid.as_str(), &mine), (inviter.uid.as_str(), &theirs))
            .await?;

        let fan_out = self
            .fan_out(&caller.email, &inviter.email, VisibilityChange::Grant)
            .await;

        tracing::info!(
            uid = %caller.uid,
            partner_uid = %inviter.uid,
            connection_id = %id,
            events_updated = fan_out.updated,
            events_failed = fan_out.failed,
            "Connection accepted"
        );

        Ok(AcceptOutcome {
            connection: mine,
            already_active: false,
            fan_out,
        })
    }

    /// Reject (or remove) a connection: both documents are deleted, then
    /// each party loses visibility of the other's events.
    pub async fn reject(&self, caller: &User, id: &str) -> Result<FanOutReport, AppError> {
        let connection = self
            .db
            .get_connection(&caller.uid, id)
            .await?
            .ok_or_else(|| AppError::NotFound("Connection not found".to_string()))?;

        let partner = self.resolve_partner(&connection).await?;

        match &partner {
            Some(partner) => {
                self.db
                    .delete_connection_docs(id, &[caller.uid.as_str(), partner.uid.as_str()])
                    .await?
            }
            None => {
                tracing::warn!(
                    connection_id = %id,
                    partner_email = %connection.partner_email,
                    "Partner account missing, deleting caller's document only"
                );
                self.db.delete_connection_docs(id, &[caller.uid.as_str()]).await?
            }
        }

        let fan_out = self
            .fan_out(
                &caller.email,
                &connection.partner_email,
                VisibilityChange::Revoke,
            )
            .await;

        tracing::info!(
            uid = %caller.uid,
            connection_id = %id,
            events_updated = fan_out.updated,
            events_failed = fan_out.failed,
            "Connection removed"
        );

        Ok(fan_out)
    }

    /// The caller's active connection and partner profile.
    pub async fn current(&self, uid: &str) -> Result<Option<(Connection, Option<User>)>, AppError> {
        let Some(connection) = self.db.active_connection(uid).await? else {
            return Ok(None);
        };
        let partner = self.resolve_partner(&connection).await?;
        Ok(Some((connection, partner)))
    }

    /// The caller's active partner, if paired and the account still exists.
    pub async fn active_partner(&self, uid: &str) -> Result<Option<User>, AppError> {
        Ok(self.current(uid).await?.and_then(|(_, partner)| partner))
    }

    /// Tear down every connection of a user that is being deleted.
    ///
    /// Partner mirror documents are removed and visibility is revoked both
    /// ways; the caller's own documents go with the rest of the user data.
    pub async fn disconnect_all(&self, caller: &User) -> Result<(), AppError> {
        for connection in self.db.list_connections(&caller.uid).await? {
            if let Some(partner) = self.resolve_partner(&connection).await? {
                self.db
                    .delete_connection_docs(&connection.id, &[partner.uid.as_str()])
                    .await?;
            }
            self.fan_out(
                &caller.email,
                &connection.partner_email,
                VisibilityChange::Revoke,
            )
            .await;
        }
        Ok(())
    }

    /// Find the counterpart user, by uid once active or by email before.
    async fn resolve_partner(&self, connection: &Connection) -> Result<Option<User>, AppError> {
        if let Some(partner_uid) = &connection.partner_uid {
            if let Some(user) = self.db.get_user(partner_uid).await? {
                return Ok(Some(user));
            }
        }
        self.db.find_user_by_email(&connection.partner_email).await
    }

    /// Apply a visibility change to both parties' events concurrently.
    async fn fan_out(&self, a: &str, b: &str, change: VisibilityChange) -> FanOutReport {
        let (a_events, b_events) = tokio::join!(
            self.db.update_event_visibility(a, b, change),
            self.db.update_event_visibility(b, a, change),
        );

        let mut report = FanOutReport::default();
        for (owner, result) in [(a, a_events), (b, b_events)] {
            match result {
                Ok(part) => {
                    report.updated += part.updated;
                    report.failed += part.failed;
                }
                Err(e) => {
                    tracing::warn!(owner = %owner, error = %e, "Visibility fan-out skipped");
                    report.failed += 1;
                }
            }
        }
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Sex;

    fn user(uid: &str, email: &str) -> User {
        User {
            uid: uid.to_string(),
            email: email.to_string(),
            name: uid.to_string(),
            picture: None,
            sex: Sex::Female,
            started_dating: None,
            tokens: None,
            returning_user: false,
            created_at: "t0".to_string(),
            last_login_at: "t0".to_string(),
            updated_at: "t0".to_string(),
        }
    }

    #[test]
    fn test_pending_pair_roles_and_emails() {
        let alice = user("alice", "alice@example.com");
        let bob = user("bob", "bob@example.com");
        let (mine, theirs) = pending_pair("c1", &alice, &bob, "t1");

        assert_eq!(mine.id, theirs.id);
        assert_eq!(mine.role, ConnectionRole::Initiator);
        assert_eq!(mine.partner_email, "bob@example.com");
        assert_eq!(theirs.role, ConnectionRole::Receiver);
        assert_eq!(theirs.partner_email, "alice@example.com");
        assert_eq!(mine.status, ConnectionStatus::Pending);
        assert!(mine.partner_uid.is_none() && theirs.partner_uid.is_none());
    }

    #[test]
    fn test_only_receiver_may_accept() {
        let alice = user("alice", "alice@example.com");
        let bob = user("bob", "bob@example.com");
        let (mine, theirs) = pending_pair("c1", &alice, &bob, "t1");

        assert!(matches!(decide_accept(&mine), Err(AppError::Forbidden(_))));
        assert_eq!(decide_accept(&theirs).unwrap(), AcceptDecision::Activate);
    }

    #[test]
    fn test_reaccept_is_noop() {
        let alice = user("alice", "alice@example.com");
        let bob = user("bob", "bob@example.com");
        let (_, theirs) = pending_pair("c1", &alice, &bob, "t1");
        let active = activated(&theirs, "alice", "t2");

        assert_eq!(decide_accept(&active).unwrap(), AcceptDecision::AlreadyActive);
    }

    #[test]
    fn test_activated_links_partners() {
        let alice = user("alice", "alice@example.com");
        let bob = user("bob", "bob@example.com");
        let (mine, theirs) = pending_pair("c1", &alice, &bob, "t1");

        let a = activated(&mine, "bob", "t2");
        let b = activated(&theirs, "alice", "t2");
        assert!(a.is_active() && b.is_active());
        assert_eq!(a.partner_uid.as_deref(), Some("bob"));
        assert_eq!(b.partner_uid.as_deref(), Some("alice"));
        assert_eq!(a.created_at, "t1");
        assert_eq!(a.updated_at, "t2");
    }
}
