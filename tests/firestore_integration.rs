// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Firestore integration tests.
//!
//! These tests require the Firestore emulator to be running, e.g.
//! `gcloud emulators firestore start --host-port=localhost:8080` and
//! `FIRESTORE_EMULATOR_HOST=localhost:8080 cargo test`.
//!
//! Every test uses freshly generated users so runs do not interfere.

use calple_api::db::FirestoreDb;
use calple_api::error::AppError;
use calple_api::models::{ConnectionRole, DDay, User};
use calple_api::services::pairing::activated;
use calple_api::services::PairingService;

mod common;
use common::{test_db, test_user};

async fn stored_user(db: &FirestoreDb, label: &str) -> User {
    let user = test_user(label);
    db.upsert_user(&user).await.unwrap();
    user
}

async fn event_for(db: &FirestoreDb, owner: &User, title: &str) -> DDay {
    let event = DDay {
        id: common::unique_id(),
        title: title.to_string(),
        date: "20240301".to_string(),
        created_by: owner.email.clone(),
        editable: true,
        created_at: "2024-03-01T00:00:00.000Z".to_string(),
        updated_at: "2024-03-01T00:00:00.000Z".to_string(),
        ..Default::default()
    };
    db.set_dday(&event).await.unwrap();
    event
}

async fn visibility(db: &FirestoreDb, id: &str) -> Vec<String> {
    db.get_dday(id).await.unwrap().unwrap().connected_users
}

// ═══════════════════════════════════════════════════════════════════════════
// USER TESTS
// ═══════════════════════════════════════════════════════════════════════════

#[tokio::test]
async fn test_find_user_by_email() {
    require_emulator!();

    let db = test_db().await;
    let user = stored_user(&db, "lookup").await;

    let found = db.find_user_by_email(&user.email).await.unwrap().unwrap();
    assert_eq!(found.uid, user.uid);
    assert!(db
        .find_user_by_email("nobody@example.invalid")
        .await
        .unwrap()
        .is_none());
}

// ═══════════════════════════════════════════════════════════════════════════
// PAIRING TESTS
// ═══════════════════════════════════════════════════════════════════════════

#[tokio::test]
async fn test_invite_accept_grants_visibility() {
    require_emulator!();

    let db = test_db().await;
    let pairing = PairingService::new(db.clone());
    let alice = stored_user(&db, "alice").await;
    let bob = stored_user(&db, "bob").await;
    let alice_event = event_for(&db, &alice, "Alice trip").await;
    let bob_event = event_for(&db, &bob, "Bob concert").await;

    let invitation = pairing.invite(&alice, &bob.email).await.unwrap();

    let pending = pairing.pending(&bob).await.unwrap();
    assert_eq!(pending.len(), 1);
    assert_eq!(pending[0].id, invitation.id);
    assert_eq!(pending[0].role, ConnectionRole::Receiver);
    assert_eq!(pending[0].partner_name.as_deref(), Some("alice"));

    // The initiator cannot accept their own invitation
    assert!(matches!(
        pairing.accept(&alice, &invitation.id).await,
        Err(AppError::Forbidden(_))
    ));

    let outcome = pairing.accept(&bob, &invitation.id).await.unwrap();
    assert!(!outcome.already_active);
    assert_eq!(outcome.connection.partner_uid.as_deref(), Some(alice.uid.as_str()));
    assert_eq!(outcome.fan_out.failed, 0);

    assert_eq!(visibility(&db, &alice_event.id).await, vec![bob.email.clone()]);
    assert_eq!(visibility(&db, &bob_event.id).await, vec![alice.email.clone()]);

    // Each event is visible to exactly its creator and the active partner
    for (event_id, creator, partner) in [
        (&alice_event.id, &alice, &bob),
        (&bob_event.id, &bob, &alice),
    ] {
        let event = db.get_dday(event_id).await.unwrap().unwrap();
        assert!(event.is_visible_to(&creator.email));
        assert!(event.is_visible_to(&partner.email));
    }

    let (_, partner) = pairing.current(&alice.uid).await.unwrap().unwrap();
    assert_eq!(partner.unwrap().uid, bob.uid);
}

#[tokio::test]
async fn test_reaccept_is_noop() {
    require_emulator!();

    let db = test_db().await;
    let pairing = PairingService::new(db.clone());
    let alice = stored_user(&db, "alice").await;
    let bob = stored_user(&db, "bob").await;

    let invitation = pairing.invite(&alice, &bob.email).await.unwrap();
    let first = pairing.accept(&bob, &invitation.id).await.unwrap();
    let second = pairing.accept(&bob, &invitation.id).await.unwrap();

    assert!(second.already_active);
    assert_eq!(second.connection, first.connection);
}

#[tokio::test]
async fn test_reject_leaves_no_connection_documents() {
    require_emulator!();

    let db = test_db().await;
    let pairing = PairingService::new(db.clone());
    let alice = stored_user(&db, "alice").await;
    let bob = stored_user(&db, "bob").await;
    let alice_event = event_for(&db, &alice, "Alice trip").await;

    // Pending reject
    let invitation = pairing.invite(&alice, &bob.email).await.unwrap();
    pairing.reject(&bob, &invitation.id).await.unwrap();
    assert!(db.list_connections(&alice.uid).await.unwrap().is_empty());
    assert!(db.list_connections(&bob.uid).await.unwrap().is_empty());

    // Active reject revokes visibility again
    let invitation = pairing.invite(&alice, &bob.email).await.unwrap();
    pairing.accept(&bob, &invitation.id).await.unwrap();
    assert_eq!(visibility(&db, &alice_event.id).await, vec![bob.email.clone()]);

    pairing.reject(&alice, &invitation.id).await.unwrap();
    assert!(db.list_connections(&alice.uid).await.unwrap().is_empty());
    assert!(db.list_connections(&bob.uid).await.unwrap().is_empty());
    assert!(visibility(&db, &alice_event.id).await.is_empty());
    let event = db.get_dday(&alice_event.id).await.unwrap().unwrap();
    assert!(event.is_visible_to(&alice.email));
    assert!(!event.is_visible_to(&bob.email));
}

#[tokio::test]
async fn test_accept_after_withdrawal_does_not_resurrect_pair() {
    require_emulator!();

    let db = test_db().await;
    let pairing = PairingService::new(db.clone());
    let alice = stored_user(&db, "alice").await;
    let bob = stored_user(&db, "bob").await;
    let alice_event = event_for(&db, &alice, "Alice trip").await;

    let invitation = pairing.invite(&alice, &bob.email).await.unwrap();

    // Accept has read both sides...
    let bob_doc = db.get_connection(&bob.uid, &invitation.id).await.unwrap().unwrap();
    let alice_doc = db.get_connection(&alice.uid, &invitation.id).await.unwrap().unwrap();

    // ...when the inviter withdraws
    pairing.reject(&alice, &invitation.id).await.unwrap();

    let result = db
        .activate_connection_pair(
            (bob.uid.as_str(), &activated(&bob_doc, &alice.uid, "t1")),
            (alice.uid.as_str(), &activated(&alice_doc, &bob.uid, "t1")),
        )
        .await;

    assert!(matches!(result, Err(AppError::NotFound(_))), "{:?}", result);
    assert!(db.list_connections(&alice.uid).await.unwrap().is_empty());
    assert!(db.list_connections(&bob.uid).await.unwrap().is_empty());

    let event = db.get_dday(&alice_event.id).await.unwrap().unwrap();
    assert!(!event.is_visible_to(&bob.email));
}

#[tokio::test]
async fn test_accept_withdrawn_invitation_is_not_found() {
    require_emulator!();

    let db = test_db().await;
    let pairing = PairingService::new(db.clone());
    let alice = stored_user(&db, "alice").await;
    let bob = stored_user(&db, "bob").await;

    let invitation = pairing.invite(&alice, &bob.email).await.unwrap();
    db.delete_connection_docs(&invitation.id, &[alice.uid.as_str()])
        .await
        .unwrap();

    assert!(matches!(
        pairing.accept(&bob, &invitation.id).await,
        Err(AppError::NotFound(_))
    ));
    assert!(pairing.current(&bob.uid).await.unwrap().is_none());
}

#[tokio::test]
async fn test_invite_conflicts() {
    require_emulator!();

    let db = test_db().await;
    let pairing = PairingService::new(db.clone());
    let alice = stored_user(&db, "alice").await;
    let bob = stored_user(&db, "bob").await;
    let carol = stored_user(&db, "carol").await;

    assert!(matches!(
        pairing.invite(&alice, &alice.email).await,
        Err(AppError::BadRequest(_))
    ));
    assert!(matches!(
        pairing.invite(&alice, "nobody@example.invalid").await,
        Err(AppError::NotFound(_))
    ));

    let invitation = pairing.invite(&alice, &bob.email).await.unwrap();
    assert!(matches!(
        pairing.invite(&alice, &bob.email).await,
        Err(AppError::Conflict(_))
    ));

    pairing.accept(&bob, &invitation.id).await.unwrap();
    assert!(matches!(
        pairing.invite(&carol, &alice.email).await,
        Err(AppError::Conflict(_))
    ));
}

// ═══════════════════════════════════════════════════════════════════════════
// DELETION TESTS
// ═══════════════════════════════════════════════════════════════════════════

#[tokio::test]
async fn test_delete_user_data_disconnects_partner() {
    require_emulator!();

    let db = test_db().await;
    let pairing = PairingService::new(db.clone());
    let alice = stored_user(&db, "alice").await;
    let bob = stored_user(&db, "bob").await;
    let alice_event = event_for(&db, &alice, "Alice trip").await;
    let bob_event = event_for(&db, &bob, "Bob concert").await;

    let invitation = pairing.invite(&alice, &bob.email).await.unwrap();
    pairing.accept(&bob, &invitation.id).await.unwrap();

    pairing.disconnect_all(&alice).await.unwrap();
    let deleted = db.delete_user_data(&alice.uid, &alice.email).await.unwrap();
    assert!(deleted >= 3);

    assert!(db.get_user(&alice.uid).await.unwrap().is_none());
    assert!(db.get_dday(&alice_event.id).await.unwrap().is_none());
    assert!(db.list_connections(&bob.uid).await.unwrap().is_empty());
    assert!(visibility(&db, &bob_event.id).await.is_empty());
}
