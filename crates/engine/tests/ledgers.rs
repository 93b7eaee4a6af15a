mod common;

use chrono::Utc;
use uuid::Uuid;

use common::{add_user, engine_with_db, join_as, memory_db, new_ledger};
use engine::{
    Currency, DeletionMode, Engine, EngineError, LedgerUpdate, RedemptionFailure, Role,
};

fn no_access() -> EngineError {
    EngineError::Forbidden("no access to this ledger".to_string())
}

#[tokio::test]
async fn creator_becomes_sole_owner() {
    let (engine, db) = engine_with_db().await;
    let alice = add_user(&db, "alice").await;

    let ledger = engine
        .create_ledger(&alice, "  Family  ", Some("shared costs"), None)
        .await
        .unwrap();
    assert_eq!(ledger.name, "Family");
    assert_eq!(ledger.description.as_deref(), Some("shared costs"));
    assert_eq!(ledger.currency, Currency::Cny);

    let list = engine.list_ledgers(&alice).await.unwrap();
    assert_eq!(list.ledgers.len(), 1);
    let summary = &list.ledgers[0];
    assert_eq!(summary.ledger.id, ledger.id);
    assert_eq!(summary.role, Role::Owner);
    assert_eq!(summary.owner_id, alice);
    assert_eq!(summary.member_count, 1);
    assert_eq!(list.default_ledger_id, Some(ledger.id));
}

#[tokio::test]
async fn blank_names_are_rejected() {
    let (engine, db) = engine_with_db().await;
    let alice = add_user(&db, "alice").await;

    let err = engine
        .create_ledger(&alice, "   ", None, None)
        .await
        .unwrap_err();
    assert_eq!(
        err,
        EngineError::InvalidInput("ledger name must not be empty".to_string())
    );
    assert!(engine.list_ledgers(&alice).await.unwrap().ledgers.is_empty());
}

#[tokio::test]
async fn configured_currency_is_the_fallback() {
    let db = memory_db().await;
    let engine = Engine::builder()
        .database(db.clone())
        .default_currency(Currency::Eur)
        .build()
        .await
        .unwrap();
    let alice = add_user(&db, "alice").await;

    let implicit = engine
        .create_ledger(&alice, "Trip", None, None)
        .await
        .unwrap();
    let explicit = engine
        .create_ledger(&alice, "Tokyo", None, Some(Currency::Jpy))
        .await
        .unwrap();
    assert_eq!(implicit.currency, Currency::Eur);
    assert_eq!(explicit.currency, Currency::Jpy);
}

#[tokio::test]
async fn missing_and_foreign_ledgers_look_the_same() {
    let (engine, db) = engine_with_db().await;
    let alice = add_user(&db, "alice").await;
    let mallory = add_user(&db, "mallory").await;
    let ledger_id = new_ledger(&engine, &alice).await;

    assert_eq!(
        engine.ledger(&mallory, ledger_id).await.unwrap_err(),
        no_access()
    );
    assert_eq!(
        engine.ledger(&mallory, Uuid::new_v4()).await.unwrap_err(),
        no_access()
    );
}

#[tokio::test]
async fn admins_update_ledger_metadata() {
    let (engine, db) = engine_with_db().await;
    let alice = add_user(&db, "alice").await;
    let bob = add_user(&db, "bob").await;
    let carol = add_user(&db, "carol").await;
    let ledger_id = engine
        .create_ledger(&alice, "Flat", Some("rent"), None)
        .await
        .unwrap()
        .id;
    join_as(&engine, &alice, ledger_id, &bob, Role::Admin).await;
    join_as(&engine, &alice, ledger_id, &carol, Role::Editor).await;

    let updated = engine
        .update_ledger(
            &bob,
            ledger_id,
            LedgerUpdate {
                name: Some("Shared flat".to_string()),
                description: None,
            },
        )
        .await
        .unwrap();
    assert_eq!(updated.name, "Shared flat");
    assert_eq!(updated.description.as_deref(), Some("rent"));

    let cleared = engine
        .update_ledger(
            &alice,
            ledger_id,
            LedgerUpdate {
                name: None,
                description: Some(String::new()),
            },
        )
        .await
        .unwrap();
    assert_eq!(cleared.description, None);

    let err = engine
        .update_ledger(
            &carol,
            ledger_id,
            LedgerUpdate {
                name: Some("Mine".to_string()),
                description: None,
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::Forbidden(_)));
}

#[tokio::test]
async fn only_the_owner_deletes() {
    let (engine, db) = engine_with_db().await;
    let alice = add_user(&db, "alice").await;
    let bob = add_user(&db, "bob").await;
    let ledger_id = new_ledger(&engine, &alice).await;
    join_as(&engine, &alice, ledger_id, &bob, Role::Admin).await;

    let err = engine.delete_ledger(&bob, ledger_id).await.unwrap_err();
    assert!(matches!(err, EngineError::Forbidden(_)));
    assert!(engine.ledger(&bob, ledger_id).await.is_ok());
}

#[tokio::test]
async fn soft_delete_hides_ledger_and_revokes_invitations() {
    let (engine, db) = engine_with_db().await;
    assert_eq!(engine.deletion_mode(), DeletionMode::Soft);
    let alice = add_user(&db, "alice").await;
    let bob = add_user(&db, "bob").await;
    let carol = add_user(&db, "carol").await;
    let ledger_id = new_ledger(&engine, &alice).await;
    join_as(&engine, &alice, ledger_id, &bob, Role::Editor).await;
    let pending = engine
        .create_invitation(&alice, ledger_id, Role::Viewer, 0, None)
        .await
        .unwrap();

    engine.delete_ledger(&alice, ledger_id).await.unwrap();

    assert!(engine.list_ledgers(&alice).await.unwrap().ledgers.is_empty());
    assert!(engine.list_ledgers(&bob).await.unwrap().ledgers.is_empty());
    assert_eq!(engine.ledger(&bob, ledger_id).await.unwrap_err(), no_access());
    assert_eq!(
        engine
            .join_by_invitation(&carol, &pending.token, Utc::now())
            .await
            .unwrap_err(),
        EngineError::Redemption(RedemptionFailure::Revoked)
    );
}

#[tokio::test]
async fn hard_delete_removes_everything() {
    let db = memory_db().await;
    let engine = Engine::builder()
        .database(db.clone())
        .deletion(DeletionMode::Hard)
        .build()
        .await
        .unwrap();
    let alice = add_user(&db, "alice").await;
    let bob = add_user(&db, "bob").await;
    let ledger_id = new_ledger(&engine, &alice).await;
    let pending = engine
        .create_invitation(&alice, ledger_id, Role::Viewer, 0, None)
        .await
        .unwrap();

    engine.delete_ledger(&alice, ledger_id).await.unwrap();

    assert!(engine.list_ledgers(&alice).await.unwrap().ledgers.is_empty());
    assert_eq!(
        engine
            .join_by_invitation(&bob, &pending.token, Utc::now())
            .await
            .unwrap_err(),
        EngineError::Redemption(RedemptionFailure::NotFound)
    );
}

#[tokio::test]
async fn default_ledger_falls_back_to_earliest_membership() {
    let (engine, db) = engine_with_db().await;
    let alice = add_user(&db, "alice").await;
    let bob = add_user(&db, "bob").await;
    let first = new_ledger(&engine, &alice).await;
    std::thread::sleep(std::time::Duration::from_millis(5));
    let second = new_ledger(&engine, &alice).await;

    let list = engine.list_ledgers(&alice).await.unwrap();
    assert_eq!(list.ledgers.len(), 2);
    assert_eq!(list.default_ledger_id, Some(first));

    engine.set_default_ledger(&alice, second).await.unwrap();
    let list = engine.list_ledgers(&alice).await.unwrap();
    assert_eq!(list.default_ledger_id, Some(second));
    let flagged: Vec<_> = list.ledgers.iter().filter(|l| l.is_default).collect();
    assert_eq!(flagged.len(), 1);
    assert_eq!(flagged[0].ledger.id, second);

    engine.set_default_ledger(&alice, first).await.unwrap();
    assert_eq!(
        engine.list_ledgers(&alice).await.unwrap().default_ledger_id,
        Some(first)
    );

    assert_eq!(
        engine.set_default_ledger(&bob, first).await.unwrap_err(),
        no_access()
    );
}
