//! Ledger tests: lot creation, capacity-guarded placement, release, the
//! combined add-inventory intake, and the expiry-classified listing.

mod common;

use common::{days_from_today, TestApp};
use coldchain_api::{
    entities::{location::LocationStatus, lot},
    errors::ServiceError,
    services::expiry::ExpiryStatus,
    services::ledger::{AddInventoryInput, CreateLotInput, InventoryListFilter},
};
use sea_orm::{EntityTrait, PaginatorTrait};
use uuid::Uuid;

fn lot_input(sku: &str, lot_number: &str, total_qty: i32) -> CreateLotInput {
    CreateLotInput {
        sku: sku.into(),
        lot_number: lot_number.into(),
        manufacture_date: Some(days_from_today(-14)),
        expiry_date: days_from_today(90),
        total_qty,
        supplier: Some("Fresh Farms Co".into()),
        origin_country: Some("VN".into()),
    }
}

#[tokio::test]
async fn placement_is_refused_beyond_capacity_and_reports_headroom() {
    let app = TestApp::new().await;
    let loc = app.location("COLD-A-01", "COLD-A", 1000).await;
    let lot = app.ledger().create_lot(lot_input("APPLE", "LOT-1", 1200)).await.unwrap();

    app.ledger().place_inventory(lot.id, loc.id, 950).await.unwrap();

    let err = app
        .ledger()
        .place_inventory(lot.id, loc.id, 100)
        .await
        .unwrap_err();
    match err {
        ServiceError::CapacityExceeded {
            location,
            requested,
            available,
        } => {
            assert_eq!(location, "COLD-A-01");
            assert_eq!(requested, 100);
            assert_eq!(available, 50);
        }
        other => panic!("expected CapacityExceeded, got {other:?}"),
    }

    // The reported headroom still fits
    app.ledger().place_inventory(lot.id, loc.id, 50).await.unwrap();
    let loc = app.ledger().get_location(loc.id).await.unwrap();
    assert_eq!(loc.current_qty, 1000);
    assert_eq!(loc.max_qty, 1000);
}

#[tokio::test]
async fn repeated_placement_merges_into_one_record() {
    let app = TestApp::new().await;
    let loc = app.location("COLD-A-02", "COLD-A", 500).await;
    let lot = app.ledger().create_lot(lot_input("APPLE", "LOT-2", 300)).await.unwrap();

    app.ledger().place_inventory(lot.id, loc.id, 100).await.unwrap();
    app.ledger().place_inventory(lot.id, loc.id, 150).await.unwrap();

    let rows = app
        .ledger()
        .list_inventory(InventoryListFilter::default())
        .await
        .unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].quantity, 250);

    let lot = app.ledger().get_lot(lot.id).await.unwrap();
    assert_eq!(lot.available_qty, 50);
    assert_eq!(lot.allocated_qty, 250);
    assert_eq!(lot.available_qty + lot.allocated_qty, lot.total_qty);
}

#[tokio::test]
async fn blocked_locations_reject_placement_but_allow_release() {
    let app = TestApp::new().await;
    let loc = app.location("COLD-B-01", "COLD-B", 500).await;
    let lot = app.ledger().create_lot(lot_input("PEAR", "LOT-3", 200)).await.unwrap();
    app.ledger().place_inventory(lot.id, loc.id, 120).await.unwrap();

    app.ledger()
        .set_location_status(loc.id, LocationStatus::Blocked)
        .await
        .unwrap();

    let err = app
        .ledger()
        .place_inventory(lot.id, loc.id, 10)
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::LocationBlocked(_)));

    // Stock already there can still leave
    app.ledger().release_inventory(lot.id, loc.id, 120).await.unwrap();
    let loc = app.ledger().get_location(loc.id).await.unwrap();
    assert_eq!(loc.current_qty, 0);
}

#[tokio::test]
async fn release_beyond_the_bound_quantity_is_refused() {
    let app = TestApp::new().await;
    let loc = app.location("COLD-B-02", "COLD-B", 500).await;
    let lot = app.ledger().create_lot(lot_input("PEAR", "LOT-4", 200)).await.unwrap();
    app.ledger().place_inventory(lot.id, loc.id, 80).await.unwrap();

    let err = app
        .ledger()
        .release_inventory(lot.id, loc.id, 100)
        .await
        .unwrap_err();
    match err {
        ServiceError::InsufficientQuantity {
            requested,
            available,
        } => {
            assert_eq!(requested, 100);
            assert_eq!(available, 80);
        }
        other => panic!("expected InsufficientQuantity, got {other:?}"),
    }

    // Nothing bound at all
    let err = app
        .ledger()
        .release_inventory(lot.id, Uuid::new_v4(), 1)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        ServiceError::InsufficientQuantity { available: 0, .. }
    ));
}

#[tokio::test]
async fn lot_invariant_holds_through_place_and_release_cycles() {
    let app = TestApp::new().await;
    let loc_a = app.location("COLD-C-01", "COLD-C", 500).await;
    let loc_b = app.location("COLD-C-02", "COLD-C", 500).await;
    let lot = app.ledger().create_lot(lot_input("GRAPE", "LOT-5", 400)).await.unwrap();

    // A lot may span multiple locations
    app.ledger().place_inventory(lot.id, loc_a.id, 250).await.unwrap();
    app.ledger().place_inventory(lot.id, loc_b.id, 100).await.unwrap();
    let current = app.ledger().get_lot(lot.id).await.unwrap();
    assert_eq!(current.available_qty, 50);
    assert_eq!(current.allocated_qty, 350);
    assert_eq!(current.available_qty + current.allocated_qty, current.total_qty);

    app.ledger().release_inventory(lot.id, loc_a.id, 250).await.unwrap();
    let current = app.ledger().get_lot(lot.id).await.unwrap();
    assert_eq!(current.total_qty, 150);
    assert_eq!(current.allocated_qty, 100);
    assert_eq!(current.available_qty, 50);
    assert!(current.available_qty >= 0 && current.allocated_qty >= 0);

    // The fully released record is gone from the listing
    let rows = app
        .ledger()
        .list_inventory(InventoryListFilter::default())
        .await
        .unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].location, "COLD-C-02");
}

#[tokio::test]
async fn lot_creation_validates_its_input() {
    let app = TestApp::new().await;

    let err = app
        .ledger()
        .create_lot(lot_input("APPLE", "LOT-6", 0))
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::ValidationError(_)));

    let err = app
        .ledger()
        .create_lot(lot_input("APPLE", "   ", 10))
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::ValidationError(_)));
}

#[tokio::test]
async fn placement_cannot_exceed_the_lot_availability() {
    let app = TestApp::new().await;
    let loc = app.location("COLD-D-01", "COLD-D", 5000).await;
    let lot = app.ledger().create_lot(lot_input("APPLE", "LOT-7", 100)).await.unwrap();

    let err = app
        .ledger()
        .place_inventory(lot.id, loc.id, 150)
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::ValidationError(_)));

    let err = app
        .ledger()
        .place_inventory(lot.id, loc.id, 0)
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::ValidationError(_)));
}

#[tokio::test]
async fn placement_against_missing_rows_is_not_found() {
    let app = TestApp::new().await;
    let loc = app.location("COLD-D-02", "COLD-D", 100).await;
    let lot = app.ledger().create_lot(lot_input("APPLE", "LOT-8", 50)).await.unwrap();

    let err = app
        .ledger()
        .place_inventory(lot.id, Uuid::new_v4(), 10)
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::NotFound(_)));

    let err = app
        .ledger()
        .place_inventory(Uuid::new_v4(), loc.id, 10)
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::NotFound(_)));
}

#[tokio::test]
async fn failed_intake_leaves_no_orphan_lot() {
    let app = TestApp::new().await;
    let loc = app.location("COLD-D-03", "COLD-D", 100).await;

    let err = app
        .ledger()
        .add_inventory(AddInventoryInput {
            sku: "APPLE".into(),
            location_id: loc.id,
            lot_number: "LOT-9".into(),
            manufacture_date: None,
            expiry_date: days_from_today(30),
            quantity: 150, // over capacity
            supplier: None,
            origin_country: None,
        })
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::CapacityExceeded { .. }));

    let lots = lot::Entity::find().count(&*app.state.db).await.unwrap();
    assert_eq!(lots, 0, "lot creation must roll back with the placement");
}

#[tokio::test]
async fn listing_classifies_expiry_against_the_current_clock() {
    let app = TestApp::new().await;
    let cold = app.location("COLD-E-01", "COLD-E", 10_000).await;
    let dry = app.location("DRY-A-01", "DRY-A", 10_000).await;

    app.stocked_lot("YOGURT", "LOT-EXP", days_from_today(-1), 10, cold.id).await;
    app.stocked_lot("MILK", "LOT-CRIT", days_from_today(7), 20, cold.id).await;
    app.stocked_lot("CHEESE", "LOT-WARN", days_from_today(8), 30, cold.id).await;
    app.stocked_lot("RICE", "LOT-NORM", days_from_today(31), 40, dry.id).await;

    let rows = app
        .ledger()
        .list_inventory(InventoryListFilter::default())
        .await
        .unwrap();
    assert_eq!(rows.len(), 4);

    let by_lot = |lot_number: &str| {
        rows.iter()
            .find(|row| row.lot_number == lot_number)
            .unwrap_or_else(|| panic!("{lot_number} missing from listing"))
    };
    assert_eq!(by_lot("LOT-EXP").expiry_status, ExpiryStatus::Expired);
    assert_eq!(by_lot("LOT-EXP").days_until_expiry, -1);
    assert_eq!(by_lot("LOT-CRIT").expiry_status, ExpiryStatus::Critical);
    assert_eq!(by_lot("LOT-WARN").expiry_status, ExpiryStatus::Warning);
    assert_eq!(by_lot("LOT-NORM").expiry_status, ExpiryStatus::Normal);
    assert_eq!(by_lot("LOT-NORM").days_until_expiry, 31);

    // Filters compose over the joined row
    let critical = app
        .ledger()
        .list_inventory(InventoryListFilter {
            expiry_status: Some(ExpiryStatus::Critical),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(critical.len(), 1);
    assert_eq!(critical[0].sku, "MILK");

    let cold_zone = app
        .ledger()
        .list_inventory(InventoryListFilter {
            zone: Some("COLD-E".into()),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(cold_zone.len(), 3);

    let by_sku = app
        .ledger()
        .list_inventory(InventoryListFilter {
            sku: Some("RICE".into()),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(by_sku.len(), 1);
    assert_eq!(by_sku[0].location, "DRY-A-01");
}
