mod common;

use common::TestApp;
use rfid_warehouse_api::{entities::tag_movement, errors::ServiceError};
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter, QueryOrder};

use assert_matches::assert_matches;

#[tokio::test]
async fn current_location_tracks_latest_event() {
    let app = TestApp::new().await;
    app.seed_item("ITM-A", "Alpha").await;
    app.seed_tag("RF001", "ITM-A").await;

    let ledger = app.state.services.ledger.clone();

    assert_eq!(ledger.current_location("RF001").await.unwrap(), None);

    ledger.receive("RF001", "REC-01", 3).await.unwrap();
    assert_eq!(
        ledger.current_location("RF001").await.unwrap().as_deref(),
        Some("REC-01")
    );

    ledger.move_tag("RF001", "ZONE-B", None, 3).await.unwrap();
    ledger.move_tag("RF001", "ZONE-C", None, 3).await.unwrap();
    assert_eq!(
        ledger.current_location("RF001").await.unwrap().as_deref(),
        Some("ZONE-C")
    );
}

#[tokio::test]
async fn move_chain_is_connected() {
    let app = TestApp::new().await;
    app.seed_item("ITM-A", "Alpha").await;
    app.seed_tag("RF001", "ITM-A").await;

    let ledger = app.state.services.ledger.clone();
    ledger.receive("RF001", "REC-01", 1).await.unwrap();

    let stops = ["ZONE-A", "ZONE-B", "ZONE-C", "SHIP-01"];
    for stop in stops {
        ledger.move_tag("RF001", stop, None, 1).await.unwrap();
    }

    let movements = tag_movement::Entity::find()
        .filter(tag_movement::Column::TagUid.eq("RF001"))
        .order_by_asc(tag_movement::Column::MovementTime)
        .order_by_asc(tag_movement::Column::Id)
        .all(&*app.state.db)
        .await
        .unwrap();

    assert_eq!(movements.len(), stops.len() + 1);
    for pair in movements.windows(2) {
        assert_eq!(
            pair[1].from_location.as_deref(),
            Some(pair[0].to_location.as_str()),
            "each movement must start where the previous one ended"
        );
    }
}

#[tokio::test]
async fn receive_always_resets_the_chain() {
    let app = TestApp::new().await;
    app.seed_item("ITM-A", "Alpha").await;
    app.seed_tag("RF001", "ITM-A").await;

    let ledger = app.state.services.ledger.clone();
    ledger.receive("RF001", "REC-01", 1).await.unwrap();
    ledger.move_tag("RF001", "ZONE-B", None, 1).await.unwrap();

    // The tag physically re-enters the warehouse.
    ledger.receive("RF001", "REC-02", 1).await.unwrap();

    let latest = tag_movement::Entity::find()
        .filter(tag_movement::Column::TagUid.eq("RF001"))
        .order_by_desc(tag_movement::Column::MovementTime)
        .order_by_desc(tag_movement::Column::Id)
        .one(&*app.state.db)
        .await
        .unwrap()
        .unwrap();

    assert_eq!(latest.to_location, "REC-02");
    assert_eq!(latest.from_location, None);
    assert_eq!(
        ledger.current_location("RF001").await.unwrap().as_deref(),
        Some("REC-02")
    );
}

#[tokio::test]
async fn domain_errors_leave_no_partial_rows() {
    let app = TestApp::new().await;
    app.seed_item("ITM-A", "Alpha").await;

    let ledger = app.state.services.ledger.clone();

    let err = ledger.receive("RF404", "REC-01", 1).await.unwrap_err();
    assert_matches!(err, ServiceError::NotFound(_));

    let count = tag_movement::Entity::find()
        .all(&*app.state.db)
        .await
        .unwrap()
        .len();
    assert_eq!(count, 0);
}

#[tokio::test]
async fn concurrent_moves_on_one_tag_serialize() {
    let app = TestApp::new().await;
    app.seed_item("ITM-A", "Alpha").await;
    app.seed_tag("RF001", "ITM-A").await;

    let ledger = app.state.services.ledger.clone();
    ledger.receive("RF001", "REC-01", 1).await.unwrap();

    let mut handles = Vec::new();
    for i in 0..8 {
        let ledger = ledger.clone();
        handles.push(tokio::spawn(async move {
            ledger
                .move_tag("RF001", &format!("ZONE-{i}"), None, 1)
                .await
        }));
    }
    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    let movements = tag_movement::Entity::find()
        .filter(tag_movement::Column::TagUid.eq("RF001"))
        .order_by_asc(tag_movement::Column::MovementTime)
        .order_by_asc(tag_movement::Column::Id)
        .all(&*app.state.db)
        .await
        .unwrap();

    // One receive plus eight moves, and no two moves computed the same stale
    // origin: the chain stays connected.
    assert_eq!(movements.len(), 9);
    for pair in movements.windows(2) {
        assert_eq!(
            pair[1].from_location.as_deref(),
            Some(pair[0].to_location.as_str())
        );
    }
}

#[tokio::test]
async fn operations_on_distinct_tags_run_in_parallel() {
    let app = TestApp::new().await;
    app.seed_item("ITM-A", "Alpha").await;
    for i in 0..4 {
        app.seed_tag(&format!("RF00{i}"), "ITM-A").await;
    }

    let ledger = app.state.services.ledger.clone();

    let mut handles = Vec::new();
    for i in 0..4 {
        let ledger = ledger.clone();
        handles.push(tokio::spawn(async move {
            let tag = format!("RF00{i}");
            ledger.receive(&tag, "REC-01", 1).await?;
            ledger.move_tag(&tag, "ZONE-B", None, 1).await?;
            Ok::<_, ServiceError>(())
        }));
    }
    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    for i in 0..4 {
        assert_eq!(
            ledger
                .current_location(&format!("RF00{i}"))
                .await
                .unwrap()
                .as_deref(),
            Some("ZONE-B")
        );
    }
}
