mod common;

use common::{image_bytes, query_value, SearchReply, TestApp, API_KEY};
use virtual_tourist::models::{Coordinate, ImageState, IMAGE_ERROR_MARKER};
use virtual_tourist::screens::{MapAction, PrimaryAction, TapOutcome};
use virtual_tourist::services::UiEvent;
use virtual_tourist::storage::ImageStore;
use virtual_tourist::AppError;

const SAN_FRANCISCO: Coordinate = Coordinate {
    latitude: 37.7749,
    longitude: -122.4194,
};

#[tokio::test]
async fn test_failure_envelope_message_reaches_caller() {
    let t = TestApp::start(SearchReply::Failure {
        code: 100,
        message: "Invalid API Key (Key has invalid format)".into(),
    })
    .await;

    let err = t.app.provider().search(SAN_FRANCISCO, 1).await.unwrap_err();
    assert!(matches!(err, AppError::Api { code: Some(100), .. }));
    assert_eq!(err.to_string(), "Invalid API Key (Key has invalid format)");
}

#[tokio::test]
async fn test_failed_search_stores_nothing_and_alerts_on_map() {
    let mut t = TestApp::start(SearchReply::Failure {
        code: 105,
        message: "Service currently unavailable".into(),
    })
    .await;

    let map = t.app.map_mut();
    map.begin_drop(SAN_FRANCISCO);
    let pin = map.end_drop().await.unwrap().unwrap();

    let events = t.app.run_until_idle().await.unwrap();
    assert_eq!(
        events,
        vec![UiEvent::SearchFailed {
            pin_id: pin.id.clone(),
            message: "Service currently unavailable".into(),
            retryable: true,
        }]
    );

    assert!(t.app.library().photos(&pin.id).await.unwrap().is_empty());
    assert_eq!(t.app.library().pin(&pin.id).await.unwrap().page_count, None);

    let alert = t.app.map_mut().take_alert().unwrap();
    assert_eq!(alert.message, "Service currently unavailable");
    assert_eq!(alert.button_titles(), vec!["Retry", "OK"]);
}

#[tokio::test]
async fn test_search_request_parameters() {
    let t = TestApp::start(SearchReply::page(1, 0)).await;

    t.app.provider().search(SAN_FRANCISCO, 2).await.unwrap();

    let queries = t.stub.search_queries();
    assert_eq!(queries.len(), 1);
    let query = &queries[0];
    assert_eq!(query_value(query, "method").as_deref(), Some("flickr.photos.search"));
    assert_eq!(query_value(query, "api_key").as_deref(), Some(API_KEY));
    assert_eq!(query_value(query, "format").as_deref(), Some("json"));
    assert_eq!(query_value(query, "nojsoncallback").as_deref(), Some("1"));
    assert_eq!(query_value(query, "extras").as_deref(), Some("url_m"));
    assert_eq!(query_value(query, "page").as_deref(), Some("2"));
    assert_eq!(query_value(query, "per_page").as_deref(), Some("21"));
    assert!(query_value(query, "bbox").unwrap().contains("%2C"));
}

#[tokio::test]
async fn test_one_photo_per_descriptor() {
    let mut t = TestApp::start(SearchReply::page(3, 5)).await;

    let pin = t.app.library().create_pin(SAN_FRANCISCO).await.unwrap();
    let created = t.app.provider().fetch_photos_for_pin(&pin).await.unwrap();
    assert_eq!(created.len(), 5);

    t.app.run_until_idle().await.unwrap();

    let photos = t.app.library().photos(&pin.id).await.unwrap();
    assert_eq!(photos.len(), 5);
    let created_urls: Vec<&str> = created.iter().map(|p| p.url.as_str()).collect();
    let stored_urls: Vec<&str> = photos.iter().map(|p| p.url.as_str()).collect();
    assert_eq!(created_urls, stored_urls);
    assert!(photos
        .iter()
        .all(|p| matches!(p.image_state(), ImageState::Stored(_))));

    assert_eq!(t.app.library().pin(&pin.id).await.unwrap().page_count, Some(3));
    assert_eq!(t.stub.requested_pages(), vec![1]);
    assert_eq!(t.stored_files().len(), 5);

    // Stored bytes are what the image host served.
    let path = photos[0].stored_path().unwrap().to_string();
    let data = t.app.library().images().load(&path).await.unwrap();
    let served_path = format!("/images/{}", photos[0].file_name());
    assert_eq!(data, image_bytes(&served_path));
}

#[tokio::test]
async fn test_empty_result_page_stores_page_count_only() {
    let mut t = TestApp::start(SearchReply::page(0, 0)).await;

    let map = t.app.map_mut();
    map.begin_drop(SAN_FRANCISCO);
    let pin = map.end_drop().await.unwrap().unwrap();

    let events = t.app.run_until_idle().await.unwrap();
    assert_eq!(
        events,
        vec![UiEvent::PhotosAdded {
            pin_id: pin.id.clone(),
            count: 0
        }]
    );
    assert_eq!(t.app.library().pin(&pin.id).await.unwrap().page_count, Some(0));

    let browser = t.app.open_photos(&pin.id).await.unwrap();
    assert!(browser.has_no_images());
    assert!(browser.primary_action_enabled());
}

#[tokio::test]
async fn test_delete_pin_removes_photos_and_files() {
    let mut t = TestApp::start(SearchReply::page(2, 4)).await;

    let map = t.app.map_mut();
    map.begin_drop(SAN_FRANCISCO);
    let pin = map.end_drop().await.unwrap().unwrap();
    t.app.run_until_idle().await.unwrap();
    assert_eq!(t.stored_files().len(), 4);

    let photo_ids: Vec<String> = t
        .app
        .library()
        .photos(&pin.id)
        .await
        .unwrap()
        .into_iter()
        .map(|p| p.id)
        .collect();

    let map = t.app.map_mut();
    map.toggle_editing();
    let action = map.tap_pin(&pin.id).await.unwrap();
    assert_eq!(
        action,
        MapAction::Removed {
            pin_id: pin.id.clone(),
            photos: 4
        }
    );

    assert!(t.app.map().pins().is_empty());
    assert!(t.app.library().pins().await.unwrap().is_empty());
    for id in &photo_ids {
        assert!(t.app.library().photo(id).await.unwrap().is_none());
    }
    assert!(t.stored_files().is_empty());
}

#[tokio::test]
async fn test_failed_download_then_retry_only_that_photo() {
    let mut t = TestApp::start(SearchReply::Page {
        pages: 1,
        count: 4,
        broken: vec![2],
    })
    .await;

    let map = t.app.map_mut();
    map.begin_drop(SAN_FRANCISCO);
    let pin = map.end_drop().await.unwrap().unwrap();
    t.app.run_until_idle().await.unwrap();

    let photos = t.app.library().photos(&pin.id).await.unwrap();
    assert_eq!(photos[2].image_path.as_deref(), Some(IMAGE_ERROR_MARKER));
    assert_eq!(photos[2].image_state(), ImageState::Failed);
    for index in [0, 1, 3] {
        assert!(matches!(photos[index].image_state(), ImageState::Stored(_)));
    }
    assert_eq!(t.stub.image_requests(), 4);

    t.stub.repair_images();
    let browser = t.app.open_photos(&pin.id).await.unwrap();
    assert_eq!(browser.tap_cell(2).await.unwrap(), TapOutcome::Retrying);
    assert_eq!(browser.cells()[2].state, ImageState::Failed);

    let events = t.app.run_until_idle().await.unwrap();
    assert_eq!(
        events,
        vec![UiEvent::ImageStored {
            pin_id: pin.id.clone(),
            photo_id: photos[2].id.clone(),
        }]
    );
    assert_eq!(t.stub.image_requests(), 5);

    let after = t.app.library().photos(&pin.id).await.unwrap();
    assert!(after
        .iter()
        .all(|p| matches!(p.image_state(), ImageState::Stored(_))));
    for index in [0, 1, 3] {
        assert_eq!(after[index].image_path, photos[index].image_path);
    }
}

#[tokio::test]
async fn test_new_collection_page_choice() {
    let mut t = TestApp::start(SearchReply::page(4, 3)).await;

    let pin = t.app.library().create_pin(SAN_FRANCISCO).await.unwrap();
    let browser = t.app.open_photos(&pin.id).await.unwrap();

    // No page count yet: first page.
    assert_eq!(
        browser.press_primary_action().await.unwrap(),
        PrimaryAction::NewCollection {
            discarded: 0,
            page: 1
        }
    );
    assert!(!browser.primary_action_enabled());
    t.app.run_until_idle().await.unwrap();
    assert_eq!(t.stored_files().len(), 3);
    let first_photos = t.app.library().photos(&pin.id).await.unwrap();

    let browser = t.app.browser_mut().unwrap();
    assert_eq!(browser.len(), 3);
    assert!(browser.primary_action_enabled());
    let action = browser.press_primary_action().await.unwrap();
    let PrimaryAction::NewCollection { discarded, page } = action else {
        panic!("expected a new collection, got {:?}", action);
    };
    assert_eq!(discarded, 3);
    assert!((1..=4).contains(&page));

    t.app.run_until_idle().await.unwrap();

    let pages = t.stub.requested_pages();
    assert_eq!(pages.len(), 2);
    assert_eq!(pages[1], page);

    let photos = t.app.library().photos(&pin.id).await.unwrap();
    assert_eq!(photos.len(), 3);
    for old in &first_photos {
        assert!(photos.iter().all(|p| p.id != old.id));
    }
    // Old files are gone, new ones stored.
    assert_eq!(t.stored_files().len(), 3);
}

#[tokio::test]
async fn test_search_for_deleted_pin_is_discarded() {
    let mut t = TestApp::start(SearchReply::page(1, 3)).await;

    let map = t.app.map_mut();
    map.begin_drop(SAN_FRANCISCO);
    let pin = map.end_drop().await.unwrap().unwrap();

    // Delete before the search completion is applied.
    t.app.library().delete_pin(&pin.id).await.unwrap();

    let events = t.app.run_until_idle().await.unwrap();
    assert_eq!(events, vec![UiEvent::Discarded]);
    assert!(t.app.library().photos(&pin.id).await.unwrap().is_empty());
    assert_eq!(t.stub.image_requests(), 0);
}

#[tokio::test]
async fn test_download_for_deleted_photo_leaves_no_file() {
    let mut t = TestApp::start(SearchReply::page(1, 2)).await;

    let pin = t.app.library().create_pin(SAN_FRANCISCO).await.unwrap();
    let created = t.app.provider().fetch_photos_for_pin(&pin).await.unwrap();

    // Both downloads are in flight; the photos go away first.
    let ids: Vec<String> = created.iter().map(|p| p.id.clone()).collect();
    t.app.library().delete_photos(&ids).await.unwrap();

    let events = t.app.run_until_idle().await.unwrap();
    assert_eq!(events, vec![UiEvent::Discarded, UiEvent::Discarded]);
    assert!(t.stored_files().is_empty());
}

#[tokio::test]
async fn test_failed_search_for_deleted_pin_raises_no_alert() {
    let mut t = TestApp::start(SearchReply::Status(500)).await;

    let map = t.app.map_mut();
    map.begin_drop(SAN_FRANCISCO);
    let pin = map.end_drop().await.unwrap().unwrap();

    // Removed in delete mode while its search is still running.
    map.toggle_editing();
    map.tap_pin(&pin.id).await.unwrap();

    let events = t.app.run_until_idle().await.unwrap();
    assert_eq!(events, vec![UiEvent::Discarded]);
    assert!(t.app.map().alert().is_none());
    assert!(!t.app.provider().is_searching(&pin.id));
}

#[tokio::test]
async fn test_fetch_image_records_path_or_marker() {
    let t = TestApp::start(SearchReply::Page {
        pages: 1,
        count: 2,
        broken: vec![1],
    })
    .await;

    let pin = t.app.library().create_pin(SAN_FRANCISCO).await.unwrap();
    let page = t.app.provider().search(SAN_FRANCISCO, 1).await.unwrap();
    let created = t
        .app
        .library()
        .record_search(&pin.id, &page)
        .await
        .unwrap()
        .unwrap();

    t.app.provider().fetch_image(&created[0]).await.unwrap();
    let stored = t.app.library().photo(&created[0].id).await.unwrap().unwrap();
    let path = stored.stored_path().unwrap().to_string();
    assert!(t.app.library().images().exists(&path).await);
    assert_eq!(
        t.app.library().images().load(&path).await.unwrap(),
        image_bytes(&format!("/images/{}", created[0].file_name()))
    );

    let err = t.app.provider().fetch_image(&created[1]).await.unwrap_err();
    assert!(matches!(err, AppError::UnexpectedStatus(404)));
    let failed = t.app.library().photo(&created[1].id).await.unwrap().unwrap();
    assert_eq!(failed.image_path.as_deref(), Some(IMAGE_ERROR_MARKER));

    assert_eq!(t.stored_files().len(), 1);
    assert!(t.app.is_idle());
}
