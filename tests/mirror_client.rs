mod common;

use axum::extract::Path;
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use firmware_selector::mirror::search_profiles;
use firmware_selector::selection::{DeviceKey, Selection};
use firmware_selector::Error;
use serde_json::json;

use common::{clients, device_json, overview_json, spawn_server};

fn mirror_routes() -> Router {
    Router::new()
        .route(
            "/.versions.json",
            get(|| async {
                Json(json!({
                    "stable_version": "23.05.3",
                    "versions_list": ["23.05.3", "22.03.7"]
                }))
            }),
        )
        .route(
            "/releases/:version/.overview.json",
            get(|Path(version): Path<String>| async move {
                if version == "23.05.3" {
                    Ok(Json(overview_json()))
                } else {
                    Err(StatusCode::NOT_FOUND)
                }
            }),
        )
        .route(
            "/snapshots/.overview.json",
            get(|| async { "<html>not json</html>" }),
        )
        .route(
            "/json/v1/*rest",
            get(|Path(rest): Path<String>| async move {
                if rest.trim_start_matches('/') == "releases/23.05.3/targets/ath79/generic/tplink_archer-c7-v2.json" {
                    Ok(Json(device_json()))
                } else {
                    Err(StatusCode::NOT_FOUND)
                }
            }),
        )
}

#[tokio::test]
async fn fetches_versions() {
    let base = spawn_server(mirror_routes()).await;
    let (mirror, _) = clients(&base);

    let versions = mirror.fetch_versions().await.unwrap();
    assert_eq!(versions.stable_version, "23.05.3");
    assert_eq!(versions.versions_list, vec!["23.05.3", "22.03.7"]);
}

#[tokio::test]
async fn fetches_overview_for_release() {
    let base = spawn_server(mirror_routes()).await;
    let (mirror, _) = clients(&base);

    let overview = mirror.fetch_overview("23.05.3").await.unwrap();
    let choices = search_profiles(&overview, "archer");
    assert_eq!(choices.len(), 1);
    assert_eq!(choices[0].title, "TP-Link Archer C7 v2");
}

#[tokio::test]
async fn missing_overview_is_http_error() {
    let base = spawn_server(mirror_routes()).await;
    let (mirror, _) = clients(&base);

    let err = mirror.fetch_overview("19.07.10").await.unwrap_err();
    assert!(matches!(err, Error::HttpStatus { status: 404, .. }));
}

#[tokio::test]
async fn malformed_overview_is_parse_error() {
    let base = spawn_server(mirror_routes()).await;
    let (mirror, _) = clients(&base);

    let err = mirror.fetch_overview("snapshot").await.unwrap_err();
    assert!(matches!(err, Error::Parse { .. }));
}

#[tokio::test]
async fn unreachable_mirror_is_transport_error() {
    let (mirror, _) = clients("http://127.0.0.1:9");
    let err = mirror.fetch_versions().await.unwrap_err();
    assert!(matches!(err, Error::Transport { .. }));
}

#[tokio::test]
async fn selection_resolves_profile_and_device() {
    let base = spawn_server(mirror_routes()).await;
    let (mirror, asu) = clients(&base);
    let selection = Selection::new(mirror, asu);

    let (summary, device) = selection
        .resolve_profile("23.05.3", "tplink_archer-c7-v2")
        .await
        .unwrap();
    assert_eq!(summary.target, "ath79/generic");
    assert_eq!(device.linux_kernel.version, "5.15.150");
    assert_eq!(device.device_packages.len(), 2);

    // Same device again: nothing is re-fetched
    let again = selection
        .select_device(DeviceKey {
            version: "23.05.3".to_string(),
            target: "ath79/generic".to_string(),
            profile: "tplink_archer-c7-v2".to_string(),
        })
        .await
        .unwrap();
    assert!(again.is_none());
}

#[tokio::test]
async fn selection_reports_unknown_profile() {
    let base = spawn_server(mirror_routes()).await;
    let (mirror, asu) = clients(&base);
    let selection = Selection::new(mirror, asu);

    let err = selection
        .resolve_profile("23.05.3", "no_such_device")
        .await
        .unwrap_err();
    assert!(matches!(err, Error::ProfileNotFound { .. }));
}
