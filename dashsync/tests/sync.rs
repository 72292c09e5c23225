use std::path::Path;

use dashsync::config::SyncConfig;
use dashsync::signature::{self, SIGNATURE_FILE};
use dashsync::sync::{FolderOutcome, ItemOutcome, SyncEngine, SyncError};
use dashsync_core::{ClientError, DashboardClient, Folder};
use serde_json::{Value, json};
use tempfile::tempdir;
use wiremock::matchers::{body_partial_json, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn engine(server: &MockServer) -> SyncEngine {
    let client = DashboardClient::new(&server.uri(), "token").unwrap();
    let config = SyncConfig {
        url: server.uri(),
        apikey: "token".to_string(),
    };
    SyncEngine::new(client, config)
}

fn folder(id: i64, uid: &str, title: &str, version: i64) -> Folder {
    Folder {
        id,
        uid: uid.to_string(),
        title: title.to_string(),
        version,
    }
}

fn write_json(path: &Path, value: &Value) {
    std::fs::write(path, serde_json::to_vec_pretty(value).unwrap()).unwrap();
}

async fn mount_folders(server: &MockServer, folders: Value) {
    Mock::given(method("GET"))
        .and(path("/api/folders"))
        .respond_with(ResponseTemplate::new(200).set_body_json(folders))
        .mount(server)
        .await;
}

async fn mount_search(server: &MockServer, folder_id: &str, hits: Value) {
    Mock::given(method("GET"))
        .and(path("/api/search"))
        .and(query_param("type", "dash-db"))
        .and(query_param("folderIds", folder_id))
        .respond_with(ResponseTemplate::new(200).set_body_json(hits))
        .mount(server)
        .await;
}

async fn mount_dashboard(server: &MockServer, uid: &str, slug: &str, dashboard: Value) {
    Mock::given(method("GET"))
        .and(path(format!("/api/dashboards/uid/{uid}")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "meta": { "slug": slug, "url": format!("/d/{uid}/{slug}") },
            "dashboard": dashboard,
        })))
        .mount(server)
        .await;
}

async fn mount_missing_dashboard(server: &MockServer, uid: &str) {
    Mock::given(method("GET"))
        .and(path(format!("/api/dashboards/uid/{uid}")))
        .respond_with(
            ResponseTemplate::new(404).set_body_json(json!({ "message": "Dashboard not found" })),
        )
        .mount(server)
        .await;
}

#[tokio::test]
async fn download_materializes_folders_and_general_dashboards() {
    let server = MockServer::start().await;
    mount_folders(&server, json!([{ "id": 1, "uid": "f1", "title": "Ops", "version": 1 }])).await;
    mount_search(&server, "1", json!([{ "id": 10, "uid": "cpu", "title": "CPU" }])).await;
    mount_search(&server, "0", json!([{ "id": 11, "uid": "home", "title": "Home" }])).await;
    mount_dashboard(
        &server,
        "cpu",
        "cpu-usage",
        json!({ "id": 10, "uid": "cpu", "title": "CPU", "panels": [] }),
    )
    .await;
    mount_dashboard(
        &server,
        "home",
        "home",
        json!({ "id": 11, "uid": "home", "title": "Home", "panels": [] }),
    )
    .await;

    let target = tempdir().unwrap();
    let report = engine(&server).download_all(target.path()).await.unwrap();

    let ops = target.path().join("ops");
    let recorded = signature::read_signature(&ops).unwrap();
    assert_eq!(recorded.uid, "f1");
    assert_eq!(recorded.title, "Ops");

    let saved: Value =
        serde_json::from_slice(&std::fs::read(ops.join("cpu-usage.json")).unwrap()).unwrap();
    assert_eq!(saved["uid"], "cpu");
    assert!(target.path().join("home.json").is_file());

    let summary = report.summary();
    assert_eq!(summary.folders, 1);
    assert_eq!(summary.written, 2);
    assert_eq!(summary.failed, 0);
}

#[tokio::test]
async fn duplicate_titles_never_share_a_directory() {
    let server = MockServer::start().await;
    mount_folders(
        &server,
        json!([
            { "id": 1, "uid": "f1", "title": "Ops", "version": 1 },
            { "id": 2, "uid": "f2", "title": "Ops", "version": 1 }
        ]),
    )
    .await;
    mount_search(&server, "1", json!([])).await;
    mount_search(&server, "0", json!([])).await;
    Mock::given(method("GET"))
        .and(path("/api/search"))
        .and(query_param("folderIds", "2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(0)
        .mount(&server)
        .await;

    let target = tempdir().unwrap();
    let report = engine(&server).download_all(target.path()).await.unwrap();

    let failures: Vec<_> = report.failures().collect();
    assert_eq!(failures.len(), 1);
    assert!(matches!(
        failures[0].1,
        SyncError::SignatureMismatch { recorded, remote, .. } if recorded == "f1" && remote == "f2"
    ));
    let recorded = signature::read_signature(&target.path().join("ops")).unwrap();
    assert_eq!(recorded.uid, "f1");
}

#[tokio::test]
async fn renamed_version_still_reuses_signed_directory() {
    let server = MockServer::start().await;
    mount_folders(&server, json!([{ "id": 1, "uid": "f1", "title": "Ops", "version": 7 }])).await;
    mount_search(&server, "1", json!([])).await;
    mount_search(&server, "0", json!([])).await;

    let target = tempdir().unwrap();
    let ops = target.path().join("ops");
    std::fs::create_dir(&ops).unwrap();
    signature::write_signature(&ops, &folder(1, "f1", "Ops", 1)).unwrap();

    let report = engine(&server).download_all(target.path()).await.unwrap();

    assert!(report.items.iter().any(|item| matches!(
        item,
        ItemOutcome::Folder {
            outcome: FolderOutcome::Reused,
            ..
        }
    )));
    assert_eq!(signature::read_signature(&ops).unwrap().version, 1);
}

#[tokio::test]
async fn folder_listing_failure_aborts_download() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/folders"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({ "message": "Invalid API key" })))
        .mount(&server)
        .await;

    let target = tempdir().unwrap();
    let err = engine(&server)
        .download_all(target.path())
        .await
        .unwrap_err();
    assert!(matches!(err, SyncError::Client(ClientError::Server { .. })));
}

#[tokio::test]
async fn unchanged_dashboard_is_not_resubmitted() {
    let server = MockServer::start().await;
    mount_dashboard(
        &server,
        "cpu",
        "cpu",
        json!({ "id": 10, "uid": "cpu", "title": "CPU", "panels": [{ "type": "graph" }] }),
    )
    .await;
    Mock::given(method("POST"))
        .and(path("/api/dashboards/db"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let root = tempdir().unwrap();
    write_json(
        &root.path().join("cpu.json"),
        &json!({ "id": null, "uid": "cpu", "title": "CPU", "panels": [{ "type": "graph" }] }),
    );

    let report = engine(&server).upload(root.path(), false).await.unwrap();
    assert_eq!(report.summary().unchanged, 1);
    assert_eq!(report.summary().written, 0);
}

#[tokio::test]
async fn invalid_dashboard_makes_no_requests() {
    let server = MockServer::start().await;
    let root = tempdir().unwrap();
    let file = root.path().join("notes.json");
    write_json(&file, &json!({ "title": "not a dashboard" }));

    let report = engine(&server).upload(&file, false).await.unwrap();

    let failures: Vec<_> = report.failures().collect();
    assert_eq!(failures.len(), 1);
    assert!(matches!(failures[0].1, SyncError::InvalidDashboard { .. }));
    assert!(server.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn signed_directory_recreates_missing_folder() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/folders/f1"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({ "message": "Folder not found" })))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/folders/"))
        .and(body_partial_json(json!({ "uid": "f1", "title": "Ops" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": 42, "uid": "f1", "title": "Ops", "version": 1
        })))
        .expect(1)
        .mount(&server)
        .await;
    mount_missing_dashboard(&server, "cpu").await;
    Mock::given(method("POST"))
        .and(path("/api/dashboards/db"))
        .and(body_partial_json(json!({ "folderId": 42, "overwrite": false })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": 5, "uid": "cpu", "url": "/d/cpu/cpu", "status": "success", "version": 1, "slug": "cpu"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let root = tempdir().unwrap();
    let ops = root.path().join("ops");
    std::fs::create_dir(&ops).unwrap();
    signature::write_signature(&ops, &folder(1, "f1", "Ops", 1)).unwrap();
    write_json(
        &ops.join("cpu.json"),
        &json!({ "uid": "cpu", "title": "CPU", "panels": [] }),
    );

    let report = engine(&server).upload(root.path(), false).await.unwrap();

    assert_eq!(report.failures().count(), 0);
    let uploaded = report.items.iter().find_map(|item| match item {
        ItemOutcome::Uploaded { url, .. } => Some(url.clone()),
        _ => None,
    });
    assert_eq!(uploaded, Some(format!("{}/d/cpu/cpu", server.uri())));
    assert!(ops.join(SIGNATURE_FILE).is_file());
}

#[tokio::test]
async fn folder_without_server_id_skips_its_dashboards() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/folders/f1"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/folders/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": 0, "uid": "f1", "title": "Ops", "version": 1
        })))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/dashboards/db"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let root = tempdir().unwrap();
    let ops = root.path().join("ops");
    std::fs::create_dir(&ops).unwrap();
    signature::write_signature(&ops, &folder(1, "f1", "Ops", 1)).unwrap();
    write_json(
        &ops.join("cpu.json"),
        &json!({ "uid": "cpu", "title": "CPU", "panels": [] }),
    );

    let report = engine(&server).upload(&ops, false).await.unwrap();

    let failures: Vec<_> = report.failures().collect();
    assert_eq!(failures.len(), 1);
    assert!(matches!(failures[0].1, SyncError::UnresolvedFolder { uid } if uid == "f1"));
}

#[tokio::test]
async fn conflict_is_reported_and_upload_continues() {
    let server = MockServer::start().await;
    mount_missing_dashboard(&server, "a").await;
    mount_missing_dashboard(&server, "b").await;
    Mock::given(method("POST"))
        .and(path("/api/dashboards/db"))
        .and(body_partial_json(json!({ "dashboard": { "uid": "a" } })))
        .respond_with(ResponseTemplate::new(412).set_body_json(json!({
            "status": "version-mismatch",
            "message": "The dashboard has been changed by someone else"
        })))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/dashboards/db"))
        .and(body_partial_json(json!({ "dashboard": { "uid": "b" }, "folderId": 0 })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": 6, "uid": "b", "url": "/d/b/b", "status": "success", "version": 3, "slug": "b"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let root = tempdir().unwrap();
    write_json(
        &root.path().join("a.json"),
        &json!({ "uid": "a", "title": "A", "panels": [] }),
    );
    write_json(
        &root.path().join("b.json"),
        &json!({ "uid": "b", "title": "B", "panels": [] }),
    );

    let report = engine(&server).upload(root.path(), false).await.unwrap();

    let failures: Vec<_> = report.failures().collect();
    assert_eq!(failures.len(), 1);
    assert_eq!(
        failures[0].1.to_string(),
        "version-mismatch: The dashboard has been changed by someone else"
    );
    assert_eq!(report.summary().written, 1);
}

#[tokio::test]
async fn download_writes_document_text_as_served() {
    let server = MockServer::start().await;
    mount_folders(&server, json!([])).await;
    mount_search(&server, "0", json!([{ "id": 11, "uid": "home", "title": "Home" }])).await;
    let document = r#"{"uid":"home","threshold":123456789012345678901234567890,"panels":[]}"#;
    Mock::given(method("GET"))
        .and(path("/api/dashboards/uid/home"))
        .respond_with(ResponseTemplate::new(200).set_body_string(format!(
            r#"{{"meta":{{"slug":"home"}},"dashboard":{document}}}"#
        )))
        .mount(&server)
        .await;

    let target = tempdir().unwrap();
    let report = engine(&server).download_all(target.path()).await.unwrap();

    assert_eq!(report.failures().count(), 0);
    let saved = std::fs::read_to_string(target.path().join("home.json")).unwrap();
    assert_eq!(saved, document);
}

#[tokio::test]
async fn existing_folder_is_updated_from_signature() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/folders/f1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": 1, "uid": "f1", "title": "Ops", "version": 3
        })))
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .and(path("/api/folders/f1"))
        .and(body_partial_json(json!({
            "uid": "f1", "title": "Ops", "version": 3, "overwrite": false
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": 1, "uid": "f1", "title": "Ops", "version": 4
        })))
        .expect(1)
        .mount(&server)
        .await;
    mount_missing_dashboard(&server, "cpu").await;
    Mock::given(method("POST"))
        .and(path("/api/dashboards/db"))
        .and(body_partial_json(json!({ "folderId": 1 })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": 5, "uid": "cpu", "url": "/d/cpu/cpu", "status": "success", "version": 1, "slug": "cpu"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let root = tempdir().unwrap();
    let ops = root.path().join("ops");
    std::fs::create_dir(&ops).unwrap();
    signature::write_signature(&ops, &folder(1, "f1", "Ops", 3)).unwrap();
    write_json(
        &ops.join("cpu.json"),
        &json!({ "uid": "cpu", "title": "CPU", "panels": [] }),
    );

    let report = engine(&server).upload(&ops, false).await.unwrap();

    assert_eq!(report.failures().count(), 0);
    assert!(report.items.iter().any(|item| matches!(
        item,
        ItemOutcome::Folder {
            outcome: FolderOutcome::Updated,
            ..
        }
    )));
    assert_eq!(report.summary().written, 1);
}

#[tokio::test]
async fn folder_conflict_skips_directory_and_continues() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/folders/f1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": 1, "uid": "f1", "title": "Ops", "version": 5
        })))
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .and(path("/api/folders/f1"))
        .respond_with(ResponseTemplate::new(412).set_body_json(json!({
            "status": "version-mismatch",
            "message": "The folder has been changed by someone else"
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/folders/f2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": 2, "uid": "f2", "title": "Web", "version": 1
        })))
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .and(path("/api/folders/f2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": 2, "uid": "f2", "title": "Web", "version": 2
        })))
        .mount(&server)
        .await;
    mount_missing_dashboard(&server, "app").await;
    Mock::given(method("POST"))
        .and(path("/api/dashboards/db"))
        .and(body_partial_json(json!({ "dashboard": { "uid": "cpu" } })))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/dashboards/db"))
        .and(body_partial_json(json!({ "dashboard": { "uid": "app" }, "folderId": 2 })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": 7, "uid": "app", "url": "/d/app/app", "status": "success", "version": 1, "slug": "app"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let root = tempdir().unwrap();
    let ops = root.path().join("ops");
    let web = root.path().join("web");
    std::fs::create_dir(&ops).unwrap();
    std::fs::create_dir(&web).unwrap();
    signature::write_signature(&ops, &folder(1, "f1", "Ops", 3)).unwrap();
    signature::write_signature(&web, &folder(2, "f2", "Web", 1)).unwrap();
    write_json(
        &ops.join("cpu.json"),
        &json!({ "uid": "cpu", "title": "CPU", "panels": [] }),
    );
    write_json(
        &web.join("app.json"),
        &json!({ "uid": "app", "title": "App", "panels": [] }),
    );

    let report = engine(&server).upload(root.path(), false).await.unwrap();

    let failures: Vec<_> = report.failures().collect();
    assert_eq!(failures.len(), 1);
    assert!(matches!(
        failures[0].1,
        SyncError::Client(ClientError::Conflict { .. })
    ));
    let text = failures[0].1.to_string();
    assert!(text.contains("version-mismatch"));
    assert!(text.contains("The folder has been changed by someone else"));
    assert_eq!(report.summary().written, 1);
}
