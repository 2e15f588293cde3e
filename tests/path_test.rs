//! Tests for path creation and resolution against a mocked Drive.

use mockito::{Matcher, Mock, Server, ServerGuard};
use serde_json::json;

use drivepath::mime::types;
use drivepath::{
    Authenticator, Drive, DriveClient, DriveConfig, DriveError, PathOptions, PermissionGrant,
};

async fn setup() -> (ServerGuard, Drive) {
    let server = Server::new_async().await;
    let auth = Authenticator::from_access_token("test-token").unwrap();
    let client =
        DriveClient::with_config(auth, DriveConfig::with_base_url(&server.url())).unwrap();
    (server, Drive::new(client))
}

/// files.list answering `q` with `files`.
async fn mock_list(server: &mut ServerGuard, q: &str, files: serde_json::Value, hits: usize) -> Mock {
    server
        .mock("GET", "/files")
        .match_query(Matcher::UrlEncoded("q".into(), q.into()))
        .match_header("authorization", "Bearer test-token")
        .with_header("content-type", "application/json")
        .with_body(json!({ "files": files }).to_string())
        .expect(hits)
        .create_async()
        .await
}

/// files.list answering `q` with an empty first page that points at a
/// second page holding `files`.
async fn mock_paged_list(server: &mut ServerGuard, q: &str, files: serde_json::Value) -> [Mock; 2] {
    let first = server
        .mock("GET", "/files")
        .match_query(Matcher::AllOf(vec![
            Matcher::UrlEncoded("q".into(), q.into()),
            Matcher::Regex("q=[^&]*$".into()),
        ]))
        .with_header("content-type", "application/json")
        .with_body(r#"{"files": [], "nextPageToken": "p2"}"#)
        .expect(1)
        .create_async()
        .await;
    let second = server
        .mock("GET", "/files")
        .match_query(Matcher::AllOf(vec![
            Matcher::UrlEncoded("q".into(), q.into()),
            Matcher::UrlEncoded("pageToken".into(), "p2".into()),
        ]))
        .with_header("content-type", "application/json")
        .with_body(json!({ "files": files }).to_string())
        .expect(1)
        .create_async()
        .await;
    [first, second]
}

/// Metadata-only files.create whose body matches `body`.
async fn mock_create(
    server: &mut ServerGuard,
    body: Matcher,
    response: serde_json::Value,
) -> Mock {
    server
        .mock("POST", "/files")
        .match_query(Matcher::Any)
        .match_body(body)
        .with_header("content-type", "application/json")
        .with_body(response.to_string())
        .expect(1)
        .create_async()
        .await
}

mod create_from_path {
    use super::*;

    #[tokio::test]
    async fn test_creates_missing_chain_in_order() {
        let (mut server, drive) = setup().await;

        let lists = vec![
            mock_list(&mut server, "name = 'Reports' and trashed = false", json!([]), 1).await,
            mock_list(
                &mut server,
                "name = '2024' and 'id-reports' in parents and trashed = false",
                json!([]),
                1,
            )
            .await,
            mock_list(
                &mut server,
                "name = 'summary.csv' and 'id-2024' in parents and trashed = false",
                json!([]),
                1,
            )
            .await,
        ];

        let creates = vec![
            mock_create(
                &mut server,
                Matcher::Json(json!({"name": "Reports", "mimeType": types::FOLDER})),
                json!({"id": "id-reports", "name": "Reports", "mimeType": types::FOLDER}),
            )
            .await,
            mock_create(
                &mut server,
                Matcher::Json(json!({
                    "name": "2024",
                    "mimeType": types::FOLDER,
                    "parents": ["id-reports"]
                })),
                json!({"id": "id-2024", "name": "2024", "mimeType": types::FOLDER, "parents": ["id-reports"]}),
            )
            .await,
            mock_create(
                &mut server,
                Matcher::Json(json!({
                    "name": "summary.csv",
                    "mimeType": types::SPREADSHEET,
                    "parents": ["id-2024"]
                })),
                json!({"id": "id-summary", "name": "summary.csv", "mimeType": types::SPREADSHEET, "parents": ["id-2024"]}),
            )
            .await,
        ];

        let chain = drive
            .create_from_path("Reports/2024/summary.csv", PathOptions::default())
            .await
            .unwrap();

        let names: Vec<_> = chain.iter().map(|f| f.name()).collect();
        assert_eq!(names, ["Reports", "2024", "summary.csv"]);
        assert_eq!(chain[0].metadata().parents, Vec::<String>::new());
        assert_eq!(chain[1].metadata().parents, ["id-reports"]);
        assert_eq!(chain[2].metadata().parents, ["id-2024"]);
        assert_eq!(chain[2].mime_type(), Some(types::SPREADSHEET));

        for mock in lists.iter().chain(creates.iter()) {
            mock.assert_async().await;
        }
    }

    #[tokio::test]
    async fn test_existing_chain_is_reused_without_creating() {
        let (mut server, drive) = setup().await;

        let lists = vec![
            mock_list(
                &mut server,
                "name = 'Reports' and trashed = false",
                json!([{"id": "id-reports", "name": "Reports", "mimeType": types::FOLDER}]),
                2,
            )
            .await,
            mock_list(
                &mut server,
                "name = '2024' and 'id-reports' in parents and trashed = false",
                json!([{"id": "id-2024", "name": "2024", "mimeType": types::FOLDER}]),
                2,
            )
            .await,
            mock_list(
                &mut server,
                "name = 'summary.csv' and 'id-2024' in parents and trashed = false",
                json!([{"id": "id-summary", "name": "summary.csv"}]),
                2,
            )
            .await,
        ];
        let no_create = server
            .mock("POST", Matcher::Any)
            .expect(0)
            .create_async()
            .await;

        let first = drive
            .create_from_path("Reports/2024/summary.csv", PathOptions::default())
            .await
            .unwrap();
        let second = drive
            .create_from_path("Reports/2024/summary.csv", PathOptions::default())
            .await
            .unwrap();

        let ids = |chain: &[drivepath::DriveFile]| {
            chain.iter().map(|f| f.id().to_string()).collect::<Vec<_>>()
        };
        assert_eq!(ids(&first), ["id-reports", "id-2024", "id-summary"]);
        assert_eq!(ids(&first), ids(&second));
        assert!(first[2].content().is_none());

        for mock in &lists {
            mock.assert_async().await;
        }
        no_create.assert_async().await;
    }

    #[tokio::test]
    async fn test_folder_on_later_page_is_reused() {
        let (mut server, drive) = setup().await;

        let pages = mock_paged_list(
            &mut server,
            "name = 'Reports' and trashed = false",
            json!([{"id": "existing", "name": "Reports", "mimeType": types::FOLDER}]),
        )
        .await;
        let leaf = mock_list(
            &mut server,
            "name = 'a.txt' and 'existing' in parents and trashed = false",
            json!([{"id": "id-a", "name": "a.txt"}]),
            1,
        )
        .await;
        let no_create = server
            .mock("POST", Matcher::Any)
            .expect(0)
            .create_async()
            .await;

        let chain = drive
            .create_from_path("Reports/a.txt", PathOptions::default())
            .await
            .unwrap();

        let ids: Vec<_> = chain.iter().map(|f| f.id()).collect();
        assert_eq!(ids, ["existing", "id-a"]);
        for mock in pages.iter().chain([&leaf]) {
            mock.assert_async().await;
        }
        no_create.assert_async().await;
    }

    #[tokio::test]
    async fn test_leaf_without_folders_is_looked_up_by_name_and_uploaded() {
        let (mut server, drive) = setup().await;

        let list = mock_list(&mut server, "name = 'notes.txt' and trashed = false", json!([]), 1).await;
        let upload = server
            .mock("POST", "/upload/files")
            .match_query(Matcher::UrlEncoded("uploadType".into(), "multipart".into()))
            .match_header("content-type", Matcher::Regex("^multipart/form-data".into()))
            .match_body(Matcher::AllOf(vec![
                Matcher::Regex("hello drive".into()),
                Matcher::Regex(types::DOCUMENT.replace('.', r"\.")),
            ]))
            .with_header("content-type", "application/json")
            .with_body(json!({"id": "id-notes", "name": "notes.txt", "mimeType": types::DOCUMENT}).to_string())
            .expect(1)
            .create_async()
            .await;

        let chain = drive
            .create_from_path("notes.txt", PathOptions::default().with_content("hello drive"))
            .await
            .unwrap();

        assert_eq!(chain.len(), 1);
        assert_eq!(chain[0].id(), "id-notes");
        assert_eq!(chain[0].content(), Some(&b"hello drive"[..]));
        list.assert_async().await;
        upload.assert_async().await;
    }

    #[tokio::test]
    async fn test_explicit_mime_type_wins_over_guess() {
        let (mut server, drive) = setup().await;

        mock_list(&mut server, "name = 'data.csv' and trashed = false", json!([]), 1).await;
        let create = mock_create(
            &mut server,
            Matcher::PartialJson(json!({"name": "data.csv", "mimeType": "text/csv"})),
            json!({"id": "id-data", "name": "data.csv", "mimeType": "text/csv"}),
        )
        .await;

        drive
            .create_from_path("data.csv", PathOptions::default().with_mime_type("text/csv"))
            .await
            .unwrap();
        create.assert_async().await;
    }

    #[tokio::test]
    async fn test_grant_without_email_fails_after_creation() {
        let (mut server, drive) = setup().await;

        mock_list(&mut server, "name = 'Shared' and trashed = false", json!([]), 1).await;
        mock_list(
            &mut server,
            "name = 'a.txt' and 'id-shared' in parents and trashed = false",
            json!([]),
            1,
        )
        .await;
        let folder = mock_create(
            &mut server,
            Matcher::PartialJson(json!({"name": "Shared"})),
            json!({"id": "id-shared", "name": "Shared", "mimeType": types::FOLDER}),
        )
        .await;
        let file = mock_create(
            &mut server,
            Matcher::PartialJson(json!({"name": "a.txt"})),
            json!({"id": "id-a", "name": "a.txt", "mimeType": types::DOCUMENT}),
        )
        .await;
        let no_permission = server
            .mock("POST", "/files/id-shared/permissions")
            .match_query(Matcher::Any)
            .expect(0)
            .create_async()
            .await;

        let options = PathOptions::default().with_permission(PermissionGrant::new(""));
        let err = drive.create_from_path("Shared/a.txt", options).await.unwrap_err();

        assert!(matches!(err, DriveError::InvalidParameter(_)));
        folder.assert_async().await;
        file.assert_async().await;
        no_permission.assert_async().await;
    }

    #[tokio::test]
    async fn test_grants_apply_to_every_entity() {
        let (mut server, drive) = setup().await;

        mock_list(
            &mut server,
            "name = 'Team' and trashed = false",
            json!([{"id": "id-team", "name": "Team"}]),
            1,
        )
        .await;
        mock_list(
            &mut server,
            "name = 'plan.txt' and 'id-team' in parents and trashed = false",
            json!([{"id": "id-plan", "name": "plan.txt"}]),
            1,
        )
        .await;

        let mut permission_mocks = Vec::new();
        for id in ["id-team", "id-plan"] {
            permission_mocks.push(
                server
                    .mock("POST", format!("/files/{}/permissions", id).as_str())
                    .match_query(Matcher::UrlEncoded(
                        "sendNotificationEmail".into(),
                        "false".into(),
                    ))
                    .match_body(Matcher::PartialJson(json!({"emailAddress": "bob@example.com"})))
                    .with_header("content-type", "application/json")
                    .with_body(r#"{"id": "perm", "role": "reader", "type": "user"}"#)
                    .expect(1)
                    .create_async()
                    .await,
            );
            permission_mocks.push(
                server
                    .mock("GET", format!("/files/{}", id).as_str())
                    .match_query(Matcher::Any)
                    .with_header("content-type", "application/json")
                    .with_body(json!({"id": id, "name": "x", "permissions": [{"id": "perm"}]}).to_string())
                    .expect(1)
                    .create_async()
                    .await,
            );
        }

        let options = PathOptions::default().with_permission(PermissionGrant::new("bob@example.com"));
        let chain = drive.create_from_path("Team/plan.txt", options).await.unwrap();

        assert!(chain.iter().all(|f| f.metadata().permissions.len() == 1));
        for mock in &permission_mocks {
            mock.assert_async().await;
        }
    }

    #[tokio::test]
    async fn test_empty_leaf_is_rejected_before_any_call() {
        let (mut server, drive) = setup().await;
        let none = server
            .mock("GET", Matcher::Any)
            .expect(0)
            .create_async()
            .await;

        let err = drive
            .create_from_path("Reports/", PathOptions::default())
            .await
            .unwrap_err();
        assert!(matches!(err, DriveError::InvalidParameter(_)));
        none.assert_async().await;
    }
}

mod get_from_path {
    use super::*;

    #[tokio::test]
    async fn test_returns_every_leaf_match() {
        let (mut server, drive) = setup().await;

        mock_list(
            &mut server,
            "name = 'Reports' and trashed = false",
            json!([{"id": "id-reports", "name": "Reports"}]),
            1,
        )
        .await;
        let leaf = mock_list(
            &mut server,
            "name = 'summary.csv' and 'id-reports' in parents and trashed = false",
            json!([
                {"id": "one", "name": "summary.csv"},
                {"id": "two", "name": "summary.csv"}
            ]),
            1,
        )
        .await;

        let files = drive.get_from_path("Reports/summary.csv").await.unwrap();
        let ids: Vec<_> = files.iter().map(|f| f.id()).collect();
        assert_eq!(ids, ["one", "two"]);
        leaf.assert_async().await;
    }

    #[tokio::test]
    async fn test_folder_on_later_page_resolves() {
        let (mut server, drive) = setup().await;

        let pages = mock_paged_list(
            &mut server,
            "name = 'Reports' and trashed = false",
            json!([{"id": "existing", "name": "Reports"}]),
        )
        .await;
        let leaf = mock_list(
            &mut server,
            "name = 'summary.csv' and 'existing' in parents and trashed = false",
            json!([{"id": "id-summary", "name": "summary.csv"}]),
            1,
        )
        .await;

        let files = drive.get_from_path("Reports/summary.csv").await.unwrap();
        assert_eq!(files.len(), 1);
        assert_eq!(files[0].id(), "id-summary");
        for mock in pages.iter().chain([&leaf]) {
            mock.assert_async().await;
        }
    }

    #[tokio::test]
    async fn test_missing_folder_short_circuits() {
        let (mut server, drive) = setup().await;

        mock_list(
            &mut server,
            "name = 'Reports' and trashed = false",
            json!([{"id": "id-reports", "name": "Reports"}]),
            1,
        )
        .await;
        let missing = mock_list(
            &mut server,
            "name = '2023' and 'id-reports' in parents and trashed = false",
            json!([]),
            1,
        )
        .await;
        let never = server
            .mock("GET", "/files")
            .match_query(Matcher::Regex("x\\.csv".into()))
            .expect(0)
            .create_async()
            .await;

        let files = drive.get_from_path("Reports/2023/x.csv").await.unwrap();
        assert!(files.is_empty());
        missing.assert_async().await;
        never.assert_async().await;
    }

    #[tokio::test]
    async fn test_api_errors_propagate() {
        let (mut server, drive) = setup().await;
        server
            .mock("GET", "/files")
            .match_query(Matcher::Any)
            .with_status(403)
            .with_body(r#"{"error": {"code": 403, "message": "Rate Limit Exceeded"}}"#)
            .create_async()
            .await;

        let err = drive.get_from_path("a/b.txt").await.unwrap_err();
        assert_eq!(err.status(), Some(403));
    }

    #[tokio::test]
    async fn test_include_trashed_drops_the_filter() {
        let mut server = Server::new_async().await;
        let auth = Authenticator::from_access_token("test-token").unwrap();
        let config = DriveConfig {
            skip_trashed: false,
            ..DriveConfig::with_base_url(&server.url())
        };
        let drive = Drive::new(DriveClient::with_config(auth, config).unwrap());

        let list = mock_list(&mut server, "name = 'old.txt'", json!([{"id": "o"}]), 1).await;

        let files = drive.get_from_path("old.txt").await.unwrap();
        assert_eq!(files.len(), 1);
        list.assert_async().await;
    }
}

mod delete_path {
    use super::*;

    #[tokio::test]
    async fn test_deletes_every_match() {
        let (mut server, drive) = setup().await;

        mock_list(
            &mut server,
            "name = 'dup.txt' and trashed = false",
            json!([{"id": "d1"}, {"id": "d2"}]),
            1,
        )
        .await;
        let d1 = server
            .mock("DELETE", "/files/d1")
            .with_status(204)
            .expect(1)
            .create_async()
            .await;
        let d2 = server
            .mock("DELETE", "/files/d2")
            .with_status(204)
            .expect(1)
            .create_async()
            .await;

        assert_eq!(drive.delete_path("dup.txt").await.unwrap(), 2);
        d1.assert_async().await;
        d2.assert_async().await;
    }
}
