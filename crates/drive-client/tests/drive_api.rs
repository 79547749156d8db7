use drive_client::{DriveClient, DriveError, DriveStorage, NewFile};
use drive_oauth::{OAuthConfig, RefreshTokenSource};
use std::io::Write;
use wiremock::matchers::{body_string_contains, header, header_regex, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn mock_token_endpoint(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path("/token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "access_token": "test_access_token",
            "expires_in": 3599,
            "token_type": "Bearer"
        })))
        .mount(server)
        .await;
}

fn client_for(server: &MockServer) -> DriveClient {
    let config = OAuthConfig::new("client".to_string(), "secret".to_string())
        .with_token_url(format!("{}/token", server.uri()));
    let tokens = RefreshTokenSource::new(config, "refresh".to_string());
    DriveClient::new(server.uri(), tokens)
}

fn staged(contents: &[u8]) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(contents).unwrap();
    file.flush().unwrap();
    file
}

#[tokio::test]
async fn verify_folder_requests_id_and_name_on_all_drives() {
    let server = MockServer::start().await;
    mock_token_endpoint(&server).await;

    Mock::given(method("GET"))
        .and(path("/drive/v3/files/FOLDER_1"))
        .and(query_param("fields", "id,name"))
        .and(query_param("supportsAllDrives", "true"))
        .and(header("authorization", "Bearer test_access_token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "id": "FOLDER_1",
            "name": "Uploads"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let folder = client_for(&server).verify_folder("FOLDER_1").await.unwrap();

    assert_eq!(folder.id, "FOLDER_1");
    assert_eq!(folder.name, "Uploads");
}

#[tokio::test]
async fn missing_folder_reports_drive_message() {
    let server = MockServer::start().await;
    mock_token_endpoint(&server).await;

    Mock::given(method("GET"))
        .and(path("/drive/v3/files/GONE"))
        .respond_with(ResponseTemplate::new(404).set_body_json(serde_json::json!({
            "error": {
                "code": 404,
                "message": "File not found: GONE.",
                "errors": [{ "reason": "notFound", "message": "File not found: GONE." }]
            }
        })))
        .mount(&server)
        .await;

    let err = client_for(&server).verify_folder("GONE").await.unwrap_err();

    assert!(matches!(err, DriveError::Api { status: 404, .. }));
    assert_eq!(err.to_string(), "File not found: GONE.");
}

#[tokio::test]
async fn token_failure_stops_before_calling_drive() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/token"))
        .respond_with(ResponseTemplate::new(401).set_body_json(serde_json::json!({
            "error": "unauthorized_client"
        })))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/drive/v3/files/FOLDER_1"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let err = client_for(&server).verify_folder("FOLDER_1").await.unwrap_err();
    assert!(matches!(err, DriveError::Auth(_)));
}

#[tokio::test]
async fn create_file_sends_multipart_related_body() {
    let server = MockServer::start().await;
    mock_token_endpoint(&server).await;

    Mock::given(method("POST"))
        .and(path("/upload/drive/v3/files"))
        .and(query_param("uploadType", "multipart"))
        .and(query_param("supportsAllDrives", "true"))
        .and(header("authorization", "Bearer test_access_token"))
        .and(header_regex("content-type", "^multipart/related; boundary=drive_uploader_"))
        .and(body_string_contains(r#""name":"a.txt""#))
        .and(body_string_contains(r#""mimeType":"text/plain""#))
        .and(body_string_contains(r#""parents":["FOLDER_1"]"#))
        .and(body_string_contains("Content-Type: text/plain\r\n\r\nhello file"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "id": "FILEID123",
            "name": "a.txt"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let content = staged(b"hello file");
    let file = NewFile {
        name: "a.txt".to_string(),
        mime_type: "text/plain".to_string(),
        parent_id: "FOLDER_1".to_string(),
    };

    let created = client_for(&server)
        .create_file(&file, content.path())
        .await
        .unwrap();

    assert_eq!(created.id, "FILEID123");
    assert_eq!(created.name.as_deref(), Some("a.txt"));
}

#[tokio::test]
async fn create_file_rejection_reports_drive_message() {
    let server = MockServer::start().await;
    mock_token_endpoint(&server).await;

    Mock::given(method("POST"))
        .and(path("/upload/drive/v3/files"))
        .respond_with(ResponseTemplate::new(403).set_body_json(serde_json::json!({
            "error": { "code": 403, "message": "The user's Drive storage quota has been exceeded." }
        })))
        .mount(&server)
        .await;

    let content = staged(b"x");
    let file = NewFile {
        name: "x.bin".to_string(),
        mime_type: "application/octet-stream".to_string(),
        parent_id: "FOLDER_1".to_string(),
    };

    let err = client_for(&server)
        .create_file(&file, content.path())
        .await
        .unwrap_err();

    assert_eq!(err.status(), Some(403));
    assert!(err.to_string().contains("storage quota"));
}

#[tokio::test]
async fn missing_content_file_fails_without_upload() {
    let server = MockServer::start().await;
    mock_token_endpoint(&server).await;

    Mock::given(method("POST"))
        .and(path("/upload/drive/v3/files"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let file = NewFile {
        name: "gone.txt".to_string(),
        mime_type: "text/plain".to_string(),
        parent_id: "FOLDER_1".to_string(),
    };

    let err = client_for(&server)
        .create_file(&file, &dir.path().join("gone.txt"))
        .await
        .unwrap_err();

    assert!(matches!(err, DriveError::Io(_)));
}
