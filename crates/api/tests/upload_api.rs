//! HTTP-level tests for `POST /upload`.

mod common;

use axum::http::StatusCode;
use common::{body_json, post_json, post_multipart, TestApp};
use rust_xlsxwriter::Workbook;
use serde_json::json;
use userhub_api::handlers::upload::MAX_FILE_BYTES;
use userhub_db::UserStore;

const HEADER: [&str; 7] = ["Name", "DOB", "Email", "Password", "Phone", "Gender", "Address"];

/// An xlsx with a header row followed by `rows`; empty strings leave the
/// cell blank.
fn xlsx(rows: &[[&str; 7]]) -> Vec<u8> {
    let mut workbook = Workbook::new();
    let sheet = workbook.add_worksheet();
    for (col, title) in HEADER.iter().enumerate() {
        sheet.write_string(0, col as u16, *title).unwrap();
    }
    for (r, row) in rows.iter().enumerate() {
        for (c, cell) in row.iter().enumerate() {
            if !cell.is_empty() {
                sheet.write_string(r as u32 + 1, c as u16, *cell).unwrap();
            }
        }
    }
    workbook.save_to_buffer().unwrap()
}

#[tokio::test]
async fn upload_creates_users_and_skips_blank_rows() {
    let t = TestApp::new();
    let file = xlsx(&[
        ["Ann", "1990-01-15", "ann@x.com", "pw1", "555", "F", "1 Main St"],
        ["", "", "", "", "", "", ""],
        ["Bob", "someday", "bob@x.com", "pw2", "", "M", ""],
    ]);

    let response = post_multipart(t.app(), "/upload", "file", file).await;
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    assert_eq!(json["success"], true);
    assert_eq!(json["message"], "Successfully uploaded 2 users");
    assert_eq!(json["count"], 2);
    assert_eq!(json["skipped"], json!([]));

    let users = json["users"].as_array().unwrap();
    assert_eq!(users[0]["name"], "Ann");
    assert_eq!(users[0]["dateOfBirth"], "1990-01-15");
    assert_eq!(users[1]["name"], "Bob");
    assert!(users[1]["dateOfBirth"].is_null());
    assert!(users.iter().all(|u| u.get("password").is_none()));

    assert_eq!(t.users.list().await.unwrap().len(), 2);
}

#[tokio::test]
async fn uploaded_user_can_log_in() {
    let t = TestApp::new();
    let file = xlsx(&[["Ann", "", "ann@x.com", "pw1", "", "", ""]]);
    assert_eq!(
        post_multipart(t.app(), "/upload", "file", file).await.status(),
        StatusCode::OK
    );

    let login = post_json(t.app(), "/login", json!({ "email": "ann@x.com", "password": "pw1" })).await;
    assert_eq!(login.status(), StatusCode::OK);
}

#[tokio::test]
async fn header_only_workbook_returns_400() {
    let t = TestApp::new();

    let response = post_multipart(t.app(), "/upload", "file", xlsx(&[])).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let json = body_json(response).await;
    assert_eq!(json["success"], false);
    assert_eq!(json["code"], "NO_VALID_ROWS");
    assert_eq!(json["message"], "No valid users found in the Excel file");
    assert!(t.users.list().await.unwrap().is_empty());
}

#[tokio::test]
async fn unreadable_file_returns_400() {
    let t = TestApp::new();

    let response = post_multipart(t.app(), "/upload", "file", b"definitely not a workbook".to_vec()).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["code"], "UNREADABLE_FILE");
}

#[tokio::test]
async fn missing_file_part_returns_400() {
    let t = TestApp::new();

    let response = post_multipart(t.app(), "/upload", "attachment", xlsx(&[])).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["message"], "No file uploaded");

    let response = post_multipart(t.app(), "/upload", "file", Vec::new()).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["message"], "No file uploaded");
}

#[tokio::test]
async fn non_multipart_request_returns_400() {
    let t = TestApp::new();

    let response = post_json(t.app(), "/upload", json!({ "file": "users.xlsx" })).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn oversized_file_returns_413() {
    let t = TestApp::new();

    let response = post_multipart(t.app(), "/upload", "file", vec![b'x'; MAX_FILE_BYTES + 1]).await;
    assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
    assert_eq!(body_json(response).await["code"], "PAYLOAD_TOO_LARGE");
    assert!(t.users.list().await.unwrap().is_empty());
}
