//! End-to-end tests over a real socket

use std::sync::Arc;
use std::time::Duration;

use buzon::handlers::AppContext;
use buzon::server::HttpServer;
use buzon::store::{JsonFileStore, RosterStore};
use buzon::uploads::UploadStore;
use serde_json::json;
use tempfile::TempDir;
use tokio::io::{AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpStream;

const ADMIN_KEY: &str = "clave-test";

/// Set up a test server and return the temp directory and address.
async fn setup_test_server(seed: Option<&str>) -> (TempDir, String) {
    let tmp_dir = TempDir::new().unwrap();
    if let Some(seed) = seed {
        std::fs::write(tmp_dir.path().join("seed.json"), seed).unwrap();
    }

    let store = JsonFileStore::new(
        tmp_dir.path().join("data.json"),
        tmp_dir.path().join("seed.json"),
        ADMIN_KEY,
    )
    .await
    .unwrap();
    let uploads = UploadStore::new(tmp_dir.path().join("uploads")).await.unwrap();
    let context = AppContext::new(Arc::new(store), Arc::new(uploads));
    let server = HttpServer::new(context);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let actual_addr = listener.local_addr().unwrap().to_string();

    tokio::spawn(async move {
        if let Err(e) = server.listen_on(listener).await {
            eprintln!("Server error: {}", e);
        }
    });

    tokio::time::sleep(Duration::from_millis(100)).await;

    (tmp_dir, actual_addr)
}

/// Raw HTTP/1.1 client helper: one request, parsed response.
async fn http_request(
    addr: &str,
    method: &str,
    target: &str,
    headers: &[(&str, &str)],
    body: &[u8],
) -> (u16, String, Vec<u8>) {
    let stream = TcpStream::connect(addr).await.unwrap();
    let mut reader = BufReader::new(stream);

    let mut head = format!("{} {} HTTP/1.1\r\nHost: {}\r\n", method, target, addr);
    for (name, value) in headers {
        head.push_str(&format!("{}: {}\r\n", name, value));
    }
    head.push_str(&format!("Content-Length: {}\r\n\r\n", body.len()));

    reader.get_mut().write_all(head.as_bytes()).await.unwrap();
    reader.get_mut().write_all(body).await.unwrap();
    reader.get_mut().flush().await.unwrap();

    let mut status_line = String::new();
    reader.read_line(&mut status_line).await.unwrap();
    let status: u16 = status_line
        .split_whitespace()
        .nth(1)
        .expect("status line")
        .parse()
        .unwrap();

    let mut response_headers = String::new();
    let mut content_length = 0usize;
    loop {
        let mut line = String::new();
        reader.read_line(&mut line).await.unwrap();
        if line == "\r\n" || line == "\n" || line.is_empty() {
            break;
        }
        if let Some(value) = line.to_ascii_lowercase().strip_prefix("content-length:") {
            content_length = value.trim().parse().unwrap();
        }
        response_headers.push_str(&line);
    }

    let mut response_body = vec![0u8; content_length];
    reader.read_exact(&mut response_body).await.unwrap();

    (status, response_headers, response_body)
}

async fn get_json(addr: &str, target: &str) -> (u16, serde_json::Value) {
    let (status, _headers, body) = http_request(addr, "GET", target, &[], b"").await;
    (status, serde_json::from_slice(&body).unwrap())
}

async fn post_json(addr: &str, target: &str, payload: serde_json::Value) -> (u16, serde_json::Value) {
    let body = serde_json::to_vec(&payload).unwrap();
    let (status, _headers, response_body) = http_request(
        addr,
        "POST",
        target,
        &[("Content-Type", "application/json")],
        &body,
    )
    .await;
    (status, serde_json::from_slice(&response_body).unwrap())
}

fn multipart_body(boundary: &str, upload_code: &str, filename: &str, content_type: &str, data: &[u8]) -> Vec<u8> {
    let mut body = Vec::new();
    body.extend_from_slice(format!("--{}\r\n", boundary).as_bytes());
    body.extend_from_slice(b"Content-Disposition: form-data; name=\"codigoSubida\"\r\n\r\n");
    body.extend_from_slice(upload_code.as_bytes());
    body.extend_from_slice(b"\r\n");
    body.extend_from_slice(format!("--{}\r\n", boundary).as_bytes());
    body.extend_from_slice(
        format!(
            "Content-Disposition: form-data; name=\"archivo\"; filename=\"{}\"\r\n",
            filename
        )
        .as_bytes(),
    );
    body.extend_from_slice(format!("Content-Type: {}\r\n\r\n", content_type).as_bytes());
    body.extend_from_slice(data);
    body.extend_from_slice(b"\r\n");
    body.extend_from_slice(format!("--{}--\r\n", boundary).as_bytes());
    body
}

#[tokio::test]
async fn test_health() {
    let (_tmp_dir, addr) = setup_test_server(None).await;

    let (status, value) = get_json(&addr, "/health").await;
    assert_eq!(status, 200);
    assert_eq!(value["ok"], true);
}

#[tokio::test]
async fn test_fresh_store_seeds_default_roster() {
    let (_tmp_dir, addr) = setup_test_server(None).await;

    let (status, value) = get_json(&addr, &format!("/api/admin/info?key={}", ADMIN_KEY)).await;
    assert_eq!(status, 200);
    assert_eq!(value["buzzones"].as_array().unwrap().len(), 12);
}

#[tokio::test]
async fn test_seed_file_controls_roster() {
    let seed = r#"{"participantes": ["Ana", "Luis", "Marta"]}"#;
    let (_tmp_dir, addr) = setup_test_server(Some(seed)).await;

    let (status, value) = get_json(&addr, &format!("/api/admin/info?key={}", ADMIN_KEY)).await;
    assert_eq!(status, 200);

    let buzzones = value["buzzones"].as_array().unwrap();
    assert_eq!(buzzones.len(), 3);
    assert_eq!(buzzones[0]["nombre"], "Ana");
}

#[tokio::test]
async fn test_admin_info_wrong_key() {
    let (_tmp_dir, addr) = setup_test_server(None).await;

    let (status, value) = get_json(&addr, "/api/admin/info?key=equivocada").await;
    assert_eq!(status, 403);
    assert_eq!(value["error"], "Clave admin incorrecta");
}

#[tokio::test]
async fn test_provision_refused_once_roster_exists() {
    let (_tmp_dir, addr) = setup_test_server(None).await;

    // the data file was seeded on first load, so the codes are definitive
    let (status, value) = post_json(
        &addr,
        "/api/admin/buzzones",
        json!({ "adminKey": ADMIN_KEY, "participantes": ["Ana"] }),
    )
    .await;
    assert_eq!(status, 403);
    assert!(value["error"].as_str().unwrap().contains("definitivos"));
}

#[tokio::test]
async fn test_submit_link_round_trip() {
    let seed = r#"{"participantes": ["Ana"]}"#;
    let (_tmp_dir, addr) = setup_test_server(Some(seed)).await;

    let (_, info) = get_json(&addr, &format!("/api/admin/info?key={}", ADMIN_KEY)).await;
    let buzon = &info["buzzones"][0];
    let upload_code = buzon["codigoSubida"].as_str().unwrap();
    let view_code = buzon["codigoVision"].as_str().unwrap();

    // the sender confirms whose mailbox the code opens
    let (status, value) =
        get_json(&addr, &format!("/api/codigo-subida-info?codigo={}", upload_code)).await;
    assert_eq!(status, 200);
    assert_eq!(value["nombre"], "Ana");

    let (status, ack) = post_json(
        &addr,
        "/api/subir-link",
        json!({ "codigoSubida": upload_code, "contenido": "hello", "link": "https://x" }),
    )
    .await;
    assert_eq!(status, 200);
    assert_eq!(ack["ok"], true);

    let (status, mailbox) = get_json(&addr, &format!("/api/buzon?codigoVision={}", view_code)).await;
    assert_eq!(status, 200);
    assert_eq!(mailbox["nombre"], "Ana");

    let items = mailbox["items"].as_array().unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0]["contenido"], "hello");
    assert_eq!(items[0]["link"], "https://x");
}

#[tokio::test]
async fn test_submit_file_round_trip() {
    let seed = r#"{"participantes": ["Ana"]}"#;
    let (_tmp_dir, addr) = setup_test_server(Some(seed)).await;

    let (_, info) = get_json(&addr, &format!("/api/admin/info?key={}", ADMIN_KEY)).await;
    let upload_code = info["buzzones"][0]["codigoSubida"].as_str().unwrap().to_string();
    let view_code = info["buzzones"][0]["codigoVision"].as_str().unwrap().to_string();

    let boundary = "----buzonintegration";
    let body = multipart_body(boundary, &upload_code, "foto.png", "image/png", b"pngbytes");
    let content_type = format!("multipart/form-data; boundary={}", boundary);

    let (status, _headers, response_body) = http_request(
        &addr,
        "POST",
        "/api/subir",
        &[("Content-Type", &content_type)],
        &body,
    )
    .await;
    assert_eq!(status, 200);
    let ack: serde_json::Value = serde_json::from_slice(&response_body).unwrap();
    assert_eq!(ack["ok"], true);

    // the item points at the stored file
    let (_, mailbox) = get_json(&addr, &format!("/api/buzon?codigoVision={}", view_code)).await;
    let archivo = mailbox["items"][0]["archivo"].as_str().unwrap();
    assert!(archivo.starts_with("/uploads/"));
    assert!(archivo.ends_with(".png"));

    // and the file is served back verbatim
    let (status, headers, served) = http_request(&addr, "GET", archivo, &[], b"").await;
    assert_eq!(status, 200);
    assert!(headers.to_ascii_lowercase().contains("content-type: image/png"));
    assert_eq!(served, b"pngbytes");
}

#[tokio::test]
async fn test_submit_rejects_disallowed_file() {
    let seed = r#"{"participantes": ["Ana"]}"#;
    let (_tmp_dir, addr) = setup_test_server(Some(seed)).await;

    let (_, info) = get_json(&addr, &format!("/api/admin/info?key={}", ADMIN_KEY)).await;
    let upload_code = info["buzzones"][0]["codigoSubida"].as_str().unwrap().to_string();
    let view_code = info["buzzones"][0]["codigoVision"].as_str().unwrap().to_string();

    let boundary = "----buzonintegration";
    let body = multipart_body(
        boundary,
        &upload_code,
        "virus.exe",
        "application/octet-stream",
        b"MZ",
    );
    let content_type = format!("multipart/form-data; boundary={}", boundary);

    let (status, _headers, response_body) = http_request(
        &addr,
        "POST",
        "/api/subir",
        &[("Content-Type", &content_type)],
        &body,
    )
    .await;
    assert_eq!(status, 400);
    let error: serde_json::Value = serde_json::from_slice(&response_body).unwrap();
    assert!(error["error"].as_str().unwrap().contains("virus.exe"));

    // no item was appended
    let (_, mailbox) = get_json(&addr, &format!("/api/buzon?codigoVision={}", view_code)).await;
    assert_eq!(mailbox["items"].as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn test_unknown_code_and_route() {
    let (_tmp_dir, addr) = setup_test_server(None).await;

    let (status, value) = get_json(&addr, "/api/buzon?codigoVision=nonexistent").await;
    assert_eq!(status, 404);
    assert_eq!(value["error"], "Código de visualización no válido");

    let (status, _value) = get_json(&addr, "/api/nada").await;
    assert_eq!(status, 404);
}

#[tokio::test]
async fn test_options_preflight_carries_cors_headers() {
    let (_tmp_dir, addr) = setup_test_server(None).await;

    let (status, headers, _body) = http_request(&addr, "OPTIONS", "/api/subir", &[], b"").await;
    assert_eq!(status, 204);

    let headers = headers.to_ascii_lowercase();
    assert!(headers.contains("access-control-allow-origin: *"));
    assert!(headers.contains("access-control-allow-methods:"));
}

#[tokio::test]
async fn test_roster_survives_restart() {
    let tmp_dir = TempDir::new().unwrap();

    let store = JsonFileStore::new(
        tmp_dir.path().join("data.json"),
        tmp_dir.path().join("seed.json"),
        ADMIN_KEY,
    )
    .await
    .unwrap();
    let first = store.load().await.unwrap();
    let codes: Vec<_> = first.mailboxes.iter().map(|b| b.upload_code.clone()).collect();

    // a second store over the same file sees the same codes
    let store = JsonFileStore::new(
        tmp_dir.path().join("data.json"),
        tmp_dir.path().join("seed.json"),
        ADMIN_KEY,
    )
    .await
    .unwrap();
    let reloaded = store.load().await.unwrap();
    let reloaded_codes: Vec<_> = reloaded
        .mailboxes
        .iter()
        .map(|b| b.upload_code.clone())
        .collect();
    assert_eq!(codes, reloaded_codes);
}

#[tokio::test]
async fn test_sequential_requests_on_one_connection() {
    let (_tmp_dir, addr) = setup_test_server(None).await;

    let stream = TcpStream::connect(&addr).await.unwrap();
    let mut reader = BufReader::new(stream);

    for _ in 0..2 {
        reader
            .get_mut()
            .write_all(b"GET /health HTTP/1.1\r\nHost: localhost\r\n\r\n")
            .await
            .unwrap();
        reader.get_mut().flush().await.unwrap();

        let mut status_line = String::new();
        reader.read_line(&mut status_line).await.unwrap();
        assert!(status_line.starts_with("HTTP/1.1 200"));

        let mut content_length = 0usize;
        loop {
            let mut line = String::new();
            reader.read_line(&mut line).await.unwrap();
            if line == "\r\n" || line.is_empty() {
                break;
            }
            if let Some(value) = line.to_ascii_lowercase().strip_prefix("content-length:") {
                content_length = value.trim().parse().unwrap();
            }
        }
        let mut body = vec![0u8; content_length];
        reader.read_exact(&mut body).await.unwrap();
    }
}
