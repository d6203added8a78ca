//! Purpose: Exercise `RestClient` services against a loopback HTTP mock.
//! Exports: Integration tests only.
//! Role: Pin the method, path, query, headers and body each service sends, and error mapping.
//! Invariants: Each mock serves exactly one request and reports what it received.
//! Notes: The mock speaks just enough HTTP/1.1 for a single `Connection: close` exchange.

use std::io::{BufRead, BufReader, Read, Write};
use std::net::TcpListener;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use basalt::api::{ClientConfig, ErrorKind, Filter, Map, QuerySpec, RestClient, SignUp, Value};

struct Captured {
    method: String,
    target: String,
    headers: Vec<(String, String)>,
    body: Vec<u8>,
}

impl Captured {
    fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    fn header_count(&self, name: &str) -> usize {
        self.headers.iter().filter(|(key, _)| key == name).count()
    }

    fn body_text(&self) -> &str {
        std::str::from_utf8(&self.body).expect("utf8 body")
    }
}

struct MockServer {
    base_url: String,
    handle: JoinHandle<Captured>,
}

impl MockServer {
    fn respond(status: u16, body: &'static str) -> Self {
        Self::respond_bytes(status, "application/json", body.as_bytes())
    }

    fn respond_bytes(status: u16, content_type: &'static str, payload: &'static [u8]) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
        let addr = listener.local_addr().expect("addr");
        let handle = thread::spawn(move || {
            let (mut stream, _) = listener.accept().expect("accept");
            let mut reader = BufReader::new(stream.try_clone().expect("clone"));

            let mut request_line = String::new();
            reader.read_line(&mut request_line).expect("request line");
            let mut parts = request_line.split_whitespace();
            let method = parts.next().unwrap_or_default().to_string();
            let target = parts.next().unwrap_or_default().to_string();

            let mut headers = Vec::new();
            loop {
                let mut line = String::new();
                reader.read_line(&mut line).expect("header line");
                let line = line.trim_end();
                if line.is_empty() {
                    break;
                }
                if let Some((name, value)) = line.split_once(':') {
                    headers.push((name.trim().to_ascii_lowercase(), value.trim().to_string()));
                }
            }

            let length = headers
                .iter()
                .find(|(name, _)| name == "content-length")
                .and_then(|(_, value)| value.parse::<usize>().ok())
                .unwrap_or(0);
            let mut body = vec![0u8; length];
            reader.read_exact(&mut body).expect("body");

            let head = format!(
                "HTTP/1.1 {status} {}\r\nContent-Type: {content_type}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
                reason(status),
                payload.len()
            );
            stream.write_all(head.as_bytes()).expect("write head");
            stream.write_all(payload).expect("write body");
            stream.flush().expect("flush");

            Captured {
                method,
                target,
                headers,
                body,
            }
        });
        Self {
            base_url: format!("http://{addr}"),
            handle,
        }
    }

    fn client(&self) -> RestClient {
        let config = ClientConfig::new(self.base_url.as_str(), "anon")
            .expect("config")
            .with_timeout(Duration::from_secs(5));
        RestClient::new(config).expect("client")
    }

    fn finish(self) -> Captured {
        self.handle.join().expect("mock thread")
    }
}

fn reason(status: u16) -> &'static str {
    match status {
        200 => "OK",
        201 => "Created",
        204 => "No Content",
        400 => "Bad Request",
        401 => "Unauthorized",
        404 => "Not Found",
        409 => "Conflict",
        500 => "Internal Server Error",
        _ => "Status",
    }
}

#[test]
fn select_sends_query_and_auth_headers() {
    let server = MockServer::respond(200, r#"[{"id":5,"name":"Widget"}]"#);
    let query = QuerySpec::new()
        .select(["id", "name"])
        .eq("id", 5)
        .order_by("created_at")
        .ascending(false);
    let rows = server.client().select("items", &query).expect("select");
    let captured = server.finish();

    assert_eq!(captured.method, "GET");
    assert_eq!(
        captured.target,
        "/rest/v1/items?select=id%2Cname&id=eq.5&order=created_at.desc"
    );
    assert_eq!(captured.header("apikey"), Some("anon"));
    assert_eq!(captured.header("authorization"), Some("Bearer anon"));
    assert_eq!(captured.header("accept"), Some("application/json"));
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].get("name").and_then(Value::as_text), Some("Widget"));
}

#[test]
fn schema_and_session_token_flow_into_headers() {
    let server = MockServer::respond(200, "[]");
    let config = ClientConfig::new(server.base_url.as_str(), "anon")
        .expect("config")
        .with_schema("inventory")
        .with_timeout(Duration::from_secs(5));
    let client = RestClient::new(config)
        .expect("client")
        .with_access_token("jwt-user");
    let rows = client.select("items", &QuerySpec::new()).expect("select");
    let captured = server.finish();

    assert!(rows.is_empty());
    assert_eq!(captured.target, "/rest/v1/items");
    assert_eq!(captured.header("accept-profile"), Some("inventory"));
    assert_eq!(captured.header("authorization"), Some("Bearer jwt-user"));
}

#[test]
fn insert_with_representation_returns_rows() {
    let server = MockServer::respond(201, r#"[{"id":1,"name":"Widget"}]"#);
    let row = Map::new().with("name", "Widget");
    let rows = server
        .client()
        .insert("items", &[row], true)
        .expect("insert");
    let captured = server.finish();

    assert_eq!(captured.method, "POST");
    assert_eq!(captured.target, "/rest/v1/items");
    assert_eq!(captured.header("prefer"), Some("return=representation"));
    assert_eq!(captured.header("content-type"), Some("application/json"));
    assert_eq!(captured.body_text(), r#"{"name":"Widget"}"#);
    assert_eq!(rows[0].get("id").and_then(Value::as_i64), Some(1));
}

#[test]
fn insert_many_minimal_sends_array_and_returns_nothing() {
    let server = MockServer::respond(201, "");
    let rows = [
        Map::new().with("name", "a"),
        Map::new().with("name", "b"),
    ];
    let inserted = server
        .client()
        .insert("items", &rows, false)
        .expect("insert");
    let captured = server.finish();

    assert!(inserted.is_empty());
    assert_eq!(captured.header("prefer"), Some("return=minimal"));
    assert_eq!(captured.body_text(), r#"[{"name":"a"},{"name":"b"}]"#);
}

#[test]
fn update_sends_patch_with_filters() {
    let server = MockServer::respond(204, "");
    let query = QuerySpec::new().filter("status", Filter::in_list(["draft", "stale"]));
    let changes = Map::new().with("status", "archived");
    let rows = server
        .client()
        .update("items", &query, &changes)
        .expect("update");
    let captured = server.finish();

    assert!(rows.is_empty());
    assert_eq!(captured.method, "PATCH");
    assert_eq!(
        captured.target,
        "/rest/v1/items?status=in.%28draft%2Cstale%29"
    );
    assert_eq!(captured.body_text(), r#"{"status":"archived"}"#);
}

#[test]
fn delete_with_representation_returns_deleted_rows() {
    let server = MockServer::respond(200, r#"[{"id":9}]"#);
    let query = QuerySpec::new().eq("id", 9).return_representation(true);
    let rows = server.client().delete("items", &query).expect("delete");
    let captured = server.finish();

    assert_eq!(captured.method, "DELETE");
    assert_eq!(captured.target, "/rest/v1/items?id=eq.9");
    assert_eq!(captured.header("prefer"), Some("return=representation"));
    assert_eq!(rows.len(), 1);
}

#[test]
fn unfiltered_delete_is_rejected_locally() {
    let config = ClientConfig::new("http://127.0.0.1:9", "anon").expect("config");
    let client = RestClient::new(config).expect("client");
    let err = client
        .delete("items", &QuerySpec::new())
        .expect_err("unfiltered");
    assert_eq!(err.kind(), ErrorKind::Usage);
}

#[test]
fn error_envelope_maps_to_error() {
    let server = MockServer::respond(
        409,
        r#"{"code":"23505","message":"duplicate key value violates unique constraint","details":"Key (id)=(1) already exists.","hint":null}"#,
    );
    let err = server
        .client()
        .insert("items", &[Map::new().with("id", 1i64)], false)
        .expect_err("conflict");
    server.finish();

    assert_eq!(err.kind(), ErrorKind::Conflict);
    assert_eq!(err.status(), Some(409));
    assert_eq!(err.code(), Some("23505"));
    assert_eq!(
        err.message(),
        Some("duplicate key value violates unique constraint")
    );
}

#[test]
fn sign_in_reads_session() {
    let server = MockServer::respond(
        200,
        r#"{"access_token":"jwt-1","token_type":"bearer","expires_in":3600,"refresh_token":"r-1","user":{"id":"u-1","email":"a@b.co","role":"authenticated"}}"#,
    );
    let session = server
        .client()
        .sign_in_with_password("a@b.co", "secret")
        .expect("sign in");
    let captured = server.finish();

    assert_eq!(captured.method, "POST");
    assert_eq!(captured.target, "/auth/v1/token?grant_type=password");
    assert_eq!(
        captured.body_text(),
        r#"{"email":"a@b.co","password":"secret"}"#
    );
    assert_eq!(session.access_token, "jwt-1");
    assert_eq!(session.refresh_token, "r-1");
    assert_eq!(session.expires_in, Some(3600));
    assert_eq!(session.user.expect("user").id, "u-1");
}

#[test]
fn rejected_credentials_map_to_permission_error() {
    let server = MockServer::respond(
        400,
        r#"{"error":"invalid_grant","error_description":"Invalid login credentials"}"#,
    );
    let err = server
        .client()
        .sign_in_with_password("a@b.co", "wrong")
        .expect_err("rejected");
    server.finish();

    assert_eq!(err.kind(), ErrorKind::Usage);
    assert_eq!(err.status(), Some(400));
    assert_eq!(err.message(), Some("Invalid login credentials"));
}

#[test]
fn sign_up_without_session_waits_for_confirmation() {
    let server = MockServer::respond(200, r#"{"id":"u-2","email":"new@b.co","role":""}"#);
    let outcome = server.client().sign_up("new@b.co", "secret").expect("sign up");
    let captured = server.finish();

    assert_eq!(captured.target, "/auth/v1/signup");
    match outcome {
        SignUp::PendingConfirmation(user) => {
            assert_eq!(user.id, "u-2");
            assert_eq!(user.email.as_deref(), Some("new@b.co"));
        }
        SignUp::Session(_) => panic!("expected pending confirmation"),
    }
}

#[test]
fn get_user_uses_session_bearer() {
    let server = MockServer::respond(200, r#"{"id":"u-1","email":"a@b.co","role":"authenticated"}"#);
    let user = server.client().get_user("jwt-1").expect("user");
    let captured = server.finish();

    assert_eq!(captured.method, "GET");
    assert_eq!(captured.target, "/auth/v1/user");
    assert_eq!(captured.header("authorization"), Some("Bearer jwt-1"));
    assert_eq!(captured.header_count("authorization"), 1);
    assert_eq!(captured.header("apikey"), Some("anon"));
    assert_eq!(user.role.as_deref(), Some("authenticated"));
}

#[test]
fn unauthorized_user_lookup_maps_to_permission() {
    let server = MockServer::respond(401, r#"{"msg":"invalid JWT"}"#);
    let err = server.client().get_user("expired").expect_err("unauthorized");
    server.finish();

    assert_eq!(err.kind(), ErrorKind::Permission);
    assert_eq!(err.message(), Some("invalid JWT"));
}

#[test]
fn upload_sends_bytes_to_encoded_object_path() {
    let server = MockServer::respond(200, r#"{"Key":"avatars/team/a b.png","Id":"obj-1"}"#);
    let key = server
        .client()
        .upload_object("avatars", "team/a b.png", b"\x89PNG", "image/png", true)
        .expect("upload");
    let captured = server.finish();

    assert_eq!(captured.method, "POST");
    assert_eq!(captured.target, "/storage/v1/object/avatars/team/a%20b.png");
    assert_eq!(captured.header("x-upsert"), Some("true"));
    assert_eq!(captured.header("content-type"), Some("image/png"));
    assert_eq!(captured.body, b"\x89PNG".to_vec());
    assert_eq!(key, "avatars/team/a b.png");
}

#[test]
fn list_objects_posts_listing_request() {
    let server = MockServer::respond(
        200,
        r#"[{"name":"a.png","id":"obj-1","updated_at":"2026-01-02T00:00:00Z","metadata":{"size":12,"mimetype":"image/png"}}]"#,
    );
    let objects = server
        .client()
        .list_objects("avatars", "team/", 10)
        .expect("list");
    let captured = server.finish();

    assert_eq!(captured.method, "POST");
    assert_eq!(captured.target, "/storage/v1/object/list/avatars");
    assert_eq!(
        captured.body_text(),
        r#"{"prefix":"team/","limit":10,"offset":0,"sortBy":{"column":"name","order":"asc"}}"#
    );
    assert_eq!(objects.len(), 1);
    assert_eq!(objects[0].name, "a.png");
    assert_eq!(objects[0].size, Some(12));
}

#[test]
fn download_returns_raw_bytes() {
    let server = MockServer::respond_bytes(200, "application/octet-stream", b"\x00\x01binary");
    let data = server
        .client()
        .download_object("avatars", "a.png")
        .expect("download");
    let captured = server.finish();

    assert_eq!(captured.method, "GET");
    assert_eq!(captured.target, "/storage/v1/object/avatars/a.png");
    assert_eq!(data, b"\x00\x01binary".to_vec());
}

#[test]
fn remove_sends_prefixes_body() {
    let server = MockServer::respond(200, r#"[{"name":"a.png"}]"#);
    server
        .client()
        .remove_objects("avatars", &["a.png", "team/b.png"])
        .expect("remove");
    let captured = server.finish();

    assert_eq!(captured.method, "DELETE");
    assert_eq!(captured.target, "/storage/v1/object/avatars");
    assert_eq!(
        captured.body_text(),
        r#"{"prefixes":["a.png","team/b.png"]}"#
    );
}

#[test]
fn missing_object_maps_to_not_found() {
    let server = MockServer::respond(404, r#"{"statusCode":"404","error":"not_found","message":"Object not found"}"#);
    let err = server
        .client()
        .download_object("avatars", "gone.png")
        .expect_err("missing");
    server.finish();

    assert_eq!(err.kind(), ErrorKind::NotFound);
    assert_eq!(err.message(), Some("Object not found"));
}

#[test]
fn refresh_session_posts_refresh_grant() {
    let server = MockServer::respond(200, r#"{"access_token":"jwt-2","token_type":"bearer","refresh_token":"r-2"}"#);
    let session = server.client().refresh_session("r-1").expect("refresh");
    let captured = server.finish();

    assert_eq!(captured.target, "/auth/v1/token?grant_type=refresh_token");
    assert_eq!(captured.body_text(), r#"{"refresh_token":"r-1"}"#);
    assert_eq!(session.access_token, "jwt-2");
    assert_eq!(session.expires_in, None);
    assert_eq!(session.user, None);
}

#[test]
fn sign_out_posts_with_session_bearer() {
    let server = MockServer::respond(204, "");
    server.client().sign_out("jwt-1").expect("sign out");
    let captured = server.finish();

    assert_eq!(captured.method, "POST");
    assert_eq!(captured.target, "/auth/v1/logout");
    assert_eq!(captured.header("authorization"), Some("Bearer jwt-1"));
    assert!(captured.body.is_empty());
}
