use std::net::SocketAddr;
use std::time::Duration;

use fetchlet::{Config, Endpoint, Headers, Loader, ResponseInit, WILDCARD};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;
use tokio::time::timeout;

async fn serve(loader: Loader) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(loader.serve(listener));
    addr
}

async fn spawn_server(config: Config) -> SocketAddr {
    let mut loader = Loader::with_config(config);

    loader.bind(Endpoint::new("/", |_req, res| async move {
        let headers = Headers::from([("Content-Type", "text/plain"), ("Hi-Mom", "It works!")]);
        res.send("Hello, world!", ResponseInit::new(200).headers(headers))?;
        Ok::<_, anyhow::Error>(())
    }));

    loader.bind(Endpoint::new("/echo", |req, res| async move {
        let body: serde_json::Value = req.json().await?;
        res.send(body.to_string(), ResponseInit::new(200).header("Content-Type", "application/json"))?;
        Ok::<_, anyhow::Error>(())
    }));

    loader.bind(Endpoint::new("/text", |req, res| async move {
        let body = req.text().await?;
        res.send(format!("{} {}", req.method, body), ResponseInit::default())?;
        Ok::<_, anyhow::Error>(())
    }));

    loader.bind(Endpoint::new("/slow", |_req, res| async move {
        res.send("early", ResponseInit::default())?;
        tokio::time::sleep(Duration::from_secs(2)).await;
        Ok::<_, anyhow::Error>(())
    }));

    loader.bind(Endpoint::new("/inject", |_req, res| async move {
        res.send("x", ResponseInit::new(200).header("X-Note", "a\r\nSet-Cookie: evil=1"))?;
        Ok::<_, anyhow::Error>(())
    }));

    serve(loader).await
}

/// Reads from `stream` until `needle` has been seen.
async fn read_until(stream: &mut TcpStream, needle: &str) -> String {
    let mut out = Vec::new();
    let mut chunk = [0u8; 1024];
    while !String::from_utf8_lossy(&out).contains(needle) {
        let n = stream.read(&mut chunk).await.unwrap();
        assert!(n > 0, "connection closed before {needle:?} arrived");
        out.extend_from_slice(&chunk[..n]);
    }
    String::from_utf8(out).unwrap()
}

/// Sends raw bytes and reads until the server closes the connection.
async fn roundtrip(addr: SocketAddr, raw: &[u8]) -> String {
    let mut stream = TcpStream::connect(addr).await.unwrap();
    stream.write_all(raw).await.unwrap();

    // A reset after the response still leaves the bytes read so far in `out`.
    let mut out = Vec::new();
    let _ = stream.read_to_end(&mut out).await;
    String::from_utf8(out).unwrap()
}

#[tokio::test]
async fn test_hello_world_over_tcp() {
    let addr = spawn_server(Config::default()).await;

    let reply = roundtrip(addr, b"GET / HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n").await;

    assert!(reply.starts_with("HTTP/1.1 200 OK\r\n"));
    assert!(reply.contains("Content-Type: text/plain\r\n"));
    assert!(reply.contains("Hi-Mom: It works!\r\n"));
    assert!(reply.contains("Content-Length: 13\r\n"));
    assert!(reply.ends_with("\r\n\r\nHello, world!"));
}

#[tokio::test]
async fn test_not_found_over_tcp() {
    let addr = spawn_server(Config::default()).await;

    let reply = roundtrip(addr, b"GET /missing HTTP/1.1\r\nConnection: close\r\n\r\n").await;

    assert!(reply.starts_with("HTTP/1.1 404 Not Found\r\n"));
    assert!(reply.ends_with("404: Not Found! (/missing)"));
}

#[tokio::test]
async fn test_json_body_is_echoed() {
    let addr = spawn_server(Config::default()).await;

    let body = r#"{"hello":"world"}"#;
    let raw = format!(
        "POST /echo HTTP/1.1\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
        body.len(),
        body
    );
    let reply = roundtrip(addr, raw.as_bytes()).await;

    assert!(reply.starts_with("HTTP/1.1 200 OK\r\n"));
    assert!(reply.ends_with(body));
}

#[tokio::test]
async fn test_body_sent_in_pieces_is_complete() {
    let addr = spawn_server(Config::default()).await;
    let mut stream = TcpStream::connect(addr).await.unwrap();

    stream
        .write_all(b"PUT /text HTTP/1.1\r\nContent-Length: 11\r\nConnection: close\r\n\r\nhello")
        .await
        .unwrap();
    tokio::time::sleep(std::time::Duration::from_millis(50)).await;
    stream.write_all(b" world").await.unwrap();

    let mut out = String::new();
    stream.read_to_string(&mut out).await.unwrap();

    assert!(out.ends_with("PUT hello world"));
}

#[tokio::test]
async fn test_malformed_json_gets_500() {
    let addr = spawn_server(Config::default()).await;

    let raw = b"POST /echo HTTP/1.1\r\nContent-Length: 4\r\nConnection: close\r\n\r\n{{{{";
    let reply = roundtrip(addr, raw).await;

    assert!(reply.starts_with("HTTP/1.1 500 Internal Server Error\r\n"));
}

#[tokio::test]
async fn test_keep_alive_serves_several_requests() {
    let addr = spawn_server(Config::default()).await;

    let raw = b"GET / HTTP/1.1\r\n\r\nGET /nope HTTP/1.1\r\nConnection: close\r\n\r\n";
    let reply = roundtrip(addr, raw).await;

    assert_eq!(reply.matches("HTTP/1.1 ").count(), 2);
    assert!(reply.contains("Hello, world!"));
    assert!(reply.ends_with("404: Not Found! (/nope)"));
}

#[tokio::test]
async fn test_malformed_request_gets_400() {
    let addr = spawn_server(Config::default()).await;

    let reply = roundtrip(addr, b"G(T /pot HTTP/1.1\r\n\r\n").await;

    assert!(reply.starts_with("HTTP/1.1 400 Bad Request\r\n"));
    assert!(reply.contains("Connection: close\r\n"));
}

#[tokio::test]
async fn test_oversized_body_is_rejected() {
    let config = Config {
        max_body_bytes: 8,
        ..Config::default()
    };
    let addr = spawn_server(config).await;

    let reply = roundtrip(addr, b"POST /text HTTP/1.1\r\nContent-Length: 32\r\n\r\n0123456789abcdef0123456789abcdef").await;

    assert!(reply.starts_with("HTTP/1.1 500 Internal Server Error\r\n"));
    assert!(reply.contains("Connection: close\r\n"));
}

#[tokio::test]
async fn test_response_is_written_before_handler_finishes() {
    let addr = spawn_server(Config::default()).await;
    let mut stream = TcpStream::connect(addr).await.unwrap();
    stream.write_all(b"GET /slow HTTP/1.1\r\n\r\n").await.unwrap();

    let reply = timeout(Duration::from_millis(1000), read_until(&mut stream, "early"))
        .await
        .expect("response waited for the handler to return");

    assert!(reply.starts_with("HTTP/1.1 200 OK\r\n"));
}

#[tokio::test]
async fn test_body_reaches_handler_that_answered_first() {
    let (tx, mut rx) = mpsc::unbounded_channel();
    let mut loader = Loader::new();
    loader.bind(Endpoint::new("/ack", move |req, res| {
        let tx = tx.clone();
        async move {
            res.send("ack", ResponseInit::new(202))?;
            tx.send(req.text().await?)?;
            Ok::<_, anyhow::Error>(())
        }
    }));
    loader.bind(Endpoint::new("/", |_req, res| async move {
        res.send("next", ResponseInit::default())?;
        Ok::<_, anyhow::Error>(())
    }));
    let addr = serve(loader).await;

    let mut stream = TcpStream::connect(addr).await.unwrap();
    stream.write_all(b"POST /ack HTTP/1.1\r\nContent-Length: 5\r\n\r\n").await.unwrap();

    let first = timeout(Duration::from_secs(1), read_until(&mut stream, "ack"))
        .await
        .unwrap();
    assert!(first.starts_with("HTTP/1.1 202 Accepted\r\n"));

    stream
        .write_all(b"helloGET / HTTP/1.1\r\nConnection: close\r\n\r\n")
        .await
        .unwrap();
    let body = timeout(Duration::from_secs(1), rx.recv()).await.unwrap();
    assert_eq!(body.as_deref(), Some("hello"));

    let mut rest = String::new();
    let _ = stream.read_to_string(&mut rest).await;
    assert!(rest.starts_with("HTTP/1.1 200 OK\r\n"));
    assert!(rest.ends_with("next"));
}

#[tokio::test]
async fn test_extension_method_reaches_wildcard() {
    let mut loader = Loader::new();
    loader.bind(Endpoint::new(WILDCARD, |req, res| async move {
        res.send(format!("{} {}", req.method, req.path), ResponseInit::default())?;
        Ok::<_, anyhow::Error>(())
    }));
    let addr = serve(loader).await;

    let reply = roundtrip(addr, b"TRACE /trace HTTP/1.1\r\nConnection: close\r\n\r\n").await;

    assert!(reply.starts_with("HTTP/1.1 200 OK\r\n"));
    assert!(reply.ends_with("TRACE /trace"));
}

#[tokio::test]
async fn test_chunked_request_gets_501_and_close() {
    let addr = spawn_server(Config::default()).await;

    let raw = b"POST /text HTTP/1.1\r\nTransfer-Encoding: chunked\r\n\r\n5\r\nhello\r\n0\r\n\r\nGET / HTTP/1.1\r\n\r\n";
    let reply = roundtrip(addr, raw).await;

    assert!(reply.starts_with("HTTP/1.1 501 Not Implemented\r\n"));
    assert!(reply.contains("Connection: close\r\n"));
    assert_eq!(reply.matches("HTTP/1.1 ").count(), 1);
}

#[tokio::test]
async fn test_crlf_in_header_value_is_not_written() {
    let addr = spawn_server(Config::default()).await;

    let reply = roundtrip(addr, b"GET /inject HTTP/1.1\r\nConnection: close\r\n\r\n").await;

    assert!(reply.starts_with("HTTP/1.1 500 Internal Server Error\r\n"));
    assert!(!reply.contains("Set-Cookie"));
}

#[tokio::test]
async fn test_head_reply_has_headers_only() {
    let addr = spawn_server(Config::default()).await;

    let raw = b"HEAD / HTTP/1.1\r\n\r\nGET / HTTP/1.1\r\nConnection: close\r\n\r\n";
    let reply = roundtrip(addr, raw).await;

    assert!(reply.starts_with("HTTP/1.1 200 OK\r\n"));
    assert_eq!(reply.matches("Content-Length: 13\r\n").count(), 2);
    assert_eq!(reply.matches("Hello, world!").count(), 1);
    assert!(reply.ends_with("\r\n\r\nHello, world!"));
}
