//! Bridge Tests
//!
//! End-to-end: a WebSocket client talks through a running server to a
//! scripted fake MPD listening on a local port.

use std::io::{BufRead, BufReader, Write};
use std::net::{SocketAddr, TcpListener, TcpStream};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use serde_json::{json, Value};
use tungstenite::client::IntoClientRequest;
use tungstenite::http::{HeaderValue, StatusCode};
use tungstenite::stream::MaybeTlsStream;
use tungstenite::{Message, WebSocket};
use ws2mpd::{Config, Server};

const GREETING: &[u8] = b"OK MPD 0.23.5\n";
const TIMEOUT: Duration = Duration::from_secs(5);

type Client = WebSocket<MaybeTlsStream<TcpStream>>;

// =============================================================================
// Harness
// =============================================================================

/// One expected command and the raw bytes to answer it with.
/// An empty reply sends nothing.
type Exchange = (&'static str, Vec<u8>);

/// Accept one connection, greet, then play the script.
/// Returns every command line received, including unexpected ones.
fn fake_mpd(script: Vec<Exchange>) -> (SocketAddr, JoinHandle<Vec<String>>) {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();

    let handle = thread::spawn(move || {
        let (mut stream, _) = listener.accept().unwrap();
        stream.set_read_timeout(Some(TIMEOUT)).unwrap();
        stream.write_all(GREETING).unwrap();

        let mut reader = BufReader::new(stream.try_clone().unwrap());
        let mut received = Vec::new();

        for (expected, reply) in script {
            let mut line = String::new();
            if reader.read_line(&mut line).unwrap_or(0) == 0 {
                break;
            }
            let line = line.trim_end_matches('\n').to_string();
            assert_eq!(line, expected);
            received.push(line);
            if !reply.is_empty() {
                stream.write_all(&reply).unwrap();
            }
        }

        // Anything else the bridge sends before hanging up
        let mut line = String::new();
        while reader.read_line(&mut line).unwrap_or(0) > 0 {
            received.push(line.trim_end_matches('\n').to_string());
            line.clear();
        }
        received
    });

    (addr, handle)
}

/// Start a bridge server on an ephemeral port
fn start_server(config: Config) -> (SocketAddr, Arc<AtomicBool>) {
    let mut server = Server::new(config).unwrap();
    let addr = server.bind().unwrap();
    let shutdown = server.shutdown_flag();
    thread::spawn(move || server.run());
    (addr, shutdown)
}

fn local_config() -> Config {
    Config::builder().listen_addr("127.0.0.1:0").build()
}

fn connect(server: SocketAddr, mpd: SocketAddr) -> Client {
    let url = format!("ws://{}/?server={}", server, mpd);
    let (client, _) = tungstenite::connect(url).unwrap();
    if let MaybeTlsStream::Plain(stream) = client.get_ref() {
        stream.set_read_timeout(Some(TIMEOUT)).unwrap();
    }
    client
}

fn send(client: &mut Client, command: &str) {
    client.send(Message::text(command.to_string())).unwrap();
}

fn next_json(client: &mut Client) -> Value {
    loop {
        match client.read().unwrap() {
            Message::Text(text) => return serde_json::from_str(text.as_str()).unwrap(),
            Message::Close(frame) => panic!("closed early: {:?}", frame),
            _ => continue,
        }
    }
}

// =============================================================================
// Tests
// =============================================================================

#[test]
fn test_greeting_and_command() {
    let (mpd, mpd_handle) = fake_mpd(vec![("status", b"volume: 50\nstate: play\nOK\n".to_vec())]);
    let (server, shutdown) = start_server(local_config());

    let mut client = connect(server, mpd);
    assert_eq!(next_json(&mut client), json!(["OK MPD 0.23.5"]));

    send(&mut client, "status");
    assert_eq!(
        next_json(&mut client),
        json!(["volume: 50", "state: play", "OK"])
    );

    client.close(None).unwrap();
    let received = mpd_handle.join().unwrap();
    assert_eq!(received, vec!["status".to_string()]);

    shutdown.store(true, Ordering::Relaxed);
}

#[test]
fn test_password_hidden_and_binary_forwarded() {
    let mut art = b"size: 5\nbinary: 5\n".to_vec();
    art.extend_from_slice(&[1, 2, 10, 3, 4]);
    art.extend_from_slice(b"\nOK\n");

    let (mpd, mpd_handle) = fake_mpd(vec![
        ("password secret", b"OK\n".to_vec()),
        ("albumart cover.flac 0", art),
    ]);
    let (server, shutdown) = start_server(local_config());

    let mut client = connect(server, mpd);
    next_json(&mut client);

    send(&mut client, "password secret");
    send(&mut client, "albumart cover.flac 0");

    // The first message after the greeting is the album art
    assert_eq!(
        next_json(&mut client),
        json!(["size: 5", "binary: 5", [1, 2, 10, 3, 4], "OK"])
    );

    client.close(None).unwrap();
    mpd_handle.join().unwrap();
    shutdown.store(true, Ordering::Relaxed);
}

#[test]
fn test_noidle_only_reaches_daemon_during_idle() {
    let (mpd, mpd_handle) = fake_mpd(vec![
        // idle gets no reply until noidle arrives
        ("idle", Vec::new()),
        ("noidle", b"OK\n".to_vec()),
        ("ping", b"OK\n".to_vec()),
    ]);
    let (server, shutdown) = start_server(local_config());

    let mut client = connect(server, mpd);
    next_json(&mut client);

    // Dropped: nothing is idling yet
    send(&mut client, "noidle");
    send(&mut client, "idle");
    send(&mut client, "noidle");
    assert_eq!(next_json(&mut client), json!(["OK"]));

    send(&mut client, "ping");
    assert_eq!(next_json(&mut client), json!(["OK"]));

    client.close(None).unwrap();
    let received = mpd_handle.join().unwrap();
    assert_eq!(received, vec!["idle", "noidle", "ping"]);
    shutdown.store(true, Ordering::Relaxed);
}

#[test]
fn test_rejects_foreign_origin() {
    let (mpd, _mpd_handle) = fake_mpd(Vec::new());
    let config = Config::builder()
        .listen_addr("127.0.0.1:0")
        .origin_pattern(r"^https://allowed\.example$")
        .build();
    let (server, shutdown) = start_server(config);

    let mut request = format!("ws://{}/?server={}", server, mpd)
        .into_client_request()
        .unwrap();
    request
        .headers_mut()
        .insert("Origin", HeaderValue::from_static("https://evil.example"));

    match tungstenite::connect(request) {
        Err(tungstenite::Error::Http(response)) => {
            assert_eq!(response.status(), StatusCode::FORBIDDEN);
        }
        Err(e) => panic!("unexpected error: {}", e),
        Ok(_) => panic!("handshake should have been refused"),
    }

    shutdown.store(true, Ordering::Relaxed);
}

#[test]
fn test_unreachable_daemon_closes_client() {
    // Grab a free port and release it so nothing is listening there
    let dead = TcpListener::bind("127.0.0.1:0").unwrap().local_addr().unwrap();
    let (server, shutdown) = start_server(local_config());

    let mut client = connect(server, dead);
    loop {
        match client.read() {
            Ok(Message::Text(text)) => panic!("unexpected message: {}", text.as_str()),
            Ok(Message::Close(_)) | Err(_) => break,
            Ok(_) => continue,
        }
    }

    shutdown.store(true, Ordering::Relaxed);
}
