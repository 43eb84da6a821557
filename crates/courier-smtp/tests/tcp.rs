//! End-to-end tests over a loopback TCP connection.
//!
//! A tiny scripted server answers each client line with a canned reply and
//! hands back everything it received.

#![allow(clippy::unwrap_used)]

use std::time::Duration;

use courier_smtp::handler::CollectingHandler;
use courier_smtp::{Address, Config, Credentials, Message, Session, Transport, TransportState};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

/// Accepts one client, greets it and answers line by line.
///
/// `replies` pairs each expected client line prefix with the reply to send.
async fn spawn_server(
    greeting: &'static [u8],
    replies: Vec<(&'static str, &'static str)>,
) -> (u16, JoinHandle<Vec<String>>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();

    let handle = tokio::spawn(async move {
        let (socket, _) = listener.accept().await.unwrap();
        let (read, mut write) = socket.into_split();
        let mut reader = BufReader::new(read);
        let mut received = Vec::new();

        // A client that gives up early may close before the greeting is out
        let _ = write.write_all(greeting).await;

        let mut replies = replies.into_iter();
        let mut in_data = false;
        loop {
            let mut line = String::new();
            match reader.read_line(&mut line).await {
                Ok(0) | Err(_) => break,
                Ok(_) => {}
            }
            let line = line.trim_end_matches(['\r', '\n']).to_string();
            received.push(line.clone());

            // Body lines get no reply until the terminating dot
            if in_data && line != "." {
                continue;
            }
            in_data = false;

            let Some((prefix, reply)) = replies.next() else {
                break;
            };
            assert!(line.starts_with(prefix), "expected {prefix:?}, got {line:?}");
            write.write_all(reply.as_bytes()).await.unwrap();
            if reply.starts_with("354") {
                in_data = true;
            }
        }
        received
    });

    (port, handle)
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn config(port: u16) -> Config {
    Config::builder("127.0.0.1")
        .port(port)
        .client_name("client.local")
        .response_timeout(Duration::from_secs(2))
        .build()
}

#[tokio::test]
async fn full_session_over_tcp() {
    init_tracing();
    let (port, server) = spawn_server(
        b"220 mail.example.com ESMTP\r\n",
        vec![
            ("EHLO", "250-mail.example.com\r\n250-AUTH PLAIN LOGIN\r\n250 8BITMIME\r\n"),
            ("AUTH PLAIN", "235 2.7.0 Authentication successful\r\n"),
            ("MAIL FROM", "250 2.1.0 Ok\r\n"),
            ("RCPT TO", "250 2.1.5 Ok\r\n"),
            ("DATA", "354 End data with <CR><LF>.<CR><LF>\r\n"),
            (".", "250 2.0.0 Ok: queued\r\n"),
            ("QUIT", "221 2.0.0 Bye\r\n"),
        ],
    )
    .await;

    let events = CollectingHandler::new();
    let mut session =
        Session::new(config(port)).with_credentials(Credentials::new("user", "pass"));
    session.subscribe(events.clone());

    assert!(session.connect().await);
    assert!(session.login().await);

    let message = Message::new(
        Address::new("alice@example.com").unwrap(),
        "Subject: Hello\r\n\r\nHi Bob",
    )
    .to(Address::new("bob@example.com").unwrap());
    assert!(session.send(&message).await);
    assert_eq!(session.response_text(), "250 2.0.0 Ok: queued");

    session.quit().await;
    assert_eq!(session.transport().state(), TransportState::Disconnected);
    assert!(events.events().is_empty());

    let received = server.await.unwrap();
    assert_eq!(
        received,
        vec![
            "EHLO client.local",
            "AUTH PLAIN AHVzZXIAcGFzcw==",
            "MAIL FROM: <alice@example.com>",
            "RCPT TO:<bob@example.com>",
            "DATA",
            "Subject: Hello",
            "",
            "Hi Bob",
            ".",
            "QUIT",
        ]
    );
}

#[tokio::test]
async fn server_closing_mid_session_is_reported() {
    let (port, server) = spawn_server(b"220 ready\r\n", Vec::new()).await;

    let events = CollectingHandler::new();
    let mut session = Session::new(config(port));
    session.subscribe(events.clone());

    // The server hangs up instead of answering EHLO
    assert!(!session.connect().await);
    assert_eq!(events.events(), vec![courier_smtp::SessionError::ResponseTimeout]);
    assert_eq!(session.transport().state(), TransportState::Disconnected);

    assert_eq!(server.await.unwrap(), vec!["EHLO client.local"]);
}

#[tokio::test]
async fn latin1_greeting_text_is_tolerated() {
    let (port, server) = spawn_server(
        b"220 mail.example.fr ESMTP pr\xeat\r\n",
        vec![("EHLO", "250 mail.example.fr\r\n")],
    )
    .await;

    let events = CollectingHandler::new();
    let mut session = Session::new(config(port));
    session.subscribe(events.clone());

    assert!(session.connect().await);
    assert!(events.events().is_empty());
    assert_eq!(session.response_text(), "250 mail.example.fr");

    drop(session);
    assert_eq!(server.await.unwrap(), vec!["EHLO client.local"]);
}

#[tokio::test]
async fn endless_reply_line_is_cut_off() {
    let flood: &'static [u8] = Box::leak(vec![b'2'; 64 * 1024].into_boxed_slice());
    let (port, _server) = spawn_server(flood, Vec::new()).await;

    let events = CollectingHandler::new();
    let mut session = Session::new(config(port));
    session.subscribe(events.clone());

    assert!(!session.connect().await);
    assert_eq!(events.events(), vec![courier_smtp::SessionError::ResponseTimeout]);
    assert_eq!(session.transport().state(), TransportState::Disconnected);
}

#[tokio::test]
async fn nothing_listening_is_connection_timeout() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    drop(listener);

    let events = CollectingHandler::new();
    let mut session = Session::new(config(port));
    session.subscribe(events.clone());

    assert!(!session.connect().await);
    assert_eq!(
        events.events(),
        vec![courier_smtp::SessionError::ConnectionTimeout]
    );
}
