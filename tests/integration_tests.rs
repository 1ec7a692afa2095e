//! End-to-end tests for the honeypot console library.
//!
//! Most tests run the real [`HoneypotClient`] against a one-shot HTTP stub on
//! localhost. The live test at the bottom requires HONEYPOT_URL.

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;
    use tokio::task::JoinHandle;

    use honeypot_console::{
        ChatSession, ConsoleState, FAILURE_MESSAGE, FileStorage, HoneypotClient,
        HoneypotTransport, IdentityStore, MemoryStorage, OutgoingMessage, RiskTier,
        SendOutcome, SessionIdentity, Speaker, TranscriptEntry, ViewSink, classify,
    };

    /// Answers exactly one request with `status` and `body`, returning the raw request.
    async fn serve_once(status: u16, body: &str) -> (String, JoinHandle<String>) {
        serve_raw_once(format!(
            "HTTP/1.1 {status} STUB\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
            body.len()
        ))
        .await
    }

    /// Writes `response` verbatim to the first connection, then closes it.
    async fn serve_raw_once(response: String) -> (String, JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let base_url = format!("http://{}/", listener.local_addr().unwrap());
        let handle = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let request = read_request(&mut socket).await;
            socket.write_all(response.as_bytes()).await.unwrap();
            socket.shutdown().await.unwrap();
            request
        });
        (base_url, handle)
    }

    async fn read_request(socket: &mut tokio::net::TcpStream) -> String {
        let mut buf = Vec::new();
        let mut chunk = [0u8; 4096];
        loop {
            let n = socket.read(&mut chunk).await.unwrap();
            if n == 0 {
                break;
            }
            buf.extend_from_slice(&chunk[..n]);
            let text = String::from_utf8_lossy(&buf).to_string();
            if let Some(header_end) = text.find("\r\n\r\n") {
                let content_length = text[..header_end]
                    .lines()
                    .filter_map(|line| line.split_once(':'))
                    .find(|(name, _)| name.trim().eq_ignore_ascii_case("content-length"))
                    .and_then(|(_, value)| value.trim().parse::<usize>().ok())
                    .unwrap_or(0);
                if buf.len() >= header_end + 4 + content_length {
                    break;
                }
            }
        }
        String::from_utf8_lossy(&buf).to_string()
    }

    fn request_body(request: &str) -> serde_json::Value {
        let (_, body) = request.split_once("\r\n\r\n").unwrap();
        serde_json::from_str(body).unwrap()
    }

    fn session_for(base_url: String) -> ChatSession<HoneypotClient, MemoryStorage> {
        let client = HoneypotClient::new(Some(base_url)).unwrap();
        ChatSession::new(client, IdentityStore::new(MemoryStorage::new()))
    }

    fn primed_view() -> ConsoleState {
        let mut view = ConsoleState::new();
        view.set_scam_type("Lottery Scam");
        view.set_risk(&classify("MEDIUM"));
        view.set_persona("Excited Lottery Winner");
        view
    }

    #[tokio::test]
    async fn reply_updates_every_facet() {
        let (base_url, server) = serve_once(
            200,
            r#"{"reply":"hi","scam_type":"phishing","risk_score":"HIGH","persona":"bank"}"#,
        )
        .await;
        let mut session = session_for(base_url);
        let mut view = ConsoleState::new();

        assert_eq!(session.send("hello", &mut view).await, SendOutcome::Replied);
        assert_eq!(
            view.transcript(),
            &[
                TranscriptEntry::user("hello"),
                TranscriptEntry::counterpart("hi")
            ]
        );
        assert_eq!(view.scam_type(), "phishing");
        assert_eq!(view.risk().tier, RiskTier::High);
        assert_eq!(view.persona(), "bank");

        let request = server.await.unwrap();
        assert!(request.starts_with("POST /api/honeypot "));
        let body = request_body(&request);
        assert_eq!(body["message"], "hello");
        assert_eq!(body["scammer_id"], session.identity().as_str());
    }

    #[tokio::test]
    async fn empty_body_uses_defaults() {
        let (base_url, _server) = serve_once(200, "{}").await;
        let mut session = session_for(base_url);
        let mut view = primed_view();

        session.send("x", &mut view).await;
        assert_eq!(view.transcript()[1], TranscriptEntry::counterpart("..."));
        assert_eq!(view.scam_type(), "-");
        assert_eq!(view.risk().tier, RiskTier::Low);
        assert_eq!(view.persona(), "-");
    }

    #[tokio::test]
    async fn non_object_bodies_use_defaults() {
        for body in ["[]", r#"["hi","phishing","HIGH","bank"]"#, r#""oops""#] {
            let (base_url, _server) = serve_once(200, body).await;
            let mut session = session_for(base_url);
            let mut view = primed_view();

            assert_eq!(
                session.send("x", &mut view).await,
                SendOutcome::Replied,
                "{body}"
            );
            assert_eq!(view.transcript()[1], TranscriptEntry::counterpart("..."), "{body}");
            assert_eq!(view.scam_type(), "-", "{body}");
            assert_eq!(view.risk().tier, RiskTier::Low, "{body}");
            assert_eq!(view.persona(), "-", "{body}");
        }
    }

    #[tokio::test]
    async fn truncated_error_body_keeps_status() {
        let (base_url, _server) = serve_raw_once(
            "HTTP/1.1 500 STUB\r\nContent-Type: application/json\r\nContent-Length: 100\r\nConnection: close\r\n\r\n{\"err".to_string(),
        )
        .await;
        let client = HoneypotClient::new(Some(base_url)).unwrap();
        let message = OutgoingMessage::new(&SessionIdentity::generate(), "x").unwrap();

        let err = client.analyze(&message).await.unwrap_err();
        assert_eq!(err.status_code(), Some(500));
        assert!(err.is_application());
    }

    #[tokio::test]
    async fn server_error_is_absorbed() {
        let (base_url, _server) = serve_once(500, r#"{"error":"boom"}"#).await;
        let mut session = session_for(base_url);
        let mut view = primed_view();

        assert_eq!(session.send("x", &mut view).await, SendOutcome::Failed);
        assert_eq!(view.transcript().len(), 2);
        assert_eq!(view.transcript()[1].speaker, Speaker::System);
        assert_eq!(view.transcript()[1].text, FAILURE_MESSAGE);
        assert_eq!(view.scam_type(), "Lottery Scam");
        assert_eq!(view.risk().tier, RiskTier::Medium);
        assert_eq!(view.persona(), "Excited Lottery Winner");
        assert_eq!(session.stats().application_failures, 1);
    }

    #[tokio::test]
    async fn malformed_body_is_absorbed() {
        let (base_url, _server) = serve_once(200, "<html>oops</html>").await;
        let mut session = session_for(base_url);
        let mut view = primed_view();

        assert_eq!(session.send("x", &mut view).await, SendOutcome::Failed);
        assert_eq!(view.transcript().last().unwrap().text, FAILURE_MESSAGE);
        assert_eq!(view.persona(), "Excited Lottery Winner");
    }

    #[tokio::test]
    async fn refused_connection_is_a_transport_failure() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let base_url = format!("http://{}/", listener.local_addr().unwrap());
        drop(listener);

        let client = HoneypotClient::new(Some(base_url.clone())).unwrap();
        let identity = SessionIdentity::generate();
        let message = OutgoingMessage::new(&identity, "hello").unwrap();
        let err = client.analyze(&message).await.unwrap_err();
        assert!(err.is_transport(), "{err:?}");

        let mut session = session_for(base_url);
        let mut view = primed_view();
        assert_eq!(session.send("hello", &mut view).await, SendOutcome::Failed);
        assert_eq!(session.stats().transport_failures, 1);
        assert_eq!(view.scam_type(), "Lottery Scam");
    }

    #[tokio::test]
    async fn slow_service_times_out() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let base_url = format!("http://{}/", listener.local_addr().unwrap());
        let _server = tokio::spawn(async move {
            let (socket, _) = listener.accept().await.unwrap();
            tokio::time::sleep(Duration::from_secs(5)).await;
            drop(socket);
        });

        let client =
            HoneypotClient::with_options(Some(base_url), None, Some(Duration::from_millis(200)))
                .unwrap();
        let identity = SessionIdentity::generate();
        let message = OutgoingMessage::new(&identity, "hello").unwrap();
        let err = client.analyze(&message).await.unwrap_err();
        assert!(err.is_timeout(), "{err:?}");
    }

    #[tokio::test]
    async fn blank_input_makes_no_request() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let base_url = format!("http://{}/", listener.local_addr().unwrap());
        let mut session = session_for(base_url);
        let mut view = ConsoleState::new();

        assert_eq!(session.send("", &mut view).await, SendOutcome::Ignored);
        assert_eq!(session.send("   ", &mut view).await, SendOutcome::Ignored);
        assert!(view.transcript().is_empty());
        assert_eq!(view.input_clears(), 0);

        let accepted =
            tokio::time::timeout(Duration::from_millis(100), listener.accept()).await;
        assert!(accepted.is_err(), "no connection should have been made");
    }

    #[tokio::test]
    async fn evidence_not_found_reports_server_message() {
        let (base_url, server) = serve_once(404, r#"{"error":"No evidence found"}"#).await;
        let client = HoneypotClient::new(Some(base_url)).unwrap();
        let err = client.download_evidence().await.unwrap_err();
        assert_eq!(err.status_code(), Some(404));
        assert!(err.to_string().contains("No evidence found"));
        assert!(
            server
                .await
                .unwrap()
                .starts_with("GET /api/download/evidence ")
        );
    }

    #[tokio::test]
    async fn report_is_fetched_for_identity() {
        let (base_url, server) = serve_once(200, "%PDF-1.4 stub").await;
        let client = HoneypotClient::new(Some(base_url)).unwrap();
        let identity = SessionIdentity::parse("scammer_abcd1234").unwrap();
        let bytes = client.download_report(&identity).await.unwrap();
        assert_eq!(&bytes[..], b"%PDF-1.4 stub");
        assert!(
            server
                .await
                .unwrap()
                .starts_with("GET /api/pdf/scammer_abcd1234 ")
        );
    }

    #[tokio::test]
    async fn health_sends_api_key() {
        let (base_url, server) = serve_once(
            200,
            r#"{"status":"ok","service":"Agentic Honeypot","timestamp":"2025-01-26T10:15:30+00:00"}"#,
        )
        .await;
        let client =
            HoneypotClient::with_options(Some(base_url), Some("secret".to_string()), None)
                .unwrap();
        let health = client.health().await.unwrap();
        assert!(health.is_ok());
        assert_eq!(health.service.as_deref(), Some("Agentic Honeypot"));
        let request = server.await.unwrap().to_lowercase();
        assert!(request.contains("x-api-key: secret"));
    }

    #[tokio::test]
    async fn health_rejection_is_an_api_error() {
        let (base_url, _server) =
            serve_once(403, r#"{"status":"error","message":"Invalid API key"}"#).await;
        let client =
            HoneypotClient::with_options(Some(base_url), Some("wrong".to_string()), None)
                .unwrap();
        let err = client.health().await.unwrap_err();
        assert_eq!(err.status_code(), Some(403));
        assert!(err.to_string().contains("Invalid API key"));
    }

    #[tokio::test]
    async fn cases_are_listed() {
        let (base_url, _server) = serve_once(
            200,
            r#"[{"scammer_id":"scammer_abcd1234","timestamp":"2025-01-26T10:15:30.5+00:00",
                "scam_type":"OTP Scam","persona":"Confused User","message":"share otp",
                "risk_score":"HIGH"}]"#,
        )
        .await;
        let client = HoneypotClient::new(Some(base_url)).unwrap();
        let cases = client.cases().await.unwrap();
        assert_eq!(cases.len(), 1);
        assert_eq!(cases[0].scammer_id, "scammer_abcd1234");
        assert_eq!(cases[0].risk().tier, RiskTier::High);
        assert!(cases[0].timestamp.is_some());
    }

    #[test]
    fn identity_persists_across_stores() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("identity.json");
        let first = IdentityStore::new(FileStorage::new(&path)).get_or_create();
        let second = IdentityStore::new(FileStorage::new(&path)).get_or_create();
        assert_eq!(first, second);
        assert!(first.is_well_formed());
    }

    #[tokio::test]
    async fn test_live_round_trip() {
        // This test requires a running service at HONEYPOT_URL
        let base_url = std::env::var("HONEYPOT_URL").ok();
        if base_url.is_none() {
            eprintln!("Skipping test: HONEYPOT_URL not set");
            return;
        }

        let mut session = session_for(base_url.unwrap());
        let mut view = ConsoleState::new();
        let outcome = session
            .send("Your bank account is blocked, share the OTP", &mut view)
            .await;
        assert_eq!(outcome, SendOutcome::Replied, "{:?}", view.transcript());
    }
}
