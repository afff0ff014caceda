use async_trait::async_trait;
use bucketlist_core::{
    Coordinate, EditSession, FetchError, GeosearchConfig, LoadingState, NearbyLookup, NearbyPage,
    PageSource, Place, WikipediaGeosearch,
};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

/// Serves one canned HTTP response and returns the endpoint URL and the
/// raw request line it received.
async fn serve_once(
    status: &'static str,
    body: &'static str,
) -> (String, tokio::task::JoinHandle<String>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let server = tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();
        let mut request = Vec::new();
        let mut buf = [0_u8; 1024];
        while !request.windows(4).any(|window| window == b"\r\n\r\n") {
            let read = socket.read(&mut buf).await.unwrap();
            if read == 0 {
                break;
            }
            request.extend_from_slice(&buf[..read]);
        }

        let response = format!(
            "HTTP/1.1 {status}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
            body.len()
        );
        socket.write_all(response.as_bytes()).await.unwrap();
        socket.shutdown().await.unwrap();

        String::from_utf8_lossy(&request)
            .lines()
            .next()
            .unwrap_or_default()
            .to_string()
    });

    (format!("http://{addr}/w/api.php"), server)
}

fn local_source(endpoint: String) -> Arc<dyn PageSource> {
    let config = GeosearchConfig {
        endpoint,
        use_system_proxy: false,
        ..GeosearchConfig::default()
    };
    Arc::new(WikipediaGeosearch::new(config).unwrap())
}

#[tokio::test]
async fn loads_sorted_pages_from_geosearch_endpoint() {
    let (endpoint, server) = serve_once(
        "200 OK",
        r#"{"query":{"pages":{
            "11":{"pageid":11,"title":"Royal Mile"},
            "7":{"pageid":7,"title":"Edinburgh Castle","terms":{"description":["fortress"]}}
        }}}"#,
    )
    .await;

    let mut lookup = NearbyLookup::spawn(local_source(endpoint), Coordinate::new(55.95, -3.19));
    let state = lookup.settled().await;

    let titles = state
        .pages()
        .iter()
        .map(|page| page.title.as_str())
        .collect::<Vec<_>>();
    assert_eq!(titles, vec!["Edinburgh Castle", "Royal Mile"]);
    assert_eq!(state.pages()[0].description(), "fortress");

    let request_line = server.await.unwrap();
    assert!(request_line.starts_with("GET /w/api.php?ggscoord=55.95%7C-3.19"));
    assert!(request_line.contains("generator=geosearch"));
}

#[tokio::test]
async fn malformed_response_fails_with_no_pages() {
    let (endpoint, _server) = serve_once("200 OK", "{\"query\": []}").await;

    let mut session = EditSession::begin(Place::example());
    assert!(session.start_lookup(local_source(endpoint.clone())));
    assert!(!session.start_lookup(local_source(endpoint)));
    assert_eq!(session.lookup_state(), LoadingState::Loading);

    assert_eq!(session.wait_for_lookup().await, LoadingState::Failed);
    assert!(session.pages().is_empty());
}

#[tokio::test]
async fn http_error_status_fails() {
    let (endpoint, _server) = serve_once("503 Service Unavailable", "{}").await;

    let result = local_source(endpoint)
        .nearby_pages(Coordinate::new(0.0, 0.0))
        .await;
    assert!(matches!(result, Err(FetchError::Status(503))));
}

struct NeverAnswers {
    dropped: Arc<AtomicBool>,
}

struct DropFlag(Arc<AtomicBool>);

impl Drop for DropFlag {
    fn drop(&mut self) {
        self.0.store(true, Ordering::SeqCst);
    }
}

#[async_trait]
impl PageSource for NeverAnswers {
    async fn nearby_pages(&self, _coordinate: Coordinate) -> Result<Vec<NearbyPage>, FetchError> {
        let _flag = DropFlag(Arc::clone(&self.dropped));
        std::future::pending::<()>().await;
        Ok(Vec::new())
    }
}

#[tokio::test]
async fn dropping_the_session_cancels_the_lookup() {
    let dropped = Arc::new(AtomicBool::new(false));
    let source = Arc::new(NeverAnswers {
        dropped: Arc::clone(&dropped),
    });

    let mut session = EditSession::begin(Place::example());
    session.start_lookup(source);
    for _ in 0..10 {
        tokio::task::yield_now().await;
    }
    assert_eq!(session.lookup_state(), LoadingState::Loading);
    assert!(!dropped.load(Ordering::SeqCst));

    drop(session);
    for _ in 0..100 {
        if dropped.load(Ordering::SeqCst) {
            break;
        }
        tokio::task::yield_now().await;
    }
    assert!(dropped.load(Ordering::SeqCst));
}
