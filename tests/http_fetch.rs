use std::net::TcpListener;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use apod_tui::apod::{Client, ClientConfig, FetchError};
use apod_tui::data::{ApodMediaService, MediaService};
use apod_tui::gallery::{Board, Gallery, TRIGGER_LABEL};
use apod_tui::loader::{self, AsyncResponse};
use crossbeam_channel::unbounded;
use tiny_http::{Response, Server};

fn serve_once(status: u16, body: &'static str) -> (String, JoinHandle<()>) {
    let server = Server::http("127.0.0.1:0").expect("bind fixture server");
    let addr = server.server_addr().to_ip().expect("tcp fixture address");
    let handle = thread::spawn(move || {
        if let Ok(request) = server.recv() {
            let response = Response::from_string(body).with_status_code(status);
            let _ = request.respond(response);
        }
    });
    (format!("http://{addr}/apod.json"), handle)
}

fn client_for(url: String) -> Client {
    Client::new(ClientConfig {
        source_url: url,
        user_agent: "apod-tui-tests/1.0".into(),
        timeout: Some(Duration::from_secs(5)),
        http_client: None,
    })
    .expect("build client")
}

fn fetch(status: u16, body: &'static str) -> Result<usize, FetchError> {
    let (url, server) = serve_once(status, body);
    let result = client_for(url).load_media().map(|entries| entries.len());
    server.join().expect("fixture server thread");
    result
}

#[test]
fn loads_and_filters_entries() {
    let body = r#"[
        {"title": "A", "media_type": "image", "url": "https://a/1.jpg"},
        {"title": "B", "media_type": "video", "url": "https://youtu.be/abc123XYZ"},
        {"title": "C", "media_type": "audio", "url": "https://a/c.mp3"}
    ]"#;
    assert_eq!(fetch(200, body).expect("entries"), 2);
}

#[test]
fn non_success_status_is_network_error() {
    assert!(matches!(fetch(503, "[]"), Err(FetchError::Network(_))));
    assert!(matches!(fetch(404, "not found"), Err(FetchError::Network(_))));
}

#[test]
fn malformed_body_is_parse_error() {
    assert!(matches!(fetch(200, "<html>"), Err(FetchError::Parse(_))));
}

#[test]
fn object_body_is_format_error() {
    assert!(matches!(fetch(200, "{}"), Err(FetchError::Format)));
}

#[test]
fn empty_array_is_empty_error() {
    assert!(matches!(fetch(200, "[]"), Err(FetchError::Empty)));
}

#[test]
fn refused_connection_reenables_trigger_with_retry_message() {
    let port = {
        let listener = TcpListener::bind("127.0.0.1:0").expect("reserve port");
        listener.local_addr().expect("local addr").port()
    };
    let client = client_for(format!("http://127.0.0.1:{port}/apod.json"));
    let service: Arc<dyn MediaService> = Arc::new(ApodMediaService::new(Arc::new(client)));

    let mut gallery = Gallery::default();
    let request_id = gallery.begin_load().expect("gate open");
    assert!(gallery.is_loading());

    let (tx, rx) = unbounded();
    loader::spawn_media_load(service, request_id, tx)
        .join()
        .expect("loader thread");
    match rx.recv().expect("loader response") {
        AsyncResponse::Media { request_id, result } => {
            assert!(matches!(result, Err(FetchError::Network(_))));
            assert!(gallery.finish_load(request_id, result));
        }
        AsyncResponse::Preview { .. } => panic!("unexpected preview response"),
    }

    assert!(!gallery.is_loading());
    assert_eq!(gallery.trigger_label(), TRIGGER_LABEL);
    let Board::Message(message) = gallery.board() else {
        panic!("expected an error message on the board");
    };
    assert!(message.contains("try again"));
}
