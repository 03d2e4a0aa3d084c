//! Local HTTP server standing in for upstream feeds in tests.

use std::sync::Arc;
use std::sync::Mutex;

use actix_web::{App, HttpRequest, HttpResponse, HttpServer, http::StatusCode, web};

/// One canned response.
#[derive(Clone)]
pub struct Canned {
    pub path: &'static str,
    pub status: u16,
    pub content_type: &'static str,
    pub body: String,
}

impl Canned {
    pub fn ok(path: &'static str, content_type: &'static str, body: impl Into<String>) -> Self {
        Self {
            path,
            status: 200,
            content_type,
            body: body.into(),
        }
    }
}

/// Requests the server received, as `(path, query, headers)`.
pub type Seen = Arc<Mutex<Vec<(String, String, Vec<(String, String)>)>>>;

/// Starts a server on an ephemeral port and returns its base URL.
///
/// Must be called from within an actix runtime (`#[actix_web::test]`).
pub fn serve(responses: Vec<Canned>) -> (String, Seen) {
    let responses = Arc::new(responses);
    let seen: Seen = Arc::default();
    let recorded = seen.clone();

    let server = HttpServer::new(move || {
        let responses = responses.clone();
        let recorded = recorded.clone();
        App::new().default_service(web::to(move |req: HttpRequest| {
            let responses = responses.clone();
            let recorded = recorded.clone();
            async move {
                let headers = req
                    .headers()
                    .iter()
                    .map(|(k, v)| (k.to_string(), v.to_str().unwrap_or_default().to_string()))
                    .collect();
                recorded.lock().unwrap().push((
                    req.path().to_string(),
                    req.query_string().to_string(),
                    headers,
                ));
                match responses.iter().find(|c| c.path == req.path()) {
                    Some(canned) => HttpResponse::build(StatusCode::from_u16(canned.status).unwrap())
                        .content_type(canned.content_type)
                        .body(canned.body.clone()),
                    None => HttpResponse::NotFound().finish(),
                }
            }
        }))
    })
    .workers(1)
    .bind(("127.0.0.1", 0))
    .unwrap();

    let addr = server.addrs()[0];
    actix_web::rt::spawn(server.run());
    (format!("http://{addr}"), seen)
}
