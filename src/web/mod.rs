//! Live-preview web form.
//!
//! `GET /` serves the form page; `POST /generate` renders the submitted
//! options and answers with the PNG. Every request is independent: the only
//! shared value is the read-only [`ServiceContext`].

mod form;

use std::io::{Cursor, Read};
use std::net::SocketAddr;
use std::sync::Arc;
use std::thread;
use std::time::Instant;

use tiny_http::{Header, Method, Request, Response, Server};
use tokio::runtime::Handle;

use crate::context::ServiceContext;
use crate::error::QrError;
use crate::generator::encode_png;
use crate::logo::StagedLogo;

const INDEX_HTML: &str = include_str!("index.html");

type HttpResponse = Response<Cursor<Vec<u8>>>;

/// Bind the HTTP listener.
///
/// # Errors
///
/// Returns [`QrError::Server`] if the address cannot be bound.
pub fn bind(addr: &str) -> Result<Server, QrError> {
    Server::http(addr).map_err(|e| QrError::Server(format!("Failed to bind {addr}: {e}")))
}

/// The socket address a bound server listens on.
#[must_use]
pub fn local_addr(server: &Server) -> Option<SocketAddr> {
    server.server_addr().to_ip()
}

/// Start accepting requests on a background thread.
///
/// Each request is handled on the blocking pool of the current tokio
/// runtime: reading the upload, rendering and writing the response all
/// block, so none of it may run on an async worker.
///
/// # Errors
///
/// Returns an error if called outside a tokio runtime or the thread cannot start.
pub fn start(server: Server, ctx: Arc<ServiceContext>) -> Result<thread::JoinHandle<()>, QrError> {
    let runtime = Handle::try_current()
        .map_err(|e| QrError::Server(format!("No async runtime: {e}")))?;

    let acceptor = thread::Builder::new().name("qrstyle-accept".into()).spawn(move || {
        for request in server.incoming_requests() {
            let ctx = Arc::clone(&ctx);
            let worker = runtime.clone();
            runtime.spawn_blocking(move || handle(request, &ctx, &worker));
        }
    })?;
    Ok(acceptor)
}

/// Serve until the listener shuts down.
///
/// # Errors
///
/// Returns an error if the accept loop cannot start or dies.
pub async fn serve(server: Server, ctx: Arc<ServiceContext>) -> Result<(), QrError> {
    let acceptor = start(server, ctx)?;
    tokio::task::spawn_blocking(move || acceptor.join())
        .await
        .map_err(|e| QrError::Server(format!("Accept loop failed: {e}")))?
        .map_err(|_| QrError::Server("Accept loop panicked".into()))
}

fn handle(mut request: Request, ctx: &ServiceContext, runtime: &Handle) {
    let started = Instant::now();
    let method = request.method().clone();
    let path = request.url().split('?').next().unwrap_or("/").to_string();

    let response = match (&method, path.as_str()) {
        (Method::Get, "/") => html_response(INDEX_HTML),
        (Method::Post, "/generate") => match generate(&mut request, ctx, runtime) {
            Ok(png) => with_content_type(Response::from_data(png), "image/png"),
            Err(e) => error_response(&e),
        },
        _ => json_error(404, "Not found"),
    };

    log::info!("{method} {path} -> {} ({:.1?})", response.status_code().0, started.elapsed());
    if let Err(e) = request.respond(response) {
        log::warn!("Failed to send response for {path}: {e}");
    }
}

fn generate(
    request: &mut Request,
    ctx: &ServiceContext,
    runtime: &Handle,
) -> Result<Vec<u8>, QrError> {
    let boundary = request
        .headers()
        .iter()
        .find(|h| h.field.equiv("Content-Type"))
        .and_then(|h| multer::parse_boundary(h.value.as_str()).ok())
        .ok_or_else(|| QrError::Form("expected a multipart/form-data body".into()))?;

    let mut body = Vec::new();
    request.as_reader().read_to_end(&mut body)?;

    let form::Submission { data, style, logo } = runtime.block_on(form::parse(body, boundary))?;
    let options = style.resolve(&ctx.defaults)?;
    let staged = logo
        .map(|upload| StagedLogo::stage(&upload.bytes, &upload.filename, ctx.upload_dir()))
        .transpose()?;

    let rendered = ctx
        .generator
        .generate(&data, &options, staged.as_ref().map(StagedLogo::asset))
        .and_then(|img| encode_png(&img));
    if let Some(staged) = staged {
        staged.discard();
    }
    rendered
}

fn with_content_type(response: HttpResponse, content_type: &str) -> HttpResponse {
    match Header::from_bytes(&b"Content-Type"[..], content_type.as_bytes()) {
        Ok(header) => response.with_header(header),
        Err(()) => response,
    }
}

fn html_response(body: &str) -> HttpResponse {
    with_content_type(Response::from_string(body), "text/html; charset=utf-8")
}

fn json_error(status: u16, message: &str) -> HttpResponse {
    let body = serde_json::json!({ "error": message }).to_string();
    with_content_type(Response::from_string(body), "application/json").with_status_code(status)
}

fn error_response(e: &QrError) -> HttpResponse {
    if e.is_client_error() {
        log::warn!("Rejected request: {e}");
        json_error(400, &e.to_string())
    } else {
        log::error!("Generation failed: {e}");
        json_error(500, &e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;
    use std::path::Path;
    use std::time::Duration;

    use image::{ImageFormat, Rgba, RgbaImage};
    use reqwest::multipart::{Form, Part};

    use super::*;
    use crate::config::Config;
    use crate::generator::tests::decode;

    struct TestServer {
        base: String,
        upload_dir: tempfile::TempDir,
        client: reqwest::Client,
    }

    fn start_server() -> TestServer {
        let upload_dir = tempfile::tempdir().unwrap();
        let ctx = ServiceContext::live(&Config::default()).unwrap().with_upload_dir(upload_dir.path());
        let server = bind("127.0.0.1:0").unwrap();
        let addr = local_addr(&server).unwrap();
        start(server, Arc::new(ctx)).unwrap();
        TestServer { base: format!("http://{addr}"), upload_dir, client: reqwest::Client::new() }
    }

    fn hello_form() -> Form {
        Form::new()
            .text("data", "Hello")
            .text("box_size", "10")
            .text("border", "4")
            .text("error_correction", "H")
    }

    fn logo_part(bytes: Vec<u8>) -> Part {
        Part::bytes(bytes).file_name("logo.png").mime_str("image/png").unwrap()
    }

    fn red_logo_png() -> Vec<u8> {
        let mut buf = Cursor::new(Vec::new());
        RgbaImage::from_pixel(32, 32, Rgba([200, 0, 0, 255]))
            .write_to(&mut buf, ImageFormat::Png)
            .unwrap();
        buf.into_inner()
    }

    fn is_empty_dir(dir: &Path) -> bool {
        std::fs::read_dir(dir).unwrap().next().is_none()
    }

    async fn post(server: &TestServer, form: Form) -> reqwest::Response {
        server.client.post(format!("{}/generate", server.base)).multipart(form).send().await.unwrap()
    }

    fn content_type(response: &reqwest::Response) -> String {
        response.headers()["content-type"].to_str().unwrap().to_string()
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn index_serves_form() {
        let server = start_server();
        let response = server.client.get(format!("{}/", server.base)).send().await.unwrap();
        assert_eq!(response.status(), 200);
        assert!(content_type(&response).starts_with("text/html"));
        let body = response.text().await.unwrap();
        assert!(body.contains("<form id=\"qr-form\">"));
        assert!(body.contains("name=\"error_correction\""));
        assert!(body.contains("setTimeout(updateQRCode, 300)"));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn generate_without_logo() {
        let server = start_server();
        let response = post(&server, hello_form()).await;
        assert_eq!(response.status(), 200);
        assert_eq!(content_type(&response), "image/png");

        let img = image::load_from_memory(&response.bytes().await.unwrap()).unwrap().to_rgb8();
        assert_eq!(img.dimensions(), (290, 290));
        assert_eq!(decode(&img), "Hello");
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn generate_with_logo_and_cleanup() {
        let server = start_server();
        let plain = post(&server, hello_form()).await.bytes().await.unwrap();
        let plain = image::load_from_memory(&plain).unwrap().to_rgb8();

        let response = post(&server, hello_form().part("logo", logo_part(red_logo_png()))).await;
        assert_eq!(response.status(), 200);
        let styled = image::load_from_memory(&response.bytes().await.unwrap()).unwrap().to_rgb8();

        assert_eq!(styled.dimensions(), plain.dimensions());
        assert_ne!(styled.get_pixel(145, 145), plain.get_pixel(145, 145));
        assert_eq!(decode(&styled), "Hello");
        assert!(is_empty_dir(server.upload_dir.path()));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn missing_fields_use_defaults() {
        let server = start_server();
        let response = post(&server, Form::new().text("data", "Hello")).await;
        assert_eq!(response.status(), 200);
        let img = image::load_from_memory(&response.bytes().await.unwrap()).unwrap().to_rgb8();
        assert_eq!(img.dimensions(), (290, 290));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn bad_box_size_is_rejected_and_logo_not_left_behind() {
        let server = start_server();
        let form = hello_form().text("box_size", "ten").part("logo", logo_part(red_logo_png()));
        let response = post(&server, form).await;
        assert_eq!(response.status(), 400);
        let body: serde_json::Value = response.json().await.unwrap();
        assert!(body["error"].as_str().unwrap().contains("box_size"));
        assert!(is_empty_dir(server.upload_dir.path()));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn corrupt_logo_is_server_error_and_cleaned_up() {
        let server = start_server();
        let form = hello_form().part("logo", logo_part(b"not a png".to_vec()));
        let response = post(&server, form).await;
        assert_eq!(response.status(), 500);
        assert!(is_empty_dir(server.upload_dir.path()));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn non_multipart_post_is_bad_request() {
        let server = start_server();
        let response = server
            .client
            .post(format!("{}/generate", server.base))
            .body("data=Hello")
            .header("content-type", "application/x-www-form-urlencoded")
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), 400);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn unknown_level_renders_at_m() {
        let server = start_server();
        let with_level =
            |level: &'static str| Form::new().text("data", "Hello").text("error_correction", level);
        let at_m = post(&server, with_level("M")).await;
        let unknown = post(&server, with_level("best")).await;
        assert_eq!(unknown.status(), 200);
        assert_eq!(unknown.bytes().await.unwrap(), at_m.bytes().await.unwrap());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 1)]
    async fn slow_upload_does_not_stall_other_requests() {
        let server = start_server();
        let addr = server.base.trim_start_matches("http://").to_string();

        let mut slow = std::net::TcpStream::connect(&addr).unwrap();
        write!(
            slow,
            "POST /generate HTTP/1.1\r\nHost: {addr}\r\n\
             Content-Type: multipart/form-data; boundary=B\r\n\
             Content-Length: 100000\r\n\r\n--B\r\n"
        )
        .unwrap();
        slow.flush().unwrap();
        tokio::task::yield_now().await;

        let response = server
            .client
            .get(format!("{}/", server.base))
            .timeout(Duration::from_secs(5))
            .send()
            .await
            .expect("GET / stalled behind a slow upload");
        assert_eq!(response.status(), 200);

        drop(slow);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn unknown_route_is_not_found() {
        let server = start_server();
        let response = server.client.get(format!("{}/nope", server.base)).send().await.unwrap();
        assert_eq!(response.status(), 404);
    }
}
