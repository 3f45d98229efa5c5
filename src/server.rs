//! HTTP server: accept loop, routing, stored-upload serving

use std::sync::Arc;

use tokio::io::{BufReader, BufWriter};
use tokio::net::{TcpListener, TcpStream};

use crate::error::{Error, Result};
use crate::handlers::{self, AppContext};
use crate::protocol::{self, Request, Response};

/// The mailbox service over HTTP
pub struct HttpServer {
    context: Arc<AppContext>,
}

impl HttpServer {
    pub fn new(context: AppContext) -> Self {
        Self {
            context: Arc::new(context),
        }
    }

    /// Bind the address and serve.
    pub async fn listen(&self, addr: &str) -> Result<()> {
        let listener = TcpListener::bind(addr).await?;
        log::info!("buzon server listening on {}", addr);
        self.listen_on(listener).await
    }

    /// Serve on an existing listener (useful for testing).
    pub async fn listen_on(&self, listener: TcpListener) -> Result<()> {
        loop {
            let (stream, peer_addr) = listener.accept().await?;
            let context = Arc::clone(&self.context);
            tokio::spawn(async move {
                if let Err(e) = handle_connection(stream, context).await {
                    log::error!("connection {} error: {}", peer_addr, e);
                }
            });
        }
    }
}

/// Serve sequential requests on one connection until the client closes.
async fn handle_connection(stream: TcpStream, context: Arc<AppContext>) -> Result<()> {
    let (read_half, write_half) = tokio::io::split(stream);
    let mut reader = BufReader::new(read_half);
    let mut writer = BufWriter::new(write_half);

    loop {
        let request = match protocol::read_request(&mut reader).await {
            Ok(Some(request)) => request,
            Ok(None) => break,
            Err(e) => {
                // framing is suspect after a parse failure, so answer and drop
                Response::from_error(&e).write_to(&mut writer).await?;
                break;
            }
        };
        log::debug!("request: {} {}", request.method, request.path);

        let response = match route(&context, &request).await {
            Ok(response) => response,
            Err(e) => Response::from_error(&e),
        };
        log::debug!(
            "response: {} {} -> {}",
            request.method,
            request.path,
            response.status
        );

        response.write_to(&mut writer).await?;
    }

    Ok(())
}

async fn route(context: &AppContext, request: &Request) -> Result<Response> {
    if request.method == "OPTIONS" {
        return Ok(Response::no_content());
    }

    match (request.method.as_str(), request.path.as_str()) {
        ("POST", "/api/admin/buzzones") => handlers::admin::provision(context, request).await,
        ("GET", "/api/admin/info") => handlers::admin::info(context, request).await,
        ("GET", "/api/codigo-subida-info") => {
            handlers::view::upload_code_info(context, request).await
        }
        ("GET", "/api/buzon-nombre") => handlers::view::view_code_info(context, request).await,
        ("POST", "/api/subir") => handlers::submit::submit_file(context, request).await,
        ("POST", "/api/subir-link") => handlers::submit::submit_link(context, request).await,
        ("GET", "/api/buzon") => handlers::view::view_mailbox(context, request).await,
        ("GET", "/health") => Response::json(200, &serde_json::json!({ "ok": true })),
        ("GET", path) if path.starts_with("/uploads/") => serve_upload(context, path).await,
        _ => Err(Error::NotFound(format!(
            "no route for {} {}",
            request.method, request.path
        ))),
    }
}

/// Serve a stored attachment verbatim with a guessed content type.
async fn serve_upload(context: &AppContext, path: &str) -> Result<Response> {
    let name = &path["/uploads/".len()..];
    match context.uploads.read(name).await? {
        Some(content) => {
            let content_type = mime_guess::from_path(name).first_or_octet_stream();
            Ok(Response::bytes(200, content_type.essence_str(), content))
        }
        None => Err(Error::NotFound(format!("no such upload: {}", name))),
    }
}
