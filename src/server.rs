use crate::agent::PortfolioAgent;
use crate::storage::normalize_visitor_id;
use crate::websocket::handle_connection;
use std::error::Error;
use std::sync::Arc;
use std::num::NonZeroU32;
use std::net::SocketAddr;
use tokio::net::{ TcpListener, TcpStream };
use tokio_tungstenite::accept_hdr_async;
use tokio_tungstenite::tungstenite::handshake::server::{ Request, Response };
use tokio_tungstenite::tungstenite::http::StatusCode;
use tokio_tungstenite::tungstenite::http::response::Response as HttpResponse;
use once_cell::sync::Lazy;
use governor::{ RateLimiter, Quota, state::{ InMemoryState, NotKeyed }, clock::DefaultClock };
use url::form_urlencoded;

use log::{ info, warn, error, debug };

const CONNECTIONS_PER_SECOND: NonZeroU32 = match NonZeroU32::new(10) {
    Some(n) => n,
    None => panic!("connection quota must be non-zero"),
};

static CONNECTION_LIMITER: Lazy<RateLimiter<NotKeyed, InMemoryState, DefaultClock>> = Lazy::new(||
    RateLimiter::direct(Quota::per_second(CONNECTIONS_PER_SECOND))
);

pub struct Server {
    addr: String,
    agent: Arc<PortfolioAgent>,
    api_key: Option<String>,
}

fn handshake_value(req: &Request, header: &str, query_key: &str) -> Option<String> {
    let from_header = req
        .headers()
        .get(header)
        .and_then(|v| v.to_str().ok())
        .map(str::to_owned);
    if from_header.is_some() {
        return from_header;
    }
    req.uri()
        .query()
        .and_then(|q| {
            form_urlencoded
                ::parse(q.as_bytes())
                .find(|(k, _)| k == query_key)
                .map(|(_, v)| v.into_owned())
        })
}

/// Key sent by the client in the `X-API-Key` header or the `api_key` query
/// parameter, header first.
pub fn provided_api_key(req: &Request) -> Option<String> {
    handshake_value(req, "X-API-Key", "api_key")
}

/// Browser-generated id from the `X-Visitor-Id` header or the `visitor_id`
/// query parameter. Malformed ids are dropped.
pub fn provided_visitor_id(req: &Request) -> Option<String> {
    handshake_value(req, "X-Visitor-Id", "visitor_id").and_then(|raw| normalize_visitor_id(&raw))
}

impl Server {
    pub fn new(addr: String, agent: Arc<PortfolioAgent>, api_key: Option<String>) -> Self {
        let api_key = api_key.filter(|k| !k.trim().is_empty());

        if api_key.is_some() {
            info!("Server configured with API Key authentication.");
        } else {
            warn!("Server configured WITHOUT API Key authentication. Connections are open.");
        }

        Self { addr, agent, api_key }
    }

    pub async fn run(&self) -> Result<(), Box<dyn Error + Send + Sync>> {
        let listener = TcpListener::bind(&self.addr).await?;
        info!("WS server listening on: {}", self.addr);

        loop {
            let (stream, peer) = listener.accept().await?;

            if CONNECTION_LIMITER.check().is_err() {
                warn!("Global connection rate limit exceeded for {}. Dropping connection.", peer);
                continue;
            }

            info!("Incoming connection from: {}", peer);
            let agent = Arc::clone(&self.agent);
            let required_api_key = self.api_key.clone();

            tokio::spawn(async move {
                if let Err(e) = Self::process_connection(peer, stream, agent, required_api_key).await {
                    error!("Failed to process connection for {}: {}", peer, e);
                }
            });
        }
    }

    async fn process_connection(
        peer: SocketAddr,
        stream: TcpStream,
        agent: Arc<PortfolioAgent>,
        required_api_key: Option<String>
    ) -> Result<(), Box<dyn Error + Send + Sync>> {
        let mut visitor_id = None;
        let auth_callback = |
            req: &Request,
            response: Response
        | -> Result<Response, HttpResponse<Option<String>>> {
            debug!("Handshake from {} for {}", peer, req.uri());
            visitor_id = provided_visitor_id(req);

            let Some(ref required) = required_api_key else {
                return Ok(response);
            };

            if provided_api_key(req).as_deref() != Some(required.as_str()) {
                warn!("{}: bad or missing API key", peer);
                let mut resp = HttpResponse::new(Some("Unauthorized".to_string()));
                *resp.status_mut() = StatusCode::UNAUTHORIZED;
                return Err(resp);
            }
            info!("{} authenticated", peer);
            Ok(response)
        };

        let handshake = accept_hdr_async(stream, auth_callback).await;
        match handshake {
            Ok(ws) => {
                if visitor_id.is_none() {
                    debug!("{} sent no visitor id, credentials stay with the session", peer);
                }
                handle_connection(peer, ws, agent, visitor_id).await;
                Ok(())
            }
            Err(e) => {
                error!("Handshake failed for {}: {}", peer, e);
                Err(Box::new(e) as _)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(uri: &str, header: Option<&str>) -> Request {
        let mut builder = Request::builder().uri(uri);
        if let Some(key) = header {
            builder = builder.header("X-API-Key", key);
        }
        builder.body(()).unwrap()
    }

    #[test]
    fn test_visitor_id_from_header_or_query() {
        let req = Request::builder()
            .uri("/?visitor_id=from-query-0001")
            .header("X-Visitor-Id", "from-header-0001")
            .body(())
            .unwrap();
        assert_eq!(provided_visitor_id(&req).as_deref(), Some("from-header-0001"));
        assert_eq!(provided_visitor_id(&request("/?visitor_id=from-query-0001", None)).as_deref(), Some("from-query-0001"));
        assert_eq!(provided_visitor_id(&request("/?visitor_id=..%2F..%2Fetc", None)), None);
        assert_eq!(provided_visitor_id(&request("/", None)), None);
    }

    #[test]
    fn test_api_key_from_header_or_query() {
        assert_eq!(provided_api_key(&request("/", Some("secret"))).as_deref(), Some("secret"));
        assert_eq!(provided_api_key(&request("/?lang=en&api_key=s%20q", None)).as_deref(), Some("s q"));
        assert_eq!(provided_api_key(&request("/?api_key=q", Some("h"))).as_deref(), Some("h"));
        assert_eq!(provided_api_key(&request("/", None)), None);
    }
}
