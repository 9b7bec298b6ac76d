mod redirect;

use std::sync::Arc;

use http_body_util::{BodyExt, Empty, Full, combinators::BoxBody};
use hyper::{
    Response, StatusCode,
    body::Bytes,
    header::{CONTENT_TYPE, HeaderValue},
};
use hyper_util::rt::TokioIo;
use tokio::{net::TcpListener, sync::broadcast};
use tracing::{info, warn};

use crate::server::redirect::RedirectHandler;
use crate::{error::RejectError, guard::RedirectGuard};

type ServerBuilder = hyper::server::conn::http1::Builder;

pub type HttpResponse = Response<BoxBody<Bytes, hyper::Error>>;

pub async fn start_server(
    guard: Arc<RedirectGuard>,
    kill_signal: broadcast::Receiver<()>,
    address: &str,
) -> anyhow::Result<()> {
    info!("Binding to {address}");
    let listener = TcpListener::bind(address).await?;
    info!("Server running on {address}");

    serve(listener, guard, kill_signal).await
}

/// Accepts connections until `kill_signal` fires. Each connection is served
/// on its own task; a failing connection never stops the loop.
async fn serve(
    listener: TcpListener,
    guard: Arc<RedirectGuard>,
    mut kill_signal: broadcast::Receiver<()>,
) -> anyhow::Result<()> {
    loop {
        tokio::select! {
            _ = kill_signal.recv() => {
                info!("Kill signal received, closing listener");
                return Ok(());
            }
            res = listener.accept() => {
                match res {
                    Ok((stream, peer)) => {
                        let io = TokioIo::new(stream);
                        let service = RedirectHandler::new(guard.clone());

                        tokio::task::spawn(async move {
                            if let Err(err) = ServerBuilder::new()
                                .serve_connection(io, service)
                                .await
                            {
                                warn!(%peer, error = %err, "Failed to serve connection");
                            }
                        });
                    }

                    Err(err) => {
                        warn!(error = %err, "Failed to accept connection");
                    }
                }
            }
        }
    }
}

fn full<T: Into<Bytes>>(chunk: T) -> BoxBody<Bytes, hyper::Error> {
    Full::new(chunk.into())
        .map_err(|never| match never {})
        .boxed()
}

fn empty() -> BoxBody<Bytes, hyper::Error> {
    Empty::<Bytes>::new()
        .map_err(|never| match never {})
        .boxed()
}

fn create_response(status_code: StatusCode) -> HttpResponse {
    let mut resp = Response::new(empty());
    *resp.status_mut() = status_code;
    resp
}

fn reject(err: RejectError) -> HttpResponse {
    let mut resp = Response::new(full(err.body()));
    *resp.status_mut() = err.status();
    resp.headers_mut()
        .insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    resp
}
