use std::{
    convert::Infallible,
    future::{Ready, ready},
    sync::Arc,
};

use hyper::{
    Method, Request, StatusCode,
    body::Incoming,
    header::{ALLOW, HeaderValue, LOCATION},
    service::Service,
};
use tracing::{info_span, warn};
use url::{Url, form_urlencoded};

use crate::{
    error::RejectError,
    guard::{RedirectGuard, ValidationOutcome},
    server::{HttpResponse, create_response, reject},
};

const REDIRECT_PATH: &str = "/redirect";
const DESTINATION_PARAM: &str = "destination";

#[derive(Debug, Clone)]
pub struct RedirectHandler {
    guard: Arc<RedirectGuard>,
}

impl RedirectHandler {
    pub fn new(guard: Arc<RedirectGuard>) -> Self {
        Self { guard }
    }

    /// Maps a request to its response. Only the URI and method are read, so
    /// the body type does not matter.
    pub fn respond<B>(&self, req: &Request<B>) -> HttpResponse {
        let span = info_span!("http_request", method = %req.method(), path = %req.uri().path());
        let _enter = span.enter();

        if req.uri().path() != REDIRECT_PATH {
            return reject(RejectError::NotFound);
        }

        if *req.method() != Method::GET && *req.method() != Method::HEAD {
            let mut resp = reject(RejectError::MethodNotAllowed);
            resp.headers_mut()
                .insert(ALLOW, HeaderValue::from_static("GET, HEAD"));
            return resp;
        }

        let destination = destination_param(req.uri().query());

        match self.guard.evaluate(destination.as_deref()) {
            ValidationOutcome::Valid { url } => found(&url),
            ValidationOutcome::Malformed(malformed) => reject(malformed.into()),
            ValidationOutcome::Unauthorized { .. } => reject(RejectError::UnauthorizedDestination),
        }
    }
}

impl Service<Request<Incoming>> for RedirectHandler {
    type Response = HttpResponse;
    type Error = Infallible;
    type Future = Ready<Result<Self::Response, Self::Error>>;

    fn call(&self, req: Request<Incoming>) -> Self::Future {
        ready(Ok(self.respond(&req)))
    }
}

/// First `destination` query parameter, form-decoded once.
fn destination_param(query: Option<&str>) -> Option<String> {
    form_urlencoded::parse(query?.as_bytes())
        .find(|(key, _)| key == DESTINATION_PARAM)
        .map(|(_, value)| value.into_owned())
}

fn found(url: &Url) -> HttpResponse {
    match HeaderValue::from_str(url.as_str()) {
        Ok(location) => {
            let mut resp = create_response(StatusCode::FOUND);
            resp.headers_mut().insert(LOCATION, location);
            resp
        }
        Err(e) => {
            warn!(error = %e, "Validated URL is not a valid Location header");
            reject(RejectError::Internal)
        }
    }
}
