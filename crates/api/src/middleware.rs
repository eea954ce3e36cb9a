use std::collections::HashMap;
use std::sync::Arc;

use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    middleware::Next,
    response::Response,
};

use fundcrm_access::RequestContext;

use crate::app::errors::json_error;
use crate::context::DevToken;

/// Maps a bearer token to the request context it authenticates.
pub trait Authenticator: Send + Sync {
    fn authenticate(&self, token: &str) -> Option<RequestContext>;
}

/// Fixed token table, loaded from the seed file in dev.
#[derive(Debug, Default, Clone)]
pub struct StaticTokenAuthenticator {
    tokens: HashMap<String, RequestContext>,
}

impl StaticTokenAuthenticator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_tokens<'a>(tokens: impl IntoIterator<Item = &'a DevToken>) -> Self {
        let mut auth = Self::new();
        for t in tokens {
            auth.insert(t.token.clone(), t.to_context());
        }
        auth
    }

    pub fn insert(&mut self, token: impl Into<String>, ctx: RequestContext) {
        self.tokens.insert(token.into(), ctx);
    }

    pub fn with_token(mut self, token: impl Into<String>, ctx: RequestContext) -> Self {
        self.insert(token, ctx);
        self
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }
}

impl Authenticator for StaticTokenAuthenticator {
    fn authenticate(&self, token: &str) -> Option<RequestContext> {
        self.tokens.get(token).cloned()
    }
}

#[derive(Clone)]
pub struct AuthState {
    pub authenticator: Arc<dyn Authenticator>,
}

/// Resolve the bearer token into a [`RequestContext`] request extension.
pub async fn auth_middleware(
    State(state): State<AuthState>,
    mut req: axum::http::Request<axum::body::Body>,
    next: Next,
) -> Response {
    let ctx = match extract_bearer(req.headers()).map(|token| state.authenticator.authenticate(token)) {
        Ok(Some(ctx)) => ctx,
        Ok(None) => return unauthenticated("unknown bearer token"),
        Err(reason) => return unauthenticated(reason),
    };

    req.extensions_mut().insert(ctx);
    next.run(req).await
}

fn unauthenticated(reason: &'static str) -> Response {
    json_error(StatusCode::UNAUTHORIZED, "unauthenticated", reason)
}

fn extract_bearer(headers: &HeaderMap) -> Result<&str, &'static str> {
    let header = headers
        .get(axum::http::header::AUTHORIZATION)
        .ok_or("missing authorization header")?;

    let header = header.to_str().map_err(|_| "malformed authorization header")?;

    let token = header
        .strip_prefix("Bearer ")
        .ok_or("authorization header is not a bearer token")?
        .trim();

    if token.is_empty() {
        return Err("empty bearer token");
    }

    Ok(token)
}
