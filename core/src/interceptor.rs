//! Request/response interceptor chain.
//!
//! # Design
//! A [`Pipeline`] holds two ordered lists. Request interceptors rewrite the
//! outgoing `HttpRequest` in place and cannot fail. Response interceptors
//! only see failures: 2xx responses pass straight through, everything else
//! is classified once and handed to every response interceptor in order
//! before being returned to the caller as an `ApiError`.

use std::sync::Arc;

use tracing::debug;

use crate::config::ClientConfig;
use crate::error::ApiError;
use crate::failure::{classify, Failure, FailureKind};
use crate::http::{HttpRequest, HttpResponse, AUTHORIZATION};
use crate::notify::{notice_for, Navigator, Notifier};
use crate::session::Session;
use crate::transport::TransportError;

pub trait RequestInterceptor: Send + Sync {
    fn on_request(&self, request: &mut HttpRequest);
}

pub trait ResponseInterceptor: Send + Sync {
    fn on_failure(&self, failure: &Failure);
}

#[derive(Default)]
pub struct Pipeline {
    request: Vec<Box<dyn RequestInterceptor>>,
    response: Vec<Box<dyn ResponseInterceptor>>,
}

impl Pipeline {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bearer auth on the way out; session expiry then the error notice on
    /// the way back.
    pub fn standard(
        config: &ClientConfig,
        session: Arc<Session>,
        notifier: impl Notifier + 'static,
        navigator: impl Navigator + 'static,
    ) -> Self {
        Self::new()
            .with_request(BearerAuth::new(Arc::clone(&session)))
            .with_response(SessionExpiry::new(session, navigator, config))
            .with_response(ErrorNotice::new(notifier))
    }

    pub fn with_request(mut self, interceptor: impl RequestInterceptor + 'static) -> Self {
        self.request.push(Box::new(interceptor));
        self
    }

    pub fn with_response(mut self, interceptor: impl ResponseInterceptor + 'static) -> Self {
        self.response.push(Box::new(interceptor));
        self
    }

    pub fn prepare(&self, mut request: HttpRequest) -> HttpRequest {
        for interceptor in &self.request {
            interceptor.on_request(&mut request);
        }
        request
    }

    pub fn complete(
        &self,
        outcome: Result<HttpResponse, TransportError>,
    ) -> Result<HttpResponse, ApiError> {
        match classify(&outcome) {
            None => outcome.map_err(|e| ApiError::Transport(e.to_string())),
            Some(failure) => {
                debug!(kind = ?failure.kind, status = ?failure.status, "request failed");
                for interceptor in &self.response {
                    interceptor.on_failure(&failure);
                }
                Err(failure.into())
            }
        }
    }
}

impl std::fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pipeline")
            .field("request", &self.request.len())
            .field("response", &self.response.len())
            .finish()
    }
}

/// Attaches `Authorization: Bearer <token>` while a token is present.
pub struct BearerAuth {
    session: Arc<Session>,
}

impl BearerAuth {
    pub fn new(session: Arc<Session>) -> Self {
        Self { session }
    }
}

impl RequestInterceptor for BearerAuth {
    fn on_request(&self, request: &mut HttpRequest) {
        if let Some(token) = self.session.token() {
            request.set_header(AUTHORIZATION, format!("Bearer {token}"));
        }
    }
}

/// On 401: drop the session, broadcast logout, leave for the login page.
pub struct SessionExpiry {
    session: Arc<Session>,
    navigator: Box<dyn Navigator>,
    login_path: String,
    redirect: bool,
}

impl SessionExpiry {
    pub fn new(session: Arc<Session>, navigator: impl Navigator + 'static, config: &ClientConfig) -> Self {
        Self {
            session,
            navigator: Box::new(navigator),
            login_path: config.login_path.clone(),
            redirect: config.redirect_on_expiry,
        }
    }
}

impl ResponseInterceptor for SessionExpiry {
    fn on_failure(&self, failure: &Failure) {
        if failure.kind != FailureKind::Authentication {
            return;
        }
        if let Err(e) = self.session.clear() {
            tracing::warn!(error = %e, "could not clear expired session");
        }
        self.session.notify_logout();
        if self.redirect {
            self.navigator.redirect(&self.login_path);
        }
    }
}

/// Surfaces one notice per failure.
pub struct ErrorNotice {
    notifier: Box<dyn Notifier>,
}

impl ErrorNotice {
    pub fn new(notifier: impl Notifier + 'static) -> Self {
        Self {
            notifier: Box::new(notifier),
        }
    }
}

impl ResponseInterceptor for ErrorNotice {
    fn on_failure(&self, failure: &Failure) {
        self.notifier.error(notice_for(failure));
    }
}
