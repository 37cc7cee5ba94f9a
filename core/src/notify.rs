//! User-facing side channels: error notices and navigation.
//!
//! The facade never renders anything itself. It reports through a
//! [`Notifier`] and asks a [`Navigator`] to leave the current page when the
//! session expires. Both default to `tracing` output.

use std::sync::{Mutex, PoisonError};

use tracing::{info, warn};

use crate::failure::{Failure, FailureKind};

pub const SESSION_EXPIRED: &str = "Sesión expirada. Por favor, inicie sesión nuevamente.";
pub const FORBIDDEN: &str = "No tienes permisos para realizar esta acción.";
pub const NOT_FOUND: &str = "Recurso no encontrado.";
pub const SERVER_ERROR: &str = "Error del servidor. Por favor, intente más tarde.";
pub const UNEXPECTED: &str = "Ha ocurrido un error inesperado.";
pub const LOGGED_OUT: &str = "Sesión cerrada";

/// Text shown to the user for a failure.
pub fn notice_for(failure: &Failure) -> &str {
    match failure.kind {
        FailureKind::Authentication => SESSION_EXPIRED,
        FailureKind::Authorization => FORBIDDEN,
        FailureKind::NotFound => NOT_FOUND,
        FailureKind::Server => SERVER_ERROR,
        FailureKind::Application => failure.message.as_deref().unwrap_or(UNEXPECTED),
        FailureKind::Transport | FailureKind::Unclassified => UNEXPECTED,
    }
}

pub trait Notifier: Send + Sync {
    fn error(&self, message: &str);
}

/// Emits notices as `warn` events.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn error(&self, message: &str) {
        warn!(notice = message, "api error");
    }
}

/// Keeps every notice in order. Useful to assert on in tests and for hosts
/// that drain notices into their own UI.
#[derive(Debug, Default)]
pub struct NoticeLog {
    notices: Mutex<Vec<String>>,
}

impl NoticeLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn take(&self) -> Vec<String> {
        let mut notices = self.notices.lock().unwrap_or_else(PoisonError::into_inner);
        std::mem::take(&mut *notices)
    }
}

impl Notifier for NoticeLog {
    fn error(&self, message: &str) {
        let mut notices = self.notices.lock().unwrap_or_else(PoisonError::into_inner);
        notices.push(message.to_string());
    }
}

impl<N: Notifier + ?Sized> Notifier for std::sync::Arc<N> {
    fn error(&self, message: &str) {
        (**self).error(message);
    }
}

pub trait Navigator: Send + Sync {
    fn redirect(&self, location: &str);
}

/// Logs the redirect; hosts without a user agent have nowhere to go.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingNavigator;

impl Navigator for TracingNavigator {
    fn redirect(&self, location: &str) {
        info!(location, "redirecting to login");
    }
}

impl<N: Navigator + ?Sized> Navigator for std::sync::Arc<N> {
    fn redirect(&self, location: &str) {
        (**self).redirect(location);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn failure(kind: FailureKind, message: Option<&str>) -> Failure {
        Failure {
            kind,
            status: None,
            message: message.map(str::to_string),
            body: String::new(),
        }
    }

    #[test]
    fn application_notice_is_verbatim() {
        let f = failure(FailureKind::Application, Some("El correo ya está registrado"));
        assert_eq!(notice_for(&f), "El correo ya está registrado");
    }

    #[test]
    fn transport_notice_is_generic() {
        let f = failure(FailureKind::Transport, Some("connection refused"));
        assert_eq!(notice_for(&f), UNEXPECTED);
    }

    #[test]
    fn notice_log_drains() {
        let log = NoticeLog::new();
        log.error("a");
        log.error("b");
        assert_eq!(log.take(), vec!["a", "b"]);
        assert!(log.take().is_empty());
    }
}
