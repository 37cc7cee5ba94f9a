//! Client core for the strategic-planning API.
//!
//! # Overview
//! `PlannerClient` builds `HttpRequest` values and parses `HttpResponse`
//! values without touching the network. `PlannerApi` wraps it with an
//! interceptor [`Pipeline`] and a [`Transport`]: the outbound chain attaches
//! the bearer token, the inbound chain classifies failures, tears the
//! session down on 401 and surfaces a notice for every failure before the
//! error is handed back to the caller.
//!
//! # Design
//! - The session (token, cached user, logout listeners) is an explicit
//!   [`Session`] object shared by the facade and the interceptors.
//! - Notices and redirects go through the [`Notifier`] and [`Navigator`]
//!   traits so hosts decide how to render them.
//! - DTOs are defined independently from the mock-server crate;
//!   integration tests catch schema drift.

pub mod api;
pub mod client;
pub mod config;
pub mod error;
pub mod failure;
pub mod http;
pub mod interceptor;
pub mod notify;
pub mod session;
pub mod transport;
pub mod types;

pub use api::PlannerApi;
pub use client::PlannerClient;
pub use config::ClientConfig;
pub use error::ApiError;
pub use failure::{Failure, FailureKind};
pub use http::{HttpMethod, HttpRequest, HttpResponse};
pub use interceptor::{BearerAuth, ErrorNotice, Pipeline, RequestInterceptor, ResponseInterceptor, SessionExpiry};
pub use notify::{Navigator, NoticeLog, Notifier, TracingNavigator, TracingNotifier};
pub use session::{FileStorage, ListenerId, MemoryStorage, Session, Storage, StorageError};
pub use transport::{Transport, TransportError, UreqTransport};
pub use types::{
    Credentials, NewPlan, NewUser, Notification, NotificationRecord, Plan, PlanMember, PlanUpdate,
    QuickSection, Section, Token, User,
};
