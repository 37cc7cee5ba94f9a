//! Session-aware facade over `PlannerClient`.
//!
//! Every call goes build → request interceptors → transport → response
//! interceptors → parse. Failures have already been noticed (and, for 401,
//! the session torn down) by the time the `ApiError` reaches the caller.

use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tracing::debug;

use crate::client::PlannerClient;
use crate::config::ClientConfig;
use crate::error::ApiError;
use crate::http::{HttpRequest, HttpResponse};
use crate::interceptor::Pipeline;
use crate::notify::{TracingNavigator, TracingNotifier, LOGGED_OUT};
use crate::session::Session;
use crate::transport::{Transport, UreqTransport};
use crate::types::{
    Credentials, InvitationId, MessageResponse, NewPlan, NewUser, Notification, NotificationId,
    Plan, PlanId, PlanMember, PlanUpdate, QuickSection, Section, Token, User, UserId,
};

pub struct PlannerApi<T = UreqTransport> {
    client: PlannerClient,
    transport: T,
    pipeline: Pipeline,
    session: Arc<Session>,
}

impl PlannerApi<UreqTransport> {
    /// ureq transport, in-memory session, notices and redirects to `tracing`.
    pub fn connect(config: &ClientConfig) -> Self {
        let session = Arc::new(Session::in_memory());
        let pipeline = Pipeline::standard(config, Arc::clone(&session), TracingNotifier, TracingNavigator);
        debug!(base_url = %config.base_url, "planner api configured");
        Self::new(
            PlannerClient::new(&config.base_url),
            UreqTransport::new(config.timeout),
            pipeline,
            session,
        )
    }
}

impl<T: Transport> PlannerApi<T> {
    /// `pipeline` should have been built over the same `session`.
    pub fn new(client: PlannerClient, transport: T, pipeline: Pipeline, session: Arc<Session>) -> Self {
        Self {
            client,
            transport,
            pipeline,
            session,
        }
    }

    pub fn client(&self) -> &PlannerClient {
        &self.client
    }

    pub fn session(&self) -> &Arc<Session> {
        &self.session
    }

    /// Run `request` through both interceptor chains; only 2xx responses come back.
    fn round_trip(&self, request: HttpRequest) -> Result<HttpResponse, ApiError> {
        let request = self.pipeline.prepare(request);
        debug!(method = %request.method, url = %request.path, "request");
        let outcome = self.transport.execute(&request);
        self.pipeline.complete(outcome)
    }

    fn send<R: DeserializeOwned>(&self, request: HttpRequest) -> Result<R, ApiError> {
        let response = self.round_trip(request)?;
        self.client.parse(response)
    }

    // --- auth ---

    pub fn register(&self, input: &NewUser) -> Result<User, ApiError> {
        self.send(self.client.build_register(input)?)
    }

    /// Stores the returned token in the session.
    pub fn login(&self, credentials: &Credentials) -> Result<Token, ApiError> {
        let token: Token = self.send(self.client.build_login(credentials))?;
        self.session.set_token(&token.access_token)?;
        Ok(token)
    }

    /// Local only: there is no logout endpoint. Always broadcasts logout.
    pub fn logout(&self) -> MessageResponse {
        if let Err(e) = self.session.clear() {
            debug!(error = %e, "nothing to clear on logout");
        }
        self.session.notify_logout();
        MessageResponse {
            message: LOGGED_OUT.to_string(),
        }
    }

    /// Fetches the current user and caches it as the session identity.
    pub fn profile(&self) -> Result<User, ApiError> {
        let user: User = self.send(self.client.build_profile())?;
        let cached = serde_json::to_string(&user).map_err(|e| ApiError::Serialization(e.to_string()))?;
        self.session.set_user(&cached)?;
        Ok(user)
    }

    // --- plans ---

    pub fn list_plans(&self) -> Result<Vec<Plan>, ApiError> {
        self.send(self.client.build_list_plans())
    }

    pub fn owned_plans(&self) -> Result<Vec<Plan>, ApiError> {
        self.send(self.client.build_owned_plans())
    }

    pub fn shared_plans(&self) -> Result<Vec<Plan>, ApiError> {
        self.send(self.client.build_shared_plans())
    }

    pub fn create_plan(&self, input: &NewPlan) -> Result<Plan, ApiError> {
        self.send(self.client.build_create_plan(input)?)
    }

    pub fn get_plan(&self, id: PlanId) -> Result<Plan, ApiError> {
        self.send(self.client.build_get_plan(id))
    }

    pub fn update_plan(&self, id: PlanId, input: &PlanUpdate) -> Result<Plan, ApiError> {
        self.send(self.client.build_update_plan(id, input)?)
    }

    pub fn delete_plan(&self, id: PlanId) -> Result<Value, ApiError> {
        self.send(self.client.build_delete_plan(id))
    }

    // --- sections ---

    pub fn get_section(&self, id: PlanId, section: Section) -> Result<Value, ApiError> {
        self.send(self.client.build_get_section(id, section))
    }

    pub fn update_section<D: Serialize + ?Sized>(
        &self,
        id: PlanId,
        section: Section,
        data: &D,
    ) -> Result<Value, ApiError> {
        self.send(self.client.build_update_section(id, section, data)?)
    }

    pub fn update_quick_section<D: Serialize + ?Sized>(
        &self,
        id: PlanId,
        section: QuickSection,
        data: &D,
    ) -> Result<Value, ApiError> {
        self.send(self.client.build_update_quick_section(id, section, data)?)
    }

    pub fn executive_summary(&self, id: PlanId) -> Result<Value, ApiError> {
        self.send(self.client.build_executive_summary(id))
    }

    // --- members & invitations ---

    pub fn plan_users(&self, id: PlanId) -> Result<Vec<PlanMember>, ApiError> {
        self.send(self.client.build_plan_users(id))
    }

    pub fn invite_user(&self, id: PlanId, email: &str) -> Result<Value, ApiError> {
        self.send(self.client.build_invite_user(id, email)?)
    }

    pub fn remove_user(&self, id: PlanId, user_id: UserId) -> Result<Value, ApiError> {
        self.send(self.client.build_remove_user(id, user_id))
    }

    pub fn accept_invitation(&self, id: PlanId, invitation: InvitationId) -> Result<Value, ApiError> {
        self.send(self.client.build_accept_invitation(id, invitation))
    }

    pub fn reject_invitation(&self, id: PlanId, invitation: InvitationId) -> Result<Value, ApiError> {
        self.send(self.client.build_reject_invitation(id, invitation))
    }

    // --- notifications ---

    pub fn notifications(&self) -> Result<Vec<Notification>, ApiError> {
        let response = self.round_trip(self.client.build_notifications())?;
        self.client.parse_notifications(response)
    }

    pub fn mark_notification_read(&self, id: NotificationId) -> Result<Value, ApiError> {
        self.send(self.client.build_mark_notification_read(id))
    }
}

impl<T> std::fmt::Debug for PlannerApi<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PlannerApi")
            .field("base_url", &self.client.base_url())
            .field("pipeline", &self.pipeline)
            .field("session", &self.session)
            .finish_non_exhaustive()
    }
}
