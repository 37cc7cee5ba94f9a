//! Stateless HTTP request builder and response parser for the planning API.
//!
//! # Design
//! `PlannerClient` holds only a `base_url`. Every backend operation has a
//! `build_*` method that produces an `HttpRequest`; the response side is
//! generic because every endpoint returns its JSON payload unwrapped.
//! Nothing here knows about tokens or notices; those belong to the
//! interceptor chain.

use serde::de::DeserializeOwned;
use serde::Serialize;
use url::form_urlencoded;

use crate::error::ApiError;
use crate::http::{HttpMethod, HttpRequest, HttpResponse, FORM_URLENCODED, JSON};
use crate::types::{
    Credentials, Invite, InvitationId, NewPlan, NewUser, NotificationId, NotificationRecord,
    Notification, PlanId, PlanUpdate, QuickSection, Section, UserId,
};

const AUTH: &str = "/api/v1/auth";
const PLANS: &str = "/api/v1/plans";

/// Synchronous, stateless client for the planning API.
#[derive(Debug, Clone)]
pub struct PlannerClient {
    base_url: String,
}

impl PlannerClient {
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    fn request(&self, method: HttpMethod, path: &str) -> HttpRequest {
        HttpRequest::new(method, self.url(path))
    }

    fn json_request<T: Serialize + ?Sized>(
        &self,
        method: HttpMethod,
        path: &str,
        body: &T,
    ) -> Result<HttpRequest, ApiError> {
        let body = serde_json::to_string(body).map_err(|e| ApiError::Serialization(e.to_string()))?;
        Ok(self.request(method, path).with_body(JSON, body))
    }

    // --- auth ---

    pub fn build_register(&self, input: &NewUser) -> Result<HttpRequest, ApiError> {
        self.json_request(HttpMethod::Post, &format!("{AUTH}/register"), input)
    }

    /// The auth endpoint takes an OAuth2 password form, so this is the one
    /// request whose body is form-encoded.
    pub fn build_login(&self, credentials: &Credentials) -> HttpRequest {
        let body = form_urlencoded::Serializer::new(String::new())
            .append_pair("username", &credentials.username)
            .append_pair("password", &credentials.password)
            .finish();
        self.request(HttpMethod::Post, &format!("{AUTH}/login"))
            .with_body(FORM_URLENCODED, body)
    }

    pub fn build_profile(&self) -> HttpRequest {
        self.request(HttpMethod::Get, &format!("{AUTH}/me"))
    }

    // --- plans ---

    pub fn build_list_plans(&self) -> HttpRequest {
        self.request(HttpMethod::Get, PLANS)
    }

    pub fn build_owned_plans(&self) -> HttpRequest {
        self.request(HttpMethod::Get, &format!("{PLANS}/owned"))
    }

    pub fn build_shared_plans(&self) -> HttpRequest {
        self.request(HttpMethod::Get, &format!("{PLANS}/shared"))
    }

    pub fn build_create_plan(&self, input: &NewPlan) -> Result<HttpRequest, ApiError> {
        self.json_request(HttpMethod::Post, PLANS, input)
    }

    pub fn build_get_plan(&self, id: PlanId) -> HttpRequest {
        self.request(HttpMethod::Get, &format!("{PLANS}/{id}"))
    }

    pub fn build_update_plan(&self, id: PlanId, input: &PlanUpdate) -> Result<HttpRequest, ApiError> {
        self.json_request(HttpMethod::Put, &format!("{PLANS}/{id}"), input)
    }

    pub fn build_delete_plan(&self, id: PlanId) -> HttpRequest {
        self.request(HttpMethod::Delete, &format!("{PLANS}/{id}"))
    }

    // --- sections ---

    pub fn build_get_section(&self, id: PlanId, section: Section) -> HttpRequest {
        self.request(HttpMethod::Get, &format!("{PLANS}/{id}/{}", section.slug()))
    }

    pub fn build_update_section<T: Serialize + ?Sized>(
        &self,
        id: PlanId,
        section: Section,
        data: &T,
    ) -> Result<HttpRequest, ApiError> {
        self.json_request(HttpMethod::Put, &format!("{PLANS}/{id}/{}", section.slug()), data)
    }

    pub fn build_update_quick_section<T: Serialize + ?Sized>(
        &self,
        id: PlanId,
        section: QuickSection,
        data: &T,
    ) -> Result<HttpRequest, ApiError> {
        self.json_request(HttpMethod::Put, &format!("{PLANS}/{id}/{}", section.slug()), data)
    }

    pub fn build_executive_summary(&self, id: PlanId) -> HttpRequest {
        self.request(HttpMethod::Get, &format!("{PLANS}/{id}/executive-summary"))
    }

    // --- members & invitations ---

    pub fn build_plan_users(&self, id: PlanId) -> HttpRequest {
        self.request(HttpMethod::Get, &format!("{PLANS}/{id}/users"))
    }

    pub fn build_invite_user(&self, id: PlanId, email: &str) -> Result<HttpRequest, ApiError> {
        let invite = Invite {
            email: email.to_string(),
        };
        self.json_request(HttpMethod::Post, &format!("{PLANS}/{id}/invite"), &invite)
    }

    pub fn build_remove_user(&self, id: PlanId, user_id: UserId) -> HttpRequest {
        self.request(HttpMethod::Delete, &format!("{PLANS}/{id}/users/{user_id}"))
    }

    pub fn build_accept_invitation(&self, id: PlanId, invitation: InvitationId) -> HttpRequest {
        self.request(
            HttpMethod::Post,
            &format!("{PLANS}/{id}/invitations/{invitation}/accept"),
        )
    }

    pub fn build_reject_invitation(&self, id: PlanId, invitation: InvitationId) -> HttpRequest {
        self.request(
            HttpMethod::Post,
            &format!("{PLANS}/{id}/invitations/{invitation}/reject"),
        )
    }

    // --- notifications ---

    pub fn build_notifications(&self) -> HttpRequest {
        self.request(HttpMethod::Get, &format!("{PLANS}/notifications"))
    }

    pub fn build_mark_notification_read(&self, id: NotificationId) -> HttpRequest {
        self.request(HttpMethod::Put, &format!("{PLANS}/notifications/{id}/read"))
    }

    // --- parsing ---

    /// Decode a success body. An empty body decodes as JSON `null`, so
    /// `serde_json::Value` and `Option<T>` accept 204 responses.
    pub fn parse<T: DeserializeOwned>(&self, response: HttpResponse) -> Result<T, ApiError> {
        check_success(&response)?;
        let body = if response.body.trim().is_empty() {
            "null"
        } else {
            response.body.as_str()
        };
        serde_json::from_str(body).map_err(|e| ApiError::Deserialization(e.to_string()))
    }

    /// Decode the wire notification list and project it to the client shape.
    /// A `null` body yields an empty list.
    pub fn parse_notifications(&self, response: HttpResponse) -> Result<Vec<Notification>, ApiError> {
        let records: Option<Vec<NotificationRecord>> = self.parse(response)?;
        Ok(records
            .unwrap_or_default()
            .into_iter()
            .map(Notification::from)
            .collect())
    }
}

/// Responses normally reach the parser only after the interceptor chain has
/// rejected failures; this guards direct `build`/`parse` use.
fn check_success(response: &HttpResponse) -> Result<(), ApiError> {
    if response.is_success() {
        return Ok(());
    }
    let failure = crate::failure::classify(&Ok(response.clone()));
    Err(failure.map_or_else(
        || ApiError::Unexpected {
            status: response.status,
            body: response.body.clone(),
        },
        ApiError::from,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::CONTENT_TYPE;
    use crate::types::{Plan, User};

    fn client() -> PlannerClient {
        PlannerClient::new("http://localhost:8000")
    }

    #[test]
    fn login_is_form_encoded() {
        let req = client().build_login(&Credentials::new("a", "b"));
        assert_eq!(req.method, HttpMethod::Post);
        assert_eq!(req.path, "http://localhost:8000/api/v1/auth/login");
        assert_eq!(req.body.as_deref(), Some("username=a&password=b"));
        assert_eq!(req.header(CONTENT_TYPE), Some(FORM_URLENCODED));
        assert_eq!(req.headers.len(), 1);
    }

    #[test]
    fn login_percent_encodes_reserved_characters() {
        let req = client().build_login(&Credentials::new("ana@x.org", "p&s=1 2"));
        assert_eq!(
            req.body.as_deref(),
            Some("username=ana%40x.org&password=p%26s%3D1+2")
        );
    }

    #[test]
    fn register_is_json() {
        let input = NewUser {
            username: "ana".to_string(),
            email: "ana@x.org".to_string(),
            password: "secret".to_string(),
            full_name: None,
        };
        let req = client().build_register(&input).unwrap();
        assert_eq!(req.header(CONTENT_TYPE), Some(JSON));
        let body: serde_json::Value = serde_json::from_str(req.body.as_deref().unwrap()).unwrap();
        assert_eq!(body["username"], "ana");
        assert!(body.get("full_name").is_none());
    }

    #[test]
    fn templated_paths() {
        let c = client();
        assert_eq!(
            c.build_get_section(4, Section::CompanyIdentity).path,
            "http://localhost:8000/api/v1/plans/4/company-identity"
        );
        assert_eq!(
            c.build_update_quick_section(4, QuickSection::Strategies, &serde_json::json!({}))
                .unwrap()
                .path,
            "http://localhost:8000/api/v1/plans/4/strategies-simple"
        );
        assert_eq!(
            c.build_remove_user(4, 11).path,
            "http://localhost:8000/api/v1/plans/4/users/11"
        );
        assert_eq!(
            c.build_reject_invitation(4, 2).path,
            "http://localhost:8000/api/v1/plans/4/invitations/2/reject"
        );
        assert_eq!(
            c.build_mark_notification_read(8).path,
            "http://localhost:8000/api/v1/plans/notifications/8/read"
        );
    }

    #[test]
    fn bodiless_requests_carry_no_headers() {
        let req = client().build_accept_invitation(1, 1);
        assert!(req.body.is_none());
        assert!(req.headers.is_empty());
    }

    #[test]
    fn trailing_slash_is_stripped() {
        let client = PlannerClient::new("http://localhost:8000/");
        assert_eq!(client.build_list_plans().path, "http://localhost:8000/api/v1/plans");
    }

    #[test]
    fn parse_plan_success() {
        let resp = HttpResponse::new(200, r#"{"id":1,"name":"Plan A","description":null,"owner_id":3}"#);
        let plan: Plan = client().parse(resp).unwrap();
        assert_eq!(plan.name, "Plan A");
        assert_eq!(plan.owner_id, 3);
    }

    #[test]
    fn parse_empty_body_as_null() {
        let value: serde_json::Value = client().parse(HttpResponse::new(204, "")).unwrap();
        assert!(value.is_null());
    }

    #[test]
    fn parse_bad_json() {
        let err = client()
            .parse::<User>(HttpResponse::new(200, "not json"))
            .unwrap_err();
        assert!(matches!(err, ApiError::Deserialization(_)));
    }

    #[test]
    fn parse_rejects_failure_status() {
        let err = client()
            .parse::<Plan>(HttpResponse::new(404, ""))
            .unwrap_err();
        assert!(matches!(err, ApiError::NotFound { .. }));
    }

    #[test]
    fn parse_notifications_null_is_empty() {
        let list = client()
            .parse_notifications(HttpResponse::new(200, "null"))
            .unwrap();
        assert!(list.is_empty());
    }
}
