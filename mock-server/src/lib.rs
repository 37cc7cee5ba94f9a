use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post, put},
    Form, Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tokio::{net::TcpListener, sync::RwLock};
use uuid::Uuid;

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub full_name: Option<String>,
}

#[derive(Deserialize)]
pub struct Register {
    pub username: String,
    pub email: String,
    pub password: String,
    pub full_name: Option<String>,
}

#[derive(Deserialize)]
pub struct LoginForm {
    pub username: String,
    pub password: String,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Plan {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub owner_id: i64,
}

#[derive(Deserialize)]
pub struct CreatePlan {
    pub name: String,
    pub description: Option<String>,
}

#[derive(Deserialize)]
pub struct UpdatePlan {
    pub name: Option<String>,
    pub description: Option<String>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Member {
    pub user_id: i64,
    pub username: String,
    pub email: String,
    pub role: String,
}

#[derive(Deserialize)]
pub struct InviteBody {
    pub email: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Notification {
    pub id: i64,
    pub user_id: i64,
    #[serde(rename = "type")]
    pub kind: String,
    pub message: String,
    pub related_plan_id: Option<i64>,
    pub invitation_id: Option<i64>,
    pub status: String,
    pub created_at: String,
    pub updated_at: Option<String>,
}

#[derive(Clone, Debug)]
struct Invitation {
    plan_id: i64,
    user_id: i64,
    notification_id: i64,
    status: String,
}

/// Full section slugs, as stored.
pub const SECTIONS: [&str; 4] = ["company-identity", "strategic-analysis", "analysis-tools", "strategies"];

/// Write-only simplified slugs and the section each one lands in.
fn quick_section(slug: &str) -> Option<&'static str> {
    match slug {
        "identity" => Some("company-identity"),
        "swot" => Some("strategic-analysis"),
        "tools" => Some("analysis-tools"),
        "strategies-simple" => Some("strategies"),
        _ => None,
    }
}

fn full_section(slug: &str) -> Option<&'static str> {
    SECTIONS.iter().copied().find(|s| *s == slug)
}

#[derive(Default)]
pub struct Store {
    next_id: i64,
    users: BTreeMap<i64, (User, String)>,
    tokens: HashMap<String, i64>,
    plans: BTreeMap<i64, Plan>,
    sections: HashMap<(i64, &'static str), Value>,
    members: HashMap<i64, Vec<i64>>,
    invitations: HashMap<i64, Invitation>,
    notifications: BTreeMap<i64, Notification>,
}

impl Store {
    fn id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }

    fn can_read(&self, plan: &Plan, user: i64) -> bool {
        plan.owner_id == user || self.is_member(plan.id, user)
    }

    fn is_member(&self, plan: i64, user: i64) -> bool {
        self.members.get(&plan).is_some_and(|m| m.contains(&user))
    }

    fn plan(&self, id: i64) -> Result<&Plan, Failure> {
        self.plans
            .get(&id)
            .ok_or_else(|| Failure::message(StatusCode::NOT_FOUND, "Plan no encontrado"))
    }

    fn readable_plan(&self, id: i64, user: i64) -> Result<&Plan, Failure> {
        let plan = self.plan(id)?;
        if !self.can_read(plan, user) {
            return Err(Failure::message(StatusCode::FORBIDDEN, "Sin acceso a este plan"));
        }
        Ok(plan)
    }

    fn owned_plan(&self, id: i64, user: i64) -> Result<&Plan, Failure> {
        let plan = self.plan(id)?;
        if plan.owner_id != user {
            return Err(Failure::message(StatusCode::FORBIDDEN, "Solo el propietario puede hacer esto"));
        }
        Ok(plan)
    }
}

pub type Db = Arc<RwLock<Store>>;

/// Error response. Bodies carry a `message` field the way the real backend
/// does for application errors.
#[derive(Debug)]
pub struct Failure {
    status: StatusCode,
    message: Option<String>,
}

impl Failure {
    fn message(status: StatusCode, message: &str) -> Self {
        Self {
            status,
            message: Some(message.to_string()),
        }
    }

    fn unauthorized() -> Self {
        Self {
            status: StatusCode::UNAUTHORIZED,
            message: None,
        }
    }
}

impl IntoResponse for Failure {
    fn into_response(self) -> Response {
        match self.message {
            Some(message) => (self.status, Json(json!({ "message": message }))).into_response(),
            None => (self.status, Json(json!({ "detail": "Not authenticated" }))).into_response(),
        }
    }
}

type Reply<T> = Result<T, Failure>;

fn now() -> String {
    chrono::Utc::now().to_rfc3339()
}

fn authenticate(store: &Store, headers: &HeaderMap) -> Reply<i64> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .and_then(|token| store.tokens.get(token).copied())
        .ok_or_else(Failure::unauthorized)
}

pub fn app() -> Router {
    let db: Db = Arc::new(RwLock::new(Store::default()));
    Router::new()
        .route("/api/v1/auth/register", post(register))
        .route("/api/v1/auth/login", post(login))
        .route("/api/v1/auth/me", get(me))
        .route("/api/v1/plans", get(list_plans).post(create_plan))
        .route("/api/v1/plans/owned", get(owned_plans))
        .route("/api/v1/plans/shared", get(shared_plans))
        .route("/api/v1/plans/notifications", get(list_notifications))
        .route("/api/v1/plans/notifications/{id}/read", put(mark_read))
        .route("/api/v1/plans/{id}", get(get_plan).put(update_plan).delete(delete_plan))
        .route("/api/v1/plans/{id}/executive-summary", get(executive_summary))
        .route("/api/v1/plans/{id}/users", get(plan_users))
        .route("/api/v1/plans/{id}/users/{user_id}", axum::routing::delete(remove_user))
        .route("/api/v1/plans/{id}/invite", post(invite))
        .route("/api/v1/plans/{id}/invitations/{invitation}/accept", post(accept_invitation))
        .route("/api/v1/plans/{id}/invitations/{invitation}/reject", post(reject_invitation))
        .route("/api/v1/plans/{id}/{section}", get(get_section).put(put_section))
        .with_state(db)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    axum::serve(listener, app()).await
}

// --- auth ---

async fn register(State(db): State<Db>, Json(input): Json<Register>) -> Reply<(StatusCode, Json<User>)> {
    let mut store = db.write().await;
    let taken = store
        .users
        .values()
        .any(|(u, _)| u.username == input.username || u.email == input.email);
    if taken {
        return Err(Failure::message(StatusCode::BAD_REQUEST, "El usuario ya existe"));
    }
    let user = User {
        id: store.id(),
        username: input.username,
        email: input.email,
        full_name: input.full_name,
    };
    store.users.insert(user.id, (user.clone(), input.password));
    Ok((StatusCode::CREATED, Json(user)))
}

async fn login(State(db): State<Db>, Form(form): Form<LoginForm>) -> Reply<Json<Value>> {
    let mut store = db.write().await;
    let user_id = store
        .users
        .values()
        .find(|(u, password)| u.username == form.username && *password == form.password)
        .map(|(u, _)| u.id)
        .ok_or_else(|| Failure::message(StatusCode::UNAUTHORIZED, "Credenciales incorrectas"))?;
    let token = Uuid::new_v4().to_string();
    store.tokens.insert(token.clone(), user_id);
    Ok(Json(json!({ "access_token": token, "token_type": "bearer" })))
}

async fn me(State(db): State<Db>, headers: HeaderMap) -> Reply<Json<User>> {
    let store = db.read().await;
    let id = authenticate(&store, &headers)?;
    store
        .users
        .get(&id)
        .map(|(u, _)| Json(u.clone()))
        .ok_or_else(Failure::unauthorized)
}

// --- plans ---

async fn list_plans(State(db): State<Db>, headers: HeaderMap) -> Reply<Json<Vec<Plan>>> {
    let store = db.read().await;
    let me = authenticate(&store, &headers)?;
    Ok(Json(
        store.plans.values().filter(|p| store.can_read(p, me)).cloned().collect(),
    ))
}

async fn owned_plans(State(db): State<Db>, headers: HeaderMap) -> Reply<Json<Vec<Plan>>> {
    let store = db.read().await;
    let me = authenticate(&store, &headers)?;
    Ok(Json(store.plans.values().filter(|p| p.owner_id == me).cloned().collect()))
}

async fn shared_plans(State(db): State<Db>, headers: HeaderMap) -> Reply<Json<Vec<Plan>>> {
    let store = db.read().await;
    let me = authenticate(&store, &headers)?;
    Ok(Json(
        store.plans.values().filter(|p| store.is_member(p.id, me)).cloned().collect(),
    ))
}

async fn create_plan(
    State(db): State<Db>,
    headers: HeaderMap,
    Json(input): Json<CreatePlan>,
) -> Reply<(StatusCode, Json<Plan>)> {
    let mut store = db.write().await;
    let me = authenticate(&store, &headers)?;
    if input.name.trim().is_empty() {
        return Err(Failure::message(StatusCode::BAD_REQUEST, "El nombre del plan es obligatorio"));
    }
    let plan = Plan {
        id: store.id(),
        name: input.name,
        description: input.description,
        owner_id: me,
    };
    store.plans.insert(plan.id, plan.clone());
    Ok((StatusCode::CREATED, Json(plan)))
}

async fn get_plan(State(db): State<Db>, headers: HeaderMap, Path(id): Path<i64>) -> Reply<Json<Plan>> {
    let store = db.read().await;
    let me = authenticate(&store, &headers)?;
    Ok(Json(store.readable_plan(id, me)?.clone()))
}

async fn update_plan(
    State(db): State<Db>,
    headers: HeaderMap,
    Path(id): Path<i64>,
    Json(input): Json<UpdatePlan>,
) -> Reply<Json<Plan>> {
    let mut store = db.write().await;
    let me = authenticate(&store, &headers)?;
    store.owned_plan(id, me)?;
    let plan = store
        .plans
        .get_mut(&id)
        .ok_or_else(|| Failure::message(StatusCode::NOT_FOUND, "Plan no encontrado"))?;
    if let Some(name) = input.name {
        plan.name = name;
    }
    if let Some(description) = input.description {
        plan.description = Some(description);
    }
    Ok(Json(plan.clone()))
}

async fn delete_plan(State(db): State<Db>, headers: HeaderMap, Path(id): Path<i64>) -> Reply<Json<Value>> {
    let mut store = db.write().await;
    let me = authenticate(&store, &headers)?;
    store.owned_plan(id, me)?;
    store.plans.remove(&id);
    store.members.remove(&id);
    store.sections.retain(|(plan, _), _| *plan != id);
    store.invitations.retain(|_, inv| inv.plan_id != id);
    Ok(Json(json!({ "message": "Plan eliminado" })))
}

// --- sections ---

async fn get_section(
    State(db): State<Db>,
    headers: HeaderMap,
    Path((id, slug)): Path<(i64, String)>,
) -> Reply<Json<Value>> {
    let store = db.read().await;
    let me = authenticate(&store, &headers)?;
    let section = full_section(&slug)
        .ok_or_else(|| Failure::message(StatusCode::NOT_FOUND, "Sección desconocida"))?;
    store.readable_plan(id, me)?;
    Ok(Json(store.sections.get(&(id, section)).cloned().unwrap_or_else(|| json!({}))))
}

async fn put_section(
    State(db): State<Db>,
    headers: HeaderMap,
    Path((id, slug)): Path<(i64, String)>,
    Json(data): Json<Value>,
) -> Reply<Json<Value>> {
    let mut store = db.write().await;
    let me = authenticate(&store, &headers)?;
    let section = full_section(&slug)
        .or_else(|| quick_section(&slug))
        .ok_or_else(|| Failure::message(StatusCode::NOT_FOUND, "Sección desconocida"))?;
    store.readable_plan(id, me)?;
    store.sections.insert((id, section), data.clone());
    Ok(Json(data))
}

async fn executive_summary(
    State(db): State<Db>,
    headers: HeaderMap,
    Path(id): Path<i64>,
) -> Reply<Json<Value>> {
    let store = db.read().await;
    let me = authenticate(&store, &headers)?;
    let plan = store.readable_plan(id, me)?;
    let mut summary = serde_json::Map::new();
    summary.insert("plan".to_string(), json!(plan));
    for section in SECTIONS {
        let value = store.sections.get(&(id, section)).cloned().unwrap_or(Value::Null);
        summary.insert(section.replace('-', "_"), value);
    }
    Ok(Json(Value::Object(summary)))
}

// --- members & invitations ---

async fn plan_users(State(db): State<Db>, headers: HeaderMap, Path(id): Path<i64>) -> Reply<Json<Vec<Member>>> {
    let store = db.read().await;
    let me = authenticate(&store, &headers)?;
    let plan = store.readable_plan(id, me)?;
    let collaborators = store.members.get(&id).cloned().unwrap_or_default();
    let members = std::iter::once((plan.owner_id, "owner"))
        .chain(collaborators.into_iter().map(|u| (u, "collaborator")))
        .filter_map(|(user_id, role)| {
            store.users.get(&user_id).map(|(u, _)| Member {
                user_id,
                username: u.username.clone(),
                email: u.email.clone(),
                role: role.to_string(),
            })
        })
        .collect();
    Ok(Json(members))
}

async fn remove_user(
    State(db): State<Db>,
    headers: HeaderMap,
    Path((id, user_id)): Path<(i64, i64)>,
) -> Reply<Json<Value>> {
    let mut store = db.write().await;
    let me = authenticate(&store, &headers)?;
    store.owned_plan(id, me)?;
    let members = store.members.entry(id).or_default();
    let before = members.len();
    members.retain(|u| *u != user_id);
    if members.len() == before {
        return Err(Failure::message(StatusCode::NOT_FOUND, "El usuario no es miembro del plan"));
    }
    Ok(Json(json!({ "message": "Usuario eliminado del plan" })))
}

async fn invite(
    State(db): State<Db>,
    headers: HeaderMap,
    Path(id): Path<i64>,
    Json(body): Json<InviteBody>,
) -> Reply<Json<Value>> {
    let mut store = db.write().await;
    let me = authenticate(&store, &headers)?;
    let plan_name = store.owned_plan(id, me)?.name.clone();
    let invitee = store
        .users
        .values()
        .find(|(u, _)| u.email == body.email)
        .map(|(u, _)| u.id)
        .ok_or_else(|| Failure::message(StatusCode::NOT_FOUND, "Usuario no encontrado"))?;
    if invitee == me || store.is_member(id, invitee) {
        return Err(Failure::message(StatusCode::BAD_REQUEST, "El usuario ya es miembro del plan"));
    }

    let invitation_id = store.id();
    let notification_id = store.id();
    store.notifications.insert(
        notification_id,
        Notification {
            id: notification_id,
            user_id: invitee,
            kind: "invitation".to_string(),
            message: format!("Has sido invitado al plan {plan_name}"),
            related_plan_id: Some(id),
            invitation_id: Some(invitation_id),
            status: "pending".to_string(),
            created_at: now(),
            updated_at: None,
        },
    );
    store.invitations.insert(
        invitation_id,
        Invitation {
            plan_id: id,
            user_id: invitee,
            notification_id,
            status: "pending".to_string(),
        },
    );
    Ok(Json(json!({ "message": "Invitación enviada", "invitation_id": invitation_id })))
}

async fn accept_invitation(
    State(db): State<Db>,
    headers: HeaderMap,
    Path((id, invitation)): Path<(i64, i64)>,
) -> Reply<Json<Value>> {
    resolve_invitation(db, headers, id, invitation, "accepted").await
}

async fn reject_invitation(
    State(db): State<Db>,
    headers: HeaderMap,
    Path((id, invitation)): Path<(i64, i64)>,
) -> Reply<Json<Value>> {
    resolve_invitation(db, headers, id, invitation, "rejected").await
}

async fn resolve_invitation(
    db: Db,
    headers: HeaderMap,
    plan_id: i64,
    invitation_id: i64,
    outcome: &str,
) -> Reply<Json<Value>> {
    let mut store = db.write().await;
    let me = authenticate(&store, &headers)?;
    let invitation = store
        .invitations
        .get(&invitation_id)
        .filter(|inv| inv.plan_id == plan_id)
        .cloned()
        .ok_or_else(|| Failure::message(StatusCode::NOT_FOUND, "Invitación no encontrada"))?;
    if invitation.user_id != me {
        return Err(Failure::message(StatusCode::FORBIDDEN, "La invitación no es tuya"));
    }
    if invitation.status != "pending" {
        return Err(Failure::message(StatusCode::BAD_REQUEST, "La invitación ya fue respondida"));
    }

    if outcome == "accepted" {
        store.members.entry(plan_id).or_default().push(me);
    }
    if let Some(inv) = store.invitations.get_mut(&invitation_id) {
        inv.status = outcome.to_string();
    }
    if let Some(n) = store.notifications.get_mut(&invitation.notification_id) {
        n.status = outcome.to_string();
        n.updated_at = Some(now());
    }
    Ok(Json(json!({ "message": format!("Invitación {outcome}"), "status": outcome })))
}

// --- notifications ---

async fn list_notifications(State(db): State<Db>, headers: HeaderMap) -> Reply<Json<Vec<Notification>>> {
    let store = db.read().await;
    let me = authenticate(&store, &headers)?;
    Ok(Json(
        store.notifications.values().filter(|n| n.user_id == me).cloned().collect(),
    ))
}

async fn mark_read(
    State(db): State<Db>,
    headers: HeaderMap,
    Path(id): Path<i64>,
) -> Reply<Json<Notification>> {
    let mut store = db.write().await;
    let me = authenticate(&store, &headers)?;
    let notification = store
        .notifications
        .get_mut(&id)
        .filter(|n| n.user_id == me)
        .ok_or_else(|| Failure::message(StatusCode::NOT_FOUND, "Notificación no encontrada"))?;
    notification.status = "read".to_string();
    notification.updated_at = Some(now());
    Ok(Json(notification.clone()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn notification_serializes_wire_keys() {
        let n = Notification {
            id: 1,
            user_id: 5,
            kind: "x".to_string(),
            message: "m".to_string(),
            related_plan_id: Some(9),
            invitation_id: Some(2),
            status: "pending".to_string(),
            created_at: "t1".to_string(),
            updated_at: Some("t2".to_string()),
        };
        let json = serde_json::to_value(&n).unwrap();
        assert_eq!(json["type"], "x");
        assert_eq!(json["related_plan_id"], 9);
        assert!(json.get("kind").is_none());
    }

    #[test]
    fn quick_sections_land_in_full_sections() {
        assert_eq!(quick_section("swot"), Some("strategic-analysis"));
        assert_eq!(quick_section("strategies-simple"), Some("strategies"));
        assert_eq!(quick_section("strategies"), None);
        assert_eq!(full_section("strategies"), Some("strategies"));
    }

    #[test]
    fn ids_are_monotonic() {
        let mut store = Store::default();
        let a = store.id();
        let b = store.id();
        assert!(b > a);
    }

    #[test]
    fn failure_without_message_uses_detail() {
        let resp = Failure::unauthorized().into_response();
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    }
}
