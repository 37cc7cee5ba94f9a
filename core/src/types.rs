//! Domain DTOs for the planning API.
//!
//! # Design
//! These types mirror the backend's snake_case schema but are defined
//! independently from the mock-server crate; integration tests catch any
//! schema drift. Plan sections are free-form documents edited by the UI,
//! so they travel as `serde_json::Value`.
//!
//! Notifications are the one place where the wire shape and the client
//! shape differ: [`NotificationRecord`] is what the server sends and
//! [`Notification`] is what callers get back.

use serde::{Deserialize, Serialize};

pub type PlanId = i64;
pub type UserId = i64;
pub type InvitationId = i64;
pub type NotificationId = i64;

/// Payload for `POST /api/v1/auth/register`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub password: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub full_name: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct User {
    pub id: UserId,
    pub username: String,
    pub email: String,
    #[serde(default)]
    pub full_name: Option<String>,
}

/// Login credentials. Sent form-encoded, never as JSON.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Token {
    pub access_token: String,
    #[serde(default = "bearer")]
    pub token_type: String,
}

fn bearer() -> String {
    "bearer".to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Plan {
    pub id: PlanId,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub owner_id: UserId,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct NewPlan {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Partial update; omitted fields stay unchanged on the server.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct PlanUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PlanMember {
    pub user_id: UserId,
    pub username: String,
    pub email: String,
    pub role: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Invite {
    pub email: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct MessageResponse {
    pub message: String,
}

/// Full plan sections, readable and writable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Section {
    CompanyIdentity,
    StrategicAnalysis,
    AnalysisTools,
    Strategies,
}

impl Section {
    pub const ALL: [Section; 4] = [
        Section::CompanyIdentity,
        Section::StrategicAnalysis,
        Section::AnalysisTools,
        Section::Strategies,
    ];

    pub fn slug(self) -> &'static str {
        match self {
            Section::CompanyIdentity => "company-identity",
            Section::StrategicAnalysis => "strategic-analysis",
            Section::AnalysisTools => "analysis-tools",
            Section::Strategies => "strategies",
        }
    }
}

/// Simplified, write-only views of the same sections.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum QuickSection {
    Identity,
    Swot,
    Tools,
    Strategies,
}

impl QuickSection {
    pub fn slug(self) -> &'static str {
        match self {
            QuickSection::Identity => "identity",
            QuickSection::Swot => "swot",
            QuickSection::Tools => "tools",
            QuickSection::Strategies => "strategies-simple",
        }
    }
}

/// A notification as the server sends it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct NotificationRecord {
    pub id: NotificationId,
    pub user_id: UserId,
    #[serde(rename = "type")]
    pub kind: String,
    pub message: String,
    #[serde(default)]
    pub related_plan_id: Option<PlanId>,
    #[serde(default)]
    pub invitation_id: Option<InvitationId>,
    pub status: String,
    pub created_at: String,
    #[serde(default)]
    pub updated_at: Option<String>,
}

/// A notification as handed to callers.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    pub id: NotificationId,
    pub user_id: UserId,
    #[serde(rename = "type")]
    pub kind: String,
    pub message: String,
    pub plan_id: Option<PlanId>,
    pub invitation_id: Option<InvitationId>,
    pub status: String,
    pub created_at: String,
    pub updated_at: Option<String>,
}

impl From<NotificationRecord> for Notification {
    fn from(record: NotificationRecord) -> Self {
        Self {
            id: record.id,
            user_id: record.user_id,
            kind: record.kind,
            message: record.message,
            plan_id: record.related_plan_id,
            invitation_id: record.invitation_id,
            status: record.status,
            created_at: record.created_at,
            updated_at: record.updated_at,
        }
    }
}
