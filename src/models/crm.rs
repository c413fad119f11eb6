// src/models/crm.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use utoipa::ToSchema;

// --- ENUMS ---

// Status comercial do lead. `Converted` é terminal e gravado uma única vez.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum LeadStatus {
    New,
    Contacted,
    Converted,
    Won,
    Lost,
}

// Estágio do funil de vendas. O status derivado de cada estágio fica em
// `FunnelStage::derived_status`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum FunnelStage {
    Cold,
    Warm,
    Hot,
    Won,
    Lost,
}

impl FunnelStage {
    // won -> won, lost -> lost, qualquer outro -> contacted.
    pub fn derived_status(&self) -> LeadStatus {
        match self {
            FunnelStage::Won => LeadStatus::Won,
            FunnelStage::Lost => LeadStatus::Lost,
            _ => LeadStatus::Contacted,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum FollowUpType {
    Email,
    Sms,
    Call,
    Meeting,
    Whatsapp,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum FollowUpStatus {
    Sent,
    Scheduled,
    Delivered,
    Failed,
}

// --- LEAD (o prospecto) ---

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Lead {
    pub id: Uuid,
    pub branch_id: Uuid,

    pub name: String,
    pub email: Option<String>,
    pub phone: Option<String>,

    pub status: LeadStatus,
    pub funnel_stage: FunnelStage,

    pub notes: Option<String>,

    pub follow_up_date: Option<DateTime<Utc>>,
    pub last_contact_date: Option<DateTime<Utc>>,

    // Preenchidos uma única vez, na conversão.
    pub conversion_date: Option<DateTime<Utc>>,
    pub conversion_value: Option<Uuid>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// --- FOLLOW-UP (trilha de contato, append-only) ---

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct FollowUpRecord {
    pub id: Uuid,
    pub lead_id: Uuid,

    pub follow_up_type: FollowUpType,
    pub content: String,

    pub sent_by: String,
    pub sent_at: DateTime<Utc>,

    pub status: FollowUpStatus,
    pub response: Option<String>,
}

// Dados para agendar um novo follow-up (entrada do serviço, não da API).
#[derive(Debug, Clone)]
pub struct NewFollowUp {
    pub follow_up_type: FollowUpType,
    pub content: String,
    pub sent_by: String,
    pub due_date: Option<DateTime<Utc>>,
}
