// src/models/members.rs

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;
use utoipa::ToSchema;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum MembershipStatus {
    Active,
    Expired,
    Frozen,
    Cancelled,
}

// --- MEMBRO ---

// O artefato final de uma conversão bem-sucedida.
// `id` É o id da conta criada (users.id) — nunca um id próprio.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Member {
    pub id: Uuid,
    pub branch_id: Uuid,

    // Vínculo unidirecional e irreversível com o lead de origem.
    pub lead_id: Option<Uuid>,

    pub full_name: String,
    pub email: String,
    pub phone: Option<String>,

    pub membership_plan_id: Option<Uuid>,
    pub membership_start: Option<NaiveDate>,
    pub membership_end: Option<NaiveDate>,
    pub membership_status: MembershipStatus,

    // Endereço flexível, gravado como JSONB.
    pub address: Option<Value>,
    pub emergency_contact: Option<String>,

    pub notes: Option<String>,
    pub status: String,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// Dados fornecidos pelo operador na hora de converter um lead.
// Telefone e observações caem para os valores do lead quando ausentes.
#[derive(Debug, Clone)]
pub struct NewMemberData {
    pub full_name: String,
    pub email: String,
    pub password: Option<String>,
    pub phone: Option<String>,

    pub membership_plan_id: Option<Uuid>,
    pub membership_start: Option<NaiveDate>,
    pub membership_end: Option<NaiveDate>,
    pub membership_status: Option<MembershipStatus>,

    pub address: Option<Value>,
    pub emergency_contact: Option<String>,
    pub notes: Option<String>,
}
