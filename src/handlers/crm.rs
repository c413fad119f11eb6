// src/handlers/crm.rs

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use chrono::{DateTime, NaiveDate, Utc};
use serde::Deserialize;
use serde_json::Value;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::{
    common::error::AppError,
    config::AppState,
    middleware::{
        auth::AuthenticatedUser,
        authz::{PermConvertLeads, PermManageLeads, RequirePermission},
        branch::BranchContext,
    },
    models::{
        crm::{FollowUpRecord, FollowUpType, FunnelStage, Lead, NewFollowUp},
        members::{Member, MembershipStatus, NewMemberData},
    },
};

// =============================================================================
//  ÁREA 1: LEADS
// =============================================================================

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateLeadPayload {
    #[validate(length(min = 2, message = "O nome deve ter no mínimo 2 caracteres"))]
    #[schema(example = "João Pereira")]
    pub name: String,

    #[validate(email(message = "invalid_email"))]
    #[schema(example = "joao@email.com")]
    pub email: Option<String>,

    #[schema(example = "+55 11 91234-5678")]
    pub phone: Option<String>,

    pub notes: Option<String>,
}

// POST /api/crm/leads
#[utoipa::path(
    post,
    path = "/api/crm/leads",
    tag = "CRM",
    request_body = CreateLeadPayload,
    responses(
        (status = 201, description = "Lead criado", body = Lead),
        (status = 400, description = "Dados inválidos")
    ),
    params(
        ("x-branch-id" = Uuid, Header, description = "ID da filial")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_lead(
    State(app_state): State<AppState>,
    branch: BranchContext,
    _perm: RequirePermission<PermManageLeads>,
    Json(payload): Json<CreateLeadPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let lead = app_state
        .crm_service
        .create_lead(
            branch.0,
            &payload.name,
            payload.email.as_deref(),
            payload.phone.as_deref(),
            payload.notes.as_deref(),
        )
        .await?;

    Ok((StatusCode::CREATED, Json(lead)))
}

// GET /api/crm/leads
#[utoipa::path(
    get,
    path = "/api/crm/leads",
    tag = "CRM",
    responses(
        (status = 200, description = "Leads da filial", body = Vec<Lead>)
    ),
    params(
        ("x-branch-id" = Uuid, Header, description = "ID da filial")
    ),
    security(("api_jwt" = []))
)]
pub async fn list_leads(
    State(app_state): State<AppState>,
    branch: BranchContext,
    _perm: RequirePermission<PermManageLeads>,
) -> Result<impl IntoResponse, AppError> {
    let leads = app_state.crm_service.list_leads(branch.0).await?;
    Ok((StatusCode::OK, Json(leads)))
}

// =============================================================================
//  ÁREA 2: CONVERSÃO
// =============================================================================

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ConvertLeadPayload {
    #[validate(length(min = 2, message = "O nome deve ter no mínimo 2 caracteres"))]
    #[schema(example = "João Pereira")]
    pub full_name: String,

    #[validate(email(message = "invalid_email"))]
    #[schema(example = "joao@email.com")]
    pub email: String,

    // Ausente: uma senha aleatória é gerada para a conta nova.
    #[validate(length(min = 8, message = "A senha deve ter no mínimo 8 caracteres"))]
    pub password: Option<String>,

    // Ausente: cai para o telefone do lead.
    pub phone: Option<String>,

    pub membership_plan_id: Option<Uuid>,

    #[schema(value_type = Option<String>, format = Date, example = "2026-09-01")]
    pub membership_start: Option<NaiveDate>,
    #[schema(value_type = Option<String>, format = Date, example = "2027-08-31")]
    pub membership_end: Option<NaiveDate>,

    pub membership_status: Option<MembershipStatus>,

    pub address: Option<Value>,
    pub emergency_contact: Option<String>,

    // Ausente: cai para as observações do lead.
    pub notes: Option<String>,
}

// POST /api/crm/leads/{id}/convert
#[utoipa::path(
    post,
    path = "/api/crm/leads/{id}/convert",
    tag = "CRM",
    request_body = ConvertLeadPayload,
    responses(
        (status = 201, description = "Lead convertido em membro", body = Member),
        (status = 404, description = "Lead não encontrado"),
        (status = 502, description = "Falha ao criar conta ou gravar perfil")
    ),
    params(
        ("id" = Uuid, Path, description = "ID do lead"),
        ("x-branch-id" = Uuid, Header, description = "ID da filial")
    ),
    security(("api_jwt" = []))
)]
pub async fn convert_lead(
    State(app_state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    _branch: BranchContext,
    _perm: RequirePermission<PermConvertLeads>,
    Path(id): Path<Uuid>,
    Json(payload): Json<ConvertLeadPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let data = NewMemberData {
        full_name: payload.full_name,
        email: payload.email,
        password: payload.password,
        phone: payload.phone,
        membership_plan_id: payload.membership_plan_id,
        membership_start: payload.membership_start,
        membership_end: payload.membership_end,
        membership_status: payload.membership_status,
        address: payload.address,
        emergency_contact: payload.emergency_contact,
        notes: payload.notes,
    };

    let member = app_state
        .crm_service
        .convert_lead_to_member(id, data, &user.email)
        .await?;

    Ok((StatusCode::CREATED, Json(member)))
}

// =============================================================================
//  ÁREA 3: FOLLOW-UPS E FUNIL
// =============================================================================

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleFollowUpPayload {
    #[schema(example = "whatsapp")]
    pub follow_up_type: FollowUpType,

    #[validate(length(min = 1, message = "required"))]
    #[schema(example = "Ligar para oferecer o plano anual")]
    pub content: String,

    pub due_date: Option<DateTime<Utc>>,
}

// POST /api/crm/leads/{id}/follow-ups
#[utoipa::path(
    post,
    path = "/api/crm/leads/{id}/follow-ups",
    tag = "CRM",
    request_body = ScheduleFollowUpPayload,
    responses(
        (status = 201, description = "Follow-up agendado", body = FollowUpRecord),
        (status = 404, description = "Lead não encontrado")
    ),
    params(
        ("id" = Uuid, Path, description = "ID do lead"),
        ("x-branch-id" = Uuid, Header, description = "ID da filial")
    ),
    security(("api_jwt" = []))
)]
pub async fn schedule_follow_up(
    State(app_state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    _branch: BranchContext,
    _perm: RequirePermission<PermManageLeads>,
    Path(id): Path<Uuid>,
    Json(payload): Json<ScheduleFollowUpPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let record = app_state
        .crm_service
        .schedule_follow_up(
            id,
            NewFollowUp {
                follow_up_type: payload.follow_up_type,
                content: payload.content,
                sent_by: user.email,
                due_date: payload.due_date,
            },
        )
        .await?;

    Ok((StatusCode::CREATED, Json(record)))
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateStagePayload {
    #[schema(example = "hot")]
    pub stage: FunnelStage,
    pub notes: Option<String>,
}

// PATCH /api/crm/leads/{id}/stage
#[utoipa::path(
    patch,
    path = "/api/crm/leads/{id}/stage",
    tag = "CRM",
    request_body = UpdateStagePayload,
    responses(
        (status = 200, description = "Estágio atualizado", body = Lead),
        (status = 404, description = "Lead não encontrado")
    ),
    params(
        ("id" = Uuid, Path, description = "ID do lead"),
        ("x-branch-id" = Uuid, Header, description = "ID da filial")
    ),
    security(("api_jwt" = []))
)]
pub async fn update_lead_stage(
    State(app_state): State<AppState>,
    _branch: BranchContext,
    _perm: RequirePermission<PermManageLeads>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateStagePayload>,
) -> Result<impl IntoResponse, AppError> {
    let lead = app_state
        .crm_service
        .update_lead_stage(id, payload.stage, payload.notes.as_deref())
        .await?;

    Ok((StatusCode::OK, Json(lead)))
}
