// src/handlers/members.rs

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    config::AppState,
    middleware::{
        auth::AuthenticatedUser,
        authz::{PermViewMemberProfiles, RequirePermission},
        branch::BranchContext,
    },
    models::{authz::Permission, members::Member},
};

// GET /api/members
#[utoipa::path(
    get,
    path = "/api/members",
    tag = "Members",
    responses(
        (status = 200, description = "Membros da filial", body = Vec<Member>),
        (status = 403, description = "Permissão negada")
    ),
    params(
        ("x-branch-id" = Uuid, Header, description = "ID da filial")
    ),
    security(("api_jwt" = []))
)]
pub async fn list_members(
    State(app_state): State<AppState>,
    branch: BranchContext,
    // O guard avalia com is_owner = false: um ator `member` nunca lista
    // a filial inteira, só enxerga o próprio perfil (rota abaixo).
    _perm: RequirePermission<PermViewMemberProfiles>,
) -> Result<impl IntoResponse, AppError> {
    let members = app_state.crm_service.list_members(branch.0).await?;
    Ok((StatusCode::OK, Json(members)))
}

// GET /api/members/{id}
#[utoipa::path(
    get,
    path = "/api/members/{id}",
    tag = "Members",
    responses(
        (status = 200, description = "Perfil do membro", body = Member),
        (status = 403, description = "Permissão negada"),
        (status = 404, description = "Membro não encontrado")
    ),
    params(
        ("id" = Uuid, Path, description = "ID do membro"),
        ("x-branch-id" = Uuid, Header, description = "ID da filial")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_member(
    State(app_state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    _branch: BranchContext,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    // Checagem com posse: aqui o recurso alvo é conhecido, então um ator
    // `member` passa quando (e só quando) o perfil é o dele.
    let is_owner = user.id == id;
    if !app_state
        .policy
        .has_permission(Some(user.role), Permission::ViewMemberProfiles, is_owner)
    {
        return Err(AppError::Forbidden(
            Permission::ViewMemberProfiles.slug().to_string(),
        ));
    }

    let member = app_state
        .crm_service
        .find_member(id)
        .await?
        .ok_or(AppError::UserNotFound)?;

    Ok((StatusCode::OK, Json(member)))
}
