// src/middleware/authz.rs
//
// A ponte entre o HTTP e o motor de permissões: um guard de rota (por
// prefixo) e um extractor-guardião por permissão. Aqui o `false` do motor
// vira 403; dentro do motor negação nunca é erro.

use axum::{
    body::Body,
    extract::{FromRef, FromRequestParts, OriginalUri, State},
    http::{request::Parts, Request},
    middleware::Next,
    response::Response,
};
use std::marker::PhantomData;

use crate::{
    common::error::AppError,
    config::AppState,
    models::{auth::User, authz::Permission},
};

// Guard por rota: consulta a tabela de prefixos da política.
// Precisa rodar DEPOIS do auth_guard (depende do User nos extensions).
pub async fn route_guard(
    State(app_state): State<AppState>,
    request: Request<Body>,
    next: Next,
) -> Result<Response, AppError> {
    let user = request
        .extensions()
        .get::<User>()
        .ok_or(AppError::InvalidToken)?;

    // Dentro de um `nest` o axum entrega o caminho sem o prefixo; a
    // tabela da política é escrita contra o caminho completo.
    let path = request
        .extensions()
        .get::<OriginalUri>()
        .map(|uri| uri.0.path().to_owned())
        .unwrap_or_else(|| request.uri().path().to_owned());

    if !app_state.policy.has_route_access(Some(user.role), &path) {
        return Err(AppError::Forbidden(format!("acesso à rota {}", path)));
    }

    Ok(next.run(request).await)
}

/// O Trait que define o que é uma Permissão exigida por um endpoint
pub trait PermissionDef: Send + Sync + 'static {
    fn required() -> Permission;
}

/// O Extractor (Guardião)
pub struct RequirePermission<T>(pub PhantomData<T>);

impl<T, S> FromRequestParts<S> for RequirePermission<T>
where
    T: PermissionDef,
    S: Send + Sync,
    AppState: FromRef<S>,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let app_state = AppState::from_ref(state);

        let user = parts
            .extensions
            .get::<User>()
            .ok_or(AppError::InvalidToken)?;

        let required = T::required();

        // is_owner = false aqui: endpoints com escopo de posse fazem a
        // checagem no handler, onde o recurso alvo é conhecido.
        if !app_state.policy.has_permission(Some(user.role), required, false) {
            return Err(AppError::Forbidden(required.slug().to_string()));
        }

        Ok(RequirePermission(PhantomData))
    }
}

// ---
// DEFINIÇÃO DAS PERMISSÕES (TIPOS)
// ---

pub struct PermManageLeads;
impl PermissionDef for PermManageLeads {
    fn required() -> Permission {
        Permission::ManageLeads
    }
}

pub struct PermConvertLeads;
impl PermissionDef for PermConvertLeads {
    fn required() -> Permission {
        Permission::ConvertLeads
    }
}

pub struct PermManageMembers;
impl PermissionDef for PermManageMembers {
    fn required() -> Permission {
        Permission::ManageMembers
    }
}

pub struct PermViewMemberProfiles;
impl PermissionDef for PermViewMemberProfiles {
    fn required() -> Permission {
        Permission::ViewMemberProfiles
    }
}
