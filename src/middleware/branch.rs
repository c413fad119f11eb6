// src/middleware/branch.rs
//
// Partição de tenant do produto: toda consulta é escopada por filial.
// O frontend indica a filial ativa pelo cabeçalho x-branch-id.

use axum::{extract::FromRequestParts, http::request::Parts};
use uuid::Uuid;

use crate::common::error::AppError;

const BRANCH_ID_HEADER: &str = "x-branch-id";

#[derive(Debug, Clone)]
pub struct BranchContext(pub Uuid);

impl<S> FromRequestParts<S> for BranchContext
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let value = parts
            .headers
            .get(BRANCH_ID_HEADER)
            .and_then(|v| v.to_str().ok())
            .ok_or(AppError::InvalidBranchHeader)?;

        let branch_id = Uuid::parse_str(value).map_err(|_| AppError::InvalidBranchHeader)?;
        Ok(BranchContext(branch_id))
    }
}
