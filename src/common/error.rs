use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

// Nosso tipo de erro, com `thiserror` para melhor ergonomia.
//
// Importante: negação de autorização NÃO é um erro dentro do motor de
// permissões (lá ela é só um `false`). `Forbidden` existe apenas para a
// borda HTTP, quando o guard traduz o `false` em resposta 403.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Erro de validação")]
    ValidationError(#[from] validator::ValidationErrors),

    #[error("E-mail já existe")]
    EmailAlreadyExists,

    #[error("Credenciais inválidas")]
    InvalidCredentials,

    #[error("Token inválido")]
    InvalidToken,

    #[error("Usuário não encontrado")]
    UserNotFound,

    #[error("Permissão negada: {0}")]
    Forbidden(String),

    #[error("Cabeçalho x-branch-id ausente ou inválido")]
    InvalidBranchHeader,

    // --- Falhas "duras" da conversão de lead (etapas 1 a 3) ---
    #[error("Lead não encontrado")]
    LeadNotFound,

    #[error("Falha ao criar a conta do novo membro")]
    AccountCreationFailed,

    #[error("Falha ao gravar o perfil do novo membro")]
    ProfileUpdateFailed,

    // Linha vinda do serviço remoto não bateu com o DTO esperado
    #[error("Linha remota em formato inesperado")]
    RowDecode(#[from] serde_json::Error),

    // Variante para erros de banco de dados (sqlx)
    #[error("Erro de banco de dados")]
    DatabaseError(#[from] sqlx::Error),

    // Variante genérica para qualquer outro erro inesperado
    #[error("Erro interno do servidor")]
    InternalServerError(#[from] anyhow::Error),

    #[error("Erro de Bcrypt: {0}")]
    BcryptError(#[from] bcrypt::BcryptError),

    #[error("Erro de JWT: {0}")]
    JwtError(#[from] jsonwebtoken::errors::Error),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            // Retorna todos os detalhes da validação.
            AppError::ValidationError(errors) => {
                let mut details = std::collections::HashMap::new();
                for (field, field_errors) in errors.field_errors() {
                    let messages: Vec<String> = field_errors
                        .iter()
                        .filter_map(|e| e.message.as_ref().map(|m| m.to_string()))
                        .collect();
                    details.insert(field.to_string(), messages);
                }
                let body = Json(json!({
                    "error": "Um ou mais campos são inválidos.",
                    "details": details,
                }));
                return (StatusCode::BAD_REQUEST, body).into_response();
            }
            AppError::EmailAlreadyExists => {
                (StatusCode::CONFLICT, "Este e-mail já está em uso.".to_string())
            }
            AppError::InvalidCredentials => {
                (StatusCode::UNAUTHORIZED, "E-mail ou senha inválidos.".to_string())
            }
            AppError::InvalidToken => (
                StatusCode::UNAUTHORIZED,
                "Token de autenticação inválido ou ausente.".to_string(),
            ),
            AppError::UserNotFound => {
                (StatusCode::NOT_FOUND, "Usuário não encontrado.".to_string())
            }
            AppError::Forbidden(perm) => (
                StatusCode::FORBIDDEN,
                format!("Você precisa da permissão '{}' para realizar esta ação.", perm),
            ),
            AppError::InvalidBranchHeader => (
                StatusCode::BAD_REQUEST,
                "O cabeçalho x-branch-id é obrigatório e deve ser um UUID.".to_string(),
            ),
            AppError::LeadNotFound => {
                (StatusCode::NOT_FOUND, "Lead não encontrado.".to_string())
            }
            AppError::AccountCreationFailed => (
                StatusCode::BAD_GATEWAY,
                "Não foi possível criar a conta do membro.".to_string(),
            ),
            AppError::ProfileUpdateFailed => (
                StatusCode::BAD_GATEWAY,
                "Não foi possível gravar o perfil do membro.".to_string(),
            ),

            // Todos os outros (DatabaseError, RowDecode, InternalServerError...)
            // viram 500. O `tracing` loga a mensagem detalhada do `thiserror`.
            ref e => {
                tracing::error!("Erro Interno do Servidor: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Ocorreu um erro inesperado.".to_string(),
                )
            }
        };

        // Resposta padrão para erros simples que só têm uma mensagem.
        let body = Json(json!({ "error": error_message }));
        (status, body).into_response()
    }
}
