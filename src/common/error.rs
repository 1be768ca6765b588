use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

// Nosso tipo de erro, com `thiserror` para melhor ergonomia.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Erro de validação")]
    ValidationError(#[from] validator::ValidationErrors),

    #[error("{0} não encontrado(a)")]
    NotFound(&'static str),

    // Violação de unicidade (nome repetido, semana duplicada, etc.)
    #[error("Conflito: {0}")]
    Conflict(String),

    // Violação de CHECK no banco
    #[error("Restrição violada: {0}")]
    ConstraintViolation(String),

    #[error("Token inválido")]
    InvalidToken,

    #[error("Empresa ativa ausente ou inválida: {0}")]
    InvalidCompanyHeader(&'static str),

    #[error("Usuário não pertence à empresa")]
    NotAMember,

    #[error("Sem acesso à seção '{0}'")]
    SectionForbidden(&'static str),

    #[error("Operação restrita a administradores")]
    AdminRequired,

    // Qualquer falha na criação transacional do lote (já registrada no log)
    #[error("Falha ao criar o lote")]
    LoteCreationFailed,

    #[error("Erro de banco de dados")]
    DatabaseError(#[from] sqlx::Error),

    // Variante genérica para qualquer outro erro inesperado
    #[error("Erro interno do servidor")]
    InternalServerError(#[from] anyhow::Error),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            // Retorna todos os detalhes da validação, campo a campo.
            AppError::ValidationError(errors) => {
                let mut details = std::collections::HashMap::new();
                for (field, field_errors) in errors.field_errors() {
                    let messages: Vec<String> = field_errors
                        .iter()
                        .map(|e| {
                            e.message
                                .as_ref()
                                .map(|m| m.to_string())
                                .unwrap_or_else(|| e.code.to_string())
                        })
                        .collect();
                    details.insert(field.to_string(), messages);
                }
                let body = Json(json!({
                    "error": "Um ou mais campos são inválidos.",
                    "details": details,
                }));
                return (StatusCode::BAD_REQUEST, body).into_response();
            }
            AppError::NotFound(what) => (StatusCode::NOT_FOUND, format!("{} não encontrado(a).", what)),
            AppError::Conflict(msg) => (StatusCode::CONFLICT, msg),
            AppError::ConstraintViolation(constraint) => (
                StatusCode::BAD_REQUEST,
                format!("Os dados violam a restrição '{}'.", constraint),
            ),
            AppError::InvalidToken => (
                StatusCode::UNAUTHORIZED,
                "Token de autenticação inválido ou ausente.".to_string(),
            ),
            AppError::InvalidCompanyHeader(reason) => (StatusCode::BAD_REQUEST, reason.to_string()),
            AppError::NotAMember => (
                StatusCode::FORBIDDEN,
                "Você não tem acesso a esta empresa.".to_string(),
            ),
            AppError::SectionForbidden(code) => (
                StatusCode::FORBIDDEN,
                format!("Você precisa de acesso à seção '{}'.", code),
            ),
            AppError::AdminRequired => (
                StatusCode::FORBIDDEN,
                "Apenas administradores da empresa podem realizar esta ação.".to_string(),
            ),
            AppError::LoteCreationFailed => (
                StatusCode::SERVICE_UNAVAILABLE,
                "Não foi possível criar o lote. Tente novamente.".to_string(),
            ),

            // Todos os outros erros (DatabaseError, InternalServerError) viram 500.
            // O `tracing` loga a mensagem detalhada que `thiserror` nos deu.
            ref e => {
                tracing::error!("Erro Interno do Servidor: {:?}", e);
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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_codes() {
        let cases = [
            (AppError::NotFound("Lote"), StatusCode::NOT_FOUND),
            (AppError::Conflict("x".into()), StatusCode::CONFLICT),
            (AppError::ConstraintViolation("c".into()), StatusCode::BAD_REQUEST),
            (AppError::InvalidToken, StatusCode::UNAUTHORIZED),
            (AppError::NotAMember, StatusCode::FORBIDDEN),
            (AppError::SectionForbidden("compras"), StatusCode::FORBIDDEN),
            (AppError::LoteCreationFailed, StatusCode::SERVICE_UNAVAILABLE),
            (AppError::DatabaseError(sqlx::Error::RowNotFound), StatusCode::INTERNAL_SERVER_ERROR),
        ];
        for (err, status) in cases {
            assert_eq!(err.into_response().status(), status);
        }
    }

    #[test]
    fn validation_errors_are_bad_request() {
        let mut errors = validator::ValidationErrors::new();
        errors.add("subTradeId", validator::ValidationError::new("sub_trade_mismatch"));
        let response = AppError::ValidationError(errors).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
