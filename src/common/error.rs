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

    #[error("E-mail já existe")]
    EmailAlreadyExists,

    #[error("Credenciais inválidas")]
    InvalidCredentials,

    #[error("Token inválido")]
    InvalidToken,

    #[error("Usuário não encontrado")]
    UserNotFound,

    #[error("Produto não encontrado")]
    ProductNotFound,

    #[error("Variação não encontrada para o produto")]
    VariantNotFound,

    #[error("Cliente não encontrado")]
    CustomerNotFound,

    #[error("Relato de avaria não encontrado")]
    DamagedProductNotFound,

    #[error("Notificação não encontrada")]
    NotificationNotFound,

    #[error("Já existe um produto com o nome '{0}'")]
    ProductNameAlreadyExists(String),

    #[error("SKU já cadastrado")]
    SkuAlreadyExists,

    // Estoque insuficiente em uma baixa avulsa. Carrega os números para o
    // frontend exibir "disponível x solicitado".
    #[error("Estoque insuficiente: disponível {available}, solicitado {requested}")]
    InsufficientStock { available: i32, requested: i32 },

    // Estoque insuficiente dentro de uma compra: a resposta nomeia o primeiro
    // produto que falhou e a transação inteira sofre rollback.
    #[error("Estoque insuficiente para '{0}'")]
    NotEnoughStockFor(String),

    #[error("Este relato já foi reembolsado")]
    AlreadyRefunded,

    #[error("Não é possível excluir a última variação de um produto")]
    LastVariant,

    // Variante para erros de banco de dados (sqlx)
    #[error("Erro de banco de dados")]
    DatabaseError(#[from] sqlx::Error),

    // Variante genérica para qualquer outro erro inesperado.
    // `anyhow::Error` é ótimo para capturar o contexto do erro.
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
            // Retorna todos os detalhes da validação, campo a campo.
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
                return (StatusCode::UNPROCESSABLE_ENTITY, body).into_response();
            }

            // Baixa de estoque sem saldo: devolve os números junto da mensagem.
            AppError::InsufficientStock { available, requested } => {
                let body = Json(json!({
                    "error": "Estoque insuficiente.",
                    "available": available,
                    "requested": requested,
                }));
                return (StatusCode::BAD_REQUEST, body).into_response();
            }

            AppError::NotEnoughStockFor(ref name) => {
                let body = Json(json!({
                    "error": format!("Estoque insuficiente para '{}'.", name),
                }));
                return (StatusCode::UNPROCESSABLE_ENTITY, body).into_response();
            }

            AppError::EmailAlreadyExists => (StatusCode::CONFLICT, "Este e-mail já está em uso.".to_string()),
            AppError::InvalidCredentials => (StatusCode::UNAUTHORIZED, "E-mail ou senha inválidos.".to_string()),
            AppError::InvalidToken => {
                (StatusCode::UNAUTHORIZED, "Token de autenticação inválido ou ausente.".to_string())
            }

            AppError::UserNotFound => (StatusCode::NOT_FOUND, "Usuário não encontrado.".to_string()),
            AppError::ProductNotFound => (StatusCode::NOT_FOUND, "Produto não encontrado.".to_string()),
            AppError::VariantNotFound => {
                (StatusCode::NOT_FOUND, "Variação não encontrada para o produto.".to_string())
            }
            AppError::CustomerNotFound => (StatusCode::NOT_FOUND, "Cliente não encontrado.".to_string()),
            AppError::DamagedProductNotFound => {
                (StatusCode::NOT_FOUND, "Relato de avaria não encontrado.".to_string())
            }
            AppError::NotificationNotFound => (StatusCode::NOT_FOUND, "Notificação não encontrada.".to_string()),

            AppError::ProductNameAlreadyExists(name) => {
                (StatusCode::CONFLICT, format!("Já existe um produto com o nome '{}'.", name))
            }
            AppError::SkuAlreadyExists => (StatusCode::CONFLICT, "Este SKU já está cadastrado.".to_string()),

            AppError::AlreadyRefunded => {
                (StatusCode::BAD_REQUEST, "Este relato já foi reembolsado.".to_string())
            }
            AppError::LastVariant => (
                StatusCode::UNPROCESSABLE_ENTITY,
                "Não é possível excluir a última variação de um produto.".to_string(),
            ),

            // Todos os outros erros (DatabaseError, InternalServerError...) viram 500.
            // O `tracing` loga a mensagem detalhada; o cliente recebe só o genérico.
            ref e => {
                tracing::error!("Erro Interno do Servidor: {}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, "Ocorreu um erro inesperado.".to_string())
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
    fn estoque_insuficiente_vira_400() {
        let resp = AppError::InsufficientStock { available: 5, requested: 6 }.into_response();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn compra_sem_estoque_vira_422() {
        let resp = AppError::NotEnoughStockFor("Arroz".into()).into_response();
        assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[test]
    fn reembolso_duplicado_vira_400() {
        let resp = AppError::AlreadyRefunded.into_response();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn variacao_inexistente_vira_404() {
        let resp = AppError::VariantNotFound.into_response();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }
}
