//! Errores de la frontera HTTP.
//! Mapea fallos de transporte y respuestas no exitosas del colaborador a
//! variantes semánticas que los pasos de flujo puedan interpretar.

use thiserror::Error;

use clinic_core::StepError;

#[derive(Debug, Error)]
pub enum BackendError {
    #[error("error de transporte: {0}")]
    Transport(String),

    #[error("el colaborador respondió {code}: {message}")]
    Status { code: u16, message: String },

    #[error("conflicto de escritura: {0}")]
    Conflict(String),

    #[error("recurso no encontrado: {0}")]
    NotFound(String),

    #[error("respuesta no decodificable: {0}")]
    Decode(String),

    #[error("configuración inválida: {0}")]
    Config(String),
}

impl From<reqwest::Error> for BackendError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            BackendError::Decode(err.to_string())
        } else if err.is_timeout() || err.is_connect() {
            BackendError::Transport(format!("IO transitorio: {err}"))
        } else {
            BackendError::Transport(err.to_string())
        }
    }
}

impl From<serde_json::Error> for BackendError {
    fn from(err: serde_json::Error) -> Self {
        BackendError::Decode(err.to_string())
    }
}

// Los pasos propagan fallos del colaborador como error de persistencia,
// conservando el mensaje original cuando existe.
impl From<BackendError> for StepError {
    fn from(err: BackendError) -> Self {
        StepError::Persistence(err.to_string())
    }
}
