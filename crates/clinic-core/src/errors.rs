//! Errores del motor y de los pasos.

use chrono::{NaiveDate, NaiveTime};
use thiserror::Error;

use clinic_domain::DomainError;

/// Fallo producido por la acción (o rollback) de un paso concreto.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum StepError {
    #[error("slot {time} del {date} ya no está libre para el proveedor {provider_id}")]
    SlotUnavailable {
        provider_id: String,
        date: NaiveDate,
        time: NaiveTime,
    },

    #[error("ya existe '{name}' en el tenant {tenant_id}")]
    DuplicateName { tenant_id: String, name: String },

    #[error("{count} servicio(s) activo(s) aún referencian esta categoría")]
    DependencyExists { count: usize },

    #[error("llamada de persistencia fallida: {0}")]
    Persistence(String),

    #[error("contexto inválido: {0}")]
    Invalid(String),
}

impl From<DomainError> for StepError {
    fn from(e: DomainError) -> Self {
        StepError::Invalid(e.to_string())
    }
}

/// Error observable por el caller de `FlowEngine::execute`.
///
/// Un fallo de acción llega envuelto en `Step` con el nombre del paso que
/// falló; el rollback ya corrió cuando el error sale del engine.
#[derive(Debug, Error)]
pub enum FlowError {
    #[error("flujo '{0}' no registrado")]
    FlowNotFound(String),

    #[error("paso '{step}' del flujo '{flow}' rechazó el contexto")]
    StepValidation { flow: String, step: String },

    #[error("paso '{step}' del flujo '{flow}' falló: {source}")]
    Step {
        flow: String,
        step: String,
        #[source]
        source: StepError,
    },
}

impl FlowError {
    /// Error de paso subyacente, si lo hay.
    pub fn step_error(&self) -> Option<&StepError> {
        match self {
            FlowError::Step { source, .. } => Some(source),
            _ => None,
        }
    }
}
