//! Definición de un paso de flujo.

use async_trait::async_trait;

use crate::context::FlowContext;
use crate::errors::StepError;

/// Unidad de trabajo nombrada dentro de un `BusinessFlow`.
///
/// Contrato:
/// - `validate` es un predicado libre de efectos sobre el contexto entrante;
///   devolver `false` aborta el flujo antes de ejecutar `run`.
/// - `run` es la acción del paso: recibe el contexto, hace su efecto (puede
///   ser IO de red) y devuelve el contexto resultante.
/// - `rollback` compensa un paso ya completado cuando un paso posterior
///   falla. Debe ser seguro de invocar aunque la acción haya quedado a
///   medias; el engine registra su error y nunca lo propaga.
#[async_trait]
pub trait FlowStep: Send + Sync {
    /// Nombre estable y único dentro del flujo.
    fn name(&self) -> &str;

    /// Precondición sobre el contexto entrante. Sin efectos.
    fn validate(&self, _ctx: &FlowContext) -> bool {
        true
    }

    /// Acción del paso.
    async fn run(&self, ctx: FlowContext) -> Result<FlowContext, StepError>;

    /// Compensación; por defecto no hay nada que deshacer.
    async fn rollback(&self, ctx: FlowContext) -> Result<FlowContext, StepError> {
        Ok(ctx)
    }
}
