//! Ejecución secuencial de flujos con rollback compensatorio.

use std::sync::{Arc, PoisonError, RwLock};

use indexmap::IndexMap;
use log::{debug, error, warn};

use crate::context::FlowContext;
use crate::errors::FlowError;
use crate::events::{EventBus, FlowEvent, ListenerError};
use crate::flow::BusinessFlow;

/// Motor de flujos de negocio.
///
/// Mantiene el registro de flujos nombrados y el bus de eventos. El registro
/// se escribe una vez durante el bootstrap (los módulos de flujos exponen un
/// `register` invocado desde un único punto de arranque) y se lee en cada
/// ejecución; no hay dependencias de orden de import escondidas.
///
/// Cada ejecución es una tarea lógica independiente: los pasos corren
/// estrictamente en secuencia, cada uno esperado hasta completarse, porque
/// los pasos posteriores dependen de las mutaciones de contexto de los
/// anteriores. El motor no reintenta ni cancela; eso pertenece a la acción
/// de cada paso.
pub struct FlowEngine {
    flows: RwLock<IndexMap<String, Arc<BusinessFlow>>>,
    bus: Arc<EventBus>,
}

impl FlowEngine {
    pub fn new() -> Self {
        Self { flows: RwLock::new(IndexMap::new()),
               bus: Arc::new(EventBus::new()) }
    }

    /// Bus compartido, para construir pasos que emiten eventos.
    pub fn bus(&self) -> Arc<EventBus> {
        Arc::clone(&self.bus)
    }

    /// Registra un flujo bajo su nombre. Registrar dos veces el mismo nombre
    /// conserva la última definición (last-wins, heredado del diseño
    /// original); el reemplazo queda en el log.
    pub fn register(&self, flow: BusinessFlow) {
        let mut flows = self.flows.write().unwrap_or_else(PoisonError::into_inner);
        if flows.insert(flow.name.clone(), Arc::new(flow)).is_some() {
            warn!("flujo re-registrado: la definición anterior fue reemplazada");
        }
    }

    /// Nombres de flujo registrados, en orden de registro.
    pub fn flow_names(&self) -> Vec<String> {
        let flows = self.flows.read().unwrap_or_else(PoisonError::into_inner);
        flows.keys().cloned().collect()
    }

    /// Suscribe un listener a un evento del bus.
    pub fn on<F>(&self, event: FlowEvent, listener: F)
        where F: Fn(&FlowContext) -> Result<(), ListenerError> + Send + Sync + 'static
    {
        self.bus.on(event, listener);
    }

    /// Emite un evento a través del bus.
    pub fn emit(&self, event: FlowEvent, ctx: &FlowContext) {
        self.bus.emit(event, ctx);
    }

    /// Ejecuta el flujo `name` contra el contexto inicial dado.
    ///
    /// Garantías:
    /// - Nombre no registrado: `FlowNotFound`, nada se ejecuta.
    /// - `validate` en falso: aborta con `StepValidation` y compensa sólo
    ///   los pasos anteriores ya completados (el paso rechazado nunca corrió
    ///   y no se compensa).
    /// - Acción fallida: compensa los pasos completados en orden inverso
    ///   estricto (los errores de rollback se loguean y se tragan para que
    ///   cada rollback tenga su oportunidad) y relanza el error original
    ///   envuelto con el paso que falló.
    /// - Éxito total: devuelve el contexto final sin compensar nada.
    pub async fn execute(&self, name: &str, initial: FlowContext) -> Result<FlowContext, FlowError> {
        let flow = {
            let flows = self.flows.read().unwrap_or_else(PoisonError::into_inner);
            flows.get(name).cloned()
        };
        let Some(flow) = flow else {
            return Err(FlowError::FlowNotFound(name.to_string()));
        };

        let mut ctx = initial.with_defaults(&flow.template);
        let mut completed: Vec<usize> = Vec::with_capacity(flow.len());

        for (idx, step) in flow.steps.iter().enumerate() {
            if !step.validate(&ctx) {
                warn!("flujo '{}': precondición de '{}' rechazada", flow.name, step.name());
                self.run_rollbacks(&flow, &completed, ctx).await;
                return Err(FlowError::StepValidation { flow: flow.name.clone(),
                                                       step: step.name().to_string() });
            }

            debug!("flujo '{}': ejecutando paso {}/{} '{}'", flow.name, idx + 1, flow.len(), step.name());
            match step.run(ctx.clone()).await {
                Ok(next) => {
                    ctx = next;
                    completed.push(idx);
                }
                Err(source) => {
                    error!("flujo '{}': paso '{}' falló: {source}", flow.name, step.name());
                    self.run_rollbacks(&flow, &completed, ctx).await;
                    return Err(FlowError::Step { flow: flow.name.clone(),
                                                 step: step.name().to_string(),
                                                 source });
                }
            }
        }

        Ok(ctx)
    }

    /// Compensa los pasos completados, del último al primero. Best-effort:
    /// un rollback fallido se registra y no bloquea los siguientes; en ese
    /// caso se conserva el contexto previo para el resto de la cadena.
    async fn run_rollbacks(&self, flow: &BusinessFlow, completed: &[usize], mut ctx: FlowContext) {
        for &idx in completed.iter().rev() {
            let step = &flow.steps[idx];
            debug!("flujo '{}': rollback de '{}'", flow.name, step.name());
            match step.rollback(ctx.clone()).await {
                Ok(next) => ctx = next,
                Err(e) => warn!("flujo '{}': rollback de '{}' falló (ignorado): {e}", flow.name, step.name()),
            }
        }
    }
}

impl Default for FlowEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for FlowEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FlowEngine").field("flows", &self.flow_names()).finish()
    }
}
