//! Bus de eventos del motor.
//!
//! Conjunto cerrado de nombres de evento y un observador simple: los
//! listeners se invocan sincrónicamente en orden de registro y un listener
//! que falla se registra en el log sin afectar a los demás ni al emisor.

use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

use serde::{Deserialize, Serialize};

use crate::context::FlowContext;

/// Nombres de evento observables del motor. Contrato estable: los pasos
/// emiten únicamente variantes de este enum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FlowEvent {
    AppointmentCreated,
    AppointmentConfirmed,
    AppointmentCancelled,
    PaymentInitiated,
    PaymentCompleted,
    PaymentFailed,
    NotificationSent,
    UserAuthenticated,
    AvailabilityUpdated,
}

impl FlowEvent {
    /// Nombre canónico `dominio.acción` con el que se expone el evento.
    pub fn as_str(&self) -> &'static str {
        match self {
            FlowEvent::AppointmentCreated => "appointment.created",
            FlowEvent::AppointmentConfirmed => "appointment.confirmed",
            FlowEvent::AppointmentCancelled => "appointment.cancelled",
            FlowEvent::PaymentInitiated => "payment.initiated",
            FlowEvent::PaymentCompleted => "payment.completed",
            FlowEvent::PaymentFailed => "payment.failed",
            FlowEvent::NotificationSent => "notification.sent",
            FlowEvent::UserAuthenticated => "user.authenticated",
            FlowEvent::AvailabilityUpdated => "doctor.availability_updated",
        }
    }
}

impl std::fmt::Display for FlowEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error devuelto por un listener; el bus lo loguea y continúa.
pub type ListenerError = Box<dyn std::error::Error + Send + Sync>;

type Listener = Box<dyn Fn(&FlowContext) -> Result<(), ListenerError> + Send + Sync>;

/// Registro de listeners por evento. Escritura en el arranque, lectura en
/// cada emisión.
#[derive(Default)]
pub struct EventBus {
    listeners: RwLock<HashMap<FlowEvent, Vec<Listener>>>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Suscribe un listener al evento. Los listeners se conservan en orden
    /// de registro.
    pub fn on<F>(&self, event: FlowEvent, listener: F)
        where F: Fn(&FlowContext) -> Result<(), ListenerError> + Send + Sync + 'static
    {
        let mut map = self.listeners.write().unwrap_or_else(PoisonError::into_inner);
        map.entry(event).or_default().push(Box::new(listener));
    }

    /// Emite el evento a todos los listeners suscritos, en orden. Un
    /// listener que devuelve error no impide la ejecución de los
    /// siguientes.
    pub fn emit(&self, event: FlowEvent, ctx: &FlowContext) {
        let map = self.listeners.read().unwrap_or_else(PoisonError::into_inner);
        let Some(subscribed) = map.get(&event) else {
            return;
        };
        for (i, listener) in subscribed.iter().enumerate() {
            if let Err(e) = listener(ctx) {
                log::warn!("listener #{i} de {event} falló (ignorado): {e}");
            }
        }
    }

    /// Cantidad de listeners suscritos a un evento.
    pub fn listener_count(&self, event: FlowEvent) -> usize {
        let map = self.listeners.read().unwrap_or_else(PoisonError::into_inner);
        map.get(&event).map_or(0, Vec::len)
    }
}

impl std::fmt::Debug for EventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let map = self.listeners.read().unwrap_or_else(PoisonError::into_inner);
        let counts: HashMap<&'static str, usize> = map.iter().map(|(k, v)| (k.as_str(), v.len())).collect();
        f.debug_struct("EventBus").field("listeners", &counts).finish()
    }
}
