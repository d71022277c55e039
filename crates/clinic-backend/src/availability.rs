//! Resolutor de disponibilidad.
//!
//! Combina la agenda semanal del proveedor con sus citas del día y delega
//! la aritmética de intervalos en `clinic_domain::availability`. Cada
//! proveedor se resuelve de forma independiente: no hay chequeo de
//! conflictos entre proveedores.

use std::sync::Arc;

use chrono::{Datelike, NaiveDate, NaiveTime};
use log::debug;

use clinic_domain::availability::free_slots;
use clinic_domain::AppointmentStatus;

use crate::error::BackendError;
use crate::gateway::Backend;

pub struct AvailabilityResolver {
    backend: Arc<dyn Backend>,
}

impl AvailabilityResolver {
    pub fn new(backend: Arc<dyn Backend>) -> Self {
        Self { backend }
    }

    /// Inicios de slot reservables para el proveedor en la fecha dada, en
    /// orden ascendente. Sin ventana configurada para ese día de la semana
    /// la lista es vacía (proveedor cerrado). Las citas canceladas no
    /// bloquean. Todas las horas son reloj de pared local del tenant.
    pub async fn free_slots(&self,
                            tenant_id: &str,
                            provider_id: &str,
                            date: NaiveDate,
                            duration_minutes: u32)
                            -> Result<Vec<NaiveTime>, BackendError> {
        let weekday = date.weekday();
        let windows = self.backend.windows_for(tenant_id, provider_id, weekday).await?;
        if windows.is_empty() {
            debug!("proveedor {provider_id} cerrado el {weekday:?}");
            return Ok(Vec::new());
        }

        let appointments = self.backend.for_provider_on(tenant_id, provider_id, date).await?;
        let booked: Vec<(NaiveTime, NaiveTime)> =
            appointments.iter()
                        .filter(|a| a.status != AppointmentStatus::Cancelled)
                        .filter_map(|a| a.end_time().map(|end| (a.start_time, end)))
                        .collect();

        let mut slots = Vec::new();
        for window in &windows {
            slots.extend(free_slots(window, &booked, duration_minutes));
        }
        slots.sort();
        slots.dedup();

        debug!("proveedor {provider_id} el {date}: {} slots libres", slots.len());
        Ok(slots)
    }
}
