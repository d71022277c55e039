//! Cálculo puro de slots libres para un proveedor.
//!
//! La ventana semanal de disponibilidad y las citas ya reservadas llegan
//! resueltas desde el backend; aquí sólo se hace la aritmética de intervalos.
//! Todas las comparaciones son sobre horas de reloj de pared del mismo día
//! (hora local del tenant, sin conversión de zona horaria).

use chrono::{Duration, NaiveTime, Weekday};
use serde::{Deserialize, Serialize};

/// Ventana de atención de un proveedor para un día de la semana, con pausa
/// de almuerzo opcional. Un proveedor sin ventana para un día está cerrado
/// ese día.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AvailabilityWindow {
    pub provider_id: String,
    pub weekday: Weekday,
    pub start: NaiveTime,
    pub end: NaiveTime,
    pub break_start: Option<NaiveTime>,
    pub break_end: Option<NaiveTime>,
}

impl AvailabilityWindow {
    pub fn new(provider_id: impl Into<String>, weekday: Weekday, start: NaiveTime, end: NaiveTime) -> Self {
        Self { provider_id: provider_id.into(),
               weekday,
               start,
               end,
               break_start: None,
               break_end: None }
    }

    pub fn with_break(mut self, break_start: NaiveTime, break_end: NaiveTime) -> Self {
        self.break_start = Some(break_start);
        self.break_end = Some(break_end);
        self
    }
}

/// Dos intervalos semiabiertos `[a_start, a_end)` y `[b_start, b_end)` se
/// solapan cuando cada uno empieza antes de que el otro termine.
fn overlaps(a_start: NaiveTime, a_end: NaiveTime, b_start: NaiveTime, b_end: NaiveTime) -> bool {
    a_start < b_end && a_end > b_start
}

/// Genera los inicios de slot reservables dentro de `window`.
///
/// Candidatos cada `duration_minutes` desde `window.start` hasta
/// `window.end - duration` inclusive. Se descartan los que caen sobre la
/// pausa de almuerzo y los que solapan un intervalo ya reservado (el caller
/// pre-filtra las citas canceladas). El orden de salida es ascendente.
pub fn free_slots(window: &AvailabilityWindow,
                  booked: &[(NaiveTime, NaiveTime)],
                  duration_minutes: u32)
                  -> Vec<NaiveTime> {
    if duration_minutes == 0 {
        return Vec::new();
    }
    let step = Duration::minutes(duration_minutes as i64);
    let mut slots = Vec::new();
    let mut current = window.start;

    loop {
        let (slot_end, wrapped) = current.overflowing_add_signed(step);
        if wrapped != 0 || slot_end > window.end {
            break;
        }

        let in_break = match (window.break_start, window.break_end) {
            (Some(bs), Some(be)) => overlaps(current, slot_end, bs, be),
            _ => false,
        };
        let taken = booked.iter().any(|&(bs, be)| overlaps(current, slot_end, bs, be));

        if !in_break && !taken {
            slots.push(current);
        }
        current = slot_end;
    }

    slots
}
