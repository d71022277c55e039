//! Cita médica / de servicio tal como la manipula el núcleo de flujos.
//!
//! El registro persistido vive en el backend colaborador; aquí se modela el
//! borrador (`AppointmentDraft`) que los pasos del flujo enhebran y el ciclo
//! de vida de estados con sus transiciones válidas.

use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::DomainError;

/// Discriminador excluyente del proveedor de la cita: un doctor o un miembro
/// del staff, nunca ambos.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProviderType {
    Doctor,
    Member,
}

impl fmt::Display for ProviderType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProviderType::Doctor => write!(f, "doctor"),
            ProviderType::Member => write!(f, "member"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AppointmentStatus {
    Pending,
    Confirmed,
    InProgress,
    Completed,
    Cancelled,
}

impl fmt::Display for AppointmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppointmentStatus::Pending => write!(f, "pending"),
            AppointmentStatus::Confirmed => write!(f, "confirmed"),
            AppointmentStatus::InProgress => write!(f, "in_progress"),
            AppointmentStatus::Completed => write!(f, "completed"),
            AppointmentStatus::Cancelled => write!(f, "cancelled"),
        }
    }
}

impl AppointmentStatus {
    /// Transiciones válidas del ciclo de vida. `Completed` y `Cancelled`
    /// son terminales.
    pub fn can_transition(self, to: AppointmentStatus) -> bool {
        use AppointmentStatus::*;
        matches!((self, to),
                 (Pending, Confirmed) | (Pending, Cancelled) | (Confirmed, InProgress) | (Confirmed, Cancelled) | (InProgress, Completed))
    }

    /// Valida la transición devolviendo un error de dominio descriptivo.
    pub fn transition(self, to: AppointmentStatus) -> Result<AppointmentStatus, DomainError> {
        if self.can_transition(to) {
            Ok(to)
        } else {
            Err(DomainError::InvalidTransition { from: self.to_string(),
                                                 to: to.to_string() })
        }
    }
}

/// Identidad mínima del paciente dentro del borrador de cita.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatientInfo {
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
}

/// Borrador de cita enhebrado por el flujo de reserva.
///
/// `id` queda en `None` hasta que el paso de persistencia recibe el
/// identificador asignado por el backend. Fechas y horas son valores de
/// reloj de pared locales al tenant; no se normaliza a UTC.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppointmentDraft {
    pub id: Option<String>,
    pub tenant_id: String,
    pub provider_id: String,
    pub provider_type: ProviderType,
    pub patient: PatientInfo,
    pub service_id: String,
    pub date: NaiveDate,
    pub start_time: NaiveTime,
    pub duration_minutes: u32,
    pub status: AppointmentStatus,
}

impl AppointmentDraft {
    /// Precondición de entrada al flujo de reserva: el caller (UI) debe
    /// garantizar proveedor, fecha/hora y al menos un servicio.
    pub fn validate(&self) -> Result<(), DomainError> {
        if self.tenant_id.trim().is_empty() {
            return Err(DomainError::validation("tenant_id requerido"));
        }
        if self.provider_id.trim().is_empty() {
            return Err(DomainError::validation("provider_id requerido"));
        }
        if self.service_id.trim().is_empty() {
            return Err(DomainError::validation("service_id requerido"));
        }
        if self.duration_minutes == 0 {
            return Err(DomainError::validation("duration_minutes debe ser > 0"));
        }
        Ok(())
    }

    /// Hora de fin derivada (`start_time + duration`). `None` si la cita
    /// cruzaría la medianoche.
    pub fn end_time(&self) -> Option<NaiveTime> {
        let (end, wrapped) = self.start_time
                                 .overflowing_add_signed(chrono::Duration::minutes(self.duration_minutes as i64));
        if wrapped != 0 {
            None
        } else {
            Some(end)
        }
    }
}
