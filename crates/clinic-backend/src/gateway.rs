//! Contratos de acceso al backend colaborador.
//!
//! Un trait por recurso para poder inyectar la implementación REST en
//! producción y la implementación en memoria en tests, sin acoplar los
//! pasos de flujo a ninguna de las dos.

use async_trait::async_trait;
use chrono::{NaiveDate, NaiveTime, Weekday};
use serde::Serialize;

use clinic_domain::{AppointmentDraft, AppointmentStatus, AvailabilityWindow, Category, Service};

use crate::error::BackendError;

/// Agenda semanal de los proveedores.
#[async_trait]
pub trait ScheduleGateway: Send + Sync {
    /// Ventanas de atención del proveedor para un día de la semana. Vacío
    /// significa cerrado ese día.
    async fn windows_for(&self,
                         tenant_id: &str,
                         provider_id: &str,
                         weekday: Weekday)
                         -> Result<Vec<AvailabilityWindow>, BackendError>;

    /// Crea o reemplaza la ventana del proveedor para ese día de la semana.
    async fn upsert_window(&self, tenant_id: &str, window: &AvailabilityWindow) -> Result<(), BackendError>;
}

/// Actualización parcial de una cita (PATCH). Sólo los campos presentes se
/// envían al colaborador.
#[derive(Debug, Clone, Default, Serialize)]
pub struct AppointmentPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<AppointmentStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_time: Option<NaiveTime>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub provider_id: Option<String>,
}

impl AppointmentPatch {
    pub fn status(status: AppointmentStatus) -> Self {
        Self { status: Some(status),
               ..Self::default() }
    }
}

/// Persistencia de citas.
#[async_trait]
pub trait AppointmentGateway: Send + Sync {
    /// Persiste una cita nueva y devuelve el registro con el id asignado
    /// por el colaborador. El colaborador es el árbitro de escrituras en
    /// conflicto: dos reservas del mismo slot chocan aquí contra su
    /// restricción de unicidad.
    async fn create(&self, draft: &AppointmentDraft) -> Result<AppointmentDraft, BackendError>;

    /// Actualización parcial (estado, fecha, hora, proveedor).
    async fn patch(&self, tenant_id: &str, id: &str, patch: &AppointmentPatch) -> Result<(), BackendError>;

    /// Citas del proveedor en la fecha dada, cualquier estado.
    async fn for_provider_on(&self,
                             tenant_id: &str,
                             provider_id: &str,
                             date: NaiveDate)
                             -> Result<Vec<AppointmentDraft>, BackendError>;
}

/// Catálogo de servicios y categorías por tenant.
#[async_trait]
pub trait CatalogGateway: Send + Sync {
    async fn create_service(&self, service: &Service) -> Result<Service, BackendError>;
    async fn update_service(&self, service: &Service) -> Result<Service, BackendError>;
    async fn delete_service(&self, tenant_id: &str, id: &str) -> Result<(), BackendError>;
    async fn set_service_active(&self, tenant_id: &str, id: &str, active: bool) -> Result<(), BackendError>;

    /// Servicios del tenant cuyo nombre coincide (sin distinguir
    /// mayúsculas) con el dado.
    async fn services_named(&self, tenant_id: &str, name: &str) -> Result<Vec<Service>, BackendError>;

    async fn create_category(&self, category: &Category) -> Result<Category, BackendError>;
    async fn update_category(&self, category: &Category) -> Result<Category, BackendError>;
    async fn delete_category(&self, tenant_id: &str, id: &str) -> Result<(), BackendError>;
    async fn set_category_active(&self, tenant_id: &str, id: &str, active: bool) -> Result<(), BackendError>;

    async fn categories_named(&self, tenant_id: &str, name: &str) -> Result<Vec<Category>, BackendError>;

    /// Categoría por id, si existe.
    async fn category(&self, tenant_id: &str, id: &str) -> Result<Option<Category>, BackendError>;

    /// Servicios que referencian la categoría (chequeo de dependientes
    /// antes de borrar).
    async fn services_in_category(&self, tenant_id: &str, category_id: &str) -> Result<Vec<Service>, BackendError>;
}

/// Backend completo: los pasos reciben `Arc<dyn Backend>` y usan el
/// contrato que necesiten.
pub trait Backend: ScheduleGateway + AppointmentGateway + CatalogGateway {}

impl<T: ScheduleGateway + AppointmentGateway + CatalogGateway> Backend for T {}
