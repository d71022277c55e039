//! Backend en memoria con paridad de comportamiento frente al REST.
//!
//! Usado por los tests y por el binario de demostración. Implementa la
//! restricción de unicidad del colaborador real: no puede haber dos citas
//! no canceladas para el mismo (tenant, proveedor, fecha, hora).
//! La ventana entre el chequeo de disponibilidad y la creación no es
//! atómica en la capa de flujos; esta restricción es el árbitro.

use std::sync::{Mutex, PoisonError};

use async_trait::async_trait;
use chrono::{NaiveDate, Weekday};

use clinic_domain::{AppointmentDraft, AppointmentStatus, AvailabilityWindow, Category, Service};

use crate::error::BackendError;
use crate::gateway::{AppointmentGateway, AppointmentPatch, CatalogGateway, ScheduleGateway};

#[derive(Default)]
struct State {
    windows: Vec<(String, AvailabilityWindow)>, // (tenant_id, ventana)
    appointments: Vec<AppointmentDraft>,
    services: Vec<Service>,
    categories: Vec<Category>,
    appointment_seq: u64,
    service_seq: u64,
    category_seq: u64,
}

#[derive(Default)]
pub struct InMemoryBackend {
    state: Mutex<State>,
}

impl InMemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Citas almacenadas (inspección en tests).
    pub fn appointments(&self) -> Vec<AppointmentDraft> {
        self.lock().appointments.clone()
    }

    /// Categorías almacenadas (inspección en tests).
    pub fn categories(&self) -> Vec<Category> {
        self.lock().categories.clone()
    }

    /// Servicios almacenados (inspección en tests).
    pub fn services(&self) -> Vec<Service> {
        self.lock().services.clone()
    }
}

#[async_trait]
impl ScheduleGateway for InMemoryBackend {
    async fn windows_for(&self,
                         tenant_id: &str,
                         provider_id: &str,
                         weekday: Weekday)
                         -> Result<Vec<AvailabilityWindow>, BackendError> {
        let state = self.lock();
        Ok(state.windows
                .iter()
                .filter(|(t, w)| t == tenant_id && w.provider_id == provider_id && w.weekday == weekday)
                .map(|(_, w)| w.clone())
                .collect())
    }

    async fn upsert_window(&self, tenant_id: &str, window: &AvailabilityWindow) -> Result<(), BackendError> {
        let mut state = self.lock();
        state.windows
             .retain(|(t, w)| !(t == tenant_id && w.provider_id == window.provider_id && w.weekday == window.weekday));
        state.windows.push((tenant_id.to_string(), window.clone()));
        Ok(())
    }
}

#[async_trait]
impl AppointmentGateway for InMemoryBackend {
    async fn create(&self, draft: &AppointmentDraft) -> Result<AppointmentDraft, BackendError> {
        let mut state = self.lock();

        // Restricción de unicidad (tenant, proveedor, fecha, hora) sobre
        // citas no canceladas.
        let clash = state.appointments.iter().any(|a| {
            a.status != AppointmentStatus::Cancelled
                && a.tenant_id == draft.tenant_id
                && a.provider_id == draft.provider_id
                && a.date == draft.date
                && a.start_time == draft.start_time
        });
        if clash {
            return Err(BackendError::Conflict(format!(
                "ya existe una cita para {} el {} a las {}",
                draft.provider_id, draft.date, draft.start_time
            )));
        }

        state.appointment_seq += 1;
        let mut created = draft.clone();
        created.id = Some(format!("apt-{}", state.appointment_seq));
        state.appointments.push(created.clone());
        Ok(created)
    }

    async fn patch(&self, tenant_id: &str, id: &str, patch: &AppointmentPatch) -> Result<(), BackendError> {
        let mut state = self.lock();
        let apt = state.appointments
                       .iter_mut()
                       .find(|a| a.tenant_id == tenant_id && a.id.as_deref() == Some(id))
                       .ok_or_else(|| BackendError::NotFound(format!("cita {id}")))?;
        if let Some(status) = patch.status {
            apt.status = status;
        }
        if let Some(date) = patch.date {
            apt.date = date;
        }
        if let Some(start_time) = patch.start_time {
            apt.start_time = start_time;
        }
        if let Some(provider_id) = &patch.provider_id {
            apt.provider_id = provider_id.clone();
        }
        Ok(())
    }

    async fn for_provider_on(&self,
                             tenant_id: &str,
                             provider_id: &str,
                             date: NaiveDate)
                             -> Result<Vec<AppointmentDraft>, BackendError> {
        let state = self.lock();
        Ok(state.appointments
                .iter()
                .filter(|a| a.tenant_id == tenant_id && a.provider_id == provider_id && a.date == date)
                .cloned()
                .collect())
    }
}

#[async_trait]
impl CatalogGateway for InMemoryBackend {
    async fn create_service(&self, service: &Service) -> Result<Service, BackendError> {
        let mut state = self.lock();
        state.service_seq += 1;
        let mut created = service.clone();
        created.id = Some(format!("svc-{}", state.service_seq));
        state.services.push(created.clone());
        Ok(created)
    }

    async fn update_service(&self, service: &Service) -> Result<Service, BackendError> {
        let id = service.id
                        .as_deref()
                        .ok_or_else(|| BackendError::NotFound("update de servicio sin id".into()))?;
        let mut state = self.lock();
        let stored = state.services
                          .iter_mut()
                          .find(|s| s.tenant_id == service.tenant_id && s.id.as_deref() == Some(id))
                          .ok_or_else(|| BackendError::NotFound(format!("servicio {id}")))?;
        *stored = service.clone();
        Ok(stored.clone())
    }

    async fn delete_service(&self, tenant_id: &str, id: &str) -> Result<(), BackendError> {
        let mut state = self.lock();
        let before = state.services.len();
        state.services.retain(|s| !(s.tenant_id == tenant_id && s.id.as_deref() == Some(id)));
        if state.services.len() == before {
            return Err(BackendError::NotFound(format!("servicio {id}")));
        }
        Ok(())
    }

    async fn set_service_active(&self, tenant_id: &str, id: &str, active: bool) -> Result<(), BackendError> {
        let mut state = self.lock();
        let stored = state.services
                          .iter_mut()
                          .find(|s| s.tenant_id == tenant_id && s.id.as_deref() == Some(id))
                          .ok_or_else(|| BackendError::NotFound(format!("servicio {id}")))?;
        stored.is_active = active;
        Ok(())
    }

    async fn services_named(&self, tenant_id: &str, name: &str) -> Result<Vec<Service>, BackendError> {
        let state = self.lock();
        Ok(state.services
                .iter()
                .filter(|s| s.tenant_id == tenant_id && clinic_domain::catalog::names_collide(&s.name, name))
                .cloned()
                .collect())
    }

    async fn create_category(&self, category: &Category) -> Result<Category, BackendError> {
        let mut state = self.lock();
        state.category_seq += 1;
        let mut created = category.clone();
        created.id = Some(format!("cat-{}", state.category_seq));
        state.categories.push(created.clone());
        Ok(created)
    }

    async fn update_category(&self, category: &Category) -> Result<Category, BackendError> {
        let id = category.id
                         .as_deref()
                         .ok_or_else(|| BackendError::NotFound("update de categoría sin id".into()))?;
        let mut state = self.lock();
        let stored = state.categories
                          .iter_mut()
                          .find(|c| c.tenant_id == category.tenant_id && c.id.as_deref() == Some(id))
                          .ok_or_else(|| BackendError::NotFound(format!("categoría {id}")))?;
        *stored = category.clone();
        Ok(stored.clone())
    }

    async fn delete_category(&self, tenant_id: &str, id: &str) -> Result<(), BackendError> {
        let mut state = self.lock();
        let before = state.categories.len();
        state.categories.retain(|c| !(c.tenant_id == tenant_id && c.id.as_deref() == Some(id)));
        if state.categories.len() == before {
            return Err(BackendError::NotFound(format!("categoría {id}")));
        }
        Ok(())
    }

    async fn set_category_active(&self, tenant_id: &str, id: &str, active: bool) -> Result<(), BackendError> {
        let mut state = self.lock();
        let stored = state.categories
                          .iter_mut()
                          .find(|c| c.tenant_id == tenant_id && c.id.as_deref() == Some(id))
                          .ok_or_else(|| BackendError::NotFound(format!("categoría {id}")))?;
        stored.is_active = active;
        Ok(())
    }

    async fn categories_named(&self, tenant_id: &str, name: &str) -> Result<Vec<Category>, BackendError> {
        let state = self.lock();
        Ok(state.categories
                .iter()
                .filter(|c| c.tenant_id == tenant_id && clinic_domain::catalog::names_collide(&c.name, name))
                .cloned()
                .collect())
    }

    async fn category(&self, tenant_id: &str, id: &str) -> Result<Option<Category>, BackendError> {
        let state = self.lock();
        Ok(state.categories
                .iter()
                .find(|c| c.tenant_id == tenant_id && c.id.as_deref() == Some(id))
                .cloned())
    }

    async fn services_in_category(&self, tenant_id: &str, category_id: &str) -> Result<Vec<Service>, BackendError> {
        let state = self.lock();
        Ok(state.services
                .iter()
                .filter(|s| s.tenant_id == tenant_id && s.category_id.as_deref() == Some(category_id))
                .cloned()
                .collect())
    }
}
