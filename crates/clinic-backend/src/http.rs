//! Implementación REST de los contratos de gateway.
//!
//! Tablas del colaborador: `availability`, `appointments`, `services`,
//! `categories`. Las filas viajan con DTOs planos propios de esta capa; el
//! dominio nunca ve la forma de la tabla.

use async_trait::async_trait;
use chrono::{NaiveDate, NaiveTime, Weekday};
use reqwest::Method;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use clinic_domain::{AppointmentDraft, AppointmentStatus, AvailabilityWindow, Category, PatientInfo, ProviderType, Service};

use crate::client::RestClient;
use crate::config::BackendConfig;
use crate::error::BackendError;
use crate::gateway::{AppointmentGateway, AppointmentPatch, CatalogGateway, ScheduleGateway};

pub struct HttpBackend {
    client: RestClient,
}

impl HttpBackend {
    pub fn new(config: &BackendConfig) -> Result<Self, BackendError> {
        Ok(Self { client: RestClient::new(config)? })
    }

    fn first_row<T: serde::de::DeserializeOwned>(rows: Vec<Value>, what: &str) -> Result<T, BackendError> {
        let row = rows.into_iter()
                      .next()
                      .ok_or_else(|| BackendError::Decode(format!("el colaborador no devolvió {what}")))?;
        serde_json::from_value(row).map_err(BackendError::from)
    }

    fn rows<T: serde::de::DeserializeOwned>(rows: Vec<Value>) -> Result<Vec<T>, BackendError> {
        rows.into_iter()
            .map(|row| serde_json::from_value(row).map_err(BackendError::from))
            .collect()
    }
}

// ---------------------------------------------------------------------------
// DTOs de tabla
// ---------------------------------------------------------------------------

/// Día de la semana como índice 0 = lunes, igual que la columna del
/// colaborador.
fn weekday_index(weekday: Weekday) -> u32 {
    weekday.num_days_from_monday()
}

fn weekday_from_index(index: u32) -> Result<Weekday, BackendError> {
    Ok(match index {
        0 => Weekday::Mon,
        1 => Weekday::Tue,
        2 => Weekday::Wed,
        3 => Weekday::Thu,
        4 => Weekday::Fri,
        5 => Weekday::Sat,
        6 => Weekday::Sun,
        other => return Err(BackendError::Decode(format!("weekday fuera de rango: {other}"))),
    })
}

#[derive(Debug, Serialize, Deserialize)]
struct WindowRow {
    provider_id: String,
    weekday: u32,
    start_time: NaiveTime,
    end_time: NaiveTime,
    #[serde(skip_serializing_if = "Option::is_none")]
    break_start: Option<NaiveTime>,
    #[serde(skip_serializing_if = "Option::is_none")]
    break_end: Option<NaiveTime>,
}

impl WindowRow {
    fn into_domain(self) -> Result<AvailabilityWindow, BackendError> {
        Ok(AvailabilityWindow { provider_id: self.provider_id,
                                weekday: weekday_from_index(self.weekday)?,
                                start: self.start_time,
                                end: self.end_time,
                                break_start: self.break_start,
                                break_end: self.break_end })
    }

    fn from_domain(window: &AvailabilityWindow) -> Self {
        Self { provider_id: window.provider_id.clone(),
               weekday: weekday_index(window.weekday),
               start_time: window.start,
               end_time: window.end,
               break_start: window.break_start,
               break_end: window.break_end }
    }
}

/// El colaborador asigna el id en el INSERT; un `"id": null` explícito lo
/// rompería.
fn without_null_id(mut body: Value) -> Value {
    if let Some(obj) = body.as_object_mut() {
        if obj.get("id").is_some_and(Value::is_null) {
            obj.remove("id");
        }
    }
    body
}

#[derive(Debug, Serialize, Deserialize)]
struct AppointmentRow {
    #[serde(skip_serializing_if = "Option::is_none")]
    id: Option<String>,
    tenant_id: String,
    provider_id: String,
    provider_type: ProviderType,
    patient_name: String,
    patient_email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    patient_phone: Option<String>,
    service_id: String,
    date: NaiveDate,
    start_time: NaiveTime,
    duration_minutes: u32,
    status: AppointmentStatus,
}

impl AppointmentRow {
    fn into_domain(self) -> AppointmentDraft {
        AppointmentDraft { id: self.id,
                           tenant_id: self.tenant_id,
                           provider_id: self.provider_id,
                           provider_type: self.provider_type,
                           patient: PatientInfo { name: self.patient_name,
                                                  email: self.patient_email,
                                                  phone: self.patient_phone },
                           service_id: self.service_id,
                           date: self.date,
                           start_time: self.start_time,
                           duration_minutes: self.duration_minutes,
                           status: self.status }
    }

    fn from_domain(draft: &AppointmentDraft) -> Self {
        Self { id: draft.id.clone(),
               tenant_id: draft.tenant_id.clone(),
               provider_id: draft.provider_id.clone(),
               provider_type: draft.provider_type,
               patient_name: draft.patient.name.clone(),
               patient_email: draft.patient.email.clone(),
               patient_phone: draft.patient.phone.clone(),
               service_id: draft.service_id.clone(),
               date: draft.date,
               start_time: draft.start_time,
               duration_minutes: draft.duration_minutes,
               status: draft.status }
    }
}

// ---------------------------------------------------------------------------
// Gateways
// ---------------------------------------------------------------------------

#[async_trait]
impl ScheduleGateway for HttpBackend {
    async fn windows_for(&self,
                         tenant_id: &str,
                         provider_id: &str,
                         weekday: Weekday)
                         -> Result<Vec<AvailabilityWindow>, BackendError> {
        let rows = self.client
                       .request(Method::GET,
                                "/rest/v1/availability",
                                &[("tenant_id", format!("eq.{tenant_id}")),
                                  ("provider_id", format!("eq.{provider_id}")),
                                  ("weekday", format!("eq.{}", weekday_index(weekday)))],
                                None)
                       .await?;
        Self::rows::<WindowRow>(rows)?.into_iter().map(WindowRow::into_domain).collect()
    }

    async fn upsert_window(&self, tenant_id: &str, window: &AvailabilityWindow) -> Result<(), BackendError> {
        let mut body = serde_json::to_value(WindowRow::from_domain(window))?;
        body["tenant_id"] = Value::String(tenant_id.to_string());
        self.client
            .request(Method::POST,
                     "/rest/v1/availability",
                     &[("on_conflict", "tenant_id,provider_id,weekday".to_string())],
                     Some(body))
            .await?;
        Ok(())
    }
}

#[async_trait]
impl AppointmentGateway for HttpBackend {
    async fn create(&self, draft: &AppointmentDraft) -> Result<AppointmentDraft, BackendError> {
        let body = serde_json::to_value(AppointmentRow::from_domain(draft))?;
        let rows = self.client.request(Method::POST, "/rest/v1/appointments", &[], Some(body)).await?;
        Ok(Self::first_row::<AppointmentRow>(rows, "la cita creada")?.into_domain())
    }

    async fn patch(&self, tenant_id: &str, id: &str, patch: &AppointmentPatch) -> Result<(), BackendError> {
        let body = serde_json::to_value(patch)?;
        self.client
            .request(Method::PATCH,
                     "/rest/v1/appointments",
                     &[("tenant_id", format!("eq.{tenant_id}")), ("id", format!("eq.{id}"))],
                     Some(body))
            .await?;
        Ok(())
    }

    async fn for_provider_on(&self,
                             tenant_id: &str,
                             provider_id: &str,
                             date: NaiveDate)
                             -> Result<Vec<AppointmentDraft>, BackendError> {
        let rows = self.client
                       .request(Method::GET,
                                "/rest/v1/appointments",
                                &[("tenant_id", format!("eq.{tenant_id}")),
                                  ("provider_id", format!("eq.{provider_id}")),
                                  ("date", format!("eq.{date}"))],
                                None)
                       .await?;
        Ok(Self::rows::<AppointmentRow>(rows)?.into_iter().map(AppointmentRow::into_domain).collect())
    }
}

#[async_trait]
impl CatalogGateway for HttpBackend {
    async fn create_service(&self, service: &Service) -> Result<Service, BackendError> {
        let body = without_null_id(serde_json::to_value(service)?);
        let rows = self.client.request(Method::POST, "/rest/v1/services", &[], Some(body)).await?;
        Self::first_row(rows, "el servicio creado")
    }

    async fn update_service(&self, service: &Service) -> Result<Service, BackendError> {
        let id = service.id
                        .as_deref()
                        .ok_or_else(|| BackendError::Decode("update de servicio sin id".into()))?;
        let body = serde_json::to_value(service)?;
        let rows = self.client
                       .request(Method::PATCH,
                                "/rest/v1/services",
                                &[("tenant_id", format!("eq.{}", service.tenant_id)), ("id", format!("eq.{id}"))],
                                Some(body))
                       .await?;
        Self::first_row(rows, "el servicio actualizado")
    }

    async fn delete_service(&self, tenant_id: &str, id: &str) -> Result<(), BackendError> {
        self.client
            .request(Method::DELETE,
                     "/rest/v1/services",
                     &[("tenant_id", format!("eq.{tenant_id}")), ("id", format!("eq.{id}"))],
                     None)
            .await?;
        Ok(())
    }

    async fn set_service_active(&self, tenant_id: &str, id: &str, active: bool) -> Result<(), BackendError> {
        self.client
            .request(Method::PATCH,
                     "/rest/v1/services",
                     &[("tenant_id", format!("eq.{tenant_id}")), ("id", format!("eq.{id}"))],
                     Some(serde_json::json!({ "is_active": active })))
            .await?;
        Ok(())
    }

    async fn services_named(&self, tenant_id: &str, name: &str) -> Result<Vec<Service>, BackendError> {
        let rows = self.client
                       .request(Method::GET,
                                "/rest/v1/services",
                                &[("tenant_id", format!("eq.{tenant_id}")), ("name", format!("ilike.{name}"))],
                                None)
                       .await?;
        Self::rows(rows)
    }

    async fn create_category(&self, category: &Category) -> Result<Category, BackendError> {
        let body = without_null_id(serde_json::to_value(category)?);
        let rows = self.client.request(Method::POST, "/rest/v1/categories", &[], Some(body)).await?;
        Self::first_row(rows, "la categoría creada")
    }

    async fn update_category(&self, category: &Category) -> Result<Category, BackendError> {
        let id = category.id
                         .as_deref()
                         .ok_or_else(|| BackendError::Decode("update de categoría sin id".into()))?;
        let body = serde_json::to_value(category)?;
        let rows = self.client
                       .request(Method::PATCH,
                                "/rest/v1/categories",
                                &[("tenant_id", format!("eq.{}", category.tenant_id)), ("id", format!("eq.{id}"))],
                                Some(body))
                       .await?;
        Self::first_row(rows, "la categoría actualizada")
    }

    async fn delete_category(&self, tenant_id: &str, id: &str) -> Result<(), BackendError> {
        self.client
            .request(Method::DELETE,
                     "/rest/v1/categories",
                     &[("tenant_id", format!("eq.{tenant_id}")), ("id", format!("eq.{id}"))],
                     None)
            .await?;
        Ok(())
    }

    async fn set_category_active(&self, tenant_id: &str, id: &str, active: bool) -> Result<(), BackendError> {
        self.client
            .request(Method::PATCH,
                     "/rest/v1/categories",
                     &[("tenant_id", format!("eq.{tenant_id}")), ("id", format!("eq.{id}"))],
                     Some(serde_json::json!({ "is_active": active })))
            .await?;
        Ok(())
    }

    async fn categories_named(&self, tenant_id: &str, name: &str) -> Result<Vec<Category>, BackendError> {
        let rows = self.client
                       .request(Method::GET,
                                "/rest/v1/categories",
                                &[("tenant_id", format!("eq.{tenant_id}")), ("name", format!("ilike.{name}"))],
                                None)
                       .await?;
        Self::rows(rows)
    }

    async fn category(&self, tenant_id: &str, id: &str) -> Result<Option<Category>, BackendError> {
        let rows = self.client
                       .request(Method::GET,
                                "/rest/v1/categories",
                                &[("tenant_id", format!("eq.{tenant_id}")), ("id", format!("eq.{id}"))],
                                None)
                       .await?;
        let mut parsed: Vec<Category> = Self::rows(rows)?;
        Ok(if parsed.is_empty() { None } else { Some(parsed.remove(0)) })
    }

    async fn services_in_category(&self, tenant_id: &str, category_id: &str) -> Result<Vec<Service>, BackendError> {
        let rows = self.client
                       .request(Method::GET,
                                "/rest/v1/services",
                                &[("tenant_id", format!("eq.{tenant_id}")), ("category_id", format!("eq.{category_id}"))],
                                None)
                       .await?;
        Self::rows(rows)
    }
}
