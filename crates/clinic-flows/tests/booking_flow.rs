//! Tests de integración del flujo de reserva sobre el backend en memoria.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{NaiveDate, NaiveTime, Weekday};

use clinic_backend::{AppointmentGateway, AppointmentPatch, BackendError, CatalogGateway, InMemoryBackend,
                     ScheduleGateway};
use clinic_core::{FlowContext, FlowEngine, FlowEvent, StepError};
use clinic_domain::{AppointmentDraft, AppointmentStatus, AvailabilityWindow, BusinessType, Category, PatientInfo,
                    Payment, PaymentStatus, ProviderType, Service, Tenant, UserAccount, UserRole};
use clinic_flows::register_flows;

fn t(h: u32, m: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(h, m, 0).unwrap()
}

fn june_first() -> NaiveDate {
    // sábado
    NaiveDate::from_ymd_opt(2024, 6, 1).unwrap()
}

fn draft_at(time: NaiveTime) -> AppointmentDraft {
    AppointmentDraft { id: None,
                       tenant_id: "t1".into(),
                       provider_id: "doc-1".into(),
                       provider_type: ProviderType::Doctor,
                       patient: PatientInfo { name: "Ana Pérez".into(),
                                              email: "ana@example.com".into(),
                                              phone: Some("+34 600 000 000".into()) },
                       service_id: "svc-1".into(),
                       date: june_first(),
                       start_time: time,
                       duration_minutes: 60,
                       status: AppointmentStatus::Pending }
}

fn booking_context(time: NaiveTime) -> FlowContext {
    FlowContext::new().with_user(UserAccount::new("u1", "ana@example.com", UserRole::Patient))
                      .with_tenant(Tenant::new("t1", "Clínica Uno", BusinessType::Clinic))
                      .with_appointment(draft_at(time))
                      .with_payment(Payment::pending(50.0, "EUR"))
}

async fn bootstrap() -> (FlowEngine, Arc<InMemoryBackend>) {
    let backend = Arc::new(InMemoryBackend::new());
    backend.upsert_window("t1",
                          &AvailabilityWindow::new("doc-1", Weekday::Sat, t(9, 0), t(17, 0)).with_break(t(13, 0), t(14, 0)))
           .await
           .unwrap();
    let engine = FlowEngine::new();
    register_flows(&engine, Arc::clone(&backend) as Arc<dyn clinic_backend::Backend>);
    (engine, backend)
}

#[tokio::test]
async fn successful_booking_threads_id_payment_and_notification() {
    let (engine, backend) = bootstrap().await;

    let events = Arc::new(Mutex::new(Vec::new()));
    for event in [FlowEvent::AppointmentCreated, FlowEvent::PaymentInitiated, FlowEvent::NotificationSent] {
        let seen = Arc::clone(&events);
        engine.on(event, move |_ctx| {
                  seen.lock().unwrap().push(event.as_str());
                  Ok(())
              });
    }

    let ctx = engine.execute("appointment_booking", booking_context(t(10, 0)))
                    .await
                    .expect("la reserva debe completar");

    let appointment = ctx.appointment.expect("cita en el contexto final");
    assert_eq!(appointment.id.as_deref(), Some("apt-1"));
    assert_eq!(appointment.status, AppointmentStatus::Pending);

    let payment = ctx.payment.expect("pago en el contexto final");
    assert_eq!(payment.status, PaymentStatus::Processing);
    assert!(payment.reference.as_deref().is_some_and(|r| r.starts_with("pay-")));

    assert_eq!(ctx.notifications.len(), 1);
    assert!(ctx.notifications[0].sent);
    assert_eq!(ctx.notifications[0].recipient, "ana@example.com");

    assert_eq!(*events.lock().unwrap(),
               vec!["appointment.created", "payment.initiated", "notification.sent"]);
    assert_eq!(backend.appointments().len(), 1);
}

#[tokio::test]
async fn occupied_slot_fails_before_any_side_effect() {
    let (engine, backend) = bootstrap().await;
    backend.create(&draft_at(t(10, 0))).await.unwrap();

    let err = engine.execute("appointment_booking", booking_context(t(10, 0)))
                    .await
                    .expect_err("el slot está tomado");

    assert!(matches!(err.step_error(), Some(StepError::SlotUnavailable { .. })), "error inesperado: {err}");
    assert_eq!(backend.appointments().len(), 1, "sólo la cita preexistente");
}

#[tokio::test]
async fn closed_day_offers_no_slots() {
    let (engine, _backend) = bootstrap().await;
    // 2024-06-03 es lunes y doc-1 sólo atiende sábados.
    let mut ctx = booking_context(t(10, 0));
    if let Some(apt) = ctx.appointment.as_mut() {
        apt.date = NaiveDate::from_ymd_opt(2024, 6, 3).unwrap();
    }

    let err = engine.execute("appointment_booking", ctx).await.expect_err("día cerrado");
    assert!(matches!(err.step_error(), Some(StepError::SlotUnavailable { .. })));
}

#[tokio::test]
async fn zero_amount_payment_aborts_and_cancels_the_created_appointment() {
    let (engine, backend) = bootstrap().await;

    let cancelled_events = Arc::new(Mutex::new(0));
    let counter = Arc::clone(&cancelled_events);
    engine.on(FlowEvent::AppointmentCancelled, move |_ctx| {
              *counter.lock().unwrap() += 1;
              Ok(())
          });

    let mut ctx = booking_context(t(10, 0));
    ctx.payment = Some(Payment::pending(0.0, "EUR"));

    let err = engine.execute("appointment_booking", ctx)
                    .await
                    .expect_err("la precondición de initiate_payment debe rechazar");

    assert!(matches!(err, clinic_core::FlowError::StepValidation { ref step, .. } if step == "initiate_payment"),
            "error inesperado: {err}");

    // La cita se creó en el paso 2 y el rollback la canceló: no queda
    // ninguna cita pending colgando.
    let stored = backend.appointments();
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].status, AppointmentStatus::Cancelled);
    assert_eq!(*cancelled_events.lock().unwrap(), 1);
}

/// Backend que delega todo en memoria salvo `create`, que siempre falla:
/// simula la caída del colaborador en pleno paso de persistencia.
struct FailingCreateBackend {
    inner: InMemoryBackend,
}

#[async_trait]
impl ScheduleGateway for FailingCreateBackend {
    async fn windows_for(&self,
                         tenant_id: &str,
                         provider_id: &str,
                         weekday: Weekday)
                         -> Result<Vec<AvailabilityWindow>, BackendError> {
        self.inner.windows_for(tenant_id, provider_id, weekday).await
    }

    async fn upsert_window(&self, tenant_id: &str, window: &AvailabilityWindow) -> Result<(), BackendError> {
        self.inner.upsert_window(tenant_id, window).await
    }
}

#[async_trait]
impl AppointmentGateway for FailingCreateBackend {
    async fn create(&self, _draft: &AppointmentDraft) -> Result<AppointmentDraft, BackendError> {
        Err(BackendError::Status { code: 503,
                                   message: "service unavailable".into() })
    }

    async fn patch(&self, tenant_id: &str, id: &str, patch: &AppointmentPatch) -> Result<(), BackendError> {
        self.inner.patch(tenant_id, id, patch).await
    }

    async fn for_provider_on(&self,
                             tenant_id: &str,
                             provider_id: &str,
                             date: NaiveDate)
                             -> Result<Vec<AppointmentDraft>, BackendError> {
        self.inner.for_provider_on(tenant_id, provider_id, date).await
    }
}

#[async_trait]
impl CatalogGateway for FailingCreateBackend {
    async fn create_service(&self, service: &Service) -> Result<Service, BackendError> {
        self.inner.create_service(service).await
    }
    async fn update_service(&self, service: &Service) -> Result<Service, BackendError> {
        self.inner.update_service(service).await
    }
    async fn delete_service(&self, tenant_id: &str, id: &str) -> Result<(), BackendError> {
        self.inner.delete_service(tenant_id, id).await
    }
    async fn set_service_active(&self, tenant_id: &str, id: &str, active: bool) -> Result<(), BackendError> {
        self.inner.set_service_active(tenant_id, id, active).await
    }
    async fn services_named(&self, tenant_id: &str, name: &str) -> Result<Vec<Service>, BackendError> {
        self.inner.services_named(tenant_id, name).await
    }
    async fn create_category(&self, category: &Category) -> Result<Category, BackendError> {
        self.inner.create_category(category).await
    }
    async fn update_category(&self, category: &Category) -> Result<Category, BackendError> {
        self.inner.update_category(category).await
    }
    async fn delete_category(&self, tenant_id: &str, id: &str) -> Result<(), BackendError> {
        self.inner.delete_category(tenant_id, id).await
    }
    async fn set_category_active(&self, tenant_id: &str, id: &str, active: bool) -> Result<(), BackendError> {
        self.inner.set_category_active(tenant_id, id, active).await
    }
    async fn categories_named(&self, tenant_id: &str, name: &str) -> Result<Vec<Category>, BackendError> {
        self.inner.categories_named(tenant_id, name).await
    }
    async fn category(&self, tenant_id: &str, id: &str) -> Result<Option<Category>, BackendError> {
        self.inner.category(tenant_id, id).await
    }
    async fn services_in_category(&self, tenant_id: &str, category_id: &str) -> Result<Vec<Service>, BackendError> {
        self.inner.services_in_category(tenant_id, category_id).await
    }
}

#[tokio::test]
async fn backend_failure_in_create_surfaces_as_persistence_error() {
    let backend = FailingCreateBackend { inner: InMemoryBackend::new() };
    backend.inner
           .upsert_window("t1", &AvailabilityWindow::new("doc-1", Weekday::Sat, t(9, 0), t(17, 0)))
           .await
           .unwrap();

    let engine = FlowEngine::new();
    register_flows(&engine, Arc::new(backend));

    let err = engine.execute("appointment_booking", booking_context(t(10, 0)))
                    .await
                    .expect_err("el colaborador está caído");

    match &err {
        clinic_core::FlowError::Step { step, source, .. } => {
            assert_eq!(step, "create_appointment");
            assert!(matches!(source, StepError::Persistence(msg) if msg.contains("503")),
                    "debe conservar el mensaje del colaborador: {source}");
        }
        other => panic!("error inesperado: {other}"),
    }
}
