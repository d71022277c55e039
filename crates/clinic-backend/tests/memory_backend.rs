//! Tests del backend en memoria y del resolutor de disponibilidad.

use std::sync::Arc;

use chrono::{NaiveDate, NaiveTime, Weekday};
use clinic_backend::{AppointmentGateway, AppointmentPatch, AvailabilityResolver, BackendError, InMemoryBackend,
                     ScheduleGateway};
use clinic_domain::{AppointmentDraft, AppointmentStatus, AvailabilityWindow, PatientInfo, ProviderType};

fn t(h: u32, m: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(h, m, 0).unwrap()
}

fn june_first() -> NaiveDate {
    // 2024-06-01 es sábado
    NaiveDate::from_ymd_opt(2024, 6, 1).unwrap()
}

fn draft_at(time: NaiveTime) -> AppointmentDraft {
    AppointmentDraft { id: None,
                       tenant_id: "t1".into(),
                       provider_id: "doc-1".into(),
                       provider_type: ProviderType::Doctor,
                       patient: PatientInfo { name: "Ana Pérez".into(),
                                              email: "ana@example.com".into(),
                                              phone: None },
                       service_id: "svc-1".into(),
                       date: june_first(),
                       start_time: time,
                       duration_minutes: 30,
                       status: AppointmentStatus::Pending }
}

#[tokio::test]
async fn create_assigns_sequential_ids() {
    let backend = InMemoryBackend::new();
    let first = backend.create(&draft_at(t(10, 0))).await.unwrap();
    let second = backend.create(&draft_at(t(11, 0))).await.unwrap();
    assert_eq!(first.id.as_deref(), Some("apt-1"));
    assert_eq!(second.id.as_deref(), Some("apt-2"));
}

#[tokio::test]
async fn same_slot_twice_hits_the_uniqueness_constraint() {
    let backend = InMemoryBackend::new();
    backend.create(&draft_at(t(10, 0))).await.unwrap();

    let err = backend.create(&draft_at(t(10, 0))).await.expect_err("el segundo create debe chocar");
    assert!(matches!(err, BackendError::Conflict(_)), "error inesperado: {err:?}");
}

#[tokio::test]
async fn cancelled_appointment_frees_the_slot() {
    let backend = InMemoryBackend::new();
    let created = backend.create(&draft_at(t(10, 0))).await.unwrap();
    backend.patch("t1",
                  created.id.as_deref().unwrap(),
                  &AppointmentPatch::status(AppointmentStatus::Cancelled))
           .await
           .unwrap();

    backend.create(&draft_at(t(10, 0))).await.expect("el slot cancelado vuelve a estar libre");
}

#[tokio::test]
async fn resolver_returns_empty_for_closed_day() {
    let backend = Arc::new(InMemoryBackend::new());
    // Ventana sólo lunes; 2024-06-01 es sábado.
    backend.upsert_window("t1", &AvailabilityWindow::new("doc-1", Weekday::Mon, t(9, 0), t(13, 0)))
           .await
           .unwrap();

    let resolver = AvailabilityResolver::new(backend);
    let slots = resolver.free_slots("t1", "doc-1", june_first(), 30).await.unwrap();
    assert!(slots.is_empty(), "sin ventana para el día no hay slots, sea cual sea la duración");
}

#[tokio::test]
async fn resolver_excludes_booked_and_lunch_slots() {
    let backend = Arc::new(InMemoryBackend::new());
    backend.upsert_window("t1",
                          &AvailabilityWindow::new("doc-1", Weekday::Sat, t(9, 0), t(17, 0)).with_break(t(13, 0), t(14, 0)))
           .await
           .unwrap();
    backend.create(&draft_at(t(10, 0))).await.unwrap();

    let resolver = AvailabilityResolver::new(Arc::clone(&backend) as Arc<dyn clinic_backend::Backend>);
    let slots = resolver.free_slots("t1", "doc-1", june_first(), 30).await.unwrap();

    assert!(!slots.contains(&t(10, 0)), "slot reservado");
    assert!(!slots.contains(&t(13, 0)), "almuerzo");
    assert!(!slots.contains(&t(13, 30)), "almuerzo");
    assert!(slots.contains(&t(9, 0)));
    assert!(slots.contains(&t(10, 30)));
    assert!(slots.contains(&t(14, 0)));
    assert_eq!(slots.last(), Some(&t(16, 30)), "el último slot termina justo al cierre");
}

#[tokio::test]
async fn resolver_ignores_cancelled_appointments() {
    let backend = Arc::new(InMemoryBackend::new());
    backend.upsert_window("t1", &AvailabilityWindow::new("doc-1", Weekday::Sat, t(9, 0), t(12, 0)))
           .await
           .unwrap();
    let created = backend.create(&draft_at(t(10, 0))).await.unwrap();
    backend.patch("t1",
                  created.id.as_deref().unwrap(),
                  &AppointmentPatch::status(AppointmentStatus::Cancelled))
           .await
           .unwrap();

    let resolver = AvailabilityResolver::new(backend);
    let slots = resolver.free_slots("t1", "doc-1", june_first(), 30).await.unwrap();
    assert!(slots.contains(&t(10, 0)), "una cita cancelada no bloquea el slot");
}

#[tokio::test]
async fn providers_resolve_independently() {
    let backend = Arc::new(InMemoryBackend::new());
    backend.upsert_window("t1", &AvailabilityWindow::new("doc-1", Weekday::Sat, t(9, 0), t(12, 0)))
           .await
           .unwrap();
    backend.upsert_window("t1", &AvailabilityWindow::new("doc-2", Weekday::Sat, t(9, 0), t(12, 0)))
           .await
           .unwrap();
    backend.create(&draft_at(t(9, 0))).await.unwrap(); // ocupa a doc-1

    let resolver = AvailabilityResolver::new(backend);
    let doc2 = resolver.free_slots("t1", "doc-2", june_first(), 30).await.unwrap();
    assert!(doc2.contains(&t(9, 0)), "la agenda de doc-1 no afecta a doc-2");
}
