//! Binario de arranque.
//!
//! Construye el backend (REST si el entorno define `SUPABASE_URL`, en
//! memoria en caso contrario), crea el engine, registra los nueve flujos
//! desde este único punto y corre una pasada de demostración del núcleo de
//! reservas: alta de catálogo, consulta de disponibilidad, reserva, y los
//! caminos de rechazo (slot tomado, nombre duplicado, borrado bloqueado).

use std::sync::Arc;

use chrono::{Datelike, Duration, Local, NaiveDate, NaiveTime, Weekday};
use log::info;

use clinic_backend::{AvailabilityResolver, Backend, BackendConfig, HttpBackend, InMemoryBackend, ScheduleGateway};
use clinic_core::{FlowContext, FlowEngine, FlowEvent};
use clinic_domain::{AppointmentDraft, AppointmentStatus, AvailabilityWindow, BusinessType, Category, PatientInfo,
                    Payment, ProviderType, Service, Tenant, UserAccount, UserRole};
use clinic_flows::register_flows;

#[tokio::main]
async fn main() {
    env_logger::init();

    let backend = build_backend();
    let engine = FlowEngine::new();
    register_flows(&engine, Arc::clone(&backend));
    wire_event_log(&engine);
    info!("flujos registrados: {:?}", engine.flow_names());

    if let Err(e) = run_demo(&engine, &backend).await {
        eprintln!("demo fallida: {e}");
        std::process::exit(1);
    }
}

/// REST cuando el entorno lo define; backend en memoria si no.
fn build_backend() -> Arc<dyn Backend> {
    match BackendConfig::maybe_from_env() {
        Some(config) => match HttpBackend::new(&config) {
            Ok(http) => {
                info!("backend REST en {}", config.base_url);
                Arc::new(http)
            }
            Err(e) => {
                eprintln!("configuración del backend inválida: {e}");
                std::process::exit(1);
            }
        },
        None => {
            info!("SUPABASE_URL no definido; usando backend en memoria de demostración");
            Arc::new(InMemoryBackend::new())
        }
    }
}

/// Deja rastro en el log de cada evento del bus.
fn wire_event_log(engine: &FlowEngine) {
    for event in [FlowEvent::AppointmentCreated,
                  FlowEvent::AppointmentConfirmed,
                  FlowEvent::AppointmentCancelled,
                  FlowEvent::PaymentInitiated,
                  FlowEvent::PaymentCompleted,
                  FlowEvent::PaymentFailed,
                  FlowEvent::NotificationSent,
                  FlowEvent::UserAuthenticated,
                  FlowEvent::AvailabilityUpdated]
    {
        engine.on(event, move |_ctx| {
                  info!("evento: {event}");
                  Ok(())
              });
    }
}

/// Próximo día hábil (lunes a sábado) a partir de mañana.
fn next_working_day(today: NaiveDate) -> NaiveDate {
    let mut date = today + Duration::days(1);
    while date.weekday() == Weekday::Sun {
        date += Duration::days(1);
    }
    date
}

async fn run_demo(engine: &FlowEngine, backend: &Arc<dyn Backend>) -> Result<(), Box<dyn std::error::Error>> {
    let tenant = Tenant::new("t1", "Clínica Demo", BusinessType::Clinic);
    let user = UserAccount::new("u1", "ana@example.com", UserRole::Patient);
    let date = next_working_day(Local::now().date_naive());
    let ten_am = NaiveTime::from_hms_opt(10, 0, 0).ok_or("hora inválida")?;

    // Agenda semanal del proveedor: lunes a sábado, con pausa de almuerzo.
    for weekday in [Weekday::Mon, Weekday::Tue, Weekday::Wed, Weekday::Thu, Weekday::Fri, Weekday::Sat] {
        let window = AvailabilityWindow::new("doc-1", weekday,
                                             NaiveTime::from_hms_opt(9, 0, 0).ok_or("hora inválida")?,
                                             NaiveTime::from_hms_opt(17, 0, 0).ok_or("hora inválida")?)
            .with_break(NaiveTime::from_hms_opt(13, 0, 0).ok_or("hora inválida")?,
                        NaiveTime::from_hms_opt(14, 0, 0).ok_or("hora inválida")?);
        backend.upsert_window(&tenant.id, &window).await?;
    }
    engine.emit(FlowEvent::AvailabilityUpdated, &FlowContext::new().with_tenant(tenant.clone()));

    // Catálogo: una categoría y un servicio dependiente.
    let ctx = engine.execute("category_create",
                             FlowContext::new().with_category(Category { id: None,
                                                                         tenant_id: tenant.id.clone(),
                                                                         parent_id: None,
                                                                         name: "Medicina general".into(),
                                                                         is_active: true }))
                    .await?;
    let category = ctx.category.ok_or("la categoría no volvió en el contexto")?;
    println!("categoría creada: {} ({})", category.name, category.id.as_deref().unwrap_or("?"));

    let ctx = engine.execute("service_create",
                             FlowContext::new().with_service(Service { id: None,
                                                                       tenant_id: tenant.id.clone(),
                                                                       category_id: category.id.clone(),
                                                                       name: "Consulta general".into(),
                                                                       duration_minutes: 60,
                                                                       price: 50.0,
                                                                       is_active: true }))
                    .await?;
    let service = ctx.service.ok_or("el servicio no volvió en el contexto")?;
    println!("servicio creado: {} ({})", service.name, service.id.as_deref().unwrap_or("?"));

    // Disponibilidad del día elegido.
    let resolver = AvailabilityResolver::new(Arc::clone(backend));
    let slots = resolver.free_slots(&tenant.id, "doc-1", date, service.duration_minutes).await?;
    println!("slots libres de doc-1 el {date}: {} (primero: {:?})", slots.len(), slots.first());

    // Reserva de las 10:00.
    let draft = AppointmentDraft { id: None,
                                   tenant_id: tenant.id.clone(),
                                   provider_id: "doc-1".into(),
                                   provider_type: ProviderType::Doctor,
                                   patient: PatientInfo { name: "Ana Pérez".into(),
                                                          email: user.email.clone(),
                                                          phone: None },
                                   service_id: service.id.clone().ok_or("servicio sin id")?,
                                   date,
                                   start_time: ten_am,
                                   duration_minutes: service.duration_minutes,
                                   status: AppointmentStatus::Pending };
    draft.validate()?;

    let booking_ctx = FlowContext::new().with_user(user.clone())
                                        .with_tenant(tenant.clone())
                                        .with_appointment(draft.clone())
                                        .with_payment(Payment::pending(service.price, "EUR"));
    let ctx = engine.execute("appointment_booking", booking_ctx.clone()).await?;
    let appointment = ctx.appointment.ok_or("la cita no volvió en el contexto")?;
    let payment = ctx.payment.ok_or("el pago no volvió en el contexto")?;
    println!("reserva completada: cita {} ({}), pago {} ({}), {} notificación(es)",
             appointment.id.as_deref().unwrap_or("?"),
             appointment.status,
             payment.reference.as_deref().unwrap_or("?"),
             payment.status,
             ctx.notifications.len());

    // Caminos de rechazo: cada uno debe fallar de forma controlada.
    match engine.execute("appointment_booking", booking_ctx).await {
        Err(e) => println!("doble reserva rechazada: {e}"),
        Ok(_) => return Err("la doble reserva del mismo slot debió fallar".into()),
    }

    match engine.execute("service_create",
                         FlowContext::new().with_service(Service { id: None,
                                                                   tenant_id: tenant.id.clone(),
                                                                   category_id: None,
                                                                   name: "consulta GENERAL".into(),
                                                                   duration_minutes: 30,
                                                                   price: 20.0,
                                                                   is_active: true }))
                .await
    {
        Err(e) => println!("nombre duplicado rechazado: {e}"),
        Ok(_) => return Err("el nombre duplicado debió fallar".into()),
    }

    match engine.execute("category_delete", FlowContext::new().with_category(category)).await {
        Err(e) => println!("borrado de categoría bloqueado: {e}"),
        Ok(_) => return Err("el borrado con servicios activos debió fallar".into()),
    }

    Ok(())
}
