//! Pasos del flujo de reserva de cita.
//!
//! Orden: validar disponibilidad → crear cita → iniciar pago (stub) →
//! enviar confirmación. El chequeo de disponibilidad y la creación no son
//! atómicos entre sí; una carrera entre dos reservas del mismo slot la
//! arbitra la restricción de unicidad del colaborador y aflora aquí como
//! fallo de `create_appointment`.

use std::sync::Arc;

use async_trait::async_trait;
use log::{debug, info};
use uuid::Uuid;

use clinic_backend::{AppointmentPatch, AvailabilityResolver, Backend};
use clinic_core::{EventBus, FlowContext, FlowEvent, FlowStep, StepError};
use clinic_domain::{AppointmentStatus, Notification, PaymentStatus};

/// Paso 1: la hora pedida debe estar entre los slots libres del proveedor.
///
/// Sin efectos persistentes, por lo que no define rollback. En éxito deja
/// la cita del contexto en `pending`.
pub struct ValidateAvailabilityStep {
    resolver: AvailabilityResolver,
}

impl ValidateAvailabilityStep {
    pub fn new(backend: Arc<dyn Backend>) -> Self {
        Self { resolver: AvailabilityResolver::new(backend) }
    }
}

#[async_trait]
impl FlowStep for ValidateAvailabilityStep {
    fn name(&self) -> &str {
        "validate_availability"
    }

    fn validate(&self, ctx: &FlowContext) -> bool {
        ctx.appointment.is_some() && ctx.tenant.is_some()
    }

    async fn run(&self, ctx: FlowContext) -> Result<FlowContext, StepError> {
        let tenant = ctx.require_tenant()?;
        let appointment = ctx.require_appointment()?;

        let slots = self.resolver
                        .free_slots(&tenant.id, &appointment.provider_id, appointment.date, appointment.duration_minutes)
                        .await?;

        if !slots.contains(&appointment.start_time) {
            return Err(StepError::SlotUnavailable { provider_id: appointment.provider_id.clone(),
                                                    date: appointment.date,
                                                    time: appointment.start_time });
        }
        debug!("slot {} del {} libre para {}", appointment.start_time, appointment.date, appointment.provider_id);

        let mut next = ctx;
        if let Some(apt) = next.appointment.as_mut() {
            apt.status = AppointmentStatus::Pending;
        }
        Ok(next)
    }
}

/// Paso 2: persiste la cita y enhebra el id asignado por el colaborador.
pub struct CreateAppointmentStep {
    backend: Arc<dyn Backend>,
    bus: Arc<EventBus>,
}

impl CreateAppointmentStep {
    pub fn new(backend: Arc<dyn Backend>, bus: Arc<EventBus>) -> Self {
        Self { backend, bus }
    }
}

#[async_trait]
impl FlowStep for CreateAppointmentStep {
    fn name(&self) -> &str {
        "create_appointment"
    }

    fn validate(&self, ctx: &FlowContext) -> bool {
        ctx.appointment.is_some()
    }

    async fn run(&self, ctx: FlowContext) -> Result<FlowContext, StepError> {
        let mut draft = ctx.require_appointment()?.clone();
        draft.status = AppointmentStatus::Pending;

        let created = self.backend.create(&draft).await?;
        info!("cita {} creada para {}", created.id.as_deref().unwrap_or("?"), created.provider_id);

        let mut next = ctx;
        next.appointment = Some(created);
        self.bus.emit(FlowEvent::AppointmentCreated, &next);
        Ok(next)
    }

    /// Compensación: si el contexto ya lleva un id de cita, se pide la
    /// cancelación de ese registro. Un fallo aquí lo loguea el engine; una
    /// reserva fallida no deja citas `pending` colgando.
    async fn rollback(&self, ctx: FlowContext) -> Result<FlowContext, StepError> {
        let Some(apt) = ctx.appointment.clone() else {
            return Ok(ctx);
        };
        let Some(id) = apt.id.clone() else {
            return Ok(ctx);
        };

        self.backend
            .patch(&apt.tenant_id, &id, &AppointmentPatch::status(AppointmentStatus::Cancelled))
            .await?;
        info!("cita {id} cancelada por rollback");

        let mut next = ctx;
        if let Some(apt) = next.appointment.as_mut() {
            apt.status = AppointmentStatus::Cancelled;
        }
        self.bus.emit(FlowEvent::AppointmentCancelled, &next);
        Ok(next)
    }
}

/// Paso 3: stub de intento de pago, enteramente en proceso.
///
/// La integración con una pasarela real queda fuera de este núcleo; aquí
/// sólo se fija el estado `processing` y una referencia generada localmente.
pub struct InitiatePaymentStep {
    bus: Arc<EventBus>,
}

impl InitiatePaymentStep {
    pub fn new(bus: Arc<EventBus>) -> Self {
        Self { bus }
    }
}

#[async_trait]
impl FlowStep for InitiatePaymentStep {
    fn name(&self) -> &str {
        "initiate_payment"
    }

    fn validate(&self, ctx: &FlowContext) -> bool {
        ctx.payment.as_ref().is_some_and(|p| p.amount > 0.0)
    }

    async fn run(&self, ctx: FlowContext) -> Result<FlowContext, StepError> {
        let mut next = ctx;
        if let Some(payment) = next.payment.as_mut() {
            payment.status = PaymentStatus::Processing;
            payment.reference = Some(format!("pay-{}", Uuid::new_v4().simple()));
        }
        self.bus.emit(FlowEvent::PaymentInitiated, &next);
        Ok(next)
    }
}

/// Paso 4: registro de notificación de confirmación al email del usuario.
///
/// La entrega real es de un colaborador externo; el registro queda marcado
/// `sent` incondicionalmente.
pub struct SendConfirmationStep {
    bus: Arc<EventBus>,
}

impl SendConfirmationStep {
    pub fn new(bus: Arc<EventBus>) -> Self {
        Self { bus }
    }
}

#[async_trait]
impl FlowStep for SendConfirmationStep {
    fn name(&self) -> &str {
        "send_confirmation"
    }

    async fn run(&self, ctx: FlowContext) -> Result<FlowContext, StepError> {
        let user = ctx.require_user()?;
        let mut notification = Notification::confirmation_email(user.email.clone());
        notification.sent = true;

        let mut next = ctx;
        next.notifications.push(notification);
        self.bus.emit(FlowEvent::NotificationSent, &next);
        Ok(next)
    }
}
