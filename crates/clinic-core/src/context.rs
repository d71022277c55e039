//! Contexto de datos enhebrado por los flujos.
//!
//! Todos los campos son opcionales y específicos de cada familia de flujos
//! (reserva o catálogo). Cada paso recibe el contexto por valor y devuelve
//! uno nuevo: no hay estado mutable compartido entre pasos fuera del objeto
//! retornado. El contexto se crea por invocación y se descarta al terminar;
//! sólo los efectos persistidos (la cita creada, etc.) sobreviven.

use serde::{Deserialize, Serialize};

use clinic_domain::{AppointmentDraft, CatalogOperation, Category, Notification, Payment, Service, Tenant, UserAccount};

use crate::errors::StepError;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FlowContext {
    pub user: Option<UserAccount>,
    pub tenant: Option<Tenant>,
    pub appointment: Option<AppointmentDraft>,
    pub payment: Option<Payment>,
    pub notifications: Vec<Notification>,
    pub service: Option<Service>,
    pub category: Option<Category>,
    pub operation: Option<CatalogOperation>,
}

impl FlowContext {
    pub fn new() -> Self {
        Self::default()
    }

    // Constructores encadenables para armar contextos iniciales.

    pub fn with_user(mut self, user: UserAccount) -> Self {
        self.user = Some(user);
        self
    }

    pub fn with_tenant(mut self, tenant: Tenant) -> Self {
        self.tenant = Some(tenant);
        self
    }

    pub fn with_appointment(mut self, appointment: AppointmentDraft) -> Self {
        self.appointment = Some(appointment);
        self
    }

    pub fn with_payment(mut self, payment: Payment) -> Self {
        self.payment = Some(payment);
        self
    }

    pub fn with_service(mut self, service: Service) -> Self {
        self.service = Some(service);
        self
    }

    pub fn with_category(mut self, category: Category) -> Self {
        self.category = Some(category);
        self
    }

    pub fn with_operation(mut self, operation: CatalogOperation) -> Self {
        self.operation = Some(operation);
        self
    }

    /// Completa campos ausentes con la plantilla del flujo. Los valores del
    /// contexto inicial del caller siempre ganan.
    pub fn with_defaults(mut self, template: &FlowContext) -> Self {
        if self.user.is_none() {
            self.user = template.user.clone();
        }
        if self.tenant.is_none() {
            self.tenant = template.tenant.clone();
        }
        if self.appointment.is_none() {
            self.appointment = template.appointment.clone();
        }
        if self.payment.is_none() {
            self.payment = template.payment.clone();
        }
        if self.notifications.is_empty() {
            self.notifications = template.notifications.clone();
        }
        if self.service.is_none() {
            self.service = template.service.clone();
        }
        if self.category.is_none() {
            self.category = template.category.clone();
        }
        if self.operation.is_none() {
            self.operation = template.operation.clone();
        }
        self
    }

    // Accesos requeridos por los pasos: presencia validada a la entrada del
    // paso en vez de castear en tiempo de ejecución.

    pub fn require_user(&self) -> Result<&UserAccount, StepError> {
        self.user.as_ref().ok_or_else(|| StepError::Invalid("user ausente del contexto".into()))
    }

    pub fn require_tenant(&self) -> Result<&Tenant, StepError> {
        self.tenant.as_ref().ok_or_else(|| StepError::Invalid("tenant ausente del contexto".into()))
    }

    pub fn require_appointment(&self) -> Result<&AppointmentDraft, StepError> {
        self.appointment
            .as_ref()
            .ok_or_else(|| StepError::Invalid("appointment ausente del contexto".into()))
    }

    pub fn require_payment(&self) -> Result<&Payment, StepError> {
        self.payment
            .as_ref()
            .ok_or_else(|| StepError::Invalid("payment ausente del contexto".into()))
    }

    pub fn require_service(&self) -> Result<&Service, StepError> {
        self.service
            .as_ref()
            .ok_or_else(|| StepError::Invalid("service ausente del contexto".into()))
    }

    pub fn require_category(&self) -> Result<&Category, StepError> {
        self.category
            .as_ref()
            .ok_or_else(|| StepError::Invalid("category ausente del contexto".into()))
    }

    pub fn require_operation(&self) -> Result<CatalogOperation, StepError> {
        self.operation
            .ok_or_else(|| StepError::Invalid("operation ausente del contexto".into()))
    }
}
