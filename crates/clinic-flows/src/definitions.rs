//! Constructores de los flujos públicos y su registro en el engine.
//!
//! Los nueve nombres expuestos: `appointment_booking`, `service_create`,
//! `service_update`, `service_delete`, `service_toggle_status`,
//! `category_create`, `category_update`, `category_delete`,
//! `category_toggle_status`. El registro ocurre desde un único punto de
//! bootstrap; ningún módulo registra flujos al importarse.

use std::sync::Arc;

use clinic_backend::Backend;
use clinic_core::{BusinessFlow, EventBus, FlowContext, FlowEngine};
use clinic_domain::CatalogOperation;

use crate::steps::booking::{CreateAppointmentStep, InitiatePaymentStep, SendConfirmationStep, ValidateAvailabilityStep};
use crate::steps::catalog::{CatalogKind, CheckDependentServicesStep, CheckDuplicateNameStep, EmitCatalogEventStep,
                            PersistCatalogStep, UpdateDependenciesStep, ValidateCatalogFieldsStep,
                            ValidateParentCategoryStep};

/// Flujo de reserva de cita.
pub fn booking_flow(backend: Arc<dyn Backend>, bus: Arc<EventBus>) -> BusinessFlow {
    BusinessFlow::new("appointment_booking").step(ValidateAvailabilityStep::new(Arc::clone(&backend)))
                                            .step(CreateAppointmentStep::new(Arc::clone(&backend), Arc::clone(&bus)))
                                            .step(InitiatePaymentStep::new(Arc::clone(&bus)))
                                            .step(SendConfirmationStep::new(bus))
}

fn flow_name(kind: CatalogKind, operation: CatalogOperation) -> &'static str {
    match (kind, operation) {
        (CatalogKind::Service, CatalogOperation::Create) => "service_create",
        (CatalogKind::Service, CatalogOperation::Update) => "service_update",
        (CatalogKind::Service, CatalogOperation::Delete) => "service_delete",
        (CatalogKind::Service, CatalogOperation::ToggleStatus) => "service_toggle_status",
        (CatalogKind::Category, CatalogOperation::Create) => "category_create",
        (CatalogKind::Category, CatalogOperation::Update) => "category_update",
        (CatalogKind::Category, CatalogOperation::Delete) => "category_delete",
        (CatalogKind::Category, CatalogOperation::ToggleStatus) => "category_toggle_status",
    }
}

/// Cadena compartida de pasos de catálogo. La plantilla fija la operación,
/// así el caller sólo aporta el registro.
fn catalog_flow(kind: CatalogKind, operation: CatalogOperation, backend: Arc<dyn Backend>) -> BusinessFlow {
    let mut flow = BusinessFlow::new(flow_name(kind, operation))
        .with_template(FlowContext::new().with_operation(operation))
        .step(ValidateCatalogFieldsStep::new(kind))
        .step(CheckDuplicateNameStep::new(kind, Arc::clone(&backend)));

    if kind == CatalogKind::Category {
        flow = flow.step(ValidateParentCategoryStep::new(Arc::clone(&backend)));
        if operation == CatalogOperation::Delete {
            flow = flow.step(CheckDependentServicesStep::new(Arc::clone(&backend)));
        }
    }

    flow.step(PersistCatalogStep::new(kind, backend))
        .step(EmitCatalogEventStep::new(kind))
        .step(UpdateDependenciesStep)
}

/// Flujo de catálogo para servicios (`service_*`).
pub fn service_flow(operation: CatalogOperation, backend: Arc<dyn Backend>) -> BusinessFlow {
    catalog_flow(CatalogKind::Service, operation, backend)
}

/// Flujo de catálogo para categorías (`category_*`).
pub fn category_flow(operation: CatalogOperation, backend: Arc<dyn Backend>) -> BusinessFlow {
    catalog_flow(CatalogKind::Category, operation, backend)
}

/// Punto único de registro: instala los nueve flujos en el engine.
pub fn register_flows(engine: &FlowEngine, backend: Arc<dyn Backend>) {
    let bus = engine.bus();
    engine.register(booking_flow(Arc::clone(&backend), bus));

    for operation in [CatalogOperation::Create,
                      CatalogOperation::Update,
                      CatalogOperation::Delete,
                      CatalogOperation::ToggleStatus]
    {
        engine.register(service_flow(operation, Arc::clone(&backend)));
        engine.register(category_flow(operation, Arc::clone(&backend)));
    }
}
