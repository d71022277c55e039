//! Pasos compartidos de los flujos de catálogo (servicios y categorías).
//!
//! Todos los flujos de catálogo componen la misma cadena; cada paso decide
//! según la `CatalogOperation` del contexto si le toca actuar. El paso de
//! persistencia despacha POST/PATCH/DELETE según ese discriminador.

use std::sync::Arc;

use async_trait::async_trait;
use log::{debug, info};

use clinic_backend::Backend;
use clinic_core::{FlowContext, FlowStep, StepError};
use clinic_domain::{catalog::names_collide, CatalogOperation};

/// Sobre qué recurso del catálogo opera el flujo.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CatalogKind {
    Service,
    Category,
}

impl CatalogKind {
    fn label(self) -> &'static str {
        match self {
            CatalogKind::Service => "servicio",
            CatalogKind::Category => "categoría",
        }
    }
}

/// Valida los campos del registro según la operación.
///
/// Create/Update exigen el registro completo y sus reglas de dominio;
/// Delete/ToggleStatus sólo exigen id y tenant.
pub struct ValidateCatalogFieldsStep {
    kind: CatalogKind,
}

impl ValidateCatalogFieldsStep {
    pub fn new(kind: CatalogKind) -> Self {
        Self { kind }
    }
}

#[async_trait]
impl FlowStep for ValidateCatalogFieldsStep {
    fn name(&self) -> &str {
        "validate_fields"
    }

    fn validate(&self, ctx: &FlowContext) -> bool {
        ctx.operation.is_some()
    }

    async fn run(&self, ctx: FlowContext) -> Result<FlowContext, StepError> {
        let operation = ctx.require_operation()?;
        let needs_full_record = matches!(operation, CatalogOperation::Create | CatalogOperation::Update);
        let needs_id = !matches!(operation, CatalogOperation::Create);

        match self.kind {
            CatalogKind::Service => {
                let service = ctx.require_service()?;
                if needs_full_record {
                    service.validate()?;
                }
                if needs_id && service.id.is_none() {
                    return Err(StepError::Invalid(format!("{} de servicio sin id", operation)));
                }
            }
            CatalogKind::Category => {
                let category = ctx.require_category()?;
                if needs_full_record {
                    category.validate()?;
                }
                if needs_id && category.id.is_none() {
                    return Err(StepError::Invalid(format!("{} de categoría sin id", operation)));
                }
            }
        }
        Ok(ctx)
    }
}

/// Rechaza nombres duplicados dentro del tenant (sin distinguir mayúsculas),
/// excluyendo el propio registro para que renombrar a su nombre actual no
/// sea un falso duplicado. Sólo aplica a Create/Update.
pub struct CheckDuplicateNameStep {
    kind: CatalogKind,
    backend: Arc<dyn Backend>,
}

impl CheckDuplicateNameStep {
    pub fn new(kind: CatalogKind, backend: Arc<dyn Backend>) -> Self {
        Self { kind, backend }
    }
}

#[async_trait]
impl FlowStep for CheckDuplicateNameStep {
    fn name(&self) -> &str {
        "check_duplicate_name"
    }

    async fn run(&self, ctx: FlowContext) -> Result<FlowContext, StepError> {
        let operation = ctx.require_operation()?;
        if !matches!(operation, CatalogOperation::Create | CatalogOperation::Update) {
            return Ok(ctx);
        }

        let (tenant_id, own_id, name) = match self.kind {
            CatalogKind::Service => {
                let service = ctx.require_service()?;
                (service.tenant_id.clone(), service.id.clone(), service.name.clone())
            }
            CatalogKind::Category => {
                let category = ctx.require_category()?;
                (category.tenant_id.clone(), category.id.clone(), category.name.clone())
            }
        };

        let collision = match self.kind {
            CatalogKind::Service => self.backend
                                        .services_named(&tenant_id, &name)
                                        .await?
                                        .into_iter()
                                        .any(|s| s.id != own_id && names_collide(&s.name, &name)),
            CatalogKind::Category => self.backend
                                         .categories_named(&tenant_id, &name)
                                         .await?
                                         .into_iter()
                                         .any(|c| c.id != own_id && names_collide(&c.name, &name)),
        };

        if collision {
            return Err(StepError::DuplicateName { tenant_id, name });
        }
        debug!("sin colisión de nombre para '{name}' en {tenant_id}");
        Ok(ctx)
    }
}

/// Sólo categorías: si el registro declara una categoría padre, el padre
/// debe existir y estar activo.
pub struct ValidateParentCategoryStep {
    backend: Arc<dyn Backend>,
}

impl ValidateParentCategoryStep {
    pub fn new(backend: Arc<dyn Backend>) -> Self {
        Self { backend }
    }
}

#[async_trait]
impl FlowStep for ValidateParentCategoryStep {
    fn name(&self) -> &str {
        "validate_parent_category"
    }

    async fn run(&self, ctx: FlowContext) -> Result<FlowContext, StepError> {
        let operation = ctx.require_operation()?;
        if !matches!(operation, CatalogOperation::Create | CatalogOperation::Update) {
            return Ok(ctx);
        }

        let category = ctx.require_category()?;
        let Some(parent_id) = category.parent_id.clone() else {
            return Ok(ctx);
        };

        let parent = self.backend.category(&category.tenant_id, &parent_id).await?;
        match parent {
            Some(parent) if parent.is_active => Ok(ctx),
            Some(_) => Err(StepError::Invalid(format!("la categoría padre {parent_id} está inactiva"))),
            None => Err(StepError::Invalid(format!("la categoría padre {parent_id} no existe"))),
        }
    }
}

/// Sólo borrado de categorías: bloquea el borrado si algún servicio activo
/// aún referencia la categoría. Nunca se cascada.
pub struct CheckDependentServicesStep {
    backend: Arc<dyn Backend>,
}

impl CheckDependentServicesStep {
    pub fn new(backend: Arc<dyn Backend>) -> Self {
        Self { backend }
    }
}

#[async_trait]
impl FlowStep for CheckDependentServicesStep {
    fn name(&self) -> &str {
        "check_dependent_services"
    }

    async fn run(&self, ctx: FlowContext) -> Result<FlowContext, StepError> {
        let operation = ctx.require_operation()?;
        if operation != CatalogOperation::Delete {
            return Ok(ctx);
        }

        let category = ctx.require_category()?;
        let Some(id) = category.id.clone() else {
            return Err(StepError::Invalid("borrado de categoría sin id".into()));
        };

        let count = self.backend
                        .services_in_category(&category.tenant_id, &id)
                        .await?
                        .iter()
                        .filter(|s| s.is_active)
                        .count();
        if count > 0 {
            return Err(StepError::DependencyExists { count });
        }
        Ok(ctx)
    }
}

/// Despacha la mutación al colaborador según la operación del contexto y
/// enhebra el registro resultante (con id para Create).
pub struct PersistCatalogStep {
    kind: CatalogKind,
    backend: Arc<dyn Backend>,
}

impl PersistCatalogStep {
    pub fn new(kind: CatalogKind, backend: Arc<dyn Backend>) -> Self {
        Self { kind, backend }
    }
}

#[async_trait]
impl FlowStep for PersistCatalogStep {
    fn name(&self) -> &str {
        "persist"
    }

    async fn run(&self, ctx: FlowContext) -> Result<FlowContext, StepError> {
        let operation = ctx.require_operation()?;
        let mut next = ctx;

        match self.kind {
            CatalogKind::Service => {
                let service = next.require_service()?.clone();
                match operation {
                    CatalogOperation::Create => {
                        next.service = Some(self.backend.create_service(&service).await?);
                    }
                    CatalogOperation::Update => {
                        next.service = Some(self.backend.update_service(&service).await?);
                    }
                    CatalogOperation::Delete => {
                        let id = service.id
                                        .as_deref()
                                        .ok_or_else(|| StepError::Invalid("borrado de servicio sin id".into()))?;
                        self.backend.delete_service(&service.tenant_id, id).await?;
                    }
                    CatalogOperation::ToggleStatus => {
                        let id = service.id
                                        .as_deref()
                                        .ok_or_else(|| StepError::Invalid("toggle de servicio sin id".into()))?;
                        let active = !service.is_active;
                        self.backend.set_service_active(&service.tenant_id, id, active).await?;
                        if let Some(s) = next.service.as_mut() {
                            s.is_active = active;
                        }
                    }
                }
            }
            CatalogKind::Category => {
                let category = next.require_category()?.clone();
                match operation {
                    CatalogOperation::Create => {
                        next.category = Some(self.backend.create_category(&category).await?);
                    }
                    CatalogOperation::Update => {
                        next.category = Some(self.backend.update_category(&category).await?);
                    }
                    CatalogOperation::Delete => {
                        let id = category.id
                                         .as_deref()
                                         .ok_or_else(|| StepError::Invalid("borrado de categoría sin id".into()))?;
                        self.backend.delete_category(&category.tenant_id, id).await?;
                    }
                    CatalogOperation::ToggleStatus => {
                        let id = category.id
                                         .as_deref()
                                         .ok_or_else(|| StepError::Invalid("toggle de categoría sin id".into()))?;
                        let active = !category.is_active;
                        self.backend.set_category_active(&category.tenant_id, id, active).await?;
                        if let Some(c) = next.category.as_mut() {
                            c.is_active = active;
                        }
                    }
                }
            }
        }
        Ok(next)
    }
}

/// Deja constancia de la mutación. El conjunto cerrado de eventos del bus
/// no tiene variantes de catálogo, así que este paso registra en el log en
/// lugar de emitir.
pub struct EmitCatalogEventStep {
    kind: CatalogKind,
}

impl EmitCatalogEventStep {
    pub fn new(kind: CatalogKind) -> Self {
        Self { kind }
    }
}

#[async_trait]
impl FlowStep for EmitCatalogEventStep {
    fn name(&self) -> &str {
        "emit_event"
    }

    async fn run(&self, ctx: FlowContext) -> Result<FlowContext, StepError> {
        let operation = ctx.require_operation()?;
        let (name, tenant_id) = match self.kind {
            CatalogKind::Service => {
                let s = ctx.require_service()?;
                (s.name.clone(), s.tenant_id.clone())
            }
            CatalogKind::Category => {
                let c = ctx.require_category()?;
                (c.name.clone(), c.tenant_id.clone())
            }
        };
        info!("catálogo: {operation} de {} '{name}' en tenant {tenant_id}", self.kind.label());
        Ok(ctx)
    }
}

/// Hook de invalidación de caches/índices dependientes. Hoy no hay nada que
/// invalidar; el paso mantiene el punto de extensión al final de la cadena.
pub struct UpdateDependenciesStep;

#[async_trait]
impl FlowStep for UpdateDependenciesStep {
    fn name(&self) -> &str {
        "update_dependencies"
    }

    async fn run(&self, ctx: FlowContext) -> Result<FlowContext, StepError> {
        Ok(ctx)
    }
}
