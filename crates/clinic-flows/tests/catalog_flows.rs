//! Tests de integración de los flujos de catálogo (servicios y categorías).

use std::sync::Arc;

use clinic_backend::{CatalogGateway, InMemoryBackend};
use clinic_core::{FlowContext, FlowEngine, StepError};
use clinic_domain::{Category, Service};
use clinic_flows::register_flows;

fn service(tenant_id: &str, name: &str) -> Service {
    Service { id: None,
              tenant_id: tenant_id.into(),
              category_id: None,
              name: name.into(),
              duration_minutes: 30,
              price: 45.0,
              is_active: true }
}

fn category(tenant_id: &str, name: &str) -> Category {
    Category { id: None,
               tenant_id: tenant_id.into(),
               parent_id: None,
               name: name.into(),
               is_active: true }
}

fn bootstrap() -> (FlowEngine, Arc<InMemoryBackend>) {
    let backend = Arc::new(InMemoryBackend::new());
    let engine = FlowEngine::new();
    register_flows(&engine, Arc::clone(&backend) as Arc<dyn clinic_backend::Backend>);
    (engine, backend)
}

#[tokio::test]
async fn service_create_persists_and_returns_the_id() {
    let (engine, backend) = bootstrap();

    let ctx = engine.execute("service_create", FlowContext::new().with_service(service("t1", "Consulta")))
                    .await
                    .expect("alta de servicio");

    let created = ctx.service.expect("servicio en el contexto final");
    assert_eq!(created.id.as_deref(), Some("svc-1"));
    assert_eq!(backend.services().len(), 1);
}

#[tokio::test]
async fn duplicate_name_is_rejected_case_insensitively_per_tenant() {
    let (engine, backend) = bootstrap();
    engine.execute("service_create", FlowContext::new().with_service(service("t1", "consulta")))
          .await
          .expect("primer alta");

    // Mismo tenant, distinta capitalización: duplicado.
    let err = engine.execute("service_create", FlowContext::new().with_service(service("t1", "Consulta")))
                    .await
                    .expect_err("nombre duplicado en t1");
    assert!(matches!(err.step_error(), Some(StepError::DuplicateName { tenant_id, name })
                     if tenant_id == "t1" && name == "Consulta"),
            "error inesperado: {err}");

    // Otro tenant: el mismo nombre es válido.
    engine.execute("service_create", FlowContext::new().with_service(service("t2", "Consulta")))
          .await
          .expect("t2 no tiene ese nombre");

    assert_eq!(backend.services().len(), 2);
}

#[tokio::test]
async fn renaming_a_service_to_its_own_name_is_not_a_duplicate() {
    let (engine, _backend) = bootstrap();
    let ctx = engine.execute("service_create", FlowContext::new().with_service(service("t1", "Consulta")))
                    .await
                    .unwrap();
    let mut stored = ctx.service.unwrap();
    stored.price = 60.0; // cambia el precio, conserva el nombre

    engine.execute("service_update", FlowContext::new().with_service(stored))
          .await
          .expect("renombrar al propio nombre no es colisión");
}

#[tokio::test]
async fn invalid_service_fields_abort_before_persistence() {
    let (engine, backend) = bootstrap();
    let mut bad = service("t1", "Consulta");
    bad.duration_minutes = 10; // por debajo del mínimo de 15

    let err = engine.execute("service_create", FlowContext::new().with_service(bad))
                    .await
                    .expect_err("duración inválida");

    assert!(matches!(err.step_error(), Some(StepError::Invalid(_))), "error inesperado: {err}");
    assert!(backend.services().is_empty(), "nada debe persistirse");
}

#[tokio::test]
async fn service_toggle_status_flips_the_flag() {
    let (engine, backend) = bootstrap();
    let ctx = engine.execute("service_create", FlowContext::new().with_service(service("t1", "Consulta")))
                    .await
                    .unwrap();
    let created = ctx.service.unwrap();

    let ctx = engine.execute("service_toggle_status", FlowContext::new().with_service(created))
                    .await
                    .expect("toggle");

    assert!(!ctx.service.unwrap().is_active);
    assert!(!backend.services()[0].is_active);
}

#[tokio::test]
async fn service_delete_removes_the_record() {
    let (engine, backend) = bootstrap();
    let ctx = engine.execute("service_create", FlowContext::new().with_service(service("t1", "Consulta")))
                    .await
                    .unwrap();
    let created = ctx.service.unwrap();

    engine.execute("service_delete", FlowContext::new().with_service(created))
          .await
          .expect("borrado de servicio");

    assert!(backend.services().is_empty());
}

#[tokio::test]
async fn category_with_missing_parent_is_rejected() {
    let (engine, _backend) = bootstrap();
    let mut child = category("t1", "Faciales");
    child.parent_id = Some("cat-999".into());

    let err = engine.execute("category_create", FlowContext::new().with_category(child))
                    .await
                    .expect_err("el padre no existe");
    assert!(matches!(err.step_error(), Some(StepError::Invalid(msg)) if msg.contains("cat-999")));
}

#[tokio::test]
async fn category_with_inactive_parent_is_rejected() {
    let (engine, backend) = bootstrap();
    let ctx = engine.execute("category_create", FlowContext::new().with_category(category("t1", "Estética")))
                    .await
                    .unwrap();
    let parent = ctx.category.unwrap();
    let parent_id = parent.id.clone().unwrap();
    backend.set_category_active("t1", &parent_id, false).await.unwrap();

    let mut child = category("t1", "Faciales");
    child.parent_id = Some(parent_id);

    let err = engine.execute("category_create", FlowContext::new().with_category(child))
                    .await
                    .expect_err("el padre está inactivo");
    assert!(matches!(err.step_error(), Some(StepError::Invalid(msg)) if msg.contains("inactiva")));
}

#[tokio::test]
async fn deleting_a_category_with_active_services_is_blocked() {
    let (engine, backend) = bootstrap();
    let ctx = engine.execute("category_create", FlowContext::new().with_category(category("t1", "Estética")))
                    .await
                    .unwrap();
    let stored_category = ctx.category.unwrap();

    let mut svc = service("t1", "Limpieza facial");
    svc.category_id = stored_category.id.clone();
    engine.execute("service_create", FlowContext::new().with_service(svc)).await.unwrap();

    let err = engine.execute("category_delete", FlowContext::new().with_category(stored_category.clone()))
                    .await
                    .expect_err("hay un servicio activo dependiente");

    assert!(matches!(err.step_error(), Some(StepError::DependencyExists { count: 1 })), "error inesperado: {err}");
    assert_eq!(backend.categories().len(), 1, "la categoría sigue existiendo: nunca se cascada");
}

#[tokio::test]
async fn deleting_a_category_with_only_inactive_services_succeeds() {
    let (engine, backend) = bootstrap();
    let ctx = engine.execute("category_create", FlowContext::new().with_category(category("t1", "Estética")))
                    .await
                    .unwrap();
    let stored_category = ctx.category.unwrap();

    let mut svc = service("t1", "Limpieza facial");
    svc.category_id = stored_category.id.clone();
    let ctx = engine.execute("service_create", FlowContext::new().with_service(svc)).await.unwrap();
    let stored_service = ctx.service.unwrap();

    engine.execute("service_toggle_status", FlowContext::new().with_service(stored_service))
          .await
          .unwrap();
    engine.execute("category_delete", FlowContext::new().with_category(stored_category))
          .await
          .expect("sin dependientes activos el borrado procede");

    assert!(backend.categories().is_empty());
}

#[tokio::test]
async fn category_update_keeps_own_name_without_collision() {
    let (engine, _backend) = bootstrap();
    let ctx = engine.execute("category_create", FlowContext::new().with_category(category("t1", "Masajes")))
                    .await
                    .unwrap();
    let stored = ctx.category.unwrap();

    engine.execute("category_update", FlowContext::new().with_category(stored))
          .await
          .expect("actualizar sin renombrar");
}

#[tokio::test]
async fn missing_record_fails_the_entry_precondition() {
    let (engine, _backend) = bootstrap();

    // Sin servicio en el contexto, validate_fields no puede actuar y el
    // primer paso falla de forma controlada.
    let err = engine.execute("service_create", FlowContext::new()).await.expect_err("contexto sin servicio");
    assert!(matches!(err.step_error(), Some(StepError::Invalid(_))));
}
