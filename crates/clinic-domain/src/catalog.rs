//! Catálogo por tenant: servicios reservables y sus categorías.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::DomainError;

pub const MAX_NAME_LEN: usize = 255;
pub const MIN_SERVICE_MINUTES: u32 = 15;
pub const MAX_SERVICE_MINUTES: u32 = 480;

/// Discriminador explícito de la operación de persistencia de un flujo de
/// catálogo. El paso de persistencia despacha POST/PATCH/DELETE según esto.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CatalogOperation {
    Create,
    Update,
    Delete,
    ToggleStatus,
}

impl fmt::Display for CatalogOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CatalogOperation::Create => write!(f, "create"),
            CatalogOperation::Update => write!(f, "update"),
            CatalogOperation::Delete => write!(f, "delete"),
            CatalogOperation::ToggleStatus => write!(f, "toggle_status"),
        }
    }
}

/// Servicio reservable (una consulta, un masaje, una sesión).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Service {
    pub id: Option<String>,
    pub tenant_id: String,
    pub category_id: Option<String>,
    pub name: String,
    pub duration_minutes: u32,
    pub price: f64,
    pub is_active: bool,
}

impl Service {
    /// Reglas de validación: nombre no vacío y <= 255, duración en
    /// [15, 480] minutos, precio >= 0, tenant requerido.
    pub fn validate(&self) -> Result<(), DomainError> {
        if self.tenant_id.trim().is_empty() {
            return Err(DomainError::validation("tenant_id requerido"));
        }
        validate_name(&self.name)?;
        if !(MIN_SERVICE_MINUTES..=MAX_SERVICE_MINUTES).contains(&self.duration_minutes) {
            return Err(DomainError::validation(format!(
                "duración fuera de rango [{MIN_SERVICE_MINUTES}, {MAX_SERVICE_MINUTES}]: {}",
                self.duration_minutes
            )));
        }
        if self.price < 0.0 {
            return Err(DomainError::validation("precio negativo"));
        }
        Ok(())
    }
}

/// Categoría de servicios, opcionalmente anidada bajo una categoría padre.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Category {
    pub id: Option<String>,
    pub tenant_id: String,
    pub parent_id: Option<String>,
    pub name: String,
    pub is_active: bool,
}

impl Category {
    pub fn validate(&self) -> Result<(), DomainError> {
        if self.tenant_id.trim().is_empty() {
            return Err(DomainError::validation("tenant_id requerido"));
        }
        validate_name(&self.name)
    }
}

fn validate_name(name: &str) -> Result<(), DomainError> {
    if name.trim().is_empty() {
        return Err(DomainError::validation("nombre vacío"));
    }
    if name.len() > MAX_NAME_LEN {
        return Err(DomainError::validation(format!("nombre excede {MAX_NAME_LEN} caracteres")));
    }
    Ok(())
}

/// Comparación de nombres usada por el chequeo de duplicados: insensible a
/// mayúsculas, con espacios extremos ignorados.
pub fn names_collide(a: &str, b: &str) -> bool {
    a.trim().to_lowercase() == b.trim().to_lowercase()
}
