use serde::{Deserialize, Serialize};
use std::fmt;

/// Tipo de negocio soportado por la plataforma multi-tenant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BusinessType {
    Clinic,
    Spa,
    Wellness,
}

impl fmt::Display for BusinessType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BusinessType::Clinic => write!(f, "clinic"),
            BusinessType::Spa => write!(f, "spa"),
            BusinessType::Wellness => write!(f, "wellness"),
        }
    }
}

/// Cuenta de negocio aislada dentro del sistema. Todos los registros de
/// catálogo y agenda cuelgan de un `tenant_id`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tenant {
    pub id: String,
    pub name: String,
    pub business_type: BusinessType,
}

impl Tenant {
    pub fn new(id: impl Into<String>, name: impl Into<String>, business_type: BusinessType) -> Self {
        Self { id: id.into(),
               name: name.into(),
               business_type }
    }
}
