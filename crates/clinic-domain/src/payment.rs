use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    Processing,
    Completed,
    Failed,
}

impl fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PaymentStatus::Processing => write!(f, "processing"),
            PaymentStatus::Completed => write!(f, "completed"),
            PaymentStatus::Failed => write!(f, "failed"),
        }
    }
}

/// Intento de pago asociado a una reserva. En este núcleo es un stub local:
/// la pasarela real queda fuera de alcance y `reference` se genera en
/// proceso.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Payment {
    pub amount: f64,
    pub currency: String,
    pub status: PaymentStatus,
    pub reference: Option<String>,
}

impl Payment {
    pub fn pending(amount: f64, currency: impl Into<String>) -> Self {
        Self { amount,
               currency: currency.into(),
               status: PaymentStatus::Processing,
               reference: None }
    }
}
