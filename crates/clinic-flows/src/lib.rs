//! clinic-flows: pasos concretos y definiciones de los flujos de negocio.
//!
//! - `steps::booking`: la secuencia de reserva de cita (disponibilidad →
//!   persistencia → stub de pago → confirmación).
//! - `steps::catalog`: pasos compartidos de las mutaciones de catálogo
//!   (servicios y categorías).
//! - `definitions`: constructores de los nueve flujos públicos y el punto
//!   único de registro en el engine.

pub mod definitions;
pub mod steps;

pub use definitions::{booking_flow, category_flow, register_flows, service_flow};
