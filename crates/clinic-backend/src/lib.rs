//! clinic-backend
//!
//! Frontera con el backend colaborador (Postgres gestionado detrás de una
//! API REST estilo PostgREST). Objetivo: aislar por completo el mapeo
//! dominio ↔ recursos HTTP del resto del núcleo.
//!
//! Módulos:
//! - `gateway`: contratos (`ScheduleGateway`, `AppointmentGateway`,
//!   `CatalogGateway`) que consumen los pasos de flujo.
//! - `http`: implementación REST de los contratos.
//! - `memory`: implementación en memoria con paridad de comportamiento,
//!   incluida la restricción de unicidad de slot que arbitra las reservas
//!   en carrera; usada por tests y por el binario de demostración.
//! - `availability`: resolutor de slots libres (ventanas + citas → horas).
//! - `client`: cliente JSON delgado sobre reqwest.
//! - `config`: carga de configuración desde .env.

pub mod availability;
pub mod client;
pub mod config;
pub mod error;
pub mod gateway;
pub mod http;
pub mod memory;

pub use availability::AvailabilityResolver;
pub use client::RestClient;
pub use config::{init_dotenv, BackendConfig};
pub use error::BackendError;
pub use gateway::{AppointmentGateway, AppointmentPatch, Backend, CatalogGateway, ScheduleGateway};
pub use http::HttpBackend;
pub use memory::InMemoryBackend;
