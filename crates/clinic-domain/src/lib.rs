// clinic-domain library entry point
pub mod appointment;
pub mod availability;
pub mod catalog;
pub mod error;
pub mod notification;
pub mod payment;
pub mod tenant;
pub mod user;

pub use appointment::{AppointmentDraft, AppointmentStatus, PatientInfo, ProviderType};
pub use availability::AvailabilityWindow;
pub use catalog::{CatalogOperation, Category, Service};
pub use error::DomainError;
pub use notification::{Notification, NotificationChannel, NotificationKind};
pub use payment::{Payment, PaymentStatus};
pub use tenant::{BusinessType, Tenant};
pub use user::{UserAccount, UserRole};
