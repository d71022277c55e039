//! clinic-core: motor secuencial de flujos de negocio.
//!
//! Un `BusinessFlow` es una secuencia nombrada de pasos (`FlowStep`) que el
//! `FlowEngine` ejecuta en orden estricto, enhebrando un `FlowContext`
//! inmutable-por-reemplazo. Si un paso falla, los pasos ya completados se
//! compensan en orden inverso (rollback best-effort). El `EventBus` publica
//! un conjunto cerrado de eventos a listeners aislados entre sí.
pub mod context;
pub mod engine;
pub mod errors;
pub mod events;
pub mod flow;
pub mod step;

pub use context::FlowContext;
pub use engine::FlowEngine;
pub use errors::{FlowError, StepError};
pub use events::{EventBus, FlowEvent, ListenerError};
pub use flow::BusinessFlow;
pub use step::FlowStep;
