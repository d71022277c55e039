//! Definición inmutable de un flujo de negocio.

use crate::context::FlowContext;
use crate::step::FlowStep;

/// Secuencia nombrada y ordenada de pasos más una plantilla de contexto
/// inicial. La identidad del flujo es su `name`, usado para despacho. Los
/// pasos se ejecutan estrictamente en orden de inserción, sin ramas ni
/// paralelismo.
pub struct BusinessFlow {
    pub name: String,
    pub steps: Vec<Box<dyn FlowStep>>,
    pub template: FlowContext,
}

impl BusinessFlow {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into(),
               steps: Vec::new(),
               template: FlowContext::default() }
    }

    /// Añade el siguiente paso del flujo.
    pub fn step(mut self, step: impl FlowStep + 'static) -> Self {
        self.steps.push(Box::new(step));
        self
    }

    /// Plantilla de contexto con la que se completan campos ausentes del
    /// contexto inicial del caller.
    pub fn with_template(mut self, template: FlowContext) -> Self {
        self.template = template;
        self
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }
}

impl std::fmt::Debug for BusinessFlow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let names: Vec<&str> = self.steps.iter().map(|s| s.name()).collect();
        f.debug_struct("BusinessFlow").field("name", &self.name).field("steps", &names).finish()
    }
}
