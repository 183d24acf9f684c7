// Resume matching pipeline.
// Implements: resume-to-posting scoring, work-experience extraction, resume advice.
// All model calls go through llm_client — no direct HTTP calls to the model server here.

pub mod handlers;
pub mod interpreter;
pub mod orchestrator;
pub mod prompts;

#[cfg(test)]
pub(crate) mod testing;
