//! Request Handler: validate → prompt → AI call → parse → persist.
//! All AI calls go through llm_client.

pub mod generator;
pub mod handlers;
pub mod prompts;
