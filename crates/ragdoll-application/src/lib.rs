//! Application layer for Ragdoll.
//!
//! Pipeline stages and the session orchestrator that chains them. Everything
//! here is written against the capability traits in `ragdoll_core::provider`;
//! `providers` is the only module that names concrete adapters.

mod cache_policy;
pub mod generation_stage;
pub mod input_rewriter;
pub mod knowledge_loader;
pub mod pacer;
pub mod providers;
pub mod retrieval_stage;
pub mod session;

pub use input_rewriter::InputRewriter;
pub use pacer::Pacer;
pub use providers::{Providers, open_cache};
pub use session::{PersonaReply, PersonaSession, SessionOptions, SessionState};
