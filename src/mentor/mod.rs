//! Hobby mentor — guided conversation that profiles a user and suggests hobbies.
//!
//! Every session walks a fixed sequence of phases: a fixed greeting, then one
//! exchange each for interests, dislikes and lifestyle, then a bounded run of
//! suggestion turns. Each turn extracts structured facts from the user's text,
//! asks the model for the next reply, and routes to the next phase.

pub mod extraction;
pub mod knowledge;
pub mod manager;
pub mod prompts;
pub mod response;
pub mod routes;
pub mod session;
pub mod state;

pub use extraction::{Extractor, ProfileUpdate};
pub use manager::{MentorManager, TurnOutcome, spawn_expiry_task};
pub use response::{Responder, ResponderConfig};
pub use routes::{ChatReply, ChatRequest, MentorRouteState, build_app, mentor_routes};
pub use session::{Lifestyle, LogEntry, MessageRole, Session, SessionStatus};
pub use state::{Phase, route};
