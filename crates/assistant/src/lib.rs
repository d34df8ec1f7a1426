//! StudyForge Assistant
//!
//! Study sessions over uploaded documents:
//! - Upload tracking
//! - Question answering with chat history
//! - Practice exam generation
//! - Tracing and metrics setup for the CLI

pub mod documents;
pub mod script;
pub mod session;
pub mod telemetry;

pub use documents::DocumentRecord;
pub use script::ReplyScript;
pub use session::{GeneratedExam, SessionStatus, StudySession};
