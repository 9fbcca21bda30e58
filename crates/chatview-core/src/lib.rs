pub mod client;
pub mod config;
pub mod draft;
pub mod error;
pub mod markdown;
pub mod session;
pub mod state;

// Re-export main types for convenience
pub use client::{ChatBackend, ChatClient, DEFAULT_ENDPOINT};
pub use config::Config;
pub use draft::Draft;
pub use error::ChatError;
pub use markdown::{parse_markdown, Block, Inline, InlineStyle};
pub use session::ChatSession;
pub use state::{ChatExchange, ChatRequest, ChatRole, Transcript, Turn};
