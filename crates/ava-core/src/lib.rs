pub mod api;
pub mod config;
pub mod content;
pub mod input;
pub mod message;
pub mod session;
pub mod widget;

// Re-export main types for convenience
pub use api::{ApiError, ChatApiClient, MessageApi, SessionApi};
pub use config::Config;
pub use content::{render as render_content, RenderedContent, LINK_LABEL};
pub use input::InputBuffer;
pub use message::{ChatContext, ChatKey, LineType, Message, User};
pub use session::{check_session, GateState, SessionGate};
pub use widget::{ChatWidget, Entry, Mode, Outcome, Request, SUGGESTED_ACTIONS};
