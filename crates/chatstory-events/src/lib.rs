pub mod error;
pub mod event;
pub mod payload;
pub mod types;
pub mod wire;

pub use error::{PayloadError, Result};
pub use event::{Event, EventKind, Message, PresenceAction, PresenceEvent, Reaction, TypingEvent, DEFAULT_REACTION, UNKNOWN_NAME};
pub use payload::{ChatInfo, ChatPayload};
pub use types::{CharacterId, EventId, Seconds, DEFAULT_TYPING_DURATION, MILLIS_PER_SECOND};
