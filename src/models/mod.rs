mod dialogue;
mod schema;

pub use self::dialogue::{Action, Dialogue, DialogueState, Frame, SlotSpan, Speaker, Turn};
pub use self::schema::{IntentSchema, Service, SlotSchema};
