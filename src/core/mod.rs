pub mod command;
pub mod confirmation;
pub mod cooldown;
pub mod guided_fill;
pub mod speech_timing;
pub mod validation;

// Re-export commonly used types for convenience
pub use command::{FormCommand, extract_form_command};
pub use confirmation::{Confirmation, classify};
pub use cooldown::{COOLDOWN_KEY, CooldownStore, FilesystemCooldownStore, MemoryCooldownStore};
pub use guided_fill::{
    FieldId, FieldStore, FormDocument, GuidedFill, MessageSource, SessionEvent, ValidationRequest,
};
pub use speech_timing::estimate_speaking_delay;
pub use validation::{ValidationClient, ValidationOutcome};
