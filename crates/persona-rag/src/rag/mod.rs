//! Per-request classification and prompt strategies used by the response generator.

pub mod intent;
pub mod locale;
pub mod persona;
pub mod tone;

pub use intent::{Intent, IntentDetector, KeywordIntentRouter};
pub use locale::{KeywordLocaleDetector, LocaleDetector};
pub use persona::{PersonaPolicy, NO_CONTEXT_MARKER};
pub use tone::{LlmToneClassifier, ToneClassifier, ToneLabel};
