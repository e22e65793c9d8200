//! Question answering: topic routing, language detection, conversation
//! memory and the retrieval-augmented answer pipeline

mod answer;
mod language;
mod memory;
mod router;

pub use answer::{AnswerOptions, AnswerPipeline};
pub use language::Language;
pub use memory::{format_transcript, NO_HISTORY};
pub use router::TopicRouter;
