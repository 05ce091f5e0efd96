pub mod openai;
pub mod worker;

pub use openai::OpenAiClient;
pub use worker::{EmbedTask, EmbeddingWorker, embed_channel, process_pending};
