//! Tutor Chat - 流式 AI 辅导回复的解析与测验提取

pub mod api;
pub mod cli;
pub mod config;
pub mod exchange;
pub mod quiz;
pub mod stream;

pub use api::{ChatMessage, ChatSession, CreateSessionRequest, MessageRole, TutorClient};
pub use config::TutorConfig;
pub use exchange::{
    reject_exchange, run_exchange, ExchangeObserver, ExchangeOutcome, LiveView, RETRY_MESSAGE,
};
pub use quiz::{
    classify_line, extract_quiz, Difficulty, ExtractionResult, ExtractionStrategy, LineKind,
    QuizDocument, QuizQuestionRecord,
};
pub use stream::{
    cancel_pair, looks_like_quiz, render_mode, CancelHandle, CancelSignal, DoneMetadata,
    RenderMode, StreamConsumer, StreamHandler, StreamOutcome, StreamState,
};
