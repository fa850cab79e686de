//! 聊天响应流 - 记录解析、分块解码、流消费、渲染安全检测

pub mod consumer;
pub mod decoder;
pub mod guard;
pub mod record;

pub use consumer::{
    cancel_pair, CancelHandle, CancelSignal, StreamConsumer, StreamHandler, StreamOutcome,
    StreamPhase, StreamState,
};
pub use decoder::LineDecoder;
pub use guard::{looks_like_quiz, render_mode, RenderMode};
pub use record::{parse_record_line, DoneMetadata, StreamRecord};
