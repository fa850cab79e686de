//! 交换编排 - 把一次聊天交换的流消费、渲染安全检测和最终提取串起来
//!
//! 流程：片段 → 渲染安全检测 → `on_live`；结束 → 提取一次 → `on_final`；
//! 失败 → `on_failure(RETRY_MESSAGE)`；取消 → 不回调。

use futures::Stream;
use tracing::info;

use crate::quiz::{extract_quiz, ExtractionResult};
use crate::stream::{
    render_mode, CancelSignal, DoneMetadata, RenderMode, StreamConsumer, StreamHandler,
    StreamOutcome, StreamState,
};

/// 传输失败时展示给用户的提示
pub const RETRY_MESSAGE: &str = "Sorry, something went wrong while generating a response. Please try again.";

/// 流进行中的显示内容
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LiveView<'a> {
    /// 原样显示当前缓冲区
    Raw(&'a str),
    /// 显示"正在生成测验…"占位
    QuizPlaceholder,
}

/// 交换观察者（通常是界面层）
pub trait ExchangeObserver {
    fn on_live(&mut self, view: LiveView<'_>);
    fn on_final(&mut self, result: &ExtractionResult, metadata: &DoneMetadata);
    fn on_failure(&mut self, message: &str);
}

/// 交换结果
#[derive(Debug)]
pub enum ExchangeOutcome {
    Completed {
        /// 最终消息文本
        text: String,
        result: ExtractionResult,
        metadata: DoneMetadata,
    },
    Failed(anyhow::Error),
    Cancelled,
}

impl ExchangeOutcome {
    pub fn is_completed(&self) -> bool {
        matches!(self, Self::Completed { .. })
    }

    pub fn result(&self) -> Option<&ExtractionResult> {
        match self {
            Self::Completed { result, .. } => Some(result),
            _ => None,
        }
    }
}

/// 把流回调转换为观察者回调
struct GuardedHandler<'o, O> {
    observer: &'o mut O,
}

impl<O: ExchangeObserver> StreamHandler for GuardedHandler<'_, O> {
    fn on_fragment(&mut self, _fragment: &str, state: &StreamState) {
        match render_mode(state) {
            RenderMode::Raw => self.observer.on_live(LiveView::Raw(state.buffer())),
            RenderMode::QuizPlaceholder => self.observer.on_live(LiveView::QuizPlaceholder),
            RenderMode::Final => {}
        }
    }

    fn on_complete(&mut self, _metadata: &DoneMetadata, _state: &StreamState) {}

    fn on_error(&mut self, _error: &anyhow::Error) {
        self.observer.on_failure(RETRY_MESSAGE);
    }
}

/// 运行一次完整交换
pub async fn run_exchange<S, B, E, O>(
    stream: S,
    cancel: Option<CancelSignal>,
    observer: &mut O,
) -> ExchangeOutcome
where
    S: Stream<Item = Result<B, E>>,
    B: AsRef<[u8]>,
    E: Into<anyhow::Error>,
    O: ExchangeObserver,
{
    let mut consumer = StreamConsumer::new();
    if let Some(signal) = cancel {
        consumer = consumer.with_cancel(signal);
    }

    let outcome = {
        let mut handler = GuardedHandler {
            observer: &mut *observer,
        };
        consumer.consume(stream, &mut handler).await
    };

    finish_exchange(outcome, observer)
}

/// 响应体到达之前就失败（连接失败、非成功状态码）
pub fn reject_exchange<O: ExchangeObserver>(error: anyhow::Error, observer: &mut O) -> ExchangeOutcome {
    let outcome = {
        let mut handler = GuardedHandler {
            observer: &mut *observer,
        };
        StreamConsumer::new().reject(error, &mut handler)
    };
    finish_exchange(outcome, observer)
}

fn finish_exchange<O: ExchangeObserver>(outcome: StreamOutcome, observer: &mut O) -> ExchangeOutcome {
    match outcome {
        StreamOutcome::Completed { text, metadata } => {
            // 流里没有任何片段时，退回服务端给出的完整文本
            let text = match (&metadata.full_content, text.is_empty()) {
                (Some(full), true) => full.clone(),
                _ => text,
            };

            let result = extract_quiz(&text);
            info!(
                len = text.len(),
                questions = result.quiz.as_ref().map(|q| q.len()).unwrap_or(0),
                strategy = ?result.strategy,
                "Exchange completed"
            );
            observer.on_final(&result, &metadata);

            ExchangeOutcome::Completed {
                text,
                result,
                metadata,
            }
        }
        StreamOutcome::Failed(error) => ExchangeOutcome::Failed(error),
        StreamOutcome::Cancelled => {
            info!("Exchange cancelled");
            ExchangeOutcome::Cancelled
        }
    }
}
