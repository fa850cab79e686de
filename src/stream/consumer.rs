//! 流消费模块 - 驱动一次聊天交换的响应流
//!
//! 状态只有 `Open` 和 `Closed` 两种。每个块被切成行，逐行解析为记录：
//! - 片段记录追加到缓冲区并触发 `on_fragment(fragment, state)`
//! - 结束记录关闭流并触发 `on_complete(metadata, state)`
//! - 传输层报错（结束记录之前）关闭流并触发 `on_error`
//! - 取消时关闭流，不触发任何回调，未成行的字节被丢弃
//!
//! 单行 JSON 损坏只会跳过该行，不会中断整个交换。这里不做重试，
//! 重试和超时属于调用方策略。

use futures::{Stream, StreamExt};
use serde::{Deserialize, Serialize};
use tokio::sync::watch;
use tracing::{debug, trace, warn};

use crate::stream::decoder::LineDecoder;
use crate::stream::record::{parse_record_line, DoneMetadata, StreamRecord};

// ============================================================================
// StreamState - 交换状态
// ============================================================================

/// 流状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StreamPhase {
    Open,
    Closed,
}

/// 单次交换的临时状态，交换结束即销毁，不做持久化
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamState {
    buffer: String,
    phase: StreamPhase,
}

impl StreamState {
    pub fn new() -> Self {
        Self {
            buffer: String::new(),
            phase: StreamPhase::Open,
        }
    }

    /// 到目前为止累积的完整文本
    pub fn buffer(&self) -> &str {
        &self.buffer
    }

    pub fn is_open(&self) -> bool {
        self.phase == StreamPhase::Open
    }

    fn append(&mut self, fragment: &str) {
        self.buffer.push_str(fragment);
    }

    fn close(&mut self) {
        self.phase = StreamPhase::Closed;
    }
}

impl Default for StreamState {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// 回调与结果
// ============================================================================

/// 调用方提供的回调
pub trait StreamHandler {
    /// 收到增量片段；`state.buffer()` 已包含该片段
    fn on_fragment(&mut self, fragment: &str, state: &StreamState);

    /// 收到结束标记（或传输正常结束）；此时 `state.is_open()` 为 false
    fn on_complete(&mut self, metadata: &DoneMetadata, state: &StreamState);

    /// 传输失败；部分缓冲区不应被信任
    fn on_error(&mut self, error: &anyhow::Error);
}

/// 交换的最终结果
#[derive(Debug)]
pub enum StreamOutcome {
    /// 正常结束，`text` 为最终消息文本（按值移交）
    Completed { text: String, metadata: DoneMetadata },
    /// 传输失败，部分内容已丢弃
    Failed(anyhow::Error),
    /// 被取消
    Cancelled,
}

impl StreamOutcome {
    pub fn is_completed(&self) -> bool {
        matches!(self, Self::Completed { .. })
    }

    /// 最终文本（仅 Completed）
    pub fn text(&self) -> Option<&str> {
        match self {
            Self::Completed { text, .. } => Some(text),
            _ => None,
        }
    }
}

// ============================================================================
// 取消
// ============================================================================

/// 取消句柄，由发起交换的一方持有
#[derive(Debug)]
pub struct CancelHandle {
    tx: watch::Sender<bool>,
}

/// 取消信号，交给消费者
#[derive(Debug, Clone)]
pub struct CancelSignal {
    rx: watch::Receiver<bool>,
}

/// 创建一对取消句柄/信号
pub fn cancel_pair() -> (CancelHandle, CancelSignal) {
    let (tx, rx) = watch::channel(false);
    (CancelHandle { tx }, CancelSignal { rx })
}

impl CancelHandle {
    /// 请求取消（可重复调用）
    pub fn cancel(&self) {
        self.tx.send_replace(true);
    }
}

impl CancelSignal {
    pub fn is_cancelled(&self) -> bool {
        *self.rx.borrow()
    }

    /// 等待取消；句柄被丢弃且未取消时永远不会完成
    pub async fn cancelled(&mut self) {
        let sender_dropped = self.rx.wait_for(|cancelled| *cancelled).await.is_err();
        if sender_dropped {
            std::future::pending::<()>().await;
        }
    }
}

// ============================================================================
// StreamConsumer
// ============================================================================

enum Step<B> {
    Chunk(B),
    Failed(anyhow::Error),
    Eof,
    Cancelled,
}

/// 流消费者，每次交换一个实例，按值消费保证只结束一次
#[derive(Debug)]
pub struct StreamConsumer {
    state: StreamState,
    decoder: LineDecoder,
    cancel: Option<CancelSignal>,
}

impl StreamConsumer {
    pub fn new() -> Self {
        Self {
            state: StreamState::new(),
            decoder: LineDecoder::new(),
            cancel: None,
        }
    }

    /// 绑定取消信号
    pub fn with_cancel(mut self, signal: CancelSignal) -> Self {
        self.cancel = Some(signal);
        self
    }

    pub fn state(&self) -> &StreamState {
        &self.state
    }

    /// 传输层在响应体之前就失败（连接失败、非成功状态码）
    pub fn reject<H: StreamHandler>(mut self, error: anyhow::Error, handler: &mut H) -> StreamOutcome {
        self.fail(error, handler)
    }

    /// 消费响应流直到结束标记、传输结束、传输错误或取消
    pub async fn consume<S, B, E, H>(mut self, stream: S, handler: &mut H) -> StreamOutcome
    where
        S: Stream<Item = Result<B, E>>,
        B: AsRef<[u8]>,
        E: Into<anyhow::Error>,
        H: StreamHandler,
    {
        let mut stream = std::pin::pin!(stream);

        loop {
            let step = match self.cancel.as_mut() {
                Some(signal) => tokio::select! {
                    biased;
                    _ = signal.cancelled() => Step::Cancelled,
                    item = stream.next() => Self::step_from(item),
                },
                None => Self::step_from(stream.next().await),
            };

            match step {
                Step::Chunk(bytes) => {
                    let lines = self.decoder.push(bytes.as_ref());
                    for line in lines {
                        if let Some(outcome) = self.handle_line(&line, handler) {
                            return outcome;
                        }
                    }
                }
                Step::Eof => {
                    if let Some(line) = self.decoder.finish() {
                        if let Some(outcome) = self.handle_line(&line, handler) {
                            return outcome;
                        }
                    }
                    debug!(
                        len = self.state.buffer.len(),
                        "Stream ended without done record"
                    );
                    return self.complete(DoneMetadata::default(), handler);
                }
                Step::Failed(error) => return self.fail(error, handler),
                Step::Cancelled => {
                    debug!(
                        dropped_bytes = self.decoder.pending_len(),
                        "Stream cancelled"
                    );
                    self.state.close();
                    return StreamOutcome::Cancelled;
                }
            }
        }
    }

    fn step_from<B, E: Into<anyhow::Error>>(item: Option<Result<B, E>>) -> Step<B> {
        match item {
            Some(Ok(bytes)) => Step::Chunk(bytes),
            Some(Err(e)) => Step::Failed(e.into()),
            None => Step::Eof,
        }
    }

    /// 处理一行；流因此结束时返回结果
    fn handle_line<H: StreamHandler>(&mut self, line: &str, handler: &mut H) -> Option<StreamOutcome> {
        if line.trim().is_empty() {
            return None;
        }

        let Some(record) = parse_record_line(line) else {
            debug!(line = %line, "Skipping malformed stream record");
            return None;
        };

        match record {
            StreamRecord::Content(fragment) => {
                trace!(len = fragment.len(), "Stream fragment");
                self.state.append(&fragment);
                handler.on_fragment(&fragment, &self.state);
                None
            }
            StreamRecord::Done { content, metadata } => {
                if let Some(fragment) = content {
                    self.state.append(&fragment);
                    handler.on_fragment(&fragment, &self.state);
                }
                Some(self.complete(metadata, handler))
            }
        }
    }

    fn complete<H: StreamHandler>(&mut self, metadata: DoneMetadata, handler: &mut H) -> StreamOutcome {
        self.state.close();
        if metadata.reported_failure() {
            warn!(error = ?metadata.error, "Server reported a failed response");
        }
        handler.on_complete(&metadata, &self.state);
        StreamOutcome::Completed {
            text: std::mem::take(&mut self.state.buffer),
            metadata,
        }
    }

    fn fail<H: StreamHandler>(&mut self, error: anyhow::Error, handler: &mut H) -> StreamOutcome {
        self.state.close();
        warn!(error = %error, "Chat stream failed");
        handler.on_error(&error);
        StreamOutcome::Failed(error)
    }
}

impl Default for StreamConsumer {
    fn default() -> Self {
        Self::new()
    }
}
