//! 终端渲染 - 把交换过程实时输出到终端
//!
//! 普通文本按增量打印；一旦缓冲区像测验，只打印一次占位提示，
//! 之后的内容等流结束、提取完成后整体打印。

use std::io::Write;

use crate::cli::output::format_result;
use crate::exchange::{ExchangeObserver, LiveView};
use crate::quiz::ExtractionResult;
use crate::stream::DoneMetadata;

/// 占位提示
pub const QUIZ_PLACEHOLDER: &str = "⏳ 正在生成测验…";

/// 终端观察者
pub struct TerminalRenderer<W: Write> {
    out: W,
    /// 已增量打印的字节数
    printed: usize,
    placeholder_shown: bool,
    reveal_answers: bool,
}

impl TerminalRenderer<std::io::Stdout> {
    pub fn stdout(reveal_answers: bool) -> Self {
        Self::new(std::io::stdout(), reveal_answers)
    }
}

impl<W: Write> TerminalRenderer<W> {
    pub fn new(out: W, reveal_answers: bool) -> Self {
        Self {
            out,
            printed: 0,
            placeholder_shown: false,
            reveal_answers,
        }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> ExchangeObserver for TerminalRenderer<W> {
    fn on_live(&mut self, view: LiveView<'_>) {
        match view {
            LiveView::Raw(buffer) => {
                if self.placeholder_shown {
                    return;
                }
                if let Some(delta) = buffer.get(self.printed..) {
                    let _ = write!(self.out, "{}", delta);
                    let _ = self.out.flush();
                    self.printed = buffer.len();
                }
            }
            LiveView::QuizPlaceholder => {
                if !self.placeholder_shown {
                    self.placeholder_shown = true;
                    let _ = writeln!(self.out, "\n{}", QUIZ_PLACEHOLDER);
                    let _ = self.out.flush();
                }
            }
        }
    }

    fn on_final(&mut self, result: &ExtractionResult, metadata: &DoneMetadata) {
        // 纯文本且已完整打印过，只补换行
        let fully_streamed =
            !self.placeholder_shown && !result.has_quiz() && self.printed > 0;

        if fully_streamed {
            let _ = writeln!(self.out);
        } else {
            if self.printed > 0 {
                let _ = writeln!(self.out, "\n");
            }
            let _ = write!(self.out, "{}", format_result(result, self.reveal_answers));
        }

        if metadata.reported_failure() {
            let _ = writeln!(
                self.out,
                "⚠️  {}",
                metadata.error.as_deref().unwrap_or("服务端未能生成回复")
            );
        }
        let _ = self.out.flush();
    }

    fn on_failure(&mut self, message: &str) {
        let _ = writeln!(self.out, "\n❌ {}", message);
        let _ = self.out.flush();
    }
}

/// `--json` 模式下不做实时输出
#[derive(Debug, Default)]
pub struct SilentObserver;

impl ExchangeObserver for SilentObserver {
    fn on_live(&mut self, _view: LiveView<'_>) {}
    fn on_final(&mut self, _result: &ExtractionResult, _metadata: &DoneMetadata) {}
    fn on_failure(&mut self, _message: &str) {}
}
