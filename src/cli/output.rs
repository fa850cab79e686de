//! Output formatting for CLI commands

use serde::Serialize;

use crate::exchange::ExchangeOutcome;
use crate::quiz::types::index_to_letter;
use crate::quiz::{ExtractionResult, QuizDocument};
use crate::stream::DoneMetadata;

/// Format output as pretty JSON
pub fn format_output<T: Serialize>(data: &T) -> String {
    serde_json::to_string_pretty(data).unwrap_or_else(|_| "{}".to_string())
}

/// 渲染测验；`reveal_answers` 为 false 时不显示答案与解析
pub fn format_quiz(quiz: &QuizDocument, reveal_answers: bool) -> String {
    let mut out = format!("📝 {} ({} 题)\n", quiz.title, quiz.len());

    for (i, question) in quiz.questions.iter().enumerate() {
        out.push_str(&format!("\n{}. {}\n", i + 1, question.question_text));
        for (j, option) in question.options.iter().enumerate() {
            let marker = if reveal_answers && j == question.correct_option_index {
                " ✓"
            } else {
                ""
            };
            out.push_str(&format!(
                "   {}) {}{}\n",
                index_to_letter(j),
                option,
                marker
            ));
        }
        if reveal_answers {
            out.push_str(&format!(
                "   答案: {} [{}]\n",
                question.correct_letter(),
                question.difficulty.as_str()
            ));
            if let Some(explanation) = &question.explanation {
                out.push_str(&format!("   解析: {}\n", explanation.replace('\n', "\n         ")));
            }
        }
    }

    out
}

/// 渲染完整提取结果：引言 + 测验
pub fn format_result(result: &ExtractionResult, reveal_answers: bool) -> String {
    let mut out = String::new();
    if !result.remaining_text.is_empty() {
        out.push_str(&result.remaining_text);
        out.push('\n');
    }
    if let Some(quiz) = &result.quiz {
        if !out.is_empty() {
            out.push('\n');
        }
        out.push_str(&format_quiz(quiz, reveal_answers));
    }
    out
}

/// `--json` 模式下一次交换的输出
#[derive(Debug, Serialize)]
pub struct ExchangeReport<'a> {
    pub status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<&'a ExtractionResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<&'a DoneMetadata>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<'a> ExchangeReport<'a> {
    pub fn from_outcome(outcome: &'a ExchangeOutcome) -> Self {
        match outcome {
            ExchangeOutcome::Completed {
                text,
                result,
                metadata,
            } => Self {
                status: "completed",
                text: Some(text),
                result: Some(result),
                metadata: Some(metadata),
                error: None,
            },
            ExchangeOutcome::Failed(error) => Self {
                status: "failed",
                text: None,
                result: None,
                metadata: None,
                error: Some(format!("{:#}", error)),
            },
            ExchangeOutcome::Cancelled => Self {
                status: "cancelled",
                text: None,
                result: None,
                metadata: None,
                error: None,
            },
        }
    }
}
