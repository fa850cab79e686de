//! 自由文本测验语法（回退策略）
//!
//! 逐行扫描，借助 [`classify_line`] 维护显式状态机：
//!
//! ```text
//! SEEKING --题目行--> IN_QUESTION --选项/答案/解析--> IN_QUESTION
//! IN_QUESTION --题目行 / 输入结束--> 提交当前题目，回到 SEEKING 或开始下一题
//! ```
//!
//! 第一道题之前的行原样保留为引言（remaining_text）；题目之间夹杂的其他文本被丢弃。

use tracing::debug;

use crate::quiz::classifier::{classify_line, collect_explanation, LineKind};
use crate::quiz::types::{
    letter_to_index, Difficulty, ExtractionResult, ExtractionStrategy, QuizDocument,
    QuizQuestionRecord, DEFAULT_QUIZ_TITLE,
};

/// 正在累积的题目
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QuestionDraft {
    pub number: Option<u32>,
    pub text: String,
    pub options: Vec<DraftOption>,
    /// 答案行给出的下标（未校验范围）
    pub answer: Option<usize>,
    pub explanation: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DraftOption {
    pub text: String,
    pub inline_correct: bool,
}

impl QuestionDraft {
    fn new(number: Option<u32>, text: String) -> Self {
        Self {
            number,
            text,
            ..Default::default()
        }
    }

    /// 正确选项下标：答案行优先，其次第一个内联标记，都没有时为 0
    pub fn resolve_correct_index(&self) -> usize {
        if let Some(answer) = self.answer {
            if answer < self.options.len() {
                return answer;
            }
        }
        self.options
            .iter()
            .position(|o| o.inline_correct)
            .unwrap_or(0)
    }

    /// 提交题目；题干为空或选项少于 2 个时返回 `None`
    pub fn commit(self) -> Option<QuizQuestionRecord> {
        let correct = self.resolve_correct_index();
        let options = self.options.into_iter().map(|o| o.text).collect();
        QuizQuestionRecord::new(
            self.text.trim(),
            options,
            correct,
            self.explanation.filter(|e| !e.is_empty()),
            Difficulty::Medium,
        )
    }

    fn accepts_stem_continuation(&self) -> bool {
        self.options.is_empty() && self.answer.is_none() && self.explanation.is_none()
    }
}

/// 扫描状态
#[derive(Debug, Clone, PartialEq)]
pub enum ScanState {
    /// 尚未进入题目
    Seeking,
    /// 正在累积一道题
    InQuestion(QuestionDraft),
}

/// 行语法扫描器
///
/// 每次提取都新建一个实例，不共享任何全局状态。
#[derive(Debug)]
pub struct QuizScanner<'a> {
    state: ScanState,
    intro: Vec<&'a str>,
    questions: Vec<QuizQuestionRecord>,
    seen_question: bool,
}

impl<'a> QuizScanner<'a> {
    pub fn new() -> Self {
        Self {
            state: ScanState::Seeking,
            intro: Vec::new(),
            questions: Vec::new(),
            seen_question: false,
        }
    }

    pub fn state(&self) -> &ScanState {
        &self.state
    }

    /// 处理 `lines[index]`，返回下一个待处理的行号
    pub fn feed(&mut self, lines: &[&'a str], index: usize) -> usize {
        let line = lines[index];
        let kind = classify_line(line);

        if let LineKind::QuestionHeader { index: number, text } = kind {
            self.commit_current();
            self.seen_question = true;
            self.state = ScanState::InQuestion(QuestionDraft::new(number, text));
            return index + 1;
        }

        let ScanState::InQuestion(draft) = &mut self.state else {
            if !self.seen_question {
                self.intro.push(line);
            }
            return index + 1;
        };

        match kind {
            LineKind::OptionLine {
                text,
                inline_correct_hint,
                ..
            } => {
                draft.options.push(DraftOption {
                    text,
                    inline_correct: inline_correct_hint,
                });
            }
            LineKind::AnswerMarker { letter } => {
                draft.answer = letter_to_index(letter);
            }
            LineKind::ExplanationHeader { .. } => {
                let (explanation, next) = collect_explanation(lines, index);
                draft.explanation = Some(explanation);
                return next;
            }
            LineKind::Unclassified => {
                let trimmed = line.trim();
                if !trimmed.is_empty() && draft.accepts_stem_continuation() {
                    if !draft.text.is_empty() {
                        draft.text.push('\n');
                    }
                    draft.text.push_str(trimmed);
                }
            }
            LineKind::QuestionHeader { .. } => unreachable!("handled above"),
        }

        index + 1
    }

    /// 结束扫描，至少提交了一道题时返回测验
    pub fn finish(mut self) -> Option<ExtractionResult> {
        self.commit_current();

        if self.questions.is_empty() {
            return None;
        }

        let remaining_text = self.intro.join("\n").trim().to_string();
        Some(ExtractionResult {
            quiz: Some(QuizDocument::new(DEFAULT_QUIZ_TITLE, self.questions)),
            remaining_text,
            strategy: Some(ExtractionStrategy::LineGrammar),
        })
    }

    fn commit_current(&mut self) {
        let state = std::mem::replace(&mut self.state, ScanState::Seeking);
        if let ScanState::InQuestion(draft) = state {
            let number = draft.number;
            let option_count = draft.options.len();
            match draft.commit() {
                Some(record) => self.questions.push(record),
                None => debug!(
                    number = ?number,
                    options = option_count,
                    "Dropping incomplete question"
                ),
            }
        }
    }
}

impl Default for QuizScanner<'_> {
    fn default() -> Self {
        Self::new()
    }
}

/// 用行语法提取测验；没有任何题目成功提交时返回 `None`
pub fn extract_line_grammar_quiz(text: &str) -> Option<ExtractionResult> {
    let lines: Vec<&str> = text.lines().collect();
    let mut scanner = QuizScanner::new();

    let mut index = 0;
    while index < lines.len() {
        index = scanner.feed(&lines, index);
    }

    scanner.finish()
}
