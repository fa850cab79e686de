//! 测验提取 - 行分类、结构化块、自由文本语法

pub mod classifier;
pub mod extractor;
pub mod fenced;
pub mod grammar;
pub mod types;

pub use classifier::{classify_line, collect_explanation, ends_explanation, LineKind};
pub use extractor::extract_quiz;
pub use fenced::extract_fenced_quiz;
pub use grammar::{extract_line_grammar_quiz, QuestionDraft, QuizScanner, ScanState};
pub use types::{
    Difficulty, ExtractionResult, ExtractionStrategy, QuizDocument, QuizQuestionRecord,
    DEFAULT_QUIZ_TITLE,
};
