//! LLM Prompt 模板
//!
//! 三种详细程度各对应一个固定的讲解 Prompt，以及带行号的源码转写。

use super::types::DetailLevel;

/// 输出格式约定（三个模板共用）
const OUTPUT_FORMAT: &str = r#"Respond with a single JSON object and nothing else, using exactly this shape:

{
  "sections": [
    {
      "lines": [{ "start": 1, "end": 4 }],
      "text": "Markdown explanation of the referenced lines."
    }
  ]
}

Rules:
- Every input line is prefixed with its 1-based line number followed by ": ". Use those numbers for "start" and "end" (inclusive).
- A section may reference several ranges, or none at all when it talks about the file as a whole.
- Order sections the way a reader should read them, not necessarily by line number.
- "text" is Markdown. Do not repeat the code itself; explain it."#;

/// 入门讲解 Prompt
pub const BEGINNER_PROMPT: &str = r#"You are a patient mentor walking a newcomer through an unfamiliar source file.

Explain what each part of the file does and, above all, why it is written that way. Assume the reader knows basic programming but not this language's idioms or this project's domain. Define jargon the first time it appears, prefer short paragraphs, and point out conventions a beginner would not recognise."#;

/// 中级讲解 Prompt
pub const INTERMEDIATE_PROMPT: &str = r#"You are an experienced engineer documenting a source file for a colleague who is new to this codebase.

Focus on intent and rationale: why the code is structured this way, what constraints it works under, which trade-offs it makes, and how the pieces fit together. Skip explanations of basic language features."#;

/// 高级讲解 Prompt
pub const ADVANCED_PROMPT: &str = r#"You are a senior engineer reviewing a source file with an expert peer.

Be concise and dense. Concentrate on non-obvious design decisions, invariants, edge cases, performance or concurrency implications, and anything surprising. Do not explain routine code."#;

/// 根据详细程度选择 Prompt，并附加输出格式约定
pub fn prompt_for_level(level: DetailLevel) -> String {
    let persona = match level {
        DetailLevel::Beginner => BEGINNER_PROMPT,
        DetailLevel::Intermediate => INTERMEDIATE_PROMPT,
        DetailLevel::Advanced => ADVANCED_PROMPT,
    };
    format!("{}\n\n{}", persona, OUTPUT_FORMAT)
}

/// 生成带行号的源码转写
///
/// 例如 `"a\nb"` -> `"1: a\n2: b"`。兼容 `\r\n` 换行，空内容得到空字符串。
pub fn numbered_transcript(content: &str) -> String {
    content
        .lines()
        .enumerate()
        .map(|(index, line)| format!("{}: {}", index + 1, line))
        .collect::<Vec<_>>()
        .join("\n")
}
