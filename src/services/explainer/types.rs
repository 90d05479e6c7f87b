//! 讲解文档类型定义
//!
//! 定义讲解详细程度、行号范围、文档段落等核心类型

use serde::{Deserialize, Serialize};
use std::fmt;

/// 讲解详细程度
///
/// 解析是宽松的：无法识别的取值一律回退到 `Intermediate`，永远不会报错。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", from = "String")]
pub enum DetailLevel {
    /// 入门
    Beginner,
    /// 中级（默认）
    #[default]
    Intermediate,
    /// 高级
    Advanced,
}

impl DetailLevel {
    /// 规范名称（参与指纹计算，不可更改）
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Beginner => "beginner",
            Self::Intermediate => "intermediate",
            Self::Advanced => "advanced",
        }
    }

    /// 宽松解析，未知取值回退到中级
    pub fn parse_lenient(value: &str) -> Self {
        match value.trim().to_lowercase().as_str() {
            "beginner" => Self::Beginner,
            "advanced" => Self::Advanced,
            _ => Self::Intermediate,
        }
    }
}

impl From<String> for DetailLevel {
    fn from(value: String) -> Self {
        Self::parse_lenient(&value)
    }
}

impl fmt::Display for DetailLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 行号范围（1 起始，闭区间）
///
/// 保存模型返回的原始数值，不做任何裁剪或修正。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineRange {
    pub start: u32,
    pub end: u32,
}

impl LineRange {
    #[cfg(test)]
    pub fn new(start: u32, end: u32) -> Self {
        Self { start, end }
    }

    /// 是否满足 `1 <= start <= end`
    pub fn is_well_formed(&self) -> bool {
        self.start >= 1 && self.end >= self.start
    }

    /// 是否包含指定行（用于高亮选中行所在的段落）
    pub fn contains(&self, line: u32) -> bool {
        line >= self.start && line <= self.end
    }
}

/// 文档段落
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentationSection {
    /// 关联的行号范围，按叙述顺序排列，可以为空
    #[serde(default)]
    pub lines: Vec<LineRange>,
    /// Markdown 文本
    pub text: String,
}

impl DocumentationSection {
    #[cfg(test)]
    pub fn new(lines: Vec<LineRange>, text: impl Into<String>) -> Self {
        Self {
            lines,
            text: text.into(),
        }
    }

    /// 段落是否覆盖指定行
    pub fn covers_line(&self, line: u32) -> bool {
        self.lines.iter().any(|range| range.contains(line))
    }
}

/// 完整的讲解文档
///
/// `sections` 为空表示“模型没有产出内容”，与“尚未生成”不同。
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Documentation {
    pub sections: Vec<DocumentationSection>,
}

impl Documentation {
    pub fn new(sections: Vec<DocumentationSection>) -> Self {
        Self { sections }
    }

    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }

    /// 查找覆盖指定行的第一个段落下标
    pub fn section_for_line(&self, line: u32) -> Option<usize> {
        self.sections.iter().position(|s| s.covers_line(line))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detail_level_lenient_parse() {
        assert_eq!(DetailLevel::parse_lenient("beginner"), DetailLevel::Beginner);
        assert_eq!(DetailLevel::parse_lenient(" Advanced "), DetailLevel::Advanced);
        assert_eq!(DetailLevel::parse_lenient("intermediate"), DetailLevel::Intermediate);
        assert_eq!(DetailLevel::parse_lenient("expert"), DetailLevel::Intermediate);
        assert_eq!(DetailLevel::parse_lenient(""), DetailLevel::Intermediate);
    }

    #[test]
    fn test_detail_level_serde() {
        let level: DetailLevel = serde_json::from_str("\"advanced\"").unwrap();
        assert_eq!(level, DetailLevel::Advanced);

        let level: DetailLevel = serde_json::from_str("\"something-else\"").unwrap();
        assert_eq!(level, DetailLevel::Intermediate);

        assert_eq!(serde_json::to_string(&DetailLevel::Beginner).unwrap(), "\"beginner\"");
    }

    #[test]
    fn test_section_without_lines_is_tolerated() {
        let json = r#"{"sections":[{"text":"overview"},{"lines":[{"start":3,"end":1}],"text":"odd"}]}"#;
        let doc: Documentation = serde_json::from_str(json).unwrap();

        assert_eq!(doc.sections.len(), 2);
        assert!(doc.sections[0].lines.is_empty());
        // 倒序范围原样保留
        assert_eq!(doc.sections[1].lines[0], LineRange::new(3, 1));
        assert!(!doc.sections[1].lines[0].is_well_formed());
    }

    #[test]
    fn test_section_for_line() {
        let doc = Documentation::new(vec![
            DocumentationSection::new(vec![LineRange::new(5, 8)], "b"),
            DocumentationSection::new(vec![LineRange::new(1, 2), LineRange::new(7, 7)], "a"),
        ]);

        assert_eq!(doc.section_for_line(7), Some(0));
        assert_eq!(doc.section_for_line(2), Some(1));
        assert_eq!(doc.section_for_line(4), None);
    }
}
