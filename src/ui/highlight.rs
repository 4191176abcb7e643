use ratatui::{
    style::{Color, Modifier, Style},
    text::{Line, Span},
};
use std::path::Path;

/// Languages with keyword colouring
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Language {
    Cpp,
    Python,
    JavaScript,
    Java,
    Json,
}

const CPP_KEYWORDS: &[&str] = &[
    "int", "for", "if", "else", "while", "return", "switch", "case", "break", "const", "void",
    "class", "public", "private", "protected", "struct", "new", "delete", "virtual", "override",
    "static", "using", "namespace", "include", "this", "template", "typename", "auto", "long",
    "short", "unsigned", "signed", "operator", "try", "catch", "throw",
];

const PYTHON_KEYWORDS: &[&str] = &[
    "def", "if", "else", "elif", "for", "while", "return", "import", "from", "class", "try",
    "except", "finally", "with", "as", "lambda", "pass", "break", "continue", "yield", "in", "is",
    "not", "and", "or", "print", "self", "global", "nonlocal", "assert", "del", "raise",
];

const JS_KEYWORDS: &[&str] = &[
    "function", "var", "let", "const", "if", "else", "for", "while", "return", "switch", "case",
    "break", "class", "constructor", "new", "import", "export", "extends", "from", "try", "catch",
    "finally", "throw",
];

const JAVA_KEYWORDS: &[&str] = &[
    "int", "public", "private", "protected", "void", "class", "static", "final", "return", "if",
    "else", "for", "while", "switch", "case", "break", "new", "import", "package", "extends",
    "implements", "try", "catch", "finally", "this", "super",
];

const JSON_KEYWORDS: &[&str] = &["true", "false", "null"];

impl Language {
    pub fn from_path(path: &Path) -> Option<Self> {
        match path.extension()?.to_str()? {
            "cpp" => Some(Language::Cpp),
            "py" => Some(Language::Python),
            "js" => Some(Language::JavaScript),
            "java" => Some(Language::Java),
            "json" => Some(Language::Json),
            _ => None,
        }
    }

    fn keywords(&self) -> &'static [&'static str] {
        match self {
            Language::Cpp => CPP_KEYWORDS,
            Language::Python => PYTHON_KEYWORDS,
            Language::JavaScript => JS_KEYWORDS,
            Language::Java => JAVA_KEYWORDS,
            Language::Json => JSON_KEYWORDS,
        }
    }

    fn line_comment(&self) -> Option<&'static str> {
        match self {
            Language::Cpp | Language::Java | Language::JavaScript => Some("//"),
            Language::Python => Some("#"),
            Language::Json => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenClass {
    Plain,
    Keyword,
    Str,
    Comment,
    Number,
}

impl TokenClass {
    fn style(&self) -> Style {
        match self {
            TokenClass::Plain => Style::default(),
            TokenClass::Keyword => Style::default().fg(Color::Blue),
            TokenClass::Str => Style::default().fg(Color::Green),
            TokenClass::Comment => Style::default().fg(Color::Cyan),
            TokenClass::Number => Style::default().fg(Color::Magenta),
        }
    }
}

/// Class of every character of `line`
pub fn classify(line: &str, language: Language) -> Vec<TokenClass> {
    let chars: Vec<char> = line.chars().collect();
    let mut classes = vec![TokenClass::Plain; chars.len()];
    let comment: Option<Vec<char>> = language.line_comment().map(|c| c.chars().collect());
    let mut pos = 0;

    while pos < chars.len() {
        let ch = chars[pos];

        if let Some(marker) = &comment {
            if chars[pos..].starts_with(marker) {
                classes[pos..].fill(TokenClass::Comment);
                break;
            }
        }

        match ch {
            '"' | '\'' => {
                let start = pos;
                pos += 1;
                while pos < chars.len() {
                    let closing = chars[pos] == ch;
                    pos += 1;
                    if closing {
                        break;
                    }
                }
                classes[start..pos].fill(TokenClass::Str);
            }
            c if c.is_alphabetic() || c == '_' => {
                let start = pos;
                while pos < chars.len() && (chars[pos].is_alphanumeric() || chars[pos] == '_') {
                    pos += 1;
                }
                let word: String = chars[start..pos].iter().collect();
                if language.keywords().contains(&word.as_str()) {
                    classes[start..pos].fill(TokenClass::Keyword);
                }
            }
            c if c.is_ascii_digit() => {
                let start = pos;
                while pos < chars.len() && chars[pos].is_ascii_digit() {
                    pos += 1;
                }
                classes[start..pos].fill(TokenClass::Number);
            }
            _ => pos += 1,
        }
    }

    classes
}

/// Style a line for display. `mark` is a `(col, len)` character range drawn
/// as a search hit on top of the syntax colours.
pub fn render_line(line: &str, language: Option<Language>, mark: Option<(usize, usize)>) -> Line<'static> {
    let classes = match language {
        Some(language) => classify(line, language),
        None => vec![TokenClass::Plain; line.chars().count()],
    };
    let hit = Style::default()
        .fg(Color::Yellow)
        .add_modifier(Modifier::REVERSED);

    let mut spans = Vec::new();
    let mut run = String::new();
    let mut run_style = Style::default();

    for (i, ch) in line.chars().enumerate() {
        let style = match mark {
            Some((col, len)) if i >= col && i < col + len => hit,
            _ => classes[i].style(),
        };
        if style != run_style && !run.is_empty() {
            spans.push(Span::styled(std::mem::take(&mut run), run_style));
        }
        run_style = style;
        // One cell per character keeps cursor columns aligned
        run.push(if ch == '\t' { ' ' } else { ch });
    }
    if !run.is_empty() {
        spans.push(Span::styled(run, run_style));
    }

    Line::from(spans)
}
