//! Turns script files into a [`Script`].
//!
//! Two on-disk encodings are accepted, both holding a `lines` list of records:
//! JSON (`{"lines": [...]}`) and TOML (`[[lines]]`). Record fields are
//! `type`, `textBoxType`, `character`, `expression`, `continuationMode`,
//! `interval`, `chinese` and `english`. Every invalid record is reported, not
//! only the first one.

use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::Deserialize;

use crate::line::{ContinuationMode, Language, LineType, StoryLine, TextBoxType};
use crate::script::Script;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("line {line}: {msg}")]
pub struct ParseError {
    /// 1-based index of the record in the file.
    pub line: usize,
    pub msg: String,
}

#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("failed to read script {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("malformed JSON script: {0}")]
    Json(#[from] serde_json::Error),
    #[error("malformed TOML script: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("unsupported script format {0:?} (expected .json or .toml)")]
    UnsupportedFormat(String),
    #[error("script has {} invalid line(s)", .0.len())]
    Invalid(Vec<ParseError>),
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawLine {
    #[serde(rename = "type")]
    line_type: Option<String>,
    text_box_type: Option<String>,
    character: Option<String>,
    expression: Option<String>,
    continuation_mode: Option<String>,
    interval: Option<f32>,
    chinese: Option<String>,
    english: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawScript {
    #[serde(default)]
    lines: Vec<RawLine>,
}

pub fn parse_json(src: &str) -> Result<Script, LoadError> {
    let raw: RawScript = serde_json::from_str(src)?;
    build(raw.lines).map_err(LoadError::Invalid)
}

pub fn parse_toml(src: &str) -> Result<Script, LoadError> {
    let raw: RawScript = toml::from_str(src)?;
    build(raw.lines).map_err(LoadError::Invalid)
}

/// Reads a script file, picking the decoder from its extension.
pub fn load_file(path: impl AsRef<Path>) -> Result<Script, LoadError> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse_source(path, &content)
}

/// Decodes `src`, read from `path`, with the decoder its extension names.
///
/// Every invalid record is logged before the error is returned.
pub fn parse_source(path: &Path, src: &str) -> Result<Script, LoadError> {
    let ext = path
        .extension()
        .map(|e| e.to_string_lossy().to_ascii_lowercase())
        .unwrap_or_default();

    let result = match ext.as_str() {
        "json" => parse_json(src),
        "toml" => parse_toml(src),
        _ => return Err(LoadError::UnsupportedFormat(ext)),
    };

    if let Err(LoadError::Invalid(errors)) = &result {
        log::error!("Invalid script {:?}:", path);
        for err in errors {
            log::error!("   {}", err);
        }
    }
    result
}

fn build(raw: Vec<RawLine>) -> Result<Script, Vec<ParseError>> {
    let mut lines = Vec::with_capacity(raw.len());
    let mut errors = Vec::new();

    for (idx, record) in raw.into_iter().enumerate() {
        match convert(record) {
            Ok(line) => lines.push(line),
            Err(msg) => errors.push(ParseError { line: idx + 1, msg }),
        }
    }

    if errors.is_empty() {
        log::debug!("Parsed {} story lines", lines.len());
        Ok(Script::new(lines))
    } else {
        Err(errors)
    }
}

fn convert(raw: RawLine) -> Result<StoryLine, String> {
    let line_type = match raw.line_type.as_deref() {
        Some(tag) => LineType::from_str(tag).map_err(|e| e.to_string())?,
        None => return Err("missing required field 'type'".to_string()),
    };

    let text_box_type = optional_tag::<TextBoxType>(raw.text_box_type.as_deref())?;
    let continuation = optional_tag::<ContinuationMode>(raw.continuation_mode.as_deref())?;

    // 负数间隔视为未设置，交给播放器默认值
    let interval = raw.interval.filter(|v| v.is_finite() && *v >= 0.0);

    let mut line = StoryLine::new(line_type)
        .with_box(text_box_type)
        .with_continuation(continuation, interval);
    line.character = non_empty(raw.character);
    line.expression = non_empty(raw.expression);

    if let Some(text) = raw.chinese {
        line = line.with_text(Language::Chinese, text);
    }
    if let Some(text) = raw.english {
        line = line.with_text(Language::English, text);
    }
    Ok(line)
}

fn optional_tag<T>(raw: Option<&str>) -> Result<T, String>
where
    T: FromStr<Err = crate::line::UnknownTag> + Default,
{
    match raw.map(str::trim) {
        None | Some("") => Ok(T::default()),
        Some(tag) => T::from_str(tag).map_err(|e| e.to_string()),
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}
