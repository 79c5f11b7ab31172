pub mod line;
pub mod parser;
pub mod script;

pub use line::{ContinuationMode, DialogBoxType, Language, LineType, StoryLine, TextBoxType};
pub use parser::{load_file, parse_json, parse_source, parse_toml, LoadError, ParseError};
pub use script::{Script, ScriptCursor};
