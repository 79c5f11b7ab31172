use std::path::Path;

use cg_script::{parse_json, parse_source, parse_toml, ContinuationMode, Language, LineType, LoadError, TextBoxType};

#[test]
fn test_json_chapter() {
    let input = r#"
{
  "lines": [
    { "type": "Scene" },
    { "type": "Narration", "chinese": "很久以前", "english": "Long ago", "interval": 2.5 },
    { "type": "dialog", "textBoxType": "NoAvatar", "character": "bob", "expression": "smile",
      "continuationMode": "Click", "english": "Hi" },
    { "type": "PlayAnimation" }
  ]
}
"#;
    let script = parse_json(input).unwrap_or_else(|e| panic!("Parse failed: {:#?}", e));
    assert_eq!(script.len(), 4);

    let narration = script.get(1).unwrap();
    assert_eq!(narration.line_type, LineType::Narration);
    assert_eq!(narration.text(Language::Chinese), "很久以前");
    assert_eq!(narration.interval, Some(2.5));
    assert_eq!(narration.continuation, ContinuationMode::Interval);

    let dialog = script.get(2).unwrap();
    assert_eq!(dialog.text_box_type, TextBoxType::NoAvatar);
    assert_eq!(dialog.character.as_deref(), Some("bob"));
    assert_eq!(dialog.expression.as_deref(), Some("smile"));
    assert_eq!(dialog.continuation, ContinuationMode::Click);
    assert_eq!(dialog.text(Language::Chinese), "");
}

#[test]
fn test_toml_chapter() {
    let input = r#"
[[lines]]
type = "Scene"

[[lines]]
type = "Dialog"
textBoxType = "ReserveAfterScene"
character = "alice"
interval = 0
english = "Morning."
"#;
    let script = parse_toml(input).unwrap_or_else(|e| panic!("Parse failed: {:#?}", e));
    assert_eq!(script.len(), 2);
    let dialog = script.get(1).unwrap();
    assert!(dialog.text_box_type.reserves_narration());
    assert_eq!(dialog.interval, Some(0.0));
}

#[test]
fn test_every_bad_record_is_reported() {
    let input = r#"
{ "lines": [
    { "type": "Scene" },
    { "type": "Cutscene" },
    { "english": "no type" },
    { "type": "Dialog", "textBoxType": "Bubble" }
] }
"#;
    match parse_json(input) {
        Err(LoadError::Invalid(errs)) => {
            assert_eq!(errs.len(), 3);
            assert_eq!(errs[0].line, 2);
            assert!(errs[0].msg.contains("Cutscene"));
            assert_eq!(errs[1].line, 3);
            assert!(errs[1].msg.contains("type"));
            assert_eq!(errs[2].line, 4);
        }
        other => panic!("expected invalid lines, got {:?}", other),
    }
}

#[test]
fn test_negative_interval_means_default() {
    let script = parse_json(r#"{ "lines": [ { "type": "Narration", "interval": -1 } ] }"#).unwrap();
    assert_eq!(script.get(0).unwrap().interval, None);
}

#[test]
fn test_syntax_error() {
    assert!(matches!(parse_json("{ \"lines\": [ "), Err(LoadError::Json(_))));
    assert!(matches!(parse_toml("[[lines]\ntype ="), Err(LoadError::Toml(_))));
}

#[test]
fn test_unsupported_extension() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("chapter.xml");
    std::fs::write(&path, "<Lines/>").unwrap();

    let res = cg_script::load_file(&path);
    assert!(matches!(res, Err(LoadError::UnsupportedFormat(ext)) if ext == "xml"));
}

#[test]
fn test_source_decoder_follows_extension() {
    let toml = "[[lines]]\ntype = \"Scene\"\n";
    let script = parse_source(Path::new("chapter/SCRIPT.TOML"), toml).unwrap();
    assert_eq!(script.len(), 1);

    let bad = r#"{ "lines": [ { "type": "Scene" }, { "type": "Cutscene" } ] }"#;
    match parse_source(Path::new("script.json"), bad) {
        Err(LoadError::Invalid(errs)) => assert_eq!(errs[0].line, 2),
        other => panic!("expected invalid lines, got {:?}", other),
    }
}
