use std::path::PathBuf;

use sylvan::command::Limits;
use sylvan::config::{ConfigFlags, load_config_flags, parse_flag_tokens};

#[test]
fn test_config_file_parsing_ignores_comments_and_blank_lines() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join(".sylvanrc");
    let content = r"
# comment
--verbose

--macro-depth 20

--keymap=keys/custom.map
";
    std::fs::write(&path, content).unwrap();

    let flags = load_config_flags(&path).unwrap();
    assert!(flags.verbose);
    assert_eq!(flags.macro_depth, Some(20));
    assert_eq!(flags.keymap, Some(PathBuf::from("keys/custom.map")));
}

#[test]
fn test_cli_flags_override_file_flags() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join(".sylvanrc");
    let content = "--loop-limit 10\n--history-limit 3\n--keymap file.map\n";
    std::fs::write(&path, content).unwrap();

    let file_flags = load_config_flags(&path).unwrap();
    let cli_args = vec![
        "sylvan".to_string(),
        "--loop-limit".to_string(),
        "500".to_string(),
        "--verbose".to_string(),
    ];
    let cli_flags = parse_flag_tokens(&cli_args);

    let effective = file_flags.union(&cli_flags);
    assert!(effective.verbose, "cli flags should be applied");
    assert_eq!(effective.loop_limit, Some(500), "cli should override loop limit");
    assert_eq!(
        effective.keymap,
        Some(PathBuf::from("file.map")),
        "file config should be preserved when CLI does not override"
    );
    assert_eq!(
        effective.limits(),
        Limits {
            max_depth: Limits::default().max_depth,
            loop_limit: 500,
            history_limit: 3,
        }
    );
}

#[test]
fn test_parse_flag_tokens_handles_equals_syntax() {
    let args = vec![
        "sylvan".to_string(),
        "--macro-depth=8".to_string(),
        "--history-limit=2".to_string(),
    ];
    let flags = parse_flag_tokens(&args);
    assert_eq!(flags.macro_depth, Some(8));
    assert_eq!(flags.history_limit, Some(2));
}

#[test]
fn test_missing_config_file_is_default() {
    let dir = tempfile::tempdir().unwrap();
    let flags = load_config_flags(&dir.path().join("absent")).unwrap();
    assert_eq!(flags, ConfigFlags::default());
}
