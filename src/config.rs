use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::command::Limits;

/// Settings that can come from the command line or a config file.
///
/// Config files hold the same flags as the command line, one or more per
/// line, with `#` comments.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ConfigFlags {
    pub macro_depth: Option<usize>,
    pub loop_limit: Option<usize>,
    pub history_limit: Option<usize>,
    pub keymap: Option<PathBuf>,
    pub verbose: bool,
}

impl ConfigFlags {
    /// Merge two flag sets; values in `other` win.
    pub fn union(&self, other: &Self) -> Self {
        Self {
            macro_depth: other.macro_depth.or(self.macro_depth),
            loop_limit: other.loop_limit.or(self.loop_limit),
            history_limit: other.history_limit.or(self.history_limit),
            keymap: other.keymap.clone().or_else(|| self.keymap.clone()),
            verbose: self.verbose || other.verbose,
        }
    }

    /// Interpreter limits, with defaults for anything unset.
    pub fn limits(&self) -> Limits {
        let defaults = Limits::default();
        Limits {
            max_depth: self.macro_depth.unwrap_or(defaults.max_depth),
            loop_limit: self.loop_limit.unwrap_or(defaults.loop_limit),
            history_limit: self.history_limit.unwrap_or(defaults.history_limit),
        }
    }
}

pub fn global_config_path() -> PathBuf {
    #[cfg(target_os = "windows")]
    {
        if let Some(appdata) = std::env::var_os("APPDATA") {
            return PathBuf::from(appdata).join("sylvan").join("config");
        }
    }

    #[cfg(target_os = "macos")]
    {
        if let Some(home) = std::env::var_os("HOME") {
            return PathBuf::from(home)
                .join("Library")
                .join("Application Support")
                .join("sylvan")
                .join("config");
        }
    }

    #[cfg(not(any(target_os = "windows", target_os = "macos")))]
    {
        if let Some(xdg) = std::env::var_os("XDG_CONFIG_HOME") {
            return PathBuf::from(xdg).join("sylvan").join("config");
        }
        if let Some(home) = std::env::var_os("HOME") {
            return PathBuf::from(home).join(".config").join("sylvan").join("config");
        }
    }

    PathBuf::from(".sylvanrc")
}

pub fn local_override_path() -> PathBuf {
    PathBuf::from(".sylvanrc")
}

pub fn load_config_flags(path: &Path) -> Result<ConfigFlags> {
    if !path.exists() {
        return Ok(ConfigFlags::default());
    }
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config {}", path.display()))?;
    let tokens = content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .flat_map(|line| line.split_whitespace().map(ToOwned::to_owned))
        .collect::<Vec<_>>();
    Ok(parse_flag_tokens(&tokens))
}

pub fn save_config_flags(path: &Path, flags: &ConfigFlags) -> Result<()> {
    let mut lines = Vec::new();
    lines.push("# sylvan defaults (saved with --save-config)".to_string());
    if let Some(depth) = flags.macro_depth {
        lines.push(format!("--macro-depth {depth}"));
    }
    if let Some(limit) = flags.loop_limit {
        lines.push(format!("--loop-limit {limit}"));
    }
    if let Some(limit) = flags.history_limit {
        lines.push(format!("--history-limit {limit}"));
    }
    if let Some(path) = &flags.keymap {
        lines.push(format!("--keymap {}", path.display()));
    }
    if flags.verbose {
        lines.push("--verbose".to_string());
    }
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create config dir {}", parent.display()))?;
    }
    fs::write(path, format!("{}\n", lines.join("\n")))
        .with_context(|| format!("Failed to write config {}", path.display()))
}

pub fn clear_config_flags(path: &Path) -> Result<()> {
    if path.exists() {
        fs::remove_file(path).with_context(|| format!("Failed to remove {}", path.display()))?;
    }
    Ok(())
}

/// Pick the known flags out of a token list, ignoring everything else.
pub fn parse_flag_tokens(tokens: &[String]) -> ConfigFlags {
    let mut flags = ConfigFlags::default();
    let mut i = 0;
    while i < tokens.len() {
        let token = tokens[i].as_str();
        let (name, inline) = match token.split_once('=') {
            Some((name, value)) => (name, Some(value)),
            None => (token, None),
        };
        if name == "--verbose" || name == "-v" {
            flags.verbose = true;
            i += 1;
            continue;
        }
        let value = inline.or_else(|| {
            tokens.get(i + 1).map(String::as_str).filter(|next| {
                matches!(
                    name,
                    "--macro-depth" | "--loop-limit" | "--history-limit" | "--keymap"
                ) && !next.starts_with("--")
            })
        });
        if inline.is_none() && value.is_some() {
            i += 1;
        }
        match (name, value) {
            ("--macro-depth", Some(value)) => flags.macro_depth = value.parse().ok(),
            ("--loop-limit", Some(value)) => flags.loop_limit = value.parse().ok(),
            ("--history-limit", Some(value)) => flags.history_limit = value.parse().ok(),
            ("--keymap", Some(value)) => flags.keymap = Some(PathBuf::from(value)),
            _ => {}
        }
        i += 1;
    }
    flags
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn tokens(args: &[&str]) -> Vec<String> {
        args.iter().map(ToString::to_string).collect()
    }

    #[test]
    fn test_parse_flag_tokens_extracts_known_flags() {
        let args = tokens(&[
            "sylvan",
            "--macro-depth",
            "12",
            "--loop-limit=50",
            "--keymap",
            "keys.map",
            "--verbose",
            "doc.json",
        ]);
        let flags = parse_flag_tokens(&args);
        assert_eq!(flags.macro_depth, Some(12));
        assert_eq!(flags.loop_limit, Some(50));
        assert_eq!(flags.history_limit, None);
        assert_eq!(flags.keymap, Some(PathBuf::from("keys.map")));
        assert!(flags.verbose);
    }

    #[test]
    fn test_parse_flag_tokens_skips_bad_numbers() {
        let flags = parse_flag_tokens(&tokens(&["--history-limit", "lots", "--verbose"]));
        assert_eq!(flags.history_limit, None);
        assert!(flags.verbose);
    }

    #[test]
    fn test_config_union_merges_cli_over_file_for_options() {
        let file = ConfigFlags {
            macro_depth: Some(10),
            loop_limit: Some(20),
            verbose: true,
            ..ConfigFlags::default()
        };
        let cli = ConfigFlags {
            loop_limit: Some(99),
            history_limit: Some(5),
            ..ConfigFlags::default()
        };
        let merged = file.union(&cli);
        assert_eq!(merged.macro_depth, Some(10));
        assert_eq!(merged.loop_limit, Some(99));
        assert_eq!(merged.history_limit, Some(5));
        assert!(merged.verbose);
    }

    #[test]
    fn test_limits_fall_back_to_defaults() {
        let flags = ConfigFlags {
            loop_limit: Some(7),
            ..ConfigFlags::default()
        };
        let limits = flags.limits();
        assert_eq!(limits.loop_limit, 7);
        assert_eq!(limits.max_depth, Limits::default().max_depth);
        assert_eq!(limits.history_limit, Limits::default().history_limit);
    }

    #[test]
    fn test_save_load_and_clear_config() {
        let dir = tempdir().unwrap();
        let path = dir.path().join(".sylvanrc");
        let flags = ConfigFlags {
            macro_depth: Some(32),
            loop_limit: Some(200),
            history_limit: Some(50),
            keymap: Some(PathBuf::from("my.keymap")),
            verbose: true,
        };

        save_config_flags(&path, &flags).unwrap();
        let loaded = load_config_flags(&path).unwrap();
        assert_eq!(loaded, flags);

        clear_config_flags(&path).unwrap();
        assert!(!path.exists());
        assert_eq!(load_config_flags(&path).unwrap(), ConfigFlags::default());
    }
}
