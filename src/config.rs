//! Run configuration: an optional TOML file overlaid by command-line flags,
//! validated into [`Settings`].

use crate::describe::{DescribeOptions, Shape};
use crate::output::Case;
use crate::render::Format;
use crate::types::BuildFlags;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Characters that make `--name` a regular expression.
pub const REGEX_META_CHARS: &str = "\\.+*?()|[]{}^$";

pub const DEFAULT_OUTPUT: &str = "./typeinfo";
pub const DEFAULT_LOG_LEVEL: &str = "info";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config file {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Specify --name or --all, but not both")]
    NameAndAll,

    #[error("Use --name to specify the name of the struct or --all for all structs found")]
    NoSelection,

    #[error("Cannot specify --filename with --all")]
    FileNameWithAll,

    #[error("Cannot specify --filename with regex in --name")]
    FileNameWithRegex,

    #[error("Invalid regular expression provided to --name: {0}")]
    InvalidPattern(#[from] regex::Error),

    #[error("--depth must be at least 1")]
    ZeroDepth,
}

/// Every setting, each optional so a file and the command line can be layered.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields, rename_all = "kebab-case")]
pub struct Config {
    pub name: Option<String>,
    pub all: Option<bool>,
    pub dir: Option<PathBuf>,
    pub recursive: Option<bool>,
    pub output: Option<PathBuf>,
    pub case: Option<Case>,
    pub keeptree: Option<bool>,
    pub filename: Option<String>,
    pub format: Option<Format>,
    pub shape: Option<Shape>,
    pub depth: Option<usize>,
    pub pretty: Option<bool>,
    pub print: Option<bool>,
    pub tags: Option<Vec<String>>,
    pub log_level: Option<String>,
    pub quiet: Option<bool>,
}

impl Config {
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&content)
    }

    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    /// Overlay `over` on top of `self`: values set in `over` win.
    pub fn merge(self, over: Config) -> Config {
        Config {
            name: over.name.or(self.name),
            all: over.all.or(self.all),
            dir: over.dir.or(self.dir),
            recursive: over.recursive.or(self.recursive),
            output: over.output.or(self.output),
            case: over.case.or(self.case),
            keeptree: over.keeptree.or(self.keeptree),
            filename: over.filename.or(self.filename),
            format: over.format.or(self.format),
            shape: over.shape.or(self.shape),
            depth: over.depth.or(self.depth),
            pretty: over.pretty.or(self.pretty),
            print: over.print.or(self.print),
            tags: over.tags.or(self.tags),
            log_level: over.log_level.or(self.log_level),
            quiet: over.quiet.or(self.quiet),
        }
    }

    /// Log level to install, or `None` when logging is off.
    pub fn log_filter(&self) -> Option<String> {
        if self.quiet.unwrap_or(false) {
            return None;
        }
        let level = self.log_level.as_deref().unwrap_or(DEFAULT_LOG_LEVEL).trim();
        (!level.is_empty()).then(|| level.to_string())
    }

    /// Validate the selection flags and fill in defaults.
    pub fn resolve(self) -> Result<Settings, ConfigError> {
        let all = self.all.unwrap_or(false);
        let name = self.name.filter(|n| !n.is_empty());
        let file_name = self.filename.filter(|n| !n.is_empty());

        let selection = match (name, all) {
            (Some(_), true) => return Err(ConfigError::NameAndAll),
            (None, false) => return Err(ConfigError::NoSelection),
            (None, true) => {
                if file_name.is_some() {
                    return Err(ConfigError::FileNameWithAll);
                }
                Selection {
                    name: None,
                    filter: Regex::new(".*")?,
                    limit_one: false,
                }
            }
            (Some(name), false) if is_pattern(&name) => {
                let filter = Regex::new(&name)?;
                if file_name.is_some() {
                    return Err(ConfigError::FileNameWithRegex);
                }
                Selection {
                    name: Some(name),
                    filter,
                    limit_one: false,
                }
            }
            (Some(name), false) => Selection {
                filter: Regex::new(&format!("^{}$", name))?,
                name: Some(name),
                limit_one: true,
            },
        };

        let shape = self.shape.unwrap_or_default();
        let describe = match self.depth {
            Some(0) => return Err(ConfigError::ZeroDepth),
            Some(depth) => DescribeOptions {
                shape,
                max_depth: depth,
            },
            None => DescribeOptions::for_shape(shape),
        };

        Ok(Settings {
            selection,
            dir: self.dir.unwrap_or_else(|| PathBuf::from(".")),
            recursive: all || self.recursive.unwrap_or(false),
            output: self.output.unwrap_or_else(|| PathBuf::from(DEFAULT_OUTPUT)),
            case: self.case.unwrap_or_default(),
            keep_tree: self.keeptree.unwrap_or(false),
            file_name,
            format: self.format.unwrap_or_default(),
            describe,
            pretty: self.pretty.unwrap_or(false),
            print: self.print.unwrap_or(false),
            build_flags: BuildFlags::new(self.tags.unwrap_or_default()),
        })
    }
}

/// Whether `name` is meant as a regular expression.
pub fn is_pattern(name: &str) -> bool {
    name.contains(|c| REGEX_META_CHARS.contains(c))
}

/// Which structs a run covers.
#[derive(Debug, Clone)]
pub struct Selection {
    /// The `--name` value as given, for error messages.
    pub name: Option<String>,
    pub filter: Regex,
    pub limit_one: bool,
}

/// A validated configuration.
#[derive(Debug, Clone)]
pub struct Settings {
    pub selection: Selection,
    pub dir: PathBuf,
    pub recursive: bool,
    pub output: PathBuf,
    pub case: Case,
    pub keep_tree: bool,
    pub file_name: Option<String>,
    pub format: Format,
    pub describe: DescribeOptions,
    pub pretty: bool,
    pub print: bool,
    pub build_flags: BuildFlags,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn named(name: &str) -> Config {
        Config {
            name: Some(name.to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn plain_name_is_anchored() {
        let settings = named("Foo").resolve().unwrap();
        assert!(settings.selection.limit_one);
        assert!(settings.selection.filter.is_match("Foo"));
        assert!(!settings.selection.filter.is_match("FooBar"));
        assert!(!settings.recursive);
    }

    #[test]
    fn regex_name_matches_many() {
        let settings = named("Foo.*").resolve().unwrap();
        assert!(!settings.selection.limit_one);
        assert!(settings.selection.filter.is_match("FooBar"));
    }

    #[test]
    fn all_implies_recursive() {
        let settings = Config {
            all: Some(true),
            ..Default::default()
        }
        .resolve()
        .unwrap();
        assert!(settings.recursive);
        assert!(settings.selection.filter.is_match("Anything"));
        assert_eq!(settings.output, PathBuf::from(DEFAULT_OUTPUT));
        assert_eq!(settings.describe, DescribeOptions::default());
    }

    #[test]
    fn selection_conflicts() {
        let both = Config {
            all: Some(true),
            ..named("Foo")
        };
        assert!(matches!(both.resolve(), Err(ConfigError::NameAndAll)));
        assert!(matches!(Config::default().resolve(), Err(ConfigError::NoSelection)));

        let all_with_file = Config {
            all: Some(true),
            filename: Some("out.json".into()),
            ..Default::default()
        };
        assert!(matches!(all_with_file.resolve(), Err(ConfigError::FileNameWithAll)));

        let regex_with_file = Config {
            filename: Some("out.json".into()),
            ..named("Foo|Bar")
        };
        assert!(matches!(regex_with_file.resolve(), Err(ConfigError::FileNameWithRegex)));

        assert!(matches!(named("Foo(").resolve(), Err(ConfigError::InvalidPattern(_))));
    }

    #[test]
    fn depth_defaults_follow_shape() {
        let nested = Config {
            shape: Some(Shape::Nested),
            ..named("Foo")
        };
        assert_eq!(nested.resolve().unwrap().describe, DescribeOptions::nested(3));

        let zero = Config {
            depth: Some(0),
            ..named("Foo")
        };
        assert!(matches!(zero.resolve(), Err(ConfigError::ZeroDepth)));
    }

    #[test]
    fn file_then_flags() {
        let file = Config::parse(
            r#"
name = "Point"
recursive = true
case = "snake"
format = "text"
log-level = "debug"
tags = ["serde"]
"#,
        )
        .unwrap();
        assert_eq!(file.format, Some(Format::Txt));
        let merged = file.merge(Config {
            name: Some("Line".into()),
            ..Default::default()
        });
        assert_eq!(merged.log_filter().as_deref(), Some("debug"));
        let settings = merged.resolve().unwrap();
        assert!(settings.selection.filter.is_match("Line"));
        assert!(settings.recursive);
        assert_eq!(settings.case, Case::Snake);
        assert!(settings.build_flags.has_feature("serde"));
    }

    #[test]
    fn unknown_keys_are_rejected() {
        assert!(matches!(Config::parse("colour = true\n"), Err(ConfigError::Parse(_))));
        assert!(matches!(Config::parse("format = \"xml\"\n"), Err(ConfigError::Parse(_))));
    }

    #[test]
    fn logging_switches() {
        assert_eq!(Config::default().log_filter().as_deref(), Some("info"));
        let quiet = Config {
            quiet: Some(true),
            ..Default::default()
        };
        assert_eq!(quiet.log_filter(), None);
        let empty = Config {
            log_level: Some(String::new()),
            ..Default::default()
        };
        assert_eq!(empty.log_filter(), None);
    }
}
