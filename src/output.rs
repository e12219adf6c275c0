//! Output streams: where a rendered struct is written.

use crate::model::Struct;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::LazyLock;
use tracing::debug;

static RE_WORD: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(.)([A-Z][a-z]+)").unwrap());

static RE_BOUNDARY: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"([a-z0-9])([A-Z])").unwrap());

/// Casing convention of generated file names.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Case {
    /// Keep the struct name as declared.
    #[default]
    Camel,
    Snake,
    Underscore,
}

impl Case {
    pub fn apply(&self, name: &str) -> String {
        match self {
            Case::Camel => name.to_string(),
            Case::Snake | Case::Underscore => underscore_case(name),
        }
    }
}

impl FromStr for Case {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "camel" => Ok(Case::Camel),
            "snake" => Ok(Case::Snake),
            "underscore" => Ok(Case::Underscore),
            other => Err(format!("unknown case: {}. Use camel, snake, or underscore", other)),
        }
    }
}

impl fmt::Display for Case {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Case::Camel => "camel",
            Case::Snake => "snake",
            Case::Underscore => "underscore",
        })
    }
}

/// `PromotionItemFact` -> `promotion_item_fact`, `HTTPServer` -> `http_server`.
pub fn underscore_case(name: &str) -> String {
    let words = RE_WORD.replace_all(name, "${1}_${2}");
    RE_BOUNDARY.replace_all(&words, "${1}_${2}").to_lowercase()
}

pub trait OutputStreamProvider {
    /// Open the destination for `item`; `extension` has no leading dot.
    fn struct_writer(&self, item: &Struct, extension: &str) -> io::Result<Box<dyn Write>>;
}

/// Writes every document to standard output.
#[derive(Debug, Default, Clone, Copy)]
pub struct StdoutStreamProvider;

impl OutputStreamProvider for StdoutStreamProvider {
    fn struct_writer(&self, _item: &Struct, _extension: &str) -> io::Result<Box<dyn Write>> {
        Ok(Box::new(io::stdout()))
    }
}

/// One file per struct under `base_dir`.
#[derive(Debug, Clone, Default)]
pub struct FileOutputStreamProvider {
    pub base_dir: PathBuf,
    pub case: Case,
    /// Mirror the struct's source directory, relative to `original_dir`.
    pub keep_tree: bool,
    pub original_dir: PathBuf,
    /// Fixed file name, used as is.
    pub file_name: Option<String>,
}

impl FileOutputStreamProvider {
    fn file_name(&self, item: &Struct, extension: &str) -> String {
        match &self.file_name {
            Some(name) => name.clone(),
            None => format!("{}.{}", self.case.apply(item.name()), extension),
        }
    }

    /// Destination of `item`, without touching the filesystem.
    pub fn path_for(&self, item: &Struct, extension: &str) -> PathBuf {
        let name = self.file_name(item, extension);
        if !self.keep_tree {
            return self.base_dir.join(name);
        }
        let source_dir = item.file_name().parent().unwrap_or_else(|| Path::new(""));
        let relative = source_dir
            .strip_prefix(&self.original_dir)
            .unwrap_or_else(|_| Path::new(""));
        self.base_dir.join(relative).join(name)
    }
}

impl OutputStreamProvider for FileOutputStreamProvider {
    fn struct_writer(&self, item: &Struct, extension: &str) -> io::Result<Box<dyn Write>> {
        let path = self.path_for(item, extension);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        debug!(path = %path.display(), "creating writer to file");
        Ok(Box::new(BufWriter::new(File::create(&path)?)))
    }
}
