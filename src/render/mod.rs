//! Renderer module: trait-based format dispatch.

pub mod json;
pub mod text;

use crate::describe::DescribeOptions;
use crate::error::Result;
use crate::model::Struct;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Trait for rendering a Struct into a specific output format.
pub trait Renderer {
    fn render(&self, item: &Struct) -> Result<String>;
    fn file_extension(&self) -> &str;
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Format {
    #[default]
    Json,
    #[serde(alias = "text")]
    Txt,
}

impl FromStr for Format {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "json" => Ok(Format::Json),
            "txt" | "text" => Ok(Format::Txt),
            other => Err(format!("unknown format: {}. Use json or txt", other)),
        }
    }
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Format::Json => "json",
            Format::Txt => "txt",
        })
    }
}

/// Create the renderer for a run. The describe options only affect JSON.
pub fn create_renderer(format: Format, options: DescribeOptions, pretty: bool) -> Box<dyn Renderer> {
    match format {
        Format::Json => Box::new(json::JsonRenderer::new(options, pretty)),
        Format::Txt => Box::new(text::TextRenderer),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_names() {
        assert_eq!("json".parse::<Format>(), Ok(Format::Json));
        assert_eq!("text".parse::<Format>(), Ok(Format::Txt));
        assert!("markdown".parse::<Format>().is_err());
    }

    #[test]
    fn extensions() {
        let options = DescribeOptions::default();
        assert_eq!(create_renderer(Format::Json, options, false).file_extension(), "json");
        assert_eq!(create_renderer(Format::Txt, options, false).file_extension(), "txt");
    }
}
