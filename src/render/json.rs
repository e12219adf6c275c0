//! JSON renderer: structured output for tooling integration.
//!
//! Serializes the described Document: `{"field": {...}, "function": {...}}`.

use crate::describe::{describe, DescribeOptions, Document};
use crate::error::Result;
use crate::model::Struct;
use crate::render::Renderer;

pub struct JsonRenderer {
    options: DescribeOptions,
    pretty: bool,
}

impl JsonRenderer {
    pub fn new(options: DescribeOptions, pretty: bool) -> Self {
        Self { options, pretty }
    }

    pub fn render_document(&self, doc: &Document) -> Result<String> {
        let out = if self.pretty {
            serde_json::to_string_pretty(doc)?
        } else {
            serde_json::to_string(doc)?
        };
        Ok(out)
    }
}

impl Renderer for JsonRenderer {
    fn render(&self, item: &Struct) -> Result<String> {
        self.render_document(&describe(item, &self.options))
    }

    fn file_extension(&self) -> &str {
        "json"
    }
}
