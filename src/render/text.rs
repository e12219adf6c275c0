//! Plain-text renderer: one level of fields and the method signatures.

use crate::error::Result;
use crate::model::{Field, Struct};
use crate::render::Renderer;

pub struct TextRenderer;

impl Renderer for TextRenderer {
    fn render(&self, item: &Struct) -> Result<String> {
        let mut lines: Vec<String> = Vec::new();
        lines.push("Generated in txt format".to_string());
        lines.push(format!("Struct: {}", item.name()));
        if let Some(comment) = item.comment() {
            lines.push(comment.to_string());
        }

        lines.push("Fields:".to_string());
        for field in item.fields() {
            lines.push(format!("- {}: {}", field.name(), field.ty()));
        }

        lines.push("Methods:".to_string());
        for method in item.methods() {
            let params: Vec<String> = method.params().iter().map(param).collect();
            let ret = method
                .returns()
                .map(|r| r.ty().to_string())
                .unwrap_or_default();
            lines.push(format!("- {}: ({}) ({})", method.name(), params.join(", "), ret));
        }

        let mut out = lines.join("\n");
        out.push('\n');
        Ok(out)
    }

    fn file_extension(&self) -> &str {
        "txt"
    }
}

fn param(field: &Field) -> String {
    if field.name().is_empty() {
        field.ty().to_string()
    } else {
        format!("{}: {}", field.name(), field.ty())
    }
}
