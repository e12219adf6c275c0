//! Per-file declaration scan: declared names, comment groups and the
//! declaration boundaries used to attach comments.

use super::comments::{self, CommentGroup};
use crate::types::{Pos, SyntaxFile};
use std::path::PathBuf;
use syn::ext::IdentExt;
use syn::spanned::Spanned;
use syn::visit::{self, Visit};

#[derive(Debug, Clone, Default)]
pub struct FileScan {
    pub path: PathBuf,
    /// Top-level struct names in source order.
    pub structs: Vec<String>,
    /// Top-level traits and fn-pointer type aliases.
    pub interfaces: Vec<String>,
    pub comments: Vec<CommentGroup>,
    /// Sorted, deduplicated.
    pub boundaries: Vec<Pos>,
}

impl FileScan {
    /// The leading comment of the declaration starting at `pos`.
    pub fn comment_for(&self, pos: Pos) -> Option<String> {
        let idx = comments::search_comment(&self.comments, &self.boundaries, pos)?;
        Some(self.comments[idx].text())
    }
}

pub fn scan(file: &SyntaxFile) -> FileScan {
    let mut structs = Vec::new();
    let mut interfaces = Vec::new();
    for item in &file.syntax.items {
        match item {
            syn::Item::Struct(s) => structs.push(s.ident.unraw().to_string()),
            syn::Item::Trait(t) => interfaces.push(t.ident.unraw().to_string()),
            syn::Item::Type(t) if matches!(*t.ty, syn::Type::BareFn(_)) => {
                interfaces.push(t.ident.unraw().to_string())
            }
            _ => {}
        }
    }

    let mut collector = Boundaries::default();
    collector.visit_file(&file.syntax);
    let mut boundaries = collector.0;
    boundaries.sort();
    boundaries.dedup();

    FileScan {
        path: file.path.clone(),
        structs,
        interfaces,
        comments: comments::collect_comments(&file.source),
        boundaries,
    }
}

/// Ends of items, members and fields, plus the open braces of bodies.
#[derive(Default)]
struct Boundaries(Vec<Pos>);

impl Boundaries {
    fn end(&mut self, node: &impl Spanned) {
        self.0.push(Pos::end_of(node.span()));
    }

    fn open(&mut self, brace: &syn::token::Brace) {
        self.0.push(Pos::start_of(brace.span.open()));
    }
}

impl<'ast> Visit<'ast> for Boundaries {
    fn visit_item(&mut self, node: &'ast syn::Item) {
        self.end(node);
        visit::visit_item(self, node);
    }

    fn visit_impl_item(&mut self, node: &'ast syn::ImplItem) {
        self.end(node);
        visit::visit_impl_item(self, node);
    }

    fn visit_trait_item(&mut self, node: &'ast syn::TraitItem) {
        self.end(node);
        visit::visit_trait_item(self, node);
    }

    fn visit_field(&mut self, node: &'ast syn::Field) {
        self.end(node);
        visit::visit_field(self, node);
    }

    fn visit_variant(&mut self, node: &'ast syn::Variant) {
        self.end(node);
        visit::visit_variant(self, node);
    }

    fn visit_fields_named(&mut self, node: &'ast syn::FieldsNamed) {
        self.open(&node.brace_token);
        visit::visit_fields_named(self, node);
    }

    fn visit_item_enum(&mut self, node: &'ast syn::ItemEnum) {
        self.open(&node.brace_token);
        visit::visit_item_enum(self, node);
    }

    fn visit_item_impl(&mut self, node: &'ast syn::ItemImpl) {
        self.open(&node.brace_token);
        visit::visit_item_impl(self, node);
    }

    fn visit_item_trait(&mut self, node: &'ast syn::ItemTrait) {
        self.open(&node.brace_token);
        visit::visit_item_trait(self, node);
    }

    fn visit_item_mod(&mut self, node: &'ast syn::ItemMod) {
        if let Some((brace, _)) = &node.content {
            self.open(brace);
        }
        visit::visit_item_mod(self, node);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::provider::{decl_start, field_start, sig_start};

    fn syntax(source: &str) -> SyntaxFile {
        SyntaxFile {
            path: PathBuf::from("lib.rs"),
            source: source.to_string(),
            syntax: syn::parse_file(source).unwrap(),
        }
    }

    const SOURCE: &str = r#"//! Geometry.

/// A point in the plane.
///
/// Integer coordinates.
#[derive(Debug)]
pub struct Point {
    /// Horizontal.
    pub x: i32,
    pub y: i32, // trailing
    pub z: i32,
}

// Lonely comment.

pub struct Bare;

pub trait Shape {}
pub type Callback = fn(i32) -> bool;
pub type Id = u64;

impl Point {
    // C1
    pub fn m1(&self) {}
    pub fn m2(&self) {}
}
"#;

    fn struct_item<'a>(file: &'a SyntaxFile, name: &str) -> &'a syn::ItemStruct {
        file.syntax
            .items
            .iter()
            .find_map(|i| match i {
                syn::Item::Struct(s) if s.ident == name => Some(s),
                _ => None,
            })
            .unwrap()
    }

    #[test]
    fn declared_names() {
        let scan = scan(&syntax(SOURCE));
        assert_eq!(scan.structs, vec!["Point", "Bare"]);
        assert_eq!(scan.interfaces, vec!["Shape", "Callback"]);
    }

    #[test]
    fn struct_and_field_comments() {
        let file = syntax(SOURCE);
        let scan = scan(&file);
        let point = struct_item(&file, "Point");
        let pos = decl_start(&point.vis, point.struct_token.span);
        assert_eq!(
            scan.comment_for(pos).as_deref(),
            Some("A point in the plane.\n\nInteger coordinates.")
        );

        let fields: Vec<_> = point.fields.iter().map(|f| scan.comment_for(field_start(f))).collect();
        assert_eq!(fields, vec![Some("Horizontal.".to_string()), None, None]);

        // Nearest group after the previous declaration, blank line or not.
        let bare = struct_item(&file, "Bare");
        assert_eq!(
            scan.comment_for(decl_start(&bare.vis, bare.struct_token.span)).as_deref(),
            Some("Lonely comment.")
        );
    }

    #[test]
    fn method_comments_stop_at_previous_method() {
        let file = syntax(SOURCE);
        let scan = scan(&file);
        let imp = file
            .syntax
            .items
            .iter()
            .find_map(|i| match i {
                syn::Item::Impl(imp) => Some(imp),
                _ => None,
            })
            .unwrap();
        let comments: Vec<_> = imp
            .items
            .iter()
            .filter_map(|ii| match ii {
                syn::ImplItem::Fn(f) => Some(scan.comment_for(decl_start(&f.vis, sig_start(&f.sig)))),
                _ => None,
            })
            .collect();
        assert_eq!(comments, vec![Some("C1".to_string()), None]);
    }
}
