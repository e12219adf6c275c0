//! Type-info providers: resolve a source file into its package's semantic model.

use super::cfg::BuildFlags;
use super::ty::{Type, TypeContext};
use super::{Diagnostic, Func, NamedType, Package, Pos, Scope, SemanticModel, Signature, SyntaxFile, Underlying, Var};
use proc_macro2::Span;
use quote::ToTokens;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use syn::ext::IdentExt;
use syn::spanned::Spanned;
use tracing::debug;

/// Resolves fully-typed symbol information for a source file.
pub trait TypeInfoProvider {
    /// Resolve `path` under `flags`. Normally yields exactly one package; an
    /// empty list means the file's package has no compiled members.
    fn resolve_file(&self, path: &Path, flags: &BuildFlags) -> Result<SemanticModel, Diagnostic>;
}

/// Whether a file takes part in a package: a `.rs` file that is not a test file.
pub fn is_eligible(path: &Path) -> bool {
    if path.extension().and_then(|e| e.to_str()) != Some("rs") {
        return false;
    }
    match path.file_stem().and_then(|s| s.to_str()) {
        Some(stem) => stem != "tests" && !stem.ends_with("_test") && !stem.ends_with("_tests"),
        None => false,
    }
}

/// The directory holding `path`; `.` for a bare file name.
pub fn parent_dir(path: &Path) -> &Path {
    match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir,
        _ => Path::new("."),
    }
}

/// List the eligible files of `dir` in file-name order.
pub fn eligible_files(dir: &Path) -> std::io::Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_file() && is_eligible(&path) {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

/// Provider backed by `syn`: a package is every eligible file of a directory.
#[derive(Debug, Default, Clone, Copy)]
pub struct SourceProvider;

impl SourceProvider {
    pub fn new() -> Self {
        SourceProvider
    }
}

impl TypeInfoProvider for SourceProvider {
    #[tracing::instrument(level = "debug", skip_all, fields(path = %path.display()))]
    fn resolve_file(&self, path: &Path, flags: &BuildFlags) -> Result<SemanticModel, Diagnostic> {
        let dir = parent_dir(path);
        let candidates = eligible_files(dir).map_err(|e| Diagnostic {
            path: dir.to_path_buf(),
            pos: None,
            message: e.to_string(),
        })?;

        let mut files = Vec::new();
        for candidate in candidates {
            let file = parse_source(&candidate)?;
            if flags.is_enabled(&file.syntax.attrs) {
                files.push(file);
            } else {
                debug!(file = %candidate.display(), "compiled out by cfg");
            }
        }

        if files.is_empty() {
            return Ok(SemanticModel {
                packages: Vec::new(),
                files,
            });
        }

        let package = build_package(dir, &files, flags);
        debug!(types = package.scope.len(), files = files.len(), "resolved package");
        Ok(SemanticModel {
            packages: vec![package],
            files,
        })
    }
}

fn parse_source(path: &Path) -> Result<SyntaxFile, Diagnostic> {
    let text = fs::read_to_string(path).map_err(|e| Diagnostic {
        path: path.to_path_buf(),
        pos: None,
        message: e.to_string(),
    })?;
    let source = text.strip_prefix('\u{feff}').map(str::to_string).unwrap_or(text);
    let syntax = syn::parse_file(&source).map_err(|e| Diagnostic {
        path: path.to_path_buf(),
        pos: Some(Pos::start_of(e.span())),
        message: e.to_string(),
    })?;
    Ok(SyntaxFile {
        path: path.to_path_buf(),
        source,
        syntax,
    })
}

fn build_package(dir: &Path, files: &[SyntaxFile], flags: &BuildFlags) -> Package {
    // Impl blocks may precede their type or live in a sibling file.
    let mut methods: HashMap<String, Vec<Func>> = HashMap::new();
    for file in files {
        for item in &file.syntax.items {
            if let syn::Item::Impl(imp) = item {
                if imp.trait_.is_some() || !flags.is_enabled(&imp.attrs) {
                    continue;
                }
                if let Some(name) = impl_target(imp) {
                    let found = impl_methods(imp, &name, &file.path, flags);
                    methods.entry(name).or_default().extend(found);
                }
            }
        }
    }

    let mut scope = Scope::default();
    for file in files {
        for item in &file.syntax.items {
            let Some((name, pos, exported, underlying)) = declare(item, &file.path, flags) else {
                continue;
            };
            let named = NamedType {
                methods: methods.remove(&name).unwrap_or_default(),
                name,
                file: file.path.clone(),
                pos,
                exported,
                underlying,
            };
            if !scope.insert(named) {
                debug!(file = %file.path.display(), "duplicate type declaration ignored");
            }
        }
    }

    Package {
        name: dir
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| "crate".to_string()),
        dir: dir.to_path_buf(),
        files: files.iter().map(|f| f.path.clone()).collect(),
        scope,
    }
}

/// Name, position, visibility and shape of a top-level type item.
fn declare(
    item: &syn::Item,
    file: &Path,
    flags: &BuildFlags,
) -> Option<(String, Pos, bool, Underlying)> {
    match item {
        syn::Item::Struct(s) if flags.is_enabled(&s.attrs) => {
            let name = s.ident.unraw().to_string();
            let params = generic_names(&s.generics);
            let fields = struct_fields(
                &s.fields,
                &TypeContext {
                    params: &params,
                    self_name: Some(&name),
                },
                flags,
            );
            Some((
                name,
                decl_start(&s.vis, s.struct_token.span),
                is_exported(&s.vis),
                Underlying::Struct(fields),
            ))
        }
        syn::Item::Enum(e) if flags.is_enabled(&e.attrs) => Some((
            e.ident.unraw().to_string(),
            decl_start(&e.vis, e.enum_token.span),
            is_exported(&e.vis),
            Underlying::Enum,
        )),
        syn::Item::Trait(t) if flags.is_enabled(&t.attrs) => {
            let name = t.ident.unraw().to_string();
            let exported = is_exported(&t.vis);
            let params = generic_names(&t.generics);
            let funcs = t
                .items
                .iter()
                .filter_map(|ti| match ti {
                    syn::TraitItem::Fn(f) if flags.is_enabled(&f.attrs) => Some(Func {
                        name: f.sig.ident.unraw().to_string(),
                        exported,
                        file: file.to_path_buf(),
                        pos: Pos::start_of(sig_start(&f.sig)),
                        sig: signature(&f.sig, &params, &name),
                    }),
                    _ => None,
                })
                .collect();
            Some((
                name,
                decl_start(&t.vis, t.trait_token.span),
                exported,
                Underlying::Interface(funcs),
            ))
        }
        syn::Item::Type(t) if flags.is_enabled(&t.attrs) => {
            let params = generic_names(&t.generics);
            let cx = TypeContext {
                params: &params,
                self_name: None,
            };
            let target = Type::from_syn(&t.ty, &cx);
            let underlying = if matches!(*t.ty, syn::Type::BareFn(_)) {
                Underlying::Signature(target)
            } else {
                Underlying::Alias(target)
            };
            Some((
                t.ident.unraw().to_string(),
                decl_start(&t.vis, t.type_token.span),
                is_exported(&t.vis),
                underlying,
            ))
        }
        _ => None,
    }
}

fn struct_fields(fields: &syn::Fields, cx: &TypeContext, flags: &BuildFlags) -> Vec<Var> {
    fields
        .iter()
        .enumerate()
        .filter(|(_, f)| flags.is_enabled(&f.attrs))
        .map(|(i, f)| Var {
            name: f
                .ident
                .as_ref()
                .map(|id| id.unraw().to_string())
                .unwrap_or_else(|| i.to_string()),
            ty: Type::from_syn(&f.ty, cx),
            exported: is_exported(&f.vis),
            pos: field_start(f),
        })
        .collect()
}

/// The self type name of an inherent impl: `impl Foo`, `impl<T> Foo<T>`.
fn impl_target(imp: &syn::ItemImpl) -> Option<String> {
    match &*imp.self_ty {
        syn::Type::Path(tp) if tp.qself.is_none() => {
            let segments = &tp.path.segments;
            let last = segments.last()?;
            let local = segments.len() == 1
                || (segments.len() == 2 && segments[0].ident == "self");
            local.then(|| last.ident.unraw().to_string())
        }
        _ => None,
    }
}

fn impl_methods(imp: &syn::ItemImpl, self_name: &str, file: &Path, flags: &BuildFlags) -> Vec<Func> {
    let impl_params = generic_names(&imp.generics);
    imp.items
        .iter()
        .filter_map(|ii| match ii {
            syn::ImplItem::Fn(f) if flags.is_enabled(&f.attrs) => Some(Func {
                name: f.sig.ident.unraw().to_string(),
                exported: is_exported(&f.vis),
                file: file.to_path_buf(),
                pos: match &f.defaultness {
                    Some(d) => decl_start(&f.vis, d.span),
                    None => decl_start(&f.vis, sig_start(&f.sig)),
                },
                sig: signature(&f.sig, &impl_params, self_name),
            }),
            _ => None,
        })
        .collect()
}

fn signature(sig: &syn::Signature, params: &[String], self_name: &str) -> Signature {
    let mut all_params = params.to_vec();
    all_params.extend(generic_names(&sig.generics));
    let cx = TypeContext {
        params: &all_params,
        self_name: Some(self_name),
    };

    let mut out = Signature::default();
    for input in &sig.inputs {
        match input {
            syn::FnArg::Receiver(_) => out.has_receiver = true,
            syn::FnArg::Typed(pt) => out.params.push(Var {
                name: pattern_name(&pt.pat),
                ty: Type::from_syn(&pt.ty, &cx),
                exported: true,
                pos: Pos::start_of(pt.span()),
            }),
        }
    }

    if let syn::ReturnType::Type(_, ty) = &sig.output {
        let pos = Pos::start_of(ty.span());
        let result = |ty: &syn::Type| Var {
            name: String::new(),
            ty: Type::from_syn(ty, &cx),
            exported: true,
            pos,
        };
        match &**ty {
            syn::Type::Tuple(t) => out.results.extend(t.elems.iter().map(result)),
            other => out.results.push(result(other)),
        }
    }
    out
}

fn pattern_name(pat: &syn::Pat) -> String {
    match pat {
        syn::Pat::Ident(pi) => pi.ident.unraw().to_string(),
        syn::Pat::Wild(_) => "_".to_string(),
        other => super::ty::tidy(&other.to_token_stream().to_string()),
    }
}

fn generic_names(generics: &syn::Generics) -> Vec<String> {
    generics
        .params
        .iter()
        .filter_map(|p| match p {
            syn::GenericParam::Type(t) => Some(t.ident.to_string()),
            syn::GenericParam::Const(c) => Some(c.ident.to_string()),
            syn::GenericParam::Lifetime(_) => None,
        })
        .collect()
}

pub(crate) fn is_exported(vis: &syn::Visibility) -> bool {
    matches!(vis, syn::Visibility::Public(_))
}

/// Position of the first non-attribute token of a declaration.
pub(crate) fn decl_start(vis: &syn::Visibility, keyword: Span) -> Pos {
    match vis {
        syn::Visibility::Public(p) => Pos::start_of(p.span),
        syn::Visibility::Restricted(r) => Pos::start_of(r.pub_token.span),
        syn::Visibility::Inherited => Pos::start_of(keyword),
    }
}

/// Span of the first token of a fn signature (`const`, `async`, `unsafe`,
/// `extern` or `fn`).
pub(crate) fn sig_start(sig: &syn::Signature) -> Span {
    if let Some(t) = &sig.constness {
        t.span
    } else if let Some(t) = &sig.asyncness {
        t.span
    } else if let Some(t) = &sig.unsafety {
        t.span
    } else if let Some(abi) = &sig.abi {
        abi.extern_token.span
    } else {
        sig.fn_token.span
    }
}

pub(crate) fn field_start(field: &syn::Field) -> Pos {
    let first = match &field.ident {
        Some(ident) => ident.span(),
        None => field.ty.span(),
    };
    decl_start(&field.vis, first)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn package(files: &[(&str, &str)], flags: &BuildFlags) -> Package {
        let dir = TempDir::new().unwrap();
        for (name, body) in files {
            fs::write(dir.path().join(name), body).unwrap();
        }
        let model = SourceProvider
            .resolve_file(&dir.path().join(files[0].0), flags)
            .unwrap();
        model.packages.into_iter().next().unwrap()
    }

    #[test]
    fn eligibility() {
        assert!(is_eligible(Path::new("src/model.rs")));
        assert!(!is_eligible(Path::new("src/model_test.rs")));
        assert!(!is_eligible(Path::new("src/parser_tests.rs")));
        assert!(!is_eligible(Path::new("src/tests.rs")));
        assert!(!is_eligible(Path::new("README.md")));
    }

    #[test]
    fn collects_structs_and_sibling_impls() {
        let pkg = package(
            &[
                ("a.rs", "pub struct Point { pub x: i32, y: i32 }\n"),
                (
                    "b.rs",
                    "impl Point {\n    pub fn norm(&self) -> f64 { 0.0 }\n    fn hidden(&self) {}\n}\n",
                ),
            ],
            &BuildFlags::default(),
        );
        let point = pkg.scope.lookup("Point").unwrap();
        let Underlying::Struct(fields) = &point.underlying else {
            panic!("not a struct");
        };
        assert_eq!(fields.len(), 2);
        assert!(fields[0].exported);
        assert!(!fields[1].exported);
        assert_eq!(point.methods.len(), 2);
        assert_eq!(point.methods[0].name, "norm");
        assert!(point.methods[0].sig.has_receiver);
        assert!(point.methods[0].file.ends_with("b.rs"));
        assert!(!point.methods[1].exported);
    }

    #[test]
    fn trait_impls_are_not_methods() {
        let pkg = package(
            &[(
                "lib.rs",
                "pub struct A;\nimpl Clone for A { fn clone(&self) -> Self { A } }\nimpl A { pub fn new() -> Self { A } }\n",
            )],
            &BuildFlags::default(),
        );
        let a = pkg.scope.lookup("A").unwrap();
        assert_eq!(a.methods.len(), 1);
        assert_eq!(a.methods[0].sig.results[0].ty.to_string(), "A");
    }

    #[test]
    fn tuple_returns_split_into_results() {
        let pkg = package(
            &[(
                "lib.rs",
                "pub struct S;\nimpl S { pub fn pair(&self, key: &str, _: u8) -> (u32, bool) { (0, true) } pub fn unit(&self) -> () {} }\n",
            )],
            &BuildFlags::default(),
        );
        let s = pkg.scope.lookup("S").unwrap();
        let pair = &s.methods[0].sig;
        assert_eq!(pair.params.len(), 2);
        assert_eq!(pair.params[0].name, "key");
        assert_eq!(pair.params[1].name, "_");
        assert_eq!(pair.results.len(), 2);
        assert_eq!(pair.results[0].ty.to_string(), "u32");
        assert!(s.methods[1].sig.results.is_empty());
    }

    #[test]
    fn cfg_gated_items_follow_flags() {
        let src = "#[cfg(feature = \"extra\")]\npub struct Extra;\npub struct Base { #[cfg(feature = \"extra\")] pub extra: u8, pub id: u64 }\n";
        let off = package(&[("lib.rs", src)], &BuildFlags::default());
        assert!(off.scope.lookup("Extra").is_none());
        let Underlying::Struct(fields) = &off.scope.lookup("Base").unwrap().underlying else {
            panic!("not a struct");
        };
        assert_eq!(fields.len(), 1);

        let on = package(&[("lib.rs", src)], &BuildFlags::new(["extra"]));
        assert!(on.scope.lookup("Extra").is_some());
    }

    #[test]
    fn compiled_out_file_yields_no_package() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("gated.rs");
        fs::write(&path, "#![cfg(feature = \"gated\")]\npub struct G;\n").unwrap();
        let model = SourceProvider.resolve_file(&path, &BuildFlags::default()).unwrap();
        assert!(model.packages.is_empty());
    }

    #[test]
    fn syntax_errors_are_located() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("broken.rs");
        fs::write(&path, "pub struct Broken {\n    pub x: i32\n    pub y: i32,\n}\n").unwrap();
        let err = match SourceProvider.resolve_file(&path, &BuildFlags::default()) {
            Err(err) => err,
            Ok(_) => panic!("expected a diagnostic"),
        };
        assert_eq!(err.path, path);
        assert_eq!(err.pos.map(|p| p.line), Some(3));
    }

    #[test]
    fn fn_pointer_aliases_are_signatures() {
        let pkg = package(
            &[("lib.rs", "pub type Handler = fn(u8) -> bool;\npub type Id = u64;\n")],
            &BuildFlags::default(),
        );
        assert!(matches!(pkg.scope.lookup("Handler").unwrap().underlying, Underlying::Signature(_)));
        assert!(matches!(pkg.scope.lookup("Id").unwrap().underlying, Underlying::Alias(_)));
    }
}
