//! Semantic type descriptors derived from `syn::Type`.
//!
//! A descriptor keeps enough structure to answer "is this (a pointer to) a
//! named type?" and renders back to the spelling used in source.

use quote::ToTokens;
use std::fmt;

/// One level of indirection in front of a type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerKind {
    Ref,
    RefMut,
    ConstPtr,
    MutPtr,
    Box,
    Rc,
    Arc,
}

impl PointerKind {
    fn from_wrapper(ident: &str) -> Option<Self> {
        match ident {
            "Box" => Some(PointerKind::Box),
            "Rc" => Some(PointerKind::Rc),
            "Arc" => Some(PointerKind::Arc),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Type {
    /// A path type such as `Point`, `std::string::String` or `Vec<u8>`.
    Named { path: Vec<String>, args: Vec<Type> },
    /// A generic parameter of the declaring item.
    Param(String),
    Pointer {
        kind: PointerKind,
        lifetime: Option<String>,
        elem: Box<Type>,
    },
    Slice(Box<Type>),
    Array { elem: Box<Type>, len: String },
    Tuple(Vec<Type>),
    /// Fn pointers, trait objects, `impl Trait`, macros and the like.
    Opaque(String),
}

/// Names in scope while converting a type: generic parameters and `Self`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TypeContext<'a> {
    pub params: &'a [String],
    pub self_name: Option<&'a str>,
}

impl Type {
    pub fn named(name: &str) -> Self {
        Type::Named {
            path: vec![name.to_string()],
            args: Vec::new(),
        }
    }

    pub fn from_syn(ty: &syn::Type, cx: &TypeContext) -> Self {
        match ty {
            syn::Type::Path(tp) if tp.qself.is_none() => from_path(&tp.path, cx)
                .unwrap_or_else(|| Type::Opaque(tidy(&ty.to_token_stream().to_string()))),
            syn::Type::Reference(r) => Type::Pointer {
                kind: if r.mutability.is_some() {
                    PointerKind::RefMut
                } else {
                    PointerKind::Ref
                },
                lifetime: r.lifetime.as_ref().map(|lt| lt.to_string()),
                elem: Box::new(Type::from_syn(&r.elem, cx)),
            },
            syn::Type::Ptr(p) => Type::Pointer {
                kind: if p.mutability.is_some() {
                    PointerKind::MutPtr
                } else {
                    PointerKind::ConstPtr
                },
                lifetime: None,
                elem: Box::new(Type::from_syn(&p.elem, cx)),
            },
            syn::Type::Slice(s) => Type::Slice(Box::new(Type::from_syn(&s.elem, cx))),
            syn::Type::Array(a) => Type::Array {
                elem: Box::new(Type::from_syn(&a.elem, cx)),
                len: tidy(&a.len.to_token_stream().to_string()),
            },
            syn::Type::Tuple(t) => {
                Type::Tuple(t.elems.iter().map(|e| Type::from_syn(e, cx)).collect())
            }
            syn::Type::Paren(p) => Type::from_syn(&p.elem, cx),
            syn::Type::Group(g) => Type::from_syn(&g.elem, cx),
            syn::Type::Never(_) => Type::Opaque("!".to_string()),
            other => Type::Opaque(tidy(&other.to_token_stream().to_string())),
        }
    }

    /// The type behind at most one pointer indirection.
    pub fn deref_once(&self) -> &Type {
        match self {
            Type::Pointer { elem, .. } => elem,
            other => other,
        }
    }

    /// The name a same-package lookup should use, if this is a plain named type.
    pub fn local_name(&self) -> Option<&str> {
        let Type::Named { path, .. } = self else {
            return None;
        };
        match path.as_slice() {
            [name] => Some(name),
            [prefix, name] if prefix == "self" => Some(name),
            _ => None,
        }
    }
}

fn from_path(path: &syn::Path, cx: &TypeContext) -> Option<Type> {
    let last = path.segments.last()?;
    // Generic arguments are only understood on the final segment.
    if path
        .segments
        .iter()
        .take(path.segments.len() - 1)
        .any(|s| !s.arguments.is_none())
    {
        return None;
    }

    let ident = last.ident.to_string();
    let args = match &last.arguments {
        syn::PathArguments::None => Vec::new(),
        syn::PathArguments::AngleBracketed(ab) => ab
            .args
            .iter()
            .map(|arg| match arg {
                syn::GenericArgument::Type(t) => Type::from_syn(t, cx),
                syn::GenericArgument::Lifetime(lt) => Type::Opaque(lt.to_string()),
                other => Type::Opaque(tidy(&other.to_token_stream().to_string())),
            })
            .collect(),
        syn::PathArguments::Parenthesized(_) => return None,
    };

    if path.segments.len() == 1 && path.leading_colon.is_none() && args.is_empty() {
        if cx.params.iter().any(|p| *p == ident) {
            return Some(Type::Param(ident));
        }
        if ident == "Self" {
            if let Some(name) = cx.self_name {
                return Some(Type::named(name));
            }
        }
    }

    if let (Some(kind), [elem]) = (PointerKind::from_wrapper(&ident), args.as_slice()) {
        if !matches!(elem, Type::Opaque(s) if s.starts_with('\'')) {
            return Some(Type::Pointer {
                kind,
                lifetime: None,
                elem: Box::new(elem.clone()),
            });
        }
    }

    let mut segments: Vec<String> = Vec::with_capacity(path.segments.len() + 1);
    if path.leading_colon.is_some() {
        segments.push(String::new());
    }
    segments.extend(path.segments.iter().map(|s| s.ident.to_string()));
    Some(Type::Named {
        path: segments,
        args,
    })
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Type::Named { path, args } => {
                f.write_str(&path.join("::"))?;
                if !args.is_empty() {
                    f.write_str("<")?;
                    write_list(f, args)?;
                    f.write_str(">")?;
                }
                Ok(())
            }
            Type::Param(name) | Type::Opaque(name) => f.write_str(name),
            Type::Pointer {
                kind,
                lifetime,
                elem,
            } => match kind {
                PointerKind::Ref | PointerKind::RefMut => {
                    f.write_str("&")?;
                    if let Some(lt) = lifetime {
                        write!(f, "{} ", lt)?;
                    }
                    if *kind == PointerKind::RefMut {
                        f.write_str("mut ")?;
                    }
                    write!(f, "{}", elem)
                }
                PointerKind::ConstPtr => write!(f, "*const {}", elem),
                PointerKind::MutPtr => write!(f, "*mut {}", elem),
                PointerKind::Box => write!(f, "Box<{}>", elem),
                PointerKind::Rc => write!(f, "Rc<{}>", elem),
                PointerKind::Arc => write!(f, "Arc<{}>", elem),
            },
            Type::Slice(elem) => write!(f, "[{}]", elem),
            Type::Array { elem, len } => write!(f, "[{}; {}]", elem, len),
            Type::Tuple(elems) => {
                f.write_str("(")?;
                write_list(f, elems)?;
                if elems.len() == 1 {
                    f.write_str(",")?;
                }
                f.write_str(")")
            }
        }
    }
}

fn write_list(f: &mut fmt::Formatter<'_>, items: &[Type]) -> fmt::Result {
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            f.write_str(", ")?;
        }
        write!(f, "{}", item)?;
    }
    Ok(())
}

/// Collapse the token spacing of `TokenStream::to_string` into source spelling.
/// `dyn Fn (i32) -> bool` becomes `dyn Fn(i32) -> bool`.
pub(crate) fn tidy(text: &str) -> String {
    let chars: Vec<char> = text.chars().collect();
    let mut out = String::with_capacity(text.len());
    for (i, &ch) in chars.iter().enumerate() {
        if ch == ' ' {
            let prev = out.chars().last();
            let next = chars.get(i + 1).copied();
            let after_word = prev.is_some_and(|c| c.is_alphanumeric() || c == '_');
            let glue_prev = matches!(prev, Some('(' | '[' | '<' | '&' | ':'));
            let glue_next = matches!(next, Some(')' | ']' | '>' | ',' | ';' | ':'))
                || (after_word && matches!(next, Some('(' | '<')));
            if glue_prev || glue_next {
                continue;
            }
        }
        out.push(ch);
    }
    out
}
