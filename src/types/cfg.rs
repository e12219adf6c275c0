//! `#[cfg(...)]` evaluation against the build flags of a run.
//!
//! Only `feature = "..."` and `test` are decided. Every other predicate
//! (target, panic strategy, custom `--cfg` names) is unknown, and an item
//! whose predicate is unknown is kept.

use std::collections::BTreeSet;
use syn::punctuated::Punctuated;
use syn::{Attribute, Meta, Token};

/// Enabled cfg features, e.g. from `--tags serde,async`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BuildFlags {
    features: BTreeSet<String>,
}

impl BuildFlags {
    pub fn new<I, S>(features: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            features: features.into_iter().map(Into::into).collect(),
        }
    }

    pub fn has_feature(&self, name: &str) -> bool {
        self.features.contains(name)
    }

    /// Whether an item carrying `attrs` is compiled under these flags.
    pub fn is_enabled(&self, attrs: &[Attribute]) -> bool {
        attrs
            .iter()
            .filter(|attr| attr.path().is_ident("cfg"))
            .all(|attr| match attr.parse_args::<Meta>() {
                Ok(meta) => self.eval(&meta) != Some(false),
                Err(_) => true,
            })
    }

    fn eval(&self, meta: &Meta) -> Option<bool> {
        match meta {
            Meta::Path(path) if path.is_ident("test") => Some(false),
            Meta::Path(_) => None,
            Meta::NameValue(nv) if nv.path.is_ident("feature") => match &nv.value {
                syn::Expr::Lit(syn::ExprLit {
                    lit: syn::Lit::Str(s),
                    ..
                }) => Some(self.has_feature(&s.value())),
                _ => None,
            },
            Meta::NameValue(_) => None,
            Meta::List(list) => {
                let nested = list
                    .parse_args_with(Punctuated::<Meta, Token![,]>::parse_terminated)
                    .ok()?;
                let values: Vec<Option<bool>> = nested.iter().map(|m| self.eval(m)).collect();
                if list.path.is_ident("not") {
                    match values.as_slice() {
                        [single] => single.map(|v| !v),
                        _ => None,
                    }
                } else if list.path.is_ident("all") {
                    if values.contains(&Some(false)) {
                        Some(false)
                    } else if values.contains(&None) {
                        None
                    } else {
                        Some(true)
                    }
                } else if list.path.is_ident("any") {
                    if values.contains(&Some(true)) {
                        Some(true)
                    } else if values.contains(&None) {
                        None
                    } else {
                        Some(false)
                    }
                } else {
                    None
                }
            }
        }
    }
}
