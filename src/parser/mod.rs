//! Symbol loader: resolve every eligible file of a directory once and expose
//! the declared structs as [`Struct`] descriptors.

pub mod comments;
pub mod scanner;

use crate::error::{Error, Result};
use crate::model::Struct;
use crate::types::provider::{eligible_files, parent_dir};
use crate::types::{BuildFlags, Package, Pos, SourceProvider, TypeInfoProvider};
use scanner::FileScan;
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, trace};

/// A resolved package together with the comment scans of its member files.
#[derive(Debug)]
pub struct LoadedPackage {
    pub package: Package,
    scans: HashMap<PathBuf, FileScan>,
}

impl LoadedPackage {
    pub fn scan(&self, file: &Path) -> Option<&FileScan> {
        self.scans.get(file)
    }

    /// Leading comment of the declaration at `pos` in `file`.
    pub fn comment_for(&self, file: &Path, pos: Pos) -> Option<String> {
        self.scan(file)?.comment_for(pos)
    }
}

struct Entry {
    file: PathBuf,
    package: Arc<LoadedPackage>,
}

/// Loads directories through a [`TypeInfoProvider`].
///
/// Files already seen by this parser are never resolved again, whether they
/// were passed in directly or loaded as a sibling of another file.
pub struct Parser<P = SourceProvider> {
    provider: P,
    flags: BuildFlags,
    entries: Vec<Entry>,
    seen: HashSet<PathBuf>,
}

impl Parser<SourceProvider> {
    pub fn with_flags(flags: BuildFlags) -> Self {
        Parser::new(SourceProvider::new(), flags)
    }
}

impl Default for Parser<SourceProvider> {
    fn default() -> Self {
        Parser::with_flags(BuildFlags::default())
    }
}

impl<P: TypeInfoProvider> Parser<P> {
    pub fn new(provider: P, flags: BuildFlags) -> Self {
        Self {
            provider,
            flags,
            entries: Vec::new(),
            seen: HashSet::new(),
        }
    }

    /// Load the package of `path`: a directory, or any file inside one.
    pub fn parse(&mut self, path: &Path) -> Result<()> {
        let dir = if path.is_file() {
            parent_dir(path)
        } else {
            path
        };
        let files = eligible_files(dir).map_err(|source| Error::Load {
            path: dir.to_path_buf(),
            source,
        })?;

        for file in files {
            if self.seen.contains(&file) {
                trace!(file = %file.display(), "already loaded");
                continue;
            }
            self.load_file(&file)?;
        }
        Ok(())
    }

    /// Load `dir` and return every struct found so far.
    pub fn load(&mut self, dir: &Path) -> Result<Vec<Struct>> {
        self.parse(dir)?;
        Ok(self.structs())
    }

    fn load_file(&mut self, file: &Path) -> Result<()> {
        debug!(file = %file.display(), "resolving");
        let model = self
            .provider
            .resolve_file(file, &self.flags)
            .map_err(|diagnostic| Error::Resolution {
                path: file.to_path_buf(),
                diagnostic,
            })?;

        if model.packages.len() > 1 {
            return Err(Error::AmbiguousPackage {
                path: file.to_path_buf(),
                packages: model.packages.iter().map(|p| p.name.clone()).collect(),
            });
        }
        let Some(package) = model.packages.into_iter().next() else {
            debug!(file = %file.display(), "no resolvable declarations");
            self.seen.insert(file.to_path_buf());
            return Ok(());
        };

        let scans = model
            .files
            .iter()
            .map(|f| (f.path.clone(), scanner::scan(f)))
            .collect();
        let members = package.files.clone();
        let loaded = Arc::new(LoadedPackage { package, scans });

        for member in members {
            if loaded.scan(&member).is_none() || !self.seen.insert(member.clone()) {
                continue;
            }
            self.entries.push(Entry {
                file: member,
                package: Arc::clone(&loaded),
            });
        }
        // Compiled out of its own package.
        self.seen.insert(file.to_path_buf());
        Ok(())
    }

    /// One descriptor per struct declared in a loaded file, in load order.
    pub fn structs(&self) -> Vec<Struct> {
        let mut out = Vec::new();
        for entry in &self.entries {
            let Some(scan) = entry.package.scan(&entry.file) else {
                continue;
            };
            // cfg-alternate declarations share one scope entry.
            let mut emitted = HashSet::new();
            for name in &scan.structs {
                if !emitted.insert(name.as_str()) {
                    continue;
                }
                match entry.package.package.scope.lookup(name) {
                    Some(named) if named.is_struct() && named.file == entry.file => {
                        out.push(Struct::new(Arc::clone(named), Arc::clone(&entry.package)));
                    }
                    _ => trace!(name = %name, "declaration not in package scope"),
                }
            }
        }
        out
    }

    pub fn find_by_name(&self, name: &str) -> Result<Struct> {
        self.structs()
            .into_iter()
            .find(|s| s.name() == name)
            .ok_or_else(|| Error::NotFound(name.to_string()))
    }

    /// Names of declared traits and fn-pointer type aliases.
    pub fn interface_names(&self) -> Vec<String> {
        self.entries
            .iter()
            .filter_map(|e| e.package.scan(&e.file))
            .flat_map(|scan| scan.interfaces.iter().cloned())
            .collect()
    }
}
