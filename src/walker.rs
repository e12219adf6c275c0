//! Directory traversal and per-struct dispatch.

use crate::error::{Error, Result};
use crate::model::Struct;
use crate::output::OutputStreamProvider;
use crate::parser::Parser;
use crate::render::Renderer;
use crate::types::BuildFlags;
use regex::Regex;
use std::any::Any;
use std::cell::Cell;
use std::io::{self, Write};
use std::panic::{self, AssertUnwindSafe, UnwindSafe};
use std::path::PathBuf;
use std::sync::Once;
use std::thread;
use tracing::{debug, error, info, info_span};
use walkdir::{DirEntry, WalkDir};

pub trait StructVisitor {
    fn visit_struct(&mut self, item: &Struct) -> Result<()>;
}

/// Finds the structs under `base_dir` whose name matches `filter`.
#[derive(Debug, Clone)]
pub struct Walker {
    pub base_dir: PathBuf,
    pub recursive: bool,
    pub filter: Regex,
    /// Stop after the first matching struct.
    pub limit_one: bool,
    pub build_flags: BuildFlags,
}

impl Walker {
    /// Visit every matching struct. Returns whether any struct matched.
    ///
    /// A directory that fails to resolve aborts the walk; a failed visit is
    /// logged and the walk goes on.
    #[tracing::instrument(skip_all, fields(dir = %self.base_dir.display()))]
    pub fn walk(&self, visitor: &mut dyn StructVisitor) -> Result<bool> {
        info!("walking");
        let mut parser = Parser::with_flags(self.build_flags.clone());
        for dir in self.directories()? {
            parser.parse(&dir)?;
        }

        let interfaces = parser.interface_names();
        debug!(count = interfaces.len(), names = ?interfaces, "interfaces declared");

        let mut matched = false;
        for item in parser.structs() {
            if !self.filter.is_match(item.name()) {
                continue;
            }
            matched = true;
            let span = info_span!("struct", name = %item.qualified_name());
            let _guard = span.enter();
            if let Err(err) = visitor.visit_struct(&item) {
                error!(error = %err, "unable to generate information");
            }
            if self.limit_one {
                break;
            }
        }
        Ok(matched)
    }

    /// `base_dir` and, when recursive, every directory below it, sorted.
    fn directories(&self) -> Result<Vec<PathBuf>> {
        let mut walk = WalkDir::new(&self.base_dir).sort_by_file_name();
        if !self.recursive {
            walk = walk.max_depth(0);
        }
        let mut dirs = Vec::new();
        for entry in walk.into_iter().filter_entry(|e| e.depth() == 0 || !is_skipped(e)) {
            let entry = entry.map_err(|err| Error::Load {
                path: err.path().unwrap_or(self.base_dir.as_path()).to_path_buf(),
                source: io::Error::from(err),
            })?;
            if entry.file_type().is_dir() {
                dirs.push(entry.into_path());
            }
        }
        Ok(dirs)
    }
}

fn is_skipped(entry: &DirEntry) -> bool {
    let name = entry.file_name().to_string_lossy();
    name.starts_with('.')
        || name.starts_with('_')
        || (entry.file_type().is_dir() && name == "target")
}

/// Renders each visited struct and writes it to the output provider.
pub struct GeneratorVisitor {
    renderer: Box<dyn Renderer>,
    output: Box<dyn OutputStreamProvider>,
}

impl GeneratorVisitor {
    pub fn new(renderer: Box<dyn Renderer>, output: Box<dyn OutputStreamProvider>) -> Self {
        Self { renderer, output }
    }
}

impl StructVisitor for GeneratorVisitor {
    fn visit_struct(&mut self, item: &Struct) -> Result<()> {
        let renderer = &self.renderer;
        let rendered = match quiet_catch_unwind(AssertUnwindSafe(|| renderer.render(item))) {
            Ok(rendered) => rendered?,
            Err(payload) => {
                error!(reason = %panic_message(&*payload), "unable to generate information");
                return Ok(());
            }
        };

        let mut out = self.output.struct_writer(item, self.renderer.file_extension())?;
        out.write_all(rendered.as_bytes())?;
        if !rendered.ends_with('\n') {
            out.write_all(b"\n")?;
        }
        out.flush()?;
        info!("wrote struct");
        Ok(())
    }
}

thread_local! {
    static CONTAINED: Cell<bool> = const { Cell::new(false) };
}

static QUIET_HOOK: Once = Once::new();

/// `catch_unwind` that reports a contained panic as a debug log line instead
/// of the default stderr report. Panics elsewhere reach the previous hook.
fn quiet_catch_unwind<R>(f: impl FnOnce() -> R + UnwindSafe) -> thread::Result<R> {
    QUIET_HOOK.call_once(|| {
        let previous = panic::take_hook();
        panic::set_hook(Box::new(move |info| {
            if CONTAINED.with(Cell::get) {
                debug!(location = ?info.location(), "render panicked");
            } else {
                previous(info);
            }
        }));
    });
    CONTAINED.with(|c| c.set(true));
    let result = panic::catch_unwind(f);
    CONTAINED.with(|c| c.set(false));
    result
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
