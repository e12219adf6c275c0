//! tinfo: write a JSON or text inventory of Rust struct types.
//!
//! - one struct: `tinfo --name Point --dir src/geo`
//! - every struct below a directory: `tinfo --all --dir src --output docs/types`

use anyhow::{bail, Context, Result};
use clap::Parser;
use std::io::IsTerminal;
use std::path::PathBuf;
use tracing::{debug, info};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use typeinfo::config::{Config, Settings};
use typeinfo::describe::Shape;
use typeinfo::output::{Case, FileOutputStreamProvider, OutputStreamProvider, StdoutStreamProvider};
use typeinfo::render::{create_renderer, Format};
use typeinfo::walker::{GeneratorVisitor, Walker};

#[derive(Parser)]
#[command(
    name = "tinfo",
    version,
    about = "Generate field and method inventories for Rust structs"
)]
struct Cli {
    /// Config file (TOML); flags given here override it
    #[arg(long)]
    config: Option<PathBuf>,

    /// Name or regular expression of the structs to describe
    #[arg(long)]
    name: Option<String>,

    /// Describe every struct found (implies --recursive)
    #[arg(long)]
    all: bool,

    /// Directory to search for structs [default: .]
    #[arg(long)]
    dir: Option<PathBuf>,

    /// Search subdirectories too
    #[arg(short = 'r', long)]
    recursive: bool,

    /// Directory to write generated files to [default: ./typeinfo]
    #[arg(long)]
    output: Option<PathBuf>,

    /// File name casing: camel, snake, underscore
    #[arg(long)]
    case: Option<Case>,

    /// Mirror the source tree under the output directory
    #[arg(long)]
    keeptree: bool,

    /// Name of the generated file (only with --name and no regex)
    #[arg(long)]
    filename: Option<String>,

    /// Output format: json (default), txt
    #[arg(short = 'f', long)]
    format: Option<Format>,

    /// JSON field layout: flat (dotted paths, default) or nested
    #[arg(long)]
    shape: Option<Shape>,

    /// Nested struct expansion depth [default: 4 flat, 3 nested]
    #[arg(long)]
    depth: Option<usize>,

    /// Indent JSON output
    #[arg(long)]
    pretty: bool,

    /// Print to stdout instead of writing files
    #[arg(long)]
    print: bool,

    /// Enabled cfg features, comma separated
    #[arg(long, value_delimiter = ',')]
    tags: Vec<String>,

    /// Log level or filter directive; empty disables logging [default: info]
    #[arg(long)]
    log_level: Option<String>,

    /// Disable logging
    #[arg(short = 'q', long)]
    quiet: bool,
}

impl Cli {
    /// Flags as a config layer; switches that were not given stay unset.
    fn overrides(&self) -> Config {
        let flag = |on: bool| on.then_some(true);
        Config {
            name: self.name.clone(),
            all: flag(self.all),
            dir: self.dir.clone(),
            recursive: flag(self.recursive),
            output: self.output.clone(),
            case: self.case,
            keeptree: flag(self.keeptree),
            filename: self.filename.clone(),
            format: self.format,
            shape: self.shape,
            depth: self.depth,
            pretty: flag(self.pretty),
            print: flag(self.print),
            tags: (!self.tags.is_empty()).then(|| self.tags.clone()),
            log_level: self.log_level.clone(),
            quiet: flag(self.quiet),
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let file = match &cli.config {
        Some(path) => Config::from_path(path)?,
        None => Config::default(),
    };
    let config = file.merge(cli.overrides());
    init_logging(config.log_filter().as_deref())?;
    info!("Starting tinfo");

    let settings = config.resolve()?;
    run(settings)
}

fn init_logging(filter: Option<&str>) -> Result<()> {
    let Some(filter) = filter else {
        return Ok(());
    };
    let filter = EnvFilter::try_new(filter).with_context(|| format!("invalid log level: {}", filter))?;
    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_ansi(std::io::stderr().is_terminal())
                .with_target(false),
        )
        .try_init()
        .context("failed to install logger")?;
    Ok(())
}

fn run(settings: Settings) -> Result<()> {
    let base_dir = settings
        .dir
        .canonicalize()
        .with_context(|| format!("cannot access directory {}", settings.dir.display()))?;
    debug!(dir = %base_dir.display(), "resolved base directory");

    let output: Box<dyn OutputStreamProvider> = if settings.print {
        Box::new(StdoutStreamProvider)
    } else {
        Box::new(FileOutputStreamProvider {
            base_dir: settings.output.clone(),
            case: settings.case,
            keep_tree: settings.keep_tree,
            original_dir: base_dir.clone(),
            file_name: settings.file_name.clone(),
        })
    };
    let renderer = create_renderer(settings.format, settings.describe, settings.pretty);
    let mut visitor = GeneratorVisitor::new(renderer, output);

    let walker = Walker {
        base_dir,
        recursive: settings.recursive,
        filter: settings.selection.filter.clone(),
        limit_one: settings.selection.limit_one,
        build_flags: settings.build_flags.clone(),
    };
    let matched = walker.walk(&mut visitor)?;

    if let (Some(name), false) = (&settings.selection.name, matched) {
        bail!("Unable to find '{}' in any Rust files under this path", name);
    }
    Ok(())
}
