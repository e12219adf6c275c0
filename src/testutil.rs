//! Fixtures shared by unit tests.

use crate::model::Struct;
use crate::parser::Parser;
use std::fs;
use tempfile::TempDir;

/// Write `files` into a fresh directory and load it.
pub fn load(files: &[(&str, &str)]) -> (TempDir, Parser) {
    let dir = TempDir::new().unwrap();
    for (name, body) in files {
        fs::write(dir.path().join(name), body).unwrap();
    }
    let mut parser = Parser::default();
    parser.parse(dir.path()).unwrap();
    (dir, parser)
}

pub fn find(parser: &Parser, name: &str) -> Struct {
    parser.find_by_name(name).unwrap()
}
