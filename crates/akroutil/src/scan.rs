// akro: A declarative build front end for native artifacts.
// Copyright (C) 2024 International Digital Economy Academy
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU Affero General Public License for more details.
//
// You should have received a copy of the GNU Affero General Public License
// along with this program.  If not, see <https://www.gnu.org/licenses/>.
//
// For inquiries, you can contact us via e-mail at jichuruanjian@idea.edu.cn.

//! Source discovery against the configured extension sets.

use crate::common::Config;
use anyhow::Context;
use log::debug;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

fn matches_extension(path: &Path, extensions: &[String]) -> bool {
    let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
        return false;
    };
    // extension matching is case-sensitive: `.C` is a source, `.c` is too,
    // but they are distinct entries in the table
    extensions.iter().any(|ext| name.ends_with(ext.as_str()))
}

pub fn is_source(config: &Config, path: &Path) -> bool {
    matches_extension(path, &config.source_extensions)
}

pub fn is_header(config: &Config, path: &Path) -> bool {
    matches_extension(path, &config.header_extensions)
}

/// Walks `dir` and returns every source file, sorted by file name for a
/// deterministic build order. With `recurse` false only the directory
/// itself is examined.
pub fn scan_sources(config: &Config, dir: &Path, recurse: bool) -> anyhow::Result<Vec<PathBuf>> {
    let mut walker = WalkDir::new(dir).sort_by_file_name();
    if !recurse {
        walker = walker.max_depth(1);
    }
    let mut sources = Vec::new();
    for entry in walker {
        let entry = entry.with_context(|| format!("failed to scan `{}`", dir.display()))?;
        if entry.file_type().is_file() && is_source(config, entry.path()) {
            sources.push(entry.into_path());
        }
    }
    debug!("found {} source file(s) under `{}`", sources.len(), dir.display());
    Ok(sources)
}

/// Maps a source path to its object path by replacing the recognized source
/// extension. Returns `None` for paths that are not sources.
pub fn object_for_source(config: &Config, source: &Path) -> Option<PathBuf> {
    let s = source.to_str()?;
    let ext = config
        .source_extensions
        .iter()
        .find(|ext| s.ends_with(ext.as_str()))?;
    Some(PathBuf::from(format!(
        "{}{}",
        &s[..s.len() - ext.len()],
        config.obj_extension
    )))
}
