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

//! Per-artifact build steps: scanning a declared library's sources,
//! compiling them, producing the archive or shared object, and recording
//! captured contributions. Sequencing across artifacts (build-before
//! edges, parallelism) stays with the external scheduler; each function
//! here performs exactly one artifact's worth of work and reports success
//! as a boolean the scheduler can aggregate.

use crate::capture::CaptureTracker;
use crate::cmd;
use crate::runner;
use akroutil::common::Config;
use akroutil::scan;
use akroutil::target::{ExtraParams, Library};
use anyhow::bail;
use log::debug;
use std::path::{Path, PathBuf};

/// Resolves a library's `sources` entries: a path that is itself a source
/// file is taken as-is, anything else is scanned as a directory.
pub fn collect_sources(config: &Config, library: &Library) -> anyhow::Result<Vec<PathBuf>> {
    let mut sources = Vec::new();
    for entry in &library.sources {
        let path = Path::new(entry);
        if scan::is_source(config, path) {
            sources.push(path.to_path_buf());
        } else {
            sources.extend(scan::scan_sources(config, path, library.recurse)?);
        }
    }
    Ok(sources)
}

fn object_of(config: &Config, source: &Path) -> anyhow::Result<String> {
    let Some(object) = scan::object_for_source(config, source) else {
        bail!("`{}` is not a recognized source file", source.display());
    };
    Ok(object.display().to_string())
}

/// Compiles every source of `library` and produces its archive or shared
/// object. On success the library's contributions (its objects plus any
/// additional link parameters) are recorded for capture-enabled libraries;
/// on a failed step nothing is recorded and `Ok(false)` is returned.
pub fn build_library(
    config: &Config,
    library: &Library,
    mode: &str,
    tracker: &CaptureTracker,
) -> anyhow::Result<bool> {
    if library.capture_deps {
        tracker.begin(library.path.clone())?;
    }

    let sources = collect_sources(config, library)?;
    let mut objects = Vec::with_capacity(sources.len());
    for source in &sources {
        let object = object_of(config, source)?;
        let cmd = cmd::make_compile_command(config, mode, &source.display().to_string(), &object)?;
        if !runner::run_command(&cmd, None, config.verbose)? {
            return Ok(false);
        }
        objects.push(object);
    }

    let link_cmd = if library.is_static {
        cmd::make_archive_command(config, &library.path, &objects)
    } else {
        cmd::make_dylib_command(
            config,
            mode,
            &library.path,
            &objects,
            library.additional_params.as_ref(),
        )?
    };
    if !runner::run_command(&link_cmd, None, config.verbose)? {
        return Ok(false);
    }

    if library.capture_deps {
        let mut contributions = objects;
        match &library.additional_params {
            Some(ExtraParams::Verbatim(s)) => contributions.push(s.clone()),
            Some(ExtraParams::List(words)) => contributions.extend(words.iter().cloned()),
            None => {}
        }
        debug!("built `{}`, capturing contributions", library.path);
        tracker.complete(&library.path, contributions)?;
    }
    Ok(true)
}

/// Links one declared binary from its own objects plus the captured
/// contributions of `deps`, in dependency order.
pub fn link_binary(
    config: &Config,
    mode: &str,
    objects: &[String],
    deps: &[String],
    out: &str,
    tracker: &CaptureTracker,
) -> anyhow::Result<bool> {
    let mut inputs = objects.to_vec();
    inputs.extend(tracker.fold(deps));
    let cmd = cmd::make_link_command(config, mode, &inputs, out)?;
    runner::run_command(&cmd, None, config.verbose)
}
