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

//! Command-line synthesis for every build-artifact kind. Each function is
//! pure over `(&Config, mode, paths)` and returns one shell-ready command
//! string; looking up a mode missing from the relevant flag table is the
//! only failure.

pub mod cmd_builder;

use akroutil::common::{Config, ConfigError};
use akroutil::target::ExtraParams;
use self::cmd_builder::CommandBuilder;

fn compile_driver(config: &Config) -> String {
    match &config.compiler_prefix {
        Some(prefix) => format!("{prefix} {}", config.compiler),
        None => config.compiler.clone(),
    }
}

fn link_driver(config: &Config) -> String {
    let driver = config.link_driver();
    match &config.linker_prefix {
        Some(prefix) => format!("{prefix} {driver}"),
        None => driver.into(),
    }
}

/// The shared-object internal name: the final path segment when the output
/// path has a directory component, the path itself otherwise.
fn soname_of(out: &str) -> &str {
    out.rsplit(['/', '\\']).next().unwrap_or(out)
}

/// Make-rule dependency scan for one source file, used by the scheduler to
/// discover header dependencies.
pub fn make_depscan_command(config: &Config, mode: &str, source: &str) -> Result<String, ConfigError> {
    let mode_flags = config.compile_flags_for_mode(mode)?;
    let mut builder = CommandBuilder::new(&compile_driver(config));
    builder
        .verbatim(&config.compile_flags)
        .verbatim(mode_flags)
        .arg("-MM")
        .arg(source);
    Ok(builder.build())
}

/// Compile one source file to one object file.
pub fn make_compile_command(
    config: &Config,
    mode: &str,
    source: &str,
    object: &str,
) -> Result<String, ConfigError> {
    let mode_flags = config.compile_flags_for_mode(mode)?;
    let mut builder = CommandBuilder::new(&compile_driver(config));
    builder
        .verbatim(&config.compile_flags)
        .verbatim(mode_flags)
        .arg("-c")
        .arg(source)
        .arg("-o")
        .arg(object);
    Ok(builder.build())
}

/// Create (or replace and re-index) a static archive from the given
/// objects, in order. No mode is consulted.
pub fn make_archive_command<S>(config: &Config, archive: &str, objects: &[S]) -> String
where
    S: AsRef<str>,
{
    let mut builder = CommandBuilder::new(&config.archiver);
    builder.arg("rcs").arg(archive);
    builder.args(objects.iter().map(|o| o.as_ref().to_string()));
    builder.build()
}

/// Link a dynamic library. The soname is derived from the output path;
/// `extra` carries per-library link parameters (objects or flags) past the
/// object list.
pub fn make_dylib_command<S>(
    config: &Config,
    mode: &str,
    out: &str,
    objects: &[S],
    extra: Option<&ExtraParams>,
) -> Result<String, ConfigError>
where
    S: AsRef<str>,
{
    let mode_flags = config.compile_flags_for_mode(mode)?;
    let mut builder = CommandBuilder::new(&compile_driver(config));
    builder
        .arg("-shared")
        .verbatim(&config.compile_flags)
        .verbatim(mode_flags)
        .arg(&format!("-Wl,-soname,{}", soname_of(out)))
        .arg("-o")
        .arg(out);
    builder.args(objects.iter().map(|o| o.as_ref().to_string()));
    if let Some(extra) = extra {
        builder.verbatim(&extra.render());
    }
    Ok(builder.build())
}

/// Link an executable from the given objects. The global additional link
/// flags come after the objects, the output path last.
pub fn make_link_command<S>(
    config: &Config,
    mode: &str,
    objects: &[S],
    out: &str,
) -> Result<String, ConfigError>
where
    S: AsRef<str>,
{
    let mode_flags = config.link_flags_for_mode(mode)?;
    let mut builder = CommandBuilder::new(&link_driver(config));
    builder.verbatim(&config.link_flags).verbatim(mode_flags);
    builder.args(objects.iter().map(|o| o.as_ref().to_string()));
    builder
        .verbatim(&config.additional_link_flags)
        .arg("-o")
        .arg(out);
    Ok(builder.build())
}
