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

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

pub const AKRO_JSON: &str = "akro.json";

pub const DEFAULT_COMPILER: &str = "g++";
pub const DEFAULT_ARCHIVER: &str = "ar";
pub const DEFAULT_COMPILE_FLAGS: &str = "-Wall";

pub const OBJ_EXT: &str = ".o";
pub const STATIC_LIB_EXT: &str = ".a";
pub const DYNAMIC_LIB_EXT: &str = ".so";

/// Flag tables a build mode can be looked up in. Used only for error
/// reporting, so a misconfigured mode names the table it is missing from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlagTable {
    CompileFlags,
    LinkFlags,
}

impl FlagTable {
    pub fn key(&self) -> &'static str {
        match self {
            FlagTable::CompileFlags => "mode_compile_flags",
            FlagTable::LinkFlags => "mode_link_flags",
        }
    }
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("build mode `{mode}` has no entry in `{}`", .table.key())]
    UnknownMode { mode: String, table: FlagTable },
}

#[derive(Debug, thiserror::Error)]
#[error("failed to load `{}`", path.display())]
pub struct ConfigFileError {
    path: Box<Path>,
    #[source]
    kind: ConfigFileErrorKind,
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigFileErrorKind {
    #[error("I/O error")]
    IO(#[from] std::io::Error),
    #[error("Parse error")]
    Parse(#[from] serde_json_lenient::Error),
}

/// Process-wide build settings, constructed once before any target is
/// declared and passed by reference afterwards.
///
/// Every field has a serde default, so a configuration file only needs to
/// name the options it changes. Unknown keys are ignored; a mode missing
/// from a flag table is only reported when a command is synthesized for
/// that mode.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Compile and dependency-scan driver.
    #[serde(default = "default_compiler")]
    pub compiler: String,
    /// Prepended to the compile driver, for wrappers like ccache or distcc.
    #[serde(default)]
    pub compiler_prefix: Option<String>,
    /// Flags appended verbatim to every compile and dependency-scan command.
    #[serde(default = "default_compile_flags")]
    pub compile_flags: String,
    /// Per-mode compile flags, appended after the base flags.
    #[serde(default = "default_mode_compile_flags")]
    pub mode_compile_flags: IndexMap<String, String>,
    /// Static-archive tool.
    #[serde(default = "default_archiver")]
    pub archiver: String,
    /// Link driver. `None` means reuse the compiler.
    #[serde(default)]
    pub linker: Option<String>,
    #[serde(default)]
    pub linker_prefix: Option<String>,
    /// Flags appended verbatim to every executable-link command.
    #[serde(default)]
    pub link_flags: String,
    /// Per-mode link flags, appended after the base link flags.
    #[serde(default = "default_mode_link_flags")]
    pub mode_link_flags: IndexMap<String, String>,
    /// Appended last on executable links, for third-party objects and
    /// libraries not declared as libraries of this project.
    #[serde(default)]
    pub additional_link_flags: String,
    #[serde(default = "default_header_extensions")]
    pub header_extensions: Vec<String>,
    #[serde(default = "default_source_extensions")]
    pub source_extensions: Vec<String>,
    #[serde(default = "default_obj_extension")]
    pub obj_extension: String,
    #[serde(default = "default_static_lib_extension")]
    pub static_lib_extension: String,
    #[serde(default = "default_dynamic_lib_extension")]
    pub dynamic_lib_extension: String,
    /// Tells the external scheduler it may run independent build steps in
    /// parallel. The core itself never schedules anything.
    #[serde(default)]
    pub multitask: bool,
    /// Echo every command before running it.
    #[serde(default)]
    pub verbose: bool,
}

fn default_compiler() -> String {
    DEFAULT_COMPILER.into()
}

fn default_archiver() -> String {
    DEFAULT_ARCHIVER.into()
}

fn default_compile_flags() -> String {
    DEFAULT_COMPILE_FLAGS.into()
}

fn default_mode_compile_flags() -> IndexMap<String, String> {
    IndexMap::from([
        ("debug".into(), "-g3".into()),
        ("release".into(), "-O3 -g3".into()),
    ])
}

// The debug/release modes must resolve in both tables, so the default link
// table carries empty entries for them.
fn default_mode_link_flags() -> IndexMap<String, String> {
    IndexMap::from([("debug".into(), "".into()), ("release".into(), "".into())])
}

fn default_header_extensions() -> Vec<String> {
    vec![".h".into(), ".hpp".into(), ".H".into()]
}

fn default_source_extensions() -> Vec<String> {
    vec![
        ".c".into(),
        ".cc".into(),
        ".cpp".into(),
        ".cxx".into(),
        ".c++".into(),
        ".C".into(),
    ]
}

fn default_obj_extension() -> String {
    OBJ_EXT.into()
}

fn default_static_lib_extension() -> String {
    STATIC_LIB_EXT.into()
}

fn default_dynamic_lib_extension() -> String {
    DYNAMIC_LIB_EXT.into()
}

impl Default for Config {
    fn default() -> Self {
        Config {
            compiler: default_compiler(),
            compiler_prefix: None,
            compile_flags: default_compile_flags(),
            mode_compile_flags: default_mode_compile_flags(),
            archiver: default_archiver(),
            linker: None,
            linker_prefix: None,
            link_flags: String::new(),
            mode_link_flags: default_mode_link_flags(),
            additional_link_flags: String::new(),
            header_extensions: default_header_extensions(),
            source_extensions: default_source_extensions(),
            obj_extension: default_obj_extension(),
            static_lib_extension: default_static_lib_extension(),
            dynamic_lib_extension: default_dynamic_lib_extension(),
            multitask: false,
            verbose: false,
        }
    }
}

impl Config {
    pub fn from_json_file(path: &Path) -> Result<Config, ConfigFileError> {
        let file = File::open(path).map_err(|e| ConfigFileError {
            path: path.into(),
            kind: ConfigFileErrorKind::IO(e),
        })?;
        let reader = BufReader::new(file);
        serde_json_lenient::from_reader(reader).map_err(|e| ConfigFileError {
            path: path.into(),
            kind: ConfigFileErrorKind::Parse(e),
        })
    }

    /// Per-mode compile flags. A mode absent from the table is a
    /// configuration defect, not an empty flag set.
    pub fn compile_flags_for_mode(&self, mode: &str) -> Result<&str, ConfigError> {
        self.mode_compile_flags
            .get(mode)
            .map(String::as_str)
            .ok_or_else(|| ConfigError::UnknownMode {
                mode: mode.into(),
                table: FlagTable::CompileFlags,
            })
    }

    pub fn link_flags_for_mode(&self, mode: &str) -> Result<&str, ConfigError> {
        self.mode_link_flags
            .get(mode)
            .map(String::as_str)
            .ok_or_else(|| ConfigError::UnknownMode {
                mode: mode.into(),
                table: FlagTable::LinkFlags,
            })
    }

    /// The executable-link driver: the configured linker, or the compiler
    /// when no linker is set.
    pub fn link_driver(&self) -> &str {
        self.linker.as_deref().unwrap_or(&self.compiler)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use expect_test::expect;

    #[test]
    fn default_config_matches_the_documented_options() {
        expect![[r#"
            {
              "compiler": "g++",
              "compiler_prefix": null,
              "compile_flags": "-Wall",
              "mode_compile_flags": {
                "debug": "-g3",
                "release": "-O3 -g3"
              },
              "archiver": "ar",
              "linker": null,
              "linker_prefix": null,
              "link_flags": "",
              "mode_link_flags": {
                "debug": "",
                "release": ""
              },
              "additional_link_flags": "",
              "header_extensions": [
                ".h",
                ".hpp",
                ".H"
              ],
              "source_extensions": [
                ".c",
                ".cc",
                ".cpp",
                ".cxx",
                ".c++",
                ".C"
              ],
              "obj_extension": ".o",
              "static_lib_extension": ".a",
              "dynamic_lib_extension": ".so",
              "multitask": false,
              "verbose": false
            }"#]]
        .assert_eq(&serde_json_lenient::to_string_pretty(&Config::default()).unwrap());
    }

    #[test]
    fn default_modes_resolve_in_both_tables() {
        let cfg = Config::default();
        assert_eq!(cfg.compile_flags_for_mode("debug").unwrap(), "-g3");
        assert_eq!(cfg.compile_flags_for_mode("release").unwrap(), "-O3 -g3");
        assert_eq!(cfg.link_flags_for_mode("debug").unwrap(), "");
        assert_eq!(cfg.link_flags_for_mode("release").unwrap(), "");
    }

    #[test]
    fn unknown_mode_is_an_error_not_an_empty_default() {
        let cfg = Config::default();
        let err = cfg.compile_flags_for_mode("profile").unwrap_err();
        assert_eq!(
            err.to_string(),
            "build mode `profile` has no entry in `mode_compile_flags`"
        );
        let err = cfg.link_flags_for_mode("profile").unwrap_err();
        assert_eq!(
            err.to_string(),
            "build mode `profile` has no entry in `mode_link_flags`"
        );
    }

    #[test]
    fn linker_defaults_to_compiler() {
        let mut cfg = Config::default();
        assert_eq!(cfg.link_driver(), "g++");
        cfg.linker = Some("ld.gold".into());
        assert_eq!(cfg.link_driver(), "ld.gold");
    }

    #[test]
    fn unknown_config_keys_are_ignored() {
        let cfg: Config = serde_json_lenient::from_str(
            r#"{ "compiler": "clang++", "color_scheme": "solarized" }"#,
        )
        .unwrap();
        assert_eq!(cfg.compiler, "clang++");
        assert_eq!(cfg.archiver, "ar");
    }

    #[test]
    fn config_file_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(AKRO_JSON);
        std::fs::write(
            &path,
            r#"{
                "compiler_prefix": "ccache",
                "mode_compile_flags": { "debug": "-g", "asan": "-g -fsanitize=address" }
            }"#,
        )
        .unwrap();
        let cfg = Config::from_json_file(&path).unwrap();
        assert_eq!(cfg.compiler_prefix.as_deref(), Some("ccache"));
        assert_eq!(cfg.compile_flags_for_mode("asan").unwrap(), "-g -fsanitize=address");
        // the user table replaces the default one wholesale
        assert!(cfg.compile_flags_for_mode("release").is_err());
    }

    #[test]
    fn missing_config_file_reports_the_path() {
        let err = Config::from_json_file(Path::new("no/such/akro.json")).unwrap_err();
        assert_eq!(err.to_string(), "failed to load `no/such/akro.json`");
    }
}
