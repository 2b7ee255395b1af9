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

//! Declared build targets (tests, binaries, libraries) and the registries
//! that collect them during the configuration phase. Registration order is
//! preserved; every validation failure is returned at declaration time,
//! before any build step runs.

use derive_builder::Builder;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// A test's `binary` must carry this suffix. The convention is inherited
/// from the original build descriptions and is enforced literally, even
/// though the generated toolchain commands are Unix-style.
pub const TEST_BINARY_SUFFIX: &str = ".exe";

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum TargetError {
    #[error("test name must not be empty")]
    EmptyTestName,
    #[error("test `{name}` is already registered")]
    DuplicateTest { name: String },
    #[error("test `{name}` must specify at least one of `script` or `binary`")]
    MissingScriptOrBinary { name: String },
    #[error("test `{name}`: binary `{binary}` must end with `{TEST_BINARY_SUFFIX}`")]
    BadBinarySuffix { name: String, binary: String },
}

/// A declared test, consumed by the external test runner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Test {
    pub name: String,
    #[serde(default)]
    pub script: Option<String>,
    #[serde(default)]
    pub binary: Option<String>,
    #[serde(default)]
    pub cmdline: Option<String>,
}

/// Bulk registration accepts either a bare name or a full test record.
/// A bare name `s` expands to `Test { name: s, script: s, binary: s }`.
/// Any other shape fails to deserialize.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TestEntry {
    Name(String),
    Full(Test),
}

impl From<&str> for TestEntry {
    fn from(name: &str) -> Self {
        TestEntry::Name(name.into())
    }
}

impl From<String> for TestEntry {
    fn from(name: String) -> Self {
        TestEntry::Name(name)
    }
}

impl From<Test> for TestEntry {
    fn from(test: Test) -> Self {
        TestEntry::Full(test)
    }
}

impl TestEntry {
    fn into_test(self) -> Test {
        match self {
            TestEntry::Name(s) => Test {
                name: s.clone(),
                script: Some(s.clone()),
                binary: Some(s),
                cmdline: None,
            },
            TestEntry::Full(t) => t,
        }
    }
}

/// Extra link parameters for a dynamic library: either one verbatim string
/// or a list of words joined by spaces. Other shapes are rejected when the
/// build description is parsed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ExtraParams {
    Verbatim(String),
    List(Vec<String>),
}

impl ExtraParams {
    pub fn render(&self) -> String {
        match self {
            ExtraParams::Verbatim(s) => s.clone(),
            ExtraParams::List(words) => words.join(" "),
        }
    }
}

fn default_true() -> bool {
    true
}

/// A declared library. `path` and `sources` are required; the rest default
/// to a statically linked, recursively scanned, capture-enabled library,
/// matching the common case.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Builder)]
#[builder(setter(into), build_fn(validate = "Self::validate"))]
pub struct Library {
    pub path: String,
    pub sources: Vec<String>,
    /// Static archive when true, dynamic (shared) library when false.
    #[serde(rename = "static", default = "default_true")]
    #[builder(default = true)]
    pub is_static: bool,
    /// Descend into subdirectories when scanning `sources`.
    #[serde(default = "default_true")]
    #[builder(default = true)]
    pub recurse: bool,
    /// Record this library's link contributions for dependent targets.
    #[serde(default = "default_true")]
    #[builder(default = true)]
    pub capture_deps: bool,
    #[serde(default)]
    #[builder(default)]
    pub additional_params: Option<ExtraParams>,
}

impl LibraryBuilder {
    fn validate(&self) -> Result<(), String> {
        if let Some(sources) = &self.sources {
            if sources.is_empty() {
                let path = self.path.as_deref().unwrap_or("<unnamed>");
                return Err(format!("must specify sources for library `{path}`"));
            }
        }
        Ok(())
    }
}

/// Ordered collections of everything the build description declared.
/// Populated on one thread during configuration loading, then handed to
/// the scheduler read-only.
#[derive(Debug, Default)]
pub struct Registry {
    tests: Vec<Test>,
    test_names: HashSet<String>,
    binaries: Vec<String>,
    libraries: Vec<Library>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Validates and appends one test. A rejected test leaves the registry
    /// untouched.
    pub fn add_test(&mut self, test: Test) -> Result<(), TargetError> {
        if test.name.is_empty() {
            return Err(TargetError::EmptyTestName);
        }
        if test.script.is_none() && test.binary.is_none() {
            return Err(TargetError::MissingScriptOrBinary {
                name: test.name.clone(),
            });
        }
        if let Some(binary) = &test.binary {
            if !binary.ends_with(TEST_BINARY_SUFFIX) {
                return Err(TargetError::BadBinarySuffix {
                    name: test.name.clone(),
                    binary: binary.clone(),
                });
            }
        }
        if self.test_names.contains(&test.name) {
            return Err(TargetError::DuplicateTest {
                name: test.name.clone(),
            });
        }
        self.test_names.insert(test.name.clone());
        self.tests.push(test);
        Ok(())
    }

    /// Bulk form of [`Registry::add_test`]; stops at the first rejected
    /// entry.
    pub fn add_tests<I>(&mut self, entries: I) -> Result<(), TargetError>
    where
        I: IntoIterator<Item = TestEntry>,
    {
        for entry in entries {
            self.add_test(entry.into_test())?;
        }
        Ok(())
    }

    pub fn add_binary(&mut self, path: impl Into<String>) {
        self.binaries.push(path.into());
    }

    pub fn add_binaries<I, S>(&mut self, paths: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        for path in paths {
            self.binaries.push(path.into());
        }
    }

    /// Appends a built [`Library`]. Structural requirements are enforced by
    /// [`LibraryBuilder::build`], so this cannot currently reject; the
    /// fallible signature keeps all registration on one error surface.
    pub fn add_library(&mut self, library: Library) -> Result<(), TargetError> {
        self.libraries.push(library);
        Ok(())
    }

    pub fn tests(&self) -> &[Test] {
        &self.tests
    }

    pub fn binaries(&self) -> &[String] {
        &self.binaries
    }

    pub fn libraries(&self) -> &[Library] {
        &self.libraries
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn script_test(name: &str) -> Test {
        Test {
            name: name.into(),
            script: Some(format!("{name}.sh")),
            ..Test::default()
        }
    }

    #[test]
    fn duplicate_test_name_is_rejected_without_mutation() {
        let mut registry = Registry::new();
        registry.add_test(script_test("smoke")).unwrap();
        let err = registry.add_test(script_test("smoke")).unwrap_err();
        assert_eq!(
            err,
            TargetError::DuplicateTest {
                name: "smoke".into()
            }
        );
        assert_eq!(registry.tests().len(), 1);
    }

    #[test]
    fn test_needs_script_or_binary() {
        let mut registry = Registry::new();
        let err = registry
            .add_test(Test {
                name: "bare".into(),
                ..Test::default()
            })
            .unwrap_err();
        assert_eq!(
            err,
            TargetError::MissingScriptOrBinary {
                name: "bare".into()
            }
        );
        assert!(registry.tests().is_empty());
    }

    #[test]
    fn test_binary_suffix_is_enforced() {
        let mut registry = Registry::new();
        let err = registry
            .add_test(Test {
                name: "unit".into(),
                binary: Some("out/unit".into()),
                ..Test::default()
            })
            .unwrap_err();
        assert_eq!(
            err,
            TargetError::BadBinarySuffix {
                name: "unit".into(),
                binary: "out/unit".into()
            }
        );

        registry
            .add_test(Test {
                name: "unit".into(),
                binary: Some("out/unit.exe".into()),
                ..Test::default()
            })
            .unwrap();
    }

    #[test]
    fn bulk_names_expand_to_script_and_binary() {
        let mut registry = Registry::new();
        registry
            .add_tests([
                TestEntry::from("out/roundtrip.exe"),
                TestEntry::from(script_test("smoke")),
            ])
            .unwrap();
        let expanded = &registry.tests()[0];
        assert_eq!(expanded.name, "out/roundtrip.exe");
        assert_eq!(expanded.script.as_deref(), Some("out/roundtrip.exe"));
        assert_eq!(expanded.binary.as_deref(), Some("out/roundtrip.exe"));
        assert_eq!(expanded.cmdline, None);
        assert_eq!(registry.tests()[1].name, "smoke");
    }

    #[test]
    fn registration_order_is_preserved() {
        let mut registry = Registry::new();
        registry.add_binary("out/server");
        registry.add_binaries(["out/client", "out/tool"]);
        assert_eq!(registry.binaries(), ["out/server", "out/client", "out/tool"]);
    }

    #[test]
    fn library_builder_defaults_and_requirements() {
        let lib = LibraryBuilder::default()
            .path("out/libcore.a")
            .sources(vec!["src/core".to_string()])
            .build()
            .unwrap();
        assert!(lib.is_static);
        assert!(lib.recurse);
        assert!(lib.capture_deps);
        assert_eq!(lib.additional_params, None);

        // path and sources are both required
        assert!(LibraryBuilder::default()
            .sources(vec!["src/core".to_string()])
            .build()
            .is_err());
        let err = LibraryBuilder::default()
            .path("out/libcore.a")
            .sources(Vec::<String>::new())
            .build()
            .unwrap_err();
        assert!(err.to_string().contains("must specify sources"));
    }

    #[test]
    fn test_entry_rejects_other_shapes() {
        assert!(serde_json_lenient::from_str::<TestEntry>("42").is_err());
        let entry: TestEntry =
            serde_json_lenient::from_str(r#"{"name": "n", "script": "n.sh"}"#).unwrap();
        assert_eq!(entry, TestEntry::Full(script_test("n")));
    }

    #[test]
    fn library_deserializes_with_the_static_key() {
        let lib: Library = serde_json_lenient::from_str(
            r#"{
                "path": "out/libgeo.so",
                "sources": ["src/geo"],
                "static": false,
                "additional_params": ["x.o"]
            }"#,
        )
        .unwrap();
        assert!(!lib.is_static);
        assert!(lib.recurse);
        assert!(lib.capture_deps);
        assert_eq!(
            lib.additional_params,
            Some(ExtraParams::List(vec!["x.o".into()]))
        );
    }

    #[test]
    fn extra_params_two_shapes_only() {
        let list: ExtraParams = serde_json_lenient::from_str(r#"["a.o", "b.o"]"#).unwrap();
        assert_eq!(list.render(), "a.o b.o");
        let verbatim: ExtraParams = serde_json_lenient::from_str(r#""-lz""#).unwrap();
        assert_eq!(verbatim.render(), "-lz");
        assert!(serde_json_lenient::from_str::<ExtraParams>("3.5").is_err());
    }
}
