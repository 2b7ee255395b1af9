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

//! Records the link contributions (object files, extra link parameters) of
//! capture-enabled libraries so dependent libraries and binaries can fold
//! them into their own link commands without recompiling anything.
//!
//! The tracker does not sequence builds. A library becomes queryable only
//! after the scheduler reports its build step succeeded; until then its
//! path sits in the pending set and [`CaptureTracker::contributions`]
//! returns `None`.

use indexmap::IndexMap;
use log::debug;
use std::collections::HashSet;
use std::sync::Mutex;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum CaptureError {
    #[error("library `{path}` is not awaiting capture")]
    NotPending { path: String },
    #[error("library `{path}` has already been captured")]
    AlreadyCaptured { path: String },
}

#[derive(Debug, Default)]
struct CaptureState {
    /// Library path -> ordered link contributions, completed builds only.
    captured: IndexMap<String, Vec<String>>,
    /// Libraries whose own build step has not finished yet.
    pending: HashSet<String>,
}

/// Shared between scheduler workers; one lock covers both the map and the
/// pending set so an eligibility check and the matching insertion are a
/// single atomic step.
#[derive(Debug, Default)]
pub struct CaptureTracker {
    state: Mutex<CaptureState>,
}

impl CaptureTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Marks a capture-enabled library as pending, before its build step
    /// starts.
    pub fn begin(&self, path: impl Into<String>) -> Result<(), CaptureError> {
        let path = path.into();
        let mut state = self.state.lock().unwrap();
        if state.captured.contains_key(&path) {
            return Err(CaptureError::AlreadyCaptured { path });
        }
        state.pending.insert(path);
        Ok(())
    }

    /// Records a pending library's contributions once its build step has
    /// reported success. Completing a library that was never begun, or
    /// twice, is a scheduling defect.
    pub fn complete(
        &self,
        path: &str,
        contributions: Vec<String>,
    ) -> Result<(), CaptureError> {
        let mut state = self.state.lock().unwrap();
        if state.captured.contains_key(path) {
            return Err(CaptureError::AlreadyCaptured { path: path.into() });
        }
        if !state.pending.remove(path) {
            return Err(CaptureError::NotPending { path: path.into() });
        }
        debug!("captured {} contribution(s) of `{path}`", contributions.len());
        state.captured.insert(path.into(), contributions);
        Ok(())
    }

    /// The ordered contributions of a completed library; `None` while the
    /// library is still pending or was never declared for capture.
    pub fn contributions(&self, path: &str) -> Option<Vec<String>> {
        self.state.lock().unwrap().captured.get(path).cloned()
    }

    pub fn is_pending(&self, path: &str) -> bool {
        self.state.lock().unwrap().pending.contains(path)
    }

    /// Folds the captured contributions of each dependency, in dependency
    /// order, into one list ready to append to a consumer's link command.
    /// Dependencies without a completed capture contribute nothing.
    pub fn fold<S: AsRef<str>>(&self, deps: &[S]) -> Vec<String> {
        let state = self.state.lock().unwrap();
        let mut folded = Vec::new();
        for dep in deps {
            if let Some(contributions) = state.captured.get(dep.as_ref()) {
                folded.extend(contributions.iter().cloned());
            }
        }
        folded
    }
}
