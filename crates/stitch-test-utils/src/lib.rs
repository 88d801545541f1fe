//! Testing utilities for the Stitch workspace
//!
//! Shared fixtures and a scripted generation collaborator for
//! integration tests.

#![allow(missing_docs)]

use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::Arc;
use stitch_core::{EngineError, Generator, ProgressSink};
use stitch_model::{FileCollection, FileRecord, Patch};

/// Build a file collection from `(path, content)` pairs.
pub fn collection(entries: &[(&str, &str)]) -> FileCollection {
    entries
        .iter()
        .map(|(p, c)| FileRecord::new(*p, *c))
        .collect()
}

/// A generator that replays a pre-loaded script of replies.
///
/// Each call pops the next queued reply for that method; an empty queue is a
/// test authoring error and panics. Every call streams a little text into
/// the progress sink so sink wiring gets exercised too.
#[derive(Default)]
pub struct ScriptedGenerator {
    projects: Mutex<VecDeque<Result<FileCollection, EngineError>>>,
    patches: Mutex<VecDeque<Result<Patch, EngineError>>>,
}

impl ScriptedGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_project(&self, reply: Result<FileCollection, EngineError>) {
        self.projects.lock().push_back(reply);
    }

    pub fn push_patch(&self, reply: Result<Patch, EngineError>) {
        self.patches.lock().push_back(reply);
    }
}

#[async_trait]
impl Generator for ScriptedGenerator {
    async fn generate_project(
        &self,
        _requirements: &str,
        _base_files: Option<FileCollection>,
        progress: Arc<dyn ProgressSink>,
    ) -> Result<FileCollection, EngineError> {
        progress.update("generating project...");
        self.projects
            .lock()
            .pop_front()
            .expect("scripted generator: no project reply queued")
    }

    async fn request_patch(
        &self,
        _change_request: &str,
        _current_files: FileCollection,
        progress: Arc<dyn ProgressSink>,
    ) -> Result<Patch, EngineError> {
        progress.update("drafting patch...");
        self.patches
            .lock()
            .pop_front()
            .expect("scripted generator: no patch reply queued")
    }
}

/// A progress sink that records every update it receives.
#[derive(Default)]
pub struct RecordingProgress {
    updates: Mutex<Vec<String>>,
}

impl RecordingProgress {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn updates(&self) -> Vec<String> {
        self.updates.lock().clone()
    }
}

impl ProgressSink for RecordingProgress {
    fn update(&self, cumulative_text: &str) {
        self.updates.lock().push(cumulative_text.to_string());
    }
}
