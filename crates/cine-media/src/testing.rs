//! In-memory engine for tests.
//!
//! `RecordingEngine` keeps files in a map and records every command. A
//! segment command's output is the content of its first input, and a concat
//! command's output is its listed segments joined in order, so tests can
//! check ordering from the exported bytes alone.

use std::collections::BTreeMap;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::command::parse_concat_list;
use crate::engine::{EngineCommand, MediaEngine};
use crate::error::{MediaError, MediaResult};

type FailPredicate = Box<dyn Fn(&[String]) -> bool + Send + Sync>;

pub struct RecordingEngine {
    files: Mutex<BTreeMap<String, Vec<u8>>>,
    commands: Mutex<Vec<EngineCommand>>,
    fail_when: Option<FailPredicate>,
    failing_deletes: bool,
    progress: Vec<f64>,
    session: tokio::sync::Mutex<()>,
}

impl Default for RecordingEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl RecordingEngine {
    pub fn new() -> Self {
        Self {
            files: Mutex::new(BTreeMap::new()),
            commands: Mutex::new(Vec::new()),
            fail_when: None,
            failing_deletes: false,
            progress: vec![1.0],
            session: tokio::sync::Mutex::new(()),
        }
    }

    /// Fail any command whose arguments match `predicate`.
    pub fn fail_when<F>(mut self, predicate: F) -> Self
    where
        F: Fn(&[String]) -> bool + Send + Sync + 'static,
    {
        self.fail_when = Some(Box::new(predicate));
        self
    }

    /// Make every delete fail with an IO error.
    pub fn failing_deletes(mut self) -> Self {
        self.failing_deletes = true;
        self
    }

    /// Fractions reported by each command, in order.
    pub fn with_progress(mut self, fractions: Vec<f64>) -> Self {
        self.progress = fractions;
        self
    }

    pub fn commands(&self) -> Vec<EngineCommand> {
        self.commands.lock().unwrap().clone()
    }

    /// Names of files currently held.
    pub fn files(&self) -> Vec<String> {
        self.files.lock().unwrap().keys().cloned().collect()
    }

    fn input_after(args: &[String], position: usize) -> Option<&str> {
        args.iter()
            .enumerate()
            .filter(|(_, a)| a.as_str() == "-i")
            .nth(position)
            .and_then(|(i, _)| args.get(i + 1))
            .map(String::as_str)
    }

    fn run(&self, args: &[String]) -> MediaResult<()> {
        let output = args
            .last()
            .cloned()
            .ok_or_else(|| MediaError::internal("command without output"))?;
        let first_input = Self::input_after(args, 0)
            .ok_or_else(|| MediaError::internal("command without input"))?
            .to_string();

        let mut files = self.files.lock().unwrap();
        let source = files
            .get(&first_input)
            .cloned()
            .ok_or_else(|| MediaError::ffmpeg_failed(format!("{first_input}: No such file"), None, Some(1)))?;

        let produced = if args.iter().any(|a| a == "concat") {
            let list = String::from_utf8_lossy(&source).to_string();
            let mut joined = Vec::new();
            for name in parse_concat_list(&list) {
                let segment = files.get(&name).ok_or_else(|| {
                    MediaError::ffmpeg_failed(format!("{name}: No such file"), None, Some(1))
                })?;
                joined.extend_from_slice(segment);
            }
            joined
        } else {
            source
        };

        files.insert(output, produced);
        Ok(())
    }
}

#[async_trait]
impl MediaEngine for RecordingEngine {
    fn session(&self) -> &tokio::sync::Mutex<()> {
        &self.session
    }

    async fn write_file(&self, name: &str, bytes: &[u8]) -> MediaResult<()> {
        self.files
            .lock()
            .unwrap()
            .insert(name.to_string(), bytes.to_vec());
        Ok(())
    }

    async fn read_file(&self, name: &str) -> MediaResult<Vec<u8>> {
        self.files
            .lock()
            .unwrap()
            .get(name)
            .cloned()
            .ok_or_else(|| MediaError::FileNotFound(name.to_string()))
    }

    async fn delete_file(&self, name: &str) -> MediaResult<()> {
        if self.failing_deletes {
            return Err(MediaError::Io(std::io::Error::other("delete refused")));
        }
        self.files
            .lock()
            .unwrap()
            .remove(name)
            .map(|_| ())
            .ok_or_else(|| MediaError::FileNotFound(name.to_string()))
    }

    async fn exec(
        &self,
        command: &EngineCommand,
        progress: &(dyn Fn(f64) + Send + Sync),
    ) -> MediaResult<()> {
        self.commands.lock().unwrap().push(command.clone());

        if self.fail_when.as_ref().is_some_and(|f| f(&command.args)) {
            return Err(MediaError::ffmpeg_failed(
                "FFmpeg exited with non-zero status",
                Some("scripted failure".to_string()),
                Some(1),
            ));
        }

        for fraction in &self.progress {
            progress(*fraction);
        }
        self.run(&command.args)
    }
}
