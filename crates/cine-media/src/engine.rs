//! Media engine seam and the FFmpeg-backed implementation.
//!
//! An engine owns a private virtual filesystem (file names only, no paths)
//! and executes argument-vector commands against it.

use std::future::Future;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::{Arc, OnceLock};

use async_trait::async_trait;
use tempfile::TempDir;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::Command;
use tokio::sync::{Mutex, OnceCell};
use tracing::{debug, info, warn};

use crate::command::check_ffmpeg;
use crate::error::{MediaError, MediaResult};
use crate::progress::{is_progress_line, parse_progress_line, FfmpegProgress};

/// One command for the engine.
#[derive(Debug, Clone, PartialEq)]
pub struct EngineCommand {
    pub args: Vec<String>,
    /// Media duration the command produces, used to turn output time into a fraction.
    pub expected_duration_secs: Option<f64>,
}

impl EngineCommand {
    pub fn new(args: Vec<String>, expected_duration_secs: Option<f64>) -> Self {
        Self {
            args,
            expected_duration_secs,
        }
    }
}

/// A loaded multimedia engine.
///
/// Not designed for concurrent multiplexed use. A caller running a
/// multi-command job holds [`MediaEngine::session`] for its whole duration.
#[async_trait]
pub trait MediaEngine: Send + Sync {
    /// Exclusive-use lock for this engine's filesystem.
    fn session(&self) -> &Mutex<()>;

    async fn write_file(&self, name: &str, bytes: &[u8]) -> MediaResult<()>;

    async fn read_file(&self, name: &str) -> MediaResult<Vec<u8>>;

    async fn delete_file(&self, name: &str) -> MediaResult<()>;

    /// Run a command, reporting fractional progress (`0.0..=1.0`) as it advances.
    async fn exec(
        &self,
        command: &EngineCommand,
        progress: &(dyn Fn(f64) + Send + Sync),
    ) -> MediaResult<()>;
}

/// Engine configuration.
#[derive(Debug, Clone, Default)]
pub struct EngineConfig {
    /// Explicit FFmpeg executable; resolved from `PATH` when unset.
    pub ffmpeg_path: Option<PathBuf>,
    /// Parent directory for the scratch filesystem; system temp dir when unset.
    pub scratch_dir: Option<PathBuf>,
}

impl EngineConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        Self {
            ffmpeg_path: std::env::var("CINE_FFMPEG_PATH").ok().map(PathBuf::from),
            scratch_dir: std::env::var("CINE_SCRATCH_DIR").ok().map(PathBuf::from),
        }
    }
}

/// Engine running the FFmpeg executable inside a private scratch directory.
pub struct FfmpegEngine {
    binary: PathBuf,
    scratch: TempDir,
    session: Mutex<()>,
}

impl FfmpegEngine {
    /// Locate and verify FFmpeg, then create the scratch directory.
    pub async fn load(config: &EngineConfig) -> MediaResult<Self> {
        let binary = match &config.ffmpeg_path {
            Some(path) => path.clone(),
            None => check_ffmpeg()?,
        };

        let output = Command::new(&binary)
            .arg("-version")
            .stdin(Stdio::null())
            .output()
            .await
            .map_err(|e| {
                MediaError::engine_load(format!("failed to run {}: {}", binary.display(), e))
            })?;
        if !output.status.success() {
            return Err(MediaError::engine_load(format!(
                "{} -version exited with {}",
                binary.display(),
                output.status
            )));
        }

        let version = String::from_utf8_lossy(&output.stdout)
            .lines()
            .next()
            .unwrap_or_default()
            .to_string();

        let mut builder = tempfile::Builder::new();
        builder.prefix("cine-engine-");
        let scratch = match &config.scratch_dir {
            Some(dir) => builder.tempdir_in(dir),
            None => builder.tempdir(),
        }
        .map_err(|e| MediaError::engine_load(format!("failed to create scratch dir: {}", e)))?;

        info!(
            binary = %binary.display(),
            scratch = %scratch.path().display(),
            "Media engine loaded: {}",
            version
        );

        Ok(Self {
            binary,
            scratch,
            session: Mutex::new(()),
        })
    }

    /// Scratch directory backing the virtual filesystem.
    pub fn scratch_dir(&self) -> &Path {
        self.scratch.path()
    }

    fn resolve(&self, name: &str) -> MediaResult<PathBuf> {
        let valid = !name.is_empty()
            && name != "."
            && name != ".."
            && !name.contains(['/', '\\']);
        if !valid {
            return Err(MediaError::internal(format!("invalid engine file name: {name:?}")));
        }
        Ok(self.scratch.path().join(name))
    }
}

fn not_found_as(name: &str, e: std::io::Error) -> MediaError {
    if e.kind() == std::io::ErrorKind::NotFound {
        MediaError::FileNotFound(name.to_string())
    } else {
        MediaError::Io(e)
    }
}

#[async_trait]
impl MediaEngine for FfmpegEngine {
    fn session(&self) -> &Mutex<()> {
        &self.session
    }

    async fn write_file(&self, name: &str, bytes: &[u8]) -> MediaResult<()> {
        let path = self.resolve(name)?;
        tokio::fs::write(&path, bytes).await?;
        Ok(())
    }

    async fn read_file(&self, name: &str) -> MediaResult<Vec<u8>> {
        let path = self.resolve(name)?;
        tokio::fs::read(&path).await.map_err(|e| not_found_as(name, e))
    }

    async fn delete_file(&self, name: &str) -> MediaResult<()> {
        let path = self.resolve(name)?;
        tokio::fs::remove_file(&path)
            .await
            .map_err(|e| not_found_as(name, e))
    }

    async fn exec(
        &self,
        command: &EngineCommand,
        progress: &(dyn Fn(f64) + Send + Sync),
    ) -> MediaResult<()> {
        let mut args = vec![
            "-y".to_string(),
            "-v".to_string(),
            "error".to_string(),
            "-progress".to_string(),
            "pipe:2".to_string(),
        ];
        args.extend(command.args.iter().cloned());
        debug!("Running FFmpeg: ffmpeg {}", args.join(" "));

        let mut child = Command::new(&self.binary)
            .args(&args)
            .current_dir(self.scratch.path())
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()?;

        let stderr = child
            .stderr
            .take()
            .ok_or_else(|| MediaError::internal("FFmpeg stderr not captured"))?;
        // FFmpeg echoes metadata and file names verbatim, so stderr is not
        // guaranteed to be UTF-8.
        let mut segments = BufReader::new(stderr).split(b'\n');

        let mut current = FfmpegProgress::default();
        let mut messages = Vec::new();
        while let Ok(Some(segment)) = segments.next_segment().await {
            let line = String::from_utf8_lossy(&segment);
            let line = line.trim_end();
            if is_progress_line(line) {
                if let Some(snapshot) = parse_progress_line(line, &mut current) {
                    progress(snapshot.fraction(command.expected_duration_secs));
                }
            } else if !line.is_empty() {
                messages.push(line.to_string());
            }
        }

        let status = child.wait().await?;
        if status.success() {
            Ok(())
        } else {
            let stderr = messages.join("\n");
            warn!(exit_code = ?status.code(), "FFmpeg failed: {}", stderr);
            Err(MediaError::ffmpeg_failed(
                "FFmpeg exited with non-zero status",
                Some(stderr),
                status.code(),
            ))
        }
    }
}

/// Load-once cache for an engine.
///
/// Concurrent callers share the in-flight load. A failed load leaves the cache
/// empty so the next caller starts a fresh attempt.
pub struct EngineCache<E> {
    cell: OnceCell<Arc<E>>,
}

impl<E> Default for EngineCache<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E> EngineCache<E> {
    pub fn new() -> Self {
        Self {
            cell: OnceCell::new(),
        }
    }

    /// Return the cached engine, running `load` if none is cached yet.
    pub async fn get_or_load<F, Fut>(&self, load: F) -> MediaResult<Arc<E>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = MediaResult<E>>,
    {
        self.cell
            .get_or_try_init(|| async { load().await.map(Arc::new) })
            .await
            .cloned()
    }

    /// The cached engine, if loaded.
    pub fn get(&self) -> Option<Arc<E>> {
        self.cell.get().cloned()
    }
}

/// Process-wide FFmpeg engine, loaded on first use.
pub async fn shared_ffmpeg_engine(config: &EngineConfig) -> MediaResult<Arc<FfmpegEngine>> {
    static SHARED: OnceLock<EngineCache<FfmpegEngine>> = OnceLock::new();
    SHARED
        .get_or_init(EngineCache::new)
        .get_or_load(|| FfmpegEngine::load(config))
        .await
}
