//! Building, starting and stopping the application under test.

use std::path::{Path, PathBuf};
use std::process::Stdio;

use gantry_common::{ExeNameGenerator, FixtureError, FixtureResult};
use serde::{Deserialize, Serialize};
use tokio::process::{Child, ChildStderr, ChildStdout, Command};
use tracing::{debug, info, warn};

/// The build invocation for the application under test.
///
/// If `args` contains an explicit `-o <path>` pair, that path (resolved
/// against the application root) is where the executable lands.
/// Otherwise the launcher synthesizes a collision-free output path inside
/// the application root and appends `-o <path>` to the invocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildCommand {
    pub program: String,
    pub args: Vec<String>,
}

impl BuildCommand {
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
        }
    }

    /// The output path named by an explicit `-o <path>` pair, if any.
    fn explicit_output(&self) -> Option<&str> {
        let mut args = self.args.iter();
        while let Some(arg) = args.next() {
            if arg == "-o" {
                return args.next().map(String::as_str);
            }
        }
        None
    }
}

impl Default for BuildCommand {
    /// A plain single-file build with a synthesized output path.
    fn default() -> Self {
        Self {
            program: "rustc".to_string(),
            args: vec!["main.rs".to_string()],
        }
    }
}

/// Builds, starts and kills the application under test.
///
/// One launcher owns at most one child process and one built executable.
/// It plumbs the child's output streams to the caller without ever
/// interpreting their content.
#[derive(Debug)]
pub struct ProcessLauncher {
    app_root: PathBuf,
    build: BuildCommand,
    run_args: Vec<String>,
    names: ExeNameGenerator,
    exe_path: Option<PathBuf>,
    child: Option<Child>,
}

impl ProcessLauncher {
    pub fn new(app_root: impl Into<PathBuf>, build: BuildCommand, run_args: Vec<String>) -> Self {
        Self {
            app_root: app_root.into(),
            build,
            run_args,
            names: ExeNameGenerator::new(),
            exe_path: None,
            child: None,
        }
    }

    /// Replace the executable name generator, for deterministic tests.
    pub fn with_name_generator(mut self, names: ExeNameGenerator) -> Self {
        self.names = names;
        self
    }

    /// Path of the built executable, once `build` has succeeded and until
    /// it has been deleted.
    pub fn exe_path(&self) -> Option<&Path> {
        self.exe_path.as_deref()
    }

    /// Whether a started process has not yet been killed.
    pub fn has_process(&self) -> bool {
        self.child.is_some()
    }

    /// Run the build invocation rooted at the application directory.
    ///
    /// On success the executable exists at the resolved output path.
    pub async fn build(&mut self) -> FixtureResult<&Path> {
        let (exe_path, args) = self.resolve_output();

        info!(
            program = %self.build.program,
            output = %exe_path.display(),
            "building application under test"
        );

        let output = Command::new(&self.build.program)
            .args(&args)
            .current_dir(&self.app_root)
            .output()
            .await
            .map_err(|e| FixtureError::build(e.to_string()))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(FixtureError::build(format!(
                "build command exited with {}: {}",
                output.status,
                stderr.trim()
            )));
        }

        Ok(self.exe_path.insert(exe_path).as_path())
    }

    /// Start the built executable with the configured run arguments.
    ///
    /// The output pipes are configured before the process is spawned, so
    /// no line emitted early can be lost. Returns the two independent
    /// line streams; the child handle stays with the launcher.
    pub async fn start(&mut self) -> FixtureResult<(ChildStdout, ChildStderr)> {
        let exe_path = self
            .exe_path
            .clone()
            .ok_or_else(|| FixtureError::launch("no executable has been built"))?;

        let mut child = Command::new(&exe_path)
            .args(&self.run_args)
            .current_dir(&self.app_root)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| FixtureError::launch(e.to_string()))?;

        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| FixtureError::launch("could not get stdout pipe"))?;
        let stderr = child
            .stderr
            .take()
            .ok_or_else(|| FixtureError::launch("could not get stderr pipe"))?;

        info!(pid = child.id(), exe = %exe_path.display(), "application started");
        self.child = Some(child);

        Ok((stdout, stderr))
    }

    /// Forcibly terminate the running process.
    ///
    /// Having no process to kill (never started, or already killed) is an
    /// error; the caller decides whether that is fatal.
    pub async fn kill(&mut self) -> FixtureResult<()> {
        let child = self
            .child
            .as_mut()
            .ok_or_else(|| FixtureError::kill("no process is running"))?;

        child
            .kill()
            .await
            .map_err(|e| FixtureError::kill(e.to_string()))?;

        info!("application process killed");
        self.child = None;
        Ok(())
    }

    /// Kill and reap the process if one is still held, discarding errors.
    pub async fn kill_best_effort(&mut self) {
        if let Some(mut child) = self.child.take() {
            if let Err(e) = child.kill().await {
                warn!(error = %e, "best-effort kill failed");
            }
        }
    }

    /// Delete the built executable. Errors if the deletion fails; a
    /// launcher that never built anything is a no-op.
    pub fn remove_executable(&mut self) -> FixtureResult<()> {
        let Some(path) = self.exe_path.clone() else {
            return Ok(());
        };

        std::fs::remove_file(&path)
            .map_err(|e| FixtureError::cleanup(path.clone(), e.to_string()))?;

        debug!(path = %path.display(), "built executable deleted");
        self.exe_path = None;
        Ok(())
    }

    /// Delete the built executable if it still exists, discarding errors.
    pub fn remove_executable_best_effort(&mut self) {
        let Some(path) = self.exe_path.clone() else {
            return;
        };

        if path.exists() {
            if let Err(e) = std::fs::remove_file(&path) {
                warn!(path = %path.display(), error = %e, "best-effort executable cleanup failed");
                return;
            }
        }
        self.exe_path = None;
    }

    /// Resolve the executable output path and the final build argument
    /// list: the caller's explicit `-o` wins, otherwise a synthesized
    /// `-o` pair is appended.
    fn resolve_output(&mut self) -> (PathBuf, Vec<String>) {
        if let Some(explicit) = self.build.explicit_output() {
            let path = self.app_root.join(explicit);
            return (path, self.build.args.clone());
        }

        let base = self
            .app_root
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "app".to_string());
        let path = self.app_root.join(self.names.next_name(&base));

        let mut args = self.build.args.clone();
        args.push("-o".to_string());
        args.push(path.to_string_lossy().into_owned());
        (path, args)
    }
}
