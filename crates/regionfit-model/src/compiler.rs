//! The boundary to the external modeling-language compiler.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::time::SystemTime;

use regionfit_config::CompilerConfig;
use thiserror::Error;
use tracing::{debug, warn};

/// Compiler failure: non-zero exit or diagnostics on stderr.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("Compilation of {source_path:?} failed (exit code {exit_code:?}): {diagnostics}")]
pub struct CompilationError {
    pub source_path: PathBuf,
    pub exit_code: Option<i32>,
    pub diagnostics: String,
}

impl CompilationError {
    pub fn new(source: &Path, exit_code: Option<i32>, diagnostics: impl Into<String>) -> Self {
        Self {
            source_path: source.to_path_buf(),
            exit_code,
            diagnostics: diagnostics.into(),
        }
    }
}

/// Files produced by one compilation.
#[derive(Debug, Clone, PartialEq)]
pub struct CompiledArtifacts {
    source: PathBuf,
    lp: PathBuf,
    auxiliary: Vec<PathBuf>,
}

impl CompiledArtifacts {
    pub fn new(source: impl Into<PathBuf>, lp: impl Into<PathBuf>) -> Self {
        Self {
            source: source.into(),
            lp: lp.into(),
            auxiliary: Vec::new(),
        }
    }

    /// Registers another generated file (e.g. a name table) for cleanup.
    pub fn with_auxiliary(mut self, path: impl Into<PathBuf>) -> Self {
        self.auxiliary.push(path.into());
        self
    }

    pub fn source(&self) -> &Path {
        &self.source
    }

    pub fn lp_path(&self) -> &Path {
        &self.lp
    }

    /// Every generated file.
    pub fn files(&self) -> impl Iterator<Item = &Path> {
        std::iter::once(self.lp.as_path()).chain(self.auxiliary.iter().map(PathBuf::as_path))
    }

    /// Deletes the generated files, ignoring failures.
    pub fn remove(&self) {
        for path in self.files() {
            if fs::remove_file(path).is_ok() {
                debug!(event = "artifact_removed", path = %path.display());
            }
        }
    }
}

/// Turns modeling-language source into an LP artifact.
pub trait ModelCompiler: Send + Sync {
    fn compile(&self, source: &Path) -> Result<CompiledArtifacts, CompilationError>;
}

/// Runs the ZIMPL binary as `<binary> -v0 -l99 -tlp <file>` in the source's
/// directory.
///
/// An LP file at least as new as the source is reused without recompiling.
#[derive(Debug, Clone)]
pub struct ZimplCompiler {
    binary: PathBuf,
}

impl Default for ZimplCompiler {
    fn default() -> Self {
        Self::from_config(&CompilerConfig::default())
    }
}

impl ZimplCompiler {
    pub fn new(binary: impl Into<PathBuf>) -> Self {
        Self {
            binary: binary.into(),
        }
    }

    pub fn from_config(config: &CompilerConfig) -> Self {
        Self::new(config.binary.clone())
    }

    pub fn binary(&self) -> &Path {
        &self.binary
    }

    fn artifacts_for(source: &Path) -> CompiledArtifacts {
        CompiledArtifacts::new(source, source.with_extension("lp"))
            .with_auxiliary(source.with_extension("tbl"))
    }
}

fn mtime(path: &Path) -> Option<SystemTime> {
    fs::metadata(path).and_then(|m| m.modified()).ok()
}

impl ModelCompiler for ZimplCompiler {
    fn compile(&self, source: &Path) -> Result<CompiledArtifacts, CompilationError> {
        let Some(source_time) = mtime(source) else {
            return Err(CompilationError::new(source, None, "source file not found"));
        };
        let artifacts = Self::artifacts_for(source);
        if mtime(artifacts.lp_path()).is_some_and(|lp_time| lp_time >= source_time) {
            debug!(event = "compile_cached", source = %source.display());
            return Ok(artifacts);
        }

        let dir = source
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));
        let file_name = source.file_name().ok_or_else(|| {
            CompilationError::new(source, None, "source path has no file name")
        })?;

        let output = Command::new(&self.binary)
            .args(["-v0", "-l99", "-tlp"])
            .arg(file_name)
            .current_dir(dir)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .output()
            .map_err(|err| {
                CompilationError::new(
                    source,
                    None,
                    format!("failed to run {}: {err}", self.binary.display()),
                )
            })?;

        let diagnostics = String::from_utf8_lossy(&output.stderr).into_owned();
        if !output.status.success() || !diagnostics.trim().is_empty() {
            warn!(
                event = "compile_failed",
                source = %source.display(),
                exit_code = output.status.code(),
            );
            artifacts.remove();
            return Err(CompilationError::new(source, output.status.code(), diagnostics));
        }
        if mtime(artifacts.lp_path()).is_none() {
            return Err(CompilationError::new(
                source,
                output.status.code(),
                "compiler produced no LP artifact",
            ));
        }
        debug!(event = "compiled", source = %source.display());
        Ok(artifacts)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_source() {
        let err = ZimplCompiler::new("zimpl")
            .compile(Path::new("/nonexistent/model.zpl"))
            .unwrap_err();
        assert_eq!(err.exit_code, None);
        assert!(err.to_string().contains("model.zpl"));
    }

    #[test]
    fn test_missing_binary() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("m.zpl");
        fs::write(&source, "var x;\n").unwrap();
        let err = ZimplCompiler::new(dir.path().join("no-such-compiler"))
            .compile(&source)
            .unwrap_err();
        assert!(err.diagnostics.contains("failed to run"));
    }

    #[test]
    fn test_artifact_paths() {
        let artifacts = ZimplCompiler::artifacts_for(Path::new("/tmp/a/model.zpl"));
        let files: Vec<&Path> = artifacts.files().collect();
        assert_eq!(
            files,
            vec![Path::new("/tmp/a/model.lp"), Path::new("/tmp/a/model.tbl")]
        );
    }
}
