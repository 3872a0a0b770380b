use std::path::{Path, PathBuf};
use std::process::Command;

use anyhow::Context;

use super::{TransformAgent, TransformedUrl};
use crate::core::TransformAgentConfig;

/// Runs an external program once per url: `program [args..] <url>`.
/// The first non-empty line it prints is the transformed url.
pub struct CommandTransformAgent {
    name: String,
    program: PathBuf,
    args: Vec<String>,
}

impl CommandTransformAgent {
    pub fn new(program: PathBuf, args: Vec<String>) -> Self {
        let name = program
            .file_name()
            .map(|name| name.to_string_lossy().to_string())
            .unwrap_or_else(|| program.display().to_string());
        Self { name, program, args }
    }

    /// Resolve the configured program once at startup; `None` when it cannot be found
    pub fn detect(config: &TransformAgentConfig) -> Option<Self> {
        match find_program(&config.program) {
            Some(program) => {
                log::info!("Transform agent available: {}", program.display());
                Some(Self::new(program, config.args.clone()))
            }
            None => {
                log::warn!(
                    "Transform agent {} not found, urls will be used as given",
                    config.program.display()
                );
                None
            }
        }
    }

    fn transform_one(&self, url: &str) -> anyhow::Result<String> {
        let output = Command::new(&self.program)
            .args(&self.args)
            .arg(url)
            .output()
            .with_context(|| format!("failed to run {}", self.program.display()))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            anyhow::bail!("{} exited with {} for {}: {}", self.name, output.status, url, stderr.trim());
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        stdout
            .lines()
            .map(str::trim)
            .find(|line| !line.is_empty())
            .map(str::to_string)
            .with_context(|| format!("{} printed no url for {}", self.name, url))
    }
}

impl TransformAgent for CommandTransformAgent {
    fn name(&self) -> &str {
        &self.name
    }

    fn transform(&self, urls: &[String]) -> anyhow::Result<Vec<TransformedUrl>> {
        urls.iter()
            .map(|url| {
                let transformed = self.transform_one(url)?;
                log::debug!("Transformed {} -> {}", url, transformed);
                Ok(TransformedUrl {
                    original: url.clone(),
                    transformed,
                })
            })
            .collect()
    }
}

/// An explicit path must exist; a bare name is looked up on `PATH`
fn find_program(program: &Path) -> Option<PathBuf> {
    if program.components().count() > 1 || program.is_absolute() {
        return program.is_file().then(|| program.to_path_buf());
    }

    let paths = std::env::var_os("PATH")?;
    find_in_dirs(program, std::env::split_paths(&paths))
}

/// The platform executable extension is only tried on names without one
fn find_in_dirs(program: &Path, dirs: impl IntoIterator<Item = PathBuf>) -> Option<PathBuf> {
    let exe_extension = std::env::consts::EXE_EXTENSION;
    let try_extension = !exe_extension.is_empty() && program.extension().is_none();

    dirs.into_iter()
        .flat_map(|dir| {
            let candidate = dir.join(program);
            let with_exe = try_extension.then(|| candidate.with_extension(exe_extension));
            std::iter::once(candidate).chain(with_exe)
        })
        .find(|candidate| candidate.is_file())
}
