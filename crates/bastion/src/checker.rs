//! Boundary to the external model checker.
//!
//! The checker is a separate program that analyzes a generated
//! specification and writes an XML result document. [`ProcessChecker`]
//! runs it once per call inside a fresh temporary directory, so concurrent
//! analyses never share a result file.

use std::{
    env, fs, io,
    path::{Path, PathBuf},
    process::{Command, Stdio},
};

use log::{debug, info};

use crate::{config::CheckerConfig, error::BastionError};

/// Placeholder expanded to the absolute path of the specification.
pub const SPEC_PLACEHOLDER: &str = "{spec}";

/// Placeholder expanded to the absolute path of the result document.
pub const OUTPUT_PLACEHOLDER: &str = "{output}";

/// Runs a specification through a model checker.
pub trait Checker {
    /// Check the specification at `spec` and return the raw result
    /// document.
    ///
    /// # Errors
    ///
    /// Returns [`BastionError::Checker`] when the checker fails or produces
    /// no result.
    fn check(&self, spec: &Path) -> Result<String, BastionError>;
}

/// A [`Checker`] that runs an external program.
///
/// The program runs with a new temporary directory as its working
/// directory; the result is read from [`CheckerConfig::output`] inside it.
/// Relative paths in the configuration still refer to the caller's working
/// directory: a relative `program` with a directory part, and every `args`
/// entry (or classpath-style list entry) naming an existing file or
/// directory, are made absolute before the switch.
///
/// # Example
///
/// ```no_run
/// # use std::path::Path;
/// # use bastion::{BastionError, checker::{Checker, ProcessChecker}, config::CheckerConfig};
/// # fn main() -> Result<(), BastionError> {
/// let config = CheckerConfig::new(
///     "java",
///     vec!["-cp".into(), "/opt/alloy/alloy.jar:/opt/alloy".into(), "AlloyWrapper".into(), "{spec}".into()],
///     "output.xml",
/// );
/// let xml = ProcessChecker::new(config).check(Path::new("spec.als"))?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, Default)]
pub struct ProcessChecker {
    config: CheckerConfig,
}

impl ProcessChecker {
    pub fn new(config: CheckerConfig) -> Self {
        Self { config }
    }

    fn command(&self, spec: &Path, output: &Path, workdir: &Path, base: &Path) -> Command {
        let mut command = Command::new(resolve_program(self.config.program(), base));
        for arg in self.config.args() {
            command.arg(expand(&resolve_arg(arg, base), spec, output));
        }
        command
            .current_dir(workdir)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        command
    }
}

impl Checker for ProcessChecker {
    fn check(&self, spec: &Path) -> Result<String, BastionError> {
        let spec = std::path::absolute(spec)?;
        let base = env::current_dir()?;
        let workdir = tempfile::tempdir()?;
        let output_path: PathBuf = workdir.path().join(self.config.output());

        info!(program = self.config.program(), spec:? = spec; "Running checker");
        let output = self
            .command(&spec, &output_path, workdir.path(), &base)
            .output()
            .map_err(|err| {
                BastionError::Checker(format!(
                    "failed to start `{}`: {err}",
                    self.config.program()
                ))
            })?;

        let stdout = String::from_utf8_lossy(&output.stdout);
        debug!(stdout = stdout.as_ref(); "Checker finished");

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(BastionError::Checker(format!(
                "execution failed ({}): {}",
                output.status,
                stderr.trim_end()
            )));
        }

        match fs::read_to_string(&output_path) {
            Ok(result) => Ok(result),
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                Err(BastionError::Checker(format!(
                    "no result document generated. Stdout: {}",
                    stdout.trim_end()
                )))
            }
            Err(err) => Err(err.into()),
        }
    }
}

/// A relative program path with a directory part, made absolute. Bare
/// names are left for the `PATH` lookup.
fn resolve_program(program: &str, base: &Path) -> PathBuf {
    let path = Path::new(program);
    if path.is_relative() && path.components().count() > 1 {
        base.join(path)
    } else {
        path.to_path_buf()
    }
}

/// Make the entries of `arg` that name something under `base` absolute.
///
/// Flags and placeholder arguments are left alone. Lists joined with the
/// platform path separator are resolved entry by entry.
fn resolve_arg(arg: &str, base: &Path) -> String {
    if arg.starts_with('-') || arg.contains(SPEC_PLACEHOLDER) || arg.contains(OUTPUT_PLACEHOLDER) {
        return arg.to_string();
    }

    let entries: Vec<PathBuf> = env::split_paths(arg).collect();
    if !entries.iter().any(|entry| is_local(entry, base)) {
        return arg.to_string();
    }

    let resolved = entries.into_iter().map(|entry| {
        if !is_local(&entry, base) {
            entry
        } else if entry == Path::new(".") {
            base.to_path_buf()
        } else {
            base.join(entry)
        }
    });
    match env::join_paths(resolved) {
        Ok(joined) => joined.to_string_lossy().into_owned(),
        Err(_) => arg.to_string(),
    }
}

fn is_local(entry: &Path, base: &Path) -> bool {
    !entry.as_os_str().is_empty() && entry.is_relative() && base.join(entry).exists()
}

fn expand(arg: &str, spec: &Path, output: &Path) -> String {
    arg.replace(SPEC_PLACEHOLDER, &spec.to_string_lossy())
        .replace(OUTPUT_PLACEHOLDER, &output.to_string_lossy())
}
