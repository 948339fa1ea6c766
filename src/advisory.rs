//! The advisory module asks a locally installed model runtime to rewrite HTML
//! by running its command-line client.

use log::debug;
use tokio::process::Command;

use crate::BoxFuture;
use crate::constants::{DEFAULT_MODEL, DEFAULT_MODEL_PROGRAM};
use crate::error::ImproveError;

/// Something that answers a prompt with improved HTML.
pub trait Advisor: Send + Sync {
    /// Sends `prompt` to the model and returns its raw answer.
    ///
    /// # Errors
    ///
    /// Returns an error if the model could not be queried.
    fn advise<'a>(&'a self, prompt: &'a str) -> BoxFuture<'a, Result<String, ImproveError>>;
}

/// Runs `<program> run <model> <prompt>` and captures its standard output.
///
/// The call waits for the process to exit. There is no timeout.
#[derive(Clone, Debug)]
pub struct ModelCli {
    program: String,
    model: String,
}

impl ModelCli {
    pub fn new(program: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            model: model.into(),
        }
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Runs the model once with `prompt` as its last argument.
    ///
    /// # Errors
    ///
    /// Returns [`ImproveError::ModelUnavailable`] if the program cannot be spawned
    /// and [`ImproveError::ModelFailed`] if it exits with a non-zero status.
    pub async fn query(&self, prompt: &str) -> Result<String, ImproveError> {
        debug!("Running {} run {}", self.program, self.model);

        let output = Command::new(&self.program)
            .arg("run")
            .arg(&self.model)
            .arg(prompt)
            .output()
            .await
            .map_err(|source| ImproveError::ModelUnavailable {
                program: self.program.clone(),
                source,
            })?;

        if !output.status.success() {
            return Err(ImproveError::ModelFailed {
                model: self.model.clone(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_owned(),
            });
        }

        Ok(String::from_utf8_lossy(&output.stdout).trim().to_owned())
    }
}

impl Default for ModelCli {
    fn default() -> Self {
        Self::new(DEFAULT_MODEL_PROGRAM, DEFAULT_MODEL)
    }
}

impl Advisor for ModelCli {
    fn advise<'a>(&'a self, prompt: &'a str) -> BoxFuture<'a, Result<String, ImproveError>> {
        Box::pin(self.query(prompt))
    }
}
