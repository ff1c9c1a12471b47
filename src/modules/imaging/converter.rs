use async_trait::async_trait;
use std::ffi::OsString;
use std::path::Path;
use std::process::Stdio;
use std::time::Duration;
use thiserror::Error;
use tokio::process::Command;
use tracing::debug;

use crate::modules::imaging::tool_locator::ImageTool;

/// Failure of a single image tool invocation
#[derive(Debug, Error)]
pub enum ConversionError {
    #[error("failed to launch {command}: {source}")]
    Launch {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{command} exited with {status}: {stderr}")]
    Failed {
        command: String,
        status: String,
        stderr: String,
    },

    #[error("{command} timed out after {secs}s")]
    TimedOut { command: String, secs: u64 },
}

/// Operations the derivative pipeline needs from an image tool
#[async_trait]
pub trait ImageConverter: Send + Sync {
    /// Name reported in logs
    fn name(&self) -> &str;

    /// Shrink `src` to fit inside `max_dimension` x `max_dimension`, keeping
    /// aspect ratio and never enlarging, and write the result to `dst`.
    async fn thumbnail(
        &self,
        src: &Path,
        dst: &Path,
        max_dimension: u32,
    ) -> Result<(), ConversionError>;

    /// Re-encode `src` into the format implied by `dst`'s extension.
    async fn convert(&self, src: &Path, dst: &Path) -> Result<(), ConversionError>;
}

/// ImageMagick-compatible command line converter (`magick` or `convert`)
pub struct CommandLineConverter {
    tool: ImageTool,
    timeout: Duration,
}

impl CommandLineConverter {
    pub fn new(tool: ImageTool, timeout: Duration) -> Self {
        Self { tool, timeout }
    }

    async fn run(&self, args: Vec<OsString>) -> Result<(), ConversionError> {
        let command = self.tool.command().to_string();
        debug!("Running {} {:?}", command, args);

        let output = Command::new(&command)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .output();

        let output = match tokio::time::timeout(self.timeout, output).await {
            Ok(result) => result.map_err(|source| ConversionError::Launch {
                command: command.clone(),
                source,
            })?,
            Err(_) => {
                return Err(ConversionError::TimedOut {
                    command,
                    secs: self.timeout.as_secs(),
                })
            }
        };

        if !output.status.success() {
            return Err(ConversionError::Failed {
                command,
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        Ok(())
    }
}

/// Geometry that bounds both axes and only ever shrinks (`800x800>`)
pub fn shrink_only_geometry(max_dimension: u32) -> String {
    format!("{0}x{0}>", max_dimension)
}

#[async_trait]
impl ImageConverter for CommandLineConverter {
    fn name(&self) -> &str {
        self.tool.command()
    }

    async fn thumbnail(
        &self,
        src: &Path,
        dst: &Path,
        max_dimension: u32,
    ) -> Result<(), ConversionError> {
        self.run(vec![
            src.as_os_str().to_owned(),
            OsString::from("-resize"),
            OsString::from(shrink_only_geometry(max_dimension)),
            dst.as_os_str().to_owned(),
        ])
        .await
    }

    async fn convert(&self, src: &Path, dst: &Path) -> Result<(), ConversionError> {
        self.run(vec![src.as_os_str().to_owned(), dst.as_os_str().to_owned()])
            .await
    }
}
