use std::process::Stdio;
use std::sync::OnceLock;
use std::time::Duration;
use tokio::process::Command;
use tracing::{debug, info, warn};

/// Upper bound on a single `-version` probe
const PROBE_TIMEOUT: Duration = Duration::from_secs(10);

/// Process-wide result of the first probe
static DETECTED_TOOL: OnceLock<Option<ImageTool>> = OnceLock::new();

/// An image conversion command that was found on this host
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageTool {
    command: String,
}

impl ImageTool {
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
        }
    }

    pub fn command(&self) -> &str {
        &self.command
    }
}

/// Try each candidate in order and return the first one that launches.
///
/// Output is discarded and the exit status is not inspected; a candidate
/// only has to start.
pub async fn probe(candidates: &[String]) -> Option<ImageTool> {
    for candidate in candidates {
        let launched = Command::new(candidate)
            .arg("-version")
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .status();

        match tokio::time::timeout(PROBE_TIMEOUT, launched).await {
            Ok(Ok(status)) => {
                debug!("Image tool candidate '{}' exited with {}", candidate, status);
                return Some(ImageTool::new(candidate.as_str()));
            }
            Ok(Err(e)) => {
                debug!("Image tool candidate '{}' unavailable: {}", candidate, e);
            }
            Err(_) => {
                // Started but never answered; it exists, so it counts.
                warn!(
                    "Image tool candidate '{}' did not exit within {:?}",
                    candidate, PROBE_TIMEOUT
                );
                return Some(ImageTool::new(candidate.as_str()));
            }
        }
    }

    None
}

/// Probe once per process and reuse the answer afterwards.
pub async fn detect(candidates: &[String]) -> Option<&'static ImageTool> {
    if let Some(tool) = DETECTED_TOOL.get() {
        return tool.as_ref();
    }

    let probed = probe(candidates).await;
    let tool = DETECTED_TOOL.get_or_init(|| probed).as_ref();

    match tool {
        Some(tool) => info!("Image tool detected: {}", tool.command()),
        None => warn!(
            "No image tool found (tried: {}); image derivatives disabled",
            candidates.join(", ")
        ),
    }

    tool
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_probe_returns_none_when_nothing_launches() {
        let candidates = vec![
            "phone-uploads-missing-tool-a".to_string(),
            "phone-uploads-missing-tool-b".to_string(),
        ];
        assert_eq!(probe(&candidates).await, None);
    }

    #[tokio::test]
    async fn test_probe_empty_candidates() {
        assert_eq!(probe(&[]).await, None);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_probe_picks_first_launchable_in_order() {
        // `false` launches fine and exits non-zero, which still counts.
        let candidates = vec![
            "phone-uploads-missing-tool".to_string(),
            "false".to_string(),
            "true".to_string(),
        ];
        assert_eq!(probe(&candidates).await, Some(ImageTool::new("false")));
    }
}
