//! HTTP scene bridge: the sampler and actuator served by a local helper
//! process that owns the game window.

use async_trait::async_trait;
use godfield_core::model::{MiracleReading, Phase, SceneFrame, Target};
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

use crate::scene::{Column, Confirm, InputActuator, SceneSampler};

/// Failure talking to the scene bridge.
#[derive(Debug, Error)]
pub enum BridgeError {
    #[error("bridge transport error: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("bridge {path} returned {status}")]
    Status { path: String, status: StatusCode },
    #[error("bridge {path} sent malformed json: {source}")]
    Decode {
        path: String,
        source: serde_json::Error,
    },
}

/// Body of `POST /input`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum InputCommand {
    /// Click hand cards in order.
    ClickIndices { indices: Vec<usize> },
    /// Commit the selection, or pass when nothing is selected.
    Commit { phase: Phase, target: Option<Target> },
    /// Press a purchase confirm control.
    ClickConfirm { which: Confirm },
    /// Step an exchange counter.
    AdjustCounter { column: Column, delta: i64 },
    /// Open or close the miracle history view.
    ToggleMiracleView,
}

/// Sampler and actuator backed by the bridge's HTTP API.
#[derive(Debug, Clone)]
pub struct HttpBridge {
    http: Client,
    base: String,
}

impl HttpBridge {
    /// `base` is the bridge root; a trailing slash is ignored.
    pub fn new(base: impl Into<String>) -> Self {
        Self {
            http: Client::new(),
            base: base.into().trim_end_matches('/').to_string(),
        }
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, BridgeError> {
        let resp = self.http.get(format!("{}{path}", self.base)).send().await?;
        let status = resp.status();
        if !status.is_success() {
            return Err(BridgeError::Status {
                path: path.to_string(),
                status,
            });
        }
        let body = resp.text().await?;
        serde_json::from_str(&body).map_err(|source| BridgeError::Decode {
            path: path.to_string(),
            source,
        })
    }

    /// `POST /input` one command.
    pub async fn send(&self, cmd: &InputCommand) -> Result<(), BridgeError> {
        let resp = self
            .http
            .post(format!("{}/input", self.base))
            .json(cmd)
            .send()
            .await?;
        let status = resp.status();
        if !status.is_success() {
            return Err(BridgeError::Status {
                path: "/input".to_string(),
                status,
            });
        }
        Ok(())
    }
}

#[async_trait]
impl SceneSampler for HttpBridge {
    async fn sample(&self) -> anyhow::Result<Option<SceneFrame>> {
        Ok(self.get_json("/scene").await?)
    }

    async fn confirm_visible(&self, which: Confirm) -> anyhow::Result<bool> {
        Ok(self.get_json(&format!("/confirm/{}", which.as_str())).await?)
    }

    async fn counters_visible(&self) -> anyhow::Result<bool> {
        Ok(self.get_json("/counters").await?)
    }

    async fn read_miracles(&self) -> anyhow::Result<Option<MiracleReading>> {
        Ok(self.get_json("/miracles").await?)
    }
}

#[async_trait]
impl InputActuator for HttpBridge {
    async fn click_indices(&self, indices: &[usize]) -> anyhow::Result<()> {
        Ok(self
            .send(&InputCommand::ClickIndices {
                indices: indices.to_vec(),
            })
            .await?)
    }

    async fn commit(&self, phase: Phase, target: Option<Target>) -> anyhow::Result<()> {
        Ok(self.send(&InputCommand::Commit { phase, target }).await?)
    }

    async fn click_confirm(&self, which: Confirm) -> anyhow::Result<()> {
        Ok(self.send(&InputCommand::ClickConfirm { which }).await?)
    }

    async fn adjust_counter(&self, column: Column, delta: i64) -> anyhow::Result<()> {
        Ok(self.send(&InputCommand::AdjustCounter { column, delta }).await?)
    }

    async fn toggle_miracle_view(&self) -> anyhow::Result<()> {
        Ok(self.send(&InputCommand::ToggleMiracleView).await?)
    }
}

/// `--dry-run` actuator: logs every command and sends nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct LoggingActuator;

impl LoggingActuator {
    fn log(&self, cmd: InputCommand) -> anyhow::Result<()> {
        info!("dry-run input: {}", serde_json::to_string(&cmd)?);
        Ok(())
    }
}

#[async_trait]
impl InputActuator for LoggingActuator {
    async fn click_indices(&self, indices: &[usize]) -> anyhow::Result<()> {
        self.log(InputCommand::ClickIndices {
            indices: indices.to_vec(),
        })
    }

    async fn commit(&self, phase: Phase, target: Option<Target>) -> anyhow::Result<()> {
        self.log(InputCommand::Commit { phase, target })
    }

    async fn click_confirm(&self, which: Confirm) -> anyhow::Result<()> {
        self.log(InputCommand::ClickConfirm { which })
    }

    async fn adjust_counter(&self, column: Column, delta: i64) -> anyhow::Result<()> {
        self.log(InputCommand::AdjustCounter { column, delta })
    }

    async fn toggle_miracle_view(&self) -> anyhow::Result<()> {
        self.log(InputCommand::ToggleMiracleView)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn input_command_wire_shape() {
        let cmd = InputCommand::Commit {
            phase: Phase::Attack,
            target: Some(Target::Me),
        };
        assert_eq!(
            serde_json::to_value(&cmd).unwrap(),
            json!({"kind": "commit", "phase": "attack", "target": "self"})
        );

        let cmd = InputCommand::AdjustCounter {
            column: Column::Gold,
            delta: -4,
        };
        assert_eq!(
            serde_json::to_value(&cmd).unwrap(),
            json!({"kind": "adjust_counter", "column": "gold", "delta": -4})
        );

        assert_eq!(
            serde_json::to_value(InputCommand::ToggleMiracleView).unwrap(),
            json!({"kind": "toggle_miracle_view"})
        );
    }

    #[test]
    fn trailing_slash_is_trimmed() {
        let bridge = HttpBridge::new("http://127.0.0.1:8765/");
        assert_eq!(bridge.base, "http://127.0.0.1:8765");
    }
}
