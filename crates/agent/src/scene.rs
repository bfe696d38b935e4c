//! Collaborator seams: reading the scene and driving simulated input.

use async_trait::async_trait;
use godfield_core::model::{MiracleReading, Phase, SceneFrame, Target};
use serde::{Deserialize, Serialize};

/// Which purchase confirm control to press.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Confirm {
    /// Accept the offer.
    Yes,
    /// Decline it.
    No,
}

impl Confirm {
    /// Wire name, also used in bridge paths.
    pub fn as_str(self) -> &'static str {
        match self {
            Confirm::Yes => "yes",
            Confirm::No => "no",
        }
    }
}

/// Exchange counter column.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Column {
    /// Magic points.
    Mp,
    /// Money.
    Gold,
}

/// Best-effort reader of the rendered game.
///
/// Implementations may be slow and may return stale text. `Ok(None)` means
/// the scene was ambiguous this time and the tick should be abandoned.
#[async_trait]
pub trait SceneSampler: Send + Sync {
    /// One read of the scene.
    async fn sample(&self) -> anyhow::Result<Option<SceneFrame>>;

    /// Whether the purchase confirm control is currently clickable.
    async fn confirm_visible(&self, which: Confirm) -> anyhow::Result<bool>;

    /// Whether the exchange counter controls are on screen.
    async fn counters_visible(&self) -> anyhow::Result<bool>;

    /// Read the miracle history view; `None` if the view is not open.
    async fn read_miracles(&self) -> anyhow::Result<Option<MiracleReading>>;
}

/// Fire-and-forget simulated pointer input.
#[async_trait]
pub trait InputActuator: Send + Sync {
    /// Click the hand cards at `indices`, in order.
    async fn click_indices(&self, indices: &[usize]) -> anyhow::Result<()>;

    /// Press the controls that commit the current selection for `phase`
    /// (or pass, when nothing is selected).
    async fn commit(&self, phase: Phase, target: Option<Target>) -> anyhow::Result<()>;

    /// Press a purchase confirm control.
    async fn click_confirm(&self, which: Confirm) -> anyhow::Result<()>;

    /// Step an exchange counter by `delta`; negative steps down.
    async fn adjust_counter(&self, column: Column, delta: i64) -> anyhow::Result<()>;

    /// Open or close the miracle history view.
    async fn toggle_miracle_view(&self) -> anyhow::Result<()>;
}
