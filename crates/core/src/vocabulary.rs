//! Display-name markers the rules match on.

use serde::{Deserialize, Serialize};

/// Display-name markers the gate matches by substring.
///
/// Defaults cover both the Japanese client and an English-localised one.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Vocabulary {
    /// Names of the sale confirmation effect.
    pub sale: Vec<String>,
    /// Names of the forgiveness confirmation effect.
    pub forgive: Vec<String>,
    /// Names of the purchase confirmation effect.
    pub purchase: Vec<String>,
    /// Long-duration opponent status that hides incoming effects for a while
    /// after defense begins.
    pub veiling_status: Vec<String>,
}

impl Default for Vocabulary {
    fn default() -> Self {
        Self {
            sale: vec!["売る".into(), "Sale".into()],
            forgive: vec!["許す".into(), "Forgive".into()],
            purchase: vec!["買う".into(), "Purchase".into()],
            veiling_status: vec!["夢".into(), "Dream".into()],
        }
    }
}

/// True when `name` contains any of `markers`.
pub fn mentions(name: &str, markers: &[String]) -> bool {
    markers.iter().any(|m| name.contains(m.as_str()))
}
