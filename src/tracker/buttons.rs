//! User-defined score actions ("buttons").

use serde::{Deserialize, Serialize};

use crate::error::{Result, TrackerError};

/// Whether an action rewards or penalizes. Persisted as `"good"` / `"bad"`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Polarity {
    #[serde(rename = "good")]
    Positive,
    #[serde(rename = "bad")]
    Negative,
}

impl Polarity {
    /// Parse the persisted marker. Anything but `good` / `bad` is rejected.
    pub fn from_marker(marker: &str) -> Option<Polarity> {
        match marker {
            "good" => Some(Polarity::Positive),
            "bad" => Some(Polarity::Negative),
            _ => None,
        }
    }

    pub fn marker(&self) -> &'static str {
        match self {
            Polarity::Positive => "good",
            Polarity::Negative => "bad",
        }
    }

    /// Force `magnitude`'s sign to match this polarity, capped at `MAX_MAGNITUDE`.
    pub fn normalize(&self, magnitude: i64) -> i64 {
        let size = magnitude.saturating_abs().min(MAX_MAGNITUDE);
        match self {
            Polarity::Positive => size,
            Polarity::Negative => -size,
        }
    }
}

/// Canvas position in pixels. Presentation-only, persisted for restore.
#[derive(Clone, Copy, Debug, PartialEq, Default, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

impl Position {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Default spot for the n-th action when none was given.
    pub fn cascade(index: usize) -> Self {
        let step = (index % 8) as f64;
        Self {
            x: 100.0 + step * 40.0,
            y: 100.0 + step * 30.0,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct ScoreAction {
    pub id: String,
    pub polarity: Polarity,
    pub label: String,
    /// Signed: positive for `Positive`, negative for `Negative`.
    pub magnitude: i64,
    pub position: Position,
}

impl ScoreAction {
    /// Display form of the value with an explicit sign, e.g. `+5` / `-3`.
    pub fn signed_value(&self) -> String {
        if self.magnitude > 0 {
            format!("+{}", self.magnitude)
        } else {
            self.magnitude.to_string()
        }
    }
}

/// Largest accepted action value, either sign.
pub const MAX_MAGNITUDE: i64 = 1_000_000_000;

/// Convert a user or imported number into a magnitude.
/// Fractions are rounded; non-finite or out-of-range values are rejected.
pub fn magnitude_from_f64(value: f64) -> Result<i64> {
    if !value.is_finite() {
        return Err(TrackerError::InvalidInput(format!(
            "value is not a finite number: {value}"
        )));
    }
    let rounded = value.round();
    if rounded.abs() > MAX_MAGNITUDE as f64 {
        return Err(TrackerError::InvalidInput(format!(
            "value must be between -{MAX_MAGNITUDE} and {MAX_MAGNITUDE}"
        )));
    }
    Ok(rounded as i64)
}

const ID_PREFIX: &str = "btn-";

/// Owns every `ScoreAction`, in insertion order.
#[derive(Clone, Debug, Default)]
pub struct ButtonRegistry {
    actions: Vec<ScoreAction>,
    /// Last numeric suffix handed out for `btn-<n>` ids.
    counter: u64,
}

impl ButtonRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a new action. A missing or already-taken `id` gets a fresh one.
    pub fn create(
        &mut self,
        polarity: Polarity,
        label: &str,
        magnitude: i64,
        id: Option<String>,
        position: Option<Position>,
    ) -> &ScoreAction {
        let id = match id {
            Some(id) if !id.is_empty() && self.get(&id).is_none() => {
                self.observe_id(&id);
                id
            }
            _ => self.fresh_id(),
        };
        let position = position.unwrap_or_else(|| Position::cascade(self.actions.len()));
        self.actions.push(ScoreAction {
            id,
            polarity,
            label: label.to_string(),
            magnitude: polarity.normalize(magnitude),
            position,
        });
        &self.actions[self.actions.len() - 1]
    }

    /// Remove the action with `id`. Returns whether anything was removed.
    pub fn remove(&mut self, id: &str) -> bool {
        let before = self.actions.len();
        self.actions.retain(|a| a.id != id);
        self.actions.len() != before
    }

    /// Rename and revalue an action, keeping its polarity.
    pub fn edit(&mut self, id: &str, new_label: &str, new_magnitude: f64) -> Result<()> {
        let magnitude = magnitude_from_f64(new_magnitude)?;
        let action = self
            .actions
            .iter_mut()
            .find(|a| a.id == id)
            .ok_or_else(|| TrackerError::UnknownItem(id.to_string()))?;
        action.label = new_label.to_string();
        action.magnitude = action.polarity.normalize(magnitude);
        Ok(())
    }

    /// Shift an action's stored position. Returns false when `id` is unknown.
    pub fn move_by(&mut self, id: &str, dx: f64, dy: f64) -> bool {
        match self.actions.iter_mut().find(|a| a.id == id) {
            Some(a) => {
                a.position.x = (a.position.x + dx).max(0.0);
                a.position.y = (a.position.y + dy).max(0.0);
                true
            }
            None => false,
        }
    }

    pub fn list(&self) -> &[ScoreAction] {
        &self.actions
    }

    pub fn get(&self, id: &str) -> Option<&ScoreAction> {
        self.actions.iter().find(|a| a.id == id)
    }

    pub fn len(&self) -> usize {
        self.actions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    /// Drop every action and restart id allocation.
    pub fn clear(&mut self) {
        self.actions.clear();
        self.counter = 0;
    }

    fn fresh_id(&mut self) -> String {
        loop {
            self.counter += 1;
            let id = format!("{ID_PREFIX}{}", self.counter);
            if self.get(&id).is_none() {
                return id;
            }
        }
    }

    /// Keep the counter ahead of restored `btn-<n>` ids.
    fn observe_id(&mut self, id: &str) {
        if let Some(n) = id
            .strip_prefix(ID_PREFIX)
            .and_then(|s| s.parse::<u64>().ok())
        {
            self.counter = self.counter.max(n);
        }
    }
}
