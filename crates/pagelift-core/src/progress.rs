use std::sync::Arc;

use crate::models::{LayerState, LayerStatus, ProgressSnapshot};
use crate::traits::ProgressReporter;

/// Reporter that uses the `tracing` crate.
///
/// Logs the most recent transition of each snapshot, which is always the
/// last entry that has left `pending` since strategies run in order.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingProgressReporter;

impl ProgressReporter for TracingProgressReporter {
    fn report(&self, snapshot: ProgressSnapshot) {
        let total = snapshot.len();
        let Some(layer) = snapshot
            .iter()
            .rev()
            .find(|l| l.state != LayerState::Pending)
        else {
            return;
        };
        match layer.state {
            LayerState::Trying => {
                tracing::info!(index = layer.index, total, strategy = %layer.name, "Trying strategy");
            }
            LayerState::Success => {
                tracing::info!(index = layer.index, total, strategy = %layer.name, "Strategy succeeded");
            }
            LayerState::Failed => {
                tracing::warn!(index = layer.index, total, strategy = %layer.name, "Strategy failed");
            }
            LayerState::Pending => {}
        }
    }
}

/// Per-run layer states; every transition broadcasts a fresh snapshot.
pub(crate) struct LayerTracker<'r, R: ProgressReporter + ?Sized> {
    layers: Vec<LayerStatus>,
    reporter: &'r R,
}

impl<'r, R: ProgressReporter + ?Sized> LayerTracker<'r, R> {
    pub(crate) fn new<'n>(names: impl IntoIterator<Item = &'n str>, reporter: &'r R) -> Self {
        let layers = names
            .into_iter()
            .enumerate()
            .map(|(i, name)| LayerStatus {
                index: i + 1,
                name: name.to_string(),
                state: LayerState::Pending,
            })
            .collect();
        Self { layers, reporter }
    }

    /// Move layer `position` (0-based) to `state` and notify the reporter.
    pub(crate) fn mark(&mut self, position: usize, state: LayerState) {
        let layer = &mut self.layers[position];
        debug_assert!(
            matches!(
                (layer.state, state),
                (LayerState::Pending, LayerState::Trying)
                    | (LayerState::Trying, LayerState::Success)
                    | (LayerState::Trying, LayerState::Failed)
            ),
            "invalid layer transition {} -> {}",
            layer.state,
            state
        );
        layer.state = state;
        self.reporter.report(Arc::from(self.layers.as_slice()));
    }

    pub(crate) fn snapshot(&self) -> Vec<LayerStatus> {
        self.layers.clone()
    }
}
