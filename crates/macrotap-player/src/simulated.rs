//! Dispatcher that performs nothing
//!
//! Logs each gesture and takes as long as the gesture would. Lets the CLI
//! dry-run a preset and shows the timing a real device would see.

use crate::dispatch::{DispatchOutcome, Gesture, GestureDispatcher};
use crossbeam_channel::Sender;
use futures::future::BoxFuture;
use futures::FutureExt;
use tracing::info;

#[derive(Debug, Clone, Default)]
pub struct SimulatedDispatcher {
    tap: Option<Sender<Gesture>>,
}

impl SimulatedDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Also forward every gesture to `tx`.
    pub fn with_tap(tx: Sender<Gesture>) -> Self {
        Self { tap: Some(tx) }
    }
}

impl GestureDispatcher for SimulatedDispatcher {
    fn dispatch(&self, gesture: Gesture) -> BoxFuture<'static, DispatchOutcome> {
        info!("{}", gesture);
        let duration = gesture.duration;
        if let Some(tx) = &self.tap {
            let _ = tx.send(gesture);
        }
        async move {
            tokio::time::sleep(duration).await;
            DispatchOutcome::Completed
        }
        .boxed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dispatch::StrokeFloors;
    use macrotap_core::{AbsolutePoint, Action};
    use std::time::Duration;

    #[tokio::test(start_paused = true)]
    async fn takes_as_long_as_the_gesture() {
        let (tx, rx) = crossbeam_channel::unbounded();
        let dispatcher = SimulatedDispatcher::with_tap(tx);
        let action = Action::long_click(1, AbsolutePoint::new(5.0, 5.0));
        let gesture = Gesture::for_action(&action, &StrokeFloors::default()).unwrap();

        let started = tokio::time::Instant::now();
        assert!(dispatcher.dispatch(gesture).await.is_completed());
        let elapsed = started.elapsed();
        assert!(elapsed >= Duration::from_millis(1500) && elapsed < Duration::from_millis(1510));
        assert_eq!(rx.try_recv().unwrap().action_id, 1);
    }
}
