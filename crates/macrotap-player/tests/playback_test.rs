use futures::future::BoxFuture;
use futures::FutureExt;
use macrotap_core::headless::{HeadlessPrompt, HeadlessSurface};
use macrotap_core::prelude::*;
use macrotap_player::prelude::*;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;

/// Records every call and answers from a script.
#[derive(Clone, Default)]
struct ScriptedDispatcher {
    calls: Arc<Mutex<Vec<(ActionId, Instant)>>>,
    outcomes: Arc<Mutex<VecDeque<DispatchOutcome>>>,
    hang: bool,
}

impl ScriptedDispatcher {
    fn answering(outcomes: Vec<DispatchOutcome>) -> Self {
        Self {
            outcomes: Arc::new(Mutex::new(outcomes.into())),
            ..Default::default()
        }
    }

    fn hanging() -> Self {
        Self {
            hang: true,
            ..Default::default()
        }
    }

    fn ids(&self) -> Vec<ActionId> {
        self.calls.lock().iter().map(|(id, _)| *id).collect()
    }

    fn times_since(&self, start: Instant) -> Vec<Duration> {
        self.calls.lock().iter().map(|(_, t)| *t - start).collect()
    }
}

impl GestureDispatcher for ScriptedDispatcher {
    fn dispatch(&self, gesture: Gesture) -> BoxFuture<'static, DispatchOutcome> {
        self.calls.lock().push((gesture.action_id, Instant::now()));
        if self.hang {
            return futures::future::pending().boxed();
        }
        let outcome = self
            .outcomes
            .lock()
            .pop_front()
            .unwrap_or(DispatchOutcome::Completed);
        async move { outcome }.boxed()
    }
}

fn ms(n: u64) -> Duration {
    Duration::from_millis(n)
}

fn about(actual: Duration, expected: Duration) -> bool {
    actual >= expected && actual < expected + ms(20)
}

fn at(x: f32, y: f32) -> AbsolutePoint {
    AbsolutePoint::new(x, y)
}

fn player_with(
    actions: Vec<Action>,
    dispatcher: ScriptedDispatcher,
) -> (Player<ScriptedDispatcher>, macrotap_core::notify::Receiver<Notification>) {
    let (notifier, rx) = Notifier::channel();
    let player = Player::new(dispatcher, MacroHandle::from_actions(actions)).with_notifier(notifier);
    (player, rx)
}

#[tokio::test(start_paused = true)]
async fn three_loops_of_three_waits() {
    let actions = (1..=3).map(|id| Action::wait(id, 100)).collect();
    let (player, rx) = player_with(actions, ScriptedDispatcher::default());
    player.set_loop_count(3);

    let start = Instant::now();
    assert!(player.start().unwrap());
    assert_eq!(player.state(), PlaybackState::Playing);
    player.wait_stopped().await;

    let stats = player.stats();
    assert_eq!(stats.waits, 9);
    assert_eq!(stats.loops_completed, 3);
    assert_eq!(stats.gestures_dispatched, 0);
    assert_eq!(player.state(), PlaybackState::Stopped);
    // settle + 3 loops of 3 x (100 wait + 500 after) + 2 loop pauses
    assert!(about(start.elapsed(), ms(500 + 3 * 1800 + 200)));

    let notes: Vec<Notification> = rx.try_iter().collect();
    assert_eq!(
        notes,
        vec![Notification::PlaybackStarted, Notification::PlaybackStopped]
    );
}

#[tokio::test(start_paused = true)]
async fn stop_mid_delay_ends_infinite_run() {
    let dispatcher = ScriptedDispatcher::default();
    let actions = vec![
        Action::click(1, at(10.0, 10.0)),
        Action::click(2, at(20.0, 20.0)),
    ];
    let (player, rx) = player_with(actions, dispatcher.clone());
    player.set_loop_count(0);
    player.start().unwrap();

    // first click at 500ms, its delay_after runs until 1000ms
    tokio::time::sleep(ms(700)).await;
    assert_eq!(dispatcher.ids(), vec![1]);
    player.stop();
    assert_eq!(player.state(), PlaybackState::Stopped);

    tokio::time::sleep(Duration::from_secs(10)).await;
    assert_eq!(dispatcher.ids(), vec![1]);
    let stops = rx
        .try_iter()
        .filter(|n| *n == Notification::PlaybackStopped)
        .count();
    assert_eq!(stops, 1);
}

#[tokio::test(start_paused = true)]
async fn stop_drops_in_flight_dispatch() {
    let dispatcher = ScriptedDispatcher::hanging();
    let (player, _rx) = player_with(vec![Action::click(1, at(1.0, 1.0))], dispatcher.clone());
    player.start().unwrap();
    tokio::time::sleep(ms(600)).await;
    assert_eq!(dispatcher.ids(), vec![1]);

    player.stop();
    player.wait_stopped().await;
    tokio::time::sleep(Duration::from_secs(5)).await;
    let stats = player.stats();
    assert_eq!(stats.gestures_dispatched, 1);
    assert_eq!(stats.gestures_completed, 0);
    assert_eq!(stats.loops_completed, 0);
}

#[tokio::test(start_paused = true)]
async fn disabled_actions_cost_nothing() {
    let dispatcher = ScriptedDispatcher::default();
    let actions = vec![
        Action::click(1, at(1.0, 1.0)).with_enabled(false),
        Action::wait(2, 5000).with_enabled(false),
        Action::click(3, at(3.0, 3.0)).with_delay_before(200),
    ];
    let (player, _rx) = player_with(actions, dispatcher.clone());

    let start = Instant::now();
    player.start().unwrap();
    player.wait_stopped().await;

    assert_eq!(dispatcher.ids(), vec![3]);
    assert_eq!(player.stats().waits, 0);
    assert!(about(dispatcher.times_since(start)[0], ms(700)));
    assert!(about(start.elapsed(), ms(1200)));
}

#[tokio::test(start_paused = true)]
async fn short_delay_after_is_floored() {
    let dispatcher = ScriptedDispatcher::default();
    let actions = vec![
        Action::click(1, at(1.0, 1.0)).with_timing(100, 0),
        Action::click(2, at(2.0, 2.0)).with_timing(100, 10),
    ];
    let (player, _rx) = player_with(actions, dispatcher.clone());

    let start = Instant::now();
    player.start().unwrap();
    player.wait_stopped().await;

    let times = dispatcher.times_since(start);
    assert!(about(times[0], ms(500)));
    assert!(about(times[1], ms(600)));
    assert!(about(start.elapsed(), ms(700)));
}

#[tokio::test(start_paused = true)]
async fn failed_dispatch_does_not_abort() {
    let dispatcher = ScriptedDispatcher::answering(vec![
        DispatchOutcome::Failed("no service".into()),
        DispatchOutcome::Cancelled,
        DispatchOutcome::Completed,
    ]);
    let actions = vec![
        Action::click(1, at(1.0, 1.0)),
        Action::swipe(2, at(1.0, 1.0), at(9.0, 9.0)),
        Action::long_click(3, at(5.0, 5.0)),
    ];
    let (player, _rx) = player_with(actions, dispatcher.clone());
    player.start().unwrap();
    player.wait_stopped().await;

    assert_eq!(dispatcher.ids(), vec![1, 2, 3]);
    let stats = player.stats();
    assert_eq!(stats.gestures_dispatched, 3);
    assert_eq!(stats.gestures_completed, 1);
    assert_eq!(stats.gestures_failed, 2);
    assert_eq!(stats.loops_completed, 1);
}

#[tokio::test(start_paused = true)]
async fn start_while_playing_is_ignored() {
    let dispatcher = ScriptedDispatcher::default();
    let (player, rx) = player_with(vec![Action::click(1, at(1.0, 1.0))], dispatcher.clone());
    assert!(player.start().unwrap());
    assert!(!player.start().unwrap());
    player.wait_stopped().await;

    assert_eq!(dispatcher.ids(), vec![1]);
    let starts = rx
        .try_iter()
        .filter(|n| *n == Notification::PlaybackStarted)
        .count();
    assert_eq!(starts, 1);
}

#[tokio::test(start_paused = true)]
async fn loop_count_carries_over_runs() {
    let dispatcher = ScriptedDispatcher::default();
    let (player, _rx) = player_with(vec![Action::click(1, at(1.0, 1.0))], dispatcher.clone());
    player.set_loop_count(2);

    player.start().unwrap();
    player.wait_stopped().await;
    assert_eq!(player.stats().loops_completed, 2);

    player.start().unwrap();
    player.wait_stopped().await;
    assert_eq!(player.stats().loops_completed, 2);
    assert_eq!(dispatcher.ids().len(), 4);
}

#[tokio::test(start_paused = true)]
async fn restart_after_stop_is_not_clobbered() {
    let dispatcher = ScriptedDispatcher::default();
    let (player, rx) = player_with(vec![Action::click(1, at(1.0, 1.0))], dispatcher.clone());
    let mut states = player.subscribe();

    player.start().unwrap();
    player.stop();
    player.start().unwrap();
    assert!(states.has_changed().unwrap());
    assert_eq!(*states.borrow_and_update(), PlaybackState::Playing);

    player.wait_stopped().await;
    assert_eq!(dispatcher.ids(), vec![1]);
    assert_eq!(player.stats().loops_completed, 1);
    let notes: Vec<Notification> = rx.try_iter().collect();
    assert_eq!(
        notes,
        vec![
            Notification::PlaybackStarted,
            Notification::PlaybackStopped,
            Notification::PlaybackStarted,
            Notification::PlaybackStopped,
        ]
    );
}

#[tokio::test(start_paused = true)]
async fn edits_apply_from_the_next_loop() {
    let macros = MacroHandle::new();
    let surface = HeadlessSurface::new(Size::new(400.0, 400.0));
    let mut session =
        AuthoringSession::new(surface, HeadlessPrompt::new()).with_macros(macros.clone());
    for _ in 0..2 {
        session.begin_create(ActionKind::Click);
        session.confirm();
    }

    let dispatcher = ScriptedDispatcher::default();
    let player = Player::new(dispatcher.clone(), macros);
    player.set_loop_count(2);
    player.start().unwrap();

    // loop 1 has taken its snapshot and dispatched action 1
    tokio::time::sleep(ms(700)).await;
    session.delete_action(2);

    player.wait_stopped().await;
    assert_eq!(dispatcher.ids(), vec![1, 2, 1]);
}

#[tokio::test(start_paused = true)]
async fn gestures_carry_stroke_floors() {
    #[derive(Clone, Default)]
    struct Capture(Arc<Mutex<Vec<Gesture>>>);

    impl GestureDispatcher for Capture {
        fn dispatch(&self, gesture: Gesture) -> BoxFuture<'static, DispatchOutcome> {
            self.0.lock().push(gesture);
            async { DispatchOutcome::Completed }.boxed()
        }
    }

    let capture = Capture::default();
    let actions = vec![
        Action::click(1, at(100.0, 100.0)).with_timing(1, 500),
        Action::long_click(2, at(100.0, 100.0)).with_timing(50, 500),
        Action::swipe(3, at(50.0, 50.0), at(250.0, 250.0)).with_timing(300, 500),
    ];
    let player = Player::new(capture.clone(), MacroHandle::from_actions(actions));
    player.start().unwrap();
    player.wait_stopped().await;

    let gestures = capture.0.lock().clone();
    let durations: Vec<Duration> = gestures.iter().map(|g| g.duration).collect();
    assert_eq!(durations, vec![ms(50), ms(500), ms(300)]);
    assert_eq!(gestures[2].path, vec![at(50.0, 50.0), at(250.0, 250.0)]);
}
