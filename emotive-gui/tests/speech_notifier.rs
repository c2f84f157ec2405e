mod common;

use std::{
    sync::{Arc, Mutex, mpsc},
    time::{Duration, Instant},
};

use common::Recorder;
use emotive_gui::core::speech::{SpeechNotifier, SpeechSynthesizer, SpeechWorker};

const COOLDOWN: Duration = Duration::from_millis(1500);

/// Blocks inside `speak` until the test lets it go.
struct Gated {
    started: mpsc::Sender<String>,
    release: Mutex<mpsc::Receiver<()>>,
    spoken: Arc<Mutex<Vec<String>>>,
}

impl SpeechSynthesizer for Gated {
    fn speak(&self, text: &str) -> anyhow::Result<()> {
        self.started.send(text.to_owned()).ok();
        self.release.lock().unwrap().recv().ok();
        self.spoken.lock().unwrap().push(text.to_owned());
        Ok(())
    }

    fn name(&self) -> &str {
        "gated"
    }
}

#[test]
fn change_triggers_and_repeat_waits_for_cooldown() {
    let notifier = SpeechNotifier::new(COOLDOWN, None);
    let t0 = Instant::now();

    assert!(notifier.evaluate_at(Some("happy"), true, t0));
    assert!(notifier.evaluate_at(Some("sad"), true, t0 + Duration::from_millis(10)));
    assert!(!notifier.evaluate_at(Some("sad"), true, t0 + Duration::from_millis(900)));
    assert!(!notifier.evaluate_at(Some("sad"), true, t0 + Duration::from_millis(1510)));
    assert!(notifier.evaluate_at(Some("sad"), true, t0 + Duration::from_millis(1511)));
    assert_eq!(notifier.last_spoken().as_deref(), Some("sad"));
}

#[test]
fn disabled_toggle_leaves_state_untouched() {
    let notifier = SpeechNotifier::new(COOLDOWN, None);
    let t0 = Instant::now();
    assert!(!notifier.evaluate_at(Some("happy"), false, t0));
    assert_eq!(notifier.last_spoken(), None);
    assert!(!notifier.evaluate_at(None, true, t0));
    assert_eq!(notifier.last_spoken(), None);

    assert!(notifier.evaluate_at(Some("happy"), true, t0));
}

#[test]
fn fired_announcements_reach_the_synthesizer() {
    let recorder = Recorder::default();
    let notifier = SpeechNotifier::new(COOLDOWN, Some(Box::new(recorder.clone())));
    assert!(notifier.is_voiced());

    let t0 = Instant::now();
    notifier.evaluate_at(Some("surprise"), true, t0);
    notifier.evaluate_at(Some("surprise"), true, t0 + Duration::from_millis(5));

    assert_eq!(recorder.wait_for(1), vec!["surprise".to_string()]);
    std::thread::sleep(Duration::from_millis(20));
    assert_eq!(recorder.spoken.lock().unwrap().len(), 1);
}

#[test]
fn queued_utterances_are_replaced_by_the_latest() {
    let (started_tx, started_rx) = mpsc::channel();
    let (release_tx, release_rx) = mpsc::channel();
    let spoken = Arc::new(Mutex::new(Vec::new()));
    let worker = SpeechWorker::spawn(Box::new(Gated {
        started: started_tx,
        release: Mutex::new(release_rx),
        spoken: Arc::clone(&spoken),
    }))
    .expect("spawn speech worker");

    worker.say("happy");
    let first = started_rx
        .recv_timeout(Duration::from_secs(5))
        .expect("first utterance started");
    assert_eq!(first, "happy");

    worker.say("sad");
    worker.say("angry");
    release_tx.send(()).unwrap();

    let second = started_rx
        .recv_timeout(Duration::from_secs(5))
        .expect("second utterance started");
    assert_eq!(second, "angry");
    release_tx.send(()).unwrap();

    let deadline = Instant::now() + Duration::from_secs(5);
    while spoken.lock().unwrap().len() < 2 && Instant::now() < deadline {
        std::thread::sleep(Duration::from_millis(2));
    }
    assert_eq!(*spoken.lock().unwrap(), vec!["happy", "angry"]);
}

#[test]
fn no_engine_still_runs_the_gate() {
    let notifier = SpeechNotifier::new(COOLDOWN, None);
    assert!(!notifier.is_voiced());
    assert!(notifier.evaluate(Some("fear"), true));
    assert_eq!(notifier.last_spoken().as_deref(), Some("fear"));
}
