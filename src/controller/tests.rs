use std::cell::{Cell, RefCell};
use std::collections::HashSet;
use std::rc::Rc;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use wasm_bindgen_test::*;

use super::*;
use crate::anim::Channel;
use crate::asset::fixtures;
use crate::error::SpeechSynthesisError;

const FRAME: f32 = 1.0 / 60.0;

fn config() -> AvatarConfig {
    let mut config = AvatarConfig::default();
    config.timing.inactivity_ms = 0;
    config
}

/// Controller with the base avatar mounted and its events drained.
fn ready(config: AvatarConfig) -> AvatarController {
    let mut avatar = AvatarController::new(config).unwrap();
    avatar.load_base();
    let requests = avatar.take_load_requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].kind, LoadKind::Base);
    avatar.complete_load(&requests[0].key, Ok(fixtures::base_asset()));
    avatar.take_events();
    avatar
}

fn assert_exclusive(avatar: &AvatarController) {
    let visible: Vec<ModelId> = avatar.scene().visible_models().map(|m| m.id()).collect();
    assert_eq!(visible.len(), 1, "visible {:?} in {:?}", visible, avatar);
    assert_eq!(Some(visible[0]), avatar.visible_model());
}

/// Answer every outstanding load; keys without a duration 404.
fn serve(avatar: &mut AvatarController, durations: &[(&str, f32)]) -> usize {
    let requests = avatar.take_load_requests();
    let count = requests.len();
    for request in requests {
        let result = match durations.iter().find(|(key, _)| *key == request.key) {
            Some((key, duration)) => Ok(fixtures::external_asset(key, *duration)),
            None => Err(AssetLoadError::Http {
                url: request.url.clone(),
                status: 404,
            }),
        };
        avatar.complete_load(&request.key, result);
        assert_exclusive(avatar);
    }
    count
}

fn run(avatar: &mut AvatarController, frames: usize) {
    for _ in 0..frames {
        avatar.tick(FRAME);
        assert_exclusive(avatar);
    }
}

fn run_serving(
    avatar: &mut AvatarController,
    frames: usize,
    durations: &[(&str, f32)],
) -> Vec<AvatarEvent> {
    let mut events = Vec::new();
    for _ in 0..frames {
        serve(avatar, durations);
        avatar.tick(FRAME);
        assert_exclusive(avatar);
        events.extend(avatar.take_events());
    }
    events
}

fn finished(events: &[AvatarEvent]) -> Vec<(RequestId, PlaybackOutcome)> {
    events
        .iter()
        .filter_map(|e| match e {
            AvatarEvent::PlaybackFinished { request, outcome, .. } => {
                Some((*request, outcome.clone()))
            }
            _ => None,
        })
        .collect()
}

fn recorder() -> (Rc<RefCell<Vec<PlaybackOutcome>>>, PlayOptions) {
    let outcomes = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&outcomes);
    let options = PlayOptions::default().on_complete(move |o| sink.borrow_mut().push(o));
    (outcomes, options)
}

#[derive(Default)]
struct RecordingEngine {
    spoken: Rc<RefCell<Vec<(UtteranceId, String)>>>,
    cancels: Rc<Cell<usize>>,
    fail: bool,
}

impl SpeechEngine for RecordingEngine {
    fn speak(
        &mut self,
        utterance: UtteranceId,
        text: &str,
        _voice: &VoiceOptions,
    ) -> Result<(), SpeechSynthesisError> {
        if self.fail {
            return Err(SpeechSynthesisError::Engine("synthesis-failed".to_string()));
        }
        self.spoken.borrow_mut().push((utterance, text.to_string()));
        Ok(())
    }

    fn cancel(&mut self) {
        self.cancels.set(self.cancels.get() + 1);
    }

    fn list_voices(&self) -> Vec<Voice> {
        vec![Voice {
            name: "Test Voice".to_string(),
            lang: "en-US".to_string(),
            default: true,
        }]
    }
}

#[test]
#[wasm_bindgen_test]
fn test_base_load_reports_progress_and_ready() {
    let mut avatar = AvatarController::new(config()).unwrap();
    assert_eq!(avatar.render_state(), RenderState::BaseVisible);
    avatar.load_base();
    avatar.load_base();

    let requests = avatar.take_load_requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].url, "http://localhost:8080/models/Avatar.glb");

    avatar.report_progress("avatar", 50, Some(200));
    avatar.complete_load("avatar", Ok(fixtures::base_asset()));
    assert!(avatar.is_base_loaded());
    assert_exclusive(&avatar);

    let events = avatar.take_events();
    assert!(events.contains(&AvatarEvent::LoadingProgress {
        key: "avatar".to_string(),
        percent: 25.0,
        stage: "Downloading avatar".to_string(),
    }));
    assert!(events.contains(&AvatarEvent::ModelLoaded {
        key: "avatar".to_string()
    }));
}

#[test]
#[wasm_bindgen_test]
fn test_base_load_failure_surfaces_error() {
    let mut avatar = AvatarController::new(config()).unwrap();
    avatar.load_base();
    avatar.take_load_requests();
    avatar.take_events();

    let err = AssetLoadError::Network {
        url: "http://localhost:8080/models/Avatar.glb".to_string(),
        reason: "offline".to_string(),
    };
    avatar.complete_load("avatar", Err(err.clone()));
    assert_eq!(avatar.take_events(), vec![AvatarEvent::Error(err.into())]);
    assert!(!avatar.is_base_loaded());

    // A retry is allowed
    avatar.load_base();
    assert_eq!(avatar.take_load_requests().len(), 1);
}

#[test]
#[wasm_bindgen_test]
fn test_capability_unavailable_is_reported() {
    let mut avatar = AvatarController::new(config()).unwrap();
    avatar.report_capability_unavailable("no WebGL");
    assert!(matches!(
        avatar.take_events().as_slice(),
        [AvatarEvent::Error(AvatarError::Capability(_))]
    ));
}

#[test]
#[wasm_bindgen_test]
fn test_play_before_base_loaded() {
    let mut avatar = AvatarController::new(config()).unwrap();
    let (outcomes, options) = recorder();
    avatar.play_external("hi", Emotion::Happy, options);

    assert_eq!(*outcomes.borrow(), vec![PlaybackOutcome::BaseNotLoaded]);
    assert!(avatar.take_load_requests().is_empty());
    assert_eq!(avatar.render_state(), RenderState::BaseVisible);
}

#[test]
#[wasm_bindgen_test]
fn test_external_plays_then_returns_to_base() {
    let mut avatar = ready(config());
    let (outcomes, options) = recorder();
    let request = avatar.play_external("hi", Emotion::Happy, options);
    assert_eq!(avatar.render_state(), RenderState::ExternalLoading);
    assert_exclusive(&avatar);

    serve(&mut avatar, &[("hi", 0.5)]);
    assert_eq!(avatar.render_state(), RenderState::ExternalVisible);
    let base = avatar.base_model().unwrap();
    assert!(!avatar.scene().get(base).unwrap().visible);

    run(&mut avatar, 60);
    assert_eq!(avatar.render_state(), RenderState::BaseVisible);
    assert_eq!(avatar.current_emotion(), Emotion::Happy);
    assert_eq!(*outcomes.borrow(), vec![PlaybackOutcome::Completed]);
    assert_eq!(avatar.scene().len(), 1);
    assert_eq!(avatar.scene().ledger().geometries, 1);

    let events = avatar.take_events();
    assert_eq!(events[0], AvatarEvent::PlaybackStarted { request, key: "hi".to_string() });
    assert_eq!(finished(&events), vec![(request, PlaybackOutcome::Completed)]);
    assert!(events.contains(&AvatarEvent::EmotionChanged(Emotion::Happy)));
}

#[test]
#[wasm_bindgen_test]
fn test_backstop_saturates_for_very_long_clips() {
    let mut avatar = ready(config());
    let (outcomes, options) = recorder();
    avatar.play_external("rest", Emotion::Neutral, options);

    // 4.3 million seconds in milliseconds does not fit in a u32
    serve(&mut avatar, &[("rest", 4_300_000.0)]);
    assert_eq!(avatar.render_state(), RenderState::ExternalVisible);

    let events = run_serving(&mut avatar, 30, &[]);
    assert_eq!(avatar.render_state(), RenderState::ExternalVisible);
    assert!(finished(&events).is_empty());
    assert!(outcomes.borrow().is_empty());
}

#[test]
#[wasm_bindgen_test]
fn test_external_clip_never_moves_the_root() {
    let mut avatar = ready(config());
    avatar.play_external("no", Emotion::Neutral, PlayOptions::default());
    serve(&mut avatar, &[("no", 1.0)]);

    let mounted = avatar.external().mounted().unwrap();
    let clip = mounted.mixer.actions()[0].clip();
    assert!(!clip.has_channel(Channel::Position));
    assert!(clip.has_channel(Channel::Rotation));

    run(&mut avatar, 30);
    let model = avatar
        .scene()
        .get(avatar.external().mounted().unwrap().model)
        .unwrap();
    let hips = model.skeleton.bone("Hips").unwrap();
    assert_eq!(hips.local.translation, hips.rest.translation);
}

#[test]
#[wasm_bindgen_test]
fn test_superseded_load_is_discarded() {
    let mut avatar = ready(config());
    let (first, first_options) = recorder();
    let (second, second_options) = recorder();

    let a = avatar.play_external("hi", Emotion::Neutral, first_options);
    let b = avatar.play_external("no", Emotion::Sad, second_options);
    assert_eq!(avatar.take_load_requests().len(), 2);

    // The stale result lands first and must not reach the screen
    avatar.complete_load("hi", Ok(fixtures::external_asset("hi", 0.5)));
    assert_eq!(avatar.render_state(), RenderState::ExternalLoading);
    assert!(avatar.external().mounted().is_none());
    assert_exclusive(&avatar);

    avatar.complete_load("no", Ok(fixtures::external_asset("no", 0.5)));
    assert_eq!(avatar.external().mounted().unwrap().key, "no");

    run(&mut avatar, 60);
    assert!(first.borrow().is_empty());
    assert_eq!(*second.borrow(), vec![PlaybackOutcome::Completed]);
    assert_eq!(avatar.current_emotion(), Emotion::Sad);
    assert_eq!(
        finished(&avatar.take_events()),
        vec![(a, PlaybackOutcome::Superseded), (b, PlaybackOutcome::Completed)]
    );
    assert!(avatar.cache().contains("hi"));
}

#[test]
#[wasm_bindgen_test]
fn test_one_model_visible_under_random_requests() {
    let mut avatar = ready(config());
    let mut rng = StdRng::seed_from_u64(7);
    let durations = [("hi", 0.4), ("yes", 0.3), ("no", 0.6), ("rest", 0.5)];
    let mut pending: Vec<LoadRequest> = Vec::new();

    for _ in 0..900 {
        if rng.random_bool(0.05) {
            let (key, _) = durations[rng.random_range(0..durations.len())];
            avatar.play_external(key, Emotion::Neutral, PlayOptions::default());
            assert_exclusive(&avatar);
        }
        pending.extend(avatar.take_load_requests());
        if !pending.is_empty() && rng.random_bool(0.2) {
            let request = pending.swap_remove(rng.random_range(0..pending.len()));
            let (_, duration) = durations
                .iter()
                .find(|(key, _)| *key == request.key)
                .unwrap();
            let asset = fixtures::external_asset(&request.key, *duration);
            avatar.complete_load(&request.key, Ok(asset));
            assert_exclusive(&avatar);
        }
        avatar.tick(FRAME);
        assert_exclusive(&avatar);
        assert!(avatar.scene().len() <= 2);
    }
}

#[test]
#[wasm_bindgen_test]
fn test_completion_fires_once_with_backstop() {
    let mut config = config();
    config.timing.safety_buffer_ms = 0;
    let mut avatar = ready(config);
    let (outcomes, options) = recorder();
    avatar.play_external("yes", Emotion::Neutral, options);
    serve(&mut avatar, &[("yes", 0.5)]);

    run(&mut avatar, 90);
    assert_eq!(*outcomes.borrow(), vec![PlaybackOutcome::Completed]);
    assert_eq!(finished(&avatar.take_events()).len(), 1);
    assert!(avatar.timers.is_empty());
}

#[test]
#[wasm_bindgen_test]
fn test_cached_asset_mounts_a_fresh_instance() {
    let mut avatar = ready(config());
    avatar.play_external("hi", Emotion::Neutral, PlayOptions::default());
    serve(&mut avatar, &[("hi", 0.3)]);
    let first = avatar.external().mounted().unwrap().model;
    run(&mut avatar, 60);

    avatar.play_external("hi", Emotion::Neutral, PlayOptions::default());
    assert!(avatar.take_load_requests().is_empty());
    assert_eq!(avatar.render_state(), RenderState::ExternalVisible);
    let second = avatar.external().mounted().unwrap().model;
    assert_ne!(first, second);

    run(&mut avatar, 60);
    assert_eq!(avatar.scene().len(), 1);
}

#[test]
#[wasm_bindgen_test]
fn test_unknown_key_falls_back_to_base() {
    let mut avatar = ready(config());
    let (outcomes, options) = recorder();
    avatar.play_external("unknown-key", Emotion::Happy, options);

    let requests = avatar.take_load_requests();
    assert_eq!(requests[0].url, "http://localhost:8080/models/unknown-key.glb");
    avatar.complete_load(
        "unknown-key",
        Err(AssetLoadError::Http {
            url: requests[0].url.clone(),
            status: 404,
        }),
    );

    assert_eq!(avatar.render_state(), RenderState::BaseVisible);
    assert_eq!(avatar.current_emotion(), Emotion::Happy);
    assert!(matches!(
        outcomes.borrow().as_slice(),
        [PlaybackOutcome::LoadFailed(AssetLoadError::Http { status: 404, .. })]
    ));
    let events = avatar.take_events();
    assert!(!events.iter().any(|e| matches!(e, AvatarEvent::Error(_))));
    assert!(!avatar.cache().is_pending("unknown-key"));

    avatar.play_external("unknown-key", Emotion::Happy, PlayOptions::default());
    assert_eq!(avatar.take_load_requests().len(), 1);
}

#[test]
#[wasm_bindgen_test]
fn test_missing_clip_falls_back_to_base() {
    let mut avatar = ready(config());
    let (outcomes, options) = recorder();
    avatar.play_external("hi", Emotion::Sad, options.with_clip("Wave"));
    serve(&mut avatar, &[("hi", 0.5)]);

    assert_eq!(avatar.render_state(), RenderState::BaseVisible);
    assert_eq!(avatar.current_emotion(), Emotion::Sad);
    assert!(matches!(
        outcomes.borrow().as_slice(),
        [PlaybackOutcome::ClipMissing(_)]
    ));
}

#[test]
#[wasm_bindgen_test]
fn test_talking_loop_alternates_without_overlap() {
    let mut avatar = ready(config());
    let durations = [("talking 1", 0.4), ("talking 2", 0.3)];
    avatar.start_talking_loop_with(Emotion::Neutral).unwrap();
    assert!(avatar.start_talking_loop_with(Emotion::Neutral).is_none());

    let mut live: Option<RequestId> = None;
    let mut started = Vec::new();
    let mut models = HashSet::new();
    let mut loads = 0;

    for _ in 0..180 {
        loads += serve(&mut avatar, &durations);
        avatar.tick(FRAME);
        assert_exclusive(&avatar);
        for event in avatar.take_events() {
            match event {
                AvatarEvent::PlaybackStarted { request, key } => {
                    assert_eq!(live, None, "{key} started while another clip was live");
                    live = Some(request);
                    started.push(key);
                }
                AvatarEvent::PlaybackFinished { request, outcome, .. } => {
                    assert_eq!(live, Some(request));
                    assert_eq!(outcome, PlaybackOutcome::Completed);
                    live = None;
                }
                _ => {}
            }
        }
        if let Some(mounted) = avatar.external().mounted() {
            models.insert(mounted.model);
        }
        if !started.is_empty() {
            assert_ne!(avatar.render_state(), RenderState::BaseVisible);
        }
    }

    assert!(started.len() >= 4);
    for (i, key) in started.iter().enumerate() {
        let expected = if i % 2 == 0 { "talking 1" } else { "talking 2" };
        assert_eq!(key, expected);
    }
    assert_eq!(loads, 2);
    // Same family replays on the held model
    assert_eq!(models.len(), 1);
}

#[test]
#[wasm_bindgen_test]
fn test_stop_talking_lets_clip_finish() {
    let mut avatar = ready(config());
    let durations = [("talking 1", 0.4), ("talking 2", 0.3)];
    avatar.set_emotion("happy");
    avatar.start_talking_loop_with(Emotion::Neutral);
    serve(&mut avatar, &durations);
    run(&mut avatar, 12);
    assert_eq!(avatar.render_state(), RenderState::ExternalVisible);

    avatar.stop_talking_loop();
    run(&mut avatar, 3);
    assert_eq!(avatar.render_state(), RenderState::ExternalVisible);

    run(&mut avatar, 40);
    assert_eq!(avatar.render_state(), RenderState::BaseVisible);
    assert_eq!(avatar.current_emotion(), Emotion::Neutral);
    assert!(avatar.external().mounted().is_none());
    assert_eq!(avatar.scene().len(), 1);
    assert_eq!(avatar.scene().ledger().geometries, 1);
    assert!(!avatar.is_talking());
    assert!(avatar.take_load_requests().is_empty());
}

#[test]
#[wasm_bindgen_test]
fn test_stop_during_gap_returns_to_base() {
    let mut avatar = ready(config());
    avatar.start_talking_loop_with(Emotion::Thinking);
    serve(&mut avatar, &[("talking 1", 0.2)]);

    // Clip done, gap in progress
    run(&mut avatar, 15);
    assert!(avatar.external().session().unwrap().is_completed());
    assert_eq!(avatar.render_state(), RenderState::ExternalVisible);

    avatar.stop_talking_loop();
    run(&mut avatar, 10);
    assert_eq!(avatar.render_state(), RenderState::BaseVisible);
    assert_eq!(avatar.current_emotion(), Emotion::Thinking);
    assert!(avatar.take_load_requests().is_empty());
}

#[test]
#[wasm_bindgen_test]
fn test_host_playback_interrupts_talking_loop() {
    let mut avatar = ready(config());
    avatar.start_talking_loop_with(Emotion::Neutral);
    serve(&mut avatar, &[("talking 1", 0.5)]);
    run(&mut avatar, 6);

    avatar.play_external("yes", Emotion::Happy, PlayOptions::default());
    assert!(!avatar.talking_loop().is_active());
    serve(&mut avatar, &[("yes", 0.3)]);
    assert_eq!(avatar.external().mounted().unwrap().key, "yes");

    run(&mut avatar, 60);
    assert_eq!(avatar.render_state(), RenderState::BaseVisible);
    assert_eq!(avatar.current_emotion(), Emotion::Happy);
}

#[test]
#[wasm_bindgen_test]
fn test_speak_without_engine_drives_talking() {
    let mut avatar = ready(config());
    let durations = [("talking 1", 0.4), ("talking 2", 0.3)];
    avatar.speak("Hello there", Emotion::Neutral);
    assert_eq!(avatar.current_emotion(), Emotion::Talking);
    assert!(avatar.is_talking());

    let events = run_serving(&mut avatar, 60, &durations);
    assert_eq!(avatar.current_emotion(), Emotion::Talking);
    assert_ne!(avatar.render_state(), RenderState::BaseVisible);

    let mut events = events;
    events.extend(run_serving(&mut avatar, 150, &durations));
    assert_eq!(avatar.render_state(), RenderState::BaseVisible);
    assert_eq!(avatar.current_emotion(), Emotion::Neutral);
    assert!(!avatar.is_talking());

    let keys: HashSet<String> = events
        .into_iter()
        .filter_map(|e| match e {
            AvatarEvent::PlaybackStarted { key, .. } => Some(key),
            _ => None,
        })
        .collect();
    assert!(keys.contains("talking 1") && keys.contains("talking 2"));
}

#[test]
#[wasm_bindgen_test]
fn test_speech_engine_events_gate_on_utterance() {
    let mut avatar = ready(config());
    let durations = [("talking 1", 0.4), ("talking 2", 0.3)];
    let engine = RecordingEngine::default();
    let spoken = Rc::clone(&engine.spoken);
    let cancels = Rc::clone(&engine.cancels);
    avatar.set_speech_engine(Some(Box::new(engine)));
    assert_eq!(avatar.list_voices().len(), 1);

    let first = avatar.speak("First line", Emotion::Happy);
    assert_eq!(avatar.current_emotion(), Emotion::Neutral);
    avatar.on_speech_event(first, SpeechEvent::Start);
    assert_eq!(avatar.current_emotion(), Emotion::Talking);
    run_serving(&mut avatar, 12, &durations);

    let cancels_before = cancels.get();
    let second = avatar.speak("Second line", Emotion::Happy);
    assert!(cancels.get() > cancels_before);
    avatar.on_speech_event(second, SpeechEvent::Start);
    assert!(avatar.talking_loop().is_active());

    // Late end of the cancelled utterance
    avatar.on_speech_event(first, SpeechEvent::End);
    assert!(avatar.talking_loop().is_active());
    assert!(avatar.is_talking());

    avatar.on_speech_event(second, SpeechEvent::End);
    assert!(!avatar.talking_loop().is_active());
    run_serving(&mut avatar, 120, &durations);
    assert_eq!(avatar.render_state(), RenderState::BaseVisible);
    assert_eq!(avatar.current_emotion(), Emotion::Happy);

    let spoken = spoken.borrow();
    assert_eq!(spoken.len(), 2);
    assert_eq!(spoken[1], (second, "Second line".to_string()));
}

#[test]
#[wasm_bindgen_test]
fn test_speech_engine_failure_settles_to_baseline() {
    let mut avatar = ready(config());
    avatar.set_speech_engine(Some(Box::new(RecordingEngine {
        fail: true,
        ..RecordingEngine::default()
    })));
    avatar.speak("Hello", Emotion::Listening);
    assert!(!avatar.is_talking());
    assert!(avatar.take_load_requests().is_empty());

    run(&mut avatar, 45);
    assert_eq!(avatar.current_emotion(), Emotion::Listening);
}

#[test]
#[wasm_bindgen_test]
fn test_inactivity_plays_rest_animation() {
    let mut config = config();
    config.timing.inactivity_ms = 1000;
    let mut avatar = ready(config);

    run(&mut avatar, 54);
    assert!(avatar.take_load_requests().is_empty());
    avatar.notify_interaction();
    run(&mut avatar, 30);
    assert!(avatar.take_load_requests().is_empty());

    run(&mut avatar, 40);
    let requests = avatar.take_load_requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].key, "rest");
    assert_eq!(avatar.render_state(), RenderState::ExternalLoading);
}

#[test]
#[wasm_bindgen_test]
fn test_inactivity_waits_while_talking() {
    let mut config = config();
    config.timing.inactivity_ms = 500;
    let mut avatar = ready(config);
    avatar.start_talking_loop_with(Emotion::Neutral);

    for _ in 0..90 {
        for request in avatar.take_load_requests() {
            assert_ne!(request.key, "rest");
            avatar.complete_load(&request.key, Ok(fixtures::external_asset(&request.key, 0.3)));
        }
        avatar.tick(FRAME);
    }
    assert!(avatar.talking_loop().is_active());
}

#[test]
#[wasm_bindgen_test]
fn test_snapshot_tracks_visible_model() {
    let mut avatar = ready(config());
    avatar.resize(1600, 900);
    avatar.tick(FRAME);
    let snapshot = avatar.snapshot();
    assert_eq!(snapshot.visible_model, avatar.base_model());
    assert_eq!(snapshot.render_state, RenderState::BaseVisible);
    assert_eq!(snapshot.light_uniform, LightUniform::from(snapshot.lights));
    assert_eq!(snapshot.frame, 1);

    avatar.play_external("hi", Emotion::Neutral, PlayOptions::default());
    serve(&mut avatar, &[("hi", 0.5)]);
    let snapshot = avatar.snapshot();
    assert_eq!(
        snapshot.visible_model,
        avatar.external().mounted().map(|m| m.model)
    );
    assert!(snapshot.projection.to_cols_array().iter().all(|v| v.is_finite()));
}

#[test]
#[wasm_bindgen_test]
fn test_unknown_emotion_falls_back_to_neutral() {
    let mut avatar = ready(config());
    avatar.set_emotion("sad");
    avatar.set_emotion("furious");
    assert_eq!(avatar.current_emotion(), Emotion::Neutral);
    assert_eq!(
        avatar.take_events(),
        vec![
            AvatarEvent::EmotionChanged(Emotion::Sad),
            AvatarEvent::EmotionChanged(Emotion::Neutral),
        ]
    );
}
