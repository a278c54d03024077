//! Semantic orchestrator: turns transcripts into a frame-by-frame
//! choreography of the particle formation.
//!
//! [`SemanticOrchestrator`] owns every timed subsystem and is driven by a
//! single entry point, [`update`](SemanticOrchestrator::update), called once
//! per rendered frame.
//!
//! # Frame flow
//!
//! ```text
//! update(dt)
//!   ├─ drain transcript queue (FIFO)
//!   │    ├─ interim → silence reset, maybe loosening pulse
//!   │    └─ final   → classify → hold | morph | loosen
//!   ├─ poll remote coordinator (stale epochs already dropped)
//!   ├─ clock += dt
//!   ├─ advance loosening, transition (swap at Dissolve → Reform),
//!   │  hierarchy stager, anticipation drift, idle decay, abstraction lerp
//!   └─ compose overrides:
//!        idle < loosening < transition < anticipation < clear-on-arrival
//! ```
//!
//! Remote completions and transcripts both arrive over channels and are
//! applied here, on the frame thread; nothing outside `update` mutates the
//! choreography.

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;

use serde_json::json;

use crate::audio::AudioFeatureSource;
use crate::classify::{Classifier, HierarchyMapping, SemanticState};
use crate::config::ChoreoConfig;
use crate::remote::{RemoteOutcome, RemoteShapeCoordinator};
use crate::render::{Overrides, RenderTarget, ShapeTexture};
use crate::session::{
    log_guarded, EventLog, LogSessionLogger, MorphAction, SemanticEvent, SessionLogger,
};
use crate::transcript::{SpeechSource, Subscription, TranscriptEvent, TranscriptQueue, TranscriptSender};

use super::anticipation::AnticipationDrift;
use super::crystallize::AbstractionLerp;
use super::easing::lerp;
use super::hierarchy::{intensity_adjusted, HierarchyStager, StageCommit};
use super::idle::IdleDecay;
use super::loosening::{LooseningPulse, SilenceTracker};
use super::state::{Levels, TransitionPhase};
use super::transition::{MorphContent, PendingMorph, TransitionChoreographer};

/// Callback notified of every routed utterance.
pub type EventListener = Box<dyn FnMut(&SemanticEvent) + Send>;

// ---------------------------------------------------------------------------
// SemanticOrchestrator
// ---------------------------------------------------------------------------

/// Drives the speech → formation choreography.
///
/// ```rust
/// use std::sync::Arc;
/// use lumen_choreo::audio::FixedEnergy;
/// use lumen_choreo::choreo::{SemanticOrchestrator, TransitionPhase};
/// use lumen_choreo::classify::KeywordClassifier;
/// use lumen_choreo::config::ChoreoConfig;
/// use lumen_choreo::remote::RemoteShapeCoordinator;
/// use lumen_choreo::render::ConsoleTarget;
/// use lumen_choreo::transcript::TranscriptEvent;
///
/// let mut orchestrator = SemanticOrchestrator::new(
///     ChoreoConfig::default(),
///     Arc::new(KeywordClassifier::builtin()),
///     Box::new(ConsoleTarget::new()),
///     Arc::new(FixedEnergy(0.5)),
///     RemoteShapeCoordinator::local_only(),
/// );
///
/// orchestrator.enqueue(TranscriptEvent::final_text("a spinning cube", 0.0));
/// orchestrator.update(0.016);
/// assert_eq!(orchestrator.current_transition_phase(), TransitionPhase::Dissolve);
///
/// for _ in 0..120 {
///     orchestrator.update(0.016);
/// }
/// assert_eq!(orchestrator.current_target(), "cube");
/// ```
pub struct SemanticOrchestrator {
    config: ChoreoConfig,
    classifier: Arc<dyn Classifier>,
    render: Box<dyn RenderTarget + Send>,
    audio: Arc<dyn AudioFeatureSource>,
    logger: Arc<dyn SessionLogger>,
    remote: RemoteShapeCoordinator,

    queue: TranscriptQueue,
    subscription: Option<Subscription>,
    listeners: Vec<EventListener>,

    silence: SilenceTracker,
    loosening: LooseningPulse,
    transition: TransitionChoreographer,
    stager: HierarchyStager,
    anticipation: AnticipationDrift,
    idle: IdleDecay,
    abstraction: AbstractionLerp,

    overrides: Overrides,
    sentiment: Option<f32>,
    emotional_intensity: Option<f32>,
    /// Set for the frame in which a remote request resolved.
    clear_on_arrival: bool,
    /// Abstraction to crystallise toward when a remote shape lands.
    remote_abstraction: f32,

    current_target: String,
    last_state: Option<SemanticState>,
    last_action: Option<MorphAction>,
    events: EventLog,
    clock: f64,
    disposed: bool,
}

impl SemanticOrchestrator {
    pub fn new(
        config: ChoreoConfig,
        classifier: Arc<dyn Classifier>,
        render: Box<dyn RenderTarget + Send>,
        audio: Arc<dyn AudioFeatureSource>,
        remote: RemoteShapeCoordinator,
    ) -> Self {
        if !remote.is_available() {
            log::info!("orchestrator: no remote shape service; unknown words stay local");
        }

        let baseline = &config.baseline;
        Self {
            silence: SilenceTracker::new(config.routing.silence_gate_secs),
            loosening: LooseningPulse::new(config.loosening.clone()),
            transition: TransitionChoreographer::new(config.transition.clone(), baseline.spring),
            stager: HierarchyStager::new(config.hierarchy.clone()),
            anticipation: AnticipationDrift::new(config.anticipation.clone()),
            idle: IdleDecay::new(config.idle.clone(), baseline.spring, baseline.abstraction),
            abstraction: AbstractionLerp::new(config.crystallization.rate, baseline.abstraction),
            current_target: baseline.default_shape.clone(),
            remote_abstraction: baseline.abstraction,

            classifier,
            render,
            audio,
            logger: Arc::new(LogSessionLogger),
            remote,

            queue: TranscriptQueue::new(),
            subscription: None,
            listeners: Vec::new(),

            overrides: Overrides::default(),
            sentiment: None,
            emotional_intensity: None,
            clear_on_arrival: false,

            last_state: None,
            last_action: None,
            events: EventLog::new(),
            clock: 0.0,
            disposed: false,
            config,
        }
    }

    /// Replace the session logger.
    pub fn with_logger(mut self, logger: Arc<dyn SessionLogger>) -> Self {
        self.logger = logger;
        self
    }

    // -----------------------------------------------------------------------
    // Input
    // -----------------------------------------------------------------------

    /// Queue a transcript for the next frame.
    pub fn enqueue(&self, event: TranscriptEvent) {
        self.queue.enqueue(event);
    }

    /// A sender that can be moved to other threads or tasks.
    pub fn transcript_sender(&self) -> TranscriptSender {
        self.queue.sender()
    }

    /// Subscribe to `source`, replacing any previous subscription.
    pub fn attach_source(&mut self, source: &dyn SpeechSource) {
        if let Some(mut previous) = self.subscription.take() {
            previous.unsubscribe();
        }
        self.subscription = Some(source.subscribe(self.queue.sender()));
    }

    /// Register a callback for every routed utterance.
    pub fn on_event(&mut self, listener: impl FnMut(&SemanticEvent) + Send + 'static) {
        self.listeners.push(Box::new(listener));
    }

    // -----------------------------------------------------------------------
    // Frame tick
    // -----------------------------------------------------------------------

    /// Advance the choreography by `dt` seconds.
    pub fn update(&mut self, dt: f32) {
        if self.disposed {
            return;
        }
        let dt = if dt.is_finite() { dt.max(0.0) } else { 0.0 };
        self.clear_on_arrival = false;

        for event in self.queue.drain() {
            self.route(event);
        }
        if let Some(outcome) = self.remote.poll() {
            self.on_remote_outcome(outcome);
        }

        self.clock += f64::from(dt);
        self.advance(dt);
        self.compose_overrides();
    }

    /// Tear everything down.  Later calls to [`update`](Self::update) do
    /// nothing.
    pub fn dispose(&mut self) {
        if self.disposed {
            return;
        }
        if let Some(mut subscription) = self.subscription.take() {
            subscription.unsubscribe();
        }
        let dropped = self.queue.clear();

        self.transition.reset();
        self.stager.reset();
        self.anticipation.cancel();
        self.idle.cancel();
        self.loosening.reset();
        self.remote.reset();
        self.abstraction.reset(self.config.baseline.abstraction);

        self.sentiment = None;
        self.emotional_intensity = None;
        self.clear_on_arrival = false;
        self.overrides.clear();
        self.listeners.clear();
        self.disposed = true;

        log::info!("orchestrator: disposed ({dropped} queued transcripts dropped)");
    }

    // -----------------------------------------------------------------------
    // Routing
    // -----------------------------------------------------------------------

    fn route(&mut self, event: TranscriptEvent) {
        let text = event.text.trim();
        if text.is_empty() {
            if event.is_final {
                log::warn!("transcript: skipping empty final transcript");
            }
            return;
        }

        if self.silence.note(self.clock) {
            self.loosening.trigger();
        }
        if !event.is_final {
            return;
        }

        if self.idle.cancel() {
            log::debug!("idle: decay cancelled by speech");
        }

        let state = self.classifier.classify(text);
        let mapping = if state.dominant_word.is_empty() {
            None
        } else {
            self.classifier.lookup_hierarchy(&state.dominant_word)
        };

        let action = if state.confidence < self.config.routing.confidence_threshold {
            self.hold(&state);
            MorphAction::Hold
        } else if self.can_show(&state, mapping.as_ref()) {
            self.morph(&state, mapping);
            MorphAction::Morph
        } else {
            self.loosen(&state);
            MorphAction::Loosen
        };

        log::info!(
            "route: {:?} → {} (target {:?}, confidence {:.2})",
            text,
            action.label(),
            state.target,
            state.confidence
        );
        self.record(text, state, action);
    }

    fn can_show(&self, state: &SemanticState, mapping: Option<&HierarchyMapping>) -> bool {
        mapping.is_some()
            || (state.has_target() && self.render.has_local_target(&state.target))
            || (self.remote.is_available()
                && state.has_target()
                && !state.dominant_word.is_empty())
    }

    fn hold(&mut self, state: &SemanticState) {
        let routing = &self.config.routing;
        self.abstraction
            .drift_toward(state.abstraction_level, routing.hold_abstraction_step);
        let current = self.sentiment.unwrap_or(0.0);
        self.sentiment = Some(
            lerp(current, state.sentiment, routing.hold_sentiment_push).clamp(-1.0, 1.0),
        );
    }

    fn loosen(&mut self, state: &SemanticState) {
        self.abstraction
            .nudge_target(self.config.routing.loosen_abstraction_step);
        self.sentiment = Some(state.sentiment.clamp(-1.0, 1.0));
    }

    fn morph(&mut self, state: &SemanticState, mapping: Option<HierarchyMapping>) {
        let abstraction = intensity_adjusted(
            &self.config.hierarchy,
            state.abstraction_level,
            state.emotional_intensity,
        );
        self.sentiment = Some(state.sentiment.clamp(-1.0, 1.0));
        self.emotional_intensity = Some(state.emotional_intensity.clamp(0.0, 1.0));

        // Latest request wins: whatever the previous morph had running stops.
        self.stager.cancel();
        self.anticipation.cancel();
        self.remote.cancel();

        let local = state.has_target() && self.render.has_local_target(&state.target);
        let fallback = mapping
            .as_ref()
            .and_then(|m| m.final_stage())
            .map(|s| s.target.clone())
            .unwrap_or_else(|| self.config.baseline.default_shape.clone());
        let staged = mapping.is_some();
        if let Some(mapping) = mapping {
            self.stager.start(mapping, abstraction);
        }

        let requested = !local
            && !state.dominant_word.is_empty()
            && self.remote.request(&state.dominant_word, &fallback).is_some();

        let content = if requested {
            self.anticipation.start();
            self.remote_abstraction = abstraction;
            MorphContent::Remote { fallback }
        } else if staged {
            MorphContent::Staged
        } else if local {
            MorphContent::Local(state.target.clone())
        } else {
            MorphContent::Local(fallback)
        };

        let interrupted = self.transition.request(
            PendingMorph {
                state: state.clone(),
                content,
                abstraction,
            },
            self.audio.energy(),
        );
        if interrupted {
            log_guarded(
                &*self.logger,
                "transition_interrupted",
                &json!({ "target": state.target, "time": self.clock }),
            );
        }
    }

    fn record(&mut self, text: &str, state: SemanticState, action: MorphAction) {
        let event = SemanticEvent {
            timestamp: self.clock,
            text: text.to_string(),
            classification: state.clone(),
            action,
        };

        log_guarded(
            &*self.logger,
            "semantic_event",
            &json!({
                "time": event.timestamp,
                "text": event.text,
                "action": action.label(),
                "target": state.target,
                "confidence": state.confidence,
            }),
        );
        for listener in &mut self.listeners {
            if catch_unwind(AssertUnwindSafe(|| listener(&event))).is_err() {
                log::warn!("orchestrator: event listener panicked; continuing");
            }
        }

        self.events.push(event);
        self.last_state = Some(state);
        self.last_action = Some(action);
    }

    // -----------------------------------------------------------------------
    // Commits
    // -----------------------------------------------------------------------

    /// Commit the captured morph at the Dissolve → Reform boundary.
    fn execute_morph_swap(&mut self, pending: PendingMorph) {
        match pending.content {
            MorphContent::Local(name) => {
                self.stager.clear_label();
                self.commit_target(&name);
                self.abstraction.set_target(pending.abstraction);
            }
            MorphContent::Staged | MorphContent::Remote { .. } => {
                if let Some(stage) = self.stager.release() {
                    self.apply_stage(stage);
                }
            }
            MorphContent::Arrived { texture, label } => {
                self.commit_texture(&texture, &label);
                self.abstraction.set_target(pending.abstraction);
            }
            MorphContent::Failed { fallback } => {
                self.stager.clear_label();
                self.commit_target(&fallback);
                self.abstraction.set_target(pending.abstraction);
            }
        }
    }

    fn on_remote_outcome(&mut self, outcome: RemoteOutcome) {
        self.anticipation.cancel();
        self.stager.cancel();
        self.clear_on_arrival = true;

        if let RemoteOutcome::Failed { reason, fallback } = &outcome {
            log_guarded(
                &*self.logger,
                "remote_failed",
                &json!({ "fallback": fallback, "reason": reason }),
            );
        }

        // Before the swap the result rides along with the pending morph.
        if let Some(pending) = self.transition.pending_mut() {
            if matches!(pending.content, MorphContent::Remote { .. }) {
                pending.content = match outcome {
                    RemoteOutcome::Arrived { texture, label } => {
                        MorphContent::Arrived { texture, label }
                    }
                    RemoteOutcome::Failed { fallback, .. } => MorphContent::Failed { fallback },
                };
                return;
            }
        }

        match outcome {
            RemoteOutcome::Arrived { texture, label } => self.commit_texture(&texture, &label),
            RemoteOutcome::Failed { fallback, .. } => {
                self.stager.clear_label();
                self.commit_target(&fallback);
            }
        }
        self.abstraction.set_target(self.remote_abstraction);
    }

    fn apply_stage(&mut self, stage: StageCommit) {
        self.commit_target(&stage.target);
        self.abstraction.set_target(stage.abstraction);
    }

    fn commit_target(&mut self, name: &str) {
        log::info!("render: target → {name}");
        self.render.set_target(name);
        self.current_target = name.to_string();
        log_guarded(
            &*self.logger,
            "target",
            &json!({ "target": name, "time": self.clock }),
        );
    }

    fn commit_texture(&mut self, texture: &ShapeTexture, label: &str) {
        log::info!(
            "render: generated target → {label} ({} points)",
            texture.point_count()
        );
        self.stager.clear_label();
        self.render.set_target_texture(texture, label);
        self.current_target = label.to_string();
        log_guarded(
            &*self.logger,
            "target",
            &json!({ "target": label, "generated": true, "time": self.clock }),
        );
    }

    // -----------------------------------------------------------------------
    // Continuous subsystems
    // -----------------------------------------------------------------------

    fn advance(&mut self, dt: f32) {
        self.loosening.advance(dt);

        if let Some(pending) = self.transition.advance(dt) {
            self.execute_morph_swap(pending);
        }
        if let Some(stage) = self.stager.advance(dt) {
            self.apply_stage(stage);
        }
        self.anticipation.advance(dt);

        if let Some(frame) = self.idle.advance(dt) {
            self.abstraction.set_target(frame.abstraction);
            if frame.finished {
                let default_shape = self.config.baseline.default_shape.clone();
                self.stager.clear_label();
                self.commit_target(&default_shape);
            }
        }
        let at_default = self.current_target == self.config.baseline.default_shape;
        let spring = self.overrides.spring.unwrap_or(self.config.baseline.spring);
        self.idle.check(
            self.silence.silence(self.clock),
            at_default,
            spring,
            self.abstraction.current(),
        );

        self.abstraction.advance(dt);
    }

    fn compose_overrides(&mut self) {
        let levels = if self.clear_on_arrival {
            Levels::NONE
        } else {
            self.idle
                .levels()
                .layer(self.loosening.levels())
                .layer(self.transition.levels())
                .layer(self.anticipation.levels())
        };

        let abstraction = if self.anticipation.is_active() {
            Some((self.abstraction.current() + self.anticipation.abstraction_nudge()).clamp(0.0, 1.0))
        } else {
            self.abstraction.override_value()
        };

        self.overrides = Overrides {
            spring: levels.spring,
            noise: levels.noise,
            abstraction,
            sentiment: self.sentiment,
            emotional_intensity: self.emotional_intensity,
        };
    }

    // -----------------------------------------------------------------------
    // Observers
    // -----------------------------------------------------------------------

    /// Override values for the render layer, as of the last frame.
    pub fn overrides(&self) -> Overrides {
        self.overrides
    }

    pub fn event_log(&self) -> &[SemanticEvent] {
        self.events.events()
    }

    /// The whole event log, for session export.
    pub fn events(&self) -> &EventLog {
        &self.events
    }

    pub fn last_state(&self) -> Option<&SemanticState> {
        self.last_state.as_ref()
    }

    pub fn last_action(&self) -> Option<MorphAction> {
        self.last_action
    }

    /// Crystallised abstraction level (before any anticipation nudge).
    pub fn current_abstraction(&self) -> f32 {
        self.abstraction.current()
    }

    pub fn current_hierarchy_label(&self) -> Option<&str> {
        self.stager.current_label()
    }

    pub fn current_transition_phase(&self) -> TransitionPhase {
        self.transition.phase()
    }

    /// Name (or generated label) of the shape last committed.
    pub fn current_target(&self) -> &str {
        &self.current_target
    }

    /// `true` while a transition runs or a remote shape is outstanding.
    pub fn is_processing(&self) -> bool {
        self.transition.phase().is_busy() || self.remote.is_pending()
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed
    }

    /// Seconds of `update` time since construction.
    pub fn session_time(&self) -> f64 {
        self.clock
    }
}

impl Drop for SemanticOrchestrator {
    fn drop(&mut self) {
        self.dispose();
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::sync::Mutex;

    use tokio::runtime::Handle;
    use tokio::sync::Notify;

    use crate::audio::FixedEnergy;
    use crate::classify::KeywordClassifier;
    use crate::remote::coordinator::tests::{settle, ScriptedService};
    use crate::render::PROCEDURAL_SHAPES;
    use crate::session::MemorySessionLogger;

    const FRAME: f32 = 0.016;

    // -----------------------------------------------------------------------
    // Test doubles
    // -----------------------------------------------------------------------

    /// Records every target call as a string; textures as `texture:<label>`.
    #[derive(Clone, Default)]
    struct RecordingTarget {
        calls: Arc<Mutex<Vec<String>>>,
    }

    impl RecordingTarget {
        fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }
    }

    impl RenderTarget for RecordingTarget {
        fn set_target(&mut self, name: &str) {
            self.calls.lock().unwrap().push(name.to_string());
        }

        fn set_target_texture(&mut self, _data: &ShapeTexture, label: &str) {
            self.calls.lock().unwrap().push(format!("texture:{label}"));
        }

        fn has_local_target(&self, name: &str) -> bool {
            PROCEDURAL_SHAPES.contains(&name)
        }
    }

    fn build(
        energy: f32,
        remote: RemoteShapeCoordinator,
    ) -> (SemanticOrchestrator, RecordingTarget) {
        let target = RecordingTarget::default();
        let o = SemanticOrchestrator::new(
            ChoreoConfig::default(),
            Arc::new(KeywordClassifier::builtin()),
            Box::new(target.clone()),
            Arc::new(FixedEnergy(energy)),
            remote,
        );
        (o, target)
    }

    fn local() -> (SemanticOrchestrator, RecordingTarget) {
        build(0.5, RemoteShapeCoordinator::local_only())
    }

    fn with_service(service: ScriptedService) -> (SemanticOrchestrator, RecordingTarget) {
        build(
            0.5,
            RemoteShapeCoordinator::new(Arc::new(service), Handle::current()),
        )
    }

    fn say(o: &SemanticOrchestrator, text: &str) {
        o.enqueue(TranscriptEvent::final_text(text, 0.0));
    }

    fn frames(o: &mut SemanticOrchestrator, n: usize) {
        for _ in 0..n {
            o.update(FRAME);
        }
    }

    // -----------------------------------------------------------------------
    // Routing
    // -----------------------------------------------------------------------

    #[test]
    fn interim_transcripts_never_swap_the_target() {
        let (mut o, target) = local();
        o.enqueue(TranscriptEvent::interim("cube", 0.0));
        frames(&mut o, 60);

        assert!(target.calls().is_empty());
        assert!(o.event_log().is_empty());
        assert_eq!(o.current_transition_phase(), TransitionPhase::Idle);
        assert_eq!(o.loosening.count(), 1);
    }

    #[test]
    fn interim_pulse_sets_noise_only() {
        let (mut o, _) = local();
        o.enqueue(TranscriptEvent::interim("hel", 0.0));
        o.update(FRAME);
        assert_eq!(o.overrides().noise, Some(0.8));
        assert_eq!(o.overrides().spring, None);

        frames(&mut o, 25);
        assert_eq!(o.overrides().noise, None);
    }

    #[test]
    fn empty_final_transcript_changes_nothing() {
        let (mut o, target) = local();
        say(&o, "   ");
        o.update(FRAME);

        assert!(o.event_log().is_empty());
        assert_eq!(o.loosening.count(), 0);
        assert!(target.calls().is_empty());
        assert!(o.overrides().is_clear());
    }

    #[test]
    fn transcripts_are_processed_in_arrival_order() {
        let (mut o, target) = local();
        say(&o, "cube");
        say(&o, "torus ring");
        say(&o, "star");
        o.update(FRAME);

        let texts: Vec<&str> = o.event_log().iter().map(|e| e.text.as_str()).collect();
        assert_eq!(texts, ["cube", "torus ring", "star"]);

        frames(&mut o, 120);
        assert_eq!(target.calls(), ["star"]);
    }

    #[test]
    fn low_confidence_holds() {
        let (mut o, target) = local();
        say(&o, "the quick brown fox jumps over everything today");
        frames(&mut o, 30);

        assert_eq!(o.last_action(), Some(MorphAction::Hold));
        assert_eq!(o.current_transition_phase(), TransitionPhase::Idle);
        assert!(target.calls().is_empty());
        assert!(o.overrides().sentiment.is_some());
        assert!(o.overrides().abstraction.is_some());
    }

    #[test]
    fn confident_but_shapeless_loosens() {
        let (mut o, target) = local();
        say(&o, "so happy");
        o.update(FRAME);

        assert_eq!(o.last_action(), Some(MorphAction::Loosen));
        assert!((o.abstraction.target() - 0.65).abs() < 1e-6);
        assert!(o.overrides().sentiment.unwrap() > 0.0);
        assert!(target.calls().is_empty());
    }

    #[tokio::test]
    async fn feeling_without_a_noun_loosens_even_with_remote() {
        let (mut o, target) = with_service(ScriptedService {
            hang: true,
            ..ScriptedService::default()
        });
        say(&o, "I really love these wonderful giant purple things");
        o.update(FRAME);

        let state = o.last_state().unwrap();
        assert!(!state.has_target());
        assert!(state.confidence >= 0.5);
        assert_eq!(o.last_action(), Some(MorphAction::Loosen));
        assert!(!o.remote.is_pending());
        assert!(!o.anticipation.is_active());
        assert_eq!(o.current_transition_phase(), TransitionPhase::Idle);
        assert!(target.calls().is_empty());
    }

    #[test]
    fn unknown_word_without_remote_loosens() {
        let (mut o, _) = local();
        say(&o, "giraffe");
        o.update(FRAME);
        assert_eq!(o.last_action(), Some(MorphAction::Loosen));
        assert!(!o.is_processing());
    }

    // -----------------------------------------------------------------------
    // Transitions
    // -----------------------------------------------------------------------

    #[test]
    fn local_morph_swaps_at_end_of_dissolve() {
        let (mut o, target) = local();
        say(&o, "cube");
        frames(&mut o, 18);
        assert_eq!(o.current_transition_phase(), TransitionPhase::Dissolve);
        assert!(target.calls().is_empty());
        assert!(o.is_processing());

        frames(&mut o, 2);
        assert_eq!(o.current_transition_phase(), TransitionPhase::Reform);
        assert_eq!(target.calls(), ["cube"]);
        assert_eq!(o.current_target(), "cube");
    }

    #[test]
    fn idle_without_effects_defers_spring_and_noise() {
        let (mut o, _) = local();
        say(&o, "cube");
        frames(&mut o, 150);

        assert_eq!(o.current_transition_phase(), TransitionPhase::Idle);
        assert_eq!(o.overrides().spring, None);
        assert_eq!(o.overrides().noise, None);
        assert!(!o.is_processing());
    }

    #[test]
    fn high_energy_shortens_durations() {
        let (mut o, _) = build(1.0, RemoteShapeCoordinator::local_only());
        say(&o, "cube");
        o.update(FRAME);
        assert!((o.transition.durations().dissolve - 0.15).abs() < 1e-6);

        let (mut quiet, _) = build(0.0, RemoteShapeCoordinator::local_only());
        say(&quiet, "cube");
        quiet.update(FRAME);
        assert!((quiet.transition.durations().dissolve - 0.45).abs() < 1e-6);
    }

    #[test]
    fn interruption_restarts_dissolve() {
        let (mut o, target) = local();
        say(&o, "cube");
        frames(&mut o, 30);
        assert_eq!(o.current_transition_phase(), TransitionPhase::Reform);

        say(&o, "torus");
        o.update(FRAME);
        assert_eq!(o.current_transition_phase(), TransitionPhase::Dissolve);
        assert!((o.transition.elapsed() - FRAME).abs() < 1e-6);

        frames(&mut o, 150);
        assert_eq!(target.calls(), ["cube", "torus"]);
    }

    #[test]
    fn rapid_interruptions_commit_only_the_latest() {
        let (mut o, target) = local();
        for word in ["cube", "torus", "star", "heart"] {
            say(&o, word);
            frames(&mut o, 5);
        }
        frames(&mut o, 150);
        assert_eq!(target.calls(), ["heart"]);
    }

    #[test]
    fn horse_traverses_its_hierarchy() {
        let (mut o, target) = local();
        say(&o, "horse");

        frames(&mut o, 18);
        assert!(target.calls().is_empty());

        frames(&mut o, 2); // ≈0.32 s
        assert_eq!(o.current_transition_phase(), TransitionPhase::Reform);
        assert_eq!(target.calls(), ["sphere"]);
        assert_eq!(o.current_hierarchy_label(), Some("sphere"));

        frames(&mut o, 80); // ≈1.6 s
        assert_eq!(target.calls(), ["sphere", "humanoid", "quadruped"]);
        assert_eq!(o.current_hierarchy_label(), Some("horse"));
        assert!(matches!(
            o.current_transition_phase(),
            TransitionPhase::Settle | TransitionPhase::Idle
        ));
    }

    // -----------------------------------------------------------------------
    // Loosening
    // -----------------------------------------------------------------------

    #[test]
    fn loosening_needs_a_real_pause() {
        let (mut o, _) = local();
        say(&o, "cube");
        o.update(FRAME);
        assert_eq!(o.loosening.count(), 1);

        frames(&mut o, 62); // ≈1.0 s
        say(&o, "torus");
        o.update(FRAME);
        assert_eq!(o.loosening.count(), 1);

        frames(&mut o, 200); // > 2 s of silence
        say(&o, "star");
        o.update(FRAME);
        assert_eq!(o.loosening.count(), 2);
    }

    // -----------------------------------------------------------------------
    // Idle decay
    // -----------------------------------------------------------------------

    #[test]
    fn long_silence_decays_to_default_shape() {
        let (mut o, target) = local();
        say(&o, "cube");
        frames(&mut o, 150);
        assert_eq!(o.current_target(), "cube");

        o.update(301.0);
        assert!(o.idle.is_active());
        assert!(o.overrides().spring.is_some());

        frames(&mut o, 1950); // ≈31 s
        assert!(!o.idle.is_active());
        assert_eq!(o.current_target(), "sphere");
        assert_eq!(target.calls().last().map(String::as_str), Some("sphere"));
        assert_eq!(o.overrides().spring, None);

        o.update(400.0);
        assert!(!o.idle.is_active());
    }

    #[test]
    fn idle_decay_skips_default_shape() {
        let (mut o, _) = local();
        o.update(301.0);
        o.update(FRAME);
        assert!(!o.idle.is_active());
    }

    #[test]
    fn speech_cancels_idle_decay() {
        let (mut o, _) = local();
        say(&o, "cube");
        frames(&mut o, 150);
        o.update(301.0);
        frames(&mut o, 60);
        assert!(o.idle.is_active());

        say(&o, "so happy");
        o.update(FRAME);
        assert!(!o.idle.is_active());
        assert_eq!(o.overrides().spring, None);
    }

    // -----------------------------------------------------------------------
    // Remote shapes
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn remote_failure_falls_back_and_cancels_effects() {
        let (mut o, target) = with_service(ScriptedService {
            failing: vec!["horse".into()],
            ..ScriptedService::default()
        });
        say(&o, "horse");
        o.update(FRAME);
        assert!(o.anticipation.is_active());
        assert!(o.stager.is_active());
        assert!(o.is_processing());

        settle().await;
        o.update(FRAME);
        assert!(!o.anticipation.is_active());
        assert!(!o.stager.is_active());
        assert_eq!(o.overrides().spring, None);
        assert_eq!(o.overrides().noise, None);

        frames(&mut o, 120);
        assert_eq!(target.calls(), ["quadruped"]);
        assert_eq!(o.current_hierarchy_label(), None);
    }

    #[tokio::test]
    async fn anticipation_owns_spring_while_waiting() {
        let (mut o, _) = with_service(ScriptedService {
            hang: true,
            ..ScriptedService::default()
        });
        say(&o, "giraffe");
        frames(&mut o, 5);

        assert_eq!(o.last_action(), Some(MorphAction::Morph));
        let spring = o.overrides().spring.unwrap();
        assert!(spring < 0.31);

        frames(&mut o, 150);
        assert_eq!(o.current_transition_phase(), TransitionPhase::Idle);
        assert!(o.is_processing());
        assert!(o.overrides().spring.is_some());
        assert!(o.overrides().abstraction.is_some());
    }

    #[tokio::test]
    async fn arrival_after_swap_commits_immediately() {
        let gate = Arc::new(Notify::new());
        let mut gates = HashMap::new();
        gates.insert("giraffe".to_string(), Arc::clone(&gate));
        let (mut o, target) = with_service(ScriptedService {
            gates,
            ..ScriptedService::default()
        });

        say(&o, "giraffe");
        frames(&mut o, 40);
        assert!(o.transition.phase().is_busy());
        assert!(target.calls().is_empty());

        gate.notify_one();
        settle().await;
        o.update(FRAME);
        assert_eq!(target.calls(), ["texture:giraffe"]);
        assert_eq!(o.current_target(), "giraffe");
        assert_eq!(o.overrides().spring, None);
        assert!(!o.anticipation.is_active());
    }

    #[tokio::test]
    async fn arrival_before_swap_waits_for_reform() {
        let (mut o, target) = with_service(ScriptedService::default());
        say(&o, "horse");
        o.update(FRAME);
        settle().await;
        o.update(FRAME);
        assert!(target.calls().is_empty());

        frames(&mut o, 120);
        assert_eq!(target.calls(), ["texture:horse"]);
    }

    #[tokio::test]
    async fn superseded_remote_shape_is_ignored() {
        let gate = Arc::new(Notify::new());
        let mut gates = HashMap::new();
        gates.insert("giraffe".to_string(), Arc::clone(&gate));
        let (mut o, target) = with_service(ScriptedService {
            gates,
            ..ScriptedService::default()
        });

        say(&o, "giraffe");
        o.update(FRAME);
        say(&o, "lantern");
        o.update(FRAME);

        gate.notify_one();
        settle().await;
        frames(&mut o, 120);

        let calls = target.calls();
        assert!(calls.contains(&"texture:lantern".to_string()));
        assert!(!calls.contains(&"texture:giraffe".to_string()));
    }

    #[tokio::test]
    async fn local_morph_cancels_outstanding_request() {
        let (mut o, target) = with_service(ScriptedService {
            hang: true,
            ..ScriptedService::default()
        });
        say(&o, "giraffe");
        o.update(FRAME);
        say(&o, "cube");
        o.update(FRAME);

        assert!(!o.anticipation.is_active());
        assert!(!o.remote.is_pending());
        frames(&mut o, 150);
        assert_eq!(target.calls(), ["cube"]);
        assert!(!o.is_processing());
    }

    // -----------------------------------------------------------------------
    // Observers and teardown
    // -----------------------------------------------------------------------

    #[test]
    fn dispose_mid_dissolve_clears_everything() {
        let (mut o, target) = local();
        say(&o, "heart");
        o.update(FRAME);
        assert_eq!(o.current_transition_phase(), TransitionPhase::Dissolve);
        assert!(!o.overrides().is_clear());

        o.dispose();
        assert!(o.overrides().is_clear());
        assert!(o.is_disposed());
        assert_eq!(o.current_transition_phase(), TransitionPhase::Idle);

        say(&o, "cube");
        frames(&mut o, 120);
        assert!(o.overrides().is_clear());
        assert!(target.calls().is_empty());
        assert_eq!(o.event_log().len(), 1);
    }

    #[test]
    fn events_reach_listeners_and_logger() {
        let logger = Arc::new(MemorySessionLogger::new());
        let (o, _) = local();
        let mut o = o.with_logger(logger.clone());

        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        o.on_event(move |e| sink.lock().unwrap().push(e.action));

        say(&o, "cube");
        say(&o, "so happy");
        o.update(FRAME);

        assert_eq!(*seen.lock().unwrap(), [MorphAction::Morph, MorphAction::Loosen]);
        assert_eq!(logger.category("semantic_event").len(), 2);
        assert_eq!(o.event_log()[0].classification.target, "cube");
    }

    #[test]
    fn panicking_listener_does_not_abort_the_frame() {
        let (mut o, target) = local();
        o.on_event(|_| panic!("listener bug"));
        say(&o, "cube");
        o.update(FRAME);
        frames(&mut o, 30);

        assert_eq!(o.event_log().len(), 1);
        assert_eq!(target.calls(), ["cube"]);
    }

    #[test]
    fn session_time_follows_updates() {
        let (mut o, _) = local();
        o.update(0.5);
        o.update(0.25);
        o.update(f32::NAN);
        o.update(-1.0);
        assert!((o.session_time() - 0.75).abs() < 1e-9);
    }

    #[test]
    fn sender_works_from_another_thread() {
        let (mut o, target) = local();
        let sender = o.transcript_sender();
        std::thread::spawn(move || {
            sender.enqueue(TranscriptEvent::final_text("star", 0.0));
        })
        .join()
        .unwrap();

        frames(&mut o, 120);
        assert_eq!(target.calls(), ["star"]);
    }
}
