//! Dashboard state - everything the operator sees, minus the drawing.
//!
//! The dashboard owns working copies of the case fixtures, the phase timer,
//! the transient notice, media fallback flags and the briefing (speech)
//! state. All timing reads the injected [`Clock`]; the UI loop calls
//! [`Dashboard::tick`] on every frame.


use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::case::{Case, CaseBook, CasePatch, MissionScript};
use crate::clock::Clock;
use crate::config::{AssetsConfig, TimingConfig};
use crate::media::{MediaError, MediaFlags, MediaLibrary, MediaSlot, ThumbnailManager};
use crate::notice::Notice;
use crate::phase::{Outcome, Phase, PhaseEvent, PhaseState, PhaseTimer};
use crate::speech::{AudioClip, Playback, SpeechController, SpeechError, SpeechOutcome};

/// Shown when negotiation is requested without a confirmed threat
pub const NEGOTIATION_LOCKED_MESSAGE: &str = "NEGOTIATION UNAVAILABLE - NO CONFIRMED THREAT";

/// Primary panel content
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum View {
    Drone,
    Map,
    Summary,
}

impl View {
    pub const ALL: [View; 3] = [View::Drone, View::Map, View::Summary];

    /// Button label
    pub fn label(self) -> &'static str {
        match self {
            View::Drone => "Drone View",
            View::Map => "Map",
            View::Summary => "AI Summary",
        }
    }

    /// Panel title
    pub fn title(self) -> &'static str {
        match self {
            View::Drone => "DRONE FEED",
            View::Map => "MISSION MAP",
            View::Summary => "AI SUMMARY",
        }
    }

    /// Panel tag shown opposite the title
    pub fn tag(self) -> &'static str {
        match self {
            View::Drone => "LIVE",
            View::Map => "TACTICAL",
            View::Summary => "INTEL",
        }
    }
}

pub struct Dashboard {
    /// Immutable fixtures
    book: CaseBook,
    /// Working copies, same order as `book`
    cases: Vec<Case>,
    selected: u32,
    view: View,
    timer: PhaseTimer,
    notice: Notice,
    media: MediaFlags,
    /// Media needs probing after a view, phase or case change
    media_dirty: bool,
    speech: SpeechController,
    player: Box<dyn Playback>,
    briefing_error: Option<String>,
    /// Last synthesized briefing
    clip: Option<AudioClip>,
    clock: Arc<dyn Clock>,
    started_at: Instant,
    rotation: Option<Duration>,
    last_rotation: Instant,
}

impl Dashboard {
    pub fn new(
        book: CaseBook,
        timing: &TimingConfig,
        speech: SpeechController,
        player: Box<dyn Playback>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let now = clock.now();
        let first = book.first().id;
        let cases = book.cases().to_vec();

        let mut dashboard = Self {
            book,
            cases,
            selected: first,
            view: View::Drone,
            timer: PhaseTimer::new(),
            notice: Notice::new(timing.notice_duration()),
            media: MediaFlags::default(),
            media_dirty: true,
            speech,
            player,
            briefing_error: None,
            clip: None,
            clock,
            started_at: now,
            rotation: timing.rotation_interval(),
            last_rotation: now,
        };
        dashboard.select_case(first);
        dashboard
    }

    // ---------------------------------------------------------------------
    // Case selection
    // ---------------------------------------------------------------------

    /// Select a case and reset everything derived from it to the fixture.
    /// Unknown ids are ignored.
    pub fn select_case(&mut self, id: u32) -> bool {
        let Some(fixture) = self.book.get(id).cloned() else {
            tracing::debug!("Ignoring selection of unknown case {}", id);
            return false;
        };

        let now = self.clock.now();
        self.speech.cancel();
        self.briefing_error = None;

        if let Some(slot) = self.cases.iter_mut().find(|c| c.id == id) {
            *slot = fixture.clone();
        }
        self.selected = id;
        self.view = View::Drone;
        self.notice.clear();
        self.media.clear();
        self.media_dirty = true;
        self.last_rotation = now;

        let outcome = match fixture.script {
            Some(ref script) => self.timer.launch(
                script.trip_secs,
                Duration::from_secs(script.detection_delay_secs),
                now,
            ),
            None => self.timer.stand_down(now),
        };
        self.handle_outcome(outcome);

        tracing::info!(
            case_id = id,
            mission = %fixture.mission,
            phase = %self.timer.phase(),
            "Case selected"
        );
        true
    }

    pub fn next_case(&mut self) {
        let id = self.book.next_id(self.selected);
        self.select_case(id);
    }

    pub fn previous_case(&mut self) {
        let id = self.book.previous_id(self.selected);
        self.select_case(id);
    }

    /// Working copy of the selected case
    pub fn active_case(&self) -> &Case {
        self.cases
            .iter()
            .find(|c| c.id == self.selected)
            .unwrap_or_else(|| self.book.first())
    }

    pub fn selected_id(&self) -> u32 {
        self.selected
    }

    pub fn cases(&self) -> &[Case] {
        &self.cases
    }

    // ---------------------------------------------------------------------
    // Views
    // ---------------------------------------------------------------------

    pub fn view(&self) -> View {
        self.view
    }

    /// Switch the primary panel. Entering the map retries its asset.
    pub fn set_view(&mut self, view: View) {
        if view == View::Map {
            self.media.recover(&MediaSlot::Map);
        }
        if view != self.view {
            tracing::debug!("View {:?} -> {:?}", self.view, view);
        }
        self.view = view;
        self.media_dirty = true;
    }

    // ---------------------------------------------------------------------
    // Phase
    // ---------------------------------------------------------------------

    pub fn phase_state(&self) -> PhaseState {
        self.timer.state()
    }

    pub fn phase(&self) -> Phase {
        self.timer.phase()
    }

    pub fn negotiation_unlocked(&self) -> bool {
        self.timer.state().negotiation_unlocked()
    }

    /// Operator override. `EnRoute` restarts the trip (an unscripted case
    /// has no trip and lands straight in `Scanning`), `Scanning` confirms
    /// detection on the spot, `Idle` stands the drone down. `Negotiation`
    /// goes through the same gate as [`Dashboard::request_negotiation`].
    pub fn force_phase(&mut self, phase: Phase) -> Outcome {
        let now = self.clock.now();
        let outcome = match phase {
            Phase::Idle => self.timer.stand_down(now),
            Phase::EnRoute => match self.script() {
                Some(script) => {
                    let (trip, delay) = (script.trip_secs, script.detection_delay_secs);
                    self.timer.launch(trip, Duration::from_secs(delay), now)
                }
                None => self.timer.arrive(now),
            },
            Phase::Scanning => self.timer.apply(PhaseEvent::ForceScanning, now),
            Phase::Negotiation => return self.request_negotiation(),
        };

        tracing::info!(?phase, ?outcome, "Phase override");
        self.media.recover(&MediaSlot::DroneFeed);
        self.media_dirty = true;
        self.handle_outcome(outcome);
        outcome
    }

    /// Open the negotiation channel if a threat is confirmed, otherwise
    /// post a notice and leave the phase alone
    pub fn request_negotiation(&mut self) -> Outcome {
        let now = self.clock.now();
        let outcome = self.timer.apply(PhaseEvent::RequestNegotiation, now);
        match outcome {
            Outcome::Rejected(_) => {
                tracing::debug!(phase = %self.timer.phase(), "Negotiation locked");
                self.notice.post(NEGOTIATION_LOCKED_MESSAGE, now);
            }
            _ => self.notice.clear(),
        }
        self.handle_outcome(outcome);
        outcome
    }

    fn script(&self) -> Option<&MissionScript> {
        self.book.get(self.selected).and_then(|c| c.script.as_ref())
    }

    /// Apply the side effects of a phase transition to the working case
    fn handle_outcome(&mut self, outcome: Outcome) {
        let patch: Option<CasePatch> = match outcome {
            Outcome::Entered(phase) => {
                tracing::info!(case_id = self.selected, %phase, "Phase entered");
                self.media.recover(&MediaSlot::DroneFeed);
                self.media_dirty = true;
                match phase {
                    Phase::EnRoute => self.script().and_then(|s| s.en_route.clone()),
                    Phase::Scanning if self.timer.state().detected => {
                        self.script().and_then(|s| s.scanning.clone())
                    }
                    Phase::Negotiation => self.script().and_then(|s| s.negotiation_patch().cloned()),
                    Phase::Scanning | Phase::Idle => None,
                }
            }
            Outcome::Detected => {
                tracing::info!(case_id = self.selected, "Weapon detected");
                self.script().and_then(|s| s.scanning.clone())
            }
            Outcome::Ticked | Outcome::Unchanged | Outcome::Rejected(_) => None,
        };

        if let Some(patch) = patch {
            let selected = self.selected;
            if let Some(case) = self.cases.iter_mut().find(|c| c.id == selected) {
                if patch.apply(case) {
                    tracing::debug!(case_id = selected, "Case data updated by mission script");
                    self.media_dirty = true;
                }
            }
        }
    }

    // ---------------------------------------------------------------------
    // Notice
    // ---------------------------------------------------------------------

    pub fn notice(&self) -> Option<&str> {
        self.notice.message()
    }

    // ---------------------------------------------------------------------
    // Briefing
    // ---------------------------------------------------------------------

    /// Synthesize the active summary. Ignored while a briefing is running.
    pub fn read_briefing(&mut self) {
        let case_id = self.selected;
        let summary = self.active_case().summary.clone();

        match self.speech.start(case_id, &summary) {
            Ok(_) => self.briefing_error = None,
            Err(SpeechError::Busy) => {
                tracing::debug!("Briefing already in progress, ignoring");
            }
            Err(e) => {
                tracing::warn!("Briefing not started: {}", e);
                self.briefing_error = Some(e.to_string());
            }
        }
    }

    /// Whether a speech credential is configured
    pub fn briefing_available(&self) -> bool {
        self.speech.has_credential()
    }

    pub fn is_reading(&self) -> bool {
        self.speech.is_busy()
    }

    pub fn briefing_error(&self) -> Option<&str> {
        self.briefing_error.as_deref()
    }

    pub fn last_clip(&self) -> Option<&AudioClip> {
        self.clip.as_ref()
    }

    fn handle_speech(&mut self, outcome: SpeechOutcome) {
        match outcome {
            SpeechOutcome::Ready(clip) => {
                if let Err(e) = self.player.play(&clip) {
                    tracing::warn!("Playback failed: {}", e);
                    self.briefing_error = Some(e.to_string());
                }
                self.clip = Some(clip);
            }
            SpeechOutcome::Failed(e) => {
                tracing::warn!("Briefing failed: {}", e);
                self.briefing_error = Some(e.to_string());
            }
        }
    }

    // ---------------------------------------------------------------------
    // Media
    // ---------------------------------------------------------------------

    pub fn media(&self) -> &MediaFlags {
        &self.media
    }

    /// Show the fallback for one slot. Returns true if it was not shown yet.
    pub fn report_media_failure(&mut self, slot: MediaSlot) -> bool {
        let changed = self.media.fail(&slot);
        if changed {
            tracing::warn!(?slot, "Media unavailable");
        }
        changed
    }

    pub fn report_media_loaded(&mut self, slot: MediaSlot) {
        self.media.recover(&slot);
    }

    /// Whether media must be probed again. Resets the flag.
    pub fn take_media_dirty(&mut self) -> bool {
        std::mem::take(&mut self.media_dirty)
    }

    /// Drone feed reference for the current phase. Idle without a case
    /// video means the drone is standing by.
    pub fn drone_feed_source<'a>(&'a self, assets: &'a AssetsConfig) -> Option<&'a str> {
        let phase = self.timer.phase();
        match self.active_case().video.as_deref() {
            Some(video) => Some(video),
            None => assets.phase_video(phase),
        }
    }

    /// Probe the assets visible right now and update the fallback flags
    pub fn probe_media(
        &mut self,
        library: &MediaLibrary,
        assets: &AssetsConfig,
        thumbnails: &mut ThumbnailManager,
    ) {
        match self.view {
            View::Drone => {
                let probe = self.drone_feed_source(assets).map(|src| library.probe(src));
                match probe {
                    Some(Ok(_)) | None => self.report_media_loaded(MediaSlot::DroneFeed),
                    Some(Err(_)) => {
                        self.report_media_failure(MediaSlot::DroneFeed);
                    }
                }
            }
            View::Map => {
                let map = assets.map_image.clone();
                self.probe_image(MediaSlot::Map, &map, library, thumbnails);
            }
            View::Summary => {}
        }

        let subjects: Vec<(String, String)> = self
            .active_case()
            .subjects
            .iter()
            .filter_map(|s| s.image.clone().map(|img| (s.name.clone(), img)))
            .collect();

        for (name, image) in subjects {
            self.probe_image(MediaSlot::SubjectImage(name), &image, library, thumbnails);
        }
    }

    fn probe_image(
        &mut self,
        slot: MediaSlot,
        reference: &str,
        library: &MediaLibrary,
        thumbnails: &mut ThumbnailManager,
    ) {
        match thumbnails.load(reference, library) {
            // Text-only terminal: the file exists, it just cannot be drawn
            Ok(_) | Err(MediaError::NoGraphics) => self.report_media_loaded(slot),
            Err(e) => {
                tracing::debug!("Image unavailable: {}", e);
                self.report_media_failure(slot);
            }
        }
    }

    // ---------------------------------------------------------------------
    // Time
    // ---------------------------------------------------------------------

    /// Seconds since the console started
    pub fn sync_seconds(&self) -> u64 {
        self.clock.now().duration_since(self.started_at).as_secs()
    }

    /// Advance every timer to the current clock reading
    pub fn tick(&mut self) {
        let now = self.clock.now();

        for outcome in self.timer.advance(now) {
            self.handle_outcome(outcome);
        }

        self.notice.expire(now);

        if let Some(interval) = self.rotation {
            if now.duration_since(self.last_rotation) >= interval {
                tracing::debug!("Rotating to next case");
                self.next_case();
            }
        }

        if let Some(outcome) = self.speech.poll() {
            self.handle_speech(outcome);
        }
    }
}
