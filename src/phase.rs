//! Drone mission phase machine.
//!
//! ```text
//!            Launch{n>0}          n seconds elapsed
//!   Idle ───────────────▶ EnRoute ─────────────────▶ Scanning ──┐
//!    ▲                                                │    ▲    │ detection delay
//!    │ StandDown                        RequestNegotiation  └────┘ (flag flips)
//!    │                                  (only if detected)
//!    └──────────────────────────────────────────── Negotiation ◀┘
//! ```
//!
//! [`transition`] is pure; [`PhaseTimer`] feeds it `SecondElapsed` and
//! `DetectionConfirmed` events derived from clock instants.

use std::time::{Duration, Instant};

const ONE_SECOND: Duration = Duration::from_secs(1);

/// Stage of the scripted drone mission
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Phase {
    Idle,
    EnRoute,
    Scanning,
    Negotiation,
}

impl Phase {
    /// Overlay label
    pub fn label(self) -> &'static str {
        match self {
            Phase::Idle => "IDLE",
            Phase::EnRoute => "EN ROUTE",
            Phase::Scanning => "SCANNING",
            Phase::Negotiation => "NEGOTIATION",
        }
    }
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Everything the machine tracks
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PhaseState {
    pub phase: Phase,
    /// Seconds left on the trip countdown
    pub remaining_secs: u64,
    /// Simulated weapon detection flag
    pub detected: bool,
}

impl PhaseState {
    pub const IDLE: PhaseState = PhaseState {
        phase: Phase::Idle,
        remaining_secs: 0,
        detected: false,
    };

    /// Whether a negotiation request would be accepted
    pub fn negotiation_unlocked(&self) -> bool {
        self.phase == Phase::Scanning && self.detected
    }
}

impl Default for PhaseState {
    fn default() -> Self {
        Self::IDLE
    }
}

/// Inputs to the machine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PhaseEvent {
    /// Start the trip with the given countdown
    Launch { countdown_secs: u64 },
    /// Back to idle (case without a script)
    StandDown,
    /// One second of countdown elapsed
    SecondElapsed,
    /// Scanning found a weapon
    DetectionConfirmed,
    /// Operator jumped straight to scanning; detection counts as confirmed
    ForceScanning,
    /// Operator asked to open the negotiation channel
    RequestNegotiation,
}

/// Why an event was refused
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    /// Negotiation needs `Scanning` with a confirmed detection
    NegotiationLocked,
}

/// What a transition did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Phase changed to the given value
    Entered(Phase),
    /// Countdown moved, phase unchanged
    Ticked,
    /// Detection flag flipped
    Detected,
    /// Nothing to do
    Unchanged,
    /// Event refused, state untouched
    Rejected(Rejection),
}

/// Pure transition function
pub fn transition(state: PhaseState, event: PhaseEvent) -> (PhaseState, Outcome) {
    match event {
        PhaseEvent::Launch { countdown_secs: 0 } => (
            PhaseState {
                phase: Phase::Scanning,
                remaining_secs: 0,
                detected: false,
            },
            Outcome::Entered(Phase::Scanning),
        ),
        PhaseEvent::Launch { countdown_secs } => (
            PhaseState {
                phase: Phase::EnRoute,
                remaining_secs: countdown_secs,
                detected: false,
            },
            Outcome::Entered(Phase::EnRoute),
        ),
        PhaseEvent::StandDown => {
            let outcome = if state.phase == Phase::Idle {
                Outcome::Unchanged
            } else {
                Outcome::Entered(Phase::Idle)
            };
            (PhaseState::IDLE, outcome)
        }
        PhaseEvent::SecondElapsed => {
            if state.phase != Phase::EnRoute {
                return (state, Outcome::Unchanged);
            }
            let remaining = state.remaining_secs.saturating_sub(1);
            if remaining == 0 {
                (
                    PhaseState {
                        phase: Phase::Scanning,
                        remaining_secs: 0,
                        detected: state.detected,
                    },
                    Outcome::Entered(Phase::Scanning),
                )
            } else {
                (
                    PhaseState {
                        remaining_secs: remaining,
                        ..state
                    },
                    Outcome::Ticked,
                )
            }
        }
        PhaseEvent::DetectionConfirmed => {
            if state.phase == Phase::Scanning && !state.detected {
                (
                    PhaseState {
                        detected: true,
                        ..state
                    },
                    Outcome::Detected,
                )
            } else {
                (state, Outcome::Unchanged)
            }
        }
        PhaseEvent::ForceScanning => (
            PhaseState {
                phase: Phase::Scanning,
                remaining_secs: 0,
                detected: true,
            },
            if state.phase == Phase::Scanning {
                if state.detected {
                    Outcome::Unchanged
                } else {
                    Outcome::Detected
                }
            } else {
                Outcome::Entered(Phase::Scanning)
            },
        ),
        PhaseEvent::RequestNegotiation => {
            if state.negotiation_unlocked() {
                (
                    PhaseState {
                        phase: Phase::Negotiation,
                        ..state
                    },
                    Outcome::Entered(Phase::Negotiation),
                )
            } else {
                (state, Outcome::Rejected(Rejection::NegotiationLocked))
            }
        }
    }
}

/// Drives [`transition`] from clock instants
#[derive(Debug, Clone)]
pub struct PhaseTimer {
    state: PhaseState,
    /// Start of the countdown second currently running
    second_started: Option<Instant>,
    /// When the drone arrived on site
    scanning_since: Option<Instant>,
    /// Only scripted missions detect anything on their own
    detection_delay: Option<Duration>,
}

impl PhaseTimer {
    pub fn new() -> Self {
        Self {
            state: PhaseState::IDLE,
            second_started: None,
            scanning_since: None,
            detection_delay: None,
        }
    }

    pub fn state(&self) -> PhaseState {
        self.state
    }

    pub fn phase(&self) -> Phase {
        self.state.phase
    }

    /// Begin a scripted trip
    pub fn launch(&mut self, countdown_secs: u64, detection_delay: Duration, now: Instant) -> Outcome {
        self.detection_delay = Some(detection_delay);
        self.apply(PhaseEvent::Launch { countdown_secs }, now)
    }

    /// Put the drone on site with no script behind it: no countdown and no
    /// detection of its own
    pub fn arrive(&mut self, now: Instant) -> Outcome {
        self.detection_delay = None;
        self.apply(PhaseEvent::Launch { countdown_secs: 0 }, now)
    }

    /// Return to idle and forget any script timing
    pub fn stand_down(&mut self, now: Instant) -> Outcome {
        self.detection_delay = None;
        self.apply(PhaseEvent::StandDown, now)
    }

    /// Feed an event, maintaining the timing anchors
    pub fn apply(&mut self, event: PhaseEvent, now: Instant) -> Outcome {
        let (next, outcome) = transition(self.state, event);
        self.state = next;
        self.reanchor(outcome, now);
        outcome
    }

    /// Emit every event due by `now`, in order
    pub fn advance(&mut self, now: Instant) -> Vec<Outcome> {
        let mut outcomes = Vec::new();

        while self.state.phase == Phase::EnRoute {
            let Some(started) = self.second_started else {
                break;
            };
            let tick_at = started + ONE_SECOND;
            if now < tick_at {
                break;
            }
            let (next, outcome) = transition(self.state, PhaseEvent::SecondElapsed);
            self.state = next;
            self.second_started = Some(tick_at);
            self.reanchor(outcome, tick_at);
            outcomes.push(outcome);
        }

        if let (Some(since), Some(delay)) = (self.scanning_since, self.detection_delay) {
            if now.duration_since(since) >= delay {
                let (next, outcome) = transition(self.state, PhaseEvent::DetectionConfirmed);
                self.state = next;
                if outcome != Outcome::Unchanged {
                    outcomes.push(outcome);
                }
                self.scanning_since = None;
            }
        }

        outcomes
    }

    fn reanchor(&mut self, outcome: Outcome, at: Instant) {
        match outcome {
            Outcome::Entered(Phase::EnRoute) => {
                self.second_started = Some(at);
                self.scanning_since = None;
            }
            Outcome::Entered(Phase::Scanning) => {
                self.second_started = None;
                self.scanning_since = (!self.state.detected).then_some(at);
            }
            Outcome::Entered(_) | Outcome::Detected => {
                self.second_started = None;
                self.scanning_since = None;
            }
            Outcome::Ticked | Outcome::Unchanged | Outcome::Rejected(_) => {}
        }
    }
}

impl Default for PhaseTimer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scanning(detected: bool) -> PhaseState {
        PhaseState {
            phase: Phase::Scanning,
            remaining_secs: 0,
            detected,
        }
    }

    #[test]
    fn test_launch() {
        let (state, outcome) = transition(PhaseState::IDLE, PhaseEvent::Launch { countdown_secs: 90 });
        assert_eq!(outcome, Outcome::Entered(Phase::EnRoute));
        assert_eq!(state.remaining_secs, 90);
        assert!(!state.detected);

        let (state, outcome) = transition(PhaseState::IDLE, PhaseEvent::Launch { countdown_secs: 0 });
        assert_eq!(outcome, Outcome::Entered(Phase::Scanning));
        assert_eq!(state.phase, Phase::Scanning);
    }

    #[test]
    fn test_countdown_reaches_scanning() {
        let (mut state, _) = transition(PhaseState::IDLE, PhaseEvent::Launch { countdown_secs: 2 });

        let (next, outcome) = transition(state, PhaseEvent::SecondElapsed);
        assert_eq!(outcome, Outcome::Ticked);
        assert_eq!(next.remaining_secs, 1);
        state = next;

        let (next, outcome) = transition(state, PhaseEvent::SecondElapsed);
        assert_eq!(outcome, Outcome::Entered(Phase::Scanning));
        assert_eq!(next.remaining_secs, 0);
    }

    #[test]
    fn test_second_elapsed_ignored_outside_en_route() {
        for state in [PhaseState::IDLE, scanning(false), scanning(true)] {
            assert_eq!(transition(state, PhaseEvent::SecondElapsed), (state, Outcome::Unchanged));
        }
    }

    #[test]
    fn test_negotiation_gate() {
        let (state, outcome) = transition(scanning(true), PhaseEvent::RequestNegotiation);
        assert_eq!(outcome, Outcome::Entered(Phase::Negotiation));
        assert_eq!(state.phase, Phase::Negotiation);

        let locked = Outcome::Rejected(Rejection::NegotiationLocked);
        assert_eq!(transition(scanning(false), PhaseEvent::RequestNegotiation), (scanning(false), locked));
        assert_eq!(transition(PhaseState::IDLE, PhaseEvent::RequestNegotiation), (PhaseState::IDLE, locked));

        let en_route = PhaseState {
            phase: Phase::EnRoute,
            remaining_secs: 10,
            detected: true,
        };
        assert_eq!(transition(en_route, PhaseEvent::RequestNegotiation), (en_route, locked));
    }

    #[test]
    fn test_detection_only_while_scanning() {
        assert_eq!(
            transition(scanning(false), PhaseEvent::DetectionConfirmed),
            (scanning(true), Outcome::Detected)
        );
        assert_eq!(
            transition(PhaseState::IDLE, PhaseEvent::DetectionConfirmed),
            (PhaseState::IDLE, Outcome::Unchanged)
        );
    }

    #[test]
    fn test_force_scanning_confirms_detection() {
        let (state, outcome) = transition(PhaseState::IDLE, PhaseEvent::ForceScanning);
        assert_eq!(outcome, Outcome::Entered(Phase::Scanning));
        assert!(state.negotiation_unlocked());

        let (_, outcome) = transition(scanning(false), PhaseEvent::ForceScanning);
        assert_eq!(outcome, Outcome::Detected);
    }

    #[test]
    fn test_timer_never_scans_early() {
        let start = Instant::now();
        let mut timer = PhaseTimer::new();
        timer.launch(3, Duration::from_secs(6), start);

        let outcomes = timer.advance(start + Duration::from_millis(2999));
        assert_eq!(outcomes, vec![Outcome::Ticked, Outcome::Ticked]);
        assert_eq!(timer.phase(), Phase::EnRoute);
        assert_eq!(timer.state().remaining_secs, 1);

        let outcomes = timer.advance(start + Duration::from_secs(3));
        assert_eq!(outcomes, vec![Outcome::Entered(Phase::Scanning)]);
    }

    #[test]
    fn test_timer_detection_delay() {
        let start = Instant::now();
        let mut timer = PhaseTimer::new();
        timer.launch(1, Duration::from_secs(6), start);

        timer.advance(start + Duration::from_secs(1));
        assert_eq!(timer.phase(), Phase::Scanning);

        // Delay counts from arrival, not from the advance call
        assert!(timer.advance(start + Duration::from_millis(6999)).is_empty());
        assert!(!timer.state().detected);

        assert_eq!(timer.advance(start + Duration::from_secs(7)), vec![Outcome::Detected]);
        assert!(timer.state().detected);
        assert!(timer.advance(start + Duration::from_secs(60)).is_empty());
    }

    #[test]
    fn test_timer_catches_up_in_one_call() {
        let start = Instant::now();
        let mut timer = PhaseTimer::new();
        timer.launch(2, Duration::from_secs(1), start);

        let outcomes = timer.advance(start + Duration::from_secs(10));
        assert_eq!(
            outcomes,
            vec![Outcome::Ticked, Outcome::Entered(Phase::Scanning), Outcome::Detected]
        );
    }

    #[test]
    fn test_unscripted_scanning_never_detects() {
        let start = Instant::now();
        let mut timer = PhaseTimer::new();
        timer.stand_down(start);
        timer.apply(PhaseEvent::Launch { countdown_secs: 0 }, start);

        assert!(timer.advance(start + Duration::from_secs(600)).is_empty());
        assert!(!timer.state().detected);
    }

    #[test]
    fn test_arrive_after_scripted_launch_drops_detection() {
        let start = Instant::now();
        let mut timer = PhaseTimer::new();
        timer.launch(5, Duration::from_secs(6), start);

        assert_eq!(timer.arrive(start), Outcome::Entered(Phase::Scanning));
        assert_eq!(timer.state().remaining_secs, 0);
        assert!(timer.advance(start + Duration::from_secs(600)).is_empty());
        assert!(!timer.state().negotiation_unlocked());
    }

    #[test]
    fn test_relaunch_resets_countdown() {
        let start = Instant::now();
        let mut timer = PhaseTimer::new();
        timer.launch(5, Duration::from_secs(6), start);
        timer.advance(start + Duration::from_secs(3));
        assert_eq!(timer.state().remaining_secs, 2);

        let later = start + Duration::from_millis(3500);
        timer.launch(5, Duration::from_secs(6), later);
        assert_eq!(timer.state().remaining_secs, 5);
        assert!(timer.advance(later + Duration::from_millis(999)).is_empty());
    }
}
