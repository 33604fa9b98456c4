//! Single-flight speech requests.
//!
//! At most one synthesis runs at a time. Each request gets a generation
//! number and a cancellation token; selecting another case cancels the
//! token, and any result whose generation no longer matches the in-flight
//! one is dropped on the floor, so a slow response can never land on the
//! wrong case.

use std::sync::Arc;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use super::{AudioClip, SpeechError, SpeechRequest, Synthesizer};

/// Finished request, as seen by the dashboard
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SpeechOutcome {
    Ready(AudioClip),
    Failed(SpeechError),
}

struct Flight {
    generation: u64,
    case_id: u32,
    token: CancellationToken,
}

struct Completion {
    generation: u64,
    case_id: u32,
    result: Result<Vec<u8>, SpeechError>,
}

pub struct SpeechController {
    /// `None` when no credential is configured
    synthesizer: Option<Arc<dyn Synthesizer>>,
    model: String,
    voice: String,
    generation: u64,
    in_flight: Option<Flight>,
    tx: mpsc::UnboundedSender<Completion>,
    rx: mpsc::UnboundedReceiver<Completion>,
}

impl SpeechController {
    pub fn new(synthesizer: Option<Arc<dyn Synthesizer>>, model: &str, voice: &str) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self {
            synthesizer,
            model: model.to_string(),
            voice: voice.to_string(),
            generation: 0,
            in_flight: None,
            tx,
            rx,
        }
    }

    /// Controller without a credential; every request fails fast
    pub fn unconfigured() -> Self {
        Self::new(None, "", "")
    }

    /// Start synthesizing `text` for a case. Must be called inside a tokio
    /// runtime. Returns the request generation.
    pub fn start(&mut self, case_id: u32, text: &str) -> Result<u64, SpeechError> {
        let Some(synthesizer) = self.synthesizer.clone() else {
            return Err(SpeechError::MissingCredential);
        };
        if self.in_flight.is_some() {
            return Err(SpeechError::Busy);
        }

        self.generation += 1;
        let generation = self.generation;
        let token = CancellationToken::new();
        let request = SpeechRequest {
            model: self.model.clone(),
            voice: self.voice.clone(),
            input: text.to_string(),
        };

        let task_token = token.clone();
        let tx = self.tx.clone();
        tokio::spawn(async move {
            let result = tokio::select! {
                _ = task_token.cancelled() => Err(SpeechError::Cancelled),
                result = synthesizer.synthesize(&request) => result,
            };
            // Receiver gone means the dashboard is shutting down
            let _ = tx.send(Completion {
                generation,
                case_id,
                result,
            });
        });

        tracing::info!(case_id, generation, "Briefing requested");
        self.in_flight = Some(Flight {
            generation,
            case_id,
            token,
        });
        Ok(generation)
    }

    /// Cancel the in-flight request, if any. Returns true if one was running.
    pub fn cancel(&mut self) -> bool {
        match self.in_flight.take() {
            Some(flight) => {
                tracing::debug!(
                    case_id = flight.case_id,
                    generation = flight.generation,
                    "Briefing cancelled"
                );
                flight.token.cancel();
                true
            }
            None => false,
        }
    }

    /// Collect the result of the in-flight request if it has finished.
    /// Stale results from cancelled requests are discarded.
    pub fn poll(&mut self) -> Option<SpeechOutcome> {
        while let Ok(done) = self.rx.try_recv() {
            let current = self
                .in_flight
                .as_ref()
                .is_some_and(|f| f.generation == done.generation);
            if !current {
                tracing::debug!(generation = done.generation, "Dropping stale briefing result");
                continue;
            }

            self.in_flight = None;
            return Some(match done.result {
                Ok(bytes) => SpeechOutcome::Ready(AudioClip {
                    case_id: done.case_id,
                    bytes,
                }),
                Err(e) => SpeechOutcome::Failed(e),
            });
        }
        None
    }

    pub fn is_busy(&self) -> bool {
        self.in_flight.is_some()
    }

    pub fn has_credential(&self) -> bool {
        self.synthesizer.is_some()
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::super::{SynthesisFuture, Synthesizer};
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio::sync::Notify;

    /// Scripted synthesizer: counts calls, optionally waits for a release
    pub struct FakeSynthesizer {
        pub calls: AtomicUsize,
        pub gate: Option<Arc<Notify>>,
        pub result: Result<Vec<u8>, SpeechError>,
    }

    impl FakeSynthesizer {
        pub fn ok(bytes: &[u8]) -> Self {
            Self {
                calls: AtomicUsize::new(0),
                gate: None,
                result: Ok(bytes.to_vec()),
            }
        }

        pub fn failing(err: SpeechError) -> Self {
            Self {
                calls: AtomicUsize::new(0),
                gate: None,
                result: Err(err),
            }
        }

        pub fn gated(mut self, gate: Arc<Notify>) -> Self {
            self.gate = Some(gate);
            self
        }

        pub fn call_count(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    impl Synthesizer for FakeSynthesizer {
        fn synthesize<'a>(&'a self, _request: &'a SpeechRequest) -> SynthesisFuture<'a> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Box::pin(async move {
                if let Some(ref gate) = self.gate {
                    gate.notified().await;
                }
                self.result.clone()
            })
        }
    }

    /// Poll until the controller yields something or the budget runs out
    pub async fn wait_for(controller: &mut SpeechController) -> Option<SpeechOutcome> {
        for _ in 0..200 {
            if let Some(outcome) = controller.poll() {
                return Some(outcome);
            }
            tokio::time::sleep(std::time::Duration::from_millis(5)).await;
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::testing::{wait_for, FakeSynthesizer};
    use super::*;
    use tokio::sync::Notify;

    #[tokio::test]
    async fn test_missing_credential_never_calls() {
        let mut controller = SpeechController::unconfigured();
        assert_eq!(controller.start(1, "text"), Err(SpeechError::MissingCredential));
        assert!(!controller.is_busy());
        assert!(controller.poll().is_none());
    }

    #[tokio::test]
    async fn test_success() {
        let fake = Arc::new(FakeSynthesizer::ok(b"mp3"));
        let mut controller = SpeechController::new(Some(fake.clone()), "m", "v");

        controller.start(3, "Backup required.").unwrap();
        assert!(controller.is_busy());

        let outcome = wait_for(&mut controller).await;
        assert_eq!(
            outcome,
            Some(SpeechOutcome::Ready(AudioClip {
                case_id: 3,
                bytes: b"mp3".to_vec()
            }))
        );
        assert!(!controller.is_busy());
        assert_eq!(fake.call_count(), 1);
    }

    #[tokio::test]
    async fn test_single_flight() {
        let gate = Arc::new(Notify::new());
        let fake = Arc::new(FakeSynthesizer::ok(b"a").gated(gate.clone()));
        let mut controller = SpeechController::new(Some(fake.clone()), "m", "v");

        controller.start(1, "first").unwrap();
        assert_eq!(controller.start(1, "second"), Err(SpeechError::Busy));

        gate.notify_one();
        assert!(matches!(wait_for(&mut controller).await, Some(SpeechOutcome::Ready(_))));
        assert_eq!(fake.call_count(), 1);

        // Free again once the first one landed
        assert!(controller.start(1, "third").is_ok());
    }

    #[tokio::test]
    async fn test_cancel_drops_stale_result() {
        let gate = Arc::new(Notify::new());
        let fake = Arc::new(FakeSynthesizer::ok(b"late").gated(gate.clone()));
        let mut controller = SpeechController::new(Some(fake.clone()), "m", "v");

        controller.start(1, "first").unwrap();
        assert!(controller.cancel());
        assert!(!controller.is_busy());
        assert!(!controller.cancel());

        gate.notify_one();
        tokio::time::sleep(std::time::Duration::from_millis(20)).await;
        assert!(controller.poll().is_none());
    }

    #[tokio::test]
    async fn test_failure_reported() {
        let fake = Arc::new(FakeSynthesizer::failing(SpeechError::Status(500)));
        let mut controller = SpeechController::new(Some(fake), "m", "v");

        controller.start(2, "text").unwrap();
        assert_eq!(
            wait_for(&mut controller).await,
            Some(SpeechOutcome::Failed(SpeechError::Status(500)))
        );
    }
}
