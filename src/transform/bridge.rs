use std::sync::mpsc;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use uuid::Uuid;

use super::{merge_transformed, TransformAgent, TransformError, TransformedUrl};
use crate::core::VideoSource;

#[derive(Debug, PartialEq)]
pub enum TransformPoll {
    Idle,
    Running,
    Finished(Result<Vec<VideoSource>, TransformError>),
}

struct PendingTransform {
    id: Uuid,
    entries: Vec<VideoSource>,
    started: Instant,
    receiver: mpsc::Receiver<anyhow::Result<Vec<TransformedUrl>>>,
}

/// Runs the agent off the UI thread; at most one request is outstanding.
///
/// Submitting again replaces the outstanding request and its answer is dropped.
pub struct TransformBridge {
    agent: Option<Arc<dyn TransformAgent>>,
    timeout: Option<Duration>,
    pending: Option<PendingTransform>,
}

impl TransformBridge {
    pub fn new(agent: Option<Arc<dyn TransformAgent>>, timeout: Option<Duration>) -> Self {
        Self {
            agent,
            timeout,
            pending: None,
        }
    }

    pub fn is_available(&self) -> bool {
        self.agent.is_some()
    }

    pub fn agent_name(&self) -> Option<&str> {
        self.agent.as_deref().map(|agent| agent.name())
    }

    pub fn is_running(&self) -> bool {
        self.pending.is_some()
    }

    pub fn elapsed(&self, now: Instant) -> Option<Duration> {
        self.pending
            .as_ref()
            .map(|pending| now.saturating_duration_since(pending.started))
    }

    pub fn submit(&mut self, entries: Vec<VideoSource>) -> Result<Uuid, TransformError> {
        let agent = self
            .agent
            .clone()
            .ok_or_else(|| TransformError::Agent("no transform agent configured".to_string()))?;

        if let Some(previous) = self.pending.take() {
            log::info!("Replacing unfinished transform request {}", previous.id);
        }

        let id = Uuid::new_v4();
        let urls: Vec<String> = entries.iter().map(|entry| entry.url.clone()).collect();
        let (sender, receiver) = mpsc::channel();

        log::info!("Submitting {} urls to transform agent {} ({})", urls.len(), agent.name(), id);
        thread::spawn(move || {
            let result = agent.transform(&urls);
            if sender.send(result).is_err() {
                log::debug!("Transform request {} was abandoned before it finished", id);
            }
        });

        self.pending = Some(PendingTransform {
            id,
            entries,
            started: Instant::now(),
            receiver,
        });
        Ok(id)
    }

    /// Take the answer of the outstanding request, if one arrived (or it timed out)
    pub fn poll(&mut self, now: Instant) -> TransformPoll {
        let Some(pending) = self.pending.as_ref() else {
            return TransformPoll::Idle;
        };

        let outcome = match pending.receiver.try_recv() {
            Ok(Ok(transformed)) => merge_transformed(&pending.entries, &transformed),
            Ok(Err(e)) => Err(TransformError::Agent(format!("{:#}", e))),
            Err(mpsc::TryRecvError::Disconnected) => Err(TransformError::Disconnected),
            Err(mpsc::TryRecvError::Empty) => match self.timeout {
                Some(timeout) if now.saturating_duration_since(pending.started) >= timeout => {
                    Err(TransformError::TimedOut(timeout))
                }
                _ => return TransformPoll::Running,
            },
        };

        if let Some(finished) = self.pending.take() {
            match &outcome {
                Ok(sources) => log::info!("Transform {} finished with {} urls", finished.id, sources.len()),
                Err(e) => log::warn!("Transform {} failed: {}", finished.id, e),
            }
        }
        TransformPoll::Finished(outcome)
    }

    /// Drop the outstanding request; returns whether there was one
    pub fn cancel(&mut self) -> bool {
        match self.pending.take() {
            Some(pending) => {
                log::info!("Cancelled transform request {}", pending.id);
                true
            }
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    /// Appends `#resolved` to every url, optionally after blocking on a gate
    struct FakeAgent {
        gate: Option<Mutex<mpsc::Receiver<()>>>,
        drop_last: bool,
    }

    impl FakeAgent {
        fn immediate() -> Self {
            Self { gate: None, drop_last: false }
        }
    }

    impl TransformAgent for FakeAgent {
        fn name(&self) -> &str {
            "fake"
        }

        fn transform(&self, urls: &[String]) -> anyhow::Result<Vec<TransformedUrl>> {
            if let Some(gate) = &self.gate {
                let receiver = gate.lock().map_err(|_| anyhow::anyhow!("gate poisoned"))?;
                let _ = receiver.recv();
            }
            let mut results: Vec<TransformedUrl> = urls
                .iter()
                .map(|url| TransformedUrl {
                    original: url.clone(),
                    transformed: format!("{}#resolved", url),
                })
                .collect();
            if self.drop_last {
                results.pop();
            }
            Ok(results)
        }
    }

    struct FailingAgent;

    impl TransformAgent for FailingAgent {
        fn name(&self) -> &str {
            "failing"
        }

        fn transform(&self, _urls: &[String]) -> anyhow::Result<Vec<TransformedUrl>> {
            anyhow::bail!("resolver crashed")
        }
    }

    fn wait_for_finish(bridge: &mut TransformBridge) -> Result<Vec<VideoSource>, TransformError> {
        for _ in 0..500 {
            if let TransformPoll::Finished(result) = bridge.poll(Instant::now()) {
                return result;
            }
            thread::sleep(Duration::from_millis(10));
        }
        panic!("transform never finished");
    }

    fn entries() -> Vec<VideoSource> {
        vec![VideoSource::new("https://a", ""), VideoSource::new("https://b", "B")]
    }

    #[test]
    fn test_bridge_without_agent() {
        let mut bridge = TransformBridge::new(None, None);
        assert!(!bridge.is_available());
        assert!(bridge.submit(entries()).is_err());
        assert_eq!(bridge.poll(Instant::now()), TransformPoll::Idle);
    }

    #[test]
    fn test_bridge_delivers_merged_sources_once() {
        let mut bridge = TransformBridge::new(Some(Arc::new(FakeAgent::immediate())), None);
        bridge.submit(entries()).unwrap();
        assert!(bridge.is_running());

        let sources = wait_for_finish(&mut bridge).unwrap();
        assert_eq!(sources[0].url, "https://a#resolved");
        assert_eq!(sources[0].label, "https://a");
        assert_eq!(sources[1].label, "B");

        assert!(!bridge.is_running());
        assert_eq!(bridge.poll(Instant::now()), TransformPoll::Idle);
    }

    #[test]
    fn test_bridge_reports_length_mismatch() {
        let agent = FakeAgent { gate: None, drop_last: true };
        let mut bridge = TransformBridge::new(Some(Arc::new(agent)), None);
        bridge.submit(entries()).unwrap();

        assert_eq!(
            wait_for_finish(&mut bridge),
            Err(TransformError::LengthMismatch { expected: 2, got: 1 })
        );
    }

    #[test]
    fn test_bridge_reports_agent_failure() {
        let mut bridge = TransformBridge::new(Some(Arc::new(FailingAgent)), None);
        bridge.submit(entries()).unwrap();

        match wait_for_finish(&mut bridge) {
            Err(TransformError::Agent(message)) => assert!(message.contains("resolver crashed")),
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn test_bridge_times_out() {
        let (_release, gate) = mpsc::channel();
        let agent = FakeAgent { gate: Some(Mutex::new(gate)), drop_last: false };
        let mut bridge = TransformBridge::new(Some(Arc::new(agent)), Some(Duration::from_secs(5)));
        bridge.submit(entries()).unwrap();

        assert_eq!(bridge.poll(Instant::now()), TransformPoll::Running);
        assert_eq!(
            bridge.poll(Instant::now() + Duration::from_secs(6)),
            TransformPoll::Finished(Err(TransformError::TimedOut(Duration::from_secs(5))))
        );
        assert!(!bridge.is_running());
    }

    #[test]
    fn test_bridge_without_timeout_keeps_running() {
        let (_release, gate) = mpsc::channel();
        let agent = FakeAgent { gate: Some(Mutex::new(gate)), drop_last: false };
        let mut bridge = TransformBridge::new(Some(Arc::new(agent)), None);
        bridge.submit(entries()).unwrap();

        let much_later = Instant::now() + Duration::from_secs(3600);
        assert_eq!(bridge.poll(much_later), TransformPoll::Running);

        assert!(bridge.cancel());
        assert!(!bridge.cancel());
        assert_eq!(bridge.poll(Instant::now()), TransformPoll::Idle);
    }

    #[test]
    fn test_resubmit_drops_previous_answer() {
        let (release, gate) = mpsc::channel();
        let agent = FakeAgent { gate: Some(Mutex::new(gate)), drop_last: false };
        let mut bridge = TransformBridge::new(Some(Arc::new(agent)), None);

        let first = bridge.submit(vec![VideoSource::new("https://old", "")]).unwrap();
        let second = bridge.submit(vec![VideoSource::new("https://new", "")]).unwrap();
        assert_ne!(first, second);

        // Open the gate for both runs
        release.send(()).unwrap();
        release.send(()).unwrap();

        let sources = wait_for_finish(&mut bridge).unwrap();
        assert_eq!(sources, vec![VideoSource::new("https://new#resolved", "https://new")]);
    }
}
