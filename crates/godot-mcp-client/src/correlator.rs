//! Command id allocation and result matching.

use std::collections::HashMap;

use godot_mcp_core::{CommandId, UpstreamResult};
use tokio::sync::oneshot;

/// Receives the result of one upstream command.
///
/// Delivered at most once. If the owning [`Correlator`] is dropped first,
/// the receiver observes a closed channel instead.
pub type Completion = oneshot::Sender<UpstreamResult>;

/// Maps in-flight command ids to whoever is waiting on them.
///
/// The counter is never reset, so ids stay unique for the lifetime of the
/// correlator even across reconnects. Entries whose result never arrives
/// (for example because the link dropped) stay in the table.
#[derive(Debug, Default)]
pub struct Correlator {
    last_id: u64,
    pending: HashMap<CommandId, Completion>,
}

impl Correlator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate the next id: "1", "2", "3", ...
    pub fn next_identifier(&mut self) -> CommandId {
        self.last_id += 1;
        CommandId::from(self.last_id)
    }

    /// Remember who to notify for `id`. `None` means fire-and-forget.
    pub fn register(&mut self, id: CommandId, completion: Option<Completion>) {
        if let Some(completion) = completion {
            self.pending.insert(id, completion);
        }
    }

    /// Hand `result` to whoever registered `id`.
    ///
    /// Returns `false` when nobody is waiting: unknown id, a fire-and-forget
    /// command, or a duplicate result. Those results are dropped.
    pub fn resolve(&mut self, id: &CommandId, result: UpstreamResult) -> bool {
        let Some(completion) = self.pending.remove(id) else {
            tracing::debug!(%id, "dropping result with no pending command");
            return false;
        };
        if completion.send(result).is_err() {
            tracing::debug!(%id, "waiter went away before result arrived");
        }
        true
    }

    /// Number of commands still waiting for a result.
    pub fn pending(&self) -> usize {
        self.pending.len()
    }

    pub fn is_pending(&self, id: &CommandId) -> bool {
        self.pending.contains_key(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use godot_mcp_core::decode_result;

    fn result(id: &str) -> UpstreamResult {
        decode_result(&format!(r#"{{"id":"{id}","status":"success","data":{id}}}"#)).unwrap()
    }

    #[test]
    fn identifiers_start_at_one_and_increase() {
        let mut c = Correlator::new();
        let ids: Vec<_> = (0..3).map(|_| c.next_identifier().to_string()).collect();
        assert_eq!(ids, ["1", "2", "3"]);
    }

    #[test]
    fn resolves_only_the_matching_waiter() {
        let mut c = Correlator::new();
        let a = c.next_identifier();
        let b = c.next_identifier();
        let (tx_a, mut rx_a) = oneshot::channel();
        let (tx_b, mut rx_b) = oneshot::channel();
        c.register(a.clone(), Some(tx_a));
        c.register(b.clone(), Some(tx_b));

        assert!(c.resolve(&b, result("2")));
        assert_eq!(rx_b.try_recv().unwrap().data, Some(serde_json::json!(2)));
        assert!(rx_a.try_recv().is_err());
        assert!(c.is_pending(&a));
        assert_eq!(c.pending(), 1);
    }

    #[test]
    fn second_resolution_is_dropped() {
        let mut c = Correlator::new();
        let id = c.next_identifier();
        let (tx, _rx) = oneshot::channel();
        c.register(id.clone(), Some(tx));

        assert!(c.resolve(&id, result("1")));
        assert!(!c.resolve(&id, result("1")));
    }

    #[test]
    fn fire_and_forget_registers_nothing() {
        let mut c = Correlator::new();
        let id = c.next_identifier();
        c.register(id.clone(), None);
        assert_eq!(c.pending(), 0);
        assert!(!c.resolve(&id, result("1")));
    }

    #[test]
    fn dropping_correlator_closes_waiters() {
        let mut c = Correlator::new();
        let id = c.next_identifier();
        let (tx, mut rx) = oneshot::channel();
        c.register(id, Some(tx));
        drop(c);
        assert_eq!(rx.try_recv(), Err(oneshot::error::TryRecvError::Closed));
    }
}
