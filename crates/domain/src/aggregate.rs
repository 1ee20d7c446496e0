//! Core aggregate and domain event traits.

use common::Version;
use serde::{Serialize, de::DeserializeOwned};

/// Trait for domain events.
///
/// Domain events represent facts that have happened in the domain.
/// They are immutable and should be named in past tense.
pub trait DomainEvent: Serialize + DeserializeOwned + Send + Sync + Clone {
    /// Returns the event type name.
    ///
    /// This is used for serialization, logging and metrics labels.
    fn event_type(&self) -> &'static str;
}

/// Outcome of running a command against an aggregate.
///
/// Commands never mutate the aggregate they were invoked on; they hand back
/// the new state together with the events that describe the change, so that
/// the caller decides when the state is persisted and the events published.
#[derive(Debug, Clone)]
pub struct CommandResult<A: Aggregate> {
    /// The aggregate after applying the new events.
    pub aggregate: A,

    /// The events that were generated by the command.
    pub events: Vec<A::Event>,
}

/// Trait for aggregates.
///
/// An aggregate is a cluster of domain objects that can be treated as a single unit.
/// The aggregate root ensures consistency of changes being made within the aggregate:
/// - Commands validate the current state and produce events
/// - Events are applied to produce the next state (pure, deterministic)
pub trait Aggregate: Clone + Send + Sync + Sized {
    /// The type of events this aggregate produces and consumes.
    type Event: DomainEvent;

    /// The type of errors this aggregate can produce.
    type Error: std::error::Error + Send + Sync;

    /// Returns the aggregate type name.
    fn aggregate_type() -> &'static str;

    /// Returns the current version of the aggregate.
    fn version(&self) -> Version;

    /// Applies an event to the aggregate, updating its state.
    ///
    /// This method must be pure and deterministic:
    /// - Given the same state and event, it must always produce the same new state
    /// - It must not have side effects
    /// - It must not fail (events represent facts that have happened)
    fn apply(&mut self, event: Self::Event);

    /// Applies multiple events in sequence.
    fn apply_events(&mut self, events: impl IntoIterator<Item = Self::Event>) {
        for event in events {
            self.apply(event);
        }
    }

    /// Runs a command and returns the resulting state alongside its events.
    ///
    /// `self` is left untouched; on error no events are produced.
    fn execute<F>(&self, command: F) -> Result<CommandResult<Self>, Self::Error>
    where
        F: FnOnce(&Self) -> Result<Vec<Self::Event>, Self::Error>,
    {
        let events = command(self)?;
        let mut aggregate = self.clone();
        aggregate.apply_events(events.iter().cloned());
        Ok(CommandResult { aggregate, events })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::{Deserialize, Serialize};

    #[derive(Debug, Clone, Serialize, Deserialize)]
    enum CounterEvent {
        Incremented { by: i32 },
    }

    impl DomainEvent for CounterEvent {
        fn event_type(&self) -> &'static str {
            match self {
                CounterEvent::Incremented { .. } => "CounterIncremented",
            }
        }
    }

    #[derive(Debug, Default, Clone)]
    struct Counter {
        value: i32,
        version: Version,
    }

    #[derive(Debug, thiserror::Error)]
    #[error("negative increment")]
    struct NegativeIncrement;

    impl Aggregate for Counter {
        type Event = CounterEvent;
        type Error = NegativeIncrement;

        fn aggregate_type() -> &'static str {
            "Counter"
        }

        fn version(&self) -> Version {
            self.version
        }

        fn apply(&mut self, event: Self::Event) {
            match event {
                CounterEvent::Incremented { by } => self.value += by,
            }
            self.version = self.version.next();
        }
    }

    fn increment(by: i32) -> impl FnOnce(&Counter) -> Result<Vec<CounterEvent>, NegativeIncrement> {
        move |_| {
            if by < 0 {
                Err(NegativeIncrement)
            } else {
                Ok(vec![CounterEvent::Incremented { by }])
            }
        }
    }

    #[test]
    fn test_execute_returns_new_state_and_events() {
        let counter = Counter::default();

        let result = counter.execute(increment(5)).unwrap();

        assert_eq!(result.aggregate.value, 5);
        assert_eq!(result.aggregate.version(), Version::first());
        assert_eq!(result.events.len(), 1);
        assert_eq!(result.events[0].event_type(), "CounterIncremented");
    }

    #[test]
    fn test_execute_leaves_original_untouched() {
        let counter = Counter::default();

        let _ = counter.execute(increment(5)).unwrap();

        assert_eq!(counter.value, 0);
        assert_eq!(counter.version(), Version::initial());
    }

    #[test]
    fn test_execute_propagates_command_error() {
        let counter = Counter::default();
        assert!(counter.execute(increment(-1)).is_err());
    }

    #[test]
    fn test_apply_events_in_sequence() {
        let mut counter = Counter::default();
        counter.apply_events(vec![
            CounterEvent::Incremented { by: 1 },
            CounterEvent::Incremented { by: 2 },
        ]);
        assert_eq!(counter.value, 3);
        assert_eq!(counter.version(), Version::new(2));
    }
}
