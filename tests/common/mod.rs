pub mod fixtures;

use provql::{
    MatchQuery, PerformHooks, QueryError, Record, Sequence, SequenceQuery, Value, Version,
};
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

pub type TestResult = Result<(), Box<dyn std::error::Error>>;

/// A versioned `unit` record.
pub fn unit(id: &str, version: &str) -> Value {
    Record::versioned("unit", id, version.parse::<Version>().expect("valid version")).into()
}

/// `(id, version)` pairs for compact assertions.
pub fn ids_and_versions(values: &[Value]) -> Vec<(String, String)> {
    values
        .iter()
        .map(|value| {
            let (id, version) = value.versioned().expect("versioned record");
            (id.to_string(), version.to_string())
        })
        .collect()
}

pub fn pairs(expected: &[(&str, &str)]) -> Vec<(String, String)> {
    expected
        .iter()
        .map(|(id, version)| (id.to_string(), version.to_string()))
        .collect()
}

/// Records setup/teardown calls in order.
#[derive(Default)]
pub struct RecordingHooks {
    calls: Mutex<Vec<&'static str>>,
}

impl RecordingHooks {
    pub fn calls(&self) -> Vec<&'static str> {
        self.calls.lock().unwrap().clone()
    }
}

impl PerformHooks for RecordingHooks {
    fn setup(&self) {
        self.calls.lock().unwrap().push("setup");
    }

    fn teardown(&self) {
        self.calls.lock().unwrap().push("teardown");
    }
}

/// Matches records with a given identifier and counts the candidates it sees.
pub struct IdQuery {
    pub id: String,
    pub tested: AtomicUsize,
}

impl IdQuery {
    pub fn new(id: &str) -> Self {
        Self {
            id: id.to_string(),
            tested: AtomicUsize::new(0),
        }
    }

    pub fn tested(&self) -> usize {
        self.tested.load(Ordering::SeqCst)
    }
}

impl MatchQuery for IdQuery {
    fn is_match(&self, candidate: &Value) -> Result<bool, QueryError> {
        self.tested.fetch_add(1, Ordering::SeqCst);
        Ok(candidate
            .versioned()
            .is_some_and(|(id, _)| id.as_str() == self.id))
    }
}

/// Keeps versions at or above a major version.
pub struct MajorAtLeast(pub u32);

impl SequenceQuery for MajorAtLeast {
    fn perform<'s>(&self, input: Sequence<'s>) -> Result<Sequence<'s>, QueryError> {
        let minimum = self.0;
        Ok(Box::new(input.filter(move |item| match item {
            Ok(value) => value
                .versioned()
                .is_some_and(|(_, version)| version.major() >= minimum),
            Err(_) => true,
        })))
    }
}
