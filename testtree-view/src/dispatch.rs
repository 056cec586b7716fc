// Copyright (c) The testtree Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Typed event registry.
//!
//! View components subscribe to the event kinds they care about;
//! [`EventDispatcher::dispatch`] fans one engine event out to the matching
//! subscriber list. Subscribers are independent of one another: within a
//! list they run in registration order, but no component may rely on
//! ordering relative to other subscribers.
//!
//! Dispatch is synchronous on the caller's thread; the embedder marshals
//! engine events onto the UI thread before dispatching.

use testtree_model::{RunEvent, TestResult};

type Subscriber<T> = Box<dyn FnMut(&T)>;

/// Fan-out registry for engine run events.
#[derive(Default)]
pub struct EventDispatcher {
    run_started: Vec<Box<dyn FnMut(u32)>>,
    test_started: Vec<Box<dyn FnMut(&str)>>,
    suite_started: Vec<Box<dyn FnMut(&str)>>,
    test_finished: Vec<Subscriber<TestResult>>,
    suite_finished: Vec<Subscriber<TestResult>>,
    run_finished: Vec<Subscriber<TestResult>>,
    output: Vec<Box<dyn FnMut(Option<&str>, &str)>>,
}

impl EventDispatcher {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Subscribes to run-started events (receives the selected test count).
    pub fn on_run_started(&mut self, f: impl FnMut(u32) + 'static) {
        self.run_started.push(Box::new(f));
    }

    /// Subscribes to test-started events (receives the engine id).
    pub fn on_test_started(&mut self, f: impl FnMut(&str) + 'static) {
        self.test_started.push(Box::new(f));
    }

    /// Subscribes to suite-started events (receives the engine id).
    pub fn on_suite_started(&mut self, f: impl FnMut(&str) + 'static) {
        self.suite_started.push(Box::new(f));
    }

    /// Subscribes to test-finished events.
    pub fn on_test_finished(&mut self, f: impl FnMut(&TestResult) + 'static) {
        self.test_finished.push(Box::new(f));
    }

    /// Subscribes to suite-finished events.
    pub fn on_suite_finished(&mut self, f: impl FnMut(&TestResult) + 'static) {
        self.suite_finished.push(Box::new(f));
    }

    /// Subscribes to run-finished events (receives the top-level result).
    pub fn on_run_finished(&mut self, f: impl FnMut(&TestResult) + 'static) {
        self.run_finished.push(Box::new(f));
    }

    /// Subscribes to output events.
    pub fn on_output(&mut self, f: impl FnMut(Option<&str>, &str) + 'static) {
        self.output.push(Box::new(f));
    }

    /// Fans one event out to its subscribers.
    pub fn dispatch(&mut self, event: &RunEvent) {
        match event {
            RunEvent::RunStarted { test_count, .. } => {
                for subscriber in &mut self.run_started {
                    subscriber(*test_count);
                }
            }
            RunEvent::TestStarted { id } => {
                for subscriber in &mut self.test_started {
                    subscriber(id.as_str());
                }
            }
            RunEvent::SuiteStarted { id } => {
                for subscriber in &mut self.suite_started {
                    subscriber(id.as_str());
                }
            }
            RunEvent::TestFinished { result } => {
                for subscriber in &mut self.test_finished {
                    subscriber(result);
                }
            }
            RunEvent::SuiteFinished { result } => {
                for subscriber in &mut self.suite_finished {
                    subscriber(result);
                }
            }
            RunEvent::RunFinished { result, .. } => {
                for subscriber in &mut self.run_finished {
                    subscriber(result);
                }
            }
            RunEvent::Output { id, text } => {
                for subscriber in &mut self.output {
                    subscriber(id.as_deref(), text);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;
    use testtree_model::{ResultState, TestStatus};

    #[test]
    fn subscribers_only_see_their_event_kind() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut dispatcher = EventDispatcher::new();

        let sink = Rc::clone(&log);
        dispatcher.on_test_finished(move |result| {
            sink.borrow_mut().push(format!("finished {}", result.id));
        });
        let sink = Rc::clone(&log);
        dispatcher.on_test_started(move |id| {
            sink.borrow_mut().push(format!("started {id}"));
        });

        dispatcher.dispatch(&RunEvent::TestStarted { id: "0-3".into() });
        dispatcher.dispatch(&RunEvent::TestFinished {
            result: TestResult::new("0-3", "A.B", ResultState::of(TestStatus::Passed), 0.1),
        });
        dispatcher.dispatch(&RunEvent::Output {
            id: None,
            text: "noise".into(),
        });

        assert_eq!(*log.borrow(), ["started 0-3", "finished 0-3"]);
    }

    #[test]
    fn subscribers_of_one_kind_run_in_registration_order() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut dispatcher = EventDispatcher::new();
        for tag in ["first", "second"] {
            let sink = Rc::clone(&log);
            dispatcher.on_run_started(move |count| {
                sink.borrow_mut().push(format!("{tag}:{count}"));
            });
        }

        dispatcher.dispatch(&RunEvent::RunStarted {
            timestamp: chrono::DateTime::parse_from_rfc3339("2024-01-01T00:00:00Z").unwrap(),
            test_count: 3,
        });
        assert_eq!(*log.borrow(), ["first:3", "second:3"]);
    }
}
