//! Test case execution: the setup / assert / teardown hook contract.
//!
//! A [`TestCase`] describes one acceptance test: a templated request, a set
//! of independent checks against the recorded response, and captures that
//! write response values into the `variables` namespace for later tests.
//!
//! [`run_case`] drives the three ordered phases:
//!
//! 1. **setup** — resolve and send the request. A resolution failure yields
//!    [`TestOutcome::Errored`] (a broken fixture, distinguishable from an
//!    assertion failure); a transport failure yields a failed outcome
//!    carrying the transport message.
//! 2. **assert** — every check runs against the recorded response; all
//!    failures are collected, not just the first.
//! 3. **teardown** — captures extract values (JSON Pointer into the body,
//!    header, or status) and write them into the session.
//!
//! Suites run sequentially; [`run_suite`] awaits each case to completion
//! before starting the next.

use crate::request::{self, CapturedResponse, RequestDescriptor, SendConfig};
use crate::session::Session;
use crate::store::Scalar;
use std::fmt;

/// An independent assertion against the recorded response. Returns
/// `Err(message)` on failure.
pub type Check = Box<dyn Fn(&CapturedResponse) -> Result<(), String> + Send + Sync>;

/// Where a captured value comes from in the response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CaptureSource {
    /// JSON Pointer into the response body, e.g. `/data/0/id`.
    BodyPointer(String),

    /// A response header, looked up case-insensitively.
    Header(String),

    /// The numeric status code.
    Status,
}

/// A teardown capture: extract a response value and store it under `key` in
/// the `variables` namespace.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Capture {
    /// Variable name to store the captured value under.
    pub key: String,

    /// Extraction source.
    pub source: CaptureSource,
}

/// One acceptance test: a templated request plus its checks and captures.
pub struct TestCase {
    /// Test name, used in suite reports.
    pub name: String,

    /// The templated request sent during setup.
    pub request: RequestDescriptor,

    /// Independent checks run during the assert phase.
    pub checks: Vec<Check>,

    /// Captures applied during teardown.
    pub captures: Vec<Capture>,
}

impl TestCase {
    /// Creates a test case with no checks or captures.
    pub fn new(name: impl Into<String>, request: RequestDescriptor) -> Self {
        Self {
            name: name.into(),
            request,
            checks: Vec::new(),
            captures: Vec::new(),
        }
    }

    /// Adds a check, returning the case for chaining.
    pub fn check(
        mut self,
        check: impl Fn(&CapturedResponse) -> Result<(), String> + Send + Sync + 'static,
    ) -> Self {
        self.checks.push(Box::new(check));
        self
    }

    /// Adds a status-code check.
    pub fn expect_status(self, expected: u16) -> Self {
        self.check(move |response| {
            if response.status_code == expected {
                Ok(())
            } else {
                Err(format!(
                    "expected status {}, got {} {}",
                    expected, response.status_code, response.status_text
                ))
            }
        })
    }

    /// Adds a teardown capture, returning the case for chaining.
    pub fn capture(mut self, key: impl Into<String>, source: CaptureSource) -> Self {
        self.captures.push(Capture {
            key: key.into(),
            source,
        });
        self
    }
}

impl fmt::Debug for TestCase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TestCase")
            .field("name", &self.name)
            .field("request", &self.request)
            .field("checks", &self.checks.len())
            .field("captures", &self.captures)
            .finish()
    }
}

/// The result of running one test case.
#[derive(Debug, Clone, PartialEq)]
pub enum TestOutcome {
    /// Setup and every check succeeded.
    Passed,

    /// The request was sent (or failed in transport) and at least one check
    /// failed; all failure messages are listed.
    Failed {
        /// One message per failed check (or the transport error).
        failures: Vec<String>,
    },

    /// The test could not run: unresolved variable, malformed template, or a
    /// failed capture. Distinguishable from an assertion failure so a broken
    /// fixture is never reported as a silent pass.
    Errored {
        /// Description of what prevented the test from running.
        message: String,
    },
}

impl TestOutcome {
    /// Returns true if the test passed.
    pub fn is_passed(&self) -> bool {
        matches!(self, TestOutcome::Passed)
    }
}

impl fmt::Display for TestOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TestOutcome::Passed => write!(f, "passed"),
            TestOutcome::Failed { failures } => write!(f, "failed: {}", failures.join("; ")),
            TestOutcome::Errored { message } => write!(f, "errored: {}", message),
        }
    }
}

/// Extracts a capture value from the recorded response.
fn extract_capture(response: &CapturedResponse, source: &CaptureSource) -> Result<Scalar, String> {
    match source {
        CaptureSource::Status => Ok(Scalar::from(u64::from(response.status_code))),

        CaptureSource::Header(name) => response
            .header(name)
            .map(Scalar::from)
            .ok_or_else(|| format!("header '{}' not present in response", name)),

        CaptureSource::BodyPointer(pointer) => {
            let json = response
                .json()
                .map_err(|e| format!("response body is not JSON: {}", e))?;
            let value = json
                .pointer(pointer)
                .ok_or_else(|| format!("pointer '{}' matched nothing in response body", pointer))?;

            // Scalars keep their type; containers are stored serialized.
            Ok(Scalar::from_json(value)
                .unwrap_or_else(|| Scalar::Str(value.to_string())))
        }
    }
}

/// Runs one test case against a session: setup, assert, teardown.
pub async fn run_case(case: &TestCase, session: &mut Session, config: &SendConfig) -> TestOutcome {
    // Setup: resolve the request. A resolution failure marks the test as
    // errored, never as passed or merely failed.
    let resolved = match request::build(&case.request, session.store()) {
        Ok(resolved) => resolved,
        Err(e) => {
            return TestOutcome::Errored {
                message: e.to_string(),
            }
        }
    };

    // Setup: perform the request. Transport failures (including timeouts)
    // surface to the assertion stage as a normal failed outcome.
    let response = match request::send(&resolved, config).await {
        Ok(response) => response,
        Err(e) => {
            return TestOutcome::Failed {
                failures: vec![format!("request failed: {}", e)],
            }
        }
    };

    // Assert: run every check, collecting all failures.
    let failures: Vec<String> = case
        .checks
        .iter()
        .filter_map(|check| check(&response).err())
        .collect();

    if !failures.is_empty() {
        return TestOutcome::Failed { failures };
    }

    // Teardown: apply captures for later tests.
    for capture in &case.captures {
        match extract_capture(&response, &capture.source) {
            Ok(value) => session.capture(capture.key.clone(), value),
            Err(message) => {
                return TestOutcome::Errored {
                    message: format!("capture '{}' failed: {}", capture.key, message),
                }
            }
        }
    }

    TestOutcome::Passed
}

/// Runs test cases sequentially, in order, returning one outcome per case.
///
/// Later cases see variables captured by earlier ones; a failing case does
/// not stop the suite.
pub async fn run_suite(
    cases: &[TestCase],
    session: &mut Session,
    config: &SendConfig,
) -> Vec<(String, TestOutcome)> {
    let mut outcomes = Vec::with_capacity(cases.len());
    for case in cases {
        let outcome = run_case(case, session, config).await;
        outcomes.push((case.name.clone(), outcome));
    }
    outcomes
}
