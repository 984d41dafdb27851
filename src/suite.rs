//! Known request/response scenarios for the converter service.
//!
//! Each [`Scenario`] pairs a probe with the answer the live service is
//! expected to give. Checks are soft: every mismatch within a scenario is
//! collected instead of stopping at the first one.

use std::fmt;

use anyhow::Result;
use log::{debug, info, warn};
use reqwest::{Method, StatusCode};

use crate::config::{
    BAD_REQUEST, BAD_REQUEST_MESSAGE, DEFAULT_DATE_STRING, DEFAULT_UNIX_TIMESTAMP,
    INVALID_INPUT_BODY, METHOD_NOT_ALLOWED, METHOD_NOT_ALLOWED_MESSAGE, NOT_FOUND,
    NOT_FOUND_MESSAGE,
};
use crate::converter::{ConversionRequest, ConversionResponse, ConverterApi, invalid_method_body};

/// `s` values the service cannot interpret.
pub const INVALID_STRING_INPUTS: [&str; 6] = [
    "test",
    "18/12/2023",
    "20_10_2023",
    "10%10*2023",
    "10:20:2023",
    "",
];

/// Methods the endpoint does not accept.
pub const UNSUPPORTED_METHODS: [Method; 4] =
    [Method::POST, Method::PUT, Method::PATCH, Method::DELETE];

/// What a scenario sends.
#[derive(Debug, Clone, PartialEq)]
pub enum Probe {
    Get(ConversionRequest),
    GetWithoutParameters,
    Raw { method: Method, body: String },
    /// The same GET issued twice; both answers must agree.
    Repeated(ConversionRequest),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Expectation {
    pub status: StatusCode,
    pub body: String,
}

impl Expectation {
    pub fn new(status: StatusCode, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }
}

impl fmt::Display for Expectation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {:?}", self.status.as_u16(), self.body)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Scenario {
    pub name: String,
    pub description: String,
    pub probe: Probe,
    pub expect: Expectation,
    /// Set when the expectation records observed behaviour that differs
    /// from what the service documents.
    pub note: Option<&'static str>,
}

/// The full scenario table.
pub fn scenarios() -> Result<Vec<Scenario>> {
    let mut scenarios = vec![
        Scenario {
            name: "date_string_to_timestamp".to_string(),
            description: "a date string is converted to a unix timestamp".to_string(),
            probe: Probe::Get(ConversionRequest::default()),
            expect: Expectation::new(StatusCode::OK, DEFAULT_UNIX_TIMESTAMP),
            note: None,
        },
        Scenario {
            name: "timestamp_to_date_string".to_string(),
            description: "a unix timestamp is converted to a quoted date string".to_string(),
            probe: Probe::Get(ConversionRequest::with_s(DEFAULT_UNIX_TIMESTAMP)),
            expect: Expectation::new(StatusCode::OK, format!("\"{}\"", DEFAULT_DATE_STRING)),
            note: None,
        },
        Scenario {
            name: "empty_parameter_values".to_string(),
            description: "parameters without values are rejected".to_string(),
            probe: Probe::Get(ConversionRequest::empty()),
            expect: Expectation::new(BAD_REQUEST, BAD_REQUEST_MESSAGE),
            note: None,
        },
        Scenario {
            name: "missing_parameters".to_string(),
            description: "a request without any parameters is not found".to_string(),
            probe: Probe::GetWithoutParameters,
            expect: Expectation::new(NOT_FOUND, NOT_FOUND_MESSAGE),
            note: None,
        },
    ];

    for input in INVALID_STRING_INPUTS {
        scenarios.push(Scenario {
            name: format!("invalid_string/{}", input),
            description: format!("unparseable input {:?} is answered with \"false\"", input),
            probe: Probe::Get(ConversionRequest::with_s(input)),
            expect: Expectation::new(StatusCode::OK, INVALID_INPUT_BODY),
            note: Some("service answers 200 \"false\" instead of 400 \"Bad Request\""),
        });
    }

    for method in UNSUPPORTED_METHODS {
        let body = invalid_method_body(&method)?;
        scenarios.push(Scenario {
            name: format!("method_not_allowed/{}", method),
            description: format!("{} is not allowed", method),
            probe: Probe::Raw { method, body },
            expect: Expectation::new(METHOD_NOT_ALLOWED, METHOD_NOT_ALLOWED_MESSAGE),
            note: None,
        });
    }

    scenarios.push(Scenario {
        name: "repeated_request_is_stable".to_string(),
        description: "the same request twice yields the same answer".to_string(),
        probe: Probe::Repeated(ConversionRequest::default()),
        expect: Expectation::new(StatusCode::OK, DEFAULT_UNIX_TIMESTAMP),
        note: None,
    });

    Ok(scenarios)
}

/// Result of running one scenario.
#[derive(Debug, Clone, PartialEq)]
pub struct ScenarioOutcome {
    pub name: String,
    pub observed: ConversionResponse,
    pub mismatches: Vec<String>,
}

impl ScenarioOutcome {
    pub fn passed(&self) -> bool {
        self.mismatches.is_empty()
    }
}

#[derive(Debug, Default)]
pub struct SuiteReport {
    pub outcomes: Vec<ScenarioOutcome>,
}

impl SuiteReport {
    pub fn passed(&self) -> usize {
        self.outcomes.iter().filter(|o| o.passed()).count()
    }

    pub fn failed(&self) -> usize {
        self.outcomes.len() - self.passed()
    }

    pub fn all_passed(&self) -> bool {
        self.failed() == 0
    }
}

fn compare(expect: &Expectation, observed: &ConversionResponse, label: &str) -> Vec<String> {
    let mut mismatches = Vec::new();
    if observed.status() != expect.status {
        mismatches.push(format!(
            "{}status: expected {}, got {}",
            label,
            expect.status.as_u16(),
            observed.status().as_u16()
        ));
    }
    if observed.text() != expect.body {
        mismatches.push(format!(
            "{}body: expected {:?}, got {:?}",
            label,
            expect.body,
            observed.text()
        ));
    }
    mismatches
}

/// Sends the scenario's probe and checks the answer. Transport failures are
/// returned as errors, not as mismatches.
pub async fn run_scenario<A>(api: &A, scenario: &Scenario) -> Result<ScenarioOutcome>
where
    A: ConverterApi + ?Sized,
{
    debug!("Running scenario {}...", scenario.name);

    let (observed, mismatches) = match &scenario.probe {
        Probe::Get(request) => {
            let observed = api.convert(request).await?;
            let mismatches = compare(&scenario.expect, &observed, "");
            (observed, mismatches)
        }
        Probe::GetWithoutParameters => {
            let observed = api.convert_without_parameters().await?;
            let mismatches = compare(&scenario.expect, &observed, "");
            (observed, mismatches)
        }
        Probe::Raw { method, body } => {
            let observed = api.send_raw(method.clone(), body).await?;
            let mismatches = compare(&scenario.expect, &observed, "");
            (observed, mismatches)
        }
        Probe::Repeated(request) => {
            let first = api.convert(request).await?;
            let second = api.convert(request).await?;
            let mut mismatches = compare(&scenario.expect, &first, "first ");
            mismatches.extend(compare(&scenario.expect, &second, "second "));
            if first != second {
                mismatches.push(format!("answers differ: {} vs {}", first, second));
            }
            (second, mismatches)
        }
    };

    if mismatches.is_empty() {
        info!("{}: ok ({})", scenario.name, observed);
    } else {
        warn!("{}: {}", scenario.name, mismatches.join("; "));
    }

    Ok(ScenarioOutcome {
        name: scenario.name.clone(),
        observed,
        mismatches,
    })
}

/// Runs every scenario whose name starts with `only` (all when `None`), in
/// table order.
pub async fn run_suite<A>(api: &A, only: Option<&str>) -> Result<SuiteReport>
where
    A: ConverterApi + ?Sized,
{
    let mut report = SuiteReport::default();

    for scenario in scenarios()? {
        if let Some(prefix) = only {
            if !scenario.name.starts_with(prefix) {
                continue;
            }
        }
        report.outcomes.push(run_scenario(api, &scenario).await?);
    }

    Ok(report)
}
