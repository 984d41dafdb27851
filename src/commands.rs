//! Handlers behind the `tsprobe` subcommands.

use anyhow::{Result, bail};
use log::debug;
use reqwest::Method;

use crate::config::ProbeConfig;
use crate::converter::{ConversionRequest, Converter, ConverterApi, invalid_method_body};
use crate::suite::{self, Probe};

/// Runs the scenario suite and prints one line per scenario. Fails when any
/// scenario does not match.
pub async fn check(config: &ProbeConfig, only: Option<&str>) -> Result<()> {
    let converter = Converter::from_config(config)?;
    debug!("Checking {}", converter.base_url());

    let report = suite::run_suite(&converter, only).await?;
    if report.outcomes.is_empty() {
        bail!("No scenario matches '{}'", only.unwrap_or_default());
    }

    for outcome in &report.outcomes {
        if outcome.passed() {
            println!("PASS  {}", outcome.name);
        } else {
            println!("FAIL  {}", outcome.name);
            for mismatch in &outcome.mismatches {
                println!("        {}", mismatch);
            }
        }
    }

    println!();
    println!(
        "{} passed, {} failed against {}",
        report.passed(),
        report.failed(),
        converter.base_url()
    );

    if !report.all_passed() {
        bail!("{} of {} scenarios failed", report.failed(), report.outcomes.len());
    }
    Ok(())
}

/// Prints the scenario table.
pub fn list() -> Result<()> {
    for scenario in suite::scenarios()? {
        let probe = match &scenario.probe {
            Probe::Get(_) => "GET",
            Probe::GetWithoutParameters => "GET (no query)",
            Probe::Raw { method, .. } => method.as_str(),
            Probe::Repeated(_) => "GET x2",
        };
        println!(
            "{:<32} {:<16} -> {}  {}",
            scenario.name, probe, scenario.expect, scenario.description
        );
        if let Some(note) = scenario.note {
            println!("{:<32} note: {}", "", note);
        }
    }
    Ok(())
}

/// Issues one polled GET and prints status and body.
pub async fn convert(config: &ProbeConfig, request: Option<ConversionRequest>) -> Result<()> {
    let converter = Converter::from_config(config)?;

    let response = match request {
        Some(request) => converter.convert(&request).await?,
        None => converter.convert_without_parameters().await?,
    };

    println!("{}", response.status().as_u16());
    println!("{}", response.text());
    Ok(())
}

/// Issues one polled request with an arbitrary method. Without an explicit
/// body the same body as the method-not-allowed scenarios is sent.
pub async fn send(config: &ProbeConfig, method: Method, body: Option<String>) -> Result<()> {
    let converter = Converter::from_config(config)?;

    let body = match body {
        Some(body) => body,
        None => invalid_method_body(&method)?,
    };
    let response = converter.send_raw(method, &body).await?;

    println!("{}", response.status().as_u16());
    println!("{}", response.text());
    Ok(())
}
