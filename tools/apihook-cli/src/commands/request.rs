//! The request command: one orchestrator against a live API.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Instant;

use anyhow::{bail, Context as _, Result};
use apihook_sdk::prelude::*;
use serde::Serialize;
use serde_json::Value;

use super::RequestArgs;
use crate::config::CliConfig;
use crate::context::Context;
use crate::output::{format_elapsed, status_badge};

/// Outcome of a request command.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Report {
    pub url: String,
    pub method: Method,
    pub attempts: usize,
    pub calls: usize,
    pub status_code: Option<u16>,
    pub state: FetchState,
    pub events: Vec<String>,
}

type EventLog = Arc<Mutex<Vec<String>>>;

fn record(log: &EventLog, event: String) {
    log.lock().unwrap_or_else(PoisonError::into_inner).push(event);
}

/// Run the request command.
pub async fn run(args: RequestArgs, ctx: &Context) -> Result<()> {
    let body = args
        .body
        .as_deref()
        .map(|raw| parse_body(raw, ctx))
        .transpose()?;

    let started = Instant::now();
    let report = execute(&args, &ctx.config, body).await?;
    let elapsed = started.elapsed();

    if ctx.output.is_json() {
        ctx.output.json(&report);
    } else {
        print_report(&report, ctx);
        ctx.output.debug(&format!("finished in {}", format_elapsed(elapsed)));
    }

    if let Some(error) = &report.state.error {
        bail!("Request ended in error state: {}", error);
    }
    Ok(())
}

/// Fetch `args.repeat` times through one orchestrator.
pub async fn execute(args: &RequestArgs, config: &CliConfig, body: Option<Value>) -> Result<Report> {
    if args.repeat == 0 {
        bail!("--repeat must be at least 1");
    }

    let events: EventLog = Arc::default();
    let store = build_store(args, config, &events)?;
    let request = build_request(args, config, body)?;
    let url = format!("{}{}", store.base_url().unwrap_or_default(), request.endpoint);

    let http: SharedExecutor = Arc::new(
        HttpExecutor::with_config(config.executor.clone()).context("Failed to build HTTP client")?,
    );
    let calls = Arc::new(AtomicUsize::new(0));
    let last_status = Arc::new(Mutex::new(None));
    let executor = {
        let calls = calls.clone();
        let last_status = last_status.clone();
        executor_fn(move |request| {
            calls.fetch_add(1, Ordering::SeqCst);
            let http = http.clone();
            let last_status = last_status.clone();
            async move {
                let response = http.execute(request).await;
                *last_status.lock().unwrap_or_else(PoisonError::into_inner) = response.status_code;
                response
            }
        })
    };

    let failures = events.clone();
    let mut options = ApiHookOptions::config(request)
        .store(store)
        .executor(executor)
        .debouncing_limit_ms(args.debounce_ms.unwrap_or(config.hook.debouncing_limit_ms))
        .on_error(move |failure| record(&failures, format!("on_error: {}", failure.message())));
    if let Some(pointer) = args.select.clone() {
        options = options.api_custom_return_function(move |response| {
            response.to_value().pointer(&pointer).cloned().unwrap_or(Value::Null)
        });
    }
    let hook = ApiHook::new(options)?;

    let show_loader = config.hook.show_loader && !args.no_loader;
    for attempt in 1..=args.repeat {
        tracing::debug!(attempt, "fetching");
        hook.fetch_data(FetchOptions::new().show_loader(show_loader)).await;
    }

    let status_code = *last_status.lock().unwrap_or_else(PoisonError::into_inner);
    let events = events.lock().unwrap_or_else(PoisonError::into_inner).clone();
    Ok(Report {
        url,
        method: args.method,
        attempts: args.repeat,
        calls: calls.load(Ordering::SeqCst),
        status_code,
        state: hook.state(),
        events,
    })
}

fn build_store(args: &RequestArgs, config: &CliConfig, events: &EventLog) -> Result<AuthStore> {
    let mut seed = config.store.clone();
    if let Some(base_url) = &args.base_url {
        seed.base_url = Some(base_url.clone());
    }
    if let Some(token) = &args.token {
        seed.token = Some(token.clone());
    }

    let logouts = events.clone();
    let mut builder = AuthStore::builder().logout(move || record(&logouts, "logout".to_string()));
    if let Some(base_url) = seed.base_url {
        builder = builder.base_url(base_url);
    }
    if let Some(token) = seed.token {
        builder = builder.token(token);
    }
    for raw in &args.intercepts {
        let codes = parse_codes(raw)?;
        let label = raw.clone();
        let log = events.clone();
        builder = builder.on_status(codes, move || record(&log, format!("custom action: {label}")));
    }
    Ok(builder.build())
}

fn build_request(args: &RequestArgs, config: &CliConfig, body: Option<Value>) -> Result<RequestDescriptor> {
    let mut request = RequestDescriptor::new(args.endpoint.clone())
        .with_method(args.method)
        .with_authentication(args.auth || config.hook.authentication_required);
    for (name, value) in &config.hook.headers {
        request = request.with_header(name.clone(), value.clone());
    }
    for raw in &args.headers {
        let (name, value) = parse_header(raw)?;
        request = request.with_header(name, value);
    }
    if let Some(body) = body {
        request = request.with_json(body);
    }
    Ok(request)
}

fn parse_header(raw: &str) -> Result<(String, String)> {
    let Some((name, value)) = raw.split_once(':') else {
        bail!("Header must be name:value, got '{}'", raw);
    };
    let name = name.trim();
    if name.is_empty() {
        bail!("Header name is empty in '{}'", raw);
    }
    Ok((name.to_string(), value.trim().to_string()))
}

fn parse_codes(raw: &str) -> Result<Vec<u16>> {
    let codes = raw
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| s.parse::<u16>().with_context(|| format!("Invalid status code: {}", s)))
        .collect::<Result<Vec<_>>>()?;
    if codes.is_empty() {
        bail!("--intercept needs at least one status code");
    }
    Ok(codes)
}

fn parse_body(raw: &str, ctx: &Context) -> Result<Value> {
    let text = match raw.strip_prefix('@') {
        Some(path) => {
            let path = ctx.resolve_path(path);
            std::fs::read_to_string(&path)
                .with_context(|| format!("Failed to read body file: {}", path.display()))?
        }
        None => raw.to_string(),
    };
    serde_json::from_str(&text).context("Body is not valid JSON")
}

fn print_report(report: &Report, ctx: &Context) {
    let out = &ctx.output;
    out.header(&format!("{} {}", report.method, report.url));
    out.kv("status", &status_badge(report.status_code));
    out.kv(
        "calls",
        &format!(
            "{} of {} ({} skipped)",
            report.calls,
            report.attempts,
            report.attempts.saturating_sub(report.calls)
        ),
    );
    out.kv("loading", &report.state.loading.to_string());
    out.kv("refetching", &report.state.refetching.to_string());
    out.kv("error", report.state.error.as_deref().unwrap_or("none"));

    let data = serde_json::to_string_pretty(&report.state.data).unwrap_or_default();
    out.info("data:");
    println!("{data}");

    if !report.events.is_empty() {
        out.info("events:");
        for event in &report.events {
            out.list_item(event);
        }
    }

    match &report.state.error {
        Some(_) => out.warn("Orchestrator finished in error state"),
        None => out.success("Orchestrator finished"),
    }
}
