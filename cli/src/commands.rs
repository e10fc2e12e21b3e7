//! Turns parsed arguments into a spec and hands it to the runner.

use std::fs;
use std::io::Write;
use std::path::Path;
use std::process::ExitCode;
use std::time::Duration;

use anyhow::{Context, Result};
use httpreq_core::{ClientConfig, Error, HttpClient, HttpMethod, RequestTarget, Runner, Spec};
use tracing::debug;

use crate::args::{Cli, Command, CommonArgs, RunArgs};
use crate::output;

pub fn dispatch<W: Write>(cli: Cli, out: &mut W) -> Result<ExitCode> {
    let config = ClientConfig {
        timeout: Duration::from_secs(cli.timeout),
    };
    match cli.command {
        Command::Get(args) => single(HttpMethod::Get, &args.url, None, &args.common, config, out),
        Command::Post(args) => single(HttpMethod::Post, &args.url, Some(args.json.as_str()), &args.common, config, out),
        Command::Delete(args) => single(HttpMethod::Delete, &args.url, None, &args.common, config, out),
        Command::Run(args) => run_spec(&args, config, out),
    }
}

fn single<W: Write>(
    method: HttpMethod,
    url: &str,
    json: Option<&str>,
    common: &CommonArgs,
    config: ClientConfig,
    out: &mut W,
) -> Result<ExitCode> {
    let target = request_target(method, url, json, common)?;
    let mut runner = Runner::new(Spec::new(vec![target])?, HttpClient::new(config));
    let results = runner.run_all()?;
    output::write_results(&results, common.output_file.as_deref(), out)
}

fn run_spec<W: Write>(args: &RunArgs, config: ClientConfig, out: &mut W) -> Result<ExitCode> {
    let spec = load_spec(&args.spec)?;
    let mut runner = Runner::new(spec, HttpClient::new(config));
    if let Some(base) = &args.base_url {
        runner.set_base_url(base)?;
    }
    let results = runner.run(&args.ids)?;
    output::write_results(&results, args.output_file.as_deref(), out)
}

fn load_spec(path: &Path) -> Result<Spec> {
    let raw = fs::read_to_string(path).with_context(|| format!("reading spec {}", path.display()))?;
    let spec = Spec::from_json(&raw).with_context(|| format!("parsing spec {}", path.display()))?;
    debug!(path = %path.display(), targets = spec.len(), "loaded spec");
    Ok(spec)
}

/// Build the single target described by command-line flags.
pub fn request_target(method: HttpMethod, url: &str, json: Option<&str>, common: &CommonArgs) -> Result<RequestTarget> {
    let mut target = RequestTarget::new(&method.as_str().to_ascii_lowercase(), method, url);
    for raw in &common.headers {
        let (name, value) = parse_header(raw)?;
        target = target.with_header(name, value);
    }
    if let Some(json) = json {
        let body: serde_json::Value = serde_json::from_str(json).context("--json must be valid JSON")?;
        target = target.with_body(body);
    }
    if common.aws_sigv4 {
        target = target.with_aws(&common.aws_region, &common.aws_profile);
    }
    Ok(target)
}

/// Split `name=value` or `name:value` at whichever separator comes first.
pub fn parse_header(raw: &str) -> Result<(&str, &str), Error> {
    let idx = raw
        .find([':', '='])
        .ok_or_else(|| Error::InvalidHeader(format!("{raw:?} is not of the form name=value or name:value")))?;
    let name = raw[..idx].trim();
    if name.is_empty() {
        return Err(Error::InvalidHeader(format!("{raw:?} has an empty name")));
    }
    Ok((name, raw[idx + 1..].trim()))
}
