//! JSON plumbing for the `check`, `in` and `out` entry points
//!
//! Each command reads one request from `input`, runs the matching engine
//! against the GitLab host named in its `source`, and writes one response
//! followed by a newline to `output`.

use std::io::{Read, Write};
use std::path::Path;

use anyhow::Context;
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::info;

use crate::host::GitLabHost;
use crate::host::repository::RepositoryHost;
use crate::protocol::{CheckRequest, InRequest, OutRequest};
use crate::release::sync::{SyncEngine, SyncRequest};
use crate::version::checker;

pub async fn check(input: impl Read, output: impl Write) -> anyhow::Result<()> {
    let request: CheckRequest = read_request(input)?;
    let host = GitLabHost::from_source(&request.source).context("failed to create GitLab client")?;
    run_check(&host, &request, output).await
}

pub async fn fetch(input: impl Read, output: impl Write, destination: &Path) -> anyhow::Result<()> {
    let request: InRequest = read_request(input)?;
    let host = GitLabHost::from_source(&request.source).context("failed to create GitLab client")?;
    run_fetch(&host, &request, destination, output).await
}

pub async fn publish(input: impl Read, output: impl Write, source_dir: &Path) -> anyhow::Result<()> {
    let request: OutRequest = read_request(input)?;
    let host = GitLabHost::from_source(&request.source).context("failed to create GitLab client")?;
    run_publish(&host, &request, source_dir, output).await
}

pub async fn run_check<H: RepositoryHost + ?Sized>(
    host: &H,
    request: &CheckRequest,
    output: impl Write,
) -> anyhow::Result<()> {
    let versions = checker::check(host, request)
        .await
        .with_context(|| format!("check failed for {}", request.source.repository))?;
    write_response(output, &versions)
}

pub async fn run_fetch<H: RepositoryHost + ?Sized>(
    host: &H,
    request: &InRequest,
    destination: &Path,
    output: impl Write,
) -> anyhow::Result<()> {
    info!("Fetching release {}", request.version.tag);
    let response = crate::release::fetch::fetch(host, request, destination)
        .await
        .with_context(|| format!("failed to fetch release {}", request.version.tag))?;
    write_response(output, &response)
}

pub async fn run_publish<H: RepositoryHost + ?Sized>(
    host: &H,
    request: &OutRequest,
    source_dir: &Path,
    output: impl Write,
) -> anyhow::Result<()> {
    let sync_request = SyncRequest::load(source_dir, &request.params).await?;
    info!("Publishing release {}", sync_request.tag);
    let response = SyncEngine::new(host)
        .sync(&sync_request)
        .await
        .with_context(|| format!("failed to publish release {}", sync_request.tag))?;
    write_response(output, &response)
}

fn read_request<T: DeserializeOwned>(mut input: impl Read) -> anyhow::Result<T> {
    let mut raw = String::new();
    input
        .read_to_string(&mut raw)
        .context("failed to read request from stdin")?;
    serde_json::from_str(&raw).context("invalid request JSON")
}

fn write_response<T: Serialize>(mut output: impl Write, response: &T) -> anyhow::Result<()> {
    serde_json::to_writer(&mut output, response).context("failed to write response")?;
    writeln!(output)?;
    output.flush()?;
    Ok(())
}
