use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result, bail};
use webbench_replay::headers::{headers_to_text, parse_raw_headers};
use webbench_replay::{ExecutionOutcome, RequestForm, ViewMode};
use webbench_storage::{SavedRequest, WriteOutcome};
use webbench_target::SiteMap;

use crate::workbench::Workbench;
use crate::{PatchArgs, RequestArgs, ScopeCommand};

fn form_from_args(args: RequestArgs) -> RequestForm {
    RequestForm {
        method: args.method,
        url: args.url,
        headers: parse_raw_headers(&args.headers.join("\n")),
        body: args.data,
    }
}

fn report(outcome: &WriteOutcome) {
    if let WriteOutcome::InMemoryOnly(err) = outcome {
        eprintln!("warning: change was not persisted: {err}");
    }
}

fn print_record_line(record: &SavedRequest) {
    let when = record
        .created_at()
        .map(|at| at.to_rfc3339())
        .unwrap_or_default();
    println!("{}  {}  {}", record.id, when, record.title());
}

pub async fn send(bench: &Workbench, args: RequestArgs) -> Result<()> {
    let form = form_from_args(args);
    let outcome = bench
        .interceptor
        .send(&form, &bench.config.extender, &bench.transport)
        .await?;
    match outcome {
        ExecutionOutcome::Success(response) => {
            println!("{}", response.raw_text());
            Ok(())
        }
        ExecutionOutcome::Failure { message } => bail!("request failed: {message}"),
    }
}

pub fn save(bench: &mut Workbench, args: RequestArgs) -> Result<()> {
    let form = form_from_args(args);
    let (record, outcome) = bench.interceptor.save_as_new(&mut bench.requests, &form)?;
    report(&outcome);
    println!("{}", record.id);
    Ok(())
}

pub fn list(bench: &mut Workbench, in_scope: bool) -> Result<()> {
    let records = bench.requests.load_all();
    let scope = bench.scope.scope();
    let shown: Vec<&SavedRequest> = records
        .iter()
        .filter(|record| !in_scope || scope.is_in_scope(&record.url))
        .collect();
    if shown.is_empty() {
        println!("No saved requests.");
    }
    for record in shown {
        print_record_line(record);
    }
    Ok(())
}

pub fn show(bench: &mut Workbench, id: &str) -> Result<()> {
    let form = bench.interceptor.load_for_viewing(&mut bench.requests, id)?;
    println!("{} {}", form.method, form.url);
    if !form.headers.is_empty() {
        println!("{}", headers_to_text(&form.headers));
    }
    if !form.body.is_empty() {
        println!();
        println!("{}", form.body);
    }
    Ok(())
}

pub fn overwrite(bench: &mut Workbench, id: &str, patch: PatchArgs) -> Result<()> {
    let mut form = bench.interceptor.load_for_editing(&mut bench.requests, id)?;
    if let Some(method) = patch.method {
        form.method = method;
    }
    if let Some(url) = patch.url {
        form.url = url;
    }
    if !patch.headers.is_empty() {
        form.headers = parse_raw_headers(&patch.headers.join("\n"));
    }
    if let Some(data) = patch.data {
        form.body = data;
    }
    let (record, outcome) = bench
        .interceptor
        .overwrite_existing(&mut bench.requests, &form)?;
    report(&outcome);
    print_record_line(&record);
    Ok(())
}

pub fn remove(bench: &mut Workbench, id: &str) -> Result<()> {
    let outcome = bench.replay.remove(&mut bench.requests, id)?;
    report(&outcome);
    Ok(())
}

pub fn clear(bench: &mut Workbench) -> Result<()> {
    let outcome = bench.replay.clear_all(&mut bench.requests);
    report(&outcome);
    Ok(())
}

pub async fn replay(
    bench: &mut Workbench,
    id: &str,
    times: u32,
    interval_ms: u64,
    view: ViewMode,
) -> Result<()> {
    let record = bench.replay.select(&mut bench.requests, id)?;
    bench.replay.set_view_mode(view);
    let times = times.max(1);
    for round in 1..=times {
        if round > 1 && interval_ms > 0 {
            tokio::time::sleep(Duration::from_millis(interval_ms)).await;
        }
        let view = bench
            .replay
            .replay_selected(&mut bench.requests, &bench.config.extender, &bench.transport)
            .await?;
        match view.outcome.response() {
            Some(response) => println!(
                "== {} ({round}/{times}) | {} ==",
                record.title(),
                response.summary_line()
            ),
            None => println!("== {} ({round}/{times}) ==", record.title()),
        }
        println!("{}", view.render(bench.replay.view_mode()));
    }
    Ok(())
}

pub fn preview(bench: &Workbench, args: RequestArgs) -> Result<()> {
    let form = form_from_args(args);
    let text = bench
        .interceptor
        .preview(&form, &bench.config.extender, &bench.transport)?;
    println!("{text}");
    Ok(())
}

pub fn import(bench: &mut Workbench, file: &Path) -> Result<()> {
    let raw = std::fs::read_to_string(file)
        .with_context(|| format!("failed to read {}", file.display()))?;
    let value: serde_json::Value =
        serde_json::from_str(&raw).with_context(|| format!("{} is not JSON", file.display()))?;
    let outcome = bench.requests.save_all_json(&value);
    report(&outcome);
    println!("Imported {} requests.", bench.requests.load_all().len());
    Ok(())
}

pub fn export(bench: &mut Workbench, file: Option<PathBuf>) -> Result<()> {
    let path = file.unwrap_or_else(|| bench.paths.exports_dir.join("saved-requests.json"));
    let records = bench.requests.load_all();
    let contents = serde_json::to_string_pretty(&records)?;
    std::fs::write(&path, contents).with_context(|| format!("failed to write {}", path.display()))?;
    println!("Exported {} requests to {}", records.len(), path.display());
    Ok(())
}

pub fn sitemap(bench: &mut Workbench, in_scope_only: bool) -> Result<()> {
    let records = bench.requests.load_all();
    let scope = bench.scope.scope();
    let map = SiteMap::build(
        records
            .iter()
            .filter(|record| !in_scope_only || scope.is_in_scope(&record.url)),
    );
    println!(
        "Requests: {} | Hosts: {} | Filter: {}",
        map.request_count,
        map.host_count(),
        if in_scope_only { "in-scope only" } else { "all" }
    );
    if map.is_empty() {
        println!("No traffic saved yet.");
    }
    for host in map.hosts.values() {
        println!("{} ({} hits)", host.name, host.count);
        for row in host.flatten() {
            println!(
                "{}{} ({} hits)",
                "  ".repeat(row.depth + 1),
                row.node.name,
                row.node.count
            );
        }
    }
    Ok(())
}

pub fn scope(bench: &mut Workbench, command: ScopeCommand) -> Result<()> {
    let store = &mut bench.scope;
    let outcome = match command {
        ScopeCommand::Show => {
            let scope = store.scope();
            println!("Enabled: {}", if scope.enabled { "yes" } else { "no" });
            println!("Hosts: {}", scope.hosts.join(", "));
            println!("Paths: {}", scope.path_prefixes.join(", "));
            return Ok(());
        }
        ScopeCommand::Enable => store.set_enabled(true),
        ScopeCommand::Disable => store.set_enabled(false),
        ScopeCommand::AddHost { host } => store.add_host(&host)?,
        ScopeCommand::AddPath { prefix } => store.add_path_prefix(&prefix)?,
        ScopeCommand::RemoveHost { host } => store.remove_host(&host),
        ScopeCommand::RemovePath { prefix } => store.remove_path_prefix(&prefix),
        ScopeCommand::Clear => store.clear(),
    };
    report(&outcome);
    Ok(())
}
