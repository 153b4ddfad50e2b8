use std::io::{BufRead, BufReader, Write};
use std::net::{TcpListener, TcpStream};
use std::sync::Arc;
use std::thread;

use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::json;

use crate::api::dto::GraphDto;
use crate::application::build_positioned_graph;
use crate::config::GraphConfig;
use crate::domain::identity::IdentityPolicy;
use crate::domain::span::Span;
use crate::domain::tag_values::{available_tags, query_tag_values, TagValuesQuery};
use crate::infrastructure::TreeLayoutEngine;

#[derive(Debug, Deserialize)]
struct CommandReq {
    command: String,
    params: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct GraphParams {
    spans: Vec<Span>,
    #[serde(default)]
    strict: bool,
}

#[derive(Debug, Deserialize)]
struct SpansParams {
    spans: Vec<Span>,
}

#[derive(Debug, Deserialize)]
struct TagValuesParams {
    spans: Vec<Span>,
    #[serde(flatten)]
    query: TagValuesQuery,
}

pub fn start_server(port: u16, config: GraphConfig) -> Result<()> {
    let address = format!("127.0.0.1:{}", port);
    let listener = TcpListener::bind(&address)
        .with_context(|| format!("Failed to bind to {}", address))?;

    tracing::info!(%address, "command server listening");

    let config = Arc::new(config);
    for stream in listener.incoming() {
        match stream {
            Ok(stream) => {
                let config = Arc::clone(&config);
                thread::spawn(move || {
                    if let Err(e) = handle_connection(stream, &config) {
                        tracing::warn!(error = %e, "connection error");
                    }
                });
            }
            Err(e) => tracing::warn!(error = %e, "accept error"),
        }
    }

    Ok(())
}

fn handle_connection(mut stream: TcpStream, config: &GraphConfig) -> Result<()> {
    let mut reader = BufReader::new(stream.try_clone()?);
    let mut line = String::new();

    loop {
        line.clear();
        let bytes_read = reader.read_line(&mut line)?;
        if bytes_read == 0 {
            break;
        }

        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }

        let response = respond(trimmed, config);
        let response_str = serde_json::to_string(&response)?;
        stream.write_all(response_str.as_bytes())?;
        stream.write_all(b"\n")?;

        if let Ok(req) = serde_json::from_str::<CommandReq>(trimmed) {
            if req.command == "SHUTDOWN" {
                tracing::info!("shutdown requested");
                std::process::exit(0);
            }
        }
    }
    Ok(())
}

/// Wrap a command result in the `{ status, data | message }` envelope.
pub fn respond(json_str: &str, config: &GraphConfig) -> serde_json::Value {
    match process_command(json_str, config) {
        Ok(data) => json!({
            "status": "success",
            "data": data
        }),
        Err(e) => json!({
            "status": "error",
            "message": format!("{:#}", e)
        }),
    }
}

pub fn process_command(json_str: &str, config: &GraphConfig) -> Result<serde_json::Value> {
    let req: CommandReq = serde_json::from_str(json_str)
        .context("Invalid JSON format")?;

    match req.command.as_str() {
        "PING" => Ok(json!("PONG")),
        "GRAPH" => handle_graph(parse_params(req.params, "GRAPH")?, config),
        "AVAILABLE_TAGS" => {
            let params: SpansParams = parse_params(req.params, "AVAILABLE_TAGS")?;
            Ok(serde_json::to_value(available_tags(&params.spans))?)
        }
        "TAG_VALUES" => {
            let params: TagValuesParams = parse_params(req.params, "TAG_VALUES")?;
            let page = query_tag_values(&params.spans, &params.query)?;
            Ok(serde_json::to_value(page)?)
        }
        "SHUTDOWN" => Ok(json!("Shutting down...")),
        _ => anyhow::bail!("Unknown command: {}", req.command),
    }
}

fn parse_params<T: DeserializeOwned>(params: Option<serde_json::Value>, command: &str) -> Result<T> {
    let params = params.ok_or_else(|| anyhow::anyhow!("Missing params for {}", command))?;
    serde_json::from_value(params).with_context(|| format!("Invalid params for {}", command))
}

fn handle_graph(params: GraphParams, config: &GraphConfig) -> Result<serde_json::Value> {
    let mut config = config.clone();
    if params.strict {
        config.identity.policy = IdentityPolicy::Strict;
    }

    tracing::debug!(spans = params.spans.len(), "building graph");

    let layout = TreeLayoutEngine::new(&config.layout);
    let graph = build_positioned_graph(&params.spans, &layout, &config)?;
    Ok(serde_json::to_value(GraphDto::from_positioned(&graph, &config))?)
}
