/// Command dispatch of the JSON-lines server, without a socket.

use serde_json::json;
use trace_graph::api::server::{process_command, respond};
use trace_graph::config::GraphConfig;

fn spans() -> serde_json::Value {
    json!([
        {
            "span": { "spanId": "a", "attributes": { "http.method": "GET" },
                      "startTimeUnixNano": 10, "endTimeUnixNano": 20 },
            "resource": { "attributes": { "service.name": "gateway" } },
            "externalFields": { "duration": 3000000 }
        },
        {
            "span": { "spanId": "b", "parentSpanId": "a", "status": { "code": 2 },
                      "attributes": { "http.method": "POST" },
                      "startTimeUnixNano": 12, "endTimeUnixNano": 18 },
            "resource": { "attributes": { "service.name": "orders" } },
            "externalFields": { "duration": 1500000 }
        },
        {
            "span": { "spanId": "c", "parentSpanId": "a",
                      "attributes": { "http.method": "GET" },
                      "startTimeUnixNano": 30, "endTimeUnixNano": 40 },
            "resource": { "attributes": { "service.name": "orders" } },
            "externalFields": { "duration": 500000 }
        }
    ])
}

fn run(command: serde_json::Value) -> serde_json::Value {
    process_command(&command.to_string(), &GraphConfig::default()).unwrap()
}

#[test]
fn ping() {
    assert_eq!(run(json!({ "command": "PING" })), json!("PONG"));
}

#[test]
fn graph_command_returns_dto() {
    let data = run(json!({ "command": "GRAPH", "params": { "spans": spans() } }));

    let nodes = data["nodes"].as_array().unwrap();
    let edges = data["edges"].as_array().unwrap();
    assert_eq!(nodes.len(), 2);
    assert_eq!(edges.len(), 1);

    assert_eq!(edges[0]["source"], "n0");
    assert_eq!(edges[0]["target"], "n1");
    assert_eq!(edges[0]["data"]["count"], 2);
    assert_eq!(edges[0]["data"]["time"], "2ms");
    assert_eq!(nodes[1]["data"]["hasError"], true);

    // parent row above child row
    let parent_y = nodes[0]["position"]["y"].as_f64().unwrap();
    let child_y = nodes[1]["position"]["y"].as_f64().unwrap();
    assert!(parent_y < child_y);
}

#[test]
fn strict_graph_reports_unresolvable_span() {
    let response = respond(
        &json!({
            "command": "GRAPH",
            "params": { "spans": [ { "span": { "spanId": "x" } } ], "strict": true }
        })
        .to_string(),
        &GraphConfig::default(),
    );
    assert_eq!(response["status"], "error");
    assert!(response["message"].as_str().unwrap().contains("span x"));
}

#[test]
fn available_tags_command() {
    let data = run(json!({ "command": "AVAILABLE_TAGS", "params": { "spans": spans() } }));
    assert_eq!(data, json!([{ "name": "span.attributes.http.method", "type": "string" }]));
}

#[test]
fn tag_values_command_with_timeframe() {
    let data = run(json!({
        "command": "TAG_VALUES",
        "params": {
            "spans": spans(),
            "tag": "span.attributes.http.method",
            "query": { "timeframe": { "startTime": 0, "endTime": 25 } },
            "pageSize": 10
        }
    }));
    assert_eq!(data["total"], 2);
    assert_eq!(data["nextPage"], serde_json::Value::Null);
    let values = data["values"].as_array().unwrap();
    assert!(values.iter().all(|v| v["occurrences"] == 1));
}

#[test]
fn errors_are_wrapped() {
    let config = GraphConfig::default();
    assert_eq!(respond("not json", &config)["status"], "error");
    assert_eq!(respond(r#"{"command":"NOPE"}"#, &config)["status"], "error");
    let missing = respond(r#"{"command":"GRAPH"}"#, &config);
    assert!(missing["message"].as_str().unwrap().contains("Missing params for GRAPH"));
}

#[test]
fn graph_command_handles_a_deep_service_chain_on_a_connection_thread() {
    let chain: Vec<serde_json::Value> = (0..5_000)
        .map(|i| {
            let mut span = json!({ "spanId": format!("s{}", i) });
            if i > 0 {
                span["parentSpanId"] = json!(format!("s{}", i - 1));
            }
            json!({
                "span": span,
                "resource": { "attributes": { "service.name": format!("svc-{}", i) } }
            })
        })
        .collect();
    let request = json!({ "command": "GRAPH", "params": { "spans": chain } }).to_string();

    // connection threads run on the default spawned-thread stack
    let response = std::thread::spawn(move || respond(&request, &GraphConfig::default()))
        .join()
        .expect("connection thread");

    assert_eq!(response["status"], "success");
    let nodes = response["data"]["nodes"].as_array().unwrap();
    assert_eq!(nodes.len(), 5_000);
    assert_eq!(response["data"]["edges"].as_array().unwrap().len(), 4_999);
    let ys: Vec<f64> = nodes
        .iter()
        .map(|n| n["position"]["y"].as_f64().unwrap())
        .collect();
    assert!(ys.windows(2).all(|w| w[0] < w[1]));
}
