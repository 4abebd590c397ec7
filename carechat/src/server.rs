//! HTTP surface: the one-field form page, its JSON endpoint and a health probe.

use crate::handler::RequestHandler;
use anyhow::Result;
use axum::extract::State;
use axum::response::Html;
use axum::routing::{get, post};
use axum::{Form, Json, Router};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::info;

type HandlerArc = Arc<RequestHandler>;

#[derive(Debug, Deserialize)]
pub struct RespondRequest {
    #[serde(default)]
    pub input: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RespondResponse {
    pub output: String,
}

pub fn router(handler: HandlerArc) -> Router {
    Router::new()
        .route("/", get(index).post(submit_form))
        .route("/api/respond", post(respond))
        .route("/health", get(health))
        .with_state(handler)
        .layer(TraceLayer::new_for_http())
}

pub async fn run(handler: HandlerArc, addr: SocketAddr) -> Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("Listening on http://{}", listener.local_addr()?);

    axum::serve(listener, router(handler))
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("failed to listen for ctrl-c: {}", e);
        std::future::pending::<()>().await;
    }
}

async fn index() -> Html<String> {
    Html(render_page("", ""))
}

async fn submit_form(
    State(handler): State<HandlerArc>,
    Form(req): Form<RespondRequest>,
) -> Html<String> {
    let output = handler.handle(&req.input).await;
    Html(render_page(&req.input, &output))
}

async fn respond(
    State(handler): State<HandlerArc>,
    Json(req): Json<RespondRequest>,
) -> Json<RespondResponse> {
    let output = handler.handle(&req.input).await;
    Json(RespondResponse { output })
}

async fn health(State(handler): State<HandlerArc>) -> Json<Value> {
    Json(json!({ "status": "ok", "model": handler.model_id() }))
}

const PAGE_TEMPLATE: &str = r#"<!doctype html>
<html lang="en">
<head>
<meta charset="utf-8">
<title>AI Mental Health Assistant</title>
<style>
body { font-family: system-ui, sans-serif; max-width: 960px; margin: 2rem auto; padding: 0 1rem; color: #1f2937; }
.row { display: flex; gap: 1.5rem; flex-wrap: wrap; }
.col { flex: 1 1 320px; display: flex; flex-direction: column; gap: .5rem; }
textarea { width: 100%; box-sizing: border-box; padding: .6rem; border: 1px solid #cbd5e1; border-radius: 8px; font: inherit; }
button { padding: .6rem 1rem; border: 0; border-radius: 8px; background: #6366f1; color: #fff; font: inherit; cursor: pointer; }
button:disabled { opacity: .6; cursor: wait; }
</style>
</head>
<body>
<h2>&#129504; AI Mental Health Chatbot</h2>
<p>Describe how you're feeling, and the AI will analyze and recommend self-care tips.</p>
<form id="chat" method="post" action="/">
<div class="row">
  <div class="col">
    <label for="input">How are you feeling today?</label>
    <textarea id="input" name="input" rows="3" placeholder="e.g., I've been feeling anxious and tired lately...">{{INPUT}}</textarea>
    <button id="submit" type="submit">Analyze &amp; Recommend</button>
  </div>
  <div class="col">
    <label for="output">AI Response</label>
    <textarea id="output" rows="10" readonly>{{OUTPUT}}</textarea>
  </div>
</div>
</form>
<script>
document.getElementById("chat").addEventListener("submit", async (ev) => {
  ev.preventDefault();
  const button = document.getElementById("submit");
  const output = document.getElementById("output");
  button.disabled = true;
  output.value = "";
  try {
    const res = await fetch("/api/respond", {
      method: "POST",
      headers: { "content-type": "application/json" },
      body: JSON.stringify({ input: document.getElementById("input").value }),
    });
    output.value = (await res.json()).output;
  } catch (err) {
    output.value = "⚠️ Error: " + err;
  } finally {
    button.disabled = false;
  }
});
</script>
</body>
</html>
"#;

fn render_page(input: &str, output: &str) -> String {
    PAGE_TEMPLATE
        .replace("{{INPUT}}", &escape_html(input))
        .replace("{{OUTPUT}}", &escape_html(output))
}

fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}
