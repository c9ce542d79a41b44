use std::io::{BufRead, BufReader, Write};
use std::net::{SocketAddr, TcpListener, TcpStream};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;

use anyhow::{anyhow, bail, Context, Result};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{debug, info, warn};

use crate::api::dto::GraphDto;
use crate::application::CodegraphService;
use crate::domain::{Language, Project};
use crate::error::CodegraphError;

#[derive(Debug, Deserialize)]
struct CommandReq {
    command: String,
    params: Option<Value>,
}

#[derive(Debug, Deserialize)]
struct GraphParams {
    filepath: PathBuf,
}

#[derive(Debug, Default, Deserialize)]
struct TreeParams {
    lang: Option<String>,
}

/// Line-delimited JSON server. One request per line, one response per line.
pub struct ApiServer {
    listener: TcpListener,
    service: Arc<CodegraphService>,
    shutdown: Arc<AtomicBool>,
}

impl ApiServer {
    pub fn bind(address: &str, service: Arc<CodegraphService>) -> Result<Self> {
        let listener = TcpListener::bind(address)
            .with_context(|| format!("Failed to bind to {}", address))?;
        Ok(Self {
            listener,
            service,
            shutdown: Arc::new(AtomicBool::new(false)),
        })
    }

    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }

    /// Accept connections until a client sends SHUTDOWN.
    pub fn run(&self) -> Result<()> {
        let address = self.local_addr()?;
        info!(%address, "API server listening");

        for stream in self.listener.incoming() {
            if self.shutdown.load(Ordering::SeqCst) {
                break;
            }
            match stream {
                Ok(stream) => {
                    let handler = Handler {
                        service: Arc::clone(&self.service),
                        shutdown: Arc::clone(&self.shutdown),
                        address,
                    };
                    thread::spawn(move || {
                        if let Err(e) = handler.serve(stream) {
                            warn!(error = %e, "connection error");
                        }
                    });
                }
                Err(e) => warn!(error = %e, "accept error"),
            }
        }

        info!("API server stopped");
        Ok(())
    }
}

struct Handler {
    service: Arc<CodegraphService>,
    shutdown: Arc<AtomicBool>,
    address: SocketAddr,
}

impl Handler {
    fn serve(&self, mut stream: TcpStream) -> Result<()> {
        let mut reader = BufReader::new(stream.try_clone()?);
        let mut line = String::new();

        loop {
            line.clear();
            if reader.read_line(&mut line)? == 0 {
                break;
            }
            let trimmed = line.trim();
            if trimmed.is_empty() {
                continue;
            }

            let (response, stop) = match self.process(trimmed) {
                Ok((data, stop)) => (json!({ "status": "success", "data": data }), stop),
                Err(e) => (error_response(&e), false),
            };

            let mut out = serde_json::to_string(&response)?;
            out.push('\n');
            stream.write_all(out.as_bytes())?;

            if stop {
                self.request_shutdown();
                break;
            }
        }
        Ok(())
    }

    /// The data to return, and whether the server should stop afterwards.
    fn process(&self, json_str: &str) -> Result<(Value, bool)> {
        let req: CommandReq = serde_json::from_str(json_str).context("Invalid JSON format")?;
        debug!(command = %req.command, "request");

        let data = match req.command.as_str() {
            "PING" => json!("PONG"),
            "GRAPH" => self.handle_graph(req.params)?,
            "TREE" => self.handle_tree(req.params)?,
            "SET_PROJECT" => self.handle_set_project(req.params)?,
            "CLEAR_PROJECT" => {
                self.service.projects().clear();
                Value::Null
            }
            "PROJECT" => serde_json::to_value(self.service.projects().current())?,
            "SHUTDOWN" => return Ok((json!("Shutting down..."), true)),
            _ => bail!("Unknown command: {}", req.command),
        };
        Ok((data, false))
    }

    fn handle_graph(&self, params: Option<Value>) -> Result<Value> {
        let params = params.ok_or_else(|| anyhow!("Missing params for GRAPH"))?;
        let params: GraphParams =
            serde_json::from_value(params).context("Missing 'filepath' param")?;
        let graph = self.service.graph(&params.filepath)?;
        Ok(serde_json::to_value(GraphDto::from(&graph))?)
    }

    fn handle_tree(&self, params: Option<Value>) -> Result<Value> {
        let params: TreeParams = match params {
            Some(params) => serde_json::from_value(params).context("Invalid params for TREE")?,
            None => TreeParams::default(),
        };
        let language = params
            .lang
            .map(|l| l.parse::<Language>().map_err(|e| anyhow!(e)))
            .transpose()?;
        let tree = self.service.tree(language)?;
        Ok(serde_json::to_value(tree)?)
    }

    fn handle_set_project(&self, params: Option<Value>) -> Result<Value> {
        let params = params.ok_or_else(|| anyhow!("Missing params for SET_PROJECT"))?;
        let project: Project =
            serde_json::from_value(params).context("SET_PROJECT needs 'id' and 'name'")?;
        let root = self.service.projects().projects_root().join(&project.name);
        self.service.projects().set_current(project);
        Ok(json!({ "root": root }))
    }

    fn request_shutdown(&self) {
        info!("shutdown requested");
        self.shutdown.store(true, Ordering::SeqCst);
        // Wake the accept loop so it can observe the flag.
        let _ = TcpStream::connect(self.address);
    }
}

fn error_response(e: &anyhow::Error) -> Value {
    let kind = e
        .downcast_ref::<CodegraphError>()
        .map(|e| e.kind())
        .unwrap_or("request");
    json!({
        "status": "error",
        "kind": kind,
        "message": e.to_string(),
    })
}
