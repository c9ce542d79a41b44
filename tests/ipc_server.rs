use std::fs;
use std::io::{BufRead, BufReader, Write};
use std::net::TcpStream;
use std::sync::Arc;
use std::thread;

use codegraph::api::ApiServer;
use codegraph::application::CodegraphService;
use codegraph::config::CodegraphConfig;
use serde_json::Value;
use tempfile::tempdir;

struct Client {
    stream: TcpStream,
    reader: BufReader<TcpStream>,
}

impl Client {
    fn connect(addr: std::net::SocketAddr) -> Self {
        let stream = TcpStream::connect(addr).expect("Failed to connect to server");
        let reader = BufReader::new(stream.try_clone().unwrap());
        Self { stream, reader }
    }

    fn send(&mut self, request: &str) -> Value {
        self.stream.write_all(request.as_bytes()).unwrap();
        self.stream.write_all(b"\n").unwrap();
        let mut response = String::new();
        self.reader.read_line(&mut response).unwrap();
        serde_json::from_str(&response).unwrap()
    }
}

#[test]
fn test_ipc_server_lifecycle() {
    let projects = tempdir().unwrap();
    fs::create_dir_all(projects.path().join("demo/pkg")).unwrap();
    fs::write(
        projects.path().join("demo/pkg/foo.py"),
        "class Foo:\n    def bar(self):\n        baz()\n\ndef baz():\n    pass\n",
    )
    .unwrap();
    fs::write(projects.path().join("demo/readme.txt"), "").unwrap();

    let config = CodegraphConfig {
        projects_root: projects.path().to_path_buf(),
        ..CodegraphConfig::default()
    };
    let service = Arc::new(CodegraphService::new(&config));
    let server = ApiServer::bind("127.0.0.1:0", service).unwrap();
    let addr = server.local_addr().unwrap();
    let handle = thread::spawn(move || server.run());

    let mut client = Client::connect(addr);

    let pong = client.send(r#"{"command": "PING"}"#);
    assert_eq!(pong["status"], "success");
    assert_eq!(pong["data"], "PONG");

    // no project selected yet
    let tree = client.send(r#"{"command": "TREE"}"#);
    assert_eq!(tree["status"], "error");
    assert_eq!(tree["kind"], "no_active_project");

    let set = client.send(
        r#"{"command": "SET_PROJECT", "params": {"id": 3, "name": "demo", "url": "https://example.com/demo.git"}}"#,
    );
    assert_eq!(set["status"], "success");

    let current = client.send(r#"{"command": "PROJECT"}"#);
    assert_eq!(current["data"]["name"], "demo");
    assert_eq!(current["data"]["id"], 3);

    let tree = client.send(r#"{"command": "TREE", "params": {"lang": "python"}}"#);
    assert_eq!(tree["status"], "success");
    let entries = tree["data"].as_array().unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0]["name"], "pkg");
    assert_eq!(entries[0]["children"][0]["name"], "foo.py");

    let graph = client.send(r#"{"command": "GRAPH", "params": {"filepath": "pkg/foo.py"}}"#);
    assert_eq!(graph["status"], "success");
    let nodes = graph["data"]["nodeDataArray"].as_array().unwrap();
    assert_eq!(nodes.len(), 3);
    assert_eq!(nodes[1]["key"], "Foo.bar");
    let links = graph["data"]["linkDataArray"].as_array().unwrap();
    assert_eq!(links.len(), 2);

    let missing = client.send(r#"{"command": "GRAPH", "params": {"filepath": "pkg/nope.py"}}"#);
    assert_eq!(missing["status"], "error");
    assert_eq!(missing["kind"], "not_found");

    let unsupported = client.send(r#"{"command": "GRAPH", "params": {"filepath": "readme.txt"}}"#);
    assert_eq!(unsupported["kind"], "unsupported_input");

    let unknown = client.send(r#"{"command": "ANALYZE"}"#);
    assert_eq!(unknown["status"], "error");
    assert_eq!(unknown["kind"], "request");

    let cleared = client.send(r#"{"command": "CLEAR_PROJECT"}"#);
    assert_eq!(cleared["status"], "success");
    let current = client.send(r#"{"command": "PROJECT"}"#);
    assert!(current["data"].is_null());

    let bye = client.send(r#"{"command": "SHUTDOWN"}"#);
    assert_eq!(bye["status"], "success");

    handle.join().unwrap().unwrap();
}

#[test]
fn test_invalid_json_is_reported() {
    let dir = tempdir().unwrap();
    let config = CodegraphConfig {
        projects_root: dir.path().to_path_buf(),
        ..CodegraphConfig::default()
    };
    let server = ApiServer::bind("127.0.0.1:0", Arc::new(CodegraphService::new(&config))).unwrap();
    let addr = server.local_addr().unwrap();
    let handle = thread::spawn(move || server.run());

    let mut client = Client::connect(addr);
    let response = client.send("{not json");
    assert_eq!(response["status"], "error");
    assert!(response["message"]
        .as_str()
        .unwrap()
        .contains("Invalid JSON format"));

    client.send(r#"{"command": "SHUTDOWN"}"#);
    handle.join().unwrap().unwrap();
}
