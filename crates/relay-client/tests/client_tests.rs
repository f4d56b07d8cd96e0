// crates/relay-client/tests/client_tests.rs
use relay_client::engine::{self, EngineEvent, RunResponse, ScriptRequest, kinds};
use relay_client::{Client, Config, ConnectionState, Subscriber};
use relay_transport::testing::ScriptedFactory;
use std::time::Duration;
use tokio::sync::mpsc;

const WAIT: Duration = Duration::from_secs(2);

fn client_for(url: &str, factory: &ScriptedFactory) -> Client {
    let mut config = Config::default();
    config.endpoint.url = url.to_string();
    Client::with_factory(config, factory.clone())
}

#[actix_rt::test]
async fn views_share_the_configured_endpoint() {
    let factory = ScriptedFactory::new();
    let client = client_for("ws://engine:4040", &factory);
    let editor = client.clone();
    let dashboard = client.clone();

    let a = editor.connect().unwrap();
    let b = dashboard.connect().unwrap();
    let c = client.connect_to("ws://engine:4040").unwrap();

    assert_eq!(a, b);
    assert_eq!(a, c);
    assert_eq!(a.url(), "ws://engine:4040");
    assert_eq!(factory.created(), 1);
    assert_eq!(client.manager().urls(), vec!["ws://engine:4040"]);
}

#[actix_rt::test]
async fn run_job_round_trip() {
    let factory = ScriptedFactory::new();
    let client = client_for("ws://engine:4040", &factory);
    let channel = client.connect().unwrap();
    let mut remote = factory.take_remote().unwrap();

    let (tx, mut events) = mpsc::unbounded_channel();
    channel.subscribe(Subscriber::new(move |env| {
        let _ = tx.send(EngineEvent::parse(env).expect("engine body"));
    }));

    let deadline = tokio::time::Instant::now() + WAIT;
    while channel.state() != ConnectionState::Open {
        assert!(tokio::time::Instant::now() < deadline, "never opened");
        tokio::time::sleep(Duration::from_millis(5)).await;
    }

    channel.send(&engine::run_script("EXTRACT 'rows' FROM CONSOLE"));
    let frame = remote.next_sent(WAIT).await.expect("RUN frame");
    let sent = relay_core::decode(&frame).unwrap();
    assert_eq!(sent.kind, kinds::RUN);
    let request: ScriptRequest = serde_json::from_value(sent.data).unwrap();
    assert_eq!(request.script, "EXTRACT 'rows' FROM CONSOLE");

    remote.push_frame(r#"{"type":"LOG","data":{"entry":"[INFO] job started"}}"#);
    remote.push_frame(r#"{"type":"RESULT","data":{"entry":"1,2\n"}}"#);
    remote.push_frame(r#"{"type":"RUN","data":{"success":true}}"#);

    let mut seen = Vec::new();
    for _ in 0..3 {
        let event = tokio::time::timeout(WAIT, events.recv()).await.unwrap().unwrap();
        seen.push(event);
    }
    assert!(matches!(&seen[0], EngineEvent::Log(e) if e.entry == "[INFO] job started"));
    assert!(matches!(&seen[1], EngineEvent::Result(e) if e.entry == "1,2\n"));
    assert_eq!(
        seen[2],
        EngineEvent::RunFinished(RunResponse {
            success: true,
            error: None
        })
    );
}
