//! Submits a script to the engine and prints what it streams back.
//!
//! ```text
//! RELAY_ENDPOINT__URL=ws://localhost:4040 cargo run -p relay-client --example run_job -- job.aql
//! ```

use relay_client::engine::{self, EngineEvent};
use relay_client::{Client, ConnectionState, Subscriber};
use std::time::Duration;
use tokio::sync::mpsc;

enum Done {
    Finished(bool),
    Disconnected(String),
}

#[actix_rt::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let script = match std::env::args().nth(1) {
        Some(path) => std::fs::read_to_string(path)?,
        None => "EXTRACT 'hello' FROM CONSOLE".to_string(),
    };

    let client = Client::load()?;
    let channel = client.connect()?;

    let (done_tx, mut done_rx) = mpsc::unbounded_channel();
    let (err_tx, complete_tx) = (done_tx.clone(), done_tx.clone());
    let subscription = channel.subscribe(
        Subscriber::new(move |env| match EngineEvent::parse(env) {
            Ok(EngineEvent::Log(line)) => print!("log    | {}", line.entry),
            Ok(EngineEvent::Result(row) | EngineEvent::Output(row)) => {
                print!("result | {}", row.entry)
            }
            Ok(EngineEvent::RunFinished(outcome)) => {
                if let Some(error) = &outcome.error {
                    eprintln!("job failed: {}", error);
                }
                let _ = done_tx.send(Done::Finished(outcome.success));
            }
            Ok(other) => println!("other  | {:?}", other),
            Err(e) => eprintln!("unexpected body for '{}': {}", env.kind, e),
        })
        .on_error(move |err| {
            if err.is_terminal() {
                let _ = err_tx.send(Done::Disconnected(err.to_string()));
            } else {
                eprintln!("skipping frame: {}", err);
            }
        })
        .on_complete(move || {
            let _ = complete_tx.send(Done::Disconnected("engine closed the connection".into()));
        }),
    );

    while matches!(channel.state(), ConnectionState::Idle | ConnectionState::Connecting) {
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    if channel.state() != ConnectionState::Open {
        eprintln!("could not reach {}", channel.url());
        return Ok(());
    }

    channel.send(&engine::run_script(script));

    match done_rx.recv().await {
        Some(Done::Finished(true)) => println!("job succeeded"),
        Some(Done::Finished(false)) => println!("job failed"),
        Some(Done::Disconnected(reason)) => eprintln!("disconnected: {}", reason),
        None => {}
    }
    subscription.release();
    Ok(())
}
