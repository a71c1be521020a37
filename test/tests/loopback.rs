//! End-to-end over real sockets: one hub, two satellites, loopback TCP.

use std::time::Duration;

use tokio::sync::mpsc;
use tokio::time::timeout;

use shiai_client::{ClientConfig, Command, SessionEvent};
use shiai_server::{Server, ServerCommand, ServerConfig};
use shiai_shared::actions::AddCategory;
use shiai_shared::id::{IdGenerator, TournamentId};
use shiai_shared::store::tournament::TournamentStore;

fn tournament() -> TournamentStore {
    TournamentStore::new(TournamentId::new(1), "spring cup".into())
}

struct TestClient {
    commands: mpsc::UnboundedSender<Command>,
    events: mpsc::UnboundedReceiver<SessionEvent>,
    task: tokio::task::JoinHandle<()>,
}

async fn connect(addr: std::net::SocketAddr) -> TestClient {
    let (command_tx, command_rx) = mpsc::unbounded_channel();
    let (event_tx, event_rx) = mpsc::unbounded_channel();
    let config = ClientConfig::new(addr);
    let task = tokio::spawn(async move {
        if let Err(err) = shiai_client::run(config, tournament(), command_rx, event_tx).await {
            panic!("client exited with error: {err}");
        }
    });
    TestClient {
        commands: command_tx,
        events: event_rx,
        task,
    }
}

impl TestClient {
    async fn next_event(&mut self) -> SessionEvent {
        timeout(Duration::from_secs(5), self.events.recv())
            .await
            .expect("timed out waiting for a session event")
            .expect("event channel closed")
    }

    async fn wait_live(&mut self) {
        loop {
            match self.next_event().await {
                SessionEvent::StoreReset => return,
                SessionEvent::ClockSynchronized { .. } => {}
                other => panic!("unexpected event before live: {other:?}"),
            }
        }
    }

    async fn wait_confirmation(&mut self) {
        loop {
            match self.next_event().await {
                SessionEvent::ActionConfirmed(_) => return,
                SessionEvent::ClockSynchronized { .. } => {}
                other => panic!("unexpected event while live: {other:?}"),
            }
        }
    }
}

#[tokio::test]
async fn two_satellites_share_actions_through_the_hub() {
    let _ = env_logger::builder().is_test(true).try_init();

    let config = ServerConfig::new("127.0.0.1:0".parse().expect("loopback addr"));
    let server = Server::bind(config, tournament()).await.expect("bind");
    let addr = server.local_addr().expect("local addr");
    let (server_commands, server_rx) = mpsc::unbounded_channel();
    let server_task = tokio::spawn(server.run(server_rx));

    let mut first = connect(addr).await;
    first.wait_live().await;
    let mut second = connect(addr).await;
    second.wait_live().await;

    // An edit from the first satellite reaches both: the sender as its own
    // confirmation echo, the other as a foreign confirmation.
    let action = {
        let mut generator = IdGenerator::from_seed(7);
        AddCategory::new(&tournament(), &mut generator, "u73".into())
    };
    first
        .commands
        .send(Command::Dispatch(action.into()))
        .expect("command channel");
    first.wait_confirmation().await;
    second.wait_confirmation().await;

    // A hub-local edit fans out the same way.
    let action = {
        let mut generator = IdGenerator::from_seed(8);
        AddCategory::new(&tournament(), &mut generator, "u81".into())
    };
    server_commands
        .send(ServerCommand::Dispatch(action.into()))
        .expect("server command channel");
    first.wait_confirmation().await;
    second.wait_confirmation().await;

    // Orderly shutdown: the hub broadcasts quit and both sessions close.
    server_commands
        .send(ServerCommand::Shutdown)
        .expect("server command channel");
    loop {
        if let SessionEvent::Closed = first.next_event().await {
            break;
        }
    }
    loop {
        if let SessionEvent::Closed = second.next_event().await {
            break;
        }
    }
    first.task.await.expect("first client task");
    second.task.await.expect("second client task");
    server_task.await.expect("server task").expect("server run");
}
