use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio::time::timeout;

use shiai_shared::actions::Action;
use shiai_shared::protocol::{clock, codec};
use shiai_shared::store::tournament::TournamentStore;
use shiai_shared::store_manager::StoreManagerError;

use crate::config::ClientConfig;
use crate::error::ClientError;
use crate::session::{Session, SessionError, SessionEvent, SessionState};

/// User-issued commands, fed to the event loop over a channel so the
/// embedding layer never touches the socket.
#[derive(Debug)]
pub enum Command {
    Dispatch(Action),
    Undo,
    Redo,
    Quit,
}

/// Connects to the server and runs the single event loop until the session
/// closes. All store mutation happens on this task; the embedder interacts
/// through the command channel and observes through the event channel.
pub async fn run(
    config: ClientConfig,
    store: TournamentStore,
    mut commands: mpsc::UnboundedReceiver<Command>,
    events: mpsc::UnboundedSender<SessionEvent>,
) -> Result<(), ClientError> {
    let stream = timeout(config.connect_timeout, TcpStream::connect(config.server_addr))
        .await
        .map_err(|_| ClientError::ConnectTimeout)??;
    stream.set_nodelay(true)?;
    log::info!("connected to {}", config.server_addr);
    let (mut reader, mut writer) = stream.into_split();

    let mut session = Session::new(store);
    session.on_connected();

    loop {
        for message in session.take_outbound() {
            codec::write_message(&mut writer, &message).await?;
        }
        for event in session.take_events() {
            // A closed receiver just means the embedder stopped listening.
            let _ = events.send(event);
        }
        if session.state() == SessionState::Closed {
            return Ok(());
        }

        tokio::select! {
            message = codec::read_message(&mut reader) => {
                session.handle_message(message?, clock::unix_millis())?;
            }
            command = commands.recv() => {
                let result = match command {
                    Some(Command::Dispatch(action)) => session.dispatch(action),
                    Some(Command::Undo) => session.undo(),
                    Some(Command::Redo) => session.redo(),
                    Some(Command::Quit) | None => {
                        session.quit();
                        Ok(())
                    }
                };
                if let Err(err) = result {
                    if command_error_is_fatal(&err) {
                        return Err(err.into());
                    }
                    log::warn!("command rejected: {err}");
                }
            }
        }
    }
}

/// Rejected user commands are survivable; divergence from the authority is
/// not.
fn command_error_is_fatal(err: &SessionError) -> bool {
    matches!(
        err,
        SessionError::StoreManager(StoreManagerError::Desynchronized)
    )
}
