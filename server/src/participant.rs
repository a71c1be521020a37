//! Per-connection task: handshake, clock sync, then frame pumping.
//!
//! All tournament state lives on the server loop task; a participant task
//! only decodes frames and forwards the interesting ones over a channel.
//! Its outbound half drains a bounded queue, so a stalled connection backs
//! up its own queue instead of the whole hub.

use tokio::net::tcp::OwnedWriteHalf;
use tokio::net::TcpStream;
use tokio::sync::mpsc;

use shiai_shared::actions::Action;
use shiai_shared::id::ClientActionId;
use shiai_shared::protocol::{clock, codec, Message, ProtocolError, ProtocolVersion};

use crate::authority::ParticipantId;
use crate::error::ServerError;

/// What a participant task reports back to the server loop.
#[derive(Debug)]
pub(crate) enum Inbound {
    /// Handshake and clock sync completed; `sender` feeds the outbound queue.
    Joined {
        id: ParticipantId,
        sender: mpsc::Sender<Message>,
    },
    /// The participant acknowledged its sync payload and is live.
    Ready { id: ParticipantId },
    Action {
        id: ParticipantId,
        action_id: ClientActionId,
        action: Action,
    },
    Undo {
        id: ParticipantId,
        action_id: ClientActionId,
    },
    Disconnected { id: ParticipantId },
}

pub(crate) async fn run(
    id: ParticipantId,
    stream: TcpStream,
    inbound: mpsc::UnboundedSender<Inbound>,
    queue_capacity: usize,
) {
    if let Err(err) = drive(id, stream, &inbound, queue_capacity).await {
        log::warn!("participant {}: {}", id, err);
    }
    // Redundant after a clean read loop, but the handshake error paths
    // never announced themselves.
    let _ = inbound.send(Inbound::Disconnected { id });
}

async fn drive(
    id: ParticipantId,
    stream: TcpStream,
    inbound: &mpsc::UnboundedSender<Inbound>,
    queue_capacity: usize,
) -> Result<(), ServerError> {
    stream.set_nodelay(true)?;
    let (mut reader, mut writer) = stream.into_split();

    // The hub speaks first so an incompatible client learns our version
    // before sending anything it would have to retract.
    let ours = ProtocolVersion::current();
    codec::write_message(&mut writer, &Message::Handshake(ours)).await?;
    match codec::read_message(&mut reader).await? {
        Message::Handshake(theirs) => {
            if !ours.compatible_with(&theirs) {
                codec::write_message(&mut writer, &Message::Quit).await?;
                return Err(ProtocolError::IncompatibleVersion { ours, theirs }.into());
            }
        }
        other => return Err(ServerError::UnexpectedMessage(other.label())),
    }

    match codec::read_message(&mut reader).await? {
        Message::ClockSyncRequest => {
            let reply = Message::ClockSync {
                timestamp_ms: clock::unix_millis(),
            };
            codec::write_message(&mut writer, &reply).await?;
        }
        other => return Err(ServerError::UnexpectedMessage(other.label())),
    }

    let (sender, receiver) = mpsc::channel(queue_capacity);
    if inbound
        .send(Inbound::Joined {
            id,
            sender: sender.clone(),
        })
        .is_err()
    {
        // Server loop is gone; nothing left to serve.
        return Ok(());
    }
    let write_task = tokio::spawn(pump_outbound(writer, receiver));

    let result = read_loop(id, &mut reader, &sender, inbound).await;
    // The server loop drops its sender clone once it sees the disconnect;
    // with ours gone too the writer drains what is queued and exits.
    let _ = inbound.send(Inbound::Disconnected { id });
    drop(sender);
    let _ = write_task.await;
    result
}

async fn read_loop(
    id: ParticipantId,
    reader: &mut (impl tokio::io::AsyncRead + Unpin),
    sender: &mpsc::Sender<Message>,
    inbound: &mpsc::UnboundedSender<Inbound>,
) -> Result<(), ServerError> {
    loop {
        let forwarded = match codec::read_message(reader).await? {
            // Clock sync can recur at any time; it never touches shared
            // state, so the reply is queued right here.
            Message::ClockSyncRequest => {
                let reply = Message::ClockSync {
                    timestamp_ms: clock::unix_millis(),
                };
                if sender.send(reply).await.is_err() {
                    return Ok(());
                }
                continue;
            }
            Message::SyncAck => Inbound::Ready { id },
            Message::Action {
                id: action_id,
                action,
            } => Inbound::Action {
                id,
                action_id,
                action,
            },
            Message::Undo { id: action_id } => Inbound::Undo { id, action_id },
            Message::Quit => return Ok(()),
            other => return Err(ServerError::UnexpectedMessage(other.label())),
        };
        if inbound.send(forwarded).is_err() {
            return Ok(());
        }
    }
}

async fn pump_outbound(mut writer: OwnedWriteHalf, mut receiver: mpsc::Receiver<Message>) {
    while let Some(message) = receiver.recv().await {
        let closing = matches!(message, Message::Quit);
        if codec::write_message(&mut writer, &message).await.is_err() {
            break;
        }
        if closing {
            break;
        }
    }
}
