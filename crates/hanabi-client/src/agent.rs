//! Session orchestrator: wires the network client, the dispatcher, and the
//! decision worker together and runs them until the game ends.
//!
//! The dispatch loop runs on the async runtime; the decision worker runs on
//! its own OS thread and is joined before [`run`] returns.

use std::sync::Arc;

use hanabi_core::protocol::ClientMessage;
use hanabi_core::transport::{Transport, TransportError};

use crate::chooser::MoveChooser;
use crate::config::AgentConfig;
use crate::dispatcher::{Dispatcher, Flow, Outcome};
use crate::error::AgentError;
use crate::net_client::{NetClient, NetEvent};
use crate::session::{SessionState, Status};
use crate::worker::DecisionWorker;

/// Connect to `config.address()` over TCP and play one game.
pub async fn connect_and_run<C: MoveChooser>(
    config: &AgentConfig,
    chooser: C,
    session: Arc<SessionState>,
) -> Result<Outcome, AgentError> {
    tracing::info!(address = %config.address(), player = %config.name, "connecting");
    let net = NetClient::connect(&config.host, config.port).await?;
    play(net, config, chooser, session).await
}

/// Play one game over an already-open transport.
///
/// Returns when the server announces the end of the game, when
/// [`SessionState::stop`] is called, or on the first fatal error. In every
/// case the session is stopped and the decision worker has exited.
pub async fn run<T, C>(
    transport: T,
    config: &AgentConfig,
    chooser: C,
    session: Arc<SessionState>,
) -> Result<Outcome, AgentError>
where
    T: Transport,
    C: MoveChooser,
{
    play(NetClient::from_transport(transport), config, chooser, session).await
}

async fn play<C: MoveChooser>(
    mut net: NetClient,
    config: &AgentConfig,
    chooser: C,
    session: Arc<SessionState>,
) -> Result<Outcome, AgentError> {
    net.send(ClientMessage::Join {
        sender: config.name.clone(),
    })
    .map_err(|_| TransportError::ConnectionClosed)?;

    let worker = DecisionWorker::new(
        &config.name,
        Arc::clone(&session),
        chooser,
        net.outbound(),
        config.decision_retries,
    )
    .spawn()
    .map_err(AgentError::Worker)?;

    let mut dispatcher = Dispatcher::new(&config.name, Arc::clone(&session), net.outbound());
    let result = dispatch_loop(&mut net, &mut dispatcher, &session).await;

    if let Err(e) = &result {
        tracing::error!(error = %e, "session failed");
        session.advance(Status::Aborted);
    }
    session.stop();
    net.close();

    match tokio::task::spawn_blocking(move || worker.join()).await {
        Ok(Ok(())) => {}
        Ok(Err(_)) => tracing::error!("decision worker panicked"),
        Err(e) => tracing::error!(error = %e, "could not join decision worker"),
    }
    result
}

async fn dispatch_loop(
    net: &mut NetClient,
    dispatcher: &mut Dispatcher,
    session: &SessionState,
) -> Result<Outcome, AgentError> {
    loop {
        tokio::select! {
            _ = session.stopped() => {
                tracing::info!("stop requested");
                session.advance(Status::Aborted);
                return Ok(Outcome::Interrupted);
            }

            event = net.incoming.recv() => match event {
                Some(NetEvent::Message(msg)) => {
                    if let Flow::Stop(outcome) = dispatcher.handle(msg)? {
                        return Ok(outcome);
                    }
                }
                Some(NetEvent::Error(e)) => return Err(e.into()),
                Some(NetEvent::Disconnected) | None => {
                    return Err(TransportError::ConnectionClosed.into());
                }
            }
        }
    }
}
