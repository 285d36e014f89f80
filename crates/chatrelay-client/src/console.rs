//! The operator console loop.
//!
//! Two streams meet here: lines typed on standard input go to the server,
//! and lines relayed by the server go to standard output.  Standard input
//! is read on its own task so a terminal blocked waiting for the operator
//! never stalls the event loop printing relayed traffic.

use std::sync::Arc;

use tracing::{info, warn};

use chatrelay_core::line_reader;

use crate::connection::{ClientConfig, ClientError, ClientEvent, ServerConnection};

/// Runs the console client until the server connection ends.
///
/// Every stdin line is forwarded verbatim – including `exit` and `down`,
/// which the *server* interprets.  Local end-of-input (Ctrl-D) disconnects.
/// Relayed lines are printed verbatim to stdout.
///
/// # Errors
///
/// Returns [`ClientError::ConnectFailed`] when the server cannot be reached.
pub async fn run_console(config: ClientConfig) -> Result<(), ClientError> {
    let connection = Arc::new(ServerConnection::new(config));
    let mut events = connection.clone().start().await?;

    let stdin_conn = Arc::clone(&connection);
    tokio::spawn(async move {
        let mut lines = line_reader(tokio::io::stdin());
        loop {
            match lines.next_line().await {
                Ok(Some(line)) => stdin_conn.send_line(&line).await,
                Ok(None) => {
                    info!("end of input, disconnecting");
                    stdin_conn.disconnect().await;
                    break;
                }
                Err(e) => {
                    warn!("stdin read error: {e}");
                    stdin_conn.disconnect().await;
                    break;
                }
            }
        }
    });

    while let Some(event) = events.recv().await {
        match event {
            ClientEvent::Connected { server_addr } => {
                info!("talking to {server_addr}; type lines to relay, Ctrl-D to leave");
            }
            ClientEvent::LineReceived(line) => println!("{line}"),
            ClientEvent::Disconnected => break,
        }
    }

    Ok(())
}
