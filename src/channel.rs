use crate::dispatch::execute;
use crate::dispatch::meta_messages;
use crate::dispatch::parse_command;
use crate::dispatch::StatusMessage;
use crate::identity::NodeInfo;
use crate::relay_bank::RelayBank;

use anyhow::Result;
use log::debug;
use log::info;
use redis::Client;
use redis::Commands;
use redis::Connection;

// All command topics live under this pattern; replies go out on
// relay/status/... topics, which the parser drops as non-matching.
const COMMAND_PATTERN: &str = "relay/*";

pub fn publish_all(connection: &mut Connection, messages: &[StatusMessage]) -> Result<()> {
    for message in messages {
        debug!("Publishing '{}' on '{}'", message.payload, message.topic);
        let _: () = connection.publish(&message.topic, &message.payload)?;
    }
    Ok(())
}

/// Subscribes to the command pattern, announces our presence and dispatches
/// inbound messages one at a time until the connection drops. Messages are
/// handled to completion before the next one is read, so the relay bank only
/// ever sees a single caller.
pub fn serve(client: &Client, bank: &mut RelayBank, node: &NodeInfo) -> Result<()> {
    let mut publisher = client.get_connection()?;
    let mut subscriber = client.get_connection()?;
    let mut pubsub = subscriber.as_pubsub();
    pubsub.psubscribe(COMMAND_PATTERN)?;

    info!("Connected, listening for commands on '{}'", COMMAND_PATTERN);
    publish_all(&mut publisher, &meta_messages(node))?;

    loop {
        let message = pubsub.get_message()?;
        let topic = message.get_channel_name().to_string();
        let payload = message.get_payload_bytes().to_vec();
        debug!("Message arrived on topic '{}'", topic);

        let command = match parse_command(&topic, &payload, &node.identity) {
            Some(command) => command,
            None => continue,
        };

        let replies = execute(command, bank, node)?;
        publish_all(&mut publisher, &replies)?;
    }
}
