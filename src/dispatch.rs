use crate::identity::NodeInfo;
use crate::relay_bank::RelayBank;
use crate::relay_types::RelayId;
use crate::relay_types::RelayState;

use anyhow::Result;
use log::debug;

// Sentinel for a topic whose trailing character is not a digit. The relay
// bank rejects it like any other out-of-range id.
const NO_RELAY_ID: u8 = 0xFF;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Command {
    GetIdentity,
    SetRelay { id: u8, state: RelayState },
    TriggerRelay { id: u8, state: RelayState },
    GetRelay { id: u8 },
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StatusMessage {
    pub topic: String,
    pub payload: String,
}

impl StatusMessage {
    fn new<S1: Into<String>, S2: Into<String>>(topic: S1, payload: S2) -> StatusMessage {
        StatusMessage {
            topic: topic.into(),
            payload: payload.into(),
        }
    }
}

/// Maps an inbound (topic, payload) pair to a command. Matching is case
/// insensitive; every occurrence of our identity in the topic is collapsed
/// to `MATCH` so the shapes below can be compared structurally. Anything
/// that fits no shape, or carries a payload outside the ON/OFF vocabulary
/// where one is required, is dropped without a reply.
pub fn parse_command(topic: &str, payload: &[u8], identity: &str) -> Option<Command> {
    let id = trailing_relay_id(topic);
    let topic = topic.to_uppercase().replace(identity, "MATCH");

    if topic == "RELAY/GET/ID" {
        return Some(Command::GetIdentity);
    }
    if topic.starts_with("RELAY/SET/MATCH/") && topic.len() == 17 {
        let state = RelayState::from_payload(payload)?;
        return Some(Command::SetRelay { id, state });
    }
    if topic.starts_with("RELAY/TRIGGER/MATCH/") && topic.len() == 21 {
        let state = RelayState::from_payload(payload)?;
        return Some(Command::TriggerRelay { id, state });
    }
    if topic.starts_with("RELAY/GET/MATCH/") && topic.len() == 17 {
        return Some(Command::GetRelay { id });
    }
    None
}

fn trailing_relay_id(topic: &str) -> u8 {
    match topic.chars().last().and_then(|c| c.to_digit(10)) {
        Some(digit) => digit as u8,
        None => NO_RELAY_ID,
    }
}

fn status_topic(identity: &str, id: u8) -> String {
    format!("relay/status/{}/{}", identity, id)
}

/// Presence announcement, also the reply to `relay/get/id`.
pub fn meta_messages(node: &NodeInfo) -> Vec<StatusMessage> {
    vec![
        StatusMessage::new("relay/status/id", &node.identity),
        StatusMessage::new(format!("relay/status/{}/IP", node.identity), &node.address),
    ]
}

/// Runs a command against the bank and returns the replies in publish order.
/// Refused commands reply with nothing.
pub fn execute(command: Command, bank: &mut RelayBank, node: &NodeInfo) -> Result<Vec<StatusMessage>> {
    match command {
        Command::GetIdentity => Ok(meta_messages(node)),
        Command::SetRelay { id, state } => {
            debug!("Set relay '{}' to '{:?}'", id, state);
            let mut replies = Vec::new();
            if bank.set(id, state)? {
                replies.push(StatusMessage::new(
                    status_topic(&node.identity, id),
                    state.status_literal(),
                ));
            }
            Ok(replies)
        }
        Command::TriggerRelay { id, state } => {
            debug!("Trigger relay '{}' to '{:?}'", id, state);
            let mut replies = Vec::new();
            if bank.trigger(id, state)? {
                let topic = status_topic(&node.identity, id);
                replies.push(StatusMessage::new(&topic, "triggered"));
                // the pulse ends where the relay started
                replies.push(StatusMessage::new(&topic, state.opposite().status_literal()));
            }
            Ok(replies)
        }
        Command::GetRelay { id } => {
            if RelayId::from_number(id).is_none() {
                return Ok(Vec::new());
            }
            let state = match bank.get(id) {
                true => RelayState::On,
                false => RelayState::Off,
            };
            Ok(vec![StatusMessage::new(
                status_topic(&node.identity, id),
                state.status_literal(),
            )])
        }
    }
}
