use serde::{Deserialize, Serialize};
use std::fmt;

use crate::card::{Card, Clue};

/// Maximum number of note (hint) tokens on the table.
pub const MAX_NOTE_TOKENS: u8 = 8;

/// The visible hand of one other player, slot by slot.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PlayerHand {
    pub name: String,
    pub cards: Vec<Card>,
}

/// Full table state as seen by the requesting player.
///
/// The requester's own cards are never included; only their count is.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct GameSnapshot {
    pub current_player: String,
    /// Hands of every other player.
    pub players: Vec<PlayerHand>,
    /// Number of cards currently in the requester's own hand.
    pub hand_size: usize,
    /// Cards successfully played, in play order.
    #[serde(default)]
    pub played: Vec<Card>,
    #[serde(default)]
    pub discarded: Vec<Card>,
    #[serde(default)]
    pub note_tokens: u8,
    #[serde(default)]
    pub storm_tokens: u8,
}

impl GameSnapshot {
    /// Look up another player's visible hand.
    pub fn hand_of(&self, name: &str) -> Option<&PlayerHand> {
        self.players.iter().find(|h| h.name == name)
    }

    /// Highest rank played so far in each color (0 when none), indexed by
    /// [`Color::index`](crate::card::Color::index).
    pub fn fireworks(&self) -> [u8; 5] {
        let mut tops = [0u8; 5];
        for card in &self.played {
            let top = &mut tops[card.color.index()];
            *top = (*top).max(card.rank.value());
        }
        tops
    }

    /// Returns true if `card` would extend its firework right now.
    pub fn is_playable(&self, card: Card) -> bool {
        self.fireworks()[card.color.index()] + 1 == card.rank.value()
    }
}

/// A move chosen for the local player.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Action {
    Play(usize),
    Discard(usize),
    Hint { target: String, clue: Clue },
}

impl Action {
    /// Wrap the action into the request the server expects from `sender`.
    pub fn into_message(self, sender: &str) -> ClientMessage {
        let sender = sender.to_string();
        match self {
            Action::Play(slot) => ClientMessage::Play { sender, slot },
            Action::Discard(slot) => ClientMessage::Discard { sender, slot },
            Action::Hint { target, clue } => ClientMessage::Hint {
                sender,
                destination: target,
                clue,
            },
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Action::Play(slot) => write!(f, "play slot {slot}"),
            Action::Discard(slot) => write!(f, "discard slot {slot}"),
            Action::Hint { target, clue } => write!(f, "hint {target} {clue}"),
        }
    }
}

/// Messages sent from client to server
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ClientMessage {
    /// Register with the server under a player name (sent right after connect)
    Join { sender: String },

    /// Ask the server to start the game once everyone is ready
    StartRequest { sender: String },

    /// Acknowledge the game start
    Ready { sender: String },

    /// Request a fresh table snapshot
    GetGameState { sender: String },

    /// Play the card in `slot`
    Play { sender: String, slot: usize },

    /// Discard the card in `slot`
    Discard { sender: String, slot: usize },

    /// Give a hint to another player
    Hint {
        sender: String,
        destination: String,
        clue: Clue,
    },
}

/// Messages sent from server to client
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ServerMessage {
    /// The server accepted our connection
    ConnectionAccepted { name: String },

    /// Someone asked to start; `accepted` of `connected` players are ready
    StartAccepted { accepted: usize, connected: usize },

    /// All players are ready; the roster is in turn order
    GameStarted { players: Vec<String> },

    /// Reply to `GetGameState`
    StateSnapshot(GameSnapshot),

    /// Our last request broke a rule
    ActionRejected { message: String },

    /// A discard went through
    ActionAccepted {
        last_player: String,
        current_player: String,
        #[serde(default)]
        slot: Option<usize>,
        #[serde(default)]
        card: Option<Card>,
    },

    /// A card was played successfully
    MoveOk {
        last_player: String,
        current_player: String,
        #[serde(default)]
        slot: Option<usize>,
        #[serde(default)]
        card: Option<Card>,
    },

    /// A card was played out of order and cost a storm token
    Mistake {
        last_player: String,
        current_player: String,
        #[serde(default)]
        slot: Option<usize>,
        #[serde(default)]
        card: Option<Card>,
    },

    /// A hint was broadcast; `positions` are the matching slots in the target's hand
    HintGiven {
        source: String,
        destination: String,
        clue: Clue,
        positions: Vec<usize>,
    },

    /// The server could not make sense of something we sent
    DataRejected { data: String },

    /// The game ended
    GameOver {
        message: String,
        score: u32,
        #[serde(default)]
        score_message: String,
    },

    /// Any tag this client does not know about
    #[serde(other)]
    Unknown,
}

impl ServerMessage {
    /// Tag name for logging.
    pub fn kind(&self) -> &'static str {
        match self {
            ServerMessage::ConnectionAccepted { .. } => "ConnectionAccepted",
            ServerMessage::StartAccepted { .. } => "StartAccepted",
            ServerMessage::GameStarted { .. } => "GameStarted",
            ServerMessage::StateSnapshot(_) => "StateSnapshot",
            ServerMessage::ActionRejected { .. } => "ActionRejected",
            ServerMessage::ActionAccepted { .. } => "ActionAccepted",
            ServerMessage::MoveOk { .. } => "MoveOk",
            ServerMessage::Mistake { .. } => "Mistake",
            ServerMessage::HintGiven { .. } => "HintGiven",
            ServerMessage::DataRejected { .. } => "DataRejected",
            ServerMessage::GameOver { .. } => "GameOver",
            ServerMessage::Unknown => "Unknown",
        }
    }
}
