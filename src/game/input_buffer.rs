//! Lock-free command buffer between input sources and the tick loop
//!
//! Uses crossbeam-channel for MPSC submission. The session drains it once
//! per tick, so every command queued between two ticks lands in the same
//! tick; the bounded capacity caps the backlog from a stalled driver.

use crossbeam_channel::{bounded, Receiver, Sender, TrySendError};
use thiserror::Error;

use crate::game::constants::session::COMMAND_CAPACITY;
use crate::game::resolver::{commands_from, CommandMap};
use crate::game::state::AgentId;
use crate::util::vec2::Direction;

/// A directional command for one agent
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TurnCommand {
    pub agent_id: AgentId,
    pub direction: Direction,
}

/// Command buffer errors
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum CommandBufferError {
    /// Buffer is full (backpressure)
    #[error("command buffer is full")]
    Full,
    /// Channel disconnected (session dropped)
    #[error("command buffer disconnected")]
    Disconnected,
}

/// Bounded command queue drained once per tick
pub struct CommandBuffer {
    /// Sender side - cloned to each input source
    sender: Sender<TurnCommand>,
    /// Receiver side - used by the session
    receiver: Receiver<TurnCommand>,
    capacity: usize,
}

impl CommandBuffer {
    pub fn new(capacity: usize) -> Self {
        let (sender, receiver) = bounded(capacity.max(1));
        Self {
            sender,
            receiver,
            capacity: capacity.max(1),
        }
    }

    /// Clonable sender handle for an input source
    pub fn sender(&self) -> CommandSender {
        CommandSender {
            sender: self.sender.clone(),
        }
    }

    /// Try to queue a command (non-blocking)
    #[inline]
    pub fn try_submit(&self, agent_id: impl Into<AgentId>, direction: Direction) -> Result<(), CommandBufferError> {
        send(&self.sender, agent_id.into(), direction)
    }

    /// Take everything queued since the last drain, one entry per agent
    /// (the most recent command wins)
    pub fn drain(&self) -> CommandMap {
        commands_from(self.receiver.try_iter().map(|c| (c.agent_id, c.direction)))
    }

    /// Drop everything queued (used on restart)
    pub fn clear(&self) {
        let dropped = self.receiver.try_iter().count();
        if dropped > 0 {
            tracing::debug!("Discarded {} queued commands", dropped);
        }
    }

    #[inline]
    pub fn pending_count(&self) -> usize {
        self.receiver.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.receiver.is_empty()
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

impl Default for CommandBuffer {
    fn default() -> Self {
        Self::new(COMMAND_CAPACITY)
    }
}

/// Clonable sender handle for input sources
#[derive(Clone)]
pub struct CommandSender {
    sender: Sender<TurnCommand>,
}

impl CommandSender {
    /// Queue a command (non-blocking); `Full` is backpressure
    #[inline]
    pub fn try_send(&self, agent_id: impl Into<AgentId>, direction: Direction) -> Result<(), CommandBufferError> {
        send(&self.sender, agent_id.into(), direction)
    }
}

fn send(sender: &Sender<TurnCommand>, agent_id: AgentId, direction: Direction) -> Result<(), CommandBufferError> {
    sender
        .try_send(TurnCommand { agent_id, direction })
        .map_err(|e| match e {
            TrySendError::Full(_) => CommandBufferError::Full,
            TrySendError::Disconnected(_) => CommandBufferError::Disconnected,
        })
}
