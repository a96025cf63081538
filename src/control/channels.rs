// SPDX-License-Identifier: GPL-3.0-only
//! Red/green/blue level triples (gain, drive)

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use crate::control::{ControlContext, LevelControl};
use crate::error::{Result, VcpError};
use crate::protocols::VcpTransport;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Channel {
    Red,
    Green,
    Blue,
}

impl Channel {
    pub const ALL: [Channel; 3] = [Channel::Red, Channel::Green, Channel::Blue];

    /// Component index passed to the transport
    pub fn index(self) -> usize {
        match self {
            Channel::Red => 0,
            Channel::Green => 1,
            Channel::Blue => 2,
        }
    }

    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Channel::Red => "red",
            Channel::Green => "green",
            Channel::Blue => "blue",
        }
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Channel {
    type Err = VcpError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "red" | "r" => Ok(Channel::Red),
            "green" | "g" => Ok(Channel::Green),
            "blue" | "b" => Ok(Channel::Blue),
            _ => Err(VcpError::UnknownProperty(s.to_string())),
        }
    }
}

/// Three independent levels over one transport, one component index each
#[derive(Debug)]
pub struct ChannelGroup {
    channels: [LevelControl; 3],
}

impl ChannelGroup {
    /// Labels the channels `<label>.red`, `<label>.green`, `<label>.blue`
    pub fn new(ctx: &ControlContext, label: &str, transport: Arc<dyn VcpTransport>) -> Result<Self> {
        let make = |channel: Channel| {
            LevelControl::new(
                ctx,
                format!("{label}.{channel}"),
                Arc::clone(&transport),
                channel.index(),
            )
        };

        Ok(Self {
            channels: [make(Channel::Red)?, make(Channel::Green)?, make(Channel::Blue)?],
        })
    }

    pub fn channel(&self, channel: Channel) -> &LevelControl {
        match channel {
            Channel::Red => &self.channels[0],
            Channel::Green => &self.channels[1],
            Channel::Blue => &self.channels[2],
        }
    }

    /// Channel by component index, `None` past blue
    pub fn get(&self, index: usize) -> Option<&LevelControl> {
        self.channels.get(index)
    }

    pub fn red(&self) -> &LevelControl {
        self.channel(Channel::Red)
    }

    pub fn green(&self) -> &LevelControl {
        self.channel(Channel::Green)
    }

    pub fn blue(&self) -> &LevelControl {
        self.channel(Channel::Blue)
    }

    pub fn iter(&self) -> impl Iterator<Item = (Channel, &LevelControl)> {
        Channel::ALL.into_iter().zip(self.channels.iter())
    }

    pub fn wait_idle(&self) {
        self.channels.iter().for_each(LevelControl::wait_idle);
    }
}
