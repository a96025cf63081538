// SPDX-License-Identifier: GPL-3.0-only
//! All VCP controls of one monitor

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use crate::config::Config;
use crate::control::{Channel, ChannelGroup, ControlContext, LevelControl, PowerControl};
use crate::devices::power_encoding;
use crate::error::{Result, VcpError};
use crate::protocols::{FeatureTransport, VcpDevice, codes};

pub type DisplayId = String;

/// Addressable level properties of a monitor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VcpProperty {
    Brightness,
    Contrast,
    Gain(Channel),
    Drive(Channel),
}

impl VcpProperty {
    pub const ALL: [VcpProperty; 8] = [
        VcpProperty::Brightness,
        VcpProperty::Contrast,
        VcpProperty::Gain(Channel::Red),
        VcpProperty::Gain(Channel::Green),
        VcpProperty::Gain(Channel::Blue),
        VcpProperty::Drive(Channel::Red),
        VcpProperty::Drive(Channel::Green),
        VcpProperty::Drive(Channel::Blue),
    ];
}

impl fmt::Display for VcpProperty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VcpProperty::Brightness => f.write_str("brightness"),
            VcpProperty::Contrast => f.write_str("contrast"),
            VcpProperty::Gain(channel) => write!(f, "gain.{channel}"),
            VcpProperty::Drive(channel) => write!(f, "drive.{channel}"),
        }
    }
}

impl FromStr for VcpProperty {
    type Err = VcpError;

    fn from_str(s: &str) -> Result<Self> {
        let lower = s.trim().to_ascii_lowercase();
        let unknown = || VcpError::UnknownProperty(s.to_string());

        match lower.split_once('.') {
            None => match lower.as_str() {
                "brightness" => Ok(VcpProperty::Brightness),
                "contrast" => Ok(VcpProperty::Contrast),
                _ => Err(unknown()),
            },
            Some((group, channel)) => {
                let channel = channel.parse::<Channel>().map_err(|_| unknown())?;
                match group {
                    "gain" => Ok(VcpProperty::Gain(channel)),
                    "drive" => Ok(VcpProperty::Drive(channel)),
                    _ => Err(unknown()),
                }
            }
        }
    }
}

/// One monitor's brightness, contrast, gain, drive and power
///
/// Labels are `<display id>/<property>`, so a single observer can serve
/// several monitors.
#[derive(Debug)]
pub struct MonitorVcp {
    device: Arc<dyn VcpDevice>,
    brightness: LevelControl,
    contrast: LevelControl,
    gain: ChannelGroup,
    drive: ChannelGroup,
    power: PowerControl,
}

impl MonitorVcp {
    pub fn new(device: Arc<dyn VcpDevice>, ctx: &ControlContext, config: &Config) -> Result<Self> {
        let id = device.id();
        let label = |property: &str| format!("{id}/{property}");
        let transport =
            |feature_codes: &[u8]| Arc::new(FeatureTransport::new(Arc::clone(&device), feature_codes));

        let encoding = power_encoding(device.manufacturer_id().as_deref(), config);
        if encoding.code != codes::POWER_MODE {
            debug!(display_id = %id, "using alternate power command {:#04x}", encoding.code);
        }

        let monitor = Self {
            brightness: LevelControl::new(
                ctx,
                label("brightness"),
                transport(&[codes::BRIGHTNESS]),
                0,
            )?,
            contrast: LevelControl::new(ctx, label("contrast"), transport(&[codes::CONTRAST]), 0)?,
            gain: ChannelGroup::new(ctx, &label("gain"), transport(&codes::GAIN[..]))?,
            drive: ChannelGroup::new(ctx, &label("drive"), transport(&codes::DRIVE[..]))?,
            power: PowerControl::new(ctx, label("power"), transport(&[encoding.code]), encoding),
            device,
        };

        if config.refresh_on_attach {
            monitor.refresh_async();
        }

        Ok(monitor)
    }

    pub fn id(&self) -> DisplayId {
        self.device.id()
    }

    pub fn name(&self) -> String {
        self.device.name()
    }

    pub fn device(&self) -> &Arc<dyn VcpDevice> {
        &self.device
    }

    pub fn brightness(&self) -> &LevelControl {
        &self.brightness
    }

    pub fn contrast(&self) -> &LevelControl {
        &self.contrast
    }

    pub fn gain(&self) -> &ChannelGroup {
        &self.gain
    }

    pub fn drive(&self) -> &ChannelGroup {
        &self.drive
    }

    pub fn power(&self) -> &PowerControl {
        &self.power
    }

    pub fn level(&self, property: VcpProperty) -> &LevelControl {
        match property {
            VcpProperty::Brightness => &self.brightness,
            VcpProperty::Contrast => &self.contrast,
            VcpProperty::Gain(channel) => self.gain.channel(channel),
            VcpProperty::Drive(channel) => self.drive.channel(channel),
        }
    }

    pub fn levels(&self) -> impl Iterator<Item = (VcpProperty, &LevelControl)> {
        VcpProperty::ALL.into_iter().map(|p| (p, self.level(p)))
    }

    /// Queue a background read of every level
    pub fn refresh_async(&self) {
        self.levels().for_each(|(_, level)| level.refresh_async());
    }

    pub fn wait_idle(&self) {
        self.levels().for_each(|(_, level)| level.wait_idle());
    }
}
