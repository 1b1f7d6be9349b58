// SPDX-License-Identifier: MPL-2.0

//! Module options.
//!
//! The options are given as kernel command-line module arguments, e.g.
//!
//! ```text
//! xdma.h2c_channels=2 xdma.c2h_channels=2 xdma.streaming xdma.addr_align=64
//! ```
//!
//! Each argument arrives here already split into a [`ModuleArg`].

use crate::{engine::DmaDirection, prelude::*};

/// The maximum number of channels per direction of an XDMA core.
pub const XDMA_CHANNEL_NUM_MAX: u32 = 4;

const DEFAULT_TIMEOUT_MS: u32 = 10_000;

/// A module argument.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModuleArg<'a> {
    /// A bare option, e.g. `xdma.streaming`.
    Arg(&'a str),
    /// An option with a value, e.g. `xdma.addr_align=64`.
    KeyVal(&'a str, &'a str),
}

impl<'a> ModuleArg<'a> {
    /// Parses one `option` or `option=value` token (without the module prefix).
    pub fn parse(arg: &'a str) -> Self {
        match arg.split_once('=') {
            Some((key, val)) => Self::KeyVal(key, val),
            None => Self::Arg(arg),
        }
    }
}

/// The options of the XDMA module.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct XdmaConfig {
    pub h2c_channels: u32,
    pub c2h_channels: u32,
    /// Whether the engines are AXI-Stream engines rather than AXI-MM ones.
    pub streaming: bool,
    pub addr_align: u32,
    pub h2c_timeout_ms: u32,
    pub c2h_timeout_ms: u32,
}

impl Default for XdmaConfig {
    fn default() -> Self {
        Self {
            h2c_channels: 1,
            c2h_channels: 1,
            streaming: false,
            addr_align: 1,
            h2c_timeout_ms: DEFAULT_TIMEOUT_MS,
            c2h_timeout_ms: DEFAULT_TIMEOUT_MS,
        }
    }
}

impl XdmaConfig {
    /// Builds the options from module arguments, starting from the defaults.
    ///
    /// Unknown options are skipped; malformed values are rejected.
    pub fn from_module_args<'a>(args: impl IntoIterator<Item = ModuleArg<'a>>) -> Result<Self> {
        let mut config = Self::default();

        for arg in args {
            match arg {
                ModuleArg::Arg("streaming") => config.streaming = true,
                ModuleArg::KeyVal("streaming", val) => config.streaming = parse_bool(val)?,
                ModuleArg::KeyVal("h2c_channels", val) => config.h2c_channels = parse_u32(val)?,
                ModuleArg::KeyVal("c2h_channels", val) => config.c2h_channels = parse_u32(val)?,
                ModuleArg::KeyVal("addr_align", val) => config.addr_align = parse_u32(val)?,
                ModuleArg::KeyVal("h2c_timeout_ms", val) => {
                    config.h2c_timeout_ms = parse_u32(val)?
                }
                ModuleArg::KeyVal("c2h_timeout_ms", val) => {
                    config.c2h_timeout_ms = parse_u32(val)?
                }
                unknown => log::warn!("[xdma] unknown module argument {:?}, skipped", unknown),
            }
        }

        config.check()?;
        Ok(config)
    }

    fn check(&self) -> Result<()> {
        for channels in [self.h2c_channels, self.c2h_channels] {
            if channels == 0 || channels > XDMA_CHANNEL_NUM_MAX {
                return_errno_with_message!(Errno::EINVAL, "the channel number is out of range");
            }
        }
        if !self.addr_align.is_power_of_two() {
            return_errno_with_message!(
                Errno::EINVAL,
                "the address alignment must be a power of two"
            );
        }
        Ok(())
    }

    /// Returns the configuration of every engine, H2C engines first.
    pub fn engine_configs(&self) -> Vec<EngineConfig> {
        let h2c = (0..self.h2c_channels).map(|channel| {
            EngineConfig::new(DmaDirection::ToDevice)
                .channel(channel)
                .timeout_ms(self.h2c_timeout_ms)
        });
        let c2h = (0..self.c2h_channels).map(|channel| {
            EngineConfig::new(DmaDirection::FromDevice)
                .channel(channel)
                .timeout_ms(self.c2h_timeout_ms)
        });

        h2c.chain(c2h)
            .map(|config| config.streaming(self.streaming).addr_align(self.addr_align))
            .collect()
    }
}

fn parse_u32(val: &str) -> Result<u32> {
    val.parse()
        .map_err(|_| Error::with_message(Errno::EINVAL, "invalid integer module argument"))
}

fn parse_bool(val: &str) -> Result<bool> {
    match val {
        "1" | "y" | "Y" | "true" => Ok(true),
        "0" | "n" | "N" | "false" => Ok(false),
        _ => return_errno_with_message!(Errno::EINVAL, "invalid boolean module argument"),
    }
}

/// The configuration of a single engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineConfig {
    pub direction: DmaDirection,
    pub streaming: bool,
    pub channel: u32,
    pub addr_align: u32,
    pub timeout_ms: u32,
}

impl EngineConfig {
    /// Creates the configuration of a memory-mapped engine on channel 0.
    pub fn new(direction: DmaDirection) -> Self {
        Self {
            direction,
            streaming: false,
            channel: 0,
            addr_align: 1,
            timeout_ms: DEFAULT_TIMEOUT_MS,
        }
    }

    pub fn streaming(mut self, streaming: bool) -> Self {
        self.streaming = streaming;
        self
    }

    pub fn channel(mut self, channel: u32) -> Self {
        self.channel = channel;
        self
    }

    pub fn addr_align(mut self, addr_align: u32) -> Self {
        self.addr_align = addr_align;
        self
    }

    pub fn timeout_ms(mut self, timeout_ms: u32) -> Self {
        self.timeout_ms = timeout_ms;
        self
    }
}
