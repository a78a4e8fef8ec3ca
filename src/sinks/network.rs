//! Telemetry over OSC/UDP.
//!
//! Every frame sends one `/face/tracking` message with the tracker and gaze
//! state, then one `/face/action_units` message per action unit reading.
//! The target is resolved once when the transmitter is created. Delivery is
//! fire-and-forget; send failures are only logged.

use crate::constants::{OSC_ACTION_UNITS_ADDR, OSC_TRACKING_ADDR};
use crate::engines::{ActionUnitReading, GazeResult, TrackingState};
use crate::camera::CameraIntrinsics;
use crate::sinks::{FrameOutput, OutputSink, SinkFactory, SourceContext};
use crate::utils::safe_cast::frame_index_to_i64;
use crate::{Error, Result};
use log::debug;
use rosc::{encoder, OscMessage, OscPacket, OscType};
use std::net::{SocketAddr, ToSocketAddrs, UdpSocket};

/// Tracking and gaze message for a frame
#[must_use]
#[allow(clippy::cast_possible_truncation)] // OSC floats are 32-bit
pub fn tracking_message(
    frame_index: u64,
    tracking: &TrackingState,
    gaze: &GazeResult,
    intrinsics: &CameraIntrinsics,
) -> OscMessage {
    let (left, right) = gaze.directions();
    OscMessage {
        addr: OSC_TRACKING_ADDR.to_string(),
        args: vec![
            OscType::Long(frame_index_to_i64(frame_index)),
            OscType::Bool(tracking.success),
            OscType::Float(tracking.certainty as f32),
            OscType::Bool(gaze.is_available()),
            OscType::Float(left.x),
            OscType::Float(left.y),
            OscType::Float(left.z),
            OscType::Float(right.x),
            OscType::Float(right.y),
            OscType::Float(right.z),
            OscType::Float(intrinsics.fx as f32),
            OscType::Float(intrinsics.fy as f32),
            OscType::Float(intrinsics.cx as f32),
            OscType::Float(intrinsics.cy as f32),
        ],
    }
}

/// Action unit messages for a frame, one per reading
#[must_use]
#[allow(clippy::cast_possible_truncation)]
pub fn action_units_messages(frame_index: u64, readings: &[ActionUnitReading]) -> Vec<OscMessage> {
    let frame = frame_index_to_i64(frame_index);
    readings
        .iter()
        .map(|reading| OscMessage {
            addr: OSC_ACTION_UNITS_ADDR.to_string(),
            args: vec![
                OscType::Long(frame),
                OscType::String(reading.name.clone()),
                OscType::Float(reading.intensity as f32),
                OscType::Bool(reading.present),
            ],
        })
        .collect()
}

/// Encode a message into a UDP payload
///
/// # Errors
///
/// Returns `Osc` if the message cannot be encoded
pub fn encode(message: OscMessage) -> Result<Vec<u8>> {
    encoder::encode(&OscPacket::Message(message)).map_err(|e| Error::Osc(format!("{e:?}")))
}

/// UDP transmitter of per-frame telemetry
pub struct OscTransmitter {
    socket: UdpSocket,
    target: SocketAddr,
    sent: u64,
    dropped: u64,
}

impl OscTransmitter {
    /// Resolve `target` and bind an ephemeral local socket of the same family
    ///
    /// # Errors
    ///
    /// Returns an error if the target does not resolve or no socket can be bound
    pub fn new(target: &str) -> Result<Self> {
        let target = resolve_target(target)?;
        let local = if target.is_ipv4() { "0.0.0.0:0" } else { "[::]:0" };
        let socket = UdpSocket::bind(local)?;
        Ok(Self {
            socket,
            target,
            sent: 0,
            dropped: 0,
        })
    }

    /// Resolved destination address
    #[must_use]
    pub fn target(&self) -> SocketAddr {
        self.target
    }

    /// Packets handed to the socket and packets lost to send errors
    #[must_use]
    pub fn counters(&self) -> (u64, u64) {
        (self.sent, self.dropped)
    }

    fn send(&mut self, message: OscMessage) -> Result<()> {
        let payload = encode(message)?;
        match self.socket.send_to(&payload, self.target) {
            Ok(_) => self.sent += 1,
            Err(e) => {
                self.dropped += 1;
                debug!("Dropped telemetry packet to {}: {}", self.target, e);
            }
        }
        Ok(())
    }
}

/// First socket address a `host:port` target resolves to
fn resolve_target(target: &str) -> Result<SocketAddr> {
    target
        .to_socket_addrs()
        .map_err(|e| Error::InvalidInput(format!("Cannot resolve OSC target {target}: {e}")))?
        .next()
        .ok_or_else(|| Error::InvalidInput(format!("OSC target {target} resolved to no address")))
}

impl OutputSink for OscTransmitter {
    fn name(&self) -> &str {
        "network"
    }

    fn consume(&mut self, output: &FrameOutput<'_>) -> Result<()> {
        self.send(tracking_message(
            output.frame_index,
            output.tracking,
            output.gaze,
            output.intrinsics,
        ))?;
        for message in action_units_messages(output.frame_index, output.action_units) {
            self.send(message)?;
        }
        Ok(())
    }
}

/// Opens a transmitter per source
#[derive(Debug, Clone)]
pub struct NetworkFactory {
    target: String,
}

impl NetworkFactory {
    pub fn new<S: Into<String>>(target: S) -> Self {
        Self { target: target.into() }
    }
}

impl SinkFactory for NetworkFactory {
    fn name(&self) -> &str {
        "network"
    }

    fn open(&mut self, _context: &SourceContext<'_>) -> Result<Option<Box<dyn OutputSink>>> {
        Ok(Some(Box::new(OscTransmitter::new(&self.target)?)))
    }
}
