//! Gravity input from device sensors
//!
//! A sensor feed may run on another thread. It writes gravity directions into a
//! `GravityHandle`; the integrator reads the latest value on its next tick.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use glam::Vec2;
use serde::{Deserialize, Serialize};

/// Screen-down, the resting direction
pub const DEFAULT_GRAVITY_DIRECTION: Vec2 = Vec2::new(0.0, 1.0);

#[inline]
fn pack(v: Vec2) -> u64 {
    (u64::from(v.x.to_bits()) << 32) | u64::from(v.y.to_bits())
}

#[inline]
fn unpack(bits: u64) -> Vec2 {
    Vec2::new(f32::from_bits((bits >> 32) as u32), f32::from_bits(bits as u32))
}

/// Shared gravity direction, last write wins.
///
/// Both components are packed into one atomic word so readers never see the
/// x of one write paired with the y of another.
#[derive(Debug, Clone)]
pub struct GravityHandle {
    bits: Arc<AtomicU64>,
}

impl Default for GravityHandle {
    fn default() -> Self {
        Self::new(DEFAULT_GRAVITY_DIRECTION)
    }
}

impl GravityHandle {
    pub fn new(direction: Vec2) -> Self {
        Self {
            bits: Arc::new(AtomicU64::new(pack(direction))),
        }
    }

    /// Store a new direction. Non-finite vectors are ignored.
    pub fn set(&self, direction: Vec2) {
        if !direction.is_finite() {
            log::trace!("Ignoring non-finite gravity direction {direction:?}");
            return;
        }
        self.bits.store(pack(direction), Ordering::Release);
    }

    pub fn get(&self) -> Vec2 {
        unpack(self.bits.load(Ordering::Acquire))
    }
}

/// Orientation of the host interface relative to the device
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum InterfaceOrientation {
    #[default]
    Portrait,
    PortraitUpsideDown,
    /// Home button on the left, device top pointing right
    LandscapeLeft,
    /// Home button on the right, device top pointing left
    LandscapeRight,
}

impl InterfaceOrientation {
    /// Map a device acceleration (x right, y towards the device top, in g)
    /// to a gravity direction in screen coordinates (y down).
    pub fn screen_gravity(self, acceleration: Vec2) -> Vec2 {
        let Vec2 { x, y } = acceleration;
        match self {
            InterfaceOrientation::Portrait => Vec2::new(x, -y),
            InterfaceOrientation::PortraitUpsideDown => Vec2::new(-x, y),
            InterfaceOrientation::LandscapeLeft => Vec2::new(-y, -x),
            InterfaceOrientation::LandscapeRight => Vec2::new(y, x),
        }
    }
}

/// An external source of gravity directions (e.g. an accelerometer).
///
/// The engine subscribes on `start` and unsubscribes on `stop`; it never calls
/// either twice in a row.
pub trait SensorSource {
    /// Begin delivering directions into `gravity`, already in screen space
    fn subscribe(&mut self, gravity: GravityHandle, orientation: InterfaceOrientation);

    /// Stop delivering directions
    fn unsubscribe(&mut self);
}
