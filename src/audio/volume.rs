// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Multi-channel stream volume.
//!
//! Levels use the PulseAudio software volume scale: `0` is silence and
//! `0x10000` is 100%. The UI works with one representative scalar, the
//! loudest channel, while mutations rescale the whole vector so the channel
//! balance set on the server survives.

/// Per-channel volume of a stream.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StreamVolume {
    channels: Vec<u32>,
}

impl StreamVolume {
    /// Raw level for 100% volume.
    pub const NORMAL: u32 = 0x10000;
    /// Raw level for silence.
    pub const MUTED: u32 = 0;

    pub fn new(channels: Vec<u32>) -> Self {
        Self { channels }
    }

    /// Volume with every channel at `level`.
    pub fn uniform(channels: u8, level: u32) -> Self {
        Self {
            channels: vec![level; channels as usize],
        }
    }

    pub fn channels(&self) -> &[u32] {
        &self.channels
    }

    /// Representative level: the loudest channel.
    pub fn max(&self) -> u32 {
        self.channels.iter().copied().max().unwrap_or(Self::MUTED)
    }

    /// Representative level as a fraction of [`Self::NORMAL`].
    pub fn fraction(&self) -> f64 {
        self.max() as f64 / Self::NORMAL as f64
    }

    /// Representative level in percent, rounded.
    pub fn percent(&self) -> u32 {
        (self.fraction() * 100.0).round() as u32
    }

    pub fn is_muted(&self) -> bool {
        self.max() == Self::MUTED
    }

    /// Rescale so the loudest channel lands on `target`.
    ///
    /// A silent volume has no balance left, so every channel is set to
    /// `target` directly.
    pub fn scale(&mut self, target: u32) -> &mut Self {
        let max = self.max();
        if max == Self::MUTED {
            self.channels.iter_mut().for_each(|c| *c = target);
            return self;
        }

        for channel in &mut self.channels {
            *channel = ((*channel as u64 * target as u64) / max as u64) as u32;
        }
        self
    }

    /// Rescale to a fraction of [`Self::NORMAL`], clamped to `[0, 1]`.
    pub fn scale_to_fraction(&mut self, fraction: f64) -> &mut Self {
        self.scale(fraction_to_level(fraction))
    }
}

/// Convert a `[0, 1]` fraction to a raw level.
pub fn fraction_to_level(fraction: f64) -> u32 {
    let fraction = if fraction.is_nan() {
        0.0
    } else {
        fraction.clamp(0.0, 1.0)
    };
    (fraction * StreamVolume::NORMAL as f64).round() as u32
}

#[cfg(test)]
mod tests {
    use super::*;

    const HALF: u32 = StreamVolume::NORMAL / 2;

    #[test]
    fn test_max_and_fraction() {
        let volume = StreamVolume::new(vec![HALF, StreamVolume::NORMAL / 4]);
        assert_eq!(volume.max(), HALF);
        assert!((volume.fraction() - 0.5).abs() < 1e-9);
        assert_eq!(volume.percent(), 50);
        assert!(!volume.is_muted());
    }

    #[test]
    fn test_scale_preserves_balance() {
        let mut volume = StreamVolume::new(vec![StreamVolume::NORMAL, HALF]);
        volume.scale(HALF);
        assert_eq!(volume.channels(), &[HALF, HALF / 2]);
    }

    #[test]
    fn test_scale_from_silence_is_flat() {
        let mut volume = StreamVolume::uniform(2, StreamVolume::MUTED);
        assert!(volume.is_muted());
        volume.scale(StreamVolume::NORMAL);
        assert_eq!(volume.channels(), &[StreamVolume::NORMAL, StreamVolume::NORMAL]);
    }

    #[test]
    fn test_scale_to_fraction_clamps() {
        let mut volume = StreamVolume::uniform(2, HALF);
        volume.scale_to_fraction(1.7);
        assert_eq!(volume.max(), StreamVolume::NORMAL);
        volume.scale_to_fraction(-0.2);
        assert!(volume.is_muted());
    }

    #[test]
    fn test_empty_volume() {
        let mut volume = StreamVolume::default();
        assert!(volume.is_muted());
        volume.scale(StreamVolume::NORMAL);
        assert!(volume.channels().is_empty());
    }

    #[test]
    fn test_fraction_to_level() {
        assert_eq!(fraction_to_level(0.5), HALF);
        assert_eq!(fraction_to_level(f64::NAN), 0);
        assert_eq!(fraction_to_level(2.0), StreamVolume::NORMAL);
    }
}
