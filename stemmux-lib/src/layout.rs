//! Channel layout naming for assembled multichannel streams.
//!
//! Stem counts up to six map to conventional layout names; larger counts get a
//! synthesized `"<N>.0"` label. Every layout also carries the WAVE speaker mask
//! written into the assembled file, and the reverse lookup turns a read-back mask
//! back into a name so the verifier can tell a deliberate layout apart from a
//! generic default.

use serde::{Deserialize, Serialize};

const FL: u32 = 0x1;
const FR: u32 = 0x2;
const FC: u32 = 0x4;
const BL: u32 = 0x10;
const BR: u32 = 0x20;
const BC: u32 = 0x100;
const SL: u32 = 0x200;
const SR: u32 = 0x400;

/// Number of speaker positions a WAVE channel mask can address.
pub const MAX_SPEAKER_POSITIONS: usize = 18;

const NAMED_LAYOUTS: [(usize, &str, u32); 6] = [
    (1, "mono", FC),
    (2, "stereo", FL | FR),
    (3, "3.0", FL | FR | FC),
    (4, "4.0", FL | FR | FC | BC),
    (5, "5.0", FL | FR | FC | BL | BR),
    (6, "6.0", FL | FR | FC | SL | SR | BC),
];

/// A named channel arrangement for a given channel count.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelLayout {
    name: String,
    channels: usize,
}

impl ChannelLayout {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn channel_count(&self) -> usize {
        self.channels
    }

    /// WAVE speaker mask for this layout.
    ///
    /// `None` when the count exceeds the addressable speaker positions.
    pub fn speaker_mask(&self) -> Option<u32> {
        if let Some((_, _, mask)) = NAMED_LAYOUTS
            .iter()
            .find(|(count, _, _)| *count == self.channels)
        {
            return Some(*mask);
        }
        if self.channels == 0 || self.channels > MAX_SPEAKER_POSITIONS {
            return None;
        }
        Some((1u32 << self.channels) - 1)
    }
}

/// Resolve the layout for `channel_count` stems.
pub fn resolve_layout(channel_count: usize) -> ChannelLayout {
    let name = NAMED_LAYOUTS
        .iter()
        .find(|(count, _, _)| *count == channel_count)
        .map(|(_, name, _)| (*name).to_string())
        .unwrap_or_else(|| format!("{}.0", channel_count));

    ChannelLayout {
        name,
        channels: channel_count,
    }
}

/// Name the layout described by a speaker mask read from a file.
///
/// Returns `None` for masks that match neither a named layout nor a
/// synthesized one; such streams are treated as having an unknown layout.
pub fn layout_name_for_mask(mask: u32) -> Option<String> {
    if let Some((_, name, _)) = NAMED_LAYOUTS.iter().find(|(_, _, m)| *m == mask) {
        return Some((*name).to_string());
    }

    let count = mask.count_ones() as usize;
    let synthesized = count > NAMED_LAYOUTS.len()
        && count <= MAX_SPEAKER_POSITIONS
        && mask == (1u32 << count) - 1;
    synthesized.then(|| format!("{}.0", count))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn conventional_names_for_small_counts() {
        let names: Vec<String> = (1..=6).map(|n| resolve_layout(n).name().to_string()).collect();
        assert_eq!(names, vec!["mono", "stereo", "3.0", "4.0", "5.0", "6.0"]);
    }

    #[test]
    fn synthesized_names_for_other_counts() {
        assert_eq!(resolve_layout(7).name(), "7.0");
        assert_eq!(resolve_layout(12).name(), "12.0");
        assert_eq!(resolve_layout(0).name(), "0.0");
        assert_eq!(resolve_layout(12).channel_count(), 12);
    }

    #[test]
    fn masks_carry_one_bit_per_channel() {
        for count in 1..=MAX_SPEAKER_POSITIONS {
            let mask = resolve_layout(count).speaker_mask().expect("mask");
            assert_eq!(mask.count_ones() as usize, count);
        }
        assert_eq!(resolve_layout(MAX_SPEAKER_POSITIONS + 1).speaker_mask(), None);
        assert_eq!(resolve_layout(0).speaker_mask(), None);
    }

    #[test]
    fn masks_resolve_back_to_their_names() {
        for count in 1..=MAX_SPEAKER_POSITIONS {
            let layout = resolve_layout(count);
            let mask = layout.speaker_mask().expect("mask");
            assert_eq!(layout_name_for_mask(mask).as_deref(), Some(layout.name()));
        }
    }

    #[test]
    fn generic_masks_are_unknown() {
        // First-four-positions mask (FL FR FC LFE) is what a writer defaults to.
        assert_eq!(layout_name_for_mask(0xF), None);
        assert_eq!(layout_name_for_mask(FL), None);
        assert_eq!(layout_name_for_mask(0), None);
    }
}
