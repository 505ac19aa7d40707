//! Baud-derived character timing, expressed in 50 µs ticks (§4.3).
//!
//! The tick counter is a wrapping 16-bit value; every comparison against a
//! threshold must use wrapping subtraction, never a direct `>=`, so a
//! counter rollover never reads as "time went backwards".

/// Resolution of the monotonic tick source the RTU layer requires.
pub const TICK_US: u32 = 50;

/// Inter-character and inter-frame silent-interval thresholds, in ticks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timing {
    pub inter_char_ticks: u16,
    pub inter_frame_ticks: u16,
}

impl Timing {
    /// Derive timing from `baud`. Above 19,200 baud the standard fixes the
    /// limits at 0.75 ms / 1.75 ms regardless of baud; at or below, they are
    /// 1.5 / 3.5 character times (11 bits/char) computed from `baud`.
    pub fn from_baud(baud: u32) -> Self {
        let (inter_char_us, inter_frame_us) = if baud > 19_200 {
            (750u64, 1750u64)
        } else {
            let char_time_us = (11u64 * 1_000_000) / baud.max(1) as u64;
            (char_time_us * 3 / 2, char_time_us * 7 / 2)
        };
        Self {
            inter_char_ticks: ticks_from_us(inter_char_us),
            inter_frame_ticks: ticks_from_us(inter_frame_us),
        }
    }
}

fn ticks_from_us(us: u64) -> u16 {
    let ticks = us.div_ceil(TICK_US as u64);
    ticks.min(u16::MAX as u64) as u16
}

/// `true` once at least `threshold` ticks have elapsed between `start` and
/// `now`, correctly handling wraparound of the 16-bit tick counter.
pub fn elapsed_at_least(now: u16, start: u16, threshold: u16) -> bool {
    now.wrapping_sub(start) >= threshold
}
