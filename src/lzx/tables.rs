// slots 0..=49 plus one past the largest window
const NUM_SLOTS: usize = 51;

const fn extra_bits(slot: usize) -> u32 {
    if slot < 4 {
        0
    } else if slot < 36 {
        (slot / 2) as u32 - 1
    } else {
        17
    }
}

/// Number of verbatim bits following each position slot
pub const EXTRA_BITS: [u32; NUM_SLOTS] = {
    let mut extra = [0; NUM_SLOTS];
    let mut slot = 0;
    while slot < NUM_SLOTS {
        extra[slot] = extra_bits(slot);
        slot += 1;
    }
    extra
};

/// The smallest formatted offset of each position slot
pub const POSITION_BASE: [u32; NUM_SLOTS] = {
    let mut base = [0; NUM_SLOTS];
    let mut slot = 1;
    while slot < NUM_SLOTS {
        base[slot] = base[slot - 1] + (1 << extra_bits(slot - 1));
        slot += 1;
    }
    base
};

/// The number of position slots needed to address a window of
/// `2^window_bits` bytes
pub fn position_slots(window_bits: u32) -> usize {
    let window = 1u32 << window_bits;
    POSITION_BASE
        .iter()
        .position(|&base| base >= window)
        .unwrap_or(NUM_SLOTS - 1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn position_bases() {
        assert_eq!(POSITION_BASE[..10], [0, 1, 2, 3, 4, 6, 8, 12, 16, 24]);
        assert_eq!(POSITION_BASE[36], 1 << 18);
        assert_eq!(EXTRA_BITS[35], 16);
        assert_eq!(EXTRA_BITS[36], 17);
    }

    #[test]
    fn slots_per_window() {
        let slots = (15..=21).map(position_slots).collect::<Vec<_>>();
        assert_eq!(slots, [30, 32, 34, 36, 38, 42, 50]);
    }
}
