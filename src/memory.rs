use rand::Rng;

use crate::dialect::Dialect;

/// Total addressable memory size (4KB), common to every dialect.
const MEMORY_SIZE: usize = 0x1000;
/// Size of the trailing safety pad appended after addressable memory. Reads and writes that
/// fall outside `address_limit` resolve into this pad instead of erroring, so a buggy or
/// malicious ROM cannot crash the interpreter via an out-of-bounds access.
const SAFETY_PAD_SIZE: usize = 0x100;

const CHIP8_SMALL_LIMIT: usize = 0x6A0;
const CHIP8_LARGE_LIMIT: usize = 0xEA0;
const CHIP8E_LIMIT: usize = 0xEA0;
const CHIP8X_LIMIT: usize = 0xEA0;
const SUPERCHIP_LEGACY_LIMIT: usize = 0xFFF;
const XOCHIP_LIMIT: usize = 0xFFFF;
const MEGACHIP_LIMIT: usize = 0xFFFF;

/// An abstraction of CHIP-8 addressable memory, plus a trailing safety pad.
///
/// Every address computed by opcode execution (`index_register + offset`, scroll/range
/// operations, etc.) is first clamped into `[0, address_limit + SAFETY_PAD_SIZE)` before being
/// used to index `bytes`; addresses beyond `address_limit` land in the safety pad, which reads
/// back as `0xFF` and silently discards writes, rather than the machine treating out-of-bounds
/// access as fatal.
#[derive(Clone, Debug, PartialEq)]
pub struct Memory {
    bytes: Vec<u8>,
    address_limit: usize,
}

impl Memory {
    /// Constructor that returns a [Memory] instance sized and initialised appropriately for
    /// the supplied dialect. Dialects whose original hardware exposed uninitialised RAM (e.g.
    /// SUPER-CHIP on extant clones) are seeded with random bytes; all others start zeroed.
    pub(crate) fn new(dialect: Dialect) -> Self {
        let address_limit = Self::address_limit_for(dialect);
        let capacity = std::cmp::max(MEMORY_SIZE, address_limit) + SAFETY_PAD_SIZE;
        let mut bytes = vec![0u8; capacity];
        if matches!(
            dialect,
            Dialect::SuperChipLegacy | Dialect::XoChip | Dialect::MegaChip
        ) {
            let mut rng = rand::thread_rng();
            rng.fill(&mut bytes[..address_limit.min(MEMORY_SIZE)]);
        }
        // The safety pad always reads back as 0xFF, distinguishing it from legitimate zeroed
        // or randomized memory during diagnosis.
        for byte in &mut bytes[address_limit..] {
            *byte = 0xFF;
        }
        Memory {
            bytes,
            address_limit,
        }
    }

    fn address_limit_for(dialect: Dialect) -> usize {
        match dialect {
            Dialect::Chip8 {
                memory_limit_2k: true,
                ..
            } => CHIP8_SMALL_LIMIT,
            Dialect::Chip8 {
                memory_limit_2k: false,
                ..
            } => CHIP8_LARGE_LIMIT,
            Dialect::Chip8E => CHIP8E_LIMIT,
            Dialect::Chip8X => CHIP8X_LIMIT,
            Dialect::SuperChipLegacy => SUPERCHIP_LEGACY_LIMIT,
            Dialect::XoChip => XOCHIP_LIMIT,
            Dialect::MegaChip => MEGACHIP_LIMIT,
        }
    }

    /// Clamps an address into the valid index range for `bytes`, redirecting anything beyond
    /// `address_limit` into the trailing safety pad rather than panicking.
    fn clamp(&self, address: usize) -> usize {
        std::cmp::min(address, self.bytes.len() - 1)
    }

    /// Returns the byte at the given address, redirected into the safety pad if out of bounds.
    pub(crate) fn read_byte(&self, address: u16) -> u8 {
        self.bytes[self.clamp(address as usize)]
    }

    /// Writes a byte at the given address; silently discarded if the address falls in the
    /// safety pad.
    pub(crate) fn write_byte(&mut self, address: u16, value: u8) {
        let index = self.clamp(address as usize);
        if index < self.address_limit {
            self.bytes[index] = value;
        }
    }

    /// Returns a copy of `length` bytes starting at `address`, safety-pad-clamped.
    pub(crate) fn read_bytes(&self, address: u16, length: usize) -> Vec<u8> {
        (0..length)
            .map(|offset| self.read_byte(address.saturating_add(offset as u16)))
            .collect()
    }

    /// Returns the two bytes starting at `address`, interpreted big-endian (used to fetch an
    /// opcode).
    pub(crate) fn read_two_bytes(&self, address: u16) -> u16 {
        (self.read_byte(address) as u16) << 8 | self.read_byte(address.saturating_add(1)) as u16
    }

    /// Writes `bytes` sequentially starting at `address`, safety-pad-clamped per byte.
    pub(crate) fn write_bytes(&mut self, address: u16, bytes: &[u8]) {
        for (offset, byte) in bytes.iter().enumerate() {
            self.write_byte(address.saturating_add(offset as u16), *byte);
        }
    }

    /// Returns the maximum addressable size (in bytes) for the active dialect, excluding the
    /// safety pad.
    pub(crate) fn max_addressable_size(&self) -> usize {
        self.address_limit
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chip8_large() -> Dialect {
        Dialect::Chip8 {
            memory_limit_2k: false,
            variable_cycle_timing: false,
        }
    }

    #[test]
    fn test_read_write_byte_round_trip() {
        let mut memory = Memory::new(chip8_large());
        memory.write_byte(0x200, 0xAB);
        assert_eq!(memory.read_byte(0x200), 0xAB);
    }

    #[test]
    fn test_out_of_bounds_write_is_discarded() {
        let mut memory = Memory::new(chip8_large());
        let limit = memory.max_addressable_size() as u16;
        memory.write_byte(limit + 10, 0x42);
        // The pad always reads 0xFF, regardless of the discarded write.
        assert_eq!(memory.read_byte(limit + 10), 0xFF);
    }

    #[test]
    fn test_out_of_bounds_read_does_not_panic() {
        let memory = Memory::new(chip8_large());
        assert_eq!(memory.read_byte(u16::MAX), 0xFF);
    }

    #[test]
    fn test_read_two_bytes() {
        let mut memory = Memory::new(chip8_large());
        memory.write_byte(0x200, 0x12);
        memory.write_byte(0x201, 0x34);
        assert_eq!(memory.read_two_bytes(0x200), 0x1234);
    }

    #[test]
    fn test_write_bytes_and_read_bytes() {
        let mut memory = Memory::new(chip8_large());
        memory.write_bytes(0x300, &[1, 2, 3, 4]);
        assert_eq!(memory.read_bytes(0x300, 4), vec![1, 2, 3, 4]);
    }

    #[test]
    fn test_address_limit_chip8_small() {
        let memory = Memory::new(Dialect::Chip8 {
            memory_limit_2k: true,
            variable_cycle_timing: false,
        });
        assert_eq!(memory.max_addressable_size(), CHIP8_SMALL_LIMIT);
    }

    #[test]
    fn test_address_limit_xochip_extended() {
        let memory = Memory::new(Dialect::XoChip);
        assert_eq!(memory.max_addressable_size(), XOCHIP_LIMIT);
    }
}
