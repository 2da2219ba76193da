//! Dialect selection and the per-dialect quirk table.

use std::path::Path;

use serde_derive::{Deserialize, Serialize};

/// The six CHIP-8 family variants `chipolata` emulates.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Dialect {
    /// Classic CHIP-8, as run on the COSMAC VIP.
    Chip8 {
        /// `true` restricts addressable memory to 2KB, matching the original COSMAC VIP.
        memory_limit_2k: bool,
        /// `true` paces cycles using historically-accurate per-opcode costs rather than a
        /// flat cycles-per-frame budget.
        variable_cycle_timing: bool,
    },
    /// CHIP-8E, an early extension adding ranged register ops and extra interrupts.
    Chip8E,
    /// CHIP-8X, the two-player, colour-capable RCA variant.
    Chip8X,
    /// SCHIP-LEGACY, the original (1.0/1.1) SUPER-CHIP behaviour.
    SuperChipLegacy,
    /// XO-CHIP, the modern multi-plane, extended-memory, pattern-audio variant.
    XoChip,
    /// MEGACHIP, the 24-bit colour, manual-refresh variant.
    MegaChip,
}

impl Default for Dialect {
    fn default() -> Self {
        Dialect::Chip8 {
            memory_limit_2k: false,
            variable_cycle_timing: false,
        }
    }
}

impl Dialect {
    /// Selects a [Dialect] from the file extension of a ROM path, defaulting to classic
    /// CHIP-8 (with no memory limit and flat cycle timing) for an unrecognised extension.
    pub fn from_rom_path(path: &Path) -> Dialect {
        match path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.to_ascii_lowercase())
            .as_deref()
        {
            Some("c8e") => Dialect::Chip8E,
            Some("c8x") => Dialect::Chip8X,
            Some("sc8") => Dialect::SuperChipLegacy,
            Some("xo8") => Dialect::XoChip,
            Some("mc8") => Dialect::MegaChip,
            _ => Dialect::default(),
        }
    }

    /// Returns `true` if this dialect uses historically-variable per-opcode cycle costs
    /// rather than a flat cycles-per-frame budget.
    pub fn variable_cycle_timing(&self) -> bool {
        matches!(
            self,
            Dialect::Chip8 {
                variable_cycle_timing: true,
                ..
            }
        )
    }

    /// Returns the display resolution this dialect starts in.
    pub fn default_resolution(&self) -> Resolution {
        match self {
            Dialect::MegaChip => Resolution::MegaChip,
            _ => Resolution::Low,
        }
    }

    /// Returns the number of colour bit-planes this dialect's display supports.
    pub fn plane_count(&self) -> u8 {
        match self {
            Dialect::XoChip => 4,
            _ => 1,
        }
    }
}

/// The active display resolution, driven by dialect and (for SCHIP/XO-CHIP) the `00FE`/`00FF`
/// opcodes.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Resolution {
    /// 64x32, the resolution every dialect starts in (except MEGACHIP).
    Low,
    /// 128x64, entered via `00FF` on SUPER-CHIP-family and XO-CHIP dialects.
    High,
    /// 256x192, the fixed MEGACHIP canvas.
    MegaChip,
}

impl Resolution {
    pub fn width(&self) -> usize {
        match self {
            Resolution::Low => 64,
            Resolution::High => 128,
            Resolution::MegaChip => 256,
        }
    }

    pub fn height(&self) -> usize {
        match self {
            Resolution::Low => 32,
            Resolution::High => 64,
            Resolution::MegaChip => 192,
        }
    }
}

/// The set of behavioural flags that vary between dialects, consulted by opcode execution
/// instead of matching on [Dialect] directly.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Default)]
pub struct Quirks {
    /// `00E0`/frame end waits for a vertical blank before the next frame begins.
    pub wait_vblank: bool,
    /// Sprites that would be clipped at the display edge wrap around instead.
    pub wrap_sprite: bool,
    /// `8XY6`/`8XYE` shift `Vx` in place; when unset they first copy `Vy` into `Vx`.
    pub shift_vx: bool,
    /// `FX55`/`FX65` leave `index_register` unmodified instead of advancing it.
    pub idx_reg_no_inc: bool,
    /// `FX55`/`FX65` advance `index_register` by `X` rather than `X + 1`.
    pub idx_reg_minus: bool,
    /// Scrolling opcodes (SUPER-CHIP `00CN`/`00FB`/`00FC`) wait for a vertical blank.
    pub wait_scroll: bool,
}

impl Quirks {
    /// Derives the quirk table for a given dialect. This is the single place dialect
    /// behavioural differences are resolved into flags; opcode execution should never match
    /// on [Dialect] directly for quirk purposes.
    pub fn for_dialect(dialect: Dialect) -> Quirks {
        match dialect {
            Dialect::Chip8 { .. } => Quirks {
                wait_vblank: true,
                wrap_sprite: false,
                shift_vx: false,
                idx_reg_no_inc: false,
                idx_reg_minus: false,
                wait_scroll: false,
            },
            Dialect::Chip8E => Quirks {
                wait_vblank: true,
                wrap_sprite: false,
                shift_vx: false,
                idx_reg_no_inc: false,
                idx_reg_minus: false,
                wait_scroll: false,
            },
            Dialect::Chip8X => Quirks {
                wait_vblank: true,
                wrap_sprite: false,
                shift_vx: false,
                idx_reg_no_inc: false,
                idx_reg_minus: false,
                wait_scroll: false,
            },
            Dialect::SuperChipLegacy => Quirks {
                wait_vblank: false,
                wrap_sprite: false,
                shift_vx: true,
                idx_reg_no_inc: true,
                idx_reg_minus: false,
                wait_scroll: true,
            },
            Dialect::XoChip => Quirks {
                wait_vblank: false,
                wrap_sprite: true,
                shift_vx: true,
                idx_reg_no_inc: false,
                idx_reg_minus: false,
                wait_scroll: false,
            },
            Dialect::MegaChip => Quirks {
                wait_vblank: false,
                wrap_sprite: false,
                shift_vx: true,
                idx_reg_no_inc: true,
                idx_reg_minus: false,
                wait_scroll: false,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_from_rom_path_recognises_every_extension() {
        assert_eq!(
            Dialect::from_rom_path(&PathBuf::from("game.c8e")),
            Dialect::Chip8E
        );
        assert_eq!(
            Dialect::from_rom_path(&PathBuf::from("game.c8x")),
            Dialect::Chip8X
        );
        assert_eq!(
            Dialect::from_rom_path(&PathBuf::from("game.sc8")),
            Dialect::SuperChipLegacy
        );
        assert_eq!(
            Dialect::from_rom_path(&PathBuf::from("game.xo8")),
            Dialect::XoChip
        );
        assert_eq!(
            Dialect::from_rom_path(&PathBuf::from("game.mc8")),
            Dialect::MegaChip
        );
        assert_eq!(
            Dialect::from_rom_path(&PathBuf::from("game.ch8")),
            Dialect::default()
        );
    }

    #[test]
    fn test_quirks_total_over_all_dialects() {
        for dialect in [
            Dialect::Chip8 {
                memory_limit_2k: false,
                variable_cycle_timing: false,
            },
            Dialect::Chip8E,
            Dialect::Chip8X,
            Dialect::SuperChipLegacy,
            Dialect::XoChip,
            Dialect::MegaChip,
        ] {
            // Must not panic for any dialect variant.
            let _ = Quirks::for_dialect(dialect);
        }
    }

    #[test]
    fn test_superchip_legacy_quirks() {
        let quirks = Quirks::for_dialect(Dialect::SuperChipLegacy);
        assert!(quirks.shift_vx);
        assert!(quirks.idx_reg_no_inc);
        assert!(!quirks.wait_vblank);
    }

    #[test]
    fn test_resolution_dimensions() {
        assert_eq!(Resolution::Low.width(), 64);
        assert_eq!(Resolution::High.height(), 64);
        assert_eq!(Resolution::MegaChip.width(), 256);
    }
}
