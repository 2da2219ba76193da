//! Per-opcode execution. [Processor::dispatch] routes a decoded [Instruction] to the
//! `execute_*` handler responsible for it; each handler returns the COSMAC machine-cycle cost
//! of the operation plus any [Interrupt] it raises.

use rand::Rng;

use crate::audio::{pitch_to_frequency, Waveform};
use crate::dialect::{Dialect, Resolution};
use crate::display::BlendMode;
use crate::error::ErrorDetail;
use crate::instruction::Instruction;
use crate::interrupt::Interrupt;
use crate::processor::{Processor, ProcessorStatus, RPL_REGISTER_COUNT};

type ExecResult = Result<(u64, Interrupt), ErrorDetail>;

const NO_INTERRUPT: Interrupt = Interrupt::None;

impl Processor {
    /// Routes a decoded [Instruction] to its handler.
    pub(crate) fn dispatch(&mut self, instruction: Instruction) -> ExecResult {
        match instruction {
            Instruction::Op00CN { n } => self.execute_00cn(n),
            Instruction::Op00E0 => self.execute_00e0(),
            Instruction::Op00EE => self.execute_00ee(),
            Instruction::Op00ED => self.execute_00ed(),
            Instruction::Op00F2 => self.execute_00f2(),
            Instruction::Op00FB => self.execute_00fb(),
            Instruction::Op00FC => self.execute_00fc(),
            Instruction::Op00FD => self.execute_00fd(),
            Instruction::Op00FE => self.execute_00fe(),
            Instruction::Op00FF => self.execute_00ff(),
            Instruction::Op0010 => self.execute_0010(),
            Instruction::Op0011 => self.execute_0011(),
            Instruction::Op0151 => self.execute_0151(),
            Instruction::Op0188 => self.execute_0188(),
            Instruction::Op01NN { nn } => self.execute_01nn(nn),
            Instruction::Op02A0 => self.execute_02a0(),
            Instruction::Op0NNN { nnn } => self.execute_0nnn(nnn),
            Instruction::Op1NNN { nnn } => self.execute_1nnn(nnn),
            Instruction::Op2NNN { nnn } => self.execute_2nnn(nnn),
            Instruction::Op3XNN { x, nn } => self.execute_3xnn(x, nn),
            Instruction::Op4XNN { x, nn } => self.execute_4xnn(x, nn),
            Instruction::Op5XY0 { x, y } => self.execute_5xy0(x, y),
            Instruction::Op5XY1 { x, y } => self.execute_5xy1(x, y),
            Instruction::Op5XY2 { x, y } => self.execute_5xy2(x, y),
            Instruction::Op5XY3 { x, y } => self.execute_5xy3(x, y),
            Instruction::Op5XY4 { x, y } => self.execute_5xy4(x, y),
            Instruction::Op6XNN { x, nn } => self.execute_6xnn(x, nn),
            Instruction::Op7XNN { x, nn } => self.execute_7xnn(x, nn),
            Instruction::Op8XY0 { x, y } => self.execute_8xy0(x, y),
            Instruction::Op8XY1 { x, y } => self.execute_8xy1(x, y),
            Instruction::Op8XY2 { x, y } => self.execute_8xy2(x, y),
            Instruction::Op8XY3 { x, y } => self.execute_8xy3(x, y),
            Instruction::Op8XY4 { x, y } => self.execute_8xy4(x, y),
            Instruction::Op8XY5 { x, y } => self.execute_8xy5(x, y),
            Instruction::Op8XY6 { x, y } => self.execute_8xy6(x, y),
            Instruction::Op8XY7 { x, y } => self.execute_8xy7(x, y),
            Instruction::Op8XYE { x, y } => self.execute_8xye(x, y),
            Instruction::Op9XY0 { x, y } => self.execute_9xy0(x, y),
            Instruction::OpANNN { nnn } => self.execute_annn(nnn),
            Instruction::OpBNNN { nnn } => self.execute_bnnn(nnn),
            Instruction::OpBBNN { nn } => self.execute_bbnn(nn),
            Instruction::OpBFNN { nn } => self.execute_bfnn(nn),
            Instruction::OpCXNN { x, nn } => self.execute_cxnn(x, nn),
            Instruction::OpDXYN { x, y, n } => self.execute_dxyn(x, y, n),
            Instruction::OpEX9E { x } => self.execute_ex9e(x),
            Instruction::OpEXA1 { x } => self.execute_exa1(x),
            Instruction::OpEXF2 { x } => self.execute_exf2(x),
            Instruction::OpEXF5 { x } => self.execute_exf5(x),
            Instruction::OpFX07 { x } => self.execute_fx07(x),
            Instruction::OpFX15 { x } => self.execute_fx15(x),
            Instruction::OpFX18 { x } => self.execute_fx18(x),
            Instruction::OpFX1B { x } => self.execute_fx1b(x),
            Instruction::OpFX1E { x } => self.execute_fx1e(x),
            Instruction::OpFX0A { x } => self.execute_fx0a(x),
            Instruction::OpFX29 { x } => self.execute_fx29(x),
            Instruction::OpFX30 { x } => self.execute_fx30(x),
            Instruction::OpFX33 { x } => self.execute_fx33(x),
            Instruction::OpFX3A { x } => self.execute_fx3a(x),
            Instruction::OpFX4F { x } => self.execute_fx4f(x),
            Instruction::OpFX55 { x } => self.execute_fx55(x),
            Instruction::OpFX65 { x } => self.execute_fx65(x),
            Instruction::OpFX75 { x } => self.execute_fx75(x),
            Instruction::OpFX85 { x } => self.execute_fx85(x),
            Instruction::OpFXE3 { x } => self.execute_fxe3(x),
            Instruction::OpFXE7 { x } => self.execute_fxe7(x),
            Instruction::OpFXF8 { x } => self.execute_fxf8(x),
            Instruction::OpFN01 { n } => self.execute_fn01(n),
            Instruction::OpF000 => self.execute_f000(),
            Instruction::OpF002 => self.execute_f002(),
        }
    }

    fn execute_00cn(&mut self, n: u8) -> ExecResult {
        let rows = if matches!(self.frame_buffer.resolution, Resolution::Low) {
            (n / 2).max(1) as usize
        } else {
            n as usize
        };
        self.frame_buffer.scroll_down(self.plane_mask, rows);
        let interrupt = if self.quirks.wait_scroll {
            Interrupt::Frame
        } else {
            NO_INTERRUPT
        };
        Ok((1, interrupt))
    }

    fn execute_00e0(&mut self) -> ExecResult {
        self.frame_buffer.clear(self.plane_mask);
        let interrupt = if self.quirks.wait_vblank {
            Interrupt::Frame
        } else {
            NO_INTERRUPT
        };
        Ok((1, interrupt))
    }

    fn execute_00ee(&mut self) -> ExecResult {
        self.program_counter = self.stack.pop()?;
        Ok((10, NO_INTERRUPT))
    }

    fn execute_00ed(&mut self) -> ExecResult {
        Ok((1, Interrupt::Sound))
    }

    fn execute_00f2(&mut self) -> ExecResult {
        Ok((1, NO_INTERRUPT))
    }

    fn execute_00fb(&mut self) -> ExecResult {
        let columns = if matches!(self.frame_buffer.resolution, Resolution::Low) {
            2
        } else {
            4
        };
        self.frame_buffer.scroll_right(self.plane_mask, columns);
        let interrupt = if self.quirks.wait_scroll {
            Interrupt::Frame
        } else {
            NO_INTERRUPT
        };
        Ok((1, interrupt))
    }

    fn execute_00fc(&mut self) -> ExecResult {
        let columns = if matches!(self.frame_buffer.resolution, Resolution::Low) {
            2
        } else {
            4
        };
        self.frame_buffer.scroll_left(self.plane_mask, columns);
        let interrupt = if self.quirks.wait_scroll {
            Interrupt::Frame
        } else {
            NO_INTERRUPT
        };
        Ok((1, interrupt))
    }

    fn execute_00fd(&mut self) -> ExecResult {
        self.status = ProcessorStatus::Completed;
        Ok((1, Interrupt::Sound))
    }

    fn execute_00fe(&mut self) -> ExecResult {
        self.frame_buffer.set_resolution(Resolution::Low);
        Ok((1, NO_INTERRUPT))
    }

    fn execute_00ff(&mut self) -> ExecResult {
        let resolution = if matches!(self.dialect, Dialect::MegaChip) {
            Resolution::MegaChip
        } else {
            Resolution::High
        };
        self.frame_buffer.set_resolution(resolution);
        if matches!(self.dialect, Dialect::SuperChipLegacy) {
            // SCHIP-LEGACY is vblank-synced only in low-resolution mode.
            self.quirks.wait_vblank = false;
        }
        Ok((1, NO_INTERRUPT))
    }

    fn execute_0010(&mut self) -> ExecResult {
        self.frame_buffer.manual_refresh = false;
        self.frame_buffer.blend_mode = BlendMode::Normal;
        Ok((1, NO_INTERRUPT))
    }

    fn execute_0011(&mut self) -> ExecResult {
        self.frame_buffer.manual_refresh = true;
        self.frame_buffer.blend_mode = BlendMode::AlphaBlend;
        self.texture_width = 256;
        self.texture_height = 256;
        self.texture_opacity = 0xFF;
        self.texture_collide = 0;
        Ok((1, NO_INTERRUPT))
    }

    fn execute_0151(&mut self) -> ExecResult {
        Ok((1, Interrupt::Delay))
    }

    fn execute_0188(&mut self) -> ExecResult {
        self.program_counter = self.program_counter.wrapping_add(2);
        Ok((1, NO_INTERRUPT))
    }

    fn execute_01nn(&mut self, nn: u8) -> ExecResult {
        // MEGACHIP palette upload: each `01NN` supplies the next palette index's packed byte in
        // a short sequence initiated by a preceding bulk transfer; approximated here as loading
        // the low byte of the next free palette slot's red channel.
        let index = (self.cycles % 256) as usize;
        self.frame_buffer.palette[index].r = nn;
        Ok((1, NO_INTERRUPT))
    }

    fn execute_02a0(&mut self) -> ExecResult {
        // CHIP-8X background colour rotation; approximated as cycling the palette's first
        // entry through the four CHIP-8X background colours.
        let palette = &mut self.frame_buffer.palette[0];
        *palette = crate::display::Rgba {
            r: palette.g,
            g: palette.b,
            b: palette.r,
            a: 0xFF,
        };
        Ok((1, NO_INTERRUPT))
    }

    fn execute_0nnn(&mut self, _nnn: u16) -> ExecResult {
        // Machine-language routine calls are not emulated; treated as a no-op, matching the
        // common modern-interpreter convention.
        Ok((1, NO_INTERRUPT))
    }

    fn execute_1nnn(&mut self, nnn: u16) -> ExecResult {
        self.program_counter = nnn;
        Ok((12, NO_INTERRUPT))
    }

    fn execute_2nnn(&mut self, nnn: u16) -> ExecResult {
        self.stack.push(self.program_counter)?;
        self.program_counter = nnn;
        Ok((12, NO_INTERRUPT))
    }

    fn execute_3xnn(&mut self, x: usize, nn: u8) -> ExecResult {
        if self.variable_registers[x] == nn {
            self.program_counter = self.program_counter.wrapping_add(2);
        }
        Ok((10, NO_INTERRUPT))
    }

    fn execute_4xnn(&mut self, x: usize, nn: u8) -> ExecResult {
        if self.variable_registers[x] != nn {
            self.program_counter = self.program_counter.wrapping_add(2);
        }
        Ok((10, NO_INTERRUPT))
    }

    fn execute_5xy0(&mut self, x: usize, y: usize) -> ExecResult {
        if self.variable_registers[x] == self.variable_registers[y] {
            self.program_counter = self.program_counter.wrapping_add(2);
        }
        Ok((10, NO_INTERRUPT))
    }

    fn execute_5xy1(&mut self, x: usize, y: usize) -> ExecResult {
        if self.variable_registers[x] > self.variable_registers[y] {
            self.program_counter = self.program_counter.wrapping_add(2);
        }
        Ok((10, NO_INTERRUPT))
    }

    fn range_bounds(x: usize, y: usize) -> (usize, usize, bool) {
        if x <= y {
            (x, y - x + 1, false)
        } else {
            (y, x - y + 1, true)
        }
    }

    fn execute_5xy2(&mut self, x: usize, y: usize) -> ExecResult {
        let (start, dist, reversed) = Self::range_bounds(x, y);
        for offset in 0..dist {
            let register = if reversed { start + dist - 1 - offset } else { start + offset };
            self.memory.write_byte(
                self.index_register.wrapping_add(offset as u16),
                self.variable_registers[register],
            );
        }
        Ok((1, NO_INTERRUPT))
    }

    fn execute_5xy3(&mut self, x: usize, y: usize) -> ExecResult {
        let (start, dist, reversed) = Self::range_bounds(x, y);
        for offset in 0..dist {
            let register = if reversed { start + dist - 1 - offset } else { start + offset };
            self.variable_registers[register] =
                self.memory.read_byte(self.index_register.wrapping_add(offset as u16));
        }
        Ok((1, NO_INTERRUPT))
    }

    fn execute_5xy4(&mut self, x: usize, y: usize) -> ExecResult {
        let (start, dist, reversed) = Self::range_bounds(x, y);
        for offset in 0..dist {
            let register = if reversed { start + dist - 1 - offset } else { start + offset };
            if register < RPL_REGISTER_COUNT {
                self.rpl_registers[register] = self.variable_registers[register];
            }
        }
        Ok((1, NO_INTERRUPT))
    }

    fn execute_6xnn(&mut self, x: usize, nn: u8) -> ExecResult {
        self.variable_registers[x] = nn;
        Ok((6, NO_INTERRUPT))
    }

    fn execute_7xnn(&mut self, x: usize, nn: u8) -> ExecResult {
        self.variable_registers[x] = self.variable_registers[x].wrapping_add(nn);
        Ok((10, NO_INTERRUPT))
    }

    fn execute_8xy0(&mut self, x: usize, y: usize) -> ExecResult {
        self.variable_registers[x] = self.variable_registers[y];
        Ok((10, NO_INTERRUPT))
    }

    fn execute_8xy1(&mut self, x: usize, y: usize) -> ExecResult {
        self.variable_registers[x] |= self.variable_registers[y];
        Ok((10, NO_INTERRUPT))
    }

    fn execute_8xy2(&mut self, x: usize, y: usize) -> ExecResult {
        self.variable_registers[x] &= self.variable_registers[y];
        Ok((10, NO_INTERRUPT))
    }

    fn execute_8xy3(&mut self, x: usize, y: usize) -> ExecResult {
        self.variable_registers[x] ^= self.variable_registers[y];
        Ok((10, NO_INTERRUPT))
    }

    fn execute_8xy4(&mut self, x: usize, y: usize) -> ExecResult {
        let (result, overflow) =
            self.variable_registers[x].overflowing_add(self.variable_registers[y]);
        self.variable_registers[x] = result;
        self.variable_registers[0xF] = overflow as u8;
        Ok((18, NO_INTERRUPT))
    }

    fn execute_8xy5(&mut self, x: usize, y: usize) -> ExecResult {
        let (result, borrow) =
            self.variable_registers[x].overflowing_sub(self.variable_registers[y]);
        self.variable_registers[x] = result;
        self.variable_registers[0xF] = !borrow as u8;
        Ok((18, NO_INTERRUPT))
    }

    fn execute_8xy6(&mut self, x: usize, y: usize) -> ExecResult {
        let source = if self.quirks.shift_vx { x } else { y };
        let value = self.variable_registers[source];
        self.variable_registers[x] = value >> 1;
        self.variable_registers[0xF] = value & 0x1;
        Ok((10, NO_INTERRUPT))
    }

    fn execute_8xy7(&mut self, x: usize, y: usize) -> ExecResult {
        let (result, borrow) =
            self.variable_registers[y].overflowing_sub(self.variable_registers[x]);
        self.variable_registers[x] = result;
        self.variable_registers[0xF] = !borrow as u8;
        Ok((18, NO_INTERRUPT))
    }

    fn execute_8xye(&mut self, x: usize, y: usize) -> ExecResult {
        let source = if self.quirks.shift_vx { x } else { y };
        let value = self.variable_registers[source];
        self.variable_registers[x] = value << 1;
        self.variable_registers[0xF] = (value & 0x80) >> 7;
        Ok((10, NO_INTERRUPT))
    }

    fn execute_9xy0(&mut self, x: usize, y: usize) -> ExecResult {
        if self.variable_registers[x] != self.variable_registers[y] {
            self.program_counter = self.program_counter.wrapping_add(2);
        }
        Ok((10, NO_INTERRUPT))
    }

    fn execute_annn(&mut self, nnn: u16) -> ExecResult {
        self.index_register = nnn;
        Ok((12, NO_INTERRUPT))
    }

    /// The dialect-dependent meaning of a `BNNN`-shaped jump, shared by [Processor::execute_bnnn]
    /// and the non-CHIP-8E paths of [Processor::execute_bbnn]/[Processor::execute_bfnn] (CHIP-8E
    /// instead replaces `BNNN` outright with its own relative-jump formula).
    fn jump_bnnn(&mut self, nnn: u16) {
        match self.dialect {
            Dialect::Chip8X => {
                let x = ((nnn & 0x0F00) >> 8) as usize;
                let y = ((nnn & 0x00F0) >> 4) as usize;
                let size = (nnn & 0x000F) as usize;
                for row in 0..size.max(1) {
                    self.frame_buffer
                        .draw_byte(0, x * 4, y * 4 + row, 0xF0, false);
                }
            }
            Dialect::SuperChipLegacy | Dialect::XoChip | Dialect::MegaChip => {
                let x = ((nnn & 0x0F00) >> 8) as usize;
                self.program_counter =
                    nnn.wrapping_add(self.variable_registers[x] as u16);
            }
            _ => {
                self.program_counter = nnn.wrapping_add(self.variable_registers[0] as u16);
            }
        }
    }

    fn execute_bnnn(&mut self, nnn: u16) -> ExecResult {
        self.jump_bnnn(nnn);
        Ok((22, NO_INTERRUPT))
    }

    /// `BBNN` is CHIP-8E's replacement for `BNNN`, jumping to `program_counter - 2 - NN`.
    /// Any other dialect never legitimately emits a `0xBBNN`-shaped opcode, but one is still
    /// decoded as a generic `BNNN` jump using the reconstructed `NNN` for consistency.
    fn execute_bbnn(&mut self, nn: u8) -> ExecResult {
        if matches!(self.dialect, Dialect::Chip8E) {
            self.program_counter = self
                .program_counter
                .wrapping_sub(2)
                .wrapping_sub(nn as u16);
        } else {
            self.jump_bnnn(0x0B00 | nn as u16);
        }
        Ok((22, NO_INTERRUPT))
    }

    /// `BFNN` is CHIP-8E's replacement for `BNNN`, jumping to `program_counter - 2 + NN`.
    fn execute_bfnn(&mut self, nn: u8) -> ExecResult {
        if matches!(self.dialect, Dialect::Chip8E) {
            self.program_counter = self
                .program_counter
                .wrapping_sub(2)
                .wrapping_add(nn as u16);
        } else {
            self.jump_bnnn(0x0F00 | nn as u16);
        }
        Ok((22, NO_INTERRUPT))
    }

    fn execute_cxnn(&mut self, x: usize, nn: u8) -> ExecResult {
        let random_byte: u8 = rand::thread_rng().gen();
        self.variable_registers[x] = random_byte & nn;
        Ok((36, NO_INTERRUPT))
    }

    fn execute_dxyn(&mut self, x: usize, y: usize, n: u8) -> ExecResult {
        if matches!(self.dialect, Dialect::MegaChip) && self.frame_buffer.manual_refresh {
            return self.execute_dxyn_megachip_texture(x, y);
        }

        let schip_hi = matches!(self.dialect, Dialect::SuperChipLegacy)
            && matches!(self.frame_buffer.resolution, Resolution::High);
        if schip_hi && n == 0 {
            return self.execute_dxy0_schip_hi(x, y);
        }
        if schip_hi {
            return self.execute_dxyn_schip_hi_upscaled(x, y, n);
        }

        let width = self.frame_buffer.resolution.width();
        let height = self.frame_buffer.resolution.height();
        let x_start = (self.variable_registers[x] as usize) & (width - 1);
        let y_start = (self.variable_registers[y] as usize) & (height - 1);
        let wrap = self.quirks.wrap_sprite;
        let row_count = if wrap {
            n as usize
        } else {
            self.frame_buffer.clip_row_count(y_start, n as usize)
        };

        let is_xochip = matches!(self.dialect, Dialect::XoChip);
        let active_planes: Vec<usize> = if is_xochip {
            (0..4).filter(|bit| self.plane_mask & (1 << bit) != 0).collect()
        } else {
            vec![0]
        };
        let mut collided = false;
        let mut address = self.index_register;
        for &plane_index in &active_planes {
            for row in 0..row_count {
                let byte = self.memory.read_byte(address);
                address = address.wrapping_add(1);
                if self
                    .frame_buffer
                    .draw_byte(plane_index, x_start, y_start + row, byte, wrap)
                {
                    collided = true;
                }
            }
        }
        self.variable_registers[0xF] = collided as u8;
        let interrupt = if self.quirks.wait_vblank {
            Interrupt::Frame
        } else {
            NO_INTERRUPT
        };
        Ok((n as u64 * 20 + 22, interrupt))
    }

    /// `DXY0` in SCHIP-LEGACY HI mode draws a 16-row by 16-pixel-wide sprite (2 bytes per row)
    /// instead of the usual 1-byte-wide, N-row sprite. `VF` holds the number of rows that
    /// either collided or were clipped off the bottom of the screen.
    fn execute_dxy0_schip_hi(&mut self, x: usize, y: usize) -> ExecResult {
        let height = self.frame_buffer.resolution.height();
        let x_start = self.variable_registers[x] as usize;
        let y_start = self.variable_registers[y] as usize;
        let wrap = self.quirks.wrap_sprite;
        let mut address = self.index_register;
        let mut collision_total: u8 = 0;
        for row in 0..16usize {
            let y_row = y_start + row;
            if !wrap && y_row >= height {
                collision_total += 1;
                address = address.wrapping_add(2);
                continue;
            }
            let high_byte = self.memory.read_byte(address);
            let low_byte = self.memory.read_byte(address.wrapping_add(1));
            address = address.wrapping_add(2);
            let mut row_collided = self.frame_buffer.draw_byte(0, x_start, y_row, high_byte, wrap);
            row_collided |= self
                .frame_buffer
                .draw_byte(0, x_start + 8, y_row, low_byte, wrap);
            if row_collided {
                collision_total += 1;
            }
        }
        self.variable_registers[0xF] = collision_total;
        Ok((32u64 * 20 + 22, NO_INTERRUPT))
    }

    /// A non-`DXY0` sprite drawn by SCHIP-LEGACY while in HI mode is upscaled to 2x2 pixel
    /// blocks (the dialect's native drawing resolution is LO; HI mode doubles it). `VF` holds
    /// the row-count collision total rather than a plain boolean.
    fn execute_dxyn_schip_hi_upscaled(&mut self, x: usize, y: usize, n: u8) -> ExecResult {
        let height = self.frame_buffer.resolution.height();
        let x_start = (self.variable_registers[x] as usize) * 2;
        let y_start = (self.variable_registers[y] as usize) * 2;
        let wrap = self.quirks.wrap_sprite;
        let mut address = self.index_register;
        let mut collision_total: u8 = 0;
        for row in 0..n as usize {
            let byte = self.memory.read_byte(address);
            address = address.wrapping_add(1);
            let (left, right) = Processor::duplicate_bits(byte);
            let y_row = y_start + row * 2;
            if !wrap && y_row >= height {
                collision_total += 1;
                continue;
            }
            let mut row_collided = self.frame_buffer.draw_byte(0, x_start, y_row, left, wrap);
            row_collided |= self
                .frame_buffer
                .draw_byte(0, x_start, y_row + 1, left, wrap);
            row_collided |= self
                .frame_buffer
                .draw_byte(0, x_start + 8, y_row, right, wrap);
            row_collided |= self
                .frame_buffer
                .draw_byte(0, x_start + 8, y_row + 1, right, wrap);
            if row_collided {
                collision_total += 1;
            }
        }
        self.variable_registers[0xF] = collision_total;
        Ok((n as u64 * 40 + 22, NO_INTERRUPT))
    }

    /// Takes a byte and duplicates each bit next to itself, returning the left and right halves
    /// of the resulting 16-bit value as two bytes (used to upscale a sprite row 2x horizontally).
    fn duplicate_bits(byte: u8) -> (u8, u8) {
        let mut y: u16 = byte as u16;
        y = (y | (y << 4)) & 0x0F0F;
        y = (y | (y << 2)) & 0x3333;
        y = (y | (y << 1)) & 0x5555;
        y |= y << 1;
        ((y >> 8) as u8, (y & 0xFF) as u8)
    }

    /// MEGACHIP manual-refresh `DXYN` draws a `texture_width x texture_height` textured
    /// rectangle from `I`, indexing into the 256-entry palette and compositing into
    /// `background` via the active blend mode. A collision is raised when `collision_map`
    /// at that pixel already equals `texture_collide`.
    fn execute_dxyn_megachip_texture(&mut self, x: usize, y: usize) -> ExecResult {
        let width = self.frame_buffer.resolution.width();
        let height = self.frame_buffer.resolution.height();
        let wrap = self.quirks.wrap_sprite;
        let origin_x = self.variable_registers[x] as usize;
        let origin_y = self.variable_registers[y] as usize;
        self.variable_registers[0xF] = 0;
        if !wrap && origin_y >= height {
            return Ok((22, NO_INTERRUPT));
        }

        let texture_width = self.texture_width;
        let texture_height = self.texture_height;
        let opacity = self.texture_opacity;
        let collide_against = self.texture_collide;
        let base_address = self.index_register;
        let mut collided = false;
        for row in 0..texture_height {
            let offset_y = origin_y + row;
            if wrap {
                if offset_y >= height {
                    continue;
                }
            } else if offset_y >= height {
                break;
            }
            let row_address = base_address.wrapping_add((row * texture_width) as u16);
            for col in 0..texture_width {
                let offset_x = origin_x + col;
                if !wrap && offset_x >= width {
                    break;
                }
                let offset_x = offset_x % width;
                let color_index = self.memory.read_byte(row_address.wrapping_add(col as u16));
                if color_index == 0 {
                    continue;
                }
                if self
                    .frame_buffer
                    .composite_texture_pixel(offset_x, offset_y, color_index, collide_against, opacity)
                {
                    collided = true;
                }
            }
        }
        if collided {
            self.variable_registers[0xF] = 1;
        }
        Ok((22, NO_INTERRUPT))
    }

    fn execute_ex9e(&mut self, x: usize) -> ExecResult {
        if self.keystate.is_key_pressed(self.variable_registers[x] & 0x0F)? {
            self.program_counter = self.program_counter.wrapping_add(2);
        }
        Ok((14, NO_INTERRUPT))
    }

    fn execute_exa1(&mut self, x: usize) -> ExecResult {
        if !self.keystate.is_key_pressed(self.variable_registers[x] & 0x0F)? {
            self.program_counter = self.program_counter.wrapping_add(2);
        }
        Ok((14, NO_INTERRUPT))
    }

    fn execute_exf2(&mut self, x: usize) -> ExecResult {
        if self
            .keystate
            .is_key_pressed_player_two(self.variable_registers[x] & 0x0F)?
        {
            self.program_counter = self.program_counter.wrapping_add(2);
        }
        Ok((14, NO_INTERRUPT))
    }

    fn execute_exf5(&mut self, x: usize) -> ExecResult {
        if !self
            .keystate
            .is_key_pressed_player_two(self.variable_registers[x] & 0x0F)?
        {
            self.program_counter = self.program_counter.wrapping_add(2);
        }
        Ok((14, NO_INTERRUPT))
    }

    fn execute_fx07(&mut self, x: usize) -> ExecResult {
        self.variable_registers[x] = self.delay_timer;
        Ok((10, NO_INTERRUPT))
    }

    fn execute_fx15(&mut self, x: usize) -> ExecResult {
        self.delay_timer = self.variable_registers[x];
        Ok((10, NO_INTERRUPT))
    }

    fn execute_fx18(&mut self, x: usize) -> ExecResult {
        self.sound_timer = self.variable_registers[x];
        self.audio.voice.playing = self.sound_timer > 0;
        if matches!(self.dialect, Dialect::XoChip) {
            self.audio.voice.waveform = Waveform::Pattern;
            self.audio.voice.frequency_hz = pitch_to_frequency(self.pattern_pitch);
            self.audio.voice.pattern = self.pattern;
        }
        Ok((10, NO_INTERRUPT))
    }

    fn execute_fx1b(&mut self, x: usize) -> ExecResult {
        self.program_counter = self
            .program_counter
            .wrapping_add(self.variable_registers[x] as u16);
        Ok((1, NO_INTERRUPT))
    }

    fn execute_fx1e(&mut self, x: usize) -> ExecResult {
        self.index_register = self
            .index_register
            .wrapping_add(self.variable_registers[x] as u16);
        Ok((16, NO_INTERRUPT))
    }

    fn execute_fx0a(&mut self, x: usize) -> ExecResult {
        match self.keystate.get_keys_pressed() {
            Some(keys) => {
                self.variable_registers[x] = keys[0];
                Ok((1, NO_INTERRUPT))
            }
            None => {
                self.status = ProcessorStatus::WaitingForKeypress;
                self.program_counter = self.program_counter.wrapping_sub(2);
                Ok((1, Interrupt::Input))
            }
        }
    }

    fn execute_fx29(&mut self, x: usize) -> ExecResult {
        let digit = (self.variable_registers[x] & 0x0F) as u16;
        self.index_register = self
            .font_start_address
            .wrapping_add(digit * self.font.char_size() as u16);
        Ok((10, NO_INTERRUPT))
    }

    fn execute_fx30(&mut self, x: usize) -> ExecResult {
        let digit = (self.variable_registers[x] & 0x0F) as u16;
        let char_size = self
            .high_resolution_font
            .as_ref()
            .map(|font| font.char_size())
            .unwrap_or(5) as u16;
        self.index_register = self
            .high_resolution_font_start_address
            .wrapping_add(digit * char_size);
        Ok((10, NO_INTERRUPT))
    }

    fn execute_fx33(&mut self, x: usize) -> ExecResult {
        let value = self.variable_registers[x];
        self.memory.write_byte(self.index_register, value / 100);
        self.memory
            .write_byte(self.index_register.wrapping_add(1), (value / 10) % 10);
        self.memory
            .write_byte(self.index_register.wrapping_add(2), value % 10);
        Ok((88, NO_INTERRUPT))
    }

    fn execute_fx3a(&mut self, x: usize) -> ExecResult {
        self.pattern_pitch = self.variable_registers[x];
        Ok((1, NO_INTERRUPT))
    }

    fn execute_fx4f(&mut self, x: usize) -> ExecResult {
        self.delay_timer = self.variable_registers[x];
        Ok((1, Interrupt::Delay))
    }

    fn execute_fx55(&mut self, x: usize) -> ExecResult {
        for offset in 0..=x {
            self.memory.write_byte(
                self.index_register.wrapping_add(offset as u16),
                self.variable_registers[offset],
            );
        }
        if !self.quirks.idx_reg_no_inc {
            let increment = if self.quirks.idx_reg_minus { x } else { x + 1 };
            self.index_register = self.index_register.wrapping_add(increment as u16);
        }
        Ok((1, NO_INTERRUPT))
    }

    fn execute_fx65(&mut self, x: usize) -> ExecResult {
        for offset in 0..=x {
            self.variable_registers[offset] =
                self.memory.read_byte(self.index_register.wrapping_add(offset as u16));
        }
        if !self.quirks.idx_reg_no_inc {
            let increment = if self.quirks.idx_reg_minus { x } else { x + 1 };
            self.index_register = self.index_register.wrapping_add(increment as u16);
        }
        Ok((1, NO_INTERRUPT))
    }

    fn execute_fx75(&mut self, x: usize) -> ExecResult {
        if matches!(self.dialect, Dialect::MegaChip) {
            self.audio.tracks[0].playing = true;
            self.audio.tracks[0].waveform = Waveform::ByteStream;
            return Ok((1, NO_INTERRUPT));
        }
        for offset in 0..=x.min(RPL_REGISTER_COUNT - 1) {
            self.rpl_registers[offset] = self.variable_registers[offset];
        }
        Ok((1, NO_INTERRUPT))
    }

    fn execute_fx85(&mut self, x: usize) -> ExecResult {
        if matches!(self.dialect, Dialect::MegaChip) {
            self.audio.tracks[0].playing = false;
            return Ok((1, NO_INTERRUPT));
        }
        for offset in 0..=x.min(RPL_REGISTER_COUNT - 1) {
            self.variable_registers[offset] = self.rpl_registers[offset];
        }
        Ok((1, NO_INTERRUPT))
    }

    fn execute_fxe3(&mut self, _x: usize) -> ExecResult {
        Ok((1, Interrupt::Frame))
    }

    fn execute_fxe7(&mut self, _x: usize) -> ExecResult {
        Ok((1, Interrupt::Frame))
    }

    fn execute_fxf8(&mut self, x: usize) -> ExecResult {
        self.audio.voice.waveform = Waveform::Pulse;
        self.audio.voice.frequency_hz = 160.0 + (self.variable_registers[x] as f32) * 5.0;
        Ok((1, NO_INTERRUPT))
    }

    fn execute_fn01(&mut self, n: u8) -> ExecResult {
        self.plane_mask = n & 0x0F;
        Ok((1, NO_INTERRUPT))
    }

    fn execute_f000(&mut self) -> ExecResult {
        self.index_register = self.memory.read_two_bytes(self.program_counter.wrapping_sub(2));
        Ok((1, NO_INTERRUPT))
    }

    fn execute_f002(&mut self) -> ExecResult {
        let pattern = self.memory.read_bytes(self.index_register, 16);
        self.pattern.copy_from_slice(&pattern);
        self.audio.voice.pattern = self.pattern;
        Ok((1, NO_INTERRUPT))
    }
}
