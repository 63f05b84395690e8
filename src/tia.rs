//! Television Interface Adapter: beam position, register write latching, and
//! per-pixel compositing into a framebuffer.

use crate::bit_utils::{reverse_bits32, reverse_bits8};
use crate::log;
use crate::logging::{LogCategory, LogLevel};

pub const DISPLAY_WIDTH: usize = 160;
pub const HORIZONTAL_BLANK: i32 = 68;
pub const DISPLAY_NOMINAL_HEIGHT: i32 = 192;
pub const VERTICAL_BLANK: i32 = 37;
pub const OVERSCAN: i32 = 30;
pub const DISPLAY_HEIGHT: i32 = DISPLAY_NOMINAL_HEIGHT + VERTICAL_BLANK + OVERSCAN;
pub const AUTO_VSYNC: i32 = DISPLAY_HEIGHT + 100;

/// A single framebuffer pixel, stored byte-interleaved (not packed) so the
/// display buffer can be read as a flat R,G,B,A byte slice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Rgba {
    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Rgba { r, g, b, a }
    }
}

/// One shadow copy of everything a register write can affect. The TIA keeps
/// two of these: `active` (what `drawPixelLine` reads) and `pending` (what
/// writes land in until the beam catches up).
#[derive(Debug, Clone, Copy, Default)]
pub struct TiaSettings {
    pub pf_mask: u32,
    pub ctrl_pf: u8,
    pub p0_mask: u8,
    pub p1_mask: u8,
    pub color_pf: u8,
    pub color_bk: u8,
    pub color_p0: u8,
    pub color_p1: u8,
    pub reflect_p0: bool,
    pub reflect_p1: bool,
    pub rgba_pf: Rgba,
    pub rgba_bk: Rgba,
    pub rgba_p0: Rgba,
    pub rgba_p1: Rgba,
}

const VSYNC_ADDR: u16 = 0x00;
const WSYNC_ADDR: u16 = 0x02;
const COLUP0_ADDR: u16 = 0x06;
const COLUP1_ADDR: u16 = 0x07;
const COLUPF_ADDR: u16 = 0x08;
const COLUBK_ADDR: u16 = 0x09;
const CTRLPF_ADDR: u16 = 0x0A;
const REFP0_ADDR: u16 = 0x0B;
const REFP1_ADDR: u16 = 0x0C;
const PF0_ADDR: u16 = 0x0D;
const PF1_ADDR: u16 = 0x0E;
const PF2_ADDR: u16 = 0x0F;
const RESP0_ADDR: u16 = 0x10;
const RESP1_ADDR: u16 = 0x11;
const GRP0_ADDR: u16 = 0x1B;
const GRP1_ADDR: u16 = 0x1C;

pub struct Tia {
    active: TiaSettings,
    pending: TiaSettings,
    settings_changed: bool,

    wait_sync: bool,
    vertical_sync: bool,
    reset_p0: bool,
    reset_p1: bool,

    position_x_p0: u8,
    position_x_p1: u8,

    palette: [Rgba; 256],

    pixel_cycles: u32,
    pixel_count: u64,

    scan_x: i32,
    scan_y: i32,

    display: Vec<Rgba>,
}

impl Tia {
    pub fn new() -> Self {
        let mut tia = Tia {
            active: TiaSettings::default(),
            pending: TiaSettings::default(),
            settings_changed: false,
            wait_sync: false,
            vertical_sync: false,
            reset_p0: false,
            reset_p1: false,
            position_x_p0: 0xFF,
            position_x_p1: 0xFF,
            palette: [Rgba::default(); 256],
            pixel_cycles: 0,
            pixel_count: 0,
            scan_x: -1,
            scan_y: 0,
            display: vec![Rgba::default(); DISPLAY_WIDTH * DISPLAY_HEIGHT as usize],
        };
        tia.clear_display();
        tia
    }

    pub fn scan_x(&self) -> i32 {
        self.scan_x
    }

    pub fn scan_y(&self) -> i32 {
        self.scan_y
    }

    pub fn pixel_cycles(&self) -> u32 {
        self.pixel_cycles
    }

    pub fn pixel_count(&self) -> u64 {
        self.pixel_count
    }

    pub fn active_settings(&self) -> &TiaSettings {
        &self.active
    }

    pub fn display(&self) -> &[Rgba] {
        &self.display
    }

    /// Load a 768-byte (256 RGB triples) palette file. Short reads leave the
    /// unread tail at whatever it previously held and log a warning.
    pub fn load_palette<R: std::io::Read>(&mut self, mut input: R) -> std::io::Result<()> {
        let mut buf = [0u8; 3 * 256];
        let mut total_read = 0usize;
        loop {
            match input.read(&mut buf[total_read..]) {
                Ok(0) => break,
                Ok(n) => total_read += n,
                Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            }
        }
        if total_read < buf.len() {
            log!(
                LogCategory::Tia,
                LogLevel::Warn,
                "palette read only {} of {} bytes",
                total_read,
                buf.len()
            );
        }
        let full_entries = total_read / 3;
        for ii in 0..full_entries {
            self.palette[ii] = Rgba::new(buf[ii * 3], buf[ii * 3 + 1], buf[ii * 3 + 2], 0xFF);
        }
        Ok(())
    }

    pub fn read(&self, _addr: u16) -> u8 {
        0
    }

    /// Register write, following the source's address-indexed switch: every
    /// case changes pending settings except the pure-latch registers (WSYNC,
    /// RESP0/RESP1), which leave `settings_changed` at whatever it already
    /// was instead of forcing it true.
    pub fn write(&mut self, addr: u16, data: u8) {
        let addr = addr & 0x3F;
        let mut settings_changed = true;
        match addr {
            VSYNC_ADDR => self.vertical_sync = (data & 2) != 0,
            WSYNC_ADDR => {
                self.wait_sync = true;
                settings_changed = self.settings_changed;
            }
            COLUP0_ADDR => {
                self.pending.color_p0 = data;
                self.pending.rgba_p0 = self.palette[data as usize];
            }
            COLUP1_ADDR => {
                self.pending.color_p1 = data;
                self.pending.rgba_p1 = self.palette[data as usize];
            }
            COLUPF_ADDR => {
                self.pending.color_pf = data;
                self.pending.rgba_pf = self.palette[data as usize];
            }
            COLUBK_ADDR => {
                self.pending.color_bk = data;
                self.pending.rgba_bk = self.palette[data as usize];
            }
            CTRLPF_ADDR => self.pending.ctrl_pf = data,
            REFP0_ADDR => self.pending.reflect_p0 = (data & (1 << 3)) != 0,
            REFP1_ADDR => self.pending.reflect_p1 = (data & (1 << 3)) != 0,
            PF0_ADDR => {
                self.pending.pf_mask &= !0xFu32;
                self.pending.pf_mask |= ((data >> 4) & 0xF) as u32;
            }
            PF1_ADDR => {
                self.pending.pf_mask &= !0xFF0u32;
                self.pending.pf_mask |= (reverse_bits8(data) as u32) << 4;
            }
            PF2_ADDR => {
                self.pending.pf_mask &= !0xFF000u32;
                self.pending.pf_mask |= (data as u32) << 12;
            }
            RESP0_ADDR => {
                self.reset_p0 = true;
                settings_changed = self.settings_changed;
            }
            RESP1_ADDR => {
                self.reset_p1 = true;
                settings_changed = self.settings_changed;
            }
            GRP0_ADDR => self.pending.p0_mask = data,
            GRP1_ADDR => self.pending.p1_mask = data,
            _ => settings_changed = false,
        }
        self.settings_changed = settings_changed;
    }

    fn get_player_position_x(&self) -> u8 {
        let display_x = self.scan_x - HORIZONTAL_BLANK;
        display_x.clamp(0, 255) as u8
    }

    /// Four-phase protocol run after every CPU instruction: queue debt, flush
    /// on a settings change, drain to end-of-line on WSYNC, then latch any
    /// pending player-position resets.
    pub fn advance_pixels(&mut self, pixel_cycles: u32) {
        self.pixel_cycles += pixel_cycles;

        if self.settings_changed {
            self.settings_changed = false;
            self.sync_pixels();
            self.active = self.pending;
        }

        if self.wait_sync {
            self.wait_sync = false;
            let pixel_cycles_to_line_end = (HORIZONTAL_BLANK + DISPLAY_WIDTH as i32 - 1 - self.scan_x) as u32;
            let remaining_in_line = self.draw_pixel_line(pixel_cycles_to_line_end);
            debug_assert_eq!(remaining_in_line, 0);
            // Unlike the source (which zeroes the debt outright here), any
            // surplus beyond end-of-line is preserved rather than discarded.
            self.pixel_cycles = self.pixel_cycles.saturating_sub(pixel_cycles_to_line_end);
        }

        if self.reset_p0 {
            self.reset_p0 = false;
            self.position_x_p0 = self.get_player_position_x();
        }
        if self.reset_p1 {
            self.reset_p1 = false;
            self.position_x_p1 = self.get_player_position_x();
        }
    }

    pub fn sync_pixels(&mut self) {
        while self.pixel_cycles > 0 {
            self.pixel_cycles = self.draw_pixel_line(self.pixel_cycles);
        }
    }

    pub fn clear_display(&mut self) {
        for y in 0..DISPLAY_HEIGHT as usize {
            for x in 0..DISPLAY_WIDTH {
                self.display[y * DISPLAY_WIDTH + x] = if (x ^ y) & 1 != 0 {
                    Rgba::new(0, 0, 0, 255)
                } else {
                    Rgba::new(255, 255, 255, 255)
                };
            }
        }
    }

    /// Inner loop: consumes up to `pixel_cycles` of debt, drawing whatever
    /// visible pixels it reaches, and returns the undrawn remainder.
    fn draw_pixel_line(&mut self, mut pixel_cycles: u32) -> u32 {
        if pixel_cycles == 0 {
            return 0;
        }

        if self.vertical_sync {
            if self.scan_y != 0 || self.scan_x != -1 {
                self.clear_display();
            }
            self.scan_x = -1;
            self.scan_y = 0;
            self.pixel_count += pixel_cycles as u64;
            return 0;
        }

        if self.scan_x >= HORIZONTAL_BLANK + DISPLAY_WIDTH as i32 - 1 {
            self.scan_x = -1;
            self.scan_y += 1;
            if self.scan_y >= AUTO_VSYNC {
                log!(LogCategory::Tia, LogLevel::Warn, "forcing screen refresh (needed vertical sync)");
                self.scan_y = 0;
                self.clear_display();
            }
        }

        if self.scan_x < HORIZONTAL_BLANK - 1 {
            let pixels_to_line_start = (HORIZONTAL_BLANK - 1 - self.scan_x) as u32;
            if pixel_cycles <= pixels_to_line_start {
                self.scan_x += pixel_cycles as i32;
                self.pixel_count += pixel_cycles as u64;
                return 0;
            } else {
                pixel_cycles -= pixels_to_line_start;
                self.scan_x = HORIZONTAL_BLANK - 1;
            }
        }

        if self.scan_y >= DISPLAY_HEIGHT {
            return 0;
        }

        let pixels_to_line_end = (HORIZONTAL_BLANK + DISPLAY_WIDTH as i32 - 1 - self.scan_x) as u32;
        let display_cycles = pixel_cycles.min(pixels_to_line_end);
        let display_x_start = (self.scan_x + 1) - HORIZONTAL_BLANK;
        let display_x_stop = display_x_start + display_cycles as i32;
        self.scan_x += display_cycles as i32;
        pixel_cycles -= display_cycles;

        let mut pf: u64 = self.active.pf_mask as u64;
        if (self.active.ctrl_pf & 1) != 0 {
            pf |= (reverse_bits32(self.active.pf_mask << 12) as u64) << 20;
        } else {
            pf |= (pf & 0xFFFFF) << 20;
        }

        let p0_mask = if self.active.reflect_p0 { reverse_bits8(self.active.p0_mask) } else { self.active.p0_mask };
        let p1_mask = if self.active.reflect_p1 { reverse_bits8(self.active.p1_mask) } else { self.active.p1_mask };

        for display_x in display_x_start..display_x_stop {
            let pf_idx = (display_x >> 2) as u64;
            let use_pf = (pf >> pf_idx) & 1 != 0;
            let use_p0 = use_player(p0_mask, self.position_x_p0, display_x);
            let use_p1 = use_player(p1_mask, self.position_x_p1, display_x);
            let rgba = if use_p0 {
                self.active.rgba_p0
            } else if use_p1 {
                self.active.rgba_p1
            } else if use_pf {
                self.active.rgba_pf
            } else {
                self.active.rgba_bk
            };
            self.display[self.scan_y as usize * DISPLAY_WIDTH + display_x as usize] = rgba;
        }

        self.pixel_count += display_cycles as u64;
        pixel_cycles
    }
}

impl Default for Tia {
    fn default() -> Self {
        Self::new()
    }
}

/// Fast player-visibility test: true iff `x - pos` is in [0, 7] and that bit
/// of `mask` is set. A position of 0xFF disables the player (offset always
/// falls outside [0,7] since `display_x < 160`).
pub fn use_player(mask: u8, position_x: u8, display_x: i32) -> bool {
    let offset = display_x - position_x as i32;
    if (offset & !7) != 0 {
        false
    } else {
        (mask >> offset) & 1 != 0
    }
}

/// O(n) reference used to property-test `use_player`.
pub fn use_player_slow(mask: u8, position_x: u8, display_x: i32) -> bool {
    if position_x == 0xFF {
        return false;
    }
    let offset = display_x - position_x as i32;
    if !(0..8).contains(&offset) {
        return false;
    }
    (mask & (1 << offset)) != 0
}
