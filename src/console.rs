//! Baseline console and screen collaborators: the stdio handlers a loader
//! installs before driving the CPU, and the palette mapping a display
//! collaborator would use to turn screen RAM into pixels. Actually opening a
//! window is out of this crate's scope — only the byte-to-RGB mapping is.

use crate::bus::SharedBus;
use crate::constants::memory_range;
use std::io::{self, Read, Write};

/// Installs the two memory-mapped I/O handlers every baseline program
/// expects: a write to `$D020` prints one character to stdout, and a read
/// from `$D010` blocks for a single byte of stdin.
pub fn install_stdio_handlers(bus: &SharedBus) {
    bus.borrow_mut().register_write_handler(
        memory_range::CONSOLE_OUT,
        Box::new(|_addr, value| {
            print!("{}", value as char);
            let _ = io::stdout().flush();
        }),
    );
    bus.borrow_mut().register_read_handler(
        memory_range::CONSOLE_IN,
        Box::new(|_addr| {
            let mut byte = [0u8; 1];
            match io::stdin().read_exact(&mut byte) {
                Ok(()) => byte[0],
                Err(_) => 0,
            }
        }),
    );
    log::debug!(
        "installed console handlers at ${:04X} (out) and ${:04X} (in)",
        memory_range::CONSOLE_OUT,
        memory_range::CONSOLE_IN
    );
}

/// One RGB triple, 0-255 per channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

/// Builds the 256-entry 3:3:2 palette once: bits 7-5 are red (0-7), bits 4-2
/// are green (0-7), bits 1-0 are blue (0-3), each channel scaled up to the
/// full 0-255 range.
fn palette() -> [Rgb; 256] {
    let mut table = [Rgb { r: 0, g: 0, b: 0 }; 256];
    for (i, entry) in table.iter_mut().enumerate() {
        let r = (i >> 5) & 0x07;
        let g = (i >> 2) & 0x07;
        let b = i & 0x03;
        *entry = Rgb {
            r: (r * 255 / 7) as u8,
            g: (g * 255 / 7) as u8,
            b: (b * 255 / 3) as u8,
        };
    }
    table
}

/// Reads the screen RAM window and maps it through the 3:3:2 palette into an
/// RGB buffer, row-major, `SCREEN_WIDTH * SCREEN_HEIGHT` pixels. Callers that
/// want to actually display the result own the window and the event loop;
/// this only does the byte-to-color mapping.
pub fn render_rgb(bus: &SharedBus) -> Vec<Rgb> {
    let table = palette();
    let bus = bus.borrow();
    let data = bus.data_slice(memory_range::SCREEN_RAM_START, memory_range::SCREEN_RAM_SIZE);
    data.iter().map(|&byte| table[byte as usize]).collect()
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::bus::Bus;

    #[test]
    fn palette_extremes_map_to_expected_corners() {
        let table = palette();
        assert_eq!(table[0x00], Rgb { r: 0, g: 0, b: 0 });
        // 0xFF = r=7,g=7,b=3 -> full scale on every channel.
        assert_eq!(table[0xFF], Rgb { r: 255, g: 255, b: 255 });
    }

    #[test]
    fn render_rgb_reads_screen_ram_window() {
        let bus = Bus::new_shared();
        bus.borrow_mut().load_rom(&[0xFF], memory_range::SCREEN_RAM_START);
        let pixels = render_rgb(&bus);
        assert_eq!(pixels.len(), memory_range::SCREEN_RAM_SIZE);
        assert_eq!(pixels[0], Rgb { r: 255, g: 255, b: 255 });
        assert_eq!(pixels[1], Rgb { r: 0, g: 0, b: 0 });
    }

    #[test]
    fn console_out_handler_does_not_touch_backing_byte() {
        let bus = Bus::new_shared();
        install_stdio_handlers(&bus);
        bus.borrow_mut().set_u8(memory_range::CONSOLE_OUT, b'!');
        assert_eq!(bus.borrow().read_u8(memory_range::CONSOLE_OUT), 0);
    }
}
