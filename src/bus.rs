use crate::constants::memory_range;
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

/// A read trap handler: given the address being read, returns the byte the
/// CPU should see instead of the backing array.
pub type ReadHandler = Box<dyn FnMut(u16) -> u8>;
/// A write trap handler: given the address and the (already 8-bit-masked)
/// value being written.
pub type WriteHandler = Box<dyn FnMut(u16, u8)>;

/// `Bus` is shared between the CPU and any other collaborator (the screen
/// reader, I/O handlers) that needs to see the same memory. It is wrapped in
/// `Rc<RefCell<_>>` rather than a mutex: everything that mutates the bus runs
/// on the single CPU-driving thread, and the one cross-thread reader (the
/// display) only reads the backing byte array directly, never through this
/// handle, so it never needs to block on the CPU.
pub type SharedBus = Rc<RefCell<Bus>>;

/// The 64 KiB flat memory fabric. Every address is either backed by a plain
/// byte in `data`, or has a read and/or write handler installed that
/// intercepts the operation.
pub struct Bus {
    data: [u8; 0x10000],
    read_handlers: HashMap<u16, ReadHandler>,
    write_handlers: HashMap<u16, WriteHandler>,
}

impl Bus {
    pub fn new() -> Bus {
        Bus {
            data: [0; 0x10000],
            read_handlers: HashMap::new(),
            write_handlers: HashMap::new(),
        }
    }

    pub fn new_shared() -> SharedBus {
        Rc::new(RefCell::new(Bus::new()))
    }

    /// Read a byte, consulting the read-handler map first.
    pub fn read_u8(&self, address: u16) -> u8 {
        self.data[address as usize]
    }

    /// Reads are `&self` for the backing array so the display collaborator
    /// can observe screen RAM without contending with the CPU, but installed
    /// read handlers need `&mut self` since they're arbitrary `FnMut`
    /// closures (e.g. the blocking stdin handler). `read_u8_trapped` is the
    /// full-contract read used by the CPU; `read_u8` above is the raw,
    /// handler-free read used by collaborators like the screen buffer.
    pub fn read_u8_trapped(&mut self, address: u16) -> u8 {
        if let Some(handler) = self.read_handlers.get_mut(&address) {
            return handler(address);
        }
        self.data[address as usize]
    }

    pub fn read_u16(&self, address: u16) -> u16 {
        let lo = self.read_u8(address);
        let hi = self.read_u8(address.wrapping_add(1));
        u16::from_le_bytes([lo, hi])
    }

    /// Write a byte, consulting the write-handler map, then honoring the
    /// ROM write-protect windows, then falling through to the backing byte.
    pub fn set_u8(&mut self, address: u16, value: u8) {
        let value = value & 0xFF;
        if let Some(handler) = self.write_handlers.get_mut(&address) {
            handler(address, value);
            return;
        }
        if memory_range::ROM_LOW.contains(address) || memory_range::ROM_HIGH.contains(address) {
            return;
        }
        self.data[address as usize] = value;
    }

    pub fn set_u16(&mut self, address: u16, value: u16) {
        let [lo, hi] = value.to_le_bytes();
        self.set_u8(address, lo);
        self.set_u8(address.wrapping_add(1), hi);
    }

    /// Load raw bytes starting at `base`, bypassing the ROM write guard and
    /// any installed handlers. Used to install a ROM image or an assembled
    /// byte image before the CPU starts running.
    pub fn load_rom(&mut self, bytes: &[u8], base: u16) {
        for (i, byte) in bytes.iter().enumerate() {
            let address = base.wrapping_add(i as u16);
            self.data[address as usize] = *byte;
        }
    }

    pub fn register_read_handler(&mut self, address: u16, handler: ReadHandler) {
        self.read_handlers.insert(address, handler);
    }

    pub fn register_write_handler(&mut self, address: u16, handler: WriteHandler) {
        self.write_handlers.insert(address, handler);
    }

    /// A read-only view of the backing array, for collaborators (the screen
    /// buffer) that need a contiguous byte range and must not trigger
    /// handlers or require mutable access.
    pub fn data_slice(&self, start: u16, len: usize) -> &[u8] {
        let start = start as usize;
        &self.data[start..start + len]
    }
}

impl Default for Bus {
    fn default() -> Bus {
        Bus::new()
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::constants::memory_range;

    #[test]
    fn write_then_read_round_trips() {
        let mut bus = Bus::new();
        bus.set_u8(0x0200, 0x42);
        assert_eq!(bus.read_u8(0x0200), 0x42);
    }

    #[test]
    fn rom_window_write_is_dropped() {
        let mut bus = Bus::new();
        bus.load_rom(&[0xAA], memory_range::ROM_LOW.min);
        bus.set_u8(memory_range::ROM_LOW.min, 0xFF);
        assert_eq!(bus.read_u8(memory_range::ROM_LOW.min), 0xAA);

        bus.load_rom(&[0xBB], memory_range::ROM_HIGH.min);
        bus.set_u8(memory_range::ROM_HIGH.min, 0xFF);
        assert_eq!(bus.read_u8(memory_range::ROM_HIGH.min), 0xBB);
    }

    #[test]
    fn load_rom_bypasses_write_protection() {
        let mut bus = Bus::new();
        bus.load_rom(&[1, 2, 3], memory_range::ROM_LOW.min);
        assert_eq!(bus.read_u8(memory_range::ROM_LOW.min), 1);
        assert_eq!(bus.read_u8(memory_range::ROM_LOW.min + 1), 2);
        assert_eq!(bus.read_u8(memory_range::ROM_LOW.min + 2), 3);
    }

    #[test]
    fn write_handler_intercepts_and_replaces_backing_byte() {
        let mut bus = Bus::new();
        let seen = Rc::new(RefCell::new(Vec::new()));
        let seen_clone = seen.clone();
        bus.register_write_handler(
            0xD020,
            Box::new(move |_addr, value| seen_clone.borrow_mut().push(value)),
        );
        bus.set_u8(0xD020, b'!');
        assert_eq!(*seen.borrow(), vec![b'!']);
        // The backing byte was not touched, since the handler intercepted it.
        assert_eq!(bus.read_u8(0xD020), 0);
    }

    #[test]
    fn read_handler_intercepts_trapped_read() {
        let mut bus = Bus::new();
        bus.register_read_handler(0xD010, Box::new(|_addr| 0x7A));
        assert_eq!(bus.read_u8_trapped(0xD010), 0x7A);
    }

    #[test]
    fn address_arithmetic_wraps_modulo_65536() {
        let mut bus = Bus::new();
        bus.set_u8(0xFFFF, 0x11);
        // read_u16 at 0xFFFF should wrap the high byte read to address 0.
        bus.set_u8(0x0000, 0x22);
        assert_eq!(bus.read_u16(0xFFFF), u16::from_le_bytes([0x11, 0x22]));
    }
}
