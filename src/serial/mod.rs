/// Protocol for the ST M93C46 family, a 1-kbit Microwire EEPROM
///
/// The same die is offered in two organizations, selected by the ORG pin:
/// 64 x 16 bits (ORG high) or 128 x 8 bits (ORG low). Addresses are 6 bits
/// wide in the x16 organization and 7 bits wide in the x8 organization.
///
/// Instructions:
/// - Startbit: "1"
/// - 2-bit Opcode
/// - Address (6 or 7 bits depending on organization)
///
/// Some instructions have a DATA phase following (either send or recv) for a
/// full word (16 or 8 bits), so a request takes between 9 and 25 CLK cycles.
///
/// Opcodes: (@ address)
/// - 0b11: ERASE at address (set all bits to "1")
/// - 0b00 @ 0b00?...?: EWDS (erase/write disable), no DATA
/// - 0b00 @ 0b01?...?: WRAL (write all), send DATA
/// - 0b00 @ 0b10?...?: ERAL (erase all), no DATA
/// - 0b00 @ 0b11?...?: EWEN (erase/write enable), no DATA
/// - 0b10: READ word from address, recv DATA
/// - 0b01: WRITE word to address, send DATA

mod frame;
mod hardware;
mod low_level;
mod operations;
#[cfg(test)]
mod sim;

pub use self::frame::{
	Command,
	FrameLayout,
	Opcode,
	Organization,
	layout,
};

pub use self::hardware::{
	Hardware,
};

use self::low_level::LowLevel;

pub use self::operations::{
	Eeprom,
	Indicator,
	ProgrammingEnabled,
};

/// Errors raised before or after touching the bus.
///
/// Out-of-range errors are detected while encoding a command, i.e. before any
/// pin is driven; `Miscompare` is a post-write verification failure.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Fail)]
pub enum EepromError {
	#[fail(display = "address 0x{:02x} out of range for {} organization", address, organization)]
	AddressOutOfRange {
		organization: Organization,
		address: u8,
	},
	#[fail(display = "word 0x{:04x} too wide for {} organization", word, organization)]
	WordOutOfRange {
		organization: Organization,
		word: u16,
	},
	#[fail(display = "verify failed at 0x{:02x}: expected 0x{:04x}, device has 0x{:04x}", address, expected, found)]
	Miscompare {
		address: u8,
		expected: u16,
		found: u16,
	},
}
