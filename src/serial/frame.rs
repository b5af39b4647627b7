use std::fmt;
use std::str::FromStr;

use crate::AResult;

use super::EepromError;

// start bit plus 2-bit opcode
const OP_EXTENDED: u32 = 0b1_00;
const OP_WRITE: u32 = 0b1_01;
const OP_READ: u32 = 0b1_10;
const OP_ERASE: u32 = 0b1_11;

// sub-opcodes of the extended group, carried in the top two address bits
const EXT_WRITE_DISABLE: u32 = 0b00;
const EXT_WRITE_ALL: u32 = 0b01;
const EXT_ERASE_ALL: u32 = 0b10;
const EXT_WRITE_ENABLE: u32 = 0b11;

/// Memory organization selected by the ORG pin.
///
/// The device always holds 1024 bits; the organization only changes how they
/// are addressed.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum Organization {
	/// 128 x 8 bits (ORG tied low)
	Eight,
	/// 64 x 16 bits (ORG tied high)
	Sixteen,
}

impl Organization {
	pub fn address_bits(self) -> u32 {
		match self {
			Organization::Eight => 7,
			Organization::Sixteen => 6,
		}
	}

	pub fn data_bits(self) -> u32 {
		match self {
			Organization::Eight => 8,
			Organization::Sixteen => 16,
		}
	}

	/// Number of addressable words; valid addresses are `0..address_limit()`.
	pub fn address_limit(self) -> u8 {
		1 << self.address_bits()
	}

	pub fn word_mask(self) -> u16 {
		((1u32 << self.data_bits()) - 1) as u16
	}
}

impl fmt::Display for Organization {
	fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
		match self {
			Organization::Eight => f.write_str("x8"),
			Organization::Sixteen => f.write_str("x16"),
		}
	}
}

impl FromStr for Organization {
	type Err = failure::Error;

	fn from_str(s: &str) -> AResult<Self> {
		match s {
			"8" | "x8" => Ok(Organization::Eight),
			"16" | "x16" => Ok(Organization::Sixteen),
			_ => bail!("unknown organization {:?} (expected \"8\" or \"16\")", s),
		}
	}
}

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum Opcode {
	WriteDisable,
	WriteAll,
	EraseAll,
	WriteEnable,
	Write,
	Read,
	Erase,
}

/// Field placement of an instruction frame within a `u32`.
///
/// `base` carries the start bit, the opcode and any fixed sub-opcode bits,
/// already shifted into place; address and data are or-ed in at their
/// offsets. A READ response is clocked in after the frame and is not part of
/// it, so the `Read` layout has `data_bits == 0`.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct FrameLayout {
	pub base: u32,
	pub address_offset: u32,
	pub address_bits: u32,
	pub data_offset: u32,
	pub data_bits: u32,
	pub total_bits: u32,
}

pub fn layout(organization: Organization, opcode: Opcode) -> FrameLayout {
	let address_bits = organization.address_bits();
	let addressed = |op: u32, data_bits: u32| FrameLayout {
		base: op << (address_bits + data_bits),
		address_offset: data_bits,
		address_bits,
		data_offset: 0,
		data_bits,
		total_bits: 3 + address_bits + data_bits,
	};
	// extended instructions keep the address field (the device still clocks
	// those bits in), but only its top two bits carry information
	let extended = |ext: u32, data_bits: u32| FrameLayout {
		base: (OP_EXTENDED << (address_bits + data_bits))
			| (ext << (address_bits - 2 + data_bits)),
		address_offset: 0,
		address_bits: 0,
		data_offset: 0,
		data_bits,
		total_bits: 3 + address_bits + data_bits,
	};
	let data_bits = organization.data_bits();
	match opcode {
		Opcode::WriteDisable => extended(EXT_WRITE_DISABLE, 0),
		Opcode::WriteAll => extended(EXT_WRITE_ALL, data_bits),
		Opcode::EraseAll => extended(EXT_ERASE_ALL, 0),
		Opcode::WriteEnable => extended(EXT_WRITE_ENABLE, 0),
		Opcode::Write => addressed(OP_WRITE, data_bits),
		Opcode::Read => addressed(OP_READ, 0),
		Opcode::Erase => addressed(OP_ERASE, 0),
	}
}

/// A fully encoded instruction: frame bits (right-aligned) and how many of
/// them to clock out, MSB first.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct Command {
	frame: u32,
	bits: u32,
}

impl Command {
	fn assemble(layout: FrameLayout, address: u8, word: u16) -> Command {
		let frame = layout.base
			| (u32::from(address) << layout.address_offset)
			| (u32::from(word) << layout.data_offset);
		debug_assert_eq!(frame >> layout.total_bits, 0);
		Command {
			frame,
			bits: layout.total_bits,
		}
	}

	fn checked_address(organization: Organization, address: u8) -> Result<u8, EepromError> {
		if address >= organization.address_limit() {
			Err(EepromError::AddressOutOfRange {
				organization,
				address,
			})
		} else {
			Ok(address)
		}
	}

	fn checked_word(organization: Organization, word: u16) -> Result<u16, EepromError> {
		if word & !organization.word_mask() != 0 {
			Err(EepromError::WordOutOfRange {
				organization,
				word,
			})
		} else {
			Ok(word)
		}
	}

	pub fn read(organization: Organization, address: u8) -> Result<Command, EepromError> {
		let address = Self::checked_address(organization, address)?;
		Ok(Self::assemble(layout(organization, Opcode::Read), address, 0))
	}

	pub fn write(organization: Organization, address: u8, word: u16) -> Result<Command, EepromError> {
		let address = Self::checked_address(organization, address)?;
		let word = Self::checked_word(organization, word)?;
		Ok(Self::assemble(layout(organization, Opcode::Write), address, word))
	}

	pub fn erase(organization: Organization, address: u8) -> Result<Command, EepromError> {
		let address = Self::checked_address(organization, address)?;
		Ok(Self::assemble(layout(organization, Opcode::Erase), address, 0))
	}

	pub fn write_all(organization: Organization, word: u16) -> Result<Command, EepromError> {
		let word = Self::checked_word(organization, word)?;
		Ok(Self::assemble(layout(organization, Opcode::WriteAll), 0, word))
	}

	pub fn erase_all(organization: Organization) -> Command {
		Self::assemble(layout(organization, Opcode::EraseAll), 0, 0)
	}

	pub fn write_enable(organization: Organization) -> Command {
		Self::assemble(layout(organization, Opcode::WriteEnable), 0, 0)
	}

	pub fn write_disable(organization: Organization) -> Command {
		Self::assemble(layout(organization, Opcode::WriteDisable), 0, 0)
	}

	pub fn frame(self) -> u32 {
		self.frame
	}

	pub fn bits(self) -> u32 {
		self.bits
	}
}

impl fmt::Debug for Command {
	fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
		write!(f, "Command({:0width$b})", self.frame, width = self.bits as usize)
	}
}
