use std::ops::{
	Deref,
	DerefMut,
};

use crate::AResult;

use super::{
	Command,
	EepromError,
	Hardware,
	LowLevel,
	Organization,
};

/// Progress observer for bus activity, e.g. an activity LED.
///
/// All methods default to doing nothing.
pub trait Indicator {
	/// chip select is about to rise
	fn command_start(&mut self) {
	}

	/// chip select dropped again
	fn command_end(&mut self) {
	}

	/// a read-back matched the word written before
	fn read_match(&mut self) {
	}

	/// a read-back differed from the word written before
	fn read_mismatch(&mut self) {
	}
}

impl Indicator for () {
}

impl<I: Indicator> Indicator for Option<I> {
	fn command_start(&mut self) {
		if let Some(indicator) = self {
			indicator.command_start();
		}
	}

	fn command_end(&mut self) {
		if let Some(indicator) = self {
			indicator.command_end();
		}
	}

	fn read_match(&mut self) {
		if let Some(indicator) = self {
			indicator.read_match();
		}
	}

	fn read_mismatch(&mut self) {
		if let Some(indicator) = self {
			indicator.read_mismatch();
		}
	}
}

/// Driver for one chip on one set of pins.
///
/// The organization must match the level on the chip's ORG pin, otherwise
/// addresses and word sizes won't line up with what the device expects.
pub struct Eeprom<H: Hardware, I: Indicator = ()> {
	hardware: H,
	organization: Organization,
	indicator: I,
}

impl<H: Hardware> Eeprom<H, ()> {
	pub fn new(hardware: H, organization: Organization) -> Self {
		Eeprom::with_indicator(hardware, organization, ())
	}
}

impl<H: Hardware, I: Indicator> Eeprom<H, I> {
	pub fn with_indicator(hardware: H, organization: Organization, indicator: I) -> Self {
		Eeprom {
			hardware,
			organization,
			indicator,
		}
	}

	pub fn organization(&self) -> Organization {
		self.organization
	}

	fn run(&mut self, command: Command) {
		self.indicator.command_start();
		self.hardware.execute(command);
		self.indicator.command_end();
	}

	pub fn read(&mut self, address: u8) -> AResult<u16> {
		let command = Command::read(self.organization, address)?;
		self.indicator.command_start();
		let word = self.hardware.execute_read(command, self.organization);
		self.indicator.command_end();
		debug!("read 0x{:02x}: 0x{:04x}", address, word);
		Ok(word)
	}

	/// Needs a preceding write enable to have any effect.
	pub fn write(&mut self, address: u8, word: u16) -> AResult<()> {
		let command = Command::write(self.organization, address, word)?;
		debug!("write 0x{:02x}: 0x{:04x}", address, word);
		self.run(command);
		Ok(())
	}

	/// Set all bits at `address` to "1". Needs a preceding write enable.
	pub fn erase(&mut self, address: u8) -> AResult<()> {
		let command = Command::erase(self.organization, address)?;
		debug!("erase 0x{:02x}", address);
		self.run(command);
		Ok(())
	}

	/// Write one word into every address. Needs a preceding write enable.
	pub fn write_all(&mut self, word: u16) -> AResult<()> {
		let command = Command::write_all(self.organization, word)?;
		debug!("write all: 0x{:04x}", word);
		self.run(command);
		Ok(())
	}

	/// Set the whole array to "1". Needs a preceding write enable.
	pub fn erase_all(&mut self) {
		debug!("erase all");
		self.run(Command::erase_all(self.organization));
	}

	pub fn write_enable(&mut self) {
		debug!("write enable");
		self.run(Command::write_enable(self.organization));
	}

	pub fn write_disable(&mut self) {
		debug!("write disable");
		self.run(Command::write_disable(self.organization));
	}

	/// Write a word and read it back; a difference is reported as an error.
	///
	/// The device self-times its programming cycle; a read-back only returns
	/// the new word once that cycle completed, so this doubles as the wait
	/// for completion.
	pub fn write_verified(&mut self, address: u8, word: u16) -> AResult<()> {
		self.write(address, word)?;
		let found = self.read(address)?;
		if found == word {
			self.indicator.read_match();
			Ok(())
		} else {
			self.indicator.read_mismatch();
			Err(EepromError::Miscompare {
				address,
				expected: word,
				found,
			}.into())
		}
	}

	pub fn start_programming(&mut self) -> ProgrammingEnabled<H, I> {
		self.write_enable();
		ProgrammingEnabled(self)
	}
}

/// Keeps the chip write-enabled; write protection is restored on drop.
pub struct ProgrammingEnabled<'a, H: Hardware, I: Indicator>(&'a mut Eeprom<H, I>);

impl<'a, H: Hardware, I: Indicator> Drop for ProgrammingEnabled<'a, H, I> {
	fn drop(&mut self) {
		self.0.write_disable();
	}
}

impl<'a, H: Hardware, I: Indicator> Deref for ProgrammingEnabled<'a, H, I> {
	type Target = Eeprom<H, I>;

	fn deref(&self) -> &Self::Target {
		self.0
	}
}

impl<'a, H: Hardware, I: Indicator> DerefMut for ProgrammingEnabled<'a, H, I> {
	fn deref_mut(&mut self) -> &mut Self::Target {
		self.0
	}
}
