use std::collections::VecDeque;

use super::{
	Hardware,
	Organization,
};

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum PinEvent {
	Clock(bool),
	DataOut(bool),
	ChipSelect(bool),
	Sample(bool),
	Delay,
}

/// Records every pin operation a driver performs; the data-in line plays
/// back a scripted list of levels (exhausted or unscripted reads are low).
pub struct RecordingPort {
	events: Vec<PinEvent>,
	input: VecDeque<bool>,
}

impl RecordingPort {
	pub fn new() -> Self {
		RecordingPort {
			events: Vec::new(),
			input: VecDeque::new(),
		}
	}

	pub fn with_input<I: IntoIterator<Item = bool>>(input: I) -> Self {
		RecordingPort {
			events: Vec::new(),
			input: input.into_iter().collect(),
		}
	}

	pub fn events(&self) -> &[PinEvent] {
		&self.events
	}

	pub fn rising_edges(&self) -> usize {
		self.events.iter().filter(|e| **e == PinEvent::Clock(true)).count()
	}

	pub fn samples(&self) -> usize {
		self.events
			.iter()
			.filter(|e| match e {
				PinEvent::Sample(_) => true,
				_ => false,
			})
			.count()
	}

	pub fn rising_edges_before_first_sample(&self) -> Option<usize> {
		let mut edges = 0;
		for event in &self.events {
			match event {
				PinEvent::Clock(true) => edges += 1,
				PinEvent::Sample(_) => return Some(edges),
				_ => (),
			}
		}
		None
	}

	// replay: the data-out level at each rising clock edge while selected
	pub fn bits_clocked_out(&self) -> Vec<bool> {
		let mut bits = Vec::new();
		let mut selected = false;
		let mut data = false;
		for event in &self.events {
			match *event {
				PinEvent::ChipSelect(level) => selected = level,
				PinEvent::DataOut(level) => data = level,
				PinEvent::Clock(true) if selected => bits.push(data),
				_ => (),
			}
		}
		bits
	}

	// (clock, data out, chip select) after the last event
	pub fn final_levels(&self) -> (bool, bool, bool) {
		let mut levels = (false, false, false);
		for event in &self.events {
			match *event {
				PinEvent::Clock(level) => levels.0 = level,
				PinEvent::DataOut(level) => levels.1 = level,
				PinEvent::ChipSelect(level) => levels.2 = level,
				_ => (),
			}
		}
		levels
	}
}

impl Hardware for RecordingPort {
	fn set_clock(&mut self, level: bool) {
		self.events.push(PinEvent::Clock(level));
	}

	fn set_data_out(&mut self, level: bool) {
		self.events.push(PinEvent::DataOut(level));
	}

	fn set_chip_select(&mut self, level: bool) {
		self.events.push(PinEvent::ChipSelect(level));
	}

	fn read_data_in(&mut self) -> bool {
		let level = self.input.pop_front().unwrap_or(false);
		self.events.push(PinEvent::Sample(level));
		level
	}

	fn delay(&mut self) {
		self.events.push(PinEvent::Delay);
	}
}

enum State {
	// hunting for the start bit
	Idle,
	// collecting opcode, address and data bits
	Shift,
	// shifting out a read response
	Emit,
}

/// Behavioral model of the chip behind the `Hardware` pin interface.
///
/// Works like the real device: instruction bits are sampled on rising clock
/// edges while selected, leading zeros before the start bit are ignored, the
/// read response shifts on rising edges (dummy zero first), and write
/// instructions take effect when chip select drops. An instruction only
/// commits when it got exactly the right number of clock edges, which makes
/// off-by-one bugs in a driver visible.
pub struct SimulatedM93c46 {
	organization: Organization,
	pub memory: Vec<u16>,
	write_enabled: bool,
	selected: bool,
	clock: bool,
	data_in: bool,
	state: State,
	shift: u32,
	bits: u32,
	output: u32,
	output_bits: u32,
}

impl SimulatedM93c46 {
	pub fn new(organization: Organization) -> Self {
		let words = organization.address_limit() as usize;
		SimulatedM93c46 {
			organization,
			// fresh (erased) parts read all ones
			memory: vec![organization.word_mask(); words],
			write_enabled: false,
			selected: false,
			clock: false,
			data_in: false,
			state: State::Idle,
			shift: 0,
			bits: 0,
			output: 0,
			output_bits: 0,
		}
	}

	pub fn write_enabled(&self) -> bool {
		self.write_enabled
	}

	fn opcode(&self) -> u32 {
		(self.shift >> (self.bits - 3)) & 0b11
	}

	// total instruction length in bits, once enough bits arrived to tell
	fn instruction_length(&self) -> Option<u32> {
		if self.bits < 3 {
			return None;
		}
		let address_bits = self.organization.address_bits();
		let data_bits = self.organization.data_bits();
		match self.opcode() {
			0b00 => {
				if self.bits < 5 {
					return None;
				}
				let ext = (self.shift >> (self.bits - 5)) & 0b11;
				if ext == 0b01 {
					// write all carries a data word
					Some(3 + address_bits + data_bits)
				} else {
					Some(3 + address_bits)
				}
			}
			0b01 => Some(3 + address_bits + data_bits),
			_ => Some(3 + address_bits),
		}
	}

	fn rising_edge(&mut self) {
		match self.state {
			State::Idle => {
				if self.data_in {
					self.state = State::Shift;
					self.shift = 1;
					self.bits = 1;
				}
			}
			State::Shift => {
				self.shift = (self.shift << 1) | u32::from(self.data_in);
				self.bits += 1;
				if Some(self.bits) == self.instruction_length() && self.opcode() == 0b10 {
					let address_mask = (1 << self.organization.address_bits()) - 1;
					let address = (self.shift & address_mask) as usize;
					self.output = u32::from(self.memory[address]);
					// dummy zero ahead of the data word
					self.output_bits = self.organization.data_bits() + 1;
					self.state = State::Emit;
				}
			}
			State::Emit => {
				if self.output_bits > 0 {
					self.output_bits -= 1;
				}
			}
		}
	}

	// apply a completed instruction; called when chip select drops
	fn commit(&mut self) {
		if let State::Shift = self.state {
			if Some(self.bits) == self.instruction_length() {
				let address_bits = self.organization.address_bits();
				let data_bits = self.organization.data_bits();
				let address_mask = (1u32 << address_bits) - 1;
				let word_mask = u32::from(self.organization.word_mask());
				let erased = self.organization.word_mask();
				match self.opcode() {
					0b00 => {
						let ext = (self.shift >> (self.bits - 5)) & 0b11;
						match ext {
							0b00 => self.write_enabled = false,
							0b01 => {
								if self.write_enabled {
									let word = (self.shift & word_mask) as u16;
									for slot in &mut self.memory {
										*slot = word;
									}
								}
							}
							0b10 => {
								if self.write_enabled {
									for slot in &mut self.memory {
										*slot = erased;
									}
								}
							}
							_ => self.write_enabled = true,
						}
					}
					0b01 => {
						if self.write_enabled {
							let address = ((self.shift >> data_bits) & address_mask) as usize;
							self.memory[address] = (self.shift & word_mask) as u16;
						}
					}
					0b11 => {
						if self.write_enabled {
							let address = (self.shift & address_mask) as usize;
							self.memory[address] = erased;
						}
					}
					_ => (),
				}
			}
		}
		self.state = State::Idle;
		self.shift = 0;
		self.bits = 0;
		self.output_bits = 0;
	}
}

impl Hardware for SimulatedM93c46 {
	fn set_clock(&mut self, level: bool) {
		if level && !self.clock && self.selected {
			self.rising_edge();
		}
		self.clock = level;
	}

	fn set_data_out(&mut self, level: bool) {
		self.data_in = level;
	}

	fn set_chip_select(&mut self, level: bool) {
		if self.selected && !level {
			self.commit();
		}
		if !self.selected && level {
			self.state = State::Idle;
			self.shift = 0;
			self.bits = 0;
			self.output_bits = 0;
		}
		self.selected = level;
	}

	fn read_data_in(&mut self) -> bool {
		match self.state {
			State::Emit if self.output_bits > 0 => {
				0 != (self.output >> (self.output_bits - 1)) & 1
			}
			_ => false,
		}
	}

	fn delay(&mut self) {
	}
}

mod test {
	use super::*;

	fn clock_frame(chip: &mut SimulatedM93c46, frame: u32, bits: u32) {
		for bit in (0..bits).rev() {
			chip.set_clock(false);
			chip.set_data_out(0 != frame & (1 << bit));
			chip.set_clock(true);
		}
		chip.set_clock(false);
		chip.set_data_out(false);
	}

	#[test]
	fn raw_write_and_read_back() {
		let mut chip = SimulatedM93c46::new(Organization::Sixteen);
		assert_eq!(chip.memory[3], 0xffff);

		chip.set_chip_select(true);
		clock_frame(&mut chip, 0b1_00_11_0000, 9); // EWEN
		chip.set_chip_select(false);
		assert!(chip.write_enabled());

		chip.set_chip_select(true);
		clock_frame(&mut chip, 0, 2); // idle zeros before the start bit
		clock_frame(&mut chip, (0b101 << 22) | (3 << 16) | 0x1234, 25);
		chip.set_chip_select(false);
		assert_eq!(chip.memory[3], 0x1234);

		// READ emits a dummy zero, then the word starting at the highest bit
		chip.set_chip_select(true);
		clock_frame(&mut chip, (0b110 << 6) | 3, 9);
		assert_eq!(chip.read_data_in(), false);
		let mut word = 0u16;
		for _ in 0..16 {
			chip.set_clock(false);
			chip.set_clock(true);
			word = (word << 1) | u16::from(chip.read_data_in());
		}
		chip.set_chip_select(false);
		assert_eq!(word, 0x1234);
	}

	#[test]
	fn overlong_instruction_is_ignored() {
		let mut chip = SimulatedM93c46::new(Organization::Sixteen);
		chip.set_chip_select(true);
		clock_frame(&mut chip, 0b1_00_11_0000, 9);
		chip.set_chip_select(false);

		chip.set_chip_select(true);
		// a WRITE with one clock cycle too many must not commit
		clock_frame(&mut chip, ((0b101 << 22) | (3 << 16) | 0x1234) << 1, 26);
		chip.set_chip_select(false);
		assert_eq!(chip.memory[3], 0xffff);
	}
}
