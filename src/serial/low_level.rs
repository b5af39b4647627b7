use super::{
	Command,
	Hardware,
	Organization,
};

// quiet delay units between a chip-select change and the nearest clock edge
const SELECT_MARGIN_UNITS: u32 = 3;

pub trait LowLevel: Hardware {
	// clock out the `bits` lowest bits of `frame`, starting with the highest
	//
	// data is presented while CLK is low; the chip samples it on the rising
	// edge. leaves CLK and DATA low afterwards.
	fn transmit_bits(&mut self, frame: u32, bits: u32) {
		assert!(bits <= 32);
		for bit in (0..bits).rev() {
			self.set_clock(false);
			self.set_data_out(0 != frame & (1 << bit));
			self.delay();
			self.set_clock(true);
			self.delay();
		}
		self.set_clock(false);
		self.set_data_out(false);
	}

	// raise CS, then give the chip some quiet units before the first edge
	fn select(&mut self) {
		self.set_chip_select(true);
		for _ in 0..SELECT_MARGIN_UNITS {
			self.delay();
		}
	}

	// quiet units with CLK and DATA low, then drop CS and keep it low for one
	// more unit so back-to-back instructions stay separated
	fn deselect(&mut self) {
		self.set_clock(false);
		self.set_data_out(false);
		for _ in 0..SELECT_MARGIN_UNITS {
			self.delay();
		}
		self.set_chip_select(false);
		self.delay();
	}

	// run a complete instruction without a response phase
	fn execute(&mut self, command: Command) {
		trace!("sending {:?}", command);
		self.select();
		self.transmit_bits(command.frame(), command.bits());
		self.deselect();
	}

	// run a READ: clock out the frame, spend one full cycle on the dummy zero
	// the chip emits after the last address bit, then sample one word during
	// the clock-low phases
	fn execute_read(&mut self, command: Command, organization: Organization) -> u16 {
		trace!("sending {:?}, expecting {} data bits", command, organization.data_bits());
		self.select();
		self.transmit_bits(command.frame(), command.bits());

		// dummy bit cycle; its rising edge moves the chip to the first data bit
		self.delay();
		self.set_clock(true);
		self.delay();

		let mut word = 0u16;
		for _ in 0..organization.data_bits() {
			self.set_clock(false);
			// the chip shifted this bit out on the previous rising edge
			let bit = self.read_data_in();
			word = (word << 1) | u16::from(bit);
			self.delay();
			self.set_clock(true);
			self.delay();
		}
		self.deselect();
		word
	}
}

impl<H: Hardware + ?Sized> LowLevel for H {
}
