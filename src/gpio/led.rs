use crate::AResult;
use crate::serial::Indicator;

use super::sysfs::SysfsPin;

/// Activity LED on a sysfs GPIO: lit while a command is on the bus, and
/// latched on once a verification failed so the fault stays visible.
pub struct Led {
	pin: SysfsPin,
	fault: bool,
}

impl Led {
	pub fn open(number: u32) -> AResult<Led> {
		Ok(Led {
			pin: SysfsPin::output(number)?,
			fault: false,
		})
	}
}

impl Indicator for Led {
	fn command_start(&mut self) {
		self.pin.set(true);
	}

	fn command_end(&mut self) {
		if !self.fault {
			self.pin.set(false);
		}
	}

	fn read_mismatch(&mut self) {
		self.fault = true;
		self.pin.set(true);
	}
}
