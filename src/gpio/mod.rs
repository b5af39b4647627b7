/// GPIO backends for the four Microwire bus lines.
///
/// `Sysfs` uses the portable /sys/class/gpio interface and works on any
/// Linux with a GPIO controller; `GpioMem` pokes the BCM283x register block
/// through /dev/gpiomem (Raspberry Pi) and toggles pins much faster.

mod gpiomem;
mod led;
mod sysfs;

use std::str::FromStr;

use crate::AResult;
use crate::serial::Hardware;

pub use self::gpiomem::GpioMemPort;
pub use self::led::Led;
pub use self::sysfs::SysfsPort;

/// Which GPIO lines carry the bus signals, as BCM pin numbers.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct Pinout {
	pub clock: u32,
	pub chip_select: u32,
	pub data_out: u32,
	pub data_in: u32,
}

impl Pinout {
	fn check(&self) -> AResult<()> {
		let pins = [self.clock, self.chip_select, self.data_out, self.data_in];
		for i in 0..pins.len() {
			for j in i + 1..pins.len() {
				ensure!(pins[i] != pins[j], "GPIO {} used for more than one signal", pins[i]);
			}
		}
		Ok(())
	}
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Backend {
	Sysfs,
	GpioMem,
}

impl FromStr for Backend {
	type Err = failure::Error;

	fn from_str(s: &str) -> AResult<Self> {
		match s {
			"sysfs" => Ok(Backend::Sysfs),
			"gpiomem" => Ok(Backend::GpioMem),
			_ => bail!("unknown GPIO backend {:?} (expected \"sysfs\" or \"gpiomem\")", s),
		}
	}
}

pub enum Port {
	Sysfs(SysfsPort),
	GpioMem(GpioMemPort),
}

pub fn open(backend: Backend, pinout: Pinout) -> AResult<Port> {
	pinout.check()?;
	match backend {
		Backend::Sysfs => Ok(Port::Sysfs(sysfs::open(pinout)?)),
		Backend::GpioMem => Ok(Port::GpioMem(gpiomem::open(pinout)?)),
	}
}

impl Hardware for Port {
	fn set_clock(&mut self, level: bool) {
		match self {
			Port::Sysfs(port) => port.set_clock(level),
			Port::GpioMem(port) => port.set_clock(level),
		}
	}

	fn set_data_out(&mut self, level: bool) {
		match self {
			Port::Sysfs(port) => port.set_data_out(level),
			Port::GpioMem(port) => port.set_data_out(level),
		}
	}

	fn set_chip_select(&mut self, level: bool) {
		match self {
			Port::Sysfs(port) => port.set_chip_select(level),
			Port::GpioMem(port) => port.set_chip_select(level),
		}
	}

	fn read_data_in(&mut self) -> bool {
		match self {
			Port::Sysfs(port) => port.read_data_in(),
			Port::GpioMem(port) => port.read_data_in(),
		}
	}
}
