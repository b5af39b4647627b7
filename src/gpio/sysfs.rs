use std::fs;
use std::io::{
	self,
	Write,
};
use std::os::unix::fs::FileExt;

use crate::AResult;
use crate::serial::Hardware;

use super::Pinout;

const GPIO_ROOT: &str = "/sys/class/gpio";

// export a pin; Ok(false) if it was exported already
fn export(number: u32) -> AResult<bool> {
	let result = fs::OpenOptions::new()
		.write(true)
		.open(format!("{}/export", GPIO_ROOT))
		.and_then(|mut f| f.write_all(number.to_string().as_bytes()));
	match result {
		Ok(()) => Ok(true),
		Err(ref e) if e.raw_os_error() == Some(libc::EBUSY) => Ok(false),
		Err(e) => Err(e.into()),
	}
}

fn unexport(number: u32) -> io::Result<()> {
	fs::OpenOptions::new()
		.write(true)
		.open(format!("{}/unexport", GPIO_ROOT))?
		.write_all(number.to_string().as_bytes())
}

/// One exported GPIO line; unexported again on drop.
pub struct SysfsPin {
	number: u32,
	value: fs::File,
}

impl SysfsPin {
	// direction "low" configures an output already driven low, "in" an input
	fn open(number: u32, direction: &str) -> AResult<SysfsPin> {
		with_context!(("GPIO {}: export and configure", number), {
			if !export(number)? {
				debug!("GPIO {}: was exported already", number);
			}
			fs::OpenOptions::new()
				.write(true)
				.open(format!("{}/gpio{}/direction", GPIO_ROOT, number))?
				.write_all(direction.as_bytes())?;
			let value = fs::OpenOptions::new()
				.read(true)
				.write(true)
				.open(format!("{}/gpio{}/value", GPIO_ROOT, number))?;
			Ok(SysfsPin {
				number,
				value,
			})
		})
	}

	pub fn output(number: u32) -> AResult<SysfsPin> {
		SysfsPin::open(number, "low")
	}

	pub fn input(number: u32) -> AResult<SysfsPin> {
		SysfsPin::open(number, "in")
	}

	pub fn set(&mut self, level: bool) {
		let value: &[u8] = if level { b"1" } else { b"0" };
		self.value.write_at(value, 0).expect("write to exported GPIO value must not fail");
	}

	pub fn get(&mut self) -> bool {
		let mut buf = [0u8];
		self.value.read_at(&mut buf, 0).expect("read from exported GPIO value must not fail");
		buf[0] == b'1'
	}
}

impl Drop for SysfsPin {
	fn drop(&mut self) {
		if let Err(e) = unexport(self.number) {
			error!("GPIO {}: failed to unexport: {}", self.number, e);
		}
	}
}

pub struct SysfsPort {
	clock: SysfsPin,
	chip_select: SysfsPin,
	data_out: SysfsPin,
	data_in: SysfsPin,
}

pub fn open(pinout: Pinout) -> AResult<SysfsPort> {
	debug!("sysfs GPIO port: {:?}", pinout);
	Ok(SysfsPort {
		clock: SysfsPin::output(pinout.clock)?,
		chip_select: SysfsPin::output(pinout.chip_select)?,
		data_out: SysfsPin::output(pinout.data_out)?,
		data_in: SysfsPin::input(pinout.data_in)?,
	})
}

impl Hardware for SysfsPort {
	fn set_clock(&mut self, level: bool) {
		self.clock.set(level);
	}

	fn set_data_out(&mut self, level: bool) {
		self.data_out.set(level);
	}

	fn set_chip_select(&mut self, level: bool) {
		self.chip_select.set(level);
	}

	fn read_data_in(&mut self) -> bool {
		self.data_in.get()
	}
}
