use std::ffi::CString;
use std::fs;
use std::io;
use std::os::unix::io::{
	FromRawFd,
};
use std::ptr;

use libc::{
	MAP_SHARED,
	O_CLOEXEC,
	O_RDWR,
	O_SYNC,
	PROT_READ,
	PROT_WRITE,
	c_void,
	mmap,
	munmap,
};

use crate::AResult;
use crate::serial::Hardware;

use super::Pinout;

const GPIOMEM_PATH: &str = "/dev/gpiomem";
// character device, its metadata reports no size; the register block fits
// one page
const GPIOMEM_LEN: usize = 4096;

// BCM283x GPIO registers, byte offsets into the block
const GPFSEL0: usize = 0x00;
const GPSET0: usize = 0x1c;
const GPCLR0: usize = 0x28;
const GPLEV0: usize = 0x34;

const FSEL_INPUT: u32 = 0b000;
const FSEL_OUTPUT: u32 = 0b001;

pub const PIN_COUNT: u32 = 54;

struct GpioMem {
	ptr: ptr::NonNull<u32>,
	len: usize,
}

impl Drop for GpioMem {
	fn drop(&mut self) {
		unsafe {
			let res = munmap(
				self.ptr.as_ptr() as *mut c_void,
				self.len,
			);
			if 0 != res {
				panic!("munmap failed: {}", io::Error::last_os_error());
			}
		}
	}
}

impl GpioMem {
	fn register_read(&self, offset: usize) -> u32 {
		assert!(offset & 3 == 0);
		assert!(offset + 3 < self.len);
		unsafe { ptr::read_volatile(self.ptr.as_ptr().add(offset / 4)) }
	}

	fn register_write(&mut self, offset: usize, data: u32) {
		assert!(offset & 3 == 0);
		assert!(offset + 3 < self.len);
		unsafe { ptr::write_volatile(self.ptr.as_ptr().add(offset / 4), data) }
	}

	// 3 bits per pin, 10 pins per function select register
	fn select_function(&mut self, pin: u32, function: u32) {
		let offset = GPFSEL0 + 4 * (pin / 10) as usize;
		let shift = 3 * (pin % 10);
		let mut value = self.register_read(offset);
		value &= !(0b111 << shift);
		value |= function << shift;
		self.register_write(offset, value);
	}

	// set and clear are write-only registers, one bit per pin, two banks
	fn set_level(&mut self, pin: u32, level: bool) {
		let base = if level { GPSET0 } else { GPCLR0 };
		let offset = base + 4 * (pin / 32) as usize;
		self.register_write(offset, 1 << (pin % 32));
	}

	fn level(&self, pin: u32) -> bool {
		let offset = GPLEV0 + 4 * (pin / 32) as usize;
		0 != self.register_read(offset) & (1 << (pin % 32))
	}
}

fn inner_open() -> io::Result<GpioMem> {
	let path = CString::new(GPIOMEM_PATH)?;

	let fd = unsafe { libc::open(path.as_ptr(), O_RDWR | O_CLOEXEC | O_SYNC) };
	if -1 == fd {
		return Err(io::Error::last_os_error());
	}
	// now get fd managed to prevent resource leak; the mapping survives the
	// close
	let _file = unsafe { fs::File::from_raw_fd(fd) };

	let area = unsafe {
		mmap(
			ptr::null_mut(),
			GPIOMEM_LEN,
			PROT_READ | PROT_WRITE,
			MAP_SHARED,
			fd,
			0,
		)
	};

	if area as usize == !0usize {
		return Err(io::Error::last_os_error());
	}
	match ptr::NonNull::new(area as *mut u32) {
		None => panic!("mmap shouldn't return NULL ever"),
		Some(area) => Ok(GpioMem {
			ptr: area,
			len: GPIOMEM_LEN,
		}),
	}
}

pub struct GpioMemPort {
	mem: GpioMem,
	pinout: Pinout,
}

pub fn open(pinout: Pinout) -> AResult<GpioMemPort> {
	for &pin in &[pinout.clock, pinout.chip_select, pinout.data_out, pinout.data_in] {
		ensure!(pin < PIN_COUNT, "GPIO {} out of range (BCM283x has {} GPIOs)", pin, PIN_COUNT);
	}
	let mut mem = with_context!(("couldn't map {}", GPIOMEM_PATH), {
		Ok(inner_open()?)
	})?;
	// the output latch is registered even in input mode: preset it low so
	// the pin never glitches high when switched to output
	for &pin in &[pinout.clock, pinout.chip_select, pinout.data_out] {
		mem.set_level(pin, false);
		mem.select_function(pin, FSEL_OUTPUT);
	}
	mem.select_function(pinout.data_in, FSEL_INPUT);
	debug!("mapped {} for pins {:?}", GPIOMEM_PATH, pinout);
	Ok(GpioMemPort {
		mem,
		pinout,
	})
}

impl Hardware for GpioMemPort {
	fn set_clock(&mut self, level: bool) {
		self.mem.set_level(self.pinout.clock, level);
	}

	fn set_data_out(&mut self, level: bool) {
		self.mem.set_level(self.pinout.data_out, level);
	}

	fn set_chip_select(&mut self, level: bool) {
		self.mem.set_level(self.pinout.chip_select, level);
	}

	fn read_data_in(&mut self) -> bool {
		self.mem.level(self.pinout.data_in)
	}
}
