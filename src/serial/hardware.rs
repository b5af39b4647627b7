use std::thread;
use std::time::{
	Duration,
	Instant,
};

// M93C46 runs at up to 2 MHz; half a period per edge keeps us well below.
const CLOCK_EDGE: Duration = Duration::from_micros(1);

pub fn reliable_sleep(mut duration: Duration) {
	loop {
		let now = Instant::now();
		thread::sleep(duration);
		let elapsed = now.elapsed();
		if elapsed >= duration {
			return;
		}
		duration -= elapsed;
	}
}

/// Pin-level access to the four Microwire bus lines.
///
/// Levels are logical: `true` drives (or reads) the line high. The driver
/// never assumes a line keeps state on its own; it sets every output before
/// relying on it.
pub trait Hardware {
	fn set_clock(&mut self, level: bool);
	fn set_data_out(&mut self, level: bool);
	fn set_chip_select(&mut self, level: bool);
	fn read_data_in(&mut self) -> bool;

	// delay for (at least) one clock edge
	fn delay(&mut self) {
		reliable_sleep(CLOCK_EDGE);
	}
}

impl<'a, H: Hardware + ?Sized> Hardware for &'a mut H {
	fn set_clock(&mut self, level: bool) {
		(**self).set_clock(level)
	}

	fn set_data_out(&mut self, level: bool) {
		(**self).set_data_out(level)
	}

	fn set_chip_select(&mut self, level: bool) {
		(**self).set_chip_select(level)
	}

	fn read_data_in(&mut self) -> bool {
		(**self).read_data_in()
	}

	fn delay(&mut self) {
		(**self).delay()
	}
}
