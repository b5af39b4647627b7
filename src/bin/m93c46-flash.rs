#[macro_use]
extern crate clap;
#[macro_use]
extern crate failure;
#[macro_use]
extern crate log;

extern crate m93c46_flash;
use m93c46_flash::*;

use std::process::exit;

use rand::Rng;

fn get_param<T>(matches: &clap::ArgMatches, name: &str) -> AResult<T>
where
	T: std::str::FromStr,
	failure::Error: From<<T as std::str::FromStr>::Err>,
{
	let param = match matches.value_of(name) {
		Some(p) => p,
		None => bail!("missing parameter {}", name),
	};
	param.parse::<T>().map_err(|e| {
		let e = failure::Error::from(e);
		let msg = format!("invalid paramater {}: {}", name, e);
		e.context(msg).into()
	})
}

fn get_param_or<T>(matches: &clap::ArgMatches, name: &str, default: &str) -> AResult<T>
where
	T: std::str::FromStr,
	failure::Error: From<<T as std::str::FromStr>::Err>,
{
	let param = matches.value_of(name).unwrap_or(default);
	param.parse::<T>().map_err(|e| {
		let e = failure::Error::from(e);
		let msg = format!("invalid paramater {}: {}", name, e);
		e.context(msg).into()
	})
}

// write a random pattern over the whole array and read every word back;
// returns how many words failed verification
fn exercise<H, I>(eeprom: &mut serial::Eeprom<H, I>, passes: usize) -> AResult<usize>
where
	H: serial::Hardware,
	I: serial::Indicator,
{
	let mut rng = rand::thread_rng();
	let mask = eeprom.organization().word_mask();
	let limit = eeprom.organization().address_limit();
	let mut mismatches = 0usize;

	for pass in 1..=passes {
		let mut session = eeprom.start_programming();
		for address in 0..limit {
			let word = rng.gen::<u16>() & mask;
			match session.write_verified(address, word) {
				Ok(()) => (),
				Err(e) => match e.downcast_ref::<serial::EepromError>() {
					Some(serial::EepromError::Miscompare { .. }) => {
						mismatches += 1;
						error!("pass {}: {}", pass, e);
					}
					_ => return Err(e),
				},
			}
		}
		drop(session);
		info!("pass {}/{}: {} words written and read back", pass, passes, limit);
	}

	Ok(mismatches)
}

fn main_app() -> AResult<()> {
	let matches = clap_app!(@app (app_from_crate!())
		(global_setting: clap::AppSettings::VersionlessSubcommands)
		(@arg backend: -b --backend +takes_value "GPIO backend: sysfs (default) or gpiomem")
		(@arg org: -o --org +takes_value "memory organization: 8 or 16 (default)")
		(@arg clock: -c --clock +required +takes_value "GPIO number of the clock line (C)")
		(@arg select: -s --select +required +takes_value "GPIO number of the chip select line (S)")
		(@arg dout: -d --dout +required +takes_value "GPIO number of the line driving the chip's D input")
		(@arg din: -q --din +required +takes_value "GPIO number of the line reading the chip's Q output")
		(@arg led: -l --led +takes_value "GPIO number of an activity LED")
		(@arg passes: -p --passes +takes_value "write/verify passes over the whole array (default 1)")
	).get_matches();

	let backend = get_param_or::<gpio::Backend>(&matches, "backend", "sysfs")?;
	let organization = get_param_or::<serial::Organization>(&matches, "org", "16")?;
	let pinout = gpio::Pinout {
		clock: get_param(&matches, "clock")?,
		chip_select: get_param(&matches, "select")?,
		data_out: get_param(&matches, "dout")?,
		data_in: get_param(&matches, "din")?,
	};
	let led = match matches.value_of("led") {
		None => None,
		Some(_) => Some(gpio::Led::open(get_param(&matches, "led")?)?),
	};
	let passes: usize = get_param_or(&matches, "passes", "1")?;

	let port = gpio::open(backend, pinout)?;
	let mut eeprom = serial::Eeprom::with_indicator(port, organization, led);
	info!("exercising {} EEPROM on {:?}, {} passes", organization, pinout, passes);

	let mismatches = exercise(&mut eeprom, passes)?;
	if mismatches > 0 {
		info!("{} words failed verification", mismatches);
		exit(11);
	}
	info!("all passes verified");

	Ok(())
}

fn main() {
	env_logger::from_env(env_logger::Env::default().default_filter_or("info")).init();

	if let Err(e) = main_app() {
		error!("Error: {}", e);
		// eprintln!("Backtrace: {:?}", e.backtrace());
		exit(1);
	}
}
