#[macro_use]
extern crate clap;
#[macro_use]
extern crate failure;
#[macro_use]
extern crate log;

extern crate m93c46_flash;
use m93c46_flash::*;

use std::process::exit;

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

// numbers on the command line are decimal or "0x" hex
fn get_number(matches: &clap::ArgMatches, name: &str) -> AResult<u64> {
	let param = match matches.value_of(name) {
		Some(p) => p,
		None => bail!("missing parameter {}", name),
	};
	let parsed = if param.starts_with("0x") {
		u64::from_str_radix(&param[2..], 16)
	} else {
		param.parse::<u64>()
	};
	parsed.map_err(|e| {
		let e = failure::Error::from(e);
		let msg = format!("invalid paramater {}: {}", name, e);
		e.context(msg).into()
	})
}

fn get_address(matches: &clap::ArgMatches) -> AResult<u8> {
	let address = get_number(matches, "ADDRESS")?;
	ensure!(address <= 0xff, "address 0x{:x} too big", address);
	Ok(address as u8)
}

fn get_word(matches: &clap::ArgMatches) -> AResult<u16> {
	let word = get_number(matches, "WORD")?;
	ensure!(word <= 0xffff, "word 0x{:x} too big", word);
	Ok(word as u16)
}

fn print_word(organization: serial::Organization, address: u8, word: u16) {
	match organization {
		serial::Organization::Eight => println!("@{:02x}: {:02x}", address, word),
		serial::Organization::Sixteen => println!("@{:02x}: {:04x}", address, word),
	}
}

fn main_app() -> AResult<()> {
	let matches = clap_app!(@app (app_from_crate!())
		(@setting SubcommandRequiredElseHelp)
		(global_setting: clap::AppSettings::VersionlessSubcommands)
		(@arg backend: -b --backend +takes_value "GPIO backend: sysfs (default) or gpiomem")
		(@arg org: -o --org +takes_value "memory organization: 8 or 16 (default)")
		(@arg clock: -c --clock +required +takes_value "GPIO number of the clock line (C)")
		(@arg select: -s --select +required +takes_value "GPIO number of the chip select line (S)")
		(@arg dout: -d --dout +required +takes_value "GPIO number of the line driving the chip's D input")
		(@arg din: -q --din +required +takes_value "GPIO number of the line reading the chip's Q output")
		(@subcommand read =>
			(about: "read one word")
			(@arg ADDRESS: +required "word address (decimal or 0x hex)")
		)
		(@subcommand write =>
			(about: "write one word and read it back to verify")
			(@arg ADDRESS: +required "word address (decimal or 0x hex)")
			(@arg WORD: +required "value to write (decimal or 0x hex)")
		)
		(@subcommand erase =>
			(about: "erase one word (all bits to \"1\")")
			(@arg ADDRESS: +required "word address (decimal or 0x hex)")
		)
		(@subcommand write_all =>
			(about: "write one word into every address")
			(@arg WORD: +required "value to write (decimal or 0x hex)")
		)
		(@subcommand erase_all =>
			(about: "erase the whole array (all bits to \"1\")")
		)
		(@subcommand dump =>
			(about: "read and print the whole array")
		)
	).get_matches();

	let backend = get_param_or::<gpio::Backend>(&matches, "backend", "sysfs")?;
	let organization = get_param_or::<serial::Organization>(&matches, "org", "16")?;
	let pinout = gpio::Pinout {
		clock: get_param(&matches, "clock")?,
		chip_select: get_param(&matches, "select")?,
		data_out: get_param(&matches, "dout")?,
		data_in: get_param(&matches, "din")?,
	};
	let port = gpio::open(backend, pinout)?;
	let mut eeprom = serial::Eeprom::new(port, organization);

	match matches.subcommand() {
		("read", Some(sub_m)) => {
			let address = get_address(sub_m)?;
			let word = eeprom.read(address)?;
			print_word(organization, address, word);
			Ok(())
		}
		("write", Some(sub_m)) => {
			let address = get_address(sub_m)?;
			let word = get_word(sub_m)?;
			let mut session = eeprom.start_programming();
			session.write_verified(address, word)
		}
		("erase", Some(sub_m)) => {
			let address = get_address(sub_m)?;
			let mut session = eeprom.start_programming();
			session.erase(address)
		}
		("write_all", Some(sub_m)) => {
			let word = get_word(sub_m)?;
			let mut session = eeprom.start_programming();
			session.write_all(word)
		}
		("erase_all", _) => {
			let mut session = eeprom.start_programming();
			session.erase_all();
			Ok(())
		}
		("dump", _) => {
			for address in 0..eeprom.organization().address_limit() {
				let word = eeprom.read(address)?;
				print_word(organization, address, word);
			}
			Ok(())
		}
		("", _) => bail!("no subcommand"),
		(cmd, _) => bail!("not implemented subcommand {:?}", cmd),
	}
}

fn main() {
	env_logger::from_env(env_logger::Env::default().default_filter_or("info")).init();

	if let Err(e) = main_app() {
		error!("Error: {}", e);
		// eprintln!("Backtrace: {:?}", e.backtrace());
		exit(1);
	}
}
