//! Programmer registration and dispatch
//!
//! This module provides a centralized registry for all programmers, with support
//! for feature-gated inclusion and dynamic help text generation.

use avrprog_core::device::DeviceDatabase;
use avrprog_core::programmer::{IspTransport, ProgrammerInfo};

/// Get information about all available programmers (enabled at compile time)
#[allow(unused_mut, clippy::vec_init_then_push)]
pub fn available_programmers() -> Vec<ProgrammerInfo> {
    let mut programmers = Vec::new();

    #[cfg(feature = "dummy")]
    programmers.push(ProgrammerInfo {
        name: "dummy",
        aliases: &[],
        description: "Emulated AVR target for testing (part=<name>)",
        requires_root: false,
    });

    #[cfg(feature = "linux-spi")]
    programmers.push(ProgrammerInfo {
        name: "linux_spi",
        aliases: &["linux-spi", "spidev"],
        description: "Linux spidev bus + GPIO reset line \
                      (dev=/dev/spidevX.Y,spispeed=<kHz>,gpiochip=<N>|gpiodev=<path>,reset=<line>)",
        requires_root: false,
    });

    programmers
}

/// Generate help text listing all available programmers
pub fn programmer_help() -> String {
    let programmers = available_programmers();

    if programmers.is_empty() {
        return "No programmers available (recompile with programmer features enabled)".to_string();
    }

    let mut help = String::from("Available programmers:\n");

    for p in &programmers {
        help.push_str(&format!("  {:12} - {}\n", p.name, p.description));
        if !p.aliases.is_empty() {
            help.push_str(&format!("  {:12}   aliases: {}\n", "", p.aliases.join(", ")));
        }
    }

    help
}

/// Resolve a programmer name or alias to its primary name
pub fn find_programmer(name: &str) -> Option<&'static str> {
    available_programmers()
        .into_iter()
        .find(|p| p.name == name || p.aliases.contains(&name))
        .map(|p| p.name)
}

/// Open the programmer described by `programmer` ("name" or "name:k=v,...")
///
/// The database is used by the dummy programmer to pick the emulated part.
#[allow(unused_variables)]
pub fn open_programmer(
    programmer: &str,
    db: &DeviceDatabase,
) -> Result<Box<dyn IspTransport + Send>, Box<dyn std::error::Error>> {
    let (name, options) = parse_programmer_string(programmer);

    let Some(name) = find_programmer(name) else {
        return Err(unknown_programmer_error(name));
    };

    match name {
        #[cfg(feature = "dummy")]
        "dummy" => {
            use avrprog_dummy::{DummyAvr, DummyConfig};

            let config = match options.iter().find(|(key, _)| *key == "part") {
                Some((_, part_name)) => {
                    let part = db
                        .find_by_name(part_name)
                        .ok_or_else(|| format!("Unknown part for dummy programmer: {}", part_name))?;
                    DummyConfig::new(part.signature, part.profile)
                }
                None => DummyConfig::default(),
            };

            log::info!("Opening dummy programmer (emulated target {})", config.signature);
            Ok(Box::new(DummyAvr::new(config)))
        }

        #[cfg(feature = "linux-spi")]
        "linux_spi" => {
            use avrprog_core::programmer::Port;
            use avrprog_linux_gpio::open_linux_gpio_reset;
            use avrprog_linux_spi::open_linux_spi;

            log::info!("Opening Linux SPI programmer...");

            let bus = open_linux_spi(&options).map_err(|e| {
                format!(
                    "Failed to open Linux SPI device: {}\n\
                     Make sure the device exists and you have read/write permissions.\n\
                     You may need to: sudo usermod -aG spi $USER",
                    e
                )
            })?;

            let reset = open_linux_gpio_reset(&options).map_err(|e| {
                format!(
                    "Failed to open reset GPIO line: {}\n\
                     Make sure the GPIO chip exists and you have read/write permissions.",
                    e
                )
            })?;

            Ok(Box::new(Port::new(bus, reset)))
        }

        _ => Err(unknown_programmer_error(name)),
    }
}

/// Parse a programmer string into name and options
///
/// Format: "name" or "name:option1=value1,option2=value2"
pub fn parse_programmer_string(s: &str) -> (&str, Vec<(&str, &str)>) {
    if let Some((name, opts)) = s.split_once(':') {
        let options: Vec<_> = opts
            .split(',')
            .filter_map(|opt| opt.split_once('='))
            .collect();
        (name, options)
    } else {
        (s, Vec::new())
    }
}

fn unknown_programmer_error(name: &str) -> Box<dyn std::error::Error> {
    let mut msg = format!("Unknown programmer: {}\n\n", name);
    msg.push_str(&programmer_help());
    msg.push_str("\nUse 'avrprog list-programmers' for more details");
    msg.into()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_programmer_string() {
        assert_eq!(parse_programmer_string("dummy"), ("dummy", vec![]));

        let (name, options) =
            parse_programmer_string("linux_spi:dev=/dev/spidev0.0,spispeed=250,reset=25");
        assert_eq!(name, "linux_spi");
        assert_eq!(
            options,
            vec![("dev", "/dev/spidev0.0"), ("spispeed", "250"), ("reset", "25")]
        );

        // Entries without '=' are dropped
        let (_, options) = parse_programmer_string("dummy:bogus,part=ATmega8");
        assert_eq!(options, vec![("part", "ATmega8")]);
    }

    #[test]
    fn test_unknown_programmer() {
        let db = DeviceDatabase::new();
        let err = open_programmer("usbasp", &db).err().unwrap();
        assert!(err.to_string().starts_with("Unknown programmer: usbasp"));
    }

    #[cfg(feature = "linux-spi")]
    #[test]
    fn test_find_programmer_alias() {
        assert_eq!(find_programmer("spidev"), Some("linux_spi"));
        assert_eq!(find_programmer("linux-spi"), Some("linux_spi"));
    }

    #[cfg(feature = "dummy")]
    #[test]
    fn test_open_dummy_with_part() {
        use avrprog_core::flash;

        let db = DeviceDatabase::builtin().unwrap();
        let mut port = open_programmer("dummy:part=ATmega2560", &db).unwrap();
        let part = flash::probe(&mut port, &db).unwrap();
        assert_eq!(part.name, "ATmega2560");

        let err = open_programmer("dummy:part=ATmega9999", &db).err().unwrap();
        assert!(err.to_string().contains("ATmega9999"));
    }
}
