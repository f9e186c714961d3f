//! Interactive evdev monitor.
//!
//! Pick or name a device, print its identity, repeat settings and
//! capabilities, then stream decoded events one line at a time until
//! the device read fails.

use std::env;
use std::error::Error;
use std::io::{self, BufRead, Write};
use std::process;

use evmon::{DEFAULT_DEVICE_GLOB, Device, InputEvent, codes, list_devices};

const USAGE: &str = "usage: evmon <device> [<type> <value>]";

fn main() {
    env_logger::init();
    if let Err(e) = run() {
        eprintln!("{e}");
        process::exit(1);
    }
}

fn run() -> Result<(), Box<dyn Error>> {
    let args: Vec<String> = env::args().collect();
    let device = match args.len() {
        1 => select_device()?,
        2 => Device::open(&args[1])
            .map_err(|e| format!("unable to open input device {}: {e}", args[1]))?,
        _ => {
            eprintln!("{USAGE}");
            process::exit(1);
        }
    };

    let id = device.id();
    let (rate, delay) = device.repeat_rate();

    println!("Evdev protocol version: {}", device.driver_version());
    println!("Device name: {}", device.name());
    println!(
        "Device info: bus 0x{:04x}, vendor 0x{:04x}, product 0x{:04x}, version 0x{:04x}",
        id.bus_type, id.vendor, id.product, id.version
    );
    println!("Repeat settings: repeat {rate}, delay {delay}");
    println!("Device capabilities:");
    for (ty, caps) in device.capabilities() {
        let names: Vec<&str> = caps.iter().map(|c| c.name).collect();
        println!("  {} {}: {}", ty.name, ty.kind, names.join(", "));
    }

    println!("Listening for events ...");
    loop {
        for event in device.read()? {
            println!("{}", format_event(&event));
        }
    }
}

/// Lists accessible devices and asks for one by index, re-prompting
/// until the answer parses and is in range.
fn select_device() -> Result<Device, Box<dyn Error>> {
    let mut devices = list_devices(DEFAULT_DEVICE_GLOB)?;
    if devices.is_empty() {
        return Err(format!("no accessible input devices found by {DEFAULT_DEVICE_GLOB}").into());
    }

    let mut lines = Vec::new();
    let mut width = 0;
    for (i, dev) in devices.iter().enumerate() {
        let line = format!(
            "{:<3} {:<20} {:<35} {:<35} {}",
            i,
            dev.path().display(),
            dev.name(),
            dev.phys(),
            dev.uniq()
        );
        width = width.max(line.len());
        lines.push(line);
    }

    println!(
        "{:<3} {:<20} {:<35} {:<35} {}",
        "ID", "Device", "Name", "Phys", "Uniq"
    );
    println!("{}", "-".repeat(width));
    for line in &lines {
        println!("{line}");
    }

    let last = devices.len() - 1;
    let stdin = io::stdin();
    let choice = loop {
        print!("Select device [0-{last}]: ");
        io::stdout().flush()?;
        let mut line = String::new();
        if stdin.lock().read_line(&mut line)? == 0 {
            return Err("no device selected".into());
        }
        match line.trim().parse::<usize>() {
            Ok(n) if n <= last => break n,
            _ => continue,
        }
    };

    Ok(devices.swap_remove(choice))
}

/// One line per event, in the classic evtest layout. EV_SYN events
/// render as separators; everything else shows the type and code with
/// their table names.
fn format_event(ev: &InputEvent) -> String {
    if ev.event_type == codes::EV_SYN {
        let name = codes::code_name(codes::EV_SYN, ev.code);
        return if ev.code == codes::SYN_MT_REPORT {
            format!(
                "time {}.{:<8} +++++++++ {} ++++++++",
                ev.time_sec, ev.time_usec, name
            )
        } else {
            format!(
                "time {}.{:<8} --------- {} --------",
                ev.time_sec, ev.time_usec, name
            )
        };
    }

    format!(
        "time {}.{:<8} type {} ({}), code {:<3} ({}), value {}",
        ev.time_sec,
        ev.time_usec,
        ev.event_type,
        codes::ev_type_name(ev.event_type),
        ev.code,
        codes::code_name(ev.event_type, ev.code),
        ev.value
    )
}
