use colored::*;

use clap::{App, AppSettings, Arg, ArgMatches};

use std::process;
use std::time::Duration;

use pinger::{util, Error, ProbeResult, ProbeSession, RawSocketProber, SessionConfig, SessionReport};

fn main() {
    env_logger::Builder::from_default_env()
        .format_timestamp_millis()
        .init();

    let matches = App::new("pinger")
        .setting(AppSettings::ColoredHelp)
        .version("v0.1")
        .about("Sends a fixed number of ICMP echo requests and reports loss and round trip times.\nRaw ICMP sockets usually require root.")
        .arg(Arg::with_name("DESTINATION")
            .help("Hostname or IPv4 address")
            .required(true)
            .index(1))
        .arg(Arg::with_name("count")
            .help("Number of echo requests to send (Default 4)")
            .short("c")
            .takes_value(true))
        .arg(Arg::with_name("timeout")
            .help("Set how long to wait for each reply before timing out (Default 1s)")
            .short("W")
            .takes_value(true))
        .arg(Arg::with_name("interval")
            .help("Set how long to wait after each probe (Default 1s)")
            .short("I")
            .takes_value(true))
        .arg(Arg::with_name("identifier")
            .help("Override the ICMP identifier (Default: process id)")
            .short("e")
            .takes_value(true))
        .get_matches();

    if let Err(e) = run(&matches) {
        eprintln!("{} {}", "error:".red().bold(), e);
        process::exit(1);
    }
}

fn run(matches: &ArgMatches) -> pinger::Result<()> {
    let config = session_config(matches)?;

    let destination_host = matches.value_of("DESTINATION").unwrap_or_default();
    let destination = util::resolve_dest(destination_host)?;

    let mut session = ProbeSession::new(RawSocketProber, destination, config)?;

    println!("{} {} ({}):", "Pinging".cyan(), destination_host.bold(), destination);
    println!();

    let report = session.run(|_, result| match result {
        ProbeResult::Success { .. } => {
            let rtt = result.rtt_millis().unwrap_or_default();
            println!("Reply from {}:\ttime = {} ms", destination.to_string().yellow(), format!("{:.2}", rtt).bold());
        }
        ProbeResult::Timeout => println!("{}", "Request timed out.".red()),
    })?;

    print_report(destination_host, &report);
    Ok(())
}

fn session_config(matches: &ArgMatches) -> pinger::Result<SessionConfig> {
    let mut config = SessionConfig::default();

    if let Some(count) = matches.value_of("count") {
        config.probe_count = count.parse()
            .map_err(|_| Error::Config(format!("invalid count {:?} (ex: 4)", count)))?;
    }
    if let Some(timeout) = matches.value_of("timeout") {
        config.timeout = parse_duration("timeout", timeout)?;
    }
    if let Some(interval) = matches.value_of("interval") {
        config.pacing = parse_duration("interval", interval)?;
    }
    if let Some(id) = matches.value_of("identifier") {
        config.identifier = Some(id.parse()
            .map_err(|_| Error::Config(format!("invalid identifier {:?} (ex: 4242, max 65535)", id)))?);
    }

    Ok(config)
}

fn parse_duration(name: &str, value: &str) -> pinger::Result<Duration> {
    humantime::parse_duration(value)
        .map_err(|e| Error::Config(format!("invalid duration for {} (ex: 1s, 400ms, 1m): {}", name, e)))
}

fn print_report(destination_host: &str, report: &SessionReport) {
    println!(); // New line
    println!("{} {} {} {}", "---".yellow(), destination_host.bold(), "ping statistics".cyan(), "---".yellow());
    println!("\tSend = {}, Received = {}, Lost = {} ({}% lost)",
        report.sent.to_string().bold(), report.received.to_string().bold(),
        report.lost.to_string().bold(), format!("{:?}", report.loss_percent).bold());

    // min/max are only placeholders when every probe was lost
    if report.has_rtt() {
        println!("Approximate round trip times in milli-seconds:");
        println!("\tMinimum = {} ms, Maximum = {} ms, Average = {} ms",
            format!("{:?}", report.min_rtt).bold(), format!("{:?}", report.max_rtt).bold(),
            format!("{:?}", report.avg_rtt).bold());
    }
}
