mod cli;

use std::io::{self, Read, Write};
use std::thread;
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use chrono::{DateTime, Utc};
use clap::{CommandFactory, Parser};
use clap_complete::{generate, shells::Bash};
use json::JsonValue;
use log::{debug, error};
use num_traits::FromPrimitive;
use serialport::{ClearBuffer, SerialPort};

use aurora::port::{self, NativePort};
use aurora::{Counter, CumulationPeriod, DSParameter, Inverter};

use cli::{Cli, Commands};

enum OutputFormat {
    Plain,
    Json,
}

type Link<'a> = Inverter<&'a mut NativePort>;

/// One answer per inverter: plain text and its json counterpart.
struct Report {
    address: u8,
    plain: String,
    json: JsonValue,
}

fn render(reports: Vec<Report>, fmt: OutputFormat) -> String {
    match fmt {
        OutputFormat::Plain => {
            if reports.len() == 1 {
                reports[0].plain.clone()
            } else {
                reports
                    .iter()
                    .map(|r| format!("[{}]\n{}", r.address, r.plain))
                    .collect::<Vec<String>>()
                    .join("\n")
            }
        }
        OutputFormat::Json => {
            let mut values: Vec<JsonValue> = reports
                .into_iter()
                .map(|mut r| {
                    if r.json.is_object() {
                        r.json["address"] = r.address.into();
                        r.json
                    } else {
                        json::object! { address: r.address, value: r.json }
                    }
                })
                .collect();
            if values.len() > 1 {
                json::stringify(values)
            } else {
                values.pop().map(|v| v.dump()).unwrap_or_default()
            }
        }
    }
}

/// A line that can throw away whatever is left of a failed response.
///
/// Frames carry no sync header, so a late tail left in the input buffer would
/// shift every following frame.
trait Resync {
    fn resync(&mut self) -> io::Result<()>;
}

impl Resync for NativePort {
    fn resync(&mut self) -> io::Result<()> {
        thread::sleep(self.timeout());
        self.clear(ClearBuffer::Input)?;
        Ok(())
    }
}

impl<R: Resync + ?Sized> Resync for &mut R {
    fn resync(&mut self) -> io::Result<()> {
        (**self).resync()
    }
}

/// Repeats `op` while it fails with an error worth retrying, draining the
/// line before every new attempt.
fn with_retries<P, T>(
    retries: usize,
    inverter: &mut Inverter<P>,
    mut op: impl FnMut(&mut Inverter<P>) -> aurora::Result<T>,
) -> aurora::Result<T>
where
    P: Read + Write + Resync,
{
    let mut attempt = 0;
    loop {
        match op(inverter) {
            Err(e) if e.is_retryable() && attempt < retries => {
                attempt += 1;
                debug!("retry {}/{}: {}", attempt, retries, e);
                inverter.port_mut().resync()?;
            }
            res => return res,
        }
    }
}

fn query<T>(
    port: &mut NativePort,
    addresses: &[u8],
    retries: usize,
    what: &str,
    mut read: impl FnMut(&mut Link) -> aurora::Result<T>,
) -> Result<Vec<(u8, T)>> {
    addresses
        .iter()
        .map(|&address| {
            let mut inverter = Inverter::new(&mut *port, address);
            with_retries(retries, &mut inverter, &mut read)
                .with_context(|| format!("Failed to read {} from inverter {}", what, address))
                .map(|value| (address, value))
        })
        .collect()
}

fn cmd_info(port: &mut NativePort, addresses: &[u8], retries: usize) -> Result<Vec<Report>> {
    let res = query(port, addresses, retries, "identification", |inv| {
        Ok((
            inv.part_number()?,
            inv.serial_number()?,
            inv.version()?,
            inv.firmware_version()?,
            inv.manufacture_date()?,
            inv.configuration()?,
        ))
    })?;

    Ok(res
        .into_iter()
        .map(|(address, (part, serial, version, firmware, date, config))| Report {
            address,
            plain: format!(
                "Part number: {}\nSerial number: {}\nVersion: {}\nFirmware: {}\nManufactured: {}\nConfiguration: {}",
                part, serial, version, firmware, date, config
            ),
            json: json::object! {
                part_number: part,
                serial_number: serial,
                model: version.model.to_string(),
                regulation: version.regulation.to_string(),
                transformer: version.transformer.to_string(),
                input: version.input.to_string(),
                firmware: firmware,
                manufacture_week: date.week,
                manufacture_year: date.year,
                configuration: config.to_string(),
            },
        })
        .collect())
}

fn cmd_state(port: &mut NativePort, addresses: &[u8], retries: usize) -> Result<Vec<Report>> {
    let res = query(port, addresses, retries, "state", |inv| inv.state())?;

    Ok(res
        .into_iter()
        .map(|(address, state)| Report {
            address,
            plain: state.to_string(),
            json: json::object! {
                global: state.global.to_string(),
                inverter: state.inverter.to_string(),
                channel1: state.channel1.to_string(),
                channel2: state.channel2.to_string(),
                alarm: state.alarm.to_string(),
            },
        })
        .collect())
}

fn cmd_alarms(port: &mut NativePort, addresses: &[u8], retries: usize) -> Result<Vec<Report>> {
    let res = query(port, addresses, retries, "alarms", |inv| inv.last_4_alarms())?;

    Ok(res
        .into_iter()
        .map(|(address, alarms)| Report {
            address,
            plain: alarms.to_string(),
            json: alarms
                .iter()
                .map(|a| a.to_string())
                .collect::<Vec<String>>()
                .into(),
        })
        .collect())
}

fn cmd_energy(
    port: &mut NativePort,
    addresses: &[u8],
    retries: usize,
    period: Option<CumulationPeriod>,
) -> Result<Vec<Report>> {
    let periods = match period {
        Some(p) => vec![p],
        None => CumulationPeriod::ALL.to_vec(),
    };

    let res = query(port, addresses, retries, "energy", |inv| {
        periods
            .iter()
            .map(|&p| inv.cumulated_energy(p).map(|wh| (p, wh)))
            .collect::<aurora::Result<Vec<_>>>()
    })?;

    Ok(res
        .into_iter()
        .map(|(address, values)| {
            let mut json = JsonValue::new_object();
            for (p, wh) in &values {
                json[p.to_string().as_str()] = (*wh).into();
            }
            Report {
                address,
                plain: values
                    .iter()
                    .map(|(p, wh)| format!("{}: {} Wh", p, wh))
                    .collect::<Vec<String>>()
                    .join("\n"),
                json,
            }
        })
        .collect())
}

static MEASUREMENTS: &[(DSParameter, &str)] = &[
    (DSParameter::GridVoltage, "V"),
    (DSParameter::GridCurrent, "A"),
    (DSParameter::GridPower, "W"),
    (DSParameter::Frequency, "Hz"),
    (DSParameter::Input1Voltage, "V"),
    (DSParameter::Input1Current, "A"),
    (DSParameter::Input2Voltage, "V"),
    (DSParameter::Input2Current, "A"),
    (DSParameter::InverterTemperature, "°C"),
    (DSParameter::BoosterTemperature, "°C"),
];

fn cmd_measure(port: &mut NativePort, addresses: &[u8], retries: usize) -> Result<Vec<Report>> {
    let res = query(port, addresses, retries, "measurements", |inv| {
        let values = MEASUREMENTS
            .iter()
            .map(|&(p, _)| inv.dsp(p))
            .collect::<aurora::Result<Vec<f32>>>()?;
        Ok((values, inv.joules()?))
    })?;

    Ok(res
        .into_iter()
        .map(|(address, (values, joules))| {
            let mut json = JsonValue::new_object();
            let mut lines = Vec::new();
            for (&(p, unit), value) in MEASUREMENTS.iter().zip(values) {
                json[p.label()] = value.into();
                lines.push(format!("{}: {:.2} {}", p, value, unit));
            }
            json["Last 10s Energy"] = joules.into();
            lines.push(format!("Last 10s Energy: {} J", joules));
            Report {
                address,
                plain: lines.join("\n"),
                json,
            }
        })
        .collect())
}

fn cmd_dsp(port: &mut NativePort, addresses: &[u8], retries: usize, code: u8) -> Result<Vec<Report>> {
    let parameter =
        DSParameter::from_u8(code).ok_or_else(|| anyhow!("{}", DSParameter::describe(code)))?;
    let res = query(port, addresses, retries, parameter.label(), |inv| {
        inv.dsp(parameter)
    })?;

    Ok(res
        .into_iter()
        .map(|(address, value)| Report {
            address,
            plain: value.to_string(),
            json: value.into(),
        })
        .collect())
}

fn cmd_counters(port: &mut NativePort, addresses: &[u8], retries: usize) -> Result<Vec<Report>> {
    let res = query(port, addresses, retries, "counters", |inv| {
        Counter::ALL
            .iter()
            .map(|&c| inv.counter(c).map(|secs| (c, Duration::from_secs(u64::from(secs)))))
            .collect::<aurora::Result<Vec<_>>>()
    })?;

    Ok(res
        .into_iter()
        .map(|(address, values)| {
            let mut json = JsonValue::new_object();
            for (c, d) in &values {
                json[c.to_string().as_str()] = d.as_secs().into();
            }
            Report {
                address,
                plain: values
                    .iter()
                    .map(|(c, d)| format!("{}: {}", c, format_run_time(*d)))
                    .collect::<Vec<String>>()
                    .join("\n"),
                json,
            }
        })
        .collect())
}

fn format_run_time(d: Duration) -> String {
    let secs = d.as_secs();
    format!(
        "{}d {:02}:{:02}:{:02}",
        secs / 86400,
        secs % 86400 / 3600,
        secs % 3600 / 60,
        secs % 60
    )
}

fn cmd_time(port: &mut NativePort, addresses: &[u8], retries: usize) -> Result<Vec<Report>> {
    let res = query(port, addresses, retries, "time", |inv| inv.time())?;

    Ok(res
        .into_iter()
        .map(|(address, time)| Report {
            address,
            plain: time.to_rfc3339(),
            json: time.timestamp().into(),
        })
        .collect())
}

fn cmd_set_time(port: &mut NativePort, addresses: &[u8], unix_seconds: Option<i64>) -> Result<String> {
    let time = match unix_seconds {
        Some(s) => DateTime::<Utc>::from_timestamp(s, 0).ok_or_else(|| anyhow!("invalid time {}", s))?,
        None => Utc::now(),
    };

    // Never retried: a repeated SetTime may reset counters again.
    for &address in addresses {
        Inverter::new(&mut *port, address)
            .set_time(time)
            .with_context(|| format!("Failed to set time on inverter {}", address))?;
    }
    Ok(String::new())
}

fn do_main() -> Result<String> {
    if std::env::var("GENERATE_COMPLETION").is_ok() {
        generate(Bash, &mut Cli::command(), "aurora-tool", &mut io::stdout());

        return Ok(String::default());
    }

    let cli = Cli::parse();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(if cli.debug {
        "debug"
    } else {
        "info"
    }))
    .format_timestamp(None)
    .format_target(false)
    .init();

    let fmt = if cli.json {
        OutputFormat::Json
    } else {
        OutputFormat::Plain
    };

    let mut port = port::open_port(
        &cli.port,
        cli.baudrate,
        Duration::from_millis(cli.timeout_ms),
        cli.force,
    )
    .with_context(|| format!("Can't open port '{}'", cli.port))?;
    let port = &mut port;
    let retries = cli.retries;

    let reports = match cli.command {
        Commands::Info { addresses } => cmd_info(port, &addresses, retries),
        Commands::State { addresses } => cmd_state(port, &addresses, retries),
        Commands::Alarms { addresses } => cmd_alarms(port, &addresses, retries),
        Commands::Energy { addresses, period } => cmd_energy(port, &addresses, retries, period),
        Commands::Measure { addresses } => cmd_measure(port, &addresses, retries),
        Commands::Dsp { addresses, code } => cmd_dsp(port, &addresses, retries, code),
        Commands::Counters { addresses } => cmd_counters(port, &addresses, retries),
        Commands::Time { addresses } => cmd_time(port, &addresses, retries),
        Commands::SetTime {
            addresses,
            unix_seconds,
        } => return cmd_set_time(port, &addresses, unix_seconds),
    }?;

    Ok(render(reports, fmt))
}

fn main() {
    match do_main() {
        Ok(s) => println!("{}", s),
        Err(e) => {
            error!("{:#}", e);
            std::process::exit(1);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use aurora::protocol::InputFrame;
    use aurora::ProtocolError;
    use aurora::{GlobalState, TransmissionState};
    use std::collections::VecDeque;

    const STATE: [u8; 6] = [0x00, 0x06, 0x02, 0x07, 0x02, 0x00];

    /// Serial line double: each request releases the next scripted reply,
    /// and `late` bytes show up only after a read has run dry.
    #[derive(Default)]
    struct Line {
        incoming: VecDeque<u8>,
        replies: VecDeque<Vec<u8>>,
        late: Vec<u8>,
        requests: usize,
        resyncs: usize,
    }

    impl Line {
        fn reply(&mut self, payload: [u8; 6]) {
            self.replies.push_back(InputFrame::new(payload).to_bytes().to_vec());
        }

        fn reply_bad_crc(&mut self, payload: [u8; 6]) {
            let mut frame = InputFrame::new(payload);
            frame.crc = frame.crc.wrapping_add(1);
            self.replies.push_back(frame.to_bytes().to_vec());
        }
    }

    impl Read for Line {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            if self.incoming.is_empty() {
                self.incoming.extend(self.late.drain(..));
                return Ok(0);
            }
            let count = buf.len().min(self.incoming.len());
            for (slot, byte) in buf.iter_mut().zip(self.incoming.drain(..count)) {
                *slot = byte;
            }
            Ok(count)
        }
    }

    impl Write for Line {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.requests += 1;
            if let Some(reply) = self.replies.pop_front() {
                self.incoming.extend(reply);
            }
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    impl Resync for Line {
        fn resync(&mut self) -> io::Result<()> {
            self.resyncs += 1;
            self.incoming.clear();
            Ok(())
        }
    }

    #[test]
    fn retry_after_short_read_drops_late_tail() {
        let frame = InputFrame::new(STATE).to_bytes();
        let mut line = Line::default();
        line.replies.push_back(frame[..5].to_vec());
        line.late = frame[5..].to_vec();
        for _ in 0..4 {
            line.reply(STATE);
        }

        let mut inverter = Inverter::new(&mut line, 2);
        let state = with_retries(1, &mut inverter, |inv| inv.state()).unwrap();
        assert_eq!(state.global, GlobalState::RUN);

        // the next exchange on the same line is still aligned
        inverter.state().unwrap();

        assert_eq!(line.requests, 3);
        assert_eq!(line.resyncs, 1);
    }

    #[test]
    fn retries_transient_errors_up_to_limit() {
        let mut line = Line::default();
        for _ in 0..4 {
            line.reply_bad_crc(STATE);
        }

        let mut inverter = Inverter::new(&mut line, 2);
        let res = with_retries(3, &mut inverter, |inv| inv.state());
        assert_matches!(res, Err(ProtocolError::CrcFailure));
        assert_eq!(line.requests, 4);
        assert_eq!(line.resyncs, 3);
    }

    #[test]
    fn does_not_retry_permanent_errors() {
        let mut line = Line::default();
        line.reply([52, 0, 0, 0, 0, 0]);
        line.reply(STATE);

        let mut inverter = Inverter::new(&mut line, 2);
        let res = with_retries(3, &mut inverter, |inv| inv.state());
        assert_matches!(
            res,
            Err(ProtocolError::Transmission(TransmissionState::VARIABLE_DOES_NOT_EXIST))
        );
        assert_eq!(line.requests, 1);
        assert_eq!(line.resyncs, 0);
    }

    #[test]
    fn retry_succeeds() {
        let mut line = Line::default();
        line.reply_bad_crc(STATE);
        line.reply(STATE);

        let mut inverter = Inverter::new(&mut line, 2);
        assert!(with_retries(2, &mut inverter, |inv| inv.state()).is_ok());
        assert_eq!(line.requests, 2);
    }

    #[test]
    fn run_time_format() {
        assert_eq!(format_run_time(Duration::from_secs(100)), "0d 00:01:40");
        assert_eq!(format_run_time(Duration::from_secs(90061)), "1d 01:01:01");
    }

    #[test]
    fn render_single_and_many() {
        let report = |address| Report {
            address,
            plain: "No Alarm".to_string(),
            json: json::object! { alarm: "No Alarm" },
        };

        assert_eq!(render(vec![report(2)], OutputFormat::Plain), "No Alarm");
        assert_eq!(
            render(vec![report(2), report(3)], OutputFormat::Plain),
            "[2]\nNo Alarm\n[3]\nNo Alarm"
        );
        assert_eq!(
            render(vec![report(2)], OutputFormat::Json),
            r#"{"alarm":"No Alarm","address":2}"#
        );
        assert_eq!(
            render(
                vec![Report {
                    address: 4,
                    plain: "1".to_string(),
                    json: 1.into()
                }],
                OutputFormat::Json
            ),
            r#"{"address":4,"value":1}"#
        );
    }
}
