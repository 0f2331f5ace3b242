use std::collections::BTreeMap;
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use sensegate_core::decoders::mibeacon::{BindKey, ResolveError};
use sensegate_core::decoders::{bthome, hvac, mibeacon};
use sensegate_core::{
    Device, DeviceConfig, DeviceData, FileSource, Message, MessageSource, PayloadFormat, Registry,
};
use serde_json::json;

const LONG_VERSION: &str = concat!(
    env!("CARGO_PKG_VERSION"),
    " (",
    env!("SENSEGATE_BUILD_COMMIT"),
    " ",
    env!("SENSEGATE_BUILD_DATE"),
    ")"
);

#[derive(Parser, Debug)]
#[command(name = "sensegate")]
#[command(version, long_version = LONG_VERSION)]
#[command(
    about = "Decoding toolbox for the SenseGate telemetry gateway (MiBeacon / BTHome / HVAC bus).",
    long_about = None,
    after_help = "Examples:\n  sensegate decode bthome 44002b0164 --pretty\n  sensegate decode mibeacon 58585b05... --bind-key 6badc40a...\n  sensegate run --device-type SBHT-003C --input payloads.txt"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Decode a single payload with one protocol decoder.
    Decode {
        #[command(subcommand)]
        command: DecodeCommands,
    },
    /// Run every payload in a capture file through a configured device.
    Run {
        /// Registered device type (e.g. LYWSD03MMC, SBHT-003C, p1p2)
        #[arg(long)]
        device_type: String,

        /// Device name used in emitted properties
        #[arg(long, default_value = "cli")]
        name: String,

        /// Device property, repeatable (e.g. --property macAddress=A4:C1:...)
        #[arg(long = "property", value_name = "KEY=VALUE")]
        properties: Vec<String>,

        /// Capture file: one payload per line, `#` comments, optional
        /// `topic|payload` prefix
        #[arg(long)]
        input: PathBuf,

        /// Payload encoding of the capture lines
        #[arg(long, value_enum, default_value = "hex")]
        format: InputFormat,

        /// Pretty-print JSON output
        #[arg(long)]
        pretty: bool,

        /// Suppress skip notices and the summary
        #[arg(long)]
        quiet: bool,
    },
}

#[derive(Subcommand, Debug)]
enum DecodeCommands {
    /// Decode a MiBeacon BLE advertisement (hex)
    Mibeacon {
        /// Raw manufacturer data, hex encoded
        payload: String,

        /// Bind key for encrypted frames (32 hex digits)
        #[arg(long)]
        bind_key: Option<String>,

        /// Only use the bind key for this MAC address
        #[arg(long)]
        mac: Option<String>,

        /// Pretty-print JSON output
        #[arg(long)]
        pretty: bool,
    },
    /// Decode a compact-TLV (BTHome v2) advertisement (hex)
    Bthome {
        /// Raw service data, hex encoded
        payload: String,

        /// Pretty-print JSON output
        #[arg(long)]
        pretty: bool,
    },
    /// Decode an HVAC bus message (hex)
    Hvac {
        /// Bus message, hex encoded
        message: String,

        /// Pretty-print JSON output
        #[arg(long)]
        pretty: bool,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum InputFormat {
    Hex,
    Text,
}

impl From<InputFormat> for PayloadFormat {
    fn from(format: InputFormat) -> Self {
        match format {
            InputFormat::Hex => PayloadFormat::Hex,
            InputFormat::Text => PayloadFormat::Text,
        }
    }
}

fn main() -> ExitCode {
    env_logger::init();
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Decode { command } => match command {
            DecodeCommands::Mibeacon {
                payload,
                bind_key,
                mac,
                pretty,
            } => cmd_decode_mibeacon(&payload, bind_key.as_deref(), mac.as_deref(), pretty),
            DecodeCommands::Bthome { payload, pretty } => cmd_decode_bthome(&payload, pretty),
            DecodeCommands::Hvac { message, pretty } => cmd_decode_hvac(&message, pretty),
        },
        Commands::Run {
            device_type,
            name,
            properties,
            input,
            format,
            pretty,
            quiet,
        } => cmd_run(&device_type, &name, &properties, &input, format, pretty, quiet),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {}", err.message);
            if let Some(hint) = err.hint {
                eprintln!("hint: {}", hint);
            }
            ExitCode::from(2)
        }
    }
}

#[derive(Debug)]
struct CliError {
    message: String,
    hint: Option<String>,
}

impl CliError {
    fn new(message: impl Into<String>, hint: Option<String>) -> Self {
        Self {
            message: message.into(),
            hint,
        }
    }
}

impl std::fmt::Display for CliError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for CliError {}

impl From<anyhow::Error> for CliError {
    fn from(err: anyhow::Error) -> Self {
        CliError::new(format!("{err:#}"), None)
    }
}

fn cmd_decode_mibeacon(
    payload: &str,
    bind_key: Option<&str>,
    mac: Option<&str>,
    pretty: bool,
) -> Result<(), CliError> {
    let raw = decode_hex_arg(payload, "payload")?;
    let key = bind_key.map(parse_bind_key).transpose()?;
    let mac_filter = mac.map(str::to_string);

    let resolver = move |frame_mac: &str| -> Result<Option<BindKey>, ResolveError> {
        if let Some(expected) = &mac_filter {
            if !mac_equal(expected, frame_mac) {
                return Ok(None);
            }
        }
        Ok(key.clone())
    };

    let frame = match mibeacon::decode(&raw, &resolver) {
        Ok(frame) => frame,
        Err(mibeacon::MiBeaconError::BindKeyRequired) => {
            return Err(CliError::new(
                "frame is encrypted and no bind key matched",
                Some("pass --bind-key (and optionally --mac) to decrypt".to_string()),
            ));
        }
        Err(err) => {
            return Err(CliError::new(
                format!("MiBeacon decode failed: {err}"),
                None,
            ));
        }
    };

    print_json(&frame, pretty)
}

fn cmd_decode_bthome(payload: &str, pretty: bool) -> Result<(), CliError> {
    let raw = decode_hex_arg(payload, "payload")?;
    let reading = bthome::decode(&raw)
        .map_err(|err| CliError::new(format!("BTHome decode failed: {err}"), None))?;
    print_json(&reading, pretty)
}

fn cmd_decode_hvac(message: &str, pretty: bool) -> Result<(), CliError> {
    let state = hvac::decode(message).map_err(|err| match err {
        hvac::HvacError::UnknownDirection { .. } => CliError::new(
            format!("HVAC decode failed: {err}"),
            Some("not a controller/unit frame; other bus traffic is expected".to_string()),
        ),
        other => CliError::new(format!("HVAC decode failed: {other}"), None),
    })?;
    print_json(&state, pretty)
}

fn cmd_run(
    device_type: &str,
    name: &str,
    properties: &[String],
    input: &PathBuf,
    format: InputFormat,
    pretty: bool,
    quiet: bool,
) -> Result<(), CliError> {
    let config = DeviceConfig {
        name: name.to_string(),
        device_type: device_type.to_string(),
        properties: parse_properties(properties)?,
    };

    let registry = Registry::with_builtins();
    let device = registry.create(&config).map_err(|err| {
        CliError::new(
            err.to_string(),
            Some(format!(
                "registered types: {}",
                registry.device_types().join(", ")
            )),
        )
    })?;

    let mut source = FileSource::open(input, format.into())
        .with_context(|| format!("failed to open capture file: {}", input.display()))
        .map_err(CliError::from)?;

    let mut decoded_count = 0u64;
    let mut skipped = 0u64;
    let mut failed = 0u64;
    loop {
        let message = source
            .next_message()
            .context("failed to read capture file")
            .map_err(CliError::from)?;
        let Message { topic, payload } = match message {
            Some(message) => message,
            None => break,
        };

        let mut data = DeviceData::new(payload);
        if let Some(topic) = topic {
            data.properties
                .insert("inputTopic".to_string(), json!(topic));
        }

        match device.decode(&data) {
            Ok(Some(decoded)) => {
                decoded_count += 1;
                print_json(
                    &json!({
                        "payload": String::from_utf8_lossy(&decoded.payload),
                        "properties": decoded.properties,
                    }),
                    pretty,
                )?;
            }
            Ok(None) => {
                skipped += 1;
                if !quiet {
                    eprintln!("skipped: {}", hex::encode(&data.payload));
                }
            }
            Err(err) => {
                // Per-message failures must not stop the feed; report the
                // offending bytes and move on.
                failed += 1;
                eprintln!("failed: {err} (payload: {})", hex::encode(&data.payload));
            }
        }
    }

    if !quiet {
        eprintln!("OK: {decoded_count} decoded, {skipped} skipped, {failed} failed");
    }
    Ok(())
}

fn decode_hex_arg(value: &str, what: &str) -> Result<Vec<u8>, CliError> {
    hex::decode(value.trim()).map_err(|err| {
        CliError::new(
            format!("invalid {what}: {err}"),
            Some(format!("{what} must be hex encoded")),
        )
    })
}

fn parse_bind_key(value: &str) -> Result<BindKey, CliError> {
    let bytes = decode_hex_arg(value, "bind key")?;
    BindKey::try_from(bytes.as_slice()).map_err(|err| {
        CliError::new(
            err.to_string(),
            Some("bind keys are 32 hex digits".to_string()),
        )
    })
}

fn parse_properties(pairs: &[String]) -> Result<BTreeMap<String, String>, CliError> {
    let mut properties = BTreeMap::new();
    for pair in pairs {
        let (key, value) = pair.split_once('=').ok_or_else(|| {
            CliError::new(
                format!("invalid property '{pair}'"),
                Some("use --property key=value".to_string()),
            )
        })?;
        properties.insert(key.trim().to_string(), value.trim().to_string());
    }
    Ok(properties)
}

fn mac_equal(left: &str, right: &str) -> bool {
    let strip = |mac: &str| -> String {
        mac.chars()
            .filter(|c| *c != ':' && *c != '-')
            .map(|c| c.to_ascii_lowercase())
            .collect()
    };
    strip(left) == strip(right)
}

fn print_json<T: serde::Serialize>(value: &T, pretty: bool) -> Result<(), CliError> {
    let json = if pretty {
        serde_json::to_string_pretty(value)
    } else {
        serde_json::to_string(value)
    };
    let json = json
        .context("JSON serialization failed")
        .map_err(CliError::from)?;
    println!("{json}");
    Ok(())
}
