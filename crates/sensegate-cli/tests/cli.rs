use std::io::Write;

use assert_cmd::Command;
use predicates::prelude::PredicateBooleanExt;
use predicates::str::contains;
use serde_json::Value;
use tempfile::NamedTempFile;

const MIBEACON_HUMIDITY: &str = "58585b051fa3891338c1a4f30a68073c000000f7058be5";
const MIBEACON_KEY: &str = "6badc40a09b9176765c76226f000d6cb";
const BTHOME_READING: &str = "44002b0164051405002d013f0000";
const HVAC_FAN_LOW_22C: &str = "89002D010A0101010101094816000001140002040000000420010220008088021018131E031000000000000078";

fn cmd() -> Command {
    Command::new(assert_cmd::cargo::cargo_bin!("sensegate"))
}

fn stdout_json(assert: assert_cmd::assert::Assert) -> Value {
    let stdout = String::from_utf8(assert.get_output().stdout.clone()).expect("utf8 stdout");
    serde_json::from_str(stdout.trim()).expect("valid json")
}

#[test]
fn help_covers_every_decoder() {
    for decoder in ["mibeacon", "bthome", "hvac"] {
        cmd().arg("decode").arg(decoder).arg("--help").assert().success();
    }
}

#[test]
fn decode_bthome_outputs_reading_json() {
    let assert = cmd()
        .arg("decode")
        .arg("bthome")
        .arg(BTHOME_READING)
        .assert()
        .success();
    let reading = stdout_json(assert);
    assert_eq!(reading["packetId"], 43);
    assert_eq!(reading["batteryPercent"], 100);
    assert_eq!(reading["windowState"], 1);
    assert_eq!(reading["capabilityFlags"]["version"], 2);
}

#[test]
fn decode_bthome_rejects_bad_hex() {
    cmd()
        .arg("decode")
        .arg("bthome")
        .arg("zz00")
        .assert()
        .failure()
        .code(2)
        .stderr(contains("error:").and(contains("hint:")));
}

#[test]
fn decode_hvac_outputs_state_json() {
    let assert = cmd()
        .arg("decode")
        .arg("hvac")
        .arg(HVAC_FAN_LOW_22C)
        .assert()
        .success();
    let state = stdout_json(assert);
    assert_eq!(state["direction"], "unitsToController");
    assert_eq!(state["running"], true);
    assert_eq!(state["mode"], "Cooling");
    assert_eq!(state["fanSpeed"], "Low");
    assert_eq!(state["temperatureCelsius"], 22);
    assert_eq!(state["testMode"], false);
}

#[test]
fn decode_hvac_reports_unknown_direction_with_hint() {
    cmd()
        .arg("decode")
        .arg("hvac")
        .arg("12004278")
        .assert()
        .failure()
        .code(2)
        .stderr(contains("unknown direction").and(contains("hint:")));
}

#[test]
fn decode_mibeacon_with_bind_key() {
    let assert = cmd()
        .arg("decode")
        .arg("mibeacon")
        .arg(MIBEACON_HUMIDITY)
        .arg("--bind-key")
        .arg(MIBEACON_KEY)
        .assert()
        .success();
    let frame = stdout_json(assert);
    assert_eq!(frame["macAddress"], "a4c1381389a3");
    assert_eq!(frame["eventType"], 4102);
    assert_eq!(frame["event"]["kind"], "humidity");
    assert_eq!(frame["event"]["percent"], 30.8);
}

#[test]
fn decode_mibeacon_without_key_hints_at_bind_key() {
    cmd()
        .arg("decode")
        .arg("mibeacon")
        .arg(MIBEACON_HUMIDITY)
        .assert()
        .failure()
        .code(2)
        .stderr(contains("encrypted").and(contains("--bind-key")));
}

#[test]
fn decode_mibeacon_honors_mac_filter() {
    cmd()
        .arg("decode")
        .arg("mibeacon")
        .arg(MIBEACON_HUMIDITY)
        .arg("--bind-key")
        .arg(MIBEACON_KEY)
        .arg("--mac")
        .arg("00:00:00:00:00:01")
        .assert()
        .failure()
        .stderr(contains("no bind key matched"));
}

#[test]
fn run_decodes_capture_file_through_device() {
    let mut capture = NamedTempFile::new().expect("tempfile");
    writeln!(capture, "# bedroom window sensor").expect("write");
    writeln!(capture, "{BTHOME_READING}").expect("write");
    writeln!(capture).expect("write");

    let assert = cmd()
        .arg("run")
        .arg("--device-type")
        .arg("SBDW-002C")
        .arg("--name")
        .arg("hall window")
        .arg("--input")
        .arg(capture.path())
        .assert()
        .success()
        .stderr(contains("OK: 1 decoded, 0 skipped, 0 failed"));
    let decoded = stdout_json(assert);
    assert_eq!(decoded["properties"]["deviceName"], "hall window");
    assert_eq!(decoded["properties"]["windowState"], 1);
}

#[test]
fn run_continues_past_undecodable_payloads() {
    let mut capture = NamedTempFile::new().expect("tempfile");
    // Version-1 header: a per-message failure, not a fatal one.
    writeln!(capture, "200000").expect("write");
    writeln!(capture, "{BTHOME_READING}").expect("write");

    cmd()
        .arg("run")
        .arg("--device-type")
        .arg("SBHT-003C")
        .arg("--input")
        .arg(capture.path())
        .assert()
        .success()
        .stderr(contains("failed: ").and(contains("OK: 1 decoded, 0 skipped, 1 failed")));
}

#[test]
fn run_p1p2_text_capture_with_topics() {
    let mut capture = NamedTempFile::new().expect("tempfile");
    writeln!(
        capture,
        "p1p2/bridge42|R 2023-03-14 17:56:09 M 0.5: {HVAC_FAN_LOW_22C}"
    )
    .expect("write");
    writeln!(
        capture,
        "p1p2/bridge42|R 2023-03-14 17:56:10 M 0.5: 12004278"
    )
    .expect("write");

    let assert = cmd()
        .arg("run")
        .arg("--device-type")
        .arg("p1p2")
        .arg("--format")
        .arg("text")
        .arg("--input")
        .arg(capture.path())
        .assert()
        .success()
        .stderr(contains("OK: 1 decoded, 1 skipped, 0 failed"));
    let decoded = stdout_json(assert);
    assert_eq!(decoded["properties"]["mode"], "Cooling");
    assert_eq!(decoded["properties"]["bridge"], "bridge42");
}

#[test]
fn run_rejects_unknown_device_type_with_hint() {
    let capture = NamedTempFile::new().expect("tempfile");
    cmd()
        .arg("run")
        .arg("--device-type")
        .arg("nonsense")
        .arg("--input")
        .arg(capture.path())
        .assert()
        .failure()
        .code(2)
        .stderr(contains("unknown device type").and(contains("registered types")));
}

#[test]
fn run_rejects_malformed_property() {
    let capture = NamedTempFile::new().expect("tempfile");
    cmd()
        .arg("run")
        .arg("--device-type")
        .arg("passthrough")
        .arg("--property")
        .arg("notkeyvalue")
        .arg("--input")
        .arg(capture.path())
        .assert()
        .failure()
        .code(2)
        .stderr(contains("invalid property").and(contains("key=value")));
}
