use std::io::{IsTerminal, Write};
use std::time::{SystemTime, UNIX_EPOCH};

use clap::ValueEnum;
use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};
use serde::Serialize;
use serialport::{SerialPortInfo, SerialPortType};

#[derive(Clone, Debug, Copy, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Pretty,
    Raw,
}

impl OutputFormat {
    pub fn default_for_stdout() -> Self {
        if std::io::stdout().is_terminal() {
            Self::Table
        } else {
            Self::Json
        }
    }
}

#[derive(Serialize)]
struct PayloadOutput<'a> {
    payload: &'a str,
    bytes: usize,
    port: &'a str,
    timestamp: String,
}

/// Print one received frame payload.
pub fn print_payload(payload: &str, port: &str, format: OutputFormat) {
    match format {
        OutputFormat::Json => {
            let out = PayloadOutput {
                payload,
                bytes: payload.len(),
                port,
                timestamp: now_unix_seconds(),
            };
            println!(
                "{}",
                serde_json::to_string(&out).unwrap_or_else(|_| "{}".to_string())
            );
        }
        OutputFormat::Table => {
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(vec!["PORT", "SIZE", "PAYLOAD"])
                .add_row(vec![
                    port.to_string(),
                    payload.len().to_string(),
                    payload.to_string(),
                ]);
            println!("{table}");
        }
        OutputFormat::Pretty => {
            println!("port={} size={} payload={}", port, payload.len(), payload);
        }
        OutputFormat::Raw => {
            print_raw(payload.as_bytes());
        }
    }
}

#[derive(Serialize)]
struct PortOutput<'a> {
    name: &'a str,
    kind: String,
}

/// Print the serial port listing.
pub fn print_ports(ports: &[SerialPortInfo], format: OutputFormat) {
    match format {
        OutputFormat::Json => {
            let out: Vec<PortOutput<'_>> = ports
                .iter()
                .map(|p| PortOutput {
                    name: &p.port_name,
                    kind: port_kind(&p.port_type),
                })
                .collect();
            println!(
                "{}",
                serde_json::to_string(&out).unwrap_or_else(|_| "[]".to_string())
            );
        }
        OutputFormat::Table => {
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(vec!["PORT", "TYPE"]);
            for port in ports {
                table.add_row(vec![port.port_name.clone(), port_kind(&port.port_type)]);
            }
            println!("{table}");
        }
        OutputFormat::Pretty | OutputFormat::Raw => {
            for port in ports {
                println!("{}\t{}", port.port_name, port_kind(&port.port_type));
            }
        }
    }
}

pub fn print_raw(data: &[u8]) {
    let mut out = std::io::stdout();
    let _ = out.write_all(data);
    let _ = out.flush();
}

fn port_kind(port_type: &SerialPortType) -> String {
    match port_type {
        SerialPortType::UsbPort(info) => match (&info.manufacturer, &info.product) {
            (Some(manufacturer), Some(product)) => format!("usb ({manufacturer} {product})"),
            _ => "usb".to_string(),
        },
        SerialPortType::BluetoothPort => "bluetooth".to_string(),
        SerialPortType::PciPort => "pci".to_string(),
        SerialPortType::Unknown => "unknown".to_string(),
    }
}

fn now_unix_seconds() -> String {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs().to_string())
        .unwrap_or_else(|_| "0".to_string())
}
