use std::io::{Read, Write};
use std::time::Duration;
use serialport::{SerialPort, SerialPortInfo, SerialPortType};
use crate::drivers::source::{ByteSink, ByteSource};
use crate::drivers::LinkError;
pub const DEFAULT_BAUD: u32 = 115_200;
/// Serial link to the pacemaker's USB UART.
pub struct SerialTransport {
    port: Box<dyn SerialPort>,
    port_name: String,
}
impl SerialTransport {
    pub fn open(port_name: &str, baud: u32, timeout: Duration) -> Result<Self, LinkError> {
        log::info!("opening {port_name} @ {baud}");
        let port = serialport::new(port_name, baud).timeout(timeout).open()?;
        Ok(Self {
            port,
            port_name: port_name.to_string(),
        })
    }
    pub fn port_name(&self) -> &str {
        &self.port_name
    }
    /// Independent handle on the same port, so reading and writing can live on
    /// different threads.
    pub fn try_clone(&self) -> Result<Self, LinkError> {
        Ok(Self {
            port: self.port.try_clone()?,
            port_name: self.port_name.clone(),
        })
    }
}
impl ByteSource for SerialTransport {
    fn has_bytes_available(&mut self) -> Result<bool, LinkError> {
        Ok(self.port.bytes_to_read()? > 0)
    }
    fn read_available(&mut self) -> Result<Vec<u8>, LinkError> {
        let waiting = self.port.bytes_to_read()? as usize;
        if waiting == 0 {
            return Ok(Vec::new());
        }
        let mut buf = vec![0u8; waiting];
        let n = Read::read(&mut self.port, &mut buf)?;
        buf.truncate(n);
        Ok(buf)
    }
}
impl ByteSink for SerialTransport {
    fn write(&mut self, bytes: &[u8]) -> Result<usize, LinkError> {
        Write::write_all(&mut self.port, bytes)?;
        Ok(bytes.len())
    }
    fn flush(&mut self) -> Result<(), LinkError> {
        Write::flush(&mut self.port)?;
        Ok(())
    }
}
/// Ports the OS currently knows about, USB ones described with their VID/PID.
pub fn list_ports() -> Result<Vec<String>, LinkError> {
    let ports = serialport::available_ports()?;
    Ok(ports.iter().map(describe_port).collect())
}
fn describe_port(info: &SerialPortInfo) -> String {
    match &info.port_type {
        SerialPortType::UsbPort(usb) => format!(
            "{} (usb {:04x}:{:04x}{})",
            info.port_name,
            usb.vid,
            usb.pid,
            usb.product
                .as_deref()
                .map(|p| format!(" {p}"))
                .unwrap_or_default()
        ),
        SerialPortType::BluetoothPort => format!("{} (bluetooth)", info.port_name),
        SerialPortType::PciPort => format!("{} (pci)", info.port_name),
        SerialPortType::Unknown => info.port_name.clone(),
    }
}
