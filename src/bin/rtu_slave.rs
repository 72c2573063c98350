/// Serial slave demo: serves five holding registers as slave 1.
///
/// Usage: rtu_slave [serial-port] [baud]

use rtulink::{RegisterTable, RtuSlave, SerialLink, RtuResult};

#[tokio::main]
async fn main() -> RtuResult<()> {
    env_logger::builder()
        .filter_level(log::LevelFilter::Info)
        .init();

    let port = std::env::args().nth(1).unwrap_or_else(|| "/dev/ttyUSB1".into());
    let baud: u32 = std::env::args()
        .nth(2)
        .and_then(|s| s.parse().ok())
        .unwrap_or(9600);

    println!("🔧 RTU Slave Demo");
    println!("=================");
    println!("📡 Opening {} at {} baud...", port, baud);

    let mut link = SerialLink::new(&port, baud)?;
    link.set_packet_logging(true);

    // Voltage, current, power, energy, frequency - one register each.
    let table = RegisterTable::new([0x0001, 0x0002, 0x0003, 0x0004, 0x0005]);
    let slave = RtuSlave::new(1, table);

    println!("✅ Serving {} registers as slave 1", slave.table().len());
    slave.serve(&mut link).await
}
