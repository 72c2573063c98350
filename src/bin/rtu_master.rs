/// Serial master demo: polls slave 1 for three holding registers.
///
/// Usage: rtu_master [serial-port] [baud]

use std::time::Duration;

use rtulink::{RetryPolicy, RtuMaster, RtuResult, SerialLink, DEFAULT_TIMEOUT_MS};

const SLAVE_ID: u8 = 1;
const START_ADDRESS: u16 = 1;
const QUANTITY: u16 = 3;

#[tokio::main]
async fn main() -> RtuResult<()> {
    env_logger::builder()
        .filter_level(log::LevelFilter::Info)
        .init();

    let port = std::env::args().nth(1).unwrap_or_else(|| "/dev/ttyUSB0".into());
    let baud: u32 = std::env::args()
        .nth(2)
        .and_then(|s| s.parse().ok())
        .unwrap_or(9600);

    println!("🔧 RTU Master Demo");
    println!("==================");
    println!("📡 Opening {} at {} baud...", port, baud);

    let mut link = SerialLink::new(&port, baud)?;
    link.set_packet_logging(true);
    let mut master = RtuMaster::new(link, Duration::from_millis(DEFAULT_TIMEOUT_MS));
    let policy = RetryPolicy::new(3, Duration::from_millis(200));

    // Give the slave a moment to come up on a freshly wired bus.
    tokio::time::sleep(Duration::from_secs(2)).await;

    loop {
        match master
            .query_with_retry(SLAVE_ID, START_ADDRESS, QUANTITY, &policy)
            .await
        {
            Ok(values) => {
                println!(
                    "✅ slave {}: registers {}..{} = {:?}",
                    SLAVE_ID,
                    START_ADDRESS,
                    START_ADDRESS + QUANTITY - 1,
                    values
                );
            }
            Err(err) => {
                println!("❌ query failed: {}", err);
            }
        }

        tokio::time::sleep(Duration::from_secs(1)).await;
    }
}
