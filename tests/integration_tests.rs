//! Integration tests for rtulink.
//!
//! These exercise the codec, the responder, and the query engine working
//! together over the in-memory link, the same way the two roles talk over a
//! real serial line.

use std::time::Duration;

use rtulink::{
    crc16, decode_response, encode_exception, encode_read_request, encode_read_response,
    ExceptionCode, MemoryLink, RegisterTable, RetryPolicy, RtuError, RtuLink, RtuMaster, RtuSlave,
    READ_HOLDING_REGISTERS,
};

/// Known test vectors for Modbus CRC-16.
#[test]
fn test_crc_calculation_accuracy() {
    let test_cases = vec![
        (b"123456789".to_vec(), 0x4B37), // published check value
        (vec![0x01, 0x03, 0x00, 0x00, 0x00, 0x02], 0xC40B),
        (vec![0x02, 0x03, 0x00, 0x00, 0x00, 0x01], 0x84B5),
    ];

    for (data, expected_crc) in test_cases {
        let calculated_crc = crc16(&data);
        assert_eq!(
            calculated_crc, expected_crc,
            "CRC mismatch for {:02X?}: expected 0x{:04X}, got 0x{:04X}",
            data, expected_crc, calculated_crc
        );
    }
}

/// Request frame construction against a captured byte sequence.
#[test]
fn test_request_frame_construction() {
    let frame = encode_read_request(0x01, 0x0000, 0x0002);
    assert_eq!(frame, vec![0x01, 0x03, 0x00, 0x00, 0x00, 0x02, 0xC4, 0x0B]);
}

/// Encode/decode inverse over a spread of register values.
#[test]
fn test_response_round_trip() {
    let cases: Vec<Vec<u16>> = vec![
        vec![0x0000],
        vec![0x000A, 0x000B],
        vec![0xFFFF, 0x0000, 0x8001, 0x7FFE],
        (0..125).collect(),
    ];

    for values in cases {
        let frame = encode_read_response(0x01, READ_HOLDING_REGISTERS, &values);
        let decoded = decode_response(&frame).unwrap();
        assert_eq!(decoded.values, values);
    }
}

/// Flipping any single payload bit while keeping the CRC must fail decode.
#[test]
fn test_single_bit_corruption_detected() {
    let frame = encode_read_response(0x01, READ_HOLDING_REGISTERS, &[0x0102, 0x0304]);
    let payload_len = frame.len() - 2;

    for byte in 0..payload_len {
        for bit in 0..8 {
            let mut corrupted = frame.clone();
            corrupted[byte] ^= 1 << bit;
            assert!(
                decode_response(&corrupted).is_err(),
                "undetected corruption at byte {} bit {}",
                byte,
                bit
            );
        }
    }
}

fn demo_slave() -> RtuSlave {
    RtuSlave::new(0x01, RegisterTable::new([1, 2, 3, 4, 5]))
}

/// End-to-end scenario from the wire's point of view: a valid read against
/// the five-register table.
#[test]
fn test_slave_normal_response_bytes() {
    let slave = demo_slave();
    let request = encode_read_request(0x01, 0x0001, 0x0003);

    let response = slave.handle_frame(&request).expect("data response");
    assert_eq!(response[0], 0x01); // slave id
    assert_eq!(response[1], 0x03); // function code
    assert_eq!(response[2], 0x06); // byte count
    assert_eq!(&response[3..9], &[0x00, 0x02, 0x00, 0x03, 0x00, 0x04]);

    // Trailing CRC covers everything before it.
    let crc = u16::from_le_bytes([response[9], response[10]]);
    assert_eq!(crc, crc16(&response[..9]));
}

/// End-to-end scenario: reading past the table yields the exact exception
/// frame {01, 83, 02, crc}.
#[test]
fn test_slave_exception_response_bytes() {
    let slave = demo_slave();
    let request = encode_read_request(0x01, 0x0001, 0x000A);

    let response = slave.handle_frame(&request).expect("exception response");
    let expected = encode_exception(0x01, READ_HOLDING_REGISTERS, ExceptionCode::IllegalDataAddress);
    assert_eq!(response, expected);
    assert_eq!(&response[..3], &[0x01, 0x83, 0x02]);
}

/// An extreme range must be rejected by the widened bounds check, never
/// wrapped into an accidental in-range read.
#[test]
fn test_slave_bounds_check_overflow() {
    let slave = demo_slave();
    for (start, quantity) in [(0xFFFFu16, 0xFFFFu16), (0xFFFF, 0x0002), (0x0005, 0x0001)] {
        let request = encode_read_request(0x01, start, quantity);
        let response = slave.handle_frame(&request).expect("exception response");
        assert_eq!(&response[..3], &[0x01, 0x83, 0x02]);
    }
}

/// Unknown function code gets IllegalFunction with the echoed high bit.
#[test]
fn test_slave_illegal_function() {
    let slave = demo_slave();
    let mut request = vec![0x01, 0x10, 0x00, 0x00, 0x00, 0x01];
    let crc = crc16(&request);
    request.extend_from_slice(&crc.to_le_bytes());

    let response = slave.handle_frame(&request).expect("exception response");
    assert_eq!(&response[..3], &[0x01, 0x90, 0x01]);
}

/// Traffic for other slaves is ignored outright.
#[test]
fn test_slave_address_filtering() {
    let slave = demo_slave();
    for other_id in [0x00u8, 0x02, 0x7F, 0xFF] {
        let request = encode_read_request(other_id, 0x0000, 0x0001);
        assert!(slave.handle_frame(&request).is_none());
    }
}

/// A request with a broken CRC is dropped silently, like a short frame.
#[test]
fn test_slave_drops_corrupted_request() {
    let slave = demo_slave();

    let mut request = encode_read_request(0x01, 0x0001, 0x0003);
    request[2] ^= 0x01;
    assert!(slave.handle_frame(&request).is_none());

    assert!(slave.handle_frame(&[0x01, 0x03]).is_none());
}

/// Full exchange over the in-memory link: master query, slave serve loop.
#[tokio::test]
async fn test_master_slave_exchange() {
    rtulink::utils::logging::init_test_logger();
    let (master_end, mut slave_end) = MemoryLink::pair();

    let slave = demo_slave();
    tokio::spawn(async move {
        let _ = slave.serve(&mut slave_end).await;
    });

    let mut master = RtuMaster::new(master_end, Duration::from_millis(500));

    let values = master.query(1, 1, 3).await.unwrap();
    assert_eq!(values, vec![2, 3, 4]);

    let values = master.query(1, 0, 5).await.unwrap();
    assert_eq!(values, vec![1, 2, 3, 4, 5]);
}

/// The slave's rejection arrives at the master as a typed exception.
#[tokio::test]
async fn test_master_sees_slave_exception() {
    let (master_end, mut slave_end) = MemoryLink::pair();

    let slave = demo_slave();
    tokio::spawn(async move {
        let _ = slave.serve(&mut slave_end).await;
    });

    let mut master = RtuMaster::new(master_end, Duration::from_millis(500));
    let err = master.query(1, 1, 10).await.unwrap_err();

    match err {
        RtuError::Exception { function, code, .. } => {
            assert_eq!(function, READ_HOLDING_REGISTERS);
            assert_eq!(code, ExceptionCode::IllegalDataAddress.to_u8());
        }
        other => panic!("expected exception, got {:?}", other),
    }
}

/// Addressing a slave that is not there produces silence, which the master
/// reports as a timeout.
#[tokio::test]
async fn test_master_times_out_on_foreign_slave() {
    let (master_end, mut slave_end) = MemoryLink::pair();

    let slave = demo_slave();
    tokio::spawn(async move {
        let _ = slave.serve(&mut slave_end).await;
    });

    let mut master = RtuMaster::new(master_end, Duration::from_millis(50));
    let err = master.query(2, 0, 1).await.unwrap_err();
    assert!(matches!(err, RtuError::Timeout { .. }));
}

/// Sequential queries stay correctly paired on the half-duplex link.
#[tokio::test]
async fn test_sequential_queries() {
    let (master_end, mut slave_end) = MemoryLink::pair();

    let slave = demo_slave();
    tokio::spawn(async move {
        let _ = slave.serve(&mut slave_end).await;
    });

    let mut master = RtuMaster::new(master_end, Duration::from_millis(500));

    for start in 0u16..5 {
        let values = master.query(1, start, 1).await.unwrap();
        assert_eq!(values, vec![start + 1]);
    }

    let stats = master.link().stats();
    assert_eq!(stats.frames_sent, 5);
    assert_eq!(stats.frames_received, 5);
}

/// Retry policy keeps trying through silence, then gives up with a timeout.
#[tokio::test]
async fn test_retry_policy_exhaustion() {
    let (master_end, _parked_peer) = MemoryLink::pair();

    let mut master = RtuMaster::new(master_end, Duration::from_millis(10));
    let policy = RetryPolicy::new(2, Duration::from_millis(1));

    let err = master.query_with_retry(1, 0, 1, &policy).await.unwrap_err();
    assert!(matches!(err, RtuError::Timeout { .. }));
    assert_eq!(master.link().stats().frames_sent, 2);
    assert_eq!(master.link().stats().timeouts, 2);
}
