use base64::{engine::general_purpose::STANDARD, Engine as _};
use chrono::{TimeZone, Utc};
use heapless::Vec as HVec;
use serde_json::Value;

use lora_forwarder::{
    config::GatewayConf,
    identity::GatewayIdentity,
    protocol::{
        encode_status, encode_uplink, EncodeError, GatewayId, HEADER_LEN, MAX_DATAGRAM_LEN,
        PKT_PUSH_DATA, PROTOCOL_VERSION,
    },
    radio::{Bandwidth, LinkQuality, RadioConfig, ReceivedFrame, SpreadingFactor},
    stats::Counters,
};

const MAC: [u8; 6] = [0xb8, 0x27, 0xeb, 0x12, 0x34, 0x56];

fn frame(payload: &[u8], timestamp_us: u64) -> ReceivedFrame {
    let mut bytes = HVec::new();
    bytes.extend_from_slice(payload).unwrap();
    ReceivedFrame {
        payload: bytes,
        raw_rssi: 100,
        raw_snr: 0x84,
        timestamp_us,
    }
}

fn identity(description: &str) -> GatewayIdentity {
    let conf = GatewayConf {
        latitude: 52.5,
        longitude: 13.25,
        altitude: 34,
        if_name: "eth0".to_string(),
        eui: None,
        platform: "Single Channel Gateway".to_string(),
        email: "ops@example.org".to_string(),
        description: description.to_string(),
    };
    GatewayIdentity::new(GatewayId::from_mac(MAC), &conf)
}

fn split(datagram: &[u8]) -> (&[u8], Value) {
    let (header, body) = datagram.split_at(HEADER_LEN);
    (header, serde_json::from_slice(body).unwrap())
}

fn assert_header(header: &[u8]) {
    assert_eq!(header[0], PROTOCOL_VERSION);
    assert_eq!(header[3], PKT_PUSH_DATA);
    assert_eq!(&header[4..], &[0xb8, 0x27, 0xeb, 0xff, 0xff, 0x12, 0x34, 0x56]);
}

#[test]
fn test_uplink_fields() {
    let radio = RadioConfig::new(868_100_000, SpreadingFactor::SF9, Bandwidth::Khz125);
    let quality = LinkQuality { snr: -31, rssi: -39 };
    let id = GatewayId::from_mac(MAC);

    let datagram = encode_uplink(&id, &frame(b"\x40\x01\x02\x03\x04", 1_234_567), quality, &radio).unwrap();
    let (header, json) = split(&datagram);

    assert_header(header);
    let rxpk = &json["rxpk"][0];
    assert_eq!(json["rxpk"].as_array().unwrap().len(), 1);
    assert_eq!(rxpk["tmst"], 1_234_567);
    assert_eq!(rxpk["freq"].as_f64().unwrap(), 868.1);
    assert_eq!(rxpk["chan"], 0);
    assert_eq!(rxpk["rfch"], 0);
    assert_eq!(rxpk["stat"], 1);
    assert_eq!(rxpk["modu"], "LORA");
    assert_eq!(rxpk["datr"], "SF9BW125");
    assert_eq!(rxpk["codr"], "4/5");
    assert_eq!(rxpk["rssi"], -39);
    assert_eq!(rxpk["lsnr"].as_f64().unwrap(), -31.0);
    assert_eq!(rxpk["size"], 5);
    assert_eq!(rxpk["data"], STANDARD.encode(b"\x40\x01\x02\x03\x04"));
}

#[test]
fn test_uplink_field_order() {
    let radio = RadioConfig::new(868_100_000, SpreadingFactor::SF7, Bandwidth::Khz125);
    let quality = LinkQuality { snr: 7, rssi: -80 };

    let datagram = encode_uplink(&GatewayId::from_mac(MAC), &frame(b"x", 1), quality, &radio).unwrap();
    let body = std::str::from_utf8(&datagram[HEADER_LEN..]).unwrap();

    assert!(body.starts_with(r#"{"rxpk":[{"tmst":1,"freq":868.1,"chan":0,"rfch":0,"stat":1,"modu":"LORA","datr":"SF7BW125","codr":"4/5","rssi":-80,"lsnr":7.0,"size":1,"data":"eA=="}]}"#));
}

#[test]
fn test_uplink_empty_payload() {
    let radio = RadioConfig::new(915_000_000, SpreadingFactor::SF10, Bandwidth::Khz500);
    let quality = LinkQuality { snr: 0, rssi: -100 };

    let datagram = encode_uplink(&GatewayId::from_mac(MAC), &frame(&[], 0), quality, &radio).unwrap();
    let (_, json) = split(&datagram);

    assert_eq!(json["rxpk"][0]["data"], "");
    assert_eq!(json["rxpk"][0]["size"], 0);
    assert_eq!(json["rxpk"][0]["datr"], "SF10BW500");
}

#[test]
fn test_uplink_timestamp_wraps() {
    let radio = RadioConfig::new(868_100_000, SpreadingFactor::SF7, Bandwidth::Khz125);
    let quality = LinkQuality { snr: 0, rssi: 0 };
    let ts = (1u64 << 32) + 42;

    let datagram = encode_uplink(&GatewayId::from_mac(MAC), &frame(b"a", ts), quality, &radio).unwrap();
    let (_, json) = split(&datagram);

    assert_eq!(json["rxpk"][0]["tmst"], 42);
}

#[test]
fn test_uplink_full_fifo_fits() {
    let radio = RadioConfig::new(868_100_000, SpreadingFactor::SF12, Bandwidth::Khz125);
    let quality = LinkQuality { snr: -32, rssi: -157 };
    let payload = [0xFFu8; 255];

    let datagram = encode_uplink(&GatewayId::from_mac(MAC), &frame(&payload, u64::MAX), quality, &radio).unwrap();

    assert!(datagram.len() <= MAX_DATAGRAM_LEN);
    let (_, json) = split(&datagram);
    let data = json["rxpk"][0]["data"].as_str().unwrap();
    assert_eq!(STANDARD.decode(data).unwrap(), payload.to_vec());
}

#[test]
fn test_status_fields() {
    let mut counters = Counters::new();
    counters.rx_received = 7;
    counters.rx_ok = 5;
    counters.rx_ok_total = 12;
    counters.up_forwarded = 4;
    let now = Utc.with_ymd_and_hms(2024, 3, 9, 8, 5, 1).unwrap();

    let datagram = encode_status(&identity("rooftop"), &counters, now).unwrap();
    let (header, json) = split(&datagram);

    assert_header(header);
    let stat = &json["stat"];
    assert_eq!(stat["time"], "2024-03-09 08:05:01 GMT");
    assert_eq!(stat["lati"].as_f64().unwrap(), 52.5);
    assert_eq!(stat["long"].as_f64().unwrap(), 13.25);
    assert_eq!(stat["alti"], 34);
    assert_eq!(stat["rxnb"], 7);
    assert_eq!(stat["rxok"], 5);
    assert_eq!(stat["rxfw"], 4);
    assert_eq!(stat["ackr"].as_f64().unwrap(), 0.0);
    assert_eq!(stat["dwnb"], 0);
    assert_eq!(stat["txnb"], 0);
    assert_eq!(stat["pfrm"], "Single Channel Gateway");
    assert_eq!(stat["mail"], "ops@example.org");
    assert_eq!(stat["desc"], "rooftop");
}

#[test]
fn test_status_escapes_text() {
    let counters = Counters::new();
    let now = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
    let description = "say \"hi\"\\\n\u{1}";

    let datagram = encode_status(&identity(description), &counters, now).unwrap();
    let body = std::str::from_utf8(&datagram[HEADER_LEN..]).unwrap();

    assert!(body.contains(r#""desc":"say \"hi\"\\\n\u0001""#));
    let (_, json) = split(&datagram);
    assert_eq!(json["stat"]["desc"], description);
}

#[test]
fn test_status_oversize_is_an_error() {
    let counters = Counters::new();
    let now = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
    let description = "x".repeat(MAX_DATAGRAM_LEN);

    match encode_status(&identity(&description), &counters, now) {
        Err(EncodeError::Oversize { len, max }) => {
            assert!(len > max);
            assert_eq!(max, MAX_DATAGRAM_LEN);
        }
        other => panic!("unexpected result {:?}", other),
    }
}
