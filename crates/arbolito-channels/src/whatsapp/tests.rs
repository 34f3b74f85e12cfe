use wacore::types::presence::ReceiptType;
use wacore_binary::jid::{Jid, JidExt};

use arbolito_core::message::AckLevel;

use super::events::receipt_level;
use super::qr::generate_qr_terminal;
use super::send::{jid_for, RETRY_DELAYS_MS};

#[test]
fn test_jid_for_canonical_id() {
    let jid = jid_for("5215512345678@c.us").unwrap();
    assert_eq!(jid.to_string(), "5215512345678@s.whatsapp.net");
}

#[test]
fn test_jid_for_passes_through_protocol_jids() {
    let jid = jid_for("5511999887766@s.whatsapp.net").unwrap();
    assert_eq!(jid.user, "5511999887766");
    assert!(!jid.is_group());
}

#[test]
fn test_jid_group_detection() {
    let group_jid: Jid = "120363001234567890@g.us".parse().unwrap();
    assert!(group_jid.is_group(), "g.us JID should be detected as group");

    let personal_jid: Jid = "5511999887766@s.whatsapp.net".parse().unwrap();
    assert!(
        !personal_jid.is_group(),
        "s.whatsapp.net JID should not be group"
    );
}

#[test]
fn test_receipt_level_mapping() {
    assert_eq!(receipt_level(&ReceiptType::Read), AckLevel::Read);
    assert_eq!(receipt_level(&ReceiptType::ReadSelf), AckLevel::Read);
    assert_eq!(receipt_level(&ReceiptType::Delivered), AckLevel::Device);
}

#[test]
fn test_receipt_levels_satisfy_server_threshold() {
    assert!(receipt_level(&ReceiptType::Delivered).reached_server());
    assert!(receipt_level(&ReceiptType::Read).reached_server());
}

#[test]
fn test_generate_qr_terminal() {
    let result = generate_qr_terminal("test-data");
    assert!(result.is_ok());
    let qr = result.unwrap();
    assert!(!qr.is_empty());
}

#[test]
fn test_retry_delays_exponential() {
    assert_eq!(RETRY_DELAYS_MS.len(), 3, "should have 3 retry attempts");
    assert_eq!(RETRY_DELAYS_MS[0], 500, "first delay 500ms");
    assert_eq!(RETRY_DELAYS_MS[1], RETRY_DELAYS_MS[0] * 2);
    assert_eq!(RETRY_DELAYS_MS[2], RETRY_DELAYS_MS[1] * 2);
}
