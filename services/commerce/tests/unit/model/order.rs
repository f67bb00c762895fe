use ecommerce_common::error::AppErrorCode;

use commerce::model::{aggregate_quantities, generate_order_id, OrderStatus};

#[test]
fn aggregate_preserves_first_seen_order() {
    let pairs = [(152u64, 2u32), (140, 1), (152, 3), (188, 5)];
    let out = aggregate_quantities(&pairs);
    assert_eq!(out, vec![(152u64, 5u32), (140, 1), (188, 5)]);
}

#[test]
fn aggregate_saturates_on_overflow() {
    let pairs = [(140u64, u32::MAX), (140, 10)];
    let out = aggregate_quantities(&pairs);
    assert_eq!(out, vec![(140u64, u32::MAX)]);
}

#[test]
fn order_id_format() {
    let id_ = generate_order_id(1);
    assert_eq!(id_.len(), 34);
    assert!(id_.starts_with("01"));
    assert!(!id_.contains('-'));
    // two generated IDs never collide in practice
    assert_ne!(id_, generate_order_id(1));
}

#[test]
fn status_label_decode() {
    assert_eq!(OrderStatus::try_from("CREATED").unwrap(), OrderStatus::Created);
    assert_eq!(OrderStatus::Created.label(), "CREATED");
    let e = OrderStatus::try_from("SHIPPED").unwrap_err();
    assert_eq!(e.code, AppErrorCode::DataCorruption);
}
