// End-to-end behaviour of the codec against realistic message layouts
use can_frame_codec::{
    decode, encode, ByteOrder, DecodeError, EncodeError, MessageCodec, SchemaSet, SignalDef,
    SignalSchema, SignalValues,
};

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Mixed little/big-endian, signed/unsigned and scaled signals
fn vehicle_status() -> SignalSchema {
    SignalSchema::new(
        0x1A0,
        "VehicleStatus",
        8,
        vec![
            SignalDef::new("VehicleSpeed", 0, 16)
                .with_scaling(0.01, 0.0)
                .with_unit("km/h"),
            SignalDef::new("Acceleration", 16, 12)
                .signed()
                .with_scaling(0.05, 0.0)
                .with_unit("m/s2"),
            SignalDef::new("GearPosition", 28, 4).with_initial(0),
            SignalDef::new("SteeringAngle", 32, 16)
                .with_byte_order(ByteOrder::BigEndian)
                .signed()
                .with_scaling(0.1, 0.0)
                .with_unit("deg"),
            SignalDef::new("CoolantTemp", 48, 8)
                .with_byte_order(ByteOrder::BigEndian)
                .with_scaling(1.0, -40.0)
                .with_initial(40),
            SignalDef::new("BrakePressed", 59, 1),
        ],
    )
    .unwrap()
}

/// Page selector with two alternatives sharing the same bits
fn diagnostics() -> SignalSchema {
    SignalSchema::new(
        0x2F0,
        "Diagnostics",
        8,
        vec![
            SignalDef::new("Page", 0, 8).multiplexer(),
            SignalDef::new("BatteryVoltage", 8, 16)
                .with_scaling(0.001, 0.0)
                .with_unit("V")
                .multiplexed(0),
            SignalDef::new("CellTemp", 8, 16)
                .signed()
                .with_scaling(0.1, 0.0)
                .with_unit("C")
                .multiplexed(1),
            SignalDef::new("Counter", 56, 8),
        ],
    )
    .unwrap()
}

fn assert_round_trip(schema: &SignalSchema, values: &SignalValues) {
    let frame = encode(schema, values).unwrap();
    assert_eq!(frame.len(), schema.byte_length());

    let decoded = decode(schema, &frame).unwrap();
    for (name, got) in decoded.iter() {
        let signal = schema.signal(name).unwrap();
        let sent = values.get(name).unwrap();
        assert!(
            (got - sent).abs() <= signal.scale.abs() / 2.0 + 1e-9,
            "{}: sent {}, got {}",
            name,
            sent,
            got
        );
    }
}

#[test]
fn round_trip_within_quantization() {
    let schema = vehicle_status();

    let cases = [
        (0.0, 0.0, 0.0, 0.0, -40.0, 0.0),
        (123.456, -3.33, 4.0, -90.04, 87.0, 1.0),
        (655.35, 102.35, 15.0, 3276.7, 215.0, 0.0),
        (0.005, -102.4, 7.0, -3276.8, -39.6, 1.0),
    ];

    for (speed, accel, gear, steering, coolant, brake) in cases {
        let values = SignalValues::new()
            .with("VehicleSpeed", speed)
            .with("Acceleration", accel)
            .with("GearPosition", gear)
            .with("SteeringAngle", steering)
            .with("CoolantTemp", coolant)
            .with("BrakePressed", brake);
        assert_round_trip(&schema, &values);
    }
}

#[test]
fn endianness_reference_bytes() {
    let values = SignalValues::new().with("Value", 300.0);

    let little = SignalSchema::new(1, "Little", 8, vec![SignalDef::new("Value", 0, 16)]).unwrap();
    assert_eq!(&encode(&little, &values).unwrap()[..2], &[0x2C, 0x01]);

    let big = SignalSchema::new(
        2,
        "Big",
        8,
        vec![SignalDef::new("Value", 0, 16).with_byte_order(ByteOrder::BigEndian)],
    )
    .unwrap();
    assert_eq!(&encode(&big, &values).unwrap()[..2], &[0x01, 0x2C]);
}

#[test]
fn multiplexer_selects_exactly_one_alternative() {
    let schema = diagnostics();

    let page_zero = SignalValues::new()
        .with("Page", 0.0)
        .with("BatteryVoltage", 12.6)
        .with("CellTemp", 25.0)
        .with("Counter", 3.0);
    let frame = encode(&schema, &page_zero).unwrap();
    let decoded = decode(&schema, &frame).unwrap();
    assert!(decoded.contains("BatteryVoltage"));
    assert!(!decoded.contains("CellTemp"));
    assert_eq!(decoded.get("Page"), Some(0.0));
    assert_eq!(decoded.get("Counter"), Some(3.0));

    let page_one = SignalValues::new()
        .with("Page", 1.0)
        .with("CellTemp", -12.5)
        .with("Counter", 4.0);
    let frame = encode(&schema, &page_one).unwrap();
    let decoded = decode(&schema, &frame).unwrap();
    assert!(decoded.contains("CellTemp"));
    assert!(!decoded.contains("BatteryVoltage"));
    let cell_temp = decoded.get("CellTemp").unwrap();
    assert!((cell_temp + 12.5).abs() < 1e-9);
}

#[test]
fn unselected_page_decodes_only_common_signals() {
    let schema = diagnostics();
    let frame = [0x07, 0xAA, 0xBB, 0, 0, 0, 0, 0x09];

    let decoded = decode(&schema, &frame).unwrap();
    assert_eq!(decoded.names().collect::<Vec<_>>(), vec!["Page", "Counter"]);
    assert_eq!(decoded.get("Counter"), Some(9.0));
}

#[test]
fn missing_multiplexer_uses_initial_selector() {
    let schema = diagnostics();

    // Page has no declared initial value, so page 0 is selected
    let values = SignalValues::new()
        .with("BatteryVoltage", 3.3)
        .with("Counter", 1.0);
    let frame = encode(&schema, &values).unwrap();
    assert_eq!(frame[0], 0);
    assert!(decode(&schema, &frame).unwrap().contains("BatteryVoltage"));

    // Page 1 requires CellTemp, which is absent
    let err = encode(&schema, &values.clone().with("Page", 1.0)).unwrap_err();
    assert_eq!(err, EncodeError::MissingSignal("CellTemp".to_string()));
}

#[test]
fn out_of_range_is_rejected() {
    let schema = SignalSchema::new(3, "Byte", 1, vec![SignalDef::new("Level", 0, 8)]).unwrap();
    let err = encode(&schema, &SignalValues::new().with("Level", 300.0)).unwrap_err();
    assert!(matches!(err, EncodeError::OutOfRange(ref name, value) if name == "Level" && value == 300.0));

    let schema = vehicle_status();
    let values = SignalValues::new()
        .with("VehicleSpeed", 10.0)
        .with("Acceleration", 200.0)
        .with("GearPosition", 1.0)
        .with("SteeringAngle", 0.0)
        .with("CoolantTemp", 20.0)
        .with("BrakePressed", 0.0);
    let err = encode(&schema, &values).unwrap_err();
    assert_eq!(err, EncodeError::OutOfRange("Acceleration".to_string(), 200.0));
}

#[test]
fn frame_length_is_enforced() {
    let schema = vehicle_status();
    for len in [0, 7, 9, 64] {
        let frame = vec![0u8; len];
        assert_eq!(
            decode(&schema, &frame).unwrap_err(),
            DecodeError::LengthMismatch {
                expected: 8,
                actual: len
            }
        );
    }
}

#[test]
fn initial_frame_is_deterministic() {
    init_logging();
    let schema = vehicle_status();

    let first = schema.initial_values();
    let second = schema.initial_values();
    assert_eq!(first, second);

    let frame = first.frame.unwrap();
    assert_eq!(frame, second.frame.unwrap());
    // CoolantTemp initial raw 40 sits big-endian in byte 6
    assert_eq!(frame, vec![0, 0, 0, 0, 0, 0, 40, 0]);
    assert_eq!(first.signals.get("CoolantTemp"), Some(0.0));
}

#[test]
fn schema_set_loads_despite_bad_initial_value() {
    init_logging();
    let broken = SignalSchema::new(
        0x3FF,
        "Broken",
        2,
        vec![SignalDef::new("Small", 0, 3).signed().with_initial(-9)],
    )
    .unwrap();

    let set = SchemaSet::from_schemas(vec![vehicle_status(), diagnostics(), broken]).unwrap();
    assert_eq!(set.stats().num_multiplexed, 1);
    assert!(set.initial_values("Broken").unwrap().frame.is_none());
    assert!(set.initial_values(0x2F0u32).unwrap().frame.is_some());
}

#[test]
fn concurrent_use_of_shared_schema() {
    let schema = diagnostics();

    std::thread::scope(|scope| {
        for page in 0..2u8 {
            let schema = &schema;
            scope.spawn(move || {
                let codec = MessageCodec::new(schema);
                for counter in 0..=255u8 {
                    let values = SignalValues::new()
                        .with("Page", f64::from(page))
                        .with("BatteryVoltage", 1.0)
                        .with("CellTemp", 1.0)
                        .with("Counter", f64::from(counter));
                    let frame = codec.encode(&values).unwrap();
                    assert_eq!(frame[7], counter);
                    assert_eq!(codec.decode(&frame).unwrap().len(), 3);
                }
            });
        }
    });
}
