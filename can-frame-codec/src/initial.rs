//! Initial-value resolution
//!
//! Computes the values a message carries before anything has been set:
//! each signal's declared initial raw value (0 when undeclared), restricted to
//! the multiplexed alternative selected by the multiplexer's own initial value.

use crate::codec::encode;
use crate::signals::schema::{MultiplexerRole, SignalSchema};
use crate::types::SignalValues;
use serde::Serialize;

/// Initial signal values of a message and the frame they encode to
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InitialValues {
    /// Physical initial value of every active signal, in schema order
    pub signals: SignalValues,
    /// Encoded initial frame; `None` when the initial values do not encode
    pub frame: Option<Vec<u8>>,
}

/// Resolve initial values for a schema
///
/// Never fails: if the initial values cannot be encoded (for example a
/// declared initial value that does not fit its bit width) the frame is
/// `None` and a warning is logged.
pub fn resolve_initial_values(schema: &SignalSchema) -> InitialValues {
    let selector = schema
        .multiplexer()
        .map(|mux| i128::from(mux.initial_raw()));

    let signals: SignalValues = schema
        .signals()
        .iter()
        .filter(|signal| match signal.multiplexer_role {
            MultiplexerRole::Multiplexed(value) => selector == Some(i128::from(value)),
            MultiplexerRole::None | MultiplexerRole::Multiplexer => true,
        })
        .map(|signal| {
            let physical = signal.raw_to_physical(i128::from(signal.initial_raw()));
            (signal.name.clone(), physical)
        })
        .collect();

    let frame = match encode(schema, &signals) {
        Ok(frame) => Some(frame),
        Err(e) => {
            log::warn!(
                "Failed to encode initial values of message '{}' ({}): {}",
                schema.name(),
                schema.id_hex(),
                e
            );
            None
        }
    };

    InitialValues { signals, frame }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::signals::schema::SignalDef;

    #[test]
    fn test_defaults_to_zero() {
        let schema = SignalSchema::new(
            0x10,
            "Defaults",
            2,
            vec![
                SignalDef::new("Plain", 0, 8),
                SignalDef::new("Offset", 8, 8).with_scaling(2.0, -10.0),
            ],
        )
        .unwrap();

        let initial = resolve_initial_values(&schema);
        assert_eq!(initial.signals.get("Plain"), Some(0.0));
        // Raw 0 maps to the offset, even when that is not a meaningful default
        assert_eq!(initial.signals.get("Offset"), Some(-10.0));
        assert_eq!(initial.frame, Some(vec![0, 0]));
    }

    #[test]
    fn test_declared_initial_values() {
        let schema = SignalSchema::new(
            0x11,
            "Declared",
            2,
            vec![
                SignalDef::new("Gear", 0, 4).with_initial(3),
                SignalDef::new("Temp", 8, 8)
                    .with_scaling(1.0, -40.0)
                    .with_initial(60),
            ],
        )
        .unwrap();

        let initial = resolve_initial_values(&schema);
        assert_eq!(initial.signals.get("Gear"), Some(3.0));
        assert_eq!(initial.signals.get("Temp"), Some(20.0));
        assert_eq!(initial.frame, Some(vec![0x03, 60]));
    }

    #[test]
    fn test_multiplexed_selection_ignores_declaration_order() {
        // Alternatives declared before the multiplexer are still filtered
        let schema = SignalSchema::new(
            0x12,
            "Muxed",
            4,
            vec![
                SignalDef::new("PageZero", 8, 16).multiplexed(0).with_initial(5),
                SignalDef::new("PageOne", 8, 16).multiplexed(1).with_initial(7),
                SignalDef::new("Page", 0, 8).multiplexer().with_initial(1),
            ],
        )
        .unwrap();

        let initial = resolve_initial_values(&schema);
        assert_eq!(
            initial.signals.names().collect::<Vec<_>>(),
            vec!["PageOne", "Page"]
        );
        assert_eq!(initial.frame, Some(vec![0x01, 0x07, 0x00, 0x00]));
    }

    #[test]
    fn test_bad_initial_value_degrades() {
        let schema = SignalSchema::new(
            0x13,
            "Broken",
            1,
            vec![SignalDef::new("Nibble", 0, 4).with_initial(20)],
        )
        .unwrap();

        let initial = resolve_initial_values(&schema);
        assert_eq!(initial.signals.get("Nibble"), Some(20.0));
        assert!(initial.frame.is_none());
    }
}
