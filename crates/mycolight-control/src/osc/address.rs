//! OSC address space parser
//!
//! Maps incoming OSC messages onto engine events.

use super::types::{arg_f32, arg_u16, arg_u8, opt_bool, opt_f32};
use crate::{error::ControlError, Result};
use mycolight_core::{EventPayload, GroupTarget, SceneKind};
use rosc::{OscMessage, OscType};
use std::time::Duration;

/// Maximum length of an OSC address string
const MAX_OSC_ADDRESS_LENGTH: usize = 1024;

/// Parse an OSC message to an event payload
///
/// Supported address patterns:
/// - `/audio/beat [intensity]` - Beat with intensity (0.0-1.0), default 1.0
/// - `/audio/level [overall, low?, mid?, high?]` - Audio levels
/// - `/bio/plant{n} [resistance]` - Bio sensor of plant `n` (1-based)
/// - `/scene/{kind} [group?]` - Scene for one group, or all groups
/// - `/blackout [state?]` - Set blackout, or toggle without argument
/// - `/flash [address, count, r, g, b, duration]` - Identification flash
///   (duration in seconds)
pub fn parse_osc_message(msg: &OscMessage) -> Result<EventPayload> {
    let address = msg.addr.as_str();
    if address.len() > MAX_OSC_ADDRESS_LENGTH {
        return Err(ControlError::InvalidMessage(format!(
            "OSC address too long (max {} chars)",
            MAX_OSC_ADDRESS_LENGTH
        )));
    }

    let parts: Vec<&str> = address.trim_start_matches('/').split('/').collect();
    let args = msg.args.as_slice();

    match parts.as_slice() {
        ["audio", "beat"] => Ok(EventPayload::AudioBeat {
            intensity: opt_f32(args, 0)?.unwrap_or(1.0),
        }),
        ["audio", "level"] => parse_level(args),
        ["bio", sensor] => parse_bio(sensor, args),
        ["scene", kind] => parse_scene(kind, args),
        ["blackout"] => Ok(EventPayload::BlackoutToggle {
            state: opt_bool(args, 0)?,
        }),
        ["flash"] => parse_flash(args),
        _ => Err(ControlError::InvalidMessage(format!(
            "Unknown OSC address: {}",
            address
        ))),
    }
}

fn parse_level(args: &[OscType]) -> Result<EventPayload> {
    Ok(EventPayload::AudioLevel {
        overall: arg_f32(args, 0)?,
        low: opt_f32(args, 1)?.unwrap_or(0.0),
        mid: opt_f32(args, 2)?.unwrap_or(0.0),
        high: opt_f32(args, 3)?.unwrap_or(0.0),
    })
}

fn parse_bio(sensor: &str, args: &[OscType]) -> Result<EventPayload> {
    let number: usize = sensor
        .strip_prefix("plant")
        .and_then(|n| n.parse().ok())
        .filter(|&n| n >= 1)
        .ok_or_else(|| ControlError::InvalidMessage(format!("Invalid bio sensor: {}", sensor)))?;

    Ok(EventPayload::BioSensor {
        index: number - 1,
        resistance: arg_f32(args, 0)?,
    })
}

fn parse_scene(kind: &str, args: &[OscType]) -> Result<EventPayload> {
    let scene: SceneKind = kind.parse().map_err(ControlError::InvalidMessage)?;
    let target = if args.is_empty() {
        GroupTarget::All
    } else {
        GroupTarget::Group(arg_u16(args, 0)? as usize)
    };
    Ok(EventPayload::SceneSelect { target, scene })
}

fn parse_flash(args: &[OscType]) -> Result<EventPayload> {
    let seconds = arg_f32(args, 5)?;
    let duration = Duration::try_from_secs_f32(seconds)
        .ok()
        .filter(|d| !d.is_zero())
        .ok_or_else(|| {
            ControlError::InvalidMessage(format!("Invalid flash duration: {}", seconds))
        })?;
    Ok(EventPayload::FlashRequest {
        address: arg_u16(args, 0)?,
        count: arg_u16(args, 1)?,
        color: vec![arg_u8(args, 2)?, arg_u8(args, 3)?, arg_u8(args, 4)?],
        duration,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn msg(addr: &str, args: Vec<OscType>) -> OscMessage {
        OscMessage {
            addr: addr.to_string(),
            args,
        }
    }

    #[test]
    fn test_parse_audio() {
        assert_eq!(
            parse_osc_message(&msg("/audio/beat", vec![OscType::Float(0.7)])).unwrap(),
            EventPayload::AudioBeat { intensity: 0.7 }
        );
        assert_eq!(
            parse_osc_message(&msg("/audio/beat", vec![])).unwrap(),
            EventPayload::AudioBeat { intensity: 1.0 }
        );
        assert_eq!(
            parse_osc_message(&msg(
                "/audio/level",
                vec![OscType::Float(0.5), OscType::Float(0.1)]
            ))
            .unwrap(),
            EventPayload::AudioLevel {
                overall: 0.5,
                low: 0.1,
                mid: 0.0,
                high: 0.0
            }
        );
    }

    #[test]
    fn test_parse_bio_is_one_based() {
        assert_eq!(
            parse_osc_message(&msg("/bio/plant2", vec![OscType::Float(0.25)])).unwrap(),
            EventPayload::BioSensor {
                index: 1,
                resistance: 0.25
            }
        );
        assert!(parse_osc_message(&msg("/bio/plant0", vec![OscType::Float(0.25)])).is_err());
        assert!(parse_osc_message(&msg("/bio/tree1", vec![OscType::Float(0.25)])).is_err());
    }

    #[test]
    fn test_parse_scene() {
        assert_eq!(
            parse_osc_message(&msg("/scene/audio_pulse", vec![])).unwrap(),
            EventPayload::SceneSelect {
                target: GroupTarget::All,
                scene: SceneKind::AudioPulse
            }
        );
        assert_eq!(
            parse_osc_message(&msg("/scene/bio-glow", vec![OscType::Int(2)])).unwrap(),
            EventPayload::SceneSelect {
                target: GroupTarget::Group(2),
                scene: SceneKind::BioGlow
            }
        );
        assert!(parse_osc_message(&msg("/scene/strobe", vec![])).is_err());
    }

    #[test]
    fn test_parse_blackout() {
        assert_eq!(
            parse_osc_message(&msg("/blackout", vec![])).unwrap(),
            EventPayload::BlackoutToggle { state: None }
        );
        assert_eq!(
            parse_osc_message(&msg("/blackout", vec![OscType::Int(1)])).unwrap(),
            EventPayload::BlackoutToggle { state: Some(true) }
        );
    }

    #[test]
    fn test_parse_flash() {
        let args = vec![
            OscType::Int(1),
            OscType::Int(3),
            OscType::Int(255),
            OscType::Int(0),
            OscType::Int(0),
            OscType::Float(0.5),
        ];
        assert_eq!(
            parse_osc_message(&msg("/flash", args)).unwrap(),
            EventPayload::FlashRequest {
                address: 1,
                count: 3,
                color: vec![255, 0, 0],
                duration: Duration::from_millis(500)
            }
        );

        let args = vec![
            OscType::Int(1),
            OscType::Int(3),
            OscType::Int(255),
            OscType::Int(0),
            OscType::Int(0),
            OscType::Float(0.0),
        ];
        assert!(parse_osc_message(&msg("/flash", args)).is_err());
    }

    #[test]
    fn test_parse_flash_rejects_unrepresentable_duration() {
        for seconds in [1e30, -1.0, f32::NAN, f32::INFINITY] {
            let args = vec![
                OscType::Int(1),
                OscType::Int(3),
                OscType::Int(255),
                OscType::Int(0),
                OscType::Int(0),
                OscType::Float(seconds),
            ];
            assert!(
                matches!(
                    parse_osc_message(&msg("/flash", args)),
                    Err(ControlError::InvalidMessage(_))
                ),
                "duration {} accepted",
                seconds
            );
        }
    }

    #[test]
    fn test_unknown_address() {
        assert!(parse_osc_message(&msg("/layer/0/opacity", vec![])).is_err());
    }
}
