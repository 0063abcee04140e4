//! OSC type conversion helpers

use crate::{error::ControlError, Result};
use rosc::OscType;

/// Numeric argument at `index` as `f32`
pub fn arg_f32(args: &[OscType], index: usize) -> Result<f32> {
    match args.get(index) {
        Some(OscType::Float(f)) => Ok(*f),
        Some(OscType::Double(d)) => Ok(*d as f32),
        Some(OscType::Int(i)) => Ok(*i as f32),
        Some(OscType::Long(l)) => Ok(*l as f32),
        Some(other) => Err(ControlError::InvalidMessage(format!(
            "Argument {} is not numeric: {:?}",
            index, other
        ))),
        None => Err(ControlError::InvalidMessage(format!(
            "Missing argument {}",
            index
        ))),
    }
}

/// Optional numeric argument; absent is `Ok(None)`
pub fn opt_f32(args: &[OscType], index: usize) -> Result<Option<f32>> {
    if index >= args.len() {
        return Ok(None);
    }
    arg_f32(args, index).map(Some)
}

/// Integer argument at `index`; floats are accepted when integral
pub fn arg_int(args: &[OscType], index: usize) -> Result<i64> {
    match args.get(index) {
        Some(OscType::Int(i)) => Ok(*i as i64),
        Some(OscType::Long(l)) => Ok(*l),
        Some(OscType::Float(f)) if f.fract() == 0.0 && f.is_finite() => Ok(*f as i64),
        Some(OscType::Double(d)) if d.fract() == 0.0 && d.is_finite() => Ok(*d as i64),
        Some(other) => Err(ControlError::InvalidMessage(format!(
            "Argument {} is not an integer: {:?}",
            index, other
        ))),
        None => Err(ControlError::InvalidMessage(format!(
            "Missing argument {}",
            index
        ))),
    }
}

/// Optional boolean argument; numbers count as true above 0.5
pub fn opt_bool(args: &[OscType], index: usize) -> Result<Option<bool>> {
    match args.get(index) {
        None | Some(OscType::Nil) => Ok(None),
        Some(OscType::Bool(b)) => Ok(Some(*b)),
        Some(_) => arg_f32(args, index).map(|v| Some(v > 0.5)),
    }
}

/// Integer argument clamped into `u16`
pub fn arg_u16(args: &[OscType], index: usize) -> Result<u16> {
    let value = arg_int(args, index)?;
    u16::try_from(value).map_err(|_| {
        ControlError::InvalidMessage(format!("Argument {} out of range: {}", index, value))
    })
}

/// Integer argument as a channel value
pub fn arg_u8(args: &[OscType], index: usize) -> Result<u8> {
    let value = arg_int(args, index)?;
    Ok(value.clamp(0, 255) as u8)
}
