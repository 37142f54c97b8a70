//! Response handlers
//!
//! Every [`ResponseHandler`] variant is dispatched through [`apply`], which
//! checks the raw response and records what it carries in the context.

use heapless::String;
use sigfox_protocol::ResponseHandler;

use super::context::{ChannelInfo, ProtocolContext};

/// A response that does not fit the step it answers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum HandlerError {
    /// Response is not ASCII text
    NotText,
    /// Nothing to capture
    Empty,
    /// Text other than the expected acknowledgement
    UnexpectedResponse,
    /// Text could not be parsed
    Malformed,
}

/// Acknowledgement sent by the modem
const ACK: &str = "OK";

/// Run `handler` on a raw response
pub fn apply(
    handler: ResponseHandler,
    response: &[u8],
    ctx: &mut ProtocolContext,
) -> Result<(), HandlerError> {
    match handler {
        ResponseHandler::None => Ok(()),
        ResponseHandler::CaptureDeviceId => {
            ctx.device_id = capture(text(response)?)?;
            Ok(())
        }
        ResponseHandler::CapturePac => {
            ctx.pac = capture(text(response)?)?;
            Ok(())
        }
        ResponseHandler::ExpectOk => {
            if text(response)? == ACK {
                Ok(())
            } else {
                Err(HandlerError::UnexpectedResponse)
            }
        }
        ResponseHandler::ChannelInfo => {
            ctx.channel_info = Some(parse_channel_info(text(response)?)?);
            Ok(())
        }
        ResponseHandler::CaptureTemperature => {
            ctx.module_temperature = Some(parse_first(text(response)?)?);
            Ok(())
        }
        ResponseHandler::CaptureVoltage => {
            ctx.module_voltage_mv = Some(parse_first(text(response)?)?);
            Ok(())
        }
    }
}

/// Response as trimmed text
fn text(response: &[u8]) -> Result<&str, HandlerError> {
    core::str::from_utf8(response)
        .map(str::trim)
        .map_err(|_| HandlerError::NotText)
}

/// Copy as much of `text` as fits
fn capture<const N: usize>(text: &str) -> Result<String<N>, HandlerError> {
    if text.is_empty() {
        return Err(HandlerError::Empty);
    }
    let mut out = String::new();
    for c in text.chars() {
        if out.push(c).is_err() {
            break;
        }
    }
    Ok(out)
}

/// Parse `X,Y`
fn parse_channel_info(text: &str) -> Result<ChannelInfo, HandlerError> {
    let (x, y) = text.split_once(',').ok_or(HandlerError::Malformed)?;
    let x = x.trim().parse().map_err(|_| HandlerError::Malformed)?;
    let y = y.trim().parse().map_err(|_| HandlerError::Malformed)?;
    Ok(ChannelInfo { x, y })
}

/// Parse the first line of a multi-line numeric reply
fn parse_first<T: core::str::FromStr>(text: &str) -> Result<T, HandlerError> {
    let first = text.split('\r').next().unwrap_or_default().trim();
    if first.is_empty() {
        return Err(HandlerError::Empty);
    }
    first.parse().map_err(|_| HandlerError::Malformed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RadioConfig;

    fn ctx() -> ProtocolContext {
        ProtocolContext::new(&RadioConfig::default())
    }

    #[test]
    fn test_capture_device_id_and_pac() {
        let mut ctx = ctx();
        apply(ResponseHandler::CaptureDeviceId, b"1234ABCD", &mut ctx).unwrap();
        apply(ResponseHandler::CapturePac, b"PACCODE01", &mut ctx).unwrap();

        assert_eq!(ctx.device_id(), "1234ABCD");
        assert_eq!(ctx.pac(), "PACCODE01");
    }

    #[test]
    fn test_capture_truncates() {
        let mut ctx = ctx();
        apply(ResponseHandler::CaptureDeviceId, b"0123456789ABCDEF", &mut ctx).unwrap();
        assert_eq!(ctx.device_id(), "01234567");
    }

    #[test]
    fn test_capture_rejects_empty() {
        let mut ctx = ctx();
        assert_eq!(
            apply(ResponseHandler::CapturePac, b"  ", &mut ctx),
            Err(HandlerError::Empty)
        );
        assert_eq!(ctx.pac(), "");
    }

    #[test]
    fn test_expect_ok() {
        let mut ctx = ctx();
        assert_eq!(apply(ResponseHandler::ExpectOk, b"OK", &mut ctx), Ok(()));
        assert_eq!(
            apply(ResponseHandler::ExpectOk, b"ERROR", &mut ctx),
            Err(HandlerError::UnexpectedResponse)
        );
        assert_eq!(
            apply(ResponseHandler::ExpectOk, &[0xFF, 0xFE], &mut ctx),
            Err(HandlerError::NotText)
        );
    }

    #[test]
    fn test_none_accepts_anything() {
        let mut ctx = ctx();
        assert_eq!(apply(ResponseHandler::None, b"EMU-OK", &mut ctx), Ok(()));
        assert_eq!(apply(ResponseHandler::None, b"", &mut ctx), Ok(()));
    }

    #[test]
    fn test_channel_info() {
        let mut ctx = ctx();
        apply(ResponseHandler::ChannelInfo, b"1,3", &mut ctx).unwrap();
        assert_eq!(ctx.channel_info(), Some(ChannelInfo { x: 1, y: 3 }));

        assert_eq!(
            apply(ResponseHandler::ChannelInfo, b"13", &mut ctx),
            Err(HandlerError::Malformed)
        );
        assert_eq!(
            apply(ResponseHandler::ChannelInfo, b"a,b", &mut ctx),
            Err(HandlerError::Malformed)
        );
    }

    #[test]
    fn test_module_diagnostics() {
        let mut ctx = ctx();
        apply(ResponseHandler::CaptureTemperature, b"245", &mut ctx).unwrap();
        apply(ResponseHandler::CaptureVoltage, b"3300\r3250", &mut ctx).unwrap();

        assert_eq!(ctx.module_temperature(), Some(24.5));
        assert_eq!(ctx.module_voltage_mv(), Some(3300));

        assert_eq!(
            apply(ResponseHandler::CaptureVoltage, b"n/a", &mut ctx),
            Err(HandlerError::Malformed)
        );
        assert_eq!(
            apply(ResponseHandler::CaptureTemperature, b"", &mut ctx),
            Err(HandlerError::Empty)
        );
    }
}
