//! Line-oriented control protocol.
//!
//! Until the daemon sits on a real message bus, sensors and callers are
//! simulated by writing lines to its standard input:
//!
//! ```text
//! pipe call_state active
//! pipe proximity closed
//! call change-device-mode flight-confirm
//! call modechange-callback 0
//! ```
//!
//! Blank lines and lines starting with `#` are ignored.

use devstate_core::{
    AlarmUiState, AudioRoute, CallState, CallType, CoverState, DisplayState, InputEvent,
    LockState, MethodCall, PipeInput, PowerKeyEvent, SystemState,
};

use crate::error::ControlError;

/// One parsed control line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Control {
    /// Write to an input pipe.
    Input(PipeInput),
    /// Invoke a method.
    Call(MethodCall),
}

/// Parse one line. `Ok(None)` for blank and comment lines.
pub fn parse_line(line: &str) -> Result<Option<Control>, ControlError> {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
        return Ok(None);
    }

    let mut words = line.split_whitespace();
    let command = words.next().unwrap_or_default();
    let target = words.next();
    let value = words.next();

    match command {
        "pipe" => {
            let pipe = target.ok_or(ControlError::MissingArgument("pipe"))?;
            let value = value.ok_or(ControlError::MissingArgument("pipe"))?;
            parse_pipe(pipe, value).map(|input| Some(Control::Input(input)))
        },
        "call" => {
            let method = target.ok_or(ControlError::MissingArgument("call"))?;
            parse_call(method, value).map(|call| Some(Control::Call(call)))
        },
        other => Err(ControlError::UnknownCommand(other.to_string())),
    }
}

fn bad(target: &'static str, value: &str) -> ControlError {
    ControlError::BadValue { target, value: value.to_string() }
}

fn parse_pipe(pipe: &str, v: &str) -> Result<PipeInput, ControlError> {
    let input = match pipe {
        "system_state" => PipeInput::SystemState(match v {
            "user" => SystemState::User,
            "actdead" => SystemState::ActDead,
            "shutdown" => SystemState::Shutdown,
            "reboot" => SystemState::Reboot,
            "boot" => SystemState::Boot,
            _ => return Err(bad("system_state", v)),
        }),
        "display_state" => PipeInput::DisplayState(match v {
            "on" => DisplayState::On,
            "dim" => DisplayState::Dim,
            "off" => DisplayState::Off,
            _ => return Err(bad("display_state", v)),
        }),
        "device_inactive" => PipeInput::DeviceInactive(parse_bool("device_inactive", v)?),
        "call_state" => PipeInput::CallState(match v {
            "none" => CallState::None,
            "ringing" => CallState::Ringing,
            "active" => CallState::Active,
            "service" => CallState::Service,
            _ => return Err(bad("call_state", v)),
        }),
        "call_type" => PipeInput::CallType(match v {
            "normal" => CallType::Normal,
            "emergency" => CallType::Emergency,
            _ => return Err(bad("call_type", v)),
        }),
        "alarm_ui_state" => PipeInput::AlarmUiState(match v {
            "off" => AlarmUiState::Off,
            "visible" => AlarmUiState::Visible,
            "ringing" => AlarmUiState::Ringing,
            _ => return Err(bad("alarm_ui_state", v)),
        }),
        "audio_route" => PipeInput::AudioRoute(match v {
            "handset" => AudioRoute::Handset,
            "speaker" => AudioRoute::Speaker,
            "headset" => AudioRoute::Headset,
            _ => return Err(bad("audio_route", v)),
        }),
        "proximity" => PipeInput::Proximity(parse_cover("proximity", v)?),
        "keyboard_slide" => PipeInput::KeyboardSlide(parse_cover("keyboard_slide", v)?),
        "lens_cover" => PipeInput::LensCover(parse_cover("lens_cover", v)?),
        "lid_cover" => PipeInput::LidCover(parse_cover("lid_cover", v)?),
        "power_key" => PipeInput::PowerKey(match v {
            "short" => PowerKeyEvent::Short,
            "double" => PowerKeyEvent::Double,
            "long" => PowerKeyEvent::Long,
            _ => return Err(bad("power_key", v)),
        }),
        "input" => PipeInput::Input(match v {
            "touch" => InputEvent::Touch,
            key => InputEvent::Key(key.parse().map_err(|_| bad("input", key))?),
        }),
        "connectivity_active" => {
            PipeInput::ConnectivityActive(parse_bool("connectivity_active", v)?)
        },
        "tk_lock" => PipeInput::TkLock(LockState::parse(v).map_err(|_| bad("tk_lock", v))?),
        "device_lock" => {
            PipeInput::DeviceLock(LockState::parse(v).map_err(|_| bad("device_lock", v))?)
        },
        other => return Err(ControlError::UnknownPipe(other.to_string())),
    };
    Ok(input)
}

fn parse_call(method: &str, arg: Option<&str>) -> Result<MethodCall, ControlError> {
    let text = |name: &'static str| arg.map(str::to_string).ok_or(ControlError::MissingArgument(name));
    let code = |name: &'static str| {
        let arg = arg.ok_or(ControlError::MissingArgument(name))?;
        arg.parse::<i32>().map_err(|_| bad(name, arg))
    };

    let call = match method {
        "get-device-mode" => MethodCall::GetDeviceMode,
        "change-device-mode" => MethodCall::ChangeDeviceMode(text("change-device-mode")?),
        "get-tklock-mode" => MethodCall::GetTklockMode,
        "change-tklock-mode" => MethodCall::ChangeTklockMode(text("change-tklock-mode")?),
        "get-devlock-mode" => MethodCall::GetDevlockMode,
        "modechange-callback" => MethodCall::ModeChangeCallback(code("modechange-callback")?),
        "tklock-callback" => MethodCall::TklockCallback(code("tklock-callback")?),
        "devlock-callback" => MethodCall::DevlockCallback(code("devlock-callback")?),
        "autolock-inhibit" => {
            let arg = arg.ok_or(ControlError::MissingArgument("autolock-inhibit"))?;
            MethodCall::SetAutolockInhibit(parse_bool("autolock-inhibit", arg)?)
        },
        other => return Err(ControlError::UnknownMethod(other.to_string())),
    };
    Ok(call)
}

fn parse_cover(target: &'static str, v: &str) -> Result<CoverState, ControlError> {
    match v {
        "open" => Ok(CoverState::Open),
        "closed" => Ok(CoverState::Closed),
        _ => Err(bad(target, v)),
    }
}

fn parse_bool(target: &'static str, v: &str) -> Result<bool, ControlError> {
    match v {
        "true" | "1" | "yes" => Ok(true),
        "false" | "0" | "no" => Ok(false),
        _ => Err(bad(target, v)),
    }
}
