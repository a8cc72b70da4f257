//! # Device Status Codes
//!
//! Status byte returned by the station with every response. Zero means the
//! command succeeded; everything else is a condition reported by the device.

use std::fmt;

/// Description returned for status bytes outside the UMB table
pub const UNRECOGNIZED_STATUS: &str = "unrecognized status";

/// Device-reported command status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DeviceStatus {
    Success,
    UnknownCommand,
    InvalidParameter,
    InvalidHeaderVersion,
    InvalidCommandVersion,
    WrongPassword,
    ReadError,
    WriteError,
    LengthTooLarge,
    InvalidAddress,
    InvalidChannel,
    CommandNotPossible,
    UnknownCalibrationCommand,
    CalibrationError,
    DeviceNotReady,
    UnderVoltage,
    HardwareError,
    MeasurementError,
    InitializationError,
    OperatingSystemError,
    ConfigurationError,
    CalibrationInvalid,
    ConfigurationCrcError,
    CalibrationCrcError,
    CalibrationStep1,
    CalibrationOk,
    ChannelDisabled,
    /// Any byte not in the UMB status table
    Unrecognized(u8),
}

impl DeviceStatus {
    pub fn from_code(code: u8) -> Self {
        match code {
            0 => DeviceStatus::Success,
            16 => DeviceStatus::UnknownCommand,
            17 => DeviceStatus::InvalidParameter,
            18 => DeviceStatus::InvalidHeaderVersion,
            19 => DeviceStatus::InvalidCommandVersion,
            20 => DeviceStatus::WrongPassword,
            32 => DeviceStatus::ReadError,
            33 => DeviceStatus::WriteError,
            34 => DeviceStatus::LengthTooLarge,
            35 => DeviceStatus::InvalidAddress,
            36 => DeviceStatus::InvalidChannel,
            37 => DeviceStatus::CommandNotPossible,
            38 => DeviceStatus::UnknownCalibrationCommand,
            39 => DeviceStatus::CalibrationError,
            40 => DeviceStatus::DeviceNotReady,
            41 => DeviceStatus::UnderVoltage,
            42 => DeviceStatus::HardwareError,
            43 => DeviceStatus::MeasurementError,
            44 => DeviceStatus::InitializationError,
            45 => DeviceStatus::OperatingSystemError,
            48 => DeviceStatus::ConfigurationError,
            49 => DeviceStatus::CalibrationInvalid,
            50 => DeviceStatus::ConfigurationCrcError,
            51 => DeviceStatus::CalibrationCrcError,
            52 => DeviceStatus::CalibrationStep1,
            53 => DeviceStatus::CalibrationOk,
            54 => DeviceStatus::ChannelDisabled,
            other => DeviceStatus::Unrecognized(other),
        }
    }

    /// Status byte as transmitted
    pub fn code(&self) -> u8 {
        match *self {
            DeviceStatus::Success => 0,
            DeviceStatus::UnknownCommand => 16,
            DeviceStatus::InvalidParameter => 17,
            DeviceStatus::InvalidHeaderVersion => 18,
            DeviceStatus::InvalidCommandVersion => 19,
            DeviceStatus::WrongPassword => 20,
            DeviceStatus::ReadError => 32,
            DeviceStatus::WriteError => 33,
            DeviceStatus::LengthTooLarge => 34,
            DeviceStatus::InvalidAddress => 35,
            DeviceStatus::InvalidChannel => 36,
            DeviceStatus::CommandNotPossible => 37,
            DeviceStatus::UnknownCalibrationCommand => 38,
            DeviceStatus::CalibrationError => 39,
            DeviceStatus::DeviceNotReady => 40,
            DeviceStatus::UnderVoltage => 41,
            DeviceStatus::HardwareError => 42,
            DeviceStatus::MeasurementError => 43,
            DeviceStatus::InitializationError => 44,
            DeviceStatus::OperatingSystemError => 45,
            DeviceStatus::ConfigurationError => 48,
            DeviceStatus::CalibrationInvalid => 49,
            DeviceStatus::ConfigurationCrcError => 50,
            DeviceStatus::CalibrationCrcError => 51,
            DeviceStatus::CalibrationStep1 => 52,
            DeviceStatus::CalibrationOk => 53,
            DeviceStatus::ChannelDisabled => 54,
            DeviceStatus::Unrecognized(code) => code,
        }
    }

    pub fn is_success(&self) -> bool {
        *self == DeviceStatus::Success
    }

    pub fn description(&self) -> &'static str {
        match self {
            DeviceStatus::Success => "command successful; no error",
            DeviceStatus::UnknownCommand => "unknown command; not supported by this device",
            DeviceStatus::InvalidParameter => "invalid parameter",
            DeviceStatus::InvalidHeaderVersion => "invalid header version",
            DeviceStatus::InvalidCommandVersion => "invalid command version",
            DeviceStatus::WrongPassword => "wrong password for command",
            DeviceStatus::ReadError => "read error",
            DeviceStatus::WriteError => "write error",
            DeviceStatus::LengthTooLarge => "length too large",
            DeviceStatus::InvalidAddress => "invalid address or memory location",
            DeviceStatus::InvalidChannel => "invalid channel",
            DeviceStatus::CommandNotPossible => "command not possible in this mode",
            DeviceStatus::UnknownCalibrationCommand => "unknown test or calibration command",
            DeviceStatus::CalibrationError => "calibration error",
            DeviceStatus::DeviceNotReady => "device not ready; initialisation or calibration running",
            DeviceStatus::UnderVoltage => "under-voltage",
            DeviceStatus::HardwareError => "hardware error",
            DeviceStatus::MeasurementError => "measurement error",
            DeviceStatus::InitializationError => "device initialisation error",
            DeviceStatus::OperatingSystemError => "operating system error",
            DeviceStatus::ConfigurationError => "configuration error; default configuration loaded",
            DeviceStatus::CalibrationInvalid => "calibration invalid; measurement not possible",
            DeviceStatus::ConfigurationCrcError => {
                "CRC error loading configuration; default configuration loaded"
            }
            DeviceStatus::CalibrationCrcError => {
                "CRC error loading calibration data; measurement not possible"
            }
            DeviceStatus::CalibrationStep1 => "calibration step 1",
            DeviceStatus::CalibrationOk => "calibration OK",
            DeviceStatus::ChannelDisabled => "channel disabled",
            DeviceStatus::Unrecognized(_) => UNRECOGNIZED_STATUS,
        }
    }
}

impl From<u8> for DeviceStatus {
    fn from(code: u8) -> Self {
        DeviceStatus::from_code(code)
    }
}

impl fmt::Display for DeviceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.description(), self.code())
    }
}

/// Human-readable description of a raw status byte
///
/// # Examples
///
/// ```
/// use umb_station::umb::status::status_description;
///
/// assert_eq!(status_description(41), "under-voltage");
/// assert_eq!(status_description(200), "unrecognized status");
/// ```
pub fn status_description(status: u8) -> &'static str {
    DeviceStatus::from_code(status).description()
}
