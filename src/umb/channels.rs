//! # Measurement Channels
//!
//! Channel numbers of the WS-series compact weather stations. The codec
//! treats a channel as an opaque `u16`; this table only supplies names and
//! units for logging and persistence.

/// Lowest channel number in use by UMB devices
pub const CHANNEL_MIN: u16 = 100;

/// Highest channel number in use by UMB devices
pub const CHANNEL_MAX: u16 = 29999;

pub const CHANNEL_AIR_TEMPERATURE: u16 = 100;
pub const CHANNEL_AIR_TEMPERATURE_F: u16 = 105;
pub const CHANNEL_DEW_POINT: u16 = 110;
pub const CHANNEL_WIND_CHILL: u16 = 111;
pub const CHANNEL_WET_BULB_TEMPERATURE: u16 = 114;
pub const CHANNEL_DEW_POINT_F: u16 = 115;
pub const CHANNEL_RELATIVE_HUMIDITY: u16 = 200;
pub const CHANNEL_ABSOLUTE_HUMIDITY: u16 = 205;
pub const CHANNEL_MIXING_RATIO: u16 = 210;
pub const CHANNEL_SPECIFIC_ENTHALPY: u16 = 215;
pub const CHANNEL_ABSOLUTE_PRESSURE: u16 = 300;
pub const CHANNEL_RELATIVE_PRESSURE: u16 = 305;
pub const CHANNEL_AIR_DENSITY: u16 = 310;
pub const CHANNEL_WIND_SPEED: u16 = 400;
pub const CHANNEL_WIND_SPEED_MPH: u16 = 410;
pub const CHANNEL_WIND_SPEED_AVG: u16 = 460;
pub const CHANNEL_WIND_DIRECTION: u16 = 500;
pub const CHANNEL_COMPASS: u16 = 510;
pub const CHANNEL_PRECIPITATION_ABSOLUTE: u16 = 600;
pub const CHANNEL_PRECIPITATION_DIFFERENTIAL: u16 = 605;
pub const CHANNEL_PRECIPITATION_ABSOLUTE_IN: u16 = 640;
pub const CHANNEL_PRECIPITATION_TYPE: u16 = 700;
pub const CHANNEL_PRECIPITATION_INTENSITY: u16 = 800;

/// Name and unit of a known channel
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChannelInfo {
    pub channel: u16,
    pub name: &'static str,
    pub unit: &'static str,
}

const fn info(channel: u16, name: &'static str, unit: &'static str) -> ChannelInfo {
    ChannelInfo { channel, name, unit }
}

/// Known channels, sorted by number
pub const KNOWN_CHANNELS: &[ChannelInfo] = &[
    info(CHANNEL_AIR_TEMPERATURE, "air_temperature", "°C"),
    info(CHANNEL_AIR_TEMPERATURE_F, "air_temperature_f", "°F"),
    info(CHANNEL_DEW_POINT, "dew_point", "°C"),
    info(CHANNEL_WIND_CHILL, "wind_chill", "°C"),
    info(CHANNEL_WET_BULB_TEMPERATURE, "wet_bulb_temperature", "°C"),
    info(CHANNEL_DEW_POINT_F, "dew_point_f", "°F"),
    info(CHANNEL_RELATIVE_HUMIDITY, "relative_humidity", "%"),
    info(CHANNEL_ABSOLUTE_HUMIDITY, "absolute_humidity", "g/m³"),
    info(CHANNEL_MIXING_RATIO, "mixing_ratio", "g/kg"),
    info(CHANNEL_SPECIFIC_ENTHALPY, "specific_enthalpy", "kJ/kg"),
    info(CHANNEL_ABSOLUTE_PRESSURE, "absolute_air_pressure", "hPa"),
    info(CHANNEL_RELATIVE_PRESSURE, "relative_air_pressure", "hPa"),
    info(CHANNEL_AIR_DENSITY, "air_density", "kg/m³"),
    info(CHANNEL_WIND_SPEED, "wind_speed", "m/s"),
    info(CHANNEL_WIND_SPEED_MPH, "wind_speed_mph", "mph"),
    info(CHANNEL_WIND_SPEED_AVG, "wind_speed_avg", "m/s"),
    info(CHANNEL_WIND_DIRECTION, "wind_direction", "°"),
    info(CHANNEL_COMPASS, "compass_heading", "°"),
    info(CHANNEL_PRECIPITATION_ABSOLUTE, "precipitation_absolute", "l/m²"),
    info(CHANNEL_PRECIPITATION_DIFFERENTIAL, "precipitation_differential", "l/m²"),
    info(CHANNEL_PRECIPITATION_ABSOLUTE_IN, "precipitation_absolute_in", "in"),
    info(CHANNEL_PRECIPITATION_TYPE, "precipitation_type", ""),
    info(CHANNEL_PRECIPITATION_INTENSITY, "precipitation_intensity", "mm/h"),
];

/// Look up a known channel
pub fn lookup(channel: u16) -> Option<&'static ChannelInfo> {
    KNOWN_CHANNELS
        .binary_search_by_key(&channel, |info| info.channel)
        .ok()
        .map(|index| &KNOWN_CHANNELS[index])
}

/// Whether `channel` lies in the range UMB devices use
pub fn is_valid_channel(channel: u16) -> bool {
    (CHANNEL_MIN..=CHANNEL_MAX).contains(&channel)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_sorted_and_unique() {
        for pair in KNOWN_CHANNELS.windows(2) {
            assert!(pair[0].channel < pair[1].channel, "{:?}", pair);
        }
    }

    #[test]
    fn test_lookup() {
        assert_eq!(lookup(100).unwrap().name, "air_temperature");
        assert_eq!(lookup(800).unwrap().unit, "mm/h");
        assert!(lookup(101).is_none());
    }

    #[test]
    fn test_all_known_channels_valid() {
        assert!(KNOWN_CHANNELS.iter().all(|info| is_valid_channel(info.channel)));
        assert!(!is_valid_channel(99));
        assert!(!is_valid_channel(30000));
    }
}
