//! Terminal stand-in for the device location capability.

use anyhow::{Context, Result, bail};
use async_trait::async_trait;
use coleta_core::{
    model::Coordinate,
    ports::{LocationError, LocationPort, PermissionStatus},
};

use crate::settings::Settings;

/// Answers permission and position requests from configuration.
#[derive(Debug, Clone)]
pub(crate) struct ConfiguredLocation {
    permission: PermissionStatus,
    fix: Option<Coordinate>,
}

impl ConfiguredLocation {
    pub(crate) fn from_settings(settings: &Settings) -> Result<Self> {
        let fix = settings
            .location
            .as_deref()
            .map(parse_coordinate)
            .transpose()
            .context("invalid `location` setting")?;
        let permission = if settings.location_denied {
            PermissionStatus::Denied
        } else {
            PermissionStatus::Granted
        };
        Ok(Self { permission, fix })
    }
}

#[async_trait]
impl LocationPort for ConfiguredLocation {
    async fn request_permission(&self) -> PermissionStatus {
        self.permission
    }

    async fn current_position(&self) -> Result<Coordinate, LocationError> {
        self.fix
            .ok_or_else(|| LocationError::new("no position configured (set COLETA_LOCATION)"))
    }
}

fn parse_coordinate(raw: &str) -> Result<Coordinate> {
    let Some((lat, lon)) = raw.split_once(',') else {
        bail!("expected \"lat,lon\", got {raw:?}");
    };
    let latitude: f64 = lat.trim().parse().context("latitude is not a number")?;
    let longitude: f64 = lon.trim().parse().context("longitude is not a number")?;
    Coordinate::new(latitude, longitude)
        .with_context(|| format!("{latitude}, {longitude} is not a valid position"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_lat_lon_pair() {
        let coordinate = parse_coordinate(" -23.55 , -46.63 ").expect("valid pair");
        assert!((coordinate.latitude() + 23.55).abs() < f64::EPSILON);
        assert!((coordinate.longitude() + 46.63).abs() < f64::EPSILON);
    }

    #[test]
    fn rejects_malformed_pairs() {
        assert!(parse_coordinate("-23.55").is_err());
        assert!(parse_coordinate("north,south").is_err());
        assert!(parse_coordinate("95,0").is_err());
    }

    #[tokio::test]
    async fn missing_fix_is_unavailable() {
        let location = ConfiguredLocation {
            permission: PermissionStatus::Granted,
            fix: None,
        };
        assert_eq!(location.request_permission().await, PermissionStatus::Granted);
        assert!(location.current_position().await.is_err());
    }
}
