//! 地理位置（Location）
use randomtalk_domain::error::DomainError;
use randomtalk_domain::value_object::ValueObject;
use randomtalk_macros::value_object;

/// 地球平均半径（公里）
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// 经纬度坐标（角度制）
#[value_object(eq = false)]
#[derive(Copy)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinates {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    pub fn is_valid(&self) -> bool {
        (-90.0..=90.0).contains(&self.latitude) && (-180.0..=180.0).contains(&self.longitude)
    }

    /// 球面大圆距离（haversine）
    pub fn distance_km(&self, other: &Coordinates) -> f64 {
        let lat1 = self.latitude.to_radians();
        let lat2 = other.latitude.to_radians();
        let dlat = (other.latitude - self.latitude).to_radians();
        let dlon = (other.longitude - self.longitude).to_radians();

        let a = (dlat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (dlon / 2.0).sin().powi(2);
        let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());
        EARTH_RADIUS_KM * c
    }
}

impl ValueObject for Coordinates {
    type Error = DomainError;

    fn validate(&self) -> Result<(), Self::Error> {
        if !self.is_valid() {
            return Err(DomainError::validation(format!(
                "coordinates out of range: ({}, {})",
                self.latitude, self.longitude
            )));
        }
        Ok(())
    }
}

#[value_object(eq = false)]
pub struct Location {
    pub coordinates: Coordinates,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub country_code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub city_code: Option<String>,
}

impl Location {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            coordinates: Coordinates::new(latitude, longitude),
            country_code: None,
            city_code: None,
        }
    }

    pub fn with_country_code(mut self, code: impl Into<String>) -> Self {
        self.country_code = Some(code.into());
        self
    }

    pub fn with_city_code(mut self, code: impl Into<String>) -> Self {
        self.city_code = Some(code.into());
        self
    }

    pub fn distance_km(&self, other: &Location) -> f64 {
        self.coordinates.distance_km(&other.coordinates)
    }
}

impl ValueObject for Location {
    type Error = DomainError;

    fn validate(&self) -> Result<(), Self::Error> {
        self.coordinates.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn coordinate_bounds() {
        assert!(Coordinates::new(90.0, -180.0).is_valid());
        assert!(Coordinates::new(-90.0, 180.0).validate().is_ok());
        assert!(!Coordinates::new(90.5, 0.0).is_valid());
        assert!(Coordinates::new(0.0, 181.0).validate().is_err());
    }

    #[test]
    fn one_degree_of_latitude_is_about_111_km() {
        let d = Location::new(0.0, 0.0).distance_km(&Location::new(1.0, 0.0));
        assert!((d - 111.19).abs() < 0.5, "{d}");
        assert_eq!(Location::new(41.38, 2.17).distance_km(&Location::new(41.38, 2.17)), 0.0);
    }

    #[test]
    fn codes_are_optional_in_json() {
        let loc = Location::new(41.38, 2.17).with_country_code("ES");
        let json = serde_json::to_value(&loc).unwrap();
        assert_eq!(json["country_code"], "ES");
        assert!(json.get("city_code").is_none());

        let back: Location = serde_json::from_value(json).unwrap();
        assert_eq!(back, loc);
    }
}
