/// Column every snapshot must carry.
pub const DATE_COLUMN: &str = "date";
pub const CITY_COLUMN: &str = "city";
pub const POLLUTANT_COLUMN: &str = "pollutant";
pub const LEVEL_COLUMN: &str = "level";
pub const INDEX_COLUMN: &str = "index";
