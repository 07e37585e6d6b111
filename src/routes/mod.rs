pub mod analysis;
pub mod health;
pub mod intraday;
pub mod params;
pub mod prices;
