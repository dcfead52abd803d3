pub mod api;
pub mod db;
pub mod report;
pub mod sitemap;
pub mod state;
