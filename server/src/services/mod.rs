pub mod map_refresher;
