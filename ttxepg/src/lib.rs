//! Teletext EPG acquisition core: packet assembly, CNI/PIL confirmation,
//! page database, scraping and XMLTV export for one tuned broadcaster.

pub mod acq;
pub mod config;
pub mod db;
pub mod error;
pub mod logging;
pub mod ring;
pub mod scan;
pub mod scrape;
pub mod xmltv;
