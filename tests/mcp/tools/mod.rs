mod config;
mod fix;
mod scan;
