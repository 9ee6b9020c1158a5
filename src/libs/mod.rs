pub mod bed;
pub mod bucket;
pub mod chain;
pub mod command;
pub mod convert;
pub mod io;
pub mod memory;
pub mod ortholog;
pub mod pseudo;
pub mod region;
pub mod skip;
pub mod store;
pub mod u12;
