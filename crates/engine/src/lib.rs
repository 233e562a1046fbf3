pub mod options;
pub mod timing;
pub mod voting;
