pub mod assets;
pub mod push;
pub mod storage;
