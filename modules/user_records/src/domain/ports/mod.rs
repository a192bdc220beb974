pub mod assets;
pub mod push;

pub use assets::AssetStore;
pub use push::{PushError, PushSender};
