pub mod codec;
pub mod error;
pub mod message;
pub mod model;
pub mod package;
pub mod util;

pub use codec::{Codec, MessagePublisher};
pub use error::TransportError;
pub use message::{MessageHeader, WireMessage, CODEC_ID_HEADER, MODEL_KEY_HEADER};
pub use model::ModelKey;
pub use package::{PackageValue, TransportPackage};
pub use util::now_ms;
