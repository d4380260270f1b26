pub mod consumer;
pub mod producer;
pub mod registry;

pub use consumer::TransportConsumer;
pub use producer::TransportProducer;
pub use registry::CodecRegistry;
