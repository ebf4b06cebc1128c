mod encoder;
mod mux;

pub use {
    encoder::{EncoderSettings, SampleEncoding},
    mux::{MuxWriter, WriterStatus},
};
