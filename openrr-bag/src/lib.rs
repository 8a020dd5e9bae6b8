#![doc = include_str!("../README.md")]
#![warn(rust_2018_idioms)]

mod error;
mod extract;
pub mod msg;
mod series;
pub mod storage;

pub use crate::{
    error::*,
    extract::*,
    msg::{deserialize_message, serialize_message, JointState, Message},
    series::*,
    storage::{
        BagMessage, ConverterOptions, SequentialReader, StorageFilter, StorageOptions,
        TopicMetadata, SQLITE3_STORAGE_ID,
    },
};
