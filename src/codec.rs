//! Payload codecs
//!
//! The journal never interprets queue payloads. A [`PayloadCodec`] turns the
//! caller's values into the opaque bytes stored in ADD / ADD_FIRST / REMOVE
//! entries, and back.

use std::fmt;
use std::marker::PhantomData;

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::{JournalError, Result};

/// Converts queue values to and from stored payload bytes
pub trait PayloadCodec: Send + Sync {
    /// The value type callers log
    type Value;

    fn encode(&self, value: &Self::Value) -> Result<Vec<u8>>;

    fn decode(&self, bytes: &[u8]) -> Result<Self::Value>;
}

/// Identity codec: values are already bytes
#[derive(Debug, Clone, Copy, Default)]
pub struct RawBytes;

impl PayloadCodec for RawBytes {
    type Value = Vec<u8>;

    fn encode(&self, value: &Vec<u8>) -> Result<Vec<u8>> {
        Ok(value.clone())
    }

    fn decode(&self, bytes: &[u8]) -> Result<Vec<u8>> {
        Ok(bytes.to_vec())
    }
}

/// UTF-8 string payloads
#[derive(Debug, Clone, Copy, Default)]
pub struct Utf8Codec;

impl PayloadCodec for Utf8Codec {
    type Value = String;

    fn encode(&self, value: &String) -> Result<Vec<u8>> {
        Ok(value.as_bytes().to_vec())
    }

    fn decode(&self, bytes: &[u8]) -> Result<String> {
        String::from_utf8(bytes.to_vec())
            .map_err(|e| JournalError::Serialization(format!("Payload is not UTF-8: {}", e)))
    }
}

/// Any serde type, stored with bincode
pub struct BincodeCodec<T> {
    _marker: PhantomData<fn() -> T>,
}

impl<T> BincodeCodec<T> {
    pub fn new() -> Self {
        Self { _marker: PhantomData }
    }
}

impl<T> Default for BincodeCodec<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Clone for BincodeCodec<T> {
    fn clone(&self) -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for BincodeCodec<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("BincodeCodec")
    }
}

impl<T> PayloadCodec for BincodeCodec<T>
where
    T: Serialize + DeserializeOwned,
{
    type Value = T;

    fn encode(&self, value: &T) -> Result<Vec<u8>> {
        Ok(bincode::serialize(value)?)
    }

    fn decode(&self, bytes: &[u8]) -> Result<T> {
        Ok(bincode::deserialize(bytes)?)
    }
}
