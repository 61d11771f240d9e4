/**
* filename : script
* author : HAMA
* date: 2025. 4. 8.
* description: Opaque locking/unlocking script bytes
**/

use std::fmt;

use crate::types::AppError;

/// Raw script bytes. Nothing is parsed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Script(Vec<u8>);

impl Script {
  pub fn new(bytes: Vec<u8>) -> Self {
    Self(bytes)
  }

  pub fn from_hex(hex_str: &str) -> Result<Self, AppError> {
    Ok(Self(hex::decode(hex_str)?))
  }

  pub fn as_bytes(&self) -> &[u8] {
    &self.0
  }

  pub fn len(&self) -> usize {
    self.0.len()
  }

  pub fn is_empty(&self) -> bool {
    self.0.is_empty()
  }

  pub fn to_hex(&self) -> String {
    hex::encode(&self.0)
  }
}

impl fmt::Display for Script {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(&self.to_hex())
  }
}
