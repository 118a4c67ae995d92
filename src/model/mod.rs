//! Domain records, their identifiers and wire events.

pub mod event;
pub mod order;
pub mod shipment;

pub use event::*;
pub use order::*;
pub use shipment::*;

use paste::paste;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Declares `<Name>Id` newtypes over the allocator's `u32` sequence.
macro_rules! define_ids {
    ($($name:ident),+ $(,)?) => {
        paste! {
            $(
                #[doc = "Type-safe identifier for " $name " records."]
                #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
                #[serde(transparent)]
                pub struct [<$name Id>](pub u32);

                impl From<u32> for [<$name Id>] {
                    fn from(id: u32) -> Self {
                        Self(id)
                    }
                }

                impl fmt::Display for [<$name Id>] {
                    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                        fmt::Display::fmt(&self.0, f)
                    }
                }
            )+
        }
    };
}

define_ids!(Order, Shipment);
