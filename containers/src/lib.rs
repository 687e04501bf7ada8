//! Domain types shared by every other crate in this workspace (spec.md §3):
//! `PubKey`, `Message`, `ValidatorSet`/`PubKeyHash`. `Signer` itself lives in
//! `curve`, the layer below; this crate only adds the wrapper types that
//! carry serde/hex ergonomics and set-level bookkeeping on top of it.

pub mod error;
pub mod message;
pub mod pub_key;
pub mod validator_set;

pub use error::ContainersError;
pub use message::Message;
pub use pub_key::PubKey;
pub use validator_set::{PubKeyHash, ValidatorSet};
