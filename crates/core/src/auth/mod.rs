//! Authentication primitives.

pub mod password;

pub use password::{
    PasswordError, counter_party_username, default_counter_party_password, hash_password,
    verify_password,
};
