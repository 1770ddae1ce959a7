pub mod hash;
pub mod json;
pub mod jwt;
pub mod password;
pub mod path;
pub mod query;
pub mod validate;
