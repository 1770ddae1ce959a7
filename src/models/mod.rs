// src/models/mod.rs

pub mod practice;
pub mod question;
pub mod user;
