//! Data Transfer Objects for REST request/response serialization.

pub mod board_dto;
pub mod collaborator_dto;

pub use board_dto::*;
pub use collaborator_dto::*;
