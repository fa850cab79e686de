//! 后端 API

pub mod client;

pub use client::{
    ByteStream, ChatMessage, ChatSession, CreateSessionRequest, MessageRole, TutorClient,
};
