//! # Classwork Bot
//!
//! A Telegram bot for running a school class: the teacher hands out
//! homework tasks and quizzes, students submit answers and take the
//! quizzes from the chat.
//!
//! ## Features
//! - Student self-registration with name and class number
//! - Task authoring with optional file attachments
//! - Immediate or scheduled task delivery to a whole class
//! - Homework collection (text and files) with duplicate protection
//! - Quizzes with choice and free-text questions, attempt limits and
//!   best-score bookkeeping
//! - Result browsing per test, student and attempt
//! - Persistent storage with SQLite

/// Command handlers, dialogue states and the update dispatch tree
pub mod bot;
/// Configuration management and environment variables
pub mod config;
/// Database models, connections, and migrations
pub mod database;
/// Error taxonomy shared across handlers and services
pub mod error;
/// The quiz attempt state machine and scoring rules
pub mod quiz;
/// Background services: task distribution and the health endpoint
pub mod services;
/// Utility functions for validation, keyboards and file transfer
pub mod utils;
