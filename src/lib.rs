//! Pulse - A newsroom CMS
//!
//! This library provides topics, redactors and newspapers with their CRUD
//! pages, authentication and the admin back-office.

pub mod admin;
pub mod config;
pub mod db;
pub mod forms;
pub mod models;
pub mod services;
pub mod view;
pub mod web;
