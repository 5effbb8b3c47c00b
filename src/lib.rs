//! Cardsrc - Template engine and icon-order resolver for digital business cards
//!
//! This library provides functionality to:
//! - Parse a Handlebars-like template mini-language into a node tree
//! - Render templates against per-entity JSON records with parent-scope access
//! - Decide which contact/social/document icons a card shows, in admin-configured order
//! - Support both lenient (warnings) and strict (errors) rendering
//!
//! The usual entry point is [`registry::TemplateRegistry::render_card`].

pub mod cli;
pub mod config;
pub mod helpers;
pub mod icons;
pub mod models;
pub mod output;
pub mod parser;
pub mod registry;
pub mod renderer;
pub mod scope;
pub mod suggest;
pub mod templates;
pub mod tokenizer;
